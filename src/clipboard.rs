//! Reading text from the system clipboard.
//!
//! There is no clipboard crate in our stack, so [`SystemClipboard`] shells
//! out to the platform's paste utility.

use crate::error::{Result, TyperError};
use std::process::Command;
use tracing::debug;

pub trait ClipboardSource {
    /// Returns the clipboard text, possibly empty.
    fn read_text(&self) -> Result<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl ClipboardSource for SystemClipboard {
    fn read_text(&self) -> Result<String> {
        let mut last_error = None;
        for (program, args) in paste_commands() {
            match run(program, args) {
                Ok(text) => return Ok(text),
                Err(e) => {
                    debug!(program, error = %e, "clipboard command failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| TyperError::clipboard("no clipboard utility available")))
    }
}

#[cfg(target_os = "macos")]
fn paste_commands() -> &'static [(&'static str, &'static [&'static str])] {
    &[("pbpaste", &[])]
}

#[cfg(windows)]
fn paste_commands() -> &'static [(&'static str, &'static [&'static str])] {
    &[(
        "powershell",
        &["-NoProfile", "-Command", "Get-Clipboard -Raw"],
    )]
}

#[cfg(all(unix, not(target_os = "macos")))]
fn paste_commands() -> &'static [(&'static str, &'static [&'static str])] {
    &[
        ("wl-paste", &["--no-newline"]),
        ("xclip", &["-selection", "clipboard", "-o"]),
        ("xsel", &["--clipboard", "--output"]),
    ]
}

#[cfg(not(any(unix, windows)))]
fn paste_commands() -> &'static [(&'static str, &'static [&'static str])] {
    &[]
}

fn run(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| TyperError::clipboard(format!("{program}: {e}")))?;
    if !output.status.success() {
        // wl-paste and xclip exit non-zero when the clipboard holds no text.
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.to_lowercase().contains("nothing is copied")
            || stderr.to_lowercase().contains("no selection")
        {
            return Ok(String::new());
        }
        return Err(TyperError::clipboard(format!(
            "{program} exited with {}",
            output.status
        )));
    }
    String::from_utf8(output.stdout)
        .map_err(|_| TyperError::clipboard(format!("{program} returned non UTF-8 text")))
}
