//! Foreground window tracking.
//!
//! When a session arms focus-loss detection it snapshots the window that
//! received the first typed character. From then on the session asks
//! whether that window is still in front; if the user clicks elsewhere the
//! session pauses instead of typing into the wrong place.

use crate::error::FocusQueryError;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::{debug, info, warn};

/// Answers whether the session's window still has input focus.
pub trait FocusOracle {
    /// Captures the current foreground window as the one to track.
    fn arm(&mut self) {}

    fn is_foreground(&mut self) -> Result<bool, FocusQueryError>;
}

/// An oracle that never reports focus loss.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysFocused;

impl FocusOracle for AlwaysFocused {
    fn is_foreground(&mut self) -> Result<bool, FocusQueryError> {
        Ok(true)
    }
}

/// Identity of a top-level window as reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowId {
    pub handle: u64,
    pub pid: Option<u32>,
}

/// Tracks the OS foreground window.
///
/// Before [`FocusOracle::arm`] succeeds there is nothing to compare with, so
/// the oracle reports focus as held.
///
/// Each query runs a subprocess outside Windows (`xdotool` on Linux,
/// `osascript` on macOS), so checking before every character bounds the
/// typing speed there to the cost of that process.
pub struct ForegroundWindowOracle {
    target: Option<WindowId>,
    system: System,
}

impl Default for ForegroundWindowOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl ForegroundWindowOracle {
    pub fn new() -> Self {
        Self {
            target: None,
            system: System::new(),
        }
    }

    pub fn target(&self) -> Option<WindowId> {
        self.target
    }

    /// Looks up the executable name behind a pid.
    pub fn process_name(&mut self, pid: u32) -> Option<String> {
        let pid = Pid::from_u32(pid);
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        self.system
            .process(pid)
            .map(|p| p.name().to_string_lossy().into_owned())
    }
}

impl FocusOracle for ForegroundWindowOracle {
    fn arm(&mut self) {
        match foreground_window() {
            Ok(window) => {
                let name = window.pid.and_then(|pid| self.process_name(pid));
                if window.pid == Some(std::process::id()) {
                    warn!("typing into auto-typer's own window");
                }
                info!(
                    handle = window.handle,
                    process = name.as_deref().unwrap_or("unknown"),
                    "tracking focus of target window"
                );
                self.target = Some(window);
            }
            Err(e) => {
                debug!(error = %e, "could not capture target window; focus tracking disabled");
                self.target = None;
            }
        }
    }

    fn is_foreground(&mut self) -> Result<bool, FocusQueryError> {
        let Some(target) = self.target else {
            return Ok(true);
        };
        let current = foreground_window()?;
        Ok(current.handle == target.handle)
    }
}

#[cfg(windows)]
fn foreground_window() -> Result<WindowId, FocusQueryError> {
    use winapi::um::winuser::{GetForegroundWindow, GetWindowThreadProcessId};

    // SAFETY: both calls only read window manager state.
    unsafe {
        let hwnd = GetForegroundWindow();
        if hwnd.is_null() {
            return Err(FocusQueryError::new("no foreground window"));
        }
        let mut pid: u32 = 0;
        GetWindowThreadProcessId(hwnd, &mut pid);
        Ok(WindowId {
            handle: hwnd as u64,
            pid: (pid != 0).then_some(pid),
        })
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn foreground_window() -> Result<WindowId, FocusQueryError> {
    let handle = xdotool(&["getactivewindow"])?
        .parse::<u64>()
        .map_err(|e| FocusQueryError::new(format!("unexpected xdotool output: {e}")))?;
    let pid = xdotool(&["getwindowpid", &handle.to_string()])
        .ok()
        .and_then(|s| s.parse().ok());
    Ok(WindowId { handle, pid })
}

#[cfg(all(unix, not(target_os = "macos")))]
fn xdotool(args: &[&str]) -> Result<String, FocusQueryError> {
    let output = std::process::Command::new("xdotool")
        .args(args)
        .output()
        .map_err(|e| FocusQueryError::new(format!("xdotool unavailable: {e}")))?;
    if !output.status.success() {
        return Err(FocusQueryError::new(format!(
            "xdotool {} exited with {}",
            args.join(" "),
            output.status
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(target_os = "macos")]
fn foreground_window() -> Result<WindowId, FocusQueryError> {
    const FRONTMOST_PID: &str = concat!(
        "tell application \"System Events\" ",
        "to get unix id of first process whose frontmost is true"
    );

    let output = std::process::Command::new("osascript")
        .args(["-e", FRONTMOST_PID])
        .output()
        .map_err(|e| FocusQueryError::new(format!("osascript unavailable: {e}")))?;
    if !output.status.success() {
        return Err(FocusQueryError::new(format!(
            "osascript exited with {}",
            output.status
        )));
    }
    let pid: u32 = String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse()
        .map_err(|e| FocusQueryError::new(format!("unexpected osascript output: {e}")))?;
    // macOS has no cheap window handle here, so the frontmost app stands in.
    Ok(WindowId {
        handle: u64::from(pid),
        pid: Some(pid),
    })
}

#[cfg(not(any(unix, windows)))]
fn foreground_window() -> Result<WindowId, FocusQueryError> {
    Err(FocusQueryError::new(
        "foreground window detection is not supported on this platform",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unarmed_oracle_reports_focus() {
        let mut oracle = ForegroundWindowOracle::new();
        assert!(oracle.target().is_none());
        assert!(oracle.is_foreground().unwrap());
    }

    #[test]
    fn test_process_name_of_self() {
        let mut oracle = ForegroundWindowOracle::default();
        let name = oracle.process_name(std::process::id());
        assert!(name.is_some_and(|n| !n.is_empty()));
    }

    #[test]
    fn test_always_focused() {
        let mut oracle = AlwaysFocused;
        oracle.arm();
        assert!(oracle.is_foreground().unwrap());
    }
}
