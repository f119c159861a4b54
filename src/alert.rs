//! Audible focus-loss alert.

use colored::Colorize;
use std::io::Write;
use tracing::debug;

pub const ALERT_FREQUENCY_HZ: u32 = 800;
pub const ALERT_DURATION_MS: u32 = 300;

/// Tells the user a session paused because its window lost focus.
///
/// Called from the session worker; implementations block until the user
/// has been told.
pub trait Alert {
    fn focus_lost(&mut self, resume_at: usize);
}

/// Plays a short tone and prints a notice on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct Beeper;

impl Alert for Beeper {
    fn focus_lost(&mut self, resume_at: usize) {
        beep();
        eprintln!(
            "{} {}",
            "⚠️  Target window lost focus, typing paused.".yellow().bold(),
            format!("Resume will continue from character {resume_at}.").yellow()
        );
    }
}

#[cfg(windows)]
fn beep() {
    // SAFETY: Beep has no pointer arguments.
    let ok = unsafe { winapi::um::utilapiset::Beep(ALERT_FREQUENCY_HZ, ALERT_DURATION_MS) };
    if ok == 0 {
        debug!("Beep failed, falling back to terminal bell");
        terminal_bell();
    }
}

#[cfg(not(windows))]
fn beep() {
    debug!(
        frequency = ALERT_FREQUENCY_HZ,
        duration_ms = ALERT_DURATION_MS,
        "no tone generator on this platform, ringing terminal bell"
    );
    terminal_bell();
}

fn terminal_bell() {
    let mut stderr = std::io::stderr();
    let _ = stderr.write_all(b"\x07");
    let _ = stderr.flush();
}
