//! The typing session: types a fixed text one character at a time.
//!
//! A session runs exactly once. It optionally switches the input method,
//! waits for the user to focus the target, then emits characters with a
//! fixed delay between them. It ends in one of four states:
//!
//! - [`SessionState::Completed`] when every character was typed,
//! - [`SessionState::Cancelled`] when its [`CancelToken`] fired,
//! - [`SessionState::Paused`] when the target window lost focus,
//! - [`SessionState::Failed`] when the keyboard backend errored.
//!
//! Only a paused run can be picked up again, and only by starting a new
//! session over the remaining text (see [`crate::host::SessionHost::resume`]).

use crate::config::Config;
use crate::error::{Result, TyperError, UserInputError};
use crate::events::EventSink;
use crate::focus::FocusOracle;
use crate::keys::KeyCombo;
use crate::platform::Platform;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Time given to the user to click into the target window.
pub const ARMING_DELAY: Duration = Duration::from_secs(5);

/// Time given to the OS to apply an input method switch.
pub const INPUT_SWITCH_SETTLE: Duration = Duration::from_secs(1);

/// A progress line is logged every this many characters.
pub const PROGRESS_INTERVAL: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    ArmingDelay,
    Running,
    Paused,
    Cancelled,
    Completed,
    Failed,
}

impl SessionState {
    /// Arming or typing.
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::ArmingDelay | SessionState::Running)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Paused
                | SessionState::Cancelled
                | SessionState::Completed
                | SessionState::Failed
        )
    }
}

/// Cooperative cancellation flag shared between host and worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub delay: Duration,
    /// Sent before arming when set.
    pub input_method_hotkey: Option<KeyCombo>,
    pub detect_focus_loss: bool,
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            delay: config.delay,
            input_method_hotkey: config.input_method_combo()?,
            detect_focus_loss: config.detect_focus_loss,
        })
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(10),
            input_method_hotkey: None,
            detect_focus_loss: true,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    /// Identifier the host gave this run; 0 for sessions run on their own.
    pub launch: u64,
    pub state: SessionState,
    /// Index of the next character to type, relative to this session.
    pub cursor: usize,
    /// Characters actually handed to the injector.
    pub injected: usize,
    pub total: usize,
}

pub struct TypingSession {
    content: Vec<char>,
    options: SessionOptions,
    state: SessionState,
    cursor: usize,
    injected: usize,
    launch: u64,
    cancel: CancelToken,
    events: EventSink,
}

impl TypingSession {
    pub fn new(
        content: &str,
        options: SessionOptions,
        cancel: CancelToken,
        events: EventSink,
    ) -> Result<Self> {
        if content.is_empty() {
            return Err(UserInputError::EmptyContent.into());
        }
        if options.delay.is_zero() {
            return Err(UserInputError::InvalidDelay.into());
        }

        Ok(Self {
            content: content.chars().collect(),
            options,
            state: SessionState::Idle,
            cursor: 0,
            injected: 0,
            launch: 0,
            cancel,
            events,
        })
    }

    /// Tags the run so its final report can be told apart from other runs
    /// sharing the same event channel.
    pub fn with_launch(mut self, launch: u64) -> Self {
        self.launch = launch;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of characters in the session's content.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs the session on a blocking worker and returns immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<P: Platform>(mut self, platform: Arc<P>) -> SessionHandle {
        let cancel = self.cancel.clone();
        let join = tokio::task::spawn_blocking(move || self.run(platform.as_ref()));
        SessionHandle { cancel, join }
    }

    /// Runs the session to one of its terminal states on the current thread.
    ///
    /// The final [`crate::events::SessionEvent::Finished`] event is sent
    /// before returning.
    pub fn run(&mut self, platform: &dyn Platform) -> SessionReport {
        let report = self.drive(platform);
        self.events.finished(report);
        report
    }

    fn drive(&mut self, platform: &dyn Platform) -> SessionReport {
        let mut sleeper = platform.sleeper();
        let mut injector = match platform.injector() {
            Ok(injector) => injector,
            Err(e) => return self.fail(&e.into()),
        };

        if let Some(combo) = self.options.input_method_hotkey.clone() {
            self.events.log(format!("🔄 Switching input method ({combo})..."));
            if let Err(e) = injector.issue_hotkey(&combo) {
                warn!(error = %e, "input method switch failed");
                self.events.log(format!("⚠️ Input method switch failed: {e}"));
            }
            sleeper.sleep(INPUT_SWITCH_SETTLE);
        }

        self.transition(SessionState::ArmingDelay);
        self.events.log(format!(
            "📌 Click into the target text field within {} seconds...",
            ARMING_DELAY.as_secs()
        ));
        sleeper.sleep(ARMING_DELAY);

        self.transition(SessionState::Running);
        let total = self.content.len();
        self.events.log(format!("⌨️ Typing {total} characters..."));

        let mut oracle = platform.focus_oracle();
        let mut alert = platform.alert();
        let mut focus_armed = false;

        for i in 0..total {
            if self.cancel.is_cancelled() {
                self.transition(SessionState::Cancelled);
                self.events.log("🛑 Typing cancelled.");
                return self.report();
            }

            if focus_armed && !still_focused(oracle.as_mut()) {
                self.cursor = i + 1;
                self.transition(SessionState::Paused);
                self.events.log(format!(
                    "⏸️ Target window lost focus, paused at {}/{total}.",
                    self.cursor
                ));
                alert.focus_lost(self.cursor);
                return self.report();
            }

            let ch = self.content[i];
            if let Err(e) = injector.inject_char(ch) {
                return self.fail(&e.into());
            }
            self.injected += 1;
            self.cursor = i + 1;

            if self.options.detect_focus_loss && !focus_armed {
                oracle.arm();
                focus_armed = true;
            }

            sleeper.sleep(self.options.delay);

            if is_progress_point(i, total) {
                self.events.log(progress_message(i + 1, total));
            }
        }

        self.transition(SessionState::Completed);
        self.events.log("🎉 Typing complete!");
        self.report()
    }

    fn transition(&mut self, state: SessionState) {
        self.state = state;
        self.events.state(state);
    }

    fn fail(&mut self, err: &TyperError) -> SessionReport {
        error!(error = %err, "typing session failed");
        self.transition(SessionState::Failed);
        self.events.log(format!("❌ Error: {err}"));
        self.report()
    }

    fn report(&self) -> SessionReport {
        SessionReport {
            launch: self.launch,
            state: self.state,
            cursor: self.cursor,
            injected: self.injected,
            total: self.content.len(),
        }
    }
}

/// Focus queries fail open: an oracle error never pauses a session.
fn still_focused(oracle: &mut dyn FocusOracle) -> bool {
    match oracle.is_foreground() {
        Ok(focused) => focused,
        Err(e) => {
            debug!(error = %e, "focus query failed, assuming target still focused");
            true
        }
    }
}

/// A session running on a background worker.
#[derive(Debug)]
pub struct SessionHandle {
    cancel: CancelToken,
    join: JoinHandle<SessionReport>,
}

impl SessionHandle {
    /// Asks the worker to stop before its next character.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub async fn join(self) -> Result<SessionReport> {
        self.join
            .await
            .map_err(|e| TyperError::Worker(e.to_string()))
    }
}

/// Whether the character at `index` ends a progress interval or the text.
pub fn is_progress_point(index: usize, total: usize) -> bool {
    (index + 1) % PROGRESS_INTERVAL == 0 || index + 1 == total
}

pub fn progress_percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (done as f64 / total as f64 * 100.0).min(100.0)
}

pub fn progress_message(done: usize, total: usize) -> String {
    format!(
        "✅ Typed {done}/{total} characters | progress: {:.1}%",
        progress_percent(done, total)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_points() {
        assert!(is_progress_point(99, 250));
        assert!(is_progress_point(199, 250));
        assert!(is_progress_point(249, 250));
        assert!(!is_progress_point(0, 250));
        assert!(!is_progress_point(100, 250));
        assert!(is_progress_point(0, 1));
    }

    #[test]
    fn test_progress_message_formatting() {
        assert_eq!(
            progress_message(2, 2),
            "✅ Typed 2/2 characters | progress: 100.0%"
        );
        assert!(progress_message(100, 300).ends_with("33.3%"));
        assert!(progress_message(200, 300).ends_with("66.7%"));
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_new_rejects_empty_content_and_zero_delay() {
        let (events, _rx) = EventSink::channel();
        let err = TypingSession::new(
            "",
            SessionOptions::default(),
            CancelToken::new(),
            events.clone(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, TyperError::UserInput(UserInputError::EmptyContent)));

        let options = SessionOptions {
            delay: Duration::ZERO,
            ..SessionOptions::default()
        };
        let err = TypingSession::new("abc", options, CancelToken::new(), events)
            .err()
            .unwrap();
        assert!(matches!(err, TyperError::UserInput(UserInputError::InvalidDelay)));
    }

    #[test]
    fn test_new_session_starts_idle() {
        let (events, _rx) = EventSink::channel();
        let session =
            TypingSession::new("héllo", SessionOptions::default(), CancelToken::new(), events)
                .unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.len(), 5);
        assert!(!session.state().is_active());
        assert!(!session.state().is_terminal());
    }

    #[test]
    fn test_state_classification() {
        assert!(SessionState::ArmingDelay.is_active());
        assert!(SessionState::Running.is_active());
        for state in [
            SessionState::Paused,
            SessionState::Cancelled,
            SessionState::Completed,
            SessionState::Failed,
        ] {
            assert!(state.is_terminal());
            assert!(!state.is_active());
        }
    }
}
