//! Messages sent from a session worker back to its host.

use crate::session::{SessionReport, SessionState};
use chrono::{DateTime, Local};
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// One line of the session log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl LogEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Log(LogEvent),
    State(SessionState),
    /// Always the last event of a run.
    Finished(SessionReport),
}

pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// Sending half of the session event channel.
///
/// Sends never block and are dropped silently once the host has gone.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl EventSink {
    pub fn channel() -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn log(&self, message: impl Into<String>) {
        let event = LogEvent::new(message);
        info!(target: "auto_typer::session", "{}", event.message);
        self.send(SessionEvent::Log(event));
    }

    pub fn state(&self, state: SessionState) {
        debug!(?state, "session state changed");
        self.send(SessionEvent::State(state));
    }

    pub fn finished(&self, report: SessionReport) {
        self.send(SessionEvent::Finished(report));
    }

    fn send(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            debug!("session event dropped, host is gone");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_log_event_display() {
        let event = LogEvent {
            timestamp: Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            message: "hello".to_string(),
        };
        assert_eq!(event.to_string(), "[03:04:05] hello");
    }

    #[test]
    fn test_sink_delivers_in_order() {
        let (sink, mut rx) = EventSink::channel();
        sink.log("first");
        sink.state(SessionState::Running);

        match rx.try_recv() {
            Ok(SessionEvent::Log(log)) => assert_eq!(log.message, "first"),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(rx.try_recv().ok(), Some(SessionEvent::State(SessionState::Running)));
    }

    #[test]
    fn test_send_after_host_gone_is_silent() {
        let (sink, rx) = EventSink::channel();
        drop(rx);
        sink.log("nobody listening");
    }
}
