//! The session host: the text buffer plus at most one running session.
//!
//! The host lives on the front-end's task. It never blocks on a worker;
//! it learns how a run ended by draining the session event channel, which
//! is also where the resume position is picked up.

use crate::clipboard::ClipboardSource;
use crate::config::Config;
use crate::error::{Result, TyperError, UserInputError};
use crate::events::{EventReceiver, EventSink, SessionEvent};
use crate::platform::Platform;
use crate::session::{
    CancelToken, SessionHandle, SessionOptions, SessionReport, SessionState, TypingSession,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of asking the host to resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// A new session was started at this offset of the original text.
    Started { from: usize, remaining: usize },
    NothingToResume,
}

/// The run the host is currently waiting on.
#[derive(Debug, Clone, Copy)]
struct Launch {
    id: u64,
    /// Offset into the original text the run started at.
    base: usize,
}

pub struct SessionHost<P: Platform> {
    platform: Arc<P>,
    config: Config,
    buffer: String,
    events: EventSink,
    receiver: EventReceiver,
    active: Option<SessionHandle>,
    /// Text of the last fresh start; resumes slice into it.
    original: Vec<char>,
    /// Set from launch until that run's `Finished` event is observed.
    current: Option<Launch>,
    next_launch: u64,
    /// Absolute offset to resume from; 0 when there is nothing to resume.
    resume_cursor: usize,
}

impl<P: Platform> SessionHost<P> {
    pub fn new(platform: P, config: Config) -> Self {
        let (events, receiver) = EventSink::channel();
        Self {
            platform: Arc::new(platform),
            config,
            buffer: String::new(),
            events,
            receiver,
            active: None,
            original: Vec::new(),
            current: None,
            next_launch: 1,
            resume_cursor: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn set_buffer(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
    }

    pub fn append(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Absolute offset the next [`SessionHost::resume`] would start from.
    pub fn resume_cursor(&self) -> usize {
        self.resume_cursor
    }

    /// True while a session is arming or typing.
    ///
    /// A worker that exits without reporting, such as one that panicked,
    /// stops counting as active once its thread is gone.
    pub fn is_active(&self) -> bool {
        self.current.is_some() && self.active.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Identifier of the run the host is waiting on, matching
    /// [`SessionReport::launch`].
    pub fn current_launch(&self) -> Option<u64> {
        self.current.map(|launch| launch.id)
    }

    /// The cancellation token of the running session, if any.
    pub fn active_cancel_token(&self) -> Option<CancelToken> {
        if !self.is_active() {
            return None;
        }
        self.active.as_ref().map(SessionHandle::cancel_token)
    }

    /// Starts typing the whole buffer, trimmed of surrounding whitespace.
    pub fn start(&mut self) -> Result<()> {
        self.ensure_idle()?;
        let content = self.buffer.trim();
        if content.is_empty() {
            return Err(UserInputError::EmptyContent.into());
        }
        self.original = content.chars().collect();
        self.resume_cursor = 0;
        self.launch(0)
    }

    /// Starts a new session over the text after the remembered cursor.
    pub fn resume(&mut self) -> Result<ResumeOutcome> {
        let cursor = self.resume_cursor;
        self.resume_from(cursor)
    }

    /// Starts a new session over the text of the last start, beginning at
    /// `cursor`. A cursor of 0 or past the end resumes nothing.
    pub fn resume_from(&mut self, cursor: usize) -> Result<ResumeOutcome> {
        self.ensure_idle()?;
        if self.original.is_empty() {
            self.original = self.buffer.trim().chars().collect();
        }

        let total = self.original.len();
        if cursor == 0 || cursor >= total {
            self.events.log("ℹ️ Nothing to resume.");
            return Ok(ResumeOutcome::NothingToResume);
        }

        self.launch(cursor)?;
        Ok(ResumeOutcome::Started {
            from: cursor,
            remaining: total - cursor,
        })
    }

    /// Requests cancellation of the running session.
    ///
    /// Returns false when nothing was running.
    pub fn cancel(&mut self) -> bool {
        match self.active.as_ref().filter(|_| self.is_active()) {
            Some(handle) => {
                handle.cancel();
                self.events.log("🛑 Cancellation requested by user.");
                true
            }
            None => false,
        }
    }

    /// Waits for the next session event and applies it to the host.
    ///
    /// Never returns `None` because the host keeps a sender alive.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        let event = self.receiver.recv().await?;
        self.observe(&event);
        Some(event)
    }

    /// Non-blocking variant of [`SessionHost::next_event`].
    pub fn try_next_event(&mut self) -> Option<SessionEvent> {
        let event = self.receiver.try_recv().ok()?;
        self.observe(&event);
        Some(event)
    }

    /// Cancels any running session and waits for its worker to exit.
    pub async fn shutdown(&mut self) -> Result<Option<SessionReport>> {
        let Some(handle) = self.active.take() else {
            return Ok(None);
        };
        handle.cancel();
        let report = handle.join().await?;
        while self.try_next_event().is_some() {}
        Ok(Some(report))
    }

    /// Writes the buffer to the configured draft path, overwriting it.
    pub fn save_draft(&self) -> Result<PathBuf> {
        let path = &self.config.draft_path;
        fs::write(path, &self.buffer)?;
        let absolute = fs::canonicalize(path).unwrap_or_else(|_| path.clone());
        info!(path = %absolute.display(), "draft saved");
        Ok(absolute)
    }

    /// Replaces the buffer with the contents of a UTF-8 text file.
    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let bytes = fs::read(path)?;
        let text = String::from_utf8(bytes).map_err(|_| UserInputError::InvalidEncoding {
            path: path.display().to_string(),
        })?;
        let chars = text.chars().count();
        self.buffer = text;
        info!(path = %path.display(), chars, "loaded text file");
        Ok(chars)
    }

    /// Appends the clipboard text to the buffer.
    pub fn append_clipboard(&mut self, clipboard: &dyn ClipboardSource) -> Result<usize> {
        let text = clipboard.read_text()?;
        if text.is_empty() {
            return Err(UserInputError::EmptyClipboard.into());
        }
        self.buffer.push_str(&text);
        Ok(text.chars().count())
    }

    fn ensure_idle(&mut self) -> Result<()> {
        if self.is_active() {
            return Err(TyperError::SessionActive);
        }
        self.active = None;
        Ok(())
    }

    fn launch(&mut self, from: usize) -> Result<()> {
        let content: String = self.original[from..].iter().collect();
        let options = SessionOptions::from_config(&self.config)?;
        let id = self.next_launch;
        let session =
            TypingSession::new(&content, options, CancelToken::new(), self.events.clone())?
                .with_launch(id);

        debug!(launch = id, from, chars = session.len(), "starting typing session");
        self.next_launch += 1;
        self.current = Some(Launch { id, base: from });
        self.active = Some(session.spawn(Arc::clone(&self.platform)));
        Ok(())
    }

    fn observe(&mut self, event: &SessionEvent) {
        let SessionEvent::Finished(report) = event else {
            return;
        };
        let Some(launch) = self.current.filter(|l| l.id == report.launch) else {
            debug!(?report, "ignoring report of an earlier run");
            return;
        };

        self.current = None;
        self.resume_cursor = match report.state {
            SessionState::Paused => launch.base + report.cursor,
            _ => 0,
        };
        debug!(?report, resume_cursor = self.resume_cursor, "session finished");
    }
}
