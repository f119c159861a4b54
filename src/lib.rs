//! # Auto Typer
//!
//! Types a block of text into whichever window has keyboard focus, one
//! character at a time, as if a person were typing it.
//!
//! ## Features
//!
//! - Configurable delay between characters
//! - Optional input-method switch hotkey before typing starts
//! - Five second arming delay to click into the target window
//! - Pauses when the target window loses focus, and resumes from there
//! - Cooperative cancellation, including a global hotkey
//! - Load text from files or the clipboard, save drafts
//!
//! ## Example
//!
//! ```no_run
//! use auto_typer::{Config, SessionHost, SystemPlatform};
//!
//! # async fn demo() -> auto_typer::Result<()> {
//! let mut host = SessionHost::new(SystemPlatform, Config::default());
//! host.set_buffer("Hello from auto-typer!");
//! host.start()?;
//!
//! while let Some(event) = host.next_event().await {
//!     if let auto_typer::SessionEvent::Finished(report) = event {
//!         println!("finished: {:?}", report.state);
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```json
//! {
//!   "delay": "10ms",
//!   "switch_input_method": true,
//!   "input_method_hotkey": "ctrl+space",
//!   "cancel_hotkey": "ctrl+alt+x"
//! }
//! ```

pub mod alert;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod events;
pub mod focus;
pub mod global_hotkey;
pub mod host;
pub mod key_sender;
pub mod keys;
pub mod platform;
pub mod session;

pub use config::Config;
pub use error::{FocusQueryError, InjectionError, Result, TyperError, UserInputError};
pub use events::{LogEvent, SessionEvent};
pub use global_hotkey::HotkeyManager;
pub use host::{ResumeOutcome, SessionHost};
pub use key_sender::{KeySender, KeystrokeInjector};
pub use keys::KeyCombo;
pub use platform::{Platform, SystemPlatform};
pub use session::{CancelToken, SessionReport, SessionState, TypingSession};
