//! Construction of the OS collaborators a session needs.
//!
//! Input backends are not always `Send`, so a session receives a
//! [`Platform`] and builds its injector, oracle and alert on the worker
//! thread that uses them.

use crate::alert::{Alert, Beeper};
use crate::error::InjectionError;
use crate::focus::{FocusOracle, ForegroundWindowOracle};
use crate::key_sender::{KeySender, KeystrokeInjector};
use std::time::Duration;

/// Blocks the worker thread between steps.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

pub trait Platform: Send + Sync + 'static {
    fn injector(&self) -> Result<Box<dyn KeystrokeInjector>, InjectionError>;

    fn focus_oracle(&self) -> Box<dyn FocusOracle>;

    fn alert(&self) -> Box<dyn Alert>;

    fn sleeper(&self) -> Box<dyn Sleeper> {
        Box::new(ThreadSleeper)
    }
}

/// The real keyboard, window manager and speaker.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPlatform;

impl Platform for SystemPlatform {
    fn injector(&self) -> Result<Box<dyn KeystrokeInjector>, InjectionError> {
        Ok(Box::new(KeySender::new()?))
    }

    fn focus_oracle(&self) -> Box<dyn FocusOracle> {
        Box::new(ForegroundWindowOracle::new())
    }

    fn alert(&self) -> Box<dyn Alert> {
        Box::new(Beeper)
    }
}
