//! Keystroke injection.
//!
//! [`KeystrokeInjector`] is the seam the typing session talks to;
//! [`KeySender`] implements it with `enigo`, which synthesizes OS-level
//! input events for whichever window has focus.

use crate::error::InjectionError;
use crate::keys::{KeyCombo, KeyName, Modifier};
use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use tracing::{debug, trace};

/// Something that can type into the focused window.
pub trait KeystrokeInjector {
    /// Types one character as if the user pressed it.
    fn inject_char(&mut self, ch: char) -> Result<(), InjectionError>;

    /// Presses the combination's modifiers, clicks its key, then releases
    /// the modifiers in reverse order.
    fn issue_hotkey(&mut self, combo: &KeyCombo) -> Result<(), InjectionError>;
}

pub struct KeySender {
    enigo: Enigo,
}

impl KeySender {
    pub fn new() -> Result<Self, InjectionError> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| InjectionError::backend(format!("{e:?}")))?;
        debug!("keyboard backend initialised");
        Ok(Self { enigo })
    }
}

impl KeystrokeInjector for KeySender {
    fn inject_char(&mut self, ch: char) -> Result<(), InjectionError> {
        trace!(?ch, "typing character");
        let result = match ch {
            // Carriage returns are dropped so CRLF text yields a single Enter.
            '\r' => return Ok(()),
            '\n' => self.enigo.key(Key::Return, Direction::Click),
            '\t' => self.enigo.key(Key::Tab, Direction::Click),
            _ => {
                let mut buf = [0u8; 4];
                self.enigo.text(ch.encode_utf8(&mut buf))
            }
        };
        result.map_err(|e| InjectionError::char(ch, format!("{e:?}")))
    }

    fn issue_hotkey(&mut self, combo: &KeyCombo) -> Result<(), InjectionError> {
        let fail =
            |e: enigo::InputError| InjectionError::hotkey(combo.to_string(), format!("{e:?}"));
        debug!(%combo, "sending hotkey");

        let mut pressed = Vec::with_capacity(combo.modifiers.len());
        let mut outcome = Ok(());
        for modifier in &combo.modifiers {
            let key = modifier_key(*modifier);
            if let Err(e) = self.enigo.key(key, Direction::Press) {
                outcome = Err(fail(e));
                break;
            }
            pressed.push(key);
        }

        if outcome.is_ok() {
            outcome = self
                .enigo
                .key(combo_key(combo.key), Direction::Click)
                .map_err(fail);
        }

        // Always release what was pressed so no modifier is left stuck down.
        for key in pressed.into_iter().rev() {
            if let Err(e) = self.enigo.key(key, Direction::Release) {
                if outcome.is_ok() {
                    outcome = Err(fail(e));
                }
            }
        }

        outcome
    }
}

fn modifier_key(modifier: Modifier) -> Key {
    match modifier {
        Modifier::Control => Key::Control,
        Modifier::Alt => Key::Alt,
        Modifier::Shift => Key::Shift,
        Modifier::Meta => Key::Meta,
    }
}

fn combo_key(key: KeyName) -> Key {
    match key {
        KeyName::Char(c) => Key::Unicode(c),
        KeyName::Function(n) => function_key(n),
        KeyName::Space => Key::Space,
        KeyName::Enter => Key::Return,
        KeyName::Tab => Key::Tab,
        KeyName::Escape => Key::Escape,
        KeyName::Backspace => Key::Backspace,
        KeyName::Delete => Key::Delete,
        KeyName::Home => Key::Home,
        KeyName::End => Key::End,
        KeyName::PageUp => Key::PageUp,
        KeyName::PageDown => Key::PageDown,
        KeyName::Up => Key::UpArrow,
        KeyName::Down => Key::DownArrow,
        KeyName::Left => Key::LeftArrow,
        KeyName::Right => Key::RightArrow,
    }
}

fn function_key(n: u8) -> Key {
    match n {
        1 => Key::F1,
        2 => Key::F2,
        3 => Key::F3,
        4 => Key::F4,
        5 => Key::F5,
        6 => Key::F6,
        7 => Key::F7,
        8 => Key::F8,
        9 => Key::F9,
        10 => Key::F10,
        11 => Key::F11,
        _ => Key::F12,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combo_key_mapping() {
        assert_eq!(combo_key(KeyName::Space), Key::Space);
        assert_eq!(combo_key(KeyName::Char('x')), Key::Unicode('x'));
        assert_eq!(combo_key(KeyName::Function(5)), Key::F5);
        assert_eq!(modifier_key(Modifier::Meta), Key::Meta);
    }
}
