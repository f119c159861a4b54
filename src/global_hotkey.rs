//! System-wide cancel hotkey.
//!
//! While a session types into another application the terminal does not
//! have focus, so Ctrl+C cannot reach us. A global hotkey can.

use crate::error::{Result, TyperError};
use crate::keys::{KeyCombo, KeyName, Modifier};
use crate::session::CancelToken;
use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct HotkeyManager {
    manager: GlobalHotKeyManager,
    hotkey: Option<HotKey>,
    target: Arc<Mutex<Option<CancelToken>>>,
    stop: Arc<AtomicBool>,
}

impl HotkeyManager {
    pub fn new() -> Result<Self> {
        let manager = GlobalHotKeyManager::new()
            .map_err(|e| TyperError::hotkey(format!("failed to create hotkey manager: {e}")))?;

        Ok(Self {
            manager,
            hotkey: None,
            target: Arc::new(Mutex::new(None)),
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn register_cancel_hotkey(&mut self, combo: &KeyCombo) -> Result<()> {
        let hotkey = to_hotkey(combo)?;
        self.manager
            .register(hotkey)
            .map_err(|e| TyperError::hotkey(format!("failed to register '{combo}': {e}")))?;
        self.hotkey = Some(hotkey);

        info!(%combo, "global cancel hotkey registered");
        Ok(())
    }

    /// Makes the hotkey cancel `token` until [`HotkeyManager::release`].
    pub fn watch(&self, token: CancelToken) {
        if let Ok(mut slot) = self.target.lock() {
            *slot = Some(token);
        }
    }

    pub fn release(&self) {
        if let Ok(mut slot) = self.target.lock() {
            *slot = None;
        }
    }

    /// Polls hotkey events on a background thread until the manager drops.
    pub fn start_listener(&self) -> Result<()> {
        let Some(hotkey) = self.hotkey else {
            return Err(TyperError::hotkey("no hotkey registered"));
        };
        let receiver = GlobalHotKeyEvent::receiver();
        let target = Arc::clone(&self.target);
        let stop = Arc::clone(&self.stop);

        std::thread::Builder::new()
            .name("cancel-hotkey".into())
            .spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    if let Ok(event) = receiver.try_recv() {
                        if event.id == hotkey.id() && event.state == HotKeyState::Pressed {
                            match target.lock().ok().and_then(|slot| slot.clone()) {
                                Some(token) => {
                                    token.cancel();
                                    warn!("cancel hotkey pressed, stopping session");
                                }
                                None => debug!("cancel hotkey pressed with no session running"),
                            }
                        }
                    }

                    // Small sleep to prevent busy waiting
                    std::thread::sleep(Duration::from_millis(10));
                }
            })?;

        Ok(())
    }
}

impl Drop for HotkeyManager {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(hotkey) = self.hotkey.take() {
            let _ = self.manager.unregister(hotkey);
        }
    }
}

fn to_hotkey(combo: &KeyCombo) -> Result<HotKey> {
    let mut modifiers = Modifiers::empty();
    for modifier in &combo.modifiers {
        modifiers |= match modifier {
            Modifier::Control => Modifiers::CONTROL,
            Modifier::Alt => Modifiers::ALT,
            Modifier::Shift => Modifiers::SHIFT,
            Modifier::Meta => Modifiers::SUPER,
        };
    }

    let code = key_code(combo.key).ok_or_else(|| {
        TyperError::invalid_key_combination(combo.to_string(), "key cannot be a global hotkey")
    })?;

    Ok(HotKey::new(Some(modifiers), code))
}

fn key_code(key: KeyName) -> Option<Code> {
    let code = match key {
        KeyName::Char(c) => return char_code(c),
        KeyName::Function(n) => match n {
            1 => Code::F1,
            2 => Code::F2,
            3 => Code::F3,
            4 => Code::F4,
            5 => Code::F5,
            6 => Code::F6,
            7 => Code::F7,
            8 => Code::F8,
            9 => Code::F9,
            10 => Code::F10,
            11 => Code::F11,
            12 => Code::F12,
            _ => return None,
        },
        KeyName::Space => Code::Space,
        KeyName::Enter => Code::Enter,
        KeyName::Tab => Code::Tab,
        KeyName::Escape => Code::Escape,
        KeyName::Backspace => Code::Backspace,
        KeyName::Delete => Code::Delete,
        KeyName::Home => Code::Home,
        KeyName::End => Code::End,
        KeyName::PageUp => Code::PageUp,
        KeyName::PageDown => Code::PageDown,
        KeyName::Up => Code::ArrowUp,
        KeyName::Down => Code::ArrowDown,
        KeyName::Left => Code::ArrowLeft,
        KeyName::Right => Code::ArrowRight,
    };
    Some(code)
}

fn char_code(c: char) -> Option<Code> {
    let code = match c.to_ascii_lowercase() {
        'a' => Code::KeyA,
        'b' => Code::KeyB,
        'c' => Code::KeyC,
        'd' => Code::KeyD,
        'e' => Code::KeyE,
        'f' => Code::KeyF,
        'g' => Code::KeyG,
        'h' => Code::KeyH,
        'i' => Code::KeyI,
        'j' => Code::KeyJ,
        'k' => Code::KeyK,
        'l' => Code::KeyL,
        'm' => Code::KeyM,
        'n' => Code::KeyN,
        'o' => Code::KeyO,
        'p' => Code::KeyP,
        'q' => Code::KeyQ,
        'r' => Code::KeyR,
        's' => Code::KeyS,
        't' => Code::KeyT,
        'u' => Code::KeyU,
        'v' => Code::KeyV,
        'w' => Code::KeyW,
        'x' => Code::KeyX,
        'y' => Code::KeyY,
        'z' => Code::KeyZ,
        '0' => Code::Digit0,
        '1' => Code::Digit1,
        '2' => Code::Digit2,
        '3' => Code::Digit3,
        '4' => Code::Digit4,
        '5' => Code::Digit5,
        '6' => Code::Digit6,
        '7' => Code::Digit7,
        '8' => Code::Digit8,
        '9' => Code::Digit9,
        _ => return None,
    };
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cancel_combo_converts() {
        let combo = KeyCombo::parse("ctrl+alt+x").unwrap();
        let hotkey = to_hotkey(&combo).unwrap();
        assert_eq!(hotkey, HotKey::new(Some(Modifiers::CONTROL | Modifiers::ALT), Code::KeyX));
    }

    #[test]
    fn test_key_codes() {
        assert_eq!(key_code(KeyName::Function(7)), Some(Code::F7));
        assert_eq!(key_code(KeyName::Char('5')), Some(Code::Digit5));
        assert_eq!(char_code('é'), None);
    }
}
