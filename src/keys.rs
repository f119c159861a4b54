//! Key combinations such as `ctrl+space` or `ctrl+alt+x`.
//!
//! A [`KeyCombo`] is backend-neutral; [`crate::key_sender`] turns it into
//! enigo keys and [`crate::global_hotkey`] into a registered hotkey.

use crate::error::{Result, TyperError};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Control,
    Alt,
    Shift,
    Meta,
}

impl Modifier {
    fn as_str(self) -> &'static str {
        match self {
            Modifier::Control => "ctrl",
            Modifier::Alt => "alt",
            Modifier::Shift => "shift",
            Modifier::Meta => "meta",
        }
    }
}

/// The non-modifier key of a combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyName {
    /// A lowercase ASCII letter or a digit.
    Char(char),
    Function(u8),
    Space,
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
}

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyName::Char(c) => write!(f, "{c}"),
            KeyName::Function(n) => write!(f, "f{n}"),
            KeyName::Space => f.write_str("space"),
            KeyName::Enter => f.write_str("enter"),
            KeyName::Tab => f.write_str("tab"),
            KeyName::Escape => f.write_str("escape"),
            KeyName::Backspace => f.write_str("backspace"),
            KeyName::Delete => f.write_str("delete"),
            KeyName::Home => f.write_str("home"),
            KeyName::End => f.write_str("end"),
            KeyName::PageUp => f.write_str("pageup"),
            KeyName::PageDown => f.write_str("pagedown"),
            KeyName::Up => f.write_str("up"),
            KeyName::Down => f.write_str("down"),
            KeyName::Left => f.write_str("left"),
            KeyName::Right => f.write_str("right"),
        }
    }
}

/// Zero or more modifiers plus exactly one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub modifiers: Vec<Modifier>,
    pub key: KeyName,
}

impl KeyCombo {
    pub fn parse(combo: &str) -> Result<Self> {
        let binding = combo.to_lowercase();
        let parts: Vec<&str> = binding.split('+').map(str::trim).collect();

        if binding.trim().is_empty() {
            return Err(TyperError::invalid_key_combination(combo, "empty combination"));
        }

        let mut modifiers = Vec::new();
        let mut key = None;

        for part in &parts {
            let modifier = match *part {
                "ctrl" | "control" => Some(Modifier::Control),
                "alt" | "option" => Some(Modifier::Alt),
                "shift" => Some(Modifier::Shift),
                "meta" | "cmd" | "super" | "win" => Some(Modifier::Meta),
                _ => None,
            };

            match modifier {
                Some(m) if !modifiers.contains(&m) => modifiers.push(m),
                Some(_) => {}
                None => {
                    if key.is_some() {
                        return Err(TyperError::invalid_key_combination(
                            combo,
                            "more than one non-modifier key",
                        ));
                    }
                    key = Some(parse_key_name(part).ok_or_else(|| {
                        TyperError::invalid_key_combination(
                            combo,
                            format!("unsupported key '{part}'"),
                        )
                    })?);
                }
            }
        }

        let key =
            key.ok_or_else(|| TyperError::invalid_key_combination(combo, "no key specified"))?;

        Ok(Self { modifiers, key })
    }
}

impl FromStr for KeyCombo {
    type Err = TyperError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in &self.modifiers {
            write!(f, "{}+", m.as_str())?;
        }
        write!(f, "{}", self.key)
    }
}

fn parse_key_name(key: &str) -> Option<KeyName> {
    let name = match key {
        "space" => KeyName::Space,
        "enter" | "return" => KeyName::Enter,
        "tab" => KeyName::Tab,
        "escape" | "esc" => KeyName::Escape,
        "backspace" => KeyName::Backspace,
        "delete" | "del" => KeyName::Delete,
        "home" => KeyName::Home,
        "end" => KeyName::End,
        "pageup" => KeyName::PageUp,
        "pagedown" => KeyName::PageDown,
        "up" | "arrowup" => KeyName::Up,
        "down" | "arrowdown" => KeyName::Down,
        "left" | "arrowleft" => KeyName::Left,
        "right" | "arrowright" => KeyName::Right,
        _ => {
            if let Some(n) = key.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                return (1..=12).contains(&n).then_some(KeyName::Function(n));
            }
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphanumeric() => KeyName::Char(c),
                _ => return None,
            }
        }
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input_method_combo() {
        let combo = KeyCombo::parse("Ctrl+Space").unwrap();
        assert_eq!(combo.modifiers, vec![Modifier::Control]);
        assert_eq!(combo.key, KeyName::Space);
        assert_eq!(combo.to_string(), "ctrl+space");
    }

    #[test]
    fn test_parse_multiple_modifiers() {
        let combo: KeyCombo = "ctrl + alt + x".parse().unwrap();
        assert_eq!(combo.modifiers, vec![Modifier::Control, Modifier::Alt]);
        assert_eq!(combo.key, KeyName::Char('x'));
    }

    #[test]
    fn test_parse_function_and_bare_keys() {
        assert_eq!(KeyCombo::parse("f12").unwrap().key, KeyName::Function(12));
        assert_eq!(KeyCombo::parse("shift+7").unwrap().key, KeyName::Char('7'));
        assert!(KeyCombo::parse("f13").is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(KeyCombo::parse("").is_err());
        assert!(KeyCombo::parse("ctrl+alt").is_err());
        assert!(KeyCombo::parse("a+b").is_err());
        assert!(KeyCombo::parse("ctrl+banana").is_err());
    }
}
