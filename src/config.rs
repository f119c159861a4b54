//! JSON configuration for the typing host.

use crate::error::{Result, TyperError};
use crate::keys::KeyCombo;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Pause between two typed characters.
    #[serde(
        default = "default_delay",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub delay: Duration,

    /// Send `input_method_hotkey` before typing starts.
    #[serde(default = "default_true")]
    pub switch_input_method: bool,

    #[serde(default = "default_input_method_hotkey")]
    pub input_method_hotkey: String,

    /// Global hotkey that cancels the running session.
    #[serde(default = "default_cancel_hotkey")]
    pub cancel_hotkey: String,

    /// Pause the session when the target window loses focus.
    ///
    /// Once armed, every character costs one foreground-window query. On
    /// Windows that is a cheap API call, but Linux spawns `xdotool` and macOS
    /// spawns `osascript` (around 100 ms each), which adds to `delay`.
    #[serde(default = "default_true")]
    pub detect_focus_loss: bool,

    #[serde(default = "default_draft_path")]
    pub draft_path: PathBuf,

    #[serde(default)]
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delay: default_delay(),
            switch_input_method: true,
            input_method_hotkey: default_input_method_hotkey(),
            cancel_hotkey: default_cancel_hotkey(),
            detect_focus_loss: true,
            draft_path: default_draft_path(),
            verbose: false,
        }
    }
}

fn default_delay() -> Duration {
    Duration::from_millis(10)
}

fn default_true() -> bool {
    true
}

fn default_input_method_hotkey() -> String {
    "ctrl+space".to_string()
}

fn default_cancel_hotkey() -> String {
    "ctrl+alt+x".to_string()
}

fn default_draft_path() -> PathBuf {
    PathBuf::from("draft.txt")
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| TyperError::config_load(path, e.to_string()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| TyperError::config_load(path, e.to_string()))?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| TyperError::config_save(path, e.to_string()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.delay.is_zero() {
            return Err(TyperError::config_validation(
                "delay must be greater than zero",
            ));
        }

        if self.switch_input_method {
            KeyCombo::parse(&self.input_method_hotkey)?;
        }

        KeyCombo::parse(&self.cancel_hotkey)?;

        if self.draft_path.as_os_str().is_empty() {
            return Err(TyperError::config_validation("draft_path cannot be empty"));
        }

        Ok(())
    }

    /// The parsed input-method hotkey, or `None` when switching is disabled.
    pub fn input_method_combo(&self) -> Result<Option<KeyCombo>> {
        if !self.switch_input_method {
            return Ok(None);
        }
        KeyCombo::parse(&self.input_method_hotkey).map(Some)
    }
}

/// Unit suffix of a duration string.
#[derive(Clone, Copy)]
enum Unit {
    Nanos,
    Micros,
    Millis,
    Secs,
    Minutes,
}

impl Unit {
    fn split(s: &str) -> (&str, Unit) {
        for (suffix, unit) in [
            ("ns", Unit::Nanos),
            ("us", Unit::Micros),
            ("ms", Unit::Millis),
            ("s", Unit::Secs),
            ("m", Unit::Minutes),
        ] {
            if let Some(n) = s.strip_suffix(suffix) {
                return (n.trim(), unit);
            }
        }
        (s, Unit::Millis)
    }

    fn whole(self, n: u64) -> Option<Duration> {
        match self {
            Unit::Nanos => Some(Duration::from_nanos(n)),
            Unit::Micros => Some(Duration::from_micros(n)),
            Unit::Millis => Some(Duration::from_millis(n)),
            Unit::Secs => Some(Duration::from_secs(n)),
            Unit::Minutes => n.checked_mul(60).map(Duration::from_secs),
        }
    }

    fn secs(self) -> f64 {
        match self {
            Unit::Nanos => 1e-9,
            Unit::Micros => 1e-6,
            Unit::Millis => 1e-3,
            Unit::Secs => 1.0,
            Unit::Minutes => 60.0,
        }
    }
}

/// Parses `"10ms"`, `"0.5s"`, `"2m"`, `"250us"`, `"100ns"` or a bare number
/// of milliseconds.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let trimmed = s.trim().to_lowercase();
    if trimmed.is_empty() {
        return Err(TyperError::invalid_duration(s, "empty value"));
    }

    let (number, unit) = Unit::split(&trimmed);

    if let Ok(whole) = number.parse::<u64>() {
        return unit
            .whole(whole)
            .ok_or_else(|| TyperError::invalid_duration(s, "too large"));
    }

    let value: f64 = number
        .parse()
        .map_err(|_| TyperError::invalid_duration(s, "expected a number with ns, us, ms, s or m"))?;

    if !value.is_finite() || value < 0.0 {
        return Err(TyperError::invalid_duration(s, "must be a non-negative number"));
    }

    Duration::try_from_secs_f64(value * unit.secs())
        .map_err(|_| TyperError::invalid_duration(s, "too large"))
}

fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Millis(u64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Text(s) => parse_duration(&s).map_err(serde::de::Error::custom),
        Raw::Millis(ms) => Ok(Duration::from_millis(ms)),
    }
}

/// Writes whole milliseconds as `"Nms"` and anything finer as `"Nns"`, so
/// every delay reads back unchanged.
fn serialize_duration<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if duration.subsec_nanos() % 1_000_000 == 0 {
        serializer.serialize_str(&format!("{}ms", duration.as_millis()))
    } else {
        serializer.serialize_str(&format!("{}ns", duration.as_nanos()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("10ms").unwrap(), Duration::from_millis(10));
        assert_eq!(parse_duration("1000").unwrap(), Duration::from_millis(1000));
        assert_eq!(parse_duration("5S").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration(" 2m ").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("0.5s").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("250us").unwrap(), Duration::from_micros(250));
        assert_eq!(parse_duration("100ns").unwrap(), Duration::from_nanos(100));
        assert_eq!(parse_duration("0.0001ms").unwrap(), Duration::from_nanos(100));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("fast").is_err());
        assert!(parse_duration("10x").is_err());
        assert!(parse_duration("-5ms").is_err());
        assert!(parse_duration("1e30s").is_err());
        assert!(parse_duration("1e25").is_err());
        assert!(parse_duration("18446744073709551615m").is_err());
    }

    #[test]
    fn test_oversized_delay_in_json_is_an_error() {
        let result = serde_json::from_str::<Config>(r#"{ "delay": "1e25" }"#);
        assert!(result.unwrap_err().to_string().contains("too large"));
    }

    #[test]
    fn test_sub_millisecond_delay_survives_roundtrip() {
        let config = Config {
            delay: Duration::from_nanos(100),
            ..Config::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""delay":"100ns""#));

        let loaded: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.delay, Duration::from_nanos(100));
        assert!(loaded.validate().is_ok());

        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains(r#""delay":"10ms""#));
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.delay, Duration::from_millis(10));
        assert!(config.switch_input_method);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_delay_is_rejected() {
        let config = Config {
            delay: Duration::ZERO,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_input_method_combo_disabled() {
        let config = Config {
            switch_input_method: false,
            input_method_hotkey: "not a key".to_string(),
            ..Config::default()
        };
        assert!(config.input_method_combo().unwrap().is_none());
        assert!(config.validate().is_ok());
    }
}
