use std::fmt;

use serde::{Deserialize, Serialize};
use stopwatch_core::{DisplayFormat, FormatError};

pub const DEFAULT_INTERVAL_MS: u32 = 100;
pub const DEFAULT_FORMAT: &str = "hh:mm:ss.SSS";
pub const MIN_INTERVAL_MS: u32 = 1;
pub const MAX_INTERVAL_MS: u32 = 1000;
pub const INTERVAL_HINT: &str = "Valid value range is 1~1000";

#[derive(Debug)]
pub enum SettingsError {
    NotInteger,
    OutOfRange(String),
    Format(FormatError),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SettingsError::NotInteger => write!(f, "Value should be an integer"),
            SettingsError::OutOfRange(value) => write!(f, "Interval value out of range: {}", value),
            SettingsError::Format(e) => write!(f, "Invalid time format: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Format(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FormatError> for SettingsError {
    fn from(e: FormatError) -> Self {
        SettingsError::Format(e)
    }
}

/// Parse a refresh interval typed by the user. Accepts only plain digits
/// within `MIN_INTERVAL_MS..=MAX_INTERVAL_MS`.
pub fn parse_interval(src: &str) -> Result<u32, SettingsError> {
    let value = src.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SettingsError::NotInteger);
    }
    match value.parse::<u32>() {
        Ok(i) if (MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(&i) => Ok(i),
        _ => Err(SettingsError::OutOfRange(value.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub interval: u32,
    pub format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL_MS,
            format: DEFAULT_FORMAT.to_string(),
        }
    }
}

impl Settings {
    /// Replace stored values that would be rejected if typed in, field by field.
    pub fn sanitized(mut self) -> Self {
        if !(MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(&self.interval) {
            log::warn!(
                "stored interval {} out of range, using {}",
                self.interval,
                DEFAULT_INTERVAL_MS
            );
            self.interval = DEFAULT_INTERVAL_MS;
        }
        if let Err(e) = DisplayFormat::parse(&self.format) {
            log::warn!("stored format {:?} invalid ({}), using {}", self.format, e, DEFAULT_FORMAT);
            self.format = DEFAULT_FORMAT.to_string();
        }
        self
    }

    /// Validate and apply a new interval. On error the current value is kept.
    pub fn set_interval(&mut self, src: &str) -> Result<u32, SettingsError> {
        let interval = parse_interval(src)?;
        self.interval = interval;
        Ok(interval)
    }

    /// Validate and apply a new format template. On error the current value is kept.
    pub fn set_format(&mut self, src: &str) -> Result<DisplayFormat, SettingsError> {
        let format = DisplayFormat::parse(src)?;
        self.format = src.to_string();
        Ok(format)
    }

    pub fn display_format(&self) -> DisplayFormat {
        DisplayFormat::parse(&self.format)
            .unwrap_or_else(|_| DisplayFormat::Fixed { show_milliseconds: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval("1").unwrap(), 1);
        assert_eq!(parse_interval(" 250 ").unwrap(), 250);
        assert_eq!(parse_interval("1000").unwrap(), 1000);
    }

    #[test]
    fn test_parse_interval_rejects() {
        assert!(matches!(parse_interval(""), Err(SettingsError::NotInteger)));
        assert!(matches!(parse_interval("12.5"), Err(SettingsError::NotInteger)));
        assert!(matches!(parse_interval("-3"), Err(SettingsError::NotInteger)));
        assert!(matches!(parse_interval("abc"), Err(SettingsError::NotInteger)));
        assert!(matches!(parse_interval("0"), Err(SettingsError::OutOfRange(_))));
        assert!(matches!(parse_interval("1001"), Err(SettingsError::OutOfRange(_))));
        assert!(matches!(
            parse_interval("99999999999999999999"),
            Err(SettingsError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(parse_interval("x").unwrap_err().to_string(), "Value should be an integer");
        assert_eq!(
            parse_interval("1500").unwrap_err().to_string(),
            "Interval value out of range: 1500"
        );
    }

    #[test]
    fn test_rejected_interval_keeps_prior() {
        let mut settings = Settings::default();
        settings.set_interval("250").unwrap();
        assert!(settings.set_interval("1500").is_err());
        assert_eq!(settings.interval, 250);
    }

    #[test]
    fn test_rejected_format_keeps_prior() {
        let mut settings = Settings::default();
        settings.set_format("mm:ss").unwrap();
        let err = settings.set_format("[mm:ss").unwrap_err();
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(settings.format, "mm:ss");
    }

    #[test]
    fn test_uppercase_and_calendar_formats() {
        let mut settings = Settings::default();
        let format = settings.set_format("HH:mm:ss").unwrap();
        assert_eq!(format.render(3_725_000), "01:02:05");
        assert!(matches!(settings.set_format("YYYY hh"), Err(SettingsError::Format(_))));
        assert_eq!(settings.format, "HH:mm:ss");
    }

    #[test]
    fn test_sanitized() {
        let stored = Settings {
            interval: 0,
            format: "hh:hh".to_string(),
        };
        assert_eq!(stored.sanitized(), Settings::default());

        let good = Settings {
            interval: 500,
            format: "mm:ss".to_string(),
        };
        assert_eq!(good.clone().sanitized(), good);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"interval": 40}"#).unwrap();
        assert_eq!(settings.interval, 40);
        assert_eq!(settings.format, DEFAULT_FORMAT);
    }
}
