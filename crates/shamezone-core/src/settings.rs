//! User-facing settings: tone, reminder time, test mode.
//!
//! These are stored alongside goals in the key-value store (not in the TOML
//! config, which holds engine tuning).

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Reminder severity and cadence policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tone {
    #[default]
    #[serde(rename = "soft")]
    Soft,
    #[serde(rename = "tryMe")]
    TryMe,
    #[serde(rename = "nuclear")]
    Nuclear,
}

impl Tone {
    pub const ALL: [Tone; 3] = [Tone::Soft, Tone::TryMe, Tone::Nuclear];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Soft => "soft",
            Tone::TryMe => "tryMe",
            Tone::Nuclear => "nuclear",
        }
    }

    /// Parse a tone name, falling back to `Soft` for anything unrecognized.
    pub fn from_name_or_soft(name: &str) -> Tone {
        name.parse().unwrap_or(Tone::Soft)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Tone::Soft => "Gentle nudge at the time you pick",
            Tone::TryMe => "Pointed reminders, no mercy on timing",
            Tone::Nuclear => "Three surprise attacks a day between 7am and 11pm",
        }
    }

    /// Whether the user can pick a fixed reminder time for this tone.
    pub fn has_time_picker(&self) -> bool {
        matches!(self, Tone::Soft)
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "soft" => Ok(Tone::Soft),
            "tryMe" | "try-me" | "tryme" => Ok(Tone::TryMe),
            "nuclear" => Ok(Tone::Nuclear),
            _ => Err(ValidationError::UnknownName {
                kind: "tone",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub tone: Tone,
    /// Fixed reminder time as `HH:MM`; only honored for the soft tone.
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub test_mode: bool,
}

impl Settings {
    /// The configured reminder time, if present and parseable.
    pub fn fixed_time(&self) -> Option<NaiveTime> {
        self.time.as_deref().and_then(parse_time_of_day)
    }
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_serde_names() {
        assert_eq!(serde_json::to_string(&Tone::TryMe).unwrap(), "\"tryMe\"");
        let t: Tone = serde_json::from_str("\"nuclear\"").unwrap();
        assert_eq!(t, Tone::Nuclear);
    }

    #[test]
    fn unknown_tone_falls_back_to_soft() {
        assert_eq!(Tone::from_name_or_soft("spicy"), Tone::Soft);
        assert_eq!(Tone::from_name_or_soft("tryMe"), Tone::TryMe);
    }

    #[test]
    fn invalid_time_is_treated_as_absent() {
        let mut settings = Settings {
            time: Some("08:45".into()),
            ..Default::default()
        };
        assert_eq!(settings.fixed_time(), NaiveTime::from_hms_opt(8, 45, 0));
        settings.time = Some("quarter past".into());
        assert_eq!(settings.fixed_time(), None);
        settings.time = Some("25:00".into());
        assert_eq!(settings.fixed_time(), None);
    }

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.tone, Tone::Soft);
        assert!(s.time.is_none());
        assert!(!s.test_mode);
    }
}
