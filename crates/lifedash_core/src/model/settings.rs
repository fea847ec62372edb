//! User settings singleton.
//!
//! Every field has a serde default so documents written before a field
//! existed still load.

use serde::{Deserialize, Serialize};

pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_SHORT_BREAK_MINUTES: u32 = 5;
pub const DEFAULT_LONG_BREAK_MINUTES: u32 = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub notifications: bool,
    #[serde(default = "default_sound")]
    pub sound: bool,
    #[serde(default = "default_work_duration")]
    pub work_duration: u32,
    #[serde(default = "default_short_break")]
    pub short_break: u32,
    #[serde(default = "default_long_break")]
    pub long_break: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: String::new(),
            notifications: false,
            sound: default_sound(),
            work_duration: default_work_duration(),
            short_break: default_short_break(),
            long_break: default_long_break(),
        }
    }
}

impl Settings {
    /// Returns a copy with every `Some` field of `patch` applied.
    pub fn merged(&self, patch: &SettingsPatch) -> Self {
        Self {
            name: patch.name.clone().unwrap_or_else(|| self.name.clone()),
            notifications: patch.notifications.unwrap_or(self.notifications),
            sound: patch.sound.unwrap_or(self.sound),
            work_duration: patch.work_duration.unwrap_or(self.work_duration),
            short_break: patch.short_break.unwrap_or(self.short_break),
            long_break: patch.long_break.unwrap_or(self.long_break),
        }
    }
}

/// Partial settings update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub name: Option<String>,
    pub notifications: Option<bool>,
    pub sound: Option<bool>,
    pub work_duration: Option<u32>,
    pub short_break: Option<u32>,
    pub long_break: Option<u32>,
}

fn default_sound() -> bool {
    true
}

fn default_work_duration() -> u32 {
    DEFAULT_WORK_MINUTES
}

fn default_short_break() -> u32 {
    DEFAULT_SHORT_BREAK_MINUTES
}

fn default_long_break() -> u32 {
    DEFAULT_LONG_BREAK_MINUTES
}

#[cfg(test)]
mod tests {
    use super::{Settings, SettingsPatch};

    #[test]
    fn merge_keeps_unspecified_fields() {
        let base = Settings {
            name: "Ada".to_string(),
            ..Settings::default()
        };
        let merged = base.merged(&SettingsPatch {
            sound: Some(false),
            work_duration: Some(50),
            ..SettingsPatch::default()
        });

        assert_eq!(merged.name, "Ada");
        assert!(!merged.sound);
        assert_eq!(merged.work_duration, 50);
        assert_eq!(merged.short_break, 5);
        assert_eq!(merged.long_break, 15);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"name":"Ada"}"#).unwrap();
        assert_eq!(settings.name, "Ada");
        assert!(settings.sound);
        assert_eq!(settings.work_duration, 25);
    }
}
