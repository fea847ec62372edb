//! Mood log entries.

use super::{EntityId, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mood score from 1 (worst) to 5 (best).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct MoodLevel(u8);

impl MoodLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(level: u8) -> Result<Self, ValidationError> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(Self(level))
        } else {
            Err(ValidationError::MoodLevelOutOfRange(level))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for MoodLevel {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MoodLevel> for u8 {
    fn from(value: MoodLevel) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mood {
    pub id: EntityId,
    pub level: MoodLevel,
    #[serde(default)]
    pub note: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMood {
    pub level: MoodLevel,
    pub note: String,
}

#[cfg(test)]
mod tests {
    use super::MoodLevel;
    use crate::model::ValidationError;

    #[test]
    fn mood_level_accepts_one_through_five() {
        for level in 1..=5 {
            assert_eq!(MoodLevel::new(level).unwrap().get(), level);
        }
        assert_eq!(
            MoodLevel::new(0),
            Err(ValidationError::MoodLevelOutOfRange(0))
        );
        assert!(MoodLevel::new(6).is_err());
    }

    #[test]
    fn mood_level_rejects_out_of_range_json() {
        assert!(serde_json::from_str::<MoodLevel>("3").is_ok());
        assert!(serde_json::from_str::<MoodLevel>("9").is_err());
    }
}
