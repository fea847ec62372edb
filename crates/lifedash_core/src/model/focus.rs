//! Completed focus sessions.

use super::{EntityId, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One finished work phase. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSession {
    pub id: EntityId,
    pub date: DateTime<Utc>,
    /// Length of the work phase in minutes.
    pub duration: u32,
}

impl FocusSession {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.duration == 0 {
            return Err(ValidationError::ZeroFocusDuration {
                id: self.id.clone(),
            });
        }
        Ok(())
    }
}
