//! Habit records and their per-day completion map.

use super::{day_key, EntityId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub icon: String,
    /// Occurrences per day. Display-only; never enforced.
    #[serde(default = "default_goal")]
    pub goal: u32,
    /// `YYYY-MM-DD` -> done flag. Absent days count as not done.
    #[serde(default)]
    pub completed_days: BTreeMap<String, bool>,
    pub created_at: DateTime<Utc>,
}

impl Habit {
    pub fn is_done_on(&self, day: NaiveDate) -> bool {
        self.completed_days
            .get(&day_key(day))
            .copied()
            .unwrap_or(false)
    }

    /// Flips the flag for `day`; an absent entry becomes `true`.
    pub fn toggle_day(&mut self, day: NaiveDate) {
        let flag = self.completed_days.entry(day_key(day)).or_insert(false);
        *flag = !*flag;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabit {
    pub title: String,
    pub icon: String,
    pub goal: u32,
}

impl NewHabit {
    pub fn new(title: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            icon: icon.into(),
            goal: default_goal(),
        }
    }
}

fn default_goal() -> u32 {
    1
}
