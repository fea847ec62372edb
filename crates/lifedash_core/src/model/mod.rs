//! Dashboard domain model.
//!
//! # Responsibility
//! - Define the six entity records, the settings singleton and the
//!   whole-dataset document shape.
//! - Own id generation and calendar-day helpers shared by every layer.
//!
//! # Invariants
//! - Every record carries an opaque, process-unique string id.
//! - Field names serialize in camelCase to keep the persisted JSON layout.
//! - Calendar days are local-time days rendered as `YYYY-MM-DD`.

use crate::storage::StoreKey;
use chrono::{DateTime, Local, NaiveDate, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod dataset;
pub mod focus;
pub mod habit;
pub mod mood;
pub mod note;
pub mod settings;
pub mod task;
pub mod transaction;

/// Opaque record identifier.
///
/// Kept as a string so documents produced by other clients import unchanged.
pub type EntityId = String;

/// Generates a new record id.
///
/// UUIDv7 carries a millisecond timestamp prefix followed by random bits, so
/// ids are unique without a central counter.
pub fn new_entity_id() -> EntityId {
    Uuid::now_v7().simple().to_string()
}

/// Local calendar day for `now`.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Local calendar day a stored timestamp falls on.
pub fn local_day(timestamp: &DateTime<Utc>) -> NaiveDate {
    timestamp.with_timezone(&Local).date_naive()
}

/// `YYYY-MM-DD` key used by habit completion maps and file names.
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Domain value rejected at construction, deserialization or import time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MoodLevelOutOfRange(u8),
    /// Amount is NaN or infinite and has no JSON representation.
    AmountNotFinite,
    NegativeAmount { id: EntityId },
    ZeroFocusDuration { id: EntityId },
    NoteUpdatedBeforeCreated { id: EntityId },
    DuplicateId { key: StoreKey, id: EntityId },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MoodLevelOutOfRange(level) => {
                write!(f, "mood level must be within 1..=5, got {level}")
            }
            Self::AmountNotFinite => write!(f, "transaction amount must be a finite number"),
            Self::NegativeAmount { id } => {
                write!(f, "transaction `{id}` has a negative amount")
            }
            Self::ZeroFocusDuration { id } => {
                write!(f, "focus session `{id}` has a zero duration")
            }
            Self::NoteUpdatedBeforeCreated { id } => {
                write!(f, "note `{id}` was updated before it was created")
            }
            Self::DuplicateId { key, id } => write!(f, "duplicate id `{id}` in `{key}`"),
        }
    }
}

impl Error for ValidationError {}
