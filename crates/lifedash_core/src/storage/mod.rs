//! Key-value medium contracts.
//!
//! # Responsibility
//! - Name the seven persisted keys.
//! - Define the byte-blob store seam the repository is layered on.
//!
//! # Invariants
//! - `KeyValueStore::commit` applies a whole batch or nothing.
//! - `KeyValueStore::read_many` observes one consistent state.

use crate::db::DbResult;
use std::fmt::{Display, Formatter};

mod sqlite_kv;

pub use sqlite_kv::SqliteKvStore;

/// Logical key of one persisted collection or record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreKey {
    Tasks,
    Transactions,
    Habits,
    Moods,
    Notes,
    Pomodoros,
    Settings,
}

impl StoreKey {
    /// Every key, in export document order.
    pub const ALL: [StoreKey; 7] = [
        StoreKey::Tasks,
        StoreKey::Transactions,
        StoreKey::Habits,
        StoreKey::Moods,
        StoreKey::Notes,
        StoreKey::Pomodoros,
        StoreKey::Settings,
    ];

    /// Storage name, shared with the export document field names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Transactions => "transactions",
            Self::Habits => "habits",
            Self::Moods => "moods",
            Self::Notes => "notes",
            Self::Pomodoros => "pomodoros",
            Self::Settings => "settings",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == value)
    }
}

impl Display for StoreKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of writes applied atomically by [`KeyValueStore::commit`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KvBatch {
    clear_first: bool,
    puts: Vec<(StoreKey, String)>,
}

impl KvBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a batch that wipes every key before applying its puts.
    pub fn clearing() -> Self {
        Self {
            clear_first: true,
            puts: Vec::new(),
        }
    }

    pub fn put(mut self, key: StoreKey, value: impl Into<String>) -> Self {
        self.puts.push((key, value.into()));
        self
    }

    pub fn push(&mut self, key: StoreKey, value: impl Into<String>) {
        self.puts.push((key, value.into()));
    }

    pub fn clears_first(&self) -> bool {
        self.clear_first
    }

    pub fn puts(&self) -> &[(StoreKey, String)] {
        &self.puts
    }

    pub fn is_empty(&self) -> bool {
        !self.clear_first && self.puts.is_empty()
    }
}

/// Durable byte-blob medium keyed by [`StoreKey`].
///
/// Implementations report medium failures as errors; they never swallow a
/// failed write.
pub trait KeyValueStore {
    /// Returns the raw JSON stored under `key`, if any.
    fn get(&self, key: StoreKey) -> DbResult<Option<String>>;
    /// Replaces the value stored under `key`.
    fn set(&self, key: StoreKey, value: &str) -> DbResult<()>;
    /// Reads several keys from one consistent state.
    fn read_many(&self, keys: &[StoreKey]) -> DbResult<Vec<Option<String>>>;
    /// Applies `batch` atomically.
    fn commit(&self, batch: &KvBatch) -> DbResult<()>;
    /// Removes every key.
    fn clear(&self) -> DbResult<()> {
        self.commit(&KvBatch::clearing())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: StoreKey) -> DbResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: StoreKey, value: &str) -> DbResult<()> {
        (**self).set(key, value)
    }

    fn read_many(&self, keys: &[StoreKey]) -> DbResult<Vec<Option<String>>> {
        (**self).read_many(keys)
    }

    fn commit(&self, batch: &KvBatch) -> DbResult<()> {
        (**self).commit(batch)
    }

    fn clear(&self) -> DbResult<()> {
        (**self).clear()
    }
}

#[cfg(test)]
mod tests {
    use super::{KvBatch, StoreKey};

    #[test]
    fn store_keys_roundtrip_through_names() {
        for key in StoreKey::ALL {
            assert_eq!(StoreKey::parse(key.as_str()), Some(key));
        }
        assert_eq!(StoreKey::parse("pomodoro"), None);
    }

    #[test]
    fn empty_batch_reports_empty_unless_clearing() {
        assert!(KvBatch::new().is_empty());
        assert!(!KvBatch::clearing().is_empty());
        assert!(!KvBatch::new().put(StoreKey::Tasks, "[]").is_empty());
    }
}
