//! Typed JSON adapter over a [`KeyValueStore`].
//!
//! # Responsibility
//! - Encode/decode collections as UTF-8 JSON documents.
//! - Seed absent keys on initialization and after a reset.
//!
//! # Invariants
//! - `init` never overwrites a key that already holds a value.
//! - `reset` clears and re-seeds in one atomic batch.
//! - After `init`, no known key reads as absent.

use crate::model::dataset::{Dataset, PartialDataset};
use crate::model::settings::Settings;
use crate::repo::{RepoError, RepoResult};
use crate::storage::{KeyValueStore, KvBatch, StoreKey};
use log::{error, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

const EMPTY_COLLECTION_JSON: &str = "[]";

/// Persistence adapter that owns the key-value store handle.
pub struct Persistence<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Seeds every absent key with its default value.
    ///
    /// Re-running on a populated store is a no-op.
    pub fn init(&self) -> RepoResult<()> {
        let current = self.store.read_many(&StoreKey::ALL)?;
        let mut batch = KvBatch::new();
        for (key, value) in StoreKey::ALL.into_iter().zip(current) {
            if value.is_none() {
                batch.push(key, seed_value(key)?);
            }
        }

        let seeded = batch.puts().len();
        if let Err(err) = self.store.commit(&batch) {
            error!(
                "event=store_init module=repo status=error error_code=seed_failed error={}",
                err
            );
            return Err(err.into());
        }
        info!("event=store_init module=repo status=ok seeded_keys={seeded}");
        Ok(())
    }

    /// Clears every key and writes defaults back in the same batch.
    pub fn reset(&self) -> RepoResult<()> {
        let mut batch = KvBatch::clearing();
        for key in StoreKey::ALL {
            batch.push(key, seed_value(key)?);
        }
        self.store.commit(&batch)?;
        info!("event=store_reset module=repo status=ok");
        Ok(())
    }

    /// Loads and decodes one key; an absent key decodes as its default.
    pub fn load<T>(&self, key: StoreKey) -> RepoResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let raw = self.store.get(key)?;
        decode_or_default(key, raw)
    }

    /// Encodes and persists one key.
    pub fn save<T: Serialize>(&self, key: StoreKey, value: &T) -> RepoResult<()> {
        let json = serde_json::to_string(value).map_err(RepoError::Encode)?;
        if let Err(err) = self.store.set(key, &json) {
            error!(
                "event=store_write module=repo status=error key={} error={}",
                key, err
            );
            return Err(err.into());
        }
        Ok(())
    }

    /// Reads all seven keys from one consistent state.
    pub fn load_all(&self) -> RepoResult<Dataset> {
        let mut values = self.store.read_many(&StoreKey::ALL)?.into_iter();
        let mut next = || values.next().flatten();

        Ok(Dataset {
            tasks: decode_or_default(StoreKey::Tasks, next())?,
            transactions: decode_or_default(StoreKey::Transactions, next())?,
            habits: decode_or_default(StoreKey::Habits, next())?,
            moods: decode_or_default(StoreKey::Moods, next())?,
            notes: decode_or_default(StoreKey::Notes, next())?,
            pomodoros: decode_or_default(StoreKey::Pomodoros, next())?,
            settings: decode_or_default(StoreKey::Settings, next())?,
        })
    }

    /// Writes every present key of `document` in one atomic batch.
    ///
    /// The document is validated and fully encoded before anything is written.
    pub fn replace_present(&self, document: &PartialDataset) -> RepoResult<Vec<StoreKey>> {
        if let Err(err) = document.validate() {
            warn!("event=store_replace module=repo status=rejected error={err}");
            return Err(err.into());
        }

        let mut batch = KvBatch::new();
        push_encoded(&mut batch, StoreKey::Tasks, document.tasks.as_ref())?;
        push_encoded(&mut batch, StoreKey::Transactions, document.transactions.as_ref())?;
        push_encoded(&mut batch, StoreKey::Habits, document.habits.as_ref())?;
        push_encoded(&mut batch, StoreKey::Moods, document.moods.as_ref())?;
        push_encoded(&mut batch, StoreKey::Notes, document.notes.as_ref())?;
        push_encoded(&mut batch, StoreKey::Pomodoros, document.pomodoros.as_ref())?;
        push_encoded(&mut batch, StoreKey::Settings, document.settings.as_ref())?;

        self.store.commit(&batch)?;
        Ok(document.present_keys())
    }
}

fn push_encoded<T: Serialize>(
    batch: &mut KvBatch,
    key: StoreKey,
    value: Option<&T>,
) -> RepoResult<()> {
    if let Some(value) = value {
        let json = serde_json::to_string(value).map_err(RepoError::Encode)?;
        batch.push(key, json);
    }
    Ok(())
}

fn decode_or_default<T>(key: StoreKey, raw: Option<String>) -> RepoResult<T>
where
    T: DeserializeOwned + Default,
{
    match raw {
        Some(json) => serde_json::from_str(&json).map_err(|source| {
            error!(
                "event=store_read module=repo status=error key={} error_code=decode_failed error={}",
                key, source
            );
            RepoError::InvalidData { key, source }
        }),
        None => {
            warn!("event=store_read module=repo status=missing key={key}");
            Ok(T::default())
        }
    }
}

fn seed_value(key: StoreKey) -> RepoResult<String> {
    match key {
        StoreKey::Settings => {
            serde_json::to_string(&Settings::default()).map_err(RepoError::Encode)
        }
        _ => Ok(EMPTY_COLLECTION_JSON.to_string()),
    }
}
