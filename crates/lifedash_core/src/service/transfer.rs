//! Whole-dataset export, import and reset.
//!
//! # Responsibility
//! - Produce one consistent export document of all seven keys.
//! - Validate import documents fully before writing any key.
//!
//! # Invariants
//! - Import applies every present key in one atomic batch or nothing.
//! - Keys absent from an import document are left untouched.
//! - Reset leaves every key holding its default value.

use crate::model::dataset::{Dataset, PartialDataset};
use crate::model::day_key;
use crate::repo::dashboard_repo::DashboardRepository;
use crate::repo::{RepoError, RepoResult};
use crate::storage::{KeyValueStore, StoreKey};
use chrono::NaiveDate;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

const EXPORT_FILE_PREFIX: &str = "lifedash-backup";

#[derive(Debug)]
pub enum TransferError {
    /// The import document is not valid JSON, has the wrong shape or holds
    /// records that break a value invariant.
    Malformed(String),
    Repo(RepoError),
}

impl Display for TransferError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(message) => write!(f, "malformed import document: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Malformed(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for TransferError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Reads every key from one consistent state.
pub fn export_all<S: KeyValueStore>(repo: &DashboardRepository<S>) -> RepoResult<Dataset> {
    let dataset = repo.snapshot()?;
    info!(
        "event=export module=transfer status=ok tasks={} transactions={} habits={} moods={} notes={} pomodoros={}",
        dataset.tasks.len(),
        dataset.transactions.len(),
        dataset.habits.len(),
        dataset.moods.len(),
        dataset.notes.len(),
        dataset.pomodoros.len()
    );
    Ok(dataset)
}

/// Export rendered as a pretty-printed JSON document.
pub fn export_json<S: KeyValueStore>(repo: &DashboardRepository<S>) -> RepoResult<String> {
    let dataset = export_all(repo)?;
    serde_json::to_string_pretty(&dataset).map_err(RepoError::Encode)
}

/// Default export file name, stamped with `day`.
pub fn export_file_name(day: NaiveDate) -> String {
    format!("{EXPORT_FILE_PREFIX}-{}.json", day_key(day))
}

/// Parses and validates an import document.
///
/// The top level must be a JSON object; every known key that is present must
/// decode into its typed shape and pass [`PartialDataset::validate`]. Unknown
/// keys are ignored.
pub fn parse_import(text: &str) -> Result<PartialDataset, TransferError> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|err| TransferError::Malformed(format!("invalid JSON: {err}")))?;
    let serde_json::Value::Object(fields) = &value else {
        return Err(TransferError::Malformed(
            "top-level value must be an object".to_string(),
        ));
    };

    let unknown: Vec<&str> = fields
        .keys()
        .map(String::as_str)
        .filter(|name| StoreKey::parse(name).is_none())
        .collect();
    if !unknown.is_empty() {
        warn!(
            "event=import_parse module=transfer status=ignored unknown_keys={}",
            unknown.len()
        );
    }

    let document: PartialDataset = serde_json::from_value(value)
        .map_err(|err| TransferError::Malformed(err.to_string()))?;
    document
        .validate()
        .map_err(|err| TransferError::Malformed(err.to_string()))?;
    Ok(document)
}

/// Overwrites every key present in `document`; returns the keys written.
pub fn import_all<S: KeyValueStore>(
    repo: &DashboardRepository<S>,
    document: &PartialDataset,
) -> RepoResult<Vec<StoreKey>> {
    match repo.persistence().replace_present(document) {
        Ok(keys) => {
            info!(
                "event=import module=transfer status=ok keys={}",
                keys.len()
            );
            Ok(keys)
        }
        Err(err) => {
            error!("event=import module=transfer status=error error={}", err);
            Err(err)
        }
    }
}

/// Parses `text` and imports it; a malformed document writes nothing.
pub fn import_json<S: KeyValueStore>(
    repo: &DashboardRepository<S>,
    text: &str,
) -> Result<Vec<StoreKey>, TransferError> {
    let document = parse_import(text).map_err(|err| {
        warn!("event=import module=transfer status=rejected error_code=malformed");
        err
    })?;
    Ok(import_all(repo, &document)?)
}

/// Clears every key and re-seeds defaults in one atomic batch.
pub fn reset_all<S: KeyValueStore>(repo: &DashboardRepository<S>) -> RepoResult<()> {
    repo.persistence().reset()
}
