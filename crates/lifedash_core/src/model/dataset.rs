//! Whole-dataset documents used by export, import and snapshots.

use super::focus::FocusSession;
use super::habit::Habit;
use super::mood::Mood;
use super::note::Note;
use super::settings::Settings;
use super::task::Task;
use super::transaction::Transaction;
use super::ValidationError;
use crate::storage::StoreKey;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Every collection plus settings, read at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub tasks: Vec<Task>,
    pub transactions: Vec<Transaction>,
    pub habits: Vec<Habit>,
    pub moods: Vec<Mood>,
    pub notes: Vec<Note>,
    pub pomodoros: Vec<FocusSession>,
    pub settings: Settings,
}

/// Import document: every key optional, absent keys leave storage alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialDataset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<Transaction>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub habits: Option<Vec<Habit>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moods: Option<Vec<Mood>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<Note>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pomodoros: Option<Vec<FocusSession>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

impl PartialDataset {
    /// Keys carried by this document, in export order.
    pub fn present_keys(&self) -> Vec<StoreKey> {
        let flags = [
            (StoreKey::Tasks, self.tasks.is_some()),
            (StoreKey::Transactions, self.transactions.is_some()),
            (StoreKey::Habits, self.habits.is_some()),
            (StoreKey::Moods, self.moods.is_some()),
            (StoreKey::Notes, self.notes.is_some()),
            (StoreKey::Pomodoros, self.pomodoros.is_some()),
            (StoreKey::Settings, self.settings.is_some()),
        ];
        flags
            .into_iter()
            .filter_map(|(key, present)| present.then_some(key))
            .collect()
    }

    /// Checks record invariants of every present collection.
    ///
    /// Ids must be unique per collection; amounts non-negative, focus
    /// durations positive and note timestamps ordered.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(tasks) = &self.tasks {
            check_unique(StoreKey::Tasks, tasks.iter().map(|task| task.id.as_str()))?;
        }
        if let Some(transactions) = &self.transactions {
            check_unique(
                StoreKey::Transactions,
                transactions.iter().map(|tx| tx.id.as_str()),
            )?;
            transactions.iter().try_for_each(Transaction::validate)?;
        }
        if let Some(habits) = &self.habits {
            check_unique(StoreKey::Habits, habits.iter().map(|habit| habit.id.as_str()))?;
        }
        if let Some(moods) = &self.moods {
            check_unique(StoreKey::Moods, moods.iter().map(|mood| mood.id.as_str()))?;
        }
        if let Some(notes) = &self.notes {
            check_unique(StoreKey::Notes, notes.iter().map(|note| note.id.as_str()))?;
            notes.iter().try_for_each(Note::validate)?;
        }
        if let Some(sessions) = &self.pomodoros {
            check_unique(
                StoreKey::Pomodoros,
                sessions.iter().map(|session| session.id.as_str()),
            )?;
            sessions.iter().try_for_each(FocusSession::validate)?;
        }
        Ok(())
    }
}

fn check_unique<'a>(
    key: StoreKey,
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateId {
                key,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

impl From<Dataset> for PartialDataset {
    fn from(value: Dataset) -> Self {
        Self {
            tasks: Some(value.tasks),
            transactions: Some(value.transactions),
            habits: Some(value.habits),
            moods: Some(value.moods),
            notes: Some(value.notes),
            pomodoros: Some(value.pomodoros),
            settings: Some(value.settings),
        }
    }
}
