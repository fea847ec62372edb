//! Entity repository for the six dashboard collections and settings.
//!
//! # Responsibility
//! - Provide create/toggle/update/delete operations per entity kind.
//! - Assign ids and server-side timestamps at creation time.
//!
//! # Invariants
//! - Tasks, transactions, moods and notes are stored newest-first;
//!   habits and focus sessions are stored oldest-first.
//! - Unknown ids are silent no-ops; the collection is still persisted.
//! - Operations never reorder records they do not touch.

use crate::model::dataset::Dataset;
use crate::model::focus::FocusSession;
use crate::model::habit::{Habit, NewHabit};
use crate::model::mood::{Mood, NewMood};
use crate::model::note::{NewNote, Note, NotePatch};
use crate::model::settings::{Settings, SettingsPatch};
use crate::model::task::{NewTask, Task};
use crate::model::transaction::{check_amount, NewTransaction, Transaction};
use crate::model::{local_day, new_entity_id};
use crate::repo::persistence::Persistence;
use crate::repo::RepoResult;
use crate::storage::{KeyValueStore, StoreKey};
use chrono::{NaiveDate, Utc};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Handle to the persisted dashboard state.
///
/// Consumers hold this handle explicitly; there is no global instance.
pub struct DashboardRepository<S: KeyValueStore> {
    persistence: Persistence<S>,
}

impl<S: KeyValueStore> DashboardRepository<S> {
    /// Wraps a store without touching it. Call [`Self::init`] before use.
    pub fn new(store: S) -> Self {
        Self {
            persistence: Persistence::new(store),
        }
    }

    /// Wraps a store and seeds absent keys.
    pub fn open(store: S) -> RepoResult<Self> {
        let repo = Self::new(store);
        repo.init()?;
        Ok(repo)
    }

    pub fn init(&self) -> RepoResult<()> {
        self.persistence.init()
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    /// Reads every collection from one consistent state.
    pub fn snapshot(&self) -> RepoResult<Dataset> {
        self.persistence.load_all()
    }

    pub fn tasks(&self) -> RepoResult<Vec<Task>> {
        self.persistence.load(StoreKey::Tasks)
    }

    pub fn transactions(&self) -> RepoResult<Vec<Transaction>> {
        self.persistence.load(StoreKey::Transactions)
    }

    pub fn habits(&self) -> RepoResult<Vec<Habit>> {
        self.persistence.load(StoreKey::Habits)
    }

    pub fn moods(&self) -> RepoResult<Vec<Mood>> {
        self.persistence.load(StoreKey::Moods)
    }

    pub fn notes(&self) -> RepoResult<Vec<Note>> {
        self.persistence.load(StoreKey::Notes)
    }

    pub fn focus_sessions(&self) -> RepoResult<Vec<FocusSession>> {
        self.persistence.load(StoreKey::Pomodoros)
    }

    pub fn settings(&self) -> RepoResult<Settings> {
        self.persistence.load(StoreKey::Settings)
    }

    // Tasks

    /// Creates a task; a missing date plans it for the creation day.
    pub fn add_task(&self, new: NewTask) -> RepoResult<Task> {
        let created_at = Utc::now();
        let task = Task {
            id: new_entity_id(),
            title: new.title,
            priority: new.priority,
            date: new.date.unwrap_or_else(|| local_day(&created_at)),
            category: new.category,
            note: new.note,
            completed: false,
            created_at,
        };
        self.prepend(StoreKey::Tasks, task)
    }

    pub fn toggle_task(&self, id: &str) -> RepoResult<Vec<Task>> {
        self.mutate(StoreKey::Tasks, |tasks: &mut Vec<Task>| {
            if let Some(task) = tasks.iter_mut().find(|task| task.id == id) {
                task.completed = !task.completed;
            }
        })
    }

    pub fn delete_task(&self, id: &str) -> RepoResult<Vec<Task>> {
        self.remove_by(StoreKey::Tasks, |task: &Task| task.id == id)
    }

    // Transactions

    /// Records a transaction; the amount is stored as its magnitude.
    ///
    /// A non-finite amount is rejected before anything is written.
    pub fn add_transaction(&self, new: NewTransaction) -> RepoResult<Transaction> {
        if let Err(err) = check_amount(new.amount) {
            warn!("event=entity_add module=repo status=rejected key=transactions error={err}");
            return Err(err.into());
        }
        let transaction = Transaction {
            id: new_entity_id(),
            kind: new.kind,
            description: new.description,
            amount: new.amount.abs(),
            category: new.category,
            date: Utc::now(),
        };
        self.prepend(StoreKey::Transactions, transaction)
    }

    pub fn delete_transaction(&self, id: &str) -> RepoResult<Vec<Transaction>> {
        self.remove_by(StoreKey::Transactions, |tx: &Transaction| tx.id == id)
    }

    pub fn clear_transactions(&self) -> RepoResult<()> {
        self.persistence
            .save(StoreKey::Transactions, &Vec::<Transaction>::new())?;
        debug!("event=collection_clear module=repo status=ok key=transactions");
        Ok(())
    }

    // Habits

    pub fn add_habit(&self, new: NewHabit) -> RepoResult<Habit> {
        let habit = Habit {
            id: new_entity_id(),
            title: new.title,
            icon: new.icon,
            goal: new.goal,
            completed_days: Default::default(),
            created_at: Utc::now(),
        };
        self.append(StoreKey::Habits, habit)
    }

    /// Flips the completion flag of one habit for `day`.
    pub fn toggle_habit_day(&self, habit_id: &str, day: NaiveDate) -> RepoResult<Vec<Habit>> {
        self.mutate(StoreKey::Habits, |habits: &mut Vec<Habit>| {
            if let Some(habit) = habits.iter_mut().find(|habit| habit.id == habit_id) {
                habit.toggle_day(day);
            }
        })
    }

    pub fn delete_habit(&self, id: &str) -> RepoResult<Vec<Habit>> {
        self.remove_by(StoreKey::Habits, |habit: &Habit| habit.id == id)
    }

    // Moods

    pub fn add_mood(&self, new: NewMood) -> RepoResult<Mood> {
        let mood = Mood {
            id: new_entity_id(),
            level: new.level,
            note: new.note,
            date: Utc::now(),
        };
        self.prepend(StoreKey::Moods, mood)
    }

    pub fn delete_mood(&self, id: &str) -> RepoResult<Vec<Mood>> {
        self.remove_by(StoreKey::Moods, |mood: &Mood| mood.id == id)
    }

    // Notes

    pub fn add_note(&self, new: NewNote) -> RepoResult<Note> {
        let now = Utc::now();
        let note = Note {
            id: new_entity_id(),
            title: new.title,
            content: new.content,
            color: new.color,
            created_at: now,
            updated_at: now,
        };
        self.prepend(StoreKey::Notes, note)
    }

    /// Merges `patch` into the note and refreshes `updated_at`, even when no
    /// field changes.
    pub fn update_note(&self, id: &str, patch: NotePatch) -> RepoResult<Vec<Note>> {
        let now = Utc::now();
        self.mutate(StoreKey::Notes, |notes: &mut Vec<Note>| {
            if let Some(note) = notes.iter_mut().find(|note| note.id == id) {
                note.apply(patch, now);
            }
        })
    }

    pub fn delete_note(&self, id: &str) -> RepoResult<Vec<Note>> {
        self.remove_by(StoreKey::Notes, |note: &Note| note.id == id)
    }

    // Focus sessions

    /// Records a finished work phase of `duration` minutes.
    pub fn add_focus_session(&self, duration: u32) -> RepoResult<FocusSession> {
        let session = FocusSession {
            id: new_entity_id(),
            date: Utc::now(),
            duration,
        };
        self.append(StoreKey::Pomodoros, session)
    }

    // Settings

    pub fn update_settings(&self, patch: &SettingsPatch) -> RepoResult<Settings> {
        let updated = self.settings()?.merged(patch);
        self.persistence.save(StoreKey::Settings, &updated)?;
        Ok(updated)
    }

    fn mutate<T, F>(&self, key: StoreKey, apply: F) -> RepoResult<Vec<T>>
    where
        T: DeserializeOwned + Serialize,
        F: FnOnce(&mut Vec<T>),
    {
        let mut items: Vec<T> = self.persistence.load(key)?;
        apply(&mut items);
        self.persistence.save(key, &items)?;
        debug!(
            "event=collection_write module=repo status=ok key={} len={}",
            key,
            items.len()
        );
        Ok(items)
    }

    fn prepend<T>(&self, key: StoreKey, record: T) -> RepoResult<T>
    where
        T: DeserializeOwned + Serialize + Clone,
    {
        let created = record.clone();
        self.mutate(key, move |items: &mut Vec<T>| items.insert(0, record))?;
        Ok(created)
    }

    fn append<T>(&self, key: StoreKey, record: T) -> RepoResult<T>
    where
        T: DeserializeOwned + Serialize + Clone,
    {
        let created = record.clone();
        self.mutate(key, move |items: &mut Vec<T>| items.push(record))?;
        Ok(created)
    }

    fn remove_by<T, P>(&self, key: StoreKey, matches: P) -> RepoResult<Vec<T>>
    where
        T: DeserializeOwned + Serialize,
        P: Fn(&T) -> bool,
    {
        self.mutate(key, |items: &mut Vec<T>| items.retain(|item| !matches(item)))
    }
}
