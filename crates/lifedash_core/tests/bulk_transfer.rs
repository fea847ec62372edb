use lifedash_core::db::{open_db_in_memory, DbError, DbResult};
use lifedash_core::{
    export_all, export_json, import_all, import_json, reset_all, today, DashboardRepository,
    KeyValueStore, KvBatch, MoodLevel, NewHabit, NewMood, NewNote, NewTask, NewTransaction,
    PartialDataset, RepoError, Settings, SettingsPatch, SqliteKvStore, StoreKey, TransactionKind,
    TransferError, ValidationError,
};
use std::cell::Cell;

fn populate<S: KeyValueStore>(repo: &DashboardRepository<S>) {
    repo.add_task(NewTask::new("plan week")).unwrap();
    repo.add_transaction(NewTransaction {
        kind: TransactionKind::Expense,
        description: "coffee".to_string(),
        amount: 3.75,
        category: "food".to_string(),
    })
    .unwrap();
    let habit = repo.add_habit(NewHabit::new("read", "📚")).unwrap();
    repo.toggle_habit_day(&habit.id, today()).unwrap();
    repo.add_mood(NewMood {
        level: MoodLevel::new(5).unwrap(),
        note: "great".to_string(),
    })
    .unwrap();
    repo.add_note(NewNote {
        title: "ideas".to_string(),
        content: "line one\nline two".to_string(),
        color: "blue".to_string(),
    })
    .unwrap();
    repo.add_focus_session(25).unwrap();
    repo.update_settings(&SettingsPatch {
        name: Some("Ada".to_string()),
        ..SettingsPatch::default()
    })
    .unwrap();
}

fn raw_values<S: KeyValueStore>(store: &S) -> Vec<Option<String>> {
    store.read_many(&StoreKey::ALL).unwrap()
}

#[test]
fn export_then_import_restores_identical_stored_values() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKvStore::new(&conn);
    let repo = DashboardRepository::open(&store).unwrap();
    populate(&repo);
    let before = raw_values(&store);

    let document = export_json(&repo).unwrap();
    reset_all(&repo).unwrap();
    assert_ne!(raw_values(&store), before);

    let written = import_json(&repo, &document).unwrap();

    assert_eq!(written, StoreKey::ALL.to_vec());
    assert_eq!(raw_values(&store), before);
}

#[test]
fn export_carries_all_seven_keys() {
    let conn = open_db_in_memory().unwrap();
    let repo = DashboardRepository::open(SqliteKvStore::new(&conn)).unwrap();
    populate(&repo);

    let document: serde_json::Value = serde_json::from_str(&export_json(&repo).unwrap()).unwrap();
    let object = document.as_object().unwrap();

    for key in StoreKey::ALL {
        assert!(object.contains_key(key.as_str()), "missing {key}");
    }
    assert_eq!(object["transactions"][0]["type"], "expense");
    assert_eq!(object["settings"]["workDuration"], 25);
}

#[test]
fn partial_import_leaves_absent_keys_untouched() {
    let conn = open_db_in_memory().unwrap();
    let repo = DashboardRepository::open(SqliteKvStore::new(&conn)).unwrap();
    populate(&repo);
    let before = export_all(&repo).unwrap();

    let written = import_json(&repo, r#"{"notes": [], "future": {"x": 1}}"#).unwrap();

    assert_eq!(written, vec![StoreKey::Notes]);
    let after = export_all(&repo).unwrap();
    assert!(after.notes.is_empty());
    assert_eq!(after.tasks, before.tasks);
    assert_eq!(after.settings, before.settings);
    assert_eq!(after.pomodoros, before.pomodoros);
}

#[test]
fn import_accepts_documents_written_by_other_clients() {
    let conn = open_db_in_memory().unwrap();
    let repo = DashboardRepository::open(SqliteKvStore::new(&conn)).unwrap();
    let document = r#"{
        "tasks": [{"id": "lq2x9abc", "title": "Buy milk", "priority": "high",
                   "date": "2024-05-01", "completed": true,
                   "createdAt": "2024-05-01T08:00:00.000Z"}],
        "transactions": [{"id": "t1", "type": "income", "description": "salary",
                          "amount": 1200.5, "category": "work",
                          "date": "2024-05-01T09:30:00.000Z"}],
        "habits": [{"id": "h1", "title": "Run", "icon": "🏃", "goal": 1,
                    "completedDays": {"2024-05-01": true, "2024-04-30": false},
                    "createdAt": "2024-04-01T00:00:00.000Z"}],
        "moods": [{"id": "m1", "level": 3, "note": "", "date": "2024-05-01T20:00:00.000Z"}],
        "notes": [{"id": "n1", "title": "Plan", "content": "...", "color": "yellow",
                   "createdAt": "2024-05-01T10:00:00.000Z",
                   "updatedAt": "2024-05-02T10:00:00.000Z"}],
        "pomodoros": [{"id": "p1", "date": "2024-05-01T11:00:00.000Z", "duration": 25}],
        "settings": {"name": "", "notifications": true, "sound": false,
                     "workDuration": 50, "shortBreak": 10, "longBreak": 20}
    }"#;

    import_json(&repo, document).unwrap();

    let dataset = export_all(&repo).unwrap();
    assert_eq!(dataset.tasks[0].id, "lq2x9abc");
    assert!(dataset.tasks[0].completed);
    assert_eq!(dataset.transactions[0].amount, 1200.5);
    assert_eq!(dataset.habits[0].completed_days.len(), 2);
    assert_eq!(dataset.moods[0].level.get(), 3);
    assert_eq!(dataset.notes[0].color, "yellow");
    assert_eq!(dataset.pomodoros[0].duration, 25);
    assert_eq!(dataset.settings.work_duration, 50);
    assert!(!dataset.settings.sound);
}

#[test]
fn malformed_document_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKvStore::new(&conn);
    let repo = DashboardRepository::open(&store).unwrap();
    populate(&repo);
    let before = raw_values(&store);

    let cases = [
        "not json at all",
        "[1, 2, 3]",
        r#"{"settings": {"name": "Eve"}, "tasks": "nope"}"#,
        r#"{"notes": [], "moods": [{"id": "m", "level": 9, "date": "2024-05-01T00:00:00Z"}]}"#,
    ];
    for text in cases {
        let err = import_json(&repo, text).unwrap_err();
        assert!(matches!(err, TransferError::Malformed(_)), "{text}");
    }

    assert_eq!(raw_values(&store), before);
}

#[test]
fn import_rejects_records_that_break_value_invariants() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKvStore::new(&conn);
    let repo = DashboardRepository::open(&store).unwrap();
    populate(&repo);
    let before = raw_values(&store);

    let cases = [
        r#"{"transactions": [{"id": "t", "type": "expense", "amount": -50,
            "date": "2024-05-01T00:00:00Z"}]}"#,
        r#"{"pomodoros": [{"id": "p", "date": "2024-05-01T00:00:00Z", "duration": 0}]}"#,
        r#"{"tasks": [
            {"id": "d", "title": "a", "priority": "low", "date": "2024-05-01",
             "createdAt": "2024-05-01T00:00:00Z"},
            {"id": "d", "title": "b", "priority": "low", "date": "2024-05-01",
             "createdAt": "2024-05-01T00:00:00Z"}]}"#,
        r#"{"notes": [{"id": "n", "title": "late", "createdAt": "2024-05-02T00:00:00Z",
            "updatedAt": "2024-05-01T00:00:00Z"}]}"#,
        r#"{"settings": {"name": "Eve"}, "moods": [
            {"id": "m", "level": 3, "date": "2024-05-01T00:00:00Z"},
            {"id": "m", "level": 4, "date": "2024-05-02T00:00:00Z"}]}"#,
    ];
    for text in cases {
        let err = import_json(&repo, text).unwrap_err();
        assert!(matches!(err, TransferError::Malformed(_)), "{text}");
    }

    assert_eq!(raw_values(&store), before);
}

#[test]
fn import_all_validates_typed_documents() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKvStore::new(&conn);
    let repo = DashboardRepository::open(&store).unwrap();
    populate(&repo);
    let before = raw_values(&store);

    let mut tasks = export_all(&repo).unwrap().tasks;
    tasks.push(tasks[0].clone());
    let document = PartialDataset {
        tasks: Some(tasks),
        settings: Some(Settings::default()),
        ..PartialDataset::default()
    };
    let err = import_all(&repo, &document).unwrap_err();

    assert!(matches!(
        err,
        RepoError::Invalid(ValidationError::DuplicateId {
            key: StoreKey::Tasks,
            ..
        })
    ));
    assert_eq!(raw_values(&store), before);
}

#[test]
fn import_with_failing_store_applies_no_key() {
    let conn = open_db_in_memory().unwrap();
    let store = RejectingBatches {
        inner: SqliteKvStore::new(&conn),
        rejecting: Cell::new(false),
    };
    let repo = DashboardRepository::open(&store).unwrap();
    populate(&repo);
    let before = raw_values(&store);

    store.rejecting.set(true);
    let document = PartialDataset {
        tasks: Some(Vec::new()),
        settings: Some(Settings::default()),
        ..PartialDataset::default()
    };
    let err = import_all(&repo, &document).unwrap_err();

    assert!(err.to_string().contains("storage unavailable"));
    assert_eq!(raw_values(&store), before);
}

#[test]
fn reset_restores_defaults_for_every_key() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKvStore::new(&conn);
    let repo = DashboardRepository::open(&store).unwrap();
    populate(&repo);

    reset_all(&repo).unwrap();

    let dataset = export_all(&repo).unwrap();
    assert!(dataset.tasks.is_empty());
    assert!(dataset.transactions.is_empty());
    assert!(dataset.habits.is_empty());
    assert!(dataset.moods.is_empty());
    assert!(dataset.notes.is_empty());
    assert!(dataset.pomodoros.is_empty());
    assert_eq!(dataset.settings, Settings::default());
    for key in StoreKey::ALL {
        assert!(store.get(key).unwrap().is_some(), "{key} missing after reset");
    }
}

struct RejectingBatches<S> {
    inner: S,
    rejecting: Cell<bool>,
}

impl<S: KeyValueStore> KeyValueStore for RejectingBatches<S> {
    fn get(&self, key: StoreKey) -> DbResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: StoreKey, value: &str) -> DbResult<()> {
        self.inner.set(key, value)
    }

    fn read_many(&self, keys: &[StoreKey]) -> DbResult<Vec<Option<String>>> {
        self.inner.read_many(keys)
    }

    fn commit(&self, batch: &KvBatch) -> DbResult<()> {
        if self.rejecting.get() {
            return Err(DbError::Unavailable("read-only medium".to_string()));
        }
        self.inner.commit(batch)
    }
}
