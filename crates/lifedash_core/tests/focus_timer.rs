use lifedash_core::db::{open_db_in_memory, DbError, DbResult};
use lifedash_core::{
    DashboardRepository, FocusDurations, FocusPhase, FocusTimer, KeyValueStore, KvBatch,
    RepoResult, SettingsPatch, SqliteKvStore, StoreKey, TickOutcome, TimerDriver,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Default)]
struct DriverLog {
    armed: bool,
    schedules: u32,
    cancels: u32,
    cues: u32,
}

#[derive(Clone, Default)]
struct RecordingDriver {
    log: Rc<RefCell<DriverLog>>,
}

impl TimerDriver for RecordingDriver {
    fn schedule_ticks(&mut self) {
        let mut log = self.log.borrow_mut();
        log.armed = true;
        log.schedules += 1;
    }

    fn cancel_ticks(&mut self) {
        let mut log = self.log.borrow_mut();
        log.armed = false;
        log.cancels += 1;
    }

    fn play_cue(&mut self) {
        self.log.borrow_mut().cues += 1;
    }
}

fn new_timer<S: KeyValueStore>(
    repo: &DashboardRepository<S>,
) -> (FocusTimer<RecordingDriver>, Rc<RefCell<DriverLog>>) {
    let driver = RecordingDriver::default();
    let log = Rc::clone(&driver.log);
    let timer = FocusTimer::new(driver, &repo.settings().unwrap());
    (timer, log)
}

/// Ticks until the current phase completes.
fn run_phase<S: KeyValueStore>(
    timer: &mut FocusTimer<RecordingDriver>,
    repo: &DashboardRepository<S>,
) -> RepoResult<(u32, TickOutcome)> {
    let mut ticks = 0;
    loop {
        let outcome = timer.tick(repo)?;
        ticks += 1;
        match outcome {
            TickOutcome::Counting { .. } => continue,
            other => return Ok((ticks, other)),
        }
    }
}

fn short_cycle_settings<S: KeyValueStore>(repo: &DashboardRepository<S>) {
    repo.update_settings(&SettingsPatch {
        work_duration: Some(1),
        short_break: Some(2),
        long_break: Some(3),
        ..SettingsPatch::default()
    })
    .unwrap();
}

#[test]
fn new_timer_is_paused_in_work_phase() {
    let conn = open_db_in_memory().unwrap();
    let repo = DashboardRepository::open(SqliteKvStore::new(&conn)).unwrap();
    let (timer, log) = new_timer(&repo);

    let status = timer.status();
    assert_eq!(status.phase, FocusPhase::Work);
    assert!(!status.running);
    assert_eq!(status.remaining_secs, 1500);
    assert_eq!(status.completed_sessions, 0);
    assert_eq!(status.clock(), "25:00");
    assert!(!log.borrow().armed);
}

#[test]
fn start_and_pause_are_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let repo = DashboardRepository::open(SqliteKvStore::new(&conn)).unwrap();
    let (mut timer, log) = new_timer(&repo);

    assert!(timer.start());
    assert!(!timer.start());
    assert_eq!(log.borrow().schedules, 1);
    assert!(log.borrow().armed);

    assert!(timer.pause());
    assert!(!timer.pause());
    assert!(!log.borrow().armed);
    assert!(!timer.is_running());
}

#[test]
fn paused_timer_ignores_ticks() {
    let conn = open_db_in_memory().unwrap();
    let repo = DashboardRepository::open(SqliteKvStore::new(&conn)).unwrap();
    let (mut timer, _log) = new_timer(&repo);

    assert_eq!(timer.tick(&repo).unwrap(), TickOutcome::Idle);
    assert_eq!(timer.remaining_secs(), 1500);
}

#[test]
fn full_work_phase_records_one_session_and_loads_short_break() {
    let conn = open_db_in_memory().unwrap();
    let repo = DashboardRepository::open(SqliteKvStore::new(&conn)).unwrap();
    let (mut timer, log) = new_timer(&repo);

    timer.start();
    let (ticks, outcome) = run_phase(&mut timer, &repo).unwrap();

    assert_eq!(ticks, 1500);
    match outcome {
        TickOutcome::WorkCompleted {
            session,
            break_secs,
            long_break,
        } => {
            assert_eq!(session.duration, 25);
            assert_eq!(break_secs, 300);
            assert!(!long_break);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let sessions = repo.focus_sessions().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].duration, 25);

    let status = timer.status();
    assert_eq!(status.phase, FocusPhase::Break);
    assert!(!status.running);
    assert_eq!(status.remaining_secs, 300);
    assert_eq!(status.completed_sessions, 1);
    assert!(!log.borrow().armed);
    assert_eq!(log.borrow().cues, 1);
}

#[test]
fn completed_break_loads_work_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let repo = DashboardRepository::open(SqliteKvStore::new(&conn)).unwrap();
    short_cycle_settings(&repo);
    let (mut timer, _log) = new_timer(&repo);

    timer.start();
    run_phase(&mut timer, &repo).unwrap();
    timer.start();
    let (ticks, outcome) = run_phase(&mut timer, &repo).unwrap();

    assert_eq!(ticks, 120);
    assert_eq!(outcome, TickOutcome::BreakCompleted { work_secs: 60 });
    assert_eq!(repo.focus_sessions().unwrap().len(), 1);
    assert_eq!(timer.phase(), FocusPhase::Work);
    assert!(!timer.is_running());
}

#[test]
fn every_fourth_session_is_followed_by_a_long_break() {
    let conn = open_db_in_memory().unwrap();
    let repo = DashboardRepository::open(SqliteKvStore::new(&conn)).unwrap();
    short_cycle_settings(&repo);
    let (mut timer, _log) = new_timer(&repo);

    let mut long_breaks = Vec::new();
    for _ in 0..4 {
        timer.start();
        match run_phase(&mut timer, &repo).unwrap() {
            (_, TickOutcome::WorkCompleted { long_break, break_secs, .. }) => {
                long_breaks.push((long_break, break_secs));
            }
            (_, other) => panic!("unexpected outcome: {other:?}"),
        }
        timer.start();
        run_phase(&mut timer, &repo).unwrap();
    }

    assert_eq!(
        long_breaks,
        vec![(false, 120), (false, 120), (false, 120), (true, 180)]
    );
    assert_eq!(timer.status().completed_sessions, 4);
    assert_eq!(repo.focus_sessions().unwrap().len(), 4);
}

#[test]
fn cue_is_skipped_when_sound_is_off() {
    let conn = open_db_in_memory().unwrap();
    let repo = DashboardRepository::open(SqliteKvStore::new(&conn)).unwrap();
    short_cycle_settings(&repo);
    repo.update_settings(&SettingsPatch {
        sound: Some(false),
        ..SettingsPatch::default()
    })
    .unwrap();
    let (mut timer, log) = new_timer(&repo);

    timer.start();
    run_phase(&mut timer, &repo).unwrap();

    assert_eq!(log.borrow().cues, 0);
    assert_eq!(repo.focus_sessions().unwrap().len(), 1);
}

#[test]
fn reset_returns_to_paused_work_and_clears_counter() {
    let conn = open_db_in_memory().unwrap();
    let repo = DashboardRepository::open(SqliteKvStore::new(&conn)).unwrap();
    short_cycle_settings(&repo);
    let (mut timer, log) = new_timer(&repo);

    timer.start();
    run_phase(&mut timer, &repo).unwrap();
    timer.start();
    timer.tick(&repo).unwrap();

    timer.reset(&repo).unwrap();

    let status = timer.status();
    assert_eq!(status.phase, FocusPhase::Work);
    assert!(!status.running);
    assert_eq!(status.remaining_secs, 60);
    assert_eq!(status.completed_sessions, 0);
    assert!(!log.borrow().armed);
    assert_eq!(repo.focus_sessions().unwrap().len(), 1);
}

#[test]
fn update_durations_applies_to_paused_work_phase_only() {
    let conn = open_db_in_memory().unwrap();
    let repo = DashboardRepository::open(SqliteKvStore::new(&conn)).unwrap();
    let (mut timer, _log) = new_timer(&repo);

    let settings = timer
        .update_durations(&repo, FocusDurations::parse("50", "10", "30"))
        .unwrap();
    assert_eq!(settings.work_duration, 50);
    assert_eq!(repo.settings().unwrap().long_break, 30);
    assert_eq!(timer.remaining_secs(), 3000);

    timer.start();
    timer.tick(&repo).unwrap();
    timer
        .update_durations(&repo, FocusDurations::parse("20", "5", "15"))
        .unwrap();
    assert_eq!(timer.remaining_secs(), 2999);
    assert_eq!(repo.settings().unwrap().work_duration, 20);
}

#[test]
fn update_durations_replaces_invalid_minutes_with_defaults() {
    let conn = open_db_in_memory().unwrap();
    let repo = DashboardRepository::open(SqliteKvStore::new(&conn)).unwrap();
    let (mut timer, _log) = new_timer(&repo);

    let settings = timer
        .update_durations(&repo, FocusDurations::parse("0", "abc", "-5"))
        .unwrap();

    assert_eq!(settings.work_duration, 25);
    assert_eq!(settings.short_break, 5);
    assert_eq!(settings.long_break, 15);
    assert_eq!(timer.remaining_secs(), 1500);
}

#[test]
fn dropping_a_running_timer_cancels_ticks() {
    let conn = open_db_in_memory().unwrap();
    let repo = DashboardRepository::open(SqliteKvStore::new(&conn)).unwrap();
    let (mut timer, log) = new_timer(&repo);

    timer.start();
    assert!(log.borrow().armed);
    drop(timer);

    assert!(!log.borrow().armed);
}

#[test]
fn failed_session_write_keeps_timer_paused_and_retries_on_start() {
    let conn = open_db_in_memory().unwrap();
    let store = FailingPomodoros::new(SqliteKvStore::new(&conn));
    let repo = DashboardRepository::open(&store).unwrap();
    short_cycle_settings(&repo);
    let (mut timer, log) = new_timer(&repo);

    store.failing.set(true);
    timer.start();
    let err = run_phase(&mut timer, &repo).unwrap_err();
    assert!(err.to_string().contains("pomodoros unavailable"));

    let status = timer.status();
    assert_eq!(status.phase, FocusPhase::Work);
    assert!(!status.running);
    assert_eq!(status.remaining_secs, 0);
    assert_eq!(status.completed_sessions, 0);
    assert!(!log.borrow().armed);

    store.failing.set(false);
    timer.start();
    let outcome = timer.tick(&repo).unwrap();
    assert!(matches!(outcome, TickOutcome::WorkCompleted { .. }));
    assert_eq!(repo.focus_sessions().unwrap().len(), 1);
}

struct FailingPomodoros<S> {
    inner: S,
    failing: Cell<bool>,
}

impl<S: KeyValueStore> FailingPomodoros<S> {
    fn new(inner: S) -> Self {
        Self {
            inner,
            failing: Cell::new(false),
        }
    }
}

impl<S: KeyValueStore> KeyValueStore for FailingPomodoros<S> {
    fn get(&self, key: StoreKey) -> DbResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: StoreKey, value: &str) -> DbResult<()> {
        if self.failing.get() && key == StoreKey::Pomodoros {
            return Err(DbError::Unavailable("pomodoros unavailable".to_string()));
        }
        self.inner.set(key, value)
    }

    fn read_many(&self, keys: &[StoreKey]) -> DbResult<Vec<Option<String>>> {
        self.inner.read_many(keys)
    }

    fn commit(&self, batch: &KvBatch) -> DbResult<()> {
        self.inner.commit(batch)
    }
}
