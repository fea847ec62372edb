//! Focus-session (work/break) timer.
//!
//! # Responsibility
//! - Drive the work/break cycle from one-second ticks.
//! - Record a focus session through the repository when a work phase ends.
//!
//! # Invariants
//! - The machine starts in work phase, paused, with the configured work length.
//! - The tick schedule is armed only while running; every exit from running
//!   and every drop cancels it.
//! - A phase always starts paused and never with a zero countdown.
//! - Every fourth completed work phase is followed by a long break.
//! - Breaks never write to the repository.

use crate::model::focus::FocusSession;
use crate::model::settings::{
    Settings, SettingsPatch, DEFAULT_LONG_BREAK_MINUTES, DEFAULT_SHORT_BREAK_MINUTES,
    DEFAULT_WORK_MINUTES,
};
use crate::repo::dashboard_repo::DashboardRepository;
use crate::repo::RepoResult;
use crate::storage::KeyValueStore;
use log::{debug, info};
use std::time::{Duration, Instant};

const SECONDS_PER_MINUTE: u32 = 60;
const SESSIONS_PER_LONG_BREAK: u32 = 4;
const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPhase {
    Work,
    Break,
}

impl FocusPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Break => "break",
        }
    }
}

/// Environment hooks owned by the timer.
///
/// `schedule_ticks` starts a recurring one-second tick that calls back into
/// [`FocusTimer::tick`]; `cancel_ticks` must stop it and be safe to call
/// when nothing is scheduled.
pub trait TimerDriver {
    fn schedule_ticks(&mut self);
    fn cancel_ticks(&mut self);
    /// Audible cue at the end of a work phase when sound is enabled.
    fn play_cue(&mut self);
}

/// Phase lengths in minutes, each at least one minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusDurations {
    pub work: u32,
    pub short_break: u32,
    pub long_break: u32,
}

impl Default for FocusDurations {
    fn default() -> Self {
        Self {
            work: DEFAULT_WORK_MINUTES,
            short_break: DEFAULT_SHORT_BREAK_MINUTES,
            long_break: DEFAULT_LONG_BREAK_MINUTES,
        }
    }
}

impl FocusDurations {
    /// Zero minutes in stored settings fall back to the defaults.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::coerced(
            settings.work_duration,
            settings.short_break,
            settings.long_break,
        )
    }

    pub fn coerced(work: u32, short_break: u32, long_break: u32) -> Self {
        let defaults = Self::default();
        Self {
            work: positive_or(work, defaults.work),
            short_break: positive_or(short_break, defaults.short_break),
            long_break: positive_or(long_break, defaults.long_break),
        }
    }

    /// Parses user-typed minutes. Non-numeric or non-positive inputs fall
    /// back to the defaults instead of failing.
    pub fn parse(work: &str, short_break: &str, long_break: &str) -> Self {
        let defaults = Self::default();
        Self {
            work: parse_minutes(work, defaults.work),
            short_break: parse_minutes(short_break, defaults.short_break),
            long_break: parse_minutes(long_break, defaults.long_break),
        }
    }

    fn work_seconds(self) -> u32 {
        self.work.saturating_mul(SECONDS_PER_MINUTE)
    }

    fn break_seconds(self, long: bool) -> u32 {
        let minutes = if long {
            self.long_break
        } else {
            self.short_break
        };
        minutes.saturating_mul(SECONDS_PER_MINUTE)
    }
}

fn positive_or(value: u32, fallback: u32) -> u32 {
    if value == 0 {
        fallback
    } else {
        value
    }
}

fn parse_minutes(input: &str, fallback: u32) -> u32 {
    match input.trim().parse::<i64>() {
        Ok(value) if value > 0 => u32::try_from(value).unwrap_or(fallback),
        _ => fallback,
    }
}

/// What one call to [`FocusTimer::tick`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The timer is paused; nothing changed.
    Idle,
    Counting {
        remaining_secs: u32,
    },
    WorkCompleted {
        session: FocusSession,
        break_secs: u32,
        long_break: bool,
    },
    BreakCompleted {
        work_secs: u32,
    },
}

/// Read-only view of the timer for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerStatus {
    pub phase: FocusPhase,
    pub running: bool,
    pub remaining_secs: u32,
    pub completed_sessions: u32,
}

impl TimerStatus {
    /// `MM:SS` rendering of the remaining time.
    pub fn clock(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.remaining_secs / SECONDS_PER_MINUTE,
            self.remaining_secs % SECONDS_PER_MINUTE
        )
    }
}

/// Work/break state machine.
pub struct FocusTimer<D: TimerDriver> {
    driver: D,
    phase: FocusPhase,
    running: bool,
    remaining_secs: u32,
    completed_sessions: u32,
}

impl<D: TimerDriver> FocusTimer<D> {
    /// Creates a paused work-phase timer sized from `settings`.
    pub fn new(driver: D, settings: &Settings) -> Self {
        Self {
            driver,
            phase: FocusPhase::Work,
            running: false,
            remaining_secs: FocusDurations::from_settings(settings).work_seconds(),
            completed_sessions: 0,
        }
    }

    pub fn status(&self) -> TimerStatus {
        TimerStatus {
            phase: self.phase,
            running: self.running,
            remaining_secs: self.remaining_secs,
            completed_sessions: self.completed_sessions,
        }
    }

    pub fn phase(&self) -> FocusPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Paused -> running in the current phase. Returns `false` if already
    /// running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.driver.schedule_ticks();
        debug!(
            "event=timer_start module=focus status=ok phase={} remaining_secs={}",
            self.phase.as_str(),
            self.remaining_secs
        );
        true
    }

    /// Running -> paused in the current phase. Returns `false` if already
    /// paused.
    pub fn pause(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.halt();
        debug!(
            "event=timer_pause module=focus status=ok phase={} remaining_secs={}",
            self.phase.as_str(),
            self.remaining_secs
        );
        true
    }

    /// Any state -> paused work phase with a fresh work countdown; the
    /// completed-session counter restarts at zero.
    pub fn reset<S: KeyValueStore>(&mut self, repo: &DashboardRepository<S>) -> RepoResult<()> {
        let durations = FocusDurations::from_settings(&repo.settings()?);
        self.halt();
        self.phase = FocusPhase::Work;
        self.remaining_secs = durations.work_seconds();
        self.completed_sessions = 0;
        Ok(())
    }

    /// Advances the countdown by one second while running.
    ///
    /// When the countdown runs out the phase completes: the timer pauses and
    /// loads the next phase. If recording the finished work phase fails the
    /// error is returned and the timer stays paused at zero in the work
    /// phase, so starting it again retries the completion.
    pub fn tick<S: KeyValueStore>(
        &mut self,
        repo: &DashboardRepository<S>,
    ) -> RepoResult<TickOutcome> {
        if !self.running {
            return Ok(TickOutcome::Idle);
        }

        if self.remaining_secs > 1 {
            self.remaining_secs -= 1;
            return Ok(TickOutcome::Counting {
                remaining_secs: self.remaining_secs,
            });
        }

        self.remaining_secs = 0;
        self.halt();
        match self.phase {
            FocusPhase::Work => self.complete_work(repo),
            FocusPhase::Break => self.complete_break(repo),
        }
    }

    /// Persists new phase lengths. A paused work phase picks up the new work
    /// length at once; running timers and breaks keep their countdown.
    pub fn update_durations<S: KeyValueStore>(
        &mut self,
        repo: &DashboardRepository<S>,
        durations: FocusDurations,
    ) -> RepoResult<Settings> {
        let durations =
            FocusDurations::coerced(durations.work, durations.short_break, durations.long_break);
        let settings = repo.update_settings(&SettingsPatch {
            work_duration: Some(durations.work),
            short_break: Some(durations.short_break),
            long_break: Some(durations.long_break),
            ..SettingsPatch::default()
        })?;

        if !self.running && self.phase == FocusPhase::Work {
            self.remaining_secs = durations.work_seconds();
        }
        Ok(settings)
    }

    fn complete_work<S: KeyValueStore>(
        &mut self,
        repo: &DashboardRepository<S>,
    ) -> RepoResult<TickOutcome> {
        let settings = repo.settings()?;
        let durations = FocusDurations::from_settings(&settings);
        let session = repo.add_focus_session(durations.work)?;

        self.completed_sessions += 1;
        if settings.sound {
            self.driver.play_cue();
        }

        let long_break = self.completed_sessions % SESSIONS_PER_LONG_BREAK == 0;
        self.phase = FocusPhase::Break;
        self.remaining_secs = durations.break_seconds(long_break);
        info!(
            "event=focus_complete module=focus status=ok session_id={} duration_min={} completed={} long_break={}",
            session.id, session.duration, self.completed_sessions, long_break
        );

        Ok(TickOutcome::WorkCompleted {
            session,
            break_secs: self.remaining_secs,
            long_break,
        })
    }

    fn complete_break<S: KeyValueStore>(
        &mut self,
        repo: &DashboardRepository<S>,
    ) -> RepoResult<TickOutcome> {
        let durations = FocusDurations::from_settings(&repo.settings()?);
        self.phase = FocusPhase::Work;
        self.remaining_secs = durations.work_seconds();
        debug!("event=break_complete module=focus status=ok");
        Ok(TickOutcome::BreakCompleted {
            work_secs: self.remaining_secs,
        })
    }

    fn halt(&mut self) {
        self.running = false;
        self.driver.cancel_ticks();
    }
}

impl<D: TimerDriver> Drop for FocusTimer<D> {
    fn drop(&mut self) {
        self.driver.cancel_ticks();
    }
}

/// Deadline-based one-second schedule for single-threaded event loops.
///
/// The owner polls [`IntervalSchedule::take_due`] and calls
/// [`FocusTimer::tick`] once per returned tick.
#[derive(Debug, Clone, Default)]
pub struct IntervalSchedule {
    next_due: Option<Instant>,
}

impl IntervalSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm_at(&mut self, now: Instant) {
        self.next_due = Some(now + TICK_PERIOD);
    }

    pub fn disarm(&mut self) {
        self.next_due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Time left until the next tick, if armed.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.next_due
            .map(|due| due.saturating_duration_since(now))
    }

    /// Number of whole ticks elapsed up to `now`; advances the deadline.
    pub fn take_due(&mut self, now: Instant) -> u32 {
        let Some(mut due) = self.next_due else {
            return 0;
        };
        let mut ticks = 0;
        while due <= now {
            ticks += 1;
            due += TICK_PERIOD;
        }
        self.next_due = Some(due);
        ticks
    }
}
