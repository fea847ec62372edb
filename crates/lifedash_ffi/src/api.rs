//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose dashboard use cases to Dart via FRB.
//! - Own the single focus timer of the host process.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call opens the store, applies its change and returns a fresh
//!   view; no collection state is cached between calls.
//! - Calendar days cross the boundary as `YYYY-MM-DD`; instants as epoch ms.

use chrono::{DateTime, NaiveDate, Utc};
use lifedash_core::db::open_db;
use lifedash_core::service::views::{
    filter_tasks, habit_streak, habit_week, month_totals, recent_moods, weekly_expenses,
};
use lifedash_core::{
    core_version as core_version_inner, export_file_name, export_json as export_json_inner,
    import_json as import_json_inner, init_logging as init_logging_inner,
    reset_all as reset_all_inner, today, DashboardRepository, DashboardSummary, FocusDurations,
    FocusTimer, Habit, Mood, MoodLevel, NewHabit, NewMood, NewNote, NewTask, NewTransaction,
    Note, NotePatch, Priority, Settings, SettingsPatch, SqliteKvStore, Task, TaskFilter,
    TickOutcome, TimerDriver, TimerStatus, Transaction, TransactionKind,
};
use log::warn;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};

const DB_FILE_NAME: &str = "lifedash.sqlite3";
const DB_PATH_ENV: &str = "LIFEDASH_DB";
const DEFAULT_MOOD_LIMIT: u32 = 14;

static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static TIMER: Mutex<Option<FocusTimer<HostTimerDriver>>> = Mutex::new(None);

type Repo<'conn> = DashboardRepository<SqliteKvStore<'conn>>;

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Pins the database file used by every later call.
///
/// # FFI contract
/// - Must run before the first data call; later calls with the same path
///   are no-ops, a different path is rejected.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_store(db_path: String) -> String {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return "db_path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = DB_PATH.get_or_init(|| requested.clone());
    if *active != requested {
        return format!(
            "store already configured at `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        );
    }
    String::new()
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Id of the created record, when the action created one.
    pub id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }

    fn from_result(result: Result<Option<String>, String>, message: &str) -> Self {
        match result {
            Ok(id) => Self::success(message, id),
            Err(err) => Self::failure(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: String,
    pub title: String,
    /// `low|medium|high`.
    pub priority: String,
    /// Planned day, `YYYY-MM-DD`.
    pub date: String,
    pub category: String,
    pub note: String,
    pub completed: bool,
    pub created_at_ms: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionItem {
    pub id: String,
    /// `income|expense`.
    pub kind: String,
    pub description: String,
    /// Non-negative magnitude.
    pub amount: f64,
    pub category: String,
    pub date_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitItem {
    pub id: String,
    pub title: String,
    pub icon: String,
    pub goal: u32,
    pub streak: u32,
    pub done_today: bool,
    /// Flags for the seven days ending today, oldest first.
    pub last_seven_days: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodItem {
    pub id: String,
    pub level: u8,
    pub note: String,
    pub date_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    pub id: String,
    pub title: String,
    pub content: String,
    pub color: String,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    pub ok: bool,
    pub items: Vec<TaskItem>,
    pub message: String,
}

/// Expense total of one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayAmount {
    /// `YYYY-MM-DD`.
    pub day: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionListResponse {
    pub ok: bool,
    pub items: Vec<TransactionItem>,
    pub month_income: f64,
    pub month_expense: f64,
    pub month_balance: f64,
    /// Expenses for the seven days ending today, oldest first.
    pub week_expenses: Vec<DayAmount>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitListResponse {
    pub ok: bool,
    pub items: Vec<HabitItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodListResponse {
    pub ok: bool,
    pub items: Vec<MoodItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteListResponse {
    pub ok: bool,
    pub items: Vec<NoteItem>,
    pub message: String,
}

/// Dashboard screen payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryResponse {
    pub ok: bool,
    pub day: String,
    pub today_tasks: Vec<TaskItem>,
    pub pending_count: u32,
    pub month_income: f64,
    pub month_expense: f64,
    pub month_balance: f64,
    pub max_streak: u32,
    pub focus_sessions: u32,
    pub focus_minutes: u32,
    pub recent_moods: Vec<MoodItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsResponse {
    pub ok: bool,
    pub name: String,
    pub notifications: bool,
    pub sound: bool,
    pub work_duration: u32,
    pub short_break: u32,
    pub long_break: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub ok: bool,
    /// Suggested file name, `lifedash-backup-YYYY-MM-DD.json`.
    pub file_name: String,
    pub payload: String,
    pub message: String,
}

/// Focus timer state after a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerResponse {
    pub ok: bool,
    /// `work|break`.
    pub phase: String,
    pub running: bool,
    pub remaining_secs: u32,
    /// `MM:SS`.
    pub clock: String,
    pub completed_sessions: u32,
    /// Host must call [`timer_tick`] once per second while this is set.
    pub ticks_armed: bool,
    /// Host should play the end-of-work cue now.
    pub play_cue: bool,
    /// Id of the focus session recorded by this call, if any.
    pub session_id: Option<String>,
    pub message: String,
}

// Dashboard

#[flutter_rust_bridge::frb(sync)]
pub fn dashboard_summary() -> SummaryResponse {
    let day = today();
    let result = with_repo(|repo| {
        let dataset = repo.snapshot().map_err(|err| err.to_string())?;
        Ok(DashboardSummary::compute(&dataset, day))
    });
    match result {
        Ok(summary) => SummaryResponse {
            ok: true,
            day: day.to_string(),
            today_tasks: summary.today_tasks.iter().map(to_task_item).collect(),
            pending_count: count_u32(summary.pending_count),
            month_income: summary.month.income,
            month_expense: summary.month.expense,
            month_balance: summary.month.balance,
            max_streak: summary.max_streak,
            focus_sessions: count_u32(summary.focus.sessions),
            focus_minutes: summary.focus.minutes,
            recent_moods: summary.recent_moods.iter().map(to_mood_item).collect(),
            message: String::new(),
        },
        Err(err) => SummaryResponse {
            ok: false,
            day: day.to_string(),
            today_tasks: Vec::new(),
            pending_count: 0,
            month_income: 0.0,
            month_expense: 0.0,
            month_balance: 0.0,
            max_streak: 0,
            focus_sessions: 0,
            focus_minutes: 0,
            recent_moods: Vec::new(),
            message: failure_message("dashboard_summary", err),
        },
    }
}

// Tasks

/// Lists tasks matching `filter` (`all|active|completed|low|medium|high`)
/// and a case-insensitive title search.
#[flutter_rust_bridge::frb(sync)]
pub fn task_list(filter: String, search: String) -> TaskListResponse {
    let Some(filter) = TaskFilter::parse(&filter) else {
        return TaskListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("unknown task filter `{}`", filter.trim()),
        };
    };
    match with_repo(|repo| repo.tasks().map_err(|err| err.to_string())) {
        Ok(tasks) => TaskListResponse {
            ok: true,
            items: filter_tasks(&tasks, filter, &search)
                .iter()
                .map(to_task_item)
                .collect(),
            message: String::new(),
        },
        Err(err) => TaskListResponse {
            ok: false,
            items: Vec::new(),
            message: failure_message("task_list", err),
        },
    }
}

/// Creates a task. A missing `date` plans it for today.
#[flutter_rust_bridge::frb(sync)]
pub fn task_add(
    title: String,
    priority: String,
    date: Option<String>,
    category: String,
    note: String,
) -> ActionResponse {
    let title = title.trim().to_string();
    if title.is_empty() {
        return ActionResponse::failure("task title cannot be empty");
    }
    let Some(priority) = Priority::parse(&priority) else {
        return ActionResponse::failure(format!("unknown priority `{}`", priority.trim()));
    };
    let date = match date.as_deref().map(parse_day).transpose() {
        Ok(date) => date,
        Err(err) => return ActionResponse::failure(err),
    };
    let new = NewTask {
        title,
        priority,
        date,
        category: category.trim().to_string(),
        note,
    };
    let result = with_repo(|repo| {
        repo.add_task(new)
            .map(|task| Some(task.id))
            .map_err(|err| failure_message("task_add", err))
    });
    ActionResponse::from_result(result, "Task added.")
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle(id: String) -> ActionResponse {
    let result = with_repo(|repo| {
        repo.toggle_task(&id)
            .map(|_| None)
            .map_err(|err| failure_message("task_toggle", err))
    });
    ActionResponse::from_result(result, "Task updated.")
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(id: String) -> ActionResponse {
    let result = with_repo(|repo| {
        repo.delete_task(&id)
            .map(|_| None)
            .map_err(|err| failure_message("task_delete", err))
    });
    ActionResponse::from_result(result, "Task deleted.")
}

// Transactions

#[flutter_rust_bridge::frb(sync)]
pub fn transaction_list() -> TransactionListResponse {
    let day = today();
    match with_repo(|repo| repo.transactions().map_err(|err| err.to_string())) {
        Ok(transactions) => {
            let month = month_totals(&transactions, day);
            TransactionListResponse {
                ok: true,
                items: transactions.iter().map(to_transaction_item).collect(),
                month_income: month.income,
                month_expense: month.expense,
                month_balance: month.balance,
                week_expenses: weekly_expenses(&transactions, day)
                    .into_iter()
                    .map(|(day, amount)| DayAmount {
                        day: day.to_string(),
                        amount,
                    })
                    .collect(),
                message: String::new(),
            }
        }
        Err(err) => TransactionListResponse {
            ok: false,
            items: Vec::new(),
            month_income: 0.0,
            month_expense: 0.0,
            month_balance: 0.0,
            week_expenses: Vec::new(),
            message: failure_message("transaction_list", err),
        },
    }
}

/// Records a transaction; `kind` is `income|expense`, `amount` must be a
/// positive finite number.
#[flutter_rust_bridge::frb(sync)]
pub fn transaction_add(
    kind: String,
    description: String,
    amount: f64,
    category: String,
) -> ActionResponse {
    let kind = match kind.trim().to_ascii_lowercase().as_str() {
        "income" => TransactionKind::Income,
        "expense" => TransactionKind::Expense,
        other => return ActionResponse::failure(format!("unknown transaction kind `{other}`")),
    };
    if !amount.is_finite() || amount <= 0.0 {
        return ActionResponse::failure("amount must be a positive number");
    }
    let new = NewTransaction {
        kind,
        description: description.trim().to_string(),
        amount,
        category: category.trim().to_string(),
    };
    let result = with_repo(|repo| {
        repo.add_transaction(new)
            .map(|tx| Some(tx.id))
            .map_err(|err| failure_message("transaction_add", err))
    });
    ActionResponse::from_result(result, "Transaction added.")
}

#[flutter_rust_bridge::frb(sync)]
pub fn transaction_delete(id: String) -> ActionResponse {
    let result = with_repo(|repo| {
        repo.delete_transaction(&id)
            .map(|_| None)
            .map_err(|err| failure_message("transaction_delete", err))
    });
    ActionResponse::from_result(result, "Transaction deleted.")
}

#[flutter_rust_bridge::frb(sync)]
pub fn transaction_clear() -> ActionResponse {
    let result = with_repo(|repo| {
        repo.clear_transactions()
            .map(|()| None)
            .map_err(|err| failure_message("transaction_clear", err))
    });
    ActionResponse::from_result(result, "Transactions cleared.")
}

// Habits

#[flutter_rust_bridge::frb(sync)]
pub fn habit_list() -> HabitListResponse {
    let day = today();
    match with_repo(|repo| repo.habits().map_err(|err| err.to_string())) {
        Ok(habits) => HabitListResponse {
            ok: true,
            items: habits.iter().map(|habit| to_habit_item(habit, day)).collect(),
            message: String::new(),
        },
        Err(err) => HabitListResponse {
            ok: false,
            items: Vec::new(),
            message: failure_message("habit_list", err),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn habit_add(title: String, icon: String, goal: Option<u32>) -> ActionResponse {
    let title = title.trim().to_string();
    if title.is_empty() {
        return ActionResponse::failure("habit title cannot be empty");
    }
    let mut new = NewHabit::new(title, icon.trim());
    if let Some(goal) = goal.filter(|goal| *goal > 0) {
        new.goal = goal;
    }
    let result = with_repo(|repo| {
        repo.add_habit(new)
            .map(|habit| Some(habit.id))
            .map_err(|err| failure_message("habit_add", err))
    });
    ActionResponse::from_result(result, "Habit added.")
}

/// Flips one habit's flag for `day` (`YYYY-MM-DD`, today when absent).
#[flutter_rust_bridge::frb(sync)]
pub fn habit_toggle_day(id: String, day: Option<String>) -> ActionResponse {
    let day = match day.as_deref().map(parse_day).transpose() {
        Ok(day) => day.unwrap_or_else(today),
        Err(err) => return ActionResponse::failure(err),
    };
    let result = with_repo(|repo| {
        repo.toggle_habit_day(&id, day)
            .map(|_| None)
            .map_err(|err| failure_message("habit_toggle_day", err))
    });
    ActionResponse::from_result(result, "Habit updated.")
}

#[flutter_rust_bridge::frb(sync)]
pub fn habit_delete(id: String) -> ActionResponse {
    let result = with_repo(|repo| {
        repo.delete_habit(&id)
            .map(|_| None)
            .map_err(|err| failure_message("habit_delete", err))
    });
    ActionResponse::from_result(result, "Habit deleted.")
}

// Moods

/// Newest moods first; `limit` defaults to 14.
#[flutter_rust_bridge::frb(sync)]
pub fn mood_list(limit: Option<u32>) -> MoodListResponse {
    let limit = limit.unwrap_or(DEFAULT_MOOD_LIMIT) as usize;
    match with_repo(|repo| repo.moods().map_err(|err| err.to_string())) {
        Ok(moods) => MoodListResponse {
            ok: true,
            items: recent_moods(&moods, limit).iter().map(to_mood_item).collect(),
            message: String::new(),
        },
        Err(err) => MoodListResponse {
            ok: false,
            items: Vec::new(),
            message: failure_message("mood_list", err),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn mood_add(level: u8, note: String) -> ActionResponse {
    let level = match MoodLevel::new(level) {
        Ok(level) => level,
        Err(err) => return ActionResponse::failure(err.to_string()),
    };
    let new = NewMood {
        level,
        note: note.trim().to_string(),
    };
    let result = with_repo(|repo| {
        repo.add_mood(new)
            .map(|mood| Some(mood.id))
            .map_err(|err| failure_message("mood_add", err))
    });
    ActionResponse::from_result(result, "Mood logged.")
}

#[flutter_rust_bridge::frb(sync)]
pub fn mood_delete(id: String) -> ActionResponse {
    let result = with_repo(|repo| {
        repo.delete_mood(&id)
            .map(|_| None)
            .map_err(|err| failure_message("mood_delete", err))
    });
    ActionResponse::from_result(result, "Mood deleted.")
}

// Notes

#[flutter_rust_bridge::frb(sync)]
pub fn note_list() -> NoteListResponse {
    match with_repo(|repo| repo.notes().map_err(|err| err.to_string())) {
        Ok(notes) => NoteListResponse {
            ok: true,
            items: notes.iter().map(to_note_item).collect(),
            message: String::new(),
        },
        Err(err) => NoteListResponse {
            ok: false,
            items: Vec::new(),
            message: failure_message("note_list", err),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn note_add(title: String, content: String, color: String) -> ActionResponse {
    let new = NewNote {
        title: title.trim().to_string(),
        content,
        color: color.trim().to_string(),
    };
    let result = with_repo(|repo| {
        repo.add_note(new)
            .map(|note| Some(note.id))
            .map_err(|err| failure_message("note_add", err))
    });
    ActionResponse::from_result(result, "Note added.")
}

/// Merges the provided fields into the note; `None` keeps the stored value.
#[flutter_rust_bridge::frb(sync)]
pub fn note_update(
    id: String,
    title: Option<String>,
    content: Option<String>,
    color: Option<String>,
) -> ActionResponse {
    let patch = NotePatch {
        title,
        content,
        color,
    };
    let result = with_repo(|repo| {
        repo.update_note(&id, patch)
            .map(|_| None)
            .map_err(|err| failure_message("note_update", err))
    });
    ActionResponse::from_result(result, "Note updated.")
}

#[flutter_rust_bridge::frb(sync)]
pub fn note_delete(id: String) -> ActionResponse {
    let result = with_repo(|repo| {
        repo.delete_note(&id)
            .map(|_| None)
            .map_err(|err| failure_message("note_delete", err))
    });
    ActionResponse::from_result(result, "Note deleted.")
}

// Settings

#[flutter_rust_bridge::frb(sync)]
pub fn settings_get() -> SettingsResponse {
    to_settings_response(
        with_repo(|repo| repo.settings().map_err(|err| err.to_string())),
        "settings_get",
    )
}

/// Merges profile and notification fields; durations go through
/// [`timer_set_durations`].
#[flutter_rust_bridge::frb(sync)]
pub fn settings_update(
    name: Option<String>,
    notifications: Option<bool>,
    sound: Option<bool>,
) -> SettingsResponse {
    let patch = SettingsPatch {
        name: name.map(|name| name.trim().to_string()),
        notifications,
        sound,
        ..SettingsPatch::default()
    };
    to_settings_response(
        with_repo(|repo| repo.update_settings(&patch).map_err(|err| err.to_string())),
        "settings_update",
    )
}

// Transfer

#[flutter_rust_bridge::frb(sync)]
pub fn export_json() -> ExportResponse {
    let file_name = export_file_name(today());
    match with_repo(|repo| export_json_inner(repo).map_err(|err| err.to_string())) {
        Ok(payload) => ExportResponse {
            ok: true,
            file_name,
            payload,
            message: "Export ready.".to_string(),
        },
        Err(err) => ExportResponse {
            ok: false,
            file_name,
            payload: String::new(),
            message: failure_message("export_json", err),
        },
    }
}

/// Replaces every key present in `payload`. Nothing is written when the
/// document is malformed.
#[flutter_rust_bridge::frb(sync)]
pub fn import_json(payload: String) -> ActionResponse {
    let result = with_repo(|repo| {
        import_json_inner(repo, &payload).map_err(|err| failure_message("import_json", err))
    });
    let result = result.map(|keys| {
        let names: Vec<&str> = keys.iter().map(|key| key.as_str()).collect();
        format!("Imported: {}.", names.join(", "))
    });
    match result {
        Ok(message) => {
            reload_timer();
            ActionResponse::success(message, None)
        }
        Err(err) => ActionResponse::failure(err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn reset_all() -> ActionResponse {
    let result = with_repo(|repo| {
        reset_all_inner(repo)
            .map(|()| None)
            .map_err(|err| failure_message("reset_all", err))
    });
    if result.is_ok() {
        reload_timer();
    }
    ActionResponse::from_result(result, "All data cleared.")
}

// Focus timer

#[flutter_rust_bridge::frb(sync)]
pub fn timer_status() -> TimerResponse {
    with_timer("timer_status", |_, _| Ok(None))
}

#[flutter_rust_bridge::frb(sync)]
pub fn timer_start() -> TimerResponse {
    with_timer("timer_start", |timer, _| {
        timer.start();
        Ok(None)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn timer_pause() -> TimerResponse {
    with_timer("timer_pause", |timer, _| {
        timer.pause();
        Ok(None)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn timer_reset() -> TimerResponse {
    with_timer("timer_reset", |timer, repo| {
        timer.reset(repo).map_err(|err| err.to_string())?;
        Ok(None)
    })
}

/// One-second tick delivered by the host while `ticks_armed` is set.
#[flutter_rust_bridge::frb(sync)]
pub fn timer_tick() -> TimerResponse {
    with_timer("timer_tick", |timer, repo| {
        match timer.tick(repo).map_err(|err| err.to_string())? {
            TickOutcome::WorkCompleted { session, .. } => Ok(Some(session.id)),
            TickOutcome::Idle
            | TickOutcome::Counting { .. }
            | TickOutcome::BreakCompleted { .. } => Ok(None),
        }
    })
}

/// Persists phase lengths typed by the user. Non-numeric or non-positive
/// inputs fall back to 25/5/15 minutes.
#[flutter_rust_bridge::frb(sync)]
pub fn timer_set_durations(work: String, short_break: String, long_break: String) -> TimerResponse {
    let durations = FocusDurations::parse(&work, &short_break, &long_break);
    with_timer("timer_set_durations", move |timer, repo| {
        timer
            .update_durations(repo, durations)
            .map_err(|err| err.to_string())?;
        Ok(None)
    })
}

/// Tick and cue hooks surfaced to the host through [`TimerResponse`].
#[derive(Debug, Default)]
struct HostTimerDriver {
    ticks_armed: bool,
    cue_pending: bool,
}

impl TimerDriver for HostTimerDriver {
    fn schedule_ticks(&mut self) {
        self.ticks_armed = true;
    }

    fn cancel_ticks(&mut self) {
        self.ticks_armed = false;
    }

    fn play_cue(&mut self) {
        self.cue_pending = true;
    }
}

fn with_timer(
    call: &str,
    f: impl FnOnce(
        &mut FocusTimer<HostTimerDriver>,
        &Repo<'_>,
    ) -> Result<Option<String>, String>,
) -> TimerResponse {
    let mut slot = TIMER.lock().unwrap_or_else(PoisonError::into_inner);
    let result = with_repo(|repo| {
        if slot.is_none() {
            let settings = repo.settings().map_err(|err| err.to_string())?;
            *slot = Some(FocusTimer::new(HostTimerDriver::default(), &settings));
        }
        match slot.as_mut() {
            Some(timer) => f(timer, repo),
            None => Err("timer unavailable".to_string()),
        }
    });

    let Some(timer) = slot.as_mut() else {
        let message = match result {
            Err(err) => failure_message(call, err),
            Ok(_) => "timer unavailable".to_string(),
        };
        return TimerResponse {
            ok: false,
            phase: "work".to_string(),
            running: false,
            remaining_secs: 0,
            clock: "00:00".to_string(),
            completed_sessions: 0,
            ticks_armed: false,
            play_cue: false,
            session_id: None,
            message,
        };
    };

    let play_cue = std::mem::take(&mut timer.driver_mut().cue_pending);
    let ticks_armed = timer.driver().ticks_armed;
    let status = timer.status();
    let (ok, session_id, message) = match result {
        Ok(session_id) => (true, session_id, String::new()),
        Err(err) => (false, None, failure_message(call, err)),
    };
    to_timer_response(&status, ok, ticks_armed, play_cue, session_id, message)
}

/// Drops the timer so the next call sizes a fresh one from stored settings.
fn reload_timer() {
    let mut slot = TIMER.lock().unwrap_or_else(PoisonError::into_inner);
    *slot = None;
}

fn to_timer_response(
    status: &TimerStatus,
    ok: bool,
    ticks_armed: bool,
    play_cue: bool,
    session_id: Option<String>,
    message: String,
) -> TimerResponse {
    TimerResponse {
        ok,
        phase: status.phase.as_str().to_string(),
        running: status.running,
        remaining_secs: status.remaining_secs,
        clock: status.clock(),
        completed_sessions: status.completed_sessions,
        ticks_armed,
        play_cue,
        session_id,
        message,
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn with_repo<T>(f: impl FnOnce(&Repo<'_>) -> Result<T, String>) -> Result<T, String> {
    let db_path = resolve_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("store open failed: {err}"))?;
    let repo = DashboardRepository::open(SqliteKvStore::new(&conn))
        .map_err(|err| format!("store init failed: {err}"))?;
    f(&repo)
}

fn failure_message(call: &str, err: impl Display) -> String {
    warn!("event=ffi_call module=ffi status=error call={call}");
    format!("{call} failed: {err}")
}

fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid day `{}`; expected YYYY-MM-DD", raw.trim()))
}

fn epoch_ms(timestamp: &DateTime<Utc>) -> i64 {
    timestamp.timestamp_millis()
}

fn count_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

fn to_task_item(task: &Task) -> TaskItem {
    TaskItem {
        id: task.id.clone(),
        title: task.title.clone(),
        priority: task.priority.as_str().to_string(),
        date: task.date.to_string(),
        category: task.category.clone(),
        note: task.note.clone(),
        completed: task.completed,
        created_at_ms: epoch_ms(&task.created_at),
    }
}

fn to_transaction_item(tx: &Transaction) -> TransactionItem {
    TransactionItem {
        id: tx.id.clone(),
        kind: tx.kind.as_str().to_string(),
        description: tx.description.clone(),
        amount: tx.amount,
        category: tx.category.clone(),
        date_ms: epoch_ms(&tx.date),
    }
}

fn to_habit_item(habit: &Habit, day: NaiveDate) -> HabitItem {
    HabitItem {
        id: habit.id.clone(),
        title: habit.title.clone(),
        icon: habit.icon.clone(),
        goal: habit.goal,
        streak: habit_streak(habit, day),
        done_today: habit.is_done_on(day),
        last_seven_days: habit_week(habit, day)
            .into_iter()
            .map(|(_, done)| done)
            .collect(),
    }
}

fn to_mood_item(mood: &Mood) -> MoodItem {
    MoodItem {
        id: mood.id.clone(),
        level: mood.level.get(),
        note: mood.note.clone(),
        date_ms: epoch_ms(&mood.date),
    }
}

fn to_note_item(note: &Note) -> NoteItem {
    NoteItem {
        id: note.id.clone(),
        title: note.title.clone(),
        content: note.content.clone(),
        color: note.color.clone(),
        created_at_ms: epoch_ms(&note.created_at),
        updated_at_ms: epoch_ms(&note.updated_at),
    }
}

fn to_settings_response(result: Result<Settings, String>, call: &str) -> SettingsResponse {
    match result {
        Ok(settings) => SettingsResponse {
            ok: true,
            name: settings.name,
            notifications: settings.notifications,
            sound: settings.sound,
            work_duration: settings.work_duration,
            short_break: settings.short_break,
            long_break: settings.long_break,
            message: String::new(),
        },
        Err(err) => {
            let defaults = Settings::default();
            SettingsResponse {
                ok: false,
                name: defaults.name,
                notifications: defaults.notifications,
                sound: defaults.sound,
                work_duration: defaults.work_duration,
                short_break: defaults.short_break,
                long_break: defaults.long_break,
                message: failure_message(call, err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        configure_store, core_version, export_json, habit_add, habit_list, habit_toggle_day,
        import_json, init_logging, mood_add, mood_list, note_add, note_list, note_update,
        task_add, task_delete, task_list, task_toggle, timer_pause, timer_set_durations,
        timer_start, timer_status, timer_tick, transaction_add, transaction_list,
    };
    use lifedash_core::today;
    use std::sync::{Mutex, MutexGuard, PoisonError};
    use std::time::{SystemTime, UNIX_EPOCH};

    // Store-backed tests share one database file and one timer.
    static SHARED_STORE: Mutex<()> = Mutex::new(());

    fn lock_store() -> MutexGuard<'static, ()> {
        SHARED_STORE.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn configure_store_rejects_empty_path() {
        assert!(!configure_store("  ".to_string()).is_empty());
    }

    #[test]
    fn task_lifecycle_round_trips_through_envelopes() {
        let _store = lock_store();
        let title = unique_token("task");
        let added = task_add(
            title.clone(),
            "high".to_string(),
            Some("2031-02-03".to_string()),
            "work".to_string(),
            String::new(),
        );
        assert!(added.ok, "{}", added.message);
        let id = added.id.clone().unwrap();

        let listed = task_list("high".to_string(), title.clone());
        assert_eq!(listed.items.len(), 1);
        assert_eq!(listed.items[0].date, "2031-02-03");

        assert!(task_toggle(id.clone()).ok);
        let completed = task_list("completed".to_string(), title.clone());
        assert!(completed.items.iter().any(|item| item.id == id));

        assert!(task_delete(id.clone()).ok);
        let after = task_list("all".to_string(), title);
        assert!(after.items.is_empty());
    }

    #[test]
    fn task_add_rejects_bad_input() {
        let _store = lock_store();
        let empty = task_add(
            "  ".to_string(),
            "low".to_string(),
            None,
            String::new(),
            String::new(),
        );
        assert!(!empty.ok);

        let bad_day = task_add(
            "x".to_string(),
            "low".to_string(),
            Some("03/02/2031".to_string()),
            String::new(),
            String::new(),
        );
        assert!(!bad_day.ok);
        assert!(bad_day.message.contains("YYYY-MM-DD"));

        assert!(!task_list("someday".to_string(), String::new()).ok);
    }

    #[test]
    fn transaction_add_validates_kind_and_amount() {
        let _store = lock_store();
        assert!(!transaction_add("gift".to_string(), String::new(), 5.0, String::new()).ok);
        assert!(!transaction_add("expense".to_string(), String::new(), 0.0, String::new()).ok);

        let added = transaction_add(
            "expense".to_string(),
            unique_token("tx"),
            4.5,
            "food".to_string(),
        );
        assert!(added.ok, "{}", added.message);
        let id = added.id.unwrap();
        let listed = transaction_list();
        assert!(listed.items.iter().any(|item| item.id == id));
        assert_eq!(listed.week_expenses.len(), 7);
        assert_eq!(
            listed.week_expenses.last().map(|entry| entry.day.clone()),
            Some(today().to_string())
        );
        assert!(listed.week_expenses.iter().all(|entry| entry.amount >= 0.0));
    }

    #[test]
    fn habit_toggle_marks_today_done() {
        let _store = lock_store();
        let added = habit_add(unique_token("habit"), "⭐".to_string(), None);
        assert!(added.ok, "{}", added.message);
        let id = added.id.unwrap();

        assert!(habit_toggle_day(id.clone(), None).ok);

        let habit = habit_list()
            .items
            .into_iter()
            .find(|item| item.id == id)
            .unwrap();
        assert!(habit.done_today);
        assert_eq!(habit.streak, 1);
        assert_eq!(habit.last_seven_days.len(), 7);
        assert!(habit.last_seven_days[6]);
    }

    #[test]
    fn mood_add_rejects_out_of_range_level() {
        let _store = lock_store();
        assert!(!mood_add(0, String::new()).ok);
        assert!(!mood_add(6, String::new()).ok);

        let added = mood_add(3, unique_token("mood"));
        assert!(added.ok, "{}", added.message);
        let id = added.id.unwrap();
        assert!(mood_list(Some(50)).items.iter().any(|item| item.id == id));
    }

    #[test]
    fn note_update_keeps_untouched_fields() {
        let _store = lock_store();
        let added = note_add(unique_token("note"), "body".to_string(), "green".to_string());
        let id = added.id.unwrap();

        let updated = note_update(id.clone(), None, Some("new body".to_string()), None);
        assert!(updated.ok, "{}", updated.message);

        let note = note_list()
            .items
            .into_iter()
            .find(|item| item.id == id)
            .unwrap();
        assert_eq!(note.content, "new body");
        assert_eq!(note.color, "green");
        assert!(note.updated_at_ms >= note.created_at_ms);
    }

    #[test]
    fn export_payload_imports_cleanly() {
        let _store = lock_store();
        let exported = export_json();
        assert!(exported.ok, "{}", exported.message);
        assert!(exported.file_name.starts_with("lifedash-backup-"));

        let imported = import_json(exported.payload);
        assert!(imported.ok, "{}", imported.message);

        let rejected = import_json("{\"tasks\": 5}".to_string());
        assert!(!rejected.ok);
    }

    #[test]
    fn timer_counts_down_only_while_running() {
        let _store = lock_store();
        let configured = timer_set_durations("1".to_string(), "1".to_string(), "1".to_string());
        assert!(configured.ok, "{}", configured.message);

        let paused = timer_pause();
        assert!(!paused.running);
        let idle = timer_tick();
        assert_eq!(idle.remaining_secs, paused.remaining_secs);

        let started = timer_start();
        assert!(started.running);
        assert!(started.ticks_armed);

        let ticked = timer_tick();
        assert_eq!(ticked.remaining_secs + 1, started.remaining_secs);

        let stopped = timer_pause();
        assert!(!stopped.ticks_armed);
        assert_eq!(timer_status().clock, stopped.clock);
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
