//! Core data store for the LifeDash personal dashboard.
//! This crate owns every persisted collection, the derived dashboard views
//! and the focus-session timer.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::dataset::{Dataset, PartialDataset};
pub use model::focus::FocusSession;
pub use model::habit::{Habit, NewHabit};
pub use model::mood::{Mood, MoodLevel, NewMood};
pub use model::note::{NewNote, Note, NotePatch};
pub use model::settings::{Settings, SettingsPatch};
pub use model::task::{NewTask, Priority, Task};
pub use model::transaction::{NewTransaction, Transaction, TransactionKind};
pub use model::{day_key, local_day, today, EntityId, ValidationError};
pub use repo::dashboard_repo::DashboardRepository;
pub use repo::{RepoError, RepoResult};
pub use service::focus_timer::{
    FocusDurations, FocusPhase, FocusTimer, IntervalSchedule, TickOutcome, TimerDriver,
    TimerStatus,
};
pub use service::transfer::{
    export_all, export_file_name, export_json, import_all, import_json, parse_import, reset_all,
    TransferError,
};
pub use service::views::{DashboardSummary, FocusTotals, MonthTotals, TaskFilter};
pub use storage::{KeyValueStore, KvBatch, SqliteKvStore, StoreKey};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
