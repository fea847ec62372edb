//! Derived dashboard views.
//!
//! # Responsibility
//! - Compute today's and this month's aggregates from collection snapshots.
//!
//! # Invariants
//! - Every function is pure: inputs are snapshots plus the reference day.
//! - Nothing here is persisted or cached.

use crate::model::dataset::Dataset;
use crate::model::focus::FocusSession;
use crate::model::habit::Habit;
use crate::model::mood::Mood;
use crate::model::task::{Priority, Task};
use crate::model::transaction::{Transaction, TransactionKind};
use crate::model::local_day;
use chrono::{Datelike, Duration, NaiveDate};

/// Furthest a habit streak walk looks back.
pub const STREAK_WINDOW_DAYS: u32 = 365;
/// Moods shown on the dashboard card.
pub const DASHBOARD_MOOD_COUNT: usize = 7;

/// Tasks planned for `today` that are still open.
pub fn today_pending_tasks(tasks: &[Task], today: NaiveDate) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| task.date == today && !task.completed)
        .cloned()
        .collect()
}

/// Open tasks regardless of their planned day.
pub fn pending_count(tasks: &[Task]) -> usize {
    tasks.iter().filter(|task| !task.completed).count()
}

/// Task list filter offered by the task screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
    Priority(Priority),
}

impl TaskFilter {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            other => Priority::parse(other).map(Self::Priority),
        }
    }

    fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
            Self::Priority(priority) => task.priority == priority,
        }
    }
}

/// Applies `filter` and a case-insensitive title search, keeping order.
pub fn filter_tasks(tasks: &[Task], filter: TaskFilter, search: &str) -> Vec<Task> {
    let needle = search.trim().to_lowercase();
    tasks
        .iter()
        .filter(|task| needle.is_empty() || task.title.to_lowercase().contains(&needle))
        .filter(|task| filter.matches(task))
        .cloned()
        .collect()
}

/// Income and expense totals for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MonthTotals {
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
}

/// Sums transactions dated in the same month and year as `today`.
pub fn month_totals(transactions: &[Transaction], today: NaiveDate) -> MonthTotals {
    let (income, expense) = transactions
        .iter()
        .filter(|tx| {
            let day = local_day(&tx.date);
            day.year() == today.year() && day.month() == today.month()
        })
        .fold((0.0, 0.0), |(income, expense), tx| match tx.kind {
            TransactionKind::Income => (income + tx.amount, expense),
            TransactionKind::Expense => (income, expense + tx.amount),
        });

    MonthTotals {
        income,
        expense,
        balance: income - expense,
    }
}

/// Expense total for each of the seven days ending at `today`, oldest first.
pub fn weekly_expenses(transactions: &[Transaction], today: NaiveDate) -> Vec<(NaiveDate, f64)> {
    (0..7)
        .rev()
        .map(|offset| {
            let day = today - Duration::days(offset);
            let total: f64 = transactions
                .iter()
                .filter(|tx| tx.kind == TransactionKind::Expense && local_day(&tx.date) == day)
                .map(|tx| tx.amount)
                .sum();
            (day, total)
        })
        .collect()
}

/// Length of the unbroken run of completed days ending at `today`.
///
/// An open `today` yields 0. The walk never looks further back than
/// [`STREAK_WINDOW_DAYS`].
pub fn habit_streak(habit: &Habit, today: NaiveDate) -> u32 {
    let mut streak = 0;
    for offset in 0..STREAK_WINDOW_DAYS {
        let day = today - Duration::days(i64::from(offset));
        if !habit.is_done_on(day) {
            break;
        }
        streak += 1;
    }
    streak
}

pub fn max_streak(habits: &[Habit], today: NaiveDate) -> u32 {
    habits
        .iter()
        .map(|habit| habit_streak(habit, today))
        .max()
        .unwrap_or(0)
}

/// The seven days ending at `today` with the habit's flag for each.
pub fn habit_week(habit: &Habit, today: NaiveDate) -> Vec<(NaiveDate, bool)> {
    (0..7)
        .rev()
        .map(|offset| {
            let day = today - Duration::days(offset);
            (day, habit.is_done_on(day))
        })
        .collect()
}

/// Focus sessions finished on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FocusTotals {
    pub sessions: usize,
    pub minutes: u32,
}

pub fn today_focus_sessions(sessions: &[FocusSession], today: NaiveDate) -> Vec<FocusSession> {
    sessions
        .iter()
        .filter(|session| local_day(&session.date) == today)
        .cloned()
        .collect()
}

pub fn today_focus(sessions: &[FocusSession], today: NaiveDate) -> FocusTotals {
    sessions
        .iter()
        .filter(|session| local_day(&session.date) == today)
        .fold(FocusTotals::default(), |totals, session| FocusTotals {
            sessions: totals.sessions + 1,
            minutes: totals.minutes + session.duration,
        })
}

/// Newest `limit` moods; the collection is already newest-first.
pub fn recent_moods(moods: &[Mood], limit: usize) -> Vec<Mood> {
    moods.iter().take(limit).cloned().collect()
}

/// Every derived value the dashboard screen shows.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub day: NaiveDate,
    pub today_tasks: Vec<Task>,
    pub pending_count: usize,
    pub month: MonthTotals,
    pub max_streak: u32,
    pub focus: FocusTotals,
    pub recent_moods: Vec<Mood>,
}

impl DashboardSummary {
    pub fn compute(dataset: &Dataset, today: NaiveDate) -> Self {
        Self {
            day: today,
            today_tasks: today_pending_tasks(&dataset.tasks, today),
            pending_count: pending_count(&dataset.tasks),
            month: month_totals(&dataset.transactions, today),
            max_streak: max_streak(&dataset.habits, today),
            focus: today_focus(&dataset.pomodoros, today),
            recent_moods: recent_moods(&dataset.moods, DASHBOARD_MOOD_COUNT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{filter_tasks, TaskFilter};
    use crate::model::task::{Priority, Task};
    use chrono::{NaiveDate, Utc};

    fn task(title: &str, priority: Priority, completed: bool) -> Task {
        Task {
            id: title.to_string(),
            title: title.to_string(),
            priority,
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            category: String::new(),
            note: String::new(),
            completed,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn task_filter_parses_known_names() {
        assert_eq!(TaskFilter::parse("Active"), Some(TaskFilter::Active));
        assert_eq!(
            TaskFilter::parse("high"),
            Some(TaskFilter::Priority(Priority::High))
        );
        assert_eq!(TaskFilter::parse("soon"), None);
    }

    #[test]
    fn filter_combines_search_and_status() {
        let tasks = vec![
            task("Write report", Priority::High, false),
            task("Read report", Priority::Low, true),
            task("Groceries", Priority::High, false),
        ];

        let open_reports = filter_tasks(&tasks, TaskFilter::Active, "REPORT");
        assert_eq!(open_reports.len(), 1);
        assert_eq!(open_reports[0].title, "Write report");

        let high = filter_tasks(&tasks, TaskFilter::Priority(Priority::High), "");
        let titles: Vec<_> = high.iter().map(|task| task.title.as_str()).collect();
        assert_eq!(titles, ["Write report", "Groceries"]);
    }
}
