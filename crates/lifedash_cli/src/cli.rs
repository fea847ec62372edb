//! Command-line surface over the dashboard core.
//!
//! # Responsibility
//! - Parse subcommands and print human-readable results.
//! - Run the focus timer in the foreground.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{bail, eyre, Result, WrapErr};
use lifedash_core::service::views::{
    filter_tasks, habit_streak, habit_week, month_totals, recent_moods, today_focus_sessions,
    weekly_expenses,
};
use lifedash_core::{
    export_file_name, export_json, import_json, reset_all, today, DashboardRepository,
    DashboardSummary, FocusDurations, FocusTimer, IntervalSchedule, KeyValueStore, MoodLevel,
    NewHabit, NewMood, NewNote, NewTask, NewTransaction, NotePatch, Priority, SettingsPatch,
    TaskFilter, TickOutcome, TimerDriver, TransactionKind,
};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "lifedash")]
#[command(about = "Personal dashboard: tasks, money, habits, mood, notes and focus sessions")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Database file (overrides LIFEDASH_DB and the config file)
    #[arg(long)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show today's dashboard
    Summary,
    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),
    /// Manage income and expense records
    #[command(subcommand)]
    Tx(TxCommand),
    /// Manage daily habits
    #[command(subcommand)]
    Habit(HabitCommand),
    /// Log and review moods
    #[command(subcommand)]
    Mood(MoodCommand),
    /// Manage notes
    #[command(subcommand)]
    Note(NoteCommand),
    /// Run and configure the focus timer
    #[command(subcommand)]
    Focus(FocusCommand),
    /// Show or change settings
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Write every collection to a JSON backup
    Export {
        /// Output file (defaults to lifedash-backup-YYYY-MM-DD.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace the collections present in a JSON backup
    Import {
        /// Backup file to read
        path: PathBuf,
    },
    /// Delete all data and restore default settings
    Reset {
        /// Required to confirm the reset
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum TaskCommand {
    Add {
        title: String,
        /// low, medium or high
        #[arg(short, long, default_value = "medium", value_parser = parse_priority)]
        priority: Priority,
        /// Planned day (YYYY-MM-DD), defaults to today
        #[arg(short, long, value_parser = parse_day)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value = "")]
        note: String,
    },
    List {
        /// all, active, completed, low, medium or high
        #[arg(short, long, default_value = "all", value_parser = parse_filter)]
        filter: TaskFilter,
        /// Case-insensitive title search
        #[arg(short, long, default_value = "")]
        search: String,
    },
    Toggle { id: String },
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum TxCommand {
    Add {
        /// income or expense
        #[arg(value_parser = parse_kind)]
        kind: TransactionKind,
        amount: f64,
        description: String,
        #[arg(long, default_value = "")]
        category: String,
    },
    List,
    Delete { id: String },
    /// Delete every transaction
    Clear,
}

#[derive(Subcommand)]
pub enum HabitCommand {
    Add {
        title: String,
        #[arg(long, default_value = "")]
        icon: String,
        #[arg(long, default_value_t = 1)]
        goal: u32,
    },
    List,
    /// Flip the done flag for a day
    Toggle {
        id: String,
        /// Day to toggle (YYYY-MM-DD), defaults to today
        #[arg(short, long, value_parser = parse_day)]
        date: Option<NaiveDate>,
    },
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum MoodCommand {
    Add {
        /// 1 (awful) to 5 (great)
        #[arg(value_parser = parse_level)]
        level: MoodLevel,
        #[arg(short, long, default_value = "")]
        note: String,
    },
    List {
        #[arg(short, long, default_value_t = 14)]
        limit: usize,
    },
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum NoteCommand {
    Add {
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        #[arg(long, default_value = "")]
        color: String,
    },
    List,
    Edit {
        id: String,
        #[command(flatten)]
        fields: NoteFields,
    },
    Delete { id: String },
}

#[derive(Args)]
pub struct NoteFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    content: Option<String>,
    #[arg(long)]
    color: Option<String>,
}

#[derive(Subcommand)]
pub enum FocusCommand {
    /// Run work/break cycles in the foreground
    Run {
        /// Work phases to complete before exiting
        #[arg(long, default_value_t = 1)]
        cycles: u32,
    },
    /// Set work, short break and long break minutes
    Durations {
        work: String,
        short_break: String,
        long_break: String,
    },
    /// Sessions finished today
    Today,
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    Show,
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        notifications: Option<bool>,
        #[arg(long)]
        sound: Option<bool>,
    },
}

pub fn run_command<S: KeyValueStore>(
    command: Commands,
    repo: &DashboardRepository<S>,
) -> Result<()> {
    match command {
        Commands::Summary => handle_summary(repo),
        Commands::Task(command) => handle_task(command, repo),
        Commands::Tx(command) => handle_tx(command, repo),
        Commands::Habit(command) => handle_habit(command, repo),
        Commands::Mood(command) => handle_mood(command, repo),
        Commands::Note(command) => handle_note(command, repo),
        Commands::Focus(command) => handle_focus(command, repo),
        Commands::Settings(command) => handle_settings(command, repo),
        Commands::Export { output } => handle_export(output, repo),
        Commands::Import { path } => handle_import(path, repo),
        Commands::Reset { force } => handle_reset(force, repo),
    }
}

fn handle_summary<S: KeyValueStore>(repo: &DashboardRepository<S>) -> Result<()> {
    let summary = DashboardSummary::compute(&repo.snapshot()?, today());
    let name = repo.settings()?.name;
    if name.is_empty() {
        println!("Dashboard for {}", summary.day);
    } else {
        println!("Hello {name}, dashboard for {}", summary.day);
    }
    println!(
        "Tasks today: {} open ({} open overall)",
        summary.today_tasks.len(),
        summary.pending_count
    );
    for task in &summary.today_tasks {
        println!("  [{}] {}  {}", task.priority.as_str(), task.title, task.id);
    }
    println!(
        "This month: +{:.2} -{:.2} = {:.2}",
        summary.month.income, summary.month.expense, summary.month.balance
    );
    println!("Best habit streak: {} day(s)", summary.max_streak);
    println!(
        "Focus today: {} session(s), {} min",
        summary.focus.sessions, summary.focus.minutes
    );
    let moods: Vec<String> = summary
        .recent_moods
        .iter()
        .map(|mood| mood.level.get().to_string())
        .collect();
    println!("Recent moods: {}", moods.join(" "));
    Ok(())
}

fn handle_task<S: KeyValueStore>(command: TaskCommand, repo: &DashboardRepository<S>) -> Result<()> {
    match command {
        TaskCommand::Add {
            title,
            priority,
            date,
            category,
            note,
        } => {
            let task = repo.add_task(NewTask {
                title: non_empty(title, "task title")?,
                priority,
                date,
                category,
                note,
            })?;
            println!("Task added: {} ({})", task.id, task.date);
        }
        TaskCommand::List { filter, search } => {
            for task in filter_tasks(&repo.tasks()?, filter, &search) {
                let mark = if task.completed { "x" } else { " " };
                println!(
                    "[{mark}] {}  {}  {}  {}",
                    task.date,
                    task.priority.as_str(),
                    task.title,
                    task.id
                );
            }
        }
        TaskCommand::Toggle { id } => {
            repo.toggle_task(&id)?;
            println!("Task toggled.");
        }
        TaskCommand::Delete { id } => {
            repo.delete_task(&id)?;
            println!("Task deleted.");
        }
    }
    Ok(())
}

fn handle_tx<S: KeyValueStore>(command: TxCommand, repo: &DashboardRepository<S>) -> Result<()> {
    match command {
        TxCommand::Add {
            kind,
            amount,
            description,
            category,
        } => {
            if !amount.is_finite() || amount <= 0.0 {
                bail!("amount must be a positive number");
            }
            let tx = repo.add_transaction(NewTransaction {
                kind,
                description,
                amount,
                category,
            })?;
            println!("Transaction added: {}", tx.id);
        }
        TxCommand::List => {
            let transactions = repo.transactions()?;
            for tx in &transactions {
                println!(
                    "{}  {:>10.2}  {}  {}  {}",
                    tx.date.format("%Y-%m-%d"),
                    tx.signed_amount(),
                    tx.category,
                    tx.description,
                    tx.id
                );
            }
            let day = today();
            let month = month_totals(&transactions, day);
            println!(
                "Month: income {:.2}, expense {:.2}, balance {:.2}",
                month.income, month.expense, month.balance
            );
            println!("Last 7 days:");
            for (day, total) in weekly_expenses(&transactions, day) {
                println!("  {}  {:>10.2}", day.format("%a %m-%d"), total);
            }
        }
        TxCommand::Delete { id } => {
            repo.delete_transaction(&id)?;
            println!("Transaction deleted.");
        }
        TxCommand::Clear => {
            repo.clear_transactions()?;
            println!("Transactions cleared.");
        }
    }
    Ok(())
}

fn handle_habit<S: KeyValueStore>(
    command: HabitCommand,
    repo: &DashboardRepository<S>,
) -> Result<()> {
    match command {
        HabitCommand::Add { title, icon, goal } => {
            let habit = repo.add_habit(NewHabit {
                goal: goal.max(1),
                ..NewHabit::new(non_empty(title, "habit title")?, icon)
            })?;
            println!("Habit added: {}", habit.id);
        }
        HabitCommand::List => {
            let day = today();
            for habit in repo.habits()? {
                let week: String = habit_week(&habit, day)
                    .into_iter()
                    .map(|(_, done)| if done { '#' } else { '.' })
                    .collect();
                println!(
                    "{} {}  {}  streak {}  {}",
                    habit.icon,
                    habit.title,
                    week,
                    habit_streak(&habit, day),
                    habit.id
                );
            }
        }
        HabitCommand::Toggle { id, date } => {
            repo.toggle_habit_day(&id, date.unwrap_or_else(today))?;
            println!("Habit toggled.");
        }
        HabitCommand::Delete { id } => {
            repo.delete_habit(&id)?;
            println!("Habit deleted.");
        }
    }
    Ok(())
}

fn handle_mood<S: KeyValueStore>(command: MoodCommand, repo: &DashboardRepository<S>) -> Result<()> {
    match command {
        MoodCommand::Add { level, note } => {
            let mood = repo.add_mood(NewMood { level, note })?;
            println!("Mood logged: {}", mood.id);
        }
        MoodCommand::List { limit } => {
            for mood in recent_moods(&repo.moods()?, limit) {
                println!(
                    "{}  {}  {}  {}",
                    mood.date.format("%Y-%m-%d %H:%M"),
                    mood.level.get(),
                    mood.note,
                    mood.id
                );
            }
        }
        MoodCommand::Delete { id } => {
            repo.delete_mood(&id)?;
            println!("Mood deleted.");
        }
    }
    Ok(())
}

fn handle_note<S: KeyValueStore>(command: NoteCommand, repo: &DashboardRepository<S>) -> Result<()> {
    match command {
        NoteCommand::Add {
            title,
            content,
            color,
        } => {
            let note = repo.add_note(NewNote {
                title,
                content,
                color,
            })?;
            println!("Note added: {}", note.id);
        }
        NoteCommand::List => {
            for note in repo.notes()? {
                println!(
                    "{}  {}  {}",
                    note.updated_at.format("%Y-%m-%d %H:%M"),
                    note.title,
                    note.id
                );
            }
        }
        NoteCommand::Edit { id, fields } => {
            repo.update_note(
                &id,
                NotePatch {
                    title: fields.title,
                    content: fields.content,
                    color: fields.color,
                },
            )?;
            println!("Note updated.");
        }
        NoteCommand::Delete { id } => {
            repo.delete_note(&id)?;
            println!("Note deleted.");
        }
    }
    Ok(())
}

fn handle_focus<S: KeyValueStore>(
    command: FocusCommand,
    repo: &DashboardRepository<S>,
) -> Result<()> {
    match command {
        FocusCommand::Run { cycles } => run_focus(cycles.max(1), repo),
        FocusCommand::Durations {
            work,
            short_break,
            long_break,
        } => {
            let durations = FocusDurations::parse(&work, &short_break, &long_break);
            let settings = repo.update_settings(&SettingsPatch {
                work_duration: Some(durations.work),
                short_break: Some(durations.short_break),
                long_break: Some(durations.long_break),
                ..SettingsPatch::default()
            })?;
            println!(
                "Durations: work {} min, short break {} min, long break {} min",
                settings.work_duration, settings.short_break, settings.long_break
            );
            Ok(())
        }
        FocusCommand::Today => {
            let sessions = today_focus_sessions(&repo.focus_sessions()?, today());
            for session in &sessions {
                println!(
                    "{}  {} min",
                    session.date.format("%H:%M"),
                    session.duration
                );
            }
            let minutes: u32 = sessions.iter().map(|session| session.duration).sum();
            println!("{} session(s), {minutes} min", sessions.len());
            Ok(())
        }
    }
}

/// Tick schedule and terminal bell for the foreground timer.
#[derive(Default)]
struct TerminalDriver {
    schedule: IntervalSchedule,
}

impl TimerDriver for TerminalDriver {
    fn schedule_ticks(&mut self) {
        self.schedule.arm_at(Instant::now());
    }

    fn cancel_ticks(&mut self) {
        self.schedule.disarm();
    }

    fn play_cue(&mut self) {
        print!("\x07");
    }
}

fn run_focus<S: KeyValueStore>(cycles: u32, repo: &DashboardRepository<S>) -> Result<()> {
    let mut timer = FocusTimer::new(TerminalDriver::default(), &repo.settings()?);
    let mut finished = 0;
    timer.start();

    while finished < cycles {
        let Some(wait) = timer.driver().schedule.time_until_due(Instant::now()) else {
            break;
        };
        std::thread::sleep(wait);

        let due = timer.driver_mut().schedule.take_due(Instant::now());
        for _ in 0..due {
            match timer.tick(repo)? {
                TickOutcome::Idle => break,
                TickOutcome::Counting { .. } => {
                    let status = timer.status();
                    print!("\r{:<5} {}", status.phase.as_str(), status.clock());
                }
                TickOutcome::WorkCompleted {
                    session,
                    break_secs,
                    long_break,
                } => {
                    finished += 1;
                    println!("\rFocus session recorded: {} min", session.duration);
                    if finished < cycles {
                        let kind = if long_break { "long" } else { "short" };
                        println!("Starting {kind} break ({} min)", break_secs / 60);
                        timer.start();
                    }
                    break;
                }
                TickOutcome::BreakCompleted { .. } => {
                    println!("\rBreak over, back to work");
                    timer.start();
                    break;
                }
            }
        }
        std::io::stdout().flush().wrap_err("failed to flush stdout")?;
    }

    println!("Completed {finished} focus session(s).");
    Ok(())
}

fn handle_settings<S: KeyValueStore>(
    command: SettingsCommand,
    repo: &DashboardRepository<S>,
) -> Result<()> {
    let settings = match command {
        SettingsCommand::Show => repo.settings()?,
        SettingsCommand::Set {
            name,
            notifications,
            sound,
        } => repo.update_settings(&SettingsPatch {
            name,
            notifications,
            sound,
            ..SettingsPatch::default()
        })?,
    };
    println!("name = {:?}", settings.name);
    println!("notifications = {}", settings.notifications);
    println!("sound = {}", settings.sound);
    println!("work_duration = {}", settings.work_duration);
    println!("short_break = {}", settings.short_break);
    println!("long_break = {}", settings.long_break);
    Ok(())
}

fn handle_export<S: KeyValueStore>(
    output: Option<PathBuf>,
    repo: &DashboardRepository<S>,
) -> Result<()> {
    let path = output.unwrap_or_else(|| PathBuf::from(export_file_name(today())));
    let document = export_json(repo)?;
    fs::write(&path, document).wrap_err_with(|| format!("failed to write {}", path.display()))?;
    println!("Exported to {}", path.display());
    Ok(())
}

fn handle_import<S: KeyValueStore>(path: PathBuf, repo: &DashboardRepository<S>) -> Result<()> {
    let text =
        fs::read_to_string(&path).wrap_err_with(|| format!("failed to read {}", path.display()))?;
    let keys = import_json(repo, &text)?;
    let names: Vec<&str> = keys.iter().map(|key| key.as_str()).collect();
    println!("Imported: {}", names.join(", "));
    Ok(())
}

fn handle_reset<S: KeyValueStore>(force: bool, repo: &DashboardRepository<S>) -> Result<()> {
    if !force {
        bail!("reset deletes every record; re-run with --force to confirm");
    }
    reset_all(repo)?;
    println!("All data cleared.");
    Ok(())
}

fn non_empty(value: String, what: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(eyre!("{what} cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid day `{raw}`; expected YYYY-MM-DD"))
}

fn parse_priority(raw: &str) -> Result<Priority, String> {
    Priority::parse(raw).ok_or_else(|| format!("unknown priority `{raw}`"))
}

fn parse_filter(raw: &str) -> Result<TaskFilter, String> {
    TaskFilter::parse(raw).ok_or_else(|| format!("unknown filter `{raw}`"))
}

fn parse_kind(raw: &str) -> Result<TransactionKind, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "income" => Ok(TransactionKind::Income),
        "expense" => Ok(TransactionKind::Expense),
        _ => Err(format!("unknown transaction kind `{raw}`")),
    }
}

fn parse_level(raw: &str) -> Result<MoodLevel, String> {
    let level: u8 = raw
        .trim()
        .parse()
        .map_err(|_| format!("mood level must be a number, got `{raw}`"))?;
    MoodLevel::new(level).map_err(|err| err.to_string())
}
