//! `lifedash` command-line entry point.
//!
//! # Responsibility
//! - Load configuration, start logging and open the store.
//! - Dispatch the parsed subcommand.

mod cli;
mod config;

use clap::Parser;
use cli::{run_command, Cli};
use color_eyre::eyre::{Result, WrapErr};
use config::{CliConfig, DB_PATH_ENV};
use lifedash_core::db::open_db;
use lifedash_core::{init_logging, logging_status, DashboardRepository, SqliteKvStore};
use log::info;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;

    // Logging is best-effort; a CLI run never fails because of it.
    if let Some(log_dir) = config.log_dir() {
        if let Err(err) = init_logging(&config.log_level, &log_dir.to_string_lossy()) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    let db_path = config.database_path(cli.db.as_deref(), std::env::var(DB_PATH_ENV).ok())?;
    let conn = open_db(&db_path)
        .wrap_err_with(|| format!("failed to open database {}", db_path.display()))?;
    let repo = DashboardRepository::open(SqliteKvStore::new(&conn))?;
    let (log_level, log_dir) = logging_status()
        .map(|(level, dir)| (level, dir.display().to_string()))
        .unwrap_or(("off", String::new()));
    info!(
        "event=cli_start module=cli status=ok db_path={} log_level={} log_dir={}",
        db_path.display(),
        log_level,
        log_dir
    );

    run_command(cli.command, &repo)
}
