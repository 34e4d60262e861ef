//! bettificator - football results scraper
//!
//! Retrieves match results over a date range, or the full club catalog,
//! and stores them in DuckDB (local file or attached PostgreSQL).

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use bettificator_core::RunError;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "bettificator")]
#[command(about = "Scrape football matches and clubs into a database")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./bettificator.toml or ~/.config/bettificator/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Retrieve matches or clubs
    Retrieve(cmd::retrieve::RetrieveArgs),
    /// Show current configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(bettificator_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug, progress bars show activity
    //   non-TTY: info unless --debug, logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    bettificator_core::init_logging(quiet, cli.debug, multi);

    if let Err(e) = bettificator_core::install_signal_handlers() {
        log::warn!("Failed to install signal handlers: {e}");
    }

    match run(cli, &progress) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(cli: Cli, progress: &bettificator_core::SharedProgress) -> Result<()> {
    let config = Config::resolve(cli.config.as_deref())?;

    match cli.command {
        Command::Retrieve(args) => cmd::retrieve::run(args, &config, progress),
        Command::Config => show_config(&config),
    }
}

/// 130 for interrupted runs, 1 for everything else
fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<RunError>()
        .map_or(1, RunError::exit_code)
}

fn show_config(config: &Config) -> Result<()> {
    use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

    let db = config.database_config()?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    table.add_row(vec!["Database kind", &db.kind.to_string()]);
    table.add_row(vec!["Database", &db.endpoint()]);
    table.add_row(vec![
        "Password",
        if db.password.is_some() {
            "configured"
        } else {
            "not set"
        },
    ]);
    table.add_row(vec!["Matches table", &config.matches_target().to_string()]);
    table.add_row(vec!["Clubs table", &config.clubs_target().to_string()]);
    table.add_row(vec!["Source URL", &config.source.base_url]);
    table.add_row(vec!["Matches path", &config.source.matches_path]);
    table.add_row(vec!["Clubs path", &config.source.clubs_path]);
    table.add_row(vec!["Workers", &config.workers.to_string()]);

    eprintln!("\n{table}");
    Ok(())
}
