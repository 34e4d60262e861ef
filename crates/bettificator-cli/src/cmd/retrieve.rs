//! Retrieve subcommand - scrape matches or clubs into the database

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Subcommand};

use bettificator_core::{
    CatalogWalk, DateRange, Dispatcher, RunSettings, SharedProgress, fmt_num, parse_date,
};
use bettificator_source::{ClubPageParser, MatchPageParser};
use bettificator_store::DuckdbSink;

use super::print_summary;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct RetrieveArgs {
    #[command(subcommand)]
    pub what: RetrieveTarget,
}

#[derive(Subcommand, Debug)]
pub enum RetrieveTarget {
    /// Retrieve matches between start date and end date
    Matches(MatchesArgs),
    /// Retrieve the club catalog (A-Z plus numeric names)
    Clubs(ClubsArgs),
}

#[derive(Args, Debug)]
pub struct MatchesArgs {
    /// First day to parse (YYYY-MM-DD)
    #[arg(short, long, value_parser = parse_date)]
    pub start_date: NaiveDate,

    /// Last day to parse, inclusive (YYYY-MM-DD)
    #[arg(short, long, value_parser = parse_date)]
    pub end_date: NaiveDate,

    /// Parse all matches in the range but do not insert them
    #[arg(short, long)]
    pub dry_run: bool,

    /// Number of parallel workers
    #[arg(short, long)]
    pub workers: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ClubsArgs {
    /// Parse every catalog page but do not insert
    #[arg(short, long)]
    pub dry_run: bool,
}

pub fn run(args: RetrieveArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    match args.what {
        RetrieveTarget::Matches(m) => retrieve_matches(m, config, progress),
        RetrieveTarget::Clubs(c) => retrieve_clubs(c, config, progress),
    }
}

fn retrieve_matches(args: MatchesArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let settings = RunSettings::new(config.matches_target())
        .with_workers(args.workers.unwrap_or(config.workers))
        .with_dry_run(args.dry_run);
    settings.validate()?;
    let range = DateRange::new(args.start_date, args.end_date);

    log::info!("Retrieving matches {} to {}", args.start_date, args.end_date);
    log::info!("  Source: {}", config.source.base_url);
    log::info!("  Target: {}", settings.target);

    let sink = DuckdbSink::open(&config.database_config()?)?;
    let parser = MatchPageParser::new(config.source_config());

    let outcome = Dispatcher::new(&settings, &parser, &sink)
        .with_progress(progress.day_bar())
        .run(range)?;
    outcome.log();

    let mut rows = vec![
        ("Days", format!("{}/{}", outcome.completed, outcome.issued)),
        ("Matches", fmt_num(outcome.records)),
    ];
    if settings.dry_run {
        rows.push(("Inserts", "skipped (dry run)".to_string()));
    } else {
        rows.push(("Inserts", outcome.persisted_batches.to_string()));
        rows.push(("Table rows", sink.count(&settings.target)?.to_string()));
    }
    rows.push(("Time", format!("{:.1}s", outcome.elapsed.as_secs_f64())));
    print_summary("Matches", &rows);

    Ok(())
}

fn retrieve_clubs(args: ClubsArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let settings = RunSettings::new(config.clubs_target()).with_dry_run(args.dry_run);

    log::info!("Retrieving club catalog");
    log::info!("  Source: {}", config.source.base_url);
    log::info!("  Target: {}", settings.target);

    let sink = DuckdbSink::open(&config.database_config()?)?;
    let parser = ClubPageParser::new(config.source_config());

    let outcome = CatalogWalk::new(&settings)
        .with_progress(progress.catalog_line())
        .run(&parser, &sink)?;
    outcome.log();

    let mut rows = vec![
        ("Pages", outcome.keys_walked.to_string()),
        ("Clubs", fmt_num(outcome.records)),
    ];
    if settings.dry_run {
        rows.push(("Inserted", "skipped (dry run)".to_string()));
    } else {
        rows.push(("Inserted", fmt_num(outcome.inserted)));
        rows.push(("Table rows", sink.count(&settings.target)?.to_string()));
    }
    rows.push(("Time", format!("{:.1}s", outcome.elapsed.as_secs_f64())));
    print_summary("Clubs", &rows);

    Ok(())
}
