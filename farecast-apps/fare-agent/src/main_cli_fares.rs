//!  Farecast
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! CLI for the round-trip fare grid search.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use farecast_checkpoint_ledger::CheckpointLedger;
use farecast_fare_agent::{
    DuffelSession, FareRecord, GridReport, GridSearchParams, PLACEHOLDER_OWNER, run_grid_search,
};

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "farecast-fares")]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Origin airport code (e.g., WAW, SFO)
    #[arg(short, long)]
    from: String,

    /// Destination airport code (e.g., GOT, JFK)
    #[arg(short, long)]
    to: String,

    /// First outbound departure date (YYYY-MM-DD or YYYY/MM/DD)
    #[arg(long)]
    first_date: String,

    /// Last outbound departure date, inclusive (YYYY-MM-DD or YYYY/MM/DD)
    #[arg(long)]
    last_date: String,

    /// Shortest trip length to try, in days
    #[arg(long, default_value = "2")]
    min_days: i64,

    /// Longest trip length to try, in days
    #[arg(long, default_value = "5")]
    max_days: i64,

    /// Checkpoint file for accumulated results
    /// (falls back to the FARECAST_LEDGER_PATH environment variable)
    #[arg(short, long)]
    ledger: Option<PathBuf>,

    /// Carrier names to exclude from the outbound ranking (repeatable)
    #[arg(long = "exclude-owner", default_value = PLACEHOLDER_OWNER)]
    excluded_owners: Vec<String>,

    /// HTTP timeout per remote call, in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Skip the final summary table
    #[arg(short, long, default_value = "false")]
    quiet: bool,

    /// Verbose output
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

/// Configure logging based on verbosity level
fn setup_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();
}

/// Parse date string to NaiveDate
fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
        .context(format!(
            "Invalid date format: {}. Use YYYY-MM-DD or YYYY/MM/DD",
            s
        ))
}

/// Format duration in hours/minutes.
fn fmt_duration(minutes: i64) -> String {
    let hrs = minutes / 60;
    let mins = minutes % 60;
    if mins == 0 {
        format!("{}h", hrs)
    } else if hrs == 0 {
        format!("{}m", mins)
    } else {
        format!("{}h {:02}m", hrs, mins)
    }
}

/// Get terminal width for responsive tables
fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(100)
}

fn dash_bar() -> String {
    "-".repeat(get_terminal_width().min(100))
}

/// Render the accumulated dataset, cheapest first.
fn render_summary(records: &[FareRecord], report: &GridReport) {
    let mut ranked: Vec<&FareRecord> = records.iter().collect();
    ranked.sort_by(|a, b| {
        a.total_amount
            .partial_cmp(&b.total_amount)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    println!("\n{}", dash_bar());
    println!(
        "  🛫 {} cells searched: {} offers recorded, {} without availability, {} failed",
        report.cells_searched,
        report.offers_recorded,
        report.cells_without_offers,
        report.failed_cells
    );
    println!("{}", dash_bar());

    if ranked.is_empty() {
        println!("\nNo offers recorded.");
        return;
    }

    println!("\n🏆 Top {} fares:\n", 10.min(ranked.len()));
    println!(
        "  {:<12}  {:>4}  {:<20}  {:>9}  {:>9}  PRICE",
        "OUT DATE", "DAYS", "AIRLINE", "OUT DUR", "IN DUR"
    );
    for record in ranked.iter().take(10) {
        println!(
            "  {:<12}  {:>4}  {:<20}  {:>9}  {:>9}  {:.2} {}",
            record.outbound_depart.date().to_string(),
            record.trip_days,
            record.airline,
            fmt_duration(record.outbound_duration_min),
            fmt_duration(record.inbound_duration_min),
            record.total_amount,
            record.total_currency
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = CliArgs::parse();
    setup_logging(args.verbose);

    tracing::info!("Starting farecast-fares CLI");
    tracing::debug!("Args: {:?}", args);

    let first_date = parse_date(&args.first_date)?;
    let last_date = parse_date(&args.last_date)?;

    let ledger_path = args
        .ledger
        .clone()
        .or_else(|| {
            std::env::var("FARECAST_LEDGER_PATH")
                .ok()
                .map(PathBuf::from)
        })
        .context("No ledger path: pass --ledger or set FARECAST_LEDGER_PATH")?;

    let access_token =
        std::env::var("DUFFEL_ACCESS_TOKEN").context("DUFFEL_ACCESS_TOKEN is not set")?;

    let plan = GridSearchParams {
        origin: args.from.to_uppercase(),
        destination: args.to.to_uppercase(),
        first_outbound: first_date,
        last_outbound: last_date,
        min_trip_days: args.min_days,
        max_trip_days: args.max_days,
        excluded_owners: args.excluded_owners.iter().cloned().collect::<HashSet<_>>(),
    };

    let mut ledger: CheckpointLedger<FareRecord> =
        CheckpointLedger::load(&ledger_path).context("Failed to load the fare ledger")?;
    tracing::info!(
        "Loaded {} previously recorded fares from {}",
        ledger.len(),
        ledger_path.display()
    );

    let session = DuffelSession::new(access_token, args.timeout)?;

    let report = run_grid_search(&session, &plan, &mut ledger).await?;
    println!("\nDone");

    tracing::info!(
        "Grid complete: {} cells, {} offers recorded",
        report.cells_searched,
        report.offers_recorded
    );

    if !args.quiet {
        render_summary(ledger.records(), &report);
    }

    Ok(())
}
