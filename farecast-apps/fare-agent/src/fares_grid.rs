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

//! # Grid Search Driver
//!
//! Iterates the (departure date x trip length) grid, resolves the cheapest
//! offer per cell, and checkpoints the accumulated records after every
//! outer date so long runs survive interruption with partial progress.

use std::collections::HashSet;
use std::io::Write;

use anyhow::{Context, Result, ensure};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use farecast_checkpoint_ledger::CheckpointLedger;
use serde::{Deserialize, Serialize};

use crate::durations::total_duration;
use crate::fares_models::{PricedOffer, Slice};
use crate::fares_protocol::{ResolveError, resolve_cheapest};
use crate::fares_query_builder::TripQuery;
use crate::fares_ranker::parse_amount;
use crate::fares_session::{SearchApiError, SearchSession};

/// The full grid to sweep: one query per (outbound date, trip length) cell,
/// all for the same route.
#[derive(Debug, Clone)]
pub struct GridSearchParams {
    pub origin: String,
    pub destination: String,
    pub first_outbound: NaiveDate,
    pub last_outbound: NaiveDate,
    pub min_trip_days: i64,
    pub max_trip_days: i64,
    pub excluded_owners: HashSet<String>,
}

impl GridSearchParams {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.first_outbound <= self.last_outbound,
            "Outbound date range is inverted: {} > {}",
            self.first_outbound,
            self.last_outbound
        );
        ensure!(self.min_trip_days >= 0, "Trip length cannot be negative");
        ensure!(
            self.min_trip_days <= self.max_trip_days,
            "Trip length range is inverted: {} > {}",
            self.min_trip_days,
            self.max_trip_days
        );
        Ok(())
    }
}

/// One row of the output dataset: a flattened priced offer plus the
/// computed duration and trip-length fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareRecord {
    pub offer_id: String,
    pub origin: String,
    pub destination: String,
    pub outbound_depart: NaiveDateTime,
    pub outbound_arrive: NaiveDateTime,
    pub outbound_duration_min: i64,
    pub inbound_depart: NaiveDateTime,
    pub inbound_arrive: NaiveDateTime,
    pub inbound_duration_min: i64,
    pub total_amount: f64,
    pub total_currency: String,
    pub airline: String,
    pub trip_days: i64,
}

impl FareRecord {
    /// Flatten a priced offer into a dataset row.
    ///
    /// Durations are segment sums, so layover time stays out of them;
    /// trip_days is the whole-day difference between the inbound final
    /// arrival and the outbound first departure.
    pub fn from_priced_offer(
        offer: &PricedOffer,
        origin: &str,
        destination: &str,
    ) -> Result<Self> {
        let (outbound, inbound) = offer
            .round_trip_slices()
            .with_context(|| format!("Offer {} is not a two-slice round trip", offer.id))?;
        let (outbound_depart, outbound_arrive) = slice_endpoints(outbound, &offer.id)?;
        let (inbound_depart, inbound_arrive) = slice_endpoints(inbound, &offer.id)?;

        let outbound_duration =
            total_duration(outbound.segments.iter().map(|s| s.duration.as_str()))?;
        let inbound_duration =
            total_duration(inbound.segments.iter().map(|s| s.duration.as_str()))?;
        let total_amount = parse_amount(&offer.total_amount)?;

        Ok(Self {
            offer_id: offer.id.clone(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            outbound_depart,
            outbound_arrive,
            outbound_duration_min: outbound_duration.num_minutes(),
            inbound_depart,
            inbound_arrive,
            inbound_duration_min: inbound_duration.num_minutes(),
            total_amount,
            total_currency: offer.total_currency.clone(),
            airline: offer.owner.name.clone(),
            trip_days: (inbound_arrive - outbound_depart).num_days(),
        })
    }
}

fn slice_endpoints(slice: &Slice, offer_id: &str) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let (first, last) = match (slice.segments.first(), slice.segments.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => anyhow::bail!("Offer {} has a slice without segments", offer_id),
    };
    Ok((first.departing_at, last.arriving_at))
}

/// Tally of one grid run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridReport {
    pub cells_searched: u32,
    pub offers_recorded: u32,
    pub cells_without_offers: u32,
    pub failed_cells: u32,
}

/// Walk the grid in strict (date, trip length) order.
///
/// A failed remote call is logged with its structured diagnostic and only
/// costs its own cell; the rest of the grid proceeds. Malformed prices or
/// durations abort the run instead: they mean the remote contract is
/// broken, not that a route lacks availability.
pub async fn run_grid_search<S>(
    session: &S,
    plan: &GridSearchParams,
    ledger: &mut CheckpointLedger<FareRecord>,
) -> Result<GridReport>
where
    S: SearchSession + ?Sized,
{
    plan.validate()?;

    let mut report = GridReport::default();
    let mut outbound_date = plan.first_outbound;
    while outbound_date <= plan.last_outbound {
        print!("{outbound_date}");
        flush_stdout();

        for trip_days in plan.min_trip_days..=plan.max_trip_days {
            let return_date = outbound_date + Duration::days(trip_days);
            let query = TripQuery::new(
                plan.origin.clone(),
                plan.destination.clone(),
                outbound_date,
                return_date,
            )?;

            match resolve_cheapest(session, &query, &plan.excluded_owners).await {
                Ok(Some(offer)) => {
                    let record = FareRecord::from_priced_offer(
                        &offer,
                        query.origin(),
                        query.destination(),
                    )?;
                    ledger.append(record);
                    report.offers_recorded += 1;
                }
                Ok(None) => report.cells_without_offers += 1,
                Err(ResolveError::Api(err)) => {
                    log_remote_failure(outbound_date, trip_days, &err);
                    report.failed_cells += 1;
                }
                Err(ResolveError::Price(err)) => {
                    return Err(err).context("Remote collaborator returned an unparsable price");
                }
            }
            report.cells_searched += 1;
            print!(".");
            flush_stdout();
        }

        ledger
            .checkpoint()
            .with_context(|| format!("Checkpoint failed after {}", outbound_date))?;
        println!();

        outbound_date = outbound_date + Duration::days(1);
    }

    Ok(report)
}

fn flush_stdout() {
    let _ = std::io::stdout().flush();
}

fn log_remote_failure(outbound_date: NaiveDate, trip_days: i64, err: &SearchApiError) {
    match err {
        SearchApiError::Remote {
            request_id,
            status,
            errors,
        } => {
            tracing::error!(
                "cell ({outbound_date}, {trip_days}d) failed: request {request_id}, status {status}"
            );
            for detail in errors {
                tracing::error!("  {} [{}]: {}", detail.title, detail.code, detail.message);
            }
        }
        other => {
            tracing::error!("cell ({outbound_date}, {trip_days}d) failed: {other}");
        }
    }
}
