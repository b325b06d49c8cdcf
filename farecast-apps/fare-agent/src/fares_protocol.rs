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

//! # Offer Resolution Protocol
//!
//! The multi-round negotiation that turns a round-trip query into a single
//! cheapest priced offer: outbound selection, inbound selection, fare
//! pricing, then the final detail fetch. Each remote stage is exactly one
//! call on the session capability; transient failures propagate to the
//! caller, never retried here.

use std::collections::HashSet;

use thiserror::Error;

use crate::fares_models::PricedOffer;
use crate::fares_query_builder::TripQuery;
use crate::fares_ranker::{InvalidPrice, cheapest};
use crate::fares_session::{SearchApiError, SearchSession};

/// Failure modes the grid driver needs to tell apart: remote-call failures
/// are logged and only cost their own grid cell, while price-parse failures
/// mean the remote contract is broken and abort the run.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Api(#[from] SearchApiError),
    #[error(transparent)]
    Price(#[from] InvalidPrice),
}

/// Resolve a query to its single cheapest priced offer.
///
/// `Ok(None)` is the abandoned outcome: some negotiation stage had no
/// usable candidate. A route/date with no availability is a normal result,
/// and the same policy applies at every stage, inbound and fares included.
///
/// Carrier exclusion applies only to the initial outbound ranking; later
/// stages are already narrowed to the selected legs.
pub async fn resolve_cheapest<S>(
    session: &S,
    query: &TripQuery,
    excluded_owners: &HashSet<String>,
) -> Result<Option<PricedOffer>, ResolveError>
where
    S: SearchSession + ?Sized,
{
    let opened = session
        .create_session(&query.slices(), &TripQuery::passengers())
        .await?;
    tracing::debug!(
        "session {}: {} outbound candidates",
        opened.id,
        opened.offers.len()
    );

    let Some(outbound) = cheapest(&opened.offers, excluded_owners)? else {
        tracing::debug!("session {}: no outbound candidate, abandoning", opened.id);
        return Ok(None);
    };
    let outbound_id = outbound.id.clone();

    let inbound_offers = session
        .offers_after_selection(&opened.id, &outbound_id)
        .await?;
    tracing::debug!(
        "session {}: {} inbound candidates after selecting {}",
        opened.id,
        inbound_offers.len(),
        outbound_id
    );
    let Some(inbound) = cheapest(&inbound_offers, &HashSet::new())? else {
        tracing::debug!("session {}: no inbound candidate, abandoning", opened.id);
        return Ok(None);
    };
    let inbound_id = inbound.id.clone();

    let fares = session
        .fare_offers(&opened.id, &outbound_id, &inbound_id)
        .await?;
    let Some(fare) = cheapest(&fares, &HashSet::new())? else {
        tracing::debug!("session {}: no fare candidate, abandoning", opened.id);
        return Ok(None);
    };

    // Ancillary services are excluded to keep the final payload minimal.
    let priced = session.priced_offer(&fare.id, false).await?;
    tracing::debug!(
        "session {}: priced offer {} at {} {}",
        opened.id,
        priced.id,
        priced.total_amount,
        priced.total_currency
    );
    Ok(Some(priced))
}
