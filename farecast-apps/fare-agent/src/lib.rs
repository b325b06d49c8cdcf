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

// Library for farecast-fare-agent
// Grid search for the cheapest round-trip fares on the Duffel marketplace

mod durations;
mod fares_grid;
mod fares_models;
mod fares_protocol;
mod fares_query_builder;
mod fares_ranker;
mod fares_session;

pub use durations::{MalformedDuration, parse_duration, total_duration};
pub use fares_grid::{FareRecord, GridReport, GridSearchParams, run_grid_search};
pub use fares_models::{
    Owner, PartialOffer, PartialOfferRequest, Passenger, PricedOffer, Segment, Slice, SliceSpec,
};
pub use fares_protocol::{ResolveError, resolve_cheapest};
pub use fares_query_builder::TripQuery;
pub use fares_ranker::{InvalidPrice, Priceable, cheapest};
pub use fares_session::{
    ApiErrorDetail, DuffelSession, PLACEHOLDER_OWNER, SearchApiError, SearchSession,
};
