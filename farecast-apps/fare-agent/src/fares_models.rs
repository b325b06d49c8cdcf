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

//! # Fares Data Model
//!
//! Wire types for the marketplace air API, shared across the search
//! pipeline.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One directional leg of a round trip, as submitted to the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SliceSpec {
    pub origin: String,
    pub destination: String,
    pub departure_date: String,
}

impl SliceSpec {
    pub fn new(origin: &str, destination: &str, departure_date: NaiveDate) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
            departure_date: departure_date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Passenger descriptor. The search pipeline always prices exactly one
/// adult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Passenger {
    Adult,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Owner {
    pub name: String,
    #[serde(default)]
    pub iata_code: Option<String>,
}

/// A priced, not-yet-finalized offer, valid only within its parent search
/// session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PartialOffer {
    pub id: String,
    pub total_amount: String,
    pub owner: Owner,
}

/// The server-side search session resource. The local process holds only
/// its id and the ids of offers inside it; the session itself expires
/// server-side.
#[derive(Debug, Clone, Deserialize)]
pub struct PartialOfferRequest {
    pub id: String,
    #[serde(default)]
    pub offers: Vec<PartialOffer>,
}

/// One flown leg with its own timestamps and duration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Segment {
    pub departing_at: NaiveDateTime,
    pub arriving_at: NaiveDateTime,
    pub duration: String,
}

/// An ordered sequence of segments forming one leg of the trip.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Slice {
    pub segments: Vec<Segment>,
}

/// The finalized, fully detailed offer ready for reporting.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PricedOffer {
    pub id: String,
    pub total_amount: String,
    pub total_currency: String,
    pub owner: Owner,
    pub slices: Vec<Slice>,
}

impl PricedOffer {
    /// Outbound and inbound slices, in that fixed order.
    pub fn round_trip_slices(&self) -> Option<(&Slice, &Slice)> {
        match self.slices.as_slice() {
            [outbound, inbound] => Some((outbound, inbound)),
            _ => None,
        }
    }
}
