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

//! # Trip Query Builder
//!
//! Side-effect free construction and validation of round-trip search
//! queries.

use anyhow::{Result, ensure};
use chrono::NaiveDate;

use crate::fares_models::{Passenger, SliceSpec};

/// A validated round-trip query for one adult passenger.
///
/// Immutable once constructed; the grid driver builds a fresh query per
/// (date, trip-length) cell and discards it after use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripQuery {
    origin: String,
    destination: String,
    depart_date: NaiveDate,
    return_date: NaiveDate,
}

impl TripQuery {
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        depart_date: NaiveDate,
        return_date: NaiveDate,
    ) -> Result<Self> {
        let origin = origin.into().to_uppercase();
        let destination = destination.into().to_uppercase();
        validate_airport_code(&origin)?;
        validate_airport_code(&destination)?;
        ensure!(
            origin != destination,
            "Origin and destination must differ, got {} twice",
            origin
        );
        ensure!(
            return_date >= depart_date,
            "Return date {} is before departure date {}",
            return_date,
            depart_date
        );
        Ok(Self {
            origin,
            destination,
            depart_date,
            return_date,
        })
    }

    /// The two slices of the round trip, outbound first.
    pub fn slices(&self) -> [SliceSpec; 2] {
        [
            SliceSpec::new(&self.origin, &self.destination, self.depart_date),
            SliceSpec::new(&self.destination, &self.origin, self.return_date),
        ]
    }

    /// Fixed passenger shape: one adult.
    pub fn passengers() -> Vec<Passenger> {
        vec![Passenger::Adult]
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn depart_date(&self) -> NaiveDate {
        self.depart_date
    }

    pub fn return_date(&self) -> NaiveDate {
        self.return_date
    }
}

fn validate_airport_code(code: &str) -> Result<()> {
    ensure!(
        code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()),
        "Invalid IATA airport code: {:?}",
        code
    );
    Ok(())
}
