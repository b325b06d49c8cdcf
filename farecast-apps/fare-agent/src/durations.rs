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

//! # Duration Aggregation
//!
//! Side-effect free ISO-8601 duration parsing and summation for flight
//! segments.

use chrono::Duration;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed ISO-8601 duration: {raw:?}")]
pub struct MalformedDuration {
    pub raw: String,
}

impl MalformedDuration {
    fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
        }
    }
}

static ISO8601_DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$").unwrap());

/// Parse an ISO-8601 duration of the `PnDTnHnMnS` shape into a time span.
///
/// Calendar components (years, months, weeks) are rejected: a segment
/// duration is an exact time span, not a calendar offset.
pub fn parse_duration(raw: &str) -> Result<Duration, MalformedDuration> {
    let caps = ISO8601_DURATION_RE
        .captures(raw)
        .ok_or_else(|| MalformedDuration::new(raw))?;

    let has_time_component = (2..=4).any(|idx| caps.get(idx).is_some());
    if raw.contains('T') && !has_time_component {
        // "PT" or a dangling "P1DT"
        return Err(MalformedDuration::new(raw));
    }
    if caps.get(1).is_none() && !has_time_component {
        // bare "P"
        return Err(MalformedDuration::new(raw));
    }

    let component = |idx: usize| -> Result<i64, MalformedDuration> {
        match caps.get(idx) {
            Some(m) => m
                .as_str()
                .parse::<i64>()
                .map_err(|_| MalformedDuration::new(raw)),
            None => Ok(0),
        }
    };

    let days = component(1)?;
    let hours = component(2)?;
    let minutes = component(3)?;
    let seconds = component(4)?;

    let total_seconds = days
        .checked_mul(86_400)
        .and_then(|total| total.checked_add(hours.checked_mul(3_600)?))
        .and_then(|total| total.checked_add(minutes.checked_mul(60)?))
        .and_then(|total| total.checked_add(seconds))
        .ok_or_else(|| MalformedDuration::new(raw))?;

    Duration::try_seconds(total_seconds).ok_or_else(|| MalformedDuration::new(raw))
}

/// Sum segment durations into a total elapsed time, starting from zero.
///
/// The per-segment `duration` field is authoritative; the total is never
/// derived from timestamps, so layover time between segments stays out of
/// the sum.
pub fn total_duration<'a, I>(durations: I) -> Result<Duration, MalformedDuration>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut total = Duration::zero();
    for raw in durations {
        total = total + parse_duration(raw)?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_of_valid_durations() {
        let total = total_duration(["PT1H30M", "PT2H"]).unwrap();
        assert_eq!(total, Duration::minutes(210));
    }

    #[test]
    fn test_sum_is_order_independent() {
        let forward = total_duration(["PT45M", "PT2H26M", "PT1H5M"]).unwrap();
        let backward = total_duration(["PT1H5M", "PT2H26M", "PT45M"]).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward, Duration::minutes(45 + 146 + 65));
    }

    #[test]
    fn test_empty_input_is_zero() {
        let total = total_duration(std::iter::empty::<&str>()).unwrap();
        assert_eq!(total, Duration::zero());
    }

    #[test]
    fn test_day_components() {
        assert_eq!(parse_duration("P1DT2H").unwrap(), Duration::hours(26));
        assert_eq!(parse_duration("P2D").unwrap(), Duration::days(2));
    }

    #[test]
    fn test_second_components() {
        assert_eq!(parse_duration("PT30S").unwrap(), Duration::seconds(30));
        assert_eq!(parse_duration("PT0S").unwrap(), Duration::zero());
    }

    #[test]
    fn test_malformed_durations_are_rejected() {
        for raw in [
            "", "P", "PT", "P1DT", "1h30m", "PT1H30", "T1H", "PT-1H", "P1Y", "2:30",
        ] {
            assert!(
                parse_duration(raw).is_err(),
                "expected rejection of {raw:?}"
            );
        }
    }

    #[test]
    fn test_malformed_element_fails_the_sum() {
        assert!(total_duration(["PT1H", "bogus"]).is_err());
    }
}
