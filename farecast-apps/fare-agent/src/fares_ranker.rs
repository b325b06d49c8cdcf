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

//! # Offer Ranker
//!
//! Pure minimum-price selection over offer candidates.

use std::collections::HashSet;

use thiserror::Error;

use crate::fares_models::{PartialOffer, PricedOffer};

/// Anything carrying a decimal price and an owning carrier.
pub trait Priceable {
    fn total_amount(&self) -> &str;
    fn owner_name(&self) -> &str;
}

impl Priceable for PartialOffer {
    fn total_amount(&self) -> &str {
        &self.total_amount
    }

    fn owner_name(&self) -> &str {
        &self.owner.name
    }
}

impl Priceable for PricedOffer {
    fn total_amount(&self) -> &str {
        &self.total_amount
    }

    fn owner_name(&self) -> &str {
        &self.owner.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unparsable offer price: {raw:?}")]
pub struct InvalidPrice {
    pub raw: String,
}

/// Parse a marketplace price string into a comparable amount.
pub(crate) fn parse_amount(raw: &str) -> Result<f64, InvalidPrice> {
    let amount: f64 = raw.trim().parse().map_err(|_| InvalidPrice {
        raw: raw.to_string(),
    })?;
    if !amount.is_finite() {
        return Err(InvalidPrice {
            raw: raw.to_string(),
        });
    }
    Ok(amount)
}

/// Select the cheapest offer, skipping excluded carriers.
///
/// Ties keep the earliest candidate, so ranking is stable with respect to
/// input order. An empty or fully excluded list is a valid no-offer
/// outcome, not an error.
pub fn cheapest<'a, T: Priceable>(
    offers: &'a [T],
    excluded_owners: &HashSet<String>,
) -> Result<Option<&'a T>, InvalidPrice> {
    let mut best: Option<(&'a T, f64)> = None;
    for offer in offers {
        if excluded_owners.contains(offer.owner_name()) {
            continue;
        }
        let amount = parse_amount(offer.total_amount())?;
        match best {
            Some((_, lowest)) if amount >= lowest => {}
            _ => best = Some((offer, amount)),
        }
    }
    Ok(best.map(|(offer, _)| offer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fares_models::Owner;

    fn offer(id: &str, amount: &str, owner: &str) -> PartialOffer {
        PartialOffer {
            id: id.to_string(),
            total_amount: amount.to_string(),
            owner: Owner {
                name: owner.to_string(),
                iata_code: None,
            },
        }
    }

    fn excluded(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_picks_minimum_price() {
        let offers = vec![
            offer("a", "210.00", "LOT"),
            offer("b", "87.20", "SAS"),
            offer("c", "150.00", "KLM"),
        ];
        let best = cheapest(&offers, &HashSet::new()).unwrap().unwrap();
        assert_eq!(best.id, "b");
    }

    #[test]
    fn test_excluded_owner_never_wins() {
        let offers = vec![
            offer("a", "10.00", "Duffel Airways"),
            offer("b", "99.99", "SAS"),
        ];
        let best = cheapest(&offers, &excluded(&["Duffel Airways"]))
            .unwrap()
            .unwrap();
        assert_eq!(best.id, "b");
    }

    #[test]
    fn test_stable_tie_break_keeps_first() {
        let offers = vec![
            offer("a", "120.50", "LOT"),
            offer("b", "99.99", "SAS"),
            offer("c", "99.99", "KLM"),
        ];
        let best = cheapest(&offers, &HashSet::new()).unwrap().unwrap();
        assert_eq!(best.id, "b");
    }

    #[test]
    fn test_empty_and_fully_excluded_are_no_offer() {
        let none: Vec<PartialOffer> = vec![];
        assert!(cheapest(&none, &HashSet::new()).unwrap().is_none());

        let offers = vec![offer("a", "10.00", "Duffel Airways")];
        assert!(
            cheapest(&offers, &excluded(&["Duffel Airways"]))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_unparsable_price_is_an_error() {
        let offers = vec![offer("a", "cheap", "LOT")];
        let err = cheapest(&offers, &HashSet::new()).unwrap_err();
        assert_eq!(err.raw, "cheap");
    }

    #[test]
    fn test_non_finite_price_is_an_error() {
        let offers = vec![offer("a", "NaN", "LOT")];
        assert!(cheapest(&offers, &HashSet::new()).is_err());
    }
}
