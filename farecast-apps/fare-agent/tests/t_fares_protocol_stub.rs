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

//! End-to-end tests for the offer resolution protocol against a stubbed
//! search session: selection semantics per stage, abandoned outcomes, and
//! error propagation.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use farecast_fare_agent::{
    ApiErrorDetail, Owner, PartialOffer, PartialOfferRequest, Passenger, PricedOffer,
    ResolveError, SearchApiError, SearchSession, Segment, Slice, SliceSpec, TripQuery,
    resolve_cheapest,
};

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

fn segment(depart: &str, arrive: &str, duration: &str) -> Segment {
    Segment {
        departing_at: depart.parse().expect("valid test timestamp"),
        arriving_at: arrive.parse().expect("valid test timestamp"),
        duration: duration.to_string(),
    }
}

fn priced_template(amount: &str) -> PricedOffer {
    PricedOffer {
        id: String::new(),
        total_amount: amount.to_string(),
        total_currency: "EUR".to_string(),
        owner: Owner {
            name: "SAS".to_string(),
            iata_code: Some("SK".to_string()),
        },
        slices: vec![
            Slice {
                segments: vec![segment(
                    "2026-10-02T06:25:00",
                    "2026-10-02T07:55:00",
                    "PT1H30M",
                )],
            },
            Slice {
                segments: vec![segment(
                    "2026-10-05T18:10:00",
                    "2026-10-05T19:35:00",
                    "PT1H25M",
                )],
            },
        ],
    }
}

fn query() -> TripQuery {
    TripQuery::new(
        "WAW",
        "GOT",
        NaiveDate::from_ymd_opt(2026, 10, 2).unwrap(),
        NaiveDate::from_ymd_opt(2026, 10, 5).unwrap(),
    )
    .unwrap()
}

fn excluded(names: &[&str]) -> HashSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Canned search session. Offer lists are fixed per stage; every call is
/// recorded so tests can assert the negotiation sequence.
struct StubSession {
    outbound: Vec<PartialOffer>,
    inbound: Vec<PartialOffer>,
    fares: Vec<PartialOffer>,
    priced: PricedOffer,
    fail_on_create: bool,
    calls: Mutex<Vec<String>>,
}

impl StubSession {
    fn new(
        outbound: Vec<PartialOffer>,
        inbound: Vec<PartialOffer>,
        fares: Vec<PartialOffer>,
        priced: PricedOffer,
    ) -> Self {
        Self {
            outbound,
            inbound,
            fares,
            priced,
            fail_on_create: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchSession for StubSession {
    async fn create_session(
        &self,
        slices: &[SliceSpec],
        passengers: &[Passenger],
    ) -> Result<PartialOfferRequest, SearchApiError> {
        assert_eq!(slices.len(), 2, "round trips submit exactly two slices");
        assert_eq!(passengers, &[Passenger::Adult][..]);
        self.record(format!("create {}-{}", slices[0].origin, slices[0].destination));
        if self.fail_on_create {
            return Err(SearchApiError::Remote {
                request_id: "req_stub".to_string(),
                status: 503,
                errors: vec![ApiErrorDetail {
                    title: "Service unavailable".to_string(),
                    code: "airline_internal".to_string(),
                    message: "upstream timeout".to_string(),
                }],
            });
        }
        Ok(PartialOfferRequest {
            id: "prq_1".to_string(),
            offers: self.outbound.clone(),
        })
    }

    async fn offers_after_selection(
        &self,
        session_id: &str,
        selected_outbound_id: &str,
    ) -> Result<Vec<PartialOffer>, SearchApiError> {
        self.record(format!("offers {session_id} {selected_outbound_id}"));
        Ok(self.inbound.clone())
    }

    async fn fare_offers(
        &self,
        session_id: &str,
        outbound_id: &str,
        inbound_id: &str,
    ) -> Result<Vec<PartialOffer>, SearchApiError> {
        self.record(format!("fares {session_id} {outbound_id} {inbound_id}"));
        Ok(self.fares.clone())
    }

    async fn priced_offer(
        &self,
        offer_id: &str,
        include_services: bool,
    ) -> Result<PricedOffer, SearchApiError> {
        self.record(format!("priced {offer_id} services={include_services}"));
        let mut priced = self.priced.clone();
        priced.id = offer_id.to_string();
        Ok(priced)
    }
}

#[tokio::test]
async fn test_resolves_cheapest_through_all_stages() {
    let session = StubSession::new(
        vec![
            offer("out_a", "150.00", "LOT"),
            offer("out_b", "120.00", "SAS"),
            offer("out_c", "130.00", "KLM"),
        ],
        vec![offer("in_a", "60.00", "SAS"), offer("in_b", "45.00", "SAS")],
        vec![
            offer("fare_a", "180.00", "SAS"),
            offer("fare_b", "165.40", "SAS"),
            offer("fare_c", "200.00", "SAS"),
        ],
        priced_template("165.40"),
    );

    let resolved = resolve_cheapest(&session, &query(), &HashSet::new())
        .await
        .unwrap()
        .expect("a priced offer");

    // Cheapest fare wins, and the final price is the fare-stage minimum.
    assert_eq!(resolved.id, "fare_b");
    assert_eq!(resolved.total_amount, "165.40");

    // Slices come back in (outbound, inbound) order.
    let (outbound, inbound) = resolved.round_trip_slices().unwrap();
    assert!(
        outbound.segments[0].departing_at < inbound.segments[0].departing_at,
        "outbound slice must precede inbound slice"
    );

    // One remote call per stage, threaded through the same session, with
    // ancillary services excluded at the final fetch.
    assert_eq!(
        session.calls(),
        vec![
            "create WAW-GOT".to_string(),
            "offers prq_1 out_b".to_string(),
            "fares prq_1 out_b in_b".to_string(),
            "priced fare_b services=false".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_excluded_carrier_never_selected_outbound() {
    let session = StubSession::new(
        vec![
            offer("out_cheapest", "10.00", "Duffel Airways"),
            offer("out_real", "120.00", "SAS"),
        ],
        vec![offer("in_a", "45.00", "SAS")],
        vec![offer("fare_a", "165.00", "SAS")],
        priced_template("165.00"),
    );

    resolve_cheapest(&session, &query(), &excluded(&["Duffel Airways"]))
        .await
        .unwrap()
        .expect("a priced offer");

    assert_eq!(session.calls()[1], "offers prq_1 out_real");
}

#[tokio::test]
async fn test_all_outbound_excluded_abandons() {
    let session = StubSession::new(
        vec![offer("out_a", "10.00", "Duffel Airways")],
        vec![offer("in_a", "45.00", "SAS")],
        vec![offer("fare_a", "165.00", "SAS")],
        priced_template("165.00"),
    );

    let resolved = resolve_cheapest(&session, &query(), &excluded(&["Duffel Airways"]))
        .await
        .unwrap();
    assert!(resolved.is_none());

    // Negotiation stops after the opening call.
    assert_eq!(session.calls().len(), 1);
}

#[tokio::test]
async fn test_empty_inbound_abandons() {
    let session = StubSession::new(
        vec![offer("out_a", "120.00", "SAS")],
        vec![],
        vec![offer("fare_a", "165.00", "SAS")],
        priced_template("165.00"),
    );

    let resolved = resolve_cheapest(&session, &query(), &HashSet::new())
        .await
        .unwrap();
    assert!(resolved.is_none());
    assert_eq!(session.calls().len(), 2);
}

#[tokio::test]
async fn test_empty_fares_abandons() {
    let session = StubSession::new(
        vec![offer("out_a", "120.00", "SAS")],
        vec![offer("in_a", "45.00", "SAS")],
        vec![],
        priced_template("165.00"),
    );

    let resolved = resolve_cheapest(&session, &query(), &HashSet::new())
        .await
        .unwrap();
    assert!(resolved.is_none());
    assert_eq!(session.calls().len(), 3);
}

#[tokio::test]
async fn test_remote_failure_propagates_with_diagnostics() {
    let mut session = StubSession::new(
        vec![offer("out_a", "120.00", "SAS")],
        vec![offer("in_a", "45.00", "SAS")],
        vec![offer("fare_a", "165.00", "SAS")],
        priced_template("165.00"),
    );
    session.fail_on_create = true;

    let err = resolve_cheapest(&session, &query(), &HashSet::new())
        .await
        .unwrap_err();
    match err {
        ResolveError::Api(SearchApiError::Remote {
            request_id,
            status,
            errors,
        }) => {
            assert_eq!(request_id, "req_stub");
            assert_eq!(status, 503);
            assert_eq!(errors[0].code, "airline_internal");
        }
        other => panic!("expected a remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unparsable_price_propagates() {
    let session = StubSession::new(
        vec![offer("out_a", "free!", "SAS")],
        vec![],
        vec![],
        priced_template("0.00"),
    );

    let err = resolve_cheapest(&session, &query(), &HashSet::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::Price(_)));
}
