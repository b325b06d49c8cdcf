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

//! # Search Session Client
//!
//! The abstract search-session capability consumed by the offer resolution
//! protocol, and its production implementation against the Duffel air API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fares_models::{PartialOffer, PartialOfferRequest, Passenger, PricedOffer, SliceSpec};

/// Carrier used by the marketplace for tombstone/test offers. This is only
/// the default for the exclusion configuration; the ranker itself never
/// consults it.
pub const PLACEHOLDER_OWNER: &str = "Duffel Airways";

const DUFFEL_API_BASE: &str = "https://api.duffel.com";
const DUFFEL_API_VERSION: &str = "v2";

/// One structured sub-error from a failed remote call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// A failed search-session call.
///
/// Remote diagnostics (request id, status, sub-errors) are preserved so the
/// grid driver can log them before moving on to the next cell.
#[derive(Debug, Error)]
pub enum SearchApiError {
    #[error("search request failed (request {request_id}, status {status})")]
    Remote {
        request_id: String,
        status: u16,
        errors: Vec<ApiErrorDetail>,
    },
    #[error("transport failure: {0}")]
    Transport(#[from] wreq::Error),
    #[error("malformed response payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The stateful remote search session, as an explicit capability.
///
/// Created by a query, then incrementally narrowed by selections. The
/// session expires server-side; there is nothing to close locally.
#[async_trait]
pub trait SearchSession: Send + Sync {
    /// Open a session for the given slices and receive the outbound-leg
    /// candidates.
    async fn create_session(
        &self,
        slices: &[SliceSpec],
        passengers: &[Passenger],
    ) -> Result<PartialOfferRequest, SearchApiError>;

    /// Inbound-leg candidates that become available once the outbound
    /// selection is fixed.
    async fn offers_after_selection(
        &self,
        session_id: &str,
        selected_outbound_id: &str,
    ) -> Result<Vec<PartialOffer>, SearchApiError>;

    /// Fully combined fare candidates for the (outbound, inbound) pair.
    async fn fare_offers(
        &self,
        session_id: &str,
        outbound_id: &str,
        inbound_id: &str,
    ) -> Result<Vec<PartialOffer>, SearchApiError>;

    /// The final, fully detailed offer.
    async fn priced_offer(
        &self,
        offer_id: &str,
        include_services: bool,
    ) -> Result<PricedOffer, SearchApiError>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    meta: Option<ErrorMeta>,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorMeta {
    #[serde(default)]
    request_id: String,
    #[serde(default)]
    status: Option<u16>,
}

fn remote_error(http_status: u16, body: &str) -> SearchApiError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let (request_id, status) = match envelope.meta {
                Some(meta) => (meta.request_id, meta.status.unwrap_or(http_status)),
                None => (String::from("-"), http_status),
            };
            SearchApiError::Remote {
                request_id,
                status,
                errors: envelope.errors,
            }
        }
        Err(_) => SearchApiError::Remote {
            request_id: String::from("-"),
            status: http_status,
            errors: vec![ApiErrorDetail {
                title: String::from("Unreadable error body"),
                code: String::from("unparsed_response"),
                message: body.chars().take(300).collect(),
            }],
        },
    }
}

#[derive(Serialize)]
struct CreateSessionBody<'a> {
    data: CreateSessionData<'a>,
}

#[derive(Serialize)]
struct CreateSessionData<'a> {
    slices: &'a [SliceSpec],
    passengers: &'a [Passenger],
}

/// Duffel v2 implementation of [`SearchSession`].
#[derive(Clone)]
pub struct DuffelSession {
    client: Arc<wreq::Client>,
    access_token: String,
    base_url: String,
}

impl DuffelSession {
    pub fn new(access_token: String, timeout_secs: u64) -> Result<Self> {
        let client = wreq::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client: Arc::new(client),
            access_token,
            base_url: DUFFEL_API_BASE.to_string(),
        })
    }

    async fn read_payload<T: DeserializeOwned>(
        &self,
        response: wreq::Response,
    ) -> Result<T, SearchApiError> {
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(
            "[duffel] HTTP {} - {} KB body",
            status.as_u16(),
            body.len() / 1024
        );
        if !status.is_success() {
            return Err(remote_error(status.as_u16(), &body));
        }
        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        Ok(envelope.data)
    }

    async fn get_payload<T: DeserializeOwned>(&self, url: String) -> Result<T, SearchApiError> {
        tracing::trace!("[duffel] GET {}", url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("Duffel-Version", DUFFEL_API_VERSION)
            .header("Accept", "application/json")
            .send()
            .await?;
        self.read_payload(response).await
    }

    async fn post_payload<T, B>(&self, url: String, body: &B) -> Result<T, SearchApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        tracing::trace!("[duffel] POST {}", url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("Duffel-Version", DUFFEL_API_VERSION)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;
        self.read_payload(response).await
    }
}

#[async_trait]
impl SearchSession for DuffelSession {
    async fn create_session(
        &self,
        slices: &[SliceSpec],
        passengers: &[Passenger],
    ) -> Result<PartialOfferRequest, SearchApiError> {
        let url = format!("{}/air/partial_offer_requests", self.base_url);
        let body = CreateSessionBody {
            data: CreateSessionData { slices, passengers },
        };
        self.post_payload(url, &body).await
    }

    async fn offers_after_selection(
        &self,
        session_id: &str,
        selected_outbound_id: &str,
    ) -> Result<Vec<PartialOffer>, SearchApiError> {
        let url = format!(
            "{}/air/partial_offer_requests/{}?selected_partial_offer%5B%5D={}",
            self.base_url,
            urlencoding::encode(session_id),
            urlencoding::encode(selected_outbound_id)
        );
        let request: PartialOfferRequest = self.get_payload(url).await?;
        Ok(request.offers)
    }

    async fn fare_offers(
        &self,
        session_id: &str,
        outbound_id: &str,
        inbound_id: &str,
    ) -> Result<Vec<PartialOffer>, SearchApiError> {
        let url = format!(
            "{}/air/partial_offer_requests/{}/fares?selected_partial_offers%5B%5D={}&selected_partial_offers%5B%5D={}",
            self.base_url,
            urlencoding::encode(session_id),
            urlencoding::encode(outbound_id),
            urlencoding::encode(inbound_id)
        );
        let request: PartialOfferRequest = self.get_payload(url).await?;
        Ok(request.offers)
    }

    async fn priced_offer(
        &self,
        offer_id: &str,
        include_services: bool,
    ) -> Result<PricedOffer, SearchApiError> {
        let url = format!(
            "{}/air/offers/{}?return_available_services={}",
            self.base_url,
            urlencoding::encode(offer_id),
            include_services
        );
        self.get_payload(url).await
    }
}
