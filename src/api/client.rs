// Allow dead code: API response structs have fields for completeness
#![allow(dead_code)]

//! API client for communicating with the Scriim REST API.
//!
//! This module provides the `ApiClient` struct for submitting panic
//! alerts and fetching the alert history, plus the wire types for the
//! `/panic` endpoint.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::location::LocationFix;
use crate::models::AuthorityKind;

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow responses while failing fast enough for an emergency flow.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// A contact entry as the backend expects it: no local id, camelCase keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadContact {
    pub name: String,
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    pub email: String,
}

/// Request body for `POST /panic`.
#[derive(Debug, Clone, Serialize)]
pub struct PanicPayload {
    pub name: String,
    pub location: LocationFix,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contacts: Option<Vec<PayloadContact>>,
    #[serde(rename = "authorityType", skip_serializing_if = "Option::is_none")]
    pub authority_type: Option<AuthorityKind>,
}

/// Response body for `POST /panic`.
#[derive(Debug, Clone, Deserialize)]
pub struct PanicResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub count: Option<i64>,
}

/// One previously submitted alert, as returned by `GET /panic`.
#[derive(Debug, Clone, Deserialize)]
pub struct PanicRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<LocationFix>,
    #[serde(rename = "authorityType", default)]
    pub authority_type: Option<AuthorityKind>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

/// API client for the Scriim backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client against the given base URL
    pub fn new(base_url: String) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Submit a panic alert to the backend.
    ///
    /// A non-success HTTP status is an error; a 2xx with `success: false`
    /// is a valid response and left to the caller to interpret.
    pub async fn send_panic(&self, payload: &PanicPayload) -> Result<PanicResponse, ApiError> {
        let url = format!("{}/panic", self.base_url);
        debug!(url = %url, "Submitting panic alert");

        let response = self.client.post(&url).json(payload).send().await?;
        let response = Self::check_response(response).await?;

        let parsed: PanicResponse = response.json().await?;
        Ok(parsed)
    }

    /// Fetch all previously submitted panic alerts
    pub async fn fetch_panics(&self) -> Result<Vec<PanicRecord>, ApiError> {
        let url = format!("{}/panic", self.base_url);

        let response = self.client.get(&url).send().await?;
        let response = Self::check_response(response).await?;

        let text = response.text().await?;
        debug!("Panic history response received");

        // Try to parse as array directly first, then as wrapped object
        if let Ok(records) = serde_json::from_str::<Vec<PanicRecord>>(&text) {
            return Ok(records);
        }

        #[derive(Deserialize)]
        struct HistoryWrapper {
            #[serde(default)]
            data: Vec<PanicRecord>,
        }

        if let Ok(wrapper) = serde_json::from_str::<HistoryWrapper>(&text) {
            return Ok(wrapper.data);
        }

        warn!("Failed to parse panic history response");
        Ok(vec![])
    }
}
