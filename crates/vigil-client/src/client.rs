//! HTTP client for the research backend.
//!
//! One outbound request per call, no internal retries, no caching: retry
//! and scheduling policy belong to the polling controller, which also
//! decides which failures are fatal.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use serde::Serialize;

use vigil_core::error::{Error, Result};
use vigil_core::session::SessionSnapshot;

use crate::api::{SessionSummary, StartResponse};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Anything that can produce one session snapshot per call.
///
/// The polling controller is written against this trait so tests can
/// drive it with a scripted source instead of a live server.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Retrieves one snapshot of the given session, or fails.
    async fn fetch(&self, session_id: &str) -> Result<SessionSnapshot>;
}

#[derive(Debug, Serialize)]
struct StartRequest<'a> {
    topic: &'a str,
}

/// Client for the research backend's HTTP surface.
#[derive(Debug, Clone)]
pub struct ResearchClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ResearchClient {
    /// Creates a new client targeting the given base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the HTTP client cannot be
    /// constructed.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::configuration(format!("failed to build HTTP client: {e}")))?;

        let base_url = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.get(format!("{}{path}", self.base_url));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    /// Starts a new research session for the given topic.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] on transport failure or a non-success
    /// status, [`Error::MalformedResponse`] if the body does not parse.
    pub async fn start_research(&self, topic: &str) -> Result<StartResponse> {
        let mut request = self
            .client
            .post(format!("{}/research/start", self.base_url))
            .json(&StartRequest { topic });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::network(format!(
                "start request failed (status={status}): {body}"
            )));
        }
        response
            .json()
            .await
            .map_err(|e| Error::malformed(format!("start response did not parse: {e}")))
    }

    /// Lists recent research sessions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] on transport failure or a non-success
    /// status, [`Error::MalformedResponse`] if the body does not parse.
    pub async fn list_history(&self) -> Result<Vec<SessionSummary>> {
        let response = self
            .get("/research/history")
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::network(format!(
                "history request failed (status={status}): {body}"
            )));
        }
        response
            .json()
            .await
            .map_err(|e| Error::malformed(format!("history response did not parse: {e}")))
    }

    /// Fetches one snapshot of the given session.
    ///
    /// Exactly one outbound request per call; never retries internally.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the server does not know the
    /// session, [`Error::Network`] on transport failure or an unexpected
    /// status, and [`Error::MalformedResponse`] when the payload fails the
    /// snapshot contract (decode failure or map-key invariant violation).
    pub async fn fetch_snapshot(&self, session_id: &str) -> Result<SessionSnapshot> {
        let response = self
            .get(&format!("/research/{session_id}"))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::not_found(session_id));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::network(format!(
                "snapshot request failed (status={status}): {body}"
            )));
        }

        let snapshot: SessionSnapshot = response
            .json()
            .await
            .map_err(|e| Error::malformed(format!("snapshot did not parse: {e}")))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Downloads the CSV export for a session as an opaque byte stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown session and
    /// [`Error::Network`] on transport failure or an unexpected status.
    pub async fn export_csv(&self, session_id: &str) -> Result<Bytes> {
        let response = self
            .get(&format!("/research/{session_id}/export"))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::not_found(session_id));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::network(format!(
                "export request failed (status={status}): {body}"
            )));
        }
        response
            .bytes()
            .await
            .map_err(|e| Error::network_with_source("export body read failed", e))
    }
}

#[async_trait]
impl SnapshotSource for ResearchClient {
    async fn fetch(&self, session_id: &str) -> Result<SessionSnapshot> {
        self.fetch_snapshot(session_id).await
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::network_with_source("request timed out", err)
    } else {
        Error::network_with_source("request failed", err)
    }
}
