//! REST client for the remote ingestion service.
//!
//! Wraps the three endpoints the catalog needs using [`reqwest`]:
//!
//! - `GET /upload/url` returns a one-time direct-upload target, passed
//!   through to the client untouched.
//! - `GET /remote/add?url=` queues a remote fetch and returns its id.
//! - `GET /remote/status?id=` reports job state, keyed by remote id.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use vidfeed_core::ingestion::{Progress, StatusReport};

use crate::error::IngestError;

/// Error message used when the service reports `error` without detail.
const DEFAULT_ERROR_MESSAGE: &str = "remote ingestion failed";

/// The ingestion collaborator as seen by the polling loop and handlers.
#[async_trait]
pub trait IngestionBackend: Send + Sync {
    /// Fetch a one-time direct-upload target.
    async fn upload_target(&self) -> Result<serde_json::Value, IngestError>;

    /// Queue `source_url` for remote ingestion and return its remote id.
    async fn submit(&self, source_url: &str) -> Result<String, IngestError>;

    /// One status round trip for `remote_id`.
    async fn poll(&self, remote_id: &str) -> Result<StatusReport, IngestError>;
}

/// HTTP client for the AuraHub ingestion API.
pub struct AuraHubClient {
    client: reqwest::Client,
    api_url: String,
}

impl AuraHubClient {
    /// * `api_url` - Base HTTP URL, e.g. `https://api.aurahub.fun`.
    pub fn new(api_url: String) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    // ---- private helpers ----

    /// Return the response unchanged on a 2xx status, or an
    /// [`IngestError::ApiError`] carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, IngestError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(IngestError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, IngestError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl IngestionBackend for AuraHubClient {
    async fn upload_target(&self) -> Result<serde_json::Value, IngestError> {
        let response = self
            .client
            .get(format!("{}/upload/url", self.api_url))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn submit(&self, source_url: &str) -> Result<String, IngestError> {
        let response = self
            .client
            .get(format!("{}/remote/add", self.api_url))
            .query(&[("url", source_url)])
            .send()
            .await?;

        let body: serde_json::Value = Self::parse_response(response).await?;
        parse_remote_id(&body)
    }

    async fn poll(&self, remote_id: &str) -> Result<StatusReport, IngestError> {
        let response = self
            .client
            .get(format!("{}/remote/status", self.api_url))
            .query(&[("id", remote_id)])
            .send()
            .await?;

        let body: serde_json::Value = Self::parse_response(response).await?;
        parse_status_report(remote_id, body)
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Extract the remote id from a `/remote/add` body. The id may be a string
/// or a number; anything else means submission failed.
pub fn parse_remote_id(body: &serde_json::Value) -> Result<String, IngestError> {
    match body.get("id") {
        Some(serde_json::Value::String(id)) if !id.trim().is_empty() => Ok(id.trim().to_string()),
        Some(serde_json::Value::Number(id)) => Ok(id.to_string()),
        _ => Err(IngestError::MalformedResponse(format!(
            "remote submission returned no id: {body}"
        ))),
    }
}

/// One job entry of a `/remote/status` body.
#[derive(Debug, Deserialize)]
struct StatusEntry {
    status: String,
    #[serde(default)]
    linkid: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    bytes_loaded: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    bytes_total: Option<u64>,
    #[serde(default, alias = "error", alias = "msg")]
    message: Option<String>,
}

/// Byte counts arrive as numbers or numeric strings; anything else is
/// treated as unknown.
fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Normalize a `/remote/status` body into a [`StatusReport`].
///
/// The body is an object keyed by remote id. The entry for `remote_id` is
/// used when present, otherwise the first entry.
pub fn parse_status_report(
    remote_id: &str,
    body: serde_json::Value,
) -> Result<StatusReport, IngestError> {
    let serde_json::Value::Object(mut entries) = body else {
        return Err(IngestError::MalformedResponse(format!(
            "status for {remote_id} is not an object"
        )));
    };

    let raw = match entries.remove(remote_id) {
        Some(entry) => entry,
        None => entries
            .into_iter()
            .next()
            .map(|(_, entry)| entry)
            .ok_or_else(|| {
                IngestError::MalformedResponse(format!("no status entry for {remote_id}"))
            })?,
    };

    let entry: StatusEntry = serde_json::from_value(raw).map_err(|e| {
        IngestError::MalformedResponse(format!("unreadable status for {remote_id}: {e}"))
    })?;

    let progress = Progress {
        bytes_loaded: entry.bytes_loaded,
        bytes_total: entry.bytes_total,
    };

    let report = match entry.status.trim().to_ascii_lowercase().as_str() {
        "finished" => {
            let file_id = entry
                .linkid
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .ok_or_else(|| {
                    IngestError::MalformedResponse(format!(
                        "job {remote_id} finished without a file id"
                    ))
                })?;
            StatusReport::Finished { file_id }
        }
        "error" | "failed" => StatusReport::Error {
            message: entry
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
        },
        "new" | "queued" | "pending" | "waiting" => StatusReport::Queued(progress),
        _ => StatusReport::Processing(progress),
    };
    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
