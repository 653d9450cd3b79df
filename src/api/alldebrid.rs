//! AllDebrid resolution service client
//!
//! Thin wrapper over the v4 REST API: one GET per call, bearer credential and
//! agent parameter on every request, no retries. Responses are returned as the
//! raw envelope; deciding what they mean is the classifier's job.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::debug;

use super::ResolutionService;
use crate::config::ClientConfig;
use crate::error::TransportError;

// =============================================================================
// Wire Envelope
// =============================================================================

/// Top-level response shape shared by every endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// "success" or "error"
    pub status: String,
    pub data: Option<T>,
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            error: Some(ErrorBody {
                code: None,
                message: message.into(),
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == "error"
    }

    /// Message of an error envelope
    pub fn error_message(&self) -> Option<&str> {
        if !self.is_error() {
            return None;
        }
        Some(
            self.error
                .as_ref()
                .map(|e| e.message.as_str())
                .filter(|m| !m.is_empty())
                .unwrap_or("Unknown error"),
        )
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// `link/unlock` payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnlockData {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    pub filename: Option<String>,
    pub filesize: Option<u64>,
    pub link: Option<String>,
    #[serde(default, deserialize_with = "delayed_id")]
    pub delayed: Option<String>,
    pub streams: Option<Vec<StreamData>>,
}

/// One stream variant inside an unlock payload
#[derive(Debug, Clone, Deserialize)]
pub struct StreamData {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub quality: Option<String>,
    pub filesize: Option<u64>,
}

/// `magnet/upload` payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadData {
    #[serde(default)]
    pub magnets: Vec<UploadedMagnet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadedMagnet {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub size: Option<u64>,
    /// Per-magnet failure inside an otherwise successful envelope
    pub error: Option<ErrorBody>,
}

/// `magnet/status` payload for a single id
#[derive(Debug, Clone, Deserialize)]
pub struct TorrentStatusData {
    pub magnets: MagnetStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MagnetStatus {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub downloaded: u64,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "statusCode")]
    pub status_code: Option<i64>,
    #[serde(default)]
    pub links: Vec<LinkEntry>,
}

/// Torrent links come back either as bare strings or as file objects
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LinkEntry {
    Plain(String),
    File {
        link: String,
        filename: Option<String>,
        size: Option<u64>,
    },
}

impl LinkEntry {
    pub fn url(&self) -> &str {
        match self {
            LinkEntry::Plain(link) => link,
            LinkEntry::File { link, .. } => link,
        }
    }
}

/// `link/streaming` payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamingData {
    pub filename: Option<String>,
    pub filesize: Option<u64>,
    pub link: Option<String>,
    #[serde(default, deserialize_with = "delayed_id")]
    pub delayed: Option<String>,
}

/// `link/delayed` payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DelayedData {
    #[serde(default)]
    pub status: i64,
    pub time_left: Option<u64>,
    pub link: Option<String>,
}

/// Ids arrive as strings on some endpoints and numbers on others
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    opt_string_or_number(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("expected a string or number"))
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Delayed ids are only meaningful when truthy; a numeric 0 means none
fn delayed_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) if n.as_f64() == Some(0.0) => None,
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// =============================================================================
// Client
// =============================================================================

/// AllDebrid API client
pub struct AllDebridClient {
    config: ClientConfig,
    client: reqwest::Client,
}

impl AllDebridClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Make an authenticated GET request and decode the envelope
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<Envelope<T>, TransportError> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint);
        debug!(endpoint, "calling resolution service");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .query(&[("agent", self.config.agent.as_str())])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // Error envelopes may come with a 4xx status; the body is what counts
        match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(envelope) => {
                debug!(endpoint, http_status = status.as_u16(), service_status = %envelope.status, "service responded");
                Ok(envelope)
            }
            Err(_) if !status.is_success() => {
                Err(TransportError::Http(status.as_u16()))
            }
            Err(e) => Err(TransportError::InvalidResponse(format!(
                "JSON parse error on {}: {}",
                endpoint, e
            ))),
        }
    }
}

#[async_trait]
impl ResolutionService for AllDebridClient {
    async fn unlock(&self, link: &str) -> Result<Envelope<UnlockData>, TransportError> {
        self.get("link/unlock", &[("link", link)]).await
    }

    async fn upload_magnet(&self, link: &str) -> Result<Envelope<UploadData>, TransportError> {
        self.get("magnet/upload", &[("magnets[]", link)]).await
    }

    async fn torrent_status(&self, id: &str) -> Result<Envelope<TorrentStatusData>, TransportError> {
        self.get("magnet/status", &[("id", id)]).await
    }

    async fn streaming_link(
        &self,
        id: &str,
        stream_id: &str,
    ) -> Result<Envelope<StreamingData>, TransportError> {
        self.get("link/streaming", &[("id", id), ("stream", stream_id)])
            .await
    }

    async fn delayed_status(&self, id: &str) -> Result<Envelope<DelayedData>, TransportError> {
        self.get("link/delayed", &[("id", id)]).await
    }
}
