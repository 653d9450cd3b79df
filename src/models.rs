//! Data structures for link resolution
//!
//! Organized by the stage that produces them:
//! - **Results**: what the presentation layer renders (`DownloadResult`, `StreamVariant`)
//! - **Outcomes**: the classifier's reading of one service response
//! - **Torrent**: snapshots of an uploaded magnet being processed
//! - **Delayed**: snapshots of a link the service is still generating

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Inputs starting with this are treated as magnet URIs
pub const MAGNET_PREFIX: &str = "magnet:?xt=";

/// Format a byte count as gigabytes with two decimals ("1.50 gb")
pub fn format_gb(bytes: u64) -> String {
    let gb = bytes as f64 / (1024.0 * 1024.0 * 1024.0);
    format!("{:.2} gb", gb)
}

// =============================================================================
// Errors reported by the service
// =============================================================================

/// Failure explicitly reported by the resolution service.
///
/// Always terminal for the call that produced it and shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct ServiceError {
    pub message: String,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The response matched no known shape
    pub fn not_supported() -> Self {
        Self::new("Not supported")
    }

    /// Delayed generation gave up (status code 3)
    pub fn delayed_failed() -> Self {
        Self::new("Could not generate download link")
    }
}

// =============================================================================
// Results
// =============================================================================

/// One selectable quality/format of a resolved media link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamVariant {
    pub stream_id: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

impl fmt::Display for StreamVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}({})",
            self.stream_id,
            self.kind.as_deref().unwrap_or("stream"),
            self.quality.as_deref().unwrap_or("?")
        )?;
        if let Some(size) = self.size_bytes {
            write!(f, " {}", format_gb(size))?;
        }
        Ok(())
    }
}

/// Terminal payload handed to the presentation layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streams: Option<Vec<StreamVariant>>,
}

impl DownloadResult {
    /// Result carrying only a direct URL
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// True when the result can be fetched directly
    pub fn is_downloadable(&self) -> bool {
        self.url.is_some()
    }
}

impl fmt::Display for DownloadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name.as_deref().unwrap_or("(unnamed)"))?;
        if let Some(size) = self.size_bytes.filter(|s| *s > 0) {
            writeln!(f, "  {}", format_gb(size))?;
        }
        if let Some(url) = &self.url {
            writeln!(f, "  {}", url)?;
        }
        if let Some(streams) = &self.streams {
            writeln!(f, "  Available streams:")?;
            for stream in streams {
                writeln!(f, "    {}", stream)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Classifier Outcomes
// =============================================================================

/// The classifier's reading of one unlock response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Direct URL available now
    InstantLink {
        id: Option<String>,
        name: Option<String>,
        size_bytes: Option<u64>,
        url: String,
    },
    /// Zero-size link for a magnet: the torrent has to be uploaded first
    NeedsUpload { raw_link: String },
    /// Link is being generated server side
    Delayed { id: String },
    /// Media with several stream variants to pick from
    StreamList {
        id: String,
        name: Option<String>,
        items: Vec<StreamVariant>,
    },
    ServiceError(ServiceError),
}

/// Reading of a streaming-link response (no further stream lists possible)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamingOutcome {
    Download(DownloadResult),
    Delayed { id: String },
    ServiceError(ServiceError),
}

// =============================================================================
// Torrent Models
// =============================================================================

/// Processing phase of an uploaded torrent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TorrentPhase {
    Processing,
    Ready,
    Error,
}

impl TorrentPhase {
    /// Map the service's free-text status ("Ready", "Downloading", ...)
    pub fn from_status_text(status: &str) -> Self {
        let lower = status.trim().to_lowercase();
        if lower == "ready" {
            TorrentPhase::Ready
        } else if lower.contains("error") {
            TorrentPhase::Error
        } else {
            TorrentPhase::Processing
        }
    }
}

/// One poll snapshot of an uploaded torrent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentStatus {
    pub id: String,
    pub name: String,
    pub size_bytes: u64,
    pub downloaded_bytes: u64,
    pub phase: TorrentPhase,
    /// Raw status text from the service, shown as-is
    pub status_text: String,
    pub links: Vec<String>,
}

impl TorrentStatus {
    pub fn is_ready(&self) -> bool {
        self.phase == TorrentPhase::Ready
    }

    /// First link of a ready torrent; this still has to be unlocked
    pub fn ready_link(&self) -> Option<&str> {
        if self.is_ready() {
            self.links.first().map(String::as_str)
        } else {
            None
        }
    }

    pub fn progress_text(&self) -> String {
        format!(
            "Downloaded {} of {}",
            format_gb(self.downloaded_bytes),
            format_gb(self.size_bytes)
        )
    }
}

impl fmt::Display for TorrentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - status: {}",
            self.name,
            self.progress_text(),
            self.status_text
        )
    }
}

// =============================================================================
// Delayed Link Models
// =============================================================================

/// Generation phase of a delayed link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DelayedPhase {
    Pending,
    Ready,
    Failed,
}

impl DelayedPhase {
    /// Status code 3 is fatal; any other nonzero code with a URL is ready.
    /// Code 0 ("not started") and in-progress codes are both pending.
    pub fn from_code(code: i64, has_url: bool) -> Self {
        match code {
            3 => DelayedPhase::Failed,
            0 => DelayedPhase::Pending,
            _ if has_url => DelayedPhase::Ready,
            _ => DelayedPhase::Pending,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DelayedPhase::Pending => "Still processing",
            DelayedPhase::Ready => "Download link is available",
            DelayedPhase::Failed => "Could not generate download link",
        }
    }
}

/// One poll snapshot of a delayed link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayedStatus {
    pub id: String,
    pub phase: DelayedPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds_remaining: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl DelayedStatus {
    /// Display name taken from the URL's last path segment.
    ///
    /// The service returns no filename for delayed links.
    pub fn name(&self) -> Option<String> {
        self.url.as_deref().and_then(name_from_url)
    }

    pub fn into_download_result(self) -> DownloadResult {
        let name = self.name();
        DownloadResult {
            id: Some(self.id),
            name,
            size_bytes: None,
            url: self.url,
            streams: None,
        }
    }
}

impl fmt::Display for DelayedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - status: {}", self.id, self.phase.description())?;
        if let Some(secs) = self.seconds_remaining.filter(|s| *s > 0) {
            write!(f, " - time left: {} seconds", secs)?;
        }
        Ok(())
    }
}

/// Last path segment of a URL, percent-decoded
pub fn name_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().filter(|s| !s.is_empty())?;
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    Some(decoded)
}
