//! Response classification
//!
//! Pure functions turning raw service envelopes into outcomes. The unlock rule
//! order matters: an error status always wins, then a direct URL, then a
//! delayed id, then a stream list. A response may carry several of these at
//! once and only the first match counts.

use tracing::debug;

use crate::api::{DelayedData, Envelope, StreamingData, TorrentStatusData, UnlockData, UploadData};
use crate::models::{
    DelayedPhase, DelayedStatus, DownloadResult, ResolutionOutcome, ServiceError,
    StreamVariant, StreamingOutcome, TorrentPhase, TorrentStatus, MAGNET_PREFIX,
};

/// True if the input looks like a magnet URI
pub fn is_magnet(link: &str) -> bool {
    link.trim_start().starts_with(MAGNET_PREFIX)
}

/// Non-empty string field; the service sends "" for absent links
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn envelope_error<T>(response: &Envelope<T>) -> Option<ServiceError> {
    response.error_message().map(ServiceError::new)
}

/// Classify an unlock response for the link that produced it
pub fn classify(response: &Envelope<UnlockData>, link: &str) -> ResolutionOutcome {
    if let Some(err) = envelope_error(response) {
        return ResolutionOutcome::ServiceError(err);
    }

    let Some(data) = &response.data else {
        return ResolutionOutcome::ServiceError(ServiceError::not_supported());
    };

    let outcome = if let Some(url) = present(&data.link) {
        // Only an explicit zero; a missing size is not a pending torrent
        if data.filesize == Some(0) && is_magnet(link) {
            ResolutionOutcome::NeedsUpload {
                raw_link: link.to_string(),
            }
        } else {
            ResolutionOutcome::InstantLink {
                id: data.id.clone(),
                name: data.filename.clone(),
                size_bytes: data.filesize,
                url: url.to_string(),
            }
        }
    } else if let Some(delayed) = present(&data.delayed) {
        ResolutionOutcome::Delayed {
            id: delayed.to_string(),
        }
    } else if let (Some(streams), Some(id)) = (
        data.streams.as_ref().filter(|s| !s.is_empty()),
        data.id.as_ref().filter(|id| !id.is_empty()),
    ) {
        // Streams are selected by item id, so a list without one is unusable
        ResolutionOutcome::StreamList {
            id: id.clone(),
            name: data.filename.clone(),
            items: streams
                .iter()
                .map(|s| StreamVariant {
                    stream_id: s.id.clone(),
                    kind: s.kind.clone(),
                    quality: s.quality.clone(),
                    size_bytes: s.filesize,
                })
                .collect(),
        }
    } else {
        ResolutionOutcome::ServiceError(ServiceError::not_supported())
    };

    debug!(outcome = outcome_name(&outcome), "classified unlock response");
    outcome
}

fn outcome_name(outcome: &ResolutionOutcome) -> &'static str {
    match outcome {
        ResolutionOutcome::InstantLink { .. } => "instant",
        ResolutionOutcome::NeedsUpload { .. } => "needs_upload",
        ResolutionOutcome::Delayed { .. } => "delayed",
        ResolutionOutcome::StreamList { .. } => "streams",
        ResolutionOutcome::ServiceError(_) => "error",
    }
}

/// Torrent id created by a magnet upload
pub fn classify_upload(response: &Envelope<UploadData>) -> Result<String, ServiceError> {
    if let Some(err) = envelope_error(response) {
        return Err(err);
    }

    let magnet = response
        .data
        .as_ref()
        .and_then(|d| d.magnets.first())
        .ok_or_else(ServiceError::not_supported)?;

    if let Some(err) = &magnet.error {
        return Err(ServiceError::new(err.message.clone()));
    }

    magnet.id.clone().ok_or_else(ServiceError::not_supported)
}

/// Error, then direct URL, then delayed id. Streaming responses never recurse
/// into another stream list.
pub fn classify_streaming(response: &Envelope<StreamingData>, id: &str) -> StreamingOutcome {
    if let Some(err) = envelope_error(response) {
        return StreamingOutcome::ServiceError(err);
    }

    let Some(data) = &response.data else {
        return StreamingOutcome::ServiceError(ServiceError::not_supported());
    };

    if let Some(url) = present(&data.link) {
        StreamingOutcome::Download(DownloadResult {
            id: Some(id.to_string()),
            name: data.filename.clone(),
            size_bytes: data.filesize,
            url: Some(url.to_string()),
            streams: None,
        })
    } else if let Some(delayed) = present(&data.delayed) {
        StreamingOutcome::Delayed {
            id: delayed.to_string(),
        }
    } else {
        StreamingOutcome::ServiceError(ServiceError::not_supported())
    }
}

/// Snapshot of a torrent from one status poll
pub fn torrent_snapshot(
    id: &str,
    response: &Envelope<TorrentStatusData>,
) -> Result<TorrentStatus, ServiceError> {
    if let Some(err) = envelope_error(response) {
        return Err(err);
    }

    let magnet = response
        .data
        .as_ref()
        .map(|d| &d.magnets)
        .ok_or_else(ServiceError::not_supported)?;

    Ok(TorrentStatus {
        id: magnet.id.clone().unwrap_or_else(|| id.to_string()),
        name: magnet.filename.clone(),
        size_bytes: magnet.size,
        downloaded_bytes: magnet.downloaded,
        phase: TorrentPhase::from_status_text(&magnet.status),
        status_text: magnet.status.clone(),
        links: magnet.links.iter().map(|l| l.url().to_string()).collect(),
    })
}

/// Snapshot of a delayed link from one status poll.
///
/// Code 3 is fatal and wins over any URL in the same payload.
pub fn delayed_snapshot(
    id: &str,
    response: &Envelope<DelayedData>,
) -> Result<DelayedStatus, ServiceError> {
    if let Some(err) = envelope_error(response) {
        return Err(err);
    }

    let data = response.data.as_ref().ok_or_else(ServiceError::not_supported)?;
    let url = present(&data.link).map(str::to_string);

    match DelayedPhase::from_code(data.status, url.is_some()) {
        DelayedPhase::Failed => Err(ServiceError::delayed_failed()),
        phase => Ok(DelayedStatus {
            id: id.to_string(),
            phase,
            seconds_remaining: data.time_left,
            url,
        }),
    }
}
