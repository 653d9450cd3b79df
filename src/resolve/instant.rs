//! Instant links need no follow-up: the classifier's outcome is the result.

use crate::models::DownloadResult;

pub fn finish(
    id: Option<String>,
    name: Option<String>,
    size_bytes: Option<u64>,
    url: String,
) -> DownloadResult {
    DownloadResult {
        id,
        name,
        size_bytes,
        url: Some(url),
        streams: None,
    }
}
