//! Stream selection path
//!
//! Not a poll loop: the caller picks one of the listed variants and a single
//! `link/streaming` call decides between a direct link and a delayed one.

use tracing::info;

use super::classify;
use crate::api::ResolutionService;
use crate::error::ResolveError;
use crate::models::StreamingOutcome;

/// Request the link for `stream_id` of the unlocked item `id`
pub async fn select(
    service: &dyn ResolutionService,
    id: &str,
    stream_id: &str,
) -> Result<StreamingOutcome, ResolveError> {
    info!(%id, %stream_id, "selecting stream");
    let response = service.streaming_link(id, stream_id).await?;

    match classify::classify_streaming(&response, id) {
        StreamingOutcome::ServiceError(err) => Err(err.into()),
        outcome => Ok(outcome),
    }
}
