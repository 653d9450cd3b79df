//! Torrent upload path
//!
//! A magnet with no instant link is uploaded, then its status is polled until
//! the service reports it ready. A stalled or erroring torrent is not turned
//! into a failure here: the raw status text is surfaced and polling continues
//! until the torrent is ready or the session is dropped.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::classify;
use super::session::{PollSession, Poller, Step};
use crate::api::ResolutionService;
use crate::error::ResolveError;
use crate::models::{ServiceError, TorrentStatus};

pub type TorrentSession = PollSession<TorrentPoller>;

/// Upload a magnet and return the id of the created torrent
pub async fn upload(service: &dyn ResolutionService, link: &str) -> Result<String, ResolveError> {
    let response = service.upload_magnet(link).await?;
    let id = classify::classify_upload(&response)?;
    info!(torrent_id = %id, "magnet uploaded");
    Ok(id)
}

/// Start polling an uploaded torrent
pub fn follow(
    service: Arc<dyn ResolutionService>,
    id: impl Into<String>,
    interval: Duration,
) -> TorrentSession {
    PollSession::spawn(
        TorrentPoller {
            service,
            id: id.into(),
        },
        interval,
    )
}

/// Polls `magnet/status` for one torrent
pub struct TorrentPoller {
    service: Arc<dyn ResolutionService>,
    id: String,
}

#[async_trait]
impl Poller for TorrentPoller {
    type Snapshot = TorrentStatus;
    /// The ready torrent; its first link still has to be unlocked
    type Output = TorrentStatus;

    fn kind(&self) -> &'static str {
        "torrent"
    }

    fn id(&self) -> &str {
        &self.id
    }

    async fn poll(&self) -> Result<Step<TorrentStatus, TorrentStatus>, ResolveError> {
        let response = self.service.torrent_status(&self.id).await?;
        let status = classify::torrent_snapshot(&self.id, &response)?;

        if !status.is_ready() {
            return Ok(Step::Pending(status));
        }
        if status.ready_link().is_none() {
            return Err(ServiceError::new("Torrent is ready but has no links").into());
        }
        Ok(Step::Done(status))
    }
}
