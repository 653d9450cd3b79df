//! Delayed link generation path
//!
//! Polls `link/delayed` until a URL is available. Code 3 ends the session
//! with "Could not generate download link".

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::classify;
use super::session::{PollSession, Poller, Step};
use crate::api::ResolutionService;
use crate::error::ResolveError;
use crate::models::{DelayedPhase, DelayedStatus, DownloadResult};

pub type DelayedSession = PollSession<DelayedPoller>;

pub fn follow(
    service: Arc<dyn ResolutionService>,
    id: impl Into<String>,
    interval: Duration,
) -> DelayedSession {
    PollSession::spawn(
        DelayedPoller {
            service,
            id: id.into(),
        },
        interval,
    )
}

pub struct DelayedPoller {
    service: Arc<dyn ResolutionService>,
    id: String,
}

#[async_trait]
impl Poller for DelayedPoller {
    type Snapshot = DelayedStatus;
    type Output = DownloadResult;

    fn kind(&self) -> &'static str {
        "delayed"
    }

    fn id(&self) -> &str {
        &self.id
    }

    async fn poll(&self) -> Result<Step<DelayedStatus, DownloadResult>, ResolveError> {
        let response = self.service.delayed_status(&self.id).await?;
        let status = classify::delayed_snapshot(&self.id, &response)?;

        Ok(match status.phase {
            DelayedPhase::Ready => Step::Done(status.into_download_result()),
            _ => Step::Pending(status),
        })
    }
}
