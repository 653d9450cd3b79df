//! Resolution service access
//!
//! - `ResolutionService`: the calls the resolver makes, one network round trip each
//! - `alldebrid`: the HTTP implementation

pub mod alldebrid;

use async_trait::async_trait;

use crate::error::TransportError;

pub use alldebrid::{
    AllDebridClient, DelayedData, Envelope, StreamingData, TorrentStatusData, UnlockData,
    UploadData,
};

/// Calls used to drive a link to a downloadable URL.
///
/// Implementations never retry; a transport failure is returned to the caller.
#[async_trait]
pub trait ResolutionService: Send + Sync {
    async fn unlock(&self, link: &str) -> Result<Envelope<UnlockData>, TransportError>;

    async fn upload_magnet(&self, link: &str) -> Result<Envelope<UploadData>, TransportError>;

    async fn torrent_status(&self, id: &str) -> Result<Envelope<TorrentStatusData>, TransportError>;

    async fn streaming_link(
        &self,
        id: &str,
        stream_id: &str,
    ) -> Result<Envelope<StreamingData>, TransportError>;

    async fn delayed_status(&self, id: &str) -> Result<Envelope<DelayedData>, TransportError>;
}
