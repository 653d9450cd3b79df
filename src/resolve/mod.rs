//! Link resolution
//!
//! - `classify`: reading raw service responses
//! - `instant`, `torrent`, `delayed`, `stream`: one driver per resolution path
//! - `session`: the poll loop shared by the torrent and delayed paths
//!
//! `Resolver` is the entry point. It normalizes the input, unlocks it and
//! routes the classified outcome to the matching driver.

pub mod classify;
pub mod delayed;
pub mod instant;
pub mod session;
pub mod stream;
pub mod torrent;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::ResolutionService;
use crate::config::PollIntervals;
use crate::error::ResolveError;
use crate::models::{DownloadResult, ResolutionOutcome, StreamingOutcome, TorrentStatus};

pub use delayed::DelayedSession;
pub use session::{PollSession, SessionState};
pub use torrent::TorrentSession;

/// Where a resolution ended up
#[derive(Debug)]
pub enum Resolution {
    /// Direct link, nothing left to do
    Download(DownloadResult),
    /// Stream variants to choose from (`streams` is set); see [`Resolver::select_stream`]
    Streams(DownloadResult),
    /// Magnet uploaded; poll until ready, then [`Resolver::download_torrent`]
    Torrent(TorrentSession),
    /// Link still being generated
    Delayed(DelayedSession),
}

/// Everything `encodeURI` escapes: all but ASCII alphanumerics and
/// `; , / ? : @ & = + $ - _ . ! ~ * ' ( ) #`
const URI_ESCAPED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'#');

/// Percent-encode a raw link the way `encodeURI` does: reserved URI
/// characters survive, everything else is escaped as UTF-8.
pub fn normalize_link(raw: &str) -> String {
    utf8_percent_encode(raw.trim(), URI_ESCAPED).to_string()
}

/// Resolution coordinator
pub struct Resolver {
    service: Arc<dyn ResolutionService>,
    intervals: PollIntervals,
}

impl Resolver {
    pub fn new(service: Arc<dyn ResolutionService>, intervals: PollIntervals) -> Self {
        Self { service, intervals }
    }

    /// Resolve user input into a result or a running session.
    ///
    /// Service and transport errors end the resolution and are returned
    /// as-is; nothing is left polling after an error.
    pub async fn resolve(&self, raw_link: &str) -> Result<Resolution, ResolveError> {
        if raw_link.trim().is_empty() {
            return Err(ResolveError::InvalidInput("link is empty".to_string()));
        }

        let link = normalize_link(raw_link);
        debug!(%link, "unlocking");
        let response = self.service.unlock(&link).await?;

        match classify::classify(&response, &link) {
            ResolutionOutcome::ServiceError(err) => Err(err.into()),
            ResolutionOutcome::InstantLink {
                id,
                name,
                size_bytes,
                url,
            } => Ok(Resolution::Download(instant::finish(id, name, size_bytes, url))),
            ResolutionOutcome::NeedsUpload { raw_link } => {
                info!("no instant link for magnet, uploading");
                let id = torrent::upload(self.service.as_ref(), &raw_link).await?;
                Ok(Resolution::Torrent(self.follow_torrent(id)))
            }
            ResolutionOutcome::Delayed { id } => Ok(Resolution::Delayed(self.follow_delayed(id))),
            ResolutionOutcome::StreamList { id, name, items } => {
                Ok(Resolution::Streams(DownloadResult {
                    id: Some(id),
                    name,
                    size_bytes: None,
                    url: None,
                    streams: Some(items),
                }))
            }
        }
    }

    /// Pick one stream variant of an unlocked item
    pub async fn select_stream(&self, id: &str, stream_id: &str) -> Result<Resolution, ResolveError> {
        match stream::select(self.service.as_ref(), id, stream_id).await? {
            StreamingOutcome::Download(result) => Ok(Resolution::Download(result)),
            StreamingOutcome::Delayed { id } => Ok(Resolution::Delayed(self.follow_delayed(id))),
            StreamingOutcome::ServiceError(err) => Err(err.into()),
        }
    }

    /// Unlock the link of a ready torrent through the full pipeline.
    ///
    /// This re-enters [`Resolver::resolve`]. It terminates because a ready
    /// torrent's link is a hosted file with a nonzero size and never a
    /// magnet, so it cannot classify as an upload again.
    pub async fn download_torrent(&self, torrent: &TorrentStatus) -> Result<Resolution, ResolveError> {
        let link = torrent.ready_link().ok_or_else(|| {
            ResolveError::InvalidInput(format!("torrent {} is not ready", torrent.id))
        })?;
        info!(torrent_id = %torrent.id, "unlocking ready torrent link");
        self.resolve(link).await
    }

    /// Poll an existing torrent
    pub fn follow_torrent(&self, id: impl Into<String>) -> TorrentSession {
        torrent::follow(Arc::clone(&self.service), id, self.intervals.torrent)
    }

    /// Poll an existing delayed link
    pub fn follow_delayed(&self, id: impl Into<String>) -> DelayedSession {
        delayed::follow(Arc::clone(&self.service), id, self.intervals.delayed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_keeps_uri_characters() {
        assert_eq!(
            normalize_link("magnet:?xt=urn:btih:ABC&dn=name"),
            "magnet:?xt=urn:btih:ABC&dn=name"
        );
        assert_eq!(
            normalize_link("https://host/path/file.mkv?x=1#frag"),
            "https://host/path/file.mkv?x=1#frag"
        );
    }

    #[test]
    fn test_normalize_escapes_spaces_and_unicode() {
        assert_eq!(normalize_link("magnet:?xt=urn:btih:A&dn=My Movie"), "magnet:?xt=urn:btih:A&dn=My%20Movie");
        assert_eq!(normalize_link("https://h/é"), "https://h/%C3%A9");
        assert_eq!(normalize_link("https://h/%20"), "https://h/%2520");
    }

    #[test]
    fn test_normalize_escape_set_matches_encode_uri() {
        assert_eq!(
            normalize_link(";,/?:@&=+$-_.!~*'()#"),
            ";,/?:@&=+$-_.!~*'()#"
        );
        assert_eq!(normalize_link("a\"b<c>[d]{e}|f^g`"), "a%22b%3Cc%3E%5Bd%5D%7Be%7D%7Cf%5Eg%60");
    }

    #[test]
    fn test_normalize_trims() {
        assert_eq!(normalize_link("  https://h/f \n"), "https://h/f");
    }
}
