//! downlink - turn links, magnets and hosted files into direct downloads
//!
//! Drives an asynchronous resolution service (AllDebrid) until a link can be
//! fetched: instant links come back at once, magnets are uploaded and polled,
//! delayed links are polled until generated, and media with several streams
//! lets the caller pick one.
//!
//! # Modules
//!
//! - `models` - Results, classifier outcomes, torrent and delayed snapshots
//! - `api` - Resolution service trait and HTTP client
//! - `resolve` - Classifier, path drivers, poll sessions and the `Resolver`
//! - `config` - Credentials, agent and poll intervals
//! - `error` - Transport and resolution errors

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod resolve;

// Re-export commonly used types
pub use models::{
    DelayedPhase, DelayedStatus, DownloadResult, ResolutionOutcome, ServiceError,
    StreamVariant, StreamingOutcome, TorrentPhase, TorrentStatus,
};

pub use api::{AllDebridClient, ResolutionService};
pub use config::{ClientConfig, Config, PollIntervals};
pub use error::{ResolveError, TransportError};
pub use resolve::{Resolution, Resolver, SessionState};
