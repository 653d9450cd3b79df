//! CLI Command Handlers
//!
//! Each handler takes CLI args, the resolver and Output, and returns ExitCode.
//! Torrent and delayed sessions are followed until they finish; Ctrl-C
//! cancels the session.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use downlink::resolve::session::Poller;
use downlink::resolve::{PollSession, Resolution, Resolver, SessionState, TorrentSession};
use downlink::{AllDebridClient, Config, DownloadResult, TorrentStatus};

use crate::cli::{Cli, DelayedCmd, ExitCode, Output, ResolveCmd, StreamCmd, TorrentCmd};

/// Build the resolver from config file and environment
pub fn build_resolver(cli: &Cli) -> anyhow::Result<Resolver> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    }
    .with_env();

    let client = AllDebridClient::new(config.client_config()?);
    Ok(Resolver::new(Arc::new(client), config.poll_intervals()))
}

/// Printed for `--no-wait` when a session would have been followed
#[derive(Debug, Serialize)]
struct PendingSession<'a> {
    kind: &'static str,
    id: &'a str,
}

impl fmt::Display for PendingSession<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} is processing", self.kind, self.id)
    }
}

// =============================================================================
// Resolve Command
// =============================================================================

pub async fn resolve_cmd(cmd: ResolveCmd, resolver: &Resolver, output: &Output) -> ExitCode {
    output.info(format!("Resolving: {}", cmd.link));

    let resolution = match resolver.resolve(&cmd.link).await {
        Ok(resolution) => resolution,
        Err(e) => return output.resolve_error(&e),
    };

    if cmd.no_wait {
        return print_first(&resolution, output);
    }

    match resolution {
        Resolution::Torrent(session) => follow_torrent(session, resolver, output, true).await,
        other => finish(other, output).await,
    }
}

fn print_first(resolution: &Resolution, output: &Output) -> ExitCode {
    let printed = match resolution {
        Resolution::Download(result) | Resolution::Streams(result) => output.print(result),
        Resolution::Torrent(session) => output.print(&PendingSession {
            kind: "torrent",
            id: session.id(),
        }),
        Resolution::Delayed(session) => output.print(&PendingSession {
            kind: "delayed",
            id: session.id(),
        }),
    };
    match printed {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
    }
}

/// Print a result, following a delayed session if needed.
///
/// A torrent here would mean an unlocked torrent link asked for another
/// upload, which the service never does.
async fn finish(resolution: Resolution, output: &Output) -> ExitCode {
    let result = match resolution {
        Resolution::Download(result) | Resolution::Streams(result) => result,
        Resolution::Delayed(session) => match follow(session, output).await {
            Ok(result) => result,
            Err(code) => return code,
        },
        Resolution::Torrent(session) => {
            return output.error(
                format!("Unexpected torrent {} while unlocking", session.id()),
                ExitCode::Error,
            );
        }
    };
    print_result(&result, output)
}

fn print_result(result: &DownloadResult, output: &Output) -> ExitCode {
    match output.print(result) {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
    }
}

// =============================================================================
// Stream Command
// =============================================================================

pub async fn stream_cmd(cmd: StreamCmd, resolver: &Resolver, output: &Output) -> ExitCode {
    output.info(format!("Selecting stream {} of {}", cmd.stream, cmd.id));

    match resolver.select_stream(&cmd.id, &cmd.stream).await {
        Ok(resolution) => finish(resolution, output).await,
        Err(e) => output.resolve_error(&e),
    }
}

// =============================================================================
// Torrent Command
// =============================================================================

pub async fn torrent_cmd(cmd: TorrentCmd, resolver: &Resolver, output: &Output) -> ExitCode {
    output.info(format!("Following torrent {}", cmd.id));
    let session = resolver.follow_torrent(cmd.id);
    follow_torrent(session, resolver, output, !cmd.no_unlock).await
}

async fn follow_torrent(
    session: TorrentSession,
    resolver: &Resolver,
    output: &Output,
    unlock: bool,
) -> ExitCode {
    let ready: TorrentStatus = match follow(session, output).await {
        Ok(status) => status,
        Err(code) => return code,
    };

    if !unlock {
        return match output.print(&ready) {
            Ok(()) => ExitCode::Success,
            Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
        };
    }

    output.info(format!("{} is ready, unlocking", ready.name));
    match resolver.download_torrent(&ready).await {
        Ok(resolution) => finish(resolution, output).await,
        Err(e) => output.resolve_error(&e),
    }
}

// =============================================================================
// Delayed Command
// =============================================================================

pub async fn delayed_cmd(cmd: DelayedCmd, resolver: &Resolver, output: &Output) -> ExitCode {
    output.info(format!("Following delayed link {}", cmd.id));
    let session = resolver.follow_delayed(cmd.id);
    match follow(session, output).await {
        Ok(result) => print_result(&result, output),
        Err(code) => code,
    }
}

// =============================================================================
// Session Following
// =============================================================================

/// Print snapshots until the session finishes; Ctrl-C cancels it
async fn follow<P>(mut session: PollSession<P>, output: &Output) -> Result<P::Output, ExitCode>
where
    P: Poller,
    P::Snapshot: Serialize + fmt::Display,
{
    loop {
        let state = tokio::select! {
            state = session.changed() => state,
            _ = tokio::signal::ctrl_c() => {
                session.cancel();
                return Err(output.error("Cancelled", ExitCode::Cancelled));
            }
        };

        match state {
            SessionState::Polling(Some(snapshot)) => output.progress(&snapshot),
            SessionState::Polling(None) => {}
            SessionState::Finished(result) => return Ok(result),
            SessionState::Failed(err) => return Err(output.resolve_error(&err)),
            SessionState::Cancelled => return Err(output.error("Cancelled", ExitCode::Cancelled)),
        }
    }
}
