//! downlink - resolve links and magnets into direct download URLs
//!
//! # Usage
//!
//! ```bash
//! downlink resolve "magnet:?xt=urn:btih:..."
//! downlink stream 9fa31 s1 --json
//! downlink delayed 42
//! ```

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ExitCode, Output};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    run_cli(cli).await.into()
}

/// Log to stderr so stdout stays machine-readable
fn init_tracing(quiet: bool) {
    let default = if quiet { "downlink=warn" } else { "downlink=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);

    let resolver = match commands::build_resolver(&cli) {
        Ok(resolver) => resolver,
        Err(e) => return output.error(format!("{:#}", e), ExitCode::InvalidArgs),
    };

    match cli.command {
        Command::Resolve(cmd) => commands::resolve_cmd(cmd, &resolver, &output).await,
        Command::Stream(cmd) => commands::stream_cmd(cmd, &resolver, &output).await,
        Command::Torrent(cmd) => commands::torrent_cmd(cmd, &resolver, &output).await,
        Command::Delayed(cmd) => commands::delayed_cmd(cmd, &resolver, &output).await,
    }
}
