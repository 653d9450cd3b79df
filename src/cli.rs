//! CLI - Command Line Interface for downlink
//!
//! Every resolution path is scriptable. All output is JSON-parseable when
//! `--json` is given or stdout is not a terminal.
//!
//! # Examples
//!
//! ```bash
//! # Resolve a hosted file or a magnet (follows torrents until ready)
//! downlink resolve "https://1fichier.com/?abcdef"
//! downlink resolve "magnet:?xt=urn:btih:..." --json
//!
//! # Pick a stream variant, follow existing torrents or delayed links
//! downlink stream 9fa31 s1
//! downlink torrent 12345
//! downlink delayed 42
//! ```

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use downlink::ResolveError;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    /// General error
    Error = 1,
    InvalidArgs = 2,
    NetworkError = 3,
    /// The resolution service reported a failure
    ServiceError = 4,
    /// Session cancelled before reaching a result
    Cancelled = 5,
}

impl ExitCode {
    /// Exit code matching a resolution failure
    pub fn for_error(err: &ResolveError) -> Self {
        match err {
            ResolveError::Service(_) => ExitCode::ServiceError,
            ResolveError::Transport(_) => ExitCode::NetworkError,
            ResolveError::InvalidInput(_) => ExitCode::InvalidArgs,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// downlink - resolve links and magnets into direct download URLs
#[derive(Parser, Debug)]
#[command(
    name = "downlink",
    version,
    about = "Resolve links and magnets into direct download URLs",
    after_help = "EXAMPLES:\n\
                  downlink resolve \"magnet:?xt=urn:btih:...\"   Upload and wait for a torrent\n\
                  downlink stream 9fa31 s1                     Pick a stream variant\n\
                  downlink delayed 42 --json                   Follow a delayed link"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a link, magnet URI or hosted file
    #[command(visible_alias = "r")]
    Resolve(ResolveCmd),

    /// Get the link for one stream variant
    #[command(visible_alias = "s")]
    Stream(StreamCmd),

    /// Follow an uploaded torrent until it is ready
    #[command(visible_alias = "t")]
    Torrent(TorrentCmd),

    /// Follow a delayed link until it is generated
    #[command(visible_alias = "d")]
    Delayed(DelayedCmd),
}

/// Resolve user input
#[derive(Args, Debug)]
pub struct ResolveCmd {
    /// Link, magnet URI or hosted-file reference
    #[arg(required = true)]
    pub link: String,

    /// Return the first outcome instead of following torrents and delayed links
    #[arg(long)]
    pub no_wait: bool,
}

/// Select a stream variant
#[derive(Args, Debug)]
pub struct StreamCmd {
    /// Id of the unlocked item
    #[arg(required = true)]
    pub id: String,

    /// Stream id from the variant list
    #[arg(required = true)]
    pub stream: String,
}

#[derive(Args, Debug)]
pub struct TorrentCmd {
    /// Torrent id returned by the magnet upload
    #[arg(required = true)]
    pub id: String,

    /// Stop once the torrent is ready instead of unlocking its link
    #[arg(long)]
    pub no_unlock: bool,
}

#[derive(Args, Debug)]
pub struct DelayedCmd {
    /// Delayed link id
    #[arg(required = true)]
    pub id: String,
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// One line of progress while a session is polling
#[derive(Debug, Serialize)]
pub struct ProgressLine<'a, T: Serialize> {
    pub progress: &'a T,
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print a final result
    pub fn print<T: Serialize + std::fmt::Display>(&self, data: &T) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(&JsonOutput::success(data))?);
        } else {
            print!("{}", data);
        }
        Ok(())
    }

    /// Print an intermediate snapshot (one JSON object per line)
    pub fn progress<T: Serialize + std::fmt::Display>(&self, snapshot: &T) {
        if self.json {
            if let Ok(line) = serde_json::to_string(&ProgressLine { progress: snapshot }) {
                println!("{}", line);
            }
        } else if !self.quiet {
            eprintln!("{}", snapshot);
        }
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print a resolution failure with its matching exit code
    pub fn resolve_error(&self, err: &ResolveError) -> ExitCode {
        self.error(err.to_string(), ExitCode::for_error(err))
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
