//! Configuration management for medblob.
//!
//! This module provides the command-line interface:
//! - `serve` (the default) runs the HTTP decode API
//! - `inspect` reports on the buffers in a dumped imaging response
//!
//! # Environment Variables
//!
//! Options can be set via environment variables with the `MEDBLOB_` prefix:
//!
//! - `MEDBLOB_HOST` - Server bind address (default: 0.0.0.0)
//! - `MEDBLOB_PORT` - Server port (default: 3000)
//! - `MEDBLOB_SNAPSHOT` - JSON table snapshot served by the image and text endpoints
//! - `MEDBLOB_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)
//! - `MEDBLOB_CORS_ORIGINS` - Allowed CORS origins, comma-separated (default: any)
//! - `MEDBLOB_PREVIEW_LIMIT` - Characters kept in inspection previews (default: 4000)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::payload::DEFAULT_PREVIEW_LIMIT;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default HTTP cache max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

/// Default file inspected by `medblob inspect`.
pub const DEFAULT_INSPECT_INPUT: &str = "task.md";

// =============================================================================
// CLI Arguments
// =============================================================================

/// medblob - decoder for medical BLOB columns.
///
/// Recovers bytes from hex, base64 and numeric-array cells, strips
/// gzip/zlib/deflate envelopes, identifies the payload and converts RTF
/// reports to plain text.
#[derive(Parser, Debug, Clone)]
#[command(name = "medblob")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Serve options used when no subcommand is given
    #[command(flatten)]
    pub serve: ServeConfig,
}

impl Cli {
    /// The command to run; `serve` when none was given.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP decode API
    Serve(ServeConfig),

    /// Report on the buffers in a dumped imaging response
    Inspect(InspectConfig),
}

// =============================================================================
// Serve Configuration
// =============================================================================

/// Options for `medblob serve`.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "MEDBLOB_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "MEDBLOB_PORT")]
    pub port: u16,

    /// JSON snapshot of tables, `{ "Table": [ {row}, ... ] }`.
    ///
    /// Without a snapshot the image and text endpoints report every table
    /// as missing; the POST decode endpoints still work.
    #[arg(long, env = "MEDBLOB_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "MEDBLOB_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "MEDBLOB_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("Host must not be empty. Set --host or MEDBLOB_HOST".to_string());
        }

        if let Some(ref path) = self.snapshot {
            if !path.is_file() {
                return Err(format!(
                    "Snapshot file not found: {}. Set --snapshot or MEDBLOB_SNAPSHOT",
                    path.display()
                ));
            }
        }

        if let Some(ref origins) = self.cors_origins {
            if origins.iter().any(|o| o.trim().is_empty()) {
                return Err("CORS origins must not contain empty entries".to_string());
            }
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Inspect Configuration
// =============================================================================

/// Options for `medblob inspect`.
#[derive(Args, Debug, Clone)]
pub struct InspectConfig {
    /// File holding the dumped response (JSON, or text containing a JSON block).
    #[arg(default_value = DEFAULT_INSPECT_INPUT)]
    pub input: PathBuf,

    /// Characters kept in each text preview.
    #[arg(long, default_value_t = DEFAULT_PREVIEW_LIMIT, env = "MEDBLOB_PREVIEW_LIMIT")]
    pub preview_limit: usize,

    /// Print the reports as JSON instead of text.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl InspectConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.preview_limit == 0 {
            return Err("preview_limit must be greater than 0".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
