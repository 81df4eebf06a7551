//! CLI argument definitions for s3gate.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Integration-test orchestrator for the S3 gateway.
///
/// Builds the gateway image, brings up the gateway and storage backend,
/// runs the configuration matrix, and always tears the environment down.
#[derive(Parser, Debug)]
#[command(name = "s3gate")]
#[command(version, about, long_about = None)]
pub struct HarnessCli {
    /// Image variant to build and test
    /// (oss, plus, latest-njs-oss, latest-njs-plus).
    ///
    /// Defaults to `oss`.
    pub variant: Option<String>,

    /// Path to an s3gate.toml configuration file.
    ///
    /// Built-in defaults are used when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Output format for the final run report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

impl HarnessCli {
    /// Variant name, `oss` when none was given.
    pub fn variant_name(&self) -> &str {
        self.variant.as_deref().unwrap_or(DEFAULT_VARIANT)
    }
}

/// Variant used when no positional argument is given.
pub const DEFAULT_VARIANT: &str = "oss";

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}
