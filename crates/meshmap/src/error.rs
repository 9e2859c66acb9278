//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use meshmap_config::ConfigError;
use meshmap_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const DATA: i32 = 65;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Captures ─────────────────────────────────────────────────────

    #[error("Capture file '{path}' not found")]
    #[diagnostic(
        code(meshmap::capture_not_found),
        help("Pass a JSONL capture path, or '-' to read from stdin.")
    )]
    CaptureNotFound { path: String },

    #[error("Invalid packet on line {line} of {path}: {reason}")]
    #[diagnostic(
        code(meshmap::bad_packet),
        help(
            "Each line must be one JSON mesh event with \"kind\" and \"payload\" keys.\n\
             Blank lines and lines starting with '#' are skipped."
        )
    )]
    BadPacket {
        path: String,
        line: usize,
        reason: String,
    },

    // ── Dispatcher ───────────────────────────────────────────────────

    #[error("Packet dispatcher failed: {message}")]
    #[diagnostic(
        code(meshmap::dispatcher),
        help("Re-run with -vv to see per-channel dispatcher logs.")
    )]
    Dispatcher { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(meshmap::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Configuration file already exists at {path}")]
    #[diagnostic(
        code(meshmap::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(
        code(meshmap::config),
        help("Check the config file syntax, or run: meshmap config show")
    )]
    Config(Box<figment::Error>),

    #[error("Failed to serialize config: {0}")]
    #[diagnostic(code(meshmap::config_serialize))]
    Toml(#[from] toml::ser::Error),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to encode output: {0}")]
    #[diagnostic(code(meshmap::encode))]
    Encode(String),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CaptureNotFound { .. } => exit_code::NOT_FOUND,
            Self::BadPacket { .. } => exit_code::DATA,
            Self::Validation { .. } | Self::ConfigExists { .. } | Self::Config(_) => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── Upstream error mapping ───────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidNodeNum { input, reason } => CliError::Validation {
                field: "node".into(),
                reason: format!("'{input}': {reason}"),
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            err @ (CoreError::DispatcherStopped { .. } | CoreError::ChannelFull { .. }) => {
                CliError::Dispatcher {
                    message: err.to_string(),
                }
            }
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Serialization(e) => CliError::Toml(e),
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}

impl From<tokio::task::JoinError> for CliError {
    fn from(err: tokio::task::JoinError) -> Self {
        CliError::Dispatcher {
            message: err.to_string(),
        }
    }
}
