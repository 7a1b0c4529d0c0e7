//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use mwdns_config::ConfigError;
use mwdns_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(mwdns::connection_failed),
        help(
            "Check that the server is reachable: {reason}\n\
             Use --insecure (-k) for a local server with a self-signed certificate."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Backend ──────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(mwdns::rejected), help("The server refused the request (HTTP {status})."))]
    Rejected { status: u16, message: String },

    #[error("API error: {message}")]
    #[diagnostic(code(mwdns::api_error))]
    ApiError { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(mwdns::not_found),
        help("Run: mwdns {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Unknown record type: {type_name}")]
    #[diagnostic(code(mwdns::unknown_type), help("Run: mwdns schema to see supported types"))]
    UnknownType { type_name: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(mwdns::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No domain configured for profile '{profile}'")]
    #[diagnostic(
        code(mwdns::no_domain),
        help(
            "Pass --domain or --identity, set MWDNS_IDENTITY,\n\
             or add `domain` to the profile in {path}"
        )
    )]
    NoDomain { profile: String, path: String },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(mwdns::config))]
    Config(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(mwdns::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Validation { .. } | Self::UnknownType { .. } | Self::NoDomain { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownType { type_name } => CliError::UnknownType { type_name },

            CoreError::Encoding {
                field,
                value,
                reason,
            } => CliError::Validation {
                field,
                reason: format!("{value:?}: {reason}"),
            },

            CoreError::Rejected { status, message } => CliError::Rejected { status, message },

            CoreError::ConnectionFailed { url, reason } => {
                CliError::ConnectionFailed { url, reason }
            }

            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                list_command: format!("{entity_type}s list"),
                resource_type: entity_type,
                identifier,
            },

            CoreError::Api { message, .. } => CliError::ApiError { message },

            CoreError::NotInitialized => CliError::Validation {
                field: "domain".into(),
                reason: "no domain configured".into(),
            },

            CoreError::Config { message } => CliError::Config(message),

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoDomain { profile } => CliError::NoDomain {
                profile,
                path: mwdns_config::config_path().display().to_string(),
            },
            other => CliError::Config(other.to_string()),
        }
    }
}
