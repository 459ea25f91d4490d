//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use netmaint_core::CoreError;

/// Exit codes, stable for scripting.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const SESSION: i32 = 4;
    pub const CONFIG: i32 = 5;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Sessions ─────────────────────────────────────────────────────

    #[error("Could not open a session to {host}")]
    #[diagnostic(
        code(netmaint::session_failed),
        help(
            "Check that the RPC gateway is reachable on the configured port.\n\
             Reason: {reason}\n\
             Self-signed gateway certificate? Pass --insecure (-k)."
        )
    )]
    SessionFailed { host: String, reason: String },

    #[error("Authentication rejected by {host}")]
    #[diagnostic(
        code(netmaint::auth_rejected),
        help(
            "The one-time code may have lapsed; re-running is usually enough.\n\
             If it keeps failing, verify the stored secrets: netmaint config check"
        )
    )]
    AuthRejected { host: String },

    // ── Credentials ──────────────────────────────────────────────────

    #[error("Secret '{account}' is not in the system keyring")]
    #[diagnostic(
        code(netmaint::missing_secret),
        help("Store it with: netmaint config set-secret {account}")
    )]
    MissingSecret { account: String },

    #[error("Keyring access failed for '{account}': {reason}")]
    #[diagnostic(
        code(netmaint::keyring),
        help("Check that a platform secret service is available and unlocked.")
    )]
    Keyring { account: String, reason: String },

    #[error("Credential error: {message}")]
    #[diagnostic(code(netmaint::credential))]
    Credential { message: String },

    // ── Run input ────────────────────────────────────────────────────

    #[error("Run spec rejected: {reason}")]
    #[diagnostic(
        code(netmaint::run_spec),
        help("Fix the run file and re-run. See the README for the schema.")
    )]
    RunSpec { reason: String },

    #[error("Circuit {label}: port {port} not reported by {host}")]
    #[diagnostic(
        code(netmaint::unknown_port),
        help("The device has no such interface. Check the port name in the run file.")
    )]
    UnknownPort {
        label: String,
        port: String,
        host: String,
    },

    // ── Spreadsheet bridge ───────────────────────────────────────────

    #[error("Spreadsheet push failed: {reason}")]
    #[diagnostic(code(netmaint::sheets_push))]
    SheetsPush { reason: String },

    #[error("No spreadsheet bridge URL configured")]
    #[diagnostic(
        code(netmaint::no_sheets_url),
        help(
            "Add it to the config file:\n\
             [sheets]\n\
             url = \"https://bridge.example.net/ingest\""
        )
    )]
    NoSheetsUrl,

    // ── Configuration ────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(code(netmaint::config))]
    Config(Box<figment::Error>),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(netmaint::json), help("Check the run file contents and try again."))]
    Json(#[from] serde_json::Error),

    // ── Internal ─────────────────────────────────────────────────────

    #[error("Internal error: {message}")]
    #[diagnostic(code(netmaint::internal))]
    Internal { message: String },
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
            Self::SessionFailed { .. } => exit_code::SESSION,
            Self::AuthRejected { .. } => exit_code::AUTH,
            Self::RunSpec { .. } | Self::UnknownPort { .. } | Self::Json(_) => exit_code::USAGE,
            Self::MissingSecret { .. }
            | Self::Keyring { .. }
            | Self::Credential { .. }
            | Self::NoSheetsUrl
            | Self::Config(_) => exit_code::CONFIG,
            Self::SheetsPush { .. } | Self::Io(_) | Self::Internal { .. } => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::SessionFailed { host, reason } => CliError::SessionFailed { host, reason },

            CoreError::AuthRejected { host } => CliError::AuthRejected { host },

            CoreError::InvalidRunSpec { message } => CliError::RunSpec { reason: message },

            CoreError::UnknownPort { label, port, host } => {
                CliError::UnknownPort { label, port, host }
            }

            CoreError::Credentials { message } => CliError::Credential { message },

            CoreError::ResolverUnavailable { message } => CliError::Internal {
                message: format!("resolver: {message}"),
            },

            CoreError::Internal(message) => CliError::Internal { message },
        }
    }
}
