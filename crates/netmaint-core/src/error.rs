// User-facing errors from netmaint-core. Consumers never see reqwest
// failures or JSON parse errors directly; the `From<netmaint_rpc::Error>`
// impl translates transport-layer errors into domain variants. Note the
// conversion only runs for errors that propagate (session opens, run-spec
// validation); per-table failures are absorbed by `Fetched` upstream.

use thiserror::Error;

/// Error type shared by every core operation.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Sessions ─────────────────────────────────────────────────────
    #[error("cannot reach {host}: {reason}")]
    SessionFailed { host: String, reason: String },

    #[error("authentication rejected by {host}")]
    AuthRejected { host: String },

    // ── Run input ────────────────────────────────────────────────────
    #[error("run spec invalid: {message}")]
    InvalidRunSpec { message: String },

    #[error("circuit {label}: port {port} not reported by {host}")]
    UnknownPort {
        label: String,
        port: String,
        host: String,
    },

    // ── Credentials ──────────────────────────────────────────────────
    #[error("credential error: {message}")]
    Credentials { message: String },

    // ── Environment ──────────────────────────────────────────────────
    #[error("resolver unavailable: {message}")]
    ResolverUnavailable { message: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<netmaint_rpc::Error> for CoreError {
    fn from(err: netmaint_rpc::Error) -> Self {
        match err {
            netmaint_rpc::Error::Authentication { host } => CoreError::AuthRejected { host },
            netmaint_rpc::Error::Resolve { host, reason } => {
                CoreError::SessionFailed { host, reason }
            }
            netmaint_rpc::Error::Tls(msg) => CoreError::SessionFailed {
                host: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            netmaint_rpc::Error::Transport(e) => CoreError::SessionFailed {
                host: e
                    .url()
                    .and_then(|u| u.host_str().map(ToString::to_string))
                    .unwrap_or_default(),
                reason: e.to_string(),
            },
            netmaint_rpc::Error::InvalidUrl(e) => {
                CoreError::Internal(format!("bad gateway URL: {e}"))
            }
            netmaint_rpc::Error::Rpc { rpc, host, message } => CoreError::SessionFailed {
                host,
                reason: format!("{rpc}: {message}"),
            },
            netmaint_rpc::Error::Unsupported { family, rpc } => {
                CoreError::Internal(format!("{family} session asked for {rpc}"))
            }
            netmaint_rpc::Error::InvalidAddress { address } => CoreError::InvalidRunSpec {
                message: format!("not an address: {address}"),
            },
            netmaint_rpc::Error::Decode { rpc, message, .. } => {
                CoreError::Internal(format!("malformed {rpc} reply: {message}"))
            }
        }
    }
}
