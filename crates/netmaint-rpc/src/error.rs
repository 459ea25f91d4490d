use thiserror::Error;

/// Top-level error type for the `netmaint-rpc` crate.
///
/// Covers every failure mode a device session can hit: name resolution,
/// transport, authentication, remote RPC execution, and reply decoding.
/// `netmaint-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Session setup ───────────────────────────────────────────────
    /// Hostname did not resolve to a usable address.
    #[error("cannot resolve {host}: {reason}")]
    Resolve { host: String, reason: String },

    /// Gateway rejected the credentials.
    #[error("authentication rejected by {host}")]
    Authentication { host: String },

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL construction error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── RPC execution ───────────────────────────────────────────────
    /// The gateway accepted the session but the RPC itself failed.
    ///
    /// This is the variant the availability wrapper downgrades to an
    /// empty table: the session is fine, one table is not.
    #[error("RPC {rpc} failed on {host}: {message}")]
    Rpc {
        rpc: String,
        host: String,
        message: String,
    },

    /// The RPC is not implemented for this device family.
    #[error("{family} sessions do not support {rpc}")]
    Unsupported {
        family: &'static str,
        rpc: &'static str,
    },

    /// An argument that must be an IP address was not one.
    #[error("invalid peer address: {address}")]
    InvalidAddress { address: String },

    // ── Data ────────────────────────────────────────────────────────
    /// Reply did not deserialize, with the raw body for debugging.
    #[error("malformed {rpc} reply: {message}")]
    Decode {
        rpc: String,
        message: String,
        body: String,
    },
}

impl Error {
    /// `true` when the failure is scoped to a single RPC and other tables
    /// on the same session are still worth fetching.
    pub fn is_table_scoped(&self) -> bool {
        matches!(
            self,
            Self::Rpc { .. } | Self::Unsupported { .. } | Self::InvalidAddress { .. } | Self::Decode { .. }
        )
    }

    /// `true` when re-authenticating with fresh credentials might help.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// `true` for transient transport conditions worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
