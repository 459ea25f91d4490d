// Transport configuration for device gateway clients.
//
// Every session, primary or helper, builds its reqwest::Client through this
// module so TLS handling and the collection timeout stay uniform.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::Error;

/// Fixed per-request timeout for collection RPCs.
///
/// Full-table dumps on loaded edge routers can take minutes, so the window
/// is wide and deliberately not configurable per run or per call.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(300);

/// TLS verification mode for the gateway connection.
#[derive(Debug, Clone)]
pub enum TlsMode {
    /// Use the system certificate store.
    SystemDefaults,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (lab gateways with self-signed certs).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building gateway clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Gateway TCP port.
    pub port: u16,
    /// Speak plain HTTP instead of HTTPS (lab and test gateways only).
    pub plain_http: bool,
    pub tls: TlsMode,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            port: 3443,
            plain_http: false,
            tls: TlsMode::SystemDefaults,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(SESSION_TIMEOUT)
            .user_agent(concat!("netmaint/", env!("CARGO_PKG_VERSION")));

        match &self.tls {
            TlsMode::SystemDefaults => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// URL scheme implied by the plain-HTTP toggle.
    pub fn scheme(&self) -> &'static str {
        if self.plain_http { "http" } else { "https" }
    }

    /// Gateway base URL for a resolved device address.
    pub fn base_url(&self, address: IpAddr) -> Result<Url, Error> {
        let authority = match address {
            IpAddr::V4(v4) => format!("{v4}:{}", self.port),
            IpAddr::V6(v6) => format!("[{v6}]:{}", self.port),
        };
        Ok(Url::parse(&format!("{}://{authority}/", self.scheme()))?)
    }
}
