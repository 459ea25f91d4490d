// Reverse DNS for circuit reports.
//
// Lookups are best-effort: a missing PTR record or an unreachable
// resolver produces a placeholder column, never a failed report.

use std::net::IpAddr;

use hickory_resolver::TokioAsyncResolver;
use tracing::debug;

use crate::error::CoreError;

/// Reverse resolver backed by the host's DNS configuration.
pub struct Resolver {
    inner: TokioAsyncResolver,
}

impl Resolver {
    /// Build a resolver from `/etc/resolv.conf` (or the platform
    /// equivalent).
    pub fn from_system() -> Result<Self, CoreError> {
        let inner = TokioAsyncResolver::tokio_from_system_conf().map_err(|e| {
            CoreError::ResolverUnavailable {
                message: e.to_string(),
            }
        })?;
        Ok(Self { inner })
    }

    /// PTR name for an address, without the trailing dot. `None` when the
    /// lookup fails for any reason.
    pub async fn reverse_name(&self, address: IpAddr) -> Option<String> {
        match self.inner.reverse_lookup(address).await {
            Ok(reply) => reply
                .iter()
                .next()
                .map(|ptr| ptr.0.to_utf8().trim_end_matches('.').to_string()),
            Err(e) => {
                debug!(%address, error = %e, "reverse lookup failed");
                None
            }
        }
    }
}

/// Report column for a resolved name.
pub(crate) fn dns_column(resolved: Option<String>, address: &str) -> String {
    resolved.unwrap_or_else(|| format!("no DNS record for {address}"))
}
