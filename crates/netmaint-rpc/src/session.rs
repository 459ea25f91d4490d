// Device session lifecycle and RPC dispatch.
//
// A `DeviceSession` wraps a reqwest::Client pointed at one router's
// management gateway. Getters are grouped here as inherent methods and
// dispatch to the per-family modules; every getter returns `Fetched` so a
// single failing table degrades the report instead of aborting it.

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::time::Instant;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::net::lookup_host;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::Error;
use crate::tables::{
    ArpEntry, BgpNeighborDetail, BgpNeighborSummary, Facts, InterfaceCounters, InterfaceIps,
    InterfaceState, IsisInterface, NdEntry, OpticsModule, RouteRecord,
};
use crate::transport::TransportConfig;
use crate::{iosxr, junos};

/// Router OS family a session speaks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceFamily {
    Junos,
    IosXr,
}

impl DeviceFamily {
    /// `true` when the device can resolve arbitrary destinations through
    /// its own RIB, so circuit route lookups never need a helper router.
    pub fn resolves_routes_locally(self) -> bool {
        matches!(self, Self::Junos)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Junos => "junos",
            Self::IosXr => "iosxr",
        }
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials for one gateway session.
///
/// `password` already carries the one-time suffix; `minted_at` records
/// when that code was generated so callers can pace a second mint.
#[derive(Debug, Clone)]
pub struct SessionAuth {
    pub username: String,
    pub password: SecretString,
    pub minted_at: Instant,
}

/// A resolved session target: hostname plus the address it resolved to.
#[derive(Debug, Clone)]
pub struct SessionTarget {
    pub hostname: String,
    pub address: IpAddr,
    pub family: DeviceFamily,
}

impl SessionTarget {
    /// Resolve `hostname` (name or address literal) for the given family.
    ///
    /// Prefers an IPv4 answer when the name has both; management access
    /// in the fleet is numbered v4-first.
    pub async fn resolve(hostname: &str, family: DeviceFamily) -> Result<Self, Error> {
        if let Ok(address) = hostname.parse::<IpAddr>() {
            return Ok(Self {
                hostname: hostname.to_string(),
                address,
                family,
            });
        }

        let addrs: Vec<IpAddr> = lookup_host((hostname, 0))
            .await
            .map_err(|e| Error::Resolve {
                host: hostname.to_string(),
                reason: e.to_string(),
            })?
            .map(|sa| sa.ip())
            .collect();

        let address = addrs
            .iter()
            .copied()
            .find(IpAddr::is_ipv4)
            .or_else(|| addrs.first().copied())
            .ok_or_else(|| Error::Resolve {
                host: hostname.to_string(),
                reason: "no addresses returned".into(),
            })?;

        Ok(Self {
            hostname: hostname.to_string(),
            address,
            family,
        })
    }
}

/// Availability wrapper for one fetched table.
///
/// Collection keeps going when a single RPC fails; the orchestration
/// layer decides whether an unavailable table degrades to empty or
/// surfaces.
#[derive(Debug)]
pub enum Fetched<T> {
    Available(T),
    Unavailable(Error),
}

impl<T> Fetched<T> {
    /// Wrap a getter result, logging the failure that produced
    /// `Unavailable`.
    fn capture(host: &str, table: &'static str, result: Result<T, Error>) -> Self {
        match result {
            Ok(value) => Self::Available(value),
            Err(err) => {
                warn!(host, table, error = %err, "table unavailable");
                Self::Unavailable(err)
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// The value, if the fetch succeeded.
    pub fn available(self) -> Option<T> {
        match self {
            Self::Available(v) => Some(v),
            Self::Unavailable(_) => None,
        }
    }

    /// The error, if the fetch failed.
    pub fn unavailable(&self) -> Option<&Error> {
        match self {
            Self::Available(_) => None,
            Self::Unavailable(e) => Some(e),
        }
    }
}

impl<T: Default> Fetched<T> {
    /// The value, or the type's empty form when the table was unavailable.
    pub fn or_empty(self) -> T {
        match self {
            Self::Available(v) => v,
            Self::Unavailable(_) => T::default(),
        }
    }
}

/// An authenticated RPC session with one router's management gateway.
#[derive(Debug)]
pub struct DeviceSession {
    http: reqwest::Client,
    base_url: Url,
    hostname: String,
    family: DeviceFamily,
    username: String,
    password: SecretString,
    auth_minted_at: Instant,
    opened_at: Instant,
}

impl DeviceSession {
    /// Open a session against a resolved target.
    ///
    /// Builds the client, then probes the gateway with the facts RPC so
    /// auth and reachability problems surface here, not mid-collection.
    pub async fn open(
        target: SessionTarget,
        auth: &SessionAuth,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let base_url = transport.base_url(target.address)?;
        Self::open_url(base_url, target.hostname, target.family, auth, transport).await
    }

    /// Open a session against an explicit gateway URL.
    ///
    /// Lab gateways and tests sit on ports and schemes `resolve` would
    /// not guess; everything after URL construction is identical to
    /// `open`.
    pub async fn open_url(
        base_url: Url,
        hostname: impl Into<String>,
        family: DeviceFamily,
        auth: &SessionAuth,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let hostname = hostname.into();
        let http = transport.build_client()?;
        let session = Self {
            http,
            base_url,
            hostname,
            family,
            username: auth.username.clone(),
            password: auth.password.clone(),
            auth_minted_at: auth.minted_at,
            opened_at: Instant::now(),
        };
        session.probe().await?;
        info!(host = %session.hostname, family = %session.family, "session open");
        Ok(session)
    }

    /// Cheap RPC to verify reachability and credentials.
    async fn probe(&self) -> Result<(), Error> {
        let _: serde_json::Value = self.rpc_call("get-facts", None).await?;
        Ok(())
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn family(&self) -> DeviceFamily {
        self.family
    }

    /// When the one-time credential used by this session was minted.
    pub fn auth_minted_at(&self) -> Instant {
        self.auth_minted_at
    }

    /// Close the session.
    ///
    /// Consuming `self` makes double-close unrepresentable; the
    /// underlying connection pool is torn down on drop.
    pub fn close(self) {
        info!(
            host = %self.hostname,
            open_for = ?self.opened_at.elapsed(),
            "session closed"
        );
    }

    // ── RPC plumbing ─────────────────────────────────────────────────

    /// POST `/rpc/{name}` with an optional JSON argument object.
    pub(crate) async fn rpc_call<T: DeserializeOwned>(
        &self,
        rpc: &str,
        args: Option<serde_json::Value>,
    ) -> Result<T, Error> {
        let url = self.base_url.join(&format!("rpc/{rpc}"))?;
        debug!(host = %self.hostname, %rpc, "POST {url}");

        let mut req = self
            .http
            .post(url)
            .basic_auth(&self.username, Some(self.password.expose_secret()));
        if let Some(args) = &args {
            req = req.json(args);
        }
        let resp = req.send().await.map_err(Error::Transport)?;
        self.parse_reply(rpc, resp).await
    }

    /// Decode a gateway reply, mapping HTTP status onto the error
    /// taxonomy.
    ///
    /// A 200 whose body is an `rpc-error` envelope is a remote failure,
    /// not a decode failure; gateways report command-level errors that
    /// way.
    async fn parse_reply<T: DeserializeOwned>(
        &self,
        rpc: &str,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                host: self.hostname.clone(),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(Error::Rpc {
                rpc: rpc.to_string(),
                host: self.hostname.clone(),
                message: format!("HTTP {status}: {}", body.trim()),
            });
        }

        let value: serde_json::Value = serde_json::from_str(&body).map_err(|e| Error::Decode {
            rpc: rpc.to_string(),
            message: e.to_string(),
            body: body.clone(),
        })?;

        if let Some(envelope) = value.get("rpc-error") {
            return Err(Error::Rpc {
                rpc: rpc.to_string(),
                host: self.hostname.clone(),
                message: rpc_error_message(envelope),
            });
        }

        serde_json::from_value(value).map_err(|e| Error::Decode {
            rpc: rpc.to_string(),
            message: e.to_string(),
            body,
        })
    }

    // ── Baseline tables ──────────────────────────────────────────────

    /// Chassis facts: model, serial, software, uptime.
    pub async fn get_facts(&self) -> Fetched<Facts> {
        Fetched::capture(&self.hostname, "facts", self.rpc_call("get-facts", None).await)
    }

    pub async fn get_interfaces(&self) -> Fetched<BTreeMap<String, InterfaceState>> {
        Fetched::capture(
            &self.hostname,
            "interfaces",
            self.rpc_call("get-interfaces", None).await,
        )
    }

    pub async fn get_interfaces_ip(&self) -> Fetched<BTreeMap<String, InterfaceIps>> {
        Fetched::capture(
            &self.hostname,
            "interfaces-ip",
            self.rpc_call("get-interfaces-ip", None).await,
        )
    }

    pub async fn get_interfaces_counters(&self) -> Fetched<BTreeMap<String, InterfaceCounters>> {
        Fetched::capture(
            &self.hostname,
            "interfaces-counters",
            self.rpc_call("get-interfaces-counters", None).await,
        )
    }

    pub async fn get_optics_inventory(&self) -> Fetched<BTreeMap<String, OpticsModule>> {
        Fetched::capture(
            &self.hostname,
            "optics",
            self.rpc_call("get-optics-inventory", None).await,
        )
    }

    /// Aggregated BGP neighbor table (the family-independent shape).
    pub async fn get_bgp_neighbors(&self) -> Fetched<BTreeMap<String, BgpNeighborSummary>> {
        Fetched::capture(
            &self.hostname,
            "bgp-neighbors",
            self.rpc_call("get-bgp-neighbors", None).await,
        )
    }

    // ── Vendor extension tables ──────────────────────────────────────

    /// ISIS adjacencies joined with per-interface metrics.
    pub async fn get_isis_interfaces(&self) -> Fetched<BTreeMap<String, IsisInterface>> {
        let result = match self.family {
            DeviceFamily::Junos => junos::isis_interfaces(self).await,
            DeviceFamily::IosXr => iosxr::isis_interfaces(self).await,
        };
        Fetched::capture(&self.hostname, "isis", result)
    }

    /// Which interfaces run MPLS.
    pub async fn get_mpls_interfaces(&self) -> Fetched<BTreeMap<String, bool>> {
        let result = match self.family {
            DeviceFamily::Junos => junos::mpls_interfaces(self).await,
            DeviceFamily::IosXr => iosxr::mpls_interfaces(self).await,
        };
        Fetched::capture(&self.hostname, "mpls", result)
    }

    /// MSDP peer addresses.
    pub async fn get_msdp_neighbors(&self) -> Fetched<Vec<String>> {
        let result = match self.family {
            DeviceFamily::Junos => junos::msdp_neighbors(self).await,
            DeviceFamily::IosXr => iosxr::msdp_neighbors(self).await,
        };
        Fetched::capture(&self.hostname, "msdp", result)
    }

    /// Interfaces with at least one PIM neighbor.
    pub async fn get_pim_neighbors(&self) -> Fetched<Vec<String>> {
        let result = match self.family {
            DeviceFamily::Junos => junos::pim_neighbors(self).await,
            DeviceFamily::IosXr => iosxr::pim_neighbors(self).await,
        };
        Fetched::capture(&self.hostname, "pim", result)
    }

    /// IPv4 next hop per interface, from the ARP table.
    pub async fn get_arp_table(&self) -> Fetched<BTreeMap<String, ArpEntry>> {
        let result = match self.family {
            DeviceFamily::Junos => junos::arp_table(self).await,
            DeviceFamily::IosXr => iosxr::arp_table(self).await,
        };
        Fetched::capture(&self.hostname, "arp", result)
    }

    /// IPv6 next hop per interface, from the neighbor-discovery table.
    pub async fn get_nd_table(&self) -> Fetched<BTreeMap<String, NdEntry>> {
        let result = match self.family {
            DeviceFamily::Junos => junos::nd_table(self).await,
            DeviceFamily::IosXr => iosxr::nd_table(self).await,
        };
        Fetched::capture(&self.hostname, "nd", result)
    }

    /// Neighbor detail with per-routing-table prefix counters.
    ///
    /// Junos only: other families report the aggregated shape through
    /// `get_bgp_neighbors` and the caller adapts it.
    pub async fn get_bgp_neighbors_detail(&self) -> Fetched<BTreeMap<String, BgpNeighborDetail>> {
        let result = match self.family {
            DeviceFamily::Junos => junos::bgp_neighbors_detail(self).await,
            DeviceFamily::IosXr => Err(Error::Unsupported {
                family: self.family.as_str(),
                rpc: "bgp-neighbors-detail",
            }),
        };
        Fetched::capture(&self.hostname, "bgp-neighbors-detail", result)
    }

    /// Routes received from one BGP neighbor, fully attributed.
    ///
    /// Junos resolves the receive table locally. For other families use
    /// `get_bgp_neighbor_prefixes` and resolve elsewhere.
    pub async fn get_bgp_neighbor_routes(
        &self,
        peer: &str,
    ) -> Fetched<BTreeMap<String, RouteRecord>> {
        let result = match self.family {
            DeviceFamily::Junos => junos::bgp_neighbor_routes(self, peer).await,
            DeviceFamily::IosXr => Err(Error::Unsupported {
                family: self.family.as_str(),
                rpc: "bgp-neighbor-routes",
            }),
        };
        Fetched::capture(&self.hostname, "bgp-neighbor-routes", result)
    }

    /// Bare prefixes received from one BGP neighbor.
    pub async fn get_bgp_neighbor_prefixes(&self, peer: &str) -> Fetched<Vec<String>> {
        let result = match self.family {
            DeviceFamily::Junos => junos::bgp_neighbor_routes(self, peer)
                .await
                .map(|routes| routes.into_keys().collect()),
            DeviceFamily::IosXr => iosxr::bgp_neighbor_prefixes(self, peer).await,
        };
        Fetched::capture(&self.hostname, "bgp-neighbor-prefixes", result)
    }

    /// Resolve each destination through the device RIB.
    ///
    /// Issues one RPC per destination; an empty set issues none. Only
    /// meaningful on families that resolve routes locally.
    pub async fn get_route_to(
        &self,
        destinations: &[String],
    ) -> Fetched<BTreeMap<String, RouteRecord>> {
        let result = match self.family {
            DeviceFamily::Junos => junos::route_to(self, destinations).await,
            DeviceFamily::IosXr => Err(Error::Unsupported {
                family: self.family.as_str(),
                rpc: "route-to",
            }),
        };
        Fetched::capture(&self.hostname, "route-to", result)
    }
}

/// Message out of an `rpc-error` envelope, which is a single error
/// object or a list of them depending on the gateway.
fn rpc_error_message(envelope: &serde_json::Value) -> String {
    let first = match envelope {
        serde_json::Value::Array(errors) => errors.first().unwrap_or(envelope),
        other => other,
    };
    first
        .get("error-message")
        .and_then(serde_json::Value::as_str)
        .map_or_else(|| first.to_string(), |m| m.trim().to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn family_serde_names_are_lowercase() {
        let junos: DeviceFamily = serde_json::from_str("\"junos\"").unwrap();
        let iosxr: DeviceFamily = serde_json::from_str("\"iosxr\"").unwrap();
        assert_eq!(junos, DeviceFamily::Junos);
        assert_eq!(iosxr, DeviceFamily::IosXr);
    }

    #[test]
    fn only_junos_resolves_routes_locally() {
        assert!(DeviceFamily::Junos.resolves_routes_locally());
        assert!(!DeviceFamily::IosXr.resolves_routes_locally());
    }

    #[tokio::test]
    async fn resolve_accepts_address_literals() {
        let target = SessionTarget::resolve("192.0.2.7", DeviceFamily::Junos)
            .await
            .unwrap();
        assert_eq!(target.address, "192.0.2.7".parse::<IpAddr>().unwrap());
        assert_eq!(target.hostname, "192.0.2.7");

        let v6 = SessionTarget::resolve("2001:db8::1", DeviceFamily::IosXr)
            .await
            .unwrap();
        assert!(v6.address.is_ipv6());
    }

    #[test]
    fn fetched_or_empty_degrades_to_default() {
        let unavailable: Fetched<BTreeMap<String, InterfaceState>> =
            Fetched::Unavailable(Error::Tls("boom".into()));
        assert!(!unavailable.is_available());
        assert!(unavailable.or_empty().is_empty());
    }

    #[test]
    fn rpc_error_message_reads_both_envelope_forms() {
        let single = serde_json::json!({"error-message": " syntax error "});
        assert_eq!(rpc_error_message(&single), "syntax error");

        let list = serde_json::json!([
            {"error-severity": "error", "error-message": "daemon not running"},
            {"error-message": "second"}
        ]);
        assert_eq!(rpc_error_message(&list), "daemon not running");

        let opaque = serde_json::json!({"error-code": 17});
        assert_eq!(rpc_error_message(&opaque), r#"{"error-code":17}"#);
    }
}
