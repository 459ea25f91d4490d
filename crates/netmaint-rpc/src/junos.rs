// Junos extension getters.
//
// The gateway forwards these straight to the Junos XML-RPC engine, so the
// replies keep Junos's envelope-heavy shape: a single `*-information`
// wrapper, kebab-case members, numbers as strings, and the odd field that
// is a bare value or a list depending on cardinality. Raw structs stay
// private; adapters return the shared table types.

use std::collections::BTreeMap;
use std::net::IpAddr;

use serde::Deserialize;
use tracing::warn;

use crate::error::Error;
use crate::session::DeviceSession;
use crate::tables::{
    normalize_mac, route_key, strip_port_suffix, trim_as_path, ArpEntry, BgpNeighborDetail,
    IsisInterface, NdEntry, OneOrMany, RouteCounts, RouteRecord,
};

/// Junos reports most counters as decimal strings; anything that does not
/// parse counts as zero.
fn count(raw: &str) -> i64 {
    raw.trim().parse().unwrap_or(0)
}

// ── ISIS ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct IsisAdjacencyReply {
    #[serde(rename = "isis-adjacency-information")]
    info: IsisAdjacencyInfo,
}

#[derive(Debug, Default, Deserialize)]
struct IsisAdjacencyInfo {
    #[serde(rename = "isis-adjacency", default)]
    adjacencies: Vec<RawIsisAdjacency>,
}

#[derive(Debug, Deserialize)]
struct RawIsisAdjacency {
    #[serde(rename = "interface-name")]
    interface: String,
    #[serde(rename = "system-name")]
    system: String,
    #[serde(rename = "adjacency-state")]
    state: String,
    #[serde(rename = "next-hop-address", default)]
    next_hop: String,
    #[serde(rename = "ipv6-capable", default)]
    ipv6_capable: bool,
}

#[derive(Debug, Deserialize)]
struct IsisInterfaceReply {
    #[serde(rename = "isis-interface-information")]
    info: IsisInterfaceInfo,
}

#[derive(Debug, Default, Deserialize)]
struct IsisInterfaceInfo {
    #[serde(rename = "isis-interface", default)]
    interfaces: Vec<RawIsisInterface>,
}

#[derive(Debug, Deserialize)]
struct RawIsisInterface {
    #[serde(rename = "interface-name")]
    interface: String,
    // Metric arrives as a decimal string.
    #[serde(default)]
    metric: String,
}

/// Join the adjacency and interface tables on interface name.
///
/// An adjacency whose interface is missing from the interface table has
/// no metric to join against; it is skipped with a warning rather than
/// reported with invented state.
pub(crate) async fn isis_interfaces(
    session: &DeviceSession,
) -> Result<BTreeMap<String, IsisInterface>, Error> {
    let adjacency: IsisAdjacencyReply = session
        .rpc_call("get-isis-adjacency-information", None)
        .await?;
    let interfaces: IsisInterfaceReply = session
        .rpc_call("get-isis-interface-information", None)
        .await?;

    let metrics: BTreeMap<String, i64> = interfaces
        .info
        .interfaces
        .into_iter()
        .map(|i| (i.interface, count(&i.metric)))
        .collect();

    let mut table = BTreeMap::new();
    for adj in adjacency.info.adjacencies {
        let Some(metric) = metrics.get(&adj.interface).copied() else {
            warn!(
                interface = %adj.interface,
                "ISIS adjacency without an interface entry, skipping"
            );
            continue;
        };
        table.insert(
            adj.interface,
            IsisInterface {
                neighbor: adj.system,
                state: adj.state.eq_ignore_ascii_case("up"),
                next_hop: adj.next_hop,
                ipv6: adj.ipv6_capable,
                metric,
            },
        );
    }
    Ok(table)
}

// ── MPLS ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MplsInterfaceReply {
    #[serde(rename = "mpls-interface-information")]
    info: MplsInterfaceInfo,
}

#[derive(Debug, Default, Deserialize)]
struct MplsInterfaceInfo {
    #[serde(rename = "mpls-interface", default)]
    interfaces: Vec<RawMplsInterface>,
}

#[derive(Debug, Deserialize)]
struct RawMplsInterface {
    #[serde(rename = "interface-name")]
    interface: String,
    #[serde(rename = "mpls-interface-state", default)]
    state: String,
}

pub(crate) async fn mpls_interfaces(
    session: &DeviceSession,
) -> Result<BTreeMap<String, bool>, Error> {
    let reply: MplsInterfaceReply = session
        .rpc_call("get-mpls-interface-information", None)
        .await?;
    Ok(reply
        .info
        .interfaces
        .into_iter()
        .map(|i| (i.interface, i.state.eq_ignore_ascii_case("up")))
        .collect())
}

// ── MSDP / PIM ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MsdpReply {
    #[serde(rename = "msdp-peer-information")]
    info: MsdpInfo,
}

#[derive(Debug, Default, Deserialize)]
struct MsdpInfo {
    #[serde(rename = "msdp-peer", default)]
    peers: Vec<RawMsdpPeer>,
}

#[derive(Debug, Deserialize)]
struct RawMsdpPeer {
    #[serde(rename = "msdp-peer-address")]
    address: String,
}

pub(crate) async fn msdp_neighbors(session: &DeviceSession) -> Result<Vec<String>, Error> {
    let reply: MsdpReply = session.rpc_call("get-msdp-information", None).await?;
    Ok(reply.info.peers.into_iter().map(|p| p.address).collect())
}

#[derive(Debug, Deserialize)]
struct PimReply {
    #[serde(rename = "pim-neighbors-information")]
    info: PimInfo,
}

#[derive(Debug, Default, Deserialize)]
struct PimInfo {
    #[serde(rename = "pim-neighbor", default)]
    neighbors: Vec<RawPimNeighbor>,
}

#[derive(Debug, Deserialize)]
struct RawPimNeighbor {
    #[serde(rename = "pim-interface-name")]
    interface: String,
}

pub(crate) async fn pim_neighbors(session: &DeviceSession) -> Result<Vec<String>, Error> {
    let reply: PimReply = session
        .rpc_call("get-pim-neighbors-information", None)
        .await?;
    Ok(reply
        .info
        .neighbors
        .into_iter()
        .map(|n| n.interface)
        .collect())
}

// ── ARP / ND ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ArpTableReply {
    #[serde(rename = "arp-table-information")]
    info: ArpTableInfo,
}

#[derive(Debug, Default, Deserialize)]
struct ArpTableInfo {
    #[serde(rename = "arp-table-entry", default)]
    entries: Vec<RawArpEntry>,
}

#[derive(Debug, Deserialize)]
struct RawArpEntry {
    #[serde(rename = "interface-name")]
    interface: String,
    #[serde(rename = "ip-address")]
    address: String,
    #[serde(rename = "mac-address", default)]
    mac: String,
}

pub(crate) async fn arp_table(
    session: &DeviceSession,
) -> Result<BTreeMap<String, ArpEntry>, Error> {
    let reply: ArpTableReply = session
        .rpc_call("get-arp-table-information", None)
        .await?;
    Ok(reply
        .info
        .entries
        .into_iter()
        .map(|e| {
            let mac = normalize_mac(&e.mac);
            if mac.is_none() {
                warn!(interface = %e.interface, raw = %e.mac, "unparseable ARP MAC");
            }
            (
                e.interface,
                ArpEntry {
                    arp_nh: e.address,
                    arp_nh_mac: mac,
                },
            )
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct NdTableReply {
    #[serde(rename = "ipv6-nd-information")]
    info: NdTableInfo,
}

#[derive(Debug, Default, Deserialize)]
struct NdTableInfo {
    #[serde(rename = "ipv6-nd-entry", default)]
    entries: Vec<RawNdEntry>,
}

#[derive(Debug, Deserialize)]
struct RawNdEntry {
    #[serde(rename = "interface-name")]
    interface: String,
    #[serde(rename = "ipv6-nd-address")]
    address: String,
    #[serde(rename = "link-layer-address", default)]
    mac: String,
}

pub(crate) async fn nd_table(session: &DeviceSession) -> Result<BTreeMap<String, NdEntry>, Error> {
    let reply: NdTableReply = session.rpc_call("get-ipv6-nd-information", None).await?;
    Ok(reply
        .info
        .entries
        .into_iter()
        .map(|e| {
            let mac = normalize_mac(&e.mac);
            if mac.is_none() {
                warn!(interface = %e.interface, raw = %e.mac, "unparseable ND MAC");
            }
            (
                e.interface,
                NdEntry {
                    nd_nh: e.address,
                    nd_nh_mac: mac,
                },
            )
        })
        .collect())
}

// ── BGP neighbor detail ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct BgpNeighborReply {
    #[serde(rename = "bgp-information")]
    info: BgpInfo,
}

#[derive(Debug, Default, Deserialize)]
struct BgpInfo {
    #[serde(rename = "bgp-peer", default)]
    peers: Vec<RawBgpPeer>,
}

/// One `bgp-peer` element. Junos splits the same identity fields between
/// the peer element and a nested header depending on session state, so
/// both locations are modeled and reconciled in the adapter.
#[derive(Debug, Deserialize)]
struct RawBgpPeer {
    #[serde(rename = "peer-address", default)]
    peer_address: Option<String>,
    #[serde(rename = "local-address", default)]
    local_address: Option<String>,
    #[serde(rename = "local-as", default)]
    local_as: Option<String>,
    #[serde(rename = "peer-as", default)]
    peer_as: Option<String>,
    #[serde(rename = "bgp-peer-header", default)]
    header: Option<RawBgpPeerHeader>,
    #[serde(rename = "peer-state", default)]
    state: String,
    #[serde(rename = "peer-id", default)]
    peer_id: String,
    #[serde(rename = "peer-fwd-rti", default)]
    routing_table: String,
    #[serde(rename = "bgp-option-information", default)]
    options: Option<RawBgpOptions>,
    #[serde(rename = "bgp-rib", default)]
    ribs: Vec<RawBgpRib>,
}

#[derive(Debug, Default, Deserialize)]
struct RawBgpPeerHeader {
    #[serde(rename = "peer-address", default)]
    peer_address: Option<String>,
    #[serde(rename = "local-address", default)]
    local_address: Option<String>,
    #[serde(rename = "local-as", default)]
    local_as: Option<String>,
    #[serde(rename = "peer-as", default)]
    peer_as: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawBgpOptions {
    #[serde(rename = "import-policy", default)]
    import_policy: String,
    #[serde(rename = "export-policy", default)]
    export_policy: String,
}

#[derive(Debug, Deserialize)]
struct RawBgpRib {
    name: String,
    #[serde(rename = "received-prefix-count", default)]
    received: String,
    #[serde(rename = "accepted-prefix-count", default)]
    accepted: String,
    #[serde(rename = "active-prefix-count", default)]
    active: String,
    #[serde(rename = "advertised-prefix-count", default)]
    advertised: String,
}

/// Adapt the raw peer list into reconciled detail records.
///
/// Every neighbor ends up with a complete record even when the reply was
/// partial: serde defaults cover missing members. Session addresses lose
/// their `+port` suffix, and when an identity field appears both on the
/// peer and in its header, the peer-level one wins.
pub(crate) async fn bgp_neighbors_detail(
    session: &DeviceSession,
) -> Result<BTreeMap<String, BgpNeighborDetail>, Error> {
    let reply: BgpNeighborReply = session
        .rpc_call("get-bgp-neighbor-information", None)
        .await?;

    let mut table = BTreeMap::new();
    for peer in reply.info.peers {
        let header = peer.header.unwrap_or_default();

        let Some(peer_address) = peer.peer_address.or(header.peer_address) else {
            warn!(host = %session.hostname(), "bgp-peer element without address, skipped");
            continue;
        };
        let key = strip_port_suffix(&peer_address);

        let (import_policy, export_policy) = match peer.options {
            Some(o) => (o.import_policy, o.export_policy),
            None => (String::new(), String::new()),
        };

        let mut tables = BTreeMap::new();
        for rib in peer.ribs {
            let counts = RouteCounts {
                received: count(&rib.received),
                accepted: count(&rib.accepted),
                active: count(&rib.active),
                advertised: count(&rib.advertised),
            };
            tables.insert(rib.name, counts);
        }

        table.insert(
            key,
            BgpNeighborDetail {
                up: peer.state.eq_ignore_ascii_case("established"),
                local_as: peer.local_as.or(header.local_as).as_deref().map_or(0, count),
                remote_as: peer.peer_as.or(header.peer_as).as_deref().map_or(0, count),
                router_id: peer.peer_id,
                local_address: strip_port_suffix(
                    &peer.local_address.or(header.local_address).unwrap_or_default(),
                ),
                routing_table: peer.routing_table,
                import_policy,
                export_policy,
                tables,
            },
        );
    }
    Ok(table)
}

// ── Routes ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RouteInformationReply {
    #[serde(rename = "route-information")]
    info: RouteInformation,
}

#[derive(Debug, Default, Deserialize)]
struct RouteInformation {
    #[serde(rename = "route-table", default)]
    tables: Vec<RawRouteTable>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRouteTable {
    #[serde(rename = "rt", default)]
    routes: Vec<RawRoute>,
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    #[serde(rename = "rt-destination")]
    destination: String,
    #[serde(rename = "rt-prefix-length", default)]
    prefix_length: Option<u8>,
    #[serde(rename = "rt-entry", default)]
    entry: RawRouteEntry,
}

#[derive(Debug, Default, Deserialize)]
struct RawRouteEntry {
    #[serde(rename = "nh", default)]
    next_hops: Vec<RawNextHop>,
    #[serde(rename = "local-preference", default)]
    local_preference: Option<String>,
    #[serde(rename = "as-path", default)]
    as_path: Option<String>,
    #[serde(default)]
    med: Option<String>,
    #[serde(default)]
    communities: Option<RawCommunities>,
}

#[derive(Debug, Deserialize)]
struct RawNextHop {
    #[serde(default)]
    to: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCommunities {
    #[serde(default)]
    community: Option<OneOrMany>,
}

fn format_route(table: &mut BTreeMap<String, RouteRecord>, route: RawRoute) {
    let key = route_key(&route.destination, route.prefix_length);
    let entry = route.entry;
    let record = RouteRecord {
        next_hop: entry.next_hops.into_iter().find_map(|nh| nh.to),
        local_preference: entry
            .local_preference
            .as_deref()
            .and_then(|v| v.trim().parse().ok()),
        as_path: entry.as_path.as_deref().map(trim_as_path),
        med: entry.med.as_deref().and_then(|v| v.trim().parse().ok()),
        communities: entry.communities.and_then(|c| c.community).map(Vec::from),
    };
    table.insert(key, record);
}

/// Routes received from `peer`, read from the table matching the peer's
/// address family.
pub(crate) async fn bgp_neighbor_routes(
    session: &DeviceSession,
    peer: &str,
) -> Result<BTreeMap<String, RouteRecord>, Error> {
    let bare = strip_port_suffix(peer);
    let addr: IpAddr = bare.parse().map_err(|_| Error::InvalidAddress {
        address: peer.to_string(),
    })?;
    let table_name = if addr.is_ipv4() { "inet.0" } else { "inet6.0" };

    let reply: RouteInformationReply = session
        .rpc_call(
            "get-route-information",
            Some(serde_json::json!({
                "receive-protocol-name": "bgp",
                "peer": bare,
                "table": table_name,
                "extensive": true,
            })),
        )
        .await?;

    let mut routes = BTreeMap::new();
    for rt_table in reply.info.tables {
        for route in rt_table.routes {
            format_route(&mut routes, route);
        }
    }
    Ok(routes)
}

/// Resolve each destination through the RIB, one RPC per destination.
///
/// An empty destination set issues no RPC at all. Destinations that do
/// not parse as an address or prefix are skipped with a warning.
pub(crate) async fn route_to(
    session: &DeviceSession,
    destinations: &[String],
) -> Result<BTreeMap<String, RouteRecord>, Error> {
    let mut routes = BTreeMap::new();
    for destination in destinations {
        let Some(table_name) = destination_table(destination) else {
            warn!(destination = %destination, "skipping unparseable destination");
            continue;
        };
        let reply: RouteInformationReply = session
            .rpc_call(
                "get-route-information",
                Some(serde_json::json!({
                    "destination": destination,
                    "table": table_name,
                    "extensive": true,
                })),
            )
            .await?;
        for rt_table in reply.info.tables {
            for route in rt_table.routes {
                format_route(&mut routes, route);
            }
        }
    }
    Ok(routes)
}

/// inet.0 or inet6.0 by the version of `destination` (address or prefix).
fn destination_table(destination: &str) -> Option<&'static str> {
    let ip = if destination.contains('/') {
        destination.parse::<ipnet::IpNet>().ok()?.addr()
    } else {
        destination.parse::<IpAddr>().ok()?
    };
    Some(if ip.is_ipv4() { "inet.0" } else { "inet6.0" })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn count_coerces_strings_and_garbage() {
        assert_eq!(count("42"), 42);
        assert_eq!(count(" 7 "), 7);
        assert_eq!(count(""), 0);
        assert_eq!(count("n/a"), 0);
    }

    #[test]
    fn destination_table_follows_ip_version() {
        assert_eq!(destination_table("203.0.113.9"), Some("inet.0"));
        assert_eq!(destination_table("203.0.113.0/24"), Some("inet.0"));
        assert_eq!(destination_table("2001:db8::9"), Some("inet6.0"));
        assert_eq!(destination_table("2001:db8::/32"), Some("inet6.0"));
        assert_eq!(destination_table("not-an-address"), None);
    }

    #[test]
    fn format_route_fills_report_fields() {
        let raw: RawRoute = serde_json::from_value(serde_json::json!({
            "rt-destination": "198.51.100.0",
            "rt-prefix-length": 25,
            "rt-entry": {
                "nh": [{"to": "10.0.0.1"}, {"to": "10.0.0.2"}],
                "local-preference": "200",
                "as-path": "AS path: 64512 64513 I",
                "med": "5",
                "communities": {"community": "64512:100"}
            }
        }))
        .unwrap();

        let mut table = BTreeMap::new();
        format_route(&mut table, raw);

        let record = &table["198.51.100.0/25"];
        assert_eq!(record.next_hop.as_deref(), Some("10.0.0.1"));
        assert_eq!(record.local_preference, Some(200));
        assert_eq!(record.as_path.as_deref(), Some("64512 64513"));
        assert_eq!(record.med, Some(5));
        assert_eq!(
            record.communities.as_deref(),
            Some(&["64512:100".to_string()][..])
        );
    }

    #[test]
    fn format_route_defaults_missing_prefix_length() {
        let raw: RawRoute = serde_json::from_value(serde_json::json!({
            "rt-destination": "198.51.100.9",
            "rt-entry": {}
        }))
        .unwrap();

        let mut table = BTreeMap::new();
        format_route(&mut table, raw);
        assert!(table.contains_key("198.51.100.9/32"));
    }
}
