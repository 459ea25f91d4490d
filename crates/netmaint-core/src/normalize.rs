// Pure reshaping of fetched tables.
//
// Nothing in this module does IO: every function maps tables the session
// fetched into the shapes reports want. Kept separate so the quirky parts
// (merge discipline, BGP attribution) stay unit-testable.

use std::collections::BTreeMap;
use std::net::IpAddr;

use ipnet::IpNet;

use netmaint_rpc::tables::{
    ArpEntry, BgpNeighborDetail, BgpNeighborSummary, InterfaceCounters, InterfaceIps,
    InterfaceState, IsisInterface, NdEntry, OpticsModule, RouteCounts,
};

use crate::model::{InterfaceAddresses, InterfaceRecord};

// ── Address flattening ──────────────────────────────────────────────

/// Pick one primary address per family for each interface.
///
/// First address in table order wins; link-local IPv6 addresses are never
/// primary.
pub fn flatten_interface_ips(
    table: &BTreeMap<String, InterfaceIps>,
) -> BTreeMap<String, InterfaceAddresses> {
    table
        .iter()
        .map(|(name, ips)| {
            let ipv4_address = ips
                .ipv4
                .iter()
                .next()
                .map(|(addr, attrs)| format!("{addr}/{}", attrs.prefix_length));
            let ipv6_address = ips
                .ipv6
                .iter()
                .find(|(addr, _)| !is_link_local(addr))
                .map(|(addr, attrs)| format!("{addr}/{}", attrs.prefix_length));
            (
                name.clone(),
                InterfaceAddresses {
                    ipv4_address,
                    ipv6_address,
                },
            )
        })
        .collect()
}

fn is_link_local(addr: &str) -> bool {
    match addr.parse::<IpAddr>() {
        Ok(IpAddr::V6(v6)) => (v6.segments()[0] & 0xffc0) == 0xfe80,
        _ => false,
    }
}

// ── BGP detail adaptation ───────────────────────────────────────────

/// Lift the aggregated neighbor shape into the per-table detail shape.
///
/// Prefix counters move under the neighbor's routing table name; peers in
/// the aggregated table have exactly one. The aggregated shape carries no
/// active count, so that column stays zero.
pub fn format_bgp_detail(
    summary: &BTreeMap<String, BgpNeighborSummary>,
) -> BTreeMap<String, BgpNeighborDetail> {
    summary
        .iter()
        .map(|(peer, s)| {
            let table_name = if s.routing_table.is_empty() {
                "default".to_string()
            } else {
                s.routing_table.clone()
            };
            let mut tables = BTreeMap::new();
            tables.insert(
                table_name,
                RouteCounts {
                    received: s.received_prefix_count,
                    accepted: s.accepted_prefix_count,
                    active: 0,
                    advertised: s.advertised_prefix_count,
                },
            );
            (
                peer.clone(),
                BgpNeighborDetail {
                    up: s.up,
                    local_as: s.local_as,
                    remote_as: s.remote_as,
                    router_id: s.router_id.clone(),
                    local_address: s.local_address.clone(),
                    routing_table: s.routing_table.clone(),
                    import_policy: s.import_policy.clone(),
                    export_policy: s.export_policy.clone(),
                    tables,
                },
            )
        })
        .collect()
}

// ── Interface merge ─────────────────────────────────────────────────

/// Side tables merged into the base interface table. Counters and optics
/// are fetched only by workflows that need them.
#[derive(Debug, Default)]
pub struct InterfaceSources {
    pub addresses: BTreeMap<String, InterfaceAddresses>,
    pub mpls: BTreeMap<String, bool>,
    pub isis: BTreeMap<String, IsisInterface>,
    pub arp: BTreeMap<String, ArpEntry>,
    pub nd: BTreeMap<String, NdEntry>,
    pub counters: Option<BTreeMap<String, InterfaceCounters>>,
    pub optics: Option<BTreeMap<String, OpticsModule>>,
}

/// Merge side tables onto the base interface table.
///
/// The base table decides which interfaces exist: side-table entries for
/// interfaces it does not list are dropped without comment.
pub fn merge_interface_tables(
    base: &BTreeMap<String, InterfaceState>,
    sources: &InterfaceSources,
) -> BTreeMap<String, InterfaceRecord> {
    let mut records: BTreeMap<String, InterfaceRecord> = base
        .iter()
        .map(|(name, state)| (name.clone(), InterfaceRecord::from_state(state)))
        .collect();

    for (name, addresses) in &sources.addresses {
        if let Some(record) = records.get_mut(name) {
            record.apply_addresses(addresses);
        }
    }
    for (name, enabled) in &sources.mpls {
        if let Some(record) = records.get_mut(name) {
            record.mpls_enabled = *enabled;
        }
    }
    for (name, isis) in &sources.isis {
        if let Some(record) = records.get_mut(name) {
            record.apply_isis(isis);
        }
    }
    for (name, arp) in &sources.arp {
        if let Some(record) = records.get_mut(name) {
            record.apply_arp(arp);
        }
    }
    for (name, nd) in &sources.nd {
        if let Some(record) = records.get_mut(name) {
            record.apply_nd(nd);
        }
    }
    if let Some(counters) = &sources.counters {
        for (name, c) in counters {
            if let Some(record) = records.get_mut(name) {
                record.apply_counters(c);
            }
        }
    }
    if let Some(optics) = &sources.optics {
        for (name, o) in optics {
            if let Some(record) = records.get_mut(name) {
                record.apply_optics(o);
            }
        }
    }

    records
}

// ── Planning filter ─────────────────────────────────────────────────

/// Interface name prefixes that never belong in a planning dump.
const EXCLUDED_PREFIXES: [&str; 5] = ["Mgmt", "Null", "nVFab", "Loop", "PTP"];

/// Keep the interfaces a maintenance plan cares about: no management or
/// internal-fabric ports, and only ports that are enabled or up.
pub fn filter_planning_interfaces(
    records: BTreeMap<String, InterfaceRecord>,
) -> BTreeMap<String, InterfaceRecord> {
    records
        .into_iter()
        .filter(|(name, record)| {
            !EXCLUDED_PREFIXES.iter().any(|p| name.starts_with(p))
                && (record.is_enabled || record.is_up)
        })
        .collect()
}

// ── BGP attribution ─────────────────────────────────────────────────

/// Attribute BGP neighbors to the interfaces that face them.
///
/// A neighbor matches an interface when the neighbor's local address
/// equals the interface address (ignoring prefix length), or failing
/// that, when the peer address falls inside the interface's subnet.
/// Matched neighbors nest under the interface's `bgp` column; the rest
/// come back unmatched. Each neighbor lands in exactly one place.
pub fn collapse_bgp(
    mut records: BTreeMap<String, InterfaceRecord>,
    neighbors: BTreeMap<String, BgpNeighborDetail>,
) -> (
    BTreeMap<String, InterfaceRecord>,
    BTreeMap<String, BgpNeighborDetail>,
) {
    let mut unmatched = BTreeMap::new();

    for (peer, detail) in neighbors {
        let home = records
            .iter()
            .find(|(_, r)| local_address_matches(r, &detail))
            .or_else(|| records.iter().find(|(_, r)| subnet_contains_peer(r, &peer)))
            .map(|(name, _)| name.clone());

        match home {
            Some(name) => {
                if let Some(record) = records.get_mut(&name) {
                    record
                        .bgp
                        .get_or_insert_with(BTreeMap::new)
                        .insert(peer, detail);
                }
            }
            None => {
                unmatched.insert(peer, detail);
            }
        }
    }

    (records, unmatched)
}

fn local_address_matches(record: &InterfaceRecord, detail: &BgpNeighborDetail) -> bool {
    if detail.local_address.is_empty() {
        return false;
    }
    let matches_v4 = record
        .ipv4_address
        .as_deref()
        .is_some_and(|a| address_part(a) == detail.local_address);
    let matches_v6 = record
        .ipv6_address
        .as_deref()
        .is_some_and(|a| address_part(a) == detail.local_address);
    matches_v4 || matches_v6
}

fn address_part(with_len: &str) -> &str {
    with_len.split('/').next().unwrap_or(with_len)
}

fn subnet_contains_peer(record: &InterfaceRecord, peer: &str) -> bool {
    let Ok(peer_ip) = peer.parse::<IpAddr>() else {
        return false;
    };
    let contains = |addr: Option<&str>| {
        addr.and_then(|a| a.parse::<IpNet>().ok())
            .is_some_and(|net| net.contains(&peer_ip))
    };
    contains(record.ipv4_address.as_deref()) || contains(record.ipv6_address.as_deref())
}

// ── Planning table layout ───────────────────────────────────────────

/// Column order for tabular planning output.
pub fn planning_columns() -> &'static [&'static str] {
    &[
        "interface",
        "description",
        "is_enabled",
        "is_up",
        "mtu",
        "speed_mbps",
        "mac_address",
        "ipv4_address",
        "ipv6_address",
        "mpls_enabled",
        "isis_neighbor",
        "isis_state",
        "isis_nh",
        "isis_ipv6",
        "isis_metric",
        "arp_nh",
        "arp_nh_mac",
        "nd_nh",
        "nd_nh_mac",
        "tx_errors",
        "rx_errors",
        "tx_discards",
        "rx_discards",
        "optic",
        "optic_serial",
        "rx_power_dbm",
        "tx_power_dbm",
        "bgp_peers",
    ]
}

/// One row per interface, in [`planning_columns`] order.
pub fn planning_row(name: &str, record: &InterfaceRecord) -> Vec<String> {
    fn opt<T: std::fmt::Display>(v: &Option<T>) -> String {
        v.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    let bgp_peers = record
        .bgp
        .as_ref()
        .map(|peers| {
            peers
                .iter()
                .map(|(peer, d)| format!("{peer} (AS{})", d.remote_as))
                .collect::<Vec<_>>()
                .join("; ")
        })
        .unwrap_or_default();

    vec![
        name.to_string(),
        record.description.clone(),
        record.is_enabled.to_string(),
        record.is_up.to_string(),
        record.mtu.to_string(),
        record.speed_mbps.to_string(),
        record.mac_address.clone(),
        opt(&record.ipv4_address),
        opt(&record.ipv6_address),
        record.mpls_enabled.to_string(),
        opt(&record.isis_neighbor),
        opt(&record.isis_state),
        opt(&record.isis_nh),
        opt(&record.isis_ipv6),
        opt(&record.isis_metric),
        opt(&record.arp_nh),
        opt(&record.arp_nh_mac),
        opt(&record.nd_nh),
        opt(&record.nd_nh_mac),
        opt(&record.tx_errors),
        opt(&record.rx_errors),
        opt(&record.tx_discards),
        opt(&record.rx_discards),
        opt(&record.optic),
        opt(&record.optic_serial),
        opt(&record.rx_power_dbm),
        opt(&record.tx_power_dbm),
        bgp_peers,
    ]
}
