// IOS-XR extension getters.
//
// The gateway flattens XR operational data into plain JSON arrays, so
// these raw shapes are much tamer than the Junos ones. MAC normalization
// still applies: XR reports dotted hardware addresses.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::warn;

use crate::error::Error;
use crate::session::DeviceSession;
use crate::tables::{normalize_mac, ArpEntry, IsisInterface, NdEntry};

#[derive(Debug, Deserialize)]
struct IsisNeighborsReply {
    #[serde(rename = "isis-neighbors", default)]
    neighbors: Vec<RawIsisNeighbor>,
}

#[derive(Debug, Deserialize)]
struct RawIsisNeighbor {
    interface: String,
    #[serde(rename = "system-id")]
    system_id: String,
    #[serde(default)]
    state: String,
    #[serde(rename = "ipv6-capable", default)]
    ipv6_capable: bool,
    #[serde(rename = "next-hop", default)]
    next_hop: String,
    #[serde(default)]
    metric: i64,
}

pub(crate) async fn isis_interfaces(
    session: &DeviceSession,
) -> Result<BTreeMap<String, IsisInterface>, Error> {
    let reply: IsisNeighborsReply = session.rpc_call("get-isis-neighbors", None).await?;
    Ok(reply
        .neighbors
        .into_iter()
        .map(|n| {
            (
                n.interface,
                IsisInterface {
                    neighbor: n.system_id,
                    state: n.state.eq_ignore_ascii_case("up"),
                    next_hop: n.next_hop,
                    ipv6: n.ipv6_capable,
                    metric: n.metric,
                },
            )
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct MplsInterfacesReply {
    #[serde(rename = "mpls-interfaces", default)]
    interfaces: Vec<RawMplsInterface>,
}

#[derive(Debug, Deserialize)]
struct RawMplsInterface {
    interface: String,
    #[serde(default)]
    enabled: bool,
}

pub(crate) async fn mpls_interfaces(
    session: &DeviceSession,
) -> Result<BTreeMap<String, bool>, Error> {
    let reply: MplsInterfacesReply = session.rpc_call("get-mpls-interfaces", None).await?;
    Ok(reply
        .interfaces
        .into_iter()
        .map(|i| (i.interface, i.enabled))
        .collect())
}

#[derive(Debug, Deserialize)]
struct MsdpPeersReply {
    #[serde(rename = "msdp-peers", default)]
    peers: Vec<String>,
}

pub(crate) async fn msdp_neighbors(session: &DeviceSession) -> Result<Vec<String>, Error> {
    let reply: MsdpPeersReply = session.rpc_call("get-msdp-peers", None).await?;
    Ok(reply.peers)
}

#[derive(Debug, Deserialize)]
struct PimNeighborsReply {
    #[serde(rename = "pim-neighbors", default)]
    interfaces: Vec<String>,
}

pub(crate) async fn pim_neighbors(session: &DeviceSession) -> Result<Vec<String>, Error> {
    let reply: PimNeighborsReply = session.rpc_call("get-pim-neighbors", None).await?;
    Ok(reply.interfaces)
}

#[derive(Debug, Deserialize)]
struct ArpEntriesReply {
    #[serde(rename = "arp-entries", default)]
    entries: Vec<RawNeighborEntry>,
}

#[derive(Debug, Deserialize)]
struct NdEntriesReply {
    #[serde(rename = "nd-entries", default)]
    entries: Vec<RawNeighborEntry>,
}

#[derive(Debug, Deserialize)]
struct RawNeighborEntry {
    interface: String,
    address: String,
    #[serde(rename = "hardware-address", default)]
    hardware_address: String,
}

pub(crate) async fn arp_table(
    session: &DeviceSession,
) -> Result<BTreeMap<String, ArpEntry>, Error> {
    let reply: ArpEntriesReply = session.rpc_call("get-arp-entries", None).await?;
    Ok(reply
        .entries
        .into_iter()
        .map(|e| {
            let mac = normalize_mac(&e.hardware_address);
            if mac.is_none() {
                warn!(interface = %e.interface, raw = %e.hardware_address, "unparseable ARP MAC");
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

pub(crate) async fn nd_table(session: &DeviceSession) -> Result<BTreeMap<String, NdEntry>, Error> {
    let reply: NdEntriesReply = session.rpc_call("get-nd-entries", None).await?;
    Ok(reply
        .entries
        .into_iter()
        .map(|e| {
            let mac = normalize_mac(&e.hardware_address);
            if mac.is_none() {
                warn!(interface = %e.interface, raw = %e.hardware_address, "unparseable ND MAC");
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

#[derive(Debug, Deserialize)]
struct ReceivedPrefixesReply {
    #[serde(default)]
    prefixes: Vec<String>,
}

pub(crate) async fn bgp_neighbor_prefixes(
    session: &DeviceSession,
    peer: &str,
) -> Result<Vec<String>, Error> {
    let reply: ReceivedPrefixesReply = session
        .rpc_call(
            "get-bgp-neighbor-received-prefixes",
            Some(serde_json::json!({ "neighbor": peer })),
        )
        .await?;
    Ok(reply.prefixes)
}
