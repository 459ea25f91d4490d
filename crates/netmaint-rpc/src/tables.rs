// Wire-facing table types shared by the vendor modules.
//
// Each getter on `DeviceSession` returns one of these shapes no matter
// which family produced it. The vendor modules (junos, iosxr) own the raw
// reply envelopes and adapt them into these types at the crate boundary,
// so quirks like stringly-typed metrics or port-suffixed peer addresses
// never escape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── Baseline tables ─────────────────────────────────────────────────

/// Chassis identity and software info.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Facts {
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub os_version: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub serial_number: String,
    #[serde(default)]
    pub uptime_secs: i64,
}

/// Per-interface admin/oper state from the baseline interface table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceState {
    pub is_enabled: bool,
    pub is_up: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mtu: i64,
    #[serde(default)]
    pub speed_mbps: f64,
    #[serde(default)]
    pub mac_address: String,
}

/// Addresses configured on one interface, keyed by address within family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceIps {
    #[serde(default)]
    pub ipv4: BTreeMap<String, AddressAttrs>,
    #[serde(default)]
    pub ipv6: BTreeMap<String, AddressAttrs>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressAttrs {
    pub prefix_length: u8,
}

/// Error and discard counters from the baseline counter table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceCounters {
    #[serde(default)]
    pub tx_errors: i64,
    #[serde(default)]
    pub rx_errors: i64,
    #[serde(default)]
    pub tx_discards: i64,
    #[serde(default)]
    pub rx_discards: i64,
}

/// Installed transceiver and light levels for one port.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpticsModule {
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub serial: String,
    pub rx_power_dbm: Option<f64>,
    pub tx_power_dbm: Option<f64>,
}

/// One neighbor from the baseline (aggregated) BGP table.
///
/// This is the family-independent shape every gateway can produce; it
/// carries flat prefix counts instead of per-routing-table ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BgpNeighborSummary {
    pub up: bool,
    #[serde(default)]
    pub local_as: i64,
    #[serde(default)]
    pub remote_as: i64,
    #[serde(default)]
    pub router_id: String,
    #[serde(default)]
    pub local_address: String,
    #[serde(default)]
    pub routing_table: String,
    #[serde(default)]
    pub import_policy: String,
    #[serde(default)]
    pub export_policy: String,
    #[serde(default)]
    pub received_prefix_count: i64,
    #[serde(default)]
    pub accepted_prefix_count: i64,
    #[serde(default)]
    pub advertised_prefix_count: i64,
}

// ── Vendor extension tables ─────────────────────────────────────────

/// ISIS adjacency joined with the interface's configured metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IsisInterface {
    pub neighbor: String,
    pub state: bool,
    pub next_hop: String,
    pub ipv6: bool,
    pub metric: i64,
}

/// IPv4 ARP entry for the next hop reachable over an interface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArpEntry {
    pub arp_nh: String,
    /// `None` when the device reported a hardware address that does not
    /// parse; the entry itself is still usable.
    pub arp_nh_mac: Option<String>,
}

/// IPv6 neighbor-discovery entry for the next hop over an interface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NdEntry {
    pub nd_nh: String,
    pub nd_nh_mac: Option<String>,
}

/// Per-routing-table prefix counters for one BGP neighbor.
///
/// Serialized names keep the `_prefixes` suffix the documents use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteCounts {
    #[serde(rename = "received_prefixes", default)]
    pub received: i64,
    #[serde(rename = "accepted_prefixes", default)]
    pub accepted: i64,
    #[serde(rename = "active_prefixes", default)]
    pub active: i64,
    #[serde(rename = "advertised_prefixes", default)]
    pub advertised: i64,
}

/// Fully reconciled BGP neighbor detail.
///
/// Produced by the family adapters: session addresses have their `+port`
/// suffix stripped, the duplicated AS-number fields are collapsed to one
/// value each, and prefix counters are nested per routing table. A record
/// with no reply data is the all-default one, never a partial mix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BgpNeighborDetail {
    pub up: bool,
    #[serde(default)]
    pub local_as: i64,
    #[serde(default)]
    pub remote_as: i64,
    #[serde(default)]
    pub router_id: String,
    #[serde(default)]
    pub local_address: String,
    #[serde(default)]
    pub routing_table: String,
    #[serde(default)]
    pub import_policy: String,
    #[serde(default)]
    pub export_policy: String,
    #[serde(default)]
    pub tables: BTreeMap<String, RouteCounts>,
}

/// One received or resolved route, keyed in reports by `destination/len`.
///
/// Field names are the report-facing ones: this struct serializes straight
/// into the documents maintenance reviewers read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    #[serde(rename = "Next-Hop")]
    pub next_hop: Option<String>,
    #[serde(rename = "Local Preference")]
    pub local_preference: Option<i64>,
    #[serde(rename = "AS-Path")]
    pub as_path: Option<String>,
    #[serde(rename = "MED")]
    pub med: Option<i64>,
    #[serde(rename = "Communities")]
    pub communities: Option<Vec<String>>,
}

// ── Field normalization helpers ─────────────────────────────────────

/// Normalize a vendor MAC string to lowercase colon-separated hextets.
///
/// Accepts colon, dash, and dotted (Cisco) forms. Malformed input maps to
/// `None` so a broken hardware address cannot hide the entry it rode in on.
pub(crate) fn normalize_mac(raw: &str) -> Option<String> {
    let mut hex = String::with_capacity(12);
    for c in raw.trim().chars() {
        if c.is_ascii_hexdigit() {
            hex.push(c.to_ascii_lowercase());
        } else if !matches!(c, ':' | '-' | '.') {
            return None;
        }
    }
    if hex.len() != 12 {
        return None;
    }
    let mut out = String::with_capacity(17);
    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        if i > 0 {
            out.push(':');
        }
        out.push_str(std::str::from_utf8(chunk).ok()?);
    }
    Some(out)
}

/// Strip the `+port` suffix Junos appends to session addresses.
pub(crate) fn strip_port_suffix(address: &str) -> String {
    address.split('+').next().unwrap_or(address).to_string()
}

/// Reduce a raw AS-path attribute to the bare AS sequence.
///
/// Real replies carry the `AS path:` label, an origin marker, and
/// sometimes a `Recorded` trailer; reports want only the numbers.
pub(crate) fn trim_as_path(raw: &str) -> String {
    let head = raw.split(" I ").next().unwrap_or(raw);
    head.replace("AS path:", "")
        .replace('I', "")
        .replace("\n Recorded", "")
        .trim()
        .to_string()
}

/// Report key for one route. Destinations that arrive without a prefix
/// length are host routes.
pub(crate) fn route_key(destination: &str, prefix_length: Option<u8>) -> String {
    format!("{destination}/{}", prefix_length.unwrap_or(32))
}

/// JSON fields that are a bare value or a list depending on cardinality.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for Vec<String> {
    fn from(v: OneOrMany) -> Self {
        match v {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(list) => list,
        }
    }
}
