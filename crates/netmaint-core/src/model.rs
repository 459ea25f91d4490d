// Domain records and run inputs.
//
// Interface records accumulate columns from several device tables; the
// report structs own the exact JSON the maintenance tooling consumes, so
// reader-facing field names live here as serde renames.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use netmaint_rpc::tables::{
    ArpEntry, InterfaceCounters, InterfaceState, IsisInterface, NdEntry, OpticsModule,
};
use netmaint_rpc::DeviceFamily;

// Nested table types that appear in report fields, re-exported so report
// consumers can name them without depending on the rpc crate.
pub use netmaint_rpc::tables::{BgpNeighborDetail, RouteRecord};

// ── Run inputs ──────────────────────────────────────────────────────

/// One maintenance run, as provided by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSpec {
    /// Device under maintenance (name or address).
    pub hostname: String,
    /// OS family of the device.
    pub device_type: DeviceFamily,
    /// Helper router for route lookups the device cannot do itself.
    #[serde(default)]
    pub global_router: Option<String>,
    /// Circuits in scope for this run.
    #[serde(default)]
    pub circuits: Vec<CircuitSpec>,
}

/// One circuit under maintenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitSpec {
    /// Interface carrying the circuit, named exactly as the device does.
    pub port: String,
    /// Circuit id; reports key circuits as `CLR-{clr}`.
    pub clr: String,
    /// Caller-supplied IPv4 BGP neighbor, overriding ARP inference.
    #[serde(default)]
    pub v4_neighbor: Option<String>,
    /// Caller-supplied IPv6 BGP neighbor, overriding ND inference.
    #[serde(default)]
    pub v6_neighbor: Option<String>,
}

impl CircuitSpec {
    /// Report label for this circuit.
    pub fn label(&self) -> String {
        format!("CLR-{}", self.clr)
    }
}

// ── Interface records ───────────────────────────────────────────────

/// Primary addresses picked from the per-family address table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceAddresses {
    pub ipv4_address: Option<String>,
    pub ipv6_address: Option<String>,
}

/// One interface with every column the workflows collect for it.
///
/// Base state is always present; columns from optional tables stay `None`
/// (and out of the JSON) when their table was not fetched or had no entry
/// for this interface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceRecord {
    pub is_enabled: bool,
    pub is_up: bool,
    pub description: String,
    pub mtu: i64,
    pub speed_mbps: f64,
    pub mac_address: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6_address: Option<String>,

    /// Explicitly false when the device reported no MPLS row.
    pub mpls_enabled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub isis_neighbor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isis_state: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isis_nh: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isis_ipv6: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isis_metric: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub arp_nh: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arp_nh_mac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nd_nh: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nd_nh_mac: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_errors: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_errors: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_discards: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_discards: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub optic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optic_serial: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_power_dbm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_power_dbm: Option<f64>,

    /// BGP neighbors attributed to this interface by `collapse_bgp`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bgp: Option<BTreeMap<String, BgpNeighborDetail>>,
}

impl InterfaceRecord {
    pub fn from_state(state: &InterfaceState) -> Self {
        Self {
            is_enabled: state.is_enabled,
            is_up: state.is_up,
            description: state.description.clone(),
            mtu: state.mtu,
            speed_mbps: state.speed_mbps,
            mac_address: state.mac_address.clone(),
            ..Self::default()
        }
    }

    pub(crate) fn apply_addresses(&mut self, a: &InterfaceAddresses) {
        self.ipv4_address = a.ipv4_address.clone();
        self.ipv6_address = a.ipv6_address.clone();
    }

    pub(crate) fn apply_isis(&mut self, i: &IsisInterface) {
        self.isis_neighbor = Some(i.neighbor.clone());
        self.isis_state = Some(i.state);
        self.isis_nh = Some(i.next_hop.clone());
        self.isis_ipv6 = Some(i.ipv6);
        self.isis_metric = Some(i.metric);
    }

    pub(crate) fn apply_arp(&mut self, e: &ArpEntry) {
        self.arp_nh = Some(e.arp_nh.clone());
        self.arp_nh_mac = e.arp_nh_mac.clone();
    }

    pub(crate) fn apply_nd(&mut self, e: &NdEntry) {
        self.nd_nh = Some(e.nd_nh.clone());
        self.nd_nh_mac = e.nd_nh_mac.clone();
    }

    pub(crate) fn apply_counters(&mut self, c: &InterfaceCounters) {
        self.tx_errors = Some(c.tx_errors);
        self.rx_errors = Some(c.rx_errors);
        self.tx_discards = Some(c.tx_discards);
        self.rx_discards = Some(c.rx_discards);
    }

    pub(crate) fn apply_optics(&mut self, o: &OpticsModule) {
        self.optic = Some(o.module.clone());
        self.optic_serial = Some(o.serial.clone());
        self.rx_power_dbm = o.rx_power_dbm;
        self.tx_power_dbm = o.tx_power_dbm;
    }
}

// ── Reports ─────────────────────────────────────────────────────────

/// Planning dump: every relevant interface on the device, with the BGP
/// neighbors that could not be attributed to any interface kept aside.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningReport {
    pub hostname: String,
    pub device_type: DeviceFamily,
    pub generated_at: DateTime<Utc>,
    pub interfaces: BTreeMap<String, InterfaceRecord>,
    pub unmatched_bgp: BTreeMap<String, BgpNeighborDetail>,
}

/// Per-device health summary, with the field names reviewers read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceReport {
    #[serde(rename = "Host")]
    pub hostname: String,
    #[serde(rename = "Generated")]
    pub generated_at: DateTime<Utc>,
    #[serde(rename = "Software")]
    pub software: String,
    #[serde(rename = "Non-Port BGP")]
    pub non_port_bgp: BTreeMap<String, BgpNeighborDetail>,
    #[serde(rename = "MSDP")]
    pub msdp: Vec<String>,
    #[serde(rename = "PIM")]
    pub pim: Vec<String>,
    #[serde(rename = "Interfaces")]
    pub interfaces: BTreeMap<String, InterfaceRecord>,
}

/// Per-circuit report. The document is exactly the circuit map, keyed by
/// CLR label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitsReport {
    #[serde(flatten)]
    pub circuits: BTreeMap<String, CircuitRecord>,
}

/// Everything the circuit workflow reports for one circuit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitRecord {
    #[serde(rename = "Interface")]
    pub interface: CircuitInterface,
    #[serde(rename = "IS-IS", skip_serializing_if = "Option::is_none")]
    pub isis: Option<CircuitIsis>,
    /// `None` when no route lookup ran for this circuit; `Some` (possibly
    /// empty) when one did.
    #[serde(rename = "BGP", skip_serializing_if = "Option::is_none")]
    pub bgp: Option<BTreeMap<String, RouteRecord>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitInterface {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Enabled")]
    pub enabled: bool,
    #[serde(rename = "Up")]
    pub up: bool,
    #[serde(rename = "MTU")]
    pub mtu: i64,
    #[serde(rename = "Counters")]
    pub counters: CircuitCounters,
    #[serde(rename = "IPv4/IPv6")]
    pub addressing: CircuitAddressing,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CircuitCounters {
    #[serde(rename = "TX Errors")]
    pub tx_errors: Option<i64>,
    #[serde(rename = "RX Errors")]
    pub rx_errors: Option<i64>,
    #[serde(rename = "TX Discards")]
    pub tx_discards: Option<i64>,
    #[serde(rename = "RX Discards")]
    pub rx_discards: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CircuitAddressing {
    #[serde(rename = "MAC")]
    pub mac: String,
    #[serde(rename = "IPv4 Address")]
    pub ipv4_address: Option<String>,
    #[serde(rename = "IPv6 Address")]
    pub ipv6_address: Option<String>,
    #[serde(rename = "DNS")]
    pub dns: Option<String>,
    #[serde(rename = "ARP/ND")]
    pub arp_nd: CircuitArpNd,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CircuitArpNd {
    #[serde(rename = "ARP Next-Hop")]
    pub arp_nh: Option<String>,
    #[serde(rename = "ARP NH MAC")]
    pub arp_nh_mac: Option<String>,
    #[serde(rename = "ND Next-Hop")]
    pub nd_nh: Option<String>,
    #[serde(rename = "ND NH MAC")]
    pub nd_nh_mac: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitIsis {
    #[serde(rename = "Neighbor")]
    pub neighbor: String,
    #[serde(rename = "State")]
    pub state: bool,
    #[serde(rename = "Next-Hop")]
    pub next_hop: String,
    #[serde(rename = "IPv6")]
    pub ipv6: bool,
    #[serde(rename = "Metric")]
    pub metric: i64,
    #[serde(rename = "MPLS")]
    pub mpls: bool,
}

impl CircuitRecord {
    /// Build the interface block from a merged record.
    pub fn from_interface(name: &str, record: &InterfaceRecord, dns: Option<String>) -> Self {
        Self {
            interface: CircuitInterface {
                name: name.to_string(),
                description: record.description.clone(),
                enabled: record.is_enabled,
                up: record.is_up,
                mtu: record.mtu,
                counters: CircuitCounters {
                    tx_errors: record.tx_errors,
                    rx_errors: record.rx_errors,
                    tx_discards: record.tx_discards,
                    rx_discards: record.rx_discards,
                },
                addressing: CircuitAddressing {
                    mac: record.mac_address.clone(),
                    ipv4_address: record.ipv4_address.clone(),
                    ipv6_address: record.ipv6_address.clone(),
                    dns,
                    arp_nd: CircuitArpNd {
                        arp_nh: record.arp_nh.clone(),
                        arp_nh_mac: record.arp_nh_mac.clone(),
                        nd_nh: record.nd_nh.clone(),
                        nd_nh_mac: record.nd_nh_mac.clone(),
                    },
                },
            },
            isis: None,
            bgp: None,
        }
    }
}
