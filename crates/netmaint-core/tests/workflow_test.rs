// End-to-end workflow tests against a wiremock gateway.
//
// One server plays both the device under maintenance and, for the other-
// family circuit tests, the helper router: both roles resolve to
// 127.0.0.1 and the mounted RPCs serve whichever session asks.
#![allow(clippy::unwrap_used)]

use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use netmaint_core::{
    CircuitSpec, Collector, CoreError, CredentialProvider, DeviceFamily, RunSpec, SessionAuth,
    TicketingCredentials, TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

struct StaticCreds;

impl CredentialProvider for StaticCreds {
    fn ticketing(&self) -> Result<TicketingCredentials, CoreError> {
        Ok(TicketingCredentials {
            url: "https://tickets.example.net".into(),
            username: "svc-netmaint".into(),
            password: SecretString::from("hunter2"),
        })
    }

    fn device_auth(&self) -> Result<SessionAuth, CoreError> {
        // Minted outside the one-time code window so helper opens never
        // sleep in tests.
        Ok(SessionAuth {
            username: "svc-netmaintmfa".into(),
            password: SecretString::from("hunter2654321"),
            minted_at: Instant::now()
                .checked_sub(Duration::from_secs(31))
                .unwrap(),
        })
    }
}

fn transport(server: &MockServer) -> TransportConfig {
    TransportConfig {
        port: server.address().port(),
        plain_http: true,
        ..TransportConfig::default()
    }
}

fn collector(server: &MockServer) -> Collector<StaticCreds> {
    Collector::new(StaticCreds, transport(server))
}

fn run(device_type: DeviceFamily) -> RunSpec {
    RunSpec {
        hostname: "127.0.0.1".into(),
        device_type,
        global_router: None,
        circuits: Vec::new(),
    }
}

fn circuit(port: &str, clr: &str) -> CircuitSpec {
    CircuitSpec {
        port: port.into(),
        clr: clr.into(),
        v4_neighbor: None,
        v6_neighbor: None,
    }
}

async fn mount_rpc(server: &MockServer, rpc: &str, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(format!("/rpc/{rpc}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// ── Circuits ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_junos_circuits_isis_suppresses_neighbor_inference() {
    let server = MockServer::start().await;
    mount_rpc(&server, "get-facts", json!({"hostname": "edge1.lab"})).await;
    mount_rpc(
        &server,
        "get-interfaces",
        json!({
            "et-0/0/1.0": {
                "is_enabled": true,
                "is_up": true,
                "description": "backbone to core1",
                "mtu": 9192,
                "speed_mbps": 100_000.0,
                "mac_address": "56:04:0a:00:00:01"
            },
            "et-0/0/2.0": {
                "is_enabled": true,
                "is_up": true,
                "description": "CLR-200 customer handoff",
                "mtu": 1514,
                "speed_mbps": 10000.0,
                "mac_address": "56:04:0a:00:00:02"
            }
        }),
    )
    .await;
    mount_rpc(
        &server,
        "get-interfaces-counters",
        json!({
            "et-0/0/2.0": {"tx_errors": 2, "rx_errors": 0, "tx_discards": 0, "rx_discards": 1}
        }),
    )
    .await;
    mount_rpc(
        &server,
        "get-isis-adjacency-information",
        json!({
            "isis-adjacency-information": {
                "isis-adjacency": [{
                    "interface-name": "et-0/0/1.0",
                    "system-name": "core1",
                    "adjacency-state": "Up",
                    "next-hop-address": "192.0.2.3",
                    "ipv6-capable": true
                }]
            }
        }),
    )
    .await;
    mount_rpc(
        &server,
        "get-isis-interface-information",
        json!({
            "isis-interface-information": {
                "isis-interface": [{"interface-name": "et-0/0/1.0", "metric": "1200"}]
            }
        }),
    )
    .await;
    mount_rpc(
        &server,
        "get-mpls-interface-information",
        json!({
            "mpls-interface-information": {
                "mpls-interface": [{"interface-name": "et-0/0/1.0", "mpls-interface-state": "up"}]
            }
        }),
    )
    .await;
    // ARP rows exist for both ports; the ISIS circuit must ignore its own.
    mount_rpc(
        &server,
        "get-arp-table-information",
        json!({
            "arp-table-information": {
                "arp-table-entry": [
                    {"interface-name": "et-0/0/1.0", "ip-address": "192.0.2.3",
                     "mac-address": "56:04:0a:00:00:03"},
                    {"interface-name": "et-0/0/2.0", "ip-address": "198.51.100.9",
                     "mac-address": "56:04:0a:00:00:09"}
                ]
            }
        }),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/rpc/get-route-information"))
        .and(body_partial_json(json!({"peer": "198.51.100.9"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "route-information": {
                "route-table": [{
                    "rt": [{
                        "rt-destination": "203.0.113.0",
                        "rt-prefix-length": 24,
                        "rt-entry": {
                            "nh": [{"to": "198.51.100.9"}],
                            "local-preference": "100",
                            "as-path": "AS path: 64513 I"
                        }
                    }]
                }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut run = run(DeviceFamily::Junos);
    run.circuits = vec![circuit("et-0/0/1.0", "100"), circuit("et-0/0/2.0", "200")];

    let report = collector(&server).circuits_report(&run).await.unwrap();

    let isis_circuit = &report.circuits["CLR-100"];
    let block = isis_circuit.isis.as_ref().unwrap();
    assert_eq!(block.neighbor, "core1");
    assert!(block.state);
    assert_eq!(block.next_hop, "192.0.2.3");
    assert!(block.ipv6);
    assert_eq!(block.metric, 1200);
    assert!(block.mpls);
    // Active adjacency and no caller-named neighbors: no route lookup.
    assert!(isis_circuit.bgp.is_none());

    let ebgp_circuit = &report.circuits["CLR-200"];
    assert!(ebgp_circuit.isis.is_none());
    assert_eq!(
        ebgp_circuit.interface.addressing.arp_nd.arp_nh.as_deref(),
        Some("198.51.100.9")
    );
    let routes = ebgp_circuit.bgp.as_ref().unwrap();
    assert_eq!(routes["203.0.113.0/24"].as_path.as_deref(), Some("64513"));
    assert_eq!(ebgp_circuit.interface.counters.tx_errors, Some(2));
    assert!(ebgp_circuit.interface.addressing.dns.is_none());
}

#[tokio::test]
async fn test_xr_circuits_open_helper_router_once() {
    let server = MockServer::start().await;
    // One probe for the primary session, one for the helper; a third
    // means the helper was reopened.
    Mock::given(method("POST"))
        .and(path("/rpc/get-facts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hostname": "xr1"})))
        .expect(2)
        .mount(&server)
        .await;
    mount_rpc(
        &server,
        "get-interfaces",
        json!({
            "HundredGigE0/0/0/1": {
                "is_enabled": true, "is_up": true,
                "description": "CLR-310", "mtu": 9192,
                "speed_mbps": 100_000.0, "mac_address": "02:ba:dc:ab:1e:55"
            },
            "HundredGigE0/0/0/2": {
                "is_enabled": true, "is_up": true,
                "description": "CLR-320", "mtu": 9192,
                "speed_mbps": 100_000.0, "mac_address": "02:ba:dc:ab:1e:56"
            }
        }),
    )
    .await;
    mount_rpc(
        &server,
        "get-arp-entries",
        json!({
            "arp-entries": [
                {"interface": "HundredGigE0/0/0/1", "address": "192.0.2.3",
                 "hardware-address": "02ba.dcab.1e03"},
                {"interface": "HundredGigE0/0/0/2", "address": "192.0.2.5",
                 "hardware-address": "02ba.dcab.1e05"}
            ]
        }),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/rpc/get-bgp-neighbor-received-prefixes"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"prefixes": ["203.0.113.0/24"]})),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rpc/get-route-information"))
        .and(body_partial_json(json!({"destination": "203.0.113.0/24"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "route-information": {
                "route-table": [{
                    "rt": [{
                        "rt-destination": "203.0.113.0",
                        "rt-prefix-length": 24,
                        "rt-entry": {"nh": [{"to": "10.0.0.1"}]}
                    }]
                }]
            }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let mut run = run(DeviceFamily::IosXr);
    run.global_router = Some("127.0.0.1".into());
    run.circuits = vec![
        circuit("HundredGigE0/0/0/1", "310"),
        circuit("HundredGigE0/0/0/2", "320"),
    ];

    let report = collector(&server).circuits_report(&run).await.unwrap();

    for label in ["CLR-310", "CLR-320"] {
        let routes = report.circuits[label].bgp.as_ref().unwrap();
        assert_eq!(
            routes["203.0.113.0/24"].next_hop.as_deref(),
            Some("10.0.0.1"),
            "routes missing for {label}"
        );
    }
}

#[tokio::test]
async fn test_unknown_circuit_port_is_fatal() {
    let server = MockServer::start().await;
    mount_rpc(&server, "get-facts", json!({"hostname": "edge1.lab"})).await;
    mount_rpc(
        &server,
        "get-interfaces",
        json!({
            "et-0/0/1.0": {"is_enabled": true, "is_up": true}
        }),
    )
    .await;

    let mut run = run(DeviceFamily::Junos);
    run.circuits = vec![circuit("et-9/9/9.0", "7")];

    let result = collector(&server).circuits_report(&run).await;
    match result {
        Err(CoreError::UnknownPort { label, port, host }) => {
            assert_eq!(label, "CLR-7");
            assert_eq!(port, "et-9/9/9.0");
            assert_eq!(host, "127.0.0.1");
        }
        other => panic!("expected UnknownPort error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_xr_circuits_without_global_router_rejected_upfront() {
    let server = MockServer::start().await;
    // Validation must fire before any session work.
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let mut run = run(DeviceFamily::IosXr);
    run.circuits = vec![circuit("HundredGigE0/0/0/1", "310")];

    let result = collector(&server).circuits_report(&run).await;
    match result {
        Err(CoreError::InvalidRunSpec { message }) => {
            assert!(message.contains("global_router"), "message: {message}");
            assert!(message.contains("iosxr"), "message: {message}");
        }
        other => panic!("expected InvalidRunSpec error, got: {other:?}"),
    }
}

// ── Planning ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_planning_report_filters_and_attributes() {
    let server = MockServer::start().await;
    mount_rpc(&server, "get-facts", json!({"hostname": "edge1.lab"})).await;
    mount_rpc(
        &server,
        "get-interfaces",
        json!({
            "et-0/0/1.0": {
                "is_enabled": true, "is_up": true,
                "description": "transit", "mtu": 9192,
                "speed_mbps": 100_000.0, "mac_address": "56:04:0a:00:00:01"
            },
            "et-0/0/3.0": {"is_enabled": false, "is_up": false},
            "Mgmt0": {"is_enabled": true, "is_up": true}
        }),
    )
    .await;
    mount_rpc(
        &server,
        "get-interfaces-ip",
        json!({
            "et-0/0/1.0": {"ipv4": {"192.0.2.2": {"prefix_length": 31}}}
        }),
    )
    .await;
    mount_rpc(
        &server,
        "get-optics-inventory",
        json!({
            "et-0/0/1.0": {"module": "QSFP28", "serial": "XYZ123", "rx_power_dbm": -2.5}
        }),
    )
    .await;
    mount_rpc(
        &server,
        "get-bgp-neighbors",
        json!({
            "192.0.2.3": {
                "up": true,
                "local_as": 64512,
                "remote_as": 64513,
                "local_address": "192.0.2.2",
                "routing_table": "inet.0",
                "received_prefix_count": 120,
                "accepted_prefix_count": 118,
                "advertised_prefix_count": 4
            },
            "10.99.99.99": {"up": false, "remote_as": 65099}
        }),
    )
    .await;
    // Planning never asks for counters.
    Mock::given(method("POST"))
        .and(path("/rpc/get-interfaces-counters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let report = collector(&server)
        .planning_report(&run(DeviceFamily::Junos))
        .await
        .unwrap();

    assert_eq!(report.hostname, "127.0.0.1");
    assert_eq!(report.device_type, DeviceFamily::Junos);

    // Management and down+disabled interfaces are filtered out.
    assert_eq!(report.interfaces.len(), 1);
    let record = &report.interfaces["et-0/0/1.0"];
    assert_eq!(record.optic.as_deref(), Some("QSFP28"));
    assert_eq!(record.rx_power_dbm, Some(-2.5));
    assert_eq!(record.ipv4_address.as_deref(), Some("192.0.2.2/31"));

    // Aggregated neighbors arrive adapted to the per-table shape.
    let bgp = record.bgp.as_ref().unwrap();
    assert_eq!(bgp["192.0.2.3"].tables["inet.0"].received, 120);
    assert_eq!(bgp["192.0.2.3"].tables["inet.0"].active, 0);
    assert!(report.unmatched_bgp.contains_key("10.99.99.99"));
}

// ── Device summary ──────────────────────────────────────────────────

#[tokio::test]
async fn test_device_report_summarizes_junos_device() {
    let server = MockServer::start().await;
    mount_rpc(
        &server,
        "get-facts",
        json!({"hostname": "edge1.lab", "os_version": "23.4R2.13"}),
    )
    .await;
    mount_rpc(
        &server,
        "get-interfaces",
        json!({
            "et-0/0/1.0": {
                "is_enabled": true, "is_up": true,
                "description": "transit", "mtu": 9192,
                "speed_mbps": 100_000.0, "mac_address": "56:04:0a:00:00:01"
            },
            "Loop0": {"is_enabled": true, "is_up": true}
        }),
    )
    .await;
    mount_rpc(
        &server,
        "get-interfaces-ip",
        json!({
            "et-0/0/1.0": {"ipv4": {"192.0.2.2": {"prefix_length": 31}}}
        }),
    )
    .await;
    mount_rpc(
        &server,
        "get-interfaces-counters",
        json!({
            "et-0/0/1.0": {"tx_errors": 2, "rx_errors": 0, "tx_discards": 0, "rx_discards": 0}
        }),
    )
    .await;
    mount_rpc(
        &server,
        "get-bgp-neighbor-information",
        json!({
            "bgp-information": {
                "bgp-peer": [
                    {
                        "peer-address": "192.0.2.3+179",
                        "local-address": "192.0.2.2+65123",
                        "local-as": "64512",
                        "peer-as": "64513",
                        "peer-state": "Established",
                        "peer-id": "10.255.0.3",
                        "bgp-rib": [{
                            "name": "inet.0",
                            "received-prefix-count": "120",
                            "accepted-prefix-count": "118",
                            "active-prefix-count": "118",
                            "advertised-prefix-count": "4"
                        }]
                    },
                    {
                        "peer-address": "10.99.99.99",
                        "peer-state": "Idle"
                    }
                ]
            }
        }),
    )
    .await;
    mount_rpc(
        &server,
        "get-msdp-information",
        json!({
            "msdp-peer-information": {"msdp-peer": [{"msdp-peer-address": "10.0.0.5"}]}
        }),
    )
    .await;
    mount_rpc(
        &server,
        "get-pim-neighbors-information",
        json!({
            "pim-neighbors-information": {"pim-neighbor": [{"pim-interface-name": "et-0/0/1.0"}]}
        }),
    )
    .await;
    // The summary fetches counters, never optics.
    Mock::given(method("POST"))
        .and(path("/rpc/get-optics-inventory"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let report = collector(&server)
        .device_report(&run(DeviceFamily::Junos))
        .await
        .unwrap();

    assert_eq!(report.software, "23.4R2.13");
    assert_eq!(report.msdp, vec!["10.0.0.5".to_string()]);
    assert_eq!(report.pim, vec!["et-0/0/1.0".to_string()]);

    // No planning filter here: loopbacks stay in the summary.
    assert!(report.interfaces.contains_key("Loop0"));
    let record = &report.interfaces["et-0/0/1.0"];
    assert_eq!(record.tx_errors, Some(2));

    // Per-RIB detail nests under the interface whose address matches.
    let bgp = record.bgp.as_ref().unwrap();
    assert_eq!(bgp["192.0.2.3"].tables["inet.0"].active, 118);
    assert_eq!(bgp["192.0.2.3"].local_address, "192.0.2.2");
    assert!(report.non_port_bgp.contains_key("10.99.99.99"));
}

#[tokio::test]
async fn test_xr_device_report_adapts_aggregated_neighbors() {
    let server = MockServer::start().await;
    mount_rpc(
        &server,
        "get-facts",
        json!({"hostname": "xr1", "os_version": "7.9.2"}),
    )
    .await;
    mount_rpc(
        &server,
        "get-interfaces",
        json!({
            "HundredGigE0/0/0/1": {"is_enabled": true, "is_up": true}
        }),
    )
    .await;
    mount_rpc(
        &server,
        "get-bgp-neighbors",
        json!({
            "203.0.113.9": {
                "up": true,
                "remote_as": 65001,
                "routing_table": "vrf-transit",
                "received_prefix_count": 42,
                "accepted_prefix_count": 40,
                "advertised_prefix_count": 1
            }
        }),
    )
    .await;
    // The per-RIB getter is not available on this family; the collector
    // must not even try the RPC.
    Mock::given(method("POST"))
        .and(path("/rpc/get-bgp-neighbor-information"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let report = collector(&server)
        .device_report(&run(DeviceFamily::IosXr))
        .await
        .unwrap();

    let peer = &report.non_port_bgp["203.0.113.9"];
    assert_eq!(peer.remote_as, 65001);
    assert_eq!(peer.tables["vrf-transit"].received, 42);
    assert_eq!(peer.tables["vrf-transit"].active, 0);
}
