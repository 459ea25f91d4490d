// Workflow orchestration: session lifecycle plus report assembly.
//
// Three workflows share one collection pattern (open, fixed getter
// sequence, normalize, close) and differ in which extra tables they pull
// and how they shape the result. Sessions are closed before any shaping
// happens; the circuit workflow's helper session is opened lazily and
// closed on every exit path.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info};

use netmaint_rpc::tables::RouteRecord;
use netmaint_rpc::{
    DeviceFamily, DeviceSession, Error as RpcError, Fetched, SessionTarget, TransportConfig,
};

use crate::creds::CredentialProvider;
use crate::dns::{Resolver, dns_column};
use crate::error::CoreError;
use crate::model::{
    CircuitIsis, CircuitRecord, CircuitsReport, DeviceReport, InterfaceRecord, PlanningReport,
    RunSpec,
};
use crate::normalize::{self, InterfaceSources};

// ── One-time code pacing ────────────────────────────────────────────

/// Validity window of a one-time login code.
pub const OTP_STEP: Duration = Duration::from_secs(30);

/// How long to wait before minting a second one-time code.
///
/// A code minted inside the window of the previous one comes out
/// identical, and the gateway rejects the replay.
pub fn otp_pacing_delay(minted_at: Instant, now: Instant) -> Duration {
    OTP_STEP.saturating_sub(now.saturating_duration_since(minted_at))
}

// ── Table selection ─────────────────────────────────────────────────

/// Optional tables a workflow fetches on top of the common set.
#[derive(Clone, Copy)]
struct TableSet {
    counters: bool,
    optics: bool,
}

impl TableSet {
    const PLANNING: Self = Self {
        counters: false,
        optics: true,
    };
    const SUMMARY: Self = Self {
        counters: true,
        optics: false,
    };
    const CIRCUITS: Self = Self {
        counters: true,
        optics: false,
    };
}

/// Fetch and merge the interface tables for one workflow.
async fn collect_interfaces(
    session: &DeviceSession,
    tables: TableSet,
) -> BTreeMap<String, InterfaceRecord> {
    let base = session.get_interfaces().await.or_empty();
    let sources = InterfaceSources {
        addresses: normalize::flatten_interface_ips(&session.get_interfaces_ip().await.or_empty()),
        mpls: session.get_mpls_interfaces().await.or_empty(),
        isis: session.get_isis_interfaces().await.or_empty(),
        arp: session.get_arp_table().await.or_empty(),
        nd: session.get_nd_table().await.or_empty(),
        counters: if tables.counters {
            Some(session.get_interfaces_counters().await.or_empty())
        } else {
            None
        },
        optics: if tables.optics {
            Some(session.get_optics_inventory().await.or_empty())
        } else {
            None
        },
    };
    normalize::merge_interface_tables(&base, &sources)
}

// ── Collector ───────────────────────────────────────────────────────

/// Runs the collection workflows against one device per run.
pub struct Collector<P> {
    creds: P,
    transport: TransportConfig,
    resolver: Option<Resolver>,
}

impl<P: CredentialProvider> Collector<P> {
    pub fn new(creds: P, transport: TransportConfig) -> Self {
        Self {
            creds,
            transport,
            resolver: None,
        }
    }

    /// Attach a reverse resolver; circuit reports gain DNS columns.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Planning dump: every relevant interface with optics, addresses and
    /// attributed BGP neighbors.
    pub async fn planning_report(&self, run: &RunSpec) -> Result<PlanningReport, CoreError> {
        let session = self.open_primary(run).await?;
        let interfaces = collect_interfaces(&session, TableSet::PLANNING).await;
        let neighbors =
            normalize::format_bgp_detail(&session.get_bgp_neighbors().await.or_empty());
        session.close();

        let interfaces = normalize::filter_planning_interfaces(interfaces);
        let (interfaces, unmatched_bgp) = normalize::collapse_bgp(interfaces, neighbors);

        Ok(PlanningReport {
            hostname: run.hostname.clone(),
            device_type: run.device_type,
            generated_at: Utc::now(),
            interfaces,
            unmatched_bgp,
        })
    }

    /// Device summary: software, counters, multicast peers and the full
    /// BGP neighbor picture.
    pub async fn device_report(&self, run: &RunSpec) -> Result<DeviceReport, CoreError> {
        let session = self.open_primary(run).await?;
        let facts = session.get_facts().await.or_empty();
        let interfaces = collect_interfaces(&session, TableSet::SUMMARY).await;

        // Per-RIB detail where the family has it; the aggregated shape
        // adapted into the same nesting everywhere else.
        let neighbors = match session.get_bgp_neighbors_detail().await {
            Fetched::Available(detail) => detail,
            Fetched::Unavailable(RpcError::Unsupported { .. }) => {
                normalize::format_bgp_detail(&session.get_bgp_neighbors().await.or_empty())
            }
            Fetched::Unavailable(_) => BTreeMap::new(),
        };

        let msdp = session.get_msdp_neighbors().await.or_empty();
        let pim = session.get_pim_neighbors().await.or_empty();
        session.close();

        let (interfaces, non_port_bgp) = normalize::collapse_bgp(interfaces, neighbors);

        Ok(DeviceReport {
            hostname: run.hostname.clone(),
            generated_at: Utc::now(),
            software: facts.os_version,
            non_port_bgp,
            msdp,
            pim,
            interfaces,
        })
    }

    /// Per-circuit report: interface subset, ISIS adjacency, and the BGP
    /// routes received over each circuit.
    pub async fn circuits_report(&self, run: &RunSpec) -> Result<CircuitsReport, CoreError> {
        if !run.device_type.resolves_routes_locally()
            && !run.circuits.is_empty()
            && run.global_router.is_none()
        {
            return Err(CoreError::InvalidRunSpec {
                message: format!(
                    "{} devices need global_router for circuit route lookups",
                    run.device_type
                ),
            });
        }

        let session = self.open_primary(run).await?;
        let interfaces = collect_interfaces(&session, TableSet::CIRCUITS).await;

        let mut helper: Option<DeviceSession> = None;
        let result = self
            .assemble_circuits(&session, &mut helper, run, &interfaces)
            .await;

        // Close both sessions on every exit path before surfacing errors.
        session.close();
        if let Some(h) = helper {
            h.close();
        }

        Ok(CircuitsReport { circuits: result? })
    }

    async fn assemble_circuits(
        &self,
        session: &DeviceSession,
        helper: &mut Option<DeviceSession>,
        run: &RunSpec,
        interfaces: &BTreeMap<String, InterfaceRecord>,
    ) -> Result<BTreeMap<String, CircuitRecord>, CoreError> {
        let mut circuits = BTreeMap::new();

        for spec in &run.circuits {
            let label = spec.label();
            let Some(record) = interfaces.get(&spec.port) else {
                return Err(CoreError::UnknownPort {
                    label,
                    port: spec.port.clone(),
                    host: session.hostname().to_string(),
                });
            };

            let dns = self.resolve_dns(record).await;
            let mut circuit = CircuitRecord::from_interface(&spec.port, record, dns);

            let neighbors: Vec<String> = if record.isis_state == Some(true) {
                circuit.isis = Some(CircuitIsis {
                    neighbor: record.isis_neighbor.clone().unwrap_or_default(),
                    state: true,
                    next_hop: record.isis_nh.clone().unwrap_or_default(),
                    ipv6: record.isis_ipv6.unwrap_or_default(),
                    metric: record.isis_metric.unwrap_or_default(),
                    mpls: record.mpls_enabled,
                });
                // ISIS circuits look up routes only for neighbors the
                // caller named; nothing is inferred from ARP/ND.
                [spec.v4_neighbor.clone(), spec.v6_neighbor.clone()]
                    .into_iter()
                    .flatten()
                    .collect()
            } else {
                [
                    spec.v4_neighbor.clone().or_else(|| record.arp_nh.clone()),
                    spec.v6_neighbor.clone().or_else(|| record.nd_nh.clone()),
                ]
                .into_iter()
                .flatten()
                .collect()
            };

            if !neighbors.is_empty() {
                circuit.bgp = Some(
                    self.neighbor_routes(session, helper, run, &neighbors)
                        .await?,
                );
            }

            debug!(%label, port = %spec.port, neighbors = neighbors.len(), "circuit assembled");
            circuits.insert(label, circuit);
        }

        Ok(circuits)
    }

    /// Routes received from the given neighbors, resolved wherever the
    /// device family can answer.
    async fn neighbor_routes(
        &self,
        session: &DeviceSession,
        helper: &mut Option<DeviceSession>,
        run: &RunSpec,
        neighbors: &[String],
    ) -> Result<BTreeMap<String, RouteRecord>, CoreError> {
        if session.family().resolves_routes_locally() {
            let mut routes = BTreeMap::new();
            for peer in neighbors {
                routes.extend(session.get_bgp_neighbor_routes(peer).await.or_empty());
            }
            return Ok(routes);
        }

        let mut prefixes = Vec::new();
        for peer in neighbors {
            prefixes.extend(session.get_bgp_neighbor_prefixes(peer).await.or_empty());
        }
        if prefixes.is_empty() {
            return Ok(BTreeMap::new());
        }

        if helper.is_none() {
            *helper = Some(self.open_helper(run, session.auth_minted_at()).await?);
        }
        match helper.as_ref() {
            Some(h) => Ok(h.get_route_to(&prefixes).await.or_empty()),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Open the helper session against the run's global router.
    ///
    /// Waits out the one-time code window of the primary credential first,
    /// then mints a fresh one. The global router is always a family that
    /// resolves routes locally.
    async fn open_helper(
        &self,
        run: &RunSpec,
        primary_minted: Instant,
    ) -> Result<DeviceSession, CoreError> {
        let Some(global_router) = run.global_router.as_deref() else {
            return Err(CoreError::InvalidRunSpec {
                message: "global_router required for route lookups".into(),
            });
        };

        let wait = otp_pacing_delay(primary_minted, Instant::now());
        if !wait.is_zero() {
            info!(wait = ?wait, "waiting out one-time code window before helper login");
            tokio::time::sleep(wait).await;
        }

        let auth = self.creds.device_auth()?;
        let target = SessionTarget::resolve(global_router, DeviceFamily::Junos).await?;
        let session = DeviceSession::open(target, &auth, &self.transport).await?;
        info!(host = %session.hostname(), "helper session open");
        Ok(session)
    }

    async fn open_primary(&self, run: &RunSpec) -> Result<DeviceSession, CoreError> {
        let auth = self.creds.device_auth()?;
        let target = SessionTarget::resolve(&run.hostname, run.device_type).await?;
        Ok(DeviceSession::open(target, &auth, &self.transport).await?)
    }

    /// DNS column for a circuit's interface, when a resolver is attached.
    async fn resolve_dns(&self, record: &InterfaceRecord) -> Option<String> {
        let with_len = record
            .ipv4_address
            .as_deref()
            .or_else(|| record.ipv6_address.as_deref())?;
        let bare = with_len.split('/').next().unwrap_or(with_len);
        match (&self.resolver, bare.parse::<IpAddr>().ok()) {
            (Some(resolver), Some(address)) => {
                Some(dns_column(resolver.reverse_name(address).await, bare))
            }
            _ => None,
        }
    }
}
