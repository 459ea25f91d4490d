//! Report assembly for router maintenance runs.
//!
//! `netmaint-core` turns raw device tables from [`netmaint_rpc`] into the
//! three operator-facing artifacts: the planning dump, the per-device
//! summary, and the per-circuit report. Everything here is policy (which
//! tables to fetch, how to merge and reshape them, when a helper session
//! is needed) while the wire mechanics stay in `netmaint-rpc`.

pub mod creds;
pub mod dns;
pub mod error;
pub mod model;
pub mod normalize;
pub mod report;

pub use creds::{CredentialProvider, TicketingCredentials};
pub use dns::Resolver;
pub use error::CoreError;
pub use model::{
    CircuitRecord, CircuitSpec, CircuitsReport, DeviceReport, InterfaceRecord, PlanningReport,
    RunSpec,
};
pub use report::Collector;

// Re-exported so consumers configure sessions without naming the rpc crate.
pub use netmaint_rpc::{DeviceFamily, SessionAuth, TlsMode, TransportConfig};
