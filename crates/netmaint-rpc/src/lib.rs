//! Async RPC client for router management-plane gateways.
//!
//! Routers in the maintenance fleet expose their operational tables through
//! a JSON-over-HTTPS gateway: `POST /rpc/{name}` with an optional JSON
//! argument object returns the reply document for that RPC. This crate owns
//! everything wire-facing: transport construction, session lifecycle, the
//! per-family RPC catalogs, and the adapters that turn vendor reply
//! envelopes into the table types `netmaint-core` consumes.
//!
//! Getters never abort a collection run. Each one returns [`Fetched`], and
//! a failing table degrades to [`Fetched::Unavailable`] with the failure
//! logged; only session setup errors propagate as hard errors.

pub mod error;
pub mod session;
pub mod tables;
pub mod transport;

mod iosxr;
mod junos;

pub use error::Error;
pub use session::{DeviceFamily, DeviceSession, Fetched, SessionAuth, SessionTarget};
pub use transport::{SESSION_TIMEOUT, TlsMode, TransportConfig};
