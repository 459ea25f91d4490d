//! Shared helpers for command handlers.

use std::path::Path;

use tracing::warn;

use netmaint_core::{Collector, DeviceFamily, Resolver, RunSpec};

use crate::cli::{DeviceTypeArg, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::secrets::KeyringVault;

/// Build the collector for a run: config, transport, vault, resolver.
///
/// A missing keyring secret aborts here, before any session is opened.
/// Reverse DNS is best-effort; a resolver failure only costs the DNS
/// column in circuit reports.
pub fn build_collector(global: &GlobalOpts) -> Result<(Collector<KeyringVault>, Config), CliError> {
    let cfg = config::load_config()?;
    let transport = config::build_transport(&cfg, global);
    let vault = KeyringVault::load()?;

    let collector = Collector::new(vault, transport);
    let collector = match Resolver::from_system() {
        Ok(resolver) => collector.with_resolver(resolver),
        Err(e) => {
            warn!(error = %e, "reverse DNS disabled for this run");
            collector
        }
    };
    Ok((collector, cfg))
}

/// Map the CLI flag onto the session device family.
pub fn family(device_type: DeviceTypeArg) -> DeviceFamily {
    match device_type {
        DeviceTypeArg::Junos => DeviceFamily::Junos,
        DeviceTypeArg::IosXr => DeviceFamily::IosXr,
    }
}

/// Run spec for the single-host workflows (plan, device).
pub fn host_run(host: String, device_type: DeviceTypeArg) -> RunSpec {
    RunSpec {
        hostname: host,
        device_type: family(device_type),
        global_router: None,
        circuits: Vec::new(),
    }
}

/// Read and parse a circuits run file.
pub fn read_run_spec(path: &Path) -> Result<RunSpec, CliError> {
    let contents = std::fs::read_to_string(path)?;
    let run: RunSpec = serde_json::from_str(&contents)?;
    Ok(run)
}
