//! CLI-owned configuration: the TOML file and its translation to
//! `netmaint_core::TransportConfig`.
//!
//! Core never sees these types -- it receives a pre-built transport.

use std::path::PathBuf;

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use netmaint_core::{TlsMode, TransportConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── TOML config structs ──────────────────────────────────────────────

/// CLI-owned TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Gateway defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Spreadsheet-bridge settings.
    #[serde(default)]
    pub sheets: Sheets,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// RPC gateway TCP port, uniform across the fleet.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Accept self-signed gateway certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate (PEM).
    pub ca_cert: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            port: default_port(),
            insecure: false,
            ca_cert: None,
        }
    }
}

fn default_port() -> u16 {
    3443
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Sheets {
    /// Ingest endpoint for `plan --push`.
    pub url: Option<String>,
}

// ── Config file path ─────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("net", "netops-tools", "netmaint")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        })
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("netmaint");
    p
}

// ── Config loading ───────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, CliError> {
    let path = config_path();

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("NETMAINT_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning the defaults if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Transport resolution ─────────────────────────────────────────────

/// Translate config + global flags into a `TransportConfig`.
///
/// Flags win over the config file; `--insecure` beats `ca_cert`.
pub fn build_transport(config: &Config, global: &GlobalOpts) -> TransportConfig {
    let tls = if global.insecure || config.defaults.insecure {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = config.defaults.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::SystemDefaults
    };

    TransportConfig {
        port: global.port.unwrap_or(config.defaults.port),
        plain_http: global.plain_http,
        tls,
    }
}
