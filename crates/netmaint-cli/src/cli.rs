//! Clap derive structures for the `netmaint` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! This module depends only on clap + clap_complete so the build script
//! can compile it standalone for man-page generation.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// netmaint -- maintenance-state collector for the router fleet
#[derive(Debug, Parser)]
#[command(
    name = "netmaint",
    version,
    about = "Collect router state for maintenance planning and circuit audits",
    long_about = "Collects interface, routing, and neighbor state from routers\n\
        through their JSON RPC gateways, normalizes the vendor reply shapes,\n\
        and emits planning tables, device summaries, and per-circuit reports.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "NETMAINT_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// RPC gateway port (overrides config)
    #[arg(long, env = "NETMAINT_PORT", global = true)]
    pub port: Option<u16>,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "NETMAINT_INSECURE", global = true)]
    pub insecure: bool,

    /// Talk plain HTTP to the gateway (lab setups only)
    #[arg(long, global = true)]
    pub plain_http: bool,
}

// ── Shared Enums ─────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

/// Device OS family, as tagged in run inputs.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DeviceTypeArg {
    /// Juniper Junos
    Junos,
    /// Cisco IOS-XR
    #[value(name = "iosxr", alias = "ios-xr")]
    IosXr,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Capacity-planning dump: every relevant interface plus BGP attribution
    Plan(PlanArgs),

    /// Per-device health summary (software, BGP, MSDP, PIM, interfaces)
    #[command(alias = "dev")]
    Device(DeviceArgs),

    /// Per-circuit audit driven by a run file
    #[command(alias = "ckt")]
    Circuits(CircuitsArgs),

    /// Manage configuration and keyring secrets
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Command Arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Router hostname
    pub host: String,

    /// Device OS family
    #[arg(long, short = 't', value_enum)]
    pub device_type: DeviceTypeArg,

    /// Push the tables to the configured spreadsheet bridge
    #[arg(long)]
    pub push: bool,
}

#[derive(Debug, Args)]
pub struct DeviceArgs {
    /// Router hostname
    pub host: String,

    /// Device OS family
    #[arg(long, short = 't', value_enum)]
    pub device_type: DeviceTypeArg,
}

#[derive(Debug, Args)]
pub struct CircuitsArgs {
    /// Run file (JSON: hostname, device_type, circuits, optional global_router)
    #[arg(long, short = 'f')]
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a starter config file
    Init,

    /// Print the config file path
    Path,

    /// Display current resolved configuration
    Show,

    /// Store a secret in the system keyring
    SetSecret(SetSecretArgs),

    /// Verify every required secret resolves
    Check,
}

#[derive(Debug, Args)]
pub struct SetSecretArgs {
    /// Which secret to store
    #[arg(value_enum)]
    pub name: SecretName,

    /// Value (prompted for when omitted)
    #[arg(long)]
    pub value: Option<String>,
}

/// The five keyring accounts the collector needs.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SecretName {
    /// Primary login user
    PrimaryUser,
    /// Primary login password
    PrimaryPassword,
    /// Ticketing-system base URL
    TicketUrl,
    /// Static MFA password prefix
    MfaPassword,
    /// Base32 TOTP seed
    OtpSeed,
}

impl SecretName {
    /// Keyring account name for this secret.
    pub fn account(self) -> &'static str {
        match self {
            Self::PrimaryUser => "primary-user",
            Self::PrimaryPassword => "primary-password",
            Self::TicketUrl => "ticket-url",
            Self::MfaPassword => "mfa-password",
            Self::OtpSeed => "otp-seed",
        }
    }
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
