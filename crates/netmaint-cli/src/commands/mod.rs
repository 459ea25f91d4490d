//! Command dispatch: bridges CLI args -> collector workflows -> output.

pub mod circuits;
pub mod config_cmd;
pub mod device;
pub mod plan;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a collector-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Plan(args) => plan::handle(args, global).await,
        Command::Device(args) => device::handle(args, global).await,
        Command::Circuits(args) => circuits::handle(args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
