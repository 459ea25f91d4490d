//! Circuits audit command handler.

use crate::cli::{CircuitsArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(args: CircuitsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    // Parse the run file before touching the keyring, so a typo in the
    // input fails without prompting for secret-store access.
    let run = util::read_run_spec(&args.file)?;

    let (collector, _cfg) = util::build_collector(global)?;
    let report = collector.circuits_report(&run).await?;

    let out = output::render_report(&global.output, &report, |r| {
        r.circuits.keys().cloned().collect::<Vec<_>>().join("\n")
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
