//! Device summary command handler.

use crate::cli::{DeviceArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(args: DeviceArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (collector, _cfg) = util::build_collector(global)?;
    let run = util::host_run(args.host, args.device_type);

    let report = collector.device_report(&run).await?;

    let out = output::render_report(&global.output, &report, |r| {
        format!("{} {}", r.hostname, r.software)
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
