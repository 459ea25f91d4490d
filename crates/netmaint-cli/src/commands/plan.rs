//! Planning command handler.

use owo_colors::OwoColorize;

use netmaint_core::PlanningReport;

use crate::cli::{GlobalOpts, OutputFormat, PlanArgs};
use crate::error::CliError;
use crate::{output, sheets};

use super::util;

pub async fn handle(args: PlanArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (collector, cfg) = util::build_collector(global)?;
    let run = util::host_run(args.host, args.device_type);

    let report = collector.planning_report(&run).await?;

    let out = match global.output {
        OutputFormat::Table => render_tables(&report),
        OutputFormat::Json => output::render_json_pretty(&report),
        OutputFormat::JsonCompact => output::render_json_compact(&report),
        OutputFormat::Yaml => output::render_yaml(&report),
        OutputFormat::Plain => report
            .interfaces
            .keys()
            .cloned()
            .collect::<Vec<_>>()
            .join("\n"),
    };
    output::print_output(&out, global.quiet);

    if args.push {
        let Some(url) = cfg.sheets.url.as_deref() else {
            return Err(CliError::NoSheetsUrl);
        };
        let rows = sheets::push_planning(url, &report).await?;
        if !global.quiet {
            eprintln!(
                "{} pushed {rows} interface rows for {}",
                "✓".green(),
                report.hostname
            );
        }
    }

    Ok(())
}

fn render_tables(report: &PlanningReport) -> String {
    let (interfaces, unmatched) = sheets::planning_tables(report);
    let mut out = output::render_dynamic_table(&interfaces.columns, &interfaces.rows);
    if !unmatched.rows.is_empty() {
        out.push_str("\n\nUnattributed BGP neighbors\n");
        out.push_str(&output::render_dynamic_table(
            &unmatched.columns,
            &unmatched.rows,
        ));
    }
    out
}
