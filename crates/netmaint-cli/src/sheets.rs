//! Spreadsheet-bridge client.
//!
//! `plan --push` hands the planning tables to an external bridge service
//! that writes them into the capacity-planning workbook. The bridge owns
//! the workbook; this client only builds the payload and reports whether
//! the POST was accepted. The payload's tabular form is also what the
//! CLI table view renders, so both sinks show identical rows.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use url::Url;

use netmaint_core::{DeviceFamily, PlanningReport, normalize};

use crate::error::CliError;

// ── Payload shapes ───────────────────────────────────────────────────

/// One tabular structure: ordered columns plus ordered rows.
#[derive(Debug, Serialize)]
pub struct SheetTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Where the bridge should file the tables.
#[derive(Debug, Serialize)]
pub struct SheetContext {
    pub hostname: String,
    pub device_type: DeviceFamily,
    pub generated_at: DateTime<Utc>,
}

/// Everything the bridge needs for one planning push.
#[derive(Debug, Serialize)]
pub struct SheetPayload {
    pub context: SheetContext,
    pub interfaces: SheetTable,
    pub unmatched_bgp: SheetTable,
}

// ── Table shaping ────────────────────────────────────────────────────

/// Columns for the unattributed-neighbor table.
pub fn unmatched_columns() -> &'static [&'static str] {
    &["neighbor", "remote_as", "up", "routing_table"]
}

/// Shape a planning report into its two tabular structures.
pub fn planning_tables(report: &PlanningReport) -> (SheetTable, SheetTable) {
    let interfaces = SheetTable {
        columns: to_owned_columns(normalize::planning_columns()),
        rows: report
            .interfaces
            .iter()
            .map(|(name, record)| normalize::planning_row(name, record))
            .collect(),
    };
    let unmatched = SheetTable {
        columns: to_owned_columns(unmatched_columns()),
        rows: report
            .unmatched_bgp
            .iter()
            .map(|(peer, detail)| {
                vec![
                    peer.clone(),
                    detail.remote_as.to_string(),
                    detail.up.to_string(),
                    detail.routing_table.clone(),
                ]
            })
            .collect(),
    };
    (interfaces, unmatched)
}

fn to_owned_columns(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| (*c).to_string()).collect()
}

// ── Push ─────────────────────────────────────────────────────────────

/// POST both tables to the bridge. Returns the interface row count on
/// success, for the status line.
pub async fn push_planning(bridge_url: &str, report: &PlanningReport) -> Result<usize, CliError> {
    let endpoint: Url = bridge_url.parse().map_err(|_| CliError::SheetsPush {
        reason: format!("invalid bridge URL: {bridge_url}"),
    })?;

    let (interfaces, unmatched_bgp) = planning_tables(report);
    let row_count = interfaces.rows.len();
    let payload = SheetPayload {
        context: SheetContext {
            hostname: report.hostname.clone(),
            device_type: report.device_type,
            generated_at: report.generated_at,
        },
        interfaces,
        unmatched_bgp,
    };

    let client = reqwest::Client::new();
    let reply = client
        .post(endpoint)
        .json(&payload)
        .send()
        .await
        .map_err(|e| CliError::SheetsPush {
            reason: e.to_string(),
        })?;

    let status = reply.status();
    if !status.is_success() {
        let body = reply.text().await.unwrap_or_default();
        return Err(CliError::SheetsPush {
            reason: format!("HTTP {status}: {body}"),
        });
    }

    debug!(rows = row_count, "bridge accepted planning tables");
    Ok(row_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use netmaint_core::model::BgpNeighborDetail;

    #[test]
    fn test_planning_tables_order_rows_by_interface() {
        let mut interfaces = BTreeMap::new();
        interfaces.insert("et-0/0/1".to_string(), netmaint_core::InterfaceRecord::default());
        interfaces.insert("et-0/0/0".to_string(), netmaint_core::InterfaceRecord::default());

        let mut unmatched = BTreeMap::new();
        unmatched.insert(
            "10.9.9.9".to_string(),
            BgpNeighborDetail {
                up: true,
                remote_as: 64512,
                routing_table: "inet.0".to_string(),
                ..BgpNeighborDetail::default()
            },
        );

        let report = PlanningReport {
            hostname: "core1".to_string(),
            device_type: DeviceFamily::Junos,
            generated_at: chrono::Utc::now(),
            interfaces,
            unmatched_bgp: unmatched,
        };

        let (table, extra) = planning_tables(&report);
        assert_eq!(table.columns.len(), normalize::planning_columns().len());
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0], "et-0/0/0");
        assert_eq!(table.rows[1][0], "et-0/0/1");

        assert_eq!(
            extra.rows,
            vec![vec![
                "10.9.9.9".to_string(),
                "64512".to_string(),
                "true".to_string(),
                "inet.0".to_string(),
            ]]
        );
    }
}
