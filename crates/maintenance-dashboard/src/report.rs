//! Stdout rendering of dashboard updates.
//!
//! Charts and styled tables belong to whatever front end consumes the JSON
//! output; the text form here is a plain summary for terminals and logs.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::Local;
use maintenance_core::formatting::{format_hours_hhmm, format_percentage};
use maintenance_core::models::ReconciledRecord;
use maintenance_core::time_utils::{format_timestamp, OPEN_SENTINEL};
use maintenance_data::analysis::DashboardSnapshot;
use maintenance_runtime::orchestrator::DashboardUpdate;

/// Message shown when there is nothing to display.
pub const EMPTY_STATE_MESSAGE: &str = "Failed to load data or the maintenance table is empty.";

/// How each update is written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// Map the `--format` value; anything but `"json"` is text.
    pub fn from_setting(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Render `update` in the requested format.
pub fn render(update: &DashboardUpdate, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => render_json(update),
        OutputFormat::Text => Ok(render_text(update)),
    }
}

fn render_json(update: &DashboardUpdate) -> anyhow::Result<String> {
    let value = match &update.snapshot {
        Some(snapshot) => serde_json::json!({
            "refreshCount": update.refresh_count,
            "error": update.error,
            "snapshot": snapshot,
        }),
        None => serde_json::json!({
            "refreshCount": update.refresh_count,
            "error": update.error.as_deref().unwrap_or(EMPTY_STATE_MESSAGE),
            "snapshot": null,
        }),
    };
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Plain-text summary: header, KPIs, breakdowns, then the record table.
pub fn render_text(update: &DashboardUpdate) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Maintenance Dashboard ===");

    let snapshot = match &update.snapshot {
        Some(s) if !s.is_empty() => s,
        _ => {
            let _ = writeln!(out, "{}", EMPTY_STATE_MESSAGE);
            if let Some(err) = &update.error {
                let _ = writeln!(out, "Last error: {}", err);
            }
            return out;
        }
    };

    let _ = writeln!(
        out,
        "Last update: {}",
        snapshot
            .generated_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(err) = &update.error {
        let _ = writeln!(out, "Showing previous data; last load failed: {}", err);
    }
    out.push('\n');

    write_kpis(&mut out, snapshot);
    write_counts(&mut out, "By maintenance type", &snapshot.by_kind);
    write_counts(&mut out, "By failure", &snapshot.by_failure);
    write_counts(&mut out, "By tag", &snapshot.by_tag);
    write_records(&mut out, &snapshot.records);

    out
}

fn write_kpis(out: &mut String, snapshot: &DashboardSnapshot) {
    let kpis = &snapshot.kpis;
    let _ = writeln!(
        out,
        "MTTR: {} ({:.2} h)   Failures: {}   Total: {}   Mean meter: {:.1}",
        format_hours_hhmm(kpis.mttr_hours),
        kpis.mttr_hours,
        format_percentage(kpis.failure_percentage),
        format_hours_hhmm(kpis.total_hours),
        kpis.mean_meter_reading,
    );
    let _ = writeln!(
        out,
        "Records: {} ({} raw rows, {} merged, {} open)",
        snapshot.metadata.reconciled_records,
        snapshot.metadata.raw_rows,
        snapshot.metadata.merged_rows,
        snapshot.metadata.open_records,
    );
    out.push('\n');
}

fn write_counts(out: &mut String, title: &str, counts: &BTreeMap<String, usize>) {
    let _ = writeln!(out, "{}:", title);
    for (category, count) in counts {
        let label = if category.is_empty() { "(blank)" } else { category };
        let _ = writeln!(out, "  {:<24} {:>5}", label, count);
    }
    out.push('\n');
}

fn write_records(out: &mut String, records: &[ReconciledRecord]) {
    let _ = writeln!(
        out,
        "{:<12} {:<19} {:<19} {:>8} {:<14} {:<14} Description",
        "Tag", "Start", "End", "Duration", "Type", "Failure"
    );
    for r in records {
        let _ = writeln!(
            out,
            "{:<12} {:<19} {:<19} {:>8} {:<14} {:<14} {}",
            r.tag,
            timestamp_cell(&r.start),
            timestamp_cell(&r.end),
            format_hours_hhmm(r.duration_hours),
            r.kind,
            r.failure,
            r.description,
        );
    }
}

fn timestamp_cell(ts: &Option<chrono::NaiveDateTime>) -> String {
    ts.as_ref()
        .map(format_timestamp)
        .unwrap_or_else(|| OPEN_SENTINEL.to_string())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
