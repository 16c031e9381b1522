//! Cleaning and merging of raw maintenance rows.
//!
//! A single physical maintenance action is sometimes logged as two rows: one
//! carrying the start with no end, the next carrying the end with no start.
//! [`reconcile`] normalizes every row, orders them by `(tag, start)`, folds
//! such split rows back into one event and annotates each event with its
//! duration.

use std::cmp::Ordering;

use chrono::NaiveDateTime;
use maintenance_core::models::{
    join_descriptions, normalize_description, normalize_failure, RawMaintenanceRecord,
    ReconciledRecord,
};
use maintenance_core::time_utils::{hours_between, parse_timestamp};
use tracing::{debug, warn};

// ── Public API ────────────────────────────────────────────────────────────────

/// Turn raw source rows into the ordered, merged, duration-annotated set.
///
/// Field-level defects never fail the pass: unparseable timestamps become
/// unresolved, blank failures become [`NO_FAILURE`], inverted intervals get a
/// zero duration.
///
/// [`NO_FAILURE`]: maintenance_core::models::NO_FAILURE
pub fn reconcile(raw_records: &[RawMaintenanceRecord]) -> Vec<ReconciledRecord> {
    let mut rows: Vec<ReconciledRecord> = raw_records.iter().map(normalize_row).collect();

    // Stable, so rows with equal keys keep their source order.
    rows.sort_by(compare_tag_start);

    let merged = rows
        .into_iter()
        .fold(Vec::with_capacity(raw_records.len()), merge_step);

    let records: Vec<ReconciledRecord> = merged.into_iter().map(with_duration).collect();

    debug!(
        "Reconciled {} raw rows into {} records ({} merged away)",
        raw_records.len(),
        records.len(),
        raw_records.len() - records.len(),
    );

    records
}

/// Ordering used for the reconciled set: by tag, then by start, with
/// unresolved starts after every resolved one.
pub fn compare_tag_start(a: &ReconciledRecord, b: &ReconciledRecord) -> Ordering {
    a.tag
        .cmp(&b.tag)
        .then_with(|| compare_start(a.start.as_ref(), b.start.as_ref()))
}

/// `true` when `next` is the closing half of the open event `current`.
pub fn is_merge_eligible(current: &ReconciledRecord, next: &ReconciledRecord) -> bool {
    current.end.is_none() && next.start.is_none() && current.tag == next.tag
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn compare_start(a: Option<&NaiveDateTime>, b: Option<&NaiveDateTime>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Parse and normalize a single row; duration is filled in after merging.
fn normalize_row(raw: &RawMaintenanceRecord) -> ReconciledRecord {
    ReconciledRecord {
        tag: raw.tag.clone(),
        start: parse_timestamp(raw.start.as_deref()),
        end: parse_timestamp(raw.end.as_deref()),
        kind: raw.kind.clone(),
        failure: normalize_failure(raw.failure.as_deref()),
        description: normalize_description(raw.description.as_deref()),
        meter_reading: raw.meter_reading.as_ref().and_then(|m| m.resolve()),
        operator: raw.operator.clone(),
        duration_hours: 0.0,
    }
}

/// One step of the merge fold.
///
/// The last accumulated record is the only one that can still absorb a
/// successor, so a chain of eligible rows collapses into a single record.
fn merge_step(mut acc: Vec<ReconciledRecord>, next: ReconciledRecord) -> Vec<ReconciledRecord> {
    match acc.last_mut() {
        Some(current) if is_merge_eligible(current, &next) => absorb(current, next),
        _ => acc.push(next),
    }
    acc
}

/// Fold `next` into the open record `current`.
///
/// `current.end` is unresolved whenever this runs, so taking `next.end`
/// never discards a resolved end: the first resolvable end in a chain wins,
/// and a chain whose tail is still open stays open.
fn absorb(current: &mut ReconciledRecord, next: ReconciledRecord) {
    current.end = next.end;
    current.description = join_descriptions(&current.description, &next.description);
    if current.meter_reading.is_none() {
        current.meter_reading = next.meter_reading;
    }
}

fn with_duration(mut record: ReconciledRecord) -> ReconciledRecord {
    record.duration_hours = match (&record.start, &record.end) {
        (Some(start), Some(end)) => {
            let hours = hours_between(start, end);
            if hours < 0.0 {
                warn!(
                    tag = %record.tag,
                    %start,
                    %end,
                    "maintenance ends before it starts; duration clamped to zero"
                );
                0.0
            } else {
                hours
            }
        }
        _ => 0.0,
    };
    record
}

// ── Tests ─────────────────────────────────────────────────────────────────────
