//! Reliability KPIs and chart breakdowns over a reconciled record set.

use std::collections::BTreeMap;

use maintenance_core::formatting::{percentage, round_to};
use maintenance_core::models::{GroupField, KpiBundle, ReconciledRecord, SeriesPoint};

/// Per-category record counts.
pub type GroupCounts = BTreeMap<String, usize>;

/// Per-tag duration series, each ordered by start.
pub type TimeSeries = BTreeMap<String, Vec<SeriesPoint>>;

// ── MaintenanceAggregator ─────────────────────────────────────────────────────

/// Stateless helper that summarises reconciled maintenance records.
///
/// Expects the output of [`reconcile`](crate::reconciler::reconcile); it
/// never fails, and every figure is zero for an empty set.
pub struct MaintenanceAggregator;

impl MaintenanceAggregator {
    /// Compute the KPI bundle.
    ///
    /// MTTR is left unrounded so it always lies between zero and the longest
    /// duration; the failure share and total hours are rounded to 2 dp.
    pub fn aggregate(records: &[ReconciledRecord]) -> KpiBundle {
        if records.is_empty() {
            return KpiBundle::default();
        }

        let count = records.len() as f64;
        let total: f64 = records.iter().map(|r| r.duration_hours).sum();
        let failures = records.iter().filter(|r| r.has_failure()).count();

        let readings: Vec<f64> = records.iter().filter_map(|r| r.meter_reading).collect();
        let mean_meter_reading = if readings.is_empty() {
            0.0
        } else {
            readings.iter().sum::<f64>() / readings.len() as f64
        };

        KpiBundle {
            mttr_hours: total / count,
            failure_percentage: percentage(failures as f64, count, 2),
            total_hours: round_to(total, 2),
            mean_meter_reading,
        }
    }

    /// Count records per distinct value of `field`.
    pub fn group_counts(records: &[ReconciledRecord], field: GroupField) -> GroupCounts {
        let mut counts = GroupCounts::new();
        for record in records {
            *counts.entry(field.value_of(record).to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Build the `(start, duration)` series for every tag.
    ///
    /// Records without a resolved start are left out. Points are sorted by
    /// start within each tag, which is already the reconciled order.
    pub fn time_series(records: &[ReconciledRecord]) -> TimeSeries {
        let mut series = TimeSeries::new();
        for record in records {
            let Some(start) = record.start else { continue };
            series.entry(record.tag.clone()).or_default().push(SeriesPoint {
                start,
                duration_hours: record.duration_hours,
            });
        }
        for points in series.values_mut() {
            points.sort_by_key(|p| p.start);
        }
        series
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
