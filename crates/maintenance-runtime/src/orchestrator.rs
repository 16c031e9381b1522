//! Async refresh orchestrator.
//!
//! Rebuilds the [`DashboardSnapshot`] on a fixed interval in a tokio task and
//! sends each result through an `mpsc` channel, so the presentation side
//! consumes updates without any shared mutable state.

use std::sync::Arc;
use std::time::Duration;

use maintenance_data::analysis::DashboardSnapshot;
use maintenance_data::reader::RecordSource;
use tokio::sync::mpsc;
use tokio::time;

use crate::data_manager::DataManager;

// ── Public types ──────────────────────────────────────────────────────────────

/// One refresh result forwarded to the presentation layer.
#[derive(Debug, Clone)]
pub struct DashboardUpdate {
    /// Latest snapshot, or `None` when nothing could be loaded yet.
    pub snapshot: Option<DashboardSnapshot>,
    /// Error from the most recent load attempt, if it failed.
    pub error: Option<String>,
    /// 1-based count of refreshes performed by this orchestrator.
    pub refresh_count: u64,
}

impl DashboardUpdate {
    /// `true` when the dashboard should show its empty state: nothing loaded,
    /// or a snapshot without records.
    pub fn is_empty(&self) -> bool {
        self.snapshot.as_ref().map_or(true, DashboardSnapshot::is_empty)
    }
}

// ── RefreshOrchestrator ───────────────────────────────────────────────────────

/// Periodic refresh coordinator.
///
/// Call [`RefreshOrchestrator::start`] to spin up the refresh loop in a
/// dedicated tokio task and receive a channel endpoint for updates.
pub struct RefreshOrchestrator {
    /// How often to rebuild the snapshot.
    update_interval: Duration,
    /// TTL handed to the [`DataManager`].
    cache_ttl_secs: u64,
    source: Arc<dyn RecordSource>,
}

impl RefreshOrchestrator {
    pub fn new(
        update_interval_secs: u64,
        cache_ttl_secs: u64,
        source: Arc<dyn RecordSource>,
    ) -> Self {
        Self {
            update_interval: Duration::from_secs(update_interval_secs),
            cache_ttl_secs,
            source,
        }
    }

    /// Start the refresh loop.
    ///
    /// Returns the receiving end for [`DashboardUpdate`]s and a
    /// [`RefreshHandle`] that stops the loop.
    pub fn start(self) -> (mpsc::Receiver<DashboardUpdate>, RefreshHandle) {
        // Buffer a modest number of updates so slow consumers don't stall the loop.
        let (tx, rx) = mpsc::channel(16);

        let handle = tokio::spawn(async move {
            self.refresh_loop(tx).await;
        });

        (rx, RefreshHandle { handle })
    }

    // ── Private implementation ────────────────────────────────────────────

    /// Fetch immediately, then once per `update_interval` until the receiver
    /// is dropped.
    async fn refresh_loop(self, tx: mpsc::Sender<DashboardUpdate>) {
        let mut data_manager = DataManager::new(self.cache_ttl_secs, self.source.clone());
        let mut refresh_count = 0u64;

        let mut interval = time::interval(self.update_interval);
        // The first tick completes immediately and triggers the initial fetch.
        let mut force = true;

        loop {
            interval.tick().await;

            if tx.is_closed() {
                tracing::debug!("dashboard channel closed; exiting refresh loop");
                break;
            }

            refresh_count += 1;
            let update = DashboardUpdate {
                snapshot: data_manager.get_data(force).cloned(),
                error: data_manager.last_error().map(str::to_string),
                refresh_count,
            };
            force = false;

            if update.snapshot.is_none() {
                tracing::warn!(source = %self.source.describe(), "no maintenance data available");
            }

            if tx.send(update).await.is_err() {
                tracing::debug!("dashboard receiver dropped; exiting refresh loop");
                break;
            }
        }
    }
}

// ── RefreshHandle ─────────────────────────────────────────────────────────────

/// A handle to the background refresh task.
pub struct RefreshHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl RefreshHandle {
    /// Immediately abort the refresh loop.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use maintenance_core::models::RawMaintenanceRecord;

    fn rows() -> Arc<dyn RecordSource> {
        Arc::new(vec![
            RawMaintenanceRecord {
                tag: "T1".to_string(),
                start: Some("01-01-2024 08:00:00".to_string()),
                end: Some("-".to_string()),
                ..Default::default()
            },
            RawMaintenanceRecord {
                tag: "T1".to_string(),
                start: Some("-".to_string()),
                end: Some("01-01-2024 10:00:00".to_string()),
                ..Default::default()
            },
        ])
    }

    #[test]
    fn test_orchestrator_creation() {
        let orch = RefreshOrchestrator::new(10, 5, rows());
        assert_eq!(orch.update_interval, Duration::from_secs(10));
        assert_eq!(orch.cache_ttl_secs, 5);
    }

    #[test]
    fn test_update_is_empty() {
        let update = DashboardUpdate {
            snapshot: None,
            error: Some("boom".to_string()),
            refresh_count: 1,
        };
        assert!(update.is_empty());
    }

    #[tokio::test]
    async fn test_orchestrator_sends_initial_snapshot() {
        let orch = RefreshOrchestrator::new(60, 5, rows());
        let (mut rx, handle) = orch.start();

        let update = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for update")
            .expect("channel closed before receiving update");

        assert_eq!(update.refresh_count, 1);
        assert!(update.error.is_none());
        assert!(!update.is_empty());
        let snapshot = update.snapshot.unwrap();
        assert_eq!(snapshot.records.len(), 1);
        assert!((snapshot.kpis.total_hours - 2.0).abs() < 1e-9);

        handle.abort();
    }

    #[tokio::test]
    async fn test_orchestrator_reports_missing_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("absent.json");
        let source = Arc::new(maintenance_data::reader::JsonRecordSource::new(missing));

        let orch = RefreshOrchestrator::new(60, 5, source);
        let (mut rx, handle) = orch.start();

        let update = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for update")
            .expect("channel closed before receiving update");

        assert!(update.is_empty());
        assert!(update.error.unwrap().contains("Data path not found"));

        handle.abort();
    }

    #[tokio::test]
    async fn test_orchestrator_refreshes_periodically() {
        let orch = RefreshOrchestrator::new(1, 0, rows());
        let (mut rx, handle) = orch.start();

        let first = rx.recv().await.expect("first update");
        let second = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for second update")
            .expect("channel closed");

        assert_eq!(first.refresh_count, 1);
        assert_eq!(second.refresh_count, 2);

        handle.abort();
    }

    #[tokio::test]
    async fn test_orchestrator_stops_when_receiver_dropped() {
        let orch = RefreshOrchestrator::new(1, 0, rows());
        let (rx, handle) = orch.start();
        drop(rx);

        let finished = tokio::time::timeout(Duration::from_secs(5), handle.handle).await;
        assert!(finished.is_ok(), "refresh loop should exit once the receiver is gone");
    }
}
