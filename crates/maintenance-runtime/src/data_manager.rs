//! TTL-cached snapshot manager for the refresh runtime.
//!
//! Wraps [`analyze_source`] with a time-to-live cache and bounded retry.
//! Callers use [`DataManager::get_data`] to obtain a fresh-or-cached
//! [`DashboardSnapshot`]; when the source keeps failing, the last good
//! snapshot is returned and the error is kept for display.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use maintenance_data::analysis::{analyze_source, DashboardSnapshot};
use maintenance_data::reader::RecordSource;

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Maximum number of fetch attempts before giving up and returning stale data.
const MAX_RETRY_ATTEMPTS: u32 = 3;

// ── DataManager ───────────────────────────────────────────────────────────────

/// TTL-cached wrapper around the snapshot pipeline.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use maintenance_data::reader::JsonRecordSource;
/// use maintenance_runtime::data_manager::DataManager;
///
/// let source = Arc::new(JsonRecordSource::new("records.json"));
/// let mut mgr = DataManager::new(5, source);
/// if let Some(snapshot) = mgr.get_data(false) {
///     println!("MTTR: {:.2} h", snapshot.kpis.mttr_hours);
/// }
/// ```
pub struct DataManager {
    /// Maximum age of cached data before it is considered stale.
    cache_ttl: Duration,
    /// Where raw rows come from.
    source: Arc<dyn RecordSource>,
    /// Most recently built snapshot.
    cache: Option<DashboardSnapshot>,
    /// When the cache was last populated.
    cache_timestamp: Option<Instant>,
    /// Human-readable description of the last error encountered.
    last_error: Option<String>,
}

impl DataManager {
    /// Create a new manager reading from `source`.
    pub fn new(cache_ttl_secs: u64, source: Arc<dyn RecordSource>) -> Self {
        Self {
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            source,
            cache: None,
            cache_timestamp: None,
            last_error: None,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return a snapshot, using the cache when it is still valid.
    ///
    /// When `force_refresh` is `true` the cache is bypassed. On fetch failure
    /// the previous snapshot (if any) is returned as a fallback.
    ///
    /// The fetch is retried up to [`MAX_RETRY_ATTEMPTS`] times with linear
    /// back-off (0 ms → 100 ms → 200 ms).
    pub fn get_data(&mut self, force_refresh: bool) -> Option<&DashboardSnapshot> {
        if !force_refresh && self.is_cache_valid() {
            tracing::debug!("returning cached maintenance snapshot");
            return self.cache.as_ref();
        }

        match self.fetch_with_retry() {
            Ok(snapshot) => {
                tracing::debug!(
                    records = snapshot.records.len(),
                    mttr_hours = snapshot.kpis.mttr_hours,
                    "snapshot cache updated"
                );
                self.cache = Some(snapshot);
                self.cache_timestamp = Some(Instant::now());
                self.last_error = None;
                self.cache.as_ref()
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load maintenance records; keeping previous snapshot");
                self.last_error = Some(e);
                self.cache.as_ref()
            }
        }
    }

    /// Discard the current cache, forcing the next [`get_data`] call to fetch.
    ///
    /// [`get_data`]: DataManager::get_data
    pub fn invalidate_cache(&mut self) {
        self.cache = None;
        self.cache_timestamp = None;
        tracing::debug!("cache invalidated");
    }

    /// Age of the current cache entry, or `None` if no data has been fetched.
    pub fn cache_age(&self) -> Option<Duration> {
        self.cache_timestamp.map(|ts| ts.elapsed())
    }

    /// Human-readable description of the last fetch error, or `None`.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    // ── Private helpers ───────────────────────────────────────────────────

    /// `true` when the cache holds data that is still within its TTL.
    fn is_cache_valid(&self) -> bool {
        match (self.cache.as_ref(), self.cache_timestamp) {
            (Some(_), Some(ts)) => ts.elapsed() < self.cache_ttl,
            _ => false,
        }
    }

    /// Structural errors are returned on the first attempt; only transient
    /// failures are retried.
    fn fetch_with_retry(&self) -> Result<DashboardSnapshot, String> {
        let mut last_err = String::new();

        for attempt in 0..MAX_RETRY_ATTEMPTS {
            if attempt > 0 {
                let sleep_ms = u64::from(attempt) * 100;
                tracing::debug!(attempt, sleep_ms, "retrying fetch after back-off");
                thread::sleep(Duration::from_millis(sleep_ms));
            }

            match analyze_source(self.source.as_ref()) {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) if !e.is_transient() => {
                    tracing::warn!(attempt, error = %e, "fetch failed with a structural error");
                    return Err(e.to_string());
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "fetch attempt failed");
                    last_err = e.to_string();
                }
            }
        }

        Err(last_err)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
