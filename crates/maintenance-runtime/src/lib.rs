//! Refresh runtime for the maintenance dashboard.
//!
//! Caches snapshots over a record source and rebuilds them periodically in
//! a background task.

pub mod data_manager;
pub mod orchestrator;

pub use maintenance_core as core;
pub use maintenance_data as data;
