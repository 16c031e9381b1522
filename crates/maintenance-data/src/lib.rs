//! Data layer for the maintenance dashboard.
//!
//! Loads raw maintenance rows, reconciles split events into a clean record
//! set, and derives the KPIs and breakdowns shown by the dashboard.

pub mod aggregator;
pub mod analysis;
pub mod reader;
pub mod reconciler;

pub use maintenance_core as core;
