//! Shared types for the maintenance dashboard.
//!
//! Record and KPI models, timestamp parsing, duration formatting, settings
//! and the error type used by the data and runtime crates.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{MaintenanceError, Result};
