//! Maintenance desk for hostel residents, owners, and maintenance staff.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
