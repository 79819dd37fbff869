mod summary;
pub mod views;

pub use summary::{percentage, MaintenanceReport};
