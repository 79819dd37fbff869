use serde::Serialize;

use super::super::domain::{MaintenanceCategory, MaintenancePriority, MaintenanceStatus};

#[derive(Debug, Clone, Serialize)]
pub struct StatusCountEntry {
    pub status: MaintenanceStatus,
    pub status_label: &'static str,
    pub count: usize,
    pub share_pct: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCountEntry {
    pub category: MaintenanceCategory,
    pub category_label: &'static str,
    pub count: usize,
    pub open: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriorityCountEntry {
    pub priority: MaintenancePriority,
    pub priority_label: &'static str,
    pub count: usize,
    pub open: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceReportSummary {
    pub total: usize,
    pub open: usize,
    pub urgent_open: usize,
    pub completion_rate: u8,
    pub cancellation_rate: u8,
    pub status_breakdown: Vec<StatusCountEntry>,
    pub category_breakdown: Vec<CategoryCountEntry>,
    pub priority_breakdown: Vec<PriorityCountEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f32>,
    pub rating_count: usize,
    pub total_actual_cost: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_resolution_hours: Option<f32>,
}
