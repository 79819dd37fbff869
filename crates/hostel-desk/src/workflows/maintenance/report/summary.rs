use std::collections::HashMap;

use super::super::domain::{
    MaintenanceCategory, MaintenancePriority, MaintenanceStatus, RequestSnapshot,
};
use super::views::{
    CategoryCountEntry, MaintenanceReportSummary, PriorityCountEntry, StatusCountEntry,
};

#[derive(Debug, Default, Clone)]
pub struct BucketCount {
    pub total: usize,
    pub open: usize,
}

/// One-pass tally over a set of requests.
#[derive(Debug, Default, Clone)]
pub struct MaintenanceReport {
    pub total: usize,
    pub by_status: HashMap<MaintenanceStatus, usize>,
    pub by_category: HashMap<MaintenanceCategory, BucketCount>,
    pub by_priority: HashMap<MaintenancePriority, BucketCount>,
    pub rating_sum: u32,
    pub rating_count: usize,
    pub total_actual_cost: u64,
    resolution_minutes: i64,
    resolved_with_timing: usize,
}

/// `round(part / total * 100)`, and 0 for an empty total.
pub fn percentage(part: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = ((part as f64 / total as f64) * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

impl MaintenanceReport {
    pub fn from_snapshots<I>(snapshots: I) -> Self
    where
        I: IntoIterator<Item = RequestSnapshot>,
    {
        let mut report = Self::default();
        for snapshot in snapshots {
            report.record(&snapshot);
        }
        report
    }

    pub fn record(&mut self, snapshot: &RequestSnapshot) {
        let open = !snapshot.status.is_terminal();
        self.total += 1;
        *self.by_status.entry(snapshot.status).or_default() += 1;

        let category = self.by_category.entry(snapshot.category).or_default();
        category.total += 1;
        let priority = self.by_priority.entry(snapshot.priority).or_default();
        priority.total += 1;
        if open {
            category.open += 1;
            priority.open += 1;
        }

        if let Some(score) = snapshot.rating {
            self.rating_sum += u32::from(score);
            self.rating_count += 1;
        }

        if snapshot.status == MaintenanceStatus::Completed {
            self.total_actual_cost += u64::from(snapshot.actual_cost.unwrap_or(0));
            if let (Some(created), Some(completed)) = (snapshot.created_at, snapshot.completed_at)
            {
                let minutes = (completed - created).num_minutes();
                if minutes >= 0 {
                    self.resolution_minutes += minutes;
                    self.resolved_with_timing += 1;
                }
            }
        }
    }

    pub fn count(&self, status: MaintenanceStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    pub fn open(&self) -> usize {
        MaintenanceStatus::ordered()
            .into_iter()
            .filter(|status| !status.is_terminal())
            .map(|status| self.count(status))
            .sum()
    }

    pub fn urgent_open(&self) -> usize {
        self.by_priority
            .get(&MaintenancePriority::Urgent)
            .map_or(0, |bucket| bucket.open)
    }

    pub fn completion_rate(&self) -> u8 {
        percentage(self.count(MaintenanceStatus::Completed), self.total)
    }

    pub fn cancellation_rate(&self) -> u8 {
        percentage(self.count(MaintenanceStatus::Cancelled), self.total)
    }

    /// Mean score rounded to one decimal.
    pub fn average_rating(&self) -> Option<f32> {
        if self.rating_count == 0 {
            return None;
        }
        let mean = self.rating_sum as f32 / self.rating_count as f32;
        Some((mean * 10.0).round() / 10.0)
    }

    pub fn average_resolution_hours(&self) -> Option<f32> {
        if self.resolved_with_timing == 0 {
            return None;
        }
        let hours = self.resolution_minutes as f32 / 60.0 / self.resolved_with_timing as f32;
        Some((hours * 10.0).round() / 10.0)
    }

    pub fn summary(&self) -> MaintenanceReportSummary {
        let status_breakdown = MaintenanceStatus::ordered()
            .into_iter()
            .map(|status| {
                let count = self.count(status);
                StatusCountEntry {
                    status,
                    status_label: status.label(),
                    count,
                    share_pct: percentage(count, self.total),
                }
            })
            .collect();

        let category_breakdown = MaintenanceCategory::ordered()
            .into_iter()
            .filter_map(|category| {
                self.by_category
                    .get(&category)
                    .map(|bucket| CategoryCountEntry {
                        category,
                        category_label: category.label(),
                        count: bucket.total,
                        open: bucket.open,
                    })
            })
            .collect();

        let priority_breakdown = MaintenancePriority::ordered()
            .into_iter()
            .rev()
            .filter_map(|priority| {
                self.by_priority
                    .get(&priority)
                    .map(|bucket| PriorityCountEntry {
                        priority,
                        priority_label: priority.label(),
                        count: bucket.total,
                        open: bucket.open,
                    })
            })
            .collect();

        MaintenanceReportSummary {
            total: self.total,
            open: self.open(),
            urgent_open: self.urgent_open(),
            completion_rate: self.completion_rate(),
            cancellation_rate: self.cancellation_rate(),
            status_breakdown,
            category_breakdown,
            priority_breakdown,
            average_rating: self.average_rating(),
            rating_count: self.rating_count,
            total_actual_cost: self.total_actual_cost,
            average_resolution_hours: self.average_resolution_hours(),
        }
    }
}
