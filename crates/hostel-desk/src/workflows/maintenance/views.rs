use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use super::domain::{
    HostelId, MaintenanceCategory, MaintenancePriority, MaintenanceRequest, MaintenanceStatus,
    StaffId, StudentId,
};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// Which slice of the request table a caller sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewScope {
    All,
    Student(StudentId),
    Owner(HostelId),
    Staff {
        staff_id: StaffId,
        include_unassigned: bool,
    },
}

impl ViewScope {
    pub fn contains(&self, record: &MaintenanceRequest) -> bool {
        match self {
            ViewScope::All => true,
            ViewScope::Student(student) => &record.student == student,
            ViewScope::Owner(hostel) => &record.location.hostel_id == hostel,
            ViewScope::Staff {
                staff_id,
                include_unassigned,
            } => match &record.assigned_to {
                Some(assignee) => assignee == staff_id,
                None => *include_unassigned && record.is_open(),
            },
        }
    }
}

/// Field-equality filters applied on top of a scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFilter {
    #[serde(default)]
    pub status: Option<MaintenanceStatus>,
    #[serde(default)]
    pub category: Option<MaintenanceCategory>,
    #[serde(default)]
    pub priority: Option<MaintenancePriority>,
}

impl RequestFilter {
    pub fn matches(&self, record: &MaintenanceRequest) -> bool {
        self.status.map_or(true, |status| record.status == status)
            && self.category.map_or(true, |category| record.category == category)
            && self.priority.map_or(true, |priority| record.priority == priority)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Pages start at 1; page size is clamped to `1..=MAX_PAGE_SIZE`.
    pub fn new(page: Option<usize>, per_page: Option<usize>, default_per_page: usize) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(default_per_page)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

/// Filter and order records newest first (ties broken by id).
pub fn select(
    records: impl IntoIterator<Item = MaintenanceRequest>,
    filter: &RequestFilter,
) -> Vec<MaintenanceRequest> {
    let mut selected: Vec<MaintenanceRequest> = records
        .into_iter()
        .filter(|record| filter.matches(record))
        .collect();
    selected.sort_by_key(|record| (Reverse(record.created_at), Reverse(record.id.clone())));
    selected
}

pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total = items.len();
    let total_pages = total.div_ceil(request.per_page);
    let skip = (request.page - 1).saturating_mul(request.per_page);
    let items = items.into_iter().skip(skip).take(request.per_page).collect();

    Page {
        items,
        total,
        page: request.page,
        per_page: request.per_page,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_clamps_inputs() {
        let request = PageRequest::new(Some(0), Some(500), DEFAULT_PAGE_SIZE);
        assert_eq!(request.page, 1);
        assert_eq!(request.per_page, MAX_PAGE_SIZE);

        let request = PageRequest::new(None, Some(0), DEFAULT_PAGE_SIZE);
        assert_eq!(request.per_page, 1);
    }

    #[test]
    fn paginate_reports_totals_and_slices() {
        let page = paginate((1..=23).collect(), PageRequest::new(Some(3), Some(10), 10));
        assert_eq!(page.items, vec![21, 22, 23]);
        assert_eq!(page.total, 23);
        assert_eq!(page.total_pages, 3);

        let beyond = paginate((1..=3).collect::<Vec<i32>>(), PageRequest::new(Some(4), None, 2));
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total_pages, 2);
    }
}
