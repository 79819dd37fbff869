//! Hostel maintenance requests: intake, status lifecycle, bulk updates, and reporting.
//!
//! Records live in a single normalized [`RequestTable`]; student, owner, and staff
//! lists are filtered views over it. Status changes only move forward through
//! pending, assigned, in progress, and completed, with cancellation available
//! while a request is still open.

pub mod domain;
pub mod import;
pub mod lifecycle;
pub mod report;
pub mod repository;
pub mod router;
pub mod service;
pub mod store;
pub(crate) mod validation;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    Actor, ActorRole, BulkStatusUpdate, HostelId, ImageDescriptor, Location, MaintenanceCategory,
    MaintenanceNote, MaintenancePriority, MaintenanceRequest, MaintenanceRequestView,
    MaintenanceStatus, MaintenanceSubmission, Rating, RatingSubmission, RequestId,
    RequestSnapshot, StaffId, StatusUpdate, StudentId,
};
pub use import::{ImportedTickets, MaintenanceCsvImporter, MaintenanceImportError};
pub use lifecycle::{next_statuses, plan, Transition, TransitionError};
pub use report::views::MaintenanceReportSummary;
pub use report::MaintenanceReport;
pub use repository::{
    MaintenanceNotification, MaintenanceRepository, NotificationError, NotificationPublisher,
    RepositoryError,
};
pub use router::{actor_from_headers, maintenance_router, IdentityError};
pub use service::{
    BatchFailure, BulkUpdateOutcome, Clock, MaintenanceService, MaintenanceServiceError,
    SystemClock,
};
pub use store::{reduce, RequestTable, TableAction, TableRepository};
pub use validation::{
    IntakeGuard, ValidationError, DEFAULT_BULK_LIMIT, MAX_IMAGES_PER_REQUEST,
};
pub use views::{Page, PageRequest, RequestFilter, ViewScope, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
