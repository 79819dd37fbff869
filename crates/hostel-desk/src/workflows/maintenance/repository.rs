use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{MaintenanceRequest, RequestId, StudentId};
use super::views::ViewScope;

/// Storage abstraction so the service can be exercised in isolation.
///
/// `update` and `update_batch` are compare-and-swap writes: each record must
/// carry the stored version plus one.
pub trait MaintenanceRepository: Send + Sync {
    fn insert(&self, record: MaintenanceRequest) -> Result<MaintenanceRequest, RepositoryError>;
    fn update(&self, record: MaintenanceRequest) -> Result<(), RepositoryError>;
    /// All records are written or none are.
    fn update_batch(&self, records: Vec<MaintenanceRequest>) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &RequestId) -> Result<Option<MaintenanceRequest>, RepositoryError>;
    fn list(&self, scope: &ViewScope) -> Result<Vec<MaintenanceRequest>, RepositoryError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("request {0} already exists")]
    Conflict(RequestId),
    #[error("request {0} not found")]
    NotFound(RequestId),
    #[error("request {id} changed concurrently (expected version {expected}, found {found})")]
    StaleVersion {
        id: RequestId,
        expected: u64,
        found: u64,
    },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hooks (e-mail, push, in-app inbox).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: MaintenanceNotification) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceNotification {
    pub template: String,
    pub request_id: RequestId,
    pub recipient: StudentId,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
