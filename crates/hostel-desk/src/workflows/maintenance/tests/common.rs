use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::config::MaintenanceConfig;
use crate::workflows::maintenance::domain::{
    Actor, HostelId, ImageDescriptor, Location, MaintenanceCategory, MaintenancePriority,
    MaintenanceRequest, MaintenanceStatus, MaintenanceSubmission, RequestId, StaffId,
    StatusUpdate, StudentId,
};
use crate::workflows::maintenance::repository::{
    MaintenanceNotification, MaintenanceRepository, NotificationError, NotificationPublisher,
    RepositoryError,
};
use crate::workflows::maintenance::router::{HOSTEL_HEADER, ROLE_HEADER, USER_HEADER};
use crate::workflows::maintenance::service::{Clock, MaintenanceService};
use crate::workflows::maintenance::store::TableRepository;
use crate::workflows::maintenance::views::ViewScope;

pub(super) type TestService = MaintenanceService<TableRepository, MemoryNotifications>;

pub(super) fn opened_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Clock that only moves when a test advances it.
pub(super) struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub(super) fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub(super) fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

pub(super) fn hostel() -> HostelId {
    HostelId("hostel-north".to_string())
}

pub(super) fn student() -> Actor {
    Actor::student("stu-1")
}

pub(super) fn staff() -> Actor {
    Actor::staff("staff-7")
}

pub(super) fn owner() -> Actor {
    Actor::owner("owner-1", hostel())
}

pub(super) fn student_id(actor: &Actor) -> StudentId {
    actor.student_id().expect("student actor")
}

/// The leaking tap reported from room 101.
pub(super) fn submission() -> MaintenanceSubmission {
    MaintenanceSubmission {
        location: Location {
            hostel_id: hostel(),
            room_id: Some("101".to_string()),
        },
        category: MaintenanceCategory::Plumbing,
        title: "Leak".to_string(),
        description: "Tap leaking".to_string(),
        priority: MaintenancePriority::High,
        images: Vec::new(),
    }
}

pub(super) fn submission_in(hostel: &str, title: &str) -> MaintenanceSubmission {
    let mut submission = submission();
    submission.location.hostel_id = HostelId(hostel.to_string());
    submission.title = title.to_string();
    submission
}

pub(super) fn image(name: &str) -> ImageDescriptor {
    ImageDescriptor {
        file_name: format!("{name}.jpg"),
        storage_key: format!("uploads/maintenance/{name}.jpg"),
    }
}

pub(super) fn assign_to(staff: &str) -> StatusUpdate {
    StatusUpdate {
        assigned_to: Some(StaffId(staff.to_string())),
        ..StatusUpdate::to(MaintenanceStatus::Assigned)
    }
}

pub(super) fn build_service() -> (
    TestService,
    Arc<TableRepository>,
    Arc<MemoryNotifications>,
    Arc<FixedClock>,
) {
    build_service_with(&MaintenanceConfig::default())
}

pub(super) fn build_service_with(
    config: &MaintenanceConfig,
) -> (
    TestService,
    Arc<TableRepository>,
    Arc<MemoryNotifications>,
    Arc<FixedClock>,
) {
    let repository = Arc::new(TableRepository::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let clock = Arc::new(FixedClock::at(opened_at()));
    let service = MaintenanceService::new(repository.clone(), notifications.clone(), config)
        .with_clock(clock.clone());
    (service, repository, notifications, clock)
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifications {
    events: Arc<Mutex<Vec<MaintenanceNotification>>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<MaintenanceNotification> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .clone()
    }

    pub(super) fn templates(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|event| event.template)
            .collect()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notification: MaintenanceNotification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct OfflineNotifications;

impl NotificationPublisher for OfflineNotifications {
    fn publish(&self, _notification: MaintenanceNotification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay offline".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl MaintenanceRepository for UnavailableRepository {
    fn insert(&self, _record: MaintenanceRequest) -> Result<MaintenanceRequest, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: MaintenanceRequest) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_batch(&self, _records: Vec<MaintenanceRequest>) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &RequestId) -> Result<Option<MaintenanceRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _scope: &ViewScope) -> Result<Vec<MaintenanceRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn api_request(
    method: Method,
    uri: &str,
    actor: Option<&Actor>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder
            .header(ROLE_HEADER, actor.role.code())
            .header(USER_HEADER, actor.id.as_str());
        if let Some(hostel) = &actor.hostel_id {
            builder = builder.header(HOSTEL_HEADER, hostel.0.as_str());
        }
    }

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
