use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::domain::{
    Actor, ActorRole, BulkStatusUpdate, HostelId, ImageDescriptor, MaintenanceCategory,
    MaintenancePriority, MaintenanceRequest, MaintenanceRequestView, MaintenanceStatus,
    MaintenanceSubmission, RatingSubmission, RequestId, StaffId, StatusUpdate, StudentId,
};
use super::repository::{MaintenanceRepository, NotificationPublisher, RepositoryError};
use super::service::{MaintenanceService, MaintenanceServiceError};
use super::views::{RequestFilter, ViewScope};

pub const ROLE_HEADER: &str = "x-user-role";
pub const USER_HEADER: &str = "x-user-id";
pub const HOSTEL_HEADER: &str = "x-hostel-id";

/// Router builder exposing the maintenance endpoints.
pub fn maintenance_router<R, N>(service: Arc<MaintenanceService<R, N>>) -> Router
where
    R: MaintenanceRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route("/api/v1/maintenance", post(submit_handler::<R, N>))
        .route("/api/v1/maintenance/stats", get(stats_handler::<R, N>))
        .route(
            "/api/v1/maintenance/student-requests",
            get(student_requests_handler::<R, N>),
        )
        .route(
            "/api/v1/maintenance/owner-requests",
            get(owner_requests_handler::<R, N>),
        )
        .route(
            "/api/v1/maintenance/staff-requests",
            get(staff_requests_handler::<R, N>),
        )
        .route(
            "/api/v1/maintenance/bulk-update",
            post(bulk_update_handler::<R, N>),
        )
        .route(
            "/api/v1/maintenance/:request_id",
            get(detail_handler::<R, N>),
        )
        .route(
            "/api/v1/maintenance/:request_id/status",
            patch(status_handler::<R, N>),
        )
        .route(
            "/api/v1/maintenance/:request_id/images",
            post(images_handler::<R, N>),
        )
        .route(
            "/api/v1/maintenance/:request_id/rating",
            post(rating_handler::<R, N>),
        )
        .with_state(service)
}

/// Caller identity headers could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),
    #[error("unknown role '{0}'")]
    UnknownRole(String),
}

pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, IdentityError> {
    let header = |name: &'static str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let raw_role = header(ROLE_HEADER).ok_or(IdentityError::MissingHeader(ROLE_HEADER))?;
    let role =
        ActorRole::parse(raw_role).ok_or_else(|| IdentityError::UnknownRole(raw_role.to_string()))?;
    let id = header(USER_HEADER).ok_or(IdentityError::MissingHeader(USER_HEADER))?;
    let hostel_id = header(HOSTEL_HEADER).map(|hostel| HostelId(hostel.to_string()));
    // Owners are scoped to the hostel the gateway vouches for.
    if role == ActorRole::Owner && hostel_id.is_none() {
        return Err(IdentityError::MissingHeader(HOSTEL_HEADER));
    }

    Ok(Actor {
        role,
        id: id.to_string(),
        hostel_id,
    })
}

#[derive(Debug, Serialize)]
struct Envelope<T> {
    data: T,
}

fn data_response<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(Envelope { data })).into_response()
}

fn identity_response(error: IdentityError) -> Response {
    let payload = json!({ "error": error.to_string() });
    (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
}

fn forbidden(role: ActorRole, action: &'static str) -> Response {
    error_response(MaintenanceServiceError::Forbidden { role, action })
}

pub(crate) fn error_response(error: MaintenanceServiceError) -> Response {
    let status = match &error {
        MaintenanceServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MaintenanceServiceError::Forbidden { .. } => StatusCode::FORBIDDEN,
        MaintenanceServiceError::Repository(RepositoryError::NotFound(_)) => StatusCode::NOT_FOUND,
        MaintenanceServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        MaintenanceServiceError::Repository(_)
        | MaintenanceServiceError::Transition(_)
        | MaintenanceServiceError::VersionConflict { .. }
        | MaintenanceServiceError::NotCompleted { .. }
        | MaintenanceServiceError::AlreadyRated(_)
        | MaintenanceServiceError::BatchRejected { .. } => StatusCode::CONFLICT,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(%error, "maintenance request failed");
    }

    let payload = match &error {
        MaintenanceServiceError::BatchRejected { failures } => json!({
            "error": error.to_string(),
            "failures": failures,
        }),
        _ => json!({ "error": error.to_string() }),
    };
    (status, Json(payload)).into_response()
}

fn record_response(status: StatusCode, record: &MaintenanceRequest) -> Response {
    data_response(status, record.to_view())
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    pub(crate) status: Option<MaintenanceStatus>,
    #[serde(default)]
    pub(crate) category: Option<MaintenanceCategory>,
    #[serde(default)]
    pub(crate) priority: Option<MaintenancePriority>,
    #[serde(default)]
    pub(crate) page: Option<usize>,
    #[serde(default)]
    pub(crate) per_page: Option<usize>,
    #[serde(default)]
    pub(crate) include_unassigned: bool,
}

impl ListQuery {
    fn filter(&self) -> RequestFilter {
        RequestFilter {
            status: self.status,
            category: self.category,
            priority: self.priority,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttachImagesRequest {
    pub(crate) images: Vec<ImageDescriptor>,
}

#[derive(Debug, Serialize)]
struct BulkUpdateView {
    status: MaintenanceStatus,
    updated_count: usize,
    updated: Vec<MaintenanceRequestView>,
}

fn list_response<R, N>(
    service: &MaintenanceService<R, N>,
    scope: ViewScope,
    query: &ListQuery,
) -> Response
where
    R: MaintenanceRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let page = service.page_request(query.page, query.per_page);
    match service.list(&scope, &query.filter(), page) {
        Ok(page) => data_response(StatusCode::OK, page.map(|record| record.to_view())),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<R, N>(
    State(service): State<Arc<MaintenanceService<R, N>>>,
    headers: HeaderMap,
    Json(submission): Json<MaintenanceSubmission>,
) -> Response
where
    R: MaintenanceRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(error) => return identity_response(error),
    };
    let Some(student) = actor.student_id() else {
        return forbidden(actor.role, "submit maintenance requests");
    };

    match service.submit(student, submission) {
        Ok(record) => record_response(StatusCode::CREATED, &record),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn detail_handler<R, N>(
    State(service): State<Arc<MaintenanceService<R, N>>>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
) -> Response
where
    R: MaintenanceRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(error) => return identity_response(error),
    };

    let record = match service.get(&RequestId(request_id)) {
        Ok(record) => record,
        Err(error) => return error_response(error),
    };

    let visible = match actor.role {
        ActorRole::Student => record.student == StudentId(actor.id.clone()),
        ActorRole::Owner => actor.hostel_id.as_ref() == Some(&record.location.hostel_id),
        ActorRole::Staff => true,
    };
    if !visible {
        return forbidden(actor.role, "view this request");
    }
    record_response(StatusCode::OK, &record)
}

pub(crate) async fn student_requests_handler<R, N>(
    State(service): State<Arc<MaintenanceService<R, N>>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: MaintenanceRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(error) => return identity_response(error),
    };
    let Some(student) = actor.student_id() else {
        return forbidden(actor.role, "list student requests");
    };

    list_response(&service, ViewScope::Student(student), &query)
}

pub(crate) async fn owner_requests_handler<R, N>(
    State(service): State<Arc<MaintenanceService<R, N>>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: MaintenanceRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(error) => return identity_response(error),
    };
    if actor.role != ActorRole::Owner {
        return forbidden(actor.role, "list hostel requests");
    }

    match actor.hostel_id.clone() {
        Some(hostel) => list_response(&service, ViewScope::Owner(hostel), &query),
        None => identity_response(IdentityError::MissingHeader(HOSTEL_HEADER)),
    }
}

pub(crate) async fn staff_requests_handler<R, N>(
    State(service): State<Arc<MaintenanceService<R, N>>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: MaintenanceRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(error) => return identity_response(error),
    };
    if actor.role != ActorRole::Staff {
        return forbidden(actor.role, "list staff work queues");
    }

    let scope = ViewScope::Staff {
        staff_id: StaffId(actor.id.clone()),
        include_unassigned: query.include_unassigned,
    };
    list_response(&service, scope, &query)
}

pub(crate) async fn status_handler<R, N>(
    State(service): State<Arc<MaintenanceService<R, N>>>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> Response
where
    R: MaintenanceRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(error) => return identity_response(error),
    };

    match service.update_status(&RequestId(request_id), &actor, update) {
        Ok(record) => record_response(StatusCode::OK, &record),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn bulk_update_handler<R, N>(
    State(service): State<Arc<MaintenanceService<R, N>>>,
    headers: HeaderMap,
    Json(bulk): Json<BulkStatusUpdate>,
) -> Response
where
    R: MaintenanceRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(error) => return identity_response(error),
    };

    match service.bulk_update(&actor, bulk) {
        Ok(outcome) => data_response(
            StatusCode::OK,
            BulkUpdateView {
                status: outcome.status,
                updated_count: outcome.updated.len(),
                updated: outcome.updated.iter().map(MaintenanceRequest::to_view).collect(),
            },
        ),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn images_handler<R, N>(
    State(service): State<Arc<MaintenanceService<R, N>>>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
    Json(request): Json<AttachImagesRequest>,
) -> Response
where
    R: MaintenanceRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(error) => return identity_response(error),
    };

    match service.attach_images(&RequestId(request_id), &actor, request.images) {
        Ok(record) => record_response(StatusCode::OK, &record),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn rating_handler<R, N>(
    State(service): State<Arc<MaintenanceService<R, N>>>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
    Json(rating): Json<RatingSubmission>,
) -> Response
where
    R: MaintenanceRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(error) => return identity_response(error),
    };
    let Some(student) = actor.student_id() else {
        return forbidden(actor.role, "rate requests");
    };

    match service.rate(&RequestId(request_id), &student, rating) {
        Ok(record) => record_response(StatusCode::OK, &record),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn stats_handler<R, N>(
    State(service): State<Arc<MaintenanceService<R, N>>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: MaintenanceRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(error) => return identity_response(error),
    };

    let scope = match (actor.role, actor.hostel_id.clone()) {
        (ActorRole::Staff, _) => ViewScope::All,
        (ActorRole::Owner, Some(hostel)) => ViewScope::Owner(hostel),
        (ActorRole::Owner, None) => {
            return identity_response(IdentityError::MissingHeader(HOSTEL_HEADER))
        }
        (ActorRole::Student, _) => return forbidden(actor.role, "view maintenance statistics"),
    };

    match service.report(&scope, &query.filter()) {
        Ok(report) => data_response(StatusCode::OK, report.summary()),
        Err(error) => error_response(error),
    }
}
