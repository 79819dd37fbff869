use std::io::Cursor;
use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use hostel_desk::error::AppError;
use hostel_desk::workflows::maintenance::{
    maintenance_router, MaintenanceCsvImporter, MaintenanceReportSummary, MaintenanceRepository,
    MaintenanceService, NotificationPublisher,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::infra::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct MaintenanceReportRequest {
    pub(crate) csv: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct MaintenanceReportResponse {
    pub(crate) imported: usize,
    pub(crate) skipped_rows: usize,
    pub(crate) summary: MaintenanceReportSummary,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReportEnvelope {
    pub(crate) data: MaintenanceReportResponse,
}

pub(crate) fn with_maintenance_routes<R, N>(
    service: Arc<MaintenanceService<R, N>>,
) -> axum::Router
where
    R: MaintenanceRepository + 'static,
    N: NotificationPublisher + 'static,
{
    maintenance_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/maintenance/report",
            axum::routing::post(maintenance_report_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    if ready {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        )
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Aggregate a ticket export posted as a JSON string field.
pub(crate) async fn maintenance_report_endpoint(
    Json(payload): Json<MaintenanceReportRequest>,
) -> Result<Json<ReportEnvelope>, AppError> {
    let imported = MaintenanceCsvImporter::from_reader(Cursor::new(payload.csv.into_bytes()))?;
    let summary = imported.report().summary();

    Ok(Json(ReportEnvelope {
        data: MaintenanceReportResponse {
            imported: imported.snapshots.len(),
            skipped_rows: imported.skipped_rows,
            summary,
        },
    }))
}
