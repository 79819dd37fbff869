use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hostel_desk::config::AppConfig;
use hostel_desk::error::AppError;
use hostel_desk::telemetry;
use hostel_desk::workflows::maintenance::{MaintenanceService, TableRepository};
use tracing::info;

use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryNotificationPublisher};
use crate::routes::with_maintenance_routes;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let service = Arc::new(MaintenanceService::new(
        Arc::new(TableRepository::default()),
        Arc::new(InMemoryNotificationPublisher::default()),
        &config.maintenance,
    ));

    let app = with_maintenance_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        bulk_limit = config.maintenance.bulk_limit,
        "hostel maintenance desk ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
