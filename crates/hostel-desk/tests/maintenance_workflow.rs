//! End-to-end maintenance scenarios driven through the public service facade and router.

mod common {
    use std::sync::{Arc, Mutex};

    use hostel_desk::config::MaintenanceConfig;
    use hostel_desk::workflows::maintenance::{
        HostelId, Location, MaintenanceCategory, MaintenanceNotification, MaintenancePriority,
        MaintenanceService, MaintenanceSubmission, NotificationError, NotificationPublisher,
        TableRepository,
    };

    pub(super) type Desk = MaintenanceService<TableRepository, RecordingNotifications>;

    pub(super) fn desk() -> (Arc<Desk>, Arc<RecordingNotifications>) {
        let notifications = Arc::new(RecordingNotifications::default());
        let service = MaintenanceService::new(
            Arc::new(TableRepository::default()),
            notifications.clone(),
            &MaintenanceConfig::default(),
        );
        (Arc::new(service), notifications)
    }

    pub(super) fn leak_report() -> MaintenanceSubmission {
        MaintenanceSubmission {
            location: Location {
                hostel_id: HostelId("h-1".to_string()),
                room_id: Some("204".to_string()),
            },
            category: MaintenanceCategory::Plumbing,
            title: "Leak".to_string(),
            description: "Tap leaking".to_string(),
            priority: MaintenancePriority::High,
            images: Vec::new(),
        }
    }

    #[derive(Default)]
    pub(super) struct RecordingNotifications {
        sent: Mutex<Vec<MaintenanceNotification>>,
    }

    impl RecordingNotifications {
        pub(super) fn templates(&self) -> Vec<String> {
            self.sent
                .lock()
                .expect("notification mutex poisoned")
                .iter()
                .map(|notification| notification.template.clone())
                .collect()
        }
    }

    impl NotificationPublisher for RecordingNotifications {
        fn publish(&self, notification: MaintenanceNotification) -> Result<(), NotificationError> {
            self.sent
                .lock()
                .expect("notification mutex poisoned")
                .push(notification);
            Ok(())
        }
    }
}

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use hostel_desk::workflows::maintenance::{
    maintenance_router, Actor, BulkStatusUpdate, MaintenanceServiceError, MaintenanceStatus,
    RequestFilter, StatusUpdate, StudentId, TransitionError, ViewScope,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{desk, leak_report};

#[test]
fn leak_is_reported_fixed_and_counted() {
    let (service, notifications) = desk();
    let student = StudentId("s-1".to_string());
    let staff = Actor::staff("w-1");

    let record = service
        .submit(student.clone(), leak_report())
        .expect("submission accepted");
    assert_eq!(record.status, MaintenanceStatus::Pending);

    service
        .update_status(
            &record.id,
            &staff,
            StatusUpdate::to(MaintenanceStatus::InProgress),
        )
        .expect("work started");
    let done = service
        .update_status(
            &record.id,
            &staff,
            StatusUpdate {
                actual_cost: Some(500),
                ..StatusUpdate::to(MaintenanceStatus::Completed)
            },
        )
        .expect("work completed");
    assert_eq!(done.actual_cost, Some(500));
    assert!(done.completed_at.is_some());

    let summary = service
        .report(&ViewScope::All, &RequestFilter::default())
        .expect("report builds")
        .summary();
    assert_eq!(summary.total, 1);
    assert_eq!(summary.completion_rate, 100);
    assert_eq!(summary.total_actual_cost, 500);
    assert_eq!(
        notifications.templates(),
        vec!["maintenance_in_progress", "maintenance_completed"]
    );

    match service.update_status(
        &record.id,
        &staff,
        StatusUpdate::to(MaintenanceStatus::Cancelled),
    ) {
        Err(MaintenanceServiceError::Transition(TransitionError::Terminal { .. })) => {}
        other => panic!("completed request should be frozen, got {other:?}"),
    }
}

#[test]
fn bulk_cancellation_leaves_everything_untouched_on_failure() {
    let (service, _) = desk();
    let student = StudentId("s-1".to_string());
    let staff = Actor::staff("w-1");
    let first = service
        .submit(student.clone(), leak_report())
        .expect("first");
    let second = service.submit(student, leak_report()).expect("second");
    service
        .update_status(
            &second.id,
            &staff,
            StatusUpdate::to(MaintenanceStatus::Completed),
        )
        .expect("second completed");

    let result = service.bulk_update(
        &staff,
        BulkStatusUpdate {
            ids: vec![first.id.clone(), second.id.clone()],
            status: MaintenanceStatus::Cancelled,
            note: Some("Duplicate reports".to_string()),
            assigned_to: None,
        },
    );

    assert!(matches!(
        result,
        Err(MaintenanceServiceError::BatchRejected { ref failures }) if failures.len() == 1
    ));
    let first = service.get(&first.id).expect("first present");
    assert_eq!(first.status, MaintenanceStatus::Pending);
    assert!(first.notes.is_empty());
}

#[tokio::test]
async fn http_round_trip_through_role_views() {
    let (service, _) = desk();
    let router = maintenance_router(service);

    let created = router
        .clone()
        .oneshot(
            Request::post("/api/v1/maintenance")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-user-role", "student")
                .header("x-user-id", "s-1")
                .body(Body::from(
                    serde_json::to_vec(&leak_report()).expect("serialize"),
                ))
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = body_json(created).await;
    let id = created["data"]["id"].as_str().expect("id").to_string();

    let assigned = router
        .clone()
        .oneshot(
            Request::patch(format!("/api/v1/maintenance/{id}/status"))
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-user-role", "owner")
                .header("x-user-id", "o-1")
                .header("x-hostel-id", "h-1")
                .body(Body::from(
                    json!({ "status": "assigned", "assigned_to": "w-1" }).to_string(),
                ))
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(assigned.status(), StatusCode::OK);

    let queue = router
        .oneshot(
            Request::get("/api/v1/maintenance/staff-requests")
                .header("x-user-role", "staff")
                .header("x-user-id", "w-1")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(queue.status(), StatusCode::OK);
    let queue = body_json(queue).await;
    assert_eq!(queue["data"]["items"][0]["id"], id.as_str());
    assert_eq!(queue["data"]["items"][0]["status"], "assigned");
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json payload")
}
