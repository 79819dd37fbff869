use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use hostel_desk::workflows::maintenance::{
    MaintenanceNotification, NotificationError, NotificationPublisher,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Keeps dispatched notifications in memory and logs each one.
#[derive(Default, Clone)]
pub(crate) struct InMemoryNotificationPublisher {
    sent: Arc<Mutex<Vec<MaintenanceNotification>>>,
}

impl InMemoryNotificationPublisher {
    pub(crate) fn sent(&self) -> Vec<MaintenanceNotification> {
        match self.sent.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl NotificationPublisher for InMemoryNotificationPublisher {
    fn publish(&self, notification: MaintenanceNotification) -> Result<(), NotificationError> {
        info!(
            template = %notification.template,
            request_id = %notification.request_id,
            recipient = %notification.recipient.0,
            "maintenance notification queued"
        );
        self.sent
            .lock()
            .map_err(|_| NotificationError::Transport("outbox lock poisoned".to_string()))?
            .push(notification);
        Ok(())
    }
}
