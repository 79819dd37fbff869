use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{
    Actor, ActorRole, BulkStatusUpdate, ImageDescriptor, MaintenanceRequest, MaintenanceStatus,
    MaintenanceSubmission, Rating, RatingSubmission, RequestId, StatusUpdate, StudentId,
};
use super::lifecycle::{self, ChangeSet, TransitionError};
use super::report::MaintenanceReport;
use super::repository::{
    MaintenanceNotification, MaintenanceRepository, NotificationPublisher, RepositoryError,
};
use super::validation::{IntakeGuard, ValidationError};
use super::views::{self, Page, PageRequest, RequestFilter, ViewScope, DEFAULT_PAGE_SIZE};
use crate::config::MaintenanceConfig;

/// Time source so tests can pin timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Service composing intake validation, lifecycle rules, storage, and notifications.
pub struct MaintenanceService<R, N> {
    guard: Arc<IntakeGuard>,
    repository: Arc<R>,
    notifications: Arc<N>,
    clock: Arc<dyn Clock>,
    sequence: AtomicU64,
    page_size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub id: RequestId,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkUpdateOutcome {
    pub status: MaintenanceStatus,
    pub updated: Vec<MaintenanceRequest>,
}

impl<R, N> MaintenanceService<R, N>
where
    R: MaintenanceRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(repository: Arc<R>, notifications: Arc<N>, config: &MaintenanceConfig) -> Self {
        Self {
            guard: Arc::new(IntakeGuard::new(config.bulk_limit)),
            repository,
            notifications,
            clock: Arc::new(SystemClock),
            sequence: AtomicU64::new(1),
            page_size: config.page_size,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn next_request_id(&self) -> RequestId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        RequestId(format!("mr-{id:06}"))
    }

    pub fn page_request(&self, page: Option<usize>, per_page: Option<usize>) -> PageRequest {
        let default = if self.page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.page_size
        };
        PageRequest::new(page, per_page, default)
    }

    /// Create a pending request for `student`.
    pub fn submit(
        &self,
        student: StudentId,
        submission: MaintenanceSubmission,
    ) -> Result<MaintenanceRequest, MaintenanceServiceError> {
        let submission = self.guard.sanitize(submission)?;
        let now = self.clock.now();

        let record = MaintenanceRequest {
            id: self.next_request_id(),
            student,
            location: submission.location,
            category: submission.category,
            priority: submission.priority,
            status: MaintenanceStatus::Pending,
            title: submission.title,
            description: submission.description,
            images: submission.images,
            assigned_to: None,
            notes: Vec::new(),
            estimated_cost: None,
            actual_cost: None,
            rating: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            version: 1,
        };

        let stored = self.repository.insert(record)?;
        info!(
            request_id = %stored.id,
            category = stored.category.label(),
            priority = stored.priority.label(),
            "maintenance request submitted"
        );
        Ok(stored)
    }

    /// Attach images to an open request owned by the calling student.
    pub fn attach_images(
        &self,
        id: &RequestId,
        actor: &Actor,
        images: Vec<ImageDescriptor>,
    ) -> Result<MaintenanceRequest, MaintenanceServiceError> {
        let mut record = self.get(id)?;
        if actor.student_id().as_ref() != Some(&record.student) {
            return Err(MaintenanceServiceError::Forbidden {
                role: actor.role,
                action: "attach images to a request they did not raise",
            });
        }
        if record.status.is_terminal() {
            return Err(TransitionError::Terminal {
                from: record.status,
            }
            .into());
        }

        if images.is_empty() {
            return Err(ValidationError::NoImages.into());
        }
        self.guard.check_images(record.images.len(), &images)?;
        record.images.extend(images);
        record.updated_at = self.clock.now();
        record.version += 1;

        self.repository.update(record.clone())?;
        Ok(record)
    }

    pub fn get(&self, id: &RequestId) -> Result<MaintenanceRequest, MaintenanceServiceError> {
        let record = self
            .repository
            .fetch(id)?
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
        Ok(record)
    }

    /// Role view over the request table, filtered, newest first, paginated.
    pub fn list(
        &self,
        scope: &ViewScope,
        filter: &RequestFilter,
        page: PageRequest,
    ) -> Result<Page<MaintenanceRequest>, MaintenanceServiceError> {
        let records = self.repository.list(scope)?;
        let selected = views::select(records, filter);
        Ok(views::paginate(selected, page))
    }

    /// Apply a staff or owner status change to a single request.
    pub fn update_status(
        &self,
        id: &RequestId,
        actor: &Actor,
        update: StatusUpdate,
    ) -> Result<MaintenanceRequest, MaintenanceServiceError> {
        let record = self.get(id)?;
        ensure_can_manage(actor, &record)?;

        if let Some(expected) = update.expected_version {
            if expected != record.version {
                return Err(MaintenanceServiceError::VersionConflict {
                    id: id.clone(),
                    expected,
                    found: record.version,
                });
            }
        }

        let previous = record.status;
        let transition = lifecycle::plan(previous, update.status)?;
        let mut next = record;
        lifecycle::apply(
            &mut next,
            transition,
            ChangeSet {
                note: update.note.as_deref(),
                estimated_cost: update.estimated_cost,
                actual_cost: update.actual_cost,
                assigned_to: update.assigned_to.as_ref(),
            },
            actor,
            self.clock.now(),
        )?;

        self.repository.update(next.clone())?;
        info!(
            request_id = %next.id,
            from = %previous,
            to = %next.status,
            actor = %actor.role,
            version = next.version,
            "maintenance status updated"
        );

        if transition.is_status_change() {
            self.notify_status(&next);
        }
        Ok(next)
    }

    /// Apply one change to every selected request, or to none of them.
    pub fn bulk_update(
        &self,
        actor: &Actor,
        mut bulk: BulkStatusUpdate,
    ) -> Result<BulkUpdateOutcome, MaintenanceServiceError> {
        if actor.role == ActorRole::Student {
            return Err(MaintenanceServiceError::Forbidden {
                role: actor.role,
                action: "bulk update requests",
            });
        }

        let ids = self.guard.batch_ids(std::mem::take(&mut bulk.ids))?;
        let now = self.clock.now();
        let mut staged = Vec::with_capacity(ids.len());
        let mut failures = Vec::new();

        for id in &ids {
            match self.prepare_bulk_change(id, actor, &bulk, now) {
                Ok(prepared) => staged.push(prepared),
                Err(error) => failures.push(BatchFailure {
                    id: id.clone(),
                    reason: error.to_string(),
                }),
            }
        }

        if !failures.is_empty() {
            warn!(
                selected = ids.len(),
                rejected = failures.len(),
                status = %bulk.status,
                "bulk maintenance update rejected"
            );
            return Err(MaintenanceServiceError::BatchRejected { failures });
        }

        let records: Vec<MaintenanceRequest> =
            staged.iter().map(|(record, _)| record.clone()).collect();
        self.repository.update_batch(records)?;
        info!(
            updated = staged.len(),
            status = %bulk.status,
            actor = %actor.role,
            "bulk maintenance update applied"
        );

        for (record, changed) in &staged {
            if *changed {
                self.notify_status(record);
            }
        }

        Ok(BulkUpdateOutcome {
            status: bulk.status,
            updated: staged.into_iter().map(|(record, _)| record).collect(),
        })
    }

    fn prepare_bulk_change(
        &self,
        id: &RequestId,
        actor: &Actor,
        bulk: &BulkStatusUpdate,
        now: DateTime<Utc>,
    ) -> Result<(MaintenanceRequest, bool), MaintenanceServiceError> {
        let mut record = self.get(id)?;
        ensure_can_manage(actor, &record)?;
        let transition = lifecycle::plan(record.status, bulk.status)?;
        lifecycle::apply(
            &mut record,
            transition,
            ChangeSet {
                note: bulk.note.as_deref(),
                assigned_to: bulk.assigned_to.as_ref(),
                ..ChangeSet::default()
            },
            actor,
            now,
        )?;
        Ok((record, transition.is_status_change()))
    }

    /// Attach the requesting student's rating to a completed request.
    pub fn rate(
        &self,
        id: &RequestId,
        student: &StudentId,
        rating: RatingSubmission,
    ) -> Result<MaintenanceRequest, MaintenanceServiceError> {
        self.guard.check_rating(&rating)?;
        let mut record = self.get(id)?;

        if &record.student != student {
            return Err(MaintenanceServiceError::Forbidden {
                role: ActorRole::Student,
                action: "rate another student's request",
            });
        }
        if record.status != MaintenanceStatus::Completed {
            return Err(MaintenanceServiceError::NotCompleted {
                id: id.clone(),
                status: record.status,
            });
        }
        if record.rating.is_some() {
            return Err(MaintenanceServiceError::AlreadyRated(id.clone()));
        }

        let now = self.clock.now();
        record.rating = Some(Rating {
            score: rating.score,
            feedback: rating
                .feedback
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
            rated_at: now,
        });
        record.updated_at = now;
        record.version += 1;

        self.repository.update(record.clone())?;
        debug!(request_id = %record.id, score = rating.score, "maintenance request rated");
        Ok(record)
    }

    /// Aggregate the requests visible in `scope`.
    pub fn report(
        &self,
        scope: &ViewScope,
        filter: &RequestFilter,
    ) -> Result<MaintenanceReport, MaintenanceServiceError> {
        let records = self.repository.list(scope)?;
        Ok(MaintenanceReport::from_snapshots(
            records
                .iter()
                .filter(|record| filter.matches(record))
                .map(MaintenanceRequest::snapshot),
        ))
    }

    fn notify_status(&self, record: &MaintenanceRequest) {
        let mut details = BTreeMap::new();
        details.insert("status".to_string(), record.status.code().to_string());
        details.insert("title".to_string(), record.title.clone());
        if let Some(staff) = &record.assigned_to {
            details.insert("assigned_to".to_string(), staff.0.clone());
        }
        if let Some(cost) = record.actual_cost {
            details.insert("actual_cost".to_string(), cost.to_string());
        }

        let notification = MaintenanceNotification {
            template: format!("maintenance_{}", record.status.code()),
            request_id: record.id.clone(),
            recipient: record.student.clone(),
            details,
        };

        if let Err(error) = self.notifications.publish(notification) {
            warn!(request_id = %record.id, %error, "status notification not delivered");
        }
    }
}

/// Owners manage their own hostel; staff manage everything; students nothing.
fn ensure_can_manage(
    actor: &Actor,
    record: &MaintenanceRequest,
) -> Result<(), MaintenanceServiceError> {
    let own_hostel = actor.hostel_id.as_ref() == Some(&record.location.hostel_id);
    match actor.role {
        ActorRole::Staff => Ok(()),
        ActorRole::Owner if own_hostel => Ok(()),
        ActorRole::Owner => Err(MaintenanceServiceError::Forbidden {
            role: actor.role,
            action: "manage requests outside their hostel",
        }),
        ActorRole::Student => Err(MaintenanceServiceError::Forbidden {
            role: actor.role,
            action: "change request status",
        }),
    }
}

/// Error raised by the maintenance service.
#[derive(Debug, thiserror::Error)]
pub enum MaintenanceServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("{role} callers may not {action}")]
    Forbidden {
        role: ActorRole,
        action: &'static str,
    },
    #[error("request {id} changed concurrently (expected version {expected}, found {found})")]
    VersionConflict {
        id: RequestId,
        expected: u64,
        found: u64,
    },
    #[error("request {id} is {status}; only completed requests can be rated")]
    NotCompleted {
        id: RequestId,
        status: MaintenanceStatus,
    },
    #[error("request {0} has already been rated")]
    AlreadyRated(RequestId),
    #[error("bulk update rejected for {} request(s)", .failures.len())]
    BatchRejected { failures: Vec<BatchFailure> },
}
