use chrono::{DateTime, Utc};

use super::domain::{Actor, MaintenanceNote, MaintenanceRequest, MaintenanceStatus, StaffId};

/// Rejected status changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("request is already {from} and accepts no further changes")]
    Terminal { from: MaintenanceStatus },
    #[error("status cannot move back from {from} to {to}")]
    Regression {
        from: MaintenanceStatus,
        to: MaintenanceStatus,
    },
    #[error("moving a request to assigned requires a staff assignee")]
    MissingAssignee,
}

/// A validated move between two statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: MaintenanceStatus,
    pub to: MaintenanceStatus,
}

impl Transition {
    pub fn is_status_change(&self) -> bool {
        self.from != self.to
    }
}

/// Position on the forward path; `Cancelled` sits outside it.
const fn rank(status: MaintenanceStatus) -> Option<u8> {
    match status {
        MaintenanceStatus::Pending => Some(0),
        MaintenanceStatus::Assigned => Some(1),
        MaintenanceStatus::InProgress => Some(2),
        MaintenanceStatus::Completed => Some(3),
        MaintenanceStatus::Cancelled => None,
    }
}

/// Check a move from `from` to `to`.
///
/// Open requests may move forward along pending, assigned, in_progress,
/// completed (skipping steps is allowed), may be cancelled at any point, and
/// may receive a same-status update to append notes or costs. Completed and
/// cancelled requests are frozen.
pub fn plan(
    from: MaintenanceStatus,
    to: MaintenanceStatus,
) -> Result<Transition, TransitionError> {
    if from.is_terminal() {
        return Err(TransitionError::Terminal { from });
    }

    match (rank(from), rank(to)) {
        (_, None) => Ok(Transition { from, to }),
        (Some(current), Some(target)) if target >= current => Ok(Transition { from, to }),
        _ => Err(TransitionError::Regression { from, to }),
    }
}

/// Statuses reachable from `from` that change the status.
pub fn next_statuses(from: MaintenanceStatus) -> Vec<MaintenanceStatus> {
    MaintenanceStatus::ordered()
        .into_iter()
        .filter(|to| *to != from && plan(from, *to).is_ok())
        .collect()
}

/// Field changes carried alongside a transition.
#[derive(Debug, Clone, Default)]
pub(crate) struct ChangeSet<'a> {
    pub(crate) note: Option<&'a str>,
    pub(crate) estimated_cost: Option<u32>,
    pub(crate) actual_cost: Option<u32>,
    pub(crate) assigned_to: Option<&'a StaffId>,
}

/// Apply a planned transition to a record copy, bumping its version.
pub(crate) fn apply(
    record: &mut MaintenanceRequest,
    transition: Transition,
    changes: ChangeSet<'_>,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<(), TransitionError> {
    if let Some(staff) = changes.assigned_to {
        record.assigned_to = Some(staff.clone());
    }
    if transition.to == MaintenanceStatus::Assigned && record.assigned_to.is_none() {
        return Err(TransitionError::MissingAssignee);
    }

    record.status = transition.to;
    if transition.to == MaintenanceStatus::Completed {
        record.completed_at = Some(now);
    }

    if let Some(cost) = changes.estimated_cost {
        record.estimated_cost = Some(cost);
    }
    if let Some(cost) = changes.actual_cost {
        record.actual_cost = Some(cost);
    }

    if let Some(body) = changes.note.map(str::trim).filter(|body| !body.is_empty()) {
        record.notes.push(MaintenanceNote {
            body: body.to_string(),
            author_role: actor.role,
            author_id: Some(actor.id.clone()),
            recorded_at: now,
        });
    }

    record.updated_at = now;
    record.version += 1;
    Ok(())
}
