use super::common::*;
use crate::workflows::maintenance::domain::{MaintenanceRequest, MaintenanceStatus, RequestId};
use crate::workflows::maintenance::repository::{MaintenanceRepository, RepositoryError};
use crate::workflows::maintenance::store::{reduce, RequestTable, TableAction, TableRepository};
use crate::workflows::maintenance::views::ViewScope;

fn record(id: &str) -> MaintenanceRequest {
    let submission = submission();
    MaintenanceRequest {
        id: RequestId(id.to_string()),
        student: student_id(&student()),
        location: submission.location,
        category: submission.category,
        priority: submission.priority,
        status: MaintenanceStatus::Pending,
        title: submission.title,
        description: submission.description,
        images: Vec::new(),
        assigned_to: None,
        notes: Vec::new(),
        estimated_cost: None,
        actual_cost: None,
        rating: None,
        created_at: opened_at(),
        updated_at: opened_at(),
        completed_at: None,
        version: 1,
    }
}

fn bumped(mut record: MaintenanceRequest, status: MaintenanceStatus) -> MaintenanceRequest {
    record.status = status;
    record.version += 1;
    record
}

#[test]
fn reducer_keeps_staged_copies_apart_until_confirmed() {
    let table = reduce(
        RequestTable::default(),
        TableAction::Loaded(vec![record("mr-1"), record("mr-2")]),
    );
    let staged = reduce(
        table.clone(),
        TableAction::Staged(vec![bumped(record("mr-1"), MaintenanceStatus::Cancelled)]),
    );

    let id = RequestId("mr-1".to_string());
    assert_eq!(staged.get(&id).map(|r| r.status), Some(MaintenanceStatus::Pending));
    assert_eq!(staged.current(&id).map(|r| r.status), Some(MaintenanceStatus::Cancelled));
    assert_eq!(staged.staged_ids(), vec![id.clone()]);

    let rolled_back = reduce(staged.clone(), TableAction::RolledBack(vec![id.clone()]));
    assert_eq!(rolled_back, table);

    let confirmed = reduce(staged, TableAction::Confirmed(vec![id.clone()]));
    assert_eq!(confirmed.get(&id).map(|r| r.status), Some(MaintenanceStatus::Cancelled));
    assert!(confirmed.staged_ids().is_empty());
    assert_eq!(confirmed.len(), 2);
}

#[test]
fn insert_rejects_duplicate_ids() {
    let repository = TableRepository::default();
    repository.insert(record("mr-1")).expect("first insert");
    assert_eq!(
        repository.insert(record("mr-1")),
        Err(RepositoryError::Conflict(RequestId("mr-1".to_string())))
    );
}

#[test]
fn update_is_compare_and_swap_on_version() {
    let repository = TableRepository::default();
    repository.insert(record("mr-1")).expect("insert");

    let next = bumped(record("mr-1"), MaintenanceStatus::InProgress);
    repository.update(next.clone()).expect("version 1 -> 2");

    match repository.update(next) {
        Err(RepositoryError::StaleVersion {
            expected, found, ..
        }) => {
            assert_eq!(expected, 1);
            assert_eq!(found, 2);
        }
        other => panic!("expected stale version, got {other:?}"),
    }
    assert!(matches!(
        repository.update(bumped(record("mr-9"), MaintenanceStatus::Cancelled)),
        Err(RepositoryError::NotFound(_))
    ));
}

#[test]
fn batch_with_a_stale_record_rolls_back_entirely() {
    let repository = TableRepository::new(reduce(
        RequestTable::default(),
        TableAction::Loaded(vec![record("mr-1"), record("mr-2")]),
    ));
    let before = repository.snapshot().expect("snapshot");

    let mut stale = bumped(record("mr-2"), MaintenanceStatus::Cancelled);
    stale.version = 5;
    let result = repository.update_batch(vec![
        bumped(record("mr-1"), MaintenanceStatus::Cancelled),
        stale,
    ]);

    assert!(matches!(result, Err(RepositoryError::StaleVersion { .. })));
    assert_eq!(repository.snapshot().expect("snapshot"), before);

    repository
        .update_batch(vec![
            bumped(record("mr-1"), MaintenanceStatus::Cancelled),
            bumped(record("mr-2"), MaintenanceStatus::Cancelled),
        ])
        .expect("batch confirmed");
    let cancelled = repository
        .list(&ViewScope::All)
        .expect("list")
        .into_iter()
        .filter(|record| record.status == MaintenanceStatus::Cancelled)
        .count();
    assert_eq!(cancelled, 2);
}
