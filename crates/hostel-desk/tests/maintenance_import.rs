use hostel_desk::workflows::maintenance::{
    MaintenanceCategory, MaintenanceCsvImporter, MaintenanceImportError, MaintenanceStatus,
};

const EXPORT: &str = "Ticket ID,Category,Priority,Status,Created At,Completed At,Actual Cost,Rating\n\
T-1,Plumbing,High,Completed,2025-03-01T09:00:00Z,2025-03-01T15:00:00Z,\"₹1,200\",4\n\
T-2,Electrical,Urgent,In Progress,2025-03-02T10:00:00Z,,,\n\
T-3,Cleaning,Low,Cancelled,2025-03-02,,,\n\
T-4,Pest control,Medium,Pending,2025-03-03,,,\n";

#[test]
fn export_rows_feed_the_report() {
    let csv = EXPORT.replace("Ticket ID", "ID");
    let imported =
        MaintenanceCsvImporter::from_reader(csv.as_bytes()).expect("import succeeds");
    assert_eq!(imported.snapshots.len(), 4);
    assert_eq!(imported.skipped_rows, 0);
    assert_eq!(imported.snapshots[3].category, MaintenanceCategory::Other);

    let report = imported.report();
    assert_eq!(report.count(MaintenanceStatus::InProgress), 1);
    assert_eq!(report.open(), 2);
    assert_eq!(report.urgent_open(), 1);

    let summary = report.summary();
    assert_eq!(summary.completion_rate, 25);
    assert_eq!(summary.cancellation_rate, 25);
    assert_eq!(summary.total_actual_cost, 1200);
    assert_eq!(summary.average_rating, Some(4.0));
    assert_eq!(summary.average_resolution_hours, Some(6.0));
}

#[test]
fn export_without_id_column_is_rejected() {
    match MaintenanceCsvImporter::from_reader(EXPORT.as_bytes()) {
        Err(MaintenanceImportError::MissingColumn("id")) => {}
        other => panic!("expected missing id column, got {other:?}"),
    }
}
