use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use hostel_desk::config::MaintenanceConfig;
use hostel_desk::error::AppError;
use hostel_desk::workflows::maintenance::{
    Actor, HostelId, Location, MaintenanceCategory, MaintenanceCsvImporter, MaintenancePriority,
    MaintenanceReportSummary, MaintenanceService, MaintenanceStatus, MaintenanceSubmission,
    RatingSubmission, RequestFilter, StaffId, StatusUpdate, TableRepository, ViewScope,
};

use crate::infra::InMemoryNotificationPublisher;

#[derive(Args, Debug)]
pub(crate) struct MaintenanceReportArgs {
    /// Ticket export to aggregate
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Print the summary as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_maintenance_report(args: MaintenanceReportArgs) -> Result<(), AppError> {
    let imported = MaintenanceCsvImporter::from_path(&args.csv)?;
    let summary = imported.report().summary();

    if args.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Report payload unavailable: {err}"),
        }
        return Ok(());
    }

    println!("Maintenance report for {}", args.csv.display());
    println!(
        "{} tickets imported, {} rows skipped",
        imported.snapshots.len(),
        imported.skipped_rows
    );
    render_summary(&summary);
    Ok(())
}

pub(crate) fn run_demo() -> Result<(), AppError> {
    println!("Hostel maintenance desk demo");

    let notifications = Arc::new(InMemoryNotificationPublisher::default());
    let service = MaintenanceService::new(
        Arc::new(TableRepository::default()),
        notifications.clone(),
        &MaintenanceConfig::default(),
    );

    let hostel = HostelId("h-1".to_string());
    let student = Actor::student("s-1");
    let owner = Actor::owner("o-1", hostel.clone());
    let staff = Actor::staff("w-1");

    let submission = MaintenanceSubmission {
        location: Location {
            hostel_id: hostel.clone(),
            room_id: Some("204".to_string()),
        },
        category: MaintenanceCategory::Plumbing,
        title: "Leak".to_string(),
        description: "Tap leaking".to_string(),
        priority: MaintenancePriority::High,
        images: Vec::new(),
    };

    let Some(student_id) = student.student_id() else {
        return Ok(());
    };
    let record = match service.submit(student_id.clone(), submission) {
        Ok(record) => record,
        Err(err) => {
            println!("  Submission rejected: {err}");
            return Ok(());
        }
    };
    println!(
        "- {} submitted '{}' ({} / {}) -> {}",
        student.id,
        record.title,
        record.category.label(),
        record.priority.label(),
        record.status.label()
    );

    let steps = [
        (
            &owner,
            StatusUpdate {
                assigned_to: Some(StaffId(staff.id.clone())),
                note: Some("Plumber booked for this afternoon".to_string()),
                ..StatusUpdate::to(MaintenanceStatus::Assigned)
            },
        ),
        (&staff, StatusUpdate::to(MaintenanceStatus::InProgress)),
        (
            &staff,
            StatusUpdate {
                actual_cost: Some(500),
                note: Some("Washer replaced".to_string()),
                ..StatusUpdate::to(MaintenanceStatus::Completed)
            },
        ),
    ];
    for (actor, update) in steps {
        match service.update_status(&record.id, actor, update) {
            Ok(updated) => println!(
                "- {} {} moved {} to {} (version {})",
                actor.role,
                actor.id,
                updated.id,
                updated.status.label(),
                updated.version
            ),
            Err(err) => {
                println!("  Status update rejected: {err}");
                return Ok(());
            }
        }
    }

    match service.update_status(
        &record.id,
        &staff,
        StatusUpdate::to(MaintenanceStatus::InProgress),
    ) {
        Ok(_) => println!("- Unexpected: completed request reopened"),
        Err(err) => println!("- Reopening is refused: {err}"),
    }

    let rating = RatingSubmission {
        score: 5,
        feedback: Some("Fixed the same day".to_string()),
    };
    match service.rate(&record.id, &student_id, rating) {
        Ok(rated) => {
            if let Some(rating) = rated.rating {
                println!("- {} rated the fix {}/5", student.id, rating.score);
            }
        }
        Err(err) => println!("  Rating rejected: {err}"),
    }

    let sent = notifications.sent();
    if sent.is_empty() {
        println!("\nNotifications: none dispatched");
    } else {
        println!("\nNotifications");
        for notification in sent {
            println!(
                "- template={} -> {}",
                notification.template, notification.recipient.0
            );
        }
    }

    match service.report(&ViewScope::Owner(hostel), &RequestFilter::default()) {
        Ok(report) => render_summary(&report.summary()),
        Err(err) => println!("Report unavailable: {err}"),
    }

    Ok(())
}

fn render_summary(summary: &MaintenanceReportSummary) {
    println!(
        "\nTotals: {} requests | {} open | {} urgent open",
        summary.total, summary.open, summary.urgent_open
    );
    println!(
        "Completion {}% | Cancellation {}%",
        summary.completion_rate, summary.cancellation_rate
    );

    println!("\nBy status");
    for entry in &summary.status_breakdown {
        println!(
            "- {}: {} ({}%)",
            entry.status_label, entry.count, entry.share_pct
        );
    }

    if !summary.category_breakdown.is_empty() {
        println!("\nBy category");
        for entry in &summary.category_breakdown {
            println!(
                "- {}: {} total, {} open",
                entry.category_label, entry.count, entry.open
            );
        }
    }

    if !summary.priority_breakdown.is_empty() {
        println!("\nBy priority");
        for entry in &summary.priority_breakdown {
            println!(
                "- {}: {} total, {} open",
                entry.priority_label, entry.count, entry.open
            );
        }
    }

    match summary.average_rating {
        Some(rating) => println!(
            "\nAverage rating {:.1} from {} ratings",
            rating, summary.rating_count
        ),
        None => println!("\nAverage rating: no ratings yet"),
    }
    println!("Actual cost to date: {}", summary.total_actual_cost);
    if let Some(hours) = summary.average_resolution_hours {
        println!("Average resolution time: {hours:.1} h");
    }
}
