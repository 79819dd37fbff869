//! Offline reporting over CSV exports of maintenance tickets.

mod normalizer;
mod parser;

use std::io::Read;
use std::path::Path;

use tracing::debug;

use super::domain::RequestSnapshot;
use super::report::MaintenanceReport;

#[derive(Debug)]
pub enum MaintenanceImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    MissingColumn(&'static str),
    InvalidRow { line: u64, detail: String },
}

impl std::fmt::Display for MaintenanceImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaintenanceImportError::Io(err) => write!(f, "failed to read ticket export: {}", err),
            MaintenanceImportError::Csv(err) => write!(f, "invalid ticket CSV data: {}", err),
            MaintenanceImportError::MissingColumn(column) => {
                write!(f, "ticket export is missing the '{}' column", column)
            }
            MaintenanceImportError::InvalidRow { line, detail } => {
                write!(f, "ticket export line {}: {}", line, detail)
            }
        }
    }
}

impl std::error::Error for MaintenanceImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MaintenanceImportError::Io(err) => Some(err),
            MaintenanceImportError::Csv(err) => Some(err),
            MaintenanceImportError::MissingColumn(_)
            | MaintenanceImportError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for MaintenanceImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for MaintenanceImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Tickets hydrated from an export, plus the count of rows that were ignored.
#[derive(Debug, Clone, Default)]
pub struct ImportedTickets {
    pub snapshots: Vec<RequestSnapshot>,
    pub skipped_rows: usize,
}

impl ImportedTickets {
    pub fn report(&self) -> MaintenanceReport {
        MaintenanceReport::from_snapshots(self.snapshots.iter().cloned())
    }
}

pub struct MaintenanceCsvImporter;

impl MaintenanceCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ImportedTickets, MaintenanceImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Rows without an id or with an unknown status are skipped; duplicate ids
    /// keep the first occurrence.
    pub fn from_reader<R: Read>(reader: R) -> Result<ImportedTickets, MaintenanceImportError> {
        let parsed = parser::parse_rows(reader)?;
        let mut imported = ImportedTickets {
            snapshots: Vec::with_capacity(parsed.snapshots.len()),
            skipped_rows: parsed.skipped,
        };

        let mut seen = std::collections::HashSet::new();
        for snapshot in parsed.snapshots {
            if seen.insert(snapshot.id.clone()) {
                imported.snapshots.push(snapshot);
            } else {
                imported.skipped_rows += 1;
            }
        }

        debug!(
            imported = imported.snapshots.len(),
            skipped = imported.skipped_rows,
            "parsed maintenance ticket export"
        );
        Ok(imported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::maintenance::domain::{MaintenanceCategory, MaintenanceStatus};
    use std::io::Cursor;

    #[test]
    fn headers_are_matched_loosely() {
        let csv = "\u{feff}ID, CATEGORY ,Status,Created  At\nmr-1,Plumbing,in_progress,2025-03-01\n";
        let imported = MaintenanceCsvImporter::from_reader(Cursor::new(csv)).expect("import");
        assert_eq!(imported.snapshots.len(), 1);
        let ticket = &imported.snapshots[0];
        assert_eq!(ticket.category, MaintenanceCategory::Plumbing);
        assert_eq!(ticket.status, MaintenanceStatus::InProgress);
        assert!(ticket.created_at.is_some());
    }

    #[test]
    fn unknown_status_and_duplicate_ids_are_skipped() {
        let csv = "ID,Category,Status\n\
mr-1,Electrical,Completed\n\
mr-2,Electrical,reopened\n\
mr-1,Electrical,Pending\n\
,Plumbing,Pending\n";
        let imported = MaintenanceCsvImporter::from_reader(Cursor::new(csv)).expect("import");
        assert_eq!(imported.snapshots.len(), 1);
        assert_eq!(imported.snapshots[0].status, MaintenanceStatus::Completed);
        assert_eq!(imported.skipped_rows, 3);
    }

    #[test]
    fn unknown_category_maps_to_other() {
        let csv = "ID,Category,Status\nmr-9,Pest control,Pending\n";
        let imported = MaintenanceCsvImporter::from_reader(Cursor::new(csv)).expect("import");
        assert_eq!(imported.snapshots[0].category, MaintenanceCategory::Other);
    }

    #[test]
    fn missing_status_column_is_an_error() {
        let csv = "ID,Category\nmr-1,Plumbing\n";
        match MaintenanceCsvImporter::from_reader(Cursor::new(csv)) {
            Err(MaintenanceImportError::MissingColumn("status")) => {}
            other => panic!("expected missing column error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_rating_reports_line() {
        let csv = "ID,Status,Rating\nmr-1,Completed,5\nmr-2,Completed,9\n";
        match MaintenanceCsvImporter::from_reader(Cursor::new(csv)) {
            Err(MaintenanceImportError::InvalidRow { line: 3, .. }) => {}
            other => panic!("expected invalid row on line 3, got {other:?}"),
        }
    }
}
