use std::io::Read;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

use super::normalizer::normalize_header;
use super::MaintenanceImportError;
use crate::workflows::maintenance::domain::{
    MaintenanceCategory, MaintenancePriority, MaintenanceStatus, RequestId, RequestSnapshot,
};

#[derive(Debug, Default)]
pub(crate) struct ParsedRows {
    pub(crate) snapshots: Vec<RequestSnapshot>,
    pub(crate) skipped: usize,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<ParsedRows, MaintenanceImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: csv::StringRecord = csv_reader
        .headers()?
        .iter()
        .map(normalize_header)
        .collect();
    for required in ["id", "status"] {
        if !headers.iter().any(|header| header == required) {
            return Err(MaintenanceImportError::MissingColumn(required));
        }
    }

    let mut parsed = ParsedRows::default();
    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |position| position.line());
        let row: TicketRow = record.deserialize(Some(&headers))?;

        match row.into_snapshot(line)? {
            Some(snapshot) => parsed.snapshots.push(snapshot),
            None => parsed.skipped += 1,
        }
    }

    Ok(parsed)
}

#[derive(Debug, Deserialize)]
struct TicketRow {
    #[serde(rename = "id", default)]
    id: String,
    #[serde(rename = "category", default, deserialize_with = "empty_string_as_none")]
    category: Option<String>,
    #[serde(rename = "priority", default, deserialize_with = "empty_string_as_none")]
    priority: Option<String>,
    #[serde(rename = "status", default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
    #[serde(rename = "created at", default, deserialize_with = "empty_string_as_none")]
    created_at: Option<String>,
    #[serde(rename = "completed at", default, deserialize_with = "empty_string_as_none")]
    completed_at: Option<String>,
    #[serde(rename = "actual cost", default, deserialize_with = "empty_string_as_none")]
    actual_cost: Option<String>,
    #[serde(rename = "rating", default, deserialize_with = "empty_string_as_none")]
    rating: Option<String>,
}

impl TicketRow {
    /// `None` for rows without an id or a recognisable status.
    fn into_snapshot(self, line: u64) -> Result<Option<RequestSnapshot>, MaintenanceImportError> {
        let id = self.id.trim();
        if id.is_empty() {
            return Ok(None);
        }
        let Some(status) = self.status.as_deref().and_then(MaintenanceStatus::parse) else {
            return Ok(None);
        };

        let actual_cost = self
            .actual_cost
            .as_deref()
            .map(|raw| parse_cost(raw, line))
            .transpose()?;
        let rating = self
            .rating
            .as_deref()
            .map(|raw| parse_rating(raw, line))
            .transpose()?;

        Ok(Some(RequestSnapshot {
            id: RequestId(id.to_string()),
            category: self
                .category
                .as_deref()
                .map_or(MaintenanceCategory::Other, MaintenanceCategory::from_label_lossy),
            priority: self
                .priority
                .as_deref()
                .and_then(MaintenancePriority::parse)
                .unwrap_or_default(),
            status,
            created_at: self.created_at.as_deref().and_then(parse_datetime),
            completed_at: self.completed_at.as_deref().and_then(parse_datetime),
            actual_cost,
            rating,
        }))
    }
}

/// Costs are whole currency units; a zero fraction such as `500.00` is accepted,
/// any other fraction rejects the row.
fn parse_cost(raw: &str, line: u64) -> Result<u32, MaintenanceImportError> {
    let invalid = || MaintenanceImportError::InvalidRow {
        line,
        detail: format!("actual cost '{raw}' is not a whole amount"),
    };

    let cleaned = raw.trim().trim_start_matches(['₹', '$']).replace(',', "");
    let (whole, fraction) = cleaned.split_once('.').unwrap_or((cleaned.as_str(), ""));
    if !fraction.chars().all(|digit| digit == '0') {
        return Err(invalid());
    }
    whole.parse::<u32>().map_err(|_| invalid())
}

fn parse_rating(raw: &str, line: u64) -> Result<u8, MaintenanceImportError> {
    match raw.trim().parse::<u8>() {
        Ok(score) if (1..=5).contains(&score) => Ok(score),
        _ => Err(MaintenanceImportError::InvalidRow {
            line,
            detail: format!("rating '{raw}' must be between 1 and 5"),
        }),
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
