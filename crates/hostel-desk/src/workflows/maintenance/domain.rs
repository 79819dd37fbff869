use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for maintenance requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StaffId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostelId(pub String);

/// Where the reported issue is located.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub hostel_id: HostelId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceCategory {
    Electrical,
    Plumbing,
    Cleaning,
    Furniture,
    Appliance,
    Internet,
    Other,
}

impl MaintenanceCategory {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Electrical,
            Self::Plumbing,
            Self::Cleaning,
            Self::Furniture,
            Self::Appliance,
            Self::Internet,
            Self::Other,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Electrical => "Electrical",
            Self::Plumbing => "Plumbing",
            Self::Cleaning => "Cleaning",
            Self::Furniture => "Furniture",
            Self::Appliance => "Appliance",
            Self::Internet => "Internet",
            Self::Other => "Other",
        }
    }

    /// Unrecognised values collapse into `Other`.
    pub fn from_label_lossy(raw: &str) -> Self {
        Self::ordered()
            .into_iter()
            .find(|category| category.label().eq_ignore_ascii_case(raw.trim()))
            .unwrap_or(Self::Other)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MaintenancePriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl MaintenancePriority {
    pub const fn ordered() -> [Self; 4] {
        [Self::Low, Self::Medium, Self::High, Self::Urgent]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Urgent => "Urgent",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|priority| priority.label().eq_ignore_ascii_case(raw.trim()))
    }
}

/// Lifecycle status of a maintenance request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl MaintenanceStatus {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Pending,
            Self::Assigned,
            Self::InProgress,
            Self::Completed,
            Self::Cancelled,
        ]
    }

    /// Wire name, matching the serde representation.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Assigned => "Assigned",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Accepts either the wire code or the display label.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ordered().into_iter().find(|status| {
            status.code().eq_ignore_ascii_case(trimmed)
                || status.label().eq_ignore_ascii_case(trimmed)
        })
    }
}

impl fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Student,
    Owner,
    Staff,
}

impl ActorRole {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Owner => "owner",
            Self::Staff => "staff",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Self::Student),
            "owner" => Some(Self::Owner),
            "staff" => Some(Self::Staff),
            _ => None,
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Authenticated caller as resolved by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub role: ActorRole,
    pub id: String,
    pub hostel_id: Option<HostelId>,
}

impl Actor {
    pub fn student(id: impl Into<String>) -> Self {
        Self {
            role: ActorRole::Student,
            id: id.into(),
            hostel_id: None,
        }
    }

    pub fn staff(id: impl Into<String>) -> Self {
        Self {
            role: ActorRole::Staff,
            id: id.into(),
            hostel_id: None,
        }
    }

    pub fn owner(id: impl Into<String>, hostel_id: HostelId) -> Self {
        Self {
            role: ActorRole::Owner,
            id: id.into(),
            hostel_id: Some(hostel_id),
        }
    }

    pub fn student_id(&self) -> Option<StudentId> {
        (self.role == ActorRole::Student).then(|| StudentId(self.id.clone()))
    }
}

/// Uploaded photo metadata; the binary lives in object storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub file_name: String,
    pub storage_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceNote {
    pub body: String,
    pub author_role: ActorRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub rated_at: DateTime<Utc>,
}

/// Student supplied payload for a new ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceSubmission {
    pub location: Location,
    pub category: MaintenanceCategory,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub priority: MaintenancePriority,
    #[serde(default)]
    pub images: Vec<ImageDescriptor>,
}

/// Staff/owner driven change to a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: MaintenanceStatus,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub estimated_cost: Option<u32>,
    #[serde(default)]
    pub actual_cost: Option<u32>,
    #[serde(default)]
    pub assigned_to: Option<StaffId>,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

impl StatusUpdate {
    pub fn to(status: MaintenanceStatus) -> Self {
        Self {
            status,
            note: None,
            estimated_cost: None,
            actual_cost: None,
            assigned_to: None,
            expected_version: None,
        }
    }
}

/// One status/note change applied uniformly to several requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkStatusUpdate {
    pub ids: Vec<RequestId>,
    pub status: MaintenanceStatus,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<StaffId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingSubmission {
    pub score: u8,
    #[serde(default)]
    pub feedback: Option<String>,
}

/// Stored maintenance ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRequest {
    pub id: RequestId,
    pub student: StudentId,
    pub location: Location,
    pub category: MaintenanceCategory,
    pub priority: MaintenancePriority,
    pub status: MaintenanceStatus,
    pub title: String,
    pub description: String,
    pub images: Vec<ImageDescriptor>,
    pub assigned_to: Option<StaffId>,
    pub notes: Vec<MaintenanceNote>,
    pub estimated_cost: Option<u32>,
    pub actual_cost: Option<u32>,
    pub rating: Option<Rating>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub version: u64,
}

impl MaintenanceRequest {
    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn snapshot(&self) -> RequestSnapshot {
        RequestSnapshot {
            id: self.id.clone(),
            category: self.category,
            priority: self.priority,
            status: self.status,
            created_at: Some(self.created_at),
            completed_at: self.completed_at,
            actual_cost: self.actual_cost,
            rating: self.rating.as_ref().map(|rating| rating.score),
        }
    }

    pub fn to_view(&self) -> MaintenanceRequestView {
        MaintenanceRequestView {
            id: self.id.clone(),
            student: self.student.clone(),
            location: self.location.clone(),
            category: self.category,
            category_label: self.category.label(),
            priority: self.priority,
            priority_label: self.priority.label(),
            status: self.status,
            status_label: self.status.label(),
            title: self.title.clone(),
            description: self.description.clone(),
            images: self.images.clone(),
            assigned_to: self.assigned_to.clone(),
            notes: self.notes.clone(),
            estimated_cost: self.estimated_cost,
            actual_cost: self.actual_cost,
            rating: self.rating.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
            version: self.version,
        }
    }
}

/// Reporting subset of a request; also what CSV exports hydrate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSnapshot {
    pub id: RequestId,
    pub category: MaintenanceCategory,
    pub priority: MaintenancePriority,
    pub status: MaintenanceStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub actual_cost: Option<u32>,
    pub rating: Option<u8>,
}

/// API representation with display labels alongside wire codes.
#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceRequestView {
    pub id: RequestId,
    pub student: StudentId,
    pub location: Location,
    pub category: MaintenanceCategory,
    pub category_label: &'static str,
    pub priority: MaintenancePriority,
    pub priority_label: &'static str,
    pub status: MaintenanceStatus,
    pub status_label: &'static str,
    pub title: String,
    pub description: String,
    pub images: Vec<ImageDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<StaffId>,
    pub notes: Vec<MaintenanceNote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_cost: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub version: u64,
}
