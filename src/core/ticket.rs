use super::UserId;
use crate::error::ServiceDeskError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a ticket
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TicketId(Uuid);

impl TicketId {
    /// Creates a new random ticket ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parses a ticket ID from its string form
    pub fn parse_str(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// First eight characters, used in human-facing messages
    #[must_use]
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Open,
    Assigned,
    InProgress,
    Completed,
    Closed,
}

impl Status {
    /// All statuses in lifecycle order
    #[must_use]
    pub const fn all() -> [Self; 5] {
        [
            Self::Open,
            Self::Assigned,
            Self::InProgress,
            Self::Completed,
            Self::Closed,
        ]
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Assigned => "ASSIGNED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Closed => "CLOSED",
        }
    }

    /// Whether the ticket still needs work
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open | Self::Assigned | Self::InProgress)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ServiceDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace(['-', ' '], "_").as_str() {
            "OPEN" => Ok(Self::Open),
            "ASSIGNED" => Ok(Self::Assigned),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "CLOSED" => Ok(Self::Closed),
            _ => Err(ServiceDeskError::Validation(format!(
                "Invalid status '{s}'"
            ))),
        }
    }
}

/// Ticket urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ServiceDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            _ => Err(ServiceDeskError::Validation(format!(
                "Invalid priority '{s}'"
            ))),
        }
    }
}

/// A unit of work tracked through the status lifecycle
///
/// `completed_at` is `Some` exactly when `status == Completed`. Only
/// [`crate::core::transition`] and [`Ticket::open`] produce new states, and
/// both uphold that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub division: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub created_by: UserId,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Bumped on every persisted mutation
    #[serde(default)]
    pub version: u64,
}

impl Ticket {
    /// Builds a fresh OPEN ticket from a validated draft
    pub fn open(
        draft: TicketDraft,
        creator: UserId,
        now: DateTime<Utc>,
    ) -> Result<Self, ServiceDeskError> {
        let draft = draft.validate()?;
        Ok(Self {
            id: TicketId::new(),
            title: draft.title.trim().to_string(),
            description: draft.description,
            status: Status::Open,
            priority: draft.priority,
            branch: draft.branch,
            division: draft.division,
            category: draft.category,
            created_by: creator,
            assigned_to: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            due_date: draft.due_date,
            version: 0,
        })
    }

    /// Checks the `completed_at` invariant
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        matches!(self.status, Status::Completed) == self.completed_at.is_some()
    }

    /// Open ticket past its due date
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status.is_open() && self.due_date.is_some_and(|due| due < now)
    }
}

/// Input for ticket creation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub division: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl TicketDraft {
    /// Rejects drafts missing a title, branch or category
    pub fn validate(self) -> Result<Self, ServiceDeskError> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if is_blank(self.branch.as_deref()) {
            missing.push("branch");
        }
        if is_blank(self.category.as_deref()) {
            missing.push("category");
        }

        if missing.is_empty() {
            Ok(self)
        } else {
            Err(ServiceDeskError::Validation(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )))
        }
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}
