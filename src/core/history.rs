use super::{TicketId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable audit record of one ticket mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub ticket_id: TicketId,
    pub action: String,
    /// `None` when the change was system-initiated
    #[serde(default)]
    pub performed_by: Option<UserId>,
    #[serde(default)]
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    #[must_use]
    pub fn new(
        ticket_id: TicketId,
        action: impl Into<String>,
        performed_by: Option<UserId>,
        comment: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticket_id,
            action: action.into(),
            performed_by,
            comment: comment.filter(|c| !c.trim().is_empty()),
            timestamp: Utc::now(),
        }
    }
}

/// Sorts entries given in append order newest first
///
/// Entries sharing a timestamp come out in reverse append order.
pub fn sort_newest_first(entries: &mut [HistoryEntry]) {
    entries.reverse();
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
