use super::{Status, Ticket, TicketId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a notification
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(Uuid);

impl NotificationId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse_str(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Durable per-user message describing a ticket event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub ticket_id: TicketId,
    pub recipient: UserId,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    #[must_use]
    pub fn new(ticket_id: TicketId, recipient: UserId, message: impl Into<String>) -> Self {
        Self {
            id: NotificationId::new(),
            ticket_id,
            recipient,
            message: message.into(),
            read: false,
            created_at: Utc::now(),
        }
    }
}

/// What a live connection receives when a notification is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub id: NotificationId,
    pub ticket: TicketId,
    pub ticket_title: String,
    pub ticket_status: Status,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl NotificationPayload {
    #[must_use]
    pub fn new(notification: &Notification, ticket: &Ticket) -> Self {
        Self {
            id: notification.id.clone(),
            ticket: ticket.id.clone(),
            ticket_title: ticket.title.clone(),
            ticket_status: ticket.status,
            message: notification.message.clone(),
            read: notification.read,
            created_at: notification.created_at,
        }
    }
}
