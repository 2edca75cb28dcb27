//! Pure ticket transitions
//!
//! A transition takes the previous snapshot of a ticket and a requested change
//! and returns the state to persist together with the side effects the change
//! triggers. Nothing here touches storage, so the service can execute the plan
//! in a fixed order: ticket, history, notifications.

use super::{Status, Ticket, User, UserId};
use chrono::{DateTime, Utc};

/// A requested mutation of an existing ticket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketChange {
    /// Hand the ticket to a technician
    Assign {
        technician: UserId,
        technician_name: String,
    },
    /// Move the ticket to another status
    SetStatus {
        status: Status,
        comment: Option<String>,
    },
}

/// History entry to append once the ticket is persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryIntent {
    pub action: String,
    pub comment: Option<String>,
}

/// Notification to create once history is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationIntent {
    pub recipient: UserId,
    pub message: String,
    pub email: bool,
}

/// Planned outcome of a change
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub ticket: Ticket,
    pub history: Vec<HistoryIntent>,
    pub notifications: Vec<NotificationIntent>,
    changed: bool,
}

impl Transition {
    fn unchanged(ticket: &Ticket) -> Self {
        Self {
            ticket: ticket.clone(),
            history: Vec::new(),
            notifications: Vec::new(),
            changed: false,
        }
    }

    /// True when the change leaves the ticket as it was
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        !self.changed
    }
}

/// Effects of creating `ticket`
///
/// The creator and every other active admin are notified, with email.
#[must_use]
pub fn plan_creation(ticket: &Ticket, creator: &User, admins: &[User]) -> Transition {
    let mut notifications = vec![NotificationIntent {
        recipient: creator.id.clone(),
        message: format!(
            "Your ticket #{} '{}' has been created.",
            ticket.id.short(),
            ticket.title
        ),
        email: true,
    }];

    notifications.extend(
        admins
            .iter()
            .filter(|a| a.is_active && a.is_admin() && a.id != creator.id)
            .map(|admin| NotificationIntent {
                recipient: admin.id.clone(),
                message: format!(
                    "New ticket #{} created by {}.",
                    ticket.id.short(),
                    creator.username
                ),
                email: true,
            }),
    );

    Transition {
        ticket: ticket.clone(),
        history: vec![HistoryIntent {
            action: format!("Ticket '{}' created", ticket.title),
            comment: None,
        }],
        notifications,
        changed: true,
    }
}

/// Applies `change` to `previous` as of `now`
#[must_use]
pub fn plan(previous: &Ticket, change: &TicketChange, now: DateTime<Utc>) -> Transition {
    match change {
        TicketChange::Assign {
            technician,
            technician_name,
        } => {
            if previous.assigned_to.as_ref() == Some(technician)
                && previous.status == Status::Assigned
            {
                return Transition::unchanged(previous);
            }

            let mut ticket = with_status(previous, Status::Assigned, now);
            ticket.assigned_to = Some(technician.clone());

            Transition {
                history: vec![HistoryIntent {
                    action: format!("Ticket assigned to {technician_name}"),
                    comment: None,
                }],
                notifications: vec![NotificationIntent {
                    recipient: technician.clone(),
                    message: format!(
                        "You have been assigned to ticket #{}: '{}'.",
                        ticket.id.short(),
                        ticket.title
                    ),
                    email: true,
                }],
                ticket,
                changed: true,
            }
        },
        TicketChange::SetStatus { status, comment } => {
            if previous.status == *status {
                return Transition::unchanged(previous);
            }

            let ticket = with_status(previous, *status, now);

            Transition {
                history: vec![HistoryIntent {
                    action: format!("Status changed from {} to {}", previous.status, status),
                    comment: comment.clone(),
                }],
                notifications: vec![NotificationIntent {
                    recipient: ticket.created_by.clone(),
                    message: format!(
                        "Status of ticket #{} changed to {}.",
                        ticket.id.short(),
                        status
                    ),
                    email: true,
                }],
                ticket,
                changed: true,
            }
        },
    }
}

/// Copies `previous` with a new status, keeping `completed_at` in step
fn with_status(previous: &Ticket, status: Status, now: DateTime<Utc>) -> Ticket {
    let mut ticket = previous.clone();
    ticket.completed_at = match (status, previous.completed_at) {
        (Status::Completed, Some(at)) if previous.status == Status::Completed => Some(at),
        (Status::Completed, _) => Some(now.max(previous.created_at)),
        _ => None,
    };
    ticket.status = status;
    ticket.updated_at = now;
    ticket
}
