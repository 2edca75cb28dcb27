//! Authorization policy
//!
//! Every lifecycle and query operation asks [`authorize`] before touching
//! state. Inactive users are refused everything.

use crate::core::{Notification, Role, Status, Ticket, User};
use crate::error::{Result, ServiceDeskError};

/// Statuses a technician may move their own ticket to
pub const TECHNICIAN_STATUSES: [Status; 2] = [Status::InProgress, Status::Completed];

/// Operation being attempted, with the resource it targets
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    CreateTicket,
    ViewTicket(&'a Ticket),
    AssignTicket(&'a Ticket),
    UpdateStatus(&'a Ticket, Status),
    DeleteTicket(&'a Ticket),
    ReadNotification(&'a Notification),
    ViewReports,
}

impl Action<'_> {
    const fn describe(&self) -> &'static str {
        match self {
            Self::CreateTicket => "create tickets",
            Self::ViewTicket(_) => "view this ticket",
            Self::AssignTicket(_) => "assign tickets",
            Self::UpdateStatus(..) => "update the status of this ticket",
            Self::DeleteTicket(_) => "delete tickets",
            Self::ReadNotification(_) => "acknowledge this notification",
            Self::ViewReports => "view reports",
        }
    }
}

/// Decides whether `actor` may perform `action`
pub fn authorize(actor: &User, action: &Action<'_>) -> Result<()> {
    if allowed(actor, action) {
        Ok(())
    } else {
        tracing::debug!(user = %actor.username, role = %actor.role, "denied: {}", action.describe());
        Err(ServiceDeskError::forbidden(format!(
            "{} ({}) may not {}",
            actor.username,
            actor.role,
            action.describe()
        )))
    }
}

fn allowed(actor: &User, action: &Action<'_>) -> bool {
    if !actor.is_active {
        return false;
    }

    match (*action, actor.role) {
        (Action::CreateTicket, _) => true,
        (Action::ReadNotification(n), _) => n.recipient == actor.id,
        (Action::AssignTicket(_) | Action::DeleteTicket(_) | Action::ViewReports, role) => {
            role == Role::Admin
        },
        (Action::UpdateStatus(..) | Action::ViewTicket(_), Role::Admin) => true,
        (Action::UpdateStatus(ticket, status), Role::Technician) => {
            is_assignee(actor, ticket) && TECHNICIAN_STATUSES.contains(&status)
        },
        (Action::UpdateStatus(..), Role::Staff) => false,
        (Action::ViewTicket(ticket), Role::Technician) => {
            is_assignee(actor, ticket) || ticket.created_by == actor.id
        },
        (Action::ViewTicket(ticket), Role::Staff) => ticket.created_by == actor.id,
    }
}

fn is_assignee(actor: &User, ticket: &Ticket) -> bool {
    ticket.assigned_to.as_ref() == Some(&actor.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TicketBuilder;

    fn users() -> (User, User, User) {
        (
            User::new("admin", Role::Admin),
            User::new("tech", Role::Technician),
            User::new("staff", Role::Staff),
        )
    }

    #[test]
    fn test_only_admin_assigns() {
        let (admin, tech, staff) = users();
        let ticket = TicketBuilder::new().created_by(staff.id.clone()).build();

        assert!(authorize(&admin, &Action::AssignTicket(&ticket)).is_ok());
        assert!(authorize(&tech, &Action::AssignTicket(&ticket)).is_err());
        assert!(authorize(&staff, &Action::AssignTicket(&ticket)).is_err());
    }

    #[test]
    fn test_status_update_requires_assignee_or_admin() {
        let (admin, tech, staff) = users();
        let other_tech = User::new("other", Role::Technician);
        let ticket = TicketBuilder::new()
            .created_by(staff.id.clone())
            .assigned_to(tech.id.clone())
            .status(Status::Assigned)
            .build();

        let complete = Action::UpdateStatus(&ticket, Status::Completed);
        assert!(authorize(&admin, &complete).is_ok());
        assert!(authorize(&tech, &complete).is_ok());
        assert!(matches!(
            authorize(&other_tech, &complete),
            Err(ServiceDeskError::Forbidden(_))
        ));
        assert!(authorize(&staff, &complete).is_err());
    }

    #[test]
    fn test_technician_status_range() {
        let (admin, tech, _) = users();
        let ticket = TicketBuilder::new().assigned_to(tech.id.clone()).build();

        assert!(authorize(&tech, &Action::UpdateStatus(&ticket, Status::InProgress)).is_ok());
        assert!(authorize(&tech, &Action::UpdateStatus(&ticket, Status::Closed)).is_err());
        assert!(authorize(&admin, &Action::UpdateStatus(&ticket, Status::Open)).is_ok());
    }

    #[test]
    fn test_inactive_user_is_refused() {
        let (mut admin, _, _) = users();
        admin.is_active = false;
        assert!(authorize(&admin, &Action::ViewReports).is_err());
        assert!(authorize(&admin, &Action::CreateTicket).is_err());
    }

    #[test]
    fn test_notification_acknowledged_by_recipient_only() {
        let (admin, tech, _) = users();
        let ticket = TicketBuilder::new().build();
        let notification = Notification::new(ticket.id, tech.id.clone(), "hello");

        assert!(authorize(&tech, &Action::ReadNotification(&notification)).is_ok());
        assert!(authorize(&admin, &Action::ReadNotification(&notification)).is_err());
    }

    #[test]
    fn test_ticket_visibility() {
        let (admin, tech, staff) = users();
        let other_staff = User::new("other", Role::Staff);
        let ticket = TicketBuilder::new()
            .created_by(staff.id.clone())
            .assigned_to(tech.id.clone())
            .build();

        let view = Action::ViewTicket(&ticket);
        assert!(authorize(&admin, &view).is_ok());
        assert!(authorize(&tech, &view).is_ok());
        assert!(authorize(&staff, &view).is_ok());
        assert!(authorize(&other_staff, &view).is_err());
    }
}
