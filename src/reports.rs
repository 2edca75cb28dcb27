//! Read-only queries for dashboards and reports

use crate::core::{Priority, Role, Status, Ticket, User, UserId};
use crate::error::Result;
use crate::policy::{self, Action};
use crate::storage::{Storage, TicketRepository, UserRepository};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Label used for tickets without a branch
pub const UNKNOWN_BRANCH: &str = "Unknown";

/// Default size of the recent-tickets list
pub const RECENT_LIMIT: usize = 5;

/// Optional created-date window, both ends inclusive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
    #[serde(default)]
    pub created_from: Option<NaiveDate>,
    #[serde(default)]
    pub created_to: Option<NaiveDate>,
}

impl ReportFilter {
    #[must_use]
    pub fn matches(&self, ticket: &Ticket) -> bool {
        let created = ticket.created_at.date_naive();
        self.created_from.is_none_or(|from| created >= from)
            && self.created_to.is_none_or(|to| created <= to)
    }
}

/// Aggregated ticket counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketStats {
    pub total: usize,
    pub by_status: BTreeMap<Status, usize>,
    pub by_priority: BTreeMap<Priority, usize>,
    pub by_branch: BTreeMap<String, usize>,
    /// Keyed by technician username; unassigned tickets are not counted
    pub by_technician: BTreeMap<String, usize>,
    pub overdue: usize,
}

impl TicketStats {
    /// Aggregates `tickets` as of `now`
    ///
    /// `users` resolves assignee ids to usernames; unknown ids are shown as
    /// the raw id.
    #[must_use]
    pub fn compute(
        tickets: &[Ticket],
        users: &[User],
        filter: &ReportFilter,
        now: DateTime<Utc>,
    ) -> Self {
        let names: HashMap<&UserId, &str> =
            users.iter().map(|u| (&u.id, u.username.as_str())).collect();

        let mut stats = Self::default();
        for ticket in tickets.iter().filter(|t| filter.matches(t)) {
            stats.total += 1;
            *stats.by_status.entry(ticket.status).or_default() += 1;
            *stats.by_priority.entry(ticket.priority).or_default() += 1;

            let branch = ticket
                .branch
                .as_deref()
                .filter(|b| !b.trim().is_empty())
                .unwrap_or(UNKNOWN_BRANCH);
            *stats.by_branch.entry(branch.to_string()).or_default() += 1;

            if let Some(tech) = &ticket.assigned_to {
                let name = names
                    .get(tech)
                    .map_or_else(|| tech.to_string(), |n| (*n).to_string());
                *stats.by_technician.entry(name).or_default() += 1;
            }

            if ticket.is_overdue(now) {
                stats.overdue += 1;
            }
        }
        stats
    }
}

/// Query surface over storage
#[derive(Clone)]
pub struct Reports {
    storage: Arc<dyn Storage>,
}

impl Reports {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Desk-wide counts; admin only
    pub fn ticket_stats(&self, actor: &User, filter: &ReportFilter) -> Result<TicketStats> {
        policy::authorize(actor, &Action::ViewReports)?;
        Ok(TicketStats::compute(
            &self.storage.load_all_tickets()?,
            &self.storage.load_all_users()?,
            filter,
            Utc::now(),
        ))
    }

    /// Tickets the actor works with, newest first
    ///
    /// Staff see what they created, technicians what is assigned to them,
    /// admins everything.
    pub fn visible_tickets(&self, actor: &User) -> Result<Vec<Ticket>> {
        policy::authorize(actor, &Action::CreateTicket)?;

        let mut tickets: Vec<_> = self
            .storage
            .load_all_tickets()?
            .into_iter()
            .filter(|t| match actor.role {
                Role::Admin => true,
                Role::Technician => t.assigned_to.as_ref() == Some(&actor.id),
                Role::Staff => t.created_by == actor.id,
            })
            .collect();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tickets)
    }

    /// Completed tickets within the actor's scope, most recently completed first
    pub fn completed_tickets(&self, actor: &User) -> Result<Vec<Ticket>> {
        let mut tickets: Vec<_> = self
            .visible_tickets(actor)?
            .into_iter()
            .filter(|t| t.status == Status::Completed)
            .collect();
        tickets.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(tickets)
    }

    /// The newest `limit` tickets within the actor's scope
    pub fn recent_tickets(&self, actor: &User, limit: usize) -> Result<Vec<Ticket>> {
        let mut tickets = self.visible_tickets(actor)?;
        tickets.truncate(limit);
        Ok(tickets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TicketBuilder;
    use crate::error::ServiceDeskError;
    use crate::storage::{MemoryStorage, TicketRepository, UserRepository};
    use chrono::Duration;

    struct Fixture {
        reports: Reports,
        admin: User,
        tech: User,
        staff: User,
    }

    fn fixture() -> Fixture {
        let storage = Arc::new(MemoryStorage::new());
        let admin = User::new("admin", Role::Admin);
        let tech = User::new("kasun", Role::Technician);
        let staff = User::new("nimal", Role::Staff);
        for user in [&admin, &tech, &staff] {
            storage.save_user(user).unwrap();
        }

        let now = Utc::now();
        let tickets = [
            TicketBuilder::new()
                .title("Printer")
                .branch("Colombo")
                .created_by(staff.id.clone())
                .assigned_to(tech.id.clone())
                .status(Status::Completed)
                .priority(Priority::High)
                .completed_at(now - Duration::hours(2))
                .created_at(now - Duration::days(3))
                .build(),
            TicketBuilder::new()
                .title("Network")
                .branch("Kandy")
                .created_by(staff.id.clone())
                .assigned_to(tech.id.clone())
                .status(Status::Completed)
                .completed_at(now - Duration::hours(1))
                .created_at(now - Duration::days(2))
                .build(),
            TicketBuilder::new()
                .title("Laptop")
                .created_by(admin.id.clone())
                .due_date(now - Duration::days(1))
                .created_at(now - Duration::days(1))
                .build(),
        ];
        for ticket in &tickets {
            storage.insert_ticket(ticket).unwrap();
        }

        Fixture {
            reports: Reports::new(storage),
            admin,
            tech,
            staff,
        }
    }

    #[test]
    fn test_stats_counts() {
        let f = fixture();
        let stats = f.reports.ticket_stats(&f.admin, &ReportFilter::default()).unwrap();

        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_status[&Status::Completed], 2);
        assert_eq!(stats.by_status[&Status::Open], 1);
        assert_eq!(stats.by_priority[&Priority::High], 1);
        assert_eq!(stats.by_branch[UNKNOWN_BRANCH], 1);
        assert_eq!(stats.by_branch["Colombo"], 1);
        assert_eq!(stats.by_technician["kasun"], 2);
        assert_eq!(stats.by_technician.len(), 1);
        assert_eq!(stats.overdue, 1);
    }

    #[test]
    fn test_stats_are_admin_only() {
        let f = fixture();
        let err = f
            .reports
            .ticket_stats(&f.staff, &ReportFilter::default())
            .unwrap_err();
        assert!(matches!(err, ServiceDeskError::Forbidden(_)));
    }

    #[test]
    fn test_stats_date_filter() {
        let f = fixture();
        let today = Utc::now().date_naive();
        let filter = ReportFilter {
            created_from: Some(today - Duration::days(1)),
            created_to: Some(today),
        };
        let stats = f.reports.ticket_stats(&f.admin, &filter).unwrap();
        assert_eq!(stats.total, 1);
    }

    #[test]
    fn test_visible_tickets_by_role() {
        let f = fixture();
        assert_eq!(f.reports.visible_tickets(&f.admin).unwrap().len(), 3);
        assert_eq!(f.reports.visible_tickets(&f.tech).unwrap().len(), 2);

        let mine = f.reports.visible_tickets(&f.staff).unwrap();
        let titles: Vec<_> = mine.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Network", "Printer"]);
    }

    #[test]
    fn test_completed_and_recent() {
        let f = fixture();
        let completed = f.reports.completed_tickets(&f.admin).unwrap();
        let titles: Vec<_> = completed.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Network", "Printer"]);

        let recent = f.reports.recent_tickets(&f.admin, 1).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].title, "Laptop");
    }
}
