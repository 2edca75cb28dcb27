//! Ticket lifecycle service
//!
//! Every mutation runs the same pipeline:
//!
//! 1. load the current snapshot and ask [`policy::authorize`]
//! 2. compute a [`Transition`] with the pure planner
//! 3. persist the ticket (version-checked)
//! 4. append history, then create notifications
//!
//! Once step 3 succeeds the operation succeeds. Failures in step 4 are logged
//! and swallowed, and delivery of the notifications happens in the background.
//! Mutations of one ticket are serialized by a per-ticket async lock.

use crate::audit::AuditLog;
use crate::core::transition::{self, TicketChange, Transition};
use crate::core::{
    HistoryEntry, Notification, NotificationId, Role, Status, Ticket, TicketDraft, TicketId,
    User, UserId,
};
use crate::error::{Result, ServiceDeskError};
use crate::notify::NotificationDispatcher;
use crate::policy::{self, Action};
use crate::storage::{NotificationRepository, Storage, TicketRepository, UserRepository};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

/// Executes lifecycle operations against storage
pub struct TicketService {
    storage: Arc<dyn Storage>,
    audit: AuditLog,
    dispatcher: Arc<NotificationDispatcher>,
    locks: Mutex<HashMap<TicketId, Arc<AsyncMutex<()>>>>,
}

impl TicketService {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self {
            audit: AuditLog::new(Arc::clone(&storage)),
            storage,
            dispatcher,
            locks: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Opens a new ticket on behalf of `creator`
    pub fn create(&self, draft: TicketDraft, creator: &User) -> Result<Ticket> {
        policy::authorize(creator, &Action::CreateTicket)?;

        let ticket = Ticket::open(draft, creator.id.clone(), Utc::now())?;
        self.storage.insert_ticket(&ticket)?;
        info!(ticket = %ticket.id, by = %creator.username, "ticket created");

        let admins = self.storage.active_admins().unwrap_or_else(|e| {
            warn!("Failed to load admins for ticket {}: {e}", ticket.id);
            Vec::new()
        });
        let plan = transition::plan_creation(&ticket, creator, &admins);
        self.run_effects(&ticket, &plan, &creator.id);

        Ok(ticket)
    }

    /// Hands a ticket to a technician; admin only
    pub async fn assign(
        &self,
        ticket_id: &TicketId,
        technician_id: &UserId,
        actor: &User,
    ) -> Result<Ticket> {
        let _guard = self.lock(ticket_id).await;
        let ticket = self.storage.load_ticket(ticket_id)?;
        policy::authorize(actor, &Action::AssignTicket(&ticket))?;

        let technician = self.storage.load_user(technician_id)?;
        if technician.role != Role::Technician {
            return Err(ServiceDeskError::RoleMismatch {
                user: technician.username,
                expected: Role::Technician.to_string(),
                actual: technician.role.to_string(),
            });
        }
        if !technician.is_active {
            return Err(ServiceDeskError::validation(format!(
                "technician {} is inactive",
                technician.username
            )));
        }

        let change = TicketChange::Assign {
            technician: technician.id.clone(),
            technician_name: technician.display_name().to_string(),
        };
        let updated = self.commit(&ticket, &change, actor)?;
        if updated.version != ticket.version {
            info!(ticket = %ticket_id, technician = %technician.username, "ticket assigned");
        }
        Ok(updated)
    }

    /// Moves a ticket to `status`; admin or the assigned technician
    pub async fn update_status(
        &self,
        ticket_id: &TicketId,
        status: Status,
        actor: &User,
        comment: Option<String>,
    ) -> Result<Ticket> {
        let _guard = self.lock(ticket_id).await;
        let ticket = self.storage.load_ticket(ticket_id)?;
        policy::authorize(actor, &Action::UpdateStatus(&ticket, status))?;

        let from = ticket.status;
        let updated = self.commit(&ticket, &TicketChange::SetStatus { status, comment }, actor)?;
        if updated.version != ticket.version {
            info!(ticket = %ticket_id, by = %actor.username, "status {from} -> {status}");
        }
        Ok(updated)
    }

    /// Removes a ticket with its history and notifications; admin only
    pub async fn delete_ticket(&self, ticket_id: &TicketId, actor: &User) -> Result<()> {
        let _guard = self.lock(ticket_id).await;
        let ticket = self.storage.load_ticket(ticket_id)?;
        policy::authorize(actor, &Action::DeleteTicket(&ticket))?;
        self.storage.delete_ticket(ticket_id)?;
        info!(ticket = %ticket_id, by = %actor.username, "ticket deleted");
        Ok(())
    }

    /// Fetches a ticket the actor may see
    pub fn ticket(&self, ticket_id: &TicketId, actor: &User) -> Result<Ticket> {
        let ticket = self.storage.load_ticket(ticket_id)?;
        policy::authorize(actor, &Action::ViewTicket(&ticket))?;
        Ok(ticket)
    }

    /// History of a ticket the actor may see, newest first
    pub fn history(&self, ticket_id: &TicketId, actor: &User) -> Result<Vec<HistoryEntry>> {
        self.ticket(ticket_id, actor)?;
        self.audit.list_for_ticket(ticket_id)
    }

    /// Marks a notification read; repeating it changes nothing
    pub fn read_notification(
        &self,
        notification_id: &NotificationId,
        actor: &User,
    ) -> Result<Notification> {
        let mut notification = self.storage.load_notification(notification_id)?;
        policy::authorize(actor, &Action::ReadNotification(&notification))?;

        if !notification.read {
            notification.read = true;
            self.storage.save_notification(&notification)?;
        }
        Ok(notification)
    }

    /// Marks every unread notification of the actor read, returning how many changed
    pub fn mark_all_read(&self, actor: &User) -> Result<usize> {
        let mut changed = 0;
        for mut notification in self.notifications_for(actor)? {
            if notification.read {
                continue;
            }
            notification.read = true;
            self.storage.save_notification(&notification)?;
            changed += 1;
        }
        Ok(changed)
    }

    /// Inbox of the actor, newest first
    pub fn notifications_for(&self, actor: &User) -> Result<Vec<Notification>> {
        if !actor.is_active {
            return Err(ServiceDeskError::forbidden(format!(
                "{} is inactive",
                actor.username
            )));
        }
        self.storage.notifications_for(&actor.id)
    }

    pub fn unread_count(&self, actor: &User) -> Result<usize> {
        Ok(self
            .notifications_for(actor)?
            .iter()
            .filter(|n| !n.read)
            .count())
    }

    async fn lock(&self, ticket_id: &TicketId) -> TicketGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(ticket_id.clone()).or_default())
        };
        TicketGuard {
            guard: Some(Arc::clone(&lock).lock_owned().await),
            lock,
            ticket_id: ticket_id.clone(),
            locks: &self.locks,
        }
    }

    /// Plans `change`, persists the result and runs its effects
    fn commit(&self, previous: &Ticket, change: &TicketChange, actor: &User) -> Result<Ticket> {
        let plan = transition::plan(previous, change, Utc::now());
        if plan.is_noop() {
            debug!(ticket = %previous.id, "no-op change ignored");
            return Ok(previous.clone());
        }

        let stored = self.storage.update_ticket(&plan.ticket)?;
        self.run_effects(&stored, &plan, &actor.id);
        Ok(stored)
    }

    fn run_effects(&self, ticket: &Ticket, plan: &Transition, actor: &UserId) {
        for intent in &plan.history {
            if let Err(e) = self.audit.record(
                &ticket.id,
                intent.action.clone(),
                Some(actor),
                intent.comment.clone(),
            ) {
                warn!(ticket = %ticket.id, "Failed to record history '{}': {e}", intent.action);
            }
        }

        for intent in &plan.notifications {
            let recipient = match self.storage.load_user(&intent.recipient) {
                Ok(user) => user,
                Err(e) => {
                    warn!(ticket = %ticket.id, "Skipping notification for {}: {e}", intent.recipient);
                    continue;
                },
            };
            if let Err(e) = self
                .dispatcher
                .notify(ticket, &recipient, &intent.message, intent.email)
            {
                warn!(ticket = %ticket.id, user = %recipient.username, "Failed to create notification: {e}");
            }
        }
    }
}

/// Holds one ticket's lock; the map entry is pruned once nobody else wants it
struct TicketGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    lock: Arc<AsyncMutex<()>>,
    ticket_id: TicketId,
    locks: &'a Mutex<HashMap<TicketId, Arc<AsyncMutex<()>>>>,
}

impl Drop for TicketGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one here: no other task is waiting
        let idle = locks
            .get(&self.ticket_id)
            .is_some_and(|held| Arc::ptr_eq(held, &self.lock) && Arc::strong_count(held) == 2);
        if idle {
            locks.remove(&self.ticket_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{HistoryRepository, NotificationRepository, TicketRepository};
    use crate::test_utils::{TestDesk, draft};

    #[tokio::test]
    async fn test_create_writes_history_and_notifications() {
        let desk = TestDesk::new();
        let ticket = desk.service.create(draft("Printer broken"), &desk.staff).unwrap();

        assert_eq!(ticket.status, Status::Open);
        let history = desk.storage.history_for(&ticket.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, "Ticket 'Printer broken' created");
        assert_eq!(history[0].performed_by, Some(desk.staff.id.clone()));

        assert_eq!(desk.storage.notifications_for(&desk.staff.id).unwrap().len(), 1);
        assert_eq!(desk.storage.notifications_for(&desk.admin.id).unwrap().len(), 1);
        assert!(desk.storage.notifications_for(&desk.tech.id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_incomplete_draft() {
        let desk = TestDesk::new();
        let err = desk
            .service
            .create(TicketDraft::default(), &desk.staff)
            .unwrap_err();
        assert!(matches!(err, ServiceDeskError::Validation(_)));
        assert!(desk.storage.load_all_tickets().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_assign_checks_role_and_existence() {
        let desk = TestDesk::new();
        let ticket = desk.ticket("Scanner");

        let err = desk
            .service
            .assign(&ticket.id, &desk.staff.id, &desk.admin)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceDeskError::RoleMismatch { .. }));

        let err = desk
            .service
            .assign(&ticket.id, &UserId::new(), &desk.admin)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceDeskError::NotFound { entity: "User", .. }));

        let err = desk
            .service
            .assign(&TicketId::new(), &desk.tech.id, &desk.admin)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceDeskError::NotFound { entity: "Ticket", .. }));

        let err = desk
            .service
            .assign(&ticket.id, &desk.tech.id, &desk.tech)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceDeskError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_reassigning_same_technician_is_noop() {
        let desk = TestDesk::new();
        let ticket = desk.ticket("Scanner");

        let first = desk
            .service
            .assign(&ticket.id, &desk.tech.id, &desk.admin)
            .await
            .unwrap();
        let second = desk
            .service
            .assign(&ticket.id, &desk.tech.id, &desk.admin)
            .await
            .unwrap();

        assert_eq!(first.version, second.version);
        assert_eq!(desk.storage.history_for(&ticket.id).unwrap().len(), 2);
        assert_eq!(desk.storage.notifications_for(&desk.tech.id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_same_status_writes_nothing() {
        let desk = TestDesk::new();
        let ticket = desk.ticket("Monitor");

        let same = desk
            .service
            .update_status(&ticket.id, Status::Open, &desk.admin, Some("again".into()))
            .await
            .unwrap();

        assert_eq!(same.version, ticket.version);
        let history = desk.storage.history_for(&ticket.id).unwrap();
        assert!(history.iter().all(|h| !h.action.starts_with("Status changed")));
    }

    #[tokio::test]
    async fn test_admin_may_reopen() {
        let desk = TestDesk::new();
        let ticket = desk.ticket("Keyboard");

        let done = desk
            .service
            .update_status(&ticket.id, Status::Completed, &desk.admin, None)
            .await
            .unwrap();
        assert!(done.completed_at.is_some());

        let reopened = desk
            .service
            .update_status(&ticket.id, Status::Open, &desk.admin, None)
            .await
            .unwrap();
        assert_eq!(reopened.status, Status::Open);
        assert!(reopened.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_read_notification_is_idempotent_and_private() {
        let desk = TestDesk::new();
        desk.ticket("Mouse");
        let notification = desk.storage.notifications_for(&desk.staff.id).unwrap()[0].clone();

        let first = desk.service.read_notification(&notification.id, &desk.staff).unwrap();
        let second = desk.service.read_notification(&notification.id, &desk.staff).unwrap();
        assert!(first.read && second.read);
        assert_eq!(first, second);

        let err = desk
            .service
            .read_notification(&notification.id, &desk.admin)
            .unwrap_err();
        assert!(matches!(err, ServiceDeskError::Forbidden(_)));

        let err = desk
            .service
            .read_notification(&NotificationId::new(), &desk.staff)
            .unwrap_err();
        assert!(matches!(err, ServiceDeskError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_mark_all_read_and_unread_count() {
        let desk = TestDesk::new();
        desk.ticket("One");
        desk.ticket("Two");

        assert_eq!(desk.service.unread_count(&desk.admin).unwrap(), 2);
        assert_eq!(desk.service.mark_all_read(&desk.admin).unwrap(), 2);
        assert_eq!(desk.service.mark_all_read(&desk.admin).unwrap(), 0);
        assert_eq!(desk.service.unread_count(&desk.admin).unwrap(), 0);
        assert_eq!(desk.service.unread_count(&desk.staff).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_is_admin_only_and_cascades() {
        let desk = TestDesk::new();
        let ticket = desk.ticket("Old request");

        let err = desk
            .service
            .delete_ticket(&ticket.id, &desk.staff)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceDeskError::Forbidden(_)));

        desk.service.delete_ticket(&ticket.id, &desk.admin).await.unwrap();
        assert!(!desk.storage.ticket_exists(&ticket.id).unwrap());
        assert!(desk.storage.notifications_for(&desk.staff.id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_visibility() {
        let desk = TestDesk::new();
        let ticket = desk.ticket("Phone");
        let outsider = desk.add_user("outsider", Role::Staff);

        assert_eq!(desk.service.history(&ticket.id, &desk.staff).unwrap().len(), 1);
        assert!(matches!(
            desk.service.history(&ticket.id, &outsider),
            Err(ServiceDeskError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_updates_stay_consistent() {
        let desk = Arc::new(TestDesk::new());
        let ticket = desk.ticket("Race");

        let mut handles = Vec::new();
        for status in [Status::Completed, Status::Closed, Status::InProgress, Status::Completed] {
            let desk = Arc::clone(&desk);
            let id = ticket.id.clone();
            handles.push(tokio::spawn(async move {
                desk.service
                    .update_status(&id, status, &desk.admin, None)
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = desk.storage.load_ticket(&ticket.id).unwrap();
        assert!(stored.is_consistent());
        let changes = desk
            .storage
            .history_for(&ticket.id)
            .unwrap()
            .into_iter()
            .filter(|h| h.action.starts_with("Status changed"))
            .count() as u64;
        assert_eq!(stored.version, changes);
        assert!(desk.service.locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ticket_locks_are_released() {
        let desk = TestDesk::new();
        let ticket = desk.ticket("Monitor");

        desk.service
            .assign(&ticket.id, &desk.tech.id, &desk.admin)
            .await
            .unwrap();
        desk.service
            .update_status(&ticket.id, Status::Closed, &desk.tech, None)
            .await
            .unwrap_err();
        assert!(desk.service.locks.lock().unwrap().is_empty());

        let held = desk.service.lock(&ticket.id).await;
        assert_eq!(desk.service.locks.lock().unwrap().len(), 1);
        drop(held);
        assert!(desk.service.locks.lock().unwrap().is_empty());
    }
}
