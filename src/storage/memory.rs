//! In-memory storage backend
//!
//! Everything lives behind one `RwLock`, so each repository call is atomic.
//! Suitable for tests and for running the service without a data directory.

use super::repository::{
    HistoryRepository, NotificationRepository, TicketRepository, UserRepository,
};
use crate::core::{HistoryEntry, Notification, NotificationId, Ticket, TicketId, User, UserId};
use crate::error::{Result, ServiceDeskError};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct State {
    tickets: HashMap<TicketId, Ticket>,
    history: HashMap<TicketId, Vec<HistoryEntry>>,
    notifications: Vec<Notification>,
    users: HashMap<UserId, User>,
}

/// Ephemeral storage
#[derive(Default)]
pub struct MemoryStorage {
    state: RwLock<State>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| ServiceDeskError::Storage("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| ServiceDeskError::Storage("memory store lock poisoned".to_string()))
    }
}

fn newest_first(mut notifications: Vec<Notification>) -> Vec<Notification> {
    notifications.reverse();
    notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    notifications
}

impl TicketRepository for MemoryStorage {
    fn insert_ticket(&self, ticket: &Ticket) -> Result<()> {
        let mut state = self.write()?;
        if state.tickets.contains_key(&ticket.id) {
            return Err(ServiceDeskError::Storage(format!(
                "ticket {} already exists",
                ticket.id
            )));
        }
        state.tickets.insert(ticket.id.clone(), ticket.clone());
        Ok(())
    }

    fn load_ticket(&self, id: &TicketId) -> Result<Ticket> {
        self.read()?
            .tickets
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceDeskError::not_found("Ticket", id))
    }

    fn update_ticket(&self, ticket: &Ticket) -> Result<Ticket> {
        let mut state = self.write()?;
        let stored = state
            .tickets
            .get_mut(&ticket.id)
            .ok_or_else(|| ServiceDeskError::not_found("Ticket", &ticket.id))?;

        if stored.version != ticket.version {
            return Err(ServiceDeskError::Conflict {
                id: ticket.id.to_string(),
                expected: ticket.version,
                found: stored.version,
            });
        }

        let mut next = ticket.clone();
        next.version += 1;
        *stored = next.clone();
        Ok(next)
    }

    fn load_all_tickets(&self) -> Result<Vec<Ticket>> {
        Ok(self.read()?.tickets.values().cloned().collect())
    }

    fn delete_ticket(&self, id: &TicketId) -> Result<()> {
        let mut state = self.write()?;
        if state.tickets.remove(id).is_none() {
            return Err(ServiceDeskError::not_found("Ticket", id));
        }
        state.history.remove(id);
        state.notifications.retain(|n| &n.ticket_id != id);
        Ok(())
    }

    fn ticket_exists(&self, id: &TicketId) -> Result<bool> {
        Ok(self.read()?.tickets.contains_key(id))
    }
}

impl HistoryRepository for MemoryStorage {
    fn append_history(&self, entry: &HistoryEntry) -> Result<()> {
        let mut state = self.write()?;
        if !state.tickets.contains_key(&entry.ticket_id) {
            return Err(ServiceDeskError::not_found("Ticket", &entry.ticket_id));
        }
        state
            .history
            .entry(entry.ticket_id.clone())
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    fn history_for(&self, ticket_id: &TicketId) -> Result<Vec<HistoryEntry>> {
        Ok(self
            .read()?
            .history
            .get(ticket_id)
            .cloned()
            .unwrap_or_default())
    }
}

impl NotificationRepository for MemoryStorage {
    fn insert_notification(&self, notification: &Notification) -> Result<()> {
        self.write()?.notifications.push(notification.clone());
        Ok(())
    }

    fn load_notification(&self, id: &NotificationId) -> Result<Notification> {
        self.read()?
            .notifications
            .iter()
            .find(|n| &n.id == id)
            .cloned()
            .ok_or_else(|| ServiceDeskError::not_found("Notification", id))
    }

    fn save_notification(&self, notification: &Notification) -> Result<()> {
        let mut state = self.write()?;
        let slot = state
            .notifications
            .iter_mut()
            .find(|n| n.id == notification.id)
            .ok_or_else(|| ServiceDeskError::not_found("Notification", &notification.id))?;
        *slot = notification.clone();
        Ok(())
    }

    fn notifications_for(&self, user: &UserId) -> Result<Vec<Notification>> {
        let state = self.read()?;
        Ok(newest_first(
            state
                .notifications
                .iter()
                .filter(|n| &n.recipient == user)
                .cloned()
                .collect(),
        ))
    }
}

impl UserRepository for MemoryStorage {
    fn save_user(&self, user: &User) -> Result<()> {
        self.write()?.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    fn load_user(&self, id: &UserId) -> Result<User> {
        self.read()?
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceDeskError::not_found("User", id))
    }

    fn load_all_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<_> = self.read()?.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}
