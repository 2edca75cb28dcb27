use crate::core::{HistoryEntry, Notification, NotificationId, Ticket, TicketId, User, UserId};
use crate::error::Result;

/// Repository trait for ticket storage operations
///
/// Implementations must make [`TicketRepository::update_ticket`] an atomic
/// compare-and-swap on `version`.
pub trait TicketRepository: Send + Sync {
    /// Inserts a new ticket
    fn insert_ticket(&self, ticket: &Ticket) -> Result<()>;

    /// Loads a ticket by ID
    fn load_ticket(&self, id: &TicketId) -> Result<Ticket>;

    /// Persists a mutated ticket
    ///
    /// Fails with `Conflict` unless the stored version equals `ticket.version`.
    /// Returns the stored ticket with its bumped version.
    fn update_ticket(&self, ticket: &Ticket) -> Result<Ticket>;

    /// Loads all tickets
    fn load_all_tickets(&self) -> Result<Vec<Ticket>>;

    /// Deletes a ticket together with its history and notifications
    fn delete_ticket(&self, id: &TicketId) -> Result<()>;

    /// Checks if a ticket exists by ID
    fn ticket_exists(&self, id: &TicketId) -> Result<bool>;
}

/// Append-only store of history entries
pub trait HistoryRepository: Send + Sync {
    /// Appends an entry
    fn append_history(&self, entry: &HistoryEntry) -> Result<()>;

    /// Entries of a ticket in append order
    fn history_for(&self, ticket_id: &TicketId) -> Result<Vec<HistoryEntry>>;
}

/// Store of per-user notifications
pub trait NotificationRepository: Send + Sync {
    /// Inserts a new notification
    fn insert_notification(&self, notification: &Notification) -> Result<()>;

    /// Loads a notification by ID
    fn load_notification(&self, id: &NotificationId) -> Result<Notification>;

    /// Overwrites an existing notification
    fn save_notification(&self, notification: &Notification) -> Result<()>;

    /// Notifications addressed to a user, newest first
    fn notifications_for(&self, user: &UserId) -> Result<Vec<Notification>>;
}

/// Store of users
pub trait UserRepository: Send + Sync {
    /// Inserts or replaces a user
    fn save_user(&self, user: &User) -> Result<()>;

    /// Loads a user by ID
    fn load_user(&self, id: &UserId) -> Result<User>;

    /// Loads all users
    fn load_all_users(&self) -> Result<Vec<User>>;

    /// Finds the active user holding an access token
    fn find_by_token(&self, token: &str) -> Result<Option<User>> {
        Ok(self
            .load_all_users()?
            .into_iter()
            .find(|u| u.is_active && u.access_token.as_deref() == Some(token)))
    }

    /// Finds a user by username
    fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .load_all_users()?
            .into_iter()
            .find(|u| u.username.eq_ignore_ascii_case(username)))
    }

    /// All active admins
    fn active_admins(&self) -> Result<Vec<User>> {
        Ok(self
            .load_all_users()?
            .into_iter()
            .filter(|u| u.is_active && u.is_admin())
            .collect())
    }
}

/// Combined repository trait
pub trait Storage: TicketRepository + HistoryRepository + NotificationRepository + UserRepository {}

/// Implementation of Storage for types that implement every repository
impl<T> Storage for T where
    T: TicketRepository + HistoryRepository + NotificationRepository + UserRepository
{
}
