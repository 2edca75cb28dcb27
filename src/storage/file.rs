//! YAML file storage backend
//!
//! Layout under the data directory:
//!
//! ```text
//! tickets/<ticket-id>.yaml
//! history/<ticket-id>.yaml        (list, append order)
//! notifications/<id>.yaml
//! users/<user-id>.yaml
//! ```
//!
//! Writes go through a temporary file and a rename so readers never see a
//! half-written document. Mutations are serialized by an in-process lock,
//! which makes the version check in `update_ticket` atomic.

use super::repository::{
    HistoryRepository, NotificationRepository, TicketRepository, UserRepository,
};
use crate::core::{HistoryEntry, Notification, NotificationId, Ticket, TicketId, User, UserId};
use crate::error::{Result, ServiceDeskError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

const TICKETS_DIR: &str = "tickets";
const HISTORY_DIR: &str = "history";
const NOTIFICATIONS_DIR: &str = "notifications";
const USERS_DIR: &str = "users";

/// Durable storage rooted at a directory
#[derive(Clone)]
pub struct FileStorage {
    root: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileStorage {
    /// Create a new file storage instance
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Opens the store, creating its directories when missing
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let storage = Self::new(root);
        storage.ensure_directories()?;
        Ok(storage)
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [TICKETS_DIR, HISTORY_DIR, NOTIFICATIONS_DIR, USERS_DIR] {
            fs::create_dir_all(self.root.join(dir))?;
        }
        Ok(())
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| ServiceDeskError::Storage("file store lock poisoned".to_string()))
    }

    fn path(&self, dir: &str, id: &impl ToString) -> PathBuf {
        self.root.join(dir).join(format!("{}.yaml", id.to_string()))
    }

    fn read_doc<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(serde_yaml::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_doc<T: Serialize>(path: &Path, value: &T) -> Result<()> {
        let content = serde_yaml::to_string(value)?;
        let tmp = path.with_extension("yaml.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn read_dir<T: DeserializeOwned>(&self, dir: &str) -> Result<Vec<T>> {
        let dir = self.root.join(dir);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut items = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                if let Some(item) = Self::read_doc(&path)? {
                    items.push(item);
                }
            }
        }
        Ok(items)
    }

    fn remove_if_exists(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn newest_first(mut notifications: Vec<Notification>) -> Vec<Notification> {
    notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    notifications
}

impl TicketRepository for FileStorage {
    fn insert_ticket(&self, ticket: &Ticket) -> Result<()> {
        let _guard = self.lock()?;
        let path = self.path(TICKETS_DIR, &ticket.id);
        if path.exists() {
            return Err(ServiceDeskError::Storage(format!(
                "ticket {} already exists",
                ticket.id
            )));
        }
        Self::write_doc(&path, ticket)
    }

    fn load_ticket(&self, id: &TicketId) -> Result<Ticket> {
        Self::read_doc(&self.path(TICKETS_DIR, id))?
            .ok_or_else(|| ServiceDeskError::not_found("Ticket", id))
    }

    fn update_ticket(&self, ticket: &Ticket) -> Result<Ticket> {
        let _guard = self.lock()?;
        let path = self.path(TICKETS_DIR, &ticket.id);
        let stored: Ticket =
            Self::read_doc(&path)?.ok_or_else(|| ServiceDeskError::not_found("Ticket", &ticket.id))?;

        if stored.version != ticket.version {
            return Err(ServiceDeskError::Conflict {
                id: ticket.id.to_string(),
                expected: ticket.version,
                found: stored.version,
            });
        }

        let mut next = ticket.clone();
        next.version += 1;
        Self::write_doc(&path, &next)?;
        Ok(next)
    }

    fn load_all_tickets(&self) -> Result<Vec<Ticket>> {
        self.read_dir(TICKETS_DIR)
    }

    fn delete_ticket(&self, id: &TicketId) -> Result<()> {
        let _guard = self.lock()?;
        let path = self.path(TICKETS_DIR, id);
        if !path.exists() {
            return Err(ServiceDeskError::not_found("Ticket", id));
        }

        for notification in self.read_dir::<Notification>(NOTIFICATIONS_DIR)? {
            if &notification.ticket_id == id {
                Self::remove_if_exists(&self.path(NOTIFICATIONS_DIR, &notification.id))?;
            }
        }
        Self::remove_if_exists(&self.path(HISTORY_DIR, id))?;
        fs::remove_file(path)?;
        Ok(())
    }

    fn ticket_exists(&self, id: &TicketId) -> Result<bool> {
        Ok(self.path(TICKETS_DIR, id).exists())
    }
}

impl HistoryRepository for FileStorage {
    fn append_history(&self, entry: &HistoryEntry) -> Result<()> {
        let _guard = self.lock()?;
        if !self.path(TICKETS_DIR, &entry.ticket_id).exists() {
            return Err(ServiceDeskError::not_found("Ticket", &entry.ticket_id));
        }

        let path = self.path(HISTORY_DIR, &entry.ticket_id);
        let mut entries: Vec<HistoryEntry> = Self::read_doc(&path)?.unwrap_or_default();
        entries.push(entry.clone());
        Self::write_doc(&path, &entries)
    }

    fn history_for(&self, ticket_id: &TicketId) -> Result<Vec<HistoryEntry>> {
        Ok(Self::read_doc(&self.path(HISTORY_DIR, ticket_id))?.unwrap_or_default())
    }
}

impl NotificationRepository for FileStorage {
    fn insert_notification(&self, notification: &Notification) -> Result<()> {
        let _guard = self.lock()?;
        Self::write_doc(&self.path(NOTIFICATIONS_DIR, &notification.id), notification)
    }

    fn load_notification(&self, id: &NotificationId) -> Result<Notification> {
        Self::read_doc(&self.path(NOTIFICATIONS_DIR, id))?
            .ok_or_else(|| ServiceDeskError::not_found("Notification", id))
    }

    fn save_notification(&self, notification: &Notification) -> Result<()> {
        let _guard = self.lock()?;
        let path = self.path(NOTIFICATIONS_DIR, &notification.id);
        if !path.exists() {
            return Err(ServiceDeskError::not_found("Notification", &notification.id));
        }
        Self::write_doc(&path, notification)
    }

    fn notifications_for(&self, user: &UserId) -> Result<Vec<Notification>> {
        let all: Vec<Notification> = self.read_dir(NOTIFICATIONS_DIR)?;
        Ok(newest_first(
            all.into_iter().filter(|n| &n.recipient == user).collect(),
        ))
    }
}

impl UserRepository for FileStorage {
    fn save_user(&self, user: &User) -> Result<()> {
        let _guard = self.lock()?;
        Self::write_doc(&self.path(USERS_DIR, &user.id), user)
    }

    fn load_user(&self, id: &UserId) -> Result<User> {
        Self::read_doc(&self.path(USERS_DIR, id))?
            .ok_or_else(|| ServiceDeskError::not_found("User", id))
    }

    fn load_all_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.read_dir(USERS_DIR)?;
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}
