//! Audit log writer
//!
//! Thin layer over [`HistoryRepository`] that checks the ticket exists and
//! returns entries newest first.

use crate::core::{HistoryEntry, TicketId, UserId, sort_newest_first};
use crate::error::{Result, ServiceDeskError};
use crate::storage::{HistoryRepository, Storage, TicketRepository};
use std::sync::Arc;

/// Appends and lists history entries
#[derive(Clone)]
pub struct AuditLog {
    storage: Arc<dyn Storage>,
}

impl AuditLog {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Appends one entry; `actor` is `None` for system-initiated changes
    pub fn record(
        &self,
        ticket_id: &TicketId,
        action: impl Into<String>,
        actor: Option<&UserId>,
        comment: Option<String>,
    ) -> Result<HistoryEntry> {
        if !self.storage.ticket_exists(ticket_id)? {
            return Err(ServiceDeskError::not_found("Ticket", ticket_id));
        }

        let entry = HistoryEntry::new(ticket_id.clone(), action, actor.cloned(), comment);
        self.storage.append_history(&entry)?;
        Ok(entry)
    }

    pub fn list_for_ticket(&self, ticket_id: &TicketId) -> Result<Vec<HistoryEntry>> {
        let mut entries = self.storage.history_for(ticket_id)?;
        sort_newest_first(&mut entries);
        Ok(entries)
    }
}
