//! Handlers for the `ticket` commands

use super::{acting_user, open_storage};
use crate::audit::AuditLog;
use crate::cli::OutputFormatter;
use crate::config::Config;
use crate::core::TicketId;
use crate::error::{Result, ServiceDeskError};
use crate::policy::{self, Action};
use crate::reports::Reports;
use crate::storage::TicketRepository;
use std::sync::Arc;

/// Lists the tickets `username` works with
pub fn handle_ticket_list(
    username: &str,
    completed: bool,
    limit: Option<usize>,
    config: &Config,
    output: &OutputFormatter,
) -> Result<()> {
    let storage = open_storage(config)?;
    let actor = acting_user(storage.as_ref(), username)?;
    let reports = Reports::new(Arc::clone(&storage));

    let tickets = match (completed, limit) {
        (true, limit) => {
            let mut tickets = reports.completed_tickets(&actor)?;
            tickets.truncate(limit.unwrap_or(usize::MAX));
            tickets
        },
        (false, Some(limit)) => reports.recent_tickets(&actor, limit)?,
        (false, None) => reports.visible_tickets(&actor)?,
    };

    if output.is_json() {
        return output.print_json(&tickets);
    }
    if tickets.is_empty() {
        output.info("No tickets");
        return Ok(());
    }
    for ticket in &tickets {
        output.ticket_line(ticket);
    }
    output.info(&format!("\n{} ticket(s)", tickets.len()));
    Ok(())
}

/// Prints the history of one ticket, newest first
pub fn handle_ticket_history(
    ticket_id: &str,
    username: &str,
    config: &Config,
    output: &OutputFormatter,
) -> Result<()> {
    let id = TicketId::parse_str(ticket_id)
        .map_err(|_| ServiceDeskError::validation(format!("Invalid ticket id '{ticket_id}'")))?;
    let storage = open_storage(config)?;
    let actor = acting_user(storage.as_ref(), username)?;

    let ticket = storage.load_ticket(&id)?;
    policy::authorize(&actor, &Action::ViewTicket(&ticket))?;
    let entries = AuditLog::new(Arc::clone(&storage)).list_for_ticket(&id)?;

    if output.is_json() {
        return output.print_json(&entries);
    }

    output.info(&format!("#{} {} [{}]", ticket.id.short(), ticket.title, ticket.status));
    for entry in &entries {
        output.info(&format!(
            "  {}  {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.action
        ));
        if let Some(comment) = &entry.comment {
            output.info(&format!("      {comment}"));
        }
    }
    Ok(())
}
