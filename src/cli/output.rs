//! Terminal output for the CLI
//!
//! Every handler writes through [`OutputFormatter`] so `--json` and
//! `--no-color` behave the same across commands.

use crate::core::{Status, Ticket};
use crate::error::Result;
use colored::Colorize;
use serde::Serialize;

/// Formats command output as colored text or JSON
#[derive(Debug, Clone, Copy)]
pub struct OutputFormatter {
    json: bool,
}

impl OutputFormatter {
    #[must_use]
    pub fn new(json: bool, no_color: bool) -> Self {
        if no_color || json {
            colored::control::set_override(false);
        }
        Self { json }
    }

    #[must_use]
    pub const fn is_json(&self) -> bool {
        self.json
    }

    pub fn success(&self, message: &str) {
        if !self.json {
            println!("{} {message}", "✓".green().bold());
        }
    }

    pub fn info(&self, message: &str) {
        if !self.json {
            println!("{message}");
        }
    }

    pub fn warning(&self, message: &str) {
        if !self.json {
            eprintln!("{} {message}", "!".yellow().bold());
        }
    }

    /// Errors go to stderr in both modes
    pub fn error(&self, message: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": message }));
        } else {
            eprintln!("{} {message}", "Error:".red().bold());
        }
    }

    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// One line per ticket
    pub fn ticket_line(&self, ticket: &Ticket) {
        self.info(&format!(
            "{}  {:<11}  {:<6}  {}",
            ticket.id.short().dimmed(),
            colored_status(ticket.status),
            ticket.priority,
            ticket.title
        ));
    }
}

fn colored_status(status: Status) -> colored::ColoredString {
    let label = status.as_str();
    match status {
        Status::Open => label.cyan(),
        Status::Assigned => label.blue(),
        Status::InProgress => label.yellow(),
        Status::Completed => label.green(),
        Status::Closed => label.dimmed(),
    }
}
