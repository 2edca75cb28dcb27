//! Email collaborator
//!
//! Sending is best-effort; the dispatcher calls [`EmailSender::send`] from a
//! detached task and only logs the outcome.

use crate::config::NotificationConfig;
use crate::core::{Ticket, User};
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use tera::{Context, Tera};

const SUBJECT: &str = "subject";
const BODY: &str = "body";

/// A rendered message ready to hand to a mail transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}

/// Outbound email transport
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<()>;
}

/// Transport that only records sends in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl EmailSender for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        tracing::info!(to = %message.to, subject = %message.subject, "email queued");
        Ok(())
    }
}

/// Variables available to the email templates
#[derive(Debug, Serialize)]
struct EmailContext<'a> {
    recipient: &'a str,
    message: &'a str,
    ticket_id: String,
    ticket_short_id: String,
    ticket_title: &'a str,
    ticket_status: &'a str,
}

/// Renders subject and body from the configured templates
pub struct EmailRenderer {
    tera: Tera,
    from: String,
}

impl EmailRenderer {
    /// Compiles the templates; fails on template syntax errors
    pub fn new(config: &NotificationConfig) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(SUBJECT, &config.subject_template)?;
        tera.add_raw_template(BODY, &config.body_template)?;
        Ok(Self {
            tera,
            from: config.from_address.clone(),
        })
    }

    /// Builds the message for `recipient`, or `None` if they have no address
    pub fn render(
        &self,
        ticket: &Ticket,
        recipient: &User,
        message: &str,
    ) -> Result<Option<EmailMessage>> {
        let Some(to) = recipient.email.as_deref().filter(|e| !e.trim().is_empty()) else {
            return Ok(None);
        };

        let context = Context::from_serialize(EmailContext {
            recipient: recipient.display_name(),
            message,
            ticket_id: ticket.id.to_string(),
            ticket_short_id: ticket.id.short(),
            ticket_title: &ticket.title,
            ticket_status: ticket.status.as_str(),
        })?;

        Ok(Some(EmailMessage {
            to: to.to_string(),
            from: self.from.clone(),
            subject: self.tera.render(SUBJECT, &context)?.trim().to_string(),
            body: self.tera.render(BODY, &context)?,
        }))
    }
}
