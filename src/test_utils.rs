//! Test utilities for service-desk
//!
//! Shared fixtures for unit tests: a desk with one user per role over
//! in-memory storage, and a mailer that records what it was asked to send.

#![cfg(test)]

use crate::config::NotificationConfig;
use crate::core::{Role, Ticket, TicketBuilder, TicketDraft, User, UserId};
use crate::error::{Result, ServiceDeskError};
use crate::lifecycle::TicketService;
use crate::notify::{EmailMessage, EmailSender, NotificationDispatcher, SubscriptionRegistry};
use crate::storage::{MemoryStorage, UserRepository};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mailer that records sends, optionally failing or stalling
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    attempts: AtomicUsize,
    fail: bool,
    delay: Option<Duration>,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn delayed(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().expect("mailer lock poisoned").clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ServiceDeskError::custom("smtp unavailable"));
        }
        self.sent.lock().expect("mailer lock poisoned").push(message);
        Ok(())
    }
}

/// One admin, one technician and one staff member over in-memory storage
pub struct TestDesk {
    pub storage: Arc<MemoryStorage>,
    pub mailer: Arc<RecordingMailer>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub service: TicketService,
    pub admin: User,
    pub tech: User,
    pub staff: User,
}

impl TestDesk {
    pub fn new() -> Self {
        let storage = Arc::new(MemoryStorage::new());
        let mailer = Arc::new(RecordingMailer::default());
        let dispatcher = Arc::new(
            NotificationDispatcher::new(
                storage.clone(),
                SubscriptionRegistry::new(16),
                mailer.clone(),
                &NotificationConfig::default(),
            )
            .expect("Failed to build dispatcher"),
        );
        let service = TicketService::new(storage.clone(), Arc::clone(&dispatcher));

        let admin = User::new("admin", Role::Admin).with_email("admin@example.com");
        let tech = User::new("tech", Role::Technician)
            .with_full_name("Kasun Perera")
            .with_email("tech@example.com");
        let staff = User::new("staff", Role::Staff).with_email("staff@example.com");
        for user in [&admin, &tech, &staff] {
            storage.save_user(user).expect("Failed to save user");
        }

        Self {
            storage,
            mailer,
            dispatcher,
            service,
            admin,
            tech,
            staff,
        }
    }

    /// Saves and returns an extra user
    pub fn add_user(&self, username: &str, role: Role) -> User {
        let user = User::new(username, role);
        self.storage.save_user(&user).expect("Failed to save user");
        user
    }

    /// Creates a ticket through the service as the staff member
    pub fn ticket(&self, title: &str) -> Ticket {
        self.service
            .create(draft(title), &self.staff)
            .expect("Failed to create ticket")
    }
}

/// A complete draft
pub fn draft(title: &str) -> TicketDraft {
    TicketDraft {
        title: title.to_string(),
        branch: Some("Colombo".to_string()),
        category: Some("Hardware".to_string()),
        ..TicketDraft::default()
    }
}

/// An OPEN ticket owned by `creator`, not persisted
pub fn sample_ticket(creator: &UserId) -> Ticket {
    TicketBuilder::new()
        .title("Printer broken")
        .branch("Colombo")
        .category("Hardware")
        .created_by(creator.clone())
        .build()
}
