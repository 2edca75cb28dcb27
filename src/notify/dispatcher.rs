//! Notification dispatcher
//!
//! `notify` writes the notification row before anything else, so a client
//! that polls its inbox always sees it. Live push and email then run as
//! detached tasks bounded by `delivery_timeout`; their outcome is only logged.

use super::email::{EmailRenderer, EmailSender};
use super::registry::SubscriptionRegistry;
use crate::config::NotificationConfig;
use crate::core::{Notification, NotificationPayload, Ticket, User};
use crate::error::Result;
use crate::storage::{NotificationRepository, Storage};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::timeout;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

/// Creates notifications and fans them out
pub struct NotificationDispatcher {
    storage: Arc<dyn Storage>,
    registry: SubscriptionRegistry,
    mailer: Arc<dyn EmailSender>,
    renderer: Arc<EmailRenderer>,
    delivery_timeout: Duration,
    email_enabled: bool,
    deliveries: TaskTracker,
}

impl NotificationDispatcher {
    pub fn new(
        storage: Arc<dyn Storage>,
        registry: SubscriptionRegistry,
        mailer: Arc<dyn EmailSender>,
        config: &NotificationConfig,
    ) -> Result<Self> {
        Ok(Self {
            storage,
            registry,
            mailer,
            renderer: Arc::new(EmailRenderer::new(config)?),
            delivery_timeout: config.delivery_timeout(),
            email_enabled: config.email_enabled,
            deliveries: TaskTracker::new(),
        })
    }

    #[must_use]
    pub const fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Persists a notification for `recipient` and starts delivery
    ///
    /// Only the persistence step can fail.
    pub fn notify(
        &self,
        ticket: &Ticket,
        recipient: &User,
        message: &str,
        also_email: bool,
    ) -> Result<Notification> {
        let notification = Notification::new(ticket.id.clone(), recipient.id.clone(), message);
        self.storage.insert_notification(&notification)?;

        let Ok(runtime) = Handle::try_current() else {
            warn!("No async runtime; notification {} stored without delivery", notification.id);
            return Ok(notification);
        };

        self.spawn_broadcast(&runtime, &notification, ticket);
        if also_email && self.email_enabled {
            self.spawn_email(&runtime, ticket, recipient, message);
        }

        Ok(notification)
    }

    fn spawn_broadcast(&self, runtime: &Handle, notification: &Notification, ticket: &Ticket) {
        let registry = self.registry.clone();
        let recipient = notification.recipient.clone();
        let payload = NotificationPayload::new(notification, ticket);
        let limit = self.delivery_timeout;

        self.deliveries.spawn_on(
            async move {
                let delivery = async { registry.broadcast(&recipient, &payload) };
                match timeout(limit, delivery).await {
                    Ok(count) => {
                        debug!(user = %recipient, notification = %payload.id, "pushed to {count} connection(s)");
                    },
                    Err(_) => warn!(user = %recipient, "live push timed out after {limit:?}"),
                }
            },
            runtime,
        );
    }

    fn spawn_email(&self, runtime: &Handle, ticket: &Ticket, recipient: &User, message: &str) {
        let email = match self.renderer.render(ticket, recipient, message) {
            Ok(Some(email)) => email,
            Ok(None) => return,
            Err(e) => {
                warn!(user = %recipient.username, "Failed to render email: {e}");
                return;
            },
        };

        let mailer = Arc::clone(&self.mailer);
        let limit = self.delivery_timeout;

        self.deliveries.spawn_on(
            async move {
                let to = email.to.clone();
                match timeout(limit, mailer.send(email)).await {
                    Ok(Ok(())) => debug!(to = %to, "email sent"),
                    Ok(Err(e)) => warn!(to = %to, "Failed to send email: {e}"),
                    Err(_) => warn!(to = %to, "email send timed out after {limit:?}"),
                }
            },
            runtime,
        );
    }

    /// Waits until every delivery started so far has finished or timed out
    pub async fn drain(&self) {
        self.deliveries.close();
        self.deliveries.wait().await;
        self.deliveries.reopen();
    }
}
