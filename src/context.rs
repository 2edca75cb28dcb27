//! Wiring of the service's collaborators

use crate::auth::{Authenticator, TokenAuthenticator};
use crate::config::Config;
use crate::error::Result;
use crate::lifecycle::TicketService;
use crate::notify::{EmailSender, LogMailer, NotificationDispatcher, SubscriptionRegistry};
use crate::reports::Reports;
use crate::storage::{self, MemoryStorage, Storage};
use std::sync::Arc;

/// Shared state handed to every request and connection task
pub struct AppContext {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub registry: SubscriptionRegistry,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub service: TicketService,
    pub reports: Reports,
    pub authenticator: Arc<dyn Authenticator>,
}

impl AppContext {
    /// Builds a context over `storage`, sending email through `mailer`
    pub fn new(
        config: Config,
        storage: Arc<dyn Storage>,
        mailer: Arc<dyn EmailSender>,
    ) -> Result<Self> {
        let registry = SubscriptionRegistry::new(config.notifications.channel_capacity);
        let dispatcher = Arc::new(NotificationDispatcher::new(
            Arc::clone(&storage),
            registry.clone(),
            mailer,
            &config.notifications,
        )?);

        Ok(Self {
            service: TicketService::new(Arc::clone(&storage), Arc::clone(&dispatcher)),
            reports: Reports::new(Arc::clone(&storage)),
            authenticator: Arc::new(TokenAuthenticator::new(Arc::clone(&storage))),
            config,
            storage,
            registry,
            dispatcher,
        })
    }

    /// Opens the configured storage with the logging mailer
    pub fn from_config(config: Config) -> Result<Self> {
        let storage = storage::open(&config.storage)?;
        Self::new(config, storage, Arc::new(LogMailer))
    }

    /// Default configuration over a fresh in-memory store
    pub fn in_memory() -> Result<Self> {
        Self::new(
            Config::default(),
            Arc::new(MemoryStorage::new()),
            Arc::new(LogMailer),
        )
    }

    /// Replaces the authenticator
    #[must_use]
    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = authenticator;
        self
    }
}
