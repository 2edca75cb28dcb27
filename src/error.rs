//! Error types for service-desk
//!
//! Every lifecycle operation reports one of the domain variants
//! (`Validation`, `NotFound`, `Forbidden`, `RoleMismatch`, `Conflict`) so callers
//! can tell them apart. Notification delivery problems never surface here;
//! they are logged by the dispatcher instead.

use thiserror::Error;

/// Result type alias for service-desk operations
pub type Result<T> = std::result::Result<T, ServiceDeskError>;

/// Main error type for service-desk
#[derive(Error, Debug)]
pub enum ServiceDeskError {
    /// Malformed or missing input
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Actor lacks permission for the requested operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Target user does not hold the role the operation requires
    #[error("User {user} has role {actual}, expected {expected}")]
    RoleMismatch {
        user: String,
        expected: String,
        actual: String,
    },

    /// Optimistic-concurrency violation on a ticket mutation
    #[error("Ticket {id} was modified concurrently (expected version {expected}, found {found})")]
    Conflict { id: String, expected: u64, found: u64 },

    /// Credential could not be resolved to a user
    #[error("Authentication required")]
    Unauthenticated,

    /// Persistence collaborator failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Email template rendering errors
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// Generic error with custom message
    #[error("{0}")]
    Custom(String),
}

/// Coarse classification used by the API layer and CLI output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    RoleMismatch,
    Conflict,
    Unauthenticated,
    Internal,
}

impl ServiceDeskError {
    /// Create a custom error with a message
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Shorthand for a `NotFound` error
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for a `Forbidden` error
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Shorthand for a `Validation` error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Classify the error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::RoleMismatch { .. } => ErrorKind::RoleMismatch,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            _ => ErrorKind::Internal,
        }
    }

    /// Check if the caller can reasonably retry or correct the request
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::NotFound { .. }
                | Self::RoleMismatch { .. }
                | Self::Conflict { .. }
                | Self::Unauthenticated
        )
    }

    /// Check if this is a configuration-related error
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Template(_))
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Conflict { id, .. } => {
                format!("Ticket {id} changed while you were editing it. Reload and try again.")
            },
            Self::Unauthenticated => "You need to sign in first.".to_string(),
            _ => self.to_string(),
        }
    }

    /// Get suggestions for fixing the error
    #[must_use]
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Validation(_) => vec![
                "Tickets need a title, a branch and a category".to_string(),
                "Valid statuses: OPEN, ASSIGNED, IN_PROGRESS, COMPLETED, CLOSED".to_string(),
            ],
            Self::NotFound { entity, .. } => {
                vec![format!("Check that the {entity} id is correct")]
            },
            Self::RoleMismatch { expected, .. } => {
                vec![format!("Pick a user with the {expected} role")]
            },
            Self::Conflict { .. } => vec!["Reload the ticket and retry".to_string()],
            Self::Config(_) => vec![
                "Run 'service-desk config show' to inspect the effective configuration"
                    .to_string(),
            ],
            _ => vec![],
        }
    }
}
