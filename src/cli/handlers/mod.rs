//! Command handlers
//!
//! Each handler takes its parsed arguments plus the effective [`Config`] and
//! an [`OutputFormatter`], and returns the crate `Result`.

mod config;
mod serve;
mod stats;
mod ticket;
mod user;

pub use config::handle_config_show;
pub use serve::handle_serve;
pub use stats::handle_stats;
pub use ticket::{handle_ticket_history, handle_ticket_list};
pub use user::{NewUser, handle_user_add, handle_user_deactivate, handle_user_list};

use crate::config::Config;
use crate::core::User;
use crate::error::{Result, ServiceDeskError};
use crate::storage::{self, Storage, UserRepository};
use std::sync::Arc;

/// Opens the configured store
fn open_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    storage::open(&config.storage)
}

/// Resolves the `--user` argument
fn acting_user(storage: &dyn Storage, username: &str) -> Result<User> {
    storage
        .find_by_username(username)?
        .ok_or_else(|| ServiceDeskError::not_found("User", username))
}
