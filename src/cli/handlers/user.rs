//! Handlers for the `user` commands

use super::{acting_user, open_storage};
use crate::cli::OutputFormatter;
use crate::config::Config;
use crate::core::{Role, User};
use crate::error::{Result, ServiceDeskError};
use crate::storage::UserRepository;

/// Fields accepted by `user add`
#[derive(Debug, Default)]
pub struct NewUser {
    pub username: String,
    pub role: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub branch: Option<String>,
}

/// Adds a user and prints the generated access token
pub fn handle_user_add(new: NewUser, config: &Config, output: &OutputFormatter) -> Result<()> {
    let username = new.username.trim();
    if username.is_empty() {
        return Err(ServiceDeskError::validation("username must not be empty"));
    }
    let role: Role = new.role.parse()?;

    let storage = open_storage(config)?;
    if storage.find_by_username(username)?.is_some() {
        return Err(ServiceDeskError::validation(format!(
            "user '{username}' already exists"
        )));
    }

    let mut user = User::new(username, role);
    user.email = new.email;
    user.full_name = new.full_name;
    user.branch = new.branch;
    storage.save_user(&user)?;
    tracing::info!(user = %user.username, role = %user.role, "user added");

    if output.is_json() {
        output.print_json(&user)
    } else {
        output.success(&format!("Added {} ({})", user.username, user.role));
        output.info(&format!("  ID:    {}", user.id));
        if let Some(token) = &user.access_token {
            output.info(&format!("  Token: {token}"));
        }
        Ok(())
    }
}

pub fn handle_user_list(config: &Config, output: &OutputFormatter) -> Result<()> {
    let storage = open_storage(config)?;
    let users = storage.load_all_users()?;

    if output.is_json() {
        // Tokens are credentials; keep them out of listings
        let listed: Vec<_> = users
            .into_iter()
            .map(|mut u| {
                u.access_token = None;
                u
            })
            .collect();
        return output.print_json(&listed);
    }

    if users.is_empty() {
        output.info("No users yet. Add one with 'service-desk user add <name> --role ADMIN'");
        return Ok(());
    }
    for user in &users {
        let state = if user.is_active { "" } else { " (inactive)" };
        output.info(&format!(
            "{:<20} {:<10} {}{state}",
            user.username,
            user.role,
            user.email.as_deref().unwrap_or("-")
        ));
    }
    Ok(())
}

pub fn handle_user_deactivate(
    username: &str,
    config: &Config,
    output: &OutputFormatter,
) -> Result<()> {
    let storage = open_storage(config)?;
    let mut user = acting_user(storage.as_ref(), username)?;
    if !user.is_active {
        output.warning(&format!("{} is already inactive", user.username));
        return Ok(());
    }

    user.is_active = false;
    storage.save_user(&user)?;
    tracing::info!(user = %user.username, "user deactivated");

    if output.is_json() {
        output.print_json(&serde_json::json!({ "username": user.username, "active": false }))
    } else {
        output.success(&format!("Deactivated {}", user.username));
        Ok(())
    }
}
