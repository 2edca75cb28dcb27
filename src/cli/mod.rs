//! Command-line interface
//!
//! The binary is an operator tool: it runs the server and inspects the data
//! directory. Ticket-level commands act as the user named by `--user` and go
//! through the same authorization as the API.

pub mod handlers;
mod output;

pub use output::OutputFormatter;

use crate::config::{CONFIG_FILE_NAME, Config};
use crate::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Helpdesk ticket lifecycle and live notification service
#[derive(Parser, Debug)]
#[command(name = "service-desk", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to service-desk.yaml in the data directory)
    #[arg(long, global = true, env = "SERVICE_DESK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Data directory for the file store
    #[arg(long, global = true, env = "SERVICE_DESK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Resolves the effective configuration for this invocation
    pub fn load_config(&self) -> Result<Config> {
        let file = self
            .config
            .clone()
            .or_else(|| self.data_dir.as_ref().map(|dir| dir.join(CONFIG_FILE_NAME)));
        let mut config = Config::load(file.as_deref())?;
        if let Some(dir) = &self.data_dir {
            config.storage.path.clone_from(dir);
        }
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP and WebSocket server
    Serve {
        /// Override the listen host
        #[arg(long)]
        host: Option<String>,

        /// Override the listen port
        #[arg(short, long)]
        port: Option<u16>,

        /// Keep all data in memory
        #[arg(long)]
        memory: bool,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Inspect tickets
    Ticket {
        #[command(subcommand)]
        command: TicketCommands,
    },

    /// Show desk-wide ticket statistics (admin only)
    Stats {
        /// Acting user
        #[arg(short, long)]
        user: String,

        /// Only tickets created on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<chrono::NaiveDate>,

        /// Only tickets created on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<chrono::NaiveDate>,
    },

    /// Configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Add a user and print their access token
    Add {
        username: String,

        /// ADMIN, TECHNICIAN or STAFF
        #[arg(short, long, default_value = "STAFF")]
        role: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        full_name: Option<String>,

        #[arg(long)]
        branch: Option<String>,
    },

    /// List users
    List,

    /// Deactivate a user; their token stops working
    Deactivate { username: String },
}

#[derive(Subcommand, Debug)]
pub enum TicketCommands {
    /// List the tickets visible to a user
    List {
        /// Acting user
        #[arg(short, long)]
        user: String,

        /// Only completed tickets
        #[arg(long)]
        completed: bool,

        /// Show at most this many tickets
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the history of a ticket, newest first
    History {
        ticket_id: String,

        /// Acting user
        #[arg(short, long)]
        user: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ticket_list() {
        let cli = Cli::parse_from([
            "service-desk",
            "--json",
            "ticket",
            "list",
            "--user",
            "admin",
            "--limit",
            "5",
        ]);
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Commands::Ticket {
                command: TicketCommands::List {
                    limit: Some(5),
                    completed: false,
                    ..
                }
            }
        ));
    }

    #[test]
    fn test_data_dir_overrides_storage_path() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let cli = Cli::parse_from([
            "service-desk",
            "--data-dir",
            temp_dir.path().to_str().unwrap(),
            "config",
            "show",
        ]);
        let config = cli.load_config().unwrap();
        assert_eq!(config.storage.path, temp_dir.path());
    }
}
