//! service-desk - Helpdesk ticket lifecycle and live notification service
//!
//! Entry point for the `service-desk` binary. Parses arguments, installs
//! logging and dispatches to the command handlers.

use clap::Parser;
use service_desk::cli::handlers::{
    NewUser, handle_config_show, handle_serve, handle_stats, handle_ticket_history,
    handle_ticket_list, handle_user_add, handle_user_deactivate, handle_user_list,
};
use service_desk::cli::{
    Cli, Commands, ConfigCommands, OutputFormatter, TicketCommands, UserCommands,
};
use service_desk::error::{Result, ServiceDeskError};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    let formatter = OutputFormatter::new(cli.json, cli.no_color);

    if let Err(e) = run(cli, &formatter) {
        handle_error(&e, &formatter);
        process::exit(1);
    }
}

/// Installs logging, resolves configuration and runs the command
fn run(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    let level = if cli.verbose {
        "debug"
    } else if matches!(cli.command, Commands::Serve { .. }) {
        "info"
    } else {
        "warn"
    };
    init_logging(level);

    let config = cli.load_config()?;
    tracing::debug!(data_dir = %config.storage.path.display(), "configuration loaded");

    match cli.command {
        Commands::Serve { host, port, memory } => {
            handle_serve(config, host, port, memory, formatter)
        },
        Commands::User { command } => match command {
            UserCommands::Add {
                username,
                role,
                email,
                full_name,
                branch,
            } => handle_user_add(
                NewUser {
                    username,
                    role,
                    email,
                    full_name,
                    branch,
                },
                &config,
                formatter,
            ),
            UserCommands::List => handle_user_list(&config, formatter),
            UserCommands::Deactivate { username } => {
                handle_user_deactivate(&username, &config, formatter)
            },
        },
        Commands::Ticket { command } => match command {
            TicketCommands::List {
                user,
                completed,
                limit,
            } => handle_ticket_list(&user, completed, limit, &config, formatter),
            TicketCommands::History { ticket_id, user } => {
                handle_ticket_history(&ticket_id, &user, &config, formatter)
            },
        },
        Commands::Stats { user, from, to } => handle_stats(&user, from, to, &config, formatter),
        Commands::Config { command } => match command {
            ConfigCommands::Show => handle_config_show(&config, formatter),
        },
    }
}

/// `RUST_LOG` wins over `fallback`
fn init_logging(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    // Logs go to stderr so `--json` output stays parseable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_error(error: &ServiceDeskError, formatter: &OutputFormatter) {
    formatter.error(&error.user_message());

    let suggestions = error.suggestions();
    if !suggestions.is_empty() && !formatter.is_json() {
        formatter.info("\nSuggestions:");
        for suggestion in &suggestions {
            formatter.info(&format!("  • {suggestion}"));
        }
    }

    if formatter.is_json() {
        let _ = formatter.print_json(&serde_json::json!({
            "status": "error",
            "error": error.to_string(),
            "suggestions": suggestions,
            "recoverable": error.is_recoverable(),
            "is_config_error": error.is_config_error(),
        }));
    }

    if tracing::enabled!(tracing::Level::DEBUG) {
        eprintln!("\nDebug information:");
        eprintln!("{error:?}");
    }
}
