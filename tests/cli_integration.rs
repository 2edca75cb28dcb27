//! Integration tests for the `service-desk` binary

use assert_cmd::Command;
use predicates::prelude::*;
use service_desk::config::Config;
use service_desk::context::AppContext;
use service_desk::core::{Role, TicketDraft, User};
use service_desk::notify::LogMailer;
use service_desk::storage::{FileStorage, UserRepository};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

#[allow(deprecated)]
fn desk(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("service-desk").unwrap();
    cmd.env_remove("RUST_LOG")
        .arg("--no-color")
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

/// Seeds a data directory with a staff member who owns one ticket
fn seed(data_dir: &Path) -> (User, String) {
    let storage = Arc::new(FileStorage::open(data_dir).unwrap());
    let staff = User::new("nimal", Role::Staff);
    storage.save_user(&staff).unwrap();

    let ctx = AppContext::new(Config::default(), storage, Arc::new(LogMailer)).unwrap();
    let ticket = ctx
        .service
        .create(
            TicketDraft {
                title: "Printer broken".to_string(),
                branch: Some("Colombo".to_string()),
                category: Some("Hardware".to_string()),
                ..TicketDraft::default()
            },
            &staff,
        )
        .unwrap();
    (staff, ticket.id.to_string())
}

#[test]
fn test_help_lists_commands() {
    let temp_dir = TempDir::new().unwrap();
    desk(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve").and(predicate::str::contains("stats")));
}

#[test]
fn test_user_add_and_list() {
    let temp_dir = TempDir::new().unwrap();

    desk(temp_dir.path())
        .args(["user", "add", "admin", "--role", "admin", "--email", "admin@example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added admin (ADMIN)").and(predicate::str::contains("Token:")));

    desk(temp_dir.path())
        .args(["user", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("admin@example.com"));

    let output = desk(temp_dir.path())
        .args(["--json", "user", "list"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let users: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(users.as_array().unwrap().len(), 1);
    assert!(users[0].get("access_token").is_none());
}

#[test]
fn test_duplicate_user_rejected() {
    let temp_dir = TempDir::new().unwrap();
    desk(temp_dir.path()).args(["user", "add", "tech"]).assert().success();

    desk(temp_dir.path())
        .args(["user", "add", "TECH"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_invalid_role_rejected() {
    let temp_dir = TempDir::new().unwrap();
    desk(temp_dir.path())
        .args(["user", "add", "someone", "--role", "manager"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid role"));
}

#[test]
fn test_ticket_list_and_history() {
    let temp_dir = TempDir::new().unwrap();
    let (staff, ticket_id) = seed(temp_dir.path());

    let output = desk(temp_dir.path())
        .args(["--json", "ticket", "list", "--user", &staff.username])
        .output()
        .unwrap();
    assert!(output.status.success());
    let tickets: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(tickets[0]["title"], "Printer broken");
    assert_eq!(tickets[0]["status"], "OPEN");

    desk(temp_dir.path())
        .args(["ticket", "history", &ticket_id, "--user", "nimal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ticket 'Printer broken' created"));
}

#[test]
fn test_stats_requires_admin() {
    let temp_dir = TempDir::new().unwrap();
    seed(temp_dir.path());

    desk(temp_dir.path())
        .args(["stats", "--user", "nimal"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("may not view reports"));

    desk(temp_dir.path()).args(["user", "add", "boss", "--role", "ADMIN"]).assert().success();
    desk(temp_dir.path())
        .args(["stats", "--user", "boss"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total tickets: 1").and(predicate::str::contains("Colombo")));
}

#[test]
fn test_unknown_acting_user() {
    let temp_dir = TempDir::new().unwrap();
    desk(temp_dir.path())
        .args(["ticket", "list", "--user", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("User not found: ghost"));
}

#[test]
fn test_config_show_json() {
    let temp_dir = TempDir::new().unwrap();
    let output = desk(temp_dir.path())
        .args(["--json", "config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["server"]["port"], 8000);
    assert_eq!(config["notifications"]["delivery_timeout_ms"], 2000);
    assert_eq!(
        config["storage"]["path"].as_str().unwrap(),
        temp_dir.path().to_str().unwrap()
    );
}

#[test]
fn test_config_file_in_data_dir_is_read() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("service-desk.yaml"),
        "server:\n  port: 9400\n",
    )
    .unwrap();

    desk(temp_dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("port: 9400"));
}

#[test]
fn test_ticket_list_limit() {
    let temp_dir = TempDir::new().unwrap();
    let (staff, _) = seed(temp_dir.path());

    for (limit, expected) in [("1", 1), ("0", 0)] {
        let output = desk(temp_dir.path())
            .args(["--json", "ticket", "list", "--user", &staff.username, "--limit", limit])
            .output()
            .unwrap();
        assert!(output.status.success());
        let tickets: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(tickets.as_array().unwrap().len(), expected);
    }
}
