use super::{acting_user, open_storage};
use crate::cli::OutputFormatter;
use crate::config::Config;
use crate::error::Result;
use crate::reports::{ReportFilter, Reports, TicketStats};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;

/// Prints desk-wide statistics; the acting user must be an admin
pub fn handle_stats(
    username: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    config: &Config,
    output: &OutputFormatter,
) -> Result<()> {
    let storage = open_storage(config)?;
    let actor = acting_user(storage.as_ref(), username)?;
    let filter = ReportFilter {
        created_from: from,
        created_to: to,
    };
    let stats = Reports::new(Arc::clone(&storage)).ticket_stats(&actor, &filter)?;

    if output.is_json() {
        output.print_json(&stats)
    } else {
        print_text(&stats, output);
        Ok(())
    }
}

fn print_text(stats: &TicketStats, output: &OutputFormatter) {
    output.info(&format!("Total tickets: {}", stats.total));
    output.info(&format!("Overdue:       {}", stats.overdue));
    section("By status", &stats.by_status, output);
    section("By priority", &stats.by_priority, output);
    section("By branch", &stats.by_branch, output);
    section("By technician", &stats.by_technician, output);
}

fn section<K: Display>(title: &str, counts: &BTreeMap<K, usize>, output: &OutputFormatter) {
    if counts.is_empty() {
        return;
    }
    output.info("");
    output.info(&format!("{title}:"));
    for (key, count) in counts {
        output.info(&format!("  {key:<20} {count}"));
    }
}
