//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use tales_core::{Notification, NotificationKind, Tale, UpgradeTrigger};

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Print a toast as a single line, with an upgrade hint when it carries one
pub fn notification(n: &Notification) {
    let line = format!("{}: {}", n.title, n.message);
    match n.kind {
        NotificationKind::Success => success(&line),
        NotificationKind::Info => info(&line),
        NotificationKind::Warning => warning(&line),
        NotificationKind::Error => error(&line),
    }
    if let Some(trigger) = n.upgrade {
        println!("  {}", upgrade_hint(trigger).dimmed());
    }
}

fn upgrade_hint(trigger: UpgradeTrigger) -> &'static str {
    match trigger {
        UpgradeTrigger::SaveLimit => "Run `tales signup <email>` or `tales upgrade` to keep saving.",
        UpgradeTrigger::AiLimit => "Run `tales upgrade` for unlimited AI companion access.",
        UpgradeTrigger::UpgradeButton | UpgradeTrigger::Default => "Run `tales upgrade` to go premium.",
    }
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Table of tales with a saved marker column
pub fn tales_table<'a>(tales: impl IntoIterator<Item = &'a Tale>, saved: &[String]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["", "ID", "Kind", "Title", "Location", "Rating"]);
    for tale in tales {
        let marker = if saved.iter().any(|id| *id == tale.id) { "♥" } else { "" };
        let rating = tale
            .rating
            .map(|r| format!("{:.1}", r))
            .unwrap_or_default();
        table.add_row(vec![
            marker.to_string(),
            tale.id.clone(),
            tale.kind.to_string(),
            tale.title.clone(),
            tale.location.clone(),
            rating,
        ]);
    }
    table
}
