//! Logs command - inspect the gate event log

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, TimeZone, Utc};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;
use tales_core::services::{events, EntryPoint, LogEntry, LogFilter, LoggingService};
use tales_core::Tier;

use super::get_data_dir;
use crate::output;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent gate events
    List {
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Only this event, e.g. item_saved, save_blocked, ai_blocked
        #[arg(long)]
        event: Option<String>,
        /// Only events recorded under this tier
        #[arg(long)]
        tier: Option<String>,
        /// Only events touching this tale
        #[arg(long)]
        item: Option<String>,
        #[arg(long)]
        errors: bool,
        #[arg(long)]
        json: bool,
    },
    /// Save and AI outcomes per tier
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Delete old entries
    Clear {
        #[arg(long, default_value = "30")]
        older_than_days: u32,
        #[arg(long, short = 'f')]
        force: bool,
        #[arg(long)]
        json: bool,
    },
    /// Copy logs.duckdb somewhere for a bug report
    Export { path: PathBuf },
}

fn open_log() -> Result<LoggingService> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)?;
    LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
        .context("Failed to open logs.duckdb")
}

fn when(timestamp_ms: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

fn event_label(event: &str) -> String {
    match event {
        events::ITEM_SAVED | events::AI_USED | events::TIER_UPGRADED => event.green().to_string(),
        events::SAVE_BLOCKED | events::AI_BLOCKED => event.yellow().to_string(),
        events::SAVE_FAILED => event.red().to_string(),
        _ => event.to_string(),
    }
}

pub fn run(command: LogsCommands) -> Result<()> {
    match command {
        LogsCommands::List {
            limit,
            event,
            tier,
            item,
            errors,
            json,
        } => {
            let filter = LogFilter {
                event,
                tier: tier.as_deref().map(str::parse::<Tier>).transpose()?,
                item_id: item,
                errors_only: errors,
            };
            list(&open_log()?.query(&filter, limit)?, json)
        }
        LogsCommands::Stats { json } => stats(&open_log()?, json),
        LogsCommands::Clear {
            older_than_days,
            force,
            json,
        } => {
            let log = open_log()?;
            if !force && !json {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete log entries older than {} days?", older_than_days))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let cutoff = Utc::now() - Duration::days(i64::from(older_than_days));
            let deleted = log.delete_before(cutoff.timestamp_millis())?;
            if json {
                println!("{}", serde_json::json!({ "deleted": deleted }));
            } else {
                output::success(&format!("Deleted {} log entries", deleted));
            }
            Ok(())
        }
        LogsCommands::Export { path } => {
            let written = open_log()?.export(&path)?;
            output::success(&format!("Logs exported to {}", written.display()));
            Ok(())
        }
    }
}

fn list(entries: &[LogEntry], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No matching events.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Time", "Tier", "Event", "Tale", "Error"]);
    for entry in entries {
        table.add_row(vec![
            when(entry.timestamp),
            entry.tier.clone().unwrap_or_default(),
            event_label(&entry.event),
            entry.item_id.clone().unwrap_or_default(),
            entry.error_message.clone().unwrap_or_default(),
        ]);
    }
    println!("{}", table);
    Ok(())
}

fn stats(log: &LoggingService, json: bool) -> Result<()> {
    let activity = log.activity_by_tier()?;
    let total = log.count()?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "totalEntries": total,
                "tiers": activity,
                "databasePath": log.db_path().to_string_lossy(),
            })
        );
        return Ok(());
    }

    if activity.is_empty() {
        println!("No gate events recorded yet.");
    } else {
        let mut table = output::create_table();
        table.set_header(vec![
            "Tier", "Saved", "Unsaved", "Blocked", "Failed", "AI used", "AI blocked", "Upgrades",
        ]);
        for a in &activity {
            table.add_row(vec![
                a.tier.clone(),
                a.saves.to_string(),
                a.unsaves.to_string(),
                a.save_blocks.to_string(),
                a.save_failures.to_string(),
                a.ai_uses.to_string(),
                a.ai_blocks.to_string(),
                a.upgrades.to_string(),
            ]);
        }
        println!("{}", table);
    }
    println!(
        "{}",
        format!("{} entries in {}", total, log.db_path().display()).dimmed()
    );
    Ok(())
}
