//! Logging service - structured event logging to DuckDB
//!
//! Stores privacy-safe events in logs.duckdb next to the state database.
//! Entries carry tier and item ids but never emails or saved sets.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use chrono::Utc;
use duckdb::{Connection, Row};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::Tier;
use crate::log_migrations::LOG_MIGRATIONS;
use crate::services::MigrationService;

/// Counter for generating unique IDs within the same millisecond
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Lower 48 bits hold the timestamp, upper 16 a per-millisecond counter
fn generate_id(timestamp_ms: i64) -> u64 {
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed) & 0xFFFF;
    ((timestamp_ms.max(0) as u64) << 16) | counter
}

fn detect_platform() -> &'static str {
    if cfg!(target_os = "macos") {
        "macos"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "linux") {
        "linux"
    } else {
        "unknown"
    }
}

/// Event names recorded around the gates
pub mod events {
    pub const COMMAND_EXECUTED: &str = "command_executed";
    pub const ITEM_SAVED: &str = "item_saved";
    pub const ITEM_UNSAVED: &str = "item_unsaved";
    pub const SAVE_BLOCKED: &str = "save_blocked";
    pub const SAVE_FAILED: &str = "save_failed";
    pub const AI_USED: &str = "ai_used";
    pub const AI_BLOCKED: &str = "ai_blocked";
    pub const TIER_UPGRADED: &str = "tier_upgraded";
}

/// Rows without a tier are grouped under this label
const NO_TIER: &str = "none";

const ENTRY_COLUMNS: &str = "id, timestamp, entry_point, app_version, platform, \
     event, tier, item_id, command, error_message, error_details";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPoint {
    Cli,
    Desktop,
}

impl EntryPoint {
    fn as_str(&self) -> &'static str {
        match self {
            EntryPoint::Cli => "cli",
            EntryPoint::Desktop => "desktop",
        }
    }
}

/// A log event to be recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

impl LogEvent {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            tier: None,
            item_id: None,
            command: None,
            error_message: None,
            error_details: None,
        }
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = Some(tier.as_str().to_string());
        self
    }

    pub fn with_item(mut self, item_id: impl Into<String>) -> Self {
        self.item_id = Some(item_id.into());
        self
    }

    /// Set the command context (for CLI events)
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_error_details(mut self, details: impl Into<String>) -> Self {
        self.error_details = Some(details.into());
        self
    }
}

/// A log entry as stored in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub timestamp: i64,
    pub entry_point: String,
    pub app_version: String,
    pub platform: String,
    pub event: String,
    pub tier: Option<String>,
    pub item_id: Option<String>,
    pub command: Option<String>,
    pub error_message: Option<String>,
    pub error_details: Option<String>,
}

impl LogEntry {
    fn from_row(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            entry_point: row.get(2)?,
            app_version: row.get(3)?,
            platform: row.get(4)?,
            event: row.get(5)?,
            tier: row.get(6)?,
            item_id: row.get(7)?,
            command: row.get(8)?,
            error_message: row.get(9)?,
            error_details: row.get(10)?,
        })
    }
}

/// Narrows a log query. Unset fields match every entry.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub event: Option<String>,
    pub tier: Option<Tier>,
    pub item_id: Option<String>,
    pub errors_only: bool,
}

impl LogFilter {
    fn where_clause(&self) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        if let Some(event) = &self.event {
            clauses.push("event = ?");
            params.push(event.clone());
        }
        if let Some(tier) = self.tier {
            clauses.push("tier = ?");
            params.push(tier.as_str().to_string());
        }
        if let Some(item) = &self.item_id {
            clauses.push("item_id = ?");
            params.push(item.clone());
        }
        if self.errors_only {
            clauses.push("error_message IS NOT NULL");
        }

        if clauses.is_empty() {
            (String::new(), params)
        } else {
            (format!("WHERE {}", clauses.join(" AND ")), params)
        }
    }
}

/// Gate outcomes recorded for one tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierActivity {
    pub tier: String,
    pub saves: u64,
    pub unsaves: u64,
    pub save_blocks: u64,
    pub save_failures: u64,
    pub ai_uses: u64,
    pub ai_blocks: u64,
    pub upgrades: u64,
}

impl TierActivity {
    fn add(&mut self, event: &str, count: u64) {
        let slot = match event {
            events::ITEM_SAVED => &mut self.saves,
            events::ITEM_UNSAVED => &mut self.unsaves,
            events::SAVE_BLOCKED => &mut self.save_blocks,
            events::SAVE_FAILED => &mut self.save_failures,
            events::AI_USED => &mut self.ai_uses,
            events::AI_BLOCKED => &mut self.ai_blocks,
            events::TIER_UPGRADED => &mut self.upgrades,
            _ => return,
        };
        *slot += count;
    }
}

/// Service for structured event logging
pub struct LoggingService {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    entry_point: EntryPoint,
    app_version: String,
    platform: &'static str,
}

impl LoggingService {
    /// Open or create logs.duckdb in `data_dir` and run pending migrations
    pub fn new(
        data_dir: &Path,
        entry_point: EntryPoint,
        app_version: impl Into<String>,
    ) -> Result<Self> {
        let db_path = data_dir.join("logs.duckdb");
        let conn = Connection::open(&db_path)?;

        let result = MigrationService::new(&conn, LOG_MIGRATIONS).run_pending()?;
        if !result.applied.is_empty() {
            debug!(applied = ?result.applied, "log migrations applied");
        }

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
            entry_point,
            app_version: app_version.into(),
            platform: detect_platform(),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))
    }

    /// Record an event; entry point, version and platform are filled in here
    pub fn log(&self, event: LogEvent) -> Result<()> {
        let conn = self.conn()?;
        let now = Utc::now().timestamp_millis();

        conn.execute(
            &format!(
                "INSERT INTO sys_logs ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                ENTRY_COLUMNS
            ),
            duckdb::params![
                generate_id(now),
                now,
                self.entry_point.as_str(),
                &self.app_version,
                self.platform,
                &event.event,
                &event.tier,
                &event.item_id,
                &event.command,
                &event.error_message,
                &event.error_details,
            ],
        )?;

        Ok(())
    }

    pub fn log_event(&self, event: &str) -> Result<()> {
        self.log(LogEvent::new(event))
    }

    pub fn log_command(&self, command: &str) -> Result<()> {
        self.log(LogEvent::new(events::COMMAND_EXECUTED).with_command(command))
    }

    pub fn log_error(&self, event: &str, message: &str, details: Option<&str>) -> Result<()> {
        let mut log_event = LogEvent::new(event).with_error(message);
        if let Some(d) = details {
            log_event = log_event.with_error_details(d);
        }
        self.log(log_event)
    }

    /// Most recent entries first
    pub fn get_recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.query(&LogFilter::default(), limit)
    }

    pub fn get_errors(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.query(
            &LogFilter {
                errors_only: true,
                ..LogFilter::default()
            },
            limit,
        )
    }

    /// Entries matching `filter`, most recent first
    pub fn query(&self, filter: &LogFilter, limit: usize) -> Result<Vec<LogEntry>> {
        let (clause, params) = filter.where_clause();
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sys_logs {} ORDER BY timestamp DESC, id DESC LIMIT {}",
            ENTRY_COLUMNS, clause, limit
        ))?;

        let entries = stmt
            .query_map(duckdb::params_from_iter(params), LogEntry::from_row)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Save and AI gate outcomes counted per tier, ordered by tier name
    pub fn activity_by_tier(&self) -> Result<Vec<TierActivity>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT COALESCE(tier, '{}') AS tier_label, event, COUNT(*) FROM sys_logs \
             WHERE event <> '{}' GROUP BY tier_label, event",
            NO_TIER,
            events::COMMAND_EXECUTED
        ))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u64>(2)?,
                ))
            })?
            .collect::<duckdb::Result<Vec<_>>>()?;

        let mut by_tier: BTreeMap<String, TierActivity> = BTreeMap::new();
        for (tier, event, count) in rows {
            by_tier
                .entry(tier.clone())
                .or_insert_with(|| TierActivity {
                    tier,
                    ..TierActivity::default()
                })
                .add(&event, count);
        }
        Ok(by_tier.into_values().collect())
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.conn()?;
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM sys_logs", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete logs older than the given unix-ms timestamp
    pub fn delete_before(&self, timestamp_ms: i64) -> Result<u64> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM sys_logs WHERE timestamp < ?", [timestamp_ms])?;
        Ok(deleted as u64)
    }

    /// Copy the logs database to `output_path` for troubleshooting
    pub fn export(&self, output_path: &Path) -> Result<PathBuf> {
        let conn = self.conn()?;
        conn.execute_batch("CHECKPOINT")?;
        std::fs::copy(&self.db_path, output_path)?;
        Ok(output_path.to_path_buf())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}
