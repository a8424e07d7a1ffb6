//! Saved-items commands - toggle, list, clear

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use tales_core::services::{events, LogEvent};
use tales_core::{Error, OperationResult, SaveOutcome, Tale, TaleKind};

use super::{flush_notifications, get_context, log_event, Logger};
use crate::output;

/// Toggle one tale, waiting out the simulated latency behind a spinner
pub fn toggle(item_id: &str, json: bool, logger: &Logger) -> Result<()> {
    let ctx = get_context()?;
    let tier = ctx.current_tier()?;

    let spinner = (!json && !ctx.latency.delay().is_zero()).then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner());
        pb.set_message("Saving...");
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    });

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let result = runtime.block_on(ctx.toggle_save_async(item_id));

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let event_for = |event: &str| {
        let mut e = LogEvent::new(event).with_item(item_id).with_command("save");
        if let Some(t) = tier {
            e = e.with_tier(t);
        }
        e
    };

    match &result {
        Ok(SaveOutcome::Saved) => log_event(logger, event_for(events::ITEM_SAVED)),
        Ok(SaveOutcome::Unsaved) => log_event(logger, event_for(events::ITEM_UNSAVED)),
        Ok(SaveOutcome::Blocked) => log_event(logger, event_for(events::SAVE_BLOCKED)),
        Err(Error::NotReady) => {}
        Err(e) => log_event(logger, event_for(events::SAVE_FAILED).with_error(e.to_string())),
    }

    flush_notifications(&ctx, json);

    if json {
        let failed = result.is_err();
        let report = match result {
            Ok(outcome) => {
                let mut context = HashMap::new();
                context.insert("itemId".to_string(), serde_json::json!(item_id));
                context.insert(
                    "remainingSaves".to_string(),
                    serde_json::json!(ctx.quota.state()?.remaining_saves),
                );
                OperationResult::ok_with_context(outcome, context)
            }
            Err(e) => OperationResult::fail(e.to_string()),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        if failed {
            anyhow::bail!("save failed");
        }
        return Ok(());
    }

    result?;
    Ok(())
}

fn filter<'a>(
    tales: Vec<&'a Tale>,
    kind: Option<&str>,
    search: Option<&str>,
) -> Result<Vec<&'a Tale>> {
    let kind = kind.map(str::parse::<TaleKind>).transpose()?;
    let needle = search.map(|s| s.trim().to_lowercase());
    Ok(tales
        .into_iter()
        .filter(|t| kind.map_or(true, |k| t.kind == k))
        .filter(|t| needle.as_deref().map_or(true, |n| t.matches(n)))
        .collect())
}

pub fn list(kind: Option<&str>, search: Option<&str>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let ids = ctx.saved_ids()?;
    let tales = filter(ctx.catalog.saved_tales(&ids), kind, search)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "savedIds": ids, "tales": tales })
        );
        return Ok(());
    }

    if ids.is_empty() {
        println!("No saved tales yet. Try `tales browse` and `tales save <id>`.");
        return Ok(());
    }

    println!("{}", output::tales_table(tales.iter().copied(), &ids));
    let unknown = ids.len() - ctx.catalog.saved_tales(&ids).len();
    if unknown > 0 {
        output::warning(&format!("{} saved id(s) are not in the catalog", unknown));
    }
    Ok(())
}

pub fn clear(force: bool, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let Some(user) = ctx.identity() else {
        return Err(Error::NotReady.into());
    };

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt("Remove all saved tales? Trial saves will not be refunded.")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let removed = ctx.ledger.clear(&user.id)?;
    if json {
        println!("{}", serde_json::json!({ "removed": removed }));
    } else {
        output::success(&format!("Removed {} saved tale(s)", removed));
    }
    Ok(())
}
