//! Upgrade and trial-reset commands

use anyhow::Result;
use tales_core::services::{events, LogEvent};
use tales_core::Tier;

use super::{flush_notifications, get_context, log_event, Logger};
use crate::output;

pub fn upgrade(json: bool, logger: &Logger) -> Result<()> {
    let ctx = get_context()?;
    if ctx.current_tier()? == Some(Tier::Premium) {
        if json {
            println!("{}", serde_json::json!({ "tier": Tier::Premium, "changed": false }));
        } else {
            output::info("Already premium");
        }
        return Ok(());
    }

    ctx.upgrade_to_premium()?;
    log_event(
        logger,
        LogEvent::new(events::TIER_UPGRADED)
            .with_tier(Tier::Premium)
            .with_command("upgrade"),
    );

    flush_notifications(&ctx, json);
    if json {
        println!("{}", serde_json::json!({ "tier": Tier::Premium, "changed": true }));
    }
    Ok(())
}

pub fn reset_trial(json: bool) -> Result<()> {
    let ctx = get_context()?;
    ctx.quota.reset_trial()?;
    let trial = ctx.quota.trial_info()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&trial)?);
    } else {
        output::success(&format!("Trial reset: {} saves available", trial.max_saves));
    }
    Ok(())
}
