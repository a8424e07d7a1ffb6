//! AI companion command - counts one use against the daily limit

use anyhow::Result;
use tales_core::services::{events, LogEvent};
use tales_core::AiOutcome;

use super::{flush_notifications, get_context, log_event, Logger};
use crate::output;

pub fn run(json: bool, logger: &Logger) -> Result<()> {
    let ctx = get_context()?;
    let outcome = ctx.use_ai()?;

    let mut event = LogEvent::new(match outcome {
        AiOutcome::Allowed { .. } => events::AI_USED,
        AiOutcome::Blocked { .. } => events::AI_BLOCKED,
    })
    .with_command("ai");
    if let Some(tier) = ctx.current_tier()? {
        event = event.with_tier(tier);
    }
    log_event(logger, event);

    if json {
        flush_notifications(&ctx, json);
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if let AiOutcome::Allowed { usage_today } = outcome {
        let status = ctx.status()?;
        let limit = status
            .ai_daily_limit
            .map(|l| l.to_string())
            .unwrap_or_else(|| "unlimited".to_string());
        output::success(&format!(
            "Your travel companion is listening ({} of {} today)",
            usage_today, limit
        ));
    }
    flush_notifications(&ctx, json);
    Ok(())
}
