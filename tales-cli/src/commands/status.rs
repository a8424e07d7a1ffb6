//! Status and whoami commands

use anyhow::Result;
use colored::Colorize;

use super::get_context;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let status = ctx.status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Tales Status".bold());
    println!();

    let mut table = output::create_table();
    let tier = status
        .tier
        .map(|t| t.to_string())
        .unwrap_or_else(|| "not ready".to_string());
    table.add_row(vec!["Tier".to_string(), tier]);
    table.add_row(vec![
        "Trial saves used".to_string(),
        format!("{} / {}", status.trial.used_saves, status.trial.max_saves),
    ]);
    table.add_row(vec![
        "Trial expired".to_string(),
        status.quota.trial_expired.to_string(),
    ]);
    let ai_limit = status
        .ai_daily_limit
        .map(|l| l.to_string())
        .unwrap_or_else(|| "unlimited".to_string());
    table.add_row(vec![
        "AI uses today".to_string(),
        format!("{} / {}", status.quota.ai_usage_today, ai_limit),
    ]);
    table.add_row(vec!["Saved tales".to_string(), status.saved_count.to_string()]);
    if let Some(since) = status.premium_since {
        table.add_row(vec![
            "Premium since".to_string(),
            since.format("%Y-%m-%d").to_string(),
        ]);
    }

    println!("{}", table);
    Ok(())
}

pub fn whoami(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let identity = ctx.identity();
    let tier = ctx.current_tier()?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "identity": identity, "tier": tier })
        );
        return Ok(());
    }

    match identity {
        Some(user) => {
            let who = user.email.as_deref().unwrap_or("guest");
            println!("{} ({})", who.bold(), user.id.dimmed());
            if let Some(tier) = tier {
                println!("Tier: {}", tier);
            }
        }
        None => output::warning("Not signed in"),
    }
    Ok(())
}
