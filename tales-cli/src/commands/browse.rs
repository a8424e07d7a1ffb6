//! Browse command - list catalog tales with saved markers

use anyhow::Result;
use colored::Colorize;
use tales_core::{Tale, TaleKind};

use super::get_context;
use crate::output;

pub fn run(kind: Option<&str>, search: Option<&str>, featured: bool, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let kind = kind.map(str::parse::<TaleKind>).transpose()?;

    let mut tales: Vec<&Tale> = match search {
        Some(query) => ctx.catalog.search(query),
        None => ctx.catalog.all().iter().collect(),
    };
    if let Some(kind) = kind {
        tales.retain(|t| t.kind == kind);
    }
    if featured {
        tales.retain(|t| t.featured);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&tales)?);
        return Ok(());
    }

    if tales.is_empty() {
        println!("No tales match.");
        return Ok(());
    }

    let saved = ctx.saved_ids()?;
    println!("{}", output::tales_table(tales.iter().copied(), &saved));
    println!("{}", format!("{} tale(s)", tales.len()).dimmed());
    Ok(())
}
