//! `swb history`: most recent ledger rows, successes or failures.

use anyhow::Result;
use chrono::Local;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table, presets};
use console::style;

use switchboard_core::cost::format_cost;

use crate::state::AppState;

pub async fn history(state: &AppState, limit: u32, failures: bool, json: bool) -> Result<()> {
    if failures {
        return failure_history(state, limit, json).await;
    }

    let rows = state.tracker.recent_usage(limit).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!();
    if rows.is_empty() {
        println!("  {}", style("No calls recorded yet.").dim());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Time").fg(Color::White),
        Cell::new("Model").fg(Color::White),
        Cell::new("Tier").fg(Color::White),
        Cell::new("Tokens").fg(Color::White),
        Cell::new("Cost").fg(Color::White),
        Cell::new("Session").fg(Color::White),
    ]);

    for row in &rows {
        table.add_row(vec![
            Cell::new(row.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")),
            Cell::new(&row.model).fg(Color::Cyan),
            Cell::new(row.complexity),
            Cell::new(format!(
                "{} / {}",
                row.usage.prompt_tokens, row.usage.completion_tokens
            ))
            .set_alignment(CellAlignment::Right),
            Cell::new(format_cost(row.cost)).set_alignment(CellAlignment::Right),
            Cell::new(short_id(&row.session_id)).fg(Color::DarkGrey),
        ]);
    }

    println!("{table}");
    println!();
    Ok(())
}

async fn failure_history(state: &AppState, limit: u32, json: bool) -> Result<()> {
    let rows = state.tracker.recent_failures(limit).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!();
    if rows.is_empty() {
        println!("  {}", style("No failed calls recorded.").dim());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Time").fg(Color::White),
        Cell::new("Model").fg(Color::White),
        Cell::new("Fell back to").fg(Color::White),
        Cell::new("Error").fg(Color::White),
    ]);

    for row in &rows {
        table.add_row(vec![
            Cell::new(row.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")),
            Cell::new(&row.model).fg(Color::Red),
            match &row.fallback_model {
                Some(model) => Cell::new(model).fg(Color::Cyan),
                None => Cell::new("none").fg(Color::DarkGrey),
            },
            Cell::new(truncate(&row.error_message, 80)),
        ]);
    }

    println!("{table}");
    println!();
    Ok(())
}

/// First segment of a session id, enough to tell sessions apart.
fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{cut}...")
}
