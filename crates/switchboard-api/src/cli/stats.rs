//! `swb stats`: per-model aggregates recomputed from the ledger.

use anyhow::Result;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table, presets};
use console::style;

use switchboard_core::cost::format_cost;

use crate::state::AppState;

pub async fn stats(state: &AppState, json: bool) -> Result<()> {
    let stats = state.tracker.get_model_stats().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!();
    if stats.is_empty() {
        println!("  {}", style("No calls recorded yet.").dim());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Model").fg(Color::White),
        Cell::new("Calls").fg(Color::White),
        Cell::new("Success").fg(Color::White),
        Cell::new("Avg cost").fg(Color::White),
        Cell::new("Total cost").fg(Color::White),
    ]);

    for s in &stats {
        let rate_color = if s.success_rate >= 95.0 {
            Color::Green
        } else if s.success_rate >= 80.0 {
            Color::Yellow
        } else {
            Color::Red
        };
        table.add_row(vec![
            Cell::new(&s.model).fg(Color::Cyan),
            Cell::new(s.total_calls).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1}%", s.success_rate))
                .fg(rate_color)
                .set_alignment(CellAlignment::Right),
            Cell::new(format_cost(s.avg_cost)).set_alignment(CellAlignment::Right),
            Cell::new(format_cost(s.total_cost)).set_alignment(CellAlignment::Right),
        ]);
    }

    let total: f64 = stats.iter().map(|s| s.total_cost).sum();
    let calls: u64 = stats.iter().map(|s| s.total_calls).sum();

    println!("{table}");
    println!(
        "  {}",
        style(format!("{calls} calls \u{00b7} {} total", format_cost(total))).dim()
    );
    println!();
    Ok(())
}
