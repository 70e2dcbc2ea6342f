//! `swb strategies`: how each strategy orders the routing table.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use switchboard_types::routing::{Strategy, TaskComplexity};

use crate::state::AppState;

const TIERS: [TaskComplexity; 3] = [
    TaskComplexity::Simple,
    TaskComplexity::Moderate,
    TaskComplexity::Complex,
];

fn describe(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::Cost => "cheapest candidate first",
        Strategy::Performance => "most capable candidate first",
        Strategy::Balanced => "curated order",
    }
}

pub fn strategies(state: &AppState, json: bool) -> Result<()> {
    let current = state.router.strategy();

    if json {
        let out: Vec<serde_json::Value> = Strategy::ALL
            .iter()
            .map(|&strategy| {
                let table = state.router.table().for_strategy(strategy);
                let tiers: serde_json::Map<String, serde_json::Value> = TIERS
                    .iter()
                    .map(|&tier| {
                        (
                            tier.to_string(),
                            serde_json::json!(table.ranked(tier)),
                        )
                    })
                    .collect();
                serde_json::json!({
                    "strategy": strategy,
                    "description": describe(strategy),
                    "active": strategy == current,
                    "tiers": tiers,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![Cell::new("Strategy").fg(Color::White)];
    header.extend(TIERS.iter().map(|tier| Cell::new(tier).fg(Color::White)));
    table.set_header(header);

    for strategy in Strategy::ALL {
        let ordered = state.router.table().for_strategy(strategy);
        let name = if strategy == current {
            Cell::new(format!("{strategy} *")).fg(Color::Green)
        } else {
            Cell::new(strategy).fg(Color::Cyan)
        };
        let mut row = vec![name];
        for tier in TIERS {
            let models: Vec<String> = ordered.ranked(tier).into_iter().map(|c| c.model).collect();
            row.push(Cell::new(models.join("\n")));
        }
        table.add_row(row);
    }

    println!("{table}");
    for strategy in Strategy::ALL {
        println!("  {} {}", style(format!("{strategy:<12}")).cyan(), style(describe(strategy)).dim());
    }
    println!("  {}", style("* active strategy").dim());
    println!();
    Ok(())
}
