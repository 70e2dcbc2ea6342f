//! `swb budget`: show, set and clear rolling spending limits.
//!
//! Usage bars turn yellow at 80% and red once the limit is exceeded.

use anyhow::{Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use switchboard_core::cost::format_cost;
use switchboard_types::usage::{BudgetPeriod, BudgetStatus};

use super::BudgetCommand;
use crate::state::AppState;

const BAR_WIDTH: usize = 20;
const WARN_PERCENT: f64 = 80.0;

pub async fn run(state: &AppState, action: BudgetCommand, json: bool) -> Result<()> {
    match action {
        BudgetCommand::Show => show(state, json).await,
        BudgetCommand::Set { period, amount } => set(state, period, amount, json).await,
        BudgetCommand::Clear { period } => clear(state, period, json).await,
    }
}

async fn show(state: &AppState, json: bool) -> Result<()> {
    let config = state.tracker.get_budget_config().await?;
    let mut rows: Vec<(BudgetPeriod, Option<BudgetStatus>, f64)> = Vec::new();
    for period in BudgetPeriod::ALL {
        let status = state.tracker.get_budget_status(period).await?;
        let spent = match &status {
            Some(s) => s.spent,
            None => state.tracker.get_spend(period).await?,
        };
        rows.push((period, status, spent));
    }

    if json {
        let periods: Vec<serde_json::Value> = rows
            .iter()
            .map(|(period, status, spent)| {
                serde_json::json!({
                    "period": period,
                    "limit": status.as_ref().map(|s| s.limit),
                    "spent": spent,
                    "remaining": status.as_ref().map(|s| s.remaining),
                    "percent_used": status.as_ref().map(|s| s.percent_used),
                })
            })
            .collect();
        let out = serde_json::json!({
            "periods": periods,
            "budget_threshold": state.router.state().budget_threshold(),
            "updated_at": config.updated_at,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Period").fg(Color::White),
        Cell::new("Limit").fg(Color::White),
        Cell::new("Spent").fg(Color::White),
        Cell::new("Remaining").fg(Color::White),
        Cell::new("Used").fg(Color::White),
    ]);

    for (period, status, spent) in &rows {
        match status {
            Some(s) => {
                let remaining_color = if s.remaining < 0.0 {
                    Color::Red
                } else {
                    Color::Green
                };
                table.add_row(vec![
                    Cell::new(period).fg(Color::Cyan),
                    Cell::new(format!("${:.2}", s.limit)),
                    Cell::new(format_cost(s.spent)),
                    Cell::new(format_cost(s.remaining)).fg(remaining_color),
                    Cell::new(render_usage_bar(s.percent_used)).fg(bar_color(s.percent_used)),
                ]);
            }
            None => {
                table.add_row(vec![
                    Cell::new(period).fg(Color::Cyan),
                    Cell::new("no limit").fg(Color::DarkGrey),
                    Cell::new(format_cost(*spent)),
                    Cell::new("-").fg(Color::DarkGrey),
                    Cell::new("-").fg(Color::DarkGrey),
                ]);
            }
        }
    }

    println!("{table}");
    println!(
        "  {}",
        style(format!(
            "Routing drops one tier when less than ${:.2} remains.",
            state.router.state().budget_threshold()
        ))
        .dim()
    );
    println!();
    Ok(())
}

async fn set(state: &AppState, period: BudgetPeriod, amount: f64, json: bool) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        bail!("budget limit must be a non-negative amount, got {amount}");
    }
    state.tracker.set_budget_limit(period, Some(amount)).await?;

    if json {
        let out = serde_json::json!({ "period": period, "limit": amount });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "  {} {} budget set to {}",
            style("✓").green().bold(),
            period,
            style(format!("${amount:.2}")).bold()
        );
    }
    Ok(())
}

async fn clear(state: &AppState, period: Option<BudgetPeriod>, json: bool) -> Result<()> {
    match period {
        Some(period) => state.tracker.set_budget_limit(period, None).await?,
        None => state.tracker.clear_budget_limits().await?,
    }

    if json {
        let cleared: Vec<BudgetPeriod> = match period {
            Some(p) => vec![p],
            None => BudgetPeriod::ALL.to_vec(),
        };
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "cleared": cleared }))?);
    } else {
        let what = period.map_or_else(|| "All budget limits".to_string(), |p| format!("{p} budget limit"));
        println!("  {} {what} cleared", style("✓").green().bold());
    }
    Ok(())
}

/// A fixed-width bar plus percentage, e.g. `██████░░░░░░░░░░░░░░  30%`.
fn render_usage_bar(percent_used: f64) -> String {
    let clamped = percent_used.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!(
        "{}{} {:>3.0}%",
        "█".repeat(filled),
        "░".repeat(BAR_WIDTH - filled),
        percent_used
    )
}

fn bar_color(percent_used: f64) -> Color {
    if percent_used > 100.0 {
        Color::Red
    } else if percent_used >= WARN_PERCENT {
        Color::Yellow
    } else {
        Color::Green
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_bar_fills_proportionally() {
        let bar = render_usage_bar(30.0);
        assert_eq!(bar.chars().filter(|c| *c == '█').count(), 6);
        assert_eq!(bar.chars().filter(|c| *c == '░').count(), 14);
        assert!(bar.ends_with(" 30%"));
    }

    #[test]
    fn test_usage_bar_clamps_overage_but_reports_it() {
        let bar = render_usage_bar(150.0);
        assert_eq!(bar.chars().filter(|c| *c == '█').count(), BAR_WIDTH);
        assert!(bar.ends_with("150%"));
    }

    #[test]
    fn test_bar_color_thresholds() {
        assert_eq!(bar_color(10.0), Color::Green);
        assert_eq!(bar_color(80.0), Color::Yellow);
        assert_eq!(bar_color(100.0), Color::Yellow);
        assert_eq!(bar_color(100.5), Color::Red);
    }
}
