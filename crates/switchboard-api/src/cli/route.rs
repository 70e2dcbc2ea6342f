//! `swb route`: dry-run routing decision with the scoring evidence.

use anyhow::Result;
use console::style;

use switchboard_core::cost::format_cost;
use switchboard_core::llm::MAX_ATTEMPTS;
use switchboard_core::routing::{RoutingExplanation, SelectOptions};
use switchboard_types::llm::Message;
use switchboard_types::routing::TaskComplexity;

use crate::state::AppState;

/// Classify `message` and show which model would serve it.
pub async fn route(state: &AppState, message: &str, history: &[String], json: bool) -> Result<()> {
    let history: Vec<Message> = history.iter().map(Message::user).collect();
    let budget_remaining = state.tracker.tightest_budget_remaining().await?;

    let explanation = state.router.explain(
        message,
        &history,
        SelectOptions {
            budget_remaining,
            budget_threshold: None,
        },
    )?;
    let fallbacks = fallback_chain(state, &explanation);

    if json {
        let out = serde_json::json!({
            "decision": explanation.decision,
            "score": explanation.analysis.score,
            "analyzed_complexity": explanation.analysis.complexity,
            "reasons": explanation.analysis.reasons,
            "downgraded_from": explanation.downgraded_from,
            "budget_remaining": budget_remaining,
            "strategy": state.router.strategy(),
            "fallbacks": fallbacks,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let decision = &explanation.decision;
    println!();
    println!(
        "  {} {} {}",
        style("→").cyan().bold(),
        style(&decision.model).bold(),
        style(format!("({} task)", complexity_label(decision.complexity))).dim()
    );
    println!("  {}", style(&decision.reason).dim());
    println!();

    println!("  {}", style("── Analysis ──").dim());
    println!("  Score:    {}", style(explanation.analysis.score).bold());
    if explanation.analysis.reasons.is_empty() {
        println!("  Signals:  {}", style("none").dim());
    } else {
        for reason in &explanation.analysis.reasons {
            println!("  Signal:   {reason}");
        }
    }
    if let Some(from) = explanation.downgraded_from {
        println!(
            "  {} downgraded from {} (low budget)",
            style("!").yellow().bold(),
            style(from).yellow()
        );
    }
    println!();

    println!("  {}", style("── Routing ──").dim());
    println!("  Strategy:  {}", state.router.strategy());
    println!(
        "  Rate:      {} per million tokens",
        format_cost(decision.estimated_cost)
    );
    match budget_remaining {
        Some(remaining) => println!("  Budget:    {} remaining", format_cost(remaining)),
        None => println!("  Budget:    {}", style("no limit set").dim()),
    }
    if !fallbacks.is_empty() {
        println!("  Fallbacks: {}", fallbacks.join(" → "));
    }
    println!();

    Ok(())
}

/// Models the fallback loop would try after the selected one, in order,
/// up to the attempt limit.
fn fallback_chain(state: &AppState, explanation: &RoutingExplanation) -> Vec<String> {
    let complexity = explanation.decision.complexity;
    let mut chain: Vec<String> = Vec::new();
    let mut current = explanation.decision.model.clone();
    while chain.len() + 1 < MAX_ATTEMPTS as usize
        && let Some(next) = state.router.get_fallback(&current, complexity)
    {
        // A model listed twice in a tier would cycle.
        if next.model == explanation.decision.model || chain.contains(&next.model) {
            break;
        }
        current = next.model.clone();
        chain.push(next.model);
    }
    chain
}

pub(crate) fn complexity_label(complexity: TaskComplexity) -> console::StyledObject<String> {
    let label = complexity.to_string();
    match complexity {
        TaskComplexity::Simple => style(label).green(),
        TaskComplexity::Moderate => style(label).yellow(),
        TaskComplexity::Complex => style(label).magenta(),
    }
}
