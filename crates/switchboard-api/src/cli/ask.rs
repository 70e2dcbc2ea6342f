//! `swb ask`: one full turn through the router, provider and ledger.

use std::io::Write;
use std::time::Instant;

use anyhow::Result;
use console::style;

use switchboard_core::cost::{CostTracker, format_cost};
use switchboard_core::routing::SelectOptions;
use switchboard_types::llm::{ChatOptions, Message};

use super::route::complexity_label;
use crate::state::AppState;

/// Arguments for a single `ask` turn.
pub struct AskArgs {
    pub message: String,
    pub stream: bool,
    pub system: Option<String>,
    pub max_tokens: u32,
    pub session: Option<String>,
    /// Earlier turns, used only to score complexity.
    pub history: Vec<String>,
}

/// Route `message`, call the provider with fallback, and print the reply
/// with its cost.
pub async fn ask(state: &AppState, args: AskArgs, json: bool, quiet: bool) -> Result<()> {
    let session_id = args
        .session
        .unwrap_or_else(|| uuid::Uuid::now_v7().to_string());
    let manager = state.provider_manager(&session_id).await?;

    let history: Vec<Message> = args.history.iter().map(Message::user).collect();
    let budget_remaining = state.tracker.tightest_budget_remaining().await?;
    let decision = state.router.select_model(
        &args.message,
        &history,
        SelectOptions {
            budget_remaining,
            budget_threshold: None,
        },
    )?;
    tracing::info!(model = %decision.model, reason = %decision.reason, "Routed turn");

    if !json && !quiet {
        println!();
        println!(
            "  {} {} {}",
            style("→").cyan().bold(),
            style(&decision.model).bold(),
            style(format!("({} task)", complexity_label(decision.complexity))).dim()
        );
        println!();
    }

    let messages = vec![Message::user(args.message)];
    let options = ChatOptions {
        max_tokens: args.max_tokens,
        system: args.system,
        ..Default::default()
    };

    let start = Instant::now();
    let (content, outcome_model, usage, attempts, stop_reason) = if args.stream {
        let print_delta = |delta: &str| {
            if !json {
                print!("{delta}");
                let _ = std::io::stdout().flush();
            }
        };
        let outcome = manager
            .chat_stream(&messages, &options, decision, &print_delta)
            .await?;
        if !json {
            println!();
        }
        (
            outcome.value.content.clone(),
            outcome.model().to_string(),
            outcome.usage,
            outcome.attempts,
            outcome.value.stop_reason.map(|r| r.to_string()),
        )
    } else {
        let outcome = manager.chat(&messages, &options, decision).await?;
        if !json {
            println!("{}", outcome.value.content);
        }
        (
            outcome.value.content.clone(),
            outcome.model().to_string(),
            outcome.usage,
            outcome.attempts,
            Some(outcome.value.stop_reason.to_string()),
        )
    };
    let elapsed = start.elapsed();

    let mut costs = CostTracker::new(state.pricing.clone());
    let record = costs.add_usage(usage, &outcome_model);
    let session_cost = match manager.tracker().session_cost(&session_id).await {
        Ok(cost) => cost,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read session cost from ledger");
            costs.total_cost()
        }
    };

    if json {
        let out = serde_json::json!({
            "session_id": session_id,
            "model": outcome_model,
            "content": content,
            "stop_reason": stop_reason,
            "attempts": attempts,
            "usage": usage,
            "cost": record.cost,
            "session_cost": session_cost,
            "duration_ms": elapsed.as_millis() as u64,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if quiet {
        return Ok(());
    }

    println!();
    if attempts > 1 {
        println!(
            "  {} served by {} after {} attempts",
            style("!").yellow().bold(),
            style(&outcome_model).yellow(),
            attempts
        );
    }
    println!(
        "  {}",
        style(format!(
            "[{} \u{00b7} {} in / {} out \u{00b7} {} \u{00b7} session {} \u{00b7} {:.1}s]",
            outcome_model,
            usage.prompt_tokens,
            usage.completion_tokens,
            format_cost(record.cost),
            format_cost(session_cost),
            elapsed.as_secs_f64(),
        ))
        .dim()
    );
    println!("  {}", style(format!("session {session_id}")).dim());
    println!();

    Ok(())
}
