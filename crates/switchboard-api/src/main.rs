//! Switchboard CLI entry point.
//!
//! Binary name: `swb`
//!
//! Parses CLI arguments, initializes tracing, the ledger and the router,
//! then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::{AppState, RoutingOverrides};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,switchboard=debug",
        _ => "trace",
    };
    switchboard_observe::tracing_setup::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "swb", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init(RoutingOverrides {
        strategy: cli.strategy,
        budget_threshold: cli.budget_threshold,
    })
    .await?;

    let result = dispatch(&state, cli).await;

    state.db_pool.close().await;
    switchboard_observe::tracing_setup::shutdown_tracing();
    result
}

async fn dispatch(state: &AppState, cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Route { message, history } => {
            cli::route::route(state, &message, &history, cli.json).await
        }

        Commands::Ask {
            message,
            stream,
            system,
            max_tokens,
            session,
            history,
        } => {
            let args = cli::ask::AskArgs {
                message,
                stream,
                system,
                max_tokens,
                session,
                history,
            };
            cli::ask::ask(state, args, cli.json, cli.quiet).await
        }

        Commands::Budget { action } => cli::budget::run(state, action, cli.json).await,

        Commands::Stats => cli::stats::stats(state, cli.json).await,

        Commands::History { limit, failures } => {
            cli::history::history(state, limit, failures, cli.json).await
        }

        Commands::Strategies => cli::strategies::strategies(state, cli.json),

        Commands::Completions { .. } => Ok(()),
    }
}
