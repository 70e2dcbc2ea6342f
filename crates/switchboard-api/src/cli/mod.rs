//! CLI command definitions and dispatch for the `swb` binary.
//!
//! Uses clap derive macros for argument parsing. Every command accepts
//! `--json` for machine-readable output.

pub mod ask;
pub mod budget;
pub mod history;
pub mod route;
pub mod stats;
pub mod strategies;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use switchboard_types::routing::Strategy;
use switchboard_types::usage::BudgetPeriod;

/// Route LLM calls by task complexity, with fallback and budgets.
#[derive(Parser)]
#[command(name = "swb", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Routing strategy for this invocation (cost, performance, balanced).
    #[arg(long, global = true)]
    pub strategy: Option<Strategy>,

    /// Remaining budget in USD below which routing drops one tier.
    #[arg(long, global = true)]
    pub budget_threshold: Option<f64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show which model a message would be routed to, without calling it.
    Route {
        /// The message to classify.
        message: String,

        /// Earlier turns in the conversation, used as history.
        #[arg(long = "history", value_name = "MESSAGE")]
        history: Vec<String>,
    },

    /// Send one message through the router and print the reply.
    Ask {
        /// The message to send.
        message: String,

        /// Stream the reply as it is generated.
        #[arg(short, long)]
        stream: bool,

        /// System prompt for the call.
        #[arg(long)]
        system: Option<String>,

        /// Maximum output tokens.
        #[arg(long, default_value = "4096")]
        max_tokens: u32,

        /// Session id to attribute usage to (a new one is generated otherwise).
        #[arg(long)]
        session: Option<String>,

        /// Earlier turns in the conversation. They count toward complexity
        /// routing only and are not sent to the model.
        #[arg(long = "history", value_name = "MESSAGE")]
        history: Vec<String>,
    },

    /// Inspect or change spending limits.
    Budget {
        #[command(subcommand)]
        action: BudgetCommand,
    },

    /// Per-model call counts, success rates and cost.
    Stats,

    /// Recent ledger rows.
    #[command(alias = "log")]
    History {
        /// Number of rows to show.
        #[arg(short = 'n', long, default_value = "20")]
        limit: u32,

        /// Show failed attempts instead of successful calls.
        #[arg(long)]
        failures: bool,
    },

    /// List routing strategies and the candidates each one ranks first.
    Strategies,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum BudgetCommand {
    /// Show limits, spend and remaining budget for every period.
    Show,

    /// Set the limit for one period, in USD.
    Set {
        /// daily, weekly or monthly.
        period: BudgetPeriod,

        /// Limit in USD.
        amount: f64,
    },

    /// Remove limits (all periods, or one).
    Clear {
        /// Only clear this period.
        period: Option<BudgetPeriod>,
    },
}
