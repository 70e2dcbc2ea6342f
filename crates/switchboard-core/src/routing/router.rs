//! Model selection and fallback lookup.

use switchboard_types::error::RoutingError;
use switchboard_types::llm::Message;
use switchboard_types::routing::{ModelCandidate, RoutingDecision, Strategy, TaskComplexity};

use crate::complexity::{ComplexityAnalysis, ComplexityAnalyzer};

use super::state::RoutingState;
use super::table::RoutingTable;

/// Per-call budget context.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectOptions {
    /// Tightest remaining budget in USD, if any limit is configured.
    pub budget_remaining: Option<f64>,
    /// Overrides the threshold held in [`RoutingState`] for this call.
    pub budget_threshold: Option<f64>,
}

/// A decision plus the evidence behind it, for `swb route` and debug logs.
#[derive(Debug, Clone)]
pub struct RoutingExplanation {
    pub decision: RoutingDecision,
    pub analysis: ComplexityAnalysis,
    /// Set when a low budget moved the decision down one tier.
    pub downgraded_from: Option<TaskComplexity>,
}

/// Picks a model per turn from the routing table, honoring the current
/// strategy and the remaining budget.
#[derive(Debug, Clone)]
pub struct ModelRouter {
    table: RoutingTable,
    analyzer: ComplexityAnalyzer,
    state: RoutingState,
}

impl ModelRouter {
    pub fn new(table: RoutingTable, state: RoutingState) -> Self {
        Self {
            table,
            analyzer: ComplexityAnalyzer::new(),
            state,
        }
    }

    /// Router over the curated default table with default settings.
    pub fn with_defaults() -> Self {
        Self::new(RoutingTable::default(), RoutingState::default())
    }

    pub fn strategy(&self) -> Strategy {
        self.state.strategy()
    }

    /// Change the strategy. Only affects later selections.
    pub fn set_strategy(&self, strategy: Strategy) {
        tracing::info!(%strategy, "Routing strategy changed");
        self.state.set_strategy(strategy);
    }

    pub fn state(&self) -> &RoutingState {
        &self.state
    }

    /// The base (balanced) table.
    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// Candidates for a tier under the current strategy, preferred first.
    pub fn candidates(&self, complexity: TaskComplexity) -> Vec<ModelCandidate> {
        self.table.for_strategy(self.strategy()).ranked(complexity)
    }

    /// Select the model for one turn.
    pub fn select_model(
        &self,
        message: &str,
        history: &[Message],
        options: SelectOptions,
    ) -> Result<RoutingDecision, RoutingError> {
        self.explain(message, history, options)
            .map(|explanation| explanation.decision)
    }

    /// Select the model for one turn and keep the scoring details.
    ///
    /// A remaining budget under the threshold drops the tier by exactly one
    /// step, however far over budget the account is.
    pub fn explain(
        &self,
        message: &str,
        history: &[Message],
        options: SelectOptions,
    ) -> Result<RoutingExplanation, RoutingError> {
        let analysis = self.analyzer.analyze_detailed(message, history);
        let threshold = options
            .budget_threshold
            .unwrap_or_else(|| self.state.budget_threshold());

        let mut complexity = analysis.complexity;
        let mut downgraded_from = None;
        if let Some(remaining) = options.budget_remaining
            && remaining < threshold
        {
            let lowered = complexity.downgrade();
            if lowered != complexity {
                tracing::info!(
                    remaining,
                    threshold,
                    from = %complexity,
                    to = %lowered,
                    "Budget low, downgrading task complexity"
                );
                downgraded_from = Some(complexity);
                complexity = lowered;
            }
        }

        let strategy = self.strategy();
        let candidate = self
            .table
            .for_strategy(strategy)
            .ranked(complexity)
            .into_iter()
            .next()
            .ok_or(RoutingError::Configuration { complexity })?;

        let mut reason = format!(
            "{complexity} task -> {} ({strategy} strategy, priority {})",
            candidate.model, candidate.priority
        );
        if let (Some(from), Some(remaining)) = (downgraded_from, options.budget_remaining) {
            reason.push_str(&format!(
                "; budget low (${remaining:.2} left < ${threshold:.2}), downgraded from {from}"
            ));
        }

        tracing::debug!(
            model = %candidate.model,
            %complexity,
            %strategy,
            score = analysis.score,
            "Selected model"
        );

        Ok(RoutingExplanation {
            decision: RoutingDecision {
                model: candidate.model,
                complexity,
                reason,
                estimated_cost: candidate.cost_per_million,
            },
            analysis,
            downgraded_from,
        })
    }

    /// The candidate ranked right after `failed_model`, if any.
    ///
    /// Returns `None` when `failed_model` is last in its tier or is not in
    /// the tier at all.
    pub fn get_fallback(
        &self,
        failed_model: &str,
        complexity: TaskComplexity,
    ) -> Option<ModelCandidate> {
        let ranked = self.candidates(complexity);
        let position = ranked.iter().position(|c| c.model == failed_model)?;
        ranked.into_iter().nth(position + 1)
    }
}
