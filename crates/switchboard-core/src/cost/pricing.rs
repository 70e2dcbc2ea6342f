//! Per-model token pricing.
//!
//! Hardcoded default prices for known models, with user overrides from
//! `config.toml`. Unknown models never fail a lookup: they get a fixed
//! conservative rate. Displayed costs are labeled approximate (`~$0.12`).

use switchboard_types::config::ModelPricing;
use switchboard_types::usage::TokenUsage;

/// USD per million prompt tokens when no pattern matches.
pub const FALLBACK_PROMPT_PRICE: f64 = 5.0;
/// USD per million completion tokens when no pattern matches.
pub const FALLBACK_COMPLETION_PRICE: f64 = 15.0;

/// Prompt and completion rates for one model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelRates {
    pub prompt_price_per_million: f64,
    pub completion_price_per_million: f64,
}

impl ModelRates {
    pub const FALLBACK: ModelRates = ModelRates {
        prompt_price_per_million: FALLBACK_PROMPT_PRICE,
        completion_price_per_million: FALLBACK_COMPLETION_PRICE,
    };

    /// `prompt * prompt_price / 1e6 + completion * completion_price / 1e6`.
    pub fn cost(&self, usage: &TokenUsage) -> f64 {
        let prompt = f64::from(usage.prompt_tokens) * self.prompt_price_per_million / 1_000_000.0;
        let completion =
            f64::from(usage.completion_tokens) * self.completion_price_per_million / 1_000_000.0;
        prompt + completion
    }
}

struct PricingEntry {
    model_pattern: &'static str,
    prompt: f64,
    completion: f64,
}

// Prices are USD per million tokens. More specific prefixes come first.
const DEFAULT_PRICING: &[PricingEntry] = &[
    // Anthropic
    PricingEntry {
        model_pattern: "claude-opus-4",
        prompt: 15.0,
        completion: 75.0,
    },
    PricingEntry {
        model_pattern: "claude-sonnet-4",
        prompt: 3.0,
        completion: 15.0,
    },
    PricingEntry {
        model_pattern: "claude-haiku-4",
        prompt: 1.0,
        completion: 5.0,
    },
    PricingEntry {
        model_pattern: "claude-3-5-haiku",
        prompt: 0.80,
        completion: 4.0,
    },
    // OpenAI
    PricingEntry {
        model_pattern: "gpt-4o-mini",
        prompt: 0.15,
        completion: 0.60,
    },
    PricingEntry {
        model_pattern: "gpt-4o",
        prompt: 2.50,
        completion: 10.0,
    },
    PricingEntry {
        model_pattern: "gpt-4.1-mini",
        prompt: 0.40,
        completion: 1.60,
    },
    PricingEntry {
        model_pattern: "gpt-4.1",
        prompt: 2.0,
        completion: 8.0,
    },
    PricingEntry {
        model_pattern: "o3",
        prompt: 2.0,
        completion: 8.0,
    },
    // Google
    PricingEntry {
        model_pattern: "gemini-2.0-flash",
        prompt: 0.10,
        completion: 0.40,
    },
    PricingEntry {
        model_pattern: "gemini-2.5-flash",
        prompt: 0.30,
        completion: 2.50,
    },
    PricingEntry {
        model_pattern: "gemini-2.5-pro",
        prompt: 1.25,
        completion: 10.0,
    },
    // Mistral
    PricingEntry {
        model_pattern: "mistral-large",
        prompt: 2.0,
        completion: 6.0,
    },
];

/// Provider-prefixed ids (`anthropic/claude-sonnet-4`, as routed through
/// OpenRouter) are matched on the part after the last `/`.
fn base_model(model: &str) -> &str {
    model.rsplit('/').next().unwrap_or(model)
}

/// Pricing lookup: user overrides, then the default table, then the fallback.
#[derive(Debug, Clone, Default)]
pub struct PricingTable {
    overrides: Vec<ModelPricing>,
}

impl PricingTable {
    pub fn new(overrides: Vec<ModelPricing>) -> Self {
        Self { overrides }
    }

    /// Rates for `model`, matched by prefix.
    pub fn rates(&self, model: &str) -> ModelRates {
        let base = base_model(model);

        if let Some(p) = self
            .overrides
            .iter()
            .find(|p| model.starts_with(&p.model_pattern) || base.starts_with(&p.model_pattern))
        {
            return ModelRates {
                prompt_price_per_million: p.prompt_price_per_million,
                completion_price_per_million: p.completion_price_per_million,
            };
        }

        if let Some(entry) = DEFAULT_PRICING
            .iter()
            .find(|e| base.starts_with(e.model_pattern))
        {
            return ModelRates {
                prompt_price_per_million: entry.prompt,
                completion_price_per_million: entry.completion,
            };
        }

        tracing::debug!(model, "No pricing for model, using fallback rates");
        ModelRates::FALLBACK
    }

    /// Whether `model` has a real price (override or default table).
    pub fn is_known(&self, model: &str) -> bool {
        let base = base_model(model);
        self.overrides
            .iter()
            .any(|p| model.starts_with(&p.model_pattern) || base.starts_with(&p.model_pattern))
            || DEFAULT_PRICING.iter().any(|e| base.starts_with(e.model_pattern))
    }

    /// Cost in USD of one call.
    pub fn cost(&self, usage: &TokenUsage, model: &str) -> f64 {
        self.rates(model).cost(usage)
    }
}

/// Format a cost estimate for display.
///
/// Always prefixed with `~`. Costs below $0.01 get three decimals
/// (`~$0.001`), everything else two (`~$0.12`). Negative values (budget
/// overage) keep their sign: `-~$1.25`.
pub fn format_cost(cost: f64) -> String {
    if cost < 0.0 {
        return format!("-{}", format_cost(-cost));
    }
    if cost < 0.01 {
        format!("~${cost:.3}")
    } else {
        format!("~${cost:.2}")
    }
}
