//! Token pricing and the per-session cost tracker.

pub mod pricing;
pub mod tracker;

pub use pricing::{ModelRates, PricingTable, format_cost};
pub use tracker::{CostRecord, CostTracker};
