//! Routing: candidate tables, shared settings and the model router.

pub mod router;
pub mod state;
pub mod table;

pub use router::{ModelRouter, RoutingExplanation, SelectOptions};
pub use state::{DEFAULT_BUDGET_THRESHOLD, RoutingState};
pub use table::{RoutingTable, default_table};
