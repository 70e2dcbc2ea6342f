//! Durable usage ledger: repository port, budget windows and the tracker
//! service built on them.

pub mod repository;
pub mod tracker;
pub mod window;

#[cfg(test)]
pub(crate) mod test_support;

pub use repository::UsageRepository;
pub use tracker::UsageTracker;
pub use window::window_start;
