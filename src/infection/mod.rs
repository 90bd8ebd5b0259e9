//! Feature infection over coaching graphs.
//!
//! Three policies are offered by [`InfectionEngine`]:
//!
//! - total infection spreads a feature across one connected component,
//! - exact infection picks whole components summing to a precise count,
//! - limited infection lands anywhere inside a `[min, max]` range, first with
//!   whole components and then, if needed, with coach/student classes.
//!
//! Each policy either updates every selected user or none at all.

mod engine;
mod report;

/// Trimmed-frontier range solver.
pub mod approx;

/// Coach/student class construction for the second limited-infection pass.
pub mod classes;

/// Exact subset-sum solver over component sizes.
pub mod exact;

/// Metrics sinks for infection work.
pub mod metrics;

/// The orchestrator and its configuration.
pub use engine::{InfectionEngine, InfectionOptions};

/// Reports returned by every policy.
pub use report::{InfeasibleReason, InfectionOutcome, InfectionPolicy, InfectionReport};

pub use exact::ExactSearchOptions;
pub use metrics::{default_metrics, CounterMetrics, InfectionMetrics, NoopMetrics};

#[cfg(test)]
mod tests;
