use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::report::InfectionPolicy;

/// Trait for tracking infection work.
///
/// Implementations receive one call per traversal or solver pass and one per
/// infection outcome. The engine never reads metrics back.
pub trait InfectionMetrics: Send + Sync {
    /// Records a full component scan over the graph.
    ///
    /// # Parameters
    /// * `components` - Number of components discovered.
    fn component_scan(&self, components: usize);

    /// Records a completed exact subset-sum search.
    ///
    /// # Parameters
    /// * `steps` - Candidate expansions performed.
    /// * `found` - Whether a matching subset was found.
    fn exact_search(&self, steps: u64, found: bool);

    /// Records one approximate solver pass.
    ///
    /// # Parameters
    /// * `peak` - Largest frontier held after any trimming step.
    /// * `trimmed` - Candidates discarded by trimming or the upper bound.
    fn frontier_pass(&self, peak: usize, trimmed: usize);

    /// Records users whose features were updated.
    fn infection_applied(&self, policy: &InfectionPolicy, users: usize);

    /// Records an infection that could not meet its target.
    fn infection_rejected(&self, policy: &InfectionPolicy);
}

/// A no-op implementation of [`InfectionMetrics`].
#[derive(Default)]
pub struct NoopMetrics;

impl InfectionMetrics for NoopMetrics {
    fn component_scan(&self, _components: usize) {}
    fn exact_search(&self, _steps: u64, _found: bool) {}
    fn frontier_pass(&self, _peak: usize, _trimmed: usize) {}
    fn infection_applied(&self, _policy: &InfectionPolicy, _users: usize) {}
    fn infection_rejected(&self, _policy: &InfectionPolicy) {}
}

/// A thread-safe counter-based implementation of [`InfectionMetrics`].
#[derive(Default, Debug)]
pub struct CounterMetrics {
    /// Number of full component scans.
    pub component_scans: AtomicU64,
    /// Exact searches that found a subset.
    pub exact_hits: AtomicU64,
    /// Exact searches that did not.
    pub exact_misses: AtomicU64,
    /// Total candidate expansions across exact searches.
    pub exact_steps: AtomicU64,
    /// Approximate solver passes.
    pub frontier_passes: AtomicU64,
    /// Candidates discarded across approximate passes.
    pub frontier_trimmed: AtomicU64,
    /// Largest frontier held by any approximate pass.
    pub frontier_peak: AtomicU64,
    /// Users updated by total infections.
    pub total_users: AtomicU64,
    /// Users updated by exact infections.
    pub exact_users: AtomicU64,
    /// Users updated by limited infections.
    pub limited_users: AtomicU64,
    /// Infections rejected as infeasible.
    pub rejected: AtomicU64,
}

impl InfectionMetrics for CounterMetrics {
    fn component_scan(&self, _components: usize) {
        self.component_scans.fetch_add(1, Ordering::Relaxed);
    }

    fn exact_search(&self, steps: u64, found: bool) {
        self.exact_steps.fetch_add(steps, Ordering::Relaxed);
        if found {
            self.exact_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.exact_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn frontier_pass(&self, peak: usize, trimmed: usize) {
        self.frontier_passes.fetch_add(1, Ordering::Relaxed);
        self.frontier_trimmed
            .fetch_add(trimmed as u64, Ordering::Relaxed);
        self.frontier_peak.fetch_max(peak as u64, Ordering::Relaxed);
    }

    fn infection_applied(&self, policy: &InfectionPolicy, users: usize) {
        let counter = match policy {
            InfectionPolicy::Total { .. } => &self.total_users,
            InfectionPolicy::Exact { .. } => &self.exact_users,
            InfectionPolicy::Limited { .. } => &self.limited_users,
        };
        counter.fetch_add(users as u64, Ordering::Relaxed);
    }

    fn infection_rejected(&self, _policy: &InfectionPolicy) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }
}

/// Returns the default metrics implementation, [`NoopMetrics`].
pub fn default_metrics() -> Arc<dyn InfectionMetrics> {
    Arc::new(NoopMetrics)
}
