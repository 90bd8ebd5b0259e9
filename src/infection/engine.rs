use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::{debug, info};

use super::approx::solve_range;
use super::classes::build_classes;
use super::exact::{solve_exact, ExactSearch, ExactSearchOptions};
use super::metrics::{default_metrics, InfectionMetrics};
use super::report::{InfeasibleReason, InfectionPolicy, InfectionReport};
use crate::error::{GraphError, Result};
use crate::features::FeatureUpdate;
use crate::graph::CoachingGraph;
use crate::types::NodeIdx;

/// Configuration for an [`InfectionEngine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InfectionOptions {
    /// Limits for the exact solver.
    pub exact: ExactSearchOptions,
    /// Whether limited infection may fall back to coach/student classes when
    /// whole components cannot reach the lower bound.
    pub class_pass: bool,
}

impl InfectionOptions {
    /// Default options: unbounded exact search, class fallback enabled.
    pub fn new() -> Self {
        Self {
            exact: ExactSearchOptions::unbounded(),
            class_pass: true,
        }
    }

    /// Caps the exact solver at `steps` expansions (`None` for no cap).
    pub fn max_search_steps(mut self, steps: Option<u64>) -> Self {
        self.exact.max_steps = steps;
        self
    }

    /// Enables or disables the class fallback of limited infection.
    pub fn class_pass(mut self, enabled: bool) -> Self {
        self.class_pass = enabled;
        self
    }
}

impl Default for InfectionOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs infection policies against a [`CoachingGraph`].
///
/// Every policy computes its full selection before touching the graph. When
/// the target cannot be met the graph is left exactly as it was.
#[derive(Clone)]
pub struct InfectionEngine {
    opts: InfectionOptions,
    metrics: Arc<dyn InfectionMetrics>,
}

impl InfectionEngine {
    /// Creates an engine with the given options and no-op metrics.
    pub fn new(opts: InfectionOptions) -> Self {
        Self {
            opts,
            metrics: default_metrics(),
        }
    }

    /// Replaces the metrics sink.
    pub fn with_metrics(mut self, metrics: Arc<dyn InfectionMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Options this engine was built with.
    pub fn options(&self) -> &InfectionOptions {
        &self.opts
    }

    /// Applies `feature` to every user in the component containing `anchor_id`.
    pub fn total_infection(
        &self,
        graph: &mut CoachingGraph,
        feature: &str,
        anchor_id: &str,
    ) -> Result<InfectionReport> {
        let update = FeatureUpdate::parse(feature)?;
        let component = graph.connected_component(anchor_id)?;
        let mut report = InfectionReport::new(
            InfectionPolicy::Total {
                anchor: anchor_id.to_string(),
            },
            feature,
        );
        report.components_selected = 1;
        Ok(self.apply(graph, &update, component, report))
    }

    /// Applies `feature` to whole components totalling exactly `count` users.
    pub fn exact_limited_infection(
        &self,
        graph: &mut CoachingGraph,
        feature: &str,
        count: usize,
    ) -> Result<InfectionReport> {
        let update = FeatureUpdate::parse(feature)?;
        let report = InfectionReport::new(InfectionPolicy::Exact { count }, feature);
        if count > graph.len() {
            return Ok(self.reject(
                report,
                InfeasibleReason::TargetExceedsPopulation {
                    population: graph.len(),
                },
            ));
        }

        let components = self.components(graph);
        let sizes: Vec<usize> = components.iter().map(Vec::len).collect();
        let run = solve_exact(&sizes, count, &self.opts.exact);
        self.metrics
            .exact_search(run.steps, matches!(run.result, ExactSearch::Found(_)));

        let mut report = report;
        report.solver_steps = run.steps;
        match run.result {
            ExactSearch::Found(picked) => {
                report.components_selected = picked.len();
                let selection: Vec<NodeIdx> = picked
                    .into_iter()
                    .flat_map(|i| components[i].iter().copied())
                    .collect();
                Ok(self.apply(graph, &update, selection, report))
            }
            ExactSearch::NoSubset => Ok(self.reject(report, InfeasibleReason::NoExactSubset)),
            ExactSearch::BudgetExhausted => Ok(self.reject(
                report,
                InfeasibleReason::SearchBudgetExhausted { steps: run.steps },
            )),
        }
    }

    /// Applies `feature` to between `min_users` and `max_users` users.
    ///
    /// Whole components are tried first. If they fall short of `min_users`,
    /// coach/student classes outside the chosen components top up the
    /// selection against the remaining range.
    pub fn limited_infection(
        &self,
        graph: &mut CoachingGraph,
        feature: &str,
        min_users: usize,
        max_users: usize,
    ) -> Result<InfectionReport> {
        let update = FeatureUpdate::parse(feature)?;
        if min_users > max_users {
            return Err(GraphError::invalid(format!(
                "lower bound {min_users} exceeds upper bound {max_users}"
            )));
        }
        let mut report = InfectionReport::new(
            InfectionPolicy::Limited {
                min: min_users,
                max: max_users,
            },
            feature,
        );
        if min_users > graph.len() {
            return Ok(self.reject(
                report,
                InfeasibleReason::TargetExceedsPopulation {
                    population: graph.len(),
                },
            ));
        }

        let components = self.components(graph);
        let by_component = solve_range(&components, min_users, max_users);
        self.metrics
            .frontier_pass(by_component.frontier_peak, by_component.trimmed);
        report.components_selected = by_component.units.len();
        let mut selection = by_component.members;

        if selection.len() < min_users && self.opts.class_pass {
            let infected: FxHashSet<NodeIdx> = selection.iter().copied().collect();
            let classes = build_classes(graph, &infected);
            let units: Vec<Vec<NodeIdx>> = classes.into_iter().map(|c| c.members).collect();
            let residual_min = min_users - selection.len();
            let residual_max = max_users - selection.len();
            debug!(
                already = selection.len(),
                classes = units.len(),
                residual_min,
                residual_max,
                "infection.limited.class_pass"
            );
            let by_class = solve_range(&units, residual_min, residual_max);
            self.metrics
                .frontier_pass(by_class.frontier_peak, by_class.trimmed);
            report.classes_selected = by_class.units.len();
            selection.extend(by_class.members);
        }

        if selection.len() < min_users {
            let best = selection.len();
            return Ok(self.reject(report, InfeasibleReason::RangeUnreachable { best }));
        }
        Ok(self.apply(graph, &update, selection, report))
    }

    // Components ordered largest first; ties keep discovery order.
    fn components(&self, graph: &CoachingGraph) -> Vec<Vec<NodeIdx>> {
        let mut components = graph.all_connected_components();
        self.metrics.component_scan(components.len());
        components.sort_by(|a, b| b.len().cmp(&a.len()));
        components
    }

    fn apply(
        &self,
        graph: &mut CoachingGraph,
        update: &FeatureUpdate,
        selection: Vec<NodeIdx>,
        mut report: InfectionReport,
    ) -> InfectionReport {
        graph.apply_update(&selection, update);
        let mut users: Vec<String> = graph
            .ids(&selection)
            .into_iter()
            .map(str::to_string)
            .collect();
        users.sort_unstable();
        report.infected = users.len();
        report.users = users;

        self.metrics
            .infection_applied(&report.policy, report.infected);
        info!(
            policy = report.policy.name(),
            feature = %update,
            users = report.infected,
            "infection.applied"
        );
        report
    }

    fn reject(&self, report: InfectionReport, reason: InfeasibleReason) -> InfectionReport {
        self.metrics.infection_rejected(&report.policy);
        info!(
            policy = report.policy.name(),
            reason = %reason,
            "infection.infeasible"
        );
        report.infeasible(reason)
    }
}

impl Default for InfectionEngine {
    fn default() -> Self {
        Self::new(InfectionOptions::default())
    }
}
