use std::fmt;

use serde::Serialize;

/// Which infection policy produced a report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InfectionPolicy {
    /// Infect the whole component around `anchor`.
    Total {
        /// User the component was grown from.
        anchor: String,
    },
    /// Infect whole components totalling exactly `count` users.
    Exact {
        /// Requested number of users.
        count: usize,
    },
    /// Infect between `min` and `max` users.
    Limited {
        /// Lower bound, inclusive.
        min: usize,
        /// Upper bound, inclusive.
        max: usize,
    },
}

impl InfectionPolicy {
    /// Short name used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            InfectionPolicy::Total { .. } => "total",
            InfectionPolicy::Exact { .. } => "exact",
            InfectionPolicy::Limited { .. } => "limited",
        }
    }
}

/// Why an infection could not meet its target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum InfeasibleReason {
    /// No combination of whole components has exactly the requested size.
    NoExactSubset,
    /// The exact search hit its step budget before finishing.
    SearchBudgetExhausted {
        /// Steps spent before giving up.
        steps: u64,
    },
    /// The request asks for more users than the graph holds.
    TargetExceedsPopulation {
        /// Number of users in the graph.
        population: usize,
    },
    /// The best selection found stayed below the lower bound.
    RangeUnreachable {
        /// Size of the best selection found.
        best: usize,
    },
}

impl fmt::Display for InfeasibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfeasibleReason::NoExactSubset => {
                write!(f, "no combination of components has the requested size")
            }
            InfeasibleReason::SearchBudgetExhausted { steps } => {
                write!(f, "search budget exhausted after {steps} steps")
            }
            InfeasibleReason::TargetExceedsPopulation { population } => {
                write!(f, "graph only holds {population} users")
            }
            InfeasibleReason::RangeUnreachable { best } => {
                write!(f, "best selection reached only {best} users")
            }
        }
    }
}

/// Whether the graph was changed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InfectionOutcome {
    /// The selected users were updated.
    Infected,
    /// Nothing was changed.
    Infeasible {
        /// What prevented the infection.
        reason: InfeasibleReason,
    },
}

/// Summary of one infection call.
#[derive(Clone, Debug, Serialize)]
pub struct InfectionReport {
    /// The policy that ran.
    pub policy: InfectionPolicy,
    /// The feature token applied, including any exclusion marker.
    pub feature: String,
    /// Whether users were updated.
    pub outcome: InfectionOutcome,
    /// Number of users updated. Zero when infeasible.
    pub infected: usize,
    /// Ids of the updated users, sorted.
    pub users: Vec<String>,
    /// Whole components included in the selection.
    pub components_selected: usize,
    /// Classes included in the selection.
    pub classes_selected: usize,
    /// Work performed by the exact solver, if it ran.
    pub solver_steps: u64,
}

impl InfectionReport {
    pub(crate) fn new(policy: InfectionPolicy, feature: &str) -> Self {
        Self {
            policy,
            feature: feature.to_string(),
            outcome: InfectionOutcome::Infected,
            infected: 0,
            users: Vec::new(),
            components_selected: 0,
            classes_selected: 0,
            solver_steps: 0,
        }
    }

    pub(crate) fn infeasible(mut self, reason: InfeasibleReason) -> Self {
        self.outcome = InfectionOutcome::Infeasible { reason };
        self.infected = 0;
        self.users.clear();
        self
    }

    /// Whether the infection was applied.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, InfectionOutcome::Infected)
    }
}
