//! Exact subset-sum search over component sizes.
//!
//! The search walks include/exclude decisions depth-first with an explicit
//! path stack instead of recursion. Units are tried largest first. A branch is
//! abandoned as soon as its subtotal would overshoot the target, or when the
//! units left cannot close the remaining gap. Neither cut discards a feasible
//! subset, so a miss is definitive unless the step budget ran out.

use tracing::debug;

/// Limits applied to an exact search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExactSearchOptions {
    /// Maximum number of candidate expansions before giving up.
    ///
    /// `None` searches exhaustively, which is exponential in the number of
    /// components for adversarial size distributions.
    pub max_steps: Option<u64>,
}

impl ExactSearchOptions {
    /// Options with no step budget.
    pub fn unbounded() -> Self {
        Self { max_steps: None }
    }

    /// Options that stop after `steps` expansions.
    pub fn with_max_steps(steps: u64) -> Self {
        Self {
            max_steps: Some(steps),
        }
    }
}

/// Result of an exact search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExactSearch {
    /// Indices (into the input sizes, ascending) summing exactly to the target.
    Found(Vec<usize>),
    /// No subset of the sizes sums to the target.
    NoSubset,
    /// The step budget ran out before the search completed.
    BudgetExhausted,
}

/// An exact search result together with the work it took.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExactRun {
    /// What the search concluded.
    pub result: ExactSearch,
    /// Candidate expansions performed.
    pub steps: u64,
}

/// Finds a subset of `sizes` summing exactly to `target`.
pub fn solve_exact(sizes: &[usize], target: usize, opts: &ExactSearchOptions) -> ExactRun {
    if target == 0 {
        return ExactRun {
            result: ExactSearch::Found(Vec::new()),
            steps: 0,
        };
    }
    let total: usize = sizes.iter().sum();
    if target > total {
        return ExactRun {
            result: ExactSearch::NoSubset,
            steps: 0,
        };
    }

    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by(|a, b| sizes[*b].cmp(&sizes[*a]));
    let sorted: Vec<usize> = order.iter().map(|&i| sizes[i]).collect();
    let n = sorted.len();

    // remaining[i] = sum of sorted[i..]
    let mut remaining = vec![0usize; n + 1];
    for i in (0..n).rev() {
        remaining[i] = remaining[i + 1] + sorted[i];
    }

    let mut path: Vec<usize> = Vec::new();
    let mut cursor = 0usize;
    let mut subtotal = 0usize;
    let mut steps = 0u64;

    let result = loop {
        if cursor < n && subtotal + remaining[cursor] >= target {
            if opts.max_steps.is_some_and(|max| steps >= max) {
                break ExactSearch::BudgetExhausted;
            }
            steps += 1;
            let next = subtotal + sorted[cursor];
            if next == target {
                path.push(cursor);
                let mut picked: Vec<usize> = path.iter().map(|&pos| order[pos]).collect();
                picked.sort_unstable();
                break ExactSearch::Found(picked);
            }
            if next < target {
                path.push(cursor);
                subtotal = next;
            }
            cursor += 1;
            continue;
        }

        match path.pop() {
            None => break ExactSearch::NoSubset,
            Some(pos) => {
                subtotal -= sorted[pos];
                // Swapping in an equal-sized sibling reaches no new sums.
                cursor = pos + 1;
                while cursor < n && sorted[cursor] == sorted[pos] {
                    cursor += 1;
                }
            }
        }
    };

    debug!(
        units = n,
        target,
        steps,
        found = matches!(result, ExactSearch::Found(_)),
        "infection.exact.search"
    );
    ExactRun { result, steps }
}
