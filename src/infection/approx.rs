//! Trimmed-frontier approximation for hitting a size range.
//!
//! Units (components or classes) are folded into a frontier of candidate
//! selections one at a time. After each unit the frontier is sorted by size
//! and thinned so that consecutive survivors differ by more than a factor of
//! `1 + δ`, where `δ = ε / 2n` and `ε = max / min − 1`. For disjoint units this
//! is the classic subset-sum approximation scheme: the largest survivor is
//! within `1 + ε` of the best achievable total not above `max`.
//!
//! A candidate stores its size and a shared chain of chosen units, so growing
//! it costs O(1) when the unit is disjoint from every other unit. Members that
//! appear in several units (students shared between classes) are checked
//! against the chain so they are never double counted.

use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::types::NodeIdx;

// A chosen unit, linked to the units chosen before it.
struct Link {
    unit: usize,
    parent: Option<Rc<Link>>,
}

impl Drop for Link {
    // Long chains are released iteratively.
    fn drop(&mut self) {
        let mut next = self.parent.take();
        while let Some(link) = next {
            match Rc::try_unwrap(link) {
                Ok(mut inner) => next = inner.parent.take(),
                Err(_) => break,
            }
        }
    }
}

#[derive(Clone, Default)]
struct Candidate {
    size: usize,
    chain: Option<Rc<Link>>,
}

impl Candidate {
    /// Chosen units, most recent first.
    fn units(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.chain.as_deref(), |link| link.parent.as_deref())
            .map(|link| link.unit)
    }

    fn extended(&self, unit: usize, size: usize) -> Self {
        Self {
            size,
            chain: Some(Rc::new(Link {
                unit,
                parent: self.chain.clone(),
            })),
        }
    }
}

struct UnitProfile {
    members: Vec<NodeIdx>,
    shared: Vec<NodeIdx>,
}

// Deduplicates each unit and records which members occur in other units too.
fn profile_units(units: &[Vec<NodeIdx>]) -> Vec<UnitProfile> {
    let distinct: Vec<Vec<NodeIdx>> = units
        .iter()
        .map(|members| {
            let mut members = members.clone();
            members.sort_unstable();
            members.dedup();
            members
        })
        .collect();
    let mut owners: FxHashMap<NodeIdx, u32> = FxHashMap::default();
    for member in distinct.iter().flatten() {
        *owners.entry(*member).or_insert(0) += 1;
    }
    distinct
        .into_iter()
        .map(|members| {
            let shared = members
                .iter()
                .copied()
                .filter(|member| owners.get(member).is_some_and(|&count| count > 1))
                .collect();
            UnitProfile { members, shared }
        })
        .collect()
}

// Members `unit` adds to `candidate` that it does not already hold.
fn added_members(
    profiles: &[UnitProfile],
    candidate: &Candidate,
    unit: usize,
    scratch: &mut FxHashSet<NodeIdx>,
) -> usize {
    let profile = &profiles[unit];
    if profile.shared.is_empty() {
        return profile.members.len();
    }
    scratch.clear();
    for chosen in candidate.units() {
        scratch.extend(profiles[chosen].shared.iter().copied());
    }
    let overlap = profile
        .shared
        .iter()
        .filter(|member| scratch.contains(member))
        .count();
    profile.members.len() - overlap
}

/// Best selection found by [`solve_range`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RangeSelection {
    /// Indices of the chosen units, in processing order.
    pub units: Vec<usize>,
    /// Distinct members of the chosen units, sorted by index.
    pub members: Vec<NodeIdx>,
    /// Largest frontier size observed after trimming.
    pub frontier_peak: usize,
    /// Candidates discarded for exceeding `max` or by trimming.
    pub trimmed: usize,
}

impl RangeSelection {
    /// Number of distinct users selected.
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

/// Selects units whose combined membership is as large as possible without
/// exceeding `max_users`, to within the approximation factor implied by
/// `[min_users, max_users]`.
///
/// Units are processed in the order given. The result may fall short of
/// `min_users`; callers decide what that means.
pub fn solve_range(units: &[Vec<NodeIdx>], min_users: usize, max_users: usize) -> RangeSelection {
    let n = units.len();
    if n == 0 || max_users == 0 {
        return RangeSelection::default();
    }
    let delta = trim_delta(min_users, max_users, n);
    let profiles = profile_units(units);

    let mut frontier = vec![Candidate::default()];
    let mut frontier_peak = 1;
    let mut trimmed = 0usize;
    let mut scratch = FxHashSet::default();

    for (unit, profile) in profiles.iter().enumerate() {
        if profile.members.len() > max_users {
            continue;
        }
        let mut merged = Vec::with_capacity(frontier.len() * 2);
        for candidate in &frontier {
            let size = candidate.size + added_members(&profiles, candidate, unit, &mut scratch);
            if size > max_users {
                trimmed += 1;
                continue;
            }
            merged.push(candidate.extended(unit, size));
        }
        merged.append(&mut frontier);
        let before = merged.len();
        frontier = trim(merged, delta);
        trimmed += before - frontier.len();
        frontier_peak = frontier_peak.max(frontier.len());
    }

    let best = frontier
        .into_iter()
        .max_by_key(|candidate| candidate.size)
        .unwrap_or_default();
    let mut chosen: Vec<usize> = best.units().collect();
    chosen.reverse();
    let mut members: Vec<NodeIdx> = chosen
        .iter()
        .flat_map(|&unit| profiles[unit].members.iter().copied())
        .collect();
    members.sort_unstable();
    members.dedup();
    debug_assert_eq!(members.len(), best.size);

    debug!(
        units = n,
        min_users,
        max_users,
        delta,
        frontier_peak,
        trimmed,
        best = members.len(),
        "infection.range.solved"
    );

    RangeSelection {
        units: chosen,
        members,
        frontier_peak,
        trimmed,
    }
}

fn trim_delta(min_users: usize, max_users: usize, units: usize) -> f64 {
    let epsilon = max_users as f64 / min_users.max(1) as f64 - 1.0;
    (epsilon / (2.0 * units as f64)).max(0.0)
}

// Keeps the first candidate of every run whose sizes lie within a factor of
// `1 + delta` of the last kept size. Equal sizes always collapse.
fn trim(mut candidates: Vec<Candidate>, delta: f64) -> Vec<Candidate> {
    candidates.sort_by_key(|candidate| candidate.size);
    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match kept.last() {
            Some(last) if candidate.size as f64 <= last.size as f64 * (1.0 + delta) => {}
            _ => kept.push(candidate),
        }
    }
    kept
}
