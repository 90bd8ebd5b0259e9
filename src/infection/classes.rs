use rustc_hash::FxHashSet;

use crate::graph::CoachingGraph;
use crate::types::NodeIdx;

/// A coach together with the students they coach directly.
///
/// Singleton users form a class of one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Class {
    /// The coach (or singleton) the class was seeded from.
    pub seed: NodeIdx,
    /// The seed followed by its students, excluding already infected users.
    pub members: Vec<NodeIdx>,
}

/// Builds classes from every parent and singleton not in `infected`.
///
/// Students already in `infected` are left out of their class. Classes are
/// ordered by descending size, ties by seed index.
pub fn build_classes(graph: &CoachingGraph, infected: &FxHashSet<NodeIdx>) -> Vec<Class> {
    let mut seeds = graph.all_parents();
    seeds.extend(graph.all_singletons());
    seeds.sort_unstable();

    let mut classes: Vec<Class> = seeds
        .into_iter()
        .filter(|seed| !infected.contains(seed))
        .filter_map(|seed| {
            let node = graph.node(seed)?;
            let mut members = vec![seed];
            members.extend(
                node.outgoing()
                    .iter()
                    .copied()
                    .filter(|student| *student != seed && !infected.contains(student)),
            );
            Some(Class { seed, members })
        })
        .collect();
    classes.sort_by(|a, b| {
        b.members
            .len()
            .cmp(&a.members.len())
            .then(a.seed.cmp(&b.seed))
    });
    classes
}
