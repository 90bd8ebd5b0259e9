//! Random coaching graphs for experiments and benchmarks.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::graph::{CoachingGraph, GraphOptions};

/// Users that must exist before students may be drawn from existing users.
pub const REUSE_THRESHOLD: usize = 100;

/// Parameters for [`random_coaching_graph`].
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratorConfig {
    /// Number of classes (coaches) to create.
    pub classes: usize,
    /// Smallest number of students per class.
    pub min_class_size: usize,
    /// Largest number of students per class.
    pub max_class_size: usize,
    /// Probability that a student is an existing user rather than a new one.
    pub existing_rate: f64,
}

impl GeneratorConfig {
    fn validate(&self) -> Result<()> {
        if self.min_class_size > self.max_class_size {
            return Err(GraphError::invalid(format!(
                "min class size {} exceeds max class size {}",
                self.min_class_size, self.max_class_size
            )));
        }
        if !(0.0..=1.0).contains(&self.existing_rate) {
            return Err(GraphError::invalid(format!(
                "existing rate {} is outside [0, 1]",
                self.existing_rate
            )));
        }
        Ok(())
    }
}

/// Returns a deterministic RNG for `seed`.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Generates a directed coaching graph made of `cfg.classes` classes.
///
/// User ids are decimal counters starting at `"1"`. Each class gets a new
/// coach. Once the graph holds [`REUSE_THRESHOLD`] users, each student is an
/// existing user with probability `existing_rate`, which links classes into
/// larger components.
pub fn random_coaching_graph<R: Rng + ?Sized>(
    rng: &mut R,
    cfg: &GeneratorConfig,
) -> Result<CoachingGraph> {
    cfg.validate()?;
    let mut graph = CoachingGraph::new(GraphOptions::new());
    let mut ids: Vec<String> = Vec::new();
    let mut next_id = 0u64;
    let mut fresh_id = |ids: &mut Vec<String>| {
        next_id += 1;
        let id = next_id.to_string();
        ids.push(id.clone());
        id
    };

    for _ in 0..cfg.classes {
        let class_size = rng.gen_range(cfg.min_class_size..=cfg.max_class_size);
        let existing = ids.len();
        let coach = fresh_id(&mut ids);
        graph.add_node(coach.as_str());
        for _ in 0..class_size {
            let reuse = existing >= REUSE_THRESHOLD && rng.gen::<f64>() <= cfg.existing_rate;
            let reused = if reuse {
                ids[..existing].choose(rng).cloned()
            } else {
                None
            };
            let student = match reused {
                Some(id) => id,
                None => fresh_id(&mut ids),
            };
            graph.add_edge(&coach, &student);
        }
    }

    debug!(
        classes = cfg.classes,
        users = graph.len(),
        edges = graph.edge_count(),
        "generator.graph.created"
    );
    Ok(graph)
}
