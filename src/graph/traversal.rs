use std::collections::VecDeque;

use tracing::debug;

use super::CoachingGraph;
use crate::error::Result;
use crate::types::NodeIdx;

impl CoachingGraph {
    /// Returns the weakly connected component containing `start_id`.
    ///
    /// Edge direction is ignored. Nodes are listed in breadth-first order,
    /// starting with `start_id`, and each appears exactly once.
    pub fn connected_component(&self, start_id: &str) -> Result<Vec<NodeIdx>> {
        let start = self.index_of(start_id)?;
        let mut visited = vec![false; self.nodes.len()];
        Ok(self.bfs_component(start, &mut visited))
    }

    /// Partitions the graph into weakly connected components.
    ///
    /// Seeds are taken in index order, so the first component contains the
    /// first inserted user, and so on.
    pub fn all_connected_components(&self) -> Vec<Vec<NodeIdx>> {
        let mut visited = vec![false; self.nodes.len()];
        let mut components = Vec::new();
        for seed in 0..self.nodes.len() {
            if visited[seed] {
                continue;
            }
            components.push(self.bfs_component(NodeIdx(seed as u32), &mut visited));
        }
        debug!(
            nodes = self.nodes.len(),
            component_count = components.len(),
            "graph.components.computed"
        );
        components
    }

    /// Users with at least one student, in index order.
    pub fn all_parents(&self) -> Vec<NodeIdx> {
        self.filter_nodes(|node| node.is_parent())
    }

    /// Users with no coaches and no students, in index order.
    pub fn all_singletons(&self) -> Vec<NodeIdx> {
        self.filter_nodes(|node| node.is_singleton())
    }

    fn filter_nodes(&self, keep: impl Fn(&super::UserNode) -> bool) -> Vec<NodeIdx> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| keep(node))
            .map(|(i, _)| NodeIdx(i as u32))
            .collect()
    }

    // A node is emitted when first dequeued; later dequeues of the same node
    // are skipped without expanding its neighbors again.
    fn bfs_component(&self, start: NodeIdx, visited: &mut [bool]) -> Vec<NodeIdx> {
        let mut component = Vec::new();
        let mut queue: VecDeque<NodeIdx> = VecDeque::new();
        queue.push_back(start);
        while let Some(current) = queue.pop_front() {
            let slot = &mut visited[current.as_usize()];
            if *slot {
                continue;
            }
            *slot = true;
            component.push(current);
            queue.extend(
                self.nodes[current.as_usize()]
                    .neighbors()
                    .filter(|n| !visited[n.as_usize()]),
            );
        }
        component
    }
}
