/// Configuration options supplied when creating a [`super::CoachingGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphOptions {
    /// Whether edges are recorded in one direction only.
    ///
    /// Coaching graphs are directed (coach → student). In undirected mode every
    /// `add_edge(u, v)` also records `v → u`.
    pub directed: bool,
    /// Expected number of users, used to pre-size node storage.
    pub capacity: usize,
}

impl GraphOptions {
    /// Creates options for a directed graph.
    pub fn new() -> Self {
        Self {
            directed: true,
            capacity: 0,
        }
    }

    /// Sets whether the graph is directed.
    pub fn directed(mut self, directed: bool) -> Self {
        self.directed = directed;
        self
    }

    /// Sets the expected number of users.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self::new()
    }
}
