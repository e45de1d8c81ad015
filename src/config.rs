//! Tuning knobs shared by a tree and everything derived from it.

/// Configuration for a [`Tree`](crate::Tree).
///
/// Trees produced by extraction or transformation inherit the configuration
/// of their source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeConfig {
    /// Fraction of an id span that must be occupied for a
    /// [`NodePairList`](crate::NodePairList) to compile into a dense map.
    pub dense_threshold: f32,
    /// Initial capacity of the node arena.
    pub initial_capacity: usize,
    /// Initial capacity of the explicit stacks used by traversals.
    pub stack_capacity: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            dense_threshold: 0.75,
            initial_capacity: 16,
            stack_capacity: 64,
        }
    }
}
