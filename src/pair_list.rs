//! Accumulating node correspondences produced by restructuring.

use std::collections::HashMap;

use crate::config::TreeConfig;
use crate::error::Result;
use crate::node::{NodeKey, Numbering};
use crate::node_map::{CompiledNodeMap, DenseNodeMap, SparseNodeMap};

/// An ordered list of `(key node, value)` pairs, compiled on demand into a
/// node map whose representation follows the observed key density.
#[derive(Debug, Clone)]
pub struct NodePairList<V> {
    pairs: Vec<(usize, V)>,
    min: usize,
    max: usize,
    numbering: Numbering,
    dense_threshold: f32,
}

impl<V> NodePairList<V> {
    pub fn new(numbering: Numbering) -> Self {
        Self::with_threshold(numbering, TreeConfig::default().dense_threshold)
    }

    pub fn with_threshold(numbering: Numbering, dense_threshold: f32) -> Self {
        Self {
            pairs: Vec::new(),
            min: usize::MAX,
            max: 0,
            numbering,
            dense_threshold,
        }
    }

    pub fn add_pair<K: NodeKey + ?Sized>(&mut self, key: &K, value: V) -> Result<()> {
        let idx = key.index_in(self.numbering)?;
        self.min = self.min.min(idx);
        self.max = self.max.max(idx);
        self.pairs.push((idx, value));
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Fraction of the key span `min..=max` that is occupied. An empty list
    /// counts as fully dense.
    pub fn density(&self) -> f32 {
        if self.pairs.is_empty() {
            return 1.0;
        }
        let span = self.max - self.min + 1;
        self.pairs.len() as f32 / span as f32
    }

    #[inline]
    pub fn is_dense(&self) -> bool {
        self.density() >= self.dense_threshold
    }

    /// Compiles into a dense array map (offset at the smallest key) or a
    /// sparse hash map. A key added twice keeps its last value.
    pub fn into_node_map(self) -> CompiledNodeMap<V> {
        if self.is_dense() {
            let offset = if self.pairs.is_empty() { 0 } else { self.min };
            let span = if self.pairs.is_empty() {
                0
            } else {
                self.max - self.min + 1
            };
            let mut values = Vec::new();
            values.resize_with(span, || None);
            for (idx, value) in self.pairs {
                values[idx - offset] = Some(value);
            }
            CompiledNodeMap::Dense(DenseNodeMap::new(self.numbering, offset, values))
        } else {
            let entries: HashMap<usize, V> = self.pairs.into_iter().collect();
            CompiledNodeMap::Sparse(SparseNodeMap::from_indexed(self.numbering, entries))
        }
    }
}
