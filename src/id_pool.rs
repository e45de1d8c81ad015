//! Recycling the ids of a retired subtree.
//!
//! The pool has two phases. While collecting, [`IdPool::reserve`] records the
//! ids of every retiring node. [`IdPool::close_for_reuse`] sorts each numbering
//! ascending, after which [`IdPool::next`] hands them out smallest first. In a
//! full binary tree a rebuilt subtree with the same leaves needs exactly as
//! many ids of every numbering as the retired one held.

use crate::node::{LocalId, Node, Numbering};

#[derive(Debug, Default)]
pub(crate) struct IdPool {
    node_ids: Vec<usize>,
    leaf_ids: Vec<usize>,
    inner_ids: Vec<usize>,
    // One cursor per numbering; `None` while collecting.
    cursors: Option<[usize; 3]>,
}

#[inline]
fn slot(numbering: Numbering) -> usize {
    match numbering {
        Numbering::Global => 0,
        Numbering::Leaf => 1,
        Numbering::Inner => 2,
    }
}

impl IdPool {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records the ids of a node that is about to be retired.
    pub(crate) fn reserve<D>(&mut self, node: &Node<D>) {
        debug_assert!(self.cursors.is_none(), "pool already closed");
        self.node_ids.push(node.id().index());
        match node.local_id() {
            LocalId::Leaf(id) => self.leaf_ids.push(id.index()),
            LocalId::Inner(id) => self.inner_ids.push(id.index()),
        }
    }

    pub(crate) fn close_for_reuse(&mut self) {
        self.node_ids.sort_unstable();
        self.leaf_ids.sort_unstable();
        self.inner_ids.sort_unstable();
        self.cursors = Some([0; 3]);
    }

    /// Next recycled id of `numbering`, `None` if the pool is still open or
    /// has run dry.
    pub(crate) fn next(&mut self, numbering: Numbering) -> Option<usize> {
        let cursors = self.cursors.as_mut()?;
        let ids = match numbering {
            Numbering::Global => &self.node_ids,
            Numbering::Leaf => &self.leaf_ids,
            Numbering::Inner => &self.inner_ids,
        };
        let cursor = &mut cursors[slot(numbering)];
        let id = ids.get(*cursor).copied()?;
        *cursor += 1;
        Some(id)
    }

    /// Ids of `numbering` not yet handed out.
    pub(crate) fn remaining(&self, numbering: Numbering) -> usize {
        let total = match numbering {
            Numbering::Global => self.node_ids.len(),
            Numbering::Leaf => self.leaf_ids.len(),
            Numbering::Inner => self.inner_ids.len(),
        };
        let used = self.cursors.map_or(0, |c| c[slot(numbering)]);
        total - used
    }
}
