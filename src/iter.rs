//! Pre-order iteration over subtrees.

use std::iter::FusedIterator;

use crate::error::Result;
use crate::node::{Node, NodeId, Numbering};
use crate::tree::Tree;

/// Pre-order iterator over the nodes of a subtree that carry an id of the
/// requested [`Numbering`].
///
/// Children are visited `false` first, unless the iterator was turned around
/// with [`SubtreeNodes::reversed`].
pub struct SubtreeNodes<'a, D> {
    tree: &'a Tree<D>,
    stack: Vec<NodeId>,
    numbering: Numbering,
    reversed: bool,
}

impl<'a, D> SubtreeNodes<'a, D> {
    fn new(tree: &'a Tree<D>, root: NodeId, numbering: Numbering) -> Self {
        let mut stack = Vec::with_capacity(tree.config.stack_capacity);
        stack.push(root);
        Self {
            tree,
            stack,
            numbering,
            reversed: false,
        }
    }

    /// Visits `true` children before `false` children.
    pub fn reversed(mut self) -> Self {
        self.reversed = !self.reversed;
        self
    }
}

impl<'a, D> Iterator for SubtreeNodes<'a, D> {
    type Item = &'a Node<D>;

    fn next(&mut self) -> Option<&'a Node<D>> {
        while let Some(id) = self.stack.pop() {
            let node = &self.tree.nodes[id.0];
            if let Some([f, t]) = node.children() {
                if self.reversed {
                    self.stack.push(f);
                    self.stack.push(t);
                } else {
                    self.stack.push(t);
                    self.stack.push(f);
                }
            }
            if node.is_of(self.numbering) {
                return Some(node);
            }
        }
        None
    }
}

impl<D> FusedIterator for SubtreeNodes<'_, D> {}

impl<D> Tree<D> {
    /// Nodes of the subtree at `root` that carry a `numbering` id.
    pub fn subtree_nodes(&self, root: NodeId, numbering: Numbering) -> Result<SubtreeNodes<'_, D>> {
        self.try_node(root)?;
        Ok(SubtreeNodes::new(self, root, numbering))
    }

    #[inline]
    pub fn subtree_leaves(&self, root: NodeId) -> Result<SubtreeNodes<'_, D>> {
        self.subtree_nodes(root, Numbering::Leaf)
    }

    #[inline]
    pub fn subtree_inner_nodes(&self, root: NodeId) -> Result<SubtreeNodes<'_, D>> {
        self.subtree_nodes(root, Numbering::Inner)
    }
}
