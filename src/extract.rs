//! Carving reduced sub-structures out of a tree.

use tracing::debug;

use crate::error::Result;
use crate::node::{Node, NodeId, NodeKind, NodeRef, Numbering};
use crate::node_map::{DenseNodeMap, NodeMap};
use crate::tree::Tree;

/// A standalone tree extracted from another one, together with the origin of
/// each of its nodes.
#[derive(Debug)]
pub struct ExtractedTree<D> {
    tree: Tree<D>,
    origins: DenseNodeMap<NodeRef>,
}

impl<D> ExtractedTree<D> {
    #[inline]
    pub fn tree(&self) -> &Tree<D> {
        &self.tree
    }

    #[inline]
    pub fn into_tree(self) -> Tree<D> {
        self.tree
    }

    pub fn into_parts(self) -> (Tree<D>, DenseNodeMap<NodeRef>) {
        (self.tree, self.origins)
    }

    /// Map from extracted node ids to snapshots of their original nodes.
    #[inline]
    pub fn origin_map(&self) -> &DenseNodeMap<NodeRef> {
        &self.origins
    }

    /// The original node an extracted node stands for.
    pub fn original(&self, extracted: NodeId) -> Option<NodeRef> {
        self.origins.get(&extracted).ok().flatten().copied()
    }
}

impl<D: Clone> Tree<D> {
    /// Extracts the part of the subtree at `start` selected by `predicate`.
    ///
    /// Returns `Ok(None)` if `start` itself is not selected. Otherwise each
    /// visited node is handled by how many of its children are selected:
    ///
    /// - none: it becomes a leaf of the result;
    /// - one: the node is skipped and extraction continues with that child;
    /// - both: it becomes an inner node with the same discriminator.
    ///
    /// Skipping single branches keeps the result free of inner nodes with
    /// only one meaningful child.
    pub fn extract<P>(&self, start: NodeId, mut predicate: P) -> Result<Option<ExtractedTree<D>>>
    where
        P: FnMut(&Node<D>) -> bool,
    {
        if !predicate(self.try_node(start)?) {
            return Ok(None);
        }

        let mut extracted = Tree::with_config(self.config);
        let mut origins: Vec<Option<NodeRef>> = vec![None];
        let mut stack = Vec::with_capacity(self.config.stack_capacity);
        stack.push((start, extracted.root()));

        while let Some((mut this, target)) = stack.pop() {
            loop {
                let node = &self.nodes[this.0];
                let (discriminator, selected) = match &node.kind {
                    NodeKind::Leaf { .. } => (None, [None, None]),
                    NodeKind::Inner {
                        discriminator,
                        children,
                        ..
                    } => {
                        let pick = |c: NodeId, p: &mut P| p(&self.nodes[c.0]).then_some(c);
                        let f = pick(children[0], &mut predicate);
                        let t = pick(children[1], &mut predicate);
                        (Some(discriminator), [f, t])
                    }
                };

                match (discriminator, selected) {
                    (Some(discriminator), [Some(f), Some(t)]) => {
                        origins[target.0] = Some(node.to_ref());
                        let [ef, et] = extracted.split(target, discriminator.clone())?;
                        origins.resize(extracted.num_nodes(), None);
                        stack.push((t, et));
                        stack.push((f, ef));
                        break;
                    }
                    (_, [Some(only), None]) | (_, [None, Some(only)]) => {
                        this = only;
                    }
                    _ => {
                        origins[target.0] = Some(node.to_ref());
                        break;
                    }
                }
            }
        }

        debug!(
            start = start.0,
            nodes = extracted.num_nodes(),
            leaves = extracted.num_leaves(),
            "extracted subtree"
        );
        Ok(Some(ExtractedTree {
            tree: extracted,
            origins: DenseNodeMap::new(Numbering::Global, 0, origins),
        }))
    }

    /// [`Tree::extract`] without the origin map.
    pub fn extract_tree<P>(&self, start: NodeId, predicate: P) -> Result<Option<Tree<D>>>
    where
        P: FnMut(&Node<D>) -> bool,
    {
        Ok(self.extract(start, predicate)?.map(ExtractedTree::into_tree))
    }
}
