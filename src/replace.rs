//! Swapping the discriminator of an inner node and re-routing its subtree.
//!
//! Replacing the discriminator at `n` decides afresh, for every leaf below
//! `n`, which side it belongs on. The leaves routed to each side are carved out
//! with [`Tree::extract`] and rebuilt as the new `false` and `true` branches.
//! The rebuilt nodes reuse the ids of the nodes they replace, so the tree
//! keeps its size and id ranges. The caller gets a map from every new node to
//! the node that was at its place before.

use tracing::debug;

use crate::error::{DTreeError, Result};
use crate::extract::ExtractedTree;
use crate::id_pool::IdPool;
use crate::marking::Marking;
use crate::node::{InnerId, LeafId, LocalId, Node, NodeId, NodeKind, NodeRef, Numbering};
use crate::node_map::{CompiledNodeMap, NodeMap};
use crate::pair_list::NodePairList;
use crate::tree::Tree;

/// Result of [`Tree::replace_discriminator`].
#[derive(Debug)]
pub enum ReplaceOutcome<D> {
    /// The subtree was rebuilt. Maps the global id of every new node below
    /// the replaced one to a snapshot of the node it took the place of.
    Replaced(CompiledNodeMap<NodeRef>),
    /// Every leaf went to the same side, so the discriminator would not split
    /// anything. The tree is unchanged and the discriminator is handed back.
    NotSeparating(D),
}

impl<D> ReplaceOutcome<D> {
    #[inline]
    pub fn is_replaced(&self) -> bool {
        matches!(self, ReplaceOutcome::Replaced(_))
    }

    pub fn into_map(self) -> Option<CompiledNodeMap<NodeRef>> {
        match self {
            ReplaceOutcome::Replaced(map) => Some(map),
            ReplaceOutcome::NotSeparating(_) => None,
        }
    }
}

fn take(pool: &mut IdPool, numbering: Numbering) -> Result<usize> {
    pool.next(numbering)
        .ok_or(DTreeError::IdPoolExhausted { numbering })
}

impl<D: Clone> Tree<D> {
    /// Replaces the discriminator of inner node `n` with `new_discriminator`.
    ///
    /// `leaf_evaluator` is called once for every leaf below `n` and decides
    /// which side of the new discriminator it falls on. Node, leaf and inner
    /// counts are unchanged; every node strictly below `n` is replaced.
    ///
    /// If all leaves go to the same side nothing is modified and
    /// [`ReplaceOutcome::NotSeparating`] is returned.
    pub fn replace_discriminator<E>(
        &mut self,
        n: NodeId,
        new_discriminator: D,
        mut leaf_evaluator: E,
    ) -> Result<ReplaceOutcome<D>>
    where
        E: FnMut(&Node<D>, &D) -> bool,
    {
        let [n_false, n_true] = self
            .try_node(n)?
            .children()
            .ok_or(DTreeError::NotInner { node: n })?;

        // Children always have greater ids than their parent, so a window
        // starting at `n` covers the whole subtree. Seeding `n` stops
        // propagation there.
        let mut sides = [
            Marking::with_offset(self, Numbering::Global, n.0),
            Marking::with_offset(self, Numbering::Global, n.0),
        ];
        for side in &mut sides {
            side.mark(&n)?;
        }

        let mut pool = IdPool::new();
        let mut stack = Vec::with_capacity(self.config.stack_capacity);
        stack.push(n_true);
        stack.push(n_false);
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            pool.reserve(node);
            match node.children() {
                Some([f, t]) => {
                    stack.push(t);
                    stack.push(f);
                }
                None => {
                    let label = leaf_evaluator(node, &new_discriminator);
                    sides[label as usize].mark_and_propagate(&*self, id)?;
                }
            }
        }

        if sides.iter().any(|side| side.len() <= 1) {
            debug!(
                node = n.0,
                false_marked = sides[0].len(),
                true_marked = sides[1].len(),
                "discriminator does not separate subtree"
            );
            return Ok(ReplaceOutcome::NotSeparating(new_discriminator));
        }
        pool.close_for_reuse();

        let [false_marks, true_marks] = &sides;
        let branches = [
            self.extract(n, |x| false_marks.is_marked(x))?,
            self.extract(n, |x| true_marks.is_marked(x))?,
        ];

        // Number both branches before touching the arena, so running out of
        // ids cannot leave a half-rebuilt subtree behind.
        let mut numbered = Vec::with_capacity(2);
        for branch in branches {
            let branch = branch.expect("n is marked on both sides");
            let ids = self.number_branch(&branch, &mut pool)?;
            numbered.push((branch, ids));
        }

        let mut pairs = NodePairList::with_threshold(Numbering::Global, self.config.dense_threshold);
        let depth = self.nodes[n.0].depth + 1;
        for (label, (branch, ids)) in numbered.into_iter().enumerate() {
            let root = self.install_branch(n, depth, branch, &ids, &mut pairs)?;
            self.nodes[n.0].set_child(label == 1, root);
        }
        self.nodes[n.0].replace_discriminator(new_discriminator);

        debug!(
            node = n.0,
            replaced = pairs.len(),
            left_over = pool.remaining(Numbering::Global),
            "replaced discriminator"
        );
        Ok(ReplaceOutcome::Replaced(pairs.into_node_map()))
    }

    /// Takes recycled ids for every node of `branch`, in pre-order with the
    /// `false` child first. Indexed by the node ids of the extracted tree.
    fn number_branch(
        &self,
        branch: &ExtractedTree<D>,
        pool: &mut IdPool,
    ) -> Result<Vec<(NodeId, LocalId)>> {
        let tree = branch.tree();
        let mut ids: Vec<Option<(NodeId, LocalId)>> = vec![None; tree.num_nodes()];
        let mut stack = Vec::with_capacity(self.config.stack_capacity);
        stack.push(tree.root());
        while let Some(e) = stack.pop() {
            let id = NodeId(take(pool, Numbering::Global)?);
            let local = match &tree.nodes[e.0].kind {
                NodeKind::Leaf { .. } => LocalId::Leaf(LeafId(take(pool, Numbering::Leaf)?)),
                NodeKind::Inner { children, .. } => {
                    stack.push(children[1]);
                    stack.push(children[0]);
                    LocalId::Inner(InnerId(take(pool, Numbering::Inner)?))
                }
            };
            ids[e.0] = Some((id, local));
        }
        Ok(ids
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .expect("extracted trees are fully reachable from their root"))
    }

    /// Writes the nodes of `branch` into the arena below `parent` under the ids
    /// chosen by [`Tree::number_branch`]. Returns the id of the branch root.
    fn install_branch(
        &mut self,
        parent: NodeId,
        depth: usize,
        branch: ExtractedTree<D>,
        ids: &[(NodeId, LocalId)],
        pairs: &mut NodePairList<NodeRef>,
    ) -> Result<NodeId> {
        let (tree, origins) = branch.into_parts();
        let root = ids[tree.root().0].0;

        for e in tree.nodes {
            let (id, local) = ids[e.id.0];
            let kind = match (e.kind, local) {
                (NodeKind::Leaf { .. }, LocalId::Leaf(leaf_id)) => {
                    self.leaves[leaf_id.0] = id;
                    NodeKind::Leaf { leaf_id }
                }
                (
                    NodeKind::Inner {
                        discriminator,
                        children,
                        ..
                    },
                    LocalId::Inner(inner_id),
                ) => {
                    self.inner_nodes[inner_id.0] = id;
                    NodeKind::Inner {
                        inner_id,
                        discriminator,
                        children: children.map(|c| ids[c.0].0),
                    }
                }
                _ => unreachable!("local ids are taken by node kind"),
            };

            let origin = *origins
                .get(&e.id)?
                .expect("every extracted node has an origin");
            pairs.add_pair(&id, origin)?;

            self.nodes[id.0] = Node {
                id,
                parent: Some(e.parent.map_or(parent, |p| ids[p.0].0)),
                depth: depth + e.depth,
                kind,
            };
        }
        Ok(root)
    }
}
