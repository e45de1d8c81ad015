//! The discrimination tree itself.
//!
//! A [`Tree`] owns every node in an arena indexed by [`NodeId`], plus two
//! dense side tables mapping [`LeafId`]s and [`InnerId`]s back to nodes. The
//! tree starts as a single leaf and grows only through splits, so it is always
//! a full binary tree: `num_inner_nodes() == num_leaves() - 1`.

use std::ops::Index;

use tracing::{debug, trace};

use crate::config::TreeConfig;
use crate::error::{DTreeError, Result};
use crate::node::{InnerId, LeafId, Node, NodeId, NodeKind, Numbering};
use crate::node_map::GrowableNodeMap;

/// A binary discrimination tree over discriminators of type `D`.
pub struct Tree<D> {
    pub(crate) nodes: Vec<Node<D>>,
    pub(crate) leaves: Vec<NodeId>,
    pub(crate) inner_nodes: Vec<NodeId>,
    pub(crate) root: NodeId,
    pub(crate) config: TreeConfig,
}

/// Where two nodes meet: their least common ancestor and the labels of the
/// branches leading from it towards each node (`None` when the node is the
/// ancestor itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Separation {
    pub lca: NodeId,
    pub towards_a: Option<bool>,
    pub towards_b: Option<bool>,
}

impl<D> Tree<D> {
    /// A tree consisting of a single leaf.
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    pub fn with_config(config: TreeConfig) -> Self {
        let root = NodeId(0);
        let mut nodes = Vec::with_capacity(config.initial_capacity);
        nodes.push(Node::leaf(root, None, 0, LeafId(0)));
        Self {
            nodes,
            leaves: vec![root],
            inner_nodes: Vec::new(),
            root,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The node with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this tree.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node<D> {
        &self.nodes[id.0]
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node<D>> {
        self.nodes.get(id.0)
    }

    #[inline]
    pub fn try_node(&self, id: NodeId) -> Result<&Node<D>> {
        self.get(id).ok_or(DTreeError::UnknownNode { node: id })
    }

    pub fn leaf(&self, id: LeafId) -> Option<&Node<D>> {
        self.leaves.get(id.0).map(|&n| &self.nodes[n.0])
    }

    pub fn inner_node(&self, id: InnerId) -> Option<&Node<D>> {
        self.inner_nodes.get(id.0).map(|&n| &self.nodes[n.0])
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn num_leaves(&self) -> usize {
        self.leaves.len()
    }

    #[inline]
    pub fn num_inner_nodes(&self) -> usize {
        self.inner_nodes.len()
    }

    /// Number of nodes carrying an id of `numbering`.
    #[inline]
    pub fn count(&self, numbering: Numbering) -> usize {
        match numbering {
            Numbering::Global => self.num_nodes(),
            Numbering::Leaf => self.num_leaves(),
            Numbering::Inner => self.num_inner_nodes(),
        }
    }

    /// All nodes, ordered by node id.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &Node<D>> + '_ {
        self.nodes.iter()
    }

    /// All leaves, ordered by leaf id.
    pub fn leaves(&self) -> impl ExactSizeIterator<Item = &Node<D>> + '_ {
        self.leaves.iter().map(move |&n| &self.nodes[n.0])
    }

    /// All inner nodes, ordered by inner id.
    pub fn inner_nodes(&self) -> impl ExactSizeIterator<Item = &Node<D>> + '_ {
        self.inner_nodes.iter().map(move |&n| &self.nodes[n.0])
    }

    #[inline]
    fn parent_of(&self, id: NodeId) -> NodeId {
        self.nodes[id.0].parent.expect("non-root node has a parent")
    }

    fn push_leaf(&mut self, parent: NodeId, leaf_id: LeafId) -> NodeId {
        let id = NodeId(self.nodes.len());
        let depth = self.nodes[parent.0].depth + 1;
        self.nodes.push(Node::leaf(id, Some(parent), depth, leaf_id));
        id
    }

    // =========================================================================
    // Splitting
    // =========================================================================

    /// Splits `leaf` with `discriminator`; the `false` child keeps the leaf id.
    ///
    /// Returns `[false child, true child]`.
    pub fn split(&mut self, leaf: NodeId, discriminator: D) -> Result<[NodeId; 2]> {
        self.split_with_replacement(leaf, discriminator, false)
    }

    /// Splits `leaf`, turning it into an inner node with two fresh leaf
    /// children.
    ///
    /// The child labelled `replacement_label` takes over the leaf id of `leaf`,
    /// so callers tracking leaves by leaf id see it continue there. The other
    /// child gets the next unused leaf id. Both children get fresh node ids;
    /// `leaf` keeps its node id and receives a fresh inner id.
    pub fn split_with_replacement(
        &mut self,
        leaf: NodeId,
        discriminator: D,
        replacement_label: bool,
    ) -> Result<[NodeId; 2]> {
        let old_leaf_id = self
            .try_node(leaf)?
            .leaf_id()
            .ok_or(DTreeError::NotALeaf { node: leaf })?;

        let replacement = self.push_leaf(leaf, old_leaf_id);
        self.leaves[old_leaf_id.0] = replacement;
        let fresh = self.push_leaf(leaf, LeafId(self.leaves.len()));
        self.leaves.push(fresh);

        let children = if replacement_label {
            [fresh, replacement]
        } else {
            [replacement, fresh]
        };
        let inner_id = InnerId(self.inner_nodes.len());
        self.nodes[leaf.0].make_inner(inner_id, discriminator, children)?;
        self.inner_nodes.push(leaf);

        trace!(
            node = leaf.0,
            inner_id = inner_id.0,
            false_child = children[0].0,
            true_child = children[1].0,
            "split leaf"
        );
        Ok(children)
    }

    /// Grows a copy of `other`'s subtree at `other_root` below `leaf`.
    ///
    /// `transformer` is applied exactly once to each discriminator copied.
    /// Returns a map from the global ids of `other` to the corresponding
    /// nodes of this tree; only nodes of the copied subtree have entries.
    pub fn split_by_tree<E, F>(
        &mut self,
        leaf: NodeId,
        other: &Tree<E>,
        other_root: NodeId,
        mut transformer: F,
    ) -> Result<GrowableNodeMap<NodeId>>
    where
        F: FnMut(&E) -> D,
    {
        other.try_node(other_root)?;
        self.graft_from(leaf, other_root, other.num_nodes(), |_, src| {
            match &other.nodes[src.0].kind {
                NodeKind::Inner {
                    discriminator,
                    children,
                    ..
                } => Some((transformer(discriminator), *children)),
                NodeKind::Leaf { .. } => None,
            }
        })
    }

    /// [`Tree::split_by_tree`] with this tree as the source.
    ///
    /// `leaf` may lie inside the copied subtree: the result is the same as if
    /// the subtree had been copied before any split took place.
    pub fn split_by_own_subtree<F>(
        &mut self,
        leaf: NodeId,
        subtree_root: NodeId,
        mut transformer: F,
    ) -> Result<GrowableNodeMap<NodeId>>
    where
        F: FnMut(&D) -> D,
    {
        self.try_node(subtree_root)?;
        let source_len = self.num_nodes();
        self.graft_from(leaf, subtree_root, source_len, |this, src| {
            // `leaf` was still a leaf when the copy began.
            if src == leaf {
                return None;
            }
            match &this.nodes[src.0].kind {
                NodeKind::Inner {
                    discriminator,
                    children,
                    ..
                } => Some((transformer(discriminator), *children)),
                NodeKind::Leaf { .. } => None,
            }
        })
    }

    /// Copies the whole of `other` below `leaf`, keeping its discriminators.
    pub fn split_like(&mut self, leaf: NodeId, other: &Tree<D>) -> Result<GrowableNodeMap<NodeId>>
    where
        D: Clone,
    {
        self.split_by_tree(leaf, other, other.root(), D::clone)
    }

    /// Shared descent of the subtree-copying splits. `read` yields the
    /// (already transformed) discriminator and children of a source node, or
    /// `None` if it is to be treated as a leaf. It is called before the
    /// matching node of this tree is split, so source structure is always read
    /// ahead of any mutation at that point.
    fn graft_from<F>(
        &mut self,
        leaf: NodeId,
        source_root: NodeId,
        source_len: usize,
        mut read: F,
    ) -> Result<GrowableNodeMap<NodeId>>
    where
        F: FnMut(&Self, NodeId) -> Option<(D, [NodeId; 2])>,
    {
        if !self.try_node(leaf)?.is_leaf() {
            return Err(DTreeError::NotALeaf { node: leaf });
        }

        let mut mapping = GrowableNodeMap::with_known_len(Numbering::Global, source_len);
        let mut stack: Vec<(NodeId, NodeId)> = Vec::with_capacity(self.config.stack_capacity);
        stack.push((leaf, source_root));

        let mut splits = 0usize;
        while let Some((this, src)) = stack.pop() {
            mapping.put_index(src.0, this);
            if let Some((discriminator, [src_false, src_true])) = read(&*self, src) {
                let [this_false, this_true] = self.split(this, discriminator)?;
                splits += 1;
                stack.push((this_false, src_false));
                stack.push((this_true, src_true));
            }
        }

        debug!(leaf = leaf.0, source_root = source_root.0, splits, "grafted subtree");
        Ok(mapping)
    }

    // =========================================================================
    // Structural queries
    // =========================================================================

    /// The deepest node that is an ancestor of (or equal to) both `a` and `b`.
    pub fn least_common_ancestor(&self, a: NodeId, b: NodeId) -> Result<NodeId> {
        self.separation(a, b).map(|s| s.lca)
    }

    /// The least common ancestor of `a` and `b` along with the branch labels
    /// leading towards each of them.
    pub fn separation(&self, a: NodeId, b: NodeId) -> Result<Separation> {
        self.try_node(a)?;
        self.try_node(b)?;

        let mut curr_a = a;
        let mut curr_b = b;
        let mut prev_a = None;
        let mut prev_b = None;

        while self.nodes[curr_a.0].depth > self.nodes[curr_b.0].depth {
            prev_a = Some(curr_a);
            curr_a = self.parent_of(curr_a);
        }
        while self.nodes[curr_b.0].depth > self.nodes[curr_a.0].depth {
            prev_b = Some(curr_b);
            curr_b = self.parent_of(curr_b);
        }
        while curr_a != curr_b {
            prev_a = Some(curr_a);
            curr_a = self.parent_of(curr_a);
            prev_b = Some(curr_b);
            curr_b = self.parent_of(curr_b);
        }

        let lca = &self.nodes[curr_a.0];
        let label = |prev: Option<NodeId>| prev.map(|c| lca.true_child() == Some(c));
        Ok(Separation {
            lca: curr_a,
            towards_a: label(prev_a),
            towards_b: label(prev_b),
        })
    }

    /// The discriminator at the least common ancestor of `a` and `b`.
    pub fn separator(&self, a: NodeId, b: NodeId) -> Result<&D> {
        if a == b {
            return Err(DTreeError::IdenticalNodes { node: a });
        }
        let lca = self.least_common_ancestor(a, b)?;
        self.nodes[lca.0]
            .discriminator()
            .ok_or(DTreeError::NotInner { node: lca })
    }

    // =========================================================================
    // Sifting
    // =========================================================================

    fn descend<F>(&self, start: NodeId, mut choose: F) -> NodeId
    where
        F: FnMut(&D) -> bool,
    {
        let mut curr = start;
        while let NodeKind::Inner {
            discriminator,
            children,
            ..
        } = &self.nodes[curr.0].kind
        {
            curr = children[choose(discriminator) as usize];
        }
        curr
    }

    /// Descends from `start` to a leaf, following the branch `predicate`
    /// selects at each inner node.
    pub fn sift<P>(&self, start: NodeId, predicate: P) -> Result<NodeId>
    where
        P: FnMut(&D) -> bool,
    {
        self.try_node(start)?;
        Ok(self.descend(start, predicate))
    }

    /// [`Tree::sift`] from the root.
    pub fn sift_root<P>(&self, predicate: P) -> NodeId
    where
        P: FnMut(&D) -> bool,
    {
        self.descend(self.root, predicate)
    }

    /// Descends from `start`, evaluating each discriminator against `subject`.
    pub fn sift_with<X, E>(&self, start: NodeId, subject: &X, mut evaluator: E) -> Result<NodeId>
    where
        X: ?Sized,
        E: FnMut(&X, &D) -> bool,
    {
        self.try_node(start)?;
        Ok(self.descend(start, |d| evaluator(subject, d)))
    }

    // =========================================================================
    // Transformation
    // =========================================================================

    /// A structurally identical tree (same ids, same shape) whose
    /// discriminators are mapped through `transformer`, once per inner node.
    pub fn transform<E, F>(&self, mut transformer: F) -> Tree<E>
    where
        F: FnMut(&D) -> E,
    {
        let mut slots: Vec<Option<Node<E>>> = Vec::new();
        slots.resize_with(self.nodes.len(), || None);

        let mut stack = Vec::with_capacity(self.config.stack_capacity);
        stack.push(self.root);
        while let Some(id) = stack.pop() {
            let old = &self.nodes[id.0];
            let kind = match &old.kind {
                NodeKind::Leaf { leaf_id } => NodeKind::Leaf { leaf_id: *leaf_id },
                NodeKind::Inner {
                    inner_id,
                    discriminator,
                    children,
                } => {
                    stack.push(children[1]);
                    stack.push(children[0]);
                    NodeKind::Inner {
                        inner_id: *inner_id,
                        discriminator: transformer(discriminator),
                        children: *children,
                    }
                }
            };
            slots[id.0] = Some(Node {
                id,
                parent: old.parent,
                depth: old.depth,
                kind,
            });
        }

        let nodes: Vec<Node<E>> = slots.into_iter().flatten().collect();
        debug_assert_eq!(nodes.len(), self.nodes.len(), "every node is reachable from the root");
        debug!(nodes = nodes.len(), "transformed tree");

        Tree {
            nodes,
            leaves: self.leaves.clone(),
            inner_nodes: self.inner_nodes.clone(),
            root: self.root,
            config: self.config,
        }
    }

    /// An independent copy of this tree.
    pub fn deep_clone(&self) -> Self
    where
        D: Clone,
    {
        self.transform(D::clone)
    }
}

impl<D> Default for Tree<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Clone> Clone for Tree<D> {
    fn clone(&self) -> Self {
        self.deep_clone()
    }
}

impl<D> Index<NodeId> for Tree<D> {
    type Output = Node<D>;

    fn index(&self, id: NodeId) -> &Node<D> {
        self.node(id)
    }
}

impl<D: std::fmt::Debug> std::fmt::Debug for Tree<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("root", &self.root)
            .field("nodes", &self.nodes)
            .finish()
    }
}
