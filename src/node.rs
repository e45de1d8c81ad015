//! Tree vertices and the identities they carry.
//!
//! Every node has a global [`NodeId`] plus a local id within its current kind:
//! a [`LeafId`] while it is a leaf, an [`InnerId`] once it has been split.
//! Nodes are owned by their tree's arena and refer to each other by id only.

use std::fmt;

use crate::error::{DTreeError, Result};

// =============================================================================
// Identifiers
// =============================================================================

/// Global identity of a node; indexes the tree's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

/// Dense id of a node among the leaves of its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LeafId(pub(crate) usize);

/// Dense id of a node among the inner nodes of its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InnerId(pub(crate) usize);

impl NodeId {
    #[inline]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl LeafId {
    #[inline]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl InnerId {
    #[inline]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for LeafId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "leaf#{}", self.0)
    }
}

impl fmt::Display for InnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inner#{}", self.0)
    }
}

/// Kind-local id of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalId {
    Leaf(LeafId),
    Inner(InnerId),
}

impl LocalId {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            LocalId::Leaf(id) => id.0,
            LocalId::Inner(id) => id.0,
        }
    }

    #[inline]
    pub fn numbering(self) -> Numbering {
        match self {
            LocalId::Leaf(_) => Numbering::Leaf,
            LocalId::Inner(_) => Numbering::Inner,
        }
    }
}

/// The numbering scheme under which a node is identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Numbering {
    /// Global node ids; covers every node.
    Global,
    /// Leaf-local ids; covers leaves only.
    Leaf,
    /// Inner-local ids; covers inner nodes only.
    Inner,
}

impl fmt::Display for Numbering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Numbering::Global => "global",
            Numbering::Leaf => "leaf",
            Numbering::Inner => "inner",
        })
    }
}

// =============================================================================
// Keys
// =============================================================================

/// Anything that can name a node under some numbering.
///
/// Node maps and markings are keyed through this trait, so a lookup can be made
/// with a borrowed [`Node`], a [`NodeRef`] snapshot, or a bare id.
pub trait NodeKey {
    /// Index of the key under `numbering`.
    ///
    /// Fails with [`DTreeError::NumberingMismatch`] if the key carries no id of
    /// that numbering (e.g. asking a leaf for its inner id).
    fn index_in(&self, numbering: Numbering) -> Result<usize>;
}

impl NodeKey for NodeId {
    fn index_in(&self, numbering: Numbering) -> Result<usize> {
        match numbering {
            Numbering::Global => Ok(self.0),
            expected => Err(DTreeError::NumberingMismatch {
                expected,
                found: Numbering::Global,
            }),
        }
    }
}

impl NodeKey for LeafId {
    fn index_in(&self, numbering: Numbering) -> Result<usize> {
        match numbering {
            Numbering::Leaf => Ok(self.0),
            expected => Err(DTreeError::NumberingMismatch {
                expected,
                found: Numbering::Leaf,
            }),
        }
    }
}

impl NodeKey for InnerId {
    fn index_in(&self, numbering: Numbering) -> Result<usize> {
        match numbering {
            Numbering::Inner => Ok(self.0),
            expected => Err(DTreeError::NumberingMismatch {
                expected,
                found: Numbering::Inner,
            }),
        }
    }
}

fn index_with_local(id: NodeId, local: LocalId, numbering: Numbering) -> Result<usize> {
    if numbering == Numbering::Global {
        return Ok(id.0);
    }
    if local.numbering() != numbering {
        return Err(DTreeError::NumberingMismatch {
            expected: numbering,
            found: local.numbering(),
        });
    }
    Ok(local.index())
}

/// Copyable snapshot of a node's identity.
///
/// Slots of retired nodes are reused by
/// [`Tree::replace_discriminator`](crate::Tree::replace_discriminator); a
/// `NodeRef` keeps describing the node it was taken from even after that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub id: NodeId,
    pub local: LocalId,
    pub depth: usize,
}

impl NodeRef {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.local, LocalId::Leaf(_))
    }

    #[inline]
    pub fn leaf_id(&self) -> Option<LeafId> {
        match self.local {
            LocalId::Leaf(id) => Some(id),
            LocalId::Inner(_) => None,
        }
    }

    #[inline]
    pub fn inner_id(&self) -> Option<InnerId> {
        match self.local {
            LocalId::Inner(id) => Some(id),
            LocalId::Leaf(_) => None,
        }
    }
}

impl NodeKey for NodeRef {
    fn index_in(&self, numbering: Numbering) -> Result<usize> {
        index_with_local(self.id, self.local, numbering)
    }
}

// =============================================================================
// Node
// =============================================================================

/// What a node currently is. A node is a leaf iff it has no children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind<D> {
    Leaf {
        leaf_id: LeafId,
    },
    Inner {
        inner_id: InnerId,
        discriminator: D,
        /// `[false child, true child]`.
        children: [NodeId; 2],
    },
}

/// A vertex of a discrimination tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node<D> {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) depth: usize,
    pub(crate) kind: NodeKind<D>,
}

impl<D> Node<D> {
    pub(crate) fn leaf(id: NodeId, parent: Option<NodeId>, depth: usize, leaf_id: LeafId) -> Self {
        Self {
            id,
            parent,
            depth,
            kind: NodeKind::Leaf { leaf_id },
        }
    }

    /// Turns this leaf into an inner node. Legal exactly once per node.
    pub(crate) fn make_inner(
        &mut self,
        inner_id: InnerId,
        discriminator: D,
        children: [NodeId; 2],
    ) -> Result<()> {
        if !self.is_leaf() {
            return Err(DTreeError::NotALeaf { node: self.id });
        }
        self.kind = NodeKind::Inner {
            inner_id,
            discriminator,
            children,
        };
        Ok(())
    }

    pub(crate) fn set_child(&mut self, label: bool, child: NodeId) {
        match &mut self.kind {
            NodeKind::Inner { children, .. } => children[label as usize] = child,
            NodeKind::Leaf { .. } => debug_assert!(false, "leaves have no children"),
        }
    }

    pub(crate) fn replace_discriminator(&mut self, new: D) -> Option<D> {
        match &mut self.kind {
            NodeKind::Inner { discriminator, .. } => Some(std::mem::replace(discriminator, new)),
            NodeKind::Leaf { .. } => None,
        }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The parent of this node, `None` for the root.
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Distance from the root.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn kind(&self) -> &NodeKind<D> {
        &self.kind
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    #[inline]
    pub fn is_inner(&self) -> bool {
        matches!(self.kind, NodeKind::Inner { .. })
    }

    /// Whether this node has an id under `numbering`.
    #[inline]
    pub fn is_of(&self, numbering: Numbering) -> bool {
        match numbering {
            Numbering::Global => true,
            Numbering::Leaf => self.is_leaf(),
            Numbering::Inner => self.is_inner(),
        }
    }

    #[inline]
    pub fn local_id(&self) -> LocalId {
        match self.kind {
            NodeKind::Leaf { leaf_id } => LocalId::Leaf(leaf_id),
            NodeKind::Inner { inner_id, .. } => LocalId::Inner(inner_id),
        }
    }

    #[inline]
    pub fn leaf_id(&self) -> Option<LeafId> {
        match self.kind {
            NodeKind::Leaf { leaf_id } => Some(leaf_id),
            NodeKind::Inner { .. } => None,
        }
    }

    #[inline]
    pub fn inner_id(&self) -> Option<InnerId> {
        match self.kind {
            NodeKind::Inner { inner_id, .. } => Some(inner_id),
            NodeKind::Leaf { .. } => None,
        }
    }

    #[inline]
    pub fn discriminator(&self) -> Option<&D> {
        match &self.kind {
            NodeKind::Inner { discriminator, .. } => Some(discriminator),
            NodeKind::Leaf { .. } => None,
        }
    }

    /// `[false child, true child]`, returned by value.
    #[inline]
    pub fn children(&self) -> Option<[NodeId; 2]> {
        match self.kind {
            NodeKind::Inner { children, .. } => Some(children),
            NodeKind::Leaf { .. } => None,
        }
    }

    /// The child reached when the discriminator evaluates to `label`.
    #[inline]
    pub fn child(&self, label: bool) -> Option<NodeId> {
        self.children().map(|c| c[label as usize])
    }

    #[inline]
    pub fn false_child(&self) -> Option<NodeId> {
        self.child(false)
    }

    #[inline]
    pub fn true_child(&self) -> Option<NodeId> {
        self.child(true)
    }

    /// Snapshot of this node's identity.
    #[inline]
    pub fn to_ref(&self) -> NodeRef {
        NodeRef {
            id: self.id,
            local: self.local_id(),
            depth: self.depth,
        }
    }
}

impl<D> NodeKey for Node<D> {
    fn index_in(&self, numbering: Numbering) -> Result<usize> {
        index_with_local(self.id, self.local_id(), numbering)
    }
}
