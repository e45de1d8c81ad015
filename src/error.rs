//! Error types for discrimination tree operations.
//!
//! Every variant describes a caller contract violation. Outcomes that are part
//! of normal use (a discriminator that does not separate anything, a node map
//! without an entry) are not errors and never show up here.

use thiserror::Error;

use crate::node::{NodeId, Numbering};

/// Result type for discrimination tree operations.
pub type Result<T> = std::result::Result<T, DTreeError>;

/// Errors raised when an operation is invoked outside of its contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DTreeError {
    /// The operation requires a leaf.
    #[error("node {node} is not a leaf")]
    NotALeaf { node: NodeId },

    /// The operation requires an inner node.
    #[error("node {node} is not an inner node")]
    NotInner { node: NodeId },

    /// A separator was requested for a node and itself.
    #[error("identical nodes cannot be separated (node {node})")]
    IdenticalNodes { node: NodeId },

    /// The id does not name a node of the tree.
    #[error("node {node} does not exist in this tree")]
    UnknownNode { node: NodeId },

    /// A key was asked for an index under a numbering it does not carry.
    #[error("expected a key with a {expected} id, found a {found} key")]
    NumberingMismatch {
        expected: Numbering,
        found: Numbering,
    },

    /// A node map was queried with an index beyond the tree size it knows of.
    #[error("{numbering} index {index} is out of range (known size {len})")]
    IndexOutOfRange {
        numbering: Numbering,
        index: usize,
        len: usize,
    },

    /// A marking was asked to mark an index below its window.
    #[error("index {index} lies below the marking window starting at {offset}")]
    BelowWindow { index: usize, offset: usize },

    /// A marking window can only move towards higher ids.
    #[error("marking window cannot move from offset {current} back to {requested}")]
    WindowRegression { current: usize, requested: usize },

    /// The operation is not defined for the given numbering.
    #[error("operation is not supported for {numbering} numbering")]
    UnsupportedNumbering { numbering: Numbering },

    /// The id pool ran dry while renumbering a rebuilt subtree.
    #[error("no recycled {numbering} ids left")]
    IdPoolExhausted { numbering: Numbering },
}
