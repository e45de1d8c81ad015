//! # dtree-rs
//!
//! In-memory binary discrimination trees.
//!
//! Inner nodes carry an opaque discriminator that routes a subject to their
//! `false` or `true` child; leaves are the classes subjects end up in. The tree
//! grows by splitting leaves, can be restructured by replacing discriminators,
//! and can be queried for where subjects land and what separates two leaves.
//!
//! Nodes live in an arena owned by the [`Tree`] and are named by a global
//! [`NodeId`] plus a local [`LeafId`] or [`InnerId`]. Node maps and markings
//! associate data with nodes outside of the tree.
//!
//! ## Example
//!
//! ```rust
//! use dtree_rs::Tree;
//!
//! // Discriminators are bit positions; a subject goes `true` if the bit is set.
//! let mut tree: Tree<u32> = Tree::new();
//! let root = tree.root();
//! let [_, odd] = tree.split(root, 0)?;
//! tree.split(odd, 1)?;
//! assert_eq!(tree.num_leaves(), 3);
//!
//! let has_bit = |subject: &u32, bit: &u32| (subject >> bit) & 1 == 1;
//! let three = tree.sift_with(root, &3, has_bit)?;
//! let two = tree.sift_with(root, &2, has_bit)?;
//! assert_eq!(tree.separator(three, two)?, &0);
//! # Ok::<(), dtree_rs::DTreeError>(())
//! ```

mod config;
mod error;
mod extract;
mod id_pool;
mod iter;
mod marking;
mod node;
mod node_map;
mod pair_list;
mod replace;
mod tree;
mod visit;

pub use config::TreeConfig;
pub use error::{DTreeError, Result};
pub use extract::ExtractedTree;
pub use iter::SubtreeNodes;
pub use marking::Marking;
pub use node::{InnerId, LeafId, LocalId, Node, NodeId, NodeKey, NodeKind, NodeRef, Numbering};
pub use node_map::{CompiledNodeMap, DenseNodeMap, GrowableNodeMap, NodeMap, SparseNodeMap};
pub use pair_list::NodePairList;
pub use replace::ReplaceOutcome;
pub use tree::{Separation, Tree};
pub use visit::{ChildData, Visitor};

#[cfg(test)]
mod proptests;
