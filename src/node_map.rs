//! Associating values with nodes, independent of the tree's own storage.
//!
//! A node map is keyed by the index of a node under one [`Numbering`]. Three
//! representations exist:
//!
//! - [`DenseNodeMap`]: an array with an offset, for contiguous keys.
//! - [`SparseNodeMap`]: a hash map, for scattered keys.
//! - [`GrowableNodeMap`]: a mutable array that remembers the size of the tree
//!   it was made for and re-reads it when a key exceeds that size.
//!
//! A map describes one revision of a tree. Structural mutation can recycle ids
//! (see [`Tree::replace_discriminator`](crate::Tree::replace_discriminator)),
//! after which an old map answers for whatever node now holds the id.

use std::collections::HashMap;

use crate::error::{DTreeError, Result};
use crate::node::{NodeKey, Numbering};
use crate::tree::Tree;

/// Read access to a node-keyed association.
pub trait NodeMap<V> {
    /// The numbering whose indices key this map.
    fn numbering(&self) -> Numbering;

    /// The value stored for `key`, `Ok(None)` if there is none.
    ///
    /// Fails if `key` has no index under [`NodeMap::numbering`], or if the
    /// index is known to be out of range for the tree the map was built for.
    fn get<K: NodeKey + ?Sized>(&self, key: &K) -> Result<Option<&V>>;

    /// Number of entries with a value.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains<K: NodeKey + ?Sized>(&self, key: &K) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

// =============================================================================
// Dense
// =============================================================================

/// Read-only array map covering indices `offset..offset + values.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseNodeMap<V> {
    values: Vec<Option<V>>,
    offset: usize,
    numbering: Numbering,
    len: usize,
}

impl<V> DenseNodeMap<V> {
    pub fn new(numbering: Numbering, offset: usize, values: Vec<Option<V>>) -> Self {
        let len = values.iter().filter(|v| v.is_some()).count();
        Self {
            values,
            offset,
            numbering,
            len,
        }
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of slots, occupied or not.
    #[inline]
    pub fn span(&self) -> usize {
        self.values.len()
    }

    /// `(index, value)` pairs in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &V)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(move |(i, v)| v.as_ref().map(|v| (i + self.offset, v)))
    }
}

impl<V> NodeMap<V> for DenseNodeMap<V> {
    fn numbering(&self) -> Numbering {
        self.numbering
    }

    fn get<K: NodeKey + ?Sized>(&self, key: &K) -> Result<Option<&V>> {
        let idx = key.index_in(self.numbering)?;
        if idx < self.offset {
            return Ok(None);
        }
        Ok(self.values.get(idx - self.offset).and_then(Option::as_ref))
    }

    fn len(&self) -> usize {
        self.len
    }
}

// =============================================================================
// Sparse
// =============================================================================

/// Read-only hash map keyed by node index.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseNodeMap<V> {
    entries: HashMap<usize, V>,
    numbering: Numbering,
}

impl<V> SparseNodeMap<V> {
    /// Builds a map from `(key, value)` pairs; later pairs win.
    pub fn from_entries<K, I>(numbering: Numbering, entries: I) -> Result<Self>
    where
        K: NodeKey,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = HashMap::new();
        for (key, value) in entries {
            map.insert(key.index_in(numbering)?, value);
        }
        Ok(Self {
            entries: map,
            numbering,
        })
    }

    pub(crate) fn from_indexed(numbering: Numbering, entries: HashMap<usize, V>) -> Self {
        Self { entries, numbering }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &V)> + '_ {
        self.entries.iter().map(|(&k, v)| (k, v))
    }
}

impl<V> NodeMap<V> for SparseNodeMap<V> {
    fn numbering(&self) -> Numbering {
        self.numbering
    }

    fn get<K: NodeKey + ?Sized>(&self, key: &K) -> Result<Option<&V>> {
        let idx = key.index_in(self.numbering)?;
        Ok(self.entries.get(&idx))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

// =============================================================================
// Growable
// =============================================================================

/// Mutable array map tied to the size of a tree.
///
/// The map remembers how many nodes (of its numbering) the tree had when it
/// last looked. Keys beyond that are rejected by [`NodeMap::get`]; the
/// `*_fresh` and `insert` methods take the tree and re-read its size first,
/// so a map created before the tree grew keeps working.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowableNodeMap<V> {
    values: Vec<Option<V>>,
    known_len: usize,
    numbering: Numbering,
    len: usize,
}

impl<V> GrowableNodeMap<V> {
    /// An empty map sized for the current state of `tree`.
    pub fn new<D>(tree: &Tree<D>, numbering: Numbering) -> Self {
        Self::with_known_len(numbering, tree.count(numbering))
    }

    pub(crate) fn with_known_len(numbering: Numbering, known_len: usize) -> Self {
        let mut values = Vec::new();
        values.resize_with(known_len, || None);
        Self {
            values,
            known_len,
            numbering,
            len: 0,
        }
    }

    /// The tree size this map currently assumes.
    #[inline]
    pub fn known_len(&self) -> usize {
        self.known_len
    }

    /// Re-reads the size of `tree`.
    pub fn refresh<D>(&mut self, tree: &Tree<D>) {
        self.known_len = tree.count(self.numbering);
    }

    fn checked_index<K, D>(&mut self, tree: &Tree<D>, key: &K) -> Result<usize>
    where
        K: NodeKey + ?Sized,
    {
        let idx = key.index_in(self.numbering)?;
        if idx >= self.known_len {
            self.refresh(tree);
            if idx >= self.known_len {
                return Err(DTreeError::IndexOutOfRange {
                    numbering: self.numbering,
                    index: idx,
                    len: self.known_len,
                });
            }
        }
        Ok(idx)
    }

    /// Like [`NodeMap::get`], but re-reads the tree size before rejecting a key.
    pub fn get_fresh<K, D>(&mut self, tree: &Tree<D>, key: &K) -> Result<Option<&V>>
    where
        K: NodeKey + ?Sized,
    {
        let idx = self.checked_index(tree, key)?;
        Ok(self.values.get(idx).and_then(Option::as_ref))
    }

    /// Stores `value` for `key`, returning the previous value.
    pub fn insert<K, D>(&mut self, tree: &Tree<D>, key: &K, value: V) -> Result<Option<V>>
    where
        K: NodeKey + ?Sized,
    {
        let idx = self.checked_index(tree, key)?;
        Ok(self.put_index(idx, value))
    }

    pub fn remove<K, D>(&mut self, tree: &Tree<D>, key: &K) -> Result<Option<V>>
    where
        K: NodeKey + ?Sized,
    {
        let idx = self.checked_index(tree, key)?;
        let old = self.values.get_mut(idx).and_then(Option::take);
        if old.is_some() {
            self.len -= 1;
        }
        Ok(old)
    }

    /// Stores by raw index; the caller guarantees `idx < known_len`.
    pub(crate) fn put_index(&mut self, idx: usize, value: V) -> Option<V> {
        debug_assert!(idx < self.known_len);
        if idx >= self.values.len() {
            let grown = (self.values.len() * 3 / 2).max(self.known_len).max(idx + 1);
            self.values.resize_with(grown, || None);
        }
        let old = self.values[idx].replace(value);
        if old.is_none() {
            self.len += 1;
        }
        old
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &V)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (i, v)))
    }

    /// Freezes the current contents into a read-only dense map.
    pub fn into_dense(self) -> DenseNodeMap<V> {
        DenseNodeMap::new(self.numbering, 0, self.values)
    }
}

impl<V> NodeMap<V> for GrowableNodeMap<V> {
    fn numbering(&self) -> Numbering {
        self.numbering
    }

    fn get<K: NodeKey + ?Sized>(&self, key: &K) -> Result<Option<&V>> {
        let idx = key.index_in(self.numbering)?;
        if idx >= self.known_len {
            return Err(DTreeError::IndexOutOfRange {
                numbering: self.numbering,
                index: idx,
                len: self.known_len,
            });
        }
        Ok(self.values.get(idx).and_then(Option::as_ref))
    }

    fn len(&self) -> usize {
        self.len
    }
}

// =============================================================================
// Compiled
// =============================================================================

/// A read-only map whose representation was chosen by key density.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledNodeMap<V> {
    Dense(DenseNodeMap<V>),
    Sparse(SparseNodeMap<V>),
}

impl<V> CompiledNodeMap<V> {
    #[inline]
    pub fn is_dense(&self) -> bool {
        matches!(self, CompiledNodeMap::Dense(_))
    }

    /// `(index, value)` pairs; ascending for the dense form, unordered otherwise.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (usize, &V)> + '_> {
        match self {
            CompiledNodeMap::Dense(m) => Box::new(m.iter()),
            CompiledNodeMap::Sparse(m) => Box::new(m.iter()),
        }
    }
}

impl<V> NodeMap<V> for CompiledNodeMap<V> {
    fn numbering(&self) -> Numbering {
        match self {
            CompiledNodeMap::Dense(m) => m.numbering(),
            CompiledNodeMap::Sparse(m) => m.numbering(),
        }
    }

    fn get<K: NodeKey + ?Sized>(&self, key: &K) -> Result<Option<&V>> {
        match self {
            CompiledNodeMap::Dense(m) => m.get(key),
            CompiledNodeMap::Sparse(m) => m.get(key),
        }
    }

    fn len(&self) -> usize {
        match self {
            CompiledNodeMap::Dense(m) => m.len(),
            CompiledNodeMap::Sparse(m) => m.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{LeafId, NodeId};

    #[test]
    fn test_dense_offset() {
        let m = DenseNodeMap::new(Numbering::Global, 3, vec![Some('a'), None, Some('c')]);
        assert_eq!(m.len(), 2);
        assert_eq!(m.get(&NodeId::new(0)), Ok(None));
        assert_eq!(m.get(&NodeId::new(3)), Ok(Some(&'a')));
        assert_eq!(m.get(&NodeId::new(4)), Ok(None));
        assert_eq!(m.get(&NodeId::new(5)), Ok(Some(&'c')));
        assert_eq!(m.get(&NodeId::new(6)), Ok(None));
        let entries: Vec<_> = m.iter().collect();
        assert_eq!(entries, vec![(3, &'a'), (5, &'c')]);
    }

    #[test]
    fn test_dense_rejects_wrong_numbering() {
        let m = DenseNodeMap::new(Numbering::Leaf, 0, vec![Some(1u8)]);
        assert_eq!(m.get(&LeafId::new(0)), Ok(Some(&1)));
        assert!(matches!(
            m.get(&NodeId::new(0)),
            Err(DTreeError::NumberingMismatch { .. })
        ));
    }

    #[test]
    fn test_sparse() {
        let m = SparseNodeMap::from_entries(
            Numbering::Global,
            vec![(NodeId::new(100), "x"), (NodeId::new(7), "y")],
        )
        .unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m.get(&NodeId::new(100)), Ok(Some(&"x")));
        assert_eq!(m.get(&NodeId::new(7)), Ok(Some(&"y")));
        assert_eq!(m.get(&NodeId::new(8)), Ok(None));
        assert_eq!(m.contains(&NodeId::new(7)), Ok(true));
    }

    #[test]
    fn test_growable_follows_tree() {
        let mut tree: Tree<&str> = Tree::new();
        let mut m: GrowableNodeMap<u32> = GrowableNodeMap::new(&tree, Numbering::Global);
        assert_eq!(m.known_len(), 1);

        let root = tree.root();
        m.insert(&tree, &root, 10).unwrap();
        let [f, t] = tree.split(root, "d").unwrap();

        // Stale until refreshed.
        assert!(matches!(
            m.get(&t),
            Err(DTreeError::IndexOutOfRange { index: 2, len: 1, .. })
        ));
        assert_eq!(m.get_fresh(&tree, &t), Ok(None));
        assert_eq!(m.known_len(), 3);

        assert_eq!(m.insert(&tree, &f, 11), Ok(None));
        assert_eq!(m.insert(&tree, &f, 12), Ok(Some(11)));
        assert_eq!(m.get(&f), Ok(Some(&12)));
        assert_eq!(m.len(), 2);
        assert_eq!(m.remove(&tree, &f), Ok(Some(12)));
        assert_eq!(m.len(), 1);

        assert!(m.insert(&tree, &NodeId::new(3), 0).is_err());
    }

    #[test]
    fn test_growable_leaf_numbering() {
        let mut tree: Tree<u8> = Tree::new();
        let mut m: GrowableNodeMap<&str> = GrowableNodeMap::new(&tree, Numbering::Leaf);
        let [_, t] = tree.split(tree.root(), 1).unwrap();
        let leaf = tree.node(t).leaf_id().unwrap();
        m.insert(&tree, &leaf, "new").unwrap();
        assert_eq!(m.get(tree.node(t)), Ok(Some(&"new")));
        assert!(m.get(tree.node(tree.root())).is_err());

        let frozen = m.into_dense();
        assert_eq!(frozen.get(&leaf), Ok(Some(&"new")));
    }
}
