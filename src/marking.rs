//! Mutable node membership over one numbering.

use crate::error::{DTreeError, Result};
use crate::node::{NodeId, NodeKey, Numbering};
use crate::tree::Tree;

const WORD_BITS: usize = 64;

/// A bit set of nodes, indexed under one [`Numbering`].
///
/// A marking covers the window of indices starting at `offset`; indices below
/// it are never members. The window can be moved up with
/// [`Marking::advance_window`], which drops the bits that fall out of it and
/// keeps storage proportional to the live id range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marking {
    words: Vec<u64>,
    offset: usize,
    numbering: Numbering,
    marked: usize,
}

impl Marking {
    pub fn new<D>(tree: &Tree<D>, numbering: Numbering) -> Self {
        Self::with_offset(tree, numbering, 0)
    }

    /// A marking whose window starts at `offset`.
    pub fn with_offset<D>(tree: &Tree<D>, numbering: Numbering, offset: usize) -> Self {
        let span = tree.count(numbering).saturating_sub(offset);
        Self {
            words: Vec::with_capacity(span.div_ceil(WORD_BITS)),
            offset,
            numbering,
            marked: 0,
        }
    }

    #[inline]
    pub fn numbering(&self) -> Numbering {
        self.numbering
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of marked nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.marked
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.marked == 0
    }

    pub fn clear(&mut self) {
        self.words.clear();
        self.marked = 0;
    }

    #[inline]
    fn bit(&self, rel: usize) -> bool {
        self.words
            .get(rel / WORD_BITS)
            .is_some_and(|w| (w >> (rel % WORD_BITS)) & 1 != 0)
    }

    fn window_index<K: NodeKey + ?Sized>(&self, node: &K) -> Result<usize> {
        let idx = node.index_in(self.numbering)?;
        idx.checked_sub(self.offset).ok_or(DTreeError::BelowWindow {
            index: idx,
            offset: self.offset,
        })
    }

    /// Whether `node` is marked. Nodes outside the numbering or below the
    /// window are not members.
    pub fn is_marked<K: NodeKey + ?Sized>(&self, node: &K) -> bool {
        match self.window_index(node) {
            Ok(rel) => self.bit(rel),
            Err(_) => false,
        }
    }

    /// Marks `node`; returns `true` if it was not marked before.
    pub fn mark<K: NodeKey + ?Sized>(&mut self, node: &K) -> Result<bool> {
        let rel = self.window_index(node)?;
        let word = rel / WORD_BITS;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let mask = 1u64 << (rel % WORD_BITS);
        if self.words[word] & mask != 0 {
            return Ok(false);
        }
        self.words[word] |= mask;
        self.marked += 1;
        Ok(true)
    }

    /// Unmarks `node`; returns `true` if it was marked before.
    pub fn unmark<K: NodeKey + ?Sized>(&mut self, node: &K) -> Result<bool> {
        let rel = self.window_index(node)?;
        if !self.bit(rel) {
            return Ok(false);
        }
        self.words[rel / WORD_BITS] &= !(1u64 << (rel % WORD_BITS));
        self.marked -= 1;
        Ok(true)
    }

    /// Marks `node` and its ancestors, stopping at the first ancestor that is
    /// already marked (its own ancestors are then marked as well).
    ///
    /// Leaf numbering cannot name inner ancestors and is rejected.
    pub fn mark_and_propagate<D>(&mut self, tree: &Tree<D>, node: NodeId) -> Result<()> {
        if self.numbering == Numbering::Leaf {
            return Err(DTreeError::UnsupportedNumbering {
                numbering: self.numbering,
            });
        }
        let mut curr = Some(node);
        while let Some(id) = curr {
            let n = tree.try_node(id)?;
            if !self.mark(n)? {
                break;
            }
            curr = n.parent();
        }
        Ok(())
    }

    /// Moves the window start up to `new_offset`. Marks below it are
    /// discarded and the remaining bits shift down.
    pub fn advance_window(&mut self, new_offset: usize) -> Result<()> {
        if new_offset < self.offset {
            return Err(DTreeError::WindowRegression {
                current: self.offset,
                requested: new_offset,
            });
        }
        let shift = new_offset - self.offset;
        let word_shift = shift / WORD_BITS;
        let bit_shift = shift % WORD_BITS;

        if word_shift >= self.words.len() {
            self.words.clear();
        } else {
            self.words.drain(..word_shift);
            if bit_shift != 0 {
                for i in 0..self.words.len() {
                    let hi = self.words.get(i + 1).copied().unwrap_or(0);
                    self.words[i] = (self.words[i] >> bit_shift) | (hi << (WORD_BITS - bit_shift));
                }
            }
            while self.words.last() == Some(&0) {
                self.words.pop();
            }
        }

        self.offset = new_offset;
        self.marked = self.words.iter().map(|w| w.count_ones() as usize).sum();
        Ok(())
    }

    /// Marked indices (under the marking's numbering) in ascending order.
    pub fn marked_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(move |(wi, &w)| {
            let mut rest = w;
            std::iter::from_fn(move || {
                if rest == 0 {
                    return None;
                }
                let bit = rest.trailing_zeros() as usize;
                rest &= rest - 1;
                Some(self.offset + wi * WORD_BITS + bit)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(depth: usize) -> (Tree<usize>, Vec<NodeId>) {
        // Always split the true child, giving a right-leaning spine.
        let mut tree = Tree::new();
        let mut spine = vec![tree.root()];
        let mut curr = tree.root();
        for d in 0..depth {
            let [_, t] = tree.split(curr, d).unwrap();
            spine.push(t);
            curr = t;
        }
        (tree, spine)
    }

    #[test]
    fn test_mark_unmark() {
        let (tree, spine) = chain(3);
        let mut m = Marking::new(&tree, Numbering::Global);
        assert!(m.is_empty());
        assert_eq!(m.mark(&spine[1]), Ok(true));
        assert_eq!(m.mark(&spine[1]), Ok(false));
        assert!(m.is_marked(&spine[1]));
        assert!(!m.is_marked(&spine[2]));
        assert_eq!(m.len(), 1);
        assert_eq!(m.unmark(&spine[1]), Ok(true));
        assert_eq!(m.unmark(&spine[1]), Ok(false));
        assert!(m.is_empty());
    }

    #[test]
    fn test_propagation_stops_at_marked_ancestor() {
        let (tree, spine) = chain(4);
        let mut m = Marking::new(&tree, Numbering::Global);
        m.mark(&spine[2]).unwrap();
        m.mark_and_propagate(&tree, spine[4]).unwrap();

        assert!(m.is_marked(&spine[4]));
        assert!(m.is_marked(&spine[3]));
        assert!(m.is_marked(&spine[2]));
        // Never reached: propagation stopped at spine[2].
        assert!(!m.is_marked(&spine[1]));
        assert!(!m.is_marked(&spine[0]));
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn test_propagation_full_path() {
        let (tree, spine) = chain(3);
        let mut m = Marking::new(&tree, Numbering::Inner);
        m.mark_and_propagate(&tree, spine[2]).unwrap();
        assert_eq!(m.len(), 3);
        assert!(spine[..3].iter().all(|id| m.is_marked(tree.node(*id))));

        let mut leaves = Marking::new(&tree, Numbering::Leaf);
        assert!(leaves.mark_and_propagate(&tree, spine[3]).is_err());
    }

    #[test]
    fn test_window() {
        let (tree, spine) = chain(3);
        let offset = spine[1].index();
        let mut m = Marking::with_offset(&tree, Numbering::Global, offset);
        assert!(matches!(m.mark(&spine[0]), Err(DTreeError::BelowWindow { .. })));
        assert!(!m.is_marked(&spine[0]));

        m.mark(&spine[1]).unwrap();
        m.mark(&spine[3]).unwrap();
        assert_eq!(m.marked_indices().collect::<Vec<_>>(), vec![spine[1].index(), spine[3].index()]);

        m.advance_window(spine[2].index()).unwrap();
        assert!(!m.is_marked(&spine[1]));
        assert!(m.is_marked(&spine[3]));
        assert_eq!(m.len(), 1);
        assert!(m.advance_window(0).is_err());
    }

    #[test]
    fn test_advance_window_across_words() {
        let mut tree: Tree<u32> = Tree::new();
        let mut curr = tree.root();
        for d in 0..100 {
            curr = tree.split(curr, d).unwrap()[0];
        }
        let mut m = Marking::new(&tree, Numbering::Global);
        for i in [3usize, 64, 70, 130, 199] {
            m.mark(&NodeId::new(i)).unwrap();
        }
        m.advance_window(67).unwrap();
        assert_eq!(m.marked_indices().collect::<Vec<_>>(), vec![70, 130, 199]);
        assert!(m.is_marked(&NodeId::new(130)));
        assert!(!m.is_marked(&NodeId::new(64)));
        m.advance_window(300).unwrap();
        assert!(m.is_empty());
    }
}
