//! Stack-based tree traversal with data flowing down and results flowing up.
//!
//! A [`Visitor`] sees every inner node twice: once on the way down, where it
//! decides what data each child receives (or that the node should not be
//! descended into at all), and once on the way up, where it combines the
//! children's results. Leaves are seen once. The traversal keeps its own frame
//! stack, so tree depth is not limited by the call stack.

use crate::error::Result;
use crate::node::{Node, NodeId, NodeKind};
use crate::tree::Tree;

/// Callbacks driven by [`Tree::visit`].
pub trait Visitor<D> {
    /// Data passed from a node to its children.
    type Down: Clone;
    /// Result produced for a node.
    type Up;

    /// First visit of an inner node. Data for the children may be set in
    /// `children`; slots left empty receive a clone of `down`. Returning
    /// `false` skips both children and [`Visitor::visit_inner_post`].
    fn visit_inner_pre(
        &mut self,
        node: &Node<D>,
        down: &Self::Down,
        children: &mut ChildData<Self::Down>,
    ) -> bool;

    /// Second visit of an inner node, after both children. A child result is
    /// `None` if that child declined its own descent.
    fn visit_inner_post(
        &mut self,
        node: &Node<D>,
        down: Self::Down,
        false_result: Option<Self::Up>,
        true_result: Option<Self::Up>,
    ) -> Self::Up;

    fn visit_leaf(&mut self, node: &Node<D>, down: Self::Down) -> Self::Up;
}

/// Per-child data slots filled during [`Visitor::visit_inner_pre`].
#[derive(Debug)]
pub struct ChildData<P> {
    slots: [Option<P>; 2],
}

impl<P> ChildData<P> {
    fn new() -> Self {
        Self {
            slots: [None, None],
        }
    }

    #[inline]
    pub fn set(&mut self, label: bool, data: P) {
        self.slots[label as usize] = Some(data);
    }

    #[inline]
    pub fn set_false(&mut self, data: P) {
        self.set(false, data);
    }

    #[inline]
    pub fn set_true(&mut self, data: P) {
        self.set(true, data);
    }

    pub fn get(&self, label: bool) -> Option<&P> {
        self.slots[label as usize].as_ref()
    }
}

impl<P: Clone> ChildData<P> {
    pub fn set_both(&mut self, data: P) {
        self.slots[0] = Some(data.clone());
        self.slots[1] = Some(data);
    }

    fn resolve(self, inherited: &P) -> [P; 2] {
        self.slots.map(|slot| slot.unwrap_or_else(|| inherited.clone()))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Stage {
    Enter,
    Combine,
}

struct Frame<P, R> {
    node: NodeId,
    down: P,
    /// Index of the parent frame and the label of the edge leading here.
    link: Option<(usize, bool)>,
    stage: Stage,
    results: [Option<R>; 2],
}

impl<P, R> Frame<P, R> {
    fn new(node: NodeId, down: P, link: Option<(usize, bool)>) -> Self {
        Self {
            node,
            down,
            link,
            stage: Stage::Enter,
            results: [None, None],
        }
    }
}

impl<D> Tree<D> {
    /// Runs `visitor` over the subtree at `subtree_root`, starting with
    /// `seed` as the data flowing into the root.
    ///
    /// Returns the root's result, or `None` if the visitor declined to descend
    /// into the root.
    pub fn visit<V>(
        &self,
        visitor: &mut V,
        subtree_root: NodeId,
        seed: V::Down,
    ) -> Result<Option<V::Up>>
    where
        V: Visitor<D> + ?Sized,
    {
        self.try_node(subtree_root)?;

        let mut stack: Vec<Frame<V::Down, V::Up>> = Vec::with_capacity(self.config.stack_capacity);
        stack.push(Frame::new(subtree_root, seed, None));
        let mut output = None;

        while let Some(top) = stack.len().checked_sub(1) {
            let node = &self.nodes[stack[top].node.0];
            let (link, result) = match (&node.kind, stack[top].stage) {
                (NodeKind::Leaf { .. }, _) => {
                    let frame = stack.pop().expect("frame at top");
                    (frame.link, Some(visitor.visit_leaf(node, frame.down)))
                }
                (NodeKind::Inner { children, .. }, Stage::Enter) => {
                    let mut data = ChildData::new();
                    if visitor.visit_inner_pre(node, &stack[top].down, &mut data) {
                        let [down_false, down_true] = data.resolve(&stack[top].down);
                        stack[top].stage = Stage::Combine;
                        stack.push(Frame::new(children[1], down_true, Some((top, true))));
                        stack.push(Frame::new(children[0], down_false, Some((top, false))));
                        continue;
                    }
                    let frame = stack.pop().expect("frame at top");
                    (frame.link, None)
                }
                (NodeKind::Inner { .. }, Stage::Combine) => {
                    let frame = stack.pop().expect("frame at top");
                    let [false_result, true_result] = frame.results;
                    let result = visitor.visit_inner_post(node, frame.down, false_result, true_result);
                    (frame.link, Some(result))
                }
            };

            match link {
                Some((parent, label)) => stack[parent].results[label as usize] = result,
                None => output = result,
            }
        }

        Ok(output)
    }
}
