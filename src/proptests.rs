use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;

/// Checks every structural invariant of `t`, panicking on the first violation.
pub(crate) fn validate_tree<D>(t: &Tree<D>) {
    assert_eq!(
        t.inner_nodes.len() + 1,
        t.leaves.len(),
        "a full binary tree has one more leaf than inner nodes"
    );
    assert_eq!(
        t.nodes.len(),
        t.leaves.len() + t.inner_nodes.len(),
        "every node is either a leaf or inner"
    );

    let root = &t.nodes[t.root.0];
    assert!(root.parent.is_none(), "root must not have a parent");
    assert_eq!(root.depth, 0, "root depth must be 0");

    let mut seen = vec![false; t.nodes.len()];
    let mut stack = vec![t.root];
    while let Some(id) = stack.pop() {
        assert!(!seen[id.0], "node {id} reachable twice");
        seen[id.0] = true;

        let node = &t.nodes[id.0];
        assert_eq!(node.id, id, "arena slot must hold its own node");
        match &node.kind {
            NodeKind::Leaf { leaf_id } => {
                assert_eq!(t.leaves.get(leaf_id.0), Some(&id), "{leaf_id} must resolve to {id}");
            }
            NodeKind::Inner {
                inner_id, children, ..
            } => {
                assert_eq!(
                    t.inner_nodes.get(inner_id.0),
                    Some(&id),
                    "{inner_id} must resolve to {id}"
                );
                for &c in children {
                    let child = &t.nodes[c.0];
                    assert!(c > id, "child {c} must have a greater id than parent {id}");
                    assert_eq!(child.parent, Some(id), "parent link of {c}");
                    assert_eq!(child.depth, node.depth + 1, "depth of {c}");
                    stack.push(c);
                }
            }
        }
    }
    assert!(seen.iter().all(|&s| s), "every node must be reachable from the root");
}

/// Deterministic per-node coin flip.
fn coin(seed: u64, id: NodeId) -> bool {
    let mixed = seed ^ (id.index() as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    mixed.count_ones() % 2 == 1
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    Split { leaf: u16, replacement: bool },
    Graft { leaf: u16, root: u16 },
    Replace { inner: u16, seed: u64 },
    Extract { seed: u64 },
    Sift { seed: u64 },
    Transform,
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_operations_keep_invariants(ops in prop::collection::vec(any::<Op>(), 0..=150)) {
        let mut t: Tree<u32> = Tree::new();
        let mut next_discriminator = 0u32;

        for op in ops {
            match op {
                Op::Split { leaf, replacement } => {
                    let leaf = t.leaves[leaf as usize % t.num_leaves()];
                    let leaf_id = t.node(leaf).leaf_id();
                    let fresh = LeafId::new(t.num_leaves());
                    let children = t
                        .split_with_replacement(leaf, next_discriminator, replacement)
                        .unwrap();
                    next_discriminator += 1;
                    prop_assert_eq!(t.node(children[replacement as usize]).leaf_id(), leaf_id);
                    prop_assert_eq!(t.node(children[!replacement as usize]).leaf_id(), Some(fresh));
                }
                Op::Graft { leaf, root } => {
                    if t.num_nodes() > 2_000 {
                        continue;
                    }
                    let leaf = t.leaves[leaf as usize % t.num_leaves()];
                    let root = NodeId::new(root as usize % t.num_nodes());
                    let copied = t.subtree_leaves(root).unwrap().count();
                    let before = t.num_leaves();
                    let map = t.split_by_own_subtree(leaf, root, |d| d + 1).unwrap();
                    prop_assert_eq!(t.num_leaves(), before + copied - 1);
                    prop_assert_eq!(map.get(&root).unwrap(), Some(&leaf));
                }
                Op::Replace { inner, seed } => {
                    if t.num_inner_nodes() == 0 {
                        continue;
                    }
                    let n = t.inner_nodes[inner as usize % t.num_inner_nodes()];
                    let counts = (t.num_nodes(), t.num_leaves(), t.num_inner_nodes());
                    let snapshot = t.deep_clone();
                    let outcome = t
                        .replace_discriminator(n, next_discriminator, |leaf, _| coin(seed, leaf.id()))
                        .unwrap();
                    next_discriminator += 1;
                    prop_assert_eq!(counts, (t.num_nodes(), t.num_leaves(), t.num_inner_nodes()));

                    match outcome {
                        ReplaceOutcome::Replaced(map) => {
                            for (idx, prior) in map.iter() {
                                let new = t.node(NodeId::new(idx));
                                prop_assert_eq!(new.is_leaf(), prior.is_leaf());
                                if new.is_leaf() {
                                    let side = t.separation(n, new.id()).unwrap().towards_b;
                                    prop_assert_eq!(side, Some(coin(seed, prior.id)));
                                }
                            }
                        }
                        ReplaceOutcome::NotSeparating(_) => {
                            prop_assert_eq!(&t.nodes, &snapshot.nodes);
                        }
                    }
                }
                Op::Extract { seed } => {
                    let mut marks = Marking::new(&t, Numbering::Global);
                    let mut chosen = 0;
                    for leaf in t.leaves() {
                        if coin(seed, leaf.id()) {
                            marks.mark_and_propagate(&t, leaf.id()).unwrap();
                            chosen += 1;
                        }
                    }

                    match t.extract(t.root(), |x| marks.is_marked(x)).unwrap() {
                        None => {
                            prop_assert_eq!(chosen, 0);
                        }
                        Some(ex) => {
                            validate_tree(ex.tree());
                            prop_assert_eq!(ex.tree().num_leaves(), chosen);
                            for leaf in ex.tree().leaves() {
                                let origin = ex.original(leaf.id()).unwrap();
                                prop_assert!(origin.is_leaf());
                                prop_assert!(marks.is_marked(&origin));
                            }
                        }
                    }
                }
                Op::Sift { seed } => {
                    let leaf = t.sift_root(|d| coin(seed, NodeId::new(*d as usize)));
                    prop_assert!(t.node(leaf).is_leaf());
                }
                Op::Transform => {
                    let copy = t.transform(|d| *d);
                    prop_assert_eq!(&copy.nodes, &t.nodes);
                    t = copy;
                }
            }

            validate_tree(&t);
        }
    }

    #[test]
    fn prop_lca_symmetric(
        splits in prop::collection::vec(any::<(u16, bool)>(), 1..200),
        a in any::<u16>(),
        b in any::<u16>(),
    ) {
        let mut t: Tree<usize> = Tree::new();
        for (i, (leaf, replacement)) in splits.into_iter().enumerate() {
            let leaf = t.leaves[leaf as usize % t.num_leaves()];
            t.split_with_replacement(leaf, i, replacement).unwrap();
        }
        let a = NodeId::new(a as usize % t.num_nodes());
        let b = NodeId::new(b as usize % t.num_nodes());

        let lca = t.least_common_ancestor(a, b).unwrap();
        prop_assert_eq!(lca, t.least_common_ancestor(b, a).unwrap());
        prop_assert_eq!(t.least_common_ancestor(a, a).unwrap(), a);
        prop_assert!(t.subtree_nodes(lca, Numbering::Global).unwrap().any(|n| n.id() == a));
        prop_assert!(t.subtree_nodes(lca, Numbering::Global).unwrap().any(|n| n.id() == b));

        if a != b {
            let s = t.separation(a, b).unwrap();
            if let (Some(x), Some(y)) = (s.towards_a, s.towards_b) {
                prop_assert_ne!(x, y);
                prop_assert!(t.separator(a, b).is_ok());
            }
        }
    }
}

#[test]
fn exhaustive_small_replacements() {
    // Every routing of the four leaves of a balanced tree.
    for routing in 0u32..16 {
        let mut t: Tree<u32> = Tree::new();
        let [f, tr] = t.split(t.root(), 0).unwrap();
        let [ff, ft] = t.split(f, 1).unwrap();
        let [tf, tt] = t.split(tr, 2).unwrap();
        let leaves = [ff, ft, tf, tt];
        let before = t.deep_clone();

        let route = |id: NodeId| {
            let pos = leaves.iter().position(|&l| l == id).unwrap();
            (routing >> pos) & 1 == 1
        };
        let outcome = t.replace_discriminator(t.root(), 9, |leaf, _| route(leaf.id())).unwrap();

        if routing == 0 || routing == 15 {
            assert!(!outcome.is_replaced());
            assert_eq!(t.nodes, before.nodes);
        } else {
            let map = outcome.into_map().unwrap();
            assert_eq!(map.len(), 6);
            for leaf in t.subtree_leaves(t.root()).unwrap() {
                let prior = map.get(leaf).unwrap().unwrap();
                let side = t.separation(t.root(), leaf.id()).unwrap().towards_b;
                assert_eq!(side, Some(route(prior.id)));
            }
        }
        validate_tree(&t);
    }
}
