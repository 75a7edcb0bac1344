// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tree normalization passes
//!
//! Run after every parse, whatever the source syntax:
//! 1. merge runs of adjacent text nodes
//! 2. prune whitespace-only text and childless containers
//! 3. backfill link and image targets from their text child
//!
//! Each pass is idempotent, and so is the whole sequence.

use crate::ast::{attr, NodeId, NodeKind, Tree};

/// Runs the normalization passes in order
#[derive(Debug, Clone, Copy, Default)]
pub struct Optimizer;

impl Optimizer {
    pub fn new() -> Self {
        Self
    }

    pub fn optimize(&self, tree: &mut Tree) {
        let root = tree.root();
        merge_text_runs(tree, root);
        prune_empty(tree, root);
        backfill_references(tree, root);
        tracing::trace!(outline = %tree, "optimized tree");
    }
}

/// Collapse consecutive text children into the first of the run
fn merge_text_runs(tree: &mut Tree, id: NodeId) {
    let children = tree.take_children(id);
    let mut merged = Vec::with_capacity(children.len());
    let mut run_head: Option<NodeId> = None;

    for child in children {
        if tree.node(child).kind() == NodeKind::Text {
            match run_head {
                Some(head) => append_text(tree, head, child),
                None => {
                    run_head = Some(child);
                    merged.push(child);
                }
            }
        } else {
            run_head = None;
            merge_text_runs(tree, child);
            merged.push(child);
        }
    }

    tree.set_children(id, merged);
}

/// Drop blank text and containers left without children, post-order.
///
/// Removing a node can bring two text siblings together; they are joined on
/// the spot so the pass never leaves adjacent text behind.
fn prune_empty(tree: &mut Tree, id: NodeId) {
    let children = tree.take_children(id);
    let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());

    for child in children {
        let kind = tree.node(child).kind();
        let keep = match kind {
            NodeKind::Text => !tree.node(child).content().trim().is_empty(),
            _ => {
                prune_empty(tree, child);
                kind.is_void() || !tree.node(child).is_leaf()
            }
        };

        if !keep {
            tree.detach(child);
            continue;
        }
        match kept.last() {
            Some(&last)
                if kind == NodeKind::Text && tree.node(last).kind() == NodeKind::Text =>
            {
                append_text(tree, last, child);
            }
            _ => kept.push(child),
        }
    }

    tree.set_children(id, kept);
}

/// Give links and images without a target the text they wrap.
///
/// Images lose that text afterwards so the address is not also shown as a
/// caption.
fn backfill_references(tree: &mut Tree, id: NodeId) {
    let children = tree.node(id).children().to_vec();
    for child in children {
        let target = match tree.node(child).kind() {
            NodeKind::Link => Some(attr::HREF),
            NodeKind::Image => Some(attr::SRC),
            _ => None,
        };

        if let Some(name) = target {
            if !tree.node(child).has_attr(name) {
                if let Some(url) = sole_text(tree, child) {
                    tree.node_mut(child).set_attr(name, url);
                    if name == attr::SRC {
                        for grandchild in tree.take_children(child) {
                            tree.detach(grandchild);
                        }
                    }
                }
            }
        }

        backfill_references(tree, child);
    }
}

/// Trimmed content of the only child, when that child is text
fn sole_text(tree: &Tree, id: NodeId) -> Option<String> {
    match tree.node(id).children() {
        [only] if tree.node(*only).kind() == NodeKind::Text => {
            Some(tree.node(*only).content().trim().to_string())
        }
        _ => None,
    }
}

/// Move the content of text node `from` onto the end of `into`
fn append_text(tree: &mut Tree, into: NodeId, from: NodeId) {
    let extra = std::mem::take(&mut tree.node_mut(from).content);
    tree.node_mut(into).content.push_str(&extra);
    tree.detach(from);
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn kind_strategy() -> impl Strategy<Value = NodeKind> {
        prop_oneof![
            3 => Just(NodeKind::Text),
            1 => proptest::sample::select(
                NodeKind::ALL
                    .iter()
                    .copied()
                    .filter(|k| *k != NodeKind::Document)
                    .collect::<Vec<_>>()
            ),
        ]
    }

    fn text_strategy() -> impl Strategy<Value = String> {
        prop_oneof![Just(String::new()), Just(" ".to_string()), "[a-z \n]{0,6}"]
    }

    /// Build a random tree from (kind, text, parent pick) triples
    fn tree_strategy() -> impl Strategy<Value = Tree> {
        prop::collection::vec((kind_strategy(), text_strategy(), 0usize..16), 0..48).prop_map(
            |ops| {
                let mut tree = Tree::new();
                let mut containers = vec![tree.root()];
                for (kind, text, pick) in ops {
                    let parent = containers[pick % containers.len()];
                    if kind == NodeKind::Text {
                        let id = tree.create_text(text);
                        tree.append_child(parent, id);
                    } else {
                        let id = tree.create_node(kind);
                        tree.append_child(parent, id);
                        containers.push(id);
                    }
                }
                tree
            },
        )
    }

    proptest! {
        #[test]
        fn prop_optimize_is_idempotent(tree in tree_strategy()) {
            let optimizer = Optimizer::new();
            let mut once = tree.clone();
            optimizer.optimize(&mut once);
            let mut twice = once.clone();
            optimizer.optimize(&mut twice);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_no_adjacent_text(tree in tree_strategy()) {
            let mut tree = tree;
            Optimizer::new().optimize(&mut tree);
            for node in tree.root_ref().descendants() {
                let kinds: Vec<_> = node.children().map(|c| c.kind()).collect();
                for pair in kinds.windows(2) {
                    prop_assert!(!(pair[0] == NodeKind::Text && pair[1] == NodeKind::Text));
                }
            }
        }

        #[test]
        fn prop_no_empty_containers(tree in tree_strategy()) {
            let mut tree = tree;
            Optimizer::new().optimize(&mut tree);
            for node in tree.root_ref().descendants().skip(1) {
                match node.kind() {
                    NodeKind::Text => prop_assert!(!node.content().trim().is_empty()),
                    kind if kind.is_void() => {}
                    _ => prop_assert!(node.child_count() > 0),
                }
            }
        }

        #[test]
        fn prop_parent_links_survive(tree in tree_strategy()) {
            let mut tree = tree;
            Optimizer::new().optimize(&mut tree);
            for node in tree.root_ref().descendants() {
                for child in node.children() {
                    prop_assert_eq!(child.parent().map(|p| p.id()), Some(node.id()));
                }
            }
        }
    }
}
