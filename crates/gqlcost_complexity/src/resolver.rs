//! Folds a [`CostTree`] into a single cost.

use crate::directive::{CostDirective, FixedCost};
use crate::tree::{CostChild, CostNode, CostTree, NodeId, NodeKind};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

/// Cost of `node` given the summed cost of its children.
///
/// Scope nodes only sum their children. A list cost multiplies the field's
/// added cost plus its children by each resolved multiplier and sums the
/// terms, falling back to the assumed size. Arithmetic saturates.
#[must_use]
pub fn node_cost(node: &CostNode, children: i64, default_cost: i64) -> i64 {
    if node.is_scope() {
        return children;
    }
    match &node.directive {
        Some(CostDirective::List(list)) => {
            let base = node.added_complexity.saturating_add(children);
            if node.multipliers.is_empty() {
                base.saturating_mul(list.assumed_size.unwrap_or(0))
            } else {
                node.multipliers
                    .iter()
                    .fold(0i64, |sum, m| sum.saturating_add(base.saturating_mul(*m)))
            }
        }
        Some(CostDirective::Fixed(FixedCost { complexity })) => {
            complexity.unwrap_or(default_cost).saturating_add(children)
        }
        None => default_cost.saturating_add(children),
    }
}

/// Post-order evaluator over one tree.
///
/// Fragment bodies are memoized by name; a fragment reached again while it is
/// still being resolved contributes 0. The walk keeps its own stack, so its
/// depth is bounded only by memory.
pub struct CostResolver<'t> {
    tree: &'t CostTree,
    default_cost: i64,
    memo: FxHashMap<&'t str, i64>,
    in_progress: FxHashSet<&'t str>,
}

/// How a fragment spread is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FragmentEntry {
    /// The body has to be walked; the fragment is now in progress.
    Enter(NodeId),
    /// Already resolved earlier in this pass.
    Resolved(i64),
    /// The fragment is on the current path.
    Cycle,
    /// No fragment of that name was recorded.
    Missing,
}

impl FragmentEntry {
    /// Cost a spread contributes without walking the body.
    pub(crate) fn known_cost(self) -> Option<i64> {
        match self {
            Self::Enter(_) => None,
            Self::Resolved(cost) => Some(cost),
            Self::Cycle | Self::Missing => Some(0),
        }
    }
}

struct Frame<'t> {
    id: NodeId,
    next_child: usize,
    children: i64,
    fragment: Option<&'t str>,
}

impl<'t> Frame<'t> {
    fn new(id: NodeId, fragment: Option<&'t str>) -> Self {
        Self {
            id,
            next_child: 0,
            children: 0,
            fragment,
        }
    }
}

impl<'t> CostResolver<'t> {
    /// Creates a new resolver for `tree`.
    #[must_use]
    pub fn new(tree: &'t CostTree, default_cost: i64) -> Self {
        Self {
            tree,
            default_cost,
            memo: FxHashMap::default(),
            in_progress: FxHashSet::default(),
        }
    }

    /// Resolves the document root.
    pub fn resolve(&mut self) -> i64 {
        self.resolve_node(self.tree.root())
    }

    /// Resolves one node and everything below it.
    pub fn resolve_node(&mut self, id: NodeId) -> i64 {
        self.run(Frame::new(id, None))
    }

    /// Resolves a fragment by name, 0 if it is missing or already on the current path.
    pub fn resolve_fragment(&mut self, name: &'t str) -> i64 {
        match self.enter_fragment(name) {
            FragmentEntry::Enter(body) => self.run(Frame::new(body, Some(name))),
            entry => entry.known_cost().unwrap_or(0),
        }
    }

    /// Looks a spread up, marking the fragment in progress when its body has
    /// to be walked. Every `Enter` must be closed with [`Self::finish_fragment`].
    pub(crate) fn enter_fragment(&mut self, name: &'t str) -> FragmentEntry {
        if let Some(cost) = self.memo.get(name) {
            return FragmentEntry::Resolved(*cost);
        }
        if self.in_progress.contains(name) {
            warn!(fragment = name, "fragment cycle, spread contributes no cost");
            return FragmentEntry::Cycle;
        }
        let Some(body) = self.tree.fragment(name) else {
            debug!(fragment = name, "spread of unrecorded fragment contributes no cost");
            return FragmentEntry::Missing;
        };
        self.in_progress.insert(name);
        FragmentEntry::Enter(body)
    }

    pub(crate) fn finish_fragment(&mut self, name: &'t str, cost: i64) {
        self.in_progress.remove(name);
        self.memo.insert(name, cost);
    }

    pub(crate) fn default_cost(&self) -> i64 {
        self.default_cost
    }

    fn run(&mut self, first: Frame<'t>) -> i64 {
        let tree = self.tree;
        let mut stack = vec![first];

        loop {
            let Some(frame) = stack.last_mut() else {
                return 0;
            };
            let node = tree.node(frame.id);

            if let Some(child) = node.children.get(frame.next_child) {
                frame.next_child += 1;
                match child {
                    CostChild::Node(id) => stack.push(Frame::new(*id, None)),
                    CostChild::Fragment(name) => match self.enter_fragment(name.as_str()) {
                        FragmentEntry::Enter(body) => {
                            stack.push(Frame::new(body, Some(name.as_str())));
                        }
                        entry => {
                            let cost = entry.known_cost().unwrap_or(0);
                            frame.children = frame.children.saturating_add(cost);
                        }
                    },
                }
                continue;
            }

            let children = frame.children;
            let fragment = frame.fragment;
            stack.pop();

            let cost = node_cost(node, children, self.default_cost);
            if let NodeKind::Field { parent_type, name, .. } = &node.kind {
                debug!(
                    parent_type = parent_type.as_str(),
                    field = name.as_str(),
                    directive = ?node.directive,
                    multipliers = ?node.multipliers,
                    children,
                    cost,
                    "field cost"
                );
            }
            if let Some(name) = fragment {
                self.finish_fragment(name, cost);
            }

            match stack.last_mut() {
                Some(parent) => parent.children = parent.children.saturating_add(cost),
                None => return cost,
            }
        }
    }
}

impl CostTree {
    /// Resolves the total cost of the tree.
    #[must_use]
    pub fn resolve(&self, default_cost: i64) -> i64 {
        CostResolver::new(self, default_cost).resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(directive: Option<CostDirective>) -> CostNode {
        CostNode::field("T", "f", "f").with_directive(directive)
    }

    #[test]
    fn test_node_cost_formulas() {
        assert_eq!(node_cost(&leaf(None), 4, 1), 5);
        assert_eq!(node_cost(&leaf(Some(CostDirective::fixed(3))), 4, 1), 7);

        let unset = leaf(Some(CostDirective::Fixed(FixedCost { complexity: None })));
        assert_eq!(node_cost(&unset, 4, 2), 6);

        let list = leaf(Some(CostDirective::list(10, ["first", "last"]))).with_added_complexity(1);
        assert_eq!(node_cost(&list, 2, 0), 30);
        assert_eq!(node_cost(&list.clone().with_multipliers(vec![5]), 2, 0), 15);
        assert_eq!(node_cost(&list.with_multipliers(vec![5, 2]), 2, 0), 21);
    }

    #[test]
    fn test_list_without_assumed_size_is_zero() {
        let list = leaf(Some(CostDirective::List(Default::default())));
        assert_eq!(node_cost(&list, 9, 1), 0);
    }

    #[test]
    fn test_scope_sums_children_only() {
        let scope = CostNode::scope(NodeKind::Root);
        assert_eq!(node_cost(&scope, 12, 5), 12);
    }

    #[test]
    fn test_saturates() {
        let list = leaf(Some(CostDirective::list(10, ["n"]))).with_multipliers(vec![i64::MAX, 2]);
        assert_eq!(node_cost(&list, 1, 0), i64::MAX);
        assert_eq!(node_cost(&leaf(None), i64::MAX, 1), i64::MAX);
    }

    #[test]
    fn test_forward_fragment_reference() {
        let mut tree = CostTree::new();
        let root = tree.root();
        let field = tree.add_child(root, leaf(Some(CostDirective::list(10, ["n"]))));
        tree.add_fragment_reference(field, "F");
        tree.add_fragment_reference(root, "F");

        let body = tree.add_fragment("F");
        tree.add_child(body, leaf(Some(CostDirective::fixed(2))));
        tree.add_child(body, leaf(None));

        // field: (0 + 3) * 10, plus the spread at the root: 3
        assert_eq!(tree.resolve(1), 33);
    }

    #[test]
    fn test_fragment_cycle_terminates() {
        let mut tree = CostTree::new();
        let root = tree.root();
        tree.add_fragment_reference(root, "A");

        let a = tree.add_fragment("A");
        tree.add_child(a, leaf(Some(CostDirective::fixed(1))));
        tree.add_fragment_reference(a, "B");
        let b = tree.add_fragment("B");
        tree.add_child(b, leaf(Some(CostDirective::fixed(2))));
        tree.add_fragment_reference(b, "A");

        assert_eq!(tree.resolve(0), 3);
    }

    #[test]
    fn test_missing_fragment_is_zero() {
        let mut tree = CostTree::new();
        let root = tree.root();
        tree.add_fragment_reference(root, "Nope");
        tree.add_child(root, leaf(None));
        assert_eq!(tree.resolve(4), 4);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let mut tree = CostTree::new();
        let root = tree.root();
        let field = tree.add_child(root, leaf(Some(CostDirective::list(3, ["n"]))));
        tree.add_child(field, leaf(None));
        tree.add_fragment_reference(field, "F");
        let body = tree.add_fragment("F");
        tree.add_child(body, leaf(Some(CostDirective::fixed(5))));

        assert_eq!(tree.resolve(1), tree.resolve(1));
        assert_eq!(tree.resolve(1), 18);
    }

    #[test]
    fn test_deep_tree_resolves() {
        let mut tree = CostTree::new();
        let mut parent = tree.root();
        for _ in 0..100_000 {
            parent = tree.add_child(parent, leaf(Some(CostDirective::fixed(1))));
        }
        assert_eq!(tree.resolve(0), 100_000);
    }

    #[test]
    fn test_long_fragment_chain_resolves() {
        let mut tree = CostTree::new();
        let root = tree.root();
        tree.add_fragment_reference(root, "F0");
        for i in 0..20_000 {
            let body = tree.add_fragment(&format!("F{i}"));
            let field = tree.add_child(body, leaf(Some(CostDirective::fixed(1))));
            tree.add_fragment_reference(field, &format!("F{}", i + 1));
        }
        assert_eq!(tree.resolve(0), 20_000);
    }

    #[test]
    fn test_fragment_entry_states() {
        let mut tree = CostTree::new();
        let body = tree.add_fragment("F");
        tree.add_child(body, leaf(None));

        let mut resolver = CostResolver::new(&tree, 2);
        assert_eq!(resolver.enter_fragment("Nope"), FragmentEntry::Missing);
        assert_eq!(resolver.enter_fragment("F"), FragmentEntry::Enter(body));
        assert_eq!(resolver.enter_fragment("F"), FragmentEntry::Cycle);
        resolver.finish_fragment("F", 2);
        assert_eq!(resolver.enter_fragment("F"), FragmentEntry::Resolved(2));
        assert_eq!(resolver.resolve_fragment("F"), 2);
    }
}
