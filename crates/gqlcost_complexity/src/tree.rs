//! Arena-backed cost tree produced by the builder.
//!
//! Nodes live in a flat `Vec` and refer to each other by [`NodeId`]. Fragment
//! spreads stay as named [`CostChild::Fragment`] edges and are looked up in the
//! fragment table only when the tree is resolved, so a spread may precede the
//! definition it names.

use crate::directive::CostDirective;
use rustc_hash::FxHashMap;

/// Index of a node in a [`CostTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a node stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document scope.
    Root,
    /// The body of a fragment definition.
    Fragment { name: String },
    /// A selected field.
    Field {
        parent_type: String,
        name: String,
        response_key: String,
    },
}

/// An edge from a node to something that contributes cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CostChild {
    Node(NodeId),
    /// A fragment spread, resolved by name against the fragment table.
    Fragment(String),
}

/// One node of the cost tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostNode {
    pub kind: NodeKind,
    /// The governing cost directive of the field.
    pub directive: Option<CostDirective>,
    /// Fixed cost of the field's result type, folded in before list multiplication.
    pub added_complexity: i64,
    /// Resolved scaling argument values, in query order.
    pub multipliers: Vec<i64>,
    pub children: Vec<CostChild>,
}

impl CostNode {
    /// Creates a scope node that only sums its children.
    #[must_use]
    pub fn scope(kind: NodeKind) -> Self {
        Self {
            kind,
            directive: None,
            added_complexity: 0,
            multipliers: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates a field node.
    #[must_use]
    pub fn field(
        parent_type: impl Into<String>,
        name: impl Into<String>,
        response_key: impl Into<String>,
    ) -> Self {
        Self::scope(NodeKind::Field {
            parent_type: parent_type.into(),
            name: name.into(),
            response_key: response_key.into(),
        })
    }

    #[must_use]
    pub fn with_directive(mut self, directive: Option<CostDirective>) -> Self {
        self.directive = directive;
        self
    }

    #[must_use]
    pub fn with_added_complexity(mut self, added: i64) -> Self {
        self.added_complexity = added;
        self
    }

    #[must_use]
    pub fn with_multipliers(mut self, multipliers: Vec<i64>) -> Self {
        self.multipliers = multipliers;
        self
    }

    /// Returns true for root and fragment body nodes.
    #[must_use]
    pub fn is_scope(&self) -> bool {
        !matches!(self.kind, NodeKind::Field { .. })
    }
}

/// The cost tree of one document.
#[derive(Debug, Clone)]
pub struct CostTree {
    nodes: Vec<CostNode>,
    root: NodeId,
    fragments: FxHashMap<String, NodeId>,
}

impl CostTree {
    /// Creates a tree holding only the document root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![CostNode::scope(NodeKind::Root)],
            root: NodeId(0),
            fragments: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the node for an id handed out by this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &CostNode {
        &self.nodes[id.index()]
    }

    /// Number of nodes, including the root and fragment bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true when the document root selects nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node(self.root).children.is_empty()
    }

    /// Returns the body node of a fragment definition.
    #[must_use]
    pub fn fragment(&self, name: &str) -> Option<NodeId> {
        self.fragments.get(name).copied()
    }

    fn push(&mut self, node: CostNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Appends `node` under `parent` and returns its id.
    pub fn add_child(&mut self, parent: NodeId, node: CostNode) -> NodeId {
        let id = self.push(node);
        self.nodes[parent.index()].children.push(CostChild::Node(id));
        id
    }

    /// Records the body of a fragment definition. The node is not attached to
    /// any parent; a later definition with the same name replaces the entry.
    pub fn add_fragment(&mut self, name: &str) -> NodeId {
        let id = self.push(CostNode::scope(NodeKind::Fragment {
            name: name.to_string(),
        }));
        self.fragments.insert(name.to_string(), id);
        id
    }

    /// Appends a spread of fragment `name` under `parent`.
    pub fn add_fragment_reference(&mut self, parent: NodeId, name: &str) {
        self.nodes[parent.index()]
            .children
            .push(CostChild::Fragment(name.to_string()));
    }
}

impl Default for CostTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tree_has_root_only() {
        let tree = CostTree::new();
        assert_eq!(tree.len(), 1);
        assert!(tree.is_empty());
        assert_eq!(tree.node(tree.root()).kind, NodeKind::Root);
    }

    #[test]
    fn test_add_child_links_parent() {
        let mut tree = CostTree::new();
        let books = tree.add_child(tree.root(), CostNode::field("Query", "books", "books"));
        let id = tree.add_child(books, CostNode::field("Book", "id", "id"));

        assert_eq!(tree.node(tree.root()).children, vec![CostChild::Node(books)]);
        assert_eq!(tree.node(books).children, vec![CostChild::Node(id)]);
        assert!(!tree.is_empty());
    }

    #[test]
    fn test_fragments_are_unattached() {
        let mut tree = CostTree::new();
        let body = tree.add_fragment("BookFields");
        tree.add_fragment_reference(tree.root(), "BookFields");

        assert_eq!(tree.fragment("BookFields"), Some(body));
        assert!(tree.node(body).is_scope());
        assert_eq!(
            tree.node(tree.root()).children,
            vec![CostChild::Fragment("BookFields".to_string())]
        );
    }

    #[test]
    fn test_redefined_fragment_last_wins() {
        let mut tree = CostTree::new();
        let first = tree.add_fragment("F");
        let second = tree.add_fragment("F");
        assert_ne!(first, second);
        assert_eq!(tree.fragment("F"), Some(second));
        assert_eq!(tree.fragments.len(), 1);
    }
}
