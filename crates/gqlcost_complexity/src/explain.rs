//! Human readable breakdown of a cost tree.

use crate::config::ComplexityConfig;
use crate::resolver::{node_cost, CostResolver, FragmentEntry};
use crate::tree::{CostChild, CostNode, CostTree, NodeId, NodeKind};
use serde::Serialize;
use std::fmt;

/// What an [`Explanation`] entry stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplainKind {
    Document,
    Fragment,
    Spread,
    Field,
}

/// Owned, fully expanded view of a resolved cost tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    pub label: String,
    pub kind: ExplainKind,
    pub directive: Option<String>,
    pub added_complexity: i64,
    pub multipliers: Vec<i64>,
    pub cost: i64,
    pub children: Vec<Explanation>,
}

impl CostTree {
    /// Explains how the total cost is made up. The first spread of a fragment
    /// is expanded in place; later spreads of it show its cost only. The root
    /// entry's cost equals [`CostTree::resolve`].
    #[must_use]
    pub fn explain(&self, config: &ComplexityConfig) -> Explanation {
        let mut resolver = CostResolver::new(self, config.default_cost);
        let mut stack = vec![Frame::new(self.root(), None)];

        loop {
            let Some(frame) = stack.last_mut() else {
                return Explanation::spread("document", 0);
            };
            let node = self.node(frame.id);

            if let Some(child) = node.children.get(frame.next_child) {
                frame.next_child += 1;
                let name = match child {
                    CostChild::Node(id) => {
                        stack.push(Frame::new(*id, None));
                        continue;
                    }
                    CostChild::Fragment(name) => name.as_str(),
                };
                let collapsed = match resolver.enter_fragment(name) {
                    FragmentEntry::Enter(body) => {
                        stack.push(Frame::new(body, Some(name)));
                        continue;
                    }
                    FragmentEntry::Resolved(cost) => {
                        Explanation::spread(&format!("...{name} (repeated)"), cost)
                    }
                    FragmentEntry::Cycle => Explanation::spread(&format!("...{name} (cycle)"), 0),
                    FragmentEntry::Missing => {
                        Explanation::spread(&format!("...{name} (undefined)"), 0)
                    }
                };
                frame.children.push(collapsed);
                continue;
            }

            let Some(frame) = stack.pop() else {
                continue;
            };
            let sum = frame
                .children
                .iter()
                .fold(0i64, |acc, child| acc.saturating_add(child.cost));
            let cost = node_cost(node, sum, resolver.default_cost());

            let entry = match frame.fragment {
                Some(name) => {
                    resolver.finish_fragment(name, cost);
                    let mut spread = Explanation::spread(&format!("...{name}"), cost);
                    spread.children = frame.children;
                    spread
                }
                None => describe(node, cost, frame.children),
            };
            match stack.last_mut() {
                Some(parent) => parent.children.push(entry),
                None => return entry,
            }
        }
    }
}

struct Frame<'t> {
    id: NodeId,
    next_child: usize,
    children: Vec<Explanation>,
    fragment: Option<&'t str>,
}

impl<'t> Frame<'t> {
    fn new(id: NodeId, fragment: Option<&'t str>) -> Self {
        Self {
            id,
            next_child: 0,
            children: Vec::new(),
            fragment,
        }
    }
}

fn describe(node: &CostNode, cost: i64, children: Vec<Explanation>) -> Explanation {
    let (label, kind) = match &node.kind {
        NodeKind::Root => ("document".to_string(), ExplainKind::Document),
        NodeKind::Fragment { name } => (format!("fragment {name}"), ExplainKind::Fragment),
        NodeKind::Field {
            parent_type,
            name,
            response_key,
        } => {
            let label = if response_key == name {
                format!("{parent_type}.{name}")
            } else {
                format!("{response_key}: {parent_type}.{name}")
            };
            (label, ExplainKind::Field)
        }
    };

    Explanation {
        label,
        kind,
        directive: node.directive.as_ref().map(ToString::to_string),
        added_complexity: node.added_complexity,
        multipliers: node.multipliers.clone(),
        cost,
        children,
    }
}

impl Explanation {
    fn spread(label: &str, cost: i64) -> Self {
        Self {
            label: label.to_string(),
            kind: ExplainKind::Spread,
            directive: None,
            added_complexity: 0,
            multipliers: Vec::new(),
            cost,
            children: Vec::new(),
        }
    }

    fn write_line(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}{}", "", self.label, indent = depth * 2)?;
        if let Some(directive) = &self.directive {
            write!(f, " {directive}")?;
        }
        if self.added_complexity != 0 {
            write!(f, " +{}", self.added_complexity)?;
        }
        if !self.multipliers.is_empty() {
            write!(f, " x{:?}", self.multipliers)?;
        }
        write!(f, " = {}", self.cost)
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(self, 0usize)];
        let mut first = true;
        while let Some((entry, depth)) = stack.pop() {
            if !first {
                writeln!(f)?;
            }
            first = false;
            entry.write_line(f, depth)?;
            stack.extend(entry.children.iter().rev().map(|child| (child, depth + 1)));
        }
        Ok(())
    }
}

impl Drop for Explanation {
    // Deep fragment chains give deep explanations; flatten before dropping.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut entry) = pending.pop() {
            pending.append(&mut entry.children);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::CostDirective;
    use crate::tree::CostNode;

    fn tree() -> CostTree {
        let mut tree = CostTree::new();
        let root = tree.root();
        let books = tree.add_child(
            root,
            CostNode::field("Query", "books", "shelf")
                .with_directive(Some(CostDirective::list(10, ["limit"])))
                .with_added_complexity(1)
                .with_multipliers(vec![3]),
        );
        tree.add_fragment_reference(books, "BookFields");
        tree.add_fragment_reference(root, "Loop");

        let body = tree.add_fragment("BookFields");
        tree.add_child(
            body,
            CostNode::field("Book", "title", "title").with_directive(Some(CostDirective::fixed(1))),
        );
        tree.add_child(body, CostNode::field("Book", "id", "id"));

        let lp = tree.add_fragment("Loop");
        tree.add_fragment_reference(lp, "Loop");
        tree.add_fragment_reference(lp, "Gone");
        tree
    }

    #[test]
    fn test_explain_matches_resolve() {
        let tree = tree();
        let config = ComplexityConfig::new(100);
        assert_eq!(tree.explain(&config).cost, tree.resolve(0));

        let config = config.with_default_cost(2);
        assert_eq!(tree.explain(&config).cost, tree.resolve(2));
    }

    #[test]
    fn test_explain_display() {
        let explanation = tree().explain(&ComplexityConfig::new(100));
        insta::assert_snapshot!(explanation.to_string(), @r#"
        document = 6
          shelf: Query.books @listCost(assumedSize: 10, arguments: ["limit"]) +1 x[3] = 6
            ...BookFields = 1
              Book.title @cost(complexity: 1) = 1
              Book.id = 0
          ...Loop = 0
            ...Loop (cycle) = 0
            ...Gone (undefined) = 0
        "#);
    }

    #[test]
    fn test_explain_kinds() {
        let explanation = tree().explain(&ComplexityConfig::new(100));
        assert_eq!(explanation.kind, ExplainKind::Document);
        assert_eq!(explanation.children[0].kind, ExplainKind::Field);
        assert_eq!(explanation.children[0].children[0].kind, ExplainKind::Spread);
    }

    #[test]
    fn test_repeated_spread_is_collapsed() {
        let mut tree = CostTree::new();
        let root = tree.root();
        tree.add_fragment_reference(root, "F");
        tree.add_fragment_reference(root, "F");
        let body = tree.add_fragment("F");
        tree.add_child(
            body,
            CostNode::field("Book", "title", "title").with_directive(Some(CostDirective::fixed(2))),
        );

        let explanation = tree.explain(&ComplexityConfig::new(100));
        assert_eq!(explanation.cost, tree.resolve(0));
        insta::assert_snapshot!(explanation.to_string(), @r"
        document = 4
          ...F = 2
            Book.title @cost(complexity: 2) = 2
          ...F (repeated) = 2
        ");
    }

    #[test]
    fn test_doubling_fragment_chain_stays_linear() {
        // Each fragment spreads the next one twice: 2^40 expansions if unfolded.
        let mut tree = CostTree::new();
        let root = tree.root();
        tree.add_fragment_reference(root, "F0");
        for i in 0..40 {
            let body = tree.add_fragment(&format!("F{i}"));
            tree.add_child(
                body,
                CostNode::field("T", "f", "f").with_directive(Some(CostDirective::fixed(1))),
            );
            tree.add_fragment_reference(body, &format!("F{}", i + 1));
            tree.add_fragment_reference(body, &format!("F{}", i + 1));
        }

        let explanation = tree.explain(&ComplexityConfig::new(100));
        assert_eq!(explanation.cost, tree.resolve(0));
        assert_eq!(explanation.cost, (1i64 << 40) - 1);
    }

    #[test]
    fn test_cycle_cost_matches_resolve() {
        let mut tree = CostTree::new();
        let root = tree.root();
        tree.add_fragment_reference(root, "A");
        tree.add_fragment_reference(root, "B");
        let a = tree.add_fragment("A");
        tree.add_child(a, CostNode::field("T", "a", "a"));
        tree.add_fragment_reference(a, "B");
        let b = tree.add_fragment("B");
        tree.add_child(b, CostNode::field("T", "b", "b"));
        tree.add_fragment_reference(b, "A");

        let config = ComplexityConfig::new(100).with_default_cost(1);
        assert_eq!(tree.explain(&config).cost, tree.resolve(1));
    }

    #[test]
    fn test_long_fragment_chain() {
        let mut tree = CostTree::new();
        let root = tree.root();
        tree.add_fragment_reference(root, "F0");
        for i in 0..20_000 {
            let body = tree.add_fragment(&format!("F{i}"));
            let field = tree.add_child(body, CostNode::field("T", "f", "f"));
            tree.add_fragment_reference(field, &format!("F{}", i + 1));
        }

        let config = ComplexityConfig::new(100).with_default_cost(1);
        let explanation = tree.explain(&config);
        assert_eq!(explanation.cost, 20_000);

        let mut depth = 0;
        let mut entry = &explanation;
        while let Some(child) = entry.children.first() {
            depth += 1;
            entry = child;
        }
        assert_eq!(depth, 40_001);
        assert_eq!(entry.label, "...F20000 (undefined)");
    }
}
