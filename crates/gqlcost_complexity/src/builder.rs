//! Walks a document and builds its [`CostTree`].

use crate::arguments::{resolve_arguments, scaling_multipliers, Variables};
use crate::config::ComplexityConfig;
use crate::directive::{select_governing, CostDirective, FixedCost};
use crate::schema::CostSchema;
use crate::tree::{CostNode, CostTree, NodeId};
use gqlcost_schema::TypeKind;
use rustc_hash::FxHashSet;
use gqlcost_syntax::{
    Definition, Document, Field, FragmentDefinition, OperationDefinition, Selection, SelectionSet,
};
use tracing::debug;

/// Builds the cost tree of a whole document.
///
/// Every operation and fragment definition is visited once. Selections the
/// schema cannot place (meta fields, unknown parent types, undeclared fields)
/// are skipped together with their subtree.
pub struct CostTreeBuilder<'s, 'd, 'a, S: CostSchema + ?Sized> {
    schema: &'s S,
    config: &'s ComplexityConfig,
    document: &'d Document<'a>,
    variables: &'d Variables,
    /// Operation whose variable defaults apply inside fragment definitions.
    request_operation: Option<&'d OperationDefinition<'a>>,
    /// Names of the fragments the document defines.
    defined: FxHashSet<&'a str>,
    tree: CostTree,
    stack: Vec<NodeId>,
}

impl<'s, 'd, 'a, S: CostSchema + ?Sized> CostTreeBuilder<'s, 'd, 'a, S> {
    /// Creates a new builder for `document`.
    pub fn new(
        schema: &'s S,
        config: &'s ComplexityConfig,
        document: &'d Document<'a>,
        variables: &'d Variables,
    ) -> Self {
        let tree = CostTree::new();
        let root = tree.root();
        Self {
            schema,
            config,
            document,
            variables,
            request_operation: document.operation(None),
            defined: document.fragments().map(|f| f.name.value).collect(),
            tree,
            stack: vec![root],
        }
    }

    /// Sets the operation the request asked for by name.
    #[must_use]
    pub fn with_operation_name(mut self, name: Option<&str>) -> Self {
        self.request_operation = self.document.operation(name);
        self
    }

    /// Consumes the builder, returning the finished tree.
    pub fn build(mut self) -> CostTree {
        let document = self.document;
        for definition in &document.definitions {
            match definition {
                Definition::Operation(operation) => self.visit_operation(operation),
                Definition::Fragment(fragment) => self.visit_fragment_definition(fragment),
                _ => {}
            }
        }
        self.tree
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or_else(|| self.tree.root())
    }

    fn visit_operation(&mut self, operation: &'d OperationDefinition<'a>) {
        let schema = self.schema;
        let root_type = schema.root_type(operation.operation);
        if root_type.is_none() {
            debug!(
                operation = operation.operation.as_str(),
                "schema has no root type for operation"
            );
        }
        self.walk(&operation.selection_set, root_type, Some(operation));
    }

    fn visit_fragment_definition(&mut self, fragment: &'d FragmentDefinition<'a>) {
        let condition = fragment.type_condition.value;
        let parent = self.schema.type_kind(condition).map(|_| condition);

        let node = self.tree.add_fragment(fragment.name.value);
        self.stack.push(node);
        let operation = self.request_operation;
        self.walk(&fragment.selection_set, parent, operation);
        self.stack.pop();
    }

    /// Visits a selection set and everything nested in it in document order.
    ///
    /// Nesting is tracked on an explicit work list, so deep documents do not
    /// grow the call stack.
    fn walk(
        &mut self,
        selection_set: &'d SelectionSet<'a>,
        parent: Option<&str>,
        operation: Option<&'d OperationDefinition<'a>>,
    ) {
        let mut work = Vec::new();
        push_selections(&mut work, selection_set, parent);

        while let Some(step) = work.pop() {
            let (selection, parent) = match step {
                Step::Visit { selection, parent } => (selection, parent),
                Step::Leave => {
                    self.stack.pop();
                    continue;
                }
            };

            match selection {
                Selection::Field(field) => {
                    let Some((id, result_type)) = self.visit_field(field, parent, operation)
                    else {
                        continue;
                    };
                    if let Some(selection_set) = &field.selection_set {
                        self.stack.push(id);
                        work.push(Step::Leave);
                        push_selections(&mut work, selection_set, Some(result_type));
                    }
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.name.value;
                    if self.defined.contains(name) {
                        let current = self.current();
                        self.tree.add_fragment_reference(current, name);
                    } else {
                        debug!(fragment = name, "skipping spread of undefined fragment");
                    }
                }
                Selection::InlineFragment(inline) => {
                    let scoped = match &inline.type_condition {
                        Some(condition) => self
                            .schema
                            .type_kind(condition.value)
                            .map(|_| condition.value),
                        None => parent,
                    };
                    push_selections(&mut work, &inline.selection_set, scoped);
                }
            }
        }
    }

    /// Adds the node for `field` under the current node. Returns the new node
    /// and the field's result type, `None` when the field is skipped.
    fn visit_field(
        &mut self,
        field: &'d Field<'a>,
        parent: Option<&str>,
        operation: Option<&'d OperationDefinition<'a>>,
    ) -> Option<(NodeId, &'s str)> {
        let name = field.name.value;
        if field.name.is_reserved() {
            debug!(field = name, "skipping meta field");
            return None;
        }
        let Some(parent) = parent else {
            debug!(field = name, "skipping field with unresolvable parent type");
            return None;
        };
        let Some((directive, result_type)) = self.field_directive(parent, name) else {
            debug!(field = name, parent, "skipping field not declared on parent type");
            return None;
        };

        let multipliers = match &directive {
            Some(CostDirective::List(list)) => {
                let resolved = resolve_arguments(field, operation, self.variables);
                scaling_multipliers(list, &resolved)
            }
            _ => Vec::new(),
        };
        let node = CostNode::field(parent, name, field.response_key())
            .with_directive(directive)
            .with_added_complexity(self.added_complexity(result_type))
            .with_multipliers(multipliers);

        let current = self.current();
        Some((self.tree.add_child(current, node), result_type))
    }

    /// Governing directive and result type of `parent.field`, `None` when the
    /// field cannot be placed on `parent`.
    fn field_directive(
        &self,
        parent: &str,
        field: &str,
    ) -> Option<(Option<CostDirective>, &'s str)> {
        let schema = self.schema;
        let key = self.config.cost_compare_key;

        match schema.type_kind(parent)? {
            TypeKind::Interface => {
                let result_type = schema.field_type(parent, field)?;
                let candidates = schema
                    .implementers(parent)
                    .into_iter()
                    .filter(|object| schema.field_type(object, field).is_some())
                    .map(|object| schema.field_cost(object, field));
                Some((select_governing(candidates, key), result_type))
            }
            TypeKind::Union => {
                let members: Vec<&str> = schema
                    .union_members(parent)
                    .into_iter()
                    .filter(|member| schema.field_type(member, field).is_some())
                    .collect();
                let result_type = schema.field_type(members.first()?, field)?;
                let candidates = members
                    .iter()
                    .map(|member| schema.field_cost(member, field));
                Some((select_governing(candidates, key), result_type))
            }
            _ => {
                let result_type = schema.field_type(parent, field)?;
                Some((schema.field_cost(parent, field), result_type))
            }
        }
    }

    /// Fixed cost carried by a result type. An interface takes the governing
    /// directive across its implementers; any other type, unions included,
    /// only its own.
    fn added_complexity(&self, type_name: &str) -> i64 {
        let schema = self.schema;

        let directive = match schema.type_kind(type_name) {
            Some(TypeKind::Interface) => select_governing(
                schema
                    .implementers(type_name)
                    .into_iter()
                    .map(|object| schema.type_cost(object)),
                self.config.cost_compare_key,
            ),
            Some(_) => schema.type_cost(type_name),
            None => None,
        };

        match directive {
            Some(CostDirective::Fixed(FixedCost { complexity })) => complexity.unwrap_or(0),
            _ => 0,
        }
    }
}

/// Pending work of [`CostTreeBuilder::walk`].
enum Step<'d, 'a, 'p> {
    Visit {
        selection: &'d Selection<'a>,
        parent: Option<&'p str>,
    },
    /// Closes the field node pushed when its selection set was queued.
    Leave,
}

/// Queues `selection_set` so that its first selection is visited next.
fn push_selections<'d, 'a, 'p>(
    work: &mut Vec<Step<'d, 'a, 'p>>,
    selection_set: &'d SelectionSet<'a>,
    parent: Option<&'p str>,
) {
    work.extend(
        selection_set
            .selections
            .iter()
            .rev()
            .map(|selection| Step::Visit { selection, parent }),
    );
}
