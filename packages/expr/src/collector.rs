use weave_ast::{ComponentId, Expression};
use weave_document::{DocumentHost, StateNamespace};

/// One expression in use somewhere in the document, paired with the
/// component that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedExpression {
    pub expression: Expression,
    pub component: ComponentId,
}

/// Gather every expression in use under `root`, in document (pre-order)
/// order.
///
/// Sources per component: exposed state bindings, private state bindings,
/// then attribute values that parse as an expression. An attribute value
/// that does not parse is an ordinary static value and is skipped silently.
pub fn collect_expressions(
    host: &dyn DocumentHost,
    root: &ComponentId,
) -> Vec<CollectedExpression> {
    let mut collected = Vec::new();
    walk(host, root, &mut collected);
    collected
}

fn walk(host: &dyn DocumentHost, component: &ComponentId, out: &mut Vec<CollectedExpression>) {
    for namespace in [StateNamespace::Exposed, StateNamespace::Private] {
        for (_, record) in host.states(component, namespace) {
            if !record.expression.is_empty() {
                out.push(CollectedExpression {
                    expression: record.expression,
                    component: component.clone(),
                });
            }
        }
    }
    for (_, value) in host.attributes(component) {
        if let Some(expression) = Expression::parse(&value) {
            if !expression.is_empty() {
                out.push(CollectedExpression {
                    expression,
                    component: component.clone(),
                });
            }
        }
    }
    for child in host.children(component) {
        walk(host, &child, out);
    }
}
