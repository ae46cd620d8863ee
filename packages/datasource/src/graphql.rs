//! GraphQL-syntax rendering of merged query trees.
//!
//! One node per field selection, arguments taken from the token's option
//! map. Option values may arrive JSON-string-encoded from the editor; they
//! are parsed before rendering so `"10"` renders as `first: 10` while plain
//! text stays a quoted string.

use serde_json::Value;
use weave_ast::{OptionMap, QueryTree};

const INDENT: &str = "  ";

/// Render a set of merged trees as one named query operation.
pub fn render_query(trees: &[QueryTree]) -> String {
    let mut out = String::from("query {\n");
    for tree in trees {
        render_node(tree, 1, &mut out);
    }
    out.push('}');
    out
}

fn render_node(tree: &QueryTree, depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(&tree.token.field_id);
    let args = render_arguments(&tree.token.options);
    if !args.is_empty() {
        out.push('(');
        out.push_str(&args);
        out.push(')');
    }
    if tree.children.is_empty() {
        out.push('\n');
    } else {
        out.push_str(" {\n");
        for child in &tree.children {
            render_node(child, depth + 1, out);
        }
        for _ in 0..depth {
            out.push_str(INDENT);
        }
        out.push_str("}\n");
    }
}

fn render_arguments(options: &OptionMap) -> String {
    options
        .iter()
        .filter(|(_, value)| !is_blank(value))
        .map(|(name, value)| format!("{}: {}", name, render_value(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn render_value(value: &Value) -> String {
    match value {
        // Editor-authored values arrive as strings; JSON-encoded ones are
        // unwrapped so numbers and booleans render bare.
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(parsed) if !parsed.is_string() => render_value(&parsed),
            _ => format!("{:?}", s),
        },
        other => other.to_string(),
    }
}
