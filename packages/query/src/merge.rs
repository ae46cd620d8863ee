//! Pure recursive merging of query-tree fragments.
//!
//! Two fragments naming the same field merge only when their joined
//! type-id signatures and normalized option sets match; option sets that
//! differ only in emptiness stay distinct siblings (a duplicate field with
//! different args), and two different non-empty option sets for the same
//! field are irreconcilable. Inputs are never mutated; merging always
//! returns new trees.

use crate::error::{QueryError, QueryResult};
use serde_json::Value;
use weave_ast::{DataSourceId, OptionMap, QueryTree};

/// Merge two trees rooted at the same field. Precondition (enforced by the
/// grouping fold): same root field id and compatible data source ids.
pub fn merge_trees(a: &QueryTree, b: &QueryTree) -> QueryResult<QueryTree> {
    if a.token.field_id != b.token.field_id
        || !sources_compatible(&a.token.data_source_id, &b.token.data_source_id)
    {
        return Err(QueryError::MergeMismatch {
            left: a.token.field_id.clone(),
            right: b.token.field_id.clone(),
        });
    }
    let mut children = a.children.clone();
    for incoming in &b.children {
        fold_into(&mut children, incoming)?;
    }
    Ok(QueryTree {
        token: a.token.clone(),
        children,
    })
}

/// Left-fold of pairwise merges over fragments sharing a root field:
/// produces the final deduplicated tree set for one data source.
pub fn merge_tree_group(trees: Vec<QueryTree>) -> QueryResult<Vec<QueryTree>> {
    let mut roots: Vec<QueryTree> = Vec::new();
    for tree in &trees {
        fold_into(&mut roots, tree)?;
    }
    Ok(roots)
}

/// Merge `incoming` into the sibling list: recursive merge on an exact
/// match, conflict on a same-signature argument clash, separate sibling
/// otherwise.
fn fold_into(siblings: &mut Vec<QueryTree>, incoming: &QueryTree) -> QueryResult<()> {
    let mut equal_match = None;
    let mut clash = None;
    for (index, existing) in siblings.iter().enumerate() {
        let same_field = existing.token.field_id == incoming.token.field_id
            && sources_compatible(
                &existing.token.data_source_id,
                &incoming.token.data_source_id,
            )
            && existing.token.type_signature() == incoming.token.type_signature();
        if !same_field {
            continue;
        }
        if options_equal(&existing.token.options, &incoming.token.options) {
            equal_match = Some(index);
            break;
        }
        if !options_blank(&existing.token.options) && !options_blank(&incoming.token.options) {
            clash = Some(index);
        }
    }

    if let Some(index) = equal_match {
        let merged = merge_trees(&siblings[index], incoming)?;
        siblings[index] = merged;
    } else if let Some(index) = clash {
        return Err(QueryError::MergeConflict {
            field_id: incoming.token.field_id.clone(),
            left: render_options(&siblings[index].token.options),
            right: render_options(&incoming.token.options),
        });
    } else {
        siblings.push(incoming.clone());
    }
    Ok(())
}

fn sources_compatible(a: &Option<DataSourceId>, b: &Option<DataSourceId>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

/// Normalize an option set for comparison: JSON-string-encoded values are
/// parsed, blank entries dropped.
fn normalized_options(options: &OptionMap) -> OptionMap {
    options
        .iter()
        .map(|(name, value)| (name.clone(), normalize_value(value)))
        .filter(|(_, value)| !is_blank(value))
        .collect()
}

fn normalize_value(value: &Value) -> Value {
    match value {
        Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| value.clone()),
        other => other.clone(),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn options_equal(a: &OptionMap, b: &OptionMap) -> bool {
    normalized_options(a) == normalized_options(b)
}

fn options_blank(options: &OptionMap) -> bool {
    normalized_options(options).is_empty()
}

fn render_options(options: &OptionMap) -> String {
    serde_json::to_string(&normalized_options(options)).unwrap_or_else(|_| "{}".to_string())
}
