//! Converts one expression into query-tree fragments for a single data
//! source.
//!
//! The interesting decision is placement: a fragment built from the tokens
//! after a property is either *relative* to it (a nested selection) or an
//! unrelated root-level access that must stay a separate top-level tree,
//! e.g. an independent query referenced from a filter argument inside a
//! loop body.

use crate::error::QueryResult;
use weave_ast::{ComponentId, Expression, QueryTree, Token};
use weave_document::DocumentHost;
use weave_expr::resolve_state_tokens;
use weave_schema::TypeRegistry;

pub struct TreeContext<'a> {
    pub registry: &'a TypeRegistry,
    pub host: &'a dyn DocumentHost,
}

/// Build the tree fragments an expression contributes to one data source's
/// query. An empty expression contributes nothing.
pub fn build_trees(
    tokens: &[Token],
    ctx: &TreeContext<'_>,
    component: &ComponentId,
    data_source_id: &str,
) -> QueryResult<Vec<QueryTree>> {
    let Some((head, rest)) = tokens.split_first() else {
        return Ok(Vec::new());
    };
    match head {
        // A literal has no query representation, but filter options in the
        // remainder may still reference schema data.
        Token::Property(property) if property.is_fixed() => {
            build_trees(rest, ctx, component, data_source_id)
        }
        Token::Property(property) => {
            if property.data_source_id.as_deref() != Some(data_source_id) {
                // Belongs to a different data source's query.
                return Ok(Vec::new());
            }
            let children = build_trees(rest, ctx, component, data_source_id)?;

            let mut node_token = property.clone();
            // The preview index is per-row render state, not a selection.
            node_token.preview_index = None;

            if children.is_empty() {
                return Ok(vec![QueryTree::leaf(node_token)]);
            }

            let one_hop = ctx
                .registry
                .field_types_one_hop(&property.type_ids, Some(data_source_id));
            let mut nested = Vec::new();
            let mut detached = Vec::new();
            for child in children {
                let relative = child
                    .token
                    .type_ids
                    .iter()
                    .any(|type_id| one_hop.contains(type_id));
                if relative {
                    nested.push(child);
                } else {
                    detached.push(child);
                }
            }

            let mut trees = vec![QueryTree::with_children(node_token, nested)];
            trees.extend(detached);
            Ok(trees)
        }
        // Filters never become tree nodes; they contribute the trees found
        // inside their option expressions and pass through to the rest.
        Token::Filter(filter) => {
            let mut trees = Vec::new();
            for value in filter.options.values() {
                if let Some(sub) = Expression::parse(value) {
                    if !sub.is_empty() {
                        trees.extend(build_trees(sub.tokens(), ctx, component, data_source_id)?);
                    }
                }
            }
            trees.extend(build_trees(rest, ctx, component, data_source_id)?);
            Ok(trees)
        }
        // An unresolved state here is a broken binding: fail loudly.
        Token::State(_) => {
            let resolved =
                resolve_state_tokens(&Expression::new(tokens.to_vec()), ctx.host, component)?;
            build_trees(&resolved, ctx, component, data_source_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_ast::{
        Field, OptionMap, PropertyTarget, PropertyToken, StateToken, Type, TypeKind,
    };
    use weave_document::InMemoryDocument;
    use weave_expr::StateError;
    use crate::error::QueryError;

    fn schema_field(id: &str, type_ids: &[&str], kind: TypeKind) -> Field {
        Field {
            id: id.to_string(),
            label: id.to_string(),
            type_ids: type_ids.iter().map(|s| s.to_string()).collect(),
            kind,
            data_source_id: Some("store".to_string()),
            arguments: Vec::new(),
            preview_index: None,
        }
    }

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.set_source_types(
            "store",
            vec![
                Type {
                    id: "Item".to_string(),
                    label: "Item".to_string(),
                    kind: TypeKind::Object,
                    fields: vec![
                        schema_field("name", &["string"], TypeKind::Scalar),
                        schema_field("category", &["Category"], TypeKind::Object),
                    ],
                    data_source_id: Some("store".to_string()),
                },
                Type {
                    id: "Category".to_string(),
                    label: "Category".to_string(),
                    kind: TypeKind::Object,
                    fields: vec![schema_field("title", &["string"], TypeKind::Scalar)],
                    data_source_id: Some("store".to_string()),
                },
                Type {
                    id: "Settings".to_string(),
                    label: "Settings".to_string(),
                    kind: TypeKind::Object,
                    fields: vec![schema_field("locale", &["string"], TypeKind::Scalar)],
                    data_source_id: Some("store".to_string()),
                },
            ],
        );
        registry
    }

    fn property(field_id: &str, type_ids: &[&str], kind: TypeKind) -> Token {
        Token::Property(PropertyToken {
            prop_target: PropertyTarget::Field,
            field_id: field_id.to_string(),
            type_ids: type_ids.iter().map(|s| s.to_string()).collect(),
            kind,
            data_source_id: Some("store".to_string()),
            options: OptionMap::new(),
            preview_index: None,
        })
    }

    #[test]
    fn test_empty_expression_builds_nothing() {
        let registry = registry();
        let doc = InMemoryDocument::new();
        let ctx = TreeContext {
            registry: &registry,
            host: &doc,
        };
        assert!(build_trees(&[], &ctx, &"c1".to_string(), "store")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_other_data_source_builds_nothing() {
        let registry = registry();
        let doc = InMemoryDocument::new();
        let ctx = TreeContext {
            registry: &registry,
            host: &doc,
        };
        let tokens = vec![property("items", &["Item"], TypeKind::List)];
        assert!(build_trees(&tokens, &ctx, &"c1".to_string(), "cms")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_chain_nests_relative_children() {
        let registry = registry();
        let doc = InMemoryDocument::new();
        let ctx = TreeContext {
            registry: &registry,
            host: &doc,
        };
        let tokens = vec![
            property("items", &["Item"], TypeKind::List),
            property("category", &["Category"], TypeKind::Object),
            property("title", &["string"], TypeKind::Scalar),
        ];
        let trees = build_trees(&tokens, &ctx, &"c1".to_string(), "store").unwrap();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].token.field_id, "items");
        assert_eq!(trees[0].children.len(), 1);
        assert_eq!(trees[0].children[0].token.field_id, "category");
        assert_eq!(trees[0].children[0].children[0].token.field_id, "title");
    }

    #[test]
    fn test_unrelated_fragment_stays_top_level() {
        let registry = registry();
        let doc = InMemoryDocument::new();
        let ctx = TreeContext {
            registry: &registry,
            host: &doc,
        };
        // `settings` is not a field type reachable from Item, so the filter
        // argument's fragment must not nest under `items`.
        let embedded = serde_json::to_value(Expression::new(vec![property(
            "settings",
            &["Settings"],
            TypeKind::Object,
        )]))
        .unwrap();
        let tokens = vec![
            property("items", &["Item"], TypeKind::List),
            Token::Filter(weave_ast::FilterToken {
                id: "where".to_string(),
                options: OptionMap::from([("value".to_string(), embedded)]),
                preview_index: None,
            }),
            property("name", &["string"], TypeKind::Scalar),
        ];
        let trees = build_trees(&tokens, &ctx, &"c1".to_string(), "store").unwrap();
        assert_eq!(trees.len(), 2);
        assert_eq!(trees[0].token.field_id, "items");
        assert_eq!(trees[0].children.len(), 1);
        assert_eq!(trees[0].children[0].token.field_id, "name");
        assert_eq!(trees[1].token.field_id, "settings");
    }

    #[test]
    fn test_preview_index_stripped_from_tree_tokens() {
        let registry = registry();
        let doc = InMemoryDocument::new();
        let ctx = TreeContext {
            registry: &registry,
            host: &doc,
        };
        let mut head = property("items", &["Item"], TypeKind::List);
        head.set_preview_index(Some(3));
        let trees = build_trees(&[head], &ctx, &"c1".to_string(), "store").unwrap();
        assert_eq!(trees[0].token.preview_index, None);
    }

    #[test]
    fn test_unresolved_state_fails_loudly() {
        let registry = registry();
        let doc = InMemoryDocument::new();
        let ctx = TreeContext {
            registry: &registry,
            host: &doc,
        };
        let tokens = vec![Token::State(StateToken {
            stored_state_id: "rows".to_string(),
            component_id: "p-nowhere".to_string(),
            exposed: true,
            preview_index: None,
            force_kind: None,
        })];
        let err = build_trees(&tokens, &ctx, &"c1".to_string(), "store").unwrap_err();
        assert!(matches!(
            err,
            QueryError::State(StateError::ComponentNotFound { .. })
        ));
    }
}
