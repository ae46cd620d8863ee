//! The token/type resolver: the tolerant type-inference walk over an
//! expression, used while the user composes bindings (completion,
//! validation, kind display).
//!
//! Resolution never aborts a batch: a failed type or field lookup degrades
//! to the `unknown` sentinel field, an invalid filter degrades to "no
//! completion". Multiple independent expressions are resolved per document
//! and one malformed expression must not block the others.

use crate::filters::FilterRegistry;
use std::collections::HashSet;
use tracing::debug;
use weave_ast::{
    ComponentId, Expression, Field, PersistentId, PropertyTarget, PropertyToken, Token,
};
use weave_document::{resolve_state_component, DocumentHost, StateNamespace};
use weave_schema::TypeRegistry;

/// Everything a resolution pass needs, threaded explicitly (no ambient
/// registries).
pub struct ResolveContext<'a> {
    pub registry: &'a TypeRegistry,
    pub filters: &'a FilterRegistry,
    pub host: &'a dyn DocumentHost,
    /// The component the expression is being resolved for; state tokens
    /// walk up from here.
    pub component: ComponentId,
}

type StateKey = (PersistentId, bool, String);

/// Resolve a whole expression to the field its last token produces.
///
/// A left-to-right fold of [`resolve_step`] seeded with `None`; an empty
/// expression resolves to `None` without error.
pub fn resolve_expression(expression: &Expression, ctx: &ResolveContext<'_>) -> Option<Field> {
    resolve_tokens(expression.tokens(), ctx, &mut HashSet::new())
}

/// Resolve a single token against the field produced by its predecessor.
pub fn resolve_step(
    token: &Token,
    previous: Option<&Field>,
    ctx: &ResolveContext<'_>,
) -> Option<Field> {
    resolve_token(token, previous, ctx, &mut HashSet::new())
}

fn resolve_tokens(
    tokens: &[Token],
    ctx: &ResolveContext<'_>,
    visited: &mut HashSet<StateKey>,
) -> Option<Field> {
    let mut previous: Option<Field> = None;
    for token in tokens {
        match resolve_token(token, previous.as_ref(), ctx, visited) {
            Some(field) => previous = Some(field),
            None => return None,
        }
    }
    previous
}

fn resolve_token(
    token: &Token,
    previous: Option<&Field>,
    ctx: &ResolveContext<'_>,
    visited: &mut HashSet<StateKey>,
) -> Option<Field> {
    match token {
        Token::Property(property) => Some(resolve_property(property, previous, ctx)),
        Token::Filter(filter) => {
            let Some(capability) = ctx.filters.get(&filter.id) else {
                debug!(filter = %filter.id, "filter not registered, no completion");
                return None;
            };
            if !capability.validate(previous) {
                return None;
            }
            capability.output(previous, &filter.options)
        }
        Token::State(state) => {
            let Some(owner) =
                resolve_state_component(ctx.host, &ctx.component, &state.component_id)
            else {
                debug!(
                    component = %state.component_id,
                    "state owner not found in ancestry, no completion"
                );
                return None;
            };
            let namespace = if state.exposed {
                StateNamespace::Exposed
            } else {
                StateNamespace::Private
            };
            let Some(record) = ctx.host.state(&owner, namespace, &state.stored_state_id) else {
                debug!(state = %state.stored_state_id, "state record not found, no completion");
                return None;
            };
            let key = (
                state.component_id.clone(),
                state.exposed,
                state.stored_state_id.clone(),
            );
            if !visited.insert(key.clone()) {
                debug!(state = %state.stored_state_id, "cyclic state reference, no completion");
                return None;
            }
            let owner_ctx = ResolveContext {
                registry: ctx.registry,
                filters: ctx.filters,
                host: ctx.host,
                component: owner,
            };
            let mut field = resolve_tokens(record.expression.tokens(), &owner_ctx, visited);
            visited.remove(&key);

            if let (Some(field), Some(kind)) = (field.as_mut(), state.force_kind) {
                field.kind = kind;
            }
            field
        }
    }
}

fn resolve_property(
    property: &PropertyToken,
    previous: Option<&Field>,
    ctx: &ResolveContext<'_>,
) -> Field {
    // A fixed value terminates type resolution with `string` regardless of
    // chain position.
    if property.is_fixed() {
        return Field {
            id: property.field_id.clone(),
            label: "Value".to_string(),
            type_ids: vec!["string".to_string()],
            kind: weave_ast::TypeKind::Scalar,
            data_source_id: None,
            arguments: Vec::new(),
            preview_index: None,
        };
    }

    let source = property.data_source_id.as_deref();
    match property.prop_target {
        PropertyTarget::Type => match ctx.registry.get_type(&property.field_id, source) {
            Some(ty) => Field {
                id: ty.id.clone(),
                label: ty.label.clone(),
                type_ids: vec![ty.id.clone()],
                kind: ty.kind,
                data_source_id: ty.data_source_id.clone(),
                arguments: Vec::new(),
                preview_index: property.preview_index,
            },
            None => {
                debug!(type_id = %property.field_id, "root type not found");
                Field::unknown()
            }
        },
        PropertyTarget::Field => match previous {
            Some(previous) => {
                match ctx
                    .registry
                    .find_field(&previous.type_ids, source, &property.field_id)
                {
                    Some(field) => {
                        let mut field = field.clone();
                        if field.data_source_id.is_none() {
                            field.data_source_id = property.data_source_id.clone();
                        }
                        field.preview_index = property.preview_index;
                        field
                    }
                    None => {
                        debug!(field_id = %property.field_id, "field not found on previous type");
                        Field::unknown()
                    }
                }
            }
            // Head position: a queryable root field. The token is
            // self-describing; validate its type candidates against the
            // registry.
            None => {
                if ctx.registry.types_named(&property.type_ids, source).is_empty() {
                    debug!(field_id = %property.field_id, "no known type for root field");
                    Field::unknown()
                } else {
                    Field {
                        id: property.field_id.clone(),
                        label: property.field_id.clone(),
                        type_ids: property.type_ids.clone(),
                        kind: property.kind,
                        data_source_id: property.data_source_id.clone(),
                        arguments: Vec::new(),
                        preview_index: property.preview_index,
                    }
                }
            }
        },
    }
}
