//! Strict resolution of state back-references.
//!
//! Used by the tree builder, the query compiler, and the evaluator: a state
//! token that cannot be resolved here is a broken user binding and must
//! surface as an error, unlike the tolerant type-inference path.

use std::collections::HashSet;
use thiserror::Error;
use weave_ast::{ComponentId, Expression, PersistentId, StateToken, Token};
use weave_document::{resolve_state_component, DocumentHost, StateNamespace};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    #[error("no ancestor of component '{from}' has persistent id '{component_id}'")]
    ComponentNotFound {
        component_id: PersistentId,
        from: ComponentId,
    },

    #[error("state '{state_id}' is not declared on component '{component_id}'")]
    StateNotFound {
        state_id: String,
        component_id: PersistentId,
    },

    #[error("cyclic state reference through state '{state_id}' on component '{component_id}'")]
    CyclicReference {
        state_id: String,
        component_id: PersistentId,
    },
}

pub type StateResult<T> = Result<T, StateError>;

/// One state binding on the resolution path, used for cycle detection.
type StateKey = (PersistentId, StateNamespace, String);

fn state_key(token: &StateToken) -> StateKey {
    let namespace = if token.exposed {
        StateNamespace::Exposed
    } else {
        StateNamespace::Private
    };
    (token.component_id.clone(), namespace, token.stored_state_id.clone())
}

/// Flatten every state token in the expression (recursively) into
/// property/filter-only form.
///
/// A state token's own preview index transfers onto the last spliced token
/// when that token has none, so a loop row selection applied to a state
/// binding lands on the value the binding produces.
pub fn resolve_state_tokens(
    expression: &Expression,
    host: &dyn DocumentHost,
    component: &ComponentId,
) -> StateResult<Vec<Token>> {
    let mut visited = HashSet::new();
    flatten(expression.tokens(), host, component, &mut visited)
}

fn flatten(
    tokens: &[Token],
    host: &dyn DocumentHost,
    component: &ComponentId,
    visited: &mut HashSet<StateKey>,
) -> StateResult<Vec<Token>> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        match token {
            Token::State(state) => {
                let (owner, record) = lookup(state, host, component)?;
                let key = state_key(state);
                if !visited.insert(key.clone()) {
                    return Err(StateError::CyclicReference {
                        state_id: state.stored_state_id.clone(),
                        component_id: state.component_id.clone(),
                    });
                }
                let mut inner =
                    flatten(record.expression.tokens(), host, &owner, visited)?;
                visited.remove(&key);

                if let Some(index) = state.preview_index {
                    if let Some(last) = inner.last_mut() {
                        if last.preview_index().is_none() {
                            last.set_preview_index(Some(index));
                        }
                    }
                }
                out.extend(inner);
            }
            other => out.push(other.clone()),
        }
    }
    Ok(out)
}

fn lookup(
    state: &StateToken,
    host: &dyn DocumentHost,
    component: &ComponentId,
) -> StateResult<(ComponentId, weave_document::StateRecord)> {
    let owner = resolve_state_component(host, component, &state.component_id).ok_or_else(|| {
        StateError::ComponentNotFound {
            component_id: state.component_id.clone(),
            from: component.clone(),
        }
    })?;
    let namespace = if state.exposed {
        StateNamespace::Exposed
    } else {
        StateNamespace::Private
    };
    let record = host
        .state(&owner, namespace, &state.stored_state_id)
        .ok_or_else(|| StateError::StateNotFound {
            state_id: state.stored_state_id.clone(),
            component_id: state.component_id.clone(),
        })?;
    Ok((owner, record))
}
