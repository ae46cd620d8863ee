//! The runtime interpreter: resolves an expression to a concrete value
//! against fetched preview data for a specific component.
//!
//! Evaluation is synchronous, single-threaded, and input-immutable:
//! tokens are copied up front (state flattening clones), so the transient
//! per-row preview indices written during loop rendering never leak back
//! into stored token data. Re-evaluating the same expression against the
//! same context and seed yields the same value.

use crate::filters::FilterRegistry;
use crate::state::{resolve_state_tokens, StateError};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;
use weave_ast::{ComponentId, DataSourceId, Expression, OptionMap, Token};
use weave_document::DocumentHost;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// The expression references a filter id with no live capability:
    /// a broken binding, not a normal absence.
    #[error("unknown filter '{id}' referenced by expression")]
    UnknownFilter { id: String },

    #[error(transparent)]
    State(#[from] StateError),
}

pub type EvalResult<T> = Result<T, EvalError>;

/// Everything evaluation needs, bundled explicitly.
pub struct EvalContext<'a> {
    pub host: &'a dyn DocumentHost,
    pub filters: &'a FilterRegistry,
    /// The most recently fetched values per data source. Read-only here;
    /// only the preview loader writes it.
    pub preview_data: &'a HashMap<DataSourceId, Value>,
    pub component: ComponentId,
    /// When set, list-valued results are always stepped into (row 0 unless
    /// a token carries its own preview index), even for the final token.
    pub resolve_preview_index: bool,
}

/// Evaluate an expression to a value, optionally seeded with a previously
/// computed value (loop bodies re-enter here per row).
pub fn evaluate(
    expression: &Expression,
    ctx: &EvalContext<'_>,
    seed: Option<Value>,
) -> EvalResult<Option<Value>> {
    // State flattening substitutes state bindings and leaves evaluation
    // working on its own copy of the tokens.
    let tokens = resolve_state_tokens(expression, ctx.host, &ctx.component)?;
    eval_tokens(&tokens, ctx, seed)
}

fn eval_tokens(
    tokens: &[Token],
    ctx: &EvalContext<'_>,
    seed: Option<Value>,
) -> EvalResult<Option<Value>> {
    let Some((head, rest)) = tokens.split_first() else {
        return Ok(seed);
    };
    match head {
        Token::Property(property) if property.is_fixed() => {
            // A fixed value ignores whatever was computed before it.
            let literal = property.fixed_value().cloned().unwrap_or(Value::Null);
            eval_tokens(rest, ctx, Some(literal))
        }
        Token::Property(property) => {
            let container = match seed {
                Some(value) => value,
                None => {
                    let Some(source) = property.data_source_id.as_deref() else {
                        return Ok(None);
                    };
                    match ctx.preview_data.get(source) {
                        Some(value) => value.clone(),
                        None => return Ok(None),
                    }
                }
            };
            let Some(value) = container.get(property.field_id.as_str()).cloned() else {
                return Ok(None);
            };
            let value = step_into_rows(value, property.preview_index, !rest.is_empty(), ctx);
            eval_tokens(rest, ctx, Some(value))
        }
        Token::Filter(filter) => {
            let options = eval_filter_options(&filter.options, ctx)?;
            let capability = ctx
                .filters
                .get(&filter.id)
                .ok_or_else(|| EvalError::UnknownFilter {
                    id: filter.id.clone(),
                })?;
            let input = seed.unwrap_or(Value::Null);
            let value = match capability.apply(&input, &options) {
                Ok(value) => value,
                Err(err) => {
                    debug!(filter = %filter.id, error = %err, "filter failed, step yields null");
                    Value::Null
                }
            };
            let value = step_into_rows(value, filter.preview_index, !rest.is_empty(), ctx);
            eval_tokens(rest, ctx, Some(value))
        }
        Token::State(_) => {
            // evaluate() pre-flattens; direct callers may still hand us a
            // state token, so flatten the remaining chain and continue.
            let flattened = resolve_state_tokens(
                &Expression::new(tokens.to_vec()),
                ctx.host,
                &ctx.component,
            )?;
            eval_tokens(&flattened, ctx, seed)
        }
    }
}

/// Step into one row of a list-valued result. This is how the evaluator
/// enters a loop's data: the transient preview index selects the row, and
/// a chain that continues past a list always steps into it.
fn step_into_rows(
    value: Value,
    preview_index: Option<usize>,
    has_more_tokens: bool,
    ctx: &EvalContext<'_>,
) -> Value {
    match value {
        Value::Array(items)
            if preview_index.is_some() || ctx.resolve_preview_index || has_more_tokens =>
        {
            items
                .into_iter()
                .nth(preview_index.unwrap_or(0))
                .unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Filter options may themselves be embedded expressions referencing live
/// data; resolve each to a concrete value before applying the filter.
fn eval_filter_options(options: &OptionMap, ctx: &EvalContext<'_>) -> EvalResult<OptionMap> {
    let mut resolved = OptionMap::new();
    for (name, value) in options {
        let concrete = match Expression::parse(value) {
            Some(expression) if !expression.is_empty() => {
                evaluate(&expression, ctx, None)?.unwrap_or(Value::Null)
            }
            _ => value.clone(),
        };
        resolved.insert(name.clone(), concrete);
    }
    Ok(resolved)
}
