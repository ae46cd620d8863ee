//! # Weave Expressions
//!
//! The expression half of the binding engine:
//!
//! - [`resolver`]: the tolerant type-inference walk over token chains,
//!   used for completion and validation while the user composes bindings.
//! - [`collector`]: gathers every expression in use across a component
//!   tree (state bindings and attribute values that embed an expression).
//! - [`filters`]: the capability contract filters are rehydrated against.
//! - [`state`]: strict flattening of state back-references, with cycle
//!   detection.
//! - [`evaluator`]: the runtime interpreter resolving an expression to a
//!   concrete value against fetched preview data.
//!
//! Two error regimes apply deliberately: resolution degrades to "no result"
//! per step and never aborts a batch; evaluation and state flattening fail
//! loudly on broken bindings.

pub mod collector;
pub mod evaluator;
pub mod filters;
pub mod resolver;
pub mod state;

pub use collector::{collect_expressions, CollectedExpression};
pub use evaluator::{evaluate, EvalContext, EvalError, EvalResult};
pub use filters::{FilterCapability, FilterError, FilterRegistry};
pub use resolver::{resolve_expression, resolve_step, ResolveContext};
pub use state::{resolve_state_tokens, StateError};
