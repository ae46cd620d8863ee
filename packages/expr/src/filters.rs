use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use weave_ast::{Field, OptionMap};

#[derive(Error, Debug, Clone, PartialEq)]
#[error("filter '{filter}' failed: {message}")]
pub struct FilterError {
    pub filter: String,
    pub message: String,
}

impl FilterError {
    pub fn new(filter: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            message: message.into(),
        }
    }
}

/// A filter implementation as seen by the core: a behavior-bearing
/// capability looked up by id from the live registry.
///
/// Stored filter tokens retain only id and options; the behavior is never
/// embedded in persisted data.
pub trait FilterCapability: Send + Sync {
    fn id(&self) -> &str;

    /// Whether this filter accepts the given input field type. A `false`
    /// here makes resolution degrade to "no completion", not an error.
    fn validate(&self, input: Option<&Field>) -> bool;

    /// The field produced when applied to the given input.
    fn output(&self, input: Option<&Field>, options: &OptionMap) -> Option<Field>;

    /// Apply the filter to a runtime value. Errors are swallowed by the
    /// evaluator and degrade the step to null.
    fn apply(&self, input: &Value, options: &OptionMap) -> Result<Value, FilterError>;
}

/// Live registry of filter capabilities, keyed by filter id.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Arc<dyn FilterCapability>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, filter: Arc<dyn FilterCapability>) {
        self.filters.insert(filter.id().to_string(), filter);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn FilterCapability>> {
        self.filters.get(id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        self.filters.keys().cloned().collect()
    }
}

impl std::fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("filters", &self.ids())
            .finish()
    }
}
