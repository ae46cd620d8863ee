use thiserror::Error;
use weave_expr::StateError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// A broken state binding discovered during compilation. Unlike the
    /// tolerant type-inference path, this is a user-facing error.
    #[error(transparent)]
    State(#[from] StateError),

    /// The same field is selected twice with different non-empty argument
    /// sets; the target query language cannot alias it, so this is
    /// irreconcilable.
    #[error("conflicting arguments for field '{field_id}': {left} vs {right}")]
    MergeConflict {
        field_id: String,
        left: String,
        right: String,
    },

    /// Internal invariant: pairwise merge called on trees with different
    /// roots. The grouping step prevents this.
    #[error("cannot merge trees rooted at '{left}' and '{right}'")]
    MergeMismatch { left: String, right: String },
}

pub type QueryResult<T> = Result<T, QueryError>;
