//! # Weave Query
//!
//! The query-compilation half of the binding engine: turns the many
//! independent expressions used across a document into one deduplicated
//! query tree per data source, and renders them through each connector.
//!
//! Pipeline: collected expressions → (per data source) filter →
//! [`builder::build_trees`] → [`merge::merge_tree_group`] → connector
//! `get_query` → query string, aggregated per page by
//! [`compiler::QueryCompiler`].

pub mod builder;
pub mod compiler;
pub mod error;
pub mod merge;

pub use builder::{build_trees, TreeContext};
pub use compiler::QueryCompiler;
pub use error::{QueryError, QueryResult};
pub use merge::{merge_tree_group, merge_trees};
