//! # Weave Data Source
//!
//! The connector contract: every remote schema provider implements
//! [`DataSource`], the core consumes it for introspection (types and
//! queryable root fields), query rendering, and preview fetches.
//!
//! Query rendering is deliberately the connector's job: the tree merger
//! stays connector-agnostic and hands a finished [`QueryTree`] set to
//! [`DataSource::get_query`]. A GraphQL-syntax renderer usable by any
//! GraphQL-family connector ships in [`graphql`]; [`FakeDataSource`] is the
//! in-memory connector used across the test suites.

pub mod fake;
pub mod graphql;

use futures_util::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;
use weave_ast::{DataSourceId, Field, QueryTree, Type};
use weave_common::EventEmitter;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataSourceError {
    #[error("data source '{id}' is not connected")]
    NotConnected { id: DataSourceId },

    #[error("data source '{id}' failed to connect: {message}")]
    Connect { id: DataSourceId, message: String },

    #[error("data source '{id}' fetch failed: {message}")]
    Fetch { id: DataSourceId, message: String },
}

pub type DataSourceResult<T> = Result<T, DataSourceError>;

/// Lifecycle notifications emitted by a connector.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSourceEvent {
    /// Connected and introspected; types/queryables are available.
    Ready,
    /// The remote schema changed; cached types must be recomputed.
    Changed,
    Error(String),
}

/// A connected remote data source (GraphQL endpoint, CMS, mock, ...).
///
/// Async methods return [`BoxFuture`] so the trait stays object-safe; the
/// core holds connectors as `Arc<dyn DataSource>`.
pub trait DataSource: Send + Sync {
    fn id(&self) -> &str;

    fn connect(&self) -> BoxFuture<'_, DataSourceResult<()>>;

    fn is_connected(&self) -> bool;

    /// All types declared by this source's schema.
    fn get_types(&self) -> Vec<Type>;

    /// Root fields eligible as expression starting points.
    fn get_queryables(&self) -> Vec<Field>;

    /// Render a merged tree set into this connector's query syntax.
    fn get_query(&self, trees: &[QueryTree]) -> String;

    fn fetch_values(&self, query: &str) -> BoxFuture<'_, DataSourceResult<Value>>;

    fn events(&self) -> &EventEmitter<DataSourceEvent>;
}

pub use fake::FakeDataSource;
