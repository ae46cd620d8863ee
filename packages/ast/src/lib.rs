//! # Weave AST
//!
//! The shared data model for the weave binding engine: schema types and
//! fields, the stored token union, expressions, and the compiled query tree
//! IR.
//!
//! Everything in this crate is plain data. Tokens are authored in the
//! editor, persisted as JSON, and rehydrated here; behavior (filter
//! capabilities, connectors) lives behind registries in the downstream
//! crates.

pub mod tokens;
pub mod tree;
pub mod types;

pub use tokens::{
    Expression, FilterToken, OptionMap, PropertyTarget, PropertyToken, StateToken, Token,
    FIXED_VALUE_FIELD_ID,
};
pub use tree::QueryTree;
pub use types::{
    builtin_scalars, is_builtin_type, ComponentId, DataSourceId, Field, FieldArgument, FieldId,
    PageId, PersistentId, Type, TypeId, TypeKind, UNKNOWN_TYPE_ID,
};
