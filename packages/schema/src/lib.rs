//! # Weave Schema
//!
//! The schema/type registry: aggregates the type declarations exposed by
//! every connected data source together with the built-in scalars, and
//! answers the lookups the resolver and tree builder need. Pure lookup;
//! the only mutation is wholesale per-source replacement when a source
//! reports ready/changed.

pub mod registry;

pub use registry::TypeRegistry;
