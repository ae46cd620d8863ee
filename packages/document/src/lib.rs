//! # Weave Document
//!
//! The host/editor contract consumed by the binding core, plus an in-memory
//! implementation for tests and headless embedding.
//!
//! The core never holds a strong reference to a component: state tokens
//! address their owning component by persistent id, and
//! [`resolve_state_component`] turns that id back into a handle with a pure
//! ancestor walk.

pub mod host;
pub mod memory;

pub use host::{
    resolve_state_component, DocumentHost, StateNamespace, StateRecord,
};
pub use memory::{DocumentError, DocumentResult, InMemoryDocument};
