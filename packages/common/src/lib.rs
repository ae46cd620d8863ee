//! # Weave Common
//!
//! Shared plumbing with no domain knowledge of its own. Currently the
//! subscribe/emit surface used by the data-source and preview-loader event
//! APIs.

pub mod events;

pub use events::{EventEmitter, ListenerId};
