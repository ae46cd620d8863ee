//! # Weave Runtime
//!
//! The engine handle tying the binding pipeline together: one explicitly
//! constructed [`BindingEngine`] owns the type registry, filter registry,
//! registered data sources, and the preview loader, and is passed to every
//! entry point; there is no ambient global state.

pub mod engine;

pub use engine::BindingEngine;
