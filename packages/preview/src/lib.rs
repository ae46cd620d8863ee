//! # Weave Preview
//!
//! Orchestrates preview-data fetching across connected data sources.
//!
//! The one piece of concurrency discipline in the engine lives here: every
//! load is stamped with a monotonically increasing generation, and a fetch
//! that settles after a newer load has started must neither write the
//! shared snapshot nor report completion. This protects renders from
//! racing stale network responses when the user edits bindings faster than
//! the network round-trip.

pub mod loader;

pub use loader::{LoadOutcome, PreviewEvent, PreviewLoader};
