//! Trait definitions for resource kinds.
//!
//! Each resource kind implements [`Resource`], supplying its endpoint
//! metadata and field constraints. Generic models and query sets do the
//! rest.

mod resource;

pub use resource::{Properties, Resource};
