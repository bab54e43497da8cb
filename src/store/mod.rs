//! Defines the forecast graph data model and its index-based arena.
pub mod registry;
pub mod types;

pub use registry::Registry;
pub use types::*;
