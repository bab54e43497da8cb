//! Human-readable renderings for inspection and debugging.
pub mod trace;

pub use trace::format_trace;
