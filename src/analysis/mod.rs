//! Structural graph analysis shared by the validator and the tree builder.
pub mod topology;
