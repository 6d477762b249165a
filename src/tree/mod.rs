//! The configuration tree data model.
//!
//! This module handles:
//! - Entries: scalars, sequences, deferred values and nested sections
//! - Promotion of mapping-shaped input into sections at every depth
//! - Keyed and dotted-path lookup with deferred resolution

pub mod config_tree;
pub mod entry;
mod macros;

pub use config_tree::ConfigTree;
pub use entry::{Arity, Deferred, Entry, Scalar};
