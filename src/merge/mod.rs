//! Layered merging of configuration trees.
//!
//! This module handles:
//! - Deep merging of an override tree onto a base tree
//! - Rejection of values that would be turned into sections
//! - The policy for override keys the base section does not know

pub mod engine;
pub mod policy;

pub use engine::{merge, merge_entry, merge_with};
pub use policy::{MergeOptions, UnknownKeyPolicy};
