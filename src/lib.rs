//! cfgtree - hierarchical configuration trees with type-checked layered merging.
//!
//! This library provides:
//! - A configuration tree whose nested mappings are always sections
//! - Deferred entries resolved with caller-supplied arguments on lookup
//! - Deep merging of an override tree onto a base tree
//! - TOML loading, directory cascade discovery and a run-wide config context
//! - Read group extraction driven by configuration
//!
//! # Example
//!
//! ```
//! use cfgtree::{config_tree, merge};
//!
//! let defaults = config_tree! {
//!     "foo" => "bar",
//!     "bar" => { "foo" => "foobar", "bar" => "foo" },
//! };
//! let overrides = config_tree! { "bar" => { "foo" => "customfoo" } };
//!
//! let merged = merge(&defaults, &overrides).unwrap();
//! assert_eq!(merged.get_path("bar.foo", &[]).unwrap().as_str(), Some("customfoo"));
//! assert_eq!(merged.get_path("bar.bar", &[]).unwrap().as_str(), Some("foo"));
//! ```

pub mod config;
pub mod error;
pub mod merge;
pub mod readgroup;
pub mod tree;

pub use error::{ConfigError, Result};
pub use merge::{MergeOptions, UnknownKeyPolicy, merge, merge_entry, merge_with};
pub use tree::{Arity, ConfigTree, Deferred, Entry, Scalar};
