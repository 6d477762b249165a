//! Configuration loading for cfgtree.
//!
//! This module handles:
//! - TOML parsing into configuration trees, and rendering back
//! - Directory cascade discovery
//! - Layering discovered files into one effective context

pub mod cascade;
pub mod context;
pub mod parser;
pub mod types;

pub use cascade::{
	discover_layers, discover_project_layers, load_layers, merge_layers, user_config_path,
};
pub use context::ConfigContext;
pub use parser::{parse_config_file, parse_config_str, to_toml_string};
pub use types::LoadedLayer;
