use crate::error::{ConfigError, Result};
use crate::tree::config_tree::quote_segment;
use crate::tree::{ConfigTree, Entry, Scalar};
use std::path::Path;

/// Parse a config file from the given path.
pub fn parse_config_file(path: &Path) -> Result<ConfigTree> {
	let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ConfigReadError {
		path: path.to_path_buf(),
		source,
	})?;

	parse_config_str(&content, path)
}

/// Parse a config from a string (useful for testing).
pub fn parse_config_str(content: &str, path: &Path) -> Result<ConfigTree> {
	let table: toml::Table =
		toml::from_str(content).map_err(|source| ConfigError::ConfigParseError {
			path: path.to_path_buf(),
			source,
		})?;

	ConfigTree::try_from(table)
}

impl TryFrom<toml::Table> for ConfigTree {
	type Error = ConfigError;

	fn try_from(table: toml::Table) -> Result<Self> {
		tree_from_table(table, "")
	}
}

fn tree_from_table(table: toml::Table, prefix: &str) -> Result<ConfigTree> {
	let mut tree = ConfigTree::new();
	for (key, value) in table {
		let path = if prefix.is_empty() {
			quote_segment(&key)
		} else {
			format!("{}.{}", prefix, quote_segment(&key))
		};
		let entry = entry_from_value(value, &path)?;
		tree.set(key, entry);
	}
	Ok(tree)
}

fn entry_from_value(value: toml::Value, path: &str) -> Result<Entry> {
	match value {
		toml::Value::Table(table) => Ok(Entry::Section(tree_from_table(table, path)?)),
		toml::Value::Array(items) => {
			let scalars = items
				.into_iter()
				.map(|item| scalar_from_value(item, path))
				.collect::<Result<Vec<_>>>()?;
			Ok(Entry::Sequence(scalars))
		}
		other => scalar_from_value(other, path).map(Entry::Scalar),
	}
}

fn scalar_from_value(value: toml::Value, path: &str) -> Result<Scalar> {
	match value {
		toml::Value::String(s) => Ok(Scalar::String(s)),
		toml::Value::Integer(i) => Ok(Scalar::Integer(i)),
		toml::Value::Float(x) => Ok(Scalar::Float(x)),
		toml::Value::Boolean(b) => Ok(Scalar::Bool(b)),
		toml::Value::Datetime(dt) => Ok(Scalar::String(dt.to_string())),
		toml::Value::Array(_) => Err(ConfigError::UnsupportedValue {
			key: path.to_string(),
			kind: "nested array",
		}),
		toml::Value::Table(_) => Err(ConfigError::UnsupportedValue {
			key: path.to_string(),
			kind: "array of tables",
		}),
	}
}

/// Render a tree as TOML.
///
/// Null scalars and deferred entries have no TOML form and are left out.
/// A sequence holding a null is left out whole.
pub fn to_toml_string(tree: &ConfigTree) -> Result<String> {
	let table = table_from_tree(tree, "");
	toml::to_string_pretty(&table).map_err(|source| ConfigError::RenderError { source })
}

fn table_from_tree(tree: &ConfigTree, prefix: &str) -> toml::Table {
	let mut table = toml::Table::new();
	for (key, entry) in tree {
		let path = if prefix.is_empty() {
			quote_segment(key)
		} else {
			format!("{}.{}", prefix, quote_segment(key))
		};
		let value = match entry {
			Entry::Scalar(scalar) => scalar_to_value(scalar),
			// All or nothing, so element positions never shift.
			Entry::Sequence(items) => items
				.iter()
				.map(scalar_to_value)
				.collect::<Option<Vec<_>>>()
				.map(toml::Value::Array),
			Entry::Section(section) => Some(toml::Value::Table(table_from_tree(section, &path))),
			Entry::Deferred(_) => None,
		};

		match value {
			Some(value) => {
				table.insert(key.clone(), value);
			}
			None => tracing::debug!(key = %path, kind = entry.kind(), "omitted from TOML output"),
		}
	}
	table
}

fn scalar_to_value(scalar: &Scalar) -> Option<toml::Value> {
	match scalar {
		Scalar::Null => None,
		Scalar::Bool(b) => Some(toml::Value::Boolean(*b)),
		Scalar::Integer(i) => Some(toml::Value::Integer(*i)),
		Scalar::Float(x) => Some(toml::Value::Float(*x)),
		Scalar::String(s) => Some(toml::Value::String(s.clone())),
	}
}
