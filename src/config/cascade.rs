use crate::config::parser::parse_config_file;
use crate::config::types::LoadedLayer;
use crate::error::{ConfigError, Result};
use crate::merge::{MergeOptions, merge_with};
use crate::tree::ConfigTree;
use std::path::{Path, PathBuf};

/// File name looked for in each directory of the cascade.
pub const CONFIG_FILE_NAME: &str = ".cfgtree.toml";

/// Environment variable that, if truthy, skips the user config.
pub const NO_USER_CONFIG_ENV: &str = "CFGTREE_NO_USER_CONFIG";

/// Discover and load all config files in the cascade.
///
/// The cascade order is:
/// 1. Start from `start_dir` and look for `.cfgtree.toml`
/// 2. Continue up the directory tree to the filesystem root
/// 3. Finally, check ~/.cfgtree.toml (unless disabled)
///
/// Returns layers in cascade order (most specific first).
pub fn discover_layers(start_dir: &Path) -> Result<Vec<LoadedLayer>> {
	let mut layers = discover_project_layers(start_dir)?;

	if let Some(user_layer) = load_user_layer(&layers)? {
		layers.push(user_layer);
	}

	Ok(layers)
}

/// Walk from `start_dir` to the filesystem root, loading every config file found.
///
/// Returns layers most specific first.
pub fn discover_project_layers(start_dir: &Path) -> Result<Vec<LoadedLayer>> {
	let mut layers = Vec::new();
	let mut current_dir = Some(start_dir);

	while let Some(dir) = current_dir {
		let config_path = dir.join(CONFIG_FILE_NAME);

		if config_path.is_file() {
			tracing::debug!(path = %config_path.display(), "found config layer");
			let tree = parse_config_file(&config_path)?;
			layers.push(LoadedLayer {
				tree,
				path: config_path,
			});
		}

		current_dir = dir.parent();
	}

	Ok(layers)
}

/// Load the user's ~/.cfgtree.toml if it exists, isn't disabled, and wasn't
/// already picked up by the directory walk.
fn load_user_layer(existing_layers: &[LoadedLayer]) -> Result<Option<LoadedLayer>> {
	if is_env_truthy(NO_USER_CONFIG_ENV) {
		tracing::debug!("user config disabled by {}", NO_USER_CONFIG_ENV);
		return Ok(None);
	}

	let user_config_path = user_config_path()?;
	if existing_layers.iter().any(|layer| layer.path == user_config_path) {
		return Ok(None);
	}

	if user_config_path.is_file() {
		let tree = parse_config_file(&user_config_path)?;
		Ok(Some(LoadedLayer {
			tree,
			path: user_config_path,
		}))
	} else {
		Ok(None)
	}
}

/// Check if an environment variable is set to a truthy value.
fn is_env_truthy(var_name: &str) -> bool {
	match std::env::var(var_name) {
		Ok(value) => is_truthy(&value),
		Err(_) => false,
	}
}

fn is_truthy(value: &str) -> bool {
	let lower = value.to_lowercase();
	!value.is_empty() && lower != "0" && lower != "false" && lower != "no"
}

/// Load explicitly named config files, keeping the given order.
pub fn load_layers(paths: &[PathBuf]) -> Result<Vec<LoadedLayer>> {
	paths
		.iter()
		.map(|path| -> Result<LoadedLayer> {
			Ok(LoadedLayer {
				tree: parse_config_file(path)?,
				path: path.clone(),
			})
		})
		.collect()
}

/// Layer `layers` over `base`, least specific first, so the last layer wins.
///
/// A failure is reported against the file that caused it.
pub fn merge_layers(
	base: ConfigTree,
	layers: &[LoadedLayer],
	options: &MergeOptions,
) -> Result<ConfigTree> {
	layers.iter().try_fold(base, |merged, layer| {
		tracing::debug!(path = %layer.path.display(), "merging config layer");
		merge_with(&merged, &layer.tree, options).map_err(|source| {
			ConfigError::LayerMergeError {
				path: layer.path.clone(),
				source: Box::new(source),
			}
		})
	})
}

/// Get the path to the user's config file.
pub fn user_config_path() -> Result<PathBuf> {
	let home_dir = dirs::home_dir().ok_or(ConfigError::HomeDirectoryNotFound)?;
	Ok(home_dir.join(CONFIG_FILE_NAME))
}
