use crate::config::cascade::{discover_layers, merge_layers};
use crate::config::types::LoadedLayer;
use crate::error::Result;
use crate::merge::MergeOptions;
use crate::tree::{ConfigTree, Entry};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// The effective configuration of a run.
///
/// Built once at startup from a defaults tree plus any number of layers, then
/// handed by reference to whatever needs settings.
#[derive(Debug, Clone, Default)]
pub struct ConfigContext {
	tree: ConfigTree,
	sources: Vec<PathBuf>,
}

impl ConfigContext {
	pub fn new(defaults: ConfigTree) -> Self {
		ConfigContext {
			tree: defaults,
			sources: Vec::new(),
		}
	}

	/// Layer files over `defaults`, least specific first.
	pub fn from_layers(
		defaults: ConfigTree,
		layers: &[LoadedLayer],
		options: &MergeOptions,
	) -> Result<Self> {
		let tree = merge_layers(defaults, layers, options)?;
		Ok(ConfigContext {
			tree,
			sources: layers.iter().map(|layer| layer.path.clone()).collect(),
		})
	}

	/// Discover the cascade from `start_dir` and layer it over `defaults`,
	/// so the file nearest to `start_dir` wins.
	pub fn discover(defaults: ConfigTree, start_dir: &Path, options: &MergeOptions) -> Result<Self> {
		let mut layers = discover_layers(start_dir)?;
		layers.reverse();
		Self::from_layers(defaults, &layers, options)
	}

	/// Layer one more tree on top, e.g. overrides from the command line.
	pub fn layer(mut self, layer: &LoadedLayer, options: &MergeOptions) -> Result<Self> {
		self.tree = merge_layers(self.tree, std::slice::from_ref(layer), options)?;
		self.sources.push(layer.path.clone());
		Ok(self)
	}

	pub fn tree(&self) -> &ConfigTree {
		&self.tree
	}

	pub fn into_tree(self) -> ConfigTree {
		self.tree
	}

	/// Files that contributed to this context, in the order they were applied.
	pub fn sources(&self) -> &[PathBuf] {
		&self.sources
	}

	pub fn section(&self, path: &str) -> Result<&ConfigTree> {
		self.tree.section_at(path)
	}

	pub fn get(&self, path: &str, args: &[Entry]) -> Result<Cow<'_, Entry>> {
		self.tree.get_path(path, args)
	}

	pub fn get_in(&self, segments: &[&str], args: &[Entry]) -> Result<Cow<'_, Entry>> {
		self.tree.get_in(segments, args)
	}
}
