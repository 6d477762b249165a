use crate::tree::ConfigTree;
use std::path::PathBuf;

/// A configuration tree with the file it was loaded from, for debugging/display.
#[derive(Debug, Clone)]
pub struct LoadedLayer {
	/// The parsed tree.
	pub tree: ConfigTree,

	/// The path this layer was loaded from.
	pub path: PathBuf,
}
