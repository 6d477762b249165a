use crate::error::{ConfigError, Result};
use crate::tree::entry::Entry;
use indexmap::IndexMap;
use std::borrow::Cow;

/// A configuration section: an insertion-ordered mapping from key to [`Entry`].
///
/// Cloning produces a deep copy of every nested section; only deferred
/// callables are shared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
	entries: IndexMap<String, Entry>,
}

impl ConfigTree {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build a tree from an optional base tree plus keyword entries.
	///
	/// Keyword entries are applied after the base and win on key collision.
	pub fn compose<I, K, V>(positional: Option<ConfigTree>, keywords: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<Entry>,
	{
		let mut tree = positional.unwrap_or_default();
		tree.extend(keywords);
		tree
	}

	/// Store `value` under `key`, returning the entry it replaced.
	///
	/// A replaced key keeps its original position.
	pub fn set(&mut self, key: impl Into<String>, value: impl Into<Entry>) -> Option<Entry> {
		self.entries.insert(key.into(), value.into())
	}

	/// Remove `key`, preserving the order of the remaining entries.
	pub fn remove(&mut self, key: &str) -> Option<Entry> {
		self.entries.shift_remove(key)
	}

	/// Ensure a nested section named `name` exists and return it.
	///
	/// Idempotent for an existing section. Fails if `name` already holds a
	/// non-section value.
	pub fn add_section(&mut self, name: impl Into<String>) -> Result<&mut ConfigTree> {
		let name = name.into();
		let entry = self
			.entries
			.entry(name.clone())
			.or_insert_with(|| Entry::Section(ConfigTree::new()));

		match entry {
			Entry::Section(section) => Ok(section),
			other => Err(ConfigError::TypeMismatch {
				key: name,
				expected: "section",
				found: other.kind(),
			}),
		}
	}

	/// Look up `key`, resolving deferred entries with `args`.
	///
	/// Stored sections, scalars and sequences are returned as-is and `args`
	/// is ignored for them.
	pub fn get(&self, key: &str, args: &[Entry]) -> Result<Cow<'_, Entry>> {
		resolve(self.entries.get(key), key, args)
	}

	/// Like [`get`](Self::get), but returns `default` when `key` is absent.
	pub fn get_or(&self, key: &str, args: &[Entry], default: Entry) -> Result<Cow<'_, Entry>> {
		match self.entries.get(key) {
			Some(entry) => resolve(Some(entry), key, args),
			None => Ok(Cow::Owned(default)),
		}
	}

	/// Look up a dotted path such as `bio.ngs.settings.center`.
	///
	/// Keys are split on every `.`, so a key that itself contains a dot
	/// cannot be named here. Use [`get_in`](Self::get_in) for those.
	pub fn get_path(&self, path: &str, args: &[Entry]) -> Result<Cow<'_, Entry>> {
		let segments: Vec<&str> = path.split('.').collect();
		self.get_in(&segments, args)
	}

	/// Look up a path given as separate key segments. Segments are used
	/// verbatim, dots included.
	pub fn get_in(&self, segments: &[&str], args: &[Entry]) -> Result<Cow<'_, Entry>> {
		let Some((leaf, parents)) = segments.split_last() else {
			return Err(ConfigError::KeyNotFound { key: String::new() });
		};
		let section = self.section_in(parents)?;
		resolve(section.entries.get(*leaf), &join_segments(segments), args)
	}

	/// Walk a dotted path of section names. The empty path is `self`.
	pub fn section_at(&self, path: &str) -> Result<&ConfigTree> {
		if path.is_empty() {
			return Ok(self);
		}
		let segments: Vec<&str> = path.split('.').collect();
		self.section_in(&segments)
	}

	/// Walk a path of section names given as separate segments.
	/// No segments means `self`.
	pub fn section_in(&self, segments: &[&str]) -> Result<&ConfigTree> {
		let mut current = self;
		for (depth, name) in segments.iter().enumerate() {
			current = match current.entries.get(*name) {
				Some(Entry::Section(section)) => section,
				Some(other) => {
					return Err(ConfigError::TypeMismatch {
						key: join_segments(&segments[..=depth]),
						expected: "section",
						found: other.kind(),
					});
				}
				None => {
					return Err(ConfigError::KeyNotFound {
						key: join_segments(&segments[..=depth]),
					});
				}
			};
		}
		Ok(current)
	}

	/// Raw access without deferred resolution.
	pub fn entry(&self, key: &str) -> Option<&Entry> {
		self.entries.get(key)
	}

	pub fn entry_mut(&mut self, key: &str) -> Option<&mut Entry> {
		self.entries.get_mut(key)
	}

	pub fn section(&self, key: &str) -> Option<&ConfigTree> {
		self.entries.get(key).and_then(Entry::as_section)
	}

	pub fn section_mut(&mut self, key: &str) -> Option<&mut ConfigTree> {
		self.entries.get_mut(key).and_then(Entry::as_section_mut)
	}

	/// Names of the keys currently holding a nested section, in insertion order.
	pub fn sections(&self) -> Vec<&str> {
		self.entries
			.iter()
			.filter(|(_, entry)| entry.is_section())
			.map(|(key, _)| key.as_str())
			.collect()
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.entries.contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(String::as_str)
	}

	pub fn values(&self) -> impl Iterator<Item = &Entry> {
		self.entries.values()
	}

	pub fn iter(&self) -> indexmap::map::Iter<'_, String, Entry> {
		self.entries.iter()
	}
}

/// Join key segments for error messages, quoting any segment that holds a dot.
pub(crate) fn join_segments(segments: &[&str]) -> String {
	segments
		.iter()
		.map(|segment| quote_segment(segment))
		.collect::<Vec<_>>()
		.join(".")
}

/// Quote a key segment TOML-style when it contains a dot.
pub(crate) fn quote_segment(segment: &str) -> String {
	if segment.contains('.') {
		format!("{:?}", segment)
	} else {
		segment.to_string()
	}
}

fn resolve<'a>(entry: Option<&'a Entry>, key: &str, args: &[Entry]) -> Result<Cow<'a, Entry>> {
	match entry {
		Some(Entry::Deferred(deferred)) => deferred.call(key, args).map(Cow::Owned),
		Some(entry) => Ok(Cow::Borrowed(entry)),
		None => Err(ConfigError::KeyNotFound {
			key: key.to_string(),
		}),
	}
}

impl<K: Into<String>, V: Into<Entry>> FromIterator<(K, V)> for ConfigTree {
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		let mut tree = ConfigTree::new();
		tree.extend(iter);
		tree
	}
}

/// Shallow update: incoming entries overwrite existing keys wholesale.
impl<K: Into<String>, V: Into<Entry>> Extend<(K, V)> for ConfigTree {
	fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
		for (key, value) in iter {
			self.set(key, value);
		}
	}
}

impl<'a> IntoIterator for &'a ConfigTree {
	type Item = (&'a String, &'a Entry);
	type IntoIter = indexmap::map::Iter<'a, String, Entry>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.iter()
	}
}

impl IntoIterator for ConfigTree {
	type Item = (String, Entry);
	type IntoIter = indexmap::map::IntoIter<String, Entry>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.into_iter()
	}
}
