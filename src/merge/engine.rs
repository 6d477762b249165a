use crate::error::{ConfigError, Result};
use crate::merge::policy::{MergeOptions, UnknownKeyPolicy};
use crate::tree::config_tree::quote_segment;
use crate::tree::{ConfigTree, Entry};

/// Label used for errors about the top-level operands themselves.
const ROOT_KEY: &str = "(root)";

/// Layer `source` over `target` with default options.
///
/// Neither operand is modified; the merged tree is returned.
pub fn merge(target: &ConfigTree, source: &ConfigTree) -> Result<ConfigTree> {
	merge_with(target, source, &MergeOptions::default())
}

/// Layer `source` over `target`.
///
/// Rules, per key of `source`:
/// - a section over an existing section merges recursively
/// - a section over an absent key is adopted as a copy
/// - a section over an existing non-section value is a type mismatch
/// - any other value overwrites whatever `target` held, sections included
///
/// Keys only present in `target` are kept. Work happens on a copy of
/// `target`, so a failed merge leaves nothing half-applied.
pub fn merge_with(
	target: &ConfigTree,
	source: &ConfigTree,
	options: &MergeOptions,
) -> Result<ConfigTree> {
	let mut merged = target.clone();
	merge_into(&mut merged, source, options, "")?;
	Ok(merged)
}

/// Layer an arbitrary entry over `target`. Only a section can be layered.
pub fn merge_entry(
	target: &ConfigTree,
	source: &Entry,
	options: &MergeOptions,
) -> Result<ConfigTree> {
	match source {
		Entry::Section(section) => merge_with(target, section, options),
		other => Err(ConfigError::TypeMismatch {
			key: ROOT_KEY.to_string(),
			expected: "section",
			found: other.kind(),
		}),
	}
}

impl ConfigTree {
	/// Layer `source` over `self`.
	///
	/// On error `self` is left exactly as it was.
	pub fn merge_in_place(&mut self, source: &ConfigTree, options: &MergeOptions) -> Result<()> {
		*self = merge_with(self, source, options)?;
		Ok(())
	}
}

fn merge_into(
	target: &mut ConfigTree,
	source: &ConfigTree,
	options: &MergeOptions,
	prefix: &str,
) -> Result<()> {
	for (key, value) in source {
		let path = join_path(prefix, key);

		if !prefix.is_empty() && !target.contains_key(key) {
			check_unknown_key(&path, options.unknown_keys)?;
		}

		match value {
			Entry::Section(source_section) => match target.entry_mut(key) {
				Some(Entry::Section(target_section)) => {
					merge_into(target_section, source_section, options, &path)?;
				}
				Some(existing) => {
					return Err(ConfigError::TypeMismatch {
						key: path,
						expected: "section",
						found: existing.kind(),
					});
				}
				None => {
					tracing::debug!(key = %path, "adopting new section");
					target.set(key.as_str(), source_section.clone());
				}
			},
			leaf => {
				let previous = target.set(key.as_str(), leaf.clone());
				if let Some(previous) = previous
					&& previous.is_section()
				{
					tracing::debug!(key = %path, kind = leaf.kind(), "section replaced by value");
				}
			}
		}
	}

	Ok(())
}

fn check_unknown_key(path: &str, policy: UnknownKeyPolicy) -> Result<()> {
	match policy {
		UnknownKeyPolicy::Accept => Ok(()),
		UnknownKeyPolicy::Warn => {
			tracing::warn!(key = %path, "override key is not defined in the base section");
			Ok(())
		}
		UnknownKeyPolicy::Reject => Err(ConfigError::UnknownKey {
			key: path.to_string(),
		}),
	}
}

fn join_path(prefix: &str, key: &str) -> String {
	if prefix.is_empty() {
		quote_segment(key)
	} else {
		format!("{}.{}", prefix, quote_segment(key))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config_tree;
	use crate::tree::Deferred;

	fn default_tree() -> ConfigTree {
		config_tree! {
			"foo" => "bar",
			"bar" => { "foo" => "foobar", "bar" => "foo" },
		}
	}

	fn default_nested() -> ConfigTree {
		config_tree! {
			"foo" => "bar",
			"bar" => { "foo" => "foobar", "bar" => { "foo" => "bar" } },
		}
	}

	fn custom_nested() -> ConfigTree {
		config_tree! { "bar" => { "bar" => { "bar" => "customfoo" } } }
	}

	fn accept_all() -> MergeOptions {
		MergeOptions::default().with_unknown_keys(UnknownKeyPolicy::Accept)
	}

	#[test]
	fn test_merge_disjoint_keys_is_union() {
		let a = config_tree! { "foo" => "bar", "nested" => { "x" => 1 } };
		let b = config_tree! { "bar" => "foo", "list" => ["a", "b"] };

		let merged = merge(&a, &b).unwrap();
		assert_eq!(
			merged,
			config_tree! {
				"foo" => "bar",
				"nested" => { "x" => 1 },
				"bar" => "foo",
				"list" => ["a", "b"],
			}
		);
	}

	#[test]
	fn test_merge_leaf_override() {
		let merged = merge(&config_tree! { "foo" => "bar" }, &config_tree! { "foo" => "baz" }).unwrap();
		assert_eq!(merged, config_tree! { "foo" => "baz" });
	}

	#[test]
	fn test_merge_nested_override_keeps_siblings() {
		let source = config_tree! { "bar" => { "foo" => "customfoo" } };
		let merged = merge(
			&config_tree! { "bar" => { "foo" => "foobar", "bar" => "foo" } },
			&source,
		)
		.unwrap();

		assert_eq!(
			merged,
			config_tree! { "bar" => { "foo" => "customfoo", "bar" => "foo" } }
		);
	}

	#[test]
	fn test_merge_section_over_value_rejected() {
		let target = config_tree! { "bar" => { "bar" => "test" } };
		let source = config_tree! { "bar" => { "bar" => { "foo" => "bar" } } };

		match merge(&target, &source).unwrap_err() {
			ConfigError::TypeMismatch {
				key,
				expected,
				found,
			} => {
				assert_eq!(key, "bar.bar");
				assert_eq!(expected, "section");
				assert_eq!(found, "string");
			}
			other => panic!("Expected TypeMismatch error, got {other:?}"),
		}
	}

	#[test]
	fn test_merge_error_quotes_dotted_keys() {
		let target = config_tree! { "a.b" => { "c" => "flat" } };
		let source = config_tree! { "a.b" => { "c" => { "d" => 1_i64 } } };

		match merge(&target, &source).unwrap_err() {
			ConfigError::TypeMismatch { key, .. } => assert_eq!(key, "\"a.b\".c"),
			other => panic!("Expected TypeMismatch error, got {other:?}"),
		}
	}

	#[test]
	fn test_merge_custom_over_nested_default_rejected() {
		let custom = config_tree! { "bar" => { "bar" => "test" } };
		let result = merge(&custom, &default_nested());
		assert!(matches!(result, Err(ConfigError::TypeMismatch { .. })));
	}

	#[test]
	fn test_merge_non_section_source_rejected() {
		let result = merge_entry(&default_tree(), &Entry::from("foo"), &MergeOptions::default());
		match result.unwrap_err() {
			ConfigError::TypeMismatch { key, found, .. } => {
				assert_eq!(key, ROOT_KEY);
				assert_eq!(found, "string");
			}
			other => panic!("Expected TypeMismatch error, got {other:?}"),
		}
	}

	#[test]
	fn test_merge_entry_accepts_section() {
		let source = Entry::from(config_tree! { "foo" => "baz" });
		let merged = merge_entry(&default_tree(), &source, &MergeOptions::default()).unwrap();
		assert_eq!(merged.entry("foo").unwrap().as_str(), Some("baz"));
	}

	#[test]
	fn test_value_replaces_section() {
		let merged = merge(&default_tree(), &config_tree! { "bar" => "flat" }).unwrap();
		assert_eq!(merged.entry("bar").unwrap().as_str(), Some("flat"));
		assert!(merged.sections().is_empty());
	}

	#[test]
	fn test_new_section_is_adopted_as_copy() {
		let source = config_tree! { "extra" => { "threads" => 8 } };
		let mut merged = merge(&default_tree(), &source).unwrap();
		assert_eq!(merged.sections(), vec!["bar", "extra"]);

		merged.section_mut("extra").unwrap().set("threads", 1);
		assert_eq!(
			source.get_path("extra.threads", &[]).unwrap().as_integer(),
			Some(8)
		);
	}

	#[test]
	fn test_merge_does_not_touch_operands() {
		let target = default_tree();
		let source = config_tree! { "bar" => { "foo" => "customfoo" } };
		let _ = merge(&target, &source).unwrap();

		assert_eq!(target, default_tree());
		assert_eq!(source, config_tree! { "bar" => { "foo" => "customfoo" } });
	}

	#[test]
	fn test_merge_is_not_commutative() {
		let a = config_tree! { "foo" => "bar" };
		let b = config_tree! { "foo" => "foobar" };
		assert_eq!(merge(&a, &b).unwrap(), b);
		assert_eq!(merge(&b, &a).unwrap(), a);

		let nested = config_tree! { "foo" => { "x" => 1 } };
		assert!(merge(&a, &nested).is_err());
		assert_eq!(merge(&nested, &a).unwrap(), a);
	}

	#[test]
	fn test_merge_both_nested_accepts_unknown_keys() {
		let merged = merge_with(&default_nested(), &custom_nested(), &accept_all()).unwrap();
		assert_eq!(
			merged,
			config_tree! {
				"foo" => "bar",
				"bar" => { "foo" => "foobar", "bar" => { "foo" => "bar", "bar" => "customfoo" } },
			}
		);
	}

	#[test]
	fn test_merge_warn_policy_still_applies_key() {
		let merged = merge(&default_nested(), &custom_nested()).unwrap();
		assert_eq!(
			merged.get_path("bar.bar.bar", &[]).unwrap().as_str(),
			Some("customfoo")
		);
	}

	#[test]
	fn test_merge_reject_policy_names_full_path() {
		let options = MergeOptions::default().with_unknown_keys(UnknownKeyPolicy::Reject);
		match merge_with(&default_nested(), &custom_nested(), &options).unwrap_err() {
			ConfigError::UnknownKey { key } => assert_eq!(key, "bar.bar.bar"),
			other => panic!("Expected UnknownKey error, got {other:?}"),
		}
	}

	#[test]
	fn test_reject_policy_ignores_top_level_additions() {
		let options = MergeOptions::default().with_unknown_keys(UnknownKeyPolicy::Reject);
		let merged = merge_with(
			&default_tree(),
			&config_tree! { "new" => "value", "fresh" => { "a" => 1 } },
			&options,
		)
		.unwrap();
		assert!(merged.contains_key("new"));
		assert!(merged.contains_key("fresh"));
	}

	#[test]
	fn test_merge_in_place_applies_on_success() {
		let mut tree = default_tree();
		tree.merge_in_place(
			&config_tree! { "bar" => { "foo" => "customfoo" } },
			&MergeOptions::default(),
		)
		.unwrap();
		assert_eq!(
			tree.get_path("bar.foo", &[]).unwrap().as_str(),
			Some("customfoo")
		);
	}

	#[test]
	fn test_merge_in_place_is_atomic() {
		let mut tree = config_tree! {
			"a" => "original",
			"z" => { "leaf" => "value" },
		};
		let before = tree.clone();
		let source = config_tree! {
			"a" => "changed",
			"z" => { "leaf" => { "deeper" => true } },
		};

		let result = tree.merge_in_place(&source, &MergeOptions::default());
		assert!(result.is_err());
		assert_eq!(tree, before);
	}

	#[test]
	fn test_merge_deferred_value_overwrites() {
		let source = config_tree! { "foo" => (Deferred::template("{}")) };
		let merged = merge(&default_tree(), &source).unwrap();

		assert!(merged.entry("foo").unwrap().is_deferred());
		assert_eq!(
			merged.get("foo", &["x".into()]).unwrap().as_str(),
			Some("x")
		);
	}

	#[test]
	fn test_merge_repeated_layers() {
		let defaults = default_nested();
		let site = config_tree! { "bar" => { "foo" => "site" } };
		let user = config_tree! { "bar" => { "bar" => { "foo" => "user" } } };

		let merged = [site, user]
			.iter()
			.try_fold(defaults, |acc, layer| merge(&acc, layer))
			.unwrap();

		assert_eq!(merged.get_path("bar.foo", &[]).unwrap().as_str(), Some("site"));
		assert_eq!(
			merged.get_path("bar.bar.foo", &[]).unwrap().as_str(),
			Some("user")
		);
		assert_eq!(merged.get("foo", &[]).unwrap().as_str(), Some("bar"));
	}
}
