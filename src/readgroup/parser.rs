use crate::config_tree;
use crate::error::{ConfigError, Result};
use crate::tree::{ConfigTree, Entry, Scalar};
use chrono::NaiveDate;
use indexmap::IndexMap;
use regex::Regex;
use std::fmt;

/// Field name that discards its capture group.
const DISCARD_FIELD: &str = "_";

/// Default read group settings for Illumina run folder names such as
/// `120924_SN1234_0123_AC0XXXACXX_L001`.
pub fn default_settings() -> ConfigTree {
	config_tree! {
		"run_id_re" => {
			"fields" => ["date", "instrument", "run_number", "flowcell_position", "flowcell_id", "_", "lane"],
			"pattern" => r"([0-9]{6})_([A-Z0-9-]+)_([0-9]+)_([AB])([A-Z0-9]+)(_L00)?([0-9])?",
		},
		"read_group_keys" => ["id", "center", "date", "description", "library", "platform", "platform_unit", "sample"],
		"platform" => "Illumina",
	}
}

/// Read group values extracted from one identifier, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadGroup {
	fields: IndexMap<String, Option<String>>,
}

impl ReadGroup {
	/// Value of `field`, if the field is known and was filled in.
	pub fn get(&self, field: &str) -> Option<&str> {
		self.fields.get(field).and_then(|value| value.as_deref())
	}

	pub fn contains(&self, field: &str) -> bool {
		self.fields.contains_key(field)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
		self.fields
			.iter()
			.map(|(key, value)| (key.as_str(), value.as_deref()))
	}

	fn set(&mut self, field: &str, value: Option<String>) {
		self.fields.insert(field.to_string(), value);
	}
}

impl fmt::Display for ReadGroup {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (key, value) in self.iter() {
			writeln!(f, "{}={}", key, value.unwrap_or(""))?;
		}
		Ok(())
	}
}

impl From<ReadGroup> for ConfigTree {
	fn from(read_group: ReadGroup) -> Self {
		read_group
			.fields
			.into_iter()
			.map(|(key, value)| (key, Entry::Scalar(Scalar::from(value))))
			.collect()
	}
}

/// Compiled read group settings.
#[derive(Debug)]
pub struct ReadGroupParser {
	fields: Vec<String>,
	pattern: Regex,
	pattern_source: String,
	keys: Vec<String>,
	center: Option<String>,
	platform: Option<String>,
}

impl ReadGroupParser {
	/// Compile the settings stored in `settings`.
	///
	/// Expects `run_id_re.fields`, `run_id_re.pattern` and `read_group_keys`;
	/// `center` and `platform` are optional.
	pub fn from_config(settings: &ConfigTree) -> Result<Self> {
		let fields = string_list(settings, "run_id_re.fields")?;
		let pattern_source = string_value(settings, "run_id_re.pattern")?;
		let keys = string_list(settings, "read_group_keys")?;

		// Anchored at the start only, so trailing text is tolerated.
		let pattern = Regex::new(&format!("^(?:{})", pattern_source)).map_err(|source| {
			ConfigError::InvalidRegex {
				pattern: pattern_source.clone(),
				source,
			}
		})?;

		Ok(ReadGroupParser {
			fields,
			pattern,
			pattern_source,
			keys,
			center: optional_string(settings, "center")?,
			platform: optional_string(settings, "platform")?,
		})
	}

	/// Extract read group values from `input`.
	pub fn parse(&self, input: &str) -> Result<ReadGroup> {
		let captures = self
			.pattern
			.captures(input)
			.ok_or_else(|| ConfigError::PatternMismatch {
				input: input.to_string(),
				pattern: self.pattern_source.clone(),
			})?;

		let mut read_group = ReadGroup::default();
		for key in &self.keys {
			read_group.set(key, None);
		}

		let groups = captures.iter().skip(1);
		for (field, group) in self.fields.iter().zip(groups) {
			if field == DISCARD_FIELD {
				continue;
			}
			read_group.set(field, group.map(|m| m.as_str().to_string()));
		}

		if let Some(raw) = read_group.get("date").map(str::to_string) {
			match normalize_date(&raw) {
				Some(date) => read_group.set("date", Some(date)),
				None => tracing::debug!(date = %raw, "leaving unrecognised date as-is"),
			}
		}

		if read_group.contains("center") {
			read_group.set("center", Some(self.center.clone().unwrap_or_default()));
		}
		if read_group.contains("platform") {
			read_group.set("platform", Some(self.platform.clone().unwrap_or_default()));
		}
		if read_group.contains("description") {
			read_group.set("description", Some(input.to_string()));
		}
		if read_group.contains("id") {
			read_group.set("id", Some(input.to_string()));
		}

		Ok(read_group)
	}
}

/// Convert `YYMMDD` or `YYYYMMDD` to ISO `YYYY-MM-DD`.
pub fn normalize_date(raw: &str) -> Option<String> {
	let format = match raw.len() {
		6 => "%y%m%d",
		8 => "%Y%m%d",
		_ => return None,
	};
	NaiveDate::parse_from_str(raw, format)
		.ok()
		.map(|date| date.format("%Y-%m-%d").to_string())
}

fn string_value(settings: &ConfigTree, path: &str) -> Result<String> {
	let entry = settings.get_path(path, &[])?;
	entry
		.as_str()
		.map(str::to_string)
		.ok_or_else(|| ConfigError::TypeMismatch {
			key: path.to_string(),
			expected: "string",
			found: entry.kind(),
		})
}

fn optional_string(settings: &ConfigTree, key: &str) -> Result<Option<String>> {
	if settings.contains_key(key) {
		string_value(settings, key).map(Some)
	} else {
		Ok(None)
	}
}

fn string_list(settings: &ConfigTree, path: &str) -> Result<Vec<String>> {
	let entry = settings.get_path(path, &[])?;
	let mismatch = || ConfigError::TypeMismatch {
		key: path.to_string(),
		expected: "sequence of strings",
		found: entry.kind(),
	};

	entry
		.as_sequence()
		.ok_or_else(mismatch)?
		.iter()
		.map(|item| item.as_str().map(str::to_string).ok_or_else(mismatch))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::merge::merge;

	fn default_parser() -> ReadGroupParser {
		ReadGroupParser::from_config(&default_settings()).unwrap()
	}

	#[test]
	fn test_normalize_date() {
		assert_eq!(normalize_date("120924"), Some("2012-09-24".to_string()));
		assert_eq!(normalize_date("20120924"), Some("2012-09-24".to_string()));
		assert_eq!(normalize_date("121324"), None);
		assert_eq!(normalize_date("2012-09-24"), None);
	}

	#[test]
	fn test_parse_run_folder() {
		let input = "120924_SN1234_0123_AC0XXXACXX_L001";
		let read_group = default_parser().parse(input).unwrap();

		assert_eq!(read_group.get("id"), Some(input));
		assert_eq!(read_group.get("description"), Some(input));
		assert_eq!(read_group.get("date"), Some("2012-09-24"));
		assert_eq!(read_group.get("platform"), Some("Illumina"));
		assert_eq!(read_group.get("center"), Some(""));
		assert_eq!(read_group.get("instrument"), Some("SN1234"));
		assert_eq!(read_group.get("flowcell_position"), Some("A"));
		assert_eq!(read_group.get("flowcell_id"), Some("C0XXXACXX"));
		assert_eq!(read_group.get("lane"), Some("1"));
		assert!(read_group.contains("sample"));
		assert_eq!(read_group.get("sample"), None);
		assert!(!read_group.contains("_"));
	}

	#[test]
	fn test_recognised_keys_come_first() {
		let read_group = default_parser().parse("120924_SN1234_0123_AC0XXXACXX").unwrap();
		let keys: Vec<_> = read_group.iter().map(|(key, _)| key).collect();

		assert_eq!(
			keys[..8],
			["id", "center", "date", "description", "library", "platform", "platform_unit", "sample"]
		);
		assert_eq!(read_group.get("lane"), None);
	}

	#[test]
	fn test_parse_mismatch() {
		match default_parser().parse("not-a-run-id").unwrap_err() {
			ConfigError::PatternMismatch { input, .. } => assert_eq!(input, "not-a-run-id"),
			other => panic!("Expected PatternMismatch error, got {other:?}"),
		}
	}

	#[test]
	fn test_override_layer_sets_center() {
		let settings = merge(
			&default_settings(),
			&config_tree! { "center" => "SciLife", "platform" => "ONT" },
		)
		.unwrap();
		let parser = ReadGroupParser::from_config(&settings).unwrap();
		let read_group = parser.parse("120924_SN1234_0123_BC0XXXACXX").unwrap();

		assert_eq!(read_group.get("center"), Some("SciLife"));
		assert_eq!(read_group.get("platform"), Some("ONT"));
		assert_eq!(read_group.get("flowcell_position"), Some("B"));
	}

	#[test]
	fn test_custom_pattern_without_date() {
		let settings = config_tree! {
			"run_id_re" => {
				"fields" => ["sample", "_", "library"],
				"pattern" => r"(P[0-9]+)(_)([0-9]+)",
			},
			"read_group_keys" => ["id", "sample", "library"],
		};
		let read_group = ReadGroupParser::from_config(&settings)
			.unwrap()
			.parse("P001_101")
			.unwrap();

		assert_eq!(read_group.get("sample"), Some("P001"));
		assert_eq!(read_group.get("library"), Some("101"));
		assert_eq!(read_group.get("id"), Some("P001_101"));
		assert!(!read_group.contains("date"));
	}

	#[test]
	fn test_invalid_pattern() {
		let settings = merge(
			&default_settings(),
			&config_tree! { "run_id_re" => { "pattern" => "([unclosed" } },
		)
		.unwrap();
		match ReadGroupParser::from_config(&settings).unwrap_err() {
			ConfigError::InvalidRegex { pattern, .. } => assert_eq!(pattern, "([unclosed"),
			other => panic!("Expected InvalidRegex error, got {other:?}"),
		}
	}

	#[test]
	fn test_missing_settings() {
		let result = ReadGroupParser::from_config(&config_tree! { "platform" => "Illumina" });
		assert!(matches!(result, Err(ConfigError::KeyNotFound { .. })));
	}

	#[test]
	fn test_fields_must_be_strings() {
		let settings = merge(
			&default_settings(),
			&config_tree! { "run_id_re" => { "fields" => "date" } },
		)
		.unwrap();
		match ReadGroupParser::from_config(&settings).unwrap_err() {
			ConfigError::TypeMismatch { key, found, .. } => {
				assert_eq!(key, "run_id_re.fields");
				assert_eq!(found, "string");
			}
			other => panic!("Expected TypeMismatch error, got {other:?}"),
		}
	}

	#[test]
	fn test_read_group_display_and_tree() {
		let read_group = default_parser().parse("120924_SN1234_0123_AC0XXXACXX").unwrap();
		let rendered = read_group.to_string();
		assert!(rendered.contains("date=2012-09-24\n"));
		assert!(rendered.contains("sample=\n"));

		let tree = ConfigTree::from(read_group);
		assert_eq!(tree.get("platform", &[]).unwrap().as_str(), Some("Illumina"));
		assert_eq!(
			tree.get("sample", &[]).unwrap().as_scalar(),
			Some(&Scalar::Null)
		);
	}
}
