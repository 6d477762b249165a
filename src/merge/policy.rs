use std::fmt;
use std::str::FromStr;

/// What to do when a nested override section carries a key that the
/// corresponding base section does not define.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownKeyPolicy {
	/// Take the key silently.
	Accept,
	/// Take the key and emit a warning.
	#[default]
	Warn,
	/// Fail the merge with `ConfigError::UnknownKey`.
	Reject,
}

impl UnknownKeyPolicy {
	pub fn as_str(&self) -> &'static str {
		match self {
			UnknownKeyPolicy::Accept => "accept",
			UnknownKeyPolicy::Warn => "warn",
			UnknownKeyPolicy::Reject => "reject",
		}
	}
}

impl fmt::Display for UnknownKeyPolicy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for UnknownKeyPolicy {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"accept" => Ok(UnknownKeyPolicy::Accept),
			"warn" => Ok(UnknownKeyPolicy::Warn),
			"reject" => Ok(UnknownKeyPolicy::Reject),
			other => Err(format!(
				"unknown policy '{}' (expected accept, warn or reject)",
				other
			)),
		}
	}
}

/// Knobs for a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
	/// Handling of override keys missing from a nested base section.
	/// Top-level additions are always accepted.
	pub unknown_keys: UnknownKeyPolicy,
}

impl MergeOptions {
	pub fn with_unknown_keys(mut self, policy: UnknownKeyPolicy) -> Self {
		self.unknown_keys = policy;
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_policy_warns() {
		assert_eq!(MergeOptions::default().unknown_keys, UnknownKeyPolicy::Warn);
	}

	#[test]
	fn test_parse_policy() {
		assert_eq!("accept".parse::<UnknownKeyPolicy>(), Ok(UnknownKeyPolicy::Accept));
		assert_eq!("WARN".parse::<UnknownKeyPolicy>(), Ok(UnknownKeyPolicy::Warn));
		assert_eq!("reject".parse::<UnknownKeyPolicy>(), Ok(UnknownKeyPolicy::Reject));
		assert!("strict".parse::<UnknownKeyPolicy>().is_err());
	}

	#[test]
	fn test_policy_display_round_trips() {
		for policy in [
			UnknownKeyPolicy::Accept,
			UnknownKeyPolicy::Warn,
			UnknownKeyPolicy::Reject,
		] {
			assert_eq!(policy.to_string().parse::<UnknownKeyPolicy>(), Ok(policy));
		}
	}
}
