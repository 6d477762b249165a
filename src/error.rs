use std::path::PathBuf;

/// Library-level structured errors for cfgtree.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("Type mismatch at '{key}': expected {expected}, found {found}")]
	TypeMismatch {
		key: String,
		expected: &'static str,
		found: &'static str,
	},

	#[error("Key not found: {key}")]
	KeyNotFound { key: String },

	#[error("Wrong number of arguments for '{key}': expected {expected}, got {given}")]
	ArityMismatch {
		key: String,
		expected: String,
		given: usize,
	},

	#[error("Invalid argument: {message}")]
	InvalidArgument { message: String },

	#[error("Unknown key in override section: {key}")]
	UnknownKey { key: String },

	#[error("Unsupported value at '{key}': {kind}")]
	UnsupportedValue { key: String, kind: &'static str },

	#[error("Input '{input}' does not match pattern: {pattern}")]
	PatternMismatch { input: String, pattern: String },

	#[error("Invalid regex pattern: {pattern}")]
	InvalidRegex {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Failed to merge config layer: {path}")]
	LayerMergeError {
		path: PathBuf,
		#[source]
		source: Box<ConfigError>,
	},

	#[error("Failed to render configuration as TOML")]
	RenderError {
		#[source]
		source: toml::ser::Error,
	},

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,
}

impl ConfigError {
	/// Shorthand for the error a deferred entry returns when handed an argument it cannot use.
	pub fn invalid_argument(message: impl Into<String>) -> Self {
		ConfigError::InvalidArgument {
			message: message.into(),
		}
	}
}

/// Result type alias using ConfigError.
pub type Result<T> = std::result::Result<T, ConfigError>;
