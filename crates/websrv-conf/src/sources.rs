//! Configuration sources for the layered settings system
//!
//! Sources are merged in priority order: environment variables > config file >
//! defaults.

use indexmap::IndexMap;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

use crate::settings::Settings;

/// Prefix of environment variables read by [`EnvSource`]
pub const ENV_PREFIX: &str = "WEBSRV_";

/// Trait for configuration sources
///
/// Keys of the returned map may be dotted (`gzip.enabled`) to address nested
/// values; the builder expands them.
pub trait ConfigSource: Send + Sync {
	/// Load configuration from this source
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError>;

	/// Get the priority of this source (higher = more important)
	fn priority(&self) -> u8;

	/// Get a description of this source
	fn description(&self) -> String;
}

/// Error type for configuration sources
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	#[error("IO error reading {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Parse error: {0}")]
	Parse(String),

	#[error("YAML error: {0}")]
	Yaml(#[from] serde_yaml::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

/// Built-in defaults, taken from [`Settings::default`]
pub struct DefaultSource {
	values: IndexMap<String, Value>,
}

impl DefaultSource {
	/// # Examples
	///
	/// ```
	/// use websrv_conf::sources::{ConfigSource, DefaultSource};
	///
	/// let values = DefaultSource::new().unwrap().load().unwrap();
	/// assert_eq!(values["port"]["webserver"], 8080);
	/// ```
	///
	/// # Errors
	///
	/// Returns [`SourceError::Json`] if the defaults cannot be serialized.
	pub fn new() -> Result<Self, SourceError> {
		Self::from_settings(&Settings::default())
	}

	/// Use `settings` as the default layer
	pub fn from_settings(settings: &Settings) -> Result<Self, SourceError> {
		let value = serde_json::to_value(settings)?;
		Ok(Self {
			values: object_entries(value)?,
		})
	}
}

impl ConfigSource for DefaultSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		Ok(self.values.clone())
	}

	fn priority(&self) -> u8 {
		0
	}

	fn description(&self) -> String {
		"Default values".to_string()
	}
}

/// YAML configuration file
///
/// Unlike the defaults, a configured file that does not exist is an error.
pub struct YamlFileSource {
	path: PathBuf,
}

impl YamlFileSource {
	/// # Examples
	///
	/// ```
	/// use websrv_conf::sources::YamlFileSource;
	///
	/// let source = YamlFileSource::new("/etc/websrv/config.yaml");
	/// ```
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for YamlFileSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		let content = fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
			path: self.path.clone(),
			source,
		})?;
		if content.trim().is_empty() {
			return Ok(IndexMap::new());
		}

		let value: Value = serde_yaml::from_str(&content)?;
		object_entries(value)
	}

	fn priority(&self) -> u8 {
		50
	}

	fn description(&self) -> String {
		format!("YAML file: {}", self.path.display())
	}
}

/// Environment variables
///
/// `WEBSRV_GZIP_ENABLED=true` sets `gzip.enabled`: the prefix is removed, the
/// rest is lower-cased and `_` separates nesting levels. Values stay strings;
/// the builder coerces them to the type of the value they override.
pub struct EnvSource {
	prefix: String,
}

impl EnvSource {
	pub fn new() -> Self {
		Self {
			prefix: ENV_PREFIX.to_string(),
		}
	}

	/// Set the prefix filter for environment variables
	///
	/// # Examples
	///
	/// ```
	/// use websrv_conf::sources::{ConfigSource, EnvSource};
	///
	/// let source = EnvSource::new().with_prefix("MYSRV_");
	/// assert_eq!(source.description(), "Environment variables (prefix: MYSRV_)");
	/// ```
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = prefix.into();
		self
	}

	/// Convert `WEBSRV_PORT_WEBSERVER` into `port.webserver`
	fn key_for(&self, name: &str) -> Option<String> {
		let rest = name.strip_prefix(&self.prefix)?;
		if rest.is_empty() {
			return None;
		}
		Some(rest.to_lowercase().replace('_', "."))
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for EnvSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		let mut config = IndexMap::new();
		for (name, value) in std::env::vars() {
			if let Some(key) = self.key_for(&name) {
				config.insert(key, Value::String(value));
			}
		}
		Ok(config)
	}

	fn priority(&self) -> u8 {
		100
	}

	fn description(&self) -> String {
		format!("Environment variables (prefix: {})", self.prefix)
	}
}

/// Top-level entries of a JSON object
fn object_entries(value: Value) -> Result<IndexMap<String, Value>, SourceError> {
	match value {
		Value::Object(map) => Ok(map.into_iter().collect()),
		Value::Null => Ok(IndexMap::new()),
		other => Err(SourceError::Parse(format!(
			"Expected a mapping at the root, found {}",
			other
		))),
	}
}
