//! Merging configuration sources into settings

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use std::path::Path;

use crate::settings::Settings;
use crate::sources::{ConfigSource, DefaultSource, EnvSource, SourceError, YamlFileSource};
use crate::validation::ValidationError;

/// Errors raised while assembling settings
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("Failed to load {description}: {source}")]
	Source {
		description: String,
		#[source]
		source: SourceError,
	},

	#[error("Invalid configuration: {0}")]
	Deserialize(#[from] serde_json::Error),

	#[error(transparent)]
	Validation(#[from] ValidationError),
}

/// Collects sources and merges them by priority
///
/// Nested objects are merged key by key. A string coming from a later source
/// that overrides a number, boolean or list is converted to that type, so
/// `WEBSRV_PORT_WEBSERVER=9000` yields the number `9000` and
/// `WEBSRV_GZIP_MEDIATYPES=text/css,text/html` a two element list.
#[derive(Default)]
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a source
	///
	/// # Examples
	///
	/// ```
	/// use websrv_conf::builder::SettingsBuilder;
	/// use websrv_conf::sources::DefaultSource;
	///
	/// let merged = SettingsBuilder::new()
	///     .add_source(DefaultSource::new().unwrap())
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(merged.get::<u16>("port.webserver"), Some(8080));
	/// ```
	pub fn add_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	/// Load every source and merge them, lowest priority first
	///
	/// # Errors
	///
	/// Returns [`SettingsError::Source`] naming the first source that fails.
	pub fn build(mut self) -> Result<MergedSettings, SettingsError> {
		self.sources.sort_by_key(|source| source.priority());

		let mut merged = Value::Object(Map::new());
		for source in &self.sources {
			let values = source.load().map_err(|source_error| SettingsError::Source {
				description: source.description(),
				source: source_error,
			})?;
			tracing::debug!(source = %source.description(), keys = values.len(), "merging configuration source");
			for (key, value) in values {
				let path: Vec<&str> = key.split('.').collect();
				set_path(&mut merged, &path, value);
			}
		}

		Ok(MergedSettings { value: merged })
	}
}

/// Result of merging all sources
#[derive(Debug, Clone)]
pub struct MergedSettings {
	value: Value,
}

impl MergedSettings {
	/// Value at a dotted key, deserialized into `T`
	pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
		key.split('.')
			.try_fold(&self.value, |current, part| current.get(part))
			.and_then(|value| serde_json::from_value(value.clone()).ok())
	}

	pub fn as_value(&self) -> &Value {
		&self.value
	}

	/// Deserialize into typed [`Settings`]
	///
	/// # Errors
	///
	/// Returns [`SettingsError::Deserialize`] for unknown keys or values of the
	/// wrong type.
	pub fn into_settings(self) -> Result<Settings, SettingsError> {
		Ok(serde_json::from_value(self.value)?)
	}
}

/// Load defaults, the optional YAML file and the environment, then validate
///
/// # Errors
///
/// Returns the first loading, type or validation error.
pub fn load_settings(config_file: Option<&Path>) -> Result<Settings, SettingsError> {
	let defaults = DefaultSource::new().map_err(|source| SettingsError::Source {
		description: "Default values".to_string(),
		source,
	})?;

	let mut builder = SettingsBuilder::new().add_source(defaults);
	if let Some(path) = config_file {
		builder = builder.add_source(YamlFileSource::new(path));
	}
	let settings = builder.add_source(EnvSource::new()).build()?.into_settings()?;

	settings.validate()?;
	Ok(settings)
}

/// Merge `value` into `target` at `path`, creating objects along the way
fn set_path(target: &mut Value, path: &[&str], value: Value) {
	let Some((first, rest)) = path.split_first() else {
		merge_value(target, value);
		return;
	};

	if !target.is_object() {
		*target = Value::Object(Map::new());
	}
	let Value::Object(map) = target else {
		return;
	};

	if rest.is_empty() {
		match map.get_mut(*first) {
			Some(existing) => merge_value(existing, value),
			None => {
				map.insert(first.to_string(), value);
			}
		}
	} else {
		let child = map
			.entry(first.to_string())
			.or_insert_with(|| Value::Object(Map::new()));
		set_path(child, rest, value);
	}
}

/// Overlay `incoming` on `existing`
fn merge_value(existing: &mut Value, incoming: Value) {
	match (existing, incoming) {
		(Value::Object(existing_map), Value::Object(incoming_map)) => {
			for (key, value) in incoming_map {
				match existing_map.get_mut(&key) {
					Some(slot) => merge_value(slot, value),
					None => {
						existing_map.insert(key, value);
					}
				}
			}
		}
		(slot, Value::String(text)) => {
			let coerced = coerce(slot, text);
			*slot = coerced;
		}
		(slot, other) => *slot = other,
	}
}

/// Convert `text` to the JSON type of `like`, keeping the string when it does not parse
fn coerce(like: &Value, text: String) -> Value {
	let trimmed = text.trim();
	match like {
		Value::Bool(_) => trimmed.parse::<bool>().map(Value::Bool).unwrap_or(Value::String(text)),
		Value::Number(_) => {
			if let Ok(integer) = trimmed.parse::<i64>() {
				Value::Number(integer.into())
			} else if let Some(float) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
				Value::Number(float)
			} else {
				Value::String(text)
			}
		}
		Value::Array(_) => Value::Array(
			trimmed
				.split(',')
				.map(str::trim)
				.filter(|item| !item.is_empty())
				.map(|item| Value::String(item.to_string()))
				.collect(),
		),
		_ => Value::String(text),
	}
}
