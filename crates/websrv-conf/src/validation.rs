//! Checks on settings that the type system does not express

use regex::Regex;

use crate::settings::Settings;

/// Validation error
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
	#[error("Invalid value for '{key}': {message}")]
	InvalidValue { key: String, message: String },

	#[error("Multiple validation errors: {0:?}")]
	Multiple(Vec<ValidationError>),
}

impl ValidationError {
	fn invalid(key: &str, message: impl Into<String>) -> Self {
		ValidationError::InvalidValue {
			key: key.to_string(),
			message: message.into(),
		}
	}
}

impl Settings {
	/// Check value ranges and the nonce injection settings
	///
	/// # Errors
	///
	/// Returns the single failing check, or [`ValidationError::Multiple`] when
	/// several fail.
	///
	/// # Examples
	///
	/// ```
	/// use websrv_conf::Settings;
	///
	/// let mut settings = Settings::default();
	/// assert!(settings.validate().is_ok());
	///
	/// settings.gzip.compression = 12;
	/// assert!(settings.validate().is_err());
	/// ```
	pub fn validate(&self) -> Result<(), ValidationError> {
		let mut errors = Vec::new();

		if !(1..=9).contains(&self.gzip.compression) {
			errors.push(ValidationError::invalid(
				"gzip.compression",
				format!("{} is not between 1 and 9", self.gzip.compression),
			));
		}

		if self.angular_csp.enabled {
			let csp = &self.angular_csp;
			if csp.variable.is_empty() {
				errors.push(ValidationError::invalid(
					"angularcsp.variable",
					"must not be empty when angularcsp is enabled",
				));
			}
			if csp.session_cookie.name.is_empty() {
				errors.push(ValidationError::invalid(
					"angularcsp.sessioncookie.name",
					"must not be empty when angularcsp is enabled",
				));
			}
			if let Err(e) = Regex::new(&csp.file_path) {
				errors.push(ValidationError::invalid("angularcsp.filepath", e.to_string()));
			}
		}

		match errors.len() {
			0 => Ok(()),
			1 => Err(errors.remove(0)),
			_ => Err(ValidationError::Multiple(errors)),
		}
	}
}
