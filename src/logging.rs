//! Installing the global log subscriber

use tracing_subscriber::EnvFilter;
use websrv_conf::LogSettings;

use crate::error::{AppError, Result};

/// Install a `fmt` subscriber for `settings.level`
///
/// Events are written as one JSON object per line, or in a human readable
/// multi-line format when `settings.pretty` is set.
///
/// # Errors
///
/// Returns [`AppError::Logging`] if a global subscriber is already installed.
pub fn init_logging(settings: &LogSettings) -> Result<()> {
	let filter =
		EnvFilter::try_new(settings.level.as_str()).map_err(|e| AppError::Logging(e.to_string()))?;
	let builder = tracing_subscriber::fmt().with_env_filter(filter);

	let installed = if settings.pretty {
		builder.pretty().try_init()
	} else {
		builder
			.json()
			.flatten_event(true)
			.with_current_span(true)
			.with_span_list(false)
			.try_init()
	};
	installed.map_err(|e| AppError::Logging(e.to_string()))
}
