//! Typed server settings
//!
//! Field names on the wire follow the configuration keys (`memoryfs`,
//! `angularcsp.sessioncookie.maxage`, ...). Unknown keys are rejected at every
//! level.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Complete server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
	pub log: LogSettings,
	/// Static headers added to every response
	pub headers: BTreeMap<String, String>,
	/// File extension (with leading dot) to media type
	#[serde(rename = "mediatypes")]
	pub media_types: BTreeMap<String, String>,
	/// Path served when the requested one is missing; empty disables it
	pub fallback: String,
	/// Load the target directory into memory at startup
	#[serde(rename = "memoryfs")]
	pub memory_fs: bool,
	/// Start the health endpoint
	pub health: bool,
	pub port: PortSettings,
	pub gzip: GzipSettings,
	pub timeout: TimeoutSettings,
	/// Seconds to wait after a shutdown signal before draining
	#[serde(rename = "shutdowndelay")]
	pub shutdown_delay: u64,
	#[serde(rename = "angularcsp")]
	pub angular_csp: AngularCspSettings,
}

impl Default for Settings {
	fn default() -> Self {
		let media_types = [
			(".js", "application/javascript"),
			(".css", "text/css"),
			(".html", "text/html; charset=UTF-8"),
			(".jpg", "image/jpeg"),
			(".avif", "image/avif"),
			(".jxl", "image/jxl"),
			(".ttf", "font/ttf"),
			(".woff2", "font/woff2"),
			(".txt", "text/plain"),
		]
		.into_iter()
		.map(|(extension, media_type)| (extension.to_string(), media_type.to_string()))
		.collect();

		Self {
			log: LogSettings::default(),
			headers: BTreeMap::new(),
			media_types,
			fallback: String::new(),
			memory_fs: false,
			health: false,
			port: PortSettings::default(),
			gzip: GzipSettings::default(),
			timeout: TimeoutSettings::default(),
			shutdown_delay: 5,
			angular_csp: AngularCspSettings::default(),
		}
	}
}

impl Settings {
	pub fn shutdown_delay(&self) -> Duration {
		Duration::from_secs(self.shutdown_delay)
	}

	/// The fallback path, if one is configured
	pub fn fallback_path(&self) -> Option<&str> {
		(!self.fallback.is_empty()).then_some(self.fallback.as_str())
	}
}

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
	Error,
	Warn,
	#[default]
	Info,
	Debug,
}

impl LogLevel {
	pub fn as_str(&self) -> &'static str {
		match self {
			LogLevel::Error => "error",
			LogLevel::Warn => "warn",
			LogLevel::Info => "info",
			LogLevel::Debug => "debug",
		}
	}
}

impl std::fmt::Display for LogLevel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
	pub level: LogLevel,
	/// Human readable output instead of JSON
	pub pretty: bool,
	pub access: AccessLogSettings,
}

/// Which listeners emit an access log line per request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessLogSettings {
	pub general: bool,
	pub health: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PortSettings {
	pub webserver: u16,
	pub health: u16,
}

impl Default for PortSettings {
	fn default() -> Self {
		Self {
			webserver: 8080,
			health: 8081,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GzipSettings {
	pub enabled: bool,
	/// Level used for on-the-fly compression, 1 to 9
	pub compression: u32,
	/// Media types eligible for compression
	#[serde(rename = "mediatypes")]
	pub media_types: Vec<String>,
}

impl Default for GzipSettings {
	fn default() -> Self {
		Self {
			enabled: false,
			compression: 5,
			media_types: ["text/css", "text/html", "text/javascript", "font/tff"]
				.into_iter()
				.map(String::from)
				.collect(),
		}
	}
}

/// Timeouts in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutSettings {
	pub read: u64,
	pub write: u64,
	pub shutdown: u64,
}

impl Default for TimeoutSettings {
	fn default() -> Self {
		Self {
			read: 10,
			write: 10,
			shutdown: 5,
		}
	}
}

impl TimeoutSettings {
	pub fn read(&self) -> Duration {
		Duration::from_secs(self.read)
	}

	pub fn write(&self) -> Duration {
		Duration::from_secs(self.write)
	}

	pub fn shutdown(&self) -> Duration {
		Duration::from_secs(self.shutdown)
	}
}

/// Per-session nonce injection for Angular's CSP support
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AngularCspSettings {
	pub enabled: bool,
	/// Regular expression selecting the files whose body gets the nonce
	#[serde(rename = "filepath")]
	pub file_path: String,
	/// Placeholder replaced by the nonce
	pub variable: String,
	#[serde(rename = "sessioncookie")]
	pub session_cookie: SessionCookieSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionCookieSettings {
	pub name: String,
	/// Cookie lifetime in seconds
	#[serde(rename = "maxage")]
	pub max_age: u64,
}
