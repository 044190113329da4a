//! # websrv-conf
//!
//! Layered configuration for websrv.
//!
//! Settings are merged from three sources, later ones overriding earlier ones:
//!
//! 1. built-in defaults ([`sources::DefaultSource`])
//! 2. an optional YAML file ([`sources::YamlFileSource`])
//! 3. `WEBSRV_` prefixed environment variables ([`sources::EnvSource`])
//!
//! ```rust,no_run
//! use websrv_conf::load_settings;
//! use std::path::Path;
//!
//! let settings = load_settings(Some(Path::new("/etc/websrv/config.yaml"))).unwrap();
//! println!("listening on {}", settings.port.webserver);
//! ```

pub mod builder;
pub mod settings;
pub mod sources;
pub mod validation;

pub use builder::{MergedSettings, SettingsBuilder, SettingsError, load_settings};
pub use settings::{
	AccessLogSettings, AngularCspSettings, GzipSettings, LogLevel, LogSettings, PortSettings,
	SessionCookieSettings, Settings, TimeoutSettings,
};
pub use sources::{ConfigSource, DefaultSource, EnvSource, SourceError, YamlFileSource};
pub use validation::ValidationError;
