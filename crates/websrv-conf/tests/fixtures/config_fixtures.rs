//! Configuration files and environment overrides

use rstest::fixture;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A YAML file inside a temporary directory, removed on drop
pub struct ConfigFile {
	dir: TempDir,
}

impl ConfigFile {
	pub fn path(&self) -> PathBuf {
		self.dir.path().join("config.yaml")
	}
}

/// Write `content` to a fresh `config.yaml`
pub fn write_config(content: &str) -> ConfigFile {
	let dir = TempDir::new().unwrap();
	fs::write(dir.path().join("config.yaml"), content).unwrap();
	ConfigFile { dir }
}

/// A production-like configuration with nonce injection enabled
#[fixture]
pub fn config_file() -> ConfigFile {
	write_config(
		r#"
log:
  level: debug
  access:
    general: true
headers:
  x-frame-options: DENY
fallback: index.html
memoryfs: true
health: true
port:
  webserver: 9000
gzip:
  enabled: true
  compression: 9
  mediatypes:
    - text/html
    - application/javascript
angularcsp:
  enabled: true
  filepath: "^(index\\.html|main.*\\.js)$"
  variable: "${NONCE}"
  sessioncookie:
    name: Nonce-Id
    maxage: 3600
"#,
	)
}

/// Sets environment variables and removes them again on drop
pub struct EnvGuard {
	names: Vec<String>,
}

impl EnvGuard {
	pub fn set(pairs: &[(&str, &str)]) -> Self {
		for (name, value) in pairs {
			unsafe {
				std::env::set_var(name, value);
			}
		}
		Self {
			names: pairs.iter().map(|(name, _)| name.to_string()).collect(),
		}
	}
}

impl Drop for EnvGuard {
	fn drop(&mut self) {
		for name in &self.names {
			unsafe {
				std::env::remove_var(name);
			}
		}
	}
}
