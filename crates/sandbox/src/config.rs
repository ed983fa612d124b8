//! Sandbox settings loaded from TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use asyncflow_editor::AsyncFlowConfig;
use asyncflow_query::ViewUpdateOptions;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading the sandbox configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading the configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Error parsing TOML or an unknown key.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),
}

/// Settings of one typing session.
///
/// Every key is optional. Omitting the `[view_update]` table keeps the
/// plugin's defaults; a present table starts from all flags off.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SandboxConfig {
	/// Characters typed at the end of the document, one transaction each.
	pub text: String,
	/// Pause between keystrokes.
	pub interval_ms: u64,
	/// How long each query waits before resolving its character.
	pub debounce_ms: u64,
	/// Which query transitions reach the editor.
	pub view_update: ViewUpdateOptions,
}

impl Default for SandboxConfig {
	fn default() -> Self {
		let flow = AsyncFlowConfig::default();
		Self {
			text: String::from(" Hello!"),
			interval_ms: 150,
			debounce_ms: flow.debounce.as_millis() as u64,
			view_update: flow.view_update,
		}
	}
}

impl SandboxConfig {
	/// Parses a configuration document.
	pub fn from_toml(src: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(src)?)
	}

	/// Reads and parses the configuration file at `path`.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let src = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml(&src)
	}

	pub fn interval(&self) -> Duration {
		Duration::from_millis(self.interval_ms)
	}

	pub fn debounce(&self) -> Duration {
		Duration::from_millis(self.debounce_ms)
	}

	/// Returns the plugin settings for this session.
	pub fn flow_config(&self) -> AsyncFlowConfig {
		AsyncFlowConfig {
			debounce: self.debounce(),
			view_update: self.view_update,
		}
	}
}
