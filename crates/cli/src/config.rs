//! Config file loading and merging with command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use listsync_connection::{ConnectionConfig, Endpoint};
use serde::Deserialize;
use thiserror::Error;

use crate::cli::Cli;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "LISTSYNC_CONFIG";

/// Origin used to label the in-process authority.
const LOOPBACK_ORIGIN: &str = "http://loopback.localhost";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read {}: {source}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to parse {}: {source}", path.display())]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
	#[error("no endpoint configured; pass an origin, --endpoint, or --loopback")]
	MissingEndpoint,
	#[error(transparent)]
	Endpoint(#[from] listsync_connection::Error),
}

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
	/// Origin of the hosting page.
	pub origin: Option<String>,
	/// Explicit socket URL.
	pub endpoint: Option<String>,
	/// Reconnect delay in milliseconds.
	pub retry_delay_ms: Option<u64>,
	/// Reconnect for a snapshot after divergence.
	pub resync_on_divergence: Option<bool>,
	/// Default log filter directive, e.g. `listsync_connection=debug`.
	pub log: Option<String>,
}

impl FileConfig {
	/// Parses TOML text. `path` is only used in errors.
	pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
		toml::from_str(text).map_err(|source| ConfigError::Parse {
			path: path.to_owned(),
			source,
		})
	}

	/// Reads and parses a file that must exist.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.to_owned(),
			source,
		})?;
		Self::parse(&text, path)
	}

	/// Like [`Self::load`], but a missing file yields the defaults.
	pub fn load_optional(path: &Path) -> Result<Self, ConfigError> {
		match std::fs::read_to_string(path) {
			Ok(text) => Self::parse(&text, path),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
			Err(source) => Err(ConfigError::Read {
				path: path.to_owned(),
				source,
			}),
		}
	}
}

/// Returns the config file path used when `--config` is absent.
///
/// # Resolution Order
///
/// 1. `LISTSYNC_CONFIG` environment variable.
/// 2. `listsync/config.toml` under the user config directory.
pub fn default_config_path() -> Option<PathBuf> {
	if let Some(path) = std::env::var_os(CONFIG_ENV) {
		return Some(PathBuf::from(path));
	}
	dirs::config_dir().map(|dir| dir.join("listsync").join("config.toml"))
}

/// Reads the config file named by `cli` or found by default.
pub fn load(cli: &Cli) -> Result<FileConfig, ConfigError> {
	match &cli.config {
		Some(path) => FileConfig::load(path),
		None => match default_config_path() {
			Some(path) => FileConfig::load_optional(&path),
			None => Ok(FileConfig::default()),
		},
	}
}

/// Effective settings after merging flags over the file.
#[derive(Debug, Clone)]
pub struct Settings {
	pub endpoint: Endpoint,
	pub retry_delay: Duration,
	pub resync_on_divergence: bool,
	pub log: Option<String>,
	pub loopback: bool,
	pub verbose: bool,
}

impl Settings {
	/// Flags win over file values; the socket URL wins over the origin.
	pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
		let target = cli
			.endpoint
			.as_deref()
			.or(cli.origin.as_deref())
			.or(file.endpoint.as_deref())
			.or(file.origin.as_deref());
		let endpoint = match target {
			Some(target) => Endpoint::from_origin(target)?,
			None if cli.loopback => Endpoint::from_origin(LOOPBACK_ORIGIN)?,
			None => return Err(ConfigError::MissingEndpoint),
		};

		let retry_delay = cli
			.retry_delay_ms
			.or(file.retry_delay_ms)
			.map_or(ConnectionConfig::DEFAULT_RETRY_DELAY, Duration::from_millis);
		let resync_on_divergence = !cli.no_resync && file.resync_on_divergence.unwrap_or(true);

		Ok(Self {
			endpoint,
			retry_delay,
			resync_on_divergence,
			log: file.log,
			loopback: cli.loopback,
			verbose: cli.verbose,
		})
	}

	/// Connection settings for the session.
	pub fn connection(&self) -> ConnectionConfig {
		ConnectionConfig::new(self.endpoint.clone()).retry_delay(self.retry_delay)
	}
}
