use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings persisted between invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rpc_url: Option<String>,

	#[serde(
		default,
		rename = "validator_manager_contract_addr",
		skip_serializing_if = "Option::is_none"
	)]
	pub contract_address: Option<String>,
}

impl Config {
	/// Overlay explicitly supplied flags on top of the stored values.
	///
	/// A flag that was supplied wins even when its value is empty; the
	/// stored value is used only when the flag is absent.
	pub fn merged(&self, rpc_url: Option<&str>, contract_address: Option<&str>) -> Config {
		Config {
			rpc_url: prefer_flag(rpc_url, self.rpc_url.as_deref()),
			contract_address: prefer_flag(contract_address, self.contract_address.as_deref()),
		}
	}

	/// The RPC endpoint to use, or `None` when working offline.
	pub fn endpoint(&self) -> Option<&str> {
		self.rpc_url
			.as_deref()
			.map(str::trim)
			.filter(|url| !url.is_empty())
	}

	/// The ValidatorManager contract address.
	pub fn contract(&self) -> Result<Address, ConfigError> {
		let raw = self.contract_address.as_deref().ok_or(ConfigError::Unset {
			field: "contract address",
			flag: "contract",
			command: "set-contract <addr>",
		})?;
		parse_address(raw)
	}
}

/// Flag-over-file precedence for a single setting.
pub fn prefer_flag(flag: Option<&str>, stored: Option<&str>) -> Option<String> {
	flag.or(stored).map(str::to_owned)
}

pub fn parse_address(raw: &str) -> Result<Address, ConfigError> {
	raw.trim()
		.parse::<Address>()
		.map_err(|e| ConfigError::InvalidValue {
			field: "contract address",
			value: raw.to_owned(),
			reason: e.to_string(),
		})
}

/// Loads and saves [`Config`] as JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
	path: PathBuf,
}

impl ConfigStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Store at `path` if given, otherwise at the per-user default location.
	pub fn open(path: Option<&Path>) -> Result<Self, ConfigError> {
		match path {
			Some(p) => Ok(Self::new(p)),
			None => Ok(Self::new(Self::default_path()?)),
		}
	}

	/// `<config dir>/valctl/config.json`.
	pub fn default_path() -> Result<PathBuf, ConfigError> {
		dirs::config_dir()
			.map(|dir| dir.join("valctl").join("config.json"))
			.ok_or(ConfigError::NoConfigDir)
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Load config from disk; a missing file yields an empty config.
	pub fn load(&self) -> Result<Config, ConfigError> {
		if !self.path.exists() {
			tracing::debug!(path = %self.path.display(), "no config file, using defaults");
			return Ok(Config::default());
		}
		let content = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
			path: self.path.clone(),
			source,
		})?;
		serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
			path: self.path.clone(),
			source,
		})
	}

	/// Persist `config`, creating the directory if needed.
	pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
		let write_err = |source| ConfigError::Write {
			path: self.path.clone(),
			source,
		};
		if let Some(parent) = self.path.parent() {
			std::fs::create_dir_all(parent).map_err(write_err)?;
		}
		let body = serde_json::to_string_pretty(config).map_err(|source| ConfigError::Serialize {
			path: self.path.clone(),
			source,
		})?;
		std::fs::write(&self.path, body).map_err(write_err)?;
		tracing::debug!(path = %self.path.display(), "config saved");
		Ok(())
	}
}
