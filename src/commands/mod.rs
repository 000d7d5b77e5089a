pub mod config;
pub mod exit_codes;
pub mod tx;
pub mod validator;

use anyhow::Result;

use crate::cli::Cli;
use crate::config::{Config, ConfigStore};
use crate::error::NetworkError;
use crate::rpc::RpcClient;

/// Open the config store and overlay the global flags on its contents.
pub fn load_config(cli: &Cli) -> Result<(ConfigStore, Config)> {
	let store = ConfigStore::open(cli.config.as_deref())?;
	let config = store
		.load()?
		.merged(cli.rpc_url.as_deref(), cli.contract.as_deref());
	Ok((store, config))
}

/// RPC client for the resolved endpoint, or `None` when working offline.
pub fn resolve_rpc(config: &Config) -> Result<Option<RpcClient>, NetworkError> {
	let Some(url) = config.endpoint() else {
		tracing::info!("no RPC endpoint; working offline");
		return Ok(None);
	};
	let client = RpcClient::new(url)?;
	tracing::debug!(url = client.url(), "using RPC endpoint");
	Ok(Some(client))
}

/// Like [`resolve_rpc`], for commands that cannot work offline.
pub fn require_rpc(config: &Config) -> Result<RpcClient, NetworkError> {
	resolve_rpc(config)?.ok_or(NetworkError::NoEndpoint)
}
