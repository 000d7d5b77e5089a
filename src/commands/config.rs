use anyhow::Result;

use crate::cli::{Cli, ConfigCommand};
use crate::config::{parse_address, Config, ConfigStore};
use crate::error::ConfigError;

pub fn run(cli: &Cli, cmd: &ConfigCommand) -> Result<()> {
	let store = ConfigStore::open(cli.config.as_deref())?;
	let mut stored = store.load()?;

	match cmd {
		ConfigCommand::SetRpc { url } => {
			stored.rpc_url = Some(validate_url(url)?);
			store.save(&stored)?;
			println!("RPC endpoint set to {}", url.trim());
		}
		ConfigCommand::SetContract { address } => {
			let address = parse_address(address)?.to_checksum(None);
			println!("Contract address set to {address}");
			stored.contract_address = Some(address);
			store.save(&stored)?;
		}
		ConfigCommand::Show => {
			let effective = stored.merged(cli.rpc_url.as_deref(), cli.contract.as_deref());
			show(&store, &effective);
		}
	}
	Ok(())
}

fn validate_url(raw: &str) -> Result<String, ConfigError> {
	let url = raw.trim();
	reqwest::Url::parse(url).map_err(|e| ConfigError::InvalidValue {
		field: "RPC URL",
		value: raw.to_owned(),
		reason: e.to_string(),
	})?;
	Ok(url.to_owned())
}

fn show(store: &ConfigStore, config: &Config) {
	println!("Config file: {}", store.path().display());
	println!("RPC URL:     {}", config.rpc_url.as_deref().unwrap_or("(not set)"));
	println!(
		"Contract:    {}",
		config.contract_address.as_deref().unwrap_or("(not set)")
	);
}

#[cfg(test)]
mod tests {
	use alloy_primitives::Address;
	use clap::Parser;

	use super::*;

	fn cli(dir: &std::path::Path, args: &[&str]) -> Cli {
		let config = dir.join("config.json");
		let mut argv = vec!["valctl", "--config", config.to_str().unwrap()];
		argv.extend_from_slice(args);
		Cli::try_parse_from(argv).unwrap()
	}

	fn config_command(cli: &Cli) -> &ConfigCommand {
		match &cli.command {
			crate::cli::Command::Config { command } => command,
			_ => panic!("expected a config command"),
		}
	}

	#[test]
	fn set_commands_persist() {
		let dir = tempfile::tempdir().unwrap();

		let set_rpc = cli(dir.path(), &["config", "set-rpc", "http://localhost:8545"]);
		run(&set_rpc, config_command(&set_rpc)).unwrap();

		let set_contract = cli(
			dir.path(),
			&["config", "set-contract", "0x00000000000000000000000000000000000000aa"],
		);
		run(&set_contract, config_command(&set_contract)).unwrap();

		let stored = ConfigStore::new(dir.path().join("config.json")).load().unwrap();
		assert_eq!(stored.rpc_url.as_deref(), Some("http://localhost:8545"));
		assert_eq!(
			stored.contract_address.as_deref(),
			Some(Address::with_last_byte(0xaa).to_checksum(None).as_str())
		);
	}

	#[test]
	fn invalid_values_are_not_saved() {
		let dir = tempfile::tempdir().unwrap();

		let bad_rpc = cli(dir.path(), &["config", "set-rpc", "not a url"]);
		assert!(run(&bad_rpc, config_command(&bad_rpc)).is_err());

		let bad_contract = cli(dir.path(), &["config", "set-contract", "0x1234"]);
		assert!(run(&bad_contract, config_command(&bad_contract)).is_err());

		assert!(!dir.path().join("config.json").exists());
	}
}
