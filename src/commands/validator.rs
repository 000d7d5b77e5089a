use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};
use anyhow::Result;

use crate::cli::{Cli, ValidatorCommand};
use crate::commands::tx::parse_address_arg;
use crate::commands::{load_config, require_rpc};
use crate::contracts::{format_value, CallRequest, ContractAbi, ContractKind};
use crate::network::fetch_fee;
use crate::rpc::EthRpc;
use crate::units;

pub async fn run(cli: &Cli, cmd: &ValidatorCommand) -> Result<()> {
	let (_, config) = load_config(cli)?;
	let rpc = require_rpc(&config)?;
	let contract = config.contract()?;

	match cmd {
		ValidatorCommand::Info { validator_address } => {
			let validator = parse_address_arg(validator_address)?;
			match fetch_info(&rpc, contract, validator).await? {
				Some(fields) => {
					for (name, value) in fields {
						println!("{:<15} {value}", format!("{name}:"));
					}
				}
				None => println!("{} is not a registered validator", validator.to_checksum(None)),
			}
			Ok(())
		}
		ValidatorCommand::Fee => {
			let fee = fetch_fee(&rpc, ContractKind::ValidatorManager, contract).await?;
			println!("Fee: {} ({fee} wei)", units::format_amount(fee));
			Ok(())
		}
	}
}

/// Labelled fields of `validatorInfo`, or `None` for an unknown validator.
pub async fn fetch_info(
	rpc: &dyn EthRpc,
	contract: Address,
	validator: Address,
) -> Result<Option<Vec<(String, String)>>> {
	let abi = ContractAbi::load(ContractKind::ValidatorManager)?;
	let args = vec![DynSolValue::Address(validator)];

	let query = |method: &str| {
		abi.encode(&CallRequest::new(
			ContractKind::ValidatorManager,
			contract,
			method,
			args.clone(),
		))
	};

	let out = rpc.call(contract, &query("isValidator")?).await?;
	if !matches!(abi.decode("isValidator", &out)?.as_slice(), [DynSolValue::Bool(true)]) {
		return Ok(None);
	}

	let out = rpc.call(contract, &query("validatorInfo")?).await?;
	let values = abi.decode("validatorInfo", &out)?;
	let names = abi.output_names("validatorInfo")?;
	Ok(Some(
		names
			.into_iter()
			.zip(&values)
			.map(|(name, value)| {
				let rendered = describe(&name, value);
				(name, rendered)
			})
			.collect(),
	))
}

fn describe(name: &str, value: &DynSolValue) -> String {
	match (name, value) {
		("collateral", DynSolValue::Uint(amount, _)) => {
			format!("{} ({amount} wei)", units::format_amount(*amount))
		}
		("commissionRate", DynSolValue::Uint(bps, _)) => format_percent(*bps),
		_ => format_value(value),
	}
}

/// Basis points as a percentage, e.g. 550 -> "5.50%".
fn format_percent(bps: U256) -> String {
	let hundred = U256::from(100u64);
	format!("{}.{:02}%", bps / hundred, (bps % hundred).to::<u64>())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::rpc::mock::MockRpc;

	#[tokio::test]
	async fn unknown_validator_stops_after_first_call() {
		let rpc = MockRpc::default();
		let info = fetch_info(&rpc, Address::repeat_byte(1), Address::repeat_byte(2))
			.await
			.unwrap();
		assert!(info.is_none());
		assert_eq!(rpc.calls(), vec!["eth_call"]);
	}

	#[test]
	fn descriptions() {
		assert_eq!(format_percent(U256::from(550u64)), "5.50%");
		assert_eq!(format_percent(U256::from(10_000u64)), "100.00%");
		assert_eq!(
			describe(
				"collateral",
				&DynSolValue::Uint(U256::from(1_500_000_000_000_000_000u128), 256)
			),
			"1.500000000000000000 (1500000000000000000 wei)"
		);
		assert_eq!(describe("jailed", &DynSolValue::Bool(false)), "false");
	}
}
