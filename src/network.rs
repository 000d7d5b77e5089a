//! Resolution of chain id, gas price, gas limit and protocol fee.
//!
//! With a node available, anything the operator did not pin is fetched
//! live and echoed to stderr. Without one, every unpinned parameter is
//! collected into a single [`MissingInfoError`].

use alloy_primitives::{Address, U256};

use crate::contracts::{CallRequest, ContractAbi, ContractKind};
use crate::error::{MissingInfoError, Result};
use crate::rpc::EthRpc;
use crate::units;

/// Values the operator pinned on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkOverrides {
	pub chain_id: Option<u64>,
	pub gas_price: Option<u128>,
	pub gas_limit: Option<u64>,
	pub nonce: Option<u64>,
	/// Protocol fee in base units.
	pub fee: Option<U256>,
}

/// Resolved network parameters for one transaction.
///
/// `gas_limit` and `nonce` may still be `None` in online mode; the
/// transaction builder fills them from the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkParameters {
	pub chain_id: u64,
	pub gas_price: u128,
	pub gas_limit: Option<u64>,
	pub nonce: Option<u64>,
	pub fee: Option<U256>,
}

/// Where the protocol fee comes from, if the call needs one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeRequirement {
	None,
	/// Read `fee()` from the given contract.
	Contract(ContractKind, Address),
}

pub struct NetworkInfoResolver<'a> {
	rpc: Option<&'a dyn EthRpc>,
}

impl<'a> NetworkInfoResolver<'a> {
	pub fn new(rpc: Option<&'a dyn EthRpc>) -> Self {
		Self { rpc }
	}

	pub fn offline() -> Self {
		Self { rpc: None }
	}

	pub fn is_online(&self) -> bool {
		self.rpc.is_some()
	}

	pub async fn resolve(
		&self,
		requested: &NetworkOverrides,
		fee: FeeRequirement,
	) -> Result<NetworkParameters> {
		match self.rpc {
			Some(rpc) => resolve_online(rpc, requested, fee).await,
			None => resolve_offline(requested, fee),
		}
	}
}

/// Offline resolution is a pure function of the overrides.
pub fn resolve_offline(
	requested: &NetworkOverrides,
	fee: FeeRequirement,
) -> Result<NetworkParameters> {
	let needs_fee = matches!(fee, FeeRequirement::Contract(..));
	let missing: Vec<String> = [
		("--chain-id", requested.chain_id.is_none()),
		("--gas-price", requested.gas_price.is_none()),
		("--gas-limit", requested.gas_limit.is_none()),
		("--fee", needs_fee && requested.fee.is_none()),
	]
	.into_iter()
	.filter(|(_, absent)| *absent)
	.map(|(flag, _)| flag.to_owned())
	.collect();

	match (requested.chain_id, requested.gas_price) {
		(Some(chain_id), Some(gas_price)) if missing.is_empty() => Ok(NetworkParameters {
			chain_id,
			gas_price,
			gas_limit: requested.gas_limit,
			nonce: requested.nonce,
			fee: if needs_fee { requested.fee } else { None },
		}),
		_ => Err(MissingInfoError { missing }.into()),
	}
}

async fn resolve_online(
	rpc: &dyn EthRpc,
	requested: &NetworkOverrides,
	fee: FeeRequirement,
) -> Result<NetworkParameters> {
	let chain_id = match requested.chain_id {
		Some(id) => id,
		None => {
			let id = rpc.chain_id().await?;
			echo("chain id", &id.to_string());
			id
		}
	};

	let gas_price = match requested.gas_price {
		Some(price) => price,
		None => {
			let price = rpc.gas_price().await?;
			echo("gas price", &format!("{price} wei"));
			price
		}
	};

	let fee = match (fee, requested.fee) {
		(FeeRequirement::None, _) => None,
		(FeeRequirement::Contract(..), Some(pinned)) => Some(pinned),
		(FeeRequirement::Contract(kind, address), None) => {
			let value = fetch_fee(rpc, kind, address).await?;
			echo("protocol fee", &units::format_amount(value));
			Some(value)
		}
	};

	Ok(NetworkParameters {
		chain_id,
		gas_price,
		gas_limit: requested.gas_limit,
		nonce: requested.nonce,
		fee,
	})
}

/// Read `fee()` from a deployed contract.
pub async fn fetch_fee(rpc: &dyn EthRpc, kind: ContractKind, address: Address) -> Result<U256> {
	let abi = ContractAbi::load(kind)?;
	let data = abi.encode(&CallRequest::fee(kind, address))?;
	let out = rpc.call(address, &data).await?;
	Ok(abi.decode_uint("fee", &out)?)
}

fn echo(label: &str, value: &str) {
	tracing::info!(%value, "{label} fetched from node");
	eprintln!("Using {label} from node: {value}");
}
