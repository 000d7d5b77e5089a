use alloy_consensus::TxLegacy;
use alloy_primitives::{Address, Bytes, TxKind, U256};

use crate::contracts::{CallRequest, ContractAbi};
use crate::error::{MissingInfoError, Result};
use crate::network::NetworkParameters;
use crate::rpc::{CallParams, EthRpc};

/// An unsigned, fully-populated legacy transaction.
///
/// Both build modes produce exactly this shape, so signing and
/// serialization never need to know which mode was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionEnvelope {
	pub to: Address,
	pub value: U256,
	pub data: Bytes,
	pub gas_limit: u64,
	pub gas_price: u128,
	pub nonce: u64,
	pub chain_id: u64,
}

impl TransactionEnvelope {
	/// The replay-protected legacy transaction this envelope describes.
	pub fn to_legacy(&self) -> TxLegacy {
		TxLegacy {
			chain_id: Some(self.chain_id),
			nonce: self.nonce,
			gas_price: self.gas_price,
			gas_limit: self.gas_limit,
			to: TxKind::Call(self.to),
			value: self.value,
			input: self.data.clone(),
		}
	}
}

/// How the envelope's nonce and gas limit are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
	/// Unpinned nonce and gas limit are fetched from the node.
	Online,
	/// Everything must already be in [`NetworkParameters`]; no I/O.
	Offline,
}

/// Turns a contract call into a transaction envelope.
#[async_trait::async_trait]
pub trait EnvelopeBuilder: Send + Sync {
	async fn build(
		&self,
		call: &CallRequest,
		params: &NetworkParameters,
		value: U256,
	) -> Result<TransactionEnvelope>;
}

/// Fills missing nonce (pending nonce of `from`) and gas (estimate) live.
pub struct OnlineBuilder<'a> {
	rpc: &'a dyn EthRpc,
	from: Address,
}

impl<'a> OnlineBuilder<'a> {
	pub fn new(rpc: &'a dyn EthRpc, from: Address) -> Self {
		Self { rpc, from }
	}
}

#[async_trait::async_trait]
impl EnvelopeBuilder for OnlineBuilder<'_> {
	async fn build(
		&self,
		call: &CallRequest,
		params: &NetworkParameters,
		value: U256,
	) -> Result<TransactionEnvelope> {
		let data = encode_call(call)?;

		let nonce = match params.nonce {
			Some(n) => n,
			None => {
				let n = self.rpc.pending_nonce(self.from).await?;
				eprintln!("Using nonce from node: {n}");
				n
			}
		};

		let gas_limit = match params.gas_limit {
			Some(g) => g,
			None => {
				let estimate = CallParams {
					from: Some(self.from),
					to: call.to,
					value,
					data: data.clone(),
				};
				let g = self.rpc.estimate_gas(&estimate).await?;
				eprintln!("Using estimated gas limit: {g}");
				g
			}
		};

		Ok(assemble(call.to, value, data, gas_limit, nonce, params))
	}
}

/// Builds from explicit parameters only.
pub struct OfflineBuilder;

#[async_trait::async_trait]
impl EnvelopeBuilder for OfflineBuilder {
	async fn build(
		&self,
		call: &CallRequest,
		params: &NetworkParameters,
		value: U256,
	) -> Result<TransactionEnvelope> {
		build_offline(call, params, value)
	}
}

/// Synchronous core of [`OfflineBuilder`].
pub fn build_offline(
	call: &CallRequest,
	params: &NetworkParameters,
	value: U256,
) -> Result<TransactionEnvelope> {
	let (gas_limit, nonce) = match (params.gas_limit, params.nonce) {
		(Some(g), Some(n)) => (g, n),
		(gas, nonce) => {
			let mut missing = Vec::new();
			if gas.is_none() {
				missing.push("--gas-limit".to_owned());
			}
			if nonce.is_none() {
				missing.push("--nonce".to_owned());
			}
			return Err(MissingInfoError { missing }.into());
		}
	};
	let data = encode_call(call)?;
	Ok(assemble(call.to, value, data, gas_limit, nonce, params))
}

/// Pick the builder for `mode`. Online mode needs a node and a sender.
pub fn builder_for<'a>(
	mode: BuildMode,
	rpc: Option<&'a dyn EthRpc>,
	from: Option<Address>,
) -> Result<Box<dyn EnvelopeBuilder + 'a>> {
	match (mode, rpc, from) {
		(BuildMode::Offline, _, _) => Ok(Box::new(OfflineBuilder)),
		(BuildMode::Online, Some(rpc), Some(from)) => Ok(Box::new(OnlineBuilder::new(rpc, from))),
		(BuildMode::Online, None, _) => Err(crate::error::NetworkError::NoEndpoint.into()),
		(BuildMode::Online, Some(_), None) => Err(MissingInfoError {
			missing: vec!["--from".to_owned()],
		}
		.into()),
	}
}

fn encode_call(call: &CallRequest) -> Result<Bytes> {
	Ok(ContractAbi::load(call.contract)?.encode(call)?)
}

fn assemble(
	to: Address,
	value: U256,
	data: Bytes,
	gas_limit: u64,
	nonce: u64,
	params: &NetworkParameters,
) -> TransactionEnvelope {
	TransactionEnvelope {
		to,
		value,
		data,
		gas_limit,
		gas_price: params.gas_price,
		nonce,
		chain_id: params.chain_id,
	}
}
