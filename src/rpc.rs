use alloy_network::ReceiptResponse;
use alloy_primitives::{Address, Bytes, TxKind, B256, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types_eth::{TransactionInput, TransactionRequest};
use alloy_transport::TransportError;

use crate::error::NetworkError;

/// Parameters for `eth_estimateGas`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallParams {
	pub from: Option<Address>,
	pub to: Address,
	pub value: U256,
	pub data: Bytes,
}

/// The parts of a transaction receipt this tool cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
	pub success: bool,
	pub block_number: Option<u64>,
}

/// The node queries the transaction pipeline needs.
///
/// Every call is a single blocking request/response; implementations do
/// not retry.
#[async_trait::async_trait]
pub trait EthRpc: Send + Sync {
	async fn chain_id(&self) -> Result<u64, NetworkError>;

	async fn gas_price(&self) -> Result<u128, NetworkError>;

	/// Nonce of `address` including pending transactions.
	async fn pending_nonce(&self, address: Address) -> Result<u64, NetworkError>;

	async fn estimate_gas(&self, params: &CallParams) -> Result<u64, NetworkError>;

	/// Read-only `eth_call` against the latest block.
	async fn call(&self, to: Address, data: &Bytes) -> Result<Bytes, NetworkError>;

	async fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256, NetworkError>;

	/// `None` until the transaction is mined.
	async fn transaction_receipt(&self, hash: B256) -> Result<Option<Receipt>, NetworkError>;
}

/// Client for an Ethereum-compatible node, backed by an alloy HTTP provider.
pub struct RpcClient {
	url: reqwest::Url,
	provider: DynProvider,
}

impl RpcClient {
	pub fn new(url: &str) -> Result<Self, NetworkError> {
		let url = reqwest::Url::parse(url.trim()).map_err(|e| NetworkError::InvalidEndpoint {
			url: url.to_owned(),
			reason: e.to_string(),
		})?;
		let provider = ProviderBuilder::new().connect_http(url.clone()).erased();
		Ok(Self { url, provider })
	}

	pub fn url(&self) -> &str {
		self.url.as_str()
	}
}

/// Split node-side errors (which carry a JSON-RPC code) from transport failures.
fn rpc_error(method: &'static str) -> impl FnOnce(TransportError) -> NetworkError {
	move |err| match err.as_error_resp() {
		Some(payload) => NetworkError::Rpc {
			method: method.to_owned(),
			code: payload.code,
			message: payload.message.to_string(),
		},
		None => NetworkError::Transport {
			method: method.to_owned(),
			reason: err.to_string(),
		},
	}
}

fn call_request(from: Option<Address>, to: Address, value: Option<U256>, data: Bytes) -> TransactionRequest {
	TransactionRequest {
		from,
		to: Some(TxKind::Call(to)),
		value,
		input: TransactionInput::new(data),
		..Default::default()
	}
}

#[async_trait::async_trait]
impl EthRpc for RpcClient {
	async fn chain_id(&self) -> Result<u64, NetworkError> {
		tracing::debug!(method = "eth_chainId", "rpc request");
		self.provider.get_chain_id().await.map_err(rpc_error("eth_chainId"))
	}

	async fn gas_price(&self) -> Result<u128, NetworkError> {
		tracing::debug!(method = "eth_gasPrice", "rpc request");
		self.provider.get_gas_price().await.map_err(rpc_error("eth_gasPrice"))
	}

	async fn pending_nonce(&self, address: Address) -> Result<u64, NetworkError> {
		tracing::debug!(method = "eth_getTransactionCount", %address, "rpc request");
		self.provider
			.get_transaction_count(address)
			.pending()
			.await
			.map_err(rpc_error("eth_getTransactionCount"))
	}

	async fn estimate_gas(&self, params: &CallParams) -> Result<u64, NetworkError> {
		tracing::debug!(method = "eth_estimateGas", to = %params.to, "rpc request");
		let tx = call_request(params.from, params.to, Some(params.value), params.data.clone());
		self.provider
			.estimate_gas(tx)
			.await
			.map_err(rpc_error("eth_estimateGas"))
	}

	async fn call(&self, to: Address, data: &Bytes) -> Result<Bytes, NetworkError> {
		tracing::debug!(method = "eth_call", %to, "rpc request");
		self.provider
			.call(call_request(None, to, None, data.clone()))
			.await
			.map_err(rpc_error("eth_call"))
	}

	async fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256, NetworkError> {
		tracing::debug!(method = "eth_sendRawTransaction", "rpc request");
		let pending = self
			.provider
			.send_raw_transaction(raw)
			.await
			.map_err(rpc_error("eth_sendRawTransaction"))?;
		Ok(*pending.tx_hash())
	}

	async fn transaction_receipt(&self, hash: B256) -> Result<Option<Receipt>, NetworkError> {
		tracing::debug!(method = "eth_getTransactionReceipt", %hash, "rpc request");
		let receipt = self
			.provider
			.get_transaction_receipt(hash)
			.await
			.map_err(rpc_error("eth_getTransactionReceipt"))?;
		// Pre-Byzantium receipts carry a state root instead of a status and
		// report success here.
		Ok(receipt.map(|r| Receipt {
			success: r.status(),
			block_number: r.block_number(),
		}))
	}
}


#[cfg(test)]
mod tests {
	use alloy_json_rpc::{ErrorPayload, RpcError};
	use alloy_transport::TransportErrorKind;

	use super::*;

	#[test]
	fn endpoint_must_be_a_url() {
		assert!(matches!(
			RpcClient::new("not a url"),
			Err(NetworkError::InvalidEndpoint { .. })
		));
		let client = RpcClient::new(" http://localhost:8545 ").unwrap();
		assert!(client.url().starts_with("http://localhost:8545"));
	}

	#[test]
	fn node_error_keeps_code_and_message() {
		let payload: ErrorPayload =
			serde_json::from_str(r#"{ "code": -32000, "message": "nonce too low" }"#).unwrap();
		match rpc_error("eth_sendRawTransaction")(RpcError::ErrorResp(payload)) {
			NetworkError::Rpc { method, code, message } => {
				assert_eq!(method, "eth_sendRawTransaction");
				assert_eq!(code, -32000);
				assert_eq!(message, "nonce too low");
			}
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[test]
	fn transport_failure_names_the_method() {
		let err = rpc_error("eth_chainId")(TransportErrorKind::custom_str("connection refused"));
		match err {
			NetworkError::Transport { method, reason } => {
				assert_eq!(method, "eth_chainId");
				assert!(reason.contains("connection refused"));
			}
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[test]
	fn call_request_targets_contract() {
		let to = Address::repeat_byte(7);
		let tx = call_request(None, to, None, Bytes::from(vec![0xde, 0xad]));
		assert_eq!(tx.to, Some(TxKind::Call(to)));
		assert_eq!(tx.value, None);
		assert_eq!(tx.input.input(), Some(&Bytes::from(vec![0xde, 0xad])));
	}
}
