//! Broadcasting signed transactions and waiting for their receipts.

use std::time::Duration;

use alloy_primitives::B256;
use serde::Serialize;
use tokio::time::{sleep, Instant};

use crate::error::{ConfirmationError, NetworkError, Result};
use crate::rpc::EthRpc;
use crate::signer::SignedTransaction;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationStatus {
	Success,
	Reverted,
	Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationResult {
	pub status: ConfirmationStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub block_number: Option<u64>,
}

impl ConfirmationResult {
	/// Map anything but success to a [`ConfirmationError`].
	pub fn into_result(self, tx_hash: B256, waited: Duration) -> Result<u64, ConfirmationError> {
		match self.status {
			ConfirmationStatus::Success => Ok(self.block_number.unwrap_or_default()),
			ConfirmationStatus::Reverted => Err(ConfirmationError::Reverted {
				tx_hash,
				block_number: self.block_number,
			}),
			ConfirmationStatus::Timeout => Err(ConfirmationError::Timeout { tx_hash, waited }),
		}
	}
}

pub struct Submitter<'a> {
	rpc: &'a dyn EthRpc,
	poll_interval: Duration,
}

impl<'a> Submitter<'a> {
	pub fn new(rpc: &'a dyn EthRpc) -> Self {
		Self {
			rpc,
			poll_interval: DEFAULT_POLL_INTERVAL,
		}
	}

	pub fn with_poll_interval(mut self, interval: Duration) -> Self {
		self.poll_interval = interval;
		self
	}

	/// Broadcast once. A failed broadcast is not retried.
	pub async fn submit(&self, tx: &SignedTransaction) -> Result<B256> {
		let returned = self.rpc.send_raw_transaction(&tx.raw).await?;
		if returned != tx.hash {
			return Err(NetworkError::HashMismatch {
				expected: tx.hash,
				returned,
			}
			.into());
		}
		tracing::info!(hash = %returned, "transaction broadcast");
		Ok(returned)
	}

	/// Poll for a receipt every `poll_interval` until one appears or
	/// `timeout` elapses. Not finding a receipt is a result, not an error.
	pub async fn await_confirmation(&self, tx_hash: B256, timeout: Duration) -> Result<ConfirmationResult> {
		let deadline = Instant::now() + timeout;
		loop {
			if let Some(receipt) = self.rpc.transaction_receipt(tx_hash).await? {
				let status = if receipt.success {
					ConfirmationStatus::Success
				} else {
					ConfirmationStatus::Reverted
				};
				tracing::info!(hash = %tx_hash, ?status, block = ?receipt.block_number, "receipt found");
				return Ok(ConfirmationResult {
					status,
					block_number: receipt.block_number,
				});
			}

			let now = Instant::now();
			if now >= deadline {
				tracing::warn!(hash = %tx_hash, "no receipt before deadline");
				return Ok(ConfirmationResult {
					status: ConfirmationStatus::Timeout,
					block_number: None,
				});
			}
			tracing::debug!(hash = %tx_hash, "receipt pending");
			sleep(self.poll_interval.min(deadline - now)).await;
		}
	}
}

#[cfg(test)]
mod tests {
	use alloy_primitives::{keccak256, Address, Bytes, U256};

	use super::*;
	use crate::error::Error;
	use crate::rpc::mock::MockRpc;
	use crate::rpc::Receipt;
	use crate::tx_builder::TransactionEnvelope;

	const FAST: Duration = Duration::from_millis(5);

	fn signed() -> SignedTransaction {
		let raw = Bytes::from(vec![0xf8, 0x01, 0x02]);
		SignedTransaction {
			envelope: TransactionEnvelope {
				to: Address::ZERO,
				value: U256::ZERO,
				data: Bytes::new(),
				gas_limit: 21_000,
				gas_price: 1,
				nonce: 0,
				chain_id: 1,
			},
			v: 37,
			r: U256::from(1),
			s: U256::from(2),
			hash: keccak256(&raw),
			raw,
		}
	}

	#[tokio::test]
	async fn never_mined_is_timeout_result() {
		let rpc = MockRpc::default();
		let result = Submitter::new(&rpc)
			.with_poll_interval(FAST)
			.await_confirmation(B256::ZERO, Duration::from_millis(30))
			.await
			.unwrap();
		assert_eq!(result.status, ConfirmationStatus::Timeout);
		assert_eq!(result.block_number, None);
		assert!(rpc.calls().len() >= 2);
	}

	#[tokio::test]
	async fn failed_receipt_is_reverted() {
		let rpc = MockRpc::default();
		rpc.push_receipt(None);
		rpc.push_receipt(Some(Receipt {
			success: false,
			block_number: Some(99),
		}));
		let result = Submitter::new(&rpc)
			.with_poll_interval(FAST)
			.await_confirmation(B256::ZERO, Duration::from_secs(5))
			.await
			.unwrap();
		assert_eq!(
			result,
			ConfirmationResult {
				status: ConfirmationStatus::Reverted,
				block_number: Some(99)
			}
		);
		assert_eq!(rpc.calls().len(), 2);
	}

	#[tokio::test]
	async fn successful_receipt() {
		let rpc = MockRpc::default();
		rpc.push_receipt(Some(Receipt {
			success: true,
			block_number: Some(12),
		}));
		let result = Submitter::new(&rpc)
			.await_confirmation(B256::ZERO, Duration::from_secs(5))
			.await
			.unwrap();
		assert_eq!(result.status, ConfirmationStatus::Success);
		assert_eq!(result.into_result(B256::ZERO, Duration::ZERO), Ok(12));
	}

	#[test]
	fn reverted_and_timeout_map_to_distinct_errors() {
		let reverted = ConfirmationResult {
			status: ConfirmationStatus::Reverted,
			block_number: Some(3),
		};
		let timeout = ConfirmationResult {
			status: ConfirmationStatus::Timeout,
			block_number: None,
		};
		assert!(matches!(
			reverted.into_result(B256::ZERO, Duration::ZERO),
			Err(ConfirmationError::Reverted { block_number: Some(3), .. })
		));
		assert!(matches!(
			timeout.into_result(B256::ZERO, Duration::from_secs(60)),
			Err(ConfirmationError::Timeout { .. })
		));
	}

	#[test]
	fn status_serializes_lowercase() {
		let json = serde_json::to_value(ConfirmationResult {
			status: ConfirmationStatus::Timeout,
			block_number: None,
		})
		.unwrap();
		assert_eq!(json, serde_json::json!({ "status": "timeout" }));
	}

	#[tokio::test]
	async fn submit_returns_hash() {
		let rpc = MockRpc::default();
		let tx = signed();
		let hash = Submitter::new(&rpc).submit(&tx).await.unwrap();
		assert_eq!(hash, tx.hash);
		assert_eq!(rpc.sent.lock().unwrap().as_slice(), &[tx.raw.clone()]);
	}

	#[tokio::test]
	async fn failed_broadcast_is_not_retried() {
		let rpc = MockRpc {
			fail_send: true,
			..MockRpc::default()
		};
		let err = Submitter::new(&rpc).submit(&signed()).await.unwrap_err();
		assert!(matches!(err, Error::Network(NetworkError::Rpc { .. })));
		assert_eq!(rpc.calls(), vec!["eth_sendRawTransaction"]);
	}
}
