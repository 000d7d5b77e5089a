//! JSON rendering of built and signed transactions.

use std::io::Write;
use std::path::PathBuf;

use alloy_primitives::{Bytes, B256};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::signer::SignedTransaction;
use crate::submit::ConfirmationResult;
use crate::tx_builder::TransactionEnvelope;

/// `{to, value, data, gasLimit, gasPrice, nonce, chainId}`.
///
/// Quantities that can exceed 2^53 are rendered as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTxOutput {
	pub to: String,
	pub value: String,
	pub data: Bytes,
	pub gas_limit: u64,
	pub gas_price: String,
	pub nonce: u64,
	pub chain_id: u64,
}

impl From<&TransactionEnvelope> for UnsignedTxOutput {
	fn from(env: &TransactionEnvelope) -> Self {
		Self {
			to: env.to.to_checksum(None),
			value: env.value.to_string(),
			data: env.data.clone(),
			gas_limit: env.gas_limit,
			gas_price: env.gas_price.to_string(),
			nonce: env.nonce,
			chain_id: env.chain_id,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureOutput {
	pub v: u128,
	pub r: B256,
	pub s: B256,
}

/// The unsigned fields plus `{signature: {v, r, s}, hash, raw}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedTxOutput {
	#[serde(flatten)]
	pub tx: UnsignedTxOutput,
	pub signature: SignatureOutput,
	pub hash: B256,
	pub raw: Bytes,
}

impl From<&SignedTransaction> for SignedTxOutput {
	fn from(signed: &SignedTransaction) -> Self {
		Self {
			tx: UnsignedTxOutput::from(&signed.envelope),
			signature: SignatureOutput {
				v: signed.v,
				r: B256::from(signed.r.to_be_bytes::<32>()),
				s: B256::from(signed.s.to_be_bytes::<32>()),
			},
			hash: signed.hash,
			raw: signed.raw.clone(),
		}
	}
}

/// Result of `tx send`: the hash, plus the receipt outcome with `--wait`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionOutput {
	pub hash: B256,
	#[serde(flatten)]
	pub confirmation: Option<ConfirmationResult>,
}

/// Where command output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
	Stdout,
	File(PathBuf),
}

impl OutputTarget {
	pub fn from_flag(path: Option<PathBuf>) -> Self {
		path.map_or(Self::Stdout, Self::File)
	}
}

/// Pretty-print `value` as JSON to the target.
pub fn write_json<T: Serialize>(target: &OutputTarget, value: &T) -> Result<()> {
	let mut json = serde_json::to_string_pretty(value).map_err(|e| Error::Output {
		path: PathBuf::from("<json>"),
		source: e.into(),
	})?;
	json.push('\n');

	match target {
		OutputTarget::Stdout => {
			let mut out = std::io::stdout().lock();
			out.write_all(json.as_bytes())
				.and_then(|()| out.flush())
				.map_err(|source| Error::Output {
					path: PathBuf::from("<stdout>"),
					source,
				})
		}
		OutputTarget::File(path) => {
			std::fs::write(path, json).map_err(|source| Error::Output {
				path: path.clone(),
				source,
			})?;
			eprintln!("Transaction written to {}", path.display());
			Ok(())
		}
	}
}

#[cfg(test)]
mod tests {
	use alloy_primitives::{Address, U256};
	use serde_json::json;

	use super::*;
	use crate::submit::ConfirmationStatus;

	fn envelope() -> TransactionEnvelope {
		TransactionEnvelope {
			to: Address::repeat_byte(0xab),
			value: U256::from(1_501_000_000_000_000_000u128),
			data: Bytes::from(vec![0x01, 0x02]),
			gas_limit: 21_000,
			gas_price: 1_000_000_000,
			nonce: 3,
			chain_id: 1337,
		}
	}

	#[test]
	fn unsigned_shape() {
		let json = serde_json::to_value(UnsignedTxOutput::from(&envelope())).unwrap();
		assert_eq!(
			json,
			json!({
				"to": Address::repeat_byte(0xab).to_checksum(None),
				"value": "1501000000000000000",
				"data": "0x0102",
				"gasLimit": 21000,
				"gasPrice": "1000000000",
				"nonce": 3,
				"chainId": 1337,
			})
		);
	}

	#[test]
	fn signed_adds_signature_hash_and_raw() {
		let signed = SignedTransaction {
			envelope: envelope(),
			v: 2709,
			r: U256::from(1),
			s: U256::from(2),
			hash: B256::repeat_byte(0x11),
			raw: Bytes::from(vec![0xf8]),
		};
		let json = serde_json::to_value(SignedTxOutput::from(&signed)).unwrap();
		assert_eq!(json["nonce"], 3);
		assert_eq!(json["signature"]["v"], 2709);
		assert_eq!(
			json["signature"]["r"],
			"0x0000000000000000000000000000000000000000000000000000000000000001"
		);
		assert_eq!(json["hash"], json!(B256::repeat_byte(0x11)));
		assert_eq!(json["raw"], "0xf8");
	}

	#[test]
	fn submission_flattens_confirmation() {
		let hash = B256::repeat_byte(0x22);
		let pending = serde_json::to_value(SubmissionOutput {
			hash,
			confirmation: None,
		})
		.unwrap();
		assert_eq!(pending, json!({ "hash": hash }));

		let mined = serde_json::to_value(SubmissionOutput {
			hash,
			confirmation: Some(ConfirmationResult {
				status: ConfirmationStatus::Success,
				block_number: Some(5),
			}),
		})
		.unwrap();
		assert_eq!(
			mined,
			json!({ "hash": hash, "status": "success", "blockNumber": 5 })
		);
	}

	#[test]
	fn writes_to_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("tx.json");
		let target = OutputTarget::from_flag(Some(path.clone()));
		write_json(&target, &UnsignedTxOutput::from(&envelope())).unwrap();
		let back: serde_json::Value =
			serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
		assert_eq!(back["chainId"], 1337);
	}

	#[test]
	fn unwritable_file_is_output_error() {
		let target = OutputTarget::File(PathBuf::from("/nonexistent/dir/tx.json"));
		let err = write_json(&target, &json!({})).unwrap_err();
		assert!(matches!(err, Error::Output { .. }));
	}
}
