pub mod keystore;
pub mod password;

use std::fmt;
use std::path::PathBuf;

use alloy_consensus::transaction::{RlpEcdsaDecodableTx, RlpEcdsaEncodableTx};
use alloy_consensus::{SignableTransaction, TxLegacy};
use alloy_primitives::{keccak256, Address, Bytes, TxKind, B256, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use zeroize::Zeroizing;

use crate::error::SigningError;
use crate::tx_builder::TransactionEnvelope;
use password::{FilePassword, InlinePassword, PasswordSource, PromptPassword};

/// Credential flags as supplied on the command line.
#[derive(Clone, Default)]
pub struct CredentialArgs {
	pub private_key: Option<String>,
	pub keyfile: Option<PathBuf>,
	pub password: Option<String>,
	pub password_file: Option<PathBuf>,
}

impl CredentialArgs {
	pub fn is_empty(&self) -> bool {
		self.private_key.is_none() && self.keyfile.is_none()
	}
}

/// Exactly one way to obtain a private key.
pub enum SigningCredential {
	RawKey(Zeroizing<Vec<u8>>),
	Keystore {
		path: PathBuf,
		password: Zeroizing<String>,
	},
}

impl fmt::Debug for SigningCredential {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::RawKey(_) => f.write_str("RawKey(<redacted>)"),
			Self::Keystore { path, .. } => f
				.debug_struct("Keystore")
				.field("path", path)
				.finish_non_exhaustive(),
		}
	}
}

impl SigningCredential {
	/// Turn the credential into usable key material.
	pub fn unlock(&self) -> Result<LocalKey, SigningError> {
		let signer = match self {
			Self::RawKey(bytes) => PrivateKeySigner::from_slice(bytes)
				.map_err(|e| SigningError::InvalidPrivateKey(e.to_string()))?,
			Self::Keystore { path, password } => keystore::decrypt(path, password)?,
		};
		Ok(LocalKey { signer })
	}
}

/// Resolves credential flags into one usable key.
///
/// A raw key is used as-is. A keystore path first acquires a password
/// (inline, file, then prompt) and then decrypts the file. Supplying both
/// or neither is an error.
pub struct SigningResolver<'a> {
	args: &'a CredentialArgs,
	prompt: Box<dyn PasswordSource + 'a>,
}

impl<'a> SigningResolver<'a> {
	pub fn new(args: &'a CredentialArgs) -> Self {
		Self {
			args,
			prompt: Box::new(PromptPassword::default()),
		}
	}

	/// Replace the interactive terminal prompt.
	pub fn with_prompt(mut self, prompt: impl PasswordSource + 'a) -> Self {
		self.prompt = Box::new(prompt);
		self
	}

	pub fn credential(&self) -> Result<SigningCredential, SigningError> {
		match (&self.args.private_key, &self.args.keyfile) {
			(Some(_), Some(_)) => Err(SigningError::ConflictingCredentials),
			(None, None) => Err(SigningError::NoCredential),
			(Some(key), None) => parse_private_key(key).map(SigningCredential::RawKey),
			(None, Some(path)) => {
				let inline = InlinePassword(self.args.password.as_deref());
				let file = FilePassword(self.args.password_file.as_deref());
				let password = password::acquire(&[&inline, &file, self.prompt.as_ref()])?;
				Ok(SigningCredential::Keystore {
					path: path.clone(),
					password,
				})
			}
		}
	}

	pub fn resolve(&self) -> Result<LocalKey, SigningError> {
		let key = self.credential()?.unlock()?;
		tracing::info!(address = %key.address(), "signing key resolved");
		Ok(key)
	}
}

fn parse_private_key(raw: &str) -> Result<Zeroizing<Vec<u8>>, SigningError> {
	let trimmed = raw.trim();
	let hex_str = trimmed.strip_prefix("0x").unwrap_or(trimmed);
	let bytes = Zeroizing::new(
		hex::decode(hex_str).map_err(|e| SigningError::InvalidPrivateKey(e.to_string()))?,
	);
	if bytes.len() != 32 {
		return Err(SigningError::InvalidPrivateKey(format!(
			"expected 32 bytes, got {}",
			bytes.len()
		)));
	}
	Ok(bytes)
}

/// Signs transaction envelopes.
pub trait TransactionSigner {
	/// The address the signer controls.
	fn address(&self) -> Address;

	/// Produce a replay-protected (EIP-155) signature over `envelope`.
	fn sign_transaction(&self, envelope: &TransactionEnvelope) -> Result<SignedTransaction, SigningError>;
}

/// A decrypted private key held in memory for one command.
pub struct LocalKey {
	signer: PrivateKeySigner,
}

impl LocalKey {
	pub fn from_signer(signer: PrivateKeySigner) -> Self {
		Self { signer }
	}
}

impl TransactionSigner for LocalKey {
	fn address(&self) -> Address {
		self.signer.address()
	}

	fn sign_transaction(&self, envelope: &TransactionEnvelope) -> Result<SignedTransaction, SigningError> {
		let tx = envelope.to_legacy();
		let signature = self
			.signer
			.sign_hash_sync(&tx.signature_hash())
			.map_err(|e| SigningError::Sign(e.to_string()))?;

		let mut raw = Vec::with_capacity(tx.rlp_encoded_length_with_signature(&signature));
		tx.rlp_encode_signed(&signature, &mut raw);

		Ok(SignedTransaction {
			envelope: envelope.clone(),
			v: eip155_v(envelope.chain_id, signature.v()),
			r: signature.r(),
			s: signature.s(),
			hash: keccak256(&raw),
			raw: raw.into(),
		})
	}
}

/// `chain_id * 2 + 35 + y_parity`.
pub fn eip155_v(chain_id: u64, y_parity: bool) -> u128 {
	u128::from(chain_id) * 2 + 35 + u128::from(y_parity)
}

/// An envelope plus its signature and wire encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
	pub envelope: TransactionEnvelope,
	pub v: u128,
	pub r: U256,
	pub s: U256,
	pub hash: B256,
	pub raw: Bytes,
}

/// Parse a signed raw transaction back into its envelope.
///
/// Only replay-protected legacy transactions to an address are accepted.
pub fn decode_raw(raw: &[u8]) -> Result<TransactionEnvelope, SigningError> {
	let mut buf = raw;
	let signed = TxLegacy::rlp_decode_signed(&mut buf)
		.map_err(|e| SigningError::Decode(e.to_string()))?;
	let tx = signed.tx();
	let to = match tx.to {
		TxKind::Call(to) => to,
		TxKind::Create => return Err(SigningError::Decode("contract creation".into())),
	};
	let chain_id = tx
		.chain_id
		.ok_or_else(|| SigningError::Decode("signature is not replay-protected".into()))?;
	Ok(TransactionEnvelope {
		to,
		value: tx.value,
		data: tx.input.clone(),
		gas_limit: tx.gas_limit,
		gas_price: tx.gas_price,
		nonce: tx.nonce,
		chain_id,
	})
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use super::keystore::tests::{write_keystore, TEST_KEY};
	use super::password::tests::ScriptedPrompt;
	use super::*;

	const TEST_ADDRESS: &str = "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23";

	fn raw_key_args() -> CredentialArgs {
		CredentialArgs {
			private_key: Some(format!("0x{TEST_KEY}")),
			..Default::default()
		}
	}

	fn envelope() -> TransactionEnvelope {
		TransactionEnvelope {
			to: Address::repeat_byte(0x11),
			value: U256::from(1_501_000_000_000_000_000u128),
			data: Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]),
			gas_limit: 200_000,
			gas_price: 5_000_000_000,
			nonce: 42,
			chain_id: 124_832,
		}
	}

	fn silent_prompt() -> ScriptedPrompt {
		ScriptedPrompt {
			answer: None,
			asked: Cell::new(0),
		}
	}

	#[test]
	fn raw_key_resolves_to_address() {
		let key = SigningResolver::new(&raw_key_args()).resolve().unwrap();
		assert_eq!(key.address(), TEST_ADDRESS.parse::<Address>().unwrap());
	}

	#[test]
	fn both_credentials_conflict() {
		let args = CredentialArgs {
			private_key: Some(TEST_KEY.into()),
			keyfile: Some("/tmp/key.json".into()),
			..Default::default()
		};
		let resolver = SigningResolver::new(&args).with_prompt(silent_prompt());
		assert!(matches!(resolver.credential(), Err(SigningError::ConflictingCredentials)));
	}

	#[test]
	fn no_credential_is_signing_error() {
		let args = CredentialArgs::default();
		assert!(matches!(
			SigningResolver::new(&args).credential(),
			Err(SigningError::NoCredential)
		));
	}

	#[test]
	fn malformed_key_is_rejected() {
		for bad in ["0x1234", "zz", ""] {
			let args = CredentialArgs {
				private_key: Some(bad.into()),
				..Default::default()
			};
			assert!(matches!(
				SigningResolver::new(&args).credential(),
				Err(SigningError::InvalidPrivateKey(_))
			));
		}
	}

	#[test]
	fn keystore_with_password_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = write_keystore(dir.path(), "correct horse");
		let pw_file = dir.path().join("pw.txt");
		std::fs::write(&pw_file, "correct horse\n").unwrap();

		let args = CredentialArgs {
			keyfile: Some(path),
			password_file: Some(pw_file),
			..Default::default()
		};
		let prompt = silent_prompt();
		let key = SigningResolver::new(&args).with_prompt(prompt).resolve().unwrap();
		assert_eq!(key.address(), TEST_ADDRESS.parse::<Address>().unwrap());
	}

	#[test]
	fn keystore_wrong_password_is_not_retried() {
		let dir = tempfile::tempdir().unwrap();
		let path = write_keystore(dir.path(), "right");
		let args = CredentialArgs {
			keyfile: Some(path),
			password: Some("wrong".into()),
			..Default::default()
		};
		let err = SigningResolver::new(&args)
			.with_prompt(silent_prompt())
			.resolve()
			.err()
			.unwrap();
		assert!(matches!(err, SigningError::Keystore { .. }));
	}

	#[test]
	fn signing_round_trips_through_raw_bytes() {
		let key = SigningResolver::new(&raw_key_args()).resolve().unwrap();
		let env = envelope();
		let signed = key.sign_transaction(&env).unwrap();

		let decoded = decode_raw(&signed.raw).unwrap();
		assert_eq!(decoded.to, env.to);
		assert_eq!(decoded.value, env.value);
		assert_eq!(decoded.data, env.data);
		assert_eq!(decoded.nonce, env.nonce);
		assert_eq!(decoded.chain_id, env.chain_id);
		assert_eq!(decoded, env);
		assert_eq!(signed.hash, keccak256(&signed.raw));
	}

	#[test]
	fn signature_is_bound_to_chain_id() {
		let key = SigningResolver::new(&raw_key_args()).resolve().unwrap();
		let signed = key.sign_transaction(&envelope()).unwrap();
		let parity = signed.v - 35 - 2 * 124_832;
		assert!(parity == 0 || parity == 1);
	}

	#[test]
	fn signing_is_deterministic() {
		let key = SigningResolver::new(&raw_key_args()).resolve().unwrap();
		let a = key.sign_transaction(&envelope()).unwrap();
		let b = key.sign_transaction(&envelope()).unwrap();
		assert_eq!(a, b);
	}

	#[test]
	fn signer_recovers_to_key_address() {
		let key = SigningResolver::new(&raw_key_args()).resolve().unwrap();
		let env = envelope();
		let signed = key.sign_transaction(&env).unwrap();
		let mut buf = &signed.raw[..];
		let decoded = TxLegacy::rlp_decode_signed(&mut buf).unwrap();
		let recovered = decoded
			.signature()
			.recover_address_from_prehash(&env.to_legacy().signature_hash())
			.unwrap();
		assert_eq!(recovered, key.address());
	}

	#[test]
	fn credential_debug_hides_secrets() {
		let cred = SigningResolver::new(&raw_key_args()).credential().unwrap();
		assert_eq!(format!("{cred:?}"), "RawKey(<redacted>)");
	}
}
