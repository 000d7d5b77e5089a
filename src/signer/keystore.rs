//! Encrypted JSON (v3) keystore files, as written by standard Ethereum tooling.

use std::path::Path;

use alloy_signer_local::PrivateKeySigner;

use crate::error::SigningError;

/// Decrypt the keystore at `path`. Never retried on failure.
pub fn decrypt(path: &Path, password: &str) -> Result<PrivateKeySigner, SigningError> {
	if !path.is_file() {
		return Err(SigningError::Keystore {
			path: path.to_owned(),
			reason: "file not found".into(),
		});
	}
	let signer = PrivateKeySigner::decrypt_keystore(path, password).map_err(|e| {
		SigningError::Keystore {
			path: path.to_owned(),
			reason: e.to_string(),
		}
	})?;
	tracing::debug!(address = %signer.address(), "keystore decrypted");
	Ok(signer)
}

#[cfg(test)]
pub(crate) mod tests {
	use std::path::PathBuf;

	use super::*;

	pub(crate) const TEST_KEY: &str =
		"4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

	/// Write `TEST_KEY` encrypted with `password` into `dir`.
	pub(crate) fn write_keystore(dir: &Path, password: &str) -> PathBuf {
		let key = hex::decode(TEST_KEY).unwrap();
		let mut rng = rand::thread_rng();
		PrivateKeySigner::encrypt_keystore(dir, &mut rng, key, password, Some("operator")).unwrap();
		dir.join("operator")
	}

	#[test]
	fn decrypts_with_correct_password() {
		let dir = tempfile::tempdir().unwrap();
		let path = write_keystore(dir.path(), "hunter2");
		let signer = decrypt(&path, "hunter2").unwrap();
		let expected = PrivateKeySigner::from_slice(&hex::decode(TEST_KEY).unwrap()).unwrap();
		assert_eq!(signer.address(), expected.address());
	}

	#[test]
	fn wrong_password_is_signing_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = write_keystore(dir.path(), "hunter2");
		let err = decrypt(&path, "hunter3").unwrap_err();
		assert!(matches!(err, SigningError::Keystore { .. }));
	}

	#[test]
	fn missing_file_is_signing_error() {
		let dir = tempfile::tempdir().unwrap();
		let err = decrypt(&dir.path().join("absent.json"), "pw").unwrap_err();
		assert!(err.to_string().contains("file not found"));
	}

	#[test]
	fn corrupt_file_is_signing_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("broken.json");
		std::fs::write(&path, "{\"version\":3}").unwrap();
		assert!(matches!(decrypt(&path, "pw"), Err(SigningError::Keystore { .. })));
	}
}
