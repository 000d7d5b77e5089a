//! Error taxonomy shared by every stage of the transaction pipeline.
//!
//! Each stage returns its own error type; [`Error`] gathers them so the
//! binary can map a failure to an exit code without string matching.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use alloy_primitives::B256;
use thiserror::Error;

/// Main error type for the library.
#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	FlagValidation(#[from] FlagViolation),

	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error(transparent)]
	Signing(#[from] SigningError),

	#[error(transparent)]
	Network(#[from] NetworkError),

	#[error(transparent)]
	MissingInfo(#[from] MissingInfoError),

	#[error(transparent)]
	Encoding(#[from] EncodingError),

	#[error(transparent)]
	Confirmation(#[from] ConfirmationError),

	/// Writing command output failed.
	#[error("failed to write output to {path}: {source}")]
	Output {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// -- Flag validation --

/// How a mutually-exclusive group was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
	/// More than one flag of the group was supplied.
	TooMany,
	/// A required group had none of its flags supplied.
	TooFew,
}

/// A structured flag-group violation.
///
/// For [`ViolationKind::TooMany`] `flags` lists the conflicting flags that
/// were supplied; for [`ViolationKind::TooFew`] it lists the group's options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct FlagViolation {
	pub group: String,
	pub kind: ViolationKind,
	pub flags: Vec<String>,
}

impl fmt::Display for FlagViolation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let flags = self
			.flags
			.iter()
			.map(|name| format!("--{name}"))
			.collect::<Vec<_>>()
			.join(", ");
		match self.kind {
			ViolationKind::TooMany => write!(
				f,
				"flags {flags} cannot be used together ({} group)",
				self.group
			),
			ViolationKind::TooFew => {
				write!(f, "one of {flags} is required ({} group)", self.group)
			}
		}
	}
}

// -- Config --

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("could not determine the user config directory")]
	NoConfigDir,

	#[error("failed to read config file {path}: {source}")]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to write config file {path}: {source}")]
	Write {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to serialize config for {path}: {source}")]
	Serialize {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("config file {path} is not valid JSON: {source}")]
	Parse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("invalid {field} '{value}': {reason}")]
	InvalidValue {
		field: &'static str,
		value: String,
		reason: String,
	},

	#[error("no {field} configured. Pass --{flag} or run: valctl config {command}")]
	Unset {
		field: &'static str,
		flag: &'static str,
		command: &'static str,
	},
}

// -- Signing --

#[derive(Debug, Error)]
pub enum SigningError {
	#[error("no signing credential supplied. Pass --private-key or --keyfile")]
	NoCredential,

	#[error("--private-key and --keyfile cannot be used together")]
	ConflictingCredentials,

	#[error("invalid private key: {0}")]
	InvalidPrivateKey(String),

	#[error("failed to read password file {path}: {source}")]
	PasswordFile {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to read password from terminal: {0}")]
	PasswordPrompt(#[source] std::io::Error),

	#[error("no keystore password available")]
	NoPassword,

	#[error("failed to decrypt keystore {path}: {reason}")]
	Keystore { path: PathBuf, reason: String },

	#[error("signing failed: {0}")]
	Sign(String),

	#[error("raw transaction could not be decoded: {0}")]
	Decode(String),
}

// -- Network --

#[derive(Debug, Error)]
pub enum NetworkError {
	#[error("no RPC endpoint configured. Pass --rpc-url or run: valctl config set-rpc <url>")]
	NoEndpoint,

	#[error("invalid RPC endpoint '{url}': {reason}")]
	InvalidEndpoint { url: String, reason: String },

	#[error("{method} failed: {reason}")]
	Transport { method: String, reason: String },

	#[error("{method} failed with RPC error {code}: {message}")]
	Rpc {
		method: String,
		code: i64,
		message: String,
	},

	#[error("node returned hash {returned} for transaction {expected}")]
	HashMismatch { expected: B256, returned: B256 },
}

// -- Missing offline info --

/// Every parameter that had neither a live source nor a manual override.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no RPC endpoint available; supply {} to work offline", .missing.join(", "))]
pub struct MissingInfoError {
	pub missing: Vec<String>,
}

// -- Encoding --

#[derive(Debug, Error)]
pub enum EncodingError {
	#[error("contract ABI is invalid: {0}")]
	Abi(String),

	#[error("{contract} has no method '{method}'")]
	UnknownMethod {
		contract: &'static str,
		method: String,
	},

	#[error("{method} expects {expected} arguments, got {got}")]
	ArgumentCount {
		method: String,
		expected: usize,
		got: usize,
	},

	#[error("argument {index} of {method} must be {expected}")]
	ArgumentType {
		method: String,
		index: usize,
		expected: String,
	},

	#[error("invalid value '{value}' for {expected}: {reason}")]
	InvalidArgument {
		value: String,
		expected: String,
		reason: String,
	},

	#[error("failed to encode {method}: {reason}")]
	Encode { method: String, reason: String },

	#[error("failed to decode {method} output: {reason}")]
	Decode { method: String, reason: String },

	#[error("invalid amount '{value}': {reason}")]
	InvalidAmount { value: String, reason: String },
}

// -- Confirmation --

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfirmationError {
	#[error("transaction {tx_hash} reverted{}", block_suffix(.block_number))]
	Reverted {
		tx_hash: B256,
		block_number: Option<u64>,
	},

	#[error("transaction {tx_hash} was not mined within {}s", .waited.as_secs())]
	Timeout { tx_hash: B256, waited: Duration },
}

fn block_suffix(block_number: &Option<u64>) -> String {
	match block_number {
		Some(n) => format!(" in block {n}"),
		None => String::new(),
	}
}
