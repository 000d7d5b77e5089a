use std::time::Duration;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, Bytes, B256, U256};
use anyhow::Result;

use crate::cli::{Cli, CollateralOp, GovernanceOp, TxArgs, TxCall, TxCommand, ValidatorOp};
use crate::commands::{load_config, require_rpc, resolve_rpc};
use crate::config::Config;
use crate::contracts::{CallRequest, ContractKind};
use crate::error::{EncodingError, Error, NetworkError};
use crate::flags::{self, FlagGroup, SuppliedFlags};
use crate::network::{FeeRequirement, NetworkInfoResolver, NetworkOverrides};
use crate::output::{self, OutputTarget, SignedTxOutput, SubmissionOutput, UnsignedTxOutput};
use crate::rpc::EthRpc;
use crate::signer::{CredentialArgs, SignedTransaction, SigningResolver, TransactionSigner};
use crate::submit::{ConfirmationResult, Submitter};
use crate::tx_builder::{builder_for, BuildMode, TransactionEnvelope};
use crate::units;

const CREATE_GROUPS: &[FlagGroup] = &[flags::CREDENTIAL, flags::PASSWORD_SOURCE, flags::SIGNING_MODE];
const SEND_GROUPS: &[FlagGroup] = &[flags::CREDENTIAL, flags::PASSWORD_SOURCE];

pub async fn run(cli: &Cli, cmd: &TxCommand) -> Result<()> {
	let (_, config) = load_config(cli)?;

	match cmd {
		TxCommand::Status { tx_hash } => {
			let rpc = require_rpc(&config)?;
			show_status(&rpc, tx_hash).await
		}
		TxCommand::Create {
			args,
			signed,
			unsigned,
			call,
		} => {
			let request = TxRequest::create(args, *signed, *unsigned)?;
			let rpc = resolve_rpc(&config)?;
			let outcome = execute(&request, call, &config, rpc.as_ref().map(|r| r as &dyn EthRpc)).await?;
			finish(&request, &outcome)?;
			Ok(())
		}
		TxCommand::Send {
			args,
			wait,
			timeout,
			call,
		} => {
			let request = TxRequest::send(args, *wait, Duration::from_secs(*timeout))?;
			let rpc = resolve_rpc(&config)?;
			let outcome = execute(&request, call, &config, rpc.as_ref().map(|r| r as &dyn EthRpc)).await?;
			finish(&request, &outcome)?;
			Ok(())
		}
	}
}

// -- Request context --

/// What happens to the transaction once it is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
	Unsigned,
	Signed,
	/// Sign and broadcast; wait up to the given time for a receipt.
	Broadcast { wait: Option<Duration> },
}

impl Delivery {
	fn needs_key(&self) -> bool {
		!matches!(self, Self::Unsigned)
	}
}

/// Everything one transaction command needs, built once from its flags.
pub struct TxRequest {
	pub credentials: CredentialArgs,
	pub supplied: SuppliedFlags,
	pub groups: &'static [FlagGroup],
	pub overrides: NetworkOverrides,
	/// Sender for unsigned builds; ignored when a key signs.
	pub from: Option<Address>,
	pub delivery: Delivery,
	pub output: OutputTarget,
}

impl TxRequest {
	/// `tx create`. The signing mode group is validated in [`execute`].
	pub fn create(args: &TxArgs, signed: bool, unsigned: bool) -> Result<Self, Error> {
		let mut request = Self::from_args(args, CREATE_GROUPS)?;
		request.supplied.mark_if("signed", signed).mark_if("unsigned", unsigned);
		request.delivery = if unsigned {
			Delivery::Unsigned
		} else {
			Delivery::Signed
		};
		Ok(request)
	}

	/// `tx send`; always signed.
	pub fn send(args: &TxArgs, wait: bool, timeout: Duration) -> Result<Self, Error> {
		let mut request = Self::from_args(args, SEND_GROUPS)?;
		request.delivery = Delivery::Broadcast {
			wait: wait.then_some(timeout),
		};
		Ok(request)
	}

	fn from_args(args: &TxArgs, groups: &'static [FlagGroup]) -> Result<Self, Error> {
		let signing = &args.signing;
		let mut supplied = SuppliedFlags::new();
		supplied
			.mark_if("private-key", signing.private_key.is_some())
			.mark_if("keyfile", signing.keyfile.is_some())
			.mark_if("keyfile-password", signing.keyfile_password.is_some())
			.mark_if("keyfile-password-file", signing.keyfile_password_file.is_some())
			.mark_if("from", args.from.is_some());

		let net = &args.network;
		let fee = net.fee.as_deref().map(units::parse_amount).transpose()?;

		Ok(Self {
			credentials: CredentialArgs {
				private_key: signing.private_key.clone(),
				keyfile: signing.keyfile.clone(),
				password: signing.keyfile_password.clone(),
				password_file: signing.keyfile_password_file.clone(),
			},
			supplied,
			groups,
			overrides: NetworkOverrides {
				chain_id: net.chain_id,
				gas_price: net.gas_price,
				gas_limit: net.gas_limit,
				nonce: net.nonce,
				fee,
			},
			from: args.from.as_deref().map(parse_address_arg).transpose()?,
			delivery: Delivery::Signed,
			output: OutputTarget::from_flag(args.output.clone()),
		})
	}
}

// -- Pipeline --

/// Result of running the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
	Unsigned(TransactionEnvelope),
	Signed(SignedTransaction),
	Sent {
		hash: B256,
		confirmation: Option<ConfirmationResult>,
	},
}

/// Run one transaction command.
///
/// Input errors surface before any key is unlocked, and credential errors
/// before the node is contacted.
pub async fn execute(
	request: &TxRequest,
	call: &TxCall,
	config: &Config,
	rpc: Option<&dyn EthRpc>,
) -> Result<TxOutcome, Error> {
	flags::validate(request.groups, &request.supplied)?;
	if matches!(request.delivery, Delivery::Broadcast { .. }) && rpc.is_none() {
		return Err(NetworkError::NoEndpoint.into());
	}
	if rpc.is_some() && !request.delivery.needs_key() {
		flags::SENDER.require_any(&request.supplied)?;
	}
	let planned = plan_call(call, config)?;

	let needs_sender = rpc.is_some() && request.from.is_none() && !request.credentials.is_empty();
	let key = if request.delivery.needs_key() || needs_sender {
		Some(SigningResolver::new(&request.credentials).resolve()?)
	} else {
		None
	};
	let sender = key.as_ref().map(|k| k.address()).or(request.from);

	let resolver = NetworkInfoResolver::new(rpc);
	let params = match resolver.resolve(&request.overrides, planned.fee).await {
		Ok(params) => params,
		Err(Error::MissingInfo(mut missing)) => {
			// Report the nonce together with the rest so one retry is enough.
			if request.overrides.nonce.is_none() {
				missing.missing.push("--nonce".to_owned());
			}
			return Err(missing.into());
		}
		Err(e) => return Err(e),
	};
	let value = units::payable_value(planned.amount, params.fee.unwrap_or_default())?;
	tracing::debug!(%value, method = %planned.call.method, "call planned");

	let mode = if resolver.is_online() {
		BuildMode::Online
	} else {
		BuildMode::Offline
	};
	let envelope = builder_for(mode, rpc, sender)?
		.build(&planned.call, &params, value)
		.await?;

	let key = match key {
		Some(key) if request.delivery.needs_key() => key,
		_ => return Ok(TxOutcome::Unsigned(envelope)),
	};
	let signed = key.sign_transaction(&envelope)?;

	let (Delivery::Broadcast { wait }, Some(rpc)) = (request.delivery, rpc) else {
		return Ok(TxOutcome::Signed(signed));
	};
	let submitter = Submitter::new(rpc);
	let hash = submitter.submit(&signed).await?;
	eprintln!("Transaction sent: {hash}");

	let confirmation = match wait {
		Some(timeout) => {
			eprintln!("Waiting up to {}s for confirmation...", timeout.as_secs());
			Some(submitter.await_confirmation(hash, timeout).await?)
		}
		None => None,
	};
	Ok(TxOutcome::Sent { hash, confirmation })
}

/// Render the outcome, then fail if the transaction did not succeed.
pub fn finish(request: &TxRequest, outcome: &TxOutcome) -> Result<(), Error> {
	match outcome {
		TxOutcome::Unsigned(env) => output::write_json(&request.output, &UnsignedTxOutput::from(env)),
		TxOutcome::Signed(tx) => output::write_json(&request.output, &SignedTxOutput::from(tx)),
		TxOutcome::Sent { hash, confirmation } => {
			output::write_json(
				&request.output,
				&SubmissionOutput {
					hash: *hash,
					confirmation: *confirmation,
				},
			)?;
			if let (Some(result), Delivery::Broadcast { wait: Some(waited) }) = (confirmation, request.delivery) {
				result.into_result(*hash, waited)?;
			}
			Ok(())
		}
	}
}

// -- Call planning --

/// A contract call plus the value it must carry before the fee.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCall {
	pub call: CallRequest,
	pub amount: U256,
	pub fee: FeeRequirement,
}

impl PlannedCall {
	fn new(kind: ContractKind, to: Address, method: &str, args: Vec<DynSolValue>, amount: U256) -> Self {
		Self {
			call: CallRequest::new(kind, to, method, args),
			amount,
			fee: FeeRequirement::Contract(kind, to),
		}
	}
}

/// Turn parsed command arguments into a typed contract call.
pub fn plan_call(call: &TxCall, config: &Config) -> Result<PlannedCall, Error> {
	match call {
		TxCall::Validator { op } => plan_validator(op, config.contract()?),
		TxCall::Collateral { op } => plan_collateral(op, config.contract()?),
		TxCall::Governance {
			op: GovernanceOp::Execute {
				messages,
				entrypoint,
			},
		} => {
			let to = parse_address_arg(entrypoint)?;
			let messages = messages.iter().cloned().map(DynSolValue::String).collect();
			Ok(PlannedCall::new(
				ContractKind::GovernanceEntrypoint,
				to,
				"execute",
				vec![DynSolValue::Array(messages)],
				U256::ZERO,
			))
		}
	}
}

fn plan_validator(op: &ValidatorOp, contract: Address) -> Result<PlannedCall, Error> {
	let vm = |method: &str, args: Vec<DynSolValue>, amount: U256| {
		PlannedCall::new(ContractKind::ValidatorManager, contract, method, args, amount)
	};

	Ok(match op {
		ValidatorOp::Create {
			pubkey,
			operator,
			reward_manager,
			commission_rate,
			metadata,
			initial_collateral,
		} => vm(
			"createValidator",
			vec![
				DynSolValue::Bytes(parse_hex_arg(pubkey)?.to_vec()),
				address_value(operator)?,
				address_value(reward_manager)?,
				commission_value(commission_rate)?,
				DynSolValue::Bytes(parse_metadata(metadata)?.to_vec()),
			],
			units::parse_amount(initial_collateral)?,
		),
		ValidatorOp::UpdateOperator {
			validator,
			operator,
		} => vm(
			"updateOperator",
			vec![address_value(validator)?, address_value(operator)?],
			U256::ZERO,
		),
		ValidatorOp::UpdateRewardManager {
			validator,
			reward_manager,
		} => vm(
			"updateRewardManager",
			vec![address_value(validator)?, address_value(reward_manager)?],
			U256::ZERO,
		),
		ValidatorOp::UpdateMetadata {
			validator,
			metadata,
		} => vm(
			"updateMetadata",
			vec![
				address_value(validator)?,
				DynSolValue::Bytes(parse_metadata(metadata)?.to_vec()),
			],
			U256::ZERO,
		),
		ValidatorOp::UpdateCommission {
			validator,
			commission_rate,
		} => vm(
			"updateRewardConfig",
			vec![address_value(validator)?, commission_value(commission_rate)?],
			U256::ZERO,
		),
		ValidatorOp::Unjail { validator } => {
			vm("unjailValidator", vec![address_value(validator)?], U256::ZERO)
		}
	})
}

fn plan_collateral(op: &CollateralOp, contract: Address) -> Result<PlannedCall, Error> {
	let kind = ContractKind::ValidatorManager;
	Ok(match op {
		CollateralOp::Deposit { validator, amount } => PlannedCall::new(
			kind,
			contract,
			"depositCollateral",
			vec![address_value(validator)?],
			units::parse_amount(amount)?,
		),
		CollateralOp::Withdraw {
			validator,
			receiver,
			amount,
		} => PlannedCall::new(
			kind,
			contract,
			"withdrawCollateral",
			vec![
				address_value(validator)?,
				address_value(receiver)?,
				DynSolValue::Uint(units::parse_amount(amount)?, 256),
			],
			U256::ZERO,
		),
	})
}

// -- Argument parsing --

pub fn parse_address_arg(raw: &str) -> Result<Address, EncodingError> {
	raw.trim()
		.parse::<Address>()
		.map_err(|e| EncodingError::InvalidArgument {
			value: raw.to_owned(),
			expected: "address".into(),
			reason: e.to_string(),
		})
}

fn address_value(raw: &str) -> Result<DynSolValue, EncodingError> {
	parse_address_arg(raw).map(DynSolValue::Address)
}

fn commission_value(raw: &str) -> Result<DynSolValue, EncodingError> {
	let bps = units::parse_commission_bps(raw)?;
	Ok(DynSolValue::Uint(U256::from(bps), 256))
}

/// Non-empty hex, with or without `0x`.
fn parse_hex_arg(raw: &str) -> Result<Bytes, EncodingError> {
	let trimmed = raw.trim();
	let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
	let invalid = |reason: String| EncodingError::InvalidArgument {
		value: raw.to_owned(),
		expected: "hex bytes".into(),
		reason,
	};
	if digits.is_empty() {
		return Err(invalid("empty value".into()));
	}
	hex::decode(digits)
		.map(Bytes::from)
		.map_err(|e| invalid(e.to_string()))
}

/// `0x`-prefixed input is hex; anything else is taken as UTF-8 text.
fn parse_metadata(raw: &str) -> Result<Bytes, EncodingError> {
	if raw.starts_with("0x") {
		parse_hex_arg(raw)
	} else {
		Ok(Bytes::copy_from_slice(raw.as_bytes()))
	}
}

// -- Status --

async fn show_status(rpc: &dyn EthRpc, tx_hash: &str) -> Result<()> {
	let hash = tx_hash
		.trim()
		.parse::<B256>()
		.map_err(|e| EncodingError::InvalidArgument {
			value: tx_hash.to_owned(),
			expected: "transaction hash".into(),
			reason: e.to_string(),
		})?;

	match rpc.transaction_receipt(hash).await? {
		Some(receipt) => {
			let status = if receipt.success { "success" } else { "reverted" };
			println!("Transaction: {hash}");
			println!("Status:      {status}");
			if let Some(block) = receipt.block_number {
				println!("Block:       {block}");
			}
		}
		None => println!("Transaction not mined or unknown: {hash}"),
	}
	Ok(())
}
