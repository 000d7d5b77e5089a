use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
	name = "valctl",
	about = "Register validators, move collateral and submit governance messages.",
	version
)]
pub struct Cli {
	/// Config file location.
	#[arg(long, global = true, env = "VALCTL_CONFIG")]
	pub config: Option<PathBuf>,

	/// Override RPC endpoint URL. An empty value forces offline mode.
	#[arg(long, global = true, env = "VALCTL_RPC_URL")]
	pub rpc_url: Option<String>,

	/// Override ValidatorManager contract address.
	#[arg(long, global = true)]
	pub contract: Option<String>,

	/// Increase log verbosity (-v, -vv).
	#[arg(short, long, action = ArgAction::Count, global = true)]
	pub verbose: u8,

	/// Only log errors.
	#[arg(short, long, global = true)]
	pub quiet: bool,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
	/// Manage stored settings.
	Config {
		#[command(subcommand)]
		command: ConfigCommand,
	},

	/// Query validator state.
	Validator {
		#[command(subcommand)]
		command: ValidatorCommand,
	},

	/// Build, sign and submit transactions.
	Tx {
		#[command(subcommand)]
		command: TxCommand,
	},
}

// -- Config subcommands --

#[derive(Subcommand)]
pub enum ConfigCommand {
	/// Store the default RPC endpoint.
	SetRpc {
		/// JSON-RPC endpoint URL.
		url: String,
	},

	/// Store the ValidatorManager contract address.
	SetContract {
		/// Contract address (0x-prefixed).
		address: String,
	},

	/// Show the stored settings and where they live.
	Show,
}

// -- Validator subcommands --

#[derive(Subcommand)]
pub enum ValidatorCommand {
	/// Show on-chain information about a validator.
	Info {
		/// Validator address.
		#[arg(long)]
		validator_address: String,
	},

	/// Show the protocol fee charged by the ValidatorManager.
	Fee,
}

// -- Tx subcommands --

#[derive(Subcommand)]
pub enum TxCommand {
	/// Build a transaction and print it, signed or unsigned.
	Create {
		#[command(flatten)]
		args: TxArgs,

		/// Sign the transaction.
		#[arg(long, global = true)]
		signed: bool,

		/// Leave the transaction unsigned.
		#[arg(long, global = true)]
		unsigned: bool,

		#[command(subcommand)]
		call: TxCall,
	},

	/// Build, sign and broadcast a transaction.
	Send {
		#[command(flatten)]
		args: TxArgs,

		/// Wait for the transaction to be mined.
		#[arg(long, global = true)]
		wait: bool,

		/// Seconds to wait for a receipt with --wait.
		#[arg(long, global = true, default_value = "60")]
		timeout: u64,

		#[command(subcommand)]
		call: TxCall,
	},

	/// Check confirmation status of a transaction.
	Status {
		/// Transaction hash (0x-prefixed).
		tx_hash: String,
	},
}

/// Flags shared by every transaction-building command.
#[derive(Args, Clone, Default)]
pub struct TxArgs {
	#[command(flatten)]
	pub signing: SigningArgs,

	#[command(flatten)]
	pub network: NetworkArgs,

	/// Sender address, used for nonce and gas lookup of unsigned builds.
	#[arg(long, global = true)]
	pub from: Option<String>,

	/// Write the transaction JSON to a file instead of stdout.
	#[arg(long, global = true)]
	pub output: Option<PathBuf>,
}

#[derive(Args, Clone, Default)]
pub struct SigningArgs {
	/// Hex-encoded private key.
	#[arg(long, global = true, env = "VALCTL_PRIVATE_KEY", hide_env_values = true)]
	pub private_key: Option<String>,

	/// Encrypted JSON keystore file.
	#[arg(long, global = true)]
	pub keyfile: Option<PathBuf>,

	/// Keystore password.
	#[arg(long, global = true, env = "VALCTL_KEYFILE_PASSWORD", hide_env_values = true)]
	pub keyfile_password: Option<String>,

	/// File containing the keystore password.
	#[arg(long, global = true)]
	pub keyfile_password_file: Option<PathBuf>,
}

/// Manual network parameters. Required for offline builds.
#[derive(Args, Clone, Default)]
pub struct NetworkArgs {
	#[arg(long, global = true)]
	pub chain_id: Option<u64>,

	/// Gas price in wei.
	#[arg(long, global = true)]
	pub gas_price: Option<u128>,

	#[arg(long, global = true)]
	pub gas_limit: Option<u64>,

	#[arg(long, global = true)]
	pub nonce: Option<u64>,

	/// Protocol fee in native units, e.g. 0.001.
	#[arg(long, global = true)]
	pub fee: Option<String>,
}

#[derive(Subcommand, Clone)]
pub enum TxCall {
	/// Validator registration and maintenance.
	Validator {
		#[command(subcommand)]
		op: ValidatorOp,
	},

	/// Collateral deposits and withdrawals.
	Collateral {
		#[command(subcommand)]
		op: CollateralOp,
	},

	/// Governance messages.
	Governance {
		#[command(subcommand)]
		op: GovernanceOp,
	},
}

#[derive(Subcommand, Clone)]
pub enum ValidatorOp {
	/// Register a new validator with its initial collateral.
	Create {
		/// Consensus public key (hex).
		#[arg(long)]
		pubkey: String,

		/// Operator address.
		#[arg(long)]
		operator: String,

		/// Reward manager address.
		#[arg(long)]
		reward_manager: String,

		/// Commission rate in percent, up to two decimals.
		#[arg(long)]
		commission_rate: String,

		/// Metadata, as text or 0x-prefixed hex.
		#[arg(long, default_value = "")]
		metadata: String,

		/// Initial collateral in native units.
		#[arg(long)]
		initial_collateral: String,
	},

	/// Change the operator of a validator.
	UpdateOperator {
		#[arg(long)]
		validator: String,

		#[arg(long)]
		operator: String,
	},

	/// Change the reward manager of a validator.
	UpdateRewardManager {
		#[arg(long)]
		validator: String,

		#[arg(long)]
		reward_manager: String,
	},

	/// Replace a validator's metadata.
	UpdateMetadata {
		#[arg(long)]
		validator: String,

		/// Metadata, as text or 0x-prefixed hex.
		#[arg(long)]
		metadata: String,
	},

	/// Change a validator's commission rate.
	UpdateCommission {
		#[arg(long)]
		validator: String,

		/// Commission rate in percent, up to two decimals.
		#[arg(long)]
		commission_rate: String,
	},

	/// Release a jailed validator.
	Unjail {
		#[arg(long)]
		validator: String,
	},
}

#[derive(Subcommand, Clone)]
pub enum CollateralOp {
	/// Add collateral to a validator.
	Deposit {
		#[arg(long)]
		validator: String,

		/// Amount in native units, e.g. 1.5.
		#[arg(long)]
		amount: String,
	},

	/// Withdraw collateral from a validator.
	Withdraw {
		#[arg(long)]
		validator: String,

		/// Address receiving the withdrawn collateral.
		#[arg(long)]
		receiver: String,

		/// Amount in native units, e.g. 1.5.
		#[arg(long)]
		amount: String,
	},
}

#[derive(Subcommand, Clone)]
pub enum GovernanceOp {
	/// Submit one or more governance messages.
	Execute {
		/// Governance message. Repeat for several messages.
		#[arg(long = "message", required = true)]
		messages: Vec<String>,

		/// GovernanceEntrypoint contract address.
		#[arg(long)]
		entrypoint: String,
	},
}
