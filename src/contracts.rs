use alloy_dyn_abi::{DynSolType, DynSolValue, FunctionExt, JsonAbiExt};
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::{Address, Bytes, U256};

use crate::error::EncodingError;

/// Human-readable ABI of the ValidatorManager contract.
///
/// Every state-changing method is payable and must carry the protocol fee
/// returned by `fee()`.
pub const VALIDATOR_MANAGER_ABI: &[&str] = &[
	"function fee() external view returns (uint256)",
	"function isValidator(address valAddr) external view returns (bool)",
	"function validatorInfo(address valAddr) external view returns (address valAddr, bytes pubKey, address operator, address rewardManager, uint256 commissionRate, bytes metadata, uint256 collateral, bool jailed)",
	"function createValidator(bytes pubKey, address operator, address rewardManager, uint256 commissionRate, bytes metadata) external payable",
	"function depositCollateral(address valAddr) external payable",
	"function withdrawCollateral(address valAddr, address receiver, uint256 amount) external payable",
	"function updateOperator(address valAddr, address operator) external payable",
	"function updateRewardManager(address valAddr, address rewardManager) external payable",
	"function updateMetadata(address valAddr, bytes metadata) external payable",
	"function updateRewardConfig(address valAddr, uint256 commissionRate) external payable",
	"function unjailValidator(address valAddr) external payable",
];

/// Human-readable ABI of the governance entrypoint contract.
pub const GOVERNANCE_ENTRYPOINT_ABI: &[&str] = &[
	"function fee() external view returns (uint256)",
	"function execute(string[] messages) external payable",
];

/// The two contracts this tool talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractKind {
	ValidatorManager,
	GovernanceEntrypoint,
}

impl ContractKind {
	pub fn name(&self) -> &'static str {
		match self {
			Self::ValidatorManager => "ValidatorManager",
			Self::GovernanceEntrypoint => "GovernanceEntrypoint",
		}
	}

	fn signatures(&self) -> &'static [&'static str] {
		match self {
			Self::ValidatorManager => VALIDATOR_MANAGER_ABI,
			Self::GovernanceEntrypoint => GOVERNANCE_ENTRYPOINT_ABI,
		}
	}
}

/// An intended contract invocation, before ABI encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
	pub contract: ContractKind,
	pub to: Address,
	pub method: String,
	pub args: Vec<DynSolValue>,
}

impl CallRequest {
	pub fn new(contract: ContractKind, to: Address, method: &str, args: Vec<DynSolValue>) -> Self {
		Self {
			contract,
			to,
			method: method.to_owned(),
			args,
		}
	}

	/// Read the protocol fee of `contract` deployed at `to`.
	pub fn fee(contract: ContractKind, to: Address) -> Self {
		Self::new(contract, to, "fee", Vec::new())
	}
}

/// Parsed ABI for one contract.
#[derive(Debug, Clone)]
pub struct ContractAbi {
	kind: ContractKind,
	abi: JsonAbi,
}

impl ContractAbi {
	pub fn load(kind: ContractKind) -> Result<Self, EncodingError> {
		let abi = JsonAbi::parse(kind.signatures().iter().copied())
			.map_err(|e| EncodingError::Abi(e.to_string()))?;
		Ok(Self { kind, abi })
	}

	pub fn function(&self, method: &str) -> Result<&Function, EncodingError> {
		self.abi
			.function(method)
			.and_then(|overloads| overloads.first())
			.ok_or_else(|| EncodingError::UnknownMethod {
				contract: self.kind.name(),
				method: method.to_owned(),
			})
	}

	/// ABI-encode `call` (selector + arguments), checking every argument
	/// against the method's declared input types.
	pub fn encode(&self, call: &CallRequest) -> Result<Bytes, EncodingError> {
		let func = self.function(&call.method)?;
		if func.inputs.len() != call.args.len() {
			return Err(EncodingError::ArgumentCount {
				method: call.method.clone(),
				expected: func.inputs.len(),
				got: call.args.len(),
			});
		}
		for (index, (param, value)) in func.inputs.iter().zip(&call.args).enumerate() {
			let ty = DynSolType::parse(&param.ty).map_err(|e| EncodingError::Abi(e.to_string()))?;
			if !ty.matches(value) {
				return Err(EncodingError::ArgumentType {
					method: call.method.clone(),
					index,
					expected: param.ty.clone(),
				});
			}
		}
		func.abi_encode_input(&call.args)
			.map(Bytes::from)
			.map_err(|e| EncodingError::Encode {
				method: call.method.clone(),
				reason: e.to_string(),
			})
	}

	/// Decode the return data of `method`.
	pub fn decode(&self, method: &str, data: &[u8]) -> Result<Vec<DynSolValue>, EncodingError> {
		self.function(method)?
			.abi_decode_output(data)
			.map_err(|e| EncodingError::Decode {
				method: method.to_owned(),
				reason: e.to_string(),
			})
	}

	/// Decode a method that returns a single `uint256`.
	pub fn decode_uint(&self, method: &str, data: &[u8]) -> Result<U256, EncodingError> {
		match self.decode(method, data)?.as_slice() {
			[DynSolValue::Uint(value, _)] => Ok(*value),
			_ => Err(EncodingError::Decode {
				method: method.to_owned(),
				reason: "expected a single uint256".into(),
			}),
		}
	}

	/// Names of the outputs of `method`, positional when unnamed.
	pub fn output_names(&self, method: &str) -> Result<Vec<String>, EncodingError> {
		Ok(self
			.function(method)?
			.outputs
			.iter()
			.enumerate()
			.map(|(i, p)| {
				if p.name.is_empty() {
					format!("[{i}]")
				} else {
					p.name.clone()
				}
			})
			.collect())
	}
}

/// Format a decoded value for display.
pub fn format_value(value: &DynSolValue) -> String {
	match value {
		DynSolValue::Bool(b) => b.to_string(),
		DynSolValue::Int(i, _) => i.to_string(),
		DynSolValue::Uint(u, _) => u.to_string(),
		DynSolValue::Address(a) => a.to_checksum(None),
		DynSolValue::FixedBytes(b, _) => b.to_string(),
		DynSolValue::Bytes(b) => format!("0x{}", hex::encode(b)),
		DynSolValue::String(s) => format!("\"{s}\""),
		DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
			let inner: Vec<String> = items.iter().map(format_value).collect();
			match value {
				DynSolValue::Tuple(_) => format!("({})", inner.join(", ")),
				_ => format!("[{}]", inner.join(", ")),
			}
		}
		other => format!("{other:?}"),
	}
}
