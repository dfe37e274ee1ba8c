use alloy_sol_types::{Revert, SolError};
use revm::primitives::{Bytes, Log};

use crate::{gas::OutOfGas, state::ArbosStateError, world_state::WorldStateError};

/// Terminal result of one precompile invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Outcome {
    Success(Bytes),
    /// `padded` reverts carry no data at all; the others carry `Error(string)`.
    Revert { reason: String, padded: bool },
    SolidityError { selector: [u8; 4], args: Bytes },
    OutOfGas,
    /// The address holds no active precompile and behaves like an account without code.
    NotPrecompile,
}

impl Outcome {
    pub fn padded_revert() -> Self {
        Self::Revert {
            reason: String::new(),
            padded: true,
        }
    }

    pub fn revert(reason: impl Into<String>) -> Self {
        Self::Revert {
            reason: reason.into(),
            padded: false,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_) | Self::NotPrecompile)
    }

    /// Bytes handed back to the calling frame.
    pub fn return_data(&self) -> Bytes {
        match self {
            Self::Success(output) => output.clone(),
            Self::Revert { padded: true, .. } => Bytes::new(),
            Self::Revert {
                reason,
                padded: false,
            } => Revert {
                reason: reason.clone(),
            }
            .abi_encode()
            .into(),
            Self::SolidityError { selector, args } => {
                let mut data = Vec::with_capacity(4 + args.len());
                data.extend_from_slice(selector);
                data.extend_from_slice(args);
                data.into()
            }
            Self::OutOfGas | Self::NotPrecompile => Bytes::new(),
        }
    }
}

/// Failure raised by a precompile handler. Only the dispatcher turns these into an [`Outcome`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PrecompileError {
    #[error("malformed input")]
    MalformedInput,
    #[error("{0}")]
    BusinessRuleViolation(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Explicit revert that keeps the remaining gas at every ArbOS version.
    #[error("execution reverted: {0}")]
    Revert(String),
    #[error("solidity error {selector:?}")]
    StructuredError { selector: [u8; 4], args: Bytes },
    #[error("out of gas")]
    OutOfGas,
}

impl PrecompileError {
    pub fn business(message: impl Into<String>) -> Self {
        Self::BusinessRuleViolation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn revert(message: impl Into<String>) -> Self {
        Self::Revert(message.into())
    }

    /// Wraps a `sol!` error type as a custom Solidity error.
    pub fn solidity<E: SolError>(error: E) -> Self {
        let encoded = error.abi_encode();
        Self::StructuredError {
            selector: E::SELECTOR,
            args: Bytes::copy_from_slice(&encoded[4..]),
        }
    }
}

impl From<OutOfGas> for PrecompileError {
    fn from(_: OutOfGas) -> Self {
        Self::OutOfGas
    }
}

impl From<ArbosStateError> for PrecompileError {
    fn from(error: ArbosStateError) -> Self {
        match error {
            ArbosStateError::OutOfGas => Self::OutOfGas,
            other => Self::BusinessRuleViolation(other.to_string()),
        }
    }
}

impl From<WorldStateError> for PrecompileError {
    fn from(error: WorldStateError) -> Self {
        Self::BusinessRuleViolation(error.to_string())
    }
}

/// Everything the host needs after a precompile call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrecompileOutput {
    pub outcome: Outcome,
    pub gas_supplied: u64,
    pub gas_left: u64,
    /// Logs emitted by the call; always empty unless the call succeeded.
    pub logs: Vec<Log>,
}

impl PrecompileOutput {
    pub fn gas_used(&self) -> u64 {
        self.gas_supplied - self.gas_left
    }

    pub fn return_data(&self) -> Bytes {
        self.outcome.return_data()
    }
}
