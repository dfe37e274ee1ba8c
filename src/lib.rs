//! # arbos-precompiles
//!
//! ArbOS system contracts for an Arbitrum execution client: selector dispatch with version
//! gating and gas metering, the L1/L2 pricing queries and owner setters, the retryable
//! ticket lifecycle, and Stylus cache management.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod macros;

pub mod config;
pub mod constants;
pub mod context;
pub mod gas;
pub mod precompiles;
pub mod pricing;
pub mod result;
pub mod state;
pub mod transaction;
pub mod world_state;

pub use config::ArbitrumConfig;
pub use context::{BlockEnv, ExecutionContext};
pub use gas::{GasMeter, OutOfGas};
pub use precompiles::{ArbPrecompile, StateMutability, dispatch};
pub use result::{Outcome, PrecompileError, PrecompileOutput};
pub use state::{ArbState, ArbosStateError, ArbosStateParams};
pub use transaction::ArbitrumRetryTx;
pub use world_state::{InMemoryWorldState, WorldCheckpoint, WorldState, WorldStateError};
