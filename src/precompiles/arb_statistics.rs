use alloy_sol_types::{SolCall, sol};
use revm::primitives::{Bytes, U256};

use crate::{
    context::ExecutionContext,
    macros::{encode_returns, selector_table},
    precompiles::SelectorTable,
    result::PrecompileError,
    world_state::WorldState,
};

sol! {

/// @title Deprecated - Info about the rollup just prior to the Nitro upgrade
/// @notice Precompiled contract in every Arbitrum chain for retryable transaction related data retrieval and interactions. Exists at 0x000000000000000000000000000000000000006f
interface ArbStatistics {
    /// @notice Get Arbitrum block number and other statistics as they were right before the Nitro upgrade.
    /// @return (
    ///      Number of accounts,
    ///      Total storage allocated (includes storage that was later deallocated),
    ///      Total ArbGas used,
    ///      Number of transaction receipt issued,
    ///      Number of contracts created,
    ///    )
    function getStats()
        external
        view
        returns (
            uint256,
            uint256,
            uint256,
            uint256,
            uint256,
            uint256
        );
}

}

lazy_static::lazy_static! {
    static ref SELECTORS: SelectorTable = selector_table! {
        ArbStatistics => {
            getStatsCall(View),
        }
    };
}

pub(crate) fn selector_table() -> &'static SelectorTable {
    &SELECTORS
}

pub(crate) fn call<W: WorldState>(
    ctx: &mut ExecutionContext<'_, W>,
    selector: [u8; 4],
    _input: &[u8],
) -> Result<Bytes, PrecompileError> {
    match selector {
        // Classic-era counters are all reported as zero.
        ArbStatistics::getStatsCall::SELECTOR => Ok(encode_returns!(
            ArbStatistics::getStatsCall,
            ArbStatistics::getStatsReturn::from((
                U256::from(ctx.block.number),
                U256::ZERO,
                U256::ZERO,
                U256::ZERO,
                U256::ZERO,
                U256::ZERO,
            ))
        )),
        _ => Err(PrecompileError::MalformedInput),
    }
}
