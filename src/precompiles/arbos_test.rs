use alloy_sol_types::{SolCall, sol};
use revm::primitives::Bytes;

use crate::{
    context::ExecutionContext,
    macros::{decode_call, selector_table},
    precompiles::SelectorTable,
    result::PrecompileError,
    world_state::WorldState,
};

sol! {
/// @title Deprecated - Provides a method of burning arbitrary amounts of gas
/// @notice This exists for historical reasons. Pre-Nitro, `ArbosTest` had additional methods only the zero address could call.
/// These have been removed since users don't use them and calls to missing methods revert.
/// Precompiled contract that exists in every Arbitrum chain at 0x0000000000000000000000000000000000000069.
interface ArbosTest {
    /// @notice Unproductively burns the amount of L2 ArbGas
    function burnArbGas(
        uint256 gasAmount
    ) external pure;
}
}

lazy_static::lazy_static! {
    static ref SELECTORS: SelectorTable = selector_table! {
        ArbosTest => {
            burnArbGasCall(Pure),
        }
    };
}

pub(crate) fn selector_table() -> &'static SelectorTable {
    &SELECTORS
}

pub(crate) fn call<W: WorldState>(
    ctx: &mut ExecutionContext<'_, W>,
    selector: [u8; 4],
    input: &[u8],
) -> Result<Bytes, PrecompileError> {
    match selector {
        ArbosTest::burnArbGasCall::SELECTOR => {
            let call = decode_call!(ArbosTest::burnArbGasCall, input);
            let amount = u64::try_from(call.gasAmount)
                .map_err(|_| PrecompileError::revert("not a uint64"))?;
            ctx.burn(amount)?;
            Ok(Bytes::new())
        }
        _ => Err(PrecompileError::MalformedInput),
    }
}
