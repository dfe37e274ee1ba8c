use alloy_sol_types::{SolCall, sol};
use revm::{
    interpreter::gas::{COLD_SLOAD_COST, COPY},
    primitives::Bytes,
};

use crate::{
    context::ExecutionContext,
    macros::{decode_call, encode_returns, selector_table},
    precompiles::SelectorTable,
    result::PrecompileError,
    world_state::WorldState,
};

/// Gas charged for an account balance lookup.
const BALANCE_LOOKUP_COST: u64 = 700;

sol! {
/// @title Lookup for basic info about accounts and contracts.
/// @notice Precompiled contract that exists in every Arbitrum chain at 0x0000000000000000000000000000000000000065.
interface ArbInfo {
    /// @notice Retrieves an account's balance
    function getBalance(address account) external view returns (uint256);

    /// @notice Retrieves a contract's deployed code
    function getCode(address account) external view returns (bytes memory);
}

}

lazy_static::lazy_static! {
    static ref SELECTORS: SelectorTable = selector_table! {
        ArbInfo => {
            getBalanceCall(View),
            getCodeCall(View),
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
        ArbInfo::getBalanceCall::SELECTOR => {
            let call = decode_call!(ArbInfo::getBalanceCall, input);
            ctx.burn(BALANCE_LOOKUP_COST)?;
            let balance = ctx.world().balance(call.account)?;
            Ok(encode_returns!(ArbInfo::getBalanceCall, balance))
        }
        ArbInfo::getCodeCall::SELECTOR => {
            let call = decode_call!(ArbInfo::getCodeCall, input);
            ctx.burn(COLD_SLOAD_COST)?;
            let code = ctx.world().code(call.account)?;
            ctx.burn(COPY * code.len().div_ceil(32) as u64)?;
            Ok(encode_returns!(ArbInfo::getCodeCall, code))
        }
        _ => Err(PrecompileError::MalformedInput),
    }
}
