use alloy_sol_types::{SolCall, sol};
use revm::{
    interpreter::gas::COLD_ACCOUNT_ACCESS_COST,
    primitives::{Address, B256, Bytes},
};
use tracing::debug;

use crate::{
    constants::{ARBOS_VERSION_30, ARBOS_VERSION_31},
    context::ExecutionContext,
    macros::{decode_call, encode_returns, selector_table},
    precompiles::SelectorTable,
    result::PrecompileError,
    world_state::WorldState,
};

sol! {

///
/// @title Methods for managing Stylus caches
/// @notice Precompiled contract that exists in every Arbitrum chain at 0x0000000000000000000000000000000000000072.
/// @notice Available in ArbOS version 30 and above
///
interface ArbWasmCache {
    /// @notice See if the user is a cache manager.
    function isCacheManager(
        address manager
    ) external view returns (bool);

    /// @notice Retrieve all address managers.
    /// @return managers the list of managers.
    function allCacheManagers() external view returns (address[] memory managers);

    /// @dev Deprecated, replaced with cacheProgram
    /// @notice Available in ArbOS version 30 only
    function cacheCodehash(
        bytes32 codehash
    ) external;

    /// @notice Caches all programs with a codehash equal to the given address.
    /// @notice Reverts if the programs have expired.
    /// @notice Caller must be a cache manager or chain owner.
    /// @notice Available in ArbOS version 31 and above
    function cacheProgram(
        address addr
    ) external;

    /// @notice Evicts all programs with the given codehash.
    /// @notice Caller must be a cache manager or chain owner.
    function evictCodehash(
        bytes32 codehash
    ) external;

    /// @notice Gets whether a program is cached. Note that the program may be expired.
    function codehashIsCached(
        bytes32 codehash
    ) external view returns (bool);

    event UpdateProgramCache(address indexed manager, bytes32 indexed codehash, bool cached);

    error ProgramNeedsUpgrade(uint16 version, uint16 stylusVersion);
    error ProgramExpired(uint64 ageInSeconds);
}

}

lazy_static::lazy_static! {
    static ref SELECTORS: SelectorTable = selector_table! {
        ArbWasmCache => {
            isCacheManagerCall(View),
            allCacheManagersCall(View),
            cacheCodehashCall(NonPayable, max = ARBOS_VERSION_30),
            cacheProgramCall(NonPayable, min = ARBOS_VERSION_31),
            evictCodehashCall(NonPayable),
            codehashIsCachedCall(View),
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
        ArbWasmCache::isCacheManagerCall::SELECTOR => {
            let call = decode_call!(ArbWasmCache::isCacheManagerCall, input);
            let is_manager = ctx
                .arb_state()
                .programs()
                .cache_managers()
                .contains(call.manager)?;
            Ok(encode_returns!(ArbWasmCache::isCacheManagerCall, is_manager))
        }
        ArbWasmCache::allCacheManagersCall::SELECTOR => {
            let managers = ctx.arb_state().programs().cache_managers().all()?;
            Ok(encode_returns!(ArbWasmCache::allCacheManagersCall, managers))
        }
        ArbWasmCache::cacheCodehashCall::SELECTOR => {
            let call = decode_call!(ArbWasmCache::cacheCodehashCall, input);
            set_program_cached(ctx, call.codehash, true)?;
            Ok(Bytes::new())
        }
        ArbWasmCache::cacheProgramCall::SELECTOR => {
            let call = decode_call!(ArbWasmCache::cacheProgramCall, input);
            ctx.burn(COLD_ACCOUNT_ACCESS_COST)?;
            let code_hash = ctx.world().code_hash(call.addr)?;
            set_program_cached(ctx, code_hash, true)?;
            Ok(Bytes::new())
        }
        ArbWasmCache::evictCodehashCall::SELECTOR => {
            let call = decode_call!(ArbWasmCache::evictCodehashCall, input);
            set_program_cached(ctx, call.codehash, false)?;
            Ok(Bytes::new())
        }
        ArbWasmCache::codehashIsCachedCall::SELECTOR => {
            let call = decode_call!(ArbWasmCache::codehashIsCachedCall, input);
            let cached = ctx.arb_state().programs().program(call.codehash).get()?.cached;
            Ok(encode_returns!(ArbWasmCache::codehashIsCachedCall, cached))
        }
        _ => Err(PrecompileError::MalformedInput),
    }
}

/// Cache managers and chain owners may touch the cache.
fn has_access<W: WorldState>(
    ctx: &mut ExecutionContext<'_, W>,
    caller: Address,
) -> Result<bool, PrecompileError> {
    let mut state = ctx.arb_state();
    if state.programs().cache_managers().contains(caller)? {
        return Ok(true);
    }
    Ok(state.is_chain_owner(caller)?)
}

fn set_program_cached<W: WorldState>(
    ctx: &mut ExecutionContext<'_, W>,
    code_hash: B256,
    cache: bool,
) -> Result<(), PrecompileError> {
    let caller = ctx.caller;
    if !has_access(ctx, caller)? {
        debug!(target: "arbos-precompiles::wasm_cache", %caller, "caller may not manage the cache");
        return Err(PrecompileError::OutOfGas);
    }

    let now = ctx.block.timestamp;
    let mut state = ctx.arb_state();
    let mut programs = state.programs();
    let params = programs.params()?;
    let mut program = programs.program(code_hash).get()?;

    let age = program.age_seconds(now);
    if cache && program.version != params.version {
        return Err(PrecompileError::solidity(ArbWasmCache::ProgramNeedsUpgrade {
            version: program.version,
            stylusVersion: params.version,
        }));
    }
    if cache && age > params.expiry_seconds() {
        return Err(PrecompileError::solidity(ArbWasmCache::ProgramExpired {
            ageInSeconds: age,
        }));
    }
    if program.cached == cache {
        return Ok(());
    }

    ctx.emit_log(&ArbWasmCache::UpdateProgramCache {
        manager: caller,
        codehash: code_hash,
        cached: cache,
    })?;
    // Charged for eviction as well.
    ctx.burn(u64::from(program.init_cost))?;

    program.cached = cache;
    ctx.arb_state().programs().program(code_hash).set(program)?;
    debug!(target: "arbos-precompiles::wasm_cache", %code_hash, cached = cache, "program cache updated");
    Ok(())
}
