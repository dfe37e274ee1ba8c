//! Routing of calls to ArbOS system addresses.
//!
//! [`dispatch`] resolves the precompile at an address, runs the selector, visibility,
//! mutability and payability gates in a fixed order, charges for argument and result data,
//! and turns whatever the handler returns into an [`Outcome`]. Handlers never build outcomes
//! themselves.

use alloy_sol_types::SolEvent;
use revm::{
    interpreter::gas::{ISTANBUL_SLOAD_GAS, VERYLOW},
    primitives::{Address, Bytes, FixedBytes, HashMap},
};
use tracing::{debug, trace};

use crate::{
    constants::{
        ARB_ADDRESS_TABLE_ADDRESS, ARB_AGGREGATOR_ADDRESS, ARB_GAS_INFO_ADDRESS,
        ARB_INFO_ADDRESS, ARB_OWNER_ADDRESS, ARB_OWNER_PUBLIC_ADDRESS, ARB_RETRYABLE_TX_ADDRESS,
        ARB_STATISTICS_ADDRESS, ARB_SYS_ADDRESS, ARB_WASM_CACHE_ADDRESS, ARBOS_TEST_ADDRESS,
        ARBOS_VERSION_11, ARBOS_VERSION_30,
    },
    context::ExecutionContext,
    result::{Outcome, PrecompileError, PrecompileOutput},
    world_state::WorldState,
};

pub mod arb_address_table;
pub mod arb_aggregator;
pub mod arb_gas_info;
pub mod arb_info;
pub mod arb_owner;
pub mod arb_owner_public;
pub mod arb_retryable_tx;
pub mod arb_statistics;
pub mod arb_sys;
pub mod arb_wasm_cache;
pub mod arbos_test;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StateMutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

impl StateMutability {
    #[inline]
    pub fn payable(self) -> bool {
        self == Self::Payable
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectorEntry {
    pub selector: [u8; 4],
    pub signature: &'static str,
    pub mutability: StateMutability,
    pub min_version: u64,
    pub max_version: Option<u64>,
}

impl SelectorEntry {
    #[inline]
    pub fn active_at(&self, arbos_version: u64) -> bool {
        arbos_version >= self.min_version && self.max_version.is_none_or(|max| arbos_version <= max)
    }
}

/// Immutable selector lookup for one precompile.
#[derive(Clone, Debug, Default)]
pub struct SelectorTable {
    entries: HashMap<[u8; 4], SelectorEntry>,
}

impl SelectorTable {
    pub fn from_entries(entries: impl IntoIterator<Item = SelectorEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.selector, entry))
                .collect(),
        }
    }

    #[inline]
    pub fn get(&self, selector: &[u8; 4]) -> Option<&SelectorEntry> {
        self.entries.get(selector)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectorEntry> {
        self.entries.values()
    }
}

/// Every system contract this crate serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArbPrecompile {
    Sys,
    Info,
    AddressTable,
    Test,
    OwnerPublic,
    GasInfo,
    Aggregator,
    RetryableTx,
    Statistics,
    Owner,
    WasmCache,
}

impl ArbPrecompile {
    pub const ALL: [Self; 11] = [
        Self::Sys,
        Self::Info,
        Self::AddressTable,
        Self::Test,
        Self::OwnerPublic,
        Self::GasInfo,
        Self::Aggregator,
        Self::RetryableTx,
        Self::Statistics,
        Self::Owner,
        Self::WasmCache,
    ];

    pub fn from_address(address: Address) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|precompile| precompile.address() == address)
    }

    pub fn address(self) -> Address {
        match self {
            Self::Sys => ARB_SYS_ADDRESS,
            Self::Info => ARB_INFO_ADDRESS,
            Self::AddressTable => ARB_ADDRESS_TABLE_ADDRESS,
            Self::Test => ARBOS_TEST_ADDRESS,
            Self::OwnerPublic => ARB_OWNER_PUBLIC_ADDRESS,
            Self::GasInfo => ARB_GAS_INFO_ADDRESS,
            Self::Aggregator => ARB_AGGREGATOR_ADDRESS,
            Self::RetryableTx => ARB_RETRYABLE_TX_ADDRESS,
            Self::Statistics => ARB_STATISTICS_ADDRESS,
            Self::Owner => ARB_OWNER_ADDRESS,
            Self::WasmCache => ARB_WASM_CACHE_ADDRESS,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Sys => "ArbSys",
            Self::Info => "ArbInfo",
            Self::AddressTable => "ArbAddressTable",
            Self::Test => "ArbosTest",
            Self::OwnerPublic => "ArbOwnerPublic",
            Self::GasInfo => "ArbGasInfo",
            Self::Aggregator => "ArbAggregator",
            Self::RetryableTx => "ArbRetryableTx",
            Self::Statistics => "ArbStatistics",
            Self::Owner => "ArbOwner",
            Self::WasmCache => "ArbWasmCache",
        }
    }

    /// First ArbOS version at which the contract exists. Below it the address is an ordinary
    /// empty account.
    pub fn min_version(self) -> u64 {
        match self {
            Self::WasmCache => ARBOS_VERSION_30,
            Self::Sys
            | Self::Info
            | Self::AddressTable
            | Self::Test
            | Self::OwnerPublic
            | Self::GasInfo
            | Self::Aggregator
            | Self::RetryableTx
            | Self::Statistics
            | Self::Owner => 0,
        }
    }

    pub fn table(self) -> &'static SelectorTable {
        match self {
            Self::Sys => arb_sys::selector_table(),
            Self::Info => arb_info::selector_table(),
            Self::AddressTable => arb_address_table::selector_table(),
            Self::Test => arbos_test::selector_table(),
            Self::OwnerPublic => arb_owner_public::selector_table(),
            Self::GasInfo => arb_gas_info::selector_table(),
            Self::Aggregator => arb_aggregator::selector_table(),
            Self::RetryableTx => arb_retryable_tx::selector_table(),
            Self::Statistics => arb_statistics::selector_table(),
            Self::Owner => arb_owner::selector_table(),
            Self::WasmCache => arb_wasm_cache::selector_table(),
        }
    }

    /// Only chain owners may call in; everyone else is charged and turned away.
    pub fn owner_only(self) -> bool {
        self == Self::Owner
    }

    fn call<W: WorldState>(
        self,
        ctx: &mut ExecutionContext<'_, W>,
        selector: [u8; 4],
        calldata: &[u8],
    ) -> Result<Bytes, PrecompileError> {
        match self {
            Self::Sys => arb_sys::call(ctx, selector, calldata),
            Self::Info => arb_info::call(ctx, selector, calldata),
            Self::AddressTable => arb_address_table::call(ctx, selector, calldata),
            Self::Test => arbos_test::call(ctx, selector, calldata),
            Self::OwnerPublic => arb_owner_public::call(ctx, selector, calldata),
            Self::GasInfo => arb_gas_info::call(ctx, selector, calldata),
            Self::Aggregator => arb_aggregator::call(ctx, selector, calldata),
            Self::RetryableTx => arb_retryable_tx::call(ctx, selector, calldata),
            Self::Statistics => arb_statistics::call(ctx, selector, calldata),
            Self::Owner => arb_owner::call(ctx, selector, calldata),
            Self::WasmCache => arb_wasm_cache::call(ctx, selector, calldata),
        }
    }
}

/// Runs the call to `address` and reports its outcome, gas and logs.
///
/// World-state writes made by the call are kept only when it succeeds.
pub fn dispatch<W: WorldState>(
    address: Address,
    calldata: &[u8],
    ctx: &mut ExecutionContext<'_, W>,
) -> PrecompileOutput {
    let Some(precompile) = ArbPrecompile::from_address(address) else {
        return finish(ctx, Outcome::NotPrecompile);
    };

    let checkpoint = ctx.world().checkpoint();
    let outcome = run_precompile(precompile, address, calldata, ctx);
    if matches!(outcome, Outcome::Success(_)) {
        ctx.world().checkpoint_commit();
    } else {
        ctx.world().checkpoint_revert(checkpoint);
    }
    finish(ctx, outcome)
}

fn run_precompile<W: WorldState>(
    precompile: ArbPrecompile,
    address: Address,
    calldata: &[u8],
    ctx: &mut ExecutionContext<'_, W>,
) -> Outcome {
    ctx.enter(address);

    let Some(selector) = calldata.first_chunk::<4>().copied() else {
        debug!(target: "arbos-precompiles::dispatch", precompile = precompile.name(), "calldata too short");
        ctx.gas_mut().burn_out();
        return Outcome::padded_revert();
    };

    if ctx.arbos_version() < precompile.min_version() {
        return Outcome::NotPrecompile;
    }

    let outcome = if precompile.owner_only() {
        call_as_owner(precompile, selector, calldata, ctx)
    } else {
        run_method(precompile, selector, calldata, ctx)
    };

    trace!(
        target: "arbos-precompiles::dispatch",
        precompile = precompile.name(),
        selector = %FixedBytes::from(selector),
        outcome = ?outcome,
        gas_left = ctx.gas_left(),
        "precompile call finished"
    );
    outcome
}

fn finish<W: WorldState>(ctx: &mut ExecutionContext<'_, W>, outcome: Outcome) -> PrecompileOutput {
    let logs = ctx.take_logs();
    PrecompileOutput {
        gas_supplied: ctx.gas_supplied(),
        gas_left: ctx.gas_left(),
        logs: if matches!(outcome, Outcome::Success(_)) {
            logs
        } else {
            Vec::new()
        },
        outcome,
    }
}

/// Membership check for owner-only precompiles. Owners run for free; the check itself is
/// paid by everyone.
fn call_as_owner<W: WorldState>(
    precompile: ArbPrecompile,
    selector: [u8; 4],
    calldata: &[u8],
    ctx: &mut ExecutionContext<'_, W>,
) -> Outcome {
    let caller = ctx.caller;
    let is_owner = ctx
        .burn(ISTANBUL_SLOAD_GAS)
        .map_err(PrecompileError::from)
        .and_then(|_| Ok(ctx.arb_state().is_chain_owner(caller)?));
    match is_owner {
        Ok(true) => {}
        Ok(false) => {
            debug!(target: "arbos-precompiles::dispatch", %caller, "unauthorized caller is not a chain owner");
            ctx.gas_mut().burn_out();
            return Outcome::OutOfGas;
        }
        Err(_) => {
            ctx.gas_mut().burn_out();
            return Outcome::OutOfGas;
        }
    }

    ctx.gas_mut().refund_all();
    let outcome = run_method(precompile, selector, calldata, ctx);
    if matches!(outcome, Outcome::OutOfGas) {
        return outcome;
    }
    ctx.gas_mut().refund_all();

    if matches!(outcome, Outcome::Success(_))
        && (!ctx.read_only || ctx.arbos_version() < ARBOS_VERSION_11)
    {
        let event = arb_owner::ArbOwner::OwnerActs {
            method: selector.into(),
            owner: caller,
            data: Bytes::copy_from_slice(calldata),
        };
        if ctx.emit_log(&event).is_err() {
            ctx.gas_mut().burn_out();
            return Outcome::OutOfGas;
        }
        trace!(
            target: "arbos-precompiles::dispatch",
            topic = %arb_owner::ArbOwner::OwnerActs::SIGNATURE_HASH,
            "owner acted"
        );
        ctx.gas_mut().refund_all();
    }
    outcome
}

/// Selector and call gates, argument and result charges, and the handler itself.
fn run_method<W: WorldState>(
    precompile: ArbPrecompile,
    selector: [u8; 4],
    calldata: &[u8],
    ctx: &mut ExecutionContext<'_, W>,
) -> Outcome {
    let version = ctx.arbos_version();
    let Some(entry) = precompile
        .table()
        .get(&selector)
        .filter(|entry| entry.active_at(version))
    else {
        debug!(
            target: "arbos-precompiles::dispatch",
            precompile = precompile.name(),
            selector = %FixedBytes::from(selector),
            version,
            "no method for selector"
        );
        return reject(ctx);
    };

    if entry.mutability >= StateMutability::View && ctx.executing_account != precompile.address() {
        debug!(target: "arbos-precompiles::dispatch", method = entry.signature, "delegated call rejected");
        return reject(ctx);
    }
    if entry.mutability >= StateMutability::NonPayable && ctx.read_only {
        debug!(target: "arbos-precompiles::dispatch", method = entry.signature, "write in static context");
        return reject(ctx);
    }
    if !entry.mutability.payable() && !ctx.value.is_zero() {
        debug!(target: "arbos-precompiles::dispatch", method = entry.signature, "value sent to non-payable method");
        return reject(ctx);
    }

    let args_cost = VERYLOW * (calldata.len() as u64 - 4).div_ceil(32);
    if ctx.burn(args_cost).is_err() {
        return reject(ctx);
    }

    if entry.mutability != StateMutability::Pure && ctx.burn(ISTANBUL_SLOAD_GAS).is_err() {
        return Outcome::OutOfGas;
    }

    match precompile.call(ctx, selector, calldata) {
        Ok(output) => match charge_result(ctx, output.len()) {
            Some(()) => Outcome::Success(output),
            None => Outcome::padded_revert(),
        },
        Err(err) => map_error(ctx, err, version),
    }
}

/// Gate failure: no data, no gas back.
fn reject<W: WorldState>(ctx: &mut ExecutionContext<'_, W>) -> Outcome {
    ctx.gas_mut().burn_out();
    Outcome::padded_revert()
}

fn charge_result<W: WorldState>(ctx: &mut ExecutionContext<'_, W>, len: usize) -> Option<()> {
    let cost = VERYLOW * (len as u64).div_ceil(32);
    ctx.burn(cost).ok()
}

fn map_error<W: WorldState>(
    ctx: &mut ExecutionContext<'_, W>,
    err: PrecompileError,
    version: u64,
) -> Outcome {
    match err {
        PrecompileError::MalformedInput => reject(ctx),
        PrecompileError::Revert(reason) => Outcome::revert(reason),
        PrecompileError::BusinessRuleViolation(reason) | PrecompileError::Unauthorized(reason) => {
            if version >= ARBOS_VERSION_11 {
                Outcome::revert(reason)
            } else {
                debug!(target: "arbos-precompiles::dispatch", %reason, "pre-11 failure consumes all gas");
                ctx.gas_mut().burn_out();
                Outcome::OutOfGas
            }
        }
        PrecompileError::StructuredError { selector, args } => {
            match charge_result(ctx, 4 + args.len()) {
                Some(()) => Outcome::SolidityError { selector, args },
                None => Outcome::padded_revert(),
            }
        }
        PrecompileError::OutOfGas => {
            ctx.gas_mut().burn_out();
            Outcome::OutOfGas
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_round_trip() {
        for precompile in ArbPrecompile::ALL {
            assert_eq!(ArbPrecompile::from_address(precompile.address()), Some(precompile));
            assert!(!precompile.table().is_empty(), "{} has no methods", precompile.name());
        }
        assert_eq!(ArbPrecompile::from_address(Address::ZERO), None);
    }

    #[test]
    fn tables_are_keyed_by_selector() {
        for precompile in ArbPrecompile::ALL {
            for entry in precompile.table().iter() {
                let hash = revm::primitives::keccak256(entry.signature.as_bytes());
                assert_eq!(entry.selector, hash[..4], "{}", entry.signature);
            }
        }
    }

    #[test]
    fn version_window_is_inclusive() {
        let entry = SelectorEntry {
            selector: [0; 4],
            signature: "f()",
            mutability: StateMutability::View,
            min_version: 10,
            max_version: Some(20),
        };
        assert!(!entry.active_at(9));
        assert!(entry.active_at(10));
        assert!(entry.active_at(20));
        assert!(!entry.active_at(21));
    }

    #[test]
    fn only_the_wasm_cache_arrives_late() {
        for precompile in ArbPrecompile::ALL {
            let expected = match precompile {
                ArbPrecompile::WasmCache => ARBOS_VERSION_30,
                _ => 0,
            };
            assert_eq!(precompile.min_version(), expected, "{}", precompile.name());
        }
    }

    #[test]
    fn mutability_is_ordered() {
        assert!(StateMutability::Pure < StateMutability::View);
        assert!(StateMutability::View < StateMutability::NonPayable);
        assert!(StateMutability::NonPayable < StateMutability::Payable);
        assert!(StateMutability::Payable.payable());
        assert!(!StateMutability::NonPayable.payable());
    }
}
