use alloy_sol_types::{SolCall, sol};
use revm::primitives::{Address, Bytes, U256};
use tracing::debug;

use crate::{
    constants::ARBOS_BATCH_POSTER_ADDRESS,
    context::ExecutionContext,
    macros::{decode_call, encode_returns, selector_table},
    precompiles::SelectorTable,
    result::PrecompileError,
    world_state::WorldState,
};

sol! {
/// @title Provides aggregators and their users methods for configuring how they participate in L1 aggregation.
/// @notice Precompiled contract that exists in every Arbitrum chain at 0x000000000000000000000000000000000000006d
interface ArbAggregator {
    /// @notice Deprecated, customization of preferred aggregator is no longer supported
    /// @notice Get the address of an arbitrarily chosen batch poster.
    /// @param addr ignored
    /// @return (batchPosterAddress, true)
    function getPreferredAggregator(
        address addr
    ) external view returns (address, bool);

    /// @notice Deprecated, there is no longer a single preferred aggregator, use getBatchPosters instead
    /// @notice Get default aggregator.
    function getDefaultAggregator() external view returns (address);

    /// @notice Get a list of all current batch posters
    /// @return Batch poster addresses
    function getBatchPosters() external view returns (address[] memory);

    /// @notice Adds newBatchPoster as a batch poster
    /// This reverts unless called by a chain owner
    /// @param newBatchPoster New batch poster
    function addBatchPoster(
        address newBatchPoster
    ) external;

    /// @notice Get the address where fees to batchPoster are sent.
    /// @param batchPoster The batch poster to get the fee collector for
    /// @return The fee collectors address. This will sometimes but not always be the same as the batch poster's address.
    function getFeeCollector(
        address batchPoster
    ) external view returns (address);

    /// @notice Set the address where fees to batchPoster are sent.
    /// This reverts unless called by the batch poster, its fee collector, or a chain owner
    /// @param batchPoster The batch poster to set the fee collector for
    /// @param newFeeCollector The new fee collector to set
    function setFeeCollector(address batchPoster, address newFeeCollector) external;

    /// @notice Deprecated, always returns zero
    /// @notice Get the tx base fee (in approximate L1 gas) for aggregator
    /// @param aggregator The aggregator to get the base fee for
    function getTxBaseFee(
        address aggregator
    ) external view returns (uint256);

    /// @notice Deprecated, is now a no-op
    /// @notice Set the tx base fee (in approximate L1 gas) for aggregator
    /// Revert unless called by aggregator or the chain owner
    /// Revert if feeInL1Gas is outside the chain's allowed bounds
    /// @param aggregator The aggregator to set the fee for
    /// @param feeInL1Gas The base fee in L1 gas
    function setTxBaseFee(address aggregator, uint256 feeInL1Gas) external;
}
}

lazy_static::lazy_static! {
    static ref SELECTORS: SelectorTable = selector_table! {
        ArbAggregator => {
            getPreferredAggregatorCall(View),
            getDefaultAggregatorCall(View),
            getBatchPostersCall(View),
            addBatchPosterCall(NonPayable),
            getFeeCollectorCall(View),
            setFeeCollectorCall(NonPayable),
            getTxBaseFeeCall(View),
            setTxBaseFeeCall(NonPayable),
        }
    };
}

pub(crate) fn selector_table() -> &'static SelectorTable {
    &SELECTORS
}

fn existing_poster<W: WorldState>(
    ctx: &mut ExecutionContext<'_, W>,
    batch_poster: Address,
) -> Result<(), PrecompileError> {
    let known = ctx
        .arb_state()
        .l1_pricing()
        .batch_poster_table()
        .contains(batch_poster)?;
    if !known {
        return Err(PrecompileError::business(
            "tried to open a batch poster that does not exist",
        ));
    }
    Ok(())
}

pub(crate) fn call<W: WorldState>(
    ctx: &mut ExecutionContext<'_, W>,
    selector: [u8; 4],
    input: &[u8],
) -> Result<Bytes, PrecompileError> {
    match selector {
        ArbAggregator::getPreferredAggregatorCall::SELECTOR => {
            decode_call!(ArbAggregator::getPreferredAggregatorCall, input);
            Ok(encode_returns!(
                ArbAggregator::getPreferredAggregatorCall,
                ArbAggregator::getPreferredAggregatorReturn::from((ARBOS_BATCH_POSTER_ADDRESS, true))
            ))
        }
        ArbAggregator::getDefaultAggregatorCall::SELECTOR => Ok(encode_returns!(
            ArbAggregator::getDefaultAggregatorCall,
            ARBOS_BATCH_POSTER_ADDRESS
        )),
        ArbAggregator::getBatchPostersCall::SELECTOR => {
            let posters = ctx.arb_state().l1_pricing().batch_poster_table().all()?;
            Ok(encode_returns!(ArbAggregator::getBatchPostersCall, posters))
        }
        ArbAggregator::addBatchPosterCall::SELECTOR => {
            let call = decode_call!(ArbAggregator::addBatchPosterCall, input);
            let caller = ctx.caller;
            if !ctx.arb_state().is_chain_owner(caller)? {
                return Err(PrecompileError::unauthorized("must be called by chain owner"));
            }
            let added = ctx
                .arb_state()
                .l1_pricing()
                .batch_poster_table()
                .add_if_missing(call.newBatchPoster)?;
            if added {
                debug!(target: "arbos-precompiles::aggregator", poster = %call.newBatchPoster, "added batch poster");
            }
            Ok(Bytes::new())
        }
        ArbAggregator::getFeeCollectorCall::SELECTOR => {
            let call = decode_call!(ArbAggregator::getFeeCollectorCall, input);
            existing_poster(ctx, call.batchPoster)?;
            let collector = ctx
                .arb_state()
                .l1_pricing()
                .batch_poster_table()
                .fee_collector(call.batchPoster)?;
            Ok(encode_returns!(ArbAggregator::getFeeCollectorCall, collector))
        }
        ArbAggregator::setFeeCollectorCall::SELECTOR => {
            let call = decode_call!(ArbAggregator::setFeeCollectorCall, input);
            existing_poster(ctx, call.batchPoster)?;
            let caller = ctx.caller;
            let mut state = ctx.arb_state();
            let current = state
                .l1_pricing()
                .batch_poster_table()
                .fee_collector(call.batchPoster)?;
            if caller != call.batchPoster && caller != current && !state.is_chain_owner(caller)? {
                return Err(PrecompileError::unauthorized(
                    "only a batch poster (or its fee collector / chain owner) may change its fee collector",
                ));
            }
            state
                .l1_pricing()
                .batch_poster_table()
                .set_fee_collector(call.batchPoster, call.newFeeCollector)?;
            Ok(Bytes::new())
        }
        ArbAggregator::getTxBaseFeeCall::SELECTOR => {
            decode_call!(ArbAggregator::getTxBaseFeeCall, input);
            Ok(encode_returns!(ArbAggregator::getTxBaseFeeCall, U256::ZERO))
        }
        ArbAggregator::setTxBaseFeeCall::SELECTOR => {
            decode_call!(ArbAggregator::setTxBaseFeeCall, input);
            Ok(Bytes::new())
        }
        _ => Err(PrecompileError::MalformedInput),
    }
}
