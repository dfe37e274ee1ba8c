use alloy_sol_types::{SolCall, sol};
use revm::primitives::{Bytes, U256};

use crate::{
    constants::{
        ARBOS_L1_PRICER_FUNDS_ADDRESS, ARBOS_VERSION_10, ARBOS_VERSION_11, ARBOS_VERSION_20,
        ARBOS_VERSION_50,
    },
    context::ExecutionContext,
    macros::{decode_call, encode_returns, selector_table},
    precompiles::SelectorTable,
    pricing::{l1_pricing_surplus, prices_in_arb_gas, prices_in_wei},
    result::PrecompileError,
    world_state::WorldState,
};

sol! {
/// @title Provides insight into the cost of using the chain.
/// @notice These methods have been adjusted to account for Nitro's heavy use of calldata compression.
/// Of note to end-users, we no longer make a distinction between non-zero and zero-valued calldata bytes.
/// Precompiled contract that exists in every Arbitrum chain at 0x000000000000000000000000000000000000006c.
interface ArbGasInfo {
    /// @notice Get gas prices for a provided aggregator
    /// @return return gas prices in wei
    ///        (
    ///            per L2 tx,
    ///            per L1 calldata byte
    ///            per storage allocation,
    ///            per ArbGas base,
    ///            per ArbGas congestion,
    ///            per ArbGas total
    ///        )
    function getPricesInWeiWithAggregator(
        address aggregator
    ) external view returns (uint256, uint256, uint256, uint256, uint256, uint256);

    /// @notice Get gas prices. Uses the caller's preferred aggregator, or the default if the caller doesn't have a preferred one.
    /// @return return gas prices in wei
    ///        (
    ///            per L2 tx,
    ///            per L1 calldata byte
    ///            per storage allocation,
    ///            per ArbGas base,
    ///            per ArbGas congestion,
    ///            per ArbGas total
    ///        )
    function getPricesInWei()
        external
        view
        returns (uint256, uint256, uint256, uint256, uint256, uint256);

    /// @notice Get prices in ArbGas for the supplied aggregator
    /// @return (per L2 tx, per L1 calldata byte, per storage allocation)
    function getPricesInArbGasWithAggregator(
        address aggregator
    ) external view returns (uint256, uint256, uint256);

    /// @notice Get prices in ArbGas. Assumes the callers preferred validator, or the default if caller doesn't have a preferred one.
    /// @return (per L2 tx, per L1 calldata byte, per storage allocation)
    function getPricesInArbGas() external view returns (uint256, uint256, uint256);

    /// @notice Get the gas accounting parameters. `gasPoolMax` is always zero, as the exponential pricing model has no such notion.
    /// @return (speedLimitPerSecond, gasPoolMax, maxTxGasLimit)
    function getGasAccountingParams() external view returns (uint256, uint256, uint256);

    /// @notice Get the minimum gas price needed for a tx to succeed
    function getMinimumGasPrice() external view returns (uint256);

    /// @notice Get ArbOS's estimate of the L1 basefee in wei
    function getL1BaseFeeEstimate() external view returns (uint256);

    /// @notice Get how slowly ArbOS updates its estimate of the L1 basefee
    function getL1BaseFeeEstimateInertia() external view returns (uint64);

    /// @notice Get the L1 pricer reward rate, in wei per unit
    /// Available in ArbOS version 11
    function getL1RewardRate() external view returns (uint64);

    /// @notice Get the L1 pricer reward recipient
    /// Available in ArbOS version 11
    function getL1RewardRecipient() external view returns (address);

    /// @notice Deprecated -- Same as getL1BaseFeeEstimate()
    function getL1GasPriceEstimate() external view returns (uint256);

    /// @notice Get L1 gas fees paid by the current transaction
    function getCurrentTxL1GasFees() external view returns (uint256);

    /// @notice Get the backlogged amount of gas burnt in excess of the speed limit
    function getGasBacklog() external view returns (uint64);

    /// @notice Get how slowly ArbOS updates the L2 basefee in response to backlogged gas
    function getPricingInertia() external view returns (uint64);

    /// @notice Get the forgivable amount of backlogged gas ArbOS will ignore when raising the basefee
    function getGasBacklogTolerance() external view returns (uint64);

    /// @notice Returns the surplus of funds for L1 batch posting payments (may be negative).
    function getL1PricingSurplus() external view returns (int256);

    /// @notice Returns the base charge (in L1 gas) attributed to each data batch in the calldata pricer
    function getPerBatchGasCharge() external view returns (int64);

    /// @notice Returns the cost amortization cap in basis points
    function getAmortizedCostCapBips() external view returns (uint64);

    /// @notice Returns the available funds from L1 fees
    function getL1FeesAvailable() external view returns (uint256);

    /// @notice Returns the equilibration units parameter for L1 price adjustment algorithm
    /// Available in ArbOS version 20
    function getL1PricingEquilibrationUnits() external view returns (uint256);

    /// @notice Returns the last time the L1 calldata pricer was updated.
    /// Available in ArbOS version 20
    function getLastL1PricingUpdateTime() external view returns (uint64);

    /// @notice Returns the amount of L1 calldata payments due for rewards (per the L1 reward rate)
    /// Available in ArbOS version 20
    function getL1PricingFundsDueForRewards() external view returns (uint256);

    /// @notice Returns the amount of L1 calldata posted since the last update.
    /// Available in ArbOS version 20
    function getL1PricingUnitsSinceUpdate() external view returns (uint64);

    /// @notice Returns the L1 pricing surplus as of the last update (may be negative).
    /// Available in ArbOS version 20
    function getLastL1PricingSurplus() external view returns (int256);

    /// @notice Returns the maximum gas a single transaction may use
    /// Available in ArbOS version 50
    function getMaxTxGasLimit() external view returns (uint64);

    /// @notice Returns the maximum gas a block may use
    /// Available in ArbOS version 50
    function getMaxBlockGasLimit() external view returns (uint64);
}

}

lazy_static::lazy_static! {
    static ref SELECTORS: SelectorTable = selector_table! {
        ArbGasInfo => {
            getPricesInWeiWithAggregatorCall(View),
            getPricesInWeiCall(View),
            getPricesInArbGasWithAggregatorCall(View),
            getPricesInArbGasCall(View),
            getGasAccountingParamsCall(View),
            getMinimumGasPriceCall(View),
            getL1BaseFeeEstimateCall(View),
            getL1BaseFeeEstimateInertiaCall(View),
            getL1RewardRateCall(View, min = ARBOS_VERSION_11),
            getL1RewardRecipientCall(View, min = ARBOS_VERSION_11),
            getL1GasPriceEstimateCall(View),
            getCurrentTxL1GasFeesCall(View),
            getGasBacklogCall(View),
            getPricingInertiaCall(View),
            getGasBacklogToleranceCall(View),
            getL1PricingSurplusCall(View),
            getPerBatchGasChargeCall(View),
            getAmortizedCostCapBipsCall(View),
            getL1FeesAvailableCall(View, min = ARBOS_VERSION_10),
            getL1PricingEquilibrationUnitsCall(View, min = ARBOS_VERSION_20),
            getLastL1PricingUpdateTimeCall(View, min = ARBOS_VERSION_20),
            getL1PricingFundsDueForRewardsCall(View, min = ARBOS_VERSION_20),
            getL1PricingUnitsSinceUpdateCall(View, min = ARBOS_VERSION_20),
            getLastL1PricingSurplusCall(View, min = ARBOS_VERSION_20),
            getMaxTxGasLimitCall(View, min = ARBOS_VERSION_50),
            getMaxBlockGasLimitCall(View, min = ARBOS_VERSION_50),
        }
    };
}

pub(crate) fn selector_table() -> &'static SelectorTable {
    &SELECTORS
}

type WeiPrices = (U256, U256, U256, U256, U256, U256);
type ArbGasPrices = (U256, U256, U256);

fn wei_prices<W: WorldState>(ctx: &mut ExecutionContext<'_, W>) -> Result<WeiPrices, PrecompileError> {
    let base_fee = ctx.block.basefee;
    let mut state = ctx.arb_state();
    let version = state.arbos_version();
    let l1_price = state.l1_pricing().price_per_unit().get()?;
    let min_base_fee = state.l2_pricing().min_base_fee_wei().get()?;

    let prices = prices_in_wei(l1_price, base_fee, min_base_fee, version);
    Ok((
        prices.per_l2_tx,
        prices.wei_for_l1_calldata,
        prices.wei_for_l2_storage,
        prices.per_arb_gas_base,
        prices.per_arb_gas_congestion,
        prices.per_arb_gas_total,
    ))
}

fn arb_gas_prices<W: WorldState>(
    ctx: &mut ExecutionContext<'_, W>,
) -> Result<ArbGasPrices, PrecompileError> {
    let base_fee = ctx.block.basefee;
    let mut state = ctx.arb_state();
    let version = state.arbos_version();
    let l1_price = state.l1_pricing().price_per_unit().get()?;

    let prices = prices_in_arb_gas(l1_price, base_fee, version);
    Ok((
        prices.gas_per_l2_tx,
        prices.gas_for_l1_calldata,
        prices.gas_for_l2_storage,
    ))
}

pub(crate) fn call<W: WorldState>(
    ctx: &mut ExecutionContext<'_, W>,
    selector: [u8; 4],
    input: &[u8],
) -> Result<Bytes, PrecompileError> {
    let version = ctx.arbos_version();

    let output = match selector {
        ArbGasInfo::getPricesInWeiWithAggregatorCall::SELECTOR => {
            decode_call!(ArbGasInfo::getPricesInWeiWithAggregatorCall, input);
            encode_returns!(
                ArbGasInfo::getPricesInWeiWithAggregatorCall,
                ArbGasInfo::getPricesInWeiWithAggregatorReturn::from(wei_prices(ctx)?)
            )
        }
        ArbGasInfo::getPricesInWeiCall::SELECTOR => encode_returns!(
            ArbGasInfo::getPricesInWeiCall,
            ArbGasInfo::getPricesInWeiReturn::from(wei_prices(ctx)?)
        ),
        ArbGasInfo::getPricesInArbGasWithAggregatorCall::SELECTOR => {
            decode_call!(ArbGasInfo::getPricesInArbGasWithAggregatorCall, input);
            encode_returns!(
                ArbGasInfo::getPricesInArbGasWithAggregatorCall,
                ArbGasInfo::getPricesInArbGasWithAggregatorReturn::from(arb_gas_prices(ctx)?)
            )
        }
        ArbGasInfo::getPricesInArbGasCall::SELECTOR => encode_returns!(
            ArbGasInfo::getPricesInArbGasCall,
            ArbGasInfo::getPricesInArbGasReturn::from(arb_gas_prices(ctx)?)
        ),
        ArbGasInfo::getGasAccountingParamsCall::SELECTOR => {
            let mut state = ctx.arb_state();
            let mut l2_pricing = state.l2_pricing();
            let speed_limit = l2_pricing.speed_limit_per_second().get()?;
            let block_limit = l2_pricing.per_block_gas_limit().get()?;
            let tx_limit = if version < ARBOS_VERSION_50 {
                block_limit
            } else {
                l2_pricing.per_tx_gas_limit().get()?
            };
            encode_returns!(
                ArbGasInfo::getGasAccountingParamsCall,
                ArbGasInfo::getGasAccountingParamsReturn::from((
                    U256::from(speed_limit),
                    U256::from(block_limit),
                    U256::from(tx_limit),
                ))
            )
        }
        ArbGasInfo::getMinimumGasPriceCall::SELECTOR => {
            let price = ctx.arb_state().l2_pricing().min_base_fee_wei().get()?;
            encode_returns!(ArbGasInfo::getMinimumGasPriceCall, price)
        }
        ArbGasInfo::getL1BaseFeeEstimateCall::SELECTOR => {
            let price = ctx.arb_state().l1_pricing().price_per_unit().get()?;
            encode_returns!(ArbGasInfo::getL1BaseFeeEstimateCall, price)
        }
        ArbGasInfo::getL1GasPriceEstimateCall::SELECTOR => {
            let price = ctx.arb_state().l1_pricing().price_per_unit().get()?;
            encode_returns!(ArbGasInfo::getL1GasPriceEstimateCall, price)
        }
        ArbGasInfo::getL1BaseFeeEstimateInertiaCall::SELECTOR => {
            let inertia = ctx.arb_state().l1_pricing().inertia().get()?;
            encode_returns!(ArbGasInfo::getL1BaseFeeEstimateInertiaCall, inertia)
        }
        ArbGasInfo::getL1RewardRateCall::SELECTOR => {
            let rate = ctx.arb_state().l1_pricing().per_unit_reward().get()?;
            encode_returns!(ArbGasInfo::getL1RewardRateCall, rate)
        }
        ArbGasInfo::getL1RewardRecipientCall::SELECTOR => {
            let recipient = ctx.arb_state().l1_pricing().reward_recipient().get()?;
            encode_returns!(ArbGasInfo::getL1RewardRecipientCall, recipient)
        }
        ArbGasInfo::getCurrentTxL1GasFeesCall::SELECTOR => {
            encode_returns!(ArbGasInfo::getCurrentTxL1GasFeesCall, ctx.poster_fee)
        }
        ArbGasInfo::getGasBacklogCall::SELECTOR => {
            let backlog = ctx.arb_state().l2_pricing().gas_backlog().get()?;
            encode_returns!(ArbGasInfo::getGasBacklogCall, backlog)
        }
        ArbGasInfo::getPricingInertiaCall::SELECTOR => {
            let inertia = ctx.arb_state().l2_pricing().pricing_inertia().get()?;
            encode_returns!(ArbGasInfo::getPricingInertiaCall, inertia)
        }
        ArbGasInfo::getGasBacklogToleranceCall::SELECTOR => {
            let tolerance = ctx.arb_state().l2_pricing().backlog_tolerance().get()?;
            encode_returns!(ArbGasInfo::getGasBacklogToleranceCall, tolerance)
        }
        ArbGasInfo::getL1PricingSurplusCall::SELECTOR => {
            // Before v10 the whole pool balance counted as available.
            let pool_balance = if version < ARBOS_VERSION_10 {
                Some(ctx.world().balance(ARBOS_L1_PRICER_FUNDS_ADDRESS)?)
            } else {
                None
            };
            let mut state = ctx.arb_state();
            let mut l1_pricing = state.l1_pricing();
            let total_funds_due = l1_pricing.batch_poster_table().total_funds_due().get()?;
            let funds_due_for_rewards = l1_pricing.funds_due_for_rewards().get()?;
            let available = match pool_balance {
                Some(balance) => balance,
                None => l1_pricing.l1_fees_available().get()?,
            };
            encode_returns!(
                ArbGasInfo::getL1PricingSurplusCall,
                l1_pricing_surplus(available, total_funds_due, funds_due_for_rewards)
            )
        }
        ArbGasInfo::getPerBatchGasChargeCall::SELECTOR => {
            let charge = ctx.arb_state().l1_pricing().per_batch_gas_cost().get()?;
            encode_returns!(ArbGasInfo::getPerBatchGasChargeCall, charge as i64)
        }
        ArbGasInfo::getAmortizedCostCapBipsCall::SELECTOR => {
            let cap = ctx.arb_state().l1_pricing().amortized_cost_cap_bips().get()?;
            encode_returns!(ArbGasInfo::getAmortizedCostCapBipsCall, cap)
        }
        ArbGasInfo::getL1FeesAvailableCall::SELECTOR => {
            let available = ctx.arb_state().l1_pricing().l1_fees_available().get()?;
            encode_returns!(ArbGasInfo::getL1FeesAvailableCall, available)
        }
        ArbGasInfo::getL1PricingEquilibrationUnitsCall::SELECTOR => {
            let units = ctx.arb_state().l1_pricing().equilibration_units().get()?;
            encode_returns!(ArbGasInfo::getL1PricingEquilibrationUnitsCall, units)
        }
        ArbGasInfo::getLastL1PricingUpdateTimeCall::SELECTOR => {
            let time = ctx.arb_state().l1_pricing().last_update_time().get()?;
            encode_returns!(ArbGasInfo::getLastL1PricingUpdateTimeCall, time)
        }
        ArbGasInfo::getL1PricingFundsDueForRewardsCall::SELECTOR => {
            let due = ctx.arb_state().l1_pricing().funds_due_for_rewards().get()?;
            encode_returns!(ArbGasInfo::getL1PricingFundsDueForRewardsCall, due.into_raw())
        }
        ArbGasInfo::getL1PricingUnitsSinceUpdateCall::SELECTOR => {
            let units = ctx.arb_state().l1_pricing().units_since_update().get()?;
            encode_returns!(ArbGasInfo::getL1PricingUnitsSinceUpdateCall, units)
        }
        ArbGasInfo::getLastL1PricingSurplusCall::SELECTOR => {
            let surplus = ctx.arb_state().l1_pricing().last_surplus().get()?;
            encode_returns!(ArbGasInfo::getLastL1PricingSurplusCall, surplus)
        }
        ArbGasInfo::getMaxTxGasLimitCall::SELECTOR => {
            let limit = ctx.arb_state().l2_pricing().per_tx_gas_limit().get()?;
            encode_returns!(ArbGasInfo::getMaxTxGasLimitCall, limit)
        }
        ArbGasInfo::getMaxBlockGasLimitCall::SELECTOR => {
            let limit = ctx.arb_state().l2_pricing().per_block_gas_limit().get()?;
            encode_returns!(ArbGasInfo::getMaxBlockGasLimitCall, limit)
        }
        _ => return Err(PrecompileError::MalformedInput),
    };
    Ok(output)
}
