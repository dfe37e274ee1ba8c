use alloy_sol_types::{SolCall, sol};
use revm::primitives::Bytes;
use tracing::info;

use crate::{
    constants::{
        ARBOS_L1_PRICER_FUNDS_ADDRESS, ARBOS_VERSION_5, ARBOS_VERSION_6, ARBOS_VERSION_10,
        ARBOS_VERSION_20, ARBOS_VERSION_30, ARBOS_VERSION_40, ARBOS_VERSION_41, ARBOS_VERSION_50,
        MAX_BROTLI_COMPRESSION_LEVEL, NATIVE_TOKEN_ENABLE_DELAY,
    },
    context::ExecutionContext,
    macros::{decode_call, encode_returns, selector_table},
    precompiles::SelectorTable,
    result::PrecompileError,
    world_state::WorldState,
};

sol! {
///
/// @title Provides owners with tools for managing the rollup.
/// @notice Calls by non-owners will always revert.
/// Precompiled contract that exists in every Arbitrum chain at 0x0000000000000000000000000000000000000070.
///
interface ArbOwner {
    /// @notice Add account as a chain owner
    function addChainOwner(
        address newOwner
    ) external;

    /// @notice Remove account from the list of chain owners
    function removeChainOwner(
        address ownerToRemove
    ) external;

    /// @notice See if the user is a chain owner
    function isChainOwner(
        address addr
    ) external view returns (bool);

    /// @notice Retrieves the list of chain owners
    function getAllChainOwners() external view returns (address[] memory);

    /// @notice Sets the NativeTokenManagementFrom time
    /// Available in ArbOS version 41
    function setNativeTokenManagementFrom(
        uint64 timestamp
    ) external;

    /// @notice Add account as a native token owner
    /// Available in ArbOS version 41
    function addNativeTokenOwner(
        address newOwner
    ) external;

    /// @notice Remove account from the list of native token owners
    /// Available in ArbOS version 41
    function removeNativeTokenOwner(
        address ownerToRemove
    ) external;

    /// @notice See if the user is a native token owner
    /// Available in ArbOS version 41
    function isNativeTokenOwner(
        address addr
    ) external view returns (bool);

    /// @notice Retrieves the list of native token owners
    /// Available in ArbOS version 41
    function getAllNativeTokenOwners() external view returns (address[] memory);

    /// @notice Set how slowly ArbOS updates its estimate of the L1 basefee
    function setL1BaseFeeEstimateInertia(
        uint64 inertia
    ) external;

    /// @notice Set the L2 basefee directly, bypassing the pool calculus
    function setL2BaseFee(
        uint256 priceInWei
    ) external;

    /// @notice Set the minimum basefee needed for a transaction to succeed
    function setMinimumL2BaseFee(
        uint256 priceInWei
    ) external;

    /// @notice Set the computational speed limit for the chain
    function setSpeedLimit(
        uint64 limit
    ) external;

    /// @notice Set the maximum size a tx can be
    function setMaxTxGasLimit(
        uint64 limit
    ) external;

    /// @notice Set the maximum size a block can be
    /// Available in ArbOS version 50
    function setMaxBlockGasLimit(
        uint64 limit
    ) external;

    /// @notice Set the L2 gas pricing inertia
    function setL2GasPricingInertia(
        uint64 sec
    ) external;

    /// @notice Set the L2 gas backlog tolerance
    function setL2GasBacklogTolerance(
        uint64 sec
    ) external;

    /// @notice Get the network fee collector
    function getNetworkFeeAccount() external view returns (address);

    /// @notice Get the infrastructure fee collector
    function getInfraFeeAccount() external view returns (address);

    /// @notice Set the network fee collector
    function setNetworkFeeAccount(
        address newNetworkFeeAccount
    ) external;

    /// @notice Set the infrastructure fee collector
    function setInfraFeeAccount(
        address newInfraFeeAccount
    ) external;

    /// @notice Upgrades ArbOS to the requested version at the requested timestamp
    function scheduleArbOSUpgrade(uint64 newVersion, uint64 timestamp) external;

    /// @notice Sets equilibration units parameter for L1 price adjustment algorithm
    function setL1PricingEquilibrationUnits(
        uint256 equilibrationUnits
    ) external;

    /// @notice Sets inertia parameter for L1 price adjustment algorithm
    function setL1PricingInertia(
        uint64 inertia
    ) external;

    /// @notice Sets reward recipient address for L1 price adjustment algorithm
    function setL1PricingRewardRecipient(
        address recipient
    ) external;

    /// @notice Sets reward amount for L1 price adjustment algorithm, in wei per unit
    function setL1PricingRewardRate(
        uint64 weiPerUnit
    ) external;

    /// @notice Set how much ArbOS charges per L1 gas spent on transaction data.
    function setL1PricePerUnit(
        uint256 pricePerUnit
    ) external;

    /// @notice Sets the base charge (in L1 gas) attributed to each data batch in the calldata pricer
    function setPerBatchGasCharge(
        int64 cost
    ) external;

    ///
    /// @notice Sets the Brotli compression level used for fast compression
    /// Available in ArbOS version 20 with default level as 1
    ///
    function setBrotliCompressionLevel(
        uint64 level
    ) external;

    /// @notice Sets the cost amortization cap in basis points
    function setAmortizedCostCapBips(
        uint64 cap
    ) external;

    /// @notice Releases surplus funds from L1PricerFundsPoolAddress for use
    function releaseL1PricerSurplusFunds(
        uint256 maxWeiToRelease
    ) external returns (uint256);

    ///
    /// @notice Sets the increased calldata price feature on or off (EIP-7623)
    /// Available in ArbOS version 40 with default as false
    ///
    function setCalldataPriceIncrease(
        bool enable
    ) external;

    /// @notice Sets the L1 gas floor charged per native token
    /// Available in ArbOS version 50
    function setParentGasFloorPerToken(
        uint64 floorPerToken
    ) external;

    /// @notice Adds account as a wasm cache manager
    /// Available in ArbOS version 30
    function addWasmCacheManager(
        address manager
    ) external;

    /// @notice Removes account from the list of wasm cache managers
    /// Available in ArbOS version 30
    function removeWasmCacheManager(
        address manager
    ) external;

    /// Emitted when a successful call is made to this precompile
    event OwnerActs(bytes4 indexed method, address indexed owner, bytes data);
}
}

lazy_static::lazy_static! {
    static ref SELECTORS: SelectorTable = selector_table! {
        ArbOwner => {
            addChainOwnerCall(NonPayable),
            removeChainOwnerCall(NonPayable),
            isChainOwnerCall(View),
            getAllChainOwnersCall(View),
            setNativeTokenManagementFromCall(NonPayable, min = ARBOS_VERSION_41),
            addNativeTokenOwnerCall(NonPayable, min = ARBOS_VERSION_41),
            removeNativeTokenOwnerCall(NonPayable, min = ARBOS_VERSION_41),
            isNativeTokenOwnerCall(View, min = ARBOS_VERSION_41),
            getAllNativeTokenOwnersCall(View, min = ARBOS_VERSION_41),
            setL1BaseFeeEstimateInertiaCall(NonPayable),
            setL2BaseFeeCall(NonPayable),
            setMinimumL2BaseFeeCall(NonPayable),
            setSpeedLimitCall(NonPayable),
            setMaxTxGasLimitCall(NonPayable),
            setMaxBlockGasLimitCall(NonPayable, min = ARBOS_VERSION_50),
            setL2GasPricingInertiaCall(NonPayable),
            setL2GasBacklogToleranceCall(NonPayable),
            getNetworkFeeAccountCall(View),
            getInfraFeeAccountCall(View, min = ARBOS_VERSION_5),
            setNetworkFeeAccountCall(NonPayable),
            setInfraFeeAccountCall(NonPayable, min = ARBOS_VERSION_5),
            scheduleArbOSUpgradeCall(NonPayable),
            setL1PricingEquilibrationUnitsCall(NonPayable),
            setL1PricingInertiaCall(NonPayable),
            setL1PricingRewardRecipientCall(NonPayable),
            setL1PricingRewardRateCall(NonPayable),
            setL1PricePerUnitCall(NonPayable),
            setPerBatchGasChargeCall(NonPayable),
            setBrotliCompressionLevelCall(NonPayable, min = ARBOS_VERSION_20),
            setAmortizedCostCapBipsCall(NonPayable),
            releaseL1PricerSurplusFundsCall(NonPayable, min = ARBOS_VERSION_10),
            setCalldataPriceIncreaseCall(NonPayable, min = ARBOS_VERSION_40),
            setParentGasFloorPerTokenCall(NonPayable, min = ARBOS_VERSION_50),
            addWasmCacheManagerCall(NonPayable, min = ARBOS_VERSION_30),
            removeWasmCacheManagerCall(NonPayable, min = ARBOS_VERSION_30),
        }
    };
}

pub(crate) fn selector_table() -> &'static SelectorTable {
    &SELECTORS
}

/// Handlers for owner methods. Membership is checked by the dispatcher before these run.
pub(crate) fn call<W: WorldState>(
    ctx: &mut ExecutionContext<'_, W>,
    selector: [u8; 4],
    input: &[u8],
) -> Result<Bytes, PrecompileError> {
    let version = ctx.arbos_version();
    let now = ctx.block.timestamp;

    match selector {
        ArbOwner::addChainOwnerCall::SELECTOR => {
            let call = decode_call!(ArbOwner::addChainOwnerCall, input);
            ctx.arb_state().chain_owners().add(call.newOwner)?;
            info!(target: "arbos-precompiles::owner", owner = %call.newOwner, "added chain owner");
        }
        ArbOwner::removeChainOwnerCall::SELECTOR => {
            let call = decode_call!(ArbOwner::removeChainOwnerCall, input);
            let mut state = ctx.arb_state();
            if !state.is_chain_owner(call.ownerToRemove)? {
                return Err(PrecompileError::business("Tried to remove non-owner"));
            }
            state.chain_owners().remove(call.ownerToRemove, version)?;
            info!(target: "arbos-precompiles::owner", owner = %call.ownerToRemove, "removed chain owner");
        }
        ArbOwner::isChainOwnerCall::SELECTOR => {
            let call = decode_call!(ArbOwner::isChainOwnerCall, input);
            let is_owner = ctx.arb_state().is_chain_owner(call.addr)?;
            return Ok(encode_returns!(ArbOwner::isChainOwnerCall, is_owner));
        }
        ArbOwner::getAllChainOwnersCall::SELECTOR => {
            let owners = ctx.arb_state().chain_owners().all()?;
            return Ok(encode_returns!(ArbOwner::getAllChainOwnersCall, owners));
        }
        ArbOwner::setNativeTokenManagementFromCall::SELECTOR => {
            let call = decode_call!(ArbOwner::setNativeTokenManagementFromCall, input);
            let mut state = ctx.arb_state();
            if call.timestamp != 0 {
                let stored = state.native_token_enabled_time().get()?;
                let earliest = now.saturating_add(NATIVE_TOKEN_ENABLE_DELAY);
                if (stored == 0 || stored > earliest) && call.timestamp < earliest {
                    return Err(PrecompileError::business(
                        "native token feature must be enabled at least 7 days in the future",
                    ));
                }
                if stored > now && stored <= earliest && call.timestamp < stored {
                    return Err(PrecompileError::business(
                        "native token feature cannot be updated to a time earlier than the current time at which it is scheduled to be enabled",
                    ));
                }
            }
            state.native_token_enabled_time().set(call.timestamp)?;
        }
        ArbOwner::addNativeTokenOwnerCall::SELECTOR => {
            let call = decode_call!(ArbOwner::addNativeTokenOwnerCall, input);
            let mut state = ctx.arb_state();
            let enabled_from = state.native_token_enabled_time().get()?;
            if enabled_from == 0 || enabled_from > now {
                return Err(PrecompileError::business("native token feature is not enabled yet"));
            }
            state.native_token_owners().add(call.newOwner)?;
        }
        ArbOwner::removeNativeTokenOwnerCall::SELECTOR => {
            let call = decode_call!(ArbOwner::removeNativeTokenOwnerCall, input);
            let mut state = ctx.arb_state();
            if !state.is_native_token_owner(call.ownerToRemove)? {
                return Err(PrecompileError::business(
                    "Tried to remove non native token owner",
                ));
            }
            state
                .native_token_owners()
                .remove(call.ownerToRemove, version)?;
        }
        ArbOwner::isNativeTokenOwnerCall::SELECTOR => {
            let call = decode_call!(ArbOwner::isNativeTokenOwnerCall, input);
            let is_owner = ctx.arb_state().is_native_token_owner(call.addr)?;
            return Ok(encode_returns!(ArbOwner::isNativeTokenOwnerCall, is_owner));
        }
        ArbOwner::getAllNativeTokenOwnersCall::SELECTOR => {
            let owners = ctx.arb_state().native_token_owners().all()?;
            return Ok(encode_returns!(ArbOwner::getAllNativeTokenOwnersCall, owners));
        }
        ArbOwner::setL1BaseFeeEstimateInertiaCall::SELECTOR => {
            let call = decode_call!(ArbOwner::setL1BaseFeeEstimateInertiaCall, input);
            ctx.arb_state().l1_pricing().inertia().set(call.inertia)?;
        }
        ArbOwner::setL2BaseFeeCall::SELECTOR => {
            let call = decode_call!(ArbOwner::setL2BaseFeeCall, input);
            ctx.arb_state().l2_pricing().base_fee_wei().set(call.priceInWei)?;
        }
        ArbOwner::setMinimumL2BaseFeeCall::SELECTOR => {
            let call = decode_call!(ArbOwner::setMinimumL2BaseFeeCall, input);
            ctx.arb_state()
                .l2_pricing()
                .min_base_fee_wei()
                .set(call.priceInWei)?;
        }
        ArbOwner::setSpeedLimitCall::SELECTOR => {
            let call = decode_call!(ArbOwner::setSpeedLimitCall, input);
            if call.limit == 0 {
                return Err(PrecompileError::business("speed limit must be nonzero"));
            }
            ctx.arb_state()
                .l2_pricing()
                .speed_limit_per_second()
                .set(call.limit)?;
        }
        ArbOwner::setMaxTxGasLimitCall::SELECTOR => {
            let call = decode_call!(ArbOwner::setMaxTxGasLimitCall, input);
            let mut state = ctx.arb_state();
            let mut l2_pricing = state.l2_pricing();
            // From v50 blocks and transactions have separate limits.
            if version < ARBOS_VERSION_50 {
                l2_pricing.per_block_gas_limit().set(call.limit)?;
            } else {
                l2_pricing.per_tx_gas_limit().set(call.limit)?;
            }
        }
        ArbOwner::setMaxBlockGasLimitCall::SELECTOR => {
            let call = decode_call!(ArbOwner::setMaxBlockGasLimitCall, input);
            ctx.arb_state()
                .l2_pricing()
                .per_block_gas_limit()
                .set(call.limit)?;
        }
        ArbOwner::setL2GasPricingInertiaCall::SELECTOR => {
            let call = decode_call!(ArbOwner::setL2GasPricingInertiaCall, input);
            if call.sec == 0 {
                return Err(PrecompileError::business("price inertia must be nonzero"));
            }
            ctx.arb_state().l2_pricing().pricing_inertia().set(call.sec)?;
        }
        ArbOwner::setL2GasBacklogToleranceCall::SELECTOR => {
            let call = decode_call!(ArbOwner::setL2GasBacklogToleranceCall, input);
            ctx.arb_state()
                .l2_pricing()
                .backlog_tolerance()
                .set(call.sec)?;
        }
        ArbOwner::getNetworkFeeAccountCall::SELECTOR => {
            let account = ctx.arb_state().network_fee_account().get()?;
            return Ok(encode_returns!(ArbOwner::getNetworkFeeAccountCall, account));
        }
        ArbOwner::getInfraFeeAccountCall::SELECTOR => {
            let mut state = ctx.arb_state();
            let account = if version < ARBOS_VERSION_6 {
                state.network_fee_account().get()?
            } else {
                state.infra_fee_account().get()?
            };
            return Ok(encode_returns!(ArbOwner::getInfraFeeAccountCall, account));
        }
        ArbOwner::setNetworkFeeAccountCall::SELECTOR => {
            let call = decode_call!(ArbOwner::setNetworkFeeAccountCall, input);
            ctx.arb_state()
                .network_fee_account()
                .set(call.newNetworkFeeAccount)?;
        }
        ArbOwner::setInfraFeeAccountCall::SELECTOR => {
            let call = decode_call!(ArbOwner::setInfraFeeAccountCall, input);
            ctx.arb_state()
                .infra_fee_account()
                .set(call.newInfraFeeAccount)?;
        }
        ArbOwner::scheduleArbOSUpgradeCall::SELECTOR => {
            let call = decode_call!(ArbOwner::scheduleArbOSUpgradeCall, input);
            ctx.arb_state()
                .schedule_upgrade(call.newVersion, call.timestamp)?;
            info!(
                target: "arbos-precompiles::owner",
                version = call.newVersion,
                timestamp = call.timestamp,
                "scheduled ArbOS upgrade"
            );
        }
        ArbOwner::setL1PricingEquilibrationUnitsCall::SELECTOR => {
            let call = decode_call!(ArbOwner::setL1PricingEquilibrationUnitsCall, input);
            ctx.arb_state()
                .l1_pricing()
                .equilibration_units()
                .set(call.equilibrationUnits)?;
        }
        ArbOwner::setL1PricingInertiaCall::SELECTOR => {
            let call = decode_call!(ArbOwner::setL1PricingInertiaCall, input);
            ctx.arb_state().l1_pricing().inertia().set(call.inertia)?;
        }
        ArbOwner::setL1PricingRewardRecipientCall::SELECTOR => {
            let call = decode_call!(ArbOwner::setL1PricingRewardRecipientCall, input);
            ctx.arb_state()
                .l1_pricing()
                .reward_recipient()
                .set(call.recipient)?;
        }
        ArbOwner::setL1PricingRewardRateCall::SELECTOR => {
            let call = decode_call!(ArbOwner::setL1PricingRewardRateCall, input);
            ctx.arb_state()
                .l1_pricing()
                .per_unit_reward()
                .set(call.weiPerUnit)?;
        }
        ArbOwner::setL1PricePerUnitCall::SELECTOR => {
            let call = decode_call!(ArbOwner::setL1PricePerUnitCall, input);
            ctx.arb_state()
                .l1_pricing()
                .price_per_unit()
                .set(call.pricePerUnit)?;
        }
        ArbOwner::setPerBatchGasChargeCall::SELECTOR => {
            let call = decode_call!(ArbOwner::setPerBatchGasChargeCall, input);
            // Stored as the two's complement bit pattern.
            ctx.arb_state()
                .l1_pricing()
                .per_batch_gas_cost()
                .set(call.cost as u64)?;
        }
        ArbOwner::setBrotliCompressionLevelCall::SELECTOR => {
            let call = decode_call!(ArbOwner::setBrotliCompressionLevelCall, input);
            if call.level > MAX_BROTLI_COMPRESSION_LEVEL {
                return Err(PrecompileError::business(
                    "invalid brotli compression level",
                ));
            }
            ctx.arb_state().brotli_compression_level().set(call.level)?;
        }
        ArbOwner::setAmortizedCostCapBipsCall::SELECTOR => {
            let call = decode_call!(ArbOwner::setAmortizedCostCapBipsCall, input);
            ctx.arb_state()
                .l1_pricing()
                .amortized_cost_cap_bips()
                .set(call.cap)?;
        }
        ArbOwner::releaseL1PricerSurplusFundsCall::SELECTOR => {
            let call = decode_call!(ArbOwner::releaseL1PricerSurplusFundsCall, input);
            let pool_balance = ctx.world().balance(ARBOS_L1_PRICER_FUNDS_ADDRESS)?;
            let released = ctx
                .arb_state()
                .l1_pricing()
                .release_surplus_funds(pool_balance, call.maxWeiToRelease)?;
            return Ok(encode_returns!(
                ArbOwner::releaseL1PricerSurplusFundsCall,
                released
            ));
        }
        ArbOwner::setCalldataPriceIncreaseCall::SELECTOR => {
            let call = decode_call!(ArbOwner::setCalldataPriceIncreaseCall, input);
            ctx.arb_state().set_calldata_price_increase(call.enable)?;
        }
        ArbOwner::setParentGasFloorPerTokenCall::SELECTOR => {
            let call = decode_call!(ArbOwner::setParentGasFloorPerTokenCall, input);
            ctx.arb_state()
                .l1_pricing()
                .parent_gas_floor_per_token()
                .set(call.floorPerToken)?;
        }
        ArbOwner::addWasmCacheManagerCall::SELECTOR => {
            let call = decode_call!(ArbOwner::addWasmCacheManagerCall, input);
            ctx.arb_state()
                .programs()
                .cache_managers()
                .add(call.manager)?;
            info!(target: "arbos-precompiles::owner", manager = %call.manager, "added wasm cache manager");
        }
        ArbOwner::removeWasmCacheManagerCall::SELECTOR => {
            let call = decode_call!(ArbOwner::removeWasmCacheManagerCall, input);
            let mut state = ctx.arb_state();
            let mut programs = state.programs();
            let mut managers = programs.cache_managers();
            if !managers.contains(call.manager)? {
                return Err(PrecompileError::business("Tried to remove non-manager"));
            }
            managers.remove(call.manager, version)?;
            info!(target: "arbos-precompiles::owner", manager = %call.manager, "removed wasm cache manager");
        }
        _ => return Err(PrecompileError::MalformedInput),
    }
    Ok(Bytes::new())
}
