use alloy_sol_types::{SolCall, sol};
use revm::primitives::Bytes;

use crate::{
    constants::{ARBOS_VERSION_5, ARBOS_VERSION_6, ARBOS_VERSION_11, ARBOS_VERSION_20, ARBOS_VERSION_40, ARBOS_VERSION_41, ARBOS_VERSION_50},
    context::ExecutionContext,
    macros::{decode_call, encode_returns, selector_table},
    precompiles::SelectorTable,
    result::PrecompileError,
    world_state::WorldState,
};

sol! {

/// @title Provides non-owners with info about the current chain owners.
/// @notice Precompiled contract that exists in every Arbitrum chain at 0x000000000000000000000000000000000000006b.
interface ArbOwnerPublic {
    /// @notice See if the user is a chain owner
    function isChainOwner(
        address addr
    ) external view returns (bool);

    ///
    /// @notice Rectify the list of chain owners
    /// If successful, emits ChainOwnerRectified event
    /// Available in ArbOS version 11
    ///
    function rectifyChainOwner(
        address ownerToRectify
    ) external;

    /// @notice Retrieves the list of chain owners
    function getAllChainOwners() external view returns (address[] memory);

    /// @notice See if the user is a native token owner
    /// Available in ArbOS version 41
    function isNativeTokenOwner(
        address addr
    ) external view returns (bool);

    /// @notice Retrieves the list of native token owners
    /// Available in ArbOS version 41
    function getAllNativeTokenOwners() external view returns (address[] memory);

    /// @notice Gets the network fee collector
    function getNetworkFeeAccount() external view returns (address);

    /// @notice Get the infrastructure fee collector
    function getInfraFeeAccount() external view returns (address);

    /// @notice Get the Brotli compression level used for fast compression
    function getBrotliCompressionLevel() external view returns (uint64);

    /// @notice Get the next scheduled ArbOS version upgrade and its activation timestamp.
    /// Returns (0, 0) if no ArbOS upgrade is scheduled.
    /// Available in ArbOS version 20.
    function getScheduledUpgrade()
        external
        view
        returns (uint64 arbosVersion, uint64 scheduledForTimestamp);

    ///
    /// @notice Checks if the increased calldata price feature (EIP-7623) is enabled
    /// Available in ArbOS version 40 with default as false
    ///
    function isCalldataPriceIncreaseEnabled() external view returns (bool);

    /// @notice Get the time from which native token management may be enabled
    /// Available in ArbOS version 41
    function getNativeTokenManagementFrom() external view returns (uint64);

    /// @notice Get the L1 gas floor charged per native token
    /// Available in ArbOS version 50
    function getParentGasFloorPerToken() external view returns (uint64);

    event ChainOwnerRectified(address rectifiedOwner);
}

}

lazy_static::lazy_static! {
    static ref SELECTORS: SelectorTable = selector_table! {
        ArbOwnerPublic => {
            isChainOwnerCall(View),
            rectifyChainOwnerCall(NonPayable, min = ARBOS_VERSION_11),
            getAllChainOwnersCall(View),
            isNativeTokenOwnerCall(View, min = ARBOS_VERSION_41),
            getAllNativeTokenOwnersCall(View, min = ARBOS_VERSION_41),
            getNetworkFeeAccountCall(View),
            getInfraFeeAccountCall(View, min = ARBOS_VERSION_5),
            getBrotliCompressionLevelCall(View, min = ARBOS_VERSION_20),
            getScheduledUpgradeCall(View, min = ARBOS_VERSION_20),
            isCalldataPriceIncreaseEnabledCall(View, min = ARBOS_VERSION_40),
            getNativeTokenManagementFromCall(View, min = ARBOS_VERSION_41),
            getParentGasFloorPerTokenCall(View, min = ARBOS_VERSION_50),
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
        ArbOwnerPublic::isChainOwnerCall::SELECTOR => {
            let call = decode_call!(ArbOwnerPublic::isChainOwnerCall, input);
            let is_owner = ctx.arb_state().is_chain_owner(call.addr)?;
            Ok(encode_returns!(ArbOwnerPublic::isChainOwnerCall, is_owner))
        }
        ArbOwnerPublic::rectifyChainOwnerCall::SELECTOR => {
            let call = decode_call!(ArbOwnerPublic::rectifyChainOwnerCall, input);
            ctx.arb_state().chain_owners().rectify(call.ownerToRectify)?;
            ctx.emit_log(&ArbOwnerPublic::ChainOwnerRectified {
                rectifiedOwner: call.ownerToRectify,
            })?;
            Ok(Bytes::new())
        }
        ArbOwnerPublic::getAllChainOwnersCall::SELECTOR => {
            let owners = ctx.arb_state().chain_owners().all()?;
            Ok(encode_returns!(ArbOwnerPublic::getAllChainOwnersCall, owners))
        }
        ArbOwnerPublic::isNativeTokenOwnerCall::SELECTOR => {
            let call = decode_call!(ArbOwnerPublic::isNativeTokenOwnerCall, input);
            let is_owner = ctx.arb_state().is_native_token_owner(call.addr)?;
            Ok(encode_returns!(ArbOwnerPublic::isNativeTokenOwnerCall, is_owner))
        }
        ArbOwnerPublic::getAllNativeTokenOwnersCall::SELECTOR => {
            let owners = ctx.arb_state().native_token_owners().all()?;
            Ok(encode_returns!(ArbOwnerPublic::getAllNativeTokenOwnersCall, owners))
        }
        ArbOwnerPublic::getNetworkFeeAccountCall::SELECTOR => {
            let account = ctx.arb_state().network_fee_account().get()?;
            Ok(encode_returns!(ArbOwnerPublic::getNetworkFeeAccountCall, account))
        }
        ArbOwnerPublic::getInfraFeeAccountCall::SELECTOR => {
            let mut state = ctx.arb_state();
            // Before v6 the infra fee went to the network fee account.
            let account = if state.arbos_version() < ARBOS_VERSION_6 {
                state.network_fee_account().get()?
            } else {
                state.infra_fee_account().get()?
            };
            Ok(encode_returns!(ArbOwnerPublic::getInfraFeeAccountCall, account))
        }
        ArbOwnerPublic::getBrotliCompressionLevelCall::SELECTOR => {
            let level = ctx.arb_state().brotli_compression_level().get()?;
            Ok(encode_returns!(ArbOwnerPublic::getBrotliCompressionLevelCall, level))
        }
        ArbOwnerPublic::getScheduledUpgradeCall::SELECTOR => {
            let (version, timestamp) = ctx.arb_state().scheduled_upgrade()?;
            Ok(encode_returns!(
                ArbOwnerPublic::getScheduledUpgradeCall,
                ArbOwnerPublic::getScheduledUpgradeReturn {
                    arbosVersion: version,
                    scheduledForTimestamp: timestamp,
                }
            ))
        }
        ArbOwnerPublic::isCalldataPriceIncreaseEnabledCall::SELECTOR => {
            let enabled = ctx.arb_state().is_calldata_price_increase_enabled()?;
            Ok(encode_returns!(
                ArbOwnerPublic::isCalldataPriceIncreaseEnabledCall,
                enabled
            ))
        }
        ArbOwnerPublic::getNativeTokenManagementFromCall::SELECTOR => {
            let from = ctx.arb_state().native_token_enabled_time().get()?;
            Ok(encode_returns!(ArbOwnerPublic::getNativeTokenManagementFromCall, from))
        }
        ArbOwnerPublic::getParentGasFloorPerTokenCall::SELECTOR => {
            let floor = ctx.arb_state().l1_pricing().parent_gas_floor_per_token().get()?;
            Ok(encode_returns!(ArbOwnerPublic::getParentGasFloorPerTokenCall, floor))
        }
        _ => Err(PrecompileError::MalformedInput),
    }
}
