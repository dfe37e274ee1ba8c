use alloy_sol_types::{SolCall, sol};
use revm::primitives::{Address, Bytes, U256};

use crate::{
    constants::{
        ADDRESS_ALIAS_OFFSET, ARBITRUM_CONTRACT_TX_TYPE, ARBITRUM_RETRY_TX_TYPE,
        ARBITRUM_UNSIGNED_TX_TYPE, ARBOS_VERSION_6, ARBOS_VERSION_REPORTING_OFFSET,
    },
    context::ExecutionContext,
    macros::{decode_call, encode_returns, selector_table},
    precompiles::SelectorTable,
    result::PrecompileError,
    world_state::WorldState,
};

sol! {
///
/// @title System level functionality
/// @notice For use by contracts to interact with core L2-specific functionality.
/// Precompiled contract that exists in every Arbitrum chain at address(100), 0x0000000000000000000000000000000000000064.
///
interface ArbSys {
    ///
    /// @notice Get Arbitrum block number (distinct from L1 block number; Arbitrum genesis block has block number 0)
    /// @return block number as int
    ///
    function arbBlockNumber() external view returns (uint256);

    ///
    /// @notice Gets the rollup's unique chain identifier
    /// @return Chain identifier as int
    ///
    function arbChainID() external view returns (uint256);

    ///
    /// @notice Get internal version number identifying an ArbOS build, this is `55 + nitroArbOS version number`
    /// e.g. on ArbOS 31 this would return 86. This is the only function that have the 55 offset.
    /// @return version number as int
    ///
    function arbOSVersion() external view returns (uint256);

    ///
    /// @notice Returns 0 since Nitro has no concept of storage gas
    /// @return uint 0
    ///
    function getStorageGasAvailable() external view returns (uint256);

    ///
    /// @notice (deprecated) check if current call is top level (meaning it was triggered by an EoA or a L1 contract)
    /// @dev this call has been deprecated and may be removed in a future release
    /// @return true if current execution frame is not a call by another L2 contract
    ///
    function isTopLevelCall() external view returns (bool);

    ///
    /// @notice map L1 sender contract address to its L2 alias
    /// @param sender sender address
    /// @param unused argument no longer used
    /// @return aliased sender address
    ///
    function mapL1SenderContractAddressToL2Alias(
        address sender,
        address unused
    ) external pure returns (address);

    ///
    /// @notice check if the caller (of this caller of this) is an aliased L1 contract address
    /// @return true iff the caller's address is an alias for an L1 contract address
    ///
    function wasMyCallersAddressAliased() external view returns (bool);

    ///
    /// @notice return the address of the caller (of this caller of this), without applying L1 contract address aliasing
    /// @return address of the caller's caller, without applying L1 contract address aliasing
    ///
    function myCallersAddressWithoutAliasing() external view returns (address);
}
}

lazy_static::lazy_static! {
    static ref SELECTORS: SelectorTable = selector_table! {
        ArbSys => {
            arbBlockNumberCall(View),
            arbChainIDCall(View),
            arbOSVersionCall(View),
            getStorageGasAvailableCall(View),
            isTopLevelCallCall(View),
            mapL1SenderContractAddressToL2AliasCall(Pure),
            wasMyCallersAddressAliasedCall(View),
            myCallersAddressWithoutAliasingCall(View),
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
        ArbSys::arbBlockNumberCall::SELECTOR => Ok(encode_returns!(
            ArbSys::arbBlockNumberCall,
            U256::from(ctx.block.number)
        )),
        ArbSys::arbChainIDCall::SELECTOR => Ok(encode_returns!(
            ArbSys::arbChainIDCall,
            U256::from(ctx.config.chain_id)
        )),
        ArbSys::arbOSVersionCall::SELECTOR => Ok(encode_returns!(
            ArbSys::arbOSVersionCall,
            U256::from(ctx.arbos_version() + ARBOS_VERSION_REPORTING_OFFSET)
        )),
        ArbSys::getStorageGasAvailableCall::SELECTOR => Ok(encode_returns!(
            ArbSys::getStorageGasAvailableCall,
            U256::ZERO
        )),
        ArbSys::isTopLevelCallCall::SELECTOR => Ok(encode_returns!(
            ArbSys::isTopLevelCallCall,
            ctx.call_depth <= 1
        )),
        ArbSys::mapL1SenderContractAddressToL2AliasCall::SELECTOR => {
            let call = decode_call!(ArbSys::mapL1SenderContractAddressToL2AliasCall, input);
            Ok(encode_returns!(
                ArbSys::mapL1SenderContractAddressToL2AliasCall,
                remap_l1_address(call.sender)
            ))
        }
        ArbSys::wasMyCallersAddressAliasedCall::SELECTOR => Ok(encode_returns!(
            ArbSys::wasMyCallersAddressAliasedCall,
            was_callers_address_aliased(ctx)
        )),
        ArbSys::myCallersAddressWithoutAliasingCall::SELECTOR => {
            let mut address = ctx.grand_caller.unwrap_or_default();
            if was_callers_address_aliased(ctx) {
                address = inverse_remap_l1_address(address);
            }
            Ok(encode_returns!(
                ArbSys::myCallersAddressWithoutAliasingCall,
                address
            ))
        }
        _ => Err(PrecompileError::MalformedInput),
    }
}

fn is_top_level<W>(ctx: &ExecutionContext<'_, W>) -> bool {
    ctx.call_depth == 0 || ctx.grand_caller == Some(ctx.origin)
}

fn was_callers_address_aliased<W: WorldState>(ctx: &ExecutionContext<'_, W>) -> bool {
    let top_level = if ctx.arbos_version() < ARBOS_VERSION_6 {
        ctx.call_depth == 1
    } else {
        is_top_level(ctx)
    };
    top_level && tx_type_aliases(ctx.tx_type)
}

/// Transactions whose sender is an L1 contract arrive with the aliased address.
fn tx_type_aliases(tx_type: u8) -> bool {
    matches!(
        tx_type,
        ARBITRUM_UNSIGNED_TX_TYPE | ARBITRUM_CONTRACT_TX_TYPE | ARBITRUM_RETRY_TX_TYPE
    )
}

fn offset_word() -> U256 {
    U256::from_be_slice(ADDRESS_ALIAS_OFFSET.as_slice())
}

fn low_address(word: U256) -> Address {
    Address::from_slice(&word.to_be_bytes::<32>()[12..])
}

/// L2 alias of an L1 contract address: the address plus the alias offset, mod 2^160.
pub fn remap_l1_address(l1_address: Address) -> Address {
    low_address(U256::from_be_slice(l1_address.as_slice()).wrapping_add(offset_word()))
}

pub fn inverse_remap_l1_address(l2_address: Address) -> Address {
    low_address(U256::from_be_slice(l2_address.as_slice()).wrapping_sub(offset_word()))
}

#[cfg(test)]
mod tests {
    use revm::primitives::address;

    use super::*;

    #[test]
    fn alias_wraps_at_160_bits() {
        let l1 = address!("0xffffffffffffffffffffffffffffffffffffffff");
        assert_eq!(
            remap_l1_address(l1),
            address!("0x1111000000000000000000000000000000001110")
        );
        assert_eq!(inverse_remap_l1_address(remap_l1_address(l1)), l1);
        assert_eq!(remap_l1_address(Address::ZERO), ADDRESS_ALIAS_OFFSET);
    }
}
