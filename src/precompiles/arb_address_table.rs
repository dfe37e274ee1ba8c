use alloy_sol_types::{SolCall, sol};
use revm::primitives::{Bytes, U256};

use crate::{
    context::ExecutionContext,
    macros::{decode_call, encode_returns, selector_table},
    precompiles::SelectorTable,
    result::PrecompileError,
    world_state::WorldState,
};

sol! {
///
/// @title Allows registering / retrieving addresses at uint indices, saving calldata.
/// @notice Precompiled contract that exists in every Arbitrum chain at 0x0000000000000000000000000000000000000066.
///
interface ArbAddressTable {
    ///
    /// @notice Check whether an address exists in the address table
    /// @param addr address to check for presence in table
    /// @return true if address is in table
    ///
    function addressExists(
        address addr
    ) external view returns (bool);

    ///
    /// @notice compress an address and return the result
    /// @param addr address to compress
    /// @return compressed address bytes
    ///
    function compress(
        address addr
    ) external returns (bytes memory);

    ///
    /// @notice read a compressed address from a bytes buffer
    /// @param buf bytes buffer containing an address
    /// @param offset offset of target address
    /// @return resulting address and updated offset into the buffer (revert if buffer is too short)
    ///
    function decompress(
        bytes calldata buf,
        uint256 offset
    ) external view returns (address, uint256);

    ///
    /// @param addr address to lookup
    /// @return index of an address in the address table (revert if address isn't in the table)
    ///
    function lookup(
        address addr
    ) external view returns (uint256);

    ///
    /// @param index index to lookup address
    /// @return address at a given index in address table (revert if index is beyond end of table)
    ///
    function lookupIndex(
        uint256 index
    ) external view returns (address);

    ///
    /// @notice Register an address in the address table
    /// @param addr address to register
    /// @return index of the address (existing index, or newly created index if not already registered)
    ///
    function register(
        address addr
    ) external returns (uint256);

    ///
    /// @return size of address table (= first unused index)
    ///
    function size() external view returns (uint256);
}

}

lazy_static::lazy_static! {
    static ref SELECTORS: SelectorTable = selector_table! {
        ArbAddressTable => {
            addressExistsCall(View),
            compressCall(NonPayable),
            decompressCall(View),
            lookupCall(View),
            lookupIndexCall(View),
            registerCall(NonPayable),
            sizeCall(View),
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
        ArbAddressTable::addressExistsCall::SELECTOR => {
            let call = decode_call!(ArbAddressTable::addressExistsCall, input);
            let exists = ctx.arb_state().address_table().address_exists(call.addr)?;
            Ok(encode_returns!(ArbAddressTable::addressExistsCall, exists))
        }
        ArbAddressTable::compressCall::SELECTOR => {
            let call = decode_call!(ArbAddressTable::compressCall, input);
            let compressed = ctx.arb_state().address_table().compress(call.addr)?;
            Ok(encode_returns!(ArbAddressTable::compressCall, compressed))
        }
        ArbAddressTable::decompressCall::SELECTOR => {
            let call = decode_call!(ArbAddressTable::decompressCall, input);
            let offset = usize::try_from(call.offset)
                .ok()
                .filter(|offset| *offset <= call.buf.len())
                .ok_or_else(|| {
                    PrecompileError::business("invalid offset in ArbAddressTable.Decompress")
                })?;

            let (address, consumed) = ctx
                .arb_state()
                .address_table()
                .decompress(&call.buf[offset..])?;
            Ok(encode_returns!(
                ArbAddressTable::decompressCall,
                ArbAddressTable::decompressReturn::from((address, U256::from(consumed)))
            ))
        }
        ArbAddressTable::lookupCall::SELECTOR => {
            let call = decode_call!(ArbAddressTable::lookupCall, input);
            let index = ctx
                .arb_state()
                .address_table()
                .lookup(call.addr)?
                .ok_or_else(|| PrecompileError::business("Address does not exist in AddressTable"))?;
            Ok(encode_returns!(ArbAddressTable::lookupCall, U256::from(index)))
        }
        ArbAddressTable::lookupIndexCall::SELECTOR => {
            let call = decode_call!(ArbAddressTable::lookupIndexCall, input);
            let not_found = || PrecompileError::business("index does not exist in AddressTable");
            let index = u64::try_from(call.index).map_err(|_| not_found())?;
            let address = ctx
                .arb_state()
                .address_table()
                .lookup_index(index)?
                .ok_or_else(not_found)?;
            Ok(encode_returns!(ArbAddressTable::lookupIndexCall, address))
        }
        ArbAddressTable::registerCall::SELECTOR => {
            let call = decode_call!(ArbAddressTable::registerCall, input);
            let index = ctx.arb_state().address_table().register(call.addr)?;
            Ok(encode_returns!(ArbAddressTable::registerCall, U256::from(index)))
        }
        ArbAddressTable::sizeCall::SELECTOR => {
            let size = ctx.arb_state().address_table().size()?;
            Ok(encode_returns!(ArbAddressTable::sizeCall, U256::from(size)))
        }
        _ => Err(PrecompileError::MalformedInput),
    }
}
