/// Decodes `$input` (selector included) as `$call`, failing with
/// [`PrecompileError::MalformedInput`](crate::result::PrecompileError::MalformedInput).
macro_rules! decode_call {
    ($call:path, $input:expr) => {{
        <$call as alloy_sol_types::SolCall>::abi_decode($input)
            .map_err(|_| $crate::result::PrecompileError::MalformedInput)?
    }};
}

pub(crate) use decode_call;

/// ABI-encodes the return value of `$call`.
macro_rules! encode_returns {
    ($call:path, $value:expr) => {{
        revm::primitives::Bytes::from(<$call as alloy_sol_types::SolCall>::abi_encode_returns(
            &$value,
        ))
    }};
}

pub(crate) use encode_returns;

/// Builds a [`SelectorTable`](crate::precompiles::SelectorTable) from a `sol!` interface.
///
/// ```ignore
/// selector_table! {
///     ArbOwnerPublic => {
///         getAllChainOwnersCall(View),
///         rectifyChainOwnerCall(NonPayable, min = ARBOS_VERSION_11),
///     }
/// }
/// ```
macro_rules! selector_table {
    (@min) => { 0 };
    (@min $min:expr) => { $min };
    (@max) => { None };
    (@max $max:expr) => { Some($max) };
    (
        $iface:ident => {
            $(
                $call:ident($mut:ident $(, min = $min:expr)? $(, max = $max:expr)?)
            ),* $(,)?
        }
    ) => {{
        $crate::precompiles::SelectorTable::from_entries([
            $(
                $crate::precompiles::SelectorEntry {
                    selector: <$iface::$call as alloy_sol_types::SolCall>::SELECTOR,
                    signature: <$iface::$call as alloy_sol_types::SolCall>::SIGNATURE,
                    mutability: $crate::precompiles::StateMutability::$mut,
                    min_version: selector_table!(@min $($min)?),
                    max_version: selector_table!(@max $($max)?),
                }
            ),*
        ])
    }};
}

pub(crate) use selector_table;
