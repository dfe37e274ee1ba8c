use alloy_sol_types::{SolCall, sol};
use revm::{
    interpreter::gas::{COPY, ISTANBUL_SLOAD_GAS, SSTORE_SET, log_cost},
    primitives::{Address, B256, Bytes, U256},
};
use tracing::debug;

use crate::{
    constants::{ARBOS_VERSION_3, RETRYABLE_LIFETIME_SECONDS, TX_GAS},
    context::ExecutionContext,
    macros::{decode_call, encode_returns, selector_table},
    precompiles::SelectorTable,
    result::PrecompileError,
    state::ArbosStateError,
    world_state::WorldState,
};

sol! {
///
/// @title Methods for managing retryables.
/// @notice Precompiled contract in every Arbitrum chain for retryable transaction related data retrieval and interactions. Exists at 0x000000000000000000000000000000000000006e
///
interface ArbRetryableTx {
    ///
    /// @notice Schedule an attempt to redeem a redeemable tx, donating all of the call's gas to the redeem.
    /// Revert if ticketId does not exist.
    /// @param ticketId unique identifier of retryable message: keccak256(keccak256(ArbchainId, inbox-sequence-number), uint(0) )
    /// @return txId that the redeem attempt will have
    ///
    function redeem(
        bytes32 ticketId
    ) external returns (bytes32);

    ///
    /// @notice Return the minimum lifetime of redeemable txn.
    /// @return lifetime in seconds
    ///
    function getLifetime() external view returns (uint256);

    ///
    /// @notice Return the timestamp when ticketId will age out, reverting if it does not exist
    /// @param ticketId unique ticket identifier
    /// @return timestamp for ticket's deadline
    ///
    function getTimeout(
        bytes32 ticketId
    ) external view returns (uint256);

    ///
    /// @notice Adds one lifetime period to the life of ticketId.
    /// Donate gas to pay for the lifetime extension.
    /// If successful, emits LifetimeExtended event.
    /// Revert if ticketId does not exist, or if the timeout of ticketId is already at least one lifetime period in the future.
    /// @param ticketId unique ticket identifier
    /// @return new timeout of ticketId
    ///
    function keepalive(
        bytes32 ticketId
    ) external returns (uint256);

    ///
    /// @notice Return the beneficiary of ticketId.
    /// Revert if ticketId doesn't exist.
    /// @param ticketId unique ticket identifier
    /// @return address of beneficiary for ticket
    ///
    function getBeneficiary(
        bytes32 ticketId
    ) external view returns (address);

    ///
    /// @notice Cancel ticketId and refund its callvalue to its beneficiary.
    /// Revert if ticketId doesn't exist, or if called by anyone other than ticketId's beneficiary.
    /// @param ticketId unique ticket identifier
    ///
    function cancel(
        bytes32 ticketId
    ) external;

    ///
    /// @notice Gets the redeemer of the current retryable redeem attempt.
    /// Returns the zero address if the current transaction is not a retryable redeem attempt.
    /// If this is an auto-redeem, returns the fee refund address of the retryable.
    ///
    function getCurrentRedeemer() external view returns (address);

    ///
    /// @notice Do not call. This method represents a retryable submission to aid explorers.
    /// Calling it will always revert.
    ///
    function submitRetryable(
        bytes32 requestId,
        uint256 l1BaseFee,
        uint256 deposit,
        uint256 callvalue,
        uint256 gasFeeCap,
        uint64 gasLimit,
        uint256 maxSubmissionFee,
        address feeRefundAddress,
        address beneficiary,
        address retryTo,
        bytes calldata retryData
    ) external;

    event TicketCreated(bytes32 indexed ticketId);
    event LifetimeExtended(bytes32 indexed ticketId, uint256 newTimeout);
    event RedeemScheduled(
        bytes32 indexed ticketId,
        bytes32 indexed retryTxHash,
        uint64 indexed sequenceNum,
        uint64 donatedGas,
        address gasDonor,
        uint256 maxRefund,
        uint256 submissionFeeRefund
    );
    event Canceled(bytes32 indexed ticketId);

    /// @dev DEPRECATED in favour of new RedeemScheduled event after the nitro upgrade
    event Redeemed(bytes32 indexed userTxHash);

    error NoTicketWithID();
    error NotCallable();
}

}

lazy_static::lazy_static! {
    static ref SELECTORS: SelectorTable = selector_table! {
        ArbRetryableTx => {
            redeemCall(NonPayable),
            getLifetimeCall(View),
            getTimeoutCall(View),
            keepaliveCall(NonPayable),
            getBeneficiaryCall(View),
            cancelCall(NonPayable),
            getCurrentRedeemerCall(View),
            submitRetryableCall(NonPayable),
        }
    };
}

pub(crate) fn selector_table() -> &'static SelectorTable {
    &SELECTORS
}

fn no_ticket(arbos_version: u64) -> PrecompileError {
    if arbos_version >= ARBOS_VERSION_3 {
        PrecompileError::solidity(ArbRetryableTx::NoTicketWithID {})
    } else {
        PrecompileError::business("ticketId not found")
    }
}

fn not_self<W: WorldState>(
    ctx: &ExecutionContext<'_, W>,
    ticket_id: B256,
) -> Result<(), PrecompileError> {
    if ctx.current_retryable == Some(ticket_id) {
        return Err(PrecompileError::business("retryable cannot modify itself"));
    }
    Ok(())
}

/// Gas the redeem handler must keep back after donating: the `RedeemScheduled` log, the
/// 32-byte result, and the backlog update.
fn redeem_reserved_gas() -> u64 {
    // 4 topics, 4 data words
    let event_cost = log_cost(4, 4 * 32).unwrap_or(u64::MAX);
    event_cost
        .saturating_add(COPY)
        .saturating_add(ISTANBUL_SLOAD_GAS)
        .saturating_add(SSTORE_SET)
}

pub(crate) fn call<W: WorldState>(
    ctx: &mut ExecutionContext<'_, W>,
    selector: [u8; 4],
    input: &[u8],
) -> Result<Bytes, PrecompileError> {
    let version = ctx.arbos_version();
    let now = ctx.block.timestamp;

    match selector {
        ArbRetryableTx::redeemCall::SELECTOR => {
            let call = decode_call!(ArbRetryableTx::redeemCall, input);
            let ticket_id = call.ticketId;
            not_self(ctx, ticket_id)?;

            let size = ctx.arb_state().retryables().size_bytes(ticket_id, now)?;
            ctx.burn(ISTANBUL_SLOAD_GAS.saturating_mul(size.div_ceil(32)))?;

            let chain_id = U256::from(ctx.config.chain_id);
            let gas_fee_cap = ctx.block.basefee;
            let caller = ctx.caller;
            let (nonce, mut retry_tx) = {
                let mut state = ctx.arb_state();
                let mut retryables = state.retryables();
                let mut retryable = retryables
                    .open(ticket_id, now)?
                    .ok_or_else(|| no_ticket(version))?;
                let nonce = retryable.num_tries().get()?;
                retryable.num_tries().increment()?;
                let tx = retryable.make_tx(
                    chain_id,
                    nonce,
                    gas_fee_cap,
                    0,
                    caller,
                    U256::MAX,
                    U256::ZERO,
                )?;
                (nonce, tx)
            };

            let reserved = redeem_reserved_gas();
            if ctx.gas_left() < reserved {
                return Err(PrecompileError::OutOfGas);
            }
            let donated = ctx.gas_left() - reserved;
            if donated < TX_GAS {
                return Err(PrecompileError::business(
                    "Not enough gas to run redeem attempt",
                ));
            }
            retry_tx.gas = donated;
            let retry_tx_hash = retry_tx.hash();

            ctx.emit_log(&ArbRetryableTx::RedeemScheduled {
                ticketId: ticket_id,
                retryTxHash: retry_tx_hash,
                sequenceNum: nonce,
                donatedGas: donated,
                gasDonor: caller,
                maxRefund: retry_tx.max_refund,
                submissionFeeRefund: retry_tx.submission_fee_refund,
            })?;

            // The donation is spent by the retry transaction, so it leaves the gas pool here.
            ctx.burn(donated)?;
            ctx.arb_state().l2_pricing().shrink_backlog(donated)?;

            debug!(
                target: "arbos-precompiles::retryable",
                id = %ticket_id,
                retry_tx = %retry_tx_hash,
                nonce,
                donated,
                "scheduled redeem"
            );
            Ok(encode_returns!(ArbRetryableTx::redeemCall, retry_tx_hash))
        }
        ArbRetryableTx::getLifetimeCall::SELECTOR => Ok(encode_returns!(
            ArbRetryableTx::getLifetimeCall,
            U256::from(RETRYABLE_LIFETIME_SECONDS)
        )),
        ArbRetryableTx::getTimeoutCall::SELECTOR => {
            let call = decode_call!(ArbRetryableTx::getTimeoutCall, input);
            let mut state = ctx.arb_state();
            let mut retryables = state.retryables();
            let mut retryable = retryables
                .open(call.ticketId, now)?
                .ok_or_else(|| no_ticket(version))?;
            let timeout = retryable.effective_timeout()?;
            Ok(encode_returns!(
                ArbRetryableTx::getTimeoutCall,
                U256::from(timeout)
            ))
        }
        ArbRetryableTx::keepaliveCall::SELECTOR => {
            let call = decode_call!(ArbRetryableTx::keepaliveCall, input);
            let ticket_id = call.ticketId;

            let size = ctx.arb_state().retryables().size_bytes(ticket_id, now)?;
            if size == 0 {
                return Err(no_ticket(version));
            }
            ctx.burn(size.div_ceil(32).saturating_mul(SSTORE_SET) / 100)?;

            let limit = now.saturating_add(RETRYABLE_LIFETIME_SECONDS);
            let new_timeout = match ctx.arb_state().retryables().keepalive(ticket_id, now, limit) {
                Ok(timeout) => timeout,
                Err(ArbosStateError::RetryableNotFound(_)) => return Err(no_ticket(version)),
                Err(err) => return Err(err.into()),
            };

            ctx.emit_log(&ArbRetryableTx::LifetimeExtended {
                ticketId: ticket_id,
                newTimeout: U256::from(new_timeout),
            })?;
            Ok(encode_returns!(
                ArbRetryableTx::keepaliveCall,
                U256::from(new_timeout)
            ))
        }
        ArbRetryableTx::getBeneficiaryCall::SELECTOR => {
            let call = decode_call!(ArbRetryableTx::getBeneficiaryCall, input);
            let mut state = ctx.arb_state();
            let mut retryables = state.retryables();
            let mut retryable = retryables
                .open(call.ticketId, now)?
                .ok_or_else(|| no_ticket(version))?;
            let beneficiary = retryable.beneficiary().get()?;
            Ok(encode_returns!(ArbRetryableTx::getBeneficiaryCall, beneficiary))
        }
        ArbRetryableTx::cancelCall::SELECTOR => {
            let call = decode_call!(ArbRetryableTx::cancelCall, input);
            let ticket_id = call.ticketId;
            not_self(ctx, ticket_id)?;

            let caller = ctx.caller;
            let mut state = ctx.arb_state();
            let mut retryables = state.retryables();
            let beneficiary = retryables
                .open(ticket_id, now)?
                .ok_or_else(|| no_ticket(version))?
                .beneficiary()
                .get()?;
            if caller != beneficiary {
                return Err(PrecompileError::business(
                    "only the beneficiary may cancel a retryable",
                ));
            }

            // Moves any escrowed call value back to the beneficiary.
            retryables.delete(ticket_id)?;
            ctx.emit_log(&ArbRetryableTx::Canceled {
                ticketId: ticket_id,
            })?;
            Ok(Bytes::new())
        }
        ArbRetryableTx::getCurrentRedeemerCall::SELECTOR => {
            let redeemer = ctx.current_refund_to.unwrap_or(Address::ZERO);
            Ok(encode_returns!(ArbRetryableTx::getCurrentRedeemerCall, redeemer))
        }
        ArbRetryableTx::submitRetryableCall::SELECTOR => {
            decode_call!(ArbRetryableTx::submitRetryableCall, input);
            Err(PrecompileError::solidity(ArbRetryableTx::NotCallable {}))
        }
        _ => Err(PrecompileError::MalformedInput),
    }
}
