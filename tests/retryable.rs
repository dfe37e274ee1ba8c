// Copyright 2024, Offchain Labs, Inc.
// For license information, see https://github.com/OffchainLabs/nitro/blob/master/LICENSE.md

//! Retryable ticket lifecycle through ArbRetryableTx.

use alloy_sol_types::{SolCall, SolError, SolEvent};
use arbos_precompiles::{
    ArbitrumRetryTx, Outcome, WorldState,
    constants::{ARB_RETRYABLE_TX_ADDRESS, RETRYABLE_LIFETIME_SECONDS},
    precompiles::arb_retryable_tx::ArbRetryableTx,
    state::retryable::retryable_escrow_address,
};
use revm::primitives::{Address, B256, Bytes, U256};

mod test_utils;
use test_utils::{
    CHAIN_ID, CallSpec, GENESIS_TIMESTAMP, arb_state, assert_padded_revert, assert_reverted_with,
    create_ticket, setup_world, user,
};

const TIMEOUT: u64 = GENESIS_TIMESTAMP + 1_000;

fn ticket_id() -> B256 {
    B256::repeat_byte(0x77)
}

fn beneficiary() -> Address {
    Address::repeat_byte(0x0b)
}

fn world_with_ticket(version: u64) -> arbos_precompiles::InMemoryWorldState {
    let mut world = setup_world(version);
    create_ticket(&mut world, ticket_id(), TIMEOUT, beneficiary(), U256::from(500));
    world
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn test_lifetime_is_one_week() {
    let mut world = setup_world(30);
    let lifetime = CallSpec::default().call(
        &mut world,
        ARB_RETRYABLE_TX_ADDRESS,
        &ArbRetryableTx::getLifetimeCall {},
    );
    assert_eq!(lifetime, U256::from(604_800));
}

#[test]
fn test_timeout_and_beneficiary() {
    let mut world = world_with_ticket(30);
    let spec = CallSpec::default();

    let timeout = spec.call(
        &mut world,
        ARB_RETRYABLE_TX_ADDRESS,
        &ArbRetryableTx::getTimeoutCall {
            ticketId: ticket_id(),
        },
    );
    assert_eq!(timeout, U256::from(TIMEOUT));

    let owner = spec.call(
        &mut world,
        ARB_RETRYABLE_TX_ADDRESS,
        &ArbRetryableTx::getBeneficiaryCall {
            ticketId: ticket_id(),
        },
    );
    assert_eq!(owner, beneficiary());
}

#[test]
fn test_expired_ticket_is_not_found() {
    let mut world = world_with_ticket(30);
    let output = CallSpec::default().at_time(TIMEOUT + 1).run(
        &mut world,
        ARB_RETRYABLE_TX_ADDRESS,
        ArbRetryableTx::getTimeoutCall {
            ticketId: ticket_id(),
        }
        .abi_encode(),
    );

    assert_eq!(
        output.outcome,
        Outcome::SolidityError {
            selector: ArbRetryableTx::NoTicketWithID::SELECTOR,
            args: Bytes::new(),
        }
    );
    assert!(output.gas_left > 0);
}

#[test]
fn test_missing_ticket_before_v3_burns_all_gas() {
    let mut world = setup_world(2);
    let output = CallSpec::version(2).run(
        &mut world,
        ARB_RETRYABLE_TX_ADDRESS,
        ArbRetryableTx::getBeneficiaryCall {
            ticketId: ticket_id(),
        }
        .abi_encode(),
    );

    assert_eq!(output.outcome, Outcome::OutOfGas);
    assert_eq!(output.gas_left, 0);
}

#[test]
fn test_current_redeemer() {
    let mut world = setup_world(30);
    let redeemer = CallSpec::default().call(
        &mut world,
        ARB_RETRYABLE_TX_ADDRESS,
        &ArbRetryableTx::getCurrentRedeemerCall {},
    );
    assert_eq!(redeemer, Address::ZERO);

    let spec = CallSpec {
        current_refund_to: Some(Address::repeat_byte(0x55)),
        ..Default::default()
    };
    let redeemer = spec.call(
        &mut world,
        ARB_RETRYABLE_TX_ADDRESS,
        &ArbRetryableTx::getCurrentRedeemerCall {},
    );
    assert_eq!(redeemer, Address::repeat_byte(0x55));
}

// ============================================================================
// Keepalive
// ============================================================================

#[test]
fn test_keepalive_extends_by_one_lifetime() {
    let mut world = world_with_ticket(30);
    let output = CallSpec::default().run(
        &mut world,
        ARB_RETRYABLE_TX_ADDRESS,
        ArbRetryableTx::keepaliveCall {
            ticketId: ticket_id(),
        }
        .abi_encode(),
    );

    let expected = U256::from(TIMEOUT + RETRYABLE_LIFETIME_SECONDS);
    let Outcome::Success(data) = &output.outcome else {
        panic!("keepalive failed: {:?}", output.outcome);
    };
    assert_eq!(
        ArbRetryableTx::keepaliveCall::abi_decode_returns(data).unwrap(),
        expected
    );

    assert_eq!(output.logs.len(), 1);
    let event = ArbRetryableTx::LifetimeExtended::decode_log_data(&output.logs[0].data).unwrap();
    assert_eq!(event.ticketId, ticket_id());
    assert_eq!(event.newTimeout, expected);

    let timeout = CallSpec::default().call(
        &mut world,
        ARB_RETRYABLE_TX_ADDRESS,
        &ArbRetryableTx::getTimeoutCall {
            ticketId: ticket_id(),
        },
    );
    assert_eq!(timeout, expected);
}

#[test]
fn test_keepalive_rejects_timeout_beyond_one_lifetime() {
    let mut world = world_with_ticket(30);
    let calldata = ArbRetryableTx::keepaliveCall {
        ticketId: ticket_id(),
    }
    .abi_encode();

    let first = CallSpec::default().run(&mut world, ARB_RETRYABLE_TX_ADDRESS, &calldata);
    assert!(matches!(first.outcome, Outcome::Success(_)));

    let second = CallSpec::default().run(&mut world, ARB_RETRYABLE_TX_ADDRESS, &calldata);
    assert!(
        matches!(second.outcome, Outcome::Revert { padded: false, .. }),
        "{:?}",
        second.outcome
    );
    assert!(second.logs.is_empty());
}

// ============================================================================
// Redeem
// ============================================================================

#[test]
fn test_redeem_schedules_reproducible_retry() {
    let mut world = world_with_ticket(30);
    let spec = CallSpec::default();
    let output = spec.run(
        &mut world,
        ARB_RETRYABLE_TX_ADDRESS,
        ArbRetryableTx::redeemCall {
            ticketId: ticket_id(),
        }
        .abi_encode(),
    );

    let Outcome::Success(data) = &output.outcome else {
        panic!("redeem failed: {:?}", output.outcome);
    };
    let retry_hash = ArbRetryableTx::redeemCall::abi_decode_returns(data).unwrap();

    assert_eq!(output.logs.len(), 1);
    let event = ArbRetryableTx::RedeemScheduled::decode_log_data(&output.logs[0].data).unwrap();
    assert_eq!(event.ticketId, ticket_id());
    assert_eq!(event.retryTxHash, retry_hash);
    assert_eq!(event.sequenceNum, 0);
    assert_eq!(event.gasDonor, user());
    assert_eq!(event.maxRefund, U256::MAX);
    assert_eq!(event.submissionFeeRefund, U256::ZERO);

    let expected = ArbitrumRetryTx {
        chain_id: U256::from(CHAIN_ID),
        nonce: 0,
        from: user(),
        gas_fee_cap: spec.block.basefee,
        gas: event.donatedGas,
        to: Some(Address::repeat_byte(0x22)),
        value: U256::from(500),
        data: Bytes::from_static(&[0xca, 0xfe]),
        ticket_id: ticket_id(),
        refund_to: user(),
        max_refund: U256::MAX,
        submission_fee_refund: U256::ZERO,
    };
    assert_eq!(expected.hash(), retry_hash);

    // The donation leaves only the reserve behind.
    assert!(output.gas_left < 2_899 + 3 + 800 + 20_000);

    let tries = arb_state(&mut world, 30)
        .retryables()
        .retryable(ticket_id())
        .num_tries()
        .get()
        .unwrap();
    assert_eq!(tries, 1);
}

#[test]
fn test_redeem_nonce_follows_attempts() {
    let mut world = world_with_ticket(30);
    let calldata = ArbRetryableTx::redeemCall {
        ticketId: ticket_id(),
    }
    .abi_encode();

    CallSpec::default().run(&mut world, ARB_RETRYABLE_TX_ADDRESS, &calldata);
    let output = CallSpec::default().run(&mut world, ARB_RETRYABLE_TX_ADDRESS, &calldata);

    let event = ArbRetryableTx::RedeemScheduled::decode_log_data(&output.logs[0].data).unwrap();
    assert_eq!(event.sequenceNum, 1);
}

#[test]
fn test_redeem_needs_enough_gas_to_donate() {
    let mut world = world_with_ticket(30);
    let output = CallSpec::default().gas(30_000).run(
        &mut world,
        ARB_RETRYABLE_TX_ADDRESS,
        ArbRetryableTx::redeemCall {
            ticketId: ticket_id(),
        }
        .abi_encode(),
    );

    assert!(!output.outcome.is_success());
    assert!(output.logs.is_empty());
}

#[test]
fn test_failed_redeem_leaves_no_trace() {
    let mut world = world_with_ticket(30);
    let calldata = ArbRetryableTx::redeemCall {
        ticketId: ticket_id(),
    }
    .abi_encode();

    // Enough to reach the try counter, too little to donate.
    let output = CallSpec::default()
        .gas(60_000)
        .run(&mut world, ARB_RETRYABLE_TX_ADDRESS, &calldata);
    assert_reverted_with(&output, "Not enough gas to run redeem attempt");

    let tries = arb_state(&mut world, 30)
        .retryables()
        .retryable(ticket_id())
        .num_tries()
        .get()
        .unwrap();
    assert_eq!(tries, 0);

    let output = CallSpec::default().run(&mut world, ARB_RETRYABLE_TX_ADDRESS, &calldata);
    let event = ArbRetryableTx::RedeemScheduled::decode_log_data(&output.logs[0].data).unwrap();
    assert_eq!(event.sequenceNum, 0);
}

#[test]
fn test_redeem_of_current_retryable_is_rejected() {
    let mut world = world_with_ticket(30);
    let spec = CallSpec {
        current_retryable: Some(ticket_id()),
        ..Default::default()
    };
    let output = spec.run(
        &mut world,
        ARB_RETRYABLE_TX_ADDRESS,
        ArbRetryableTx::redeemCall {
            ticketId: ticket_id(),
        }
        .abi_encode(),
    );

    assert_reverted_with(&output, "retryable cannot modify itself");
}

#[test]
fn test_redeem_of_missing_ticket() {
    let mut world = setup_world(30);
    let output = CallSpec::default().run(
        &mut world,
        ARB_RETRYABLE_TX_ADDRESS,
        ArbRetryableTx::redeemCall {
            ticketId: ticket_id(),
        }
        .abi_encode(),
    );

    assert_eq!(
        output.return_data(),
        Bytes::from(ArbRetryableTx::NoTicketWithID {}.abi_encode())
    );
}

// ============================================================================
// Cancel
// ============================================================================

#[test]
fn test_cancel_by_beneficiary_refunds_escrow() {
    let mut world = world_with_ticket(30);
    let output = CallSpec::default().from(beneficiary()).run(
        &mut world,
        ARB_RETRYABLE_TX_ADDRESS,
        ArbRetryableTx::cancelCall {
            ticketId: ticket_id(),
        }
        .abi_encode(),
    );

    assert_eq!(output.outcome, Outcome::Success(Bytes::new()));
    assert_eq!(output.logs.len(), 1);
    assert_eq!(
        output.logs[0].topics()[0],
        ArbRetryableTx::Canceled::SIGNATURE_HASH
    );

    assert_eq!(world.balance(beneficiary()).unwrap(), U256::from(500));
    assert_eq!(
        world.balance(retryable_escrow_address(ticket_id())).unwrap(),
        U256::ZERO
    );
    assert!(
        arb_state(&mut world, 30)
            .retryables()
            .open(ticket_id(), GENESIS_TIMESTAMP)
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_cancel_by_stranger_is_rejected() {
    let mut world = world_with_ticket(30);
    let output = CallSpec::default().run(
        &mut world,
        ARB_RETRYABLE_TX_ADDRESS,
        ArbRetryableTx::cancelCall {
            ticketId: ticket_id(),
        }
        .abi_encode(),
    );

    assert_reverted_with(&output, "only the beneficiary may cancel a retryable");
    assert_eq!(
        world.balance(retryable_escrow_address(ticket_id())).unwrap(),
        U256::from(500)
    );
}

// ============================================================================
// Submission
// ============================================================================

#[test]
fn test_submit_retryable_is_not_callable() {
    let mut world = setup_world(30);
    let call = ArbRetryableTx::submitRetryableCall {
        requestId: B256::ZERO,
        l1BaseFee: U256::ZERO,
        deposit: U256::ZERO,
        callvalue: U256::ZERO,
        gasFeeCap: U256::ZERO,
        gasLimit: 0,
        maxSubmissionFee: U256::ZERO,
        feeRefundAddress: Address::ZERO,
        beneficiary: Address::ZERO,
        retryTo: Address::ZERO,
        retryData: Bytes::new(),
    };
    let output = CallSpec::default().run(&mut world, ARB_RETRYABLE_TX_ADDRESS, call.abi_encode());

    assert_eq!(
        output.return_data(),
        Bytes::from(ArbRetryableTx::NotCallable {}.abi_encode())
    );
}

#[test]
fn test_malformed_submit_retryable_is_a_padded_revert() {
    let mut world = setup_world(30);
    let mut calldata = ArbRetryableTx::submitRetryableCall::SELECTOR.to_vec();
    calldata.extend_from_slice(&[0u8; 40]);

    let output = CallSpec::default().run(&mut world, ARB_RETRYABLE_TX_ADDRESS, calldata);
    assert_padded_revert(&output);
}
