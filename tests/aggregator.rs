// Copyright 2024, Offchain Labs, Inc.
// For license information, see https://github.com/OffchainLabs/nitro/blob/master/LICENSE.md

use alloy_sol_types::SolCall;
use arbos_precompiles::{
    Outcome,
    constants::{ARB_AGGREGATOR_ADDRESS, ARBOS_BATCH_POSTER_ADDRESS},
    precompiles::arb_aggregator::ArbAggregator,
};
use revm::primitives::{Address, U256};

mod test_utils;
use test_utils::{CallSpec, assert_reverted_with, chain_owner, setup_world, user};

fn poster() -> Address {
    Address::repeat_byte(0xbb)
}

#[test]
fn test_deprecated_aggregator_queries() {
    let mut world = setup_world(30);
    let spec = CallSpec::default();

    let preferred = spec.call(
        &mut world,
        ARB_AGGREGATOR_ADDRESS,
        &ArbAggregator::getPreferredAggregatorCall { addr: user() },
    );
    assert_eq!((preferred._0, preferred._1), (ARBOS_BATCH_POSTER_ADDRESS, true));

    let default = spec.call(&mut world, ARB_AGGREGATOR_ADDRESS, &ArbAggregator::getDefaultAggregatorCall {});
    assert_eq!(default, ARBOS_BATCH_POSTER_ADDRESS);

    let fee = spec.call(
        &mut world,
        ARB_AGGREGATOR_ADDRESS,
        &ArbAggregator::getTxBaseFeeCall { aggregator: user() },
    );
    assert_eq!(fee, U256::ZERO);
}

#[test]
fn test_add_batch_poster_requires_owner() {
    let mut world = setup_world(30);
    let call = ArbAggregator::addBatchPosterCall { newBatchPoster: poster() };

    let output = CallSpec::default().run(&mut world, ARB_AGGREGATOR_ADDRESS, call.abi_encode());
    assert_reverted_with(&output, "must be called by chain owner");

    CallSpec::default().from(chain_owner()).call(&mut world, ARB_AGGREGATOR_ADDRESS, &call);
    // A second add is a no-op.
    CallSpec::default().from(chain_owner()).call(&mut world, ARB_AGGREGATOR_ADDRESS, &call);

    let posters = CallSpec::default().call(&mut world, ARB_AGGREGATOR_ADDRESS, &ArbAggregator::getBatchPostersCall {});
    assert_eq!(posters, vec![ARBOS_BATCH_POSTER_ADDRESS, poster()]);
}

#[test]
fn test_unauthorized_before_v11_burns_all_gas() {
    let mut world = setup_world(10);
    let output = CallSpec::version(10).run(
        &mut world,
        ARB_AGGREGATOR_ADDRESS,
        ArbAggregator::addBatchPosterCall { newBatchPoster: poster() }.abi_encode(),
    );
    assert_eq!(output.outcome, Outcome::OutOfGas);
    assert_eq!(output.gas_left, 0);
}

#[test]
fn test_fee_collector_permissions() {
    let mut world = setup_world(30);
    CallSpec::default().from(chain_owner()).call(
        &mut world,
        ARB_AGGREGATOR_ADDRESS,
        &ArbAggregator::addBatchPosterCall { newBatchPoster: poster() },
    );
    let collector = Address::repeat_byte(0xcc);

    let output = CallSpec::default().run(
        &mut world,
        ARB_AGGREGATOR_ADDRESS,
        ArbAggregator::setFeeCollectorCall { batchPoster: poster(), newFeeCollector: user() }.abi_encode(),
    );
    assert_reverted_with(
        &output,
        "only a batch poster (or its fee collector / chain owner) may change its fee collector",
    );

    CallSpec::default().from(poster()).call(
        &mut world,
        ARB_AGGREGATOR_ADDRESS,
        &ArbAggregator::setFeeCollectorCall { batchPoster: poster(), newFeeCollector: collector },
    );
    // The collector may hand the role on.
    CallSpec::default().from(collector).call(
        &mut world,
        ARB_AGGREGATOR_ADDRESS,
        &ArbAggregator::setFeeCollectorCall { batchPoster: poster(), newFeeCollector: user() },
    );

    let current = CallSpec::default().call(
        &mut world,
        ARB_AGGREGATOR_ADDRESS,
        &ArbAggregator::getFeeCollectorCall { batchPoster: poster() },
    );
    assert_eq!(current, user());
}

#[test]
fn test_fee_collector_of_unknown_poster() {
    let mut world = setup_world(30);
    let output = CallSpec::default().run(
        &mut world,
        ARB_AGGREGATOR_ADDRESS,
        ArbAggregator::getFeeCollectorCall { batchPoster: poster() }.abi_encode(),
    );
    assert_reverted_with(&output, "tried to open a batch poster that does not exist");
}
