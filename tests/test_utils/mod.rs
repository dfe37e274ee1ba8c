// Copyright 2024, Offchain Labs, Inc.
// For license information, see https://github.com/OffchainLabs/nitro/blob/master/LICENSE.md

//! Test utilities for precompile integration tests.

#![allow(dead_code)]

use alloy_sol_types::SolCall;
use arbos_precompiles::{
    ArbitrumConfig, BlockEnv, ExecutionContext, InMemoryWorldState, Outcome, PrecompileOutput,
    dispatch,
    state::{
        ArbState, ArbosStateParams,
        programs::{Program, hours_since_arbitrum},
        retryable::NewRetryable,
    },
};
use revm::primitives::{Address, B256, Bytes, U256};

pub const CHAIN_ID: u64 = 412_346;
pub const DEFAULT_GAS: u64 = 1_000_000;
pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

pub fn chain_owner() -> Address {
    Address::repeat_byte(0x0a)
}

pub fn network_fee_account() -> Address {
    Address::repeat_byte(0x0f)
}

pub fn user() -> Address {
    Address::repeat_byte(0x01)
}

/// World state with ArbOS initialized at `arbos_version` and [`chain_owner`] as the only owner.
pub fn setup_world(arbos_version: u64) -> InMemoryWorldState {
    let mut world = InMemoryWorldState::new();
    let params = ArbosStateParams {
        arbos_version,
        chain_id: U256::from(CHAIN_ID),
        chain_owner: chain_owner(),
        network_fee_account: network_fee_account(),
        ..Default::default()
    };
    ArbState::new(&mut world, None, false, arbos_version)
        .initialize(&params)
        .expect("failed to initialize ArbOS state");
    world
}

/// Unmetered state access for arranging and inspecting tests.
pub fn arb_state(world: &mut InMemoryWorldState, arbos_version: u64) -> ArbState<'_, InMemoryWorldState> {
    ArbState::new(world, None, false, arbos_version)
}

/// Stores a retryable paying out to `beneficiary`, with `escrow` wei held for it.
pub fn create_ticket(
    world: &mut InMemoryWorldState,
    id: B256,
    timeout: u64,
    beneficiary: Address,
    escrow: U256,
) {
    arb_state(world, 30)
        .retryables()
        .create(NewRetryable {
            id,
            timeout,
            from: user(),
            to: Some(Address::repeat_byte(0x22)),
            callvalue: escrow,
            beneficiary,
            calldata: Bytes::from_static(&[0xca, 0xfe]),
        })
        .expect("failed to create retryable");
    fund_account(
        world,
        arbos_precompiles::state::retryable::retryable_escrow_address(id),
        escrow,
    );
}

/// Records an activated Stylus program for `code_hash`, activated at genesis.
pub fn activate_program(
    world: &mut InMemoryWorldState,
    arbos_version: u64,
    code_hash: B256,
    stylus_version: u16,
    init_cost: u16,
) {
    arb_state(world, arbos_version)
        .programs()
        .program(code_hash)
        .set(Program {
            version: stylus_version,
            init_cost,
            activated_at: hours_since_arbitrum(GENESIS_TIMESTAMP),
            ..Default::default()
        })
        .expect("failed to record program");
}

pub fn fund_account(world: &mut InMemoryWorldState, address: Address, amount: U256) {
    use arbos_precompiles::WorldState;
    world
        .add_balance(address, amount)
        .expect("failed to fund account");
}

/// How a precompile is invoked: who calls, with what, under which chain settings.
#[derive(Clone, Debug)]
pub struct CallSpec {
    pub caller: Address,
    pub value: U256,
    pub read_only: bool,
    pub gas: u64,
    pub arbos_version: u64,
    pub block: BlockEnv,
    /// Defaults to the precompile itself, i.e. a direct call.
    pub executing_account: Option<Address>,
    pub current_retryable: Option<B256>,
    pub current_refund_to: Option<Address>,
    pub poster_fee: U256,
    pub grand_caller: Option<Address>,
    pub origin: Address,
    pub call_depth: usize,
    pub tx_type: u8,
}

impl Default for CallSpec {
    fn default() -> Self {
        Self {
            caller: user(),
            value: U256::ZERO,
            read_only: false,
            gas: DEFAULT_GAS,
            arbos_version: 30,
            block: BlockEnv {
                number: 100,
                timestamp: GENESIS_TIMESTAMP,
                basefee: U256::from(100_000_000u64),
            },
            executing_account: None,
            current_retryable: None,
            current_refund_to: None,
            poster_fee: U256::ZERO,
            grand_caller: None,
            origin: user(),
            call_depth: 0,
            tx_type: 0,
        }
    }
}

impl CallSpec {
    pub fn version(arbos_version: u64) -> Self {
        Self {
            arbos_version,
            ..Default::default()
        }
    }

    pub fn from(mut self, caller: Address) -> Self {
        self.caller = caller;
        self
    }

    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = gas;
        self
    }

    pub fn static_call(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn at_time(mut self, timestamp: u64) -> Self {
        self.block.timestamp = timestamp;
        self
    }

    pub fn run(
        &self,
        world: &mut InMemoryWorldState,
        precompile: Address,
        calldata: impl AsRef<[u8]>,
    ) -> PrecompileOutput {
        let config = ArbitrumConfig::default()
            .with_chain_id(CHAIN_ID)
            .with_arbos_version(self.arbos_version);
        let mut ctx = ExecutionContext::new(world, self.gas, config, self.block.clone());
        ctx.caller = self.caller;
        ctx.value = self.value;
        ctx.read_only = self.read_only;
        ctx.executing_account = self.executing_account.unwrap_or(precompile);
        ctx.current_retryable = self.current_retryable;
        ctx.current_refund_to = self.current_refund_to;
        ctx.poster_fee = self.poster_fee;
        ctx.grand_caller = self.grand_caller;
        ctx.origin = self.origin;
        ctx.call_depth = self.call_depth;
        ctx.tx_type = self.tx_type;
        dispatch(precompile, calldata.as_ref(), &mut ctx)
    }

    /// Runs an ABI call and decodes its result, panicking on any other outcome.
    pub fn call<C: SolCall>(
        &self,
        world: &mut InMemoryWorldState,
        precompile: Address,
        call: &C,
    ) -> C::Return {
        let output = self.run(world, precompile, call.abi_encode());
        let Outcome::Success(data) = &output.outcome else {
            panic!("{} failed: {:?}", C::SIGNATURE, output.outcome);
        };
        C::abi_decode_returns(data).expect("failed to decode return data")
    }
}

/// Asserts a revert carrying `reason`.
pub fn assert_reverted_with(output: &PrecompileOutput, reason: &str) {
    assert_eq!(
        output.outcome,
        Outcome::revert(reason),
        "unexpected outcome"
    );
}

pub fn assert_padded_revert(output: &PrecompileOutput) {
    assert_eq!(output.outcome, Outcome::padded_revert());
    assert!(output.return_data().is_empty());
}
