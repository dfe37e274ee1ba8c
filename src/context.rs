use alloy_sol_types::SolEvent;
use revm::{
    interpreter::gas::log_cost,
    primitives::{Address, B256, Log, U256},
};

use crate::{
    config::ArbitrumConfig,
    gas::{GasMeter, OutOfGas},
    result::PrecompileError,
    state::ArbState,
    world_state::WorldState,
};

/// Block fields a precompile can observe.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockEnv {
    pub number: u64,
    pub timestamp: u64,
    pub basefee: U256,
}

/// Per-call state handed to a precompile handler. Built fresh for every call.
pub struct ExecutionContext<'a, W> {
    pub caller: Address,
    /// Caller of `caller`, absent when the transaction calls the precompile directly.
    pub grand_caller: Option<Address>,
    /// Sender of the enclosing transaction.
    pub origin: Address,
    /// Frames between the transaction and the precompile: 0 when the transaction targets the
    /// precompile, 1 when the contract it targets makes the call.
    pub call_depth: usize,
    /// Type byte of the enclosing transaction.
    pub tx_type: u8,
    pub value: U256,
    pub read_only: bool,
    pub executing_account: Address,
    pub block: BlockEnv,
    pub config: ArbitrumConfig,
    /// Ticket being redeemed when the enclosing transaction is a retry.
    pub current_retryable: Option<B256>,
    pub current_refund_to: Option<Address>,
    /// L1 fee charged to the enclosing transaction's poster.
    pub poster_fee: U256,
    precompile: Address,
    gas: GasMeter,
    logs: Vec<Log>,
    world: &'a mut W,
}

impl<'a, W: WorldState> ExecutionContext<'a, W> {
    pub fn new(world: &'a mut W, gas_limit: u64, config: ArbitrumConfig, block: BlockEnv) -> Self {
        Self {
            caller: Address::ZERO,
            grand_caller: None,
            origin: Address::ZERO,
            call_depth: 0,
            tx_type: 0,
            value: U256::ZERO,
            read_only: false,
            executing_account: Address::ZERO,
            block,
            config,
            current_retryable: None,
            current_refund_to: None,
            poster_fee: U256::ZERO,
            precompile: Address::ZERO,
            gas: GasMeter::new(gas_limit),
            logs: Vec::new(),
            world,
        }
    }

    #[inline]
    pub fn arbos_version(&self) -> u64 {
        self.config.arbos_version
    }

    #[inline]
    pub fn gas_left(&self) -> u64 {
        self.gas.left()
    }

    #[inline]
    pub fn gas_supplied(&self) -> u64 {
        self.gas.supplied()
    }

    pub fn burn(&mut self, amount: u64) -> Result<(), OutOfGas> {
        self.gas.burn(amount)
    }

    /// Metered, write-protected view of ArbOS state.
    pub fn arb_state(&mut self) -> ArbState<'_, W> {
        ArbState::new(
            &mut *self.world,
            Some(&mut self.gas),
            self.read_only,
            self.config.arbos_version,
        )
    }

    /// Unmetered access to accounts; callers charge for what they touch.
    pub fn world(&mut self) -> &mut W {
        self.world
    }

    /// Charges the standard LOG cost for `event` and records it against the running precompile.
    pub fn emit_log<E: SolEvent>(&mut self, event: &E) -> Result<(), PrecompileError> {
        let data = event.encode_log_data();
        let cost = log_cost(data.topics().len() as u8, data.data.len() as u64)
            .ok_or(PrecompileError::OutOfGas)?;
        self.gas.burn(cost)?;
        self.logs.push(Log {
            address: self.precompile,
            data,
        });
        Ok(())
    }

    pub(crate) fn enter(&mut self, precompile: Address) {
        self.precompile = precompile;
        self.logs.clear();
    }

    pub(crate) fn gas_mut(&mut self) -> &mut GasMeter {
        &mut self.gas
    }

    pub(crate) fn take_logs(&mut self) -> Vec<Log> {
        core::mem::take(&mut self.logs)
    }
}
