use revm::primitives::U256;

use crate::{
    constants::{
        INITIAL_BACKLOG_TOLERANCE, INITIAL_BASE_FEE_WEI, INITIAL_MINIMUM_BASE_FEE_WEI,
        INITIAL_PER_BLOCK_GAS_LIMIT_V6, INITIAL_PER_TX_GAS_LIMIT, INITIAL_PRICING_INERTIA,
        INITIAL_SPEED_LIMIT_PER_SECOND_V6,
    },
    state::types::{ArbosStateError, Storage, StorageBackedU64, StorageBackedU256},
    world_state::WorldState,
};

const SPEED_LIMIT_PER_SECOND_OFFSET: u64 = 0;
const PER_BLOCK_GAS_LIMIT_OFFSET: u64 = 1;
const BASE_FEE_WEI_OFFSET: u64 = 2;
const MIN_BASE_FEE_WEI_OFFSET: u64 = 3;
const GAS_BACKLOG_OFFSET: u64 = 4;
const PRICING_INERTIA_OFFSET: u64 = 5;
const BACKLOG_TOLERANCE_OFFSET: u64 = 6;
const PER_TX_GAS_LIMIT_OFFSET: u64 = 7;

pub struct L2Pricing<'a, W> {
    storage: Storage<'a, W>,
}

impl<'a, W: WorldState> L2Pricing<'a, W> {
    pub fn new(storage: Storage<'a, W>) -> Self {
        Self { storage }
    }

    pub fn initialize(&mut self) -> Result<(), ArbosStateError> {
        self.speed_limit_per_second()
            .set(INITIAL_SPEED_LIMIT_PER_SECOND_V6)?;
        self.per_block_gas_limit().set(INITIAL_PER_BLOCK_GAS_LIMIT_V6)?;
        self.per_tx_gas_limit().set(INITIAL_PER_TX_GAS_LIMIT)?;
        self.base_fee_wei().set(U256::from(INITIAL_BASE_FEE_WEI))?;
        self.min_base_fee_wei()
            .set(U256::from(INITIAL_MINIMUM_BASE_FEE_WEI))?;
        self.gas_backlog().set(0)?;
        self.pricing_inertia().set(INITIAL_PRICING_INERTIA)?;
        self.backlog_tolerance().set(INITIAL_BACKLOG_TOLERANCE)
    }

    pub fn speed_limit_per_second(&mut self) -> StorageBackedU64<'_, W> {
        self.storage.at(SPEED_LIMIT_PER_SECOND_OFFSET)
    }

    pub fn per_block_gas_limit(&mut self) -> StorageBackedU64<'_, W> {
        self.storage.at(PER_BLOCK_GAS_LIMIT_OFFSET)
    }

    pub fn base_fee_wei(&mut self) -> StorageBackedU256<'_, W> {
        self.storage.at(BASE_FEE_WEI_OFFSET)
    }

    pub fn min_base_fee_wei(&mut self) -> StorageBackedU256<'_, W> {
        self.storage.at(MIN_BASE_FEE_WEI_OFFSET)
    }

    pub fn gas_backlog(&mut self) -> StorageBackedU64<'_, W> {
        self.storage.at(GAS_BACKLOG_OFFSET)
    }

    pub fn pricing_inertia(&mut self) -> StorageBackedU64<'_, W> {
        self.storage.at(PRICING_INERTIA_OFFSET)
    }

    pub fn backlog_tolerance(&mut self) -> StorageBackedU64<'_, W> {
        self.storage.at(BACKLOG_TOLERANCE_OFFSET)
    }

    pub fn per_tx_gas_limit(&mut self) -> StorageBackedU64<'_, W> {
        self.storage.at(PER_TX_GAS_LIMIT_OFFSET)
    }

    /// Credits gas consumed outside the block's normal accounting against the backlog.
    pub fn shrink_backlog(&mut self, gas: u64) -> Result<(), ArbosStateError> {
        let backlog = self.gas_backlog().get()?;
        self.gas_backlog().set(backlog.saturating_sub(gas))
    }
}

#[cfg(test)]
mod tests {
    use revm::primitives::B256;

    use super::*;
    use crate::world_state::InMemoryWorldState;

    #[test]
    fn backlog_shrink_saturates() {
        let mut world = InMemoryWorldState::new();
        let mut l2 = L2Pricing::new(Storage::new(&mut world, None, false, B256::with_last_byte(1)));
        l2.initialize().unwrap();
        assert_eq!(l2.pricing_inertia().get().unwrap(), INITIAL_PRICING_INERTIA);

        l2.gas_backlog().set(1_000).unwrap();
        l2.shrink_backlog(400).unwrap();
        assert_eq!(l2.gas_backlog().get().unwrap(), 600);
        l2.shrink_backlog(10_000).unwrap();
        assert_eq!(l2.gas_backlog().get().unwrap(), 0);
    }
}
