use revm::primitives::{Address, I256, U256};

use crate::{
    constants::{
        ARBOS_BATCH_POSTER_ADDRESS, INITIAL_EQUILIBRATION_UNITS_V6, INITIAL_L1_INERTIA,
        INITIAL_L1_PER_UNIT_REWARD, INITIAL_PER_BATCH_GAS_COST_V6,
    },
    state::types::{
        ArbosStateError, Storage, StorageBackedAddress, StorageBackedAddressSet,
        StorageBackedI256, StorageBackedU64, StorageBackedU256,
    },
    world_state::WorldState,
};

const ARBOS_L1_PRICING_BATCH_POSTER_TABLE_KEY: &[u8] = &[0];
const ARBOS_L1_PRICING_PAY_RECIPIENT_OFFSET: u64 = 0;
const ARBOS_L1_PRICING_EQUILIBRATION_UNITS_OFFSET: u64 = 1;
const ARBOS_L1_PRICING_INERTIA_OFFSET: u64 = 2;
const ARBOS_L1_PRICING_PER_UNIT_REWARD_OFFSET: u64 = 3;
const ARBOS_L1_PRICING_LAST_UPDATE_TIME_OFFSET: u64 = 4;
const ARBOS_L1_PRICING_FUNDS_DUE_FOR_REWARDS_OFFSET: u64 = 5;
const ARBOS_L1_PRICING_UNITS_SINCE_UPDATE_OFFSET: u64 = 6;
const ARBOS_L1_PRICING_PRICE_PER_UNIT_OFFSET: u64 = 7;
const ARBOS_L1_PRICING_LAST_SURPLUS_OFFSET: u64 = 8;
const ARBOS_L1_PRICING_PER_BATCH_GAS_COST_OFFSET: u64 = 9;
const ARBOS_L1_PRICING_AMORTIZED_COST_CAP_BIPS_OFFSET: u64 = 10;
const ARBOS_L1_PRICING_L1_FEES_AVAILABLE_OFFSET: u64 = 11;
const ARBOS_L1_PRICING_PARENT_GAS_FLOOR_PER_TOKEN_OFFSET: u64 = 12;

pub struct L1Pricing<'a, W> {
    storage: Storage<'a, W>,
}

impl<'a, W: WorldState> L1Pricing<'a, W> {
    pub fn new(storage: Storage<'a, W>) -> Self {
        Self { storage }
    }

    pub fn initialize(
        &mut self,
        reward_recipient: Address,
        initial_price_per_unit: U256,
    ) -> Result<(), ArbosStateError> {
        self.batch_poster_table()
            .add(ARBOS_BATCH_POSTER_ADDRESS, ARBOS_BATCH_POSTER_ADDRESS)?;
        self.reward_recipient().set(reward_recipient)?;
        self.equilibration_units()
            .set(U256::from(INITIAL_EQUILIBRATION_UNITS_V6))?;
        self.inertia().set(INITIAL_L1_INERTIA)?;
        self.per_unit_reward().set(INITIAL_L1_PER_UNIT_REWARD)?;
        self.price_per_unit().set(initial_price_per_unit)?;
        self.per_batch_gas_cost().set(INITIAL_PER_BATCH_GAS_COST_V6)
    }

    pub fn batch_poster_table(&mut self) -> BatchPosterTable<'_, W> {
        BatchPosterTable::new(self.storage.open(ARBOS_L1_PRICING_BATCH_POSTER_TABLE_KEY))
    }

    pub fn reward_recipient(&mut self) -> StorageBackedAddress<'_, W> {
        self.storage.at(ARBOS_L1_PRICING_PAY_RECIPIENT_OFFSET)
    }

    pub fn equilibration_units(&mut self) -> StorageBackedU256<'_, W> {
        self.storage.at(ARBOS_L1_PRICING_EQUILIBRATION_UNITS_OFFSET)
    }

    pub fn inertia(&mut self) -> StorageBackedU64<'_, W> {
        self.storage.at(ARBOS_L1_PRICING_INERTIA_OFFSET)
    }

    pub fn per_unit_reward(&mut self) -> StorageBackedU64<'_, W> {
        self.storage.at(ARBOS_L1_PRICING_PER_UNIT_REWARD_OFFSET)
    }

    pub fn last_update_time(&mut self) -> StorageBackedU64<'_, W> {
        self.storage.at(ARBOS_L1_PRICING_LAST_UPDATE_TIME_OFFSET)
    }

    pub fn funds_due_for_rewards(&mut self) -> StorageBackedI256<'_, W> {
        self.storage.at(ARBOS_L1_PRICING_FUNDS_DUE_FOR_REWARDS_OFFSET)
    }

    pub fn units_since_update(&mut self) -> StorageBackedU64<'_, W> {
        self.storage.at(ARBOS_L1_PRICING_UNITS_SINCE_UPDATE_OFFSET)
    }

    pub fn price_per_unit(&mut self) -> StorageBackedU256<'_, W> {
        self.storage.at(ARBOS_L1_PRICING_PRICE_PER_UNIT_OFFSET)
    }

    pub fn last_surplus(&mut self) -> StorageBackedI256<'_, W> {
        self.storage.at(ARBOS_L1_PRICING_LAST_SURPLUS_OFFSET)
    }

    pub fn per_batch_gas_cost(&mut self) -> StorageBackedU64<'_, W> {
        self.storage.at(ARBOS_L1_PRICING_PER_BATCH_GAS_COST_OFFSET)
    }

    pub fn amortized_cost_cap_bips(&mut self) -> StorageBackedU64<'_, W> {
        self.storage.at(ARBOS_L1_PRICING_AMORTIZED_COST_CAP_BIPS_OFFSET)
    }

    pub fn l1_fees_available(&mut self) -> StorageBackedU256<'_, W> {
        self.storage.at(ARBOS_L1_PRICING_L1_FEES_AVAILABLE_OFFSET)
    }

    pub fn parent_gas_floor_per_token(&mut self) -> StorageBackedU64<'_, W> {
        self.storage.at(ARBOS_L1_PRICING_PARENT_GAS_FLOOR_PER_TOKEN_OFFSET)
    }

    /// Moves up to `max_wei` of unrecognized pool balance into `l1_fees_available` and
    /// returns the amount moved.
    pub fn release_surplus_funds(
        &mut self,
        pool_balance: U256,
        max_wei: U256,
    ) -> Result<U256, ArbosStateError> {
        let recognized = self.l1_fees_available().get()?;
        let unrecognized = pool_balance.saturating_sub(recognized);
        let released = unrecognized.min(max_wei);
        self.l1_fees_available()
            .set(recognized.saturating_add(released))?;
        Ok(released)
    }
}

const ARBOS_BATCH_POSTER_ADDRS_KEY: &[u8] = &[0];
const ARBOS_BATCH_POSTER_INFO_KEY: &[u8] = &[1];
const ARBOS_BATCH_POSTER_TOTAL_FUNDS_DUE_OFFSET: u64 = 0;

pub struct BatchPosterTable<'a, W> {
    storage: Storage<'a, W>,
}

impl<'a, W: WorldState> BatchPosterTable<'a, W> {
    pub fn new(storage: Storage<'a, W>) -> Self {
        Self { storage }
    }

    fn posters(&mut self) -> StorageBackedAddressSet<'_, W> {
        StorageBackedAddressSet::new(self.storage.open(ARBOS_BATCH_POSTER_ADDRS_KEY))
    }

    pub fn all(&mut self) -> Result<Vec<Address>, ArbosStateError> {
        self.posters().all()
    }

    pub fn contains(&mut self, batch_poster: Address) -> Result<bool, ArbosStateError> {
        self.posters().contains(batch_poster)
    }

    pub fn get(&mut self, batch_poster: Address) -> BatchPosterState<'_, W> {
        let info = self.storage.open(ARBOS_BATCH_POSTER_INFO_KEY);
        BatchPosterState::new(info.open_owned(batch_poster.as_slice()))
    }

    /// Registers a new poster with nothing owed to it.
    pub fn add(&mut self, batch_poster: Address, pay_to: Address) -> Result<(), ArbosStateError> {
        if self.contains(batch_poster)? {
            return Err(ArbosStateError::AlreadyExists(format!(
                "tried to add a batch poster that already exists: {batch_poster}"
            )));
        }
        let mut state = self.get(batch_poster);
        state.funds_due().set(I256::ZERO)?;
        state.pay_to().set(pay_to)?;
        self.posters().add(batch_poster)
    }

    /// Adds the poster paying to itself if it is not registered yet. Returns whether it was added.
    pub fn add_if_missing(&mut self, batch_poster: Address) -> Result<bool, ArbosStateError> {
        if self.contains(batch_poster)? {
            return Ok(false);
        }
        self.add(batch_poster, batch_poster)?;
        Ok(true)
    }

    pub fn total_funds_due(&mut self) -> StorageBackedI256<'_, W> {
        self.storage.at(ARBOS_BATCH_POSTER_TOTAL_FUNDS_DUE_OFFSET)
    }

    /// Adjusts both the poster's balance and the table total by `delta`, saturating.
    pub fn add_funds_due(
        &mut self,
        batch_poster: Address,
        delta: I256,
    ) -> Result<(), ArbosStateError> {
        let previous = self.get(batch_poster).funds_due().get()?;
        let next = previous.saturating_add(delta);
        self.get(batch_poster).funds_due().set(next)?;

        let total = self.total_funds_due().get()?;
        self.total_funds_due()
            .set(total.saturating_add(next.saturating_sub(previous)))
    }

    pub fn fee_collector(&mut self, batch_poster: Address) -> Result<Address, ArbosStateError> {
        self.get(batch_poster).pay_to().get()
    }

    pub fn set_fee_collector(
        &mut self,
        batch_poster: Address,
        fee_collector: Address,
    ) -> Result<(), ArbosStateError> {
        self.get(batch_poster).pay_to().set(fee_collector)
    }
}

const BATCH_POSTER_FUNDS_DUE_OFFSET: u64 = 0;
const BATCH_POSTER_PAY_TO_OFFSET: u64 = 1;

pub struct BatchPosterState<'a, W> {
    storage: Storage<'a, W>,
}

impl<'a, W: WorldState> BatchPosterState<'a, W> {
    pub fn new(storage: Storage<'a, W>) -> Self {
        Self { storage }
    }

    pub fn funds_due(&mut self) -> StorageBackedI256<'_, W> {
        self.storage.at(BATCH_POSTER_FUNDS_DUE_OFFSET)
    }

    pub fn pay_to(&mut self) -> StorageBackedAddress<'_, W> {
        self.storage.at(BATCH_POSTER_PAY_TO_OFFSET)
    }
}

#[cfg(test)]
mod tests {
    use revm::primitives::B256;

    use super::*;
    use crate::world_state::InMemoryWorldState;

    fn pricing(world: &mut InMemoryWorldState) -> L1Pricing<'_, InMemoryWorldState> {
        L1Pricing::new(Storage::new(world, None, false, B256::with_last_byte(9)))
    }

    #[test]
    fn initialize_registers_default_poster() {
        let mut world = InMemoryWorldState::new();
        let mut l1 = pricing(&mut world);
        let recipient = Address::repeat_byte(0x42);
        l1.initialize(recipient, U256::from(7)).unwrap();

        assert_eq!(l1.reward_recipient().get().unwrap(), recipient);
        assert_eq!(l1.price_per_unit().get().unwrap(), U256::from(7));
        assert_eq!(l1.inertia().get().unwrap(), INITIAL_L1_INERTIA);

        let mut posters = l1.batch_poster_table();
        assert_eq!(posters.all().unwrap(), vec![ARBOS_BATCH_POSTER_ADDRESS]);
        assert_eq!(
            posters.fee_collector(ARBOS_BATCH_POSTER_ADDRESS).unwrap(),
            ARBOS_BATCH_POSTER_ADDRESS
        );
    }

    #[test]
    fn duplicate_poster_is_rejected() {
        let mut world = InMemoryWorldState::new();
        let mut l1 = pricing(&mut world);
        let mut posters = l1.batch_poster_table();
        let poster = Address::repeat_byte(1);

        posters.add(poster, poster).unwrap();
        assert!(matches!(
            posters.add(poster, poster),
            Err(ArbosStateError::AlreadyExists(_))
        ));
        assert!(!posters.add_if_missing(poster).unwrap());
    }

    #[test]
    fn funds_due_track_the_total() {
        let mut world = InMemoryWorldState::new();
        let mut l1 = pricing(&mut world);
        let mut posters = l1.batch_poster_table();
        let (a, b) = (Address::repeat_byte(1), Address::repeat_byte(2));
        posters.add(a, a).unwrap();
        posters.add(b, b).unwrap();

        posters.add_funds_due(a, I256::try_from(500i64).unwrap()).unwrap();
        posters.add_funds_due(b, I256::try_from(250i64).unwrap()).unwrap();
        posters.add_funds_due(a, I256::try_from(-100i64).unwrap()).unwrap();

        assert_eq!(
            posters.get(a).funds_due().get().unwrap(),
            I256::try_from(400i64).unwrap()
        );
        assert_eq!(
            posters.total_funds_due().get().unwrap(),
            I256::try_from(650i64).unwrap()
        );
    }

    #[test]
    fn surplus_release_is_capped() {
        let mut world = InMemoryWorldState::new();
        let mut l1 = pricing(&mut world);
        l1.l1_fees_available().set(U256::from(100)).unwrap();

        let released = l1
            .release_surplus_funds(U256::from(1_000), U256::from(300))
            .unwrap();
        assert_eq!(released, U256::from(300));
        assert_eq!(l1.l1_fees_available().get().unwrap(), U256::from(400));

        let released = l1
            .release_surplus_funds(U256::from(50), U256::MAX)
            .unwrap();
        assert_eq!(released, U256::ZERO);
    }
}
