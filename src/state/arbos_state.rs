use revm::primitives::{Address, B256, U256};

use crate::{
    constants::{
        ARBOS_VERSION_20, ARBOS_VERSION_30, INITIAL_ARBOS_VERSION, INITIAL_L1_PRICE_PER_UNIT,
    },
    gas::GasMeter,
    state::{
        address_table::AddressTable,
        l1_pricing::L1Pricing,
        l2_pricing::L2Pricing,
        programs::Programs,
        retryable::RetryableState,
        types::{
            ArbosStateError, Storage, StorageBackedAddress, StorageBackedAddressSet,
            StorageBackedU64, StorageBackedU256,
        },
    },
    world_state::WorldState,
};

const ARBOS_STATE_VERSION_OFFSET: u64 = 0;
const ARBOS_STATE_UPGRADE_VERSION_OFFSET: u64 = 1;
const ARBOS_STATE_UPGRADE_TIMESTAMP_OFFSET: u64 = 2;
const ARBOS_STATE_NETWORK_FEE_ACCOUNT_OFFSET: u64 = 3;
const ARBOS_STATE_CHAIN_ID_OFFSET: u64 = 4;
const ARBOS_STATE_GENESIS_BLOCK_NUM_OFFSET: u64 = 5;
const ARBOS_STATE_INFRA_FEE_ACCOUNT_OFFSET: u64 = 6;
const ARBOS_STATE_BROTLI_COMPRESSION_LEVEL_OFFSET: u64 = 7;
const ARBOS_STATE_NATIVE_TOKEN_ENABLED_FROM_TIME_OFFSET: u64 = 8;

const ARBOS_STATE_L1_PRICING_KEY: &[u8] = &[0];
const ARBOS_STATE_L2_PRICING_KEY: &[u8] = &[1];
const ARBOS_STATE_RETRYABLES_KEY: &[u8] = &[2];
const ARBOS_STATE_ADDRESS_TABLE_KEY: &[u8] = &[3];
const ARBOS_CHAIN_OWNERS_KEY: &[u8] = &[4];
const ARBOS_STATE_PROGRAMS_KEY: &[u8] = &[8];
const ARBOS_STATE_FEATURES_KEY: &[u8] = &[9];
const ARBOS_STATE_NATIVE_TOKEN_OWNER_KEY: &[u8] = &[10];

const FEATURE_CALLDATA_PRICE_INCREASE_BIT: usize = 0;

/// Genesis parameters for ArbOS state.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArbosStateParams {
    pub arbos_version: u64,
    pub chain_id: U256,
    pub chain_owner: Address,
    pub network_fee_account: Address,
    pub infra_fee_account: Address,
    pub genesis_block_num: u64,
    pub brotli_compression_level: u64,
    pub initial_l1_price_per_unit: U256,
}

impl Default for ArbosStateParams {
    fn default() -> Self {
        Self {
            arbos_version: INITIAL_ARBOS_VERSION,
            chain_id: U256::from(412_346u64),
            chain_owner: Address::ZERO,
            network_fee_account: Address::ZERO,
            infra_fee_account: Address::ZERO,
            genesis_block_num: 0,
            brotli_compression_level: 1,
            initial_l1_price_per_unit: U256::from(INITIAL_L1_PRICE_PER_UNIT),
        }
    }
}

/// Typed view over the ArbOS account's storage.
pub struct ArbState<'a, W> {
    storage: Storage<'a, W>,
    arbos_version: u64,
}

impl<'a, W: WorldState> ArbState<'a, W> {
    pub fn new(
        world: &'a mut W,
        gas: Option<&'a mut GasMeter>,
        is_static: bool,
        arbos_version: u64,
    ) -> Self {
        Self {
            storage: Storage::new(world, gas, is_static, B256::ZERO),
            arbos_version,
        }
    }

    #[inline]
    pub fn arbos_version(&self) -> u64 {
        self.arbos_version
    }

    /// Writes genesis state. Not metered.
    pub fn initialize(&mut self, params: &ArbosStateParams) -> Result<(), ArbosStateError> {
        self.stored_version().set(params.arbos_version)?;
        self.upgrade_version().set(0)?;
        self.upgrade_timestamp().set(0)?;
        self.network_fee_account().set(params.network_fee_account)?;
        if params.arbos_version >= crate::constants::ARBOS_VERSION_5 {
            self.infra_fee_account().set(params.infra_fee_account)?;
        }
        self.chain_id().set(params.chain_id)?;
        self.genesis_block_num().set(params.genesis_block_num)?;
        if params.arbos_version >= ARBOS_VERSION_20 {
            self.brotli_compression_level()
                .set(params.brotli_compression_level)?;
        }

        self.l1_pricing()
            .initialize(params.network_fee_account, params.initial_l1_price_per_unit)?;
        self.l2_pricing().initialize()?;
        self.retryables().initialize()?;
        if params.arbos_version >= ARBOS_VERSION_30 {
            self.programs().initialize(params.arbos_version)?;
        }

        if !params.chain_owner.is_zero() {
            self.chain_owners().add(params.chain_owner)?;
        }
        Ok(())
    }

    pub fn stored_version(&mut self) -> StorageBackedU64<'_, W> {
        self.storage.at(ARBOS_STATE_VERSION_OFFSET)
    }

    pub fn upgrade_version(&mut self) -> StorageBackedU64<'_, W> {
        self.storage.at(ARBOS_STATE_UPGRADE_VERSION_OFFSET)
    }

    pub fn upgrade_timestamp(&mut self) -> StorageBackedU64<'_, W> {
        self.storage.at(ARBOS_STATE_UPGRADE_TIMESTAMP_OFFSET)
    }

    pub fn network_fee_account(&mut self) -> StorageBackedAddress<'_, W> {
        self.storage.at(ARBOS_STATE_NETWORK_FEE_ACCOUNT_OFFSET)
    }

    pub fn chain_id(&mut self) -> StorageBackedU256<'_, W> {
        self.storage.at(ARBOS_STATE_CHAIN_ID_OFFSET)
    }

    pub fn genesis_block_num(&mut self) -> StorageBackedU64<'_, W> {
        self.storage.at(ARBOS_STATE_GENESIS_BLOCK_NUM_OFFSET)
    }

    pub fn infra_fee_account(&mut self) -> StorageBackedAddress<'_, W> {
        self.storage.at(ARBOS_STATE_INFRA_FEE_ACCOUNT_OFFSET)
    }

    pub fn brotli_compression_level(&mut self) -> StorageBackedU64<'_, W> {
        self.storage.at(ARBOS_STATE_BROTLI_COMPRESSION_LEVEL_OFFSET)
    }

    pub fn native_token_enabled_time(&mut self) -> StorageBackedU64<'_, W> {
        self.storage
            .at(ARBOS_STATE_NATIVE_TOKEN_ENABLED_FROM_TIME_OFFSET)
    }

    fn features(&mut self) -> StorageBackedU256<'_, W> {
        self.storage.open(ARBOS_STATE_FEATURES_KEY).at_owned(0)
    }

    pub fn is_calldata_price_increase_enabled(&mut self) -> Result<bool, ArbosStateError> {
        Ok(self.features().get()?.bit(FEATURE_CALLDATA_PRICE_INCREASE_BIT))
    }

    pub fn set_calldata_price_increase(&mut self, enabled: bool) -> Result<(), ArbosStateError> {
        let mut features = self.features().get()?;
        features.set_bit(FEATURE_CALLDATA_PRICE_INCREASE_BIT, enabled);
        self.features().set(features)
    }

    pub fn chain_owners(&mut self) -> StorageBackedAddressSet<'_, W> {
        StorageBackedAddressSet::new(self.storage.open(ARBOS_CHAIN_OWNERS_KEY))
    }

    pub fn is_chain_owner(&mut self, address: Address) -> Result<bool, ArbosStateError> {
        self.chain_owners().contains(address)
    }

    pub fn native_token_owners(&mut self) -> StorageBackedAddressSet<'_, W> {
        StorageBackedAddressSet::new(self.storage.open(ARBOS_STATE_NATIVE_TOKEN_OWNER_KEY))
    }

    pub fn is_native_token_owner(&mut self, address: Address) -> Result<bool, ArbosStateError> {
        self.native_token_owners().contains(address)
    }

    pub fn address_table(&mut self) -> AddressTable<'_, W> {
        AddressTable::new(self.storage.open(ARBOS_STATE_ADDRESS_TABLE_KEY))
    }

    pub fn l1_pricing(&mut self) -> L1Pricing<'_, W> {
        L1Pricing::new(self.storage.open(ARBOS_STATE_L1_PRICING_KEY))
    }

    pub fn l2_pricing(&mut self) -> L2Pricing<'_, W> {
        L2Pricing::new(self.storage.open(ARBOS_STATE_L2_PRICING_KEY))
    }

    pub fn retryables(&mut self) -> RetryableState<'_, W> {
        RetryableState::new(self.storage.open(ARBOS_STATE_RETRYABLES_KEY))
    }

    pub fn programs(&mut self) -> Programs<'_, W> {
        Programs::new(self.storage.open(ARBOS_STATE_PROGRAMS_KEY))
    }

    pub fn schedule_upgrade(&mut self, version: u64, timestamp: u64) -> Result<(), ArbosStateError> {
        self.upgrade_version().set(version)?;
        self.upgrade_timestamp().set(timestamp)
    }

    /// Pending upgrade as `(version, timestamp)`, or `(0, 0)` when nothing newer is scheduled.
    pub fn scheduled_upgrade(&mut self) -> Result<(u64, u64), ArbosStateError> {
        let version = self.upgrade_version().get()?;
        let timestamp = self.upgrade_timestamp().get()?;
        if self.arbos_version >= version {
            return Ok((0, 0));
        }
        Ok((version, timestamp))
    }

    pub fn world(&mut self) -> &mut W {
        self.storage.world()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world_state::InMemoryWorldState;

    #[test]
    fn genesis_values_are_readable() {
        let mut world = InMemoryWorldState::new();
        let owner = Address::repeat_byte(0xaa);
        let params = ArbosStateParams {
            arbos_version: 30,
            chain_owner: owner,
            ..Default::default()
        };

        let mut state = ArbState::new(&mut world, None, false, 30);
        state.initialize(&params).unwrap();

        assert_eq!(state.stored_version().get().unwrap(), 30);
        assert_eq!(state.chain_id().get().unwrap(), params.chain_id);
        assert_eq!(state.brotli_compression_level().get().unwrap(), 1);
        assert!(state.is_chain_owner(owner).unwrap());
        assert_eq!(state.chain_owners().all().unwrap(), vec![owner]);
    }

    #[test]
    fn scheduled_upgrade_hides_past_versions() {
        let mut world = InMemoryWorldState::new();
        let mut state = ArbState::new(&mut world, None, false, 30);

        state.schedule_upgrade(31, 1_700_000_000).unwrap();
        assert_eq!(state.scheduled_upgrade().unwrap(), (31, 1_700_000_000));

        state.schedule_upgrade(30, 1_700_000_000).unwrap();
        assert_eq!(state.scheduled_upgrade().unwrap(), (0, 0));
    }

    #[test]
    fn feature_bits_toggle() {
        let mut world = InMemoryWorldState::new();
        let mut state = ArbState::new(&mut world, None, false, 40);

        assert!(!state.is_calldata_price_increase_enabled().unwrap());
        state.set_calldata_price_increase(true).unwrap();
        assert!(state.is_calldata_price_increase_enabled().unwrap());
        state.set_calldata_price_increase(false).unwrap();
        assert!(!state.is_calldata_price_increase_enabled().unwrap());
    }
}
