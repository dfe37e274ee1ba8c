use core::marker::PhantomData;

use revm::{
    interpreter::gas::{ISTANBUL_SLOAD_GAS, SSTORE_RESET, SSTORE_SET},
    primitives::{Address, B256, I256, U256, keccak256},
};
use tracing::trace;

use crate::{
    constants::ARBOS_STATE_ADDRESS,
    gas::{GasMeter, OutOfGas},
    world_state::{WorldState, WorldStateError},
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArbosStateError {
    #[error("out of gas")]
    OutOfGas,
    #[error("state change attempted during static call")]
    StateChangeDuringStaticCall,
    #[error("decompression error: {0}")]
    DecompressError(String),
    #[error("RectifyMapping: Address is not an owner")]
    RectifyMappingNotOwner,
    #[error("RectifyMapping: Owner address is correctly mapped")]
    RectifyMappingNoChange,
    #[error("{0}")]
    AlreadyExists(String),
    #[error("ticketId not found")]
    RetryableNotFound(B256),
    #[error("timeout too far into the future")]
    RetryableTimeoutTooFar,
    #[error(transparent)]
    WorldState(#[from] WorldStateError),
}

impl From<OutOfGas> for ArbosStateError {
    fn from(_: OutOfGas) -> Self {
        Self::OutOfGas
    }
}

pub fn substorage(root: &B256, index: &[u8]) -> B256 {
    let mut subkey_bytes = if root.is_zero() {
        Vec::with_capacity(index.len())
    } else {
        root.as_slice().to_vec()
    };
    subkey_bytes.extend_from_slice(index);
    keccak256(subkey_bytes)
}

/// Hashes all but the last byte of `key` under `storage_key`, keeping the last byte so that
/// neighbouring offsets land in neighbouring slots.
pub fn map_address(storage_key: &B256, key: &B256) -> B256 {
    let key_bytes = key.as_slice();
    let boundary = key_bytes.len() - 1;

    let mut to_hash = Vec::with_capacity(storage_key.len() + boundary);
    if !storage_key.is_zero() {
        to_hash.extend_from_slice(storage_key.as_slice());
    }
    to_hash.extend_from_slice(&key_bytes[..boundary]);

    let digest = keccak256(&to_hash);

    let mut mapped = digest[..boundary].to_vec();
    mapped.push(key_bytes[boundary]);
    B256::from_slice(&mapped)
}

#[inline]
pub(crate) fn offset_key(offset: u64) -> B256 {
    B256::from(U256::from(offset))
}

/// Anything that can round-trip through a single storage word (U256).
pub trait StorageWord: Sized {
    /// Decode from the raw storage word.
    fn from_word(word: U256) -> Self;

    /// Encode into the raw storage word.
    fn into_word(self) -> U256;
}

impl StorageWord for U256 {
    fn from_word(word: U256) -> Self {
        word
    }

    fn into_word(self) -> U256 {
        self
    }
}

impl StorageWord for I256 {
    fn from_word(word: U256) -> Self {
        Self::from_raw(word)
    }

    fn into_word(self) -> U256 {
        self.into_raw()
    }
}

impl StorageWord for B256 {
    fn from_word(word: U256) -> Self {
        Self::from(word)
    }

    fn into_word(self) -> U256 {
        U256::from_be_bytes(self.0)
    }
}

impl StorageWord for Address {
    fn from_word(word: U256) -> Self {
        Self::from_slice(&word.to_be_bytes::<32>()[12..])
    }

    fn into_word(self) -> U256 {
        U256::from_be_slice(self.as_slice())
    }
}

/// `None` is kept as `1 << 255`, a value no address can take.
impl StorageWord for Option<Address> {
    fn from_word(word: U256) -> Self {
        if word == U256::ONE << 255 {
            None
        } else {
            Some(<Address as StorageWord>::from_word(word))
        }
    }

    fn into_word(self) -> U256 {
        match self {
            Some(address) => <Address as StorageWord>::into_word(address),
            None => U256::ONE << 255,
        }
    }
}

impl StorageWord for u64 {
    fn from_word(word: U256) -> Self {
        word.saturating_to()
    }

    fn into_word(self) -> U256 {
        U256::from(self)
    }
}

/// A keyed region of the ArbOS account's storage plus the meter that pays for touching it.
pub struct Storage<'a, W> {
    world: &'a mut W,
    gas: Option<&'a mut GasMeter>,
    is_static: bool,
    key: B256,
}

impl<'a, W: WorldState> Storage<'a, W> {
    pub fn new(world: &'a mut W, gas: Option<&'a mut GasMeter>, is_static: bool, key: B256) -> Self {
        Self {
            world,
            gas,
            is_static,
            key,
        }
    }

    #[inline]
    pub fn key(&self) -> B256 {
        self.key
    }

    /// Same region, shorter borrow.
    pub fn reborrow(&mut self) -> Storage<'_, W> {
        Storage::new(self.world, self.gas.as_deref_mut(), self.is_static, self.key)
    }

    /// Child region keyed by `keccak(key || id)`.
    pub fn open(&mut self, id: &[u8]) -> Storage<'_, W> {
        let key = substorage(&self.key, id);
        Storage::new(self.world, self.gas.as_deref_mut(), self.is_static, key)
    }

    /// Value at a small numeric offset inside this region.
    pub fn at<T: StorageWord>(&mut self, offset: u64) -> StorageBacked<'_, W, T> {
        self.at_key(offset_key(offset))
    }

    /// Like [`Storage::at`], but reads and writes are not charged.
    pub fn at_unmetered<T: StorageWord>(&mut self, offset: u64) -> StorageBacked<'_, W, T> {
        let slot = map_address(&self.key, &offset_key(offset));
        StorageBacked::new(self.world, None, self.is_static, slot)
    }

    /// Value at an arbitrary 32-byte key inside this region.
    pub fn at_key<T: StorageWord>(&mut self, key: B256) -> StorageBacked<'_, W, T> {
        let slot = map_address(&self.key, &key);
        StorageBacked::new(self.world, self.gas.as_deref_mut(), self.is_static, slot)
    }

    pub fn burn(&mut self, amount: u64) -> Result<(), ArbosStateError> {
        if let Some(gas) = self.gas.as_deref_mut() {
            gas.burn(amount)?;
        }
        Ok(())
    }

    pub fn world(&mut self) -> &mut W {
        self.world
    }
}

pub struct StorageBacked<'a, W, T> {
    world: &'a mut W,
    gas: Option<&'a mut GasMeter>,
    is_static: bool,
    slot: B256,
    _marker: PhantomData<T>,
}

pub type StorageBackedU256<'a, W> = StorageBacked<'a, W, U256>;
pub type StorageBackedU64<'a, W> = StorageBacked<'a, W, u64>;
pub type StorageBackedI256<'a, W> = StorageBacked<'a, W, I256>;
pub type StorageBackedAddress<'a, W> = StorageBacked<'a, W, Address>;
pub type StorageBackedAddressOrNil<'a, W> = StorageBacked<'a, W, Option<Address>>;
pub type StorageBackedB256<'a, W> = StorageBacked<'a, W, B256>;

impl<'a, W: WorldState, T: StorageWord> StorageBacked<'a, W, T> {
    pub fn new(world: &'a mut W, gas: Option<&'a mut GasMeter>, is_static: bool, slot: B256) -> Self {
        Self {
            world,
            gas,
            is_static,
            slot,
            _marker: PhantomData,
        }
    }

    pub fn get(&mut self) -> Result<T, ArbosStateError> {
        if let Some(gas) = self.gas.as_deref_mut() {
            gas.burn(ISTANBUL_SLOAD_GAS)?;
        }

        let word = self.world.sload(ARBOS_STATE_ADDRESS, self.slot)?;
        Ok(T::from_word(word))
    }

    pub fn set(&mut self, value: T) -> Result<(), ArbosStateError> {
        if self.is_static {
            return Err(ArbosStateError::StateChangeDuringStaticCall);
        }

        let value = value.into_word();

        if let Some(gas) = self.gas.as_deref_mut() {
            gas.burn(if value.is_zero() { SSTORE_RESET } else { SSTORE_SET })?;
        }

        trace!(
            target: "arbos-precompiles::arbos_state",
            slot = %self.slot,
            %value,
            "storage write"
        );

        self.world.sstore(ARBOS_STATE_ADDRESS, self.slot, value)?;
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), ArbosStateError> {
        self.set(T::from_word(U256::ZERO))
    }
}

impl<W: WorldState> StorageBacked<'_, W, u64> {
    /// Adds one and returns the new value.
    pub fn increment(&mut self) -> Result<u64, ArbosStateError> {
        let next = self.get()?.saturating_add(1);
        self.set(next)?;
        Ok(next)
    }

    /// Subtracts one and returns the new value.
    pub fn decrement(&mut self) -> Result<u64, ArbosStateError> {
        let next = self.get()?.saturating_sub(1);
        self.set(next)?;
        Ok(next)
    }
}

/// Address set laid out as an array with its length at offset 0 and members at 1..=len, plus a
/// reverse index from address to array position.
pub struct StorageBackedAddressSet<'a, W> {
    storage: Storage<'a, W>,
}

const ADDRESS_SET_BY_ADDRESS_KEY: &[u8] = &[0];

impl<'a, W: WorldState> StorageBackedAddressSet<'a, W> {
    pub fn new(storage: Storage<'a, W>) -> Self {
        Self { storage }
    }

    fn by_address(&mut self, address: Address) -> StorageBackedU64<'_, W> {
        self.storage
            .open(ADDRESS_SET_BY_ADDRESS_KEY)
            .at_key_owned(B256::left_padding_from(address.as_slice()))
    }

    pub fn size(&mut self) -> Result<u64, ArbosStateError> {
        self.storage.at::<u64>(0).get()
    }

    pub fn all(&mut self) -> Result<Vec<Address>, ArbosStateError> {
        let size = self.size()?;
        let mut out = Vec::with_capacity(size as usize);
        for index in 1..=size {
            out.push(self.storage.at::<Address>(index).get()?);
        }
        Ok(out)
    }

    pub fn contains(&mut self, address: Address) -> Result<bool, ArbosStateError> {
        Ok(self.by_address(address).get()? != 0)
    }

    pub fn add(&mut self, address: Address) -> Result<(), ArbosStateError> {
        if self.contains(address)? {
            return Ok(());
        }

        let slot = self.storage.at::<u64>(0).increment()?;
        self.storage.at::<Address>(slot).set(address)?;
        self.by_address(address).set(slot)
    }

    /// Removes `address`, moving the last member into the hole. Before ArbOS 11 the moved
    /// member's reverse index was left stale; [`Self::rectify`] repairs such entries.
    pub fn remove(&mut self, address: Address, arbos_version: u64) -> Result<(), ArbosStateError> {
        let slot = self.by_address(address).get()?;
        if slot == 0 {
            return Ok(());
        }
        self.by_address(address).clear()?;

        let size = self.size()?;
        if slot < size {
            let at_size = self.storage.at::<Address>(size).get()?;
            self.storage.at::<Address>(slot).set(at_size)?;
            if arbos_version >= crate::constants::ARBOS_VERSION_11 {
                self.by_address(at_size).set(slot)?;
            }
        }

        self.storage.at::<Address>(size).clear()?;
        self.storage.at::<u64>(0).decrement()?;
        Ok(())
    }

    pub fn rectify(&mut self, address: Address) -> Result<(), ArbosStateError> {
        if !self.contains(address)? {
            return Err(ArbosStateError::RectifyMappingNotOwner);
        }

        let slot = self.by_address(address).get()?;
        let at_slot = self.storage.at::<Address>(slot).get()?;
        let size = self.size()?;
        if at_slot == address && slot <= size {
            return Err(ArbosStateError::RectifyMappingNoChange);
        }

        self.by_address(address).clear()?;
        self.add(address)
    }
}

impl<'a, W: WorldState> Storage<'a, W> {
    /// Like [`Storage::at_key`], consuming the handle so the value may outlive it.
    pub fn at_key_owned<T: StorageWord>(self, key: B256) -> StorageBacked<'a, W, T> {
        let slot = map_address(&self.key, &key);
        StorageBacked::new(self.world, self.gas, self.is_static, slot)
    }

    /// Like [`Storage::open`], consuming the handle.
    pub fn open_owned(self, id: &[u8]) -> Storage<'a, W> {
        let key = substorage(&self.key, id);
        Storage::new(self.world, self.gas, self.is_static, key)
    }

    /// Like [`Storage::at`], consuming the handle.
    pub fn at_owned<T: StorageWord>(self, offset: u64) -> StorageBacked<'a, W, T> {
        self.at_key_owned(offset_key(offset))
    }
}

/// Byte string stored as its length at offset 0 followed by 32-byte chunks; a trailing partial
/// chunk is right-aligned in its slot.
pub struct StorageBackedBytes<'a, W> {
    storage: Storage<'a, W>,
}

impl<'a, W: WorldState> StorageBackedBytes<'a, W> {
    pub fn new(storage: Storage<'a, W>) -> Self {
        Self { storage }
    }

    pub fn size(&mut self) -> Result<u64, ArbosStateError> {
        self.storage.at::<u64>(0).get()
    }

    pub fn get(&mut self) -> Result<Vec<u8>, ArbosStateError> {
        let mut bytes_left = self.size()?;
        let mut out = Vec::with_capacity(bytes_left as usize);
        let mut offset = 1;
        while bytes_left >= 32 {
            out.extend_from_slice(self.storage.at::<B256>(offset).get()?.as_slice());
            bytes_left -= 32;
            offset += 1;
        }
        let last = self.storage.at::<B256>(offset).get()?;
        out.extend_from_slice(&last[32 - bytes_left as usize..]);
        Ok(out)
    }

    pub fn set(&mut self, value: &[u8]) -> Result<(), ArbosStateError> {
        self.clear()?;
        self.storage.at::<u64>(0).set(value.len() as u64)?;

        let mut chunks = value.chunks_exact(32);
        let mut offset = 1;
        for chunk in chunks.by_ref() {
            self.storage.at::<B256>(offset).set(B256::from_slice(chunk))?;
            offset += 1;
        }
        let remainder = chunks.remainder();
        self.storage
            .at::<B256>(offset)
            .set(B256::left_padding_from(remainder))
    }

    pub fn clear(&mut self) -> Result<(), ArbosStateError> {
        let mut bytes_left = self.size()?;
        let mut offset = 1;
        while bytes_left > 0 {
            self.storage.at::<B256>(offset).clear()?;
            offset += 1;
            bytes_left = bytes_left.saturating_sub(32);
        }
        self.storage.at::<u64>(0).clear()
    }
}

const QUEUE_NEXT_PUT_OFFSET: u64 = 0;
const QUEUE_NEXT_GET_OFFSET: u64 = 1;
/// First element offset; 0 and 1 hold the cursors.
const QUEUE_FIRST_ELEMENT: u64 = 2;

/// FIFO of 32-byte words between two persistent cursors.
pub struct StorageBackedQueue<'a, W> {
    storage: Storage<'a, W>,
}

impl<'a, W: WorldState> StorageBackedQueue<'a, W> {
    pub fn new(storage: Storage<'a, W>) -> Self {
        Self { storage }
    }

    pub fn initialize(&mut self) -> Result<(), ArbosStateError> {
        self.storage
            .at::<u64>(QUEUE_NEXT_PUT_OFFSET)
            .set(QUEUE_FIRST_ELEMENT)?;
        self.storage
            .at::<u64>(QUEUE_NEXT_GET_OFFSET)
            .set(QUEUE_FIRST_ELEMENT)
    }

    pub fn size(&mut self) -> Result<u64, ArbosStateError> {
        let put = self.storage.at::<u64>(QUEUE_NEXT_PUT_OFFSET).get()?;
        let get = self.storage.at::<u64>(QUEUE_NEXT_GET_OFFSET).get()?;
        Ok(put.saturating_sub(get))
    }

    pub fn is_empty(&mut self) -> Result<bool, ArbosStateError> {
        Ok(self.size()? == 0)
    }

    pub fn peek(&mut self) -> Result<Option<B256>, ArbosStateError> {
        if self.is_empty()? {
            return Ok(None);
        }
        let get = self.storage.at::<u64>(QUEUE_NEXT_GET_OFFSET).get()?;
        self.storage.at::<B256>(get).get().map(Some)
    }

    pub fn pop(&mut self) -> Result<Option<B256>, ArbosStateError> {
        if self.is_empty()? {
            return Ok(None);
        }
        let next = self
            .storage
            .at::<u64>(QUEUE_NEXT_GET_OFFSET)
            .increment()?;
        let value = self.storage.at::<B256>(next - 1).get()?;
        self.storage.at::<B256>(next - 1).clear()?;
        Ok(Some(value))
    }

    pub fn push(&mut self, value: B256) -> Result<(), ArbosStateError> {
        let next = self
            .storage
            .at::<u64>(QUEUE_NEXT_PUT_OFFSET)
            .increment()?;
        self.storage.at::<B256>(next - 1).set(value)
    }
}
