use alloy_rlp::{Decodable, Encodable, Header};
use revm::primitives::{Address, B256, Bytes};

use crate::{
    state::types::{ArbosStateError, Storage, StorageBackedU64},
    world_state::WorldState,
};

const ADDRESS_TABLE_BY_ADDRESS_KEY: &[u8] = &[];
const ADDRESS_TABLE_SIZE_OFFSET: u64 = 0;

/// Append-only registry assigning each address a dense zero-based index.
pub struct AddressTable<'a, W> {
    storage: Storage<'a, W>,
}

impl<'a, W: WorldState> AddressTable<'a, W> {
    pub fn new(storage: Storage<'a, W>) -> Self {
        Self { storage }
    }

    /// One-based position of `address`, or zero when absent.
    fn by_address(&mut self, address: Address) -> StorageBackedU64<'_, W> {
        self.storage
            .open(ADDRESS_TABLE_BY_ADDRESS_KEY)
            .at_key_owned(B256::left_padding_from(address.as_slice()))
    }

    pub fn register(&mut self, address: Address) -> Result<u64, ArbosStateError> {
        let existing = self.by_address(address).get()?;
        if existing != 0 {
            return Ok(existing - 1);
        }

        let position = self
            .storage
            .at::<u64>(ADDRESS_TABLE_SIZE_OFFSET)
            .increment()?;
        self.storage.at::<Address>(position).set(address)?;
        self.by_address(address).set(position)?;
        Ok(position - 1)
    }

    pub fn lookup(&mut self, address: Address) -> Result<Option<u64>, ArbosStateError> {
        let position = self.by_address(address).get()?;
        Ok(position.checked_sub(1))
    }

    pub fn address_exists(&mut self, address: Address) -> Result<bool, ArbosStateError> {
        Ok(self.lookup(address)?.is_some())
    }

    pub fn size(&mut self) -> Result<u64, ArbosStateError> {
        self.storage.at::<u64>(ADDRESS_TABLE_SIZE_OFFSET).get()
    }

    pub fn lookup_index(&mut self, index: u64) -> Result<Option<Address>, ArbosStateError> {
        if index >= self.size()? {
            return Ok(None);
        }
        self.storage.at::<Address>(index + 1).get().map(Some)
    }

    /// RLP of the table index when registered, of the raw address otherwise.
    pub fn compress(&mut self, address: Address) -> Result<Bytes, ArbosStateError> {
        let mut out = Vec::new();
        match self.lookup(address)? {
            Some(index) => index.encode(&mut out),
            None => address.as_slice().encode(&mut out),
        }
        Ok(out.into())
    }

    /// Inverse of [`Self::compress`]. Returns the address and the number of bytes consumed.
    pub fn decompress(&mut self, data: &[u8]) -> Result<(Address, u64), ArbosStateError> {
        let mut remaining = data;
        let header = Header::decode(&mut { data })
            .map_err(|err| ArbosStateError::DecompressError(err.to_string()))?;

        let address = if !header.list && header.payload_length == 20 {
            Address::decode(&mut remaining)
                .map_err(|err| ArbosStateError::DecompressError(err.to_string()))?
        } else {
            let index = u64::decode(&mut remaining)
                .map_err(|err| ArbosStateError::DecompressError(err.to_string()))?;
            self.lookup_index(index)?.ok_or_else(|| {
                ArbosStateError::DecompressError("invalid index in compressed address".into())
            })?
        };

        let consumed = (data.len() - remaining.len()) as u64;
        Ok((address, consumed))
    }
}
