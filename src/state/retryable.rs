use revm::primitives::{Address, B256, Bytes, U256, keccak256};
use tracing::debug;

use crate::{
    constants::{RETRYABLE_ESCROW_PREFIX, RETRYABLE_LIFETIME_SECONDS, RETRYABLE_REAP_PRICE},
    state::types::{
        ArbosStateError, Storage, StorageBackedAddress, StorageBackedAddressOrNil,
        StorageBackedBytes, StorageBackedQueue, StorageBackedU64, StorageBackedU256,
    },
    transaction::ArbitrumRetryTx,
    world_state::WorldState,
};

const ARBOS_STATE_RETRYABLE_TIMEOUT_QUEUE_KEY: &[u8] = &[0];
const ARBOS_STATE_RETRYABLE_CALLDATA_KEY: &[u8] = &[1];

const NUM_TRIES_OFFSET: u64 = 0;
const FROM_OFFSET: u64 = 1;
const TO_OFFSET: u64 = 2;
const CALLVALUE_OFFSET: u64 = 3;
const BENEFICIARY_OFFSET: u64 = 4;
const TIMEOUT_OFFSET: u64 = 5;
const TIMEOUT_WINDOWS_LEFT_OFFSET: u64 = 6;

/// Account holding a retryable's call value until it is redeemed or deleted.
pub fn retryable_escrow_address(ticket_id: B256) -> Address {
    let mut preimage = Vec::with_capacity(RETRYABLE_ESCROW_PREFIX.len() + 32);
    preimage.extend_from_slice(RETRYABLE_ESCROW_PREFIX);
    preimage.extend_from_slice(ticket_id.as_slice());
    Address::from_slice(&keccak256(preimage)[12..])
}

/// Fields of a ticket at creation time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewRetryable {
    pub id: B256,
    pub timeout: u64,
    pub from: Address,
    pub to: Option<Address>,
    pub callvalue: U256,
    pub beneficiary: Address,
    pub calldata: Bytes,
}

pub struct RetryableState<'a, W> {
    storage: Storage<'a, W>,
}

impl<'a, W: WorldState> RetryableState<'a, W> {
    pub fn new(storage: Storage<'a, W>) -> Self {
        Self { storage }
    }

    pub fn initialize(&mut self) -> Result<(), ArbosStateError> {
        self.timeout_queue().initialize()
    }

    pub fn timeout_queue(&mut self) -> StorageBackedQueue<'_, W> {
        StorageBackedQueue::new(self.storage.open(ARBOS_STATE_RETRYABLE_TIMEOUT_QUEUE_KEY))
    }

    /// Ticket storage without the liveness check.
    pub fn retryable(&mut self, id: B256) -> Retryable<'_, W> {
        Retryable::new(self.storage.open(id.as_slice()), id)
    }

    /// Returns the ticket if it exists and has not passed its current timeout.
    pub fn open(&mut self, id: B256, now: u64) -> Result<Option<Retryable<'_, W>>, ArbosStateError> {
        let timeout = self.retryable(id).timeout().get()?;
        if timeout == 0 || timeout < now {
            return Ok(None);
        }
        Ok(Some(self.retryable(id)))
    }

    pub fn create(&mut self, ticket: NewRetryable) -> Result<(), ArbosStateError> {
        let mut retryable = self.retryable(ticket.id);
        retryable.num_tries().set(0)?;
        retryable.from().set(ticket.from)?;
        retryable.to().set(ticket.to)?;
        retryable.callvalue().set(ticket.callvalue)?;
        retryable.beneficiary().set(ticket.beneficiary)?;
        retryable.calldata().set(&ticket.calldata)?;
        retryable.timeout().set(ticket.timeout)?;
        retryable.timeout_windows_left().set(0)?;

        self.timeout_queue().push(ticket.id)?;
        debug!(
            target: "arbos-precompiles::retryable",
            id = %ticket.id,
            timeout = ticket.timeout,
            "created retryable"
        );
        Ok(())
    }

    /// Storage footprint used to price operations on the ticket; zero when it is not open.
    pub fn size_bytes(&mut self, id: B256, now: u64) -> Result<u64, ArbosStateError> {
        let Some(mut retryable) = self.open(id, now)? else {
            return Ok(0);
        };
        let calldata_len = retryable.calldata().size()?;
        let calldata = 32 + 32 * calldata_len.div_ceil(32);
        Ok(6 * 32 + calldata)
    }

    /// Refunds the escrow to the beneficiary and wipes the ticket. Returns false if there was
    /// nothing to delete.
    pub fn delete(&mut self, id: B256) -> Result<bool, ArbosStateError> {
        let mut retryable = self.retryable(id);
        if retryable.timeout().get()? == 0 {
            return Ok(false);
        }

        let beneficiary = retryable.beneficiary().get()?;
        let escrow = retryable_escrow_address(id);
        let world = retryable.storage.world();
        let balance = world.balance(escrow)?;
        world.transfer(escrow, beneficiary, balance)?;

        retryable.clear()?;
        debug!(
            target: "arbos-precompiles::retryable",
            %id,
            %beneficiary,
            refunded = %balance,
            "deleted retryable"
        );
        Ok(true)
    }

    /// Adds one lifetime window to an open ticket and returns its new effective timeout.
    pub fn keepalive(&mut self, id: B256, now: u64, limit: u64) -> Result<u64, ArbosStateError> {
        let timeout = match self.open(id, now)? {
            Some(mut retryable) => retryable.effective_timeout()?,
            None => return Err(ArbosStateError::RetryableNotFound(id)),
        };
        if timeout > limit {
            return Err(ArbosStateError::RetryableTimeoutTooFar);
        }

        // Each window gets its own queue entry; only the last one deletes the ticket.
        self.timeout_queue().push(id)?;
        self.retryable(id).timeout_windows_left().increment()?;
        self.storage.burn(RETRYABLE_REAP_PRICE)?;

        let extended = timeout + RETRYABLE_LIFETIME_SECONDS;
        debug!(
            target: "arbos-precompiles::retryable",
            %id,
            new_timeout = extended,
            "extended retryable lifetime"
        );
        Ok(extended)
    }

    /// Processes the head of the timeout queue once, if it is due.
    pub fn try_reap_one(&mut self, now: u64) -> Result<(), ArbosStateError> {
        let Some(id) = self.timeout_queue().peek()? else {
            return Ok(());
        };

        let timeout = self.retryable(id).timeout().get()?;
        if timeout == 0 {
            // Already deleted; drop the stale entry.
            self.timeout_queue().pop()?;
            return Ok(());
        }
        if timeout >= now {
            return Ok(());
        }

        self.timeout_queue().pop()?;
        let windows_left = self.retryable(id).timeout_windows_left().get()?;
        if windows_left == 0 {
            self.delete(id)?;
            return Ok(());
        }

        let mut retryable = self.retryable(id);
        retryable
            .timeout()
            .set(timeout.saturating_add(RETRYABLE_LIFETIME_SECONDS))?;
        retryable.timeout_windows_left().set(windows_left - 1)
    }
}

pub struct Retryable<'a, W> {
    storage: Storage<'a, W>,
    id: B256,
}

impl<'a, W: WorldState> Retryable<'a, W> {
    pub fn new(storage: Storage<'a, W>, id: B256) -> Self {
        Self { storage, id }
    }

    #[inline]
    pub fn id(&self) -> B256 {
        self.id
    }

    pub fn num_tries(&mut self) -> StorageBackedU64<'_, W> {
        self.storage.at(NUM_TRIES_OFFSET)
    }

    pub fn from(&mut self) -> StorageBackedAddress<'_, W> {
        self.storage.at(FROM_OFFSET)
    }

    pub fn to(&mut self) -> StorageBackedAddressOrNil<'_, W> {
        self.storage.at(TO_OFFSET)
    }

    pub fn callvalue(&mut self) -> StorageBackedU256<'_, W> {
        self.storage.at(CALLVALUE_OFFSET)
    }

    pub fn beneficiary(&mut self) -> StorageBackedAddress<'_, W> {
        self.storage.at(BENEFICIARY_OFFSET)
    }

    pub fn calldata(&mut self) -> StorageBackedBytes<'_, W> {
        StorageBackedBytes::new(self.storage.open(ARBOS_STATE_RETRYABLE_CALLDATA_KEY))
    }

    pub fn timeout(&mut self) -> StorageBackedU64<'_, W> {
        self.storage.at(TIMEOUT_OFFSET)
    }

    pub fn timeout_windows_left(&mut self) -> StorageBackedU64<'_, W> {
        self.storage.at(TIMEOUT_WINDOWS_LEFT_OFFSET)
    }

    /// Timeout including every lifetime window bought through keepalive.
    pub fn effective_timeout(&mut self) -> Result<u64, ArbosStateError> {
        let timeout = self.timeout().get()?;
        let windows = self.timeout_windows_left().get()?;
        Ok(timeout.saturating_add(windows.saturating_mul(RETRYABLE_LIFETIME_SECONDS)))
    }

    pub fn clear(&mut self) -> Result<(), ArbosStateError> {
        self.num_tries().clear()?;
        self.from().clear()?;
        self.to().clear()?;
        self.callvalue().clear()?;
        self.beneficiary().clear()?;
        self.timeout().clear()?;
        self.timeout_windows_left().clear()?;
        self.calldata().clear()
    }

    /// Builds the retry transaction for one redeem attempt from the stored ticket fields.
    #[allow(clippy::too_many_arguments)]
    pub fn make_tx(
        &mut self,
        chain_id: U256,
        nonce: u64,
        gas_fee_cap: U256,
        gas: u64,
        refund_to: Address,
        max_refund: U256,
        submission_fee_refund: U256,
    ) -> Result<ArbitrumRetryTx, ArbosStateError> {
        Ok(ArbitrumRetryTx {
            chain_id,
            nonce,
            from: self.from().get()?,
            gas_fee_cap,
            gas,
            to: self.to().get()?,
            value: self.callvalue().get()?,
            data: self.calldata().get()?.into(),
            ticket_id: self.id,
            refund_to,
            max_refund,
            submission_fee_refund,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{gas::GasMeter, world_state::InMemoryWorldState};

    fn root() -> B256 {
        B256::with_last_byte(2)
    }

    fn ticket(id: u8, timeout: u64) -> NewRetryable {
        NewRetryable {
            id: B256::with_last_byte(id),
            timeout,
            from: Address::repeat_byte(0x01),
            to: Some(Address::repeat_byte(0x02)),
            callvalue: U256::from(10),
            beneficiary: Address::repeat_byte(0x03),
            calldata: Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
        }
    }

    fn state(world: &mut InMemoryWorldState) -> RetryableState<'_, InMemoryWorldState> {
        let mut state = RetryableState::new(Storage::new(world, None, false, root()));
        state.initialize().unwrap();
        state
    }

    #[test]
    fn open_respects_timeout() {
        let mut world = InMemoryWorldState::new();
        let mut retryables = state(&mut world);
        retryables.create(ticket(1, 100)).unwrap();

        let id = B256::with_last_byte(1);
        assert!(retryables.open(id, 100).unwrap().is_some());
        assert!(retryables.open(id, 101).unwrap().is_none());
        assert!(retryables.open(B256::with_last_byte(9), 0).unwrap().is_none());
        assert_eq!(retryables.size_bytes(id, 50).unwrap(), 6 * 32 + 32 + 32);
        assert_eq!(retryables.size_bytes(id, 500).unwrap(), 0);
    }

    #[test]
    fn stored_fields_round_trip() {
        let mut world = InMemoryWorldState::new();
        let mut retryables = state(&mut world);
        let mut contract_creation = ticket(1, 100);
        contract_creation.to = None;
        retryables.create(contract_creation.clone()).unwrap();

        let mut retryable = retryables.open(contract_creation.id, 0).unwrap().unwrap();
        assert_eq!(retryable.to().get().unwrap(), None);
        assert_eq!(retryable.from().get().unwrap(), contract_creation.from);
        assert_eq!(retryable.calldata().get().unwrap(), contract_creation.calldata.to_vec());
    }

    #[test]
    fn keepalive_adds_a_window() {
        let mut world = InMemoryWorldState::new();
        let mut gas = GasMeter::new(10_000_000);
        let mut retryables =
            RetryableState::new(Storage::new(&mut world, Some(&mut gas), false, root()));
        retryables.initialize().unwrap();
        let id = B256::with_last_byte(1);
        retryables.create(ticket(1, 1_000)).unwrap();

        let now = 10;
        let new_timeout = retryables
            .keepalive(id, now, now + RETRYABLE_LIFETIME_SECONDS)
            .unwrap();
        assert_eq!(new_timeout, 1_000 + RETRYABLE_LIFETIME_SECONDS);
        assert_eq!(
            retryables.retryable(id).effective_timeout().unwrap(),
            new_timeout
        );

        assert_eq!(
            retryables.keepalive(id, now, now + RETRYABLE_LIFETIME_SECONDS),
            Err(ArbosStateError::RetryableTimeoutTooFar)
        );
        assert_eq!(
            retryables.keepalive(B256::with_last_byte(7), now, u64::MAX),
            Err(ArbosStateError::RetryableNotFound(B256::with_last_byte(7)))
        );
    }

    #[test]
    fn delete_refunds_escrow() {
        let id = B256::with_last_byte(1);
        let escrow = retryable_escrow_address(id);
        let mut world = InMemoryWorldState::new().with_balance(escrow, U256::from(77));

        let mut retryables = state(&mut world);
        retryables.create(ticket(1, 100)).unwrap();
        assert!(retryables.delete(id).unwrap());
        assert!(!retryables.delete(id).unwrap());
        assert!(retryables.open(id, 0).unwrap().is_none());

        assert_eq!(world.balance(Address::repeat_byte(0x03)).unwrap(), U256::from(77));
        assert_eq!(world.balance(escrow).unwrap(), U256::ZERO);
    }

    #[test]
    fn reaping_rolls_over_then_deletes() {
        let mut world = InMemoryWorldState::new();
        let mut retryables = state(&mut world);
        let id = B256::with_last_byte(1);
        retryables.create(ticket(1, 100)).unwrap();
        retryables
            .keepalive(id, 50, 50 + RETRYABLE_LIFETIME_SECONDS)
            .unwrap();

        // Not yet due.
        retryables.try_reap_one(100).unwrap();
        assert_eq!(retryables.timeout_queue().size().unwrap(), 2);

        // First entry rolls the ticket into its extra window.
        retryables.try_reap_one(101).unwrap();
        assert_eq!(retryables.timeout_queue().size().unwrap(), 1);
        let mut retryable = retryables.retryable(id);
        assert_eq!(retryable.timeout().get().unwrap(), 100 + RETRYABLE_LIFETIME_SECONDS);
        assert_eq!(retryable.timeout_windows_left().get().unwrap(), 0);

        // Second entry deletes it once the window passes.
        retryables
            .try_reap_one(101 + RETRYABLE_LIFETIME_SECONDS)
            .unwrap();
        assert!(retryables.timeout_queue().is_empty().unwrap());
        assert_eq!(retryables.retryable(id).timeout().get().unwrap(), 0);
    }

    #[test]
    fn escrow_address_is_stable() {
        let id = B256::with_last_byte(1);
        assert_eq!(retryable_escrow_address(id), retryable_escrow_address(id));
        assert_ne!(
            retryable_escrow_address(id),
            retryable_escrow_address(B256::with_last_byte(2))
        );
    }
}
