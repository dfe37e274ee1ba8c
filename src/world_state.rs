//! The account-state collaborator precompiles read from and write to.
//!
//! Precompiles never own state: balances, code and storage belong to the host client and are
//! reached through [`WorldState`]. Each dispatched call runs inside a checkpoint that is
//! committed on success and reverted otherwise, the way revm's journal scopes a call frame.

use auto_impl::auto_impl;
use revm::primitives::{Address, B256, Bytes, HashMap, KECCAK_EMPTY, U256, keccak256};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldStateError {
    #[error("insufficient balance in {address}: have {available}, need {required}")]
    InsufficientBalance {
        address: Address,
        available: U256,
        required: U256,
    },
    #[error("balance overflow in {0}")]
    BalanceOverflow(Address),
    #[error("world state backend: {0}")]
    Backend(String),
}

/// Position in the host's change journal, handed back to [`WorldState::checkpoint_revert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldCheckpoint {
    pub journal_i: usize,
}

#[auto_impl(&mut, Box)]
pub trait WorldState {
    /// Opens a checkpoint. Checkpoints nest.
    fn checkpoint(&mut self) -> WorldCheckpoint;

    /// Closes the innermost checkpoint and keeps its changes.
    fn checkpoint_commit(&mut self);

    /// Closes the innermost checkpoint and undoes every change made since it was opened.
    fn checkpoint_revert(&mut self, checkpoint: WorldCheckpoint);

    fn balance(&mut self, address: Address) -> Result<U256, WorldStateError>;

    fn code(&mut self, address: Address) -> Result<Bytes, WorldStateError>;

    fn code_hash(&mut self, address: Address) -> Result<B256, WorldStateError>;

    fn insert_code(&mut self, address: Address, code: Bytes) -> Result<(), WorldStateError>;

    fn add_balance(&mut self, address: Address, amount: U256) -> Result<(), WorldStateError>;

    fn subtract_balance(&mut self, address: Address, amount: U256)
    -> Result<(), WorldStateError>;

    fn sload(&mut self, address: Address, slot: B256) -> Result<U256, WorldStateError>;

    fn sstore(&mut self, address: Address, slot: B256, value: U256)
    -> Result<(), WorldStateError>;

    /// Moves `amount` wei from `from` to `to`, leaving both untouched on failure.
    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), WorldStateError> {
        if amount.is_zero() || from == to {
            return Ok(());
        }
        self.subtract_balance(from, amount)?;
        if let Err(err) = self.add_balance(to, amount) {
            self.add_balance(from, amount)?;
            return Err(err);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InMemoryAccount {
    pub balance: U256,
    pub code: Bytes,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum JournalEntry {
    AccountChanged {
        address: Address,
        previous: Option<InMemoryAccount>,
    },
    StorageChanged {
        address: Address,
        slot: B256,
        previous: Option<U256>,
    },
}

/// Hash-map backed world state for tests and offline tooling.
#[derive(Clone, Debug, Default)]
pub struct InMemoryWorldState {
    accounts: HashMap<Address, InMemoryAccount>,
    storage: HashMap<(Address, B256), U256>,
    journal: Vec<JournalEntry>,
    depth: usize,
}

impl InMemoryWorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(mut self, address: Address, balance: U256) -> Self {
        self.accounts.entry(address).or_default().balance = balance;
        self
    }

    pub fn account(&self, address: &Address) -> Option<&InMemoryAccount> {
        self.accounts.get(address)
    }

    /// Number of non-zero storage slots held for `address`.
    pub fn storage_len(&self, address: &Address) -> usize {
        self.storage
            .iter()
            .filter(|((owner, _), value)| owner == address && !value.is_zero())
            .count()
    }

    /// Mutable access to `address`, journaling its prior state while a checkpoint is open.
    fn account_mut(&mut self, address: Address) -> &mut InMemoryAccount {
        if self.depth > 0 {
            let previous = self.accounts.get(&address).cloned();
            self.journal
                .push(JournalEntry::AccountChanged { address, previous });
        }
        self.accounts.entry(address).or_default()
    }

    fn undo(&mut self, entry: JournalEntry) {
        match entry {
            JournalEntry::AccountChanged { address, previous } => match previous {
                Some(account) => {
                    self.accounts.insert(address, account);
                }
                None => {
                    self.accounts.remove(&address);
                }
            },
            JournalEntry::StorageChanged {
                address,
                slot,
                previous,
            } => match previous {
                Some(value) => {
                    self.storage.insert((address, slot), value);
                }
                None => {
                    self.storage.remove(&(address, slot));
                }
            },
        }
    }
}

impl WorldState for InMemoryWorldState {
    fn checkpoint(&mut self) -> WorldCheckpoint {
        self.depth += 1;
        WorldCheckpoint {
            journal_i: self.journal.len(),
        }
    }

    fn checkpoint_commit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.journal.clear();
        }
    }

    fn checkpoint_revert(&mut self, checkpoint: WorldCheckpoint) {
        while self.journal.len() > checkpoint.journal_i {
            if let Some(entry) = self.journal.pop() {
                self.undo(entry);
            }
        }
        self.depth = self.depth.saturating_sub(1);
    }

    fn balance(&mut self, address: Address) -> Result<U256, WorldStateError> {
        Ok(self
            .accounts
            .get(&address)
            .map(|account| account.balance)
            .unwrap_or_default())
    }

    fn code(&mut self, address: Address) -> Result<Bytes, WorldStateError> {
        Ok(self
            .accounts
            .get(&address)
            .map(|account| account.code.clone())
            .unwrap_or_default())
    }

    fn code_hash(&mut self, address: Address) -> Result<B256, WorldStateError> {
        match self.accounts.get(&address) {
            Some(account) if !account.code.is_empty() => Ok(keccak256(&account.code)),
            Some(_) => Ok(KECCAK_EMPTY),
            None => Ok(B256::ZERO),
        }
    }

    fn insert_code(&mut self, address: Address, code: Bytes) -> Result<(), WorldStateError> {
        self.account_mut(address).code = code;
        Ok(())
    }

    fn add_balance(&mut self, address: Address, amount: U256) -> Result<(), WorldStateError> {
        let balance = self.balance(address)?;
        let balance = balance
            .checked_add(amount)
            .ok_or(WorldStateError::BalanceOverflow(address))?;
        self.account_mut(address).balance = balance;
        Ok(())
    }

    fn subtract_balance(
        &mut self,
        address: Address,
        amount: U256,
    ) -> Result<(), WorldStateError> {
        let available = self.balance(address)?;
        let balance = available
            .checked_sub(amount)
            .ok_or(WorldStateError::InsufficientBalance {
                address,
                available,
                required: amount,
            })?;
        self.account_mut(address).balance = balance;
        Ok(())
    }

    fn sload(&mut self, address: Address, slot: B256) -> Result<U256, WorldStateError> {
        Ok(self
            .storage
            .get(&(address, slot))
            .copied()
            .unwrap_or_default())
    }

    fn sstore(
        &mut self,
        address: Address,
        slot: B256,
        value: U256,
    ) -> Result<(), WorldStateError> {
        let previous = if value.is_zero() {
            self.storage.remove(&(address, slot))
        } else {
            self.storage.insert((address, slot), value)
        };
        if self.depth > 0 && previous != Some(value) {
            self.journal.push(JournalEntry::StorageChanged {
                address,
                slot,
                previous,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_moves_balance() {
        let from = Address::repeat_byte(1);
        let to = Address::repeat_byte(2);
        let mut world = InMemoryWorldState::new().with_balance(from, U256::from(100));

        world.transfer(from, to, U256::from(40)).unwrap();

        assert_eq!(world.balance(from).unwrap(), U256::from(60));
        assert_eq!(world.balance(to).unwrap(), U256::from(40));
    }

    #[test]
    fn transfer_rejects_overdraft() {
        let from = Address::repeat_byte(1);
        let to = Address::repeat_byte(2);
        let mut world = InMemoryWorldState::new().with_balance(from, U256::from(10));

        let err = world.transfer(from, to, U256::from(11)).unwrap_err();

        assert!(matches!(err, WorldStateError::InsufficientBalance { .. }));
        assert_eq!(world.balance(from).unwrap(), U256::from(10));
        assert_eq!(world.balance(to).unwrap(), U256::ZERO);
    }

    #[test]
    fn zeroed_slots_are_dropped() {
        let owner = Address::repeat_byte(3);
        let mut world = InMemoryWorldState::new();

        world.sstore(owner, B256::with_last_byte(1), U256::from(5)).unwrap();
        assert_eq!(world.storage_len(&owner), 1);

        world.sstore(owner, B256::with_last_byte(1), U256::ZERO).unwrap();
        assert_eq!(world.storage_len(&owner), 0);
    }

    #[test]
    fn revert_undoes_balances_code_and_storage() {
        let owner = Address::repeat_byte(4);
        let slot = B256::with_last_byte(9);
        let mut world = InMemoryWorldState::new().with_balance(owner, U256::from(50));
        world.sstore(owner, slot, U256::from(7)).unwrap();

        let checkpoint = world.checkpoint();
        world.add_balance(owner, U256::from(25)).unwrap();
        world.insert_code(owner, Bytes::from_static(&[0x60])).unwrap();
        world.sstore(owner, slot, U256::ZERO).unwrap();
        world.sstore(owner, B256::with_last_byte(10), U256::from(1)).unwrap();
        world.add_balance(Address::repeat_byte(5), U256::from(1)).unwrap();
        world.checkpoint_revert(checkpoint);

        assert_eq!(world.balance(owner).unwrap(), U256::from(50));
        assert!(world.code(owner).unwrap().is_empty());
        assert_eq!(world.sload(owner, slot).unwrap(), U256::from(7));
        assert_eq!(world.storage_len(&owner), 1);
        assert!(world.account(&Address::repeat_byte(5)).is_none());
    }

    #[test]
    fn outer_revert_discards_committed_inner_checkpoint() {
        let owner = Address::repeat_byte(6);
        let slot = B256::with_last_byte(1);
        let mut world = InMemoryWorldState::new();

        let outer = world.checkpoint();
        world.sstore(owner, slot, U256::from(1)).unwrap();
        let _inner = world.checkpoint();
        world.sstore(owner, slot, U256::from(2)).unwrap();
        world.checkpoint_commit();
        assert_eq!(world.sload(owner, slot).unwrap(), U256::from(2));

        world.checkpoint_revert(outer);
        assert_eq!(world.sload(owner, slot).unwrap(), U256::ZERO);
    }

    #[test]
    fn commit_keeps_changes() {
        let owner = Address::repeat_byte(7);
        let mut world = InMemoryWorldState::new();

        world.checkpoint();
        world.add_balance(owner, U256::from(3)).unwrap();
        world.checkpoint_commit();

        assert_eq!(world.balance(owner).unwrap(), U256::from(3));
        assert!(world.journal.is_empty());
    }
}
