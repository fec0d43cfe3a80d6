//! Backing store traits and an in-memory implementation

use crate::account::AccountInfo;
use fugue_primitives::{Address, U256};
use std::collections::BTreeMap;

/// Pending change to one account, produced by [`crate::AccountState::commit`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountChange {
    /// Account exists after the change
    Updated {
        /// New balance, nonce and code
        info: AccountInfo,
        /// Written slots; a zero value deletes the slot
        storage: BTreeMap<U256, U256>,
        /// Drop every stored slot before applying `storage`
        reset_storage: bool,
    },
    /// Account was destroyed
    Deleted,
}

/// All pending changes flushed by one commit, ordered by address
pub type ChangeSet = BTreeMap<Address, AccountChange>;

/// Read access to the authoritative state
pub trait StateReader {
    /// Load an account, `None` if it does not exist
    fn load_account(&self, address: &Address) -> Option<AccountInfo>;

    /// Load a storage slot, zero if absent
    fn load_storage(&self, address: &Address, key: &U256) -> U256;

    /// Every non-zero slot of an account
    fn storage_entries(&self, _address: &Address) -> BTreeMap<U256, U256> {
        BTreeMap::new()
    }
}

/// Write access to the authoritative state
pub trait StateWriter {
    /// Apply flushed changes. Never fails from the interpreter's point of view.
    fn commit(&mut self, changes: ChangeSet);
}

/// Combined backing-store access
pub trait StateBackend: StateReader + StateWriter {}

impl<T: StateReader + StateWriter> StateBackend for T {}

impl<T: StateReader + ?Sized> StateReader for &T {
    fn load_account(&self, address: &Address) -> Option<AccountInfo> {
        (**self).load_account(address)
    }

    fn load_storage(&self, address: &Address, key: &U256) -> U256 {
        (**self).load_storage(address, key)
    }

    fn storage_entries(&self, address: &Address) -> BTreeMap<U256, U256> {
        (**self).storage_entries(address)
    }
}

impl<T: StateReader + ?Sized> StateReader for &mut T {
    fn load_account(&self, address: &Address) -> Option<AccountInfo> {
        (**self).load_account(address)
    }

    fn load_storage(&self, address: &Address, key: &U256) -> U256 {
        (**self).load_storage(address, key)
    }

    fn storage_entries(&self, address: &Address) -> BTreeMap<U256, U256> {
        (**self).storage_entries(address)
    }
}

impl<T: StateWriter + ?Sized> StateWriter for &mut T {
    fn commit(&mut self, changes: ChangeSet) {
        (**self).commit(changes)
    }
}

/// Account as held by [`MemoryBackend`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryAccount {
    /// Balance, nonce and code
    pub info: AccountInfo,
    /// Non-zero storage slots
    pub storage: BTreeMap<U256, U256>,
}

/// Backing store kept entirely in memory.
///
/// Cloning it gives an independent copy, which is how parallel simulations get
/// their own state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryBackend {
    accounts: BTreeMap<Address, MemoryAccount>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an account, keeping its storage
    pub fn insert_account(&mut self, address: Address, info: AccountInfo) {
        self.accounts.entry(address).or_default().info = info;
    }

    /// Write a storage slot directly; zero removes it
    pub fn insert_storage(&mut self, address: Address, key: U256, value: U256) {
        let account = self.accounts.entry(address).or_default();
        if value.is_zero() {
            account.storage.remove(&key);
        } else {
            account.storage.insert(key, value);
        }
    }

    /// Stored account, if any
    pub fn account(&self, address: &Address) -> Option<&MemoryAccount> {
        self.accounts.get(address)
    }

    /// Iterate over all accounts
    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &MemoryAccount)> {
        self.accounts.iter()
    }

    /// Number of stored accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Check if no account is stored
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl StateReader for MemoryBackend {
    fn load_account(&self, address: &Address) -> Option<AccountInfo> {
        self.accounts.get(address).map(|a| a.info.clone())
    }

    fn load_storage(&self, address: &Address, key: &U256) -> U256 {
        self.accounts
            .get(address)
            .and_then(|a| a.storage.get(key).copied())
            .unwrap_or_default()
    }

    fn storage_entries(&self, address: &Address) -> BTreeMap<U256, U256> {
        self.accounts
            .get(address)
            .map(|a| a.storage.clone())
            .unwrap_or_default()
    }
}

impl StateWriter for MemoryBackend {
    fn commit(&mut self, changes: ChangeSet) {
        for (address, change) in changes {
            match change {
                AccountChange::Deleted => {
                    self.accounts.remove(&address);
                }
                AccountChange::Updated {
                    info,
                    storage,
                    reset_storage,
                } => {
                    let account = self.accounts.entry(address).or_default();
                    account.info = info;
                    if reset_storage {
                        account.storage.clear();
                    }
                    for (key, value) in storage {
                        if value.is_zero() {
                            account.storage.remove(&key);
                        } else {
                            account.storage.insert(key, value);
                        }
                    }
                }
            }
        }
    }
}
