//! Journaled account state

use crate::account::AccountInfo;
use crate::backend::{AccountChange, ChangeSet, StateBackend, StateReader};
use crate::error::{StateError, StateResult};
use crate::journal::{JournalEntry, Snapshot};
use crate::log::Log;
use bytes::Bytes;
use fugue_primitives::{Address, H256, U256};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, trace};

/// Cached view of one account
#[derive(Debug, Clone)]
pub(crate) struct CachedAccount {
    info: AccountInfo,
    /// Slots read or written so far; zero means known-absent
    storage: HashMap<U256, U256>,
    exists: bool,
    dirty: bool,
    /// Backend storage no longer applies (fresh or destroyed account)
    storage_reset: bool,
}

impl CachedAccount {
    fn load<B: StateReader>(backend: &B, address: &Address) -> Self {
        let loaded = backend.load_account(address);
        Self {
            exists: loaded.is_some(),
            info: loaded.unwrap_or_default(),
            storage: HashMap::new(),
            dirty: false,
            storage_reset: false,
        }
    }

    fn destroyed() -> Self {
        Self {
            info: AccountInfo::default(),
            storage: HashMap::new(),
            exists: false,
            dirty: true,
            storage_reset: true,
        }
    }
}

/// World state as seen by one call tree.
///
/// Reads go through a per-account cache in front of the backend. Writes stay in
/// the cache until [`commit`](Self::commit). While at least one snapshot is open
/// every write records the value it replaced, so [`revert`](Self::revert) can
/// unwind it in O(changes).
#[derive(Debug)]
pub struct AccountState<B> {
    backend: B,
    accounts: HashMap<Address, CachedAccount>,
    journal: Vec<JournalEntry>,
    depth: usize,
    logs: Vec<Log>,
    destructed: Vec<Address>,
    created: HashSet<Address>,
    transient: HashMap<(Address, U256), U256>,
}

impl<B: StateBackend> AccountState<B> {
    /// Create a state over a backing store
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            accounts: HashMap::new(),
            journal: Vec::new(),
            depth: 0,
            logs: Vec::new(),
            destructed: Vec::new(),
            created: HashSet::new(),
            transient: HashMap::new(),
        }
    }

    /// Backing store
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Give back the backing store, dropping anything not committed
    pub fn into_backend(self) -> B {
        self.backend
    }

    fn cached(&mut self, address: &Address) -> &mut CachedAccount {
        let backend = &self.backend;
        self.accounts
            .entry(*address)
            .or_insert_with(|| CachedAccount::load(backend, address))
    }

    fn record(&mut self, entry: JournalEntry) {
        if self.depth > 0 {
            self.journal.push(entry);
        }
    }

    /// Load an account for writing, marking it dirty and existing.
    fn touch(&mut self, address: &Address) -> &mut CachedAccount {
        let backend = &self.backend;
        let account = self
            .accounts
            .entry(*address)
            .or_insert_with(|| CachedAccount::load(backend, address));
        if !account.dirty || !account.exists {
            if self.depth > 0 {
                self.journal.push(JournalEntry::Touched {
                    address: *address,
                    was_dirty: account.dirty,
                    existed: account.exists,
                });
            }
            account.dirty = true;
            account.exists = true;
        }
        account
    }

    // ---------------------------------------------------------------------
    // Account queries
    // ---------------------------------------------------------------------

    /// Balance, nonce and code of an account
    pub fn account(&mut self, address: &Address) -> AccountInfo {
        self.cached(address).info.clone()
    }

    /// Whether the account exists (loaded from the backend or written since)
    pub fn exists(&mut self, address: &Address) -> bool {
        self.cached(address).exists
    }

    /// Zero balance, zero nonce and no code
    pub fn is_blank(&mut self, address: &Address) -> bool {
        self.cached(address).info.is_blank()
    }

    /// Whether the account has changes not yet committed
    pub fn is_dirty(&mut self, address: &Address) -> bool {
        self.cached(address).dirty
    }

    /// Get balance
    pub fn balance(&mut self, address: &Address) -> U256 {
        self.cached(address).info.balance
    }

    /// Get nonce
    pub fn nonce(&mut self, address: &Address) -> u64 {
        self.cached(address).info.nonce
    }

    /// Get code
    pub fn code(&mut self, address: &Address) -> Bytes {
        self.cached(address).info.code.clone()
    }

    /// Get code hash
    pub fn code_hash(&mut self, address: &Address) -> H256 {
        self.cached(address).info.code_hash
    }

    // ---------------------------------------------------------------------
    // Balance and nonce
    // ---------------------------------------------------------------------

    /// Set balance
    pub fn set_balance(&mut self, address: &Address, balance: U256) {
        let account = self.touch(address);
        let previous = std::mem::replace(&mut account.info.balance, balance);
        self.record(JournalEntry::BalanceChanged {
            address: *address,
            previous,
        });
    }

    /// Move `value` from one account to another.
    ///
    /// Either both sides change or neither does.
    pub fn transfer(&mut self, from: &Address, to: &Address, value: U256) -> StateResult<()> {
        let balance = self.balance(from);
        if balance < value {
            return Err(StateError::InsufficientBalance {
                address: *from,
                balance,
                required: value,
            });
        }
        if value.is_zero() || from == to {
            return Ok(());
        }
        let credited = self
            .balance(to)
            .checked_add(value)
            .ok_or(StateError::BalanceOverflow(*to))?;
        self.set_balance(from, balance - value);
        self.set_balance(to, credited);
        Ok(())
    }

    /// Set nonce
    pub fn set_nonce(&mut self, address: &Address, nonce: u64) {
        let account = self.touch(address);
        let previous = std::mem::replace(&mut account.info.nonce, nonce);
        self.record(JournalEntry::NonceChanged {
            address: *address,
            previous,
        });
    }

    /// Increment nonce, returning the value before the increment
    pub fn increment_nonce(&mut self, address: &Address) -> StateResult<u64> {
        let current = self.nonce(address);
        let next = current
            .checked_add(1)
            .ok_or(StateError::NonceOverflow(*address))?;
        self.set_nonce(address, next);
        Ok(current)
    }

    // ---------------------------------------------------------------------
    // Code
    // ---------------------------------------------------------------------

    /// Set code
    pub fn set_code(&mut self, address: &Address, code: Bytes) {
        let account = self.touch(address);
        let previous = account.info.code.clone();
        let previous_hash = account.info.code_hash;
        account.info.set_code(code);
        self.record(JournalEntry::CodeChanged {
            address: *address,
            previous,
            previous_hash,
        });
    }

    // ---------------------------------------------------------------------
    // Storage
    // ---------------------------------------------------------------------

    /// Read a storage slot; absent slots read as zero
    pub fn storage(&mut self, address: &Address, key: &U256) -> U256 {
        let backend = &self.backend;
        let account = self
            .accounts
            .entry(*address)
            .or_insert_with(|| CachedAccount::load(backend, address));
        if let Some(value) = account.storage.get(key) {
            return *value;
        }
        let value = if account.storage_reset {
            U256::zero()
        } else {
            backend.load_storage(address, key)
        };
        account.storage.insert(*key, value);
        value
    }

    /// Write a storage slot, returning the value it held before.
    ///
    /// Writing zero deletes the slot.
    pub fn set_storage(&mut self, address: &Address, key: U256, value: U256) -> U256 {
        let previous = self.storage(address, &key);
        if previous == value {
            return previous;
        }
        self.touch(address).storage.insert(key, value);
        self.record(JournalEntry::StorageChanged {
            address: *address,
            key,
            previous,
        });
        previous
    }

    /// Delete a storage slot
    pub fn reset_storage(&mut self, address: &Address, key: U256) -> U256 {
        self.set_storage(address, key, U256::zero())
    }

    /// Every non-zero slot of an account, pending writes included
    pub fn storage_entries(&mut self, address: &Address) -> BTreeMap<U256, U256> {
        let backend = &self.backend;
        let account = self
            .accounts
            .entry(*address)
            .or_insert_with(|| CachedAccount::load(backend, address));
        let mut entries = if account.storage_reset {
            BTreeMap::new()
        } else {
            backend.storage_entries(address)
        };
        for (key, value) in &account.storage {
            if value.is_zero() {
                entries.remove(key);
            } else {
                entries.insert(*key, *value);
            }
        }
        entries
    }

    // ---------------------------------------------------------------------
    // Transient storage
    // ---------------------------------------------------------------------

    /// Read a transient slot
    pub fn transient(&self, address: &Address, key: &U256) -> U256 {
        self.transient
            .get(&(*address, *key))
            .copied()
            .unwrap_or_default()
    }

    /// Write a transient slot; cleared at transaction end
    pub fn set_transient(&mut self, address: &Address, key: U256, value: U256) {
        let previous = if value.is_zero() {
            self.transient.remove(&(*address, key))
        } else {
            self.transient.insert((*address, key), value)
        }
        .unwrap_or_default();
        if previous != value {
            self.record(JournalEntry::TransientChanged {
                address: *address,
                key,
                previous,
            });
        }
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Turn `address` into a fresh contract account: storage and code are
    /// cleared, nonce set to `nonce`, balance kept.
    pub fn create_account(&mut self, address: &Address, nonce: u64) {
        let mut previous = Box::new(self.cached(address).clone());
        if !previous.storage_reset {
            // keep the complete prior storage so a revert past a commit can
            // write it back over the reset
            let mut full: HashMap<U256, U256> =
                self.backend.storage_entries(address).into_iter().collect();
            full.extend(previous.storage.drain());
            previous.storage = full;
            previous.storage_reset = true;
        }
        let first_creation = self.created.insert(*address);
        let mut info = AccountInfo::with_balance(previous.info.balance);
        info.nonce = nonce;
        self.accounts.insert(
            *address,
            CachedAccount {
                info,
                storage: HashMap::new(),
                exists: true,
                dirty: true,
                storage_reset: true,
            },
        );
        self.record(JournalEntry::Created {
            address: *address,
            previous,
            first_creation,
        });
    }

    /// Whether the account was created earlier in the current transaction
    pub fn was_created(&self, address: &Address) -> bool {
        self.created.contains(address)
    }

    /// Queue an account for deletion at transaction end.
    ///
    /// Returns `false` if it was already queued.
    pub fn selfdestruct(&mut self, address: &Address) -> bool {
        if self.destructed.contains(address) {
            return false;
        }
        self.destructed.push(*address);
        self.record(JournalEntry::SelfDestructed);
        true
    }

    /// Whether the account is queued for deletion
    pub fn is_selfdestructed(&self, address: &Address) -> bool {
        self.destructed.contains(address)
    }

    /// Append a log entry
    pub fn log(&mut self, log: Log) {
        self.logs.push(log);
    }

    /// Logs emitted so far in this transaction
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    // ---------------------------------------------------------------------
    // Snapshots
    // ---------------------------------------------------------------------

    /// Open a restore point
    pub fn snapshot(&mut self) -> Snapshot {
        self.depth += 1;
        Snapshot {
            journal_len: self.journal.len(),
            logs_len: self.logs.len(),
            depth: self.depth,
        }
    }

    /// Undo every change made since `snapshot` was taken.
    pub fn revert(&mut self, snapshot: Snapshot) {
        debug_assert_eq!(
            snapshot.depth, self.depth,
            "snapshots must be released in LIFO order"
        );
        let undone = self.journal.len().saturating_sub(snapshot.journal_len);
        let mut flushed = Vec::new();
        while self.journal.len() > snapshot.journal_len {
            let Some(entry) = self.journal.pop() else {
                break;
            };
            self.undo(entry, &mut flushed);
        }
        // values restored past a commit differ from the backend again
        for address in flushed {
            if let Some(account) = self.accounts.get_mut(&address) {
                account.dirty = true;
            }
        }
        self.logs.truncate(snapshot.logs_len);
        self.release(snapshot.depth);
        debug!(depth = snapshot.depth, undone, "reverted to snapshot");
    }

    /// Keep every change made since `snapshot` was taken.
    pub fn discard(&mut self, snapshot: Snapshot) {
        debug_assert_eq!(
            snapshot.depth, self.depth,
            "snapshots must be released in LIFO order"
        );
        self.release(snapshot.depth);
    }

    fn release(&mut self, depth: usize) {
        self.depth = depth.saturating_sub(1);
        if self.depth == 0 {
            self.journal.clear();
        }
    }

    fn undo(&mut self, entry: JournalEntry, flushed: &mut Vec<Address>) {
        match entry {
            JournalEntry::Touched {
                address,
                was_dirty,
                existed,
            } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.dirty = was_dirty;
                    account.exists = existed;
                }
            }
            JournalEntry::BalanceChanged { address, previous } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.info.balance = previous;
                }
            }
            JournalEntry::NonceChanged { address, previous } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.info.nonce = previous;
                }
            }
            JournalEntry::CodeChanged {
                address,
                previous,
                previous_hash,
            } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.info.code = previous;
                    account.info.code_hash = previous_hash;
                }
            }
            JournalEntry::StorageChanged {
                address,
                key,
                previous,
            } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.storage.insert(key, previous);
                }
            }
            JournalEntry::TransientChanged {
                address,
                key,
                previous,
            } => {
                if previous.is_zero() {
                    self.transient.remove(&(address, key));
                } else {
                    self.transient.insert((address, key), previous);
                }
            }
            JournalEntry::Created {
                address,
                previous,
                first_creation,
            } => {
                self.accounts.insert(address, *previous);
                if first_creation {
                    self.created.remove(&address);
                }
            }
            JournalEntry::SelfDestructed => {
                self.destructed.pop();
            }
            JournalEntry::Flushed { addresses } => flushed.extend(addresses),
        }
    }

    /// Number of open snapshots
    pub fn snapshot_depth(&self) -> usize {
        self.depth
    }

    // ---------------------------------------------------------------------
    // Commit
    // ---------------------------------------------------------------------

    /// Push every pending change to the backend and clear dirty flags.
    ///
    /// Open snapshots stay valid: reverting one of them afterwards restores the
    /// pre-commit values in the cache and leaves those accounts dirty, so the
    /// next commit writes them back.
    pub fn commit(&mut self) {
        let mut changes = ChangeSet::new();
        for (address, account) in self.accounts.iter_mut().filter(|(_, a)| a.dirty) {
            let change = if account.exists {
                AccountChange::Updated {
                    info: account.info.clone(),
                    storage: account.storage.iter().map(|(k, v)| (*k, *v)).collect(),
                    reset_storage: account.storage_reset,
                }
            } else {
                AccountChange::Deleted
            };
            changes.insert(*address, change);
            account.dirty = false;
        }
        if changes.is_empty() {
            return;
        }
        trace!(accounts = changes.len(), "committing pending state");
        let addresses = changes.keys().copied().collect();
        self.backend.commit(changes);
        self.record(JournalEntry::Flushed { addresses });
    }

    /// Close the current transaction.
    ///
    /// Accounts queued by SELFDESTRUCT are deleted, transient storage and the
    /// created-account set are cleared, and the emitted logs are handed back.
    pub fn finalize_transaction(&mut self) -> Vec<Log> {
        debug_assert_eq!(self.depth, 0, "transaction finalized with open snapshots");
        for address in std::mem::take(&mut self.destructed) {
            debug!(%address, "deleting self-destructed account");
            self.accounts.insert(address, CachedAccount::destroyed());
        }
        self.created.clear();
        self.transient.clear();
        self.journal.clear();
        std::mem::take(&mut self.logs)
    }
}
