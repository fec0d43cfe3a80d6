//! Undo journal and snapshot tokens

use crate::state::CachedAccount;
use bytes::Bytes;
use fugue_primitives::{Address, H256, U256};

/// One undoable change, holding the value it replaced
#[derive(Debug, Clone)]
pub(crate) enum JournalEntry {
    /// Account went from clean or non-existent to dirty and existing
    Touched {
        address: Address,
        was_dirty: bool,
        existed: bool,
    },
    BalanceChanged {
        address: Address,
        previous: U256,
    },
    NonceChanged {
        address: Address,
        previous: u64,
    },
    CodeChanged {
        address: Address,
        previous: Bytes,
        previous_hash: H256,
    },
    StorageChanged {
        address: Address,
        key: U256,
        previous: U256,
    },
    TransientChanged {
        address: Address,
        key: U256,
        previous: U256,
    },
    /// Account replaced by a fresh contract account
    Created {
        address: Address,
        previous: Box<CachedAccount>,
        first_creation: bool,
    },
    /// Account queued for deletion at transaction end
    SelfDestructed,
    /// Pending changes of these accounts were pushed to the backend
    Flushed { addresses: Vec<Address> },
}

/// Restore point handed out by [`crate::AccountState::snapshot`].
///
/// Tokens must be given back through `revert` or `discard` in the reverse order
/// they were taken.
#[must_use = "a snapshot must be reverted or discarded"]
#[derive(Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub(crate) journal_len: usize,
    pub(crate) logs_len: usize,
    pub(crate) depth: usize,
}

impl Snapshot {
    /// Nesting level of this snapshot, starting at 1
    pub fn depth(&self) -> usize {
        self.depth
    }
}
