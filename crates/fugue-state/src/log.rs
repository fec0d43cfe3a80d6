//! Event log entries

use fugue_primitives::{Address, H256};

/// Entry appended by LOG0..LOG4
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    /// Emitting contract
    pub address: Address,
    /// Indexed topics (at most four)
    pub topics: Vec<H256>,
    /// Unindexed payload
    pub data: Vec<u8>,
}

impl Log {
    /// Create a new log entry
    pub fn new(address: Address, topics: Vec<H256>, data: Vec<u8>) -> Self {
        Self {
            address,
            topics,
            data,
        }
    }
}
