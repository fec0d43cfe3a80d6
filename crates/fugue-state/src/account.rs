//! Account data

use bytes::Bytes;
use fugue_crypto::{keccak256, KECCAK_EMPTY};
use fugue_primitives::{H256, U256};

/// Balance, nonce and code of one account. Storage is kept separately.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountInfo {
    /// Account balance
    pub balance: U256,
    /// Account nonce
    pub nonce: u64,
    /// Contract code
    pub code: Bytes,
    /// Keccak-256 of `code`
    pub code_hash: H256,
}

impl AccountInfo {
    /// Account holding only a balance
    pub fn with_balance(balance: U256) -> Self {
        Self {
            balance,
            ..Self::default()
        }
    }

    /// Builder-style code setter that keeps the hash in sync
    pub fn with_code(mut self, code: impl Into<Bytes>) -> Self {
        self.set_code(code.into());
        self
    }

    /// Builder-style nonce setter
    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Replace code and recompute its hash
    pub fn set_code(&mut self, code: Bytes) {
        self.code_hash = if code.is_empty() {
            KECCAK_EMPTY
        } else {
            keccak256(&code)
        };
        self.code = code;
    }

    /// Zero balance, zero nonce and no code
    pub fn is_blank(&self) -> bool {
        self.balance.is_zero() && self.nonce == 0 && self.code.is_empty()
    }

    /// Check if account has code
    pub fn has_code(&self) -> bool {
        !self.code.is_empty()
    }
}

impl Default for AccountInfo {
    fn default() -> Self {
        Self {
            balance: U256::zero(),
            nonce: 0,
            code: Bytes::new(),
            code_hash: KECCAK_EMPTY,
        }
    }
}
