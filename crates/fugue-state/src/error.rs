//! State errors

use fugue_primitives::{Address, U256};
use thiserror::Error;

/// Account state error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Debit would take a balance below zero
    #[error("insufficient balance for {address}: have {balance}, need {required}")]
    InsufficientBalance {
        /// Debited account
        address: Address,
        /// Current balance
        balance: U256,
        /// Requested debit
        required: U256,
    },

    /// Credit would overflow a 256-bit balance
    #[error("balance overflow crediting {0}")]
    BalanceOverflow(Address),

    /// Nonce already at its maximum
    #[error("nonce overflow for {0}")]
    NonceOverflow(Address),
}

/// State result type
pub type StateResult<T> = Result<T, StateError>;
