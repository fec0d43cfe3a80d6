//! # fugue-primitives
//!
//! Value types shared by every fugue crate.
//!
//! The EVM has a single native value type, the 256-bit [`U256`] word. Addresses
//! and hashes are fixed-size byte strings that move in and out of words when
//! they are pushed to or popped from the operand stack.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod hash;

pub use address::{Address, AddressError};
pub use error::PrimitiveError;
pub use hash::{HashError, H256};

pub use primitive_types::{U256, U512};

/// Gas amount
pub type Gas = u64;

/// Account nonce
pub type Nonce = u64;

/// Block number
pub type BlockNumber = u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_wraps() {
        let (sum, overflow) = U256::MAX.overflowing_add(U256::one());
        assert!(overflow);
        assert!(sum.is_zero());
    }

    #[test]
    fn test_address_word_hash_agree() {
        let addr = Address::from_hex("0x00000000000000000000000000000000000000ff").unwrap();
        assert_eq!(addr.to_word(), U256::from(0xffu64));
        assert_eq!(H256::from_word(addr.to_word()).as_bytes()[31], 0xff);
    }
}
