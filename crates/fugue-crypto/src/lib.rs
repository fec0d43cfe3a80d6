//! # fugue-crypto
//!
//! Hashing collaborator for the EVM core.
//!
//! - Keccak-256 hashing (KECCAK256 opcode, code hashes)
//! - CREATE / CREATE2 contract address derivation

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod hash;

pub use address::{create2_address, create_address};
pub use hash::{keccak256, KECCAK_EMPTY};
