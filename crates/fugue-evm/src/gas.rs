//! Gas metering and dynamic cost formulas

use crate::error::{EvmError, EvmResult};
use crate::revision::Revision;
use fugue_primitives::U256;

/// Gas cost constants
pub mod cost {
    /// Base gas
    pub const BASE: u64 = 2;
    /// Very low gas
    pub const VERYLOW: u64 = 3;
    /// Low gas
    pub const LOW: u64 = 5;
    /// Mid gas
    pub const MID: u64 = 8;
    /// High gas
    pub const HIGH: u64 = 10;

    /// Exp byte gas before SpuriousDragon
    pub const EXP_BYTE_FRONTIER: u64 = 10;
    /// Exp byte gas
    pub const EXP_BYTE: u64 = 50;
    /// Keccak word gas
    pub const KECCAK256_WORD: u64 = 6;
    /// Copy gas (per word)
    pub const COPY: u64 = 3;

    /// Sstore: zero to non-zero
    pub const SSTORE_SET: u64 = 20000;
    /// Sstore: any other write before Berlin
    pub const SSTORE_RESET_FRONTIER: u64 = 5000;
    /// Sstore: any other write
    pub const SSTORE_RESET: u64 = 2900;
    /// Refund for clearing a slot before London
    pub const SSTORE_CLEAR_REFUND_FRONTIER: u64 = 15000;
    /// Refund for clearing a slot
    pub const SSTORE_CLEAR_REFUND: u64 = 4800;
    /// SSTORE needs more than this left from Istanbul
    pub const SSTORE_SENTRY: u64 = 2300;

    /// Log data gas (per byte)
    pub const LOG_DATA: u64 = 8;

    /// Code deposit gas (per byte)
    pub const CODE_DEPOSIT: u64 = 200;
    /// Init code gas (per word) from Shanghai
    pub const INITCODE_WORD: u64 = 2;
    /// Call value transfer gas
    pub const CALL_VALUE: u64 = 9000;
    /// New account gas
    pub const NEW_ACCOUNT: u64 = 25000;
    /// Call stipend
    pub const CALL_STIPEND: u64 = 2300;
    /// Selfdestruct refund before London
    pub const SELFDESTRUCT_REFUND: u64 = 24000;

    /// Memory gas (per word)
    pub const MEMORY: u64 = 3;
    /// Divisor of the quadratic memory term
    pub const MEMORY_QUAD_DIVISOR: u64 = 512;

    /// Max call depth
    pub const MAX_CALL_DEPTH: usize = 1024;
    /// Max stack size
    pub const MAX_STACK_SIZE: usize = 1024;
    /// Max code size (EIP-170)
    pub const MAX_CODE_SIZE: usize = 24576;
    /// Max init code size (EIP-3860)
    pub const MAX_INITCODE_SIZE: usize = 49152;
    /// Largest memory a frame may address
    pub const MAX_MEMORY: usize = u32::MAX as usize;
}

/// Number of 32-byte words covering `bytes`
pub fn words(bytes: usize) -> u64 {
    bytes.div_ceil(32) as u64
}

/// Total cost of a memory of `words` words
pub fn memory_cost(words: u64) -> u64 {
    cost::MEMORY * words + words * words / cost::MEMORY_QUAD_DIVISOR
}

/// Cost of growing memory from `current_size` to `new_size` bytes
pub fn memory_gas(current_size: usize, new_size: usize) -> u64 {
    if new_size <= current_size {
        return 0;
    }
    memory_cost(words(new_size)).saturating_sub(memory_cost(words(current_size)))
}

/// Per-word cost of copying `size` bytes
pub fn copy_gas(size: usize) -> u64 {
    cost::COPY * words(size)
}

/// Per-word cost of hashing `size` bytes
pub fn keccak_gas(size: usize) -> u64 {
    cost::KECCAK256_WORD * words(size)
}

/// Dynamic part of EXP
pub fn exp_gas(revision: Revision, exponent: U256) -> u64 {
    let per_byte = if revision >= Revision::SpuriousDragon {
        cost::EXP_BYTE
    } else {
        cost::EXP_BYTE_FRONTIER
    };
    per_byte * crate::word::byte_len(exponent)
}

/// Dynamic part of LOG; topics are priced by the opcode table
pub fn log_data_gas(size: usize) -> u64 {
    cost::LOG_DATA * size as u64
}

/// Init code surcharge from Shanghai
pub fn initcode_gas(revision: Revision, size: usize) -> u64 {
    if revision >= Revision::Shanghai {
        cost::INITCODE_WORD * words(size)
    } else {
        0
    }
}

/// Cost and refund of an SSTORE, classified by the value currently stored
pub fn sstore_gas(revision: Revision, current: U256, new: U256) -> (u64, u64) {
    let cost = if current.is_zero() && !new.is_zero() {
        cost::SSTORE_SET
    } else if revision >= Revision::Berlin {
        cost::SSTORE_RESET
    } else {
        cost::SSTORE_RESET_FRONTIER
    };
    let refund = if !current.is_zero() && new.is_zero() {
        if revision >= Revision::London {
            cost::SSTORE_CLEAR_REFUND
        } else {
            cost::SSTORE_CLEAR_REFUND_FRONTIER
        }
    } else {
        0
    };
    (cost, refund)
}

/// Gas a CALL-family opcode may hand to its child
pub fn call_gas(revision: Revision, remaining: u64, requested: U256) -> EvmResult<u64> {
    let requested = crate::word::saturating_u64(requested);
    if revision >= Revision::TangerineWhistle {
        Ok(requested.min(all_but_one_64th(remaining)))
    } else if requested > remaining {
        Err(EvmError::OutOfGas)
    } else {
        Ok(requested)
    }
}

/// Gas a CREATE-family opcode hands to the init code
pub fn create_gas(revision: Revision, remaining: u64) -> u64 {
    if revision >= Revision::TangerineWhistle {
        all_but_one_64th(remaining)
    } else {
        remaining
    }
}

fn all_but_one_64th(gas: u64) -> u64 {
    gas - gas / 64
}

/// Gas accounting for one frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GasMeter {
    limit: u64,
    remaining: u64,
    refunded: u64,
}

impl GasMeter {
    /// Meter with `limit` gas available
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            remaining: limit,
            refunded: 0,
        }
    }

    /// Gas the frame started with
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Gas still available
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Gas spent so far
    pub fn used(&self) -> u64 {
        self.limit.saturating_sub(self.remaining)
    }

    /// Refund accumulated so far
    pub fn refunded(&self) -> u64 {
        self.refunded
    }

    /// Spend `amount`. On failure nothing is left.
    pub fn charge(&mut self, amount: u64) -> EvmResult<()> {
        match self.remaining.checked_sub(amount) {
            Some(remaining) => {
                self.remaining = remaining;
                Ok(())
            }
            None => {
                self.remaining = 0;
                Err(EvmError::OutOfGas)
            }
        }
    }

    /// Accumulate a refund, applied only when the whole message concludes
    pub fn refund(&mut self, amount: u64) {
        self.refunded = self.refunded.saturating_add(amount);
    }

    /// Take back gas a child frame did not use
    pub fn reclaim(&mut self, amount: u64) {
        self.remaining = self.remaining.saturating_add(amount);
    }

    /// Fold in the refund of a successful child frame
    pub fn merge_refund(&mut self, child: &GasMeter) {
        self.refund(child.refunded);
    }

    /// Burn all remaining gas and forget refunds (exceptional halt)
    pub fn consume_all(&mut self) {
        self.remaining = 0;
        self.refunded = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_memory_gas() {
        assert_eq!(memory_gas(0, 32), 3);
        assert_eq!(memory_gas(0, 1), 3);
        assert_eq!(memory_gas(0, 64), 6);
        // 32 words: 96 + 1024/512
        assert_eq!(memory_gas(0, 1024), 98);
        assert_eq!(memory_gas(32, 64), 3);
        assert_eq!(memory_gas(64, 32), 0);
    }

    #[test]
    fn test_copy_and_keccak_gas() {
        assert_eq!(copy_gas(0), 0);
        assert_eq!(copy_gas(1), 3);
        assert_eq!(copy_gas(33), 6);
        assert_eq!(keccak_gas(64), 12);
    }

    #[test]
    fn test_exp_gas_by_revision() {
        let exponent = U256::from(0x1_0000u64);
        assert_eq!(exp_gas(Revision::Frontier, exponent), 30);
        assert_eq!(exp_gas(Revision::Cancun, exponent), 150);
        assert_eq!(exp_gas(Revision::Cancun, U256::zero()), 0);
    }

    #[test]
    fn test_sstore_classes() {
        let zero = U256::zero();
        let one = U256::one();
        let two = U256::from(2u64);

        assert_eq!(sstore_gas(Revision::Istanbul, zero, one), (20000, 0));
        assert_eq!(sstore_gas(Revision::Istanbul, one, two), (5000, 0));
        assert_eq!(sstore_gas(Revision::Istanbul, one, zero), (5000, 15000));
        assert_eq!(sstore_gas(Revision::Istanbul, zero, zero), (5000, 0));
        assert_eq!(sstore_gas(Revision::Berlin, one, zero), (2900, 15000));
        assert_eq!(sstore_gas(Revision::London, one, zero), (2900, 4800));
    }

    #[test]
    fn test_call_gas_63_64() {
        assert_eq!(call_gas(Revision::Cancun, 6400, U256::MAX).unwrap(), 6300);
        assert_eq!(call_gas(Revision::Cancun, 6400, U256::from(100u64)).unwrap(), 100);
        assert_eq!(call_gas(Revision::Frontier, 6400, U256::from(6400u64)).unwrap(), 6400);
        assert_eq!(
            call_gas(Revision::Frontier, 6400, U256::from(6401u64)),
            Err(EvmError::OutOfGas)
        );
        assert_eq!(create_gas(Revision::Cancun, 6400), 6300);
        assert_eq!(create_gas(Revision::Homestead, 6400), 6400);
    }

    #[test]
    fn test_meter_charge() {
        let mut gas = GasMeter::new(100);
        gas.charge(40).unwrap();
        assert_eq!(gas.remaining(), 60);
        assert_eq!(gas.used(), 40);

        assert_eq!(gas.charge(61), Err(EvmError::OutOfGas));
        assert_eq!(gas.remaining(), 0);
        assert_eq!(gas.used(), 100);
    }

    #[test]
    fn test_meter_refunds_accumulate_separately() {
        let mut gas = GasMeter::new(100);
        gas.refund(10);
        gas.refund(5);
        assert_eq!(gas.remaining(), 100);
        assert_eq!(gas.refunded(), 15);

        let mut child = GasMeter::new(10);
        child.refund(7);
        gas.merge_refund(&child);
        assert_eq!(gas.refunded(), 22);

        gas.consume_all();
        assert_eq!(gas.remaining(), 0);
        assert_eq!(gas.refunded(), 0);
    }

    proptest! {
        #[test]
        fn charge_is_all_or_nothing(limit in any::<u64>(), amount in any::<u64>()) {
            let mut gas = GasMeter::new(limit);
            match gas.charge(amount) {
                Ok(()) => prop_assert_eq!(gas.remaining(), limit - amount),
                Err(err) => {
                    prop_assert!(amount > limit);
                    prop_assert_eq!(err, EvmError::OutOfGas);
                    prop_assert_eq!(gas.remaining(), 0);
                }
            }
        }
    }
}
