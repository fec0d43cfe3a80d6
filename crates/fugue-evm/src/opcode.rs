//! Opcode descriptor table
//!
//! Every opcode carries a static [`OpcodeInfo`]: mnemonic, immediate size,
//! stack inputs/outputs, the revision that introduced it, and its base gas
//! per revision.

use crate::gas::cost::{BASE, HIGH, LOW, MID, VERYLOW};
use crate::revision::Revision;

/// Static description of one opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    /// Mnemonic
    pub name: &'static str,
    /// Immediate bytes following the opcode (PUSHn)
    pub immediate: usize,
    /// Stack items consumed
    pub inputs: usize,
    /// Stack items produced
    pub outputs: usize,
    /// First revision in which the opcode exists
    pub since: Revision,
    gas: &'static [(Revision, u64)],
}

impl OpcodeInfo {
    /// Base gas under `revision`: the entry of the latest revision not after it
    pub fn base_gas(&self, revision: Revision) -> u64 {
        self.gas
            .iter()
            .rev()
            .find(|(since, _)| *since <= revision)
            .map_or(0, |(_, gas)| *gas)
    }

    /// Whether the opcode exists under `revision`
    pub fn is_active(&self, revision: Revision) -> bool {
        self.since <= revision
    }
}

macro_rules! opcodes {
    ($(
        $name:ident = $byte:literal, $imm:literal, $inputs:literal => $outputs:literal,
        $since:ident, [$($rev:ident: $gas:expr),+ $(,)?];
    )*) => {
        /// EVM opcodes (see Yellow Paper Appendix H)
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        #[allow(missing_docs)]
        pub enum Opcode {
            $($name = $byte,)*
        }

        impl Opcode {
            /// Try to convert from byte
            pub const fn from_byte(byte: u8) -> Option<Self> {
                match byte {
                    $($byte => Some(Self::$name),)*
                    _ => None,
                }
            }

            /// Descriptor of this opcode
            pub fn info(self) -> OpcodeInfo {
                match self {
                    $(Self::$name => OpcodeInfo {
                        name: stringify!($name),
                        immediate: $imm,
                        inputs: $inputs,
                        outputs: $outputs,
                        since: Revision::$since,
                        gas: &[$((Revision::$rev, $gas)),+],
                    },)*
                }
            }
        }
    };
}

opcodes! {
    STOP = 0x00, 0, 0 => 0, Frontier, [Frontier: 0];
    ADD = 0x01, 0, 2 => 1, Frontier, [Frontier: VERYLOW];
    MUL = 0x02, 0, 2 => 1, Frontier, [Frontier: LOW];
    SUB = 0x03, 0, 2 => 1, Frontier, [Frontier: VERYLOW];
    DIV = 0x04, 0, 2 => 1, Frontier, [Frontier: LOW];
    SDIV = 0x05, 0, 2 => 1, Frontier, [Frontier: LOW];
    MOD = 0x06, 0, 2 => 1, Frontier, [Frontier: LOW];
    SMOD = 0x07, 0, 2 => 1, Frontier, [Frontier: LOW];
    ADDMOD = 0x08, 0, 3 => 1, Frontier, [Frontier: MID];
    MULMOD = 0x09, 0, 3 => 1, Frontier, [Frontier: MID];
    EXP = 0x0A, 0, 2 => 1, Frontier, [Frontier: HIGH];
    SIGNEXTEND = 0x0B, 0, 2 => 1, Frontier, [Frontier: LOW];

    LT = 0x10, 0, 2 => 1, Frontier, [Frontier: VERYLOW];
    GT = 0x11, 0, 2 => 1, Frontier, [Frontier: VERYLOW];
    SLT = 0x12, 0, 2 => 1, Frontier, [Frontier: VERYLOW];
    SGT = 0x13, 0, 2 => 1, Frontier, [Frontier: VERYLOW];
    EQ = 0x14, 0, 2 => 1, Frontier, [Frontier: VERYLOW];
    ISZERO = 0x15, 0, 1 => 1, Frontier, [Frontier: VERYLOW];
    AND = 0x16, 0, 2 => 1, Frontier, [Frontier: VERYLOW];
    OR = 0x17, 0, 2 => 1, Frontier, [Frontier: VERYLOW];
    XOR = 0x18, 0, 2 => 1, Frontier, [Frontier: VERYLOW];
    NOT = 0x19, 0, 1 => 1, Frontier, [Frontier: VERYLOW];
    BYTE = 0x1A, 0, 2 => 1, Frontier, [Frontier: VERYLOW];
    SHL = 0x1B, 0, 2 => 1, Constantinople, [Frontier: VERYLOW];
    SHR = 0x1C, 0, 2 => 1, Constantinople, [Frontier: VERYLOW];
    SAR = 0x1D, 0, 2 => 1, Constantinople, [Frontier: VERYLOW];

    KECCAK256 = 0x20, 0, 2 => 1, Frontier, [Frontier: 30];

    ADDRESS = 0x30, 0, 0 => 1, Frontier, [Frontier: BASE];
    BALANCE = 0x31, 0, 1 => 1, Frontier,
        [Frontier: 20, TangerineWhistle: 400, Istanbul: 700, Berlin: 2600];
    ORIGIN = 0x32, 0, 0 => 1, Frontier, [Frontier: BASE];
    CALLER = 0x33, 0, 0 => 1, Frontier, [Frontier: BASE];
    CALLVALUE = 0x34, 0, 0 => 1, Frontier, [Frontier: BASE];
    CALLDATALOAD = 0x35, 0, 1 => 1, Frontier, [Frontier: VERYLOW];
    CALLDATASIZE = 0x36, 0, 0 => 1, Frontier, [Frontier: BASE];
    CALLDATACOPY = 0x37, 0, 3 => 0, Frontier, [Frontier: VERYLOW];
    CODESIZE = 0x38, 0, 0 => 1, Frontier, [Frontier: BASE];
    CODECOPY = 0x39, 0, 3 => 0, Frontier, [Frontier: VERYLOW];
    GASPRICE = 0x3A, 0, 0 => 1, Frontier, [Frontier: BASE];
    EXTCODESIZE = 0x3B, 0, 1 => 1, Frontier,
        [Frontier: 20, TangerineWhistle: 700, Berlin: 2600];
    EXTCODECOPY = 0x3C, 0, 4 => 0, Frontier,
        [Frontier: 20, TangerineWhistle: 700, Berlin: 2600];
    RETURNDATASIZE = 0x3D, 0, 0 => 1, Byzantium, [Frontier: BASE];
    RETURNDATACOPY = 0x3E, 0, 3 => 0, Byzantium, [Frontier: VERYLOW];
    EXTCODEHASH = 0x3F, 0, 1 => 1, Constantinople,
        [Frontier: 400, Istanbul: 700, Berlin: 2600];

    BLOCKHASH = 0x40, 0, 1 => 1, Frontier, [Frontier: 20];
    COINBASE = 0x41, 0, 0 => 1, Frontier, [Frontier: BASE];
    TIMESTAMP = 0x42, 0, 0 => 1, Frontier, [Frontier: BASE];
    NUMBER = 0x43, 0, 0 => 1, Frontier, [Frontier: BASE];
    PREVRANDAO = 0x44, 0, 0 => 1, Frontier, [Frontier: BASE];
    GASLIMIT = 0x45, 0, 0 => 1, Frontier, [Frontier: BASE];
    CHAINID = 0x46, 0, 0 => 1, Istanbul, [Frontier: BASE];
    SELFBALANCE = 0x47, 0, 0 => 1, Istanbul, [Frontier: LOW];
    BASEFEE = 0x48, 0, 0 => 1, London, [Frontier: BASE];

    POP = 0x50, 0, 1 => 0, Frontier, [Frontier: BASE];
    MLOAD = 0x51, 0, 1 => 1, Frontier, [Frontier: VERYLOW];
    MSTORE = 0x52, 0, 2 => 0, Frontier, [Frontier: VERYLOW];
    MSTORE8 = 0x53, 0, 2 => 0, Frontier, [Frontier: VERYLOW];
    SLOAD = 0x54, 0, 1 => 1, Frontier,
        [Frontier: 50, TangerineWhistle: 200, Istanbul: 800, Berlin: 2100];
    SSTORE = 0x55, 0, 2 => 0, Frontier, [Frontier: 0];
    JUMP = 0x56, 0, 1 => 0, Frontier, [Frontier: MID];
    JUMPI = 0x57, 0, 2 => 0, Frontier, [Frontier: HIGH];
    PC = 0x58, 0, 0 => 1, Frontier, [Frontier: BASE];
    MSIZE = 0x59, 0, 0 => 1, Frontier, [Frontier: BASE];
    GAS = 0x5A, 0, 0 => 1, Frontier, [Frontier: BASE];
    JUMPDEST = 0x5B, 0, 0 => 0, Frontier, [Frontier: 1];
    TLOAD = 0x5C, 0, 1 => 1, Cancun, [Frontier: 100];
    TSTORE = 0x5D, 0, 2 => 0, Cancun, [Frontier: 100];
    MCOPY = 0x5E, 0, 3 => 0, Cancun, [Frontier: VERYLOW];
    PUSH0 = 0x5F, 0, 0 => 1, Shanghai, [Frontier: BASE];

    PUSH1 = 0x60, 1, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH2 = 0x61, 2, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH3 = 0x62, 3, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH4 = 0x63, 4, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH5 = 0x64, 5, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH6 = 0x65, 6, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH7 = 0x66, 7, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH8 = 0x67, 8, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH9 = 0x68, 9, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH10 = 0x69, 10, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH11 = 0x6A, 11, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH12 = 0x6B, 12, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH13 = 0x6C, 13, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH14 = 0x6D, 14, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH15 = 0x6E, 15, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH16 = 0x6F, 16, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH17 = 0x70, 17, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH18 = 0x71, 18, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH19 = 0x72, 19, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH20 = 0x73, 20, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH21 = 0x74, 21, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH22 = 0x75, 22, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH23 = 0x76, 23, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH24 = 0x77, 24, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH25 = 0x78, 25, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH26 = 0x79, 26, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH27 = 0x7A, 27, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH28 = 0x7B, 28, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH29 = 0x7C, 29, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH30 = 0x7D, 30, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH31 = 0x7E, 31, 0 => 1, Frontier, [Frontier: VERYLOW];
    PUSH32 = 0x7F, 32, 0 => 1, Frontier, [Frontier: VERYLOW];

    DUP1 = 0x80, 0, 1 => 2, Frontier, [Frontier: VERYLOW];
    DUP2 = 0x81, 0, 2 => 3, Frontier, [Frontier: VERYLOW];
    DUP3 = 0x82, 0, 3 => 4, Frontier, [Frontier: VERYLOW];
    DUP4 = 0x83, 0, 4 => 5, Frontier, [Frontier: VERYLOW];
    DUP5 = 0x84, 0, 5 => 6, Frontier, [Frontier: VERYLOW];
    DUP6 = 0x85, 0, 6 => 7, Frontier, [Frontier: VERYLOW];
    DUP7 = 0x86, 0, 7 => 8, Frontier, [Frontier: VERYLOW];
    DUP8 = 0x87, 0, 8 => 9, Frontier, [Frontier: VERYLOW];
    DUP9 = 0x88, 0, 9 => 10, Frontier, [Frontier: VERYLOW];
    DUP10 = 0x89, 0, 10 => 11, Frontier, [Frontier: VERYLOW];
    DUP11 = 0x8A, 0, 11 => 12, Frontier, [Frontier: VERYLOW];
    DUP12 = 0x8B, 0, 12 => 13, Frontier, [Frontier: VERYLOW];
    DUP13 = 0x8C, 0, 13 => 14, Frontier, [Frontier: VERYLOW];
    DUP14 = 0x8D, 0, 14 => 15, Frontier, [Frontier: VERYLOW];
    DUP15 = 0x8E, 0, 15 => 16, Frontier, [Frontier: VERYLOW];
    DUP16 = 0x8F, 0, 16 => 17, Frontier, [Frontier: VERYLOW];

    SWAP1 = 0x90, 0, 2 => 2, Frontier, [Frontier: VERYLOW];
    SWAP2 = 0x91, 0, 3 => 3, Frontier, [Frontier: VERYLOW];
    SWAP3 = 0x92, 0, 4 => 4, Frontier, [Frontier: VERYLOW];
    SWAP4 = 0x93, 0, 5 => 5, Frontier, [Frontier: VERYLOW];
    SWAP5 = 0x94, 0, 6 => 6, Frontier, [Frontier: VERYLOW];
    SWAP6 = 0x95, 0, 7 => 7, Frontier, [Frontier: VERYLOW];
    SWAP7 = 0x96, 0, 8 => 8, Frontier, [Frontier: VERYLOW];
    SWAP8 = 0x97, 0, 9 => 9, Frontier, [Frontier: VERYLOW];
    SWAP9 = 0x98, 0, 10 => 10, Frontier, [Frontier: VERYLOW];
    SWAP10 = 0x99, 0, 11 => 11, Frontier, [Frontier: VERYLOW];
    SWAP11 = 0x9A, 0, 12 => 12, Frontier, [Frontier: VERYLOW];
    SWAP12 = 0x9B, 0, 13 => 13, Frontier, [Frontier: VERYLOW];
    SWAP13 = 0x9C, 0, 14 => 14, Frontier, [Frontier: VERYLOW];
    SWAP14 = 0x9D, 0, 15 => 15, Frontier, [Frontier: VERYLOW];
    SWAP15 = 0x9E, 0, 16 => 16, Frontier, [Frontier: VERYLOW];
    SWAP16 = 0x9F, 0, 17 => 17, Frontier, [Frontier: VERYLOW];

    LOG0 = 0xA0, 0, 2 => 0, Frontier, [Frontier: 375];
    LOG1 = 0xA1, 0, 3 => 0, Frontier, [Frontier: 750];
    LOG2 = 0xA2, 0, 4 => 0, Frontier, [Frontier: 1125];
    LOG3 = 0xA3, 0, 5 => 0, Frontier, [Frontier: 1500];
    LOG4 = 0xA4, 0, 6 => 0, Frontier, [Frontier: 1875];

    CREATE = 0xF0, 0, 3 => 1, Frontier, [Frontier: 32000];
    CALL = 0xF1, 0, 7 => 1, Frontier,
        [Frontier: 40, TangerineWhistle: 700, Berlin: 2600];
    CALLCODE = 0xF2, 0, 7 => 1, Frontier,
        [Frontier: 40, TangerineWhistle: 700, Berlin: 2600];
    RETURN = 0xF3, 0, 2 => 0, Frontier, [Frontier: 0];
    DELEGATECALL = 0xF4, 0, 6 => 1, Homestead,
        [Frontier: 40, TangerineWhistle: 700, Berlin: 2600];
    CREATE2 = 0xF5, 0, 4 => 1, Constantinople, [Frontier: 32000];
    STATICCALL = 0xFA, 0, 6 => 1, Byzantium,
        [Frontier: 700, Berlin: 2600];
    REVERT = 0xFD, 0, 2 => 0, Byzantium, [Frontier: 0];
    INVALID = 0xFE, 0, 0 => 0, Frontier, [Frontier: 0];
    SELFDESTRUCT = 0xFF, 0, 1 => 0, Frontier, [Frontier: 0, TangerineWhistle: 5000];
}

impl Opcode {
    /// Number of bytes to push (PUSH1-PUSH32)
    pub fn push_size(self) -> usize {
        self.info().immediate
    }

    /// Whether this is a PUSH opcode (including PUSH0)
    pub fn is_push(self) -> bool {
        (Opcode::PUSH0 as u8..=Opcode::PUSH32 as u8).contains(&(self as u8))
    }

    /// Position of the copied item for DUP1-DUP16, 0 otherwise
    pub fn dup_depth(self) -> usize {
        match self as u8 {
            byte @ 0x80..=0x8F => (byte - 0x7F) as usize,
            _ => 0,
        }
    }

    /// Position of the exchanged item for SWAP1-SWAP16, 0 otherwise
    pub fn swap_depth(self) -> usize {
        match self as u8 {
            byte @ 0x90..=0x9F => (byte - 0x8F) as usize,
            _ => 0,
        }
    }

    /// Topic count for LOG0-LOG4, 0 otherwise
    pub fn log_topics(self) -> usize {
        match self as u8 {
            byte @ 0xA0..=0xA4 => (byte - 0xA0) as usize,
            _ => 0,
        }
    }

    /// Whether the opcode mutates state and is forbidden under STATICCALL.
    ///
    /// CALL is only forbidden when it transfers value; the interpreter checks
    /// that case itself.
    pub fn is_state_mutating(self) -> bool {
        matches!(
            self,
            Opcode::SSTORE
                | Opcode::TSTORE
                | Opcode::LOG0
                | Opcode::LOG1
                | Opcode::LOG2
                | Opcode::LOG3
                | Opcode::LOG4
                | Opcode::CREATE
                | Opcode::CREATE2
                | Opcode::SELFDESTRUCT
        )
    }

    /// Descriptor for a raw byte under `revision`.
    ///
    /// Unassigned bytes, and opcodes not yet introduced, decode as INVALID.
    pub fn decode(byte: u8, revision: Revision) -> (Opcode, OpcodeInfo) {
        match Opcode::from_byte(byte) {
            Some(op) if op.info().is_active(revision) => (op, op.info()),
            _ => (Opcode::INVALID, Opcode::INVALID.info()),
        }
    }
}
