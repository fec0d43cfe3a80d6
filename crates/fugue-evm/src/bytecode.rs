//! Code buffers, jump-destination analysis and instruction decoding

use crate::opcode::{Opcode, OpcodeInfo};
use crate::revision::Revision;
use bytes::Bytes;
use fugue_primitives::U256;
use std::collections::HashSet;

/// One decoded instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// Offset of the opcode byte
    pub pc: usize,
    /// Raw opcode byte
    pub byte: u8,
    /// Decoded opcode (INVALID for unassigned or inactive bytes)
    pub opcode: Opcode,
    /// Descriptor of `opcode`
    pub info: OpcodeInfo,
    /// Offset of the following instruction
    pub next_pc: usize,
    immediate: U256,
}

impl Instruction {
    /// PUSH operand as a word; bytes missing at the end of code read as zero
    pub fn push_value(&self) -> U256 {
        self.immediate
    }
}

/// Executable code with its valid jump destinations
#[derive(Clone, Debug)]
pub struct Bytecode {
    code: Bytes,
    jump_dests: HashSet<usize>,
}

impl Bytecode {
    /// Analyze `code`
    pub fn new(code: Bytes) -> Self {
        let jump_dests = analyze_jump_dests(&code);
        Self { code, jump_dests }
    }

    /// Raw bytes
    pub fn bytes(&self) -> &Bytes {
        &self.code
    }

    /// Code length
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Whether the code is empty
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Whether `pc` is a JUMPDEST outside any PUSH operand
    pub fn is_jump_dest(&self, pc: usize) -> bool {
        self.jump_dests.contains(&pc)
    }

    /// Decode the instruction at `pc`. Past the end of code this is STOP.
    pub fn decode(&self, pc: usize, revision: Revision) -> Instruction {
        let byte = self.code.get(pc).copied().unwrap_or(Opcode::STOP as u8);
        let (opcode, info) = Opcode::decode(byte, revision);
        let size = info.immediate;
        let mut immediate = U256::zero();
        if size > 0 {
            let start = (pc + 1).min(self.code.len());
            let data = &self.code[start..(start + size).min(self.code.len())];
            let mut word = [0u8; 32];
            word[32 - size..32 - size + data.len()].copy_from_slice(data);
            immediate = U256::from_big_endian(&word);
        }
        Instruction {
            pc,
            byte,
            opcode,
            info,
            next_pc: pc + 1 + size,
            immediate,
        }
    }
}

/// Offsets of JUMPDEST bytes that are not inside PUSH data
pub fn analyze_jump_dests(code: &[u8]) -> HashSet<usize> {
    let mut dests = HashSet::new();
    let mut i = 0;

    while i < code.len() {
        let opcode = code[i];
        if opcode == Opcode::JUMPDEST as u8 {
            dests.insert(i);
        }
        // Skip PUSH operands
        if (Opcode::PUSH1 as u8..=Opcode::PUSH32 as u8).contains(&opcode) {
            i += (opcode - Opcode::PUSH0 as u8) as usize;
        }
        i += 1;
    }

    dests
}
