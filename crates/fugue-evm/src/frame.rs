//! Per-call execution frame

use crate::bytecode::Bytecode;
use crate::context::Message;
use crate::error::{EvmError, EvmResult, Halt};
use crate::gas::{self, cost, GasMeter};
use crate::memory::Memory;
use crate::stack::Stack;
use crate::word;
use bytes::Bytes;
use fugue_primitives::{Address, U256};

/// Machine state of one call: created with the message, dropped when it returns
#[derive(Debug)]
pub struct Frame {
    /// Message being executed
    pub message: Message,
    /// Code being executed
    pub code: Bytecode,
    /// Call data (empty for init code)
    pub input: Bytes,
    /// Program counter
    pub pc: usize,
    /// Stack
    pub stack: Stack,
    /// Memory
    pub memory: Memory,
    /// Gas accounting
    pub gas: GasMeter,
    /// Output of the most recent child call
    pub return_data: Bytes,
    /// Output set by RETURN or REVERT
    pub output: Bytes,
}

impl Frame {
    /// Frame for `message` running `code`
    pub fn new(message: Message, code: Bytecode) -> Self {
        let input = if message.kind.is_create() {
            Bytes::new()
        } else {
            message.input.clone()
        };
        let gas = GasMeter::new(message.gas_limit);
        Self {
            message,
            code,
            input,
            pc: 0,
            stack: Stack::new(),
            memory: Memory::new(),
            gas,
            return_data: Bytes::new(),
            output: Bytes::new(),
        }
    }

    /// Address whose storage and balance the frame acts on
    pub fn address(&self) -> Address {
        self.message.target
    }

    /// Expand memory over `offset..offset + size`, charging for the growth.
    ///
    /// Returns the region as `(offset, size)`; an empty region is `(0, 0)`
    /// and never touches memory. Regions past the addressable limit are
    /// reported as out of gas.
    pub fn resize_memory(&mut self, offset: U256, size: U256) -> EvmResult<(usize, usize)> {
        if size.is_zero() {
            return Ok((0, 0));
        }
        let (offset, size) = word::to_usize(offset)
            .zip(word::to_usize(size))
            .ok_or(EvmError::OutOfGas)?;
        let end = offset
            .checked_add(size)
            .filter(|end| *end <= cost::MAX_MEMORY)
            .ok_or(EvmError::OutOfGas)?;
        self.gas.charge(gas::memory_gas(self.memory.size(), end))?;
        self.memory.resize(end);
        Ok((offset, size))
    }
}

/// Result of running one message
#[derive(Debug, Clone)]
pub(crate) struct FrameResult {
    pub halt: Halt,
    pub output: Bytes,
    pub gas: GasMeter,
    pub created_address: Option<Address>,
}

impl FrameResult {
    /// Successful frame that ran no code
    pub fn empty(gas_limit: u64) -> Self {
        Self {
            halt: Halt::Stop,
            output: Bytes::new(),
            gas: GasMeter::new(gas_limit),
            created_address: None,
        }
    }

    /// Exceptional halt before or after the code ran; all gas is gone
    pub fn exception(gas_limit: u64, err: EvmError) -> Self {
        let mut gas = GasMeter::new(gas_limit);
        gas.consume_all();
        Self {
            halt: Halt::Exception(err),
            output: Bytes::new(),
            gas,
            created_address: None,
        }
    }

    /// Turn a finished frame into an exceptional halt
    pub fn fail(&mut self, err: EvmError) {
        self.gas.consume_all();
        self.halt = Halt::Exception(err);
        self.output = Bytes::new();
        self.created_address = None;
    }
}

/// Word read from `data` at `offset`, zero-padded past its end
pub(crate) fn load_padded(data: &[u8], offset: U256) -> U256 {
    let mut buf = [0u8; 32];
    if let Some(start) = word::to_usize(offset).filter(|start| *start < data.len()) {
        let available = (data.len() - start).min(32);
        buf[..available].copy_from_slice(&data[start..start + available]);
    }
    U256::from_big_endian(&buf)
}
