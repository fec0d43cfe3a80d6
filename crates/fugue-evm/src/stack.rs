//! Operand stack

use crate::error::{EvmError, EvmResult};
use crate::gas::cost::MAX_STACK_SIZE;
use fugue_primitives::U256;

/// Operand stack, at most 1024 words deep
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stack {
    data: Vec<U256>,
}

impl Stack {
    /// Create a new empty stack
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(MAX_STACK_SIZE),
        }
    }

    /// Check that `inputs` items are present and that replacing them with
    /// `outputs` items stays within the depth limit.
    pub fn require(&self, inputs: usize, outputs: usize) -> EvmResult<()> {
        if self.data.len() < inputs {
            return Err(EvmError::StackUnderflow);
        }
        if outputs > inputs && self.data.len() - inputs + outputs > MAX_STACK_SIZE {
            return Err(EvmError::StackOverflow);
        }
        Ok(())
    }

    /// Push a value onto the stack
    pub fn push(&mut self, value: U256) -> EvmResult<()> {
        if self.data.len() >= MAX_STACK_SIZE {
            return Err(EvmError::StackOverflow);
        }
        self.data.push(value);
        Ok(())
    }

    /// Pop a value from the stack
    pub fn pop(&mut self) -> EvmResult<U256> {
        self.data.pop().ok_or(EvmError::StackUnderflow)
    }

    /// Pop `N` values, top of stack first
    pub fn pop_n<const N: usize>(&mut self) -> EvmResult<[U256; N]> {
        if self.data.len() < N {
            return Err(EvmError::StackUnderflow);
        }
        let mut values = [U256::zero(); N];
        for value in values.iter_mut() {
            *value = self.pop()?;
        }
        Ok(values)
    }

    /// Exchange the top with the item `depth` below it (SWAP1 is depth 1)
    pub fn swap(&mut self, depth: usize) -> EvmResult<()> {
        let len = self.data.len();
        if depth == 0 || depth >= len {
            return Err(EvmError::StackUnderflow);
        }
        self.data.swap(len - 1, len - 1 - depth);
        Ok(())
    }

    /// Push a copy of the `depth`-th item from the top (DUP1 is depth 1)
    pub fn dup(&mut self, depth: usize) -> EvmResult<()> {
        if depth == 0 || depth > self.data.len() {
            return Err(EvmError::StackUnderflow);
        }
        let value = self.data[self.data.len() - depth];
        self.push(value)
    }

    /// Get current stack size
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if stack is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Items bottom first
    pub fn as_slice(&self) -> &[U256] {
        &self.data
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}
