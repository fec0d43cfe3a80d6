//! Step tracing hooks
//!
//! A [`Tracer`] observes execution without influencing it. The interpreter
//! calls [`Tracer::step`] after every executed instruction, and the frame
//! hooks when a frame starts and stops.

use crate::context::Message;
use crate::error::Halt;
use crate::opcode::Opcode;
use fugue_primitives::U256;
use serde::{Deserialize, Serialize};

/// Machine state right after an instruction ran
#[derive(Debug, Clone, Copy)]
pub struct StepView<'a> {
    /// Offset of the executed opcode
    pub pc: usize,
    /// Executed opcode
    pub opcode: Opcode,
    /// Gas left after the instruction
    pub gas_remaining: u64,
    /// Gas charged for the instruction
    pub gas_cost: u64,
    /// Call depth
    pub depth: usize,
    /// Stack, bottom first
    pub stack: &'a [U256],
    /// Frame memory
    pub memory: &'a [u8],
}

/// Observer of execution
pub trait Tracer {
    /// Called after each executed instruction
    fn step(&mut self, step: &StepView<'_>);

    /// Called when a frame starts
    fn enter(&mut self, _message: &Message) {}

    /// Called when a frame stops
    fn exit(&mut self, _depth: usize, _halt: &Halt, _gas_used: u64) {}
}

/// Owned copy of a [`StepView`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Program counter
    pub pc: usize,
    /// Opcode byte
    pub op: u8,
    /// Mnemonic
    pub name: String,
    /// Gas left after the instruction
    pub gas: u64,
    /// Gas charged for the instruction
    pub cost: u64,
    /// Call depth
    pub depth: usize,
    /// Stack as hex words, bottom first
    pub stack: Vec<String>,
    /// Memory as one hex string
    pub memory: String,
}

impl From<&StepView<'_>> for StepRecord {
    fn from(step: &StepView<'_>) -> Self {
        Self {
            pc: step.pc,
            op: step.opcode as u8,
            name: step.opcode.info().name.to_string(),
            gas: step.gas_remaining,
            cost: step.gas_cost,
            depth: step.depth,
            stack: step.stack.iter().map(|word| format!("{:#x}", word)).collect(),
            memory: format!("0x{}", hex::encode(step.memory)),
        }
    }
}

/// Tracer that keeps every step
#[derive(Debug, Clone, Default)]
pub struct StepLogger {
    steps: Vec<StepRecord>,
    capture_memory: bool,
}

impl StepLogger {
    /// Logger that records stacks but leaves memory out
    pub fn new() -> Self {
        Self::default()
    }

    /// Logger that also records memory
    pub fn with_memory() -> Self {
        Self {
            steps: Vec::new(),
            capture_memory: true,
        }
    }

    /// Recorded steps
    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    /// Take the recorded steps
    pub fn into_steps(self) -> Vec<StepRecord> {
        self.steps
    }
}

impl Tracer for StepLogger {
    fn step(&mut self, step: &StepView<'_>) {
        let mut record = StepRecord::from(step);
        if !self.capture_memory {
            record.memory.clear();
        }
        self.steps.push(record);
    }
}
