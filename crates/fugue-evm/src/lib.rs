//! # fugue-evm
//!
//! Gas-metered EVM interpreter.
//!
//! A top-level [`Message`] runs through [`run`] (or [`Evm::transact`] for a
//! custom environment, configuration or tracer) against a journaled
//! [`fugue_state::AccountState`]. Nested CALL and CREATE instructions run
//! their child frames recursively, each inside its own state snapshot, so a
//! failing child discards exactly its own changes.
//!
//! Gas costs and the available opcodes follow the [`Revision`] selected in
//! [`VmConfig`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bytecode;
pub mod context;
pub mod error;
mod executor;
pub mod frame;
pub mod gas;
mod interpreter;
pub mod memory;
pub mod opcode;
pub mod revision;
pub mod stack;
mod system;
pub mod tracer;
pub mod word;

pub use bytecode::Bytecode;
pub use context::{BlockContext, CallKind, Env, Message, TxContext};
pub use error::{EvmError, EvmResult, ExecutionResult, Halt, Log};
pub use executor::{run, run_with_revision};
pub use gas::GasMeter;
pub use interpreter::Evm;
pub use memory::Memory;
pub use opcode::{Opcode, OpcodeInfo};
pub use revision::{Revision, SelfDestructPolicy, UnknownRevision, VmConfig};
pub use stack::Stack;
pub use tracer::{StepLogger, StepRecord, StepView, Tracer};
