//! EVM bytecode interpreter

use crate::bytecode::{Bytecode, Instruction};
use crate::context::{Env, Message};
use crate::error::{EvmError, EvmResult, Halt};
use crate::frame::{load_padded, Frame, FrameResult};
use crate::gas::{self, cost};
use crate::opcode::Opcode;
use crate::revision::{Revision, VmConfig};
use crate::tracer::{StepView, Tracer};
use crate::word;
use bytes::Bytes;
use fugue_crypto::keccak256;
use fugue_primitives::{Address, H256, U256};
use fugue_state::{AccountState, Log, StateBackend};
use tracing::{debug, trace};

/// What an instruction asks the frame loop to do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Effect {
    /// Fall through to the next instruction
    Continue,
    /// Continue at a validated jump destination
    Jump(usize),
    /// Stop the frame
    Halt(Halt),
}

/// Interpreter bound to one account state.
///
/// The state is borrowed exclusively for the whole call tree; frames reach it
/// only through this value.
pub struct Evm<'a, B> {
    pub(crate) state: &'a mut AccountState<B>,
    pub(crate) env: Env,
    pub(crate) config: VmConfig,
    pub(crate) tracer: Option<&'a mut dyn Tracer>,
}

impl<'a, B: StateBackend> Evm<'a, B> {
    /// Interpreter with the default environment and configuration
    pub fn new(state: &'a mut AccountState<B>) -> Self {
        Self {
            state,
            env: Env::default(),
            config: VmConfig::default(),
            tracer: None,
        }
    }

    /// Use `env` for block and transaction values
    pub fn with_env(mut self, env: Env) -> Self {
        self.env = env;
        self
    }

    /// Use `config`
    pub fn with_config(mut self, config: VmConfig) -> Self {
        self.config = config;
        self
    }

    /// Report every step to `tracer`
    pub fn with_tracer(mut self, tracer: &'a mut dyn Tracer) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Active configuration
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Account state being executed against
    pub fn state(&mut self) -> &mut AccountState<B> {
        self.state
    }

    pub(crate) fn revision(&self) -> Revision {
        self.config.revision
    }

    /// Run `code` for `message` until it halts
    pub(crate) fn run_frame(&mut self, message: Message, code: Bytecode) -> FrameResult {
        debug!(
            kind = ?message.kind,
            depth = message.depth,
            gas = message.gas_limit,
            target = %message.target,
            "entering frame"
        );
        if let Some(tracer) = self.tracer.as_deref_mut() {
            tracer.enter(&message);
        }

        let mut frame = Frame::new(message, code);
        let revision = self.revision();
        let halt = loop {
            let inst = frame.code.decode(frame.pc, revision);
            let gas_before = frame.gas.remaining();
            let effect = match self.step(&mut frame, &inst) {
                Ok(effect) => effect,
                Err(err) => {
                    trace!(pc = inst.pc, opcode = inst.info.name, %err, "exceptional halt");
                    frame.gas.consume_all();
                    break Halt::Exception(err);
                }
            };
            if let Some(tracer) = self.tracer.as_deref_mut() {
                tracer.step(&StepView {
                    pc: inst.pc,
                    opcode: inst.opcode,
                    gas_remaining: frame.gas.remaining(),
                    gas_cost: gas_before.saturating_sub(frame.gas.remaining()),
                    depth: frame.message.depth,
                    stack: frame.stack.as_slice(),
                    memory: frame.memory.data(),
                });
            }
            match effect {
                Effect::Continue => frame.pc = inst.next_pc,
                Effect::Jump(dest) => frame.pc = dest,
                Effect::Halt(halt) => break halt,
            }
        };

        if !halt.is_success() && !halt.is_revert() {
            frame.output = Bytes::new();
        }
        debug!(
            depth = frame.message.depth,
            gas_used = frame.gas.used(),
            ?halt,
            "leaving frame"
        );
        if let Some(tracer) = self.tracer.as_deref_mut() {
            tracer.exit(frame.message.depth, &halt, frame.gas.used());
        }
        FrameResult {
            halt,
            output: frame.output,
            gas: frame.gas,
            created_address: None,
        }
    }

    /// Execute one instruction
    fn step(&mut self, frame: &mut Frame, inst: &Instruction) -> EvmResult<Effect> {
        let op = inst.opcode;
        if op == Opcode::INVALID {
            return Err(EvmError::InvalidOpcode(inst.byte));
        }
        if frame.message.is_static && op.is_state_mutating() {
            return Err(EvmError::StaticCallViolation);
        }
        frame.gas.charge(inst.info.base_gas(self.revision()))?;
        frame.stack.require(inst.info.inputs, inst.info.outputs)?;

        let address = frame.address();
        let stack = &mut frame.stack;
        match op {
            Opcode::STOP => return Ok(Effect::Halt(Halt::Stop)),

            // Arithmetic
            Opcode::ADD => binary(stack, word::add)?,
            Opcode::MUL => binary(stack, word::mul)?,
            Opcode::SUB => binary(stack, word::sub)?,
            Opcode::DIV => binary(stack, word::div)?,
            Opcode::SDIV => binary(stack, word::sdiv)?,
            Opcode::MOD => binary(stack, word::rem)?,
            Opcode::SMOD => binary(stack, word::smod)?,
            Opcode::ADDMOD => {
                let [a, b, n] = stack.pop_n()?;
                stack.push(word::addmod(a, b, n))?;
            }
            Opcode::MULMOD => {
                let [a, b, n] = stack.pop_n()?;
                stack.push(word::mulmod(a, b, n))?;
            }
            Opcode::EXP => {
                let [base, exponent] = stack.pop_n()?;
                frame.gas.charge(gas::exp_gas(self.config.revision, exponent))?;
                frame.stack.push(word::exp(base, exponent))?;
            }
            Opcode::SIGNEXTEND => binary(stack, word::signextend)?,

            // Comparison & bitwise logic
            Opcode::LT => binary(stack, |a, b| word::from_bool(a < b))?,
            Opcode::GT => binary(stack, |a, b| word::from_bool(a > b))?,
            Opcode::SLT => binary(stack, |a, b| word::from_bool(word::slt(a, b)))?,
            Opcode::SGT => binary(stack, |a, b| word::from_bool(word::sgt(a, b)))?,
            Opcode::EQ => binary(stack, |a, b| word::from_bool(a == b))?,
            Opcode::ISZERO => {
                let a = stack.pop()?;
                stack.push(word::from_bool(a.is_zero()))?;
            }
            Opcode::AND => binary(stack, |a, b| a & b)?,
            Opcode::OR => binary(stack, |a, b| a | b)?,
            Opcode::XOR => binary(stack, |a, b| a ^ b)?,
            Opcode::NOT => {
                let a = stack.pop()?;
                stack.push(!a)?;
            }
            Opcode::BYTE => binary(stack, word::byte)?,
            Opcode::SHL => binary(stack, word::shl)?,
            Opcode::SHR => binary(stack, word::shr)?,
            Opcode::SAR => binary(stack, word::sar)?,

            Opcode::KECCAK256 => {
                let [offset, size] = stack.pop_n()?;
                let (offset, size) = frame.resize_memory(offset, size)?;
                frame.gas.charge(gas::keccak_gas(size))?;
                let hash = keccak256(frame.memory.slice(offset, size));
                frame.stack.push(hash.to_word())?;
            }

            // Environment
            Opcode::ADDRESS => stack.push(address.to_word())?,
            Opcode::BALANCE => {
                let account = Address::from_word(stack.pop()?);
                let balance = self.state.balance(&account);
                frame.stack.push(balance)?;
            }
            Opcode::ORIGIN => stack.push(frame.message.origin.to_word())?,
            Opcode::CALLER => stack.push(frame.message.sender.to_word())?,
            Opcode::CALLVALUE => stack.push(frame.message.value)?,
            Opcode::CALLDATALOAD => {
                let offset = stack.pop()?;
                stack.push(load_padded(&frame.input, offset))?;
            }
            Opcode::CALLDATASIZE => stack.push(U256::from(frame.input.len()))?,
            Opcode::CALLDATACOPY => {
                let source = frame.input.clone();
                copy_to_memory(frame, &source)?;
            }
            Opcode::CODESIZE => stack.push(U256::from(frame.code.len()))?,
            Opcode::CODECOPY => {
                let source = frame.code.bytes().clone();
                copy_to_memory(frame, &source)?;
            }
            Opcode::GASPRICE => stack.push(self.env.tx.gas_price)?,
            Opcode::EXTCODESIZE => {
                let account = Address::from_word(stack.pop()?);
                let size = self.state.code(&account).len();
                frame.stack.push(U256::from(size))?;
            }
            Opcode::EXTCODECOPY => {
                let account = Address::from_word(stack.pop()?);
                let source = self.state.code(&account);
                copy_to_memory(frame, &source)?;
            }
            Opcode::RETURNDATASIZE => stack.push(U256::from(frame.return_data.len()))?,
            Opcode::RETURNDATACOPY => {
                let [dest, offset, size] = stack.pop_n()?;
                let end = offset.checked_add(size).ok_or(EvmError::ReturnDataOutOfBounds)?;
                if end > U256::from(frame.return_data.len()) {
                    return Err(EvmError::ReturnDataOutOfBounds);
                }
                let (dest, size) = frame.resize_memory(dest, size)?;
                frame.gas.charge(gas::copy_gas(size))?;
                let start = offset.low_u64() as usize;
                let data = frame.return_data.slice(start..start + size);
                frame.memory.set(dest, &data);
            }
            Opcode::EXTCODEHASH => {
                let account = Address::from_word(stack.pop()?);
                let hash = if self.state.is_blank(&account) {
                    H256::ZERO
                } else {
                    self.state.code_hash(&account)
                };
                frame.stack.push(hash.to_word())?;
            }

            // Block information
            Opcode::BLOCKHASH => {
                let number = stack.pop()?;
                stack.push(self.env.block.block_hash(number).to_word())?;
            }
            Opcode::COINBASE => stack.push(self.env.block.coinbase.to_word())?,
            Opcode::TIMESTAMP => stack.push(U256::from(self.env.block.timestamp))?,
            Opcode::NUMBER => stack.push(U256::from(self.env.block.number))?,
            Opcode::PREVRANDAO => stack.push(self.env.block.prevrandao.to_word())?,
            Opcode::GASLIMIT => stack.push(U256::from(self.env.block.gas_limit))?,
            Opcode::CHAINID => stack.push(U256::from(self.env.block.chain_id))?,
            Opcode::SELFBALANCE => {
                let balance = self.state.balance(&address);
                stack.push(balance)?;
            }
            Opcode::BASEFEE => stack.push(self.env.block.base_fee)?,

            // Stack, memory, storage and flow
            Opcode::POP => {
                stack.pop()?;
            }
            Opcode::MLOAD => {
                let offset = stack.pop()?;
                let (offset, _) = frame.resize_memory(offset, U256::from(32u64))?;
                let value = frame.memory.load(offset);
                frame.stack.push(value)?;
            }
            Opcode::MSTORE => {
                let [offset, value] = stack.pop_n()?;
                let (offset, _) = frame.resize_memory(offset, U256::from(32u64))?;
                frame.memory.store(offset, value);
            }
            Opcode::MSTORE8 => {
                let [offset, value] = stack.pop_n()?;
                let (offset, _) = frame.resize_memory(offset, U256::one())?;
                frame.memory.store8(offset, value);
            }
            Opcode::SLOAD => {
                let key = stack.pop()?;
                let value = self.state.storage(&address, &key);
                frame.stack.push(value)?;
            }
            Opcode::SSTORE => {
                let revision = self.revision();
                if revision >= Revision::Istanbul && frame.gas.remaining() <= cost::SSTORE_SENTRY {
                    return Err(EvmError::OutOfGas);
                }
                let [key, value] = stack.pop_n()?;
                let current = self.state.storage(&address, &key);
                let (cost, refund) = gas::sstore_gas(revision, current, value);
                frame.gas.charge(cost)?;
                frame.gas.refund(refund);
                self.state.set_storage(&address, key, value);
            }
            Opcode::JUMP => {
                let dest = stack.pop()?;
                return jump(frame, dest);
            }
            Opcode::JUMPI => {
                let [dest, condition] = stack.pop_n()?;
                if !condition.is_zero() {
                    return jump(frame, dest);
                }
            }
            Opcode::PC => stack.push(U256::from(inst.pc))?,
            Opcode::MSIZE => stack.push(U256::from(frame.memory.size()))?,
            Opcode::GAS => stack.push(U256::from(frame.gas.remaining()))?,
            Opcode::JUMPDEST => {}
            Opcode::TLOAD => {
                let key = stack.pop()?;
                stack.push(self.state.transient(&address, &key))?;
            }
            Opcode::TSTORE => {
                let [key, value] = stack.pop_n()?;
                self.state.set_transient(&address, key, value);
            }
            Opcode::MCOPY => {
                let [dest, src, size] = stack.pop_n()?;
                let (src, _) = frame.resize_memory(src, size)?;
                let (dest, size) = frame.resize_memory(dest, size)?;
                frame.gas.charge(gas::copy_gas(size))?;
                frame.memory.copy_within(dest, src, size);
            }

            op if op.is_push() => stack.push(inst.push_value())?,
            op if op.dup_depth() > 0 => stack.dup(op.dup_depth())?,
            op if op.swap_depth() > 0 => stack.swap(op.swap_depth())?,

            Opcode::LOG0 | Opcode::LOG1 | Opcode::LOG2 | Opcode::LOG3 | Opcode::LOG4 => {
                let [offset, size] = stack.pop_n()?;
                let mut topics = Vec::with_capacity(op.log_topics());
                for _ in 0..op.log_topics() {
                    topics.push(H256::from_word(stack.pop()?));
                }
                let (offset, size) = frame.resize_memory(offset, size)?;
                frame.gas.charge(gas::log_data_gas(size))?;
                let data = frame.memory.slice(offset, size).to_vec();
                self.state.log(Log::new(address, topics, data));
            }

            // System operations
            Opcode::CREATE | Opcode::CREATE2 => return self.create_op(frame, op),
            Opcode::CALL | Opcode::CALLCODE | Opcode::DELEGATECALL | Opcode::STATICCALL => {
                return self.call_op(frame, op)
            }
            Opcode::RETURN | Opcode::REVERT => {
                let [offset, size] = stack.pop_n()?;
                let (offset, size) = frame.resize_memory(offset, size)?;
                frame.output = Bytes::copy_from_slice(frame.memory.slice(offset, size));
                let halt = if op == Opcode::RETURN {
                    Halt::Return
                } else {
                    Halt::Revert
                };
                return Ok(Effect::Halt(halt));
            }
            Opcode::SELFDESTRUCT => return self.selfdestruct_op(frame),

            _ => return Err(EvmError::InvalidOpcode(inst.byte)),
        }

        Ok(Effect::Continue)
    }
}

fn binary(stack: &mut crate::stack::Stack, f: impl FnOnce(U256, U256) -> U256) -> EvmResult<()> {
    let [a, b] = stack.pop_n()?;
    stack.push(f(a, b))
}

fn jump(frame: &Frame, dest: U256) -> EvmResult<Effect> {
    let dest = word::to_usize(dest).ok_or(EvmError::InvalidJump(usize::MAX))?;
    if !frame.code.is_jump_dest(dest) {
        return Err(EvmError::InvalidJump(dest));
    }
    Ok(Effect::Jump(dest))
}

/// CALLDATACOPY, CODECOPY and EXTCODECOPY: `dest offset size` on the stack
fn copy_to_memory(frame: &mut Frame, source: &[u8]) -> EvmResult<()> {
    let [dest, offset, size] = frame.stack.pop_n()?;
    let (dest, size) = frame.resize_memory(dest, size)?;
    frame.gas.charge(gas::copy_gas(size))?;
    frame.memory.set_padded(dest, size, source, offset);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracer::StepLogger;
    use crate::ExecutionResult;
    use fugue_state::{AccountInfo, MemoryBackend};

    const CALLER: Address = Address::from_bytes([0xCA; 20]);
    const CONTRACT: Address = Address::from_bytes([0xC0; 20]);

    /// MSTORE the top of stack at 0 and return that word
    const RETURN_TOP: [u8; 8] = [0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xF3];

    fn state_with(code: &[u8]) -> AccountState<MemoryBackend> {
        let mut backend = MemoryBackend::new();
        backend.insert_account(CONTRACT, AccountInfo::default().with_code(code.to_vec()));
        AccountState::new(backend)
    }

    fn call(gas: u64) -> Message {
        Message::call(CALLER, CONTRACT, U256::zero(), Bytes::new(), gas)
    }

    fn run_code_at(revision: Revision, code: &[u8], gas: u64) -> ExecutionResult {
        let mut state = state_with(code);
        Evm::new(&mut state)
            .with_config(VmConfig::new(revision))
            .transact(call(gas))
    }

    fn run_code(code: &[u8], gas: u64) -> ExecutionResult {
        run_code_at(Revision::Cancun, code, gas)
    }

    fn returned_word(code: &[u8]) -> U256 {
        let mut code = code.to_vec();
        code.extend_from_slice(&RETURN_TOP);
        let result = run_code(&code, 100_000);
        assert!(result.success, "{:?}", result.halt);
        U256::from_big_endian(&result.output)
    }

    #[test]
    fn test_stop() {
        let result = run_code(&[0x00], 1000);
        assert!(result.success);
        assert_eq!(result.halt, Halt::Stop);
        assert_eq!(result.gas_used, 0);
    }

    #[test]
    fn test_running_off_the_end_is_stop() {
        // PUSH1 3, PUSH1 5, ADD
        let result = run_code(&[0x60, 0x03, 0x60, 0x05, 0x01], 1000);
        assert!(result.success);
        assert_eq!(result.halt, Halt::Stop);
        assert_eq!(result.gas_used, 9);
        assert!(result.output.is_empty());
    }

    #[test]
    fn test_add_and_return() {
        // PUSH1 5, PUSH1 3, ADD, PUSH1 0, MSTORE, PUSH1 32, PUSH1 0, RETURN
        let code = [0x60, 0x05, 0x60, 0x03, 0x01, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xF3];
        let result = run_code(&code, 1000);
        assert!(result.success);
        assert_eq!(result.halt, Halt::Return);
        assert_eq!(result.output.len(), 32);
        assert_eq!(U256::from_big_endian(&result.output), U256::from(8u64));
        assert_eq!(result.gas_used, 24);
    }

    #[test]
    fn test_arithmetic_wraps() {
        // PUSH1 1, PUSH1 0, SUB -> 0 - 1
        assert_eq!(returned_word(&[0x60, 0x01, 0x60, 0x00, 0x03]), U256::MAX);
        // PUSH1 0, PUSH1 10, DIV -> 10 / 0
        assert_eq!(returned_word(&[0x60, 0x00, 0x60, 0x0A, 0x04]), U256::zero());
        // PUSH1 3, PUSH1 10, MOD
        assert_eq!(returned_word(&[0x60, 0x03, 0x60, 0x0A, 0x06]), U256::one());
    }

    #[test]
    fn test_exp_charges_per_byte() {
        // PUSH1 2, PUSH1 3, EXP -> 3 ** 2
        let code = [0x60, 0x02, 0x60, 0x03, 0x0A];
        assert_eq!(returned_word(&code), U256::from(9u64));
        assert_eq!(run_code(&code, 1000).gas_used, 3 + 3 + 10 + 50);
        assert_eq!(run_code_at(Revision::Homestead, &code, 1000).gas_used, 3 + 3 + 10 + 10);
    }

    #[test]
    fn test_comparisons() {
        // PUSH1 10, PUSH1 5, LT -> 5 < 10
        assert_eq!(returned_word(&[0x60, 0x0A, 0x60, 0x05, 0x10]), U256::one());
        // PUSH1 1, PUSH1 0, NOT, SLT -> -1 < 1
        assert_eq!(returned_word(&[0x60, 0x01, 0x60, 0x00, 0x19, 0x12]), U256::one());
        // PUSH1 0, ISZERO
        assert_eq!(returned_word(&[0x60, 0x00, 0x15]), U256::one());
    }

    #[test]
    fn test_dup_swap() {
        // PUSH1 1, PUSH1 2, DUP2, SWAP2, POP, POP -> 1 remains on top
        let code = [0x60, 0x01, 0x60, 0x02, 0x81, 0x91, 0x50, 0x50];
        assert_eq!(returned_word(&code), U256::from(1u64));
        // PUSH1 7, PUSH1 8, SWAP1 -> 7 on top
        assert_eq!(returned_word(&[0x60, 0x07, 0x60, 0x08, 0x90]), U256::from(7u64));
    }

    #[test]
    fn test_push32_and_truncated_push() {
        let mut code = vec![0x7F];
        code.extend_from_slice(&[0xFF; 32]);
        assert_eq!(returned_word(&code), U256::MAX);

        // PUSH2 with one byte left runs off the end
        let result = run_code(&[0x61, 0x01], 100);
        assert!(result.success);
        assert_eq!(result.gas_used, 3);
    }

    #[test]
    fn test_jump() {
        // PUSH1 4, JUMP, INVALID, JUMPDEST, STOP
        let result = run_code(&[0x60, 0x04, 0x56, 0xFE, 0x5B, 0x00], 1000);
        assert!(result.success);
        assert_eq!(result.gas_used, 3 + 8 + 1);
    }

    #[test]
    fn test_jumpi() {
        // PUSH1 1, PUSH1 6, JUMPI, INVALID, JUMPDEST, STOP
        let taken = [0x60, 0x01, 0x60, 0x06, 0x57, 0xFE, 0x5B, 0x00];
        assert!(run_code(&taken, 1000).success);

        // PUSH1 0, PUSH1 6, JUMPI, STOP, INVALID, JUMPDEST
        let not_taken = [0x60, 0x00, 0x60, 0x06, 0x57, 0x00, 0xFE, 0x5B];
        assert!(run_code(&not_taken, 1000).success);
    }

    #[test]
    fn test_jump_into_push_data_fails() {
        // PUSH1 4, JUMP, PUSH1 0x5B, STOP
        let result = run_code(&[0x60, 0x04, 0x56, 0x60, 0x5B, 0x00], 1000);
        assert!(!result.success);
        assert_eq!(result.halt, Halt::Exception(EvmError::InvalidJump(4)));
        assert_eq!(result.gas_used, 1000);
    }

    #[test]
    fn test_invalid_opcode_consumes_all_gas() {
        let result = run_code(&[0x60, 0x01, 0xFE], 5000);
        assert!(!result.success);
        assert_eq!(result.halt, Halt::Exception(EvmError::InvalidOpcode(0xFE)));
        assert_eq!(result.gas_used, 5000);

        let result = run_code(&[0x0C], 5000);
        assert_eq!(result.halt, Halt::Exception(EvmError::InvalidOpcode(0x0C)));
    }

    #[test]
    fn test_opcode_before_introduction_is_invalid() {
        // PUSH0
        let result = run_code_at(Revision::London, &[0x5F], 100);
        assert_eq!(result.halt, Halt::Exception(EvmError::InvalidOpcode(0x5F)));
        assert!(run_code_at(Revision::Shanghai, &[0x5F], 100).success);
    }

    #[test]
    fn test_stack_underflow() {
        let result = run_code(&[0x01], 1000);
        assert_eq!(result.halt, Halt::Exception(EvmError::StackUnderflow));
        assert_eq!(result.gas_used, 1000);
    }

    #[test]
    fn test_stack_overflow() {
        // 1025 x PUSH0
        let code = vec![0x5F; 1025];
        let result = run_code(&code, 1_000_000);
        assert_eq!(result.halt, Halt::Exception(EvmError::StackOverflow));

        let code = vec![0x5F; 1024];
        assert!(run_code(&code, 1_000_000).success);
    }

    #[test]
    fn test_out_of_gas() {
        let result = run_code(&[0x60, 0x01], 2);
        assert!(!result.success);
        assert_eq!(result.halt, Halt::Exception(EvmError::OutOfGas));
        assert_eq!(result.gas_used, 2);
    }

    #[test]
    fn test_memory_expansion_gas() {
        // PUSH1 1, PUSH2 0x03E0, MSTORE -> memory grows to 1024 bytes
        let result = run_code(&[0x60, 0x01, 0x61, 0x03, 0xE0, 0x52], 1000);
        assert!(result.success);
        assert_eq!(result.gas_used, 3 + 3 + 3 + 98);
    }

    #[test]
    fn test_mload_past_end_reads_zero() {
        // PUSH1 0x40, MLOAD, MSIZE, ADD -> 0 + 96
        assert_eq!(returned_word(&[0x60, 0x40, 0x51, 0x59, 0x01]), U256::from(96u64));
    }

    #[test]
    fn test_mstore8() {
        // PUSH2 0x1234, PUSH1 31, MSTORE8, PUSH1 0, MLOAD
        let code = [0x61, 0x12, 0x34, 0x60, 0x1F, 0x53, 0x60, 0x00, 0x51];
        assert_eq!(returned_word(&code), U256::from(0x34u64));
    }

    #[test]
    fn test_mcopy() {
        // PUSH1 0xAB, PUSH1 0, MSTORE8, PUSH1 1, PUSH1 0, PUSH1 31, MCOPY, PUSH1 0, MLOAD
        let code = [
            0x60, 0xAB, 0x60, 0x00, 0x53, 0x60, 0x01, 0x60, 0x00, 0x60, 0x1F, 0x5E, 0x60, 0x00,
            0x51,
        ];
        let expected = (U256::from(0xABu64) << 248) | U256::from(0xABu64);
        assert_eq!(returned_word(&code), expected);
    }

    #[test]
    fn test_keccak256() {
        // KECCAK256 of zero bytes
        let code = [0x60, 0x00, 0x60, 0x00, 0x20];
        assert_eq!(returned_word(&code), fugue_crypto::KECCAK_EMPTY.to_word());
        let result = run_code(&code, 1000);
        assert_eq!(result.gas_used, 3 + 3 + 30);
    }

    #[test]
    fn test_sstore_sload() {
        // PUSH1 42, PUSH1 1, SSTORE, PUSH1 1, SLOAD
        let code = [0x60, 0x2A, 0x60, 0x01, 0x55, 0x60, 0x01, 0x54];
        assert_eq!(returned_word(&code), U256::from(42u64));

        let result = run_code(&code[..5], 100_000);
        assert_eq!(result.gas_used, 3 + 3 + 20_000);
    }

    #[test]
    fn test_sstore_sentry() {
        // PUSH1 1, PUSH1 0, SSTORE with 2300 left at the SSTORE
        let code = [0x60, 0x01, 0x60, 0x00, 0x55];
        let result = run_code(&code, 2306);
        assert_eq!(result.halt, Halt::Exception(EvmError::OutOfGas));
    }

    #[test]
    fn test_sstore_clear_refund_is_capped() {
        let mut backend = MemoryBackend::new();
        // PUSH1 0, PUSH1 0, SSTORE
        backend.insert_account(
            CONTRACT,
            AccountInfo::default().with_code(vec![0x60, 0x00, 0x60, 0x00, 0x55]),
        );
        backend.insert_storage(CONTRACT, U256::zero(), U256::one());
        let mut state = AccountState::new(backend);

        let result = Evm::new(&mut state).transact(call(100_000));
        assert!(result.success);
        // 2906 used, refund 4800 capped at 2906 / 5
        assert_eq!(result.gas_refunded, 581);
        assert_eq!(result.gas_used, 2906 - 581);
        assert_eq!(state.storage(&CONTRACT, &U256::zero()), U256::zero());
        assert!(state.storage_entries(&CONTRACT).is_empty());
    }

    #[test]
    fn test_transient_storage() {
        // PUSH1 7, PUSH1 1, TSTORE, PUSH1 1, TLOAD
        let code = [0x60, 0x07, 0x60, 0x01, 0x5D, 0x60, 0x01, 0x5C];
        assert_eq!(returned_word(&code), U256::from(7u64));
    }

    #[test]
    fn test_environment_opcodes() {
        let mut state = state_with(&[0x32, 0x33, 0x30, 0x34, 0x46, 0x00]);
        let mut logger = StepLogger::new();
        let result = Evm::new(&mut state)
            .with_tracer(&mut logger)
            .transact(call(1000));
        assert!(result.success);

        let last = &logger.steps()[4];
        assert_eq!(last.name, "CHAINID");
        assert_eq!(
            last.stack,
            vec![
                format!("{:#x}", CALLER.to_word()),
                format!("{:#x}", CALLER.to_word()),
                format!("{:#x}", CONTRACT.to_word()),
                "0x0".to_string(),
                "0x1".to_string(),
            ]
        );
    }

    #[test]
    fn test_calldata() {
        let mut state = state_with(&[0x60, 0x01, 0x35, 0x36, 0x01, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xF3]);
        let input = Bytes::from_static(&[0x11, 0x22, 0x33]);
        let message = Message::call(CALLER, CONTRACT, U256::zero(), input, 1000);
        let result = Evm::new(&mut state).transact(message);
        // 0x2233 << 240, plus CALLDATASIZE
        let expected = (U256::from(0x2233u64) << 240) + U256::from(3u64);
        assert_eq!(U256::from_big_endian(&result.output), expected);
    }

    #[test]
    fn test_tracer_sees_every_step() {
        let mut state = state_with(&[0x60, 0x03, 0x60, 0x05, 0x01, 0x00]);
        let mut logger = StepLogger::new();
        let result = Evm::new(&mut state)
            .with_tracer(&mut logger)
            .transact(call(100));
        assert!(result.success);

        let steps = logger.into_steps();
        let names: Vec<_> = steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["PUSH1", "PUSH1", "ADD", "STOP"]);
        assert_eq!(steps[2].gas, 91);
        assert_eq!(steps[2].cost, 3);
        assert_eq!(steps[2].stack, vec!["0x8".to_string()]);
        assert_eq!(steps[1].pc, 2);
    }

    #[test]
    fn test_revert_keeps_unused_gas() {
        // PUSH1 0, PUSH1 0, REVERT
        let result = run_code(&[0x60, 0x00, 0x60, 0x00, 0xFD], 10_000);
        assert!(!result.success);
        assert_eq!(result.halt, Halt::Revert);
        assert_eq!(result.gas_used, 6);
        assert_eq!(result.revert_reason, Some(Vec::new()));
    }

    #[test]
    fn test_log_emitted() {
        // PUSH1 0xAA, PUSH1 0, MSTORE8, PUSH1 9, PUSH1 1, PUSH1 0, LOG1
        let code = [0x60, 0xAA, 0x60, 0x00, 0x53, 0x60, 0x09, 0x60, 0x01, 0x60, 0x00, 0xA1];
        let result = run_code(&code, 10_000);
        assert!(result.success);
        assert_eq!(result.logs.len(), 1);
        let log = &result.logs[0];
        assert_eq!(log.address, CONTRACT);
        assert_eq!(log.topics, vec![H256::from_word(U256::from(9u64))]);
        assert_eq!(log.data, vec![0xAA]);
        // 3 pushes + MSTORE8 + memory + 3 pushes + LOG1 + data
        assert_eq!(result.gas_used, 3 + 3 + 3 + 3 + 3 + 3 + 3 + 750 + 8);
    }
}
