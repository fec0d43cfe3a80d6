//! CALL family, CREATE family and SELFDESTRUCT

use crate::bytecode::Bytecode;
use crate::context::{CallKind, Message};
use crate::error::{EvmError, EvmResult, Halt};
use crate::frame::{Frame, FrameResult};
use crate::gas::{self, cost};
use crate::interpreter::{Effect, Evm};
use crate::opcode::Opcode;
use crate::revision::{Revision, SelfDestructPolicy};
use crate::word;
use bytes::Bytes;
use fugue_crypto::{create2_address, create_address};
use fugue_primitives::{Address, H256, U256};
use fugue_state::StateBackend;
use tracing::debug;

impl<B: StateBackend> Evm<'_, B> {
    /// Run a call-kind message inside its own snapshot
    pub(crate) fn call_message(&mut self, message: Message) -> FrameResult {
        let snapshot = self.state.snapshot();
        let transfer = match message.kind {
            CallKind::Call => self
                .state
                .transfer(&message.sender, &message.target, message.value),
            // value stays with the caller; only its balance is checked
            CallKind::CallCode => self
                .state
                .transfer(&message.sender, &message.sender, message.value),
            _ => Ok(()),
        };
        if let Err(err) = transfer {
            self.state.revert(snapshot);
            return FrameResult::exception(message.gas_limit, err.into());
        }

        let code = self.state.code(&message.code_address);
        let result = if code.is_empty() {
            FrameResult::empty(message.gas_limit)
        } else {
            self.run_frame(message, Bytecode::new(code))
        };

        if result.halt.is_success() {
            self.state.discard(snapshot);
        } else {
            self.state.revert(snapshot);
        }
        result
    }

    /// Run a creation message whose address is already derived into
    /// `message.target`
    pub(crate) fn create_message(&mut self, message: Message) -> FrameResult {
        let address = message.target;
        let gas_limit = message.gas_limit;
        let snapshot = self.state.snapshot();

        if self.state.nonce(&address) != 0 || !self.state.code(&address).is_empty() {
            debug!(%address, "create collision");
            self.state.revert(snapshot);
            return FrameResult::exception(gas_limit, EvmError::CreateCollision);
        }
        let nonce = u64::from(self.revision() >= Revision::SpuriousDragon);
        self.state.create_account(&address, nonce);
        if let Err(err) = self.state.transfer(&message.sender, &address, message.value) {
            self.state.revert(snapshot);
            return FrameResult::exception(gas_limit, err.into());
        }

        let init_code = Bytecode::new(message.input.clone());
        let mut result = self.run_frame(message, init_code);
        if result.halt.is_success() {
            match self.deploy(&address, &mut result) {
                Ok(()) => result.created_address = Some(address),
                Err(err) => {
                    debug!(%address, %err, "code deposit failed");
                    result.fail(err);
                }
            }
        }

        if result.halt.is_success() {
            self.state.discard(snapshot);
        } else {
            self.state.revert(snapshot);
        }
        result
    }

    /// Install the init code's output as the account's code
    fn deploy(&mut self, address: &Address, result: &mut FrameResult) -> EvmResult<()> {
        let revision = self.revision();
        let mut code = std::mem::take(&mut result.output);
        if self.config.max_code_size.is_some_and(|limit| code.len() > limit) {
            return Err(EvmError::MaxCodeSizeExceeded);
        }
        if revision >= Revision::London && code.first() == Some(&0xEF) {
            return Err(EvmError::InvalidCodePrefix);
        }
        let deposit = cost::CODE_DEPOSIT * code.len() as u64;
        if result.gas.remaining() < deposit {
            if revision >= Revision::Homestead {
                return Err(EvmError::OutOfGas);
            }
            code = Bytes::new();
        } else {
            result.gas.charge(deposit)?;
        }
        self.state.set_code(address, code);
        Ok(())
    }

    /// CALL, CALLCODE, DELEGATECALL and STATICCALL
    pub(crate) fn call_op(&mut self, frame: &mut Frame, op: Opcode) -> EvmResult<Effect> {
        let revision = self.revision();
        let requested = frame.stack.pop()?;
        let to = Address::from_word(frame.stack.pop()?);
        let value = match op {
            Opcode::CALL | Opcode::CALLCODE => frame.stack.pop()?,
            _ => U256::zero(),
        };
        let [in_offset, in_size, out_offset, out_size] = frame.stack.pop_n()?;

        if op == Opcode::CALL && frame.message.is_static && !value.is_zero() {
            return Err(EvmError::StaticCallViolation);
        }
        let (in_offset, in_size) = frame.resize_memory(in_offset, in_size)?;
        let (out_offset, out_size) = frame.resize_memory(out_offset, out_size)?;

        let mut extra = 0;
        if !value.is_zero() {
            extra += cost::CALL_VALUE;
        }
        if op == Opcode::CALL {
            let new_account = if revision >= Revision::SpuriousDragon {
                !value.is_zero() && self.state.is_blank(&to)
            } else {
                !self.state.exists(&to)
            };
            if new_account {
                extra += cost::NEW_ACCOUNT;
            }
        }
        frame.gas.charge(extra)?;

        let mut gas_limit = gas::call_gas(revision, frame.gas.remaining(), requested)?;
        frame.gas.charge(gas_limit)?;
        if !value.is_zero() {
            gas_limit += cost::CALL_STIPEND;
        }
        frame.return_data = Bytes::new();

        let depth = frame.message.depth + 1;
        let too_deep = depth > self.config.max_call_depth;
        if !too_deep && !value.is_zero() && self.state.balance(&frame.address()) < value {
            frame.gas.reclaim(gas_limit);
            frame.stack.push(U256::zero())?;
            return Ok(Effect::Continue);
        }

        let parent = &frame.message;
        let input = Bytes::copy_from_slice(frame.memory.slice(in_offset, in_size));
        let message = match op {
            Opcode::CALL => Message {
                kind: CallKind::Call,
                sender: parent.target,
                origin: parent.origin,
                target: to,
                code_address: to,
                value,
                input,
                gas_limit,
                depth,
                is_static: parent.is_static,
            },
            Opcode::CALLCODE => Message {
                kind: CallKind::CallCode,
                sender: parent.target,
                origin: parent.origin,
                target: parent.target,
                code_address: to,
                value,
                input,
                gas_limit,
                depth,
                is_static: parent.is_static,
            },
            Opcode::DELEGATECALL => Message {
                kind: CallKind::DelegateCall,
                sender: parent.sender,
                origin: parent.origin,
                target: parent.target,
                code_address: to,
                value: parent.value,
                input,
                gas_limit,
                depth,
                is_static: parent.is_static,
            },
            _ => Message {
                kind: CallKind::StaticCall,
                sender: parent.target,
                origin: parent.origin,
                target: to,
                code_address: to,
                value: U256::zero(),
                input,
                gas_limit,
                depth,
                is_static: true,
            },
        };

        let result = if too_deep {
            self.depth_exceeded(&message)
        } else {
            self.call_message(message)
        };
        frame.gas.reclaim(result.gas.remaining());
        let success = result.halt.is_success();
        if success {
            frame.gas.merge_refund(&result.gas);
        }
        let copied = out_size.min(result.output.len());
        frame.memory.set(out_offset, &result.output[..copied]);
        frame.return_data = result.output;
        frame.stack.push(word::from_bool(success))?;
        Ok(Effect::Continue)
    }

    /// CREATE and CREATE2
    pub(crate) fn create_op(&mut self, frame: &mut Frame, op: Opcode) -> EvmResult<Effect> {
        let revision = self.revision();
        let [value, offset, size] = frame.stack.pop_n()?;
        let salt = match op {
            Opcode::CREATE2 => Some(H256::from_word(frame.stack.pop()?)),
            _ => None,
        };

        let (offset, size) = frame.resize_memory(offset, size)?;
        if self.config.max_initcode_size.is_some_and(|limit| size > limit) {
            return Err(EvmError::MaxInitCodeSizeExceeded);
        }
        frame.gas.charge(gas::initcode_gas(revision, size))?;
        if salt.is_some() {
            frame.gas.charge(gas::keccak_gas(size))?;
        }
        let init_code = Bytes::copy_from_slice(frame.memory.slice(offset, size));
        frame.return_data = Bytes::new();

        let gas_limit = gas::create_gas(revision, frame.gas.remaining());
        frame.gas.charge(gas_limit)?;

        let creator = frame.address();
        let depth = frame.message.depth + 1;
        let nonce = self.state.nonce(&creator);
        let too_deep = depth > self.config.max_call_depth;
        if !too_deep && (self.state.balance(&creator) < value || nonce == u64::MAX) {
            frame.gas.reclaim(gas_limit);
            frame.stack.push(U256::zero())?;
            return Ok(Effect::Continue);
        }

        let (kind, address) = match salt {
            Some(salt) => (
                CallKind::Create2 { salt },
                create2_address(&creator, &salt, &init_code),
            ),
            None => (CallKind::Create, create_address(&creator, nonce)),
        };
        let message = Message {
            kind,
            sender: creator,
            origin: frame.message.origin,
            target: address,
            code_address: address,
            value,
            input: init_code,
            gas_limit,
            depth,
            is_static: false,
        };

        let result = if too_deep {
            self.depth_exceeded(&message)
        } else {
            self.state.increment_nonce(&creator)?;
            self.create_message(message)
        };
        frame.gas.reclaim(result.gas.remaining());
        let pushed = match result.created_address {
            Some(address) => {
                frame.gas.merge_refund(&result.gas);
                address.to_word()
            }
            None => U256::zero(),
        };
        if result.halt.is_revert() {
            frame.return_data = result.output;
        }
        frame.stack.push(pushed)?;
        Ok(Effect::Continue)
    }

    /// A child past `max_call_depth` halts exceptionally without running; its
    /// forwarded gas is consumed
    fn depth_exceeded(&mut self, message: &Message) -> FrameResult {
        debug!(depth = message.depth, limit = self.config.max_call_depth, "call depth exceeded");
        let result = FrameResult::exception(message.gas_limit, EvmError::CallDepthExceeded);
        if let Some(tracer) = self.tracer.as_deref_mut() {
            tracer.enter(message);
            tracer.exit(message.depth, &result.halt, result.gas.used());
        }
        result
    }

    /// SELFDESTRUCT
    pub(crate) fn selfdestruct_op(&mut self, frame: &mut Frame) -> EvmResult<Effect> {
        let revision = self.revision();
        let beneficiary = Address::from_word(frame.stack.pop()?);
        let address = frame.address();
        let balance = self.state.balance(&address);

        if revision >= Revision::TangerineWhistle {
            let new_account = if revision >= Revision::SpuriousDragon {
                !balance.is_zero() && self.state.is_blank(&beneficiary)
            } else {
                !self.state.exists(&beneficiary)
            };
            if new_account {
                frame.gas.charge(cost::NEW_ACCOUNT)?;
            }
        }
        if revision < Revision::London && !self.state.is_selfdestructed(&address) {
            frame.gas.refund(cost::SELFDESTRUCT_REFUND);
        }

        let delete = match self.config.selfdestruct {
            SelfDestructPolicy::DeferredDelete => true,
            SelfDestructPolicy::SameTransactionOnly => self.state.was_created(&address),
        };
        if beneficiary != address {
            self.state.transfer(&address, &beneficiary, balance)?;
        }
        if delete {
            // a beneficiary equal to the account itself burns the balance
            self.state.set_balance(&address, U256::zero());
            self.state.selfdestruct(&address);
        }
        Ok(Effect::Halt(Halt::SelfDestruct))
    }
}
