//! Top-level message execution

use crate::context::{CallKind, Message};
use crate::error::{EvmError, ExecutionResult, Halt};
use crate::frame::FrameResult;
use crate::interpreter::Evm;
use crate::revision::{Revision, VmConfig};
use fugue_crypto::{create2_address, create_address};
use fugue_state::{AccountState, StateBackend};
use tracing::debug;

impl<B: StateBackend> Evm<'_, B> {
    /// Execute a top-level message as one transaction.
    ///
    /// Never fails: every outcome, including exceptional halts, is described by
    /// the returned [`ExecutionResult`]. Pending changes stay in the account
    /// state until the caller commits them.
    pub fn transact(&mut self, mut message: Message) -> ExecutionResult {
        let gas_limit = message.gas_limit;
        debug!(kind = ?message.kind, sender = %message.sender, gas = gas_limit, "transaction");

        let balance = self.state.balance(&message.sender);
        if balance < message.value {
            return self.rejected(gas_limit, EvmError::InsufficientBalance);
        }

        let result = if message.kind.is_create() {
            let nonce = match self.state.increment_nonce(&message.sender) {
                Ok(nonce) => nonce,
                Err(err) => return self.rejected(gas_limit, err.into()),
            };
            message.target = match message.kind {
                CallKind::Create2 { salt } => {
                    create2_address(&message.sender, &salt, &message.input)
                }
                _ => create_address(&message.sender, nonce),
            };
            message.code_address = message.target;
            if self
                .config
                .max_initcode_size
                .is_some_and(|limit| message.input.len() > limit)
            {
                FrameResult::exception(gas_limit, EvmError::MaxInitCodeSizeExceeded)
            } else {
                self.create_message(message)
            }
        } else {
            self.call_message(message)
        };

        self.conclude(gas_limit, result)
    }

    /// Apply the refund cap, close the transaction and build the result
    fn conclude(&mut self, gas_limit: u64, result: FrameResult) -> ExecutionResult {
        let success = result.halt.is_success();
        let used = result.gas.used();
        let refunded = if success {
            result.gas.refunded().min(used / self.config.refund_quotient.max(1))
        } else {
            0
        };
        let logs = self.state.finalize_transaction();
        let revert_reason = result.halt.is_revert().then(|| result.output.to_vec());
        debug!(
            success,
            gas_used = used - refunded,
            refunded,
            limit = gas_limit,
            "transaction finished"
        );
        ExecutionResult {
            success,
            gas_used: used - refunded,
            gas_refunded: refunded,
            output: result.output.to_vec(),
            revert_reason,
            logs: if success { logs } else { Vec::new() },
            halt: result.halt,
            created_address: result.created_address,
        }
    }

    fn rejected(&mut self, gas_limit: u64, err: EvmError) -> ExecutionResult {
        debug!(%err, limit = gas_limit, "message rejected");
        self.state.finalize_transaction();
        ExecutionResult {
            success: false,
            gas_used: 0,
            gas_refunded: 0,
            output: Vec::new(),
            revert_reason: None,
            logs: Vec::new(),
            halt: Halt::Exception(err),
            created_address: None,
        }
    }
}

/// Execute `message` against `state` with the default environment and the
/// latest revision
pub fn run<B: StateBackend>(message: Message, state: &mut AccountState<B>) -> ExecutionResult {
    Evm::new(state).transact(message)
}

/// Execute `message` under `revision`
pub fn run_with_revision<B: StateBackend>(
    message: Message,
    state: &mut AccountState<B>,
    revision: Revision,
) -> ExecutionResult {
    Evm::new(state)
        .with_config(VmConfig::new(revision))
        .transact(message)
}
