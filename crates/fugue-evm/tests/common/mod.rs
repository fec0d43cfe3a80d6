//! Shared helpers for the interpreter integration tests

#![allow(dead_code)]

use bytes::Bytes;
use fugue_evm::{Evm, ExecutionResult, Message, Revision, VmConfig};
use fugue_primitives::{Address, U256};
use fugue_state::{AccountInfo, AccountState, MemoryBackend};

pub const CALLER: Address = Address::from_bytes([0xCA; 20]);
pub const CONTRACT: Address = Address::from_bytes([0xC0; 20]);
pub const OTHER: Address = Address::from_bytes([0x0E; 20]);
pub const BENEFICIARY: Address = Address::from_bytes([0xBE; 20]);

pub const STOP: u8 = 0x00;
pub const ADD: u8 = 0x01;
pub const ADDRESS: u8 = 0x30;
pub const CALLER_OP: u8 = 0x33;
pub const CALLVALUE: u8 = 0x34;
pub const EXTCODESIZE: u8 = 0x3B;
pub const RETURNDATASIZE: u8 = 0x3D;
pub const SLOAD: u8 = 0x54;
pub const SSTORE: u8 = 0x55;
pub const GAS: u8 = 0x5A;
pub const TSTORE: u8 = 0x5D;
pub const LOG0: u8 = 0xA0;
pub const CREATE: u8 = 0xF0;
pub const CALL: u8 = 0xF1;
pub const CALLCODE: u8 = 0xF2;
pub const DELEGATECALL: u8 = 0xF4;
pub const CREATE2: u8 = 0xF5;
pub const STATICCALL: u8 = 0xFA;
pub const REVERT: u8 = 0xFD;
pub const SELFDESTRUCT: u8 = 0xFF;

/// PUSH1 `value`
pub fn push1(value: u8) -> Vec<u8> {
    vec![0x60, value]
}

/// PUSH20 `address`
pub fn push_address(address: Address) -> Vec<u8> {
    let mut code = vec![0x73];
    code.extend_from_slice(address.as_bytes());
    code
}

/// PUSHn with the minimal number of bytes (at most 32)
pub fn push_bytes(bytes: &[u8]) -> Vec<u8> {
    assert!(!bytes.is_empty() && bytes.len() <= 32);
    let mut code = vec![0x5F + bytes.len() as u8];
    code.extend_from_slice(bytes);
    code
}

/// SSTORE `value` at `key`
pub fn sstore(key: u8, value: u8) -> Vec<u8> {
    [push1(value), push1(key), vec![SSTORE]].concat()
}

/// MSTORE the top of stack at 0 and return that word
pub fn return_top() -> Vec<u8> {
    vec![0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xF3]
}

/// REVERT with the word `value` as payload
pub fn revert_word(value: u8) -> Vec<u8> {
    vec![0x60, value, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, REVERT]
}

/// A CALL-family instruction with empty input, `out_size` bytes of output at
/// 0, and all available gas. `value` is only pushed for CALL and CALLCODE.
pub fn call(op: u8, to: Address, value: Option<u8>, out_size: u8) -> Vec<u8> {
    let mut code = [push1(out_size), push1(0), push1(0), push1(0)].concat();
    if let Some(value) = value {
        code.extend(push1(value));
    }
    code.extend(push_address(to));
    code.push(GAS);
    code.push(op);
    code
}

/// Init code that deploys `runtime` (at most 32 bytes)
pub fn init_code(runtime: &[u8]) -> Vec<u8> {
    let len = runtime.len() as u8;
    [
        push_bytes(runtime),
        push1(0),
        vec![0x52],
        push1(len),
        push1(32 - len),
        vec![0xF3],
    ]
    .concat()
}

/// Place `init` (at most 32 bytes) in memory and CREATE it with `value`
pub fn create(init: &[u8], value: u8) -> Vec<u8> {
    let len = init.len() as u8;
    [
        push_bytes(init),
        push1(0),
        vec![0x52],
        push1(len),
        push1(32 - len),
        push1(value),
        vec![CREATE],
    ]
    .concat()
}

/// Place `init` (at most 32 bytes) in memory and CREATE2 it with `salt`
pub fn create2(init: &[u8], salt: u8) -> Vec<u8> {
    let len = init.len() as u8;
    [
        push_bytes(init),
        push1(0),
        vec![0x52],
        push1(salt),
        push1(len),
        push1(32 - len),
        push1(0),
        vec![CREATE2],
    ]
    .concat()
}

/// In-memory world
pub struct World {
    pub backend: MemoryBackend,
}

impl World {
    pub fn new() -> Self {
        let mut backend = MemoryBackend::new();
        backend.insert_account(CALLER, AccountInfo::with_balance(U256::from(1_000_000u64)));
        Self { backend }
    }

    pub fn contract(mut self, address: Address, code: Vec<u8>) -> Self {
        self.backend
            .insert_account(address, AccountInfo::default().with_code(code).with_nonce(1));
        self
    }

    pub fn funded_contract(mut self, address: Address, code: Vec<u8>, balance: u64) -> Self {
        self.backend.insert_account(
            address,
            AccountInfo::with_balance(U256::from(balance))
                .with_code(code)
                .with_nonce(1),
        );
        self
    }

    pub fn storage(mut self, address: Address, key: u64, value: u64) -> Self {
        self.backend
            .insert_storage(address, U256::from(key), U256::from(value));
        self
    }

    pub fn state(self) -> AccountState<MemoryBackend> {
        AccountState::new(self.backend)
    }
}

pub fn call_message(gas: u64) -> Message {
    Message::call(CALLER, CONTRACT, U256::zero(), Bytes::new(), gas)
}

pub fn execute(
    state: &mut AccountState<MemoryBackend>,
    revision: Revision,
    message: Message,
) -> ExecutionResult {
    Evm::new(state)
        .with_config(VmConfig::new(revision))
        .transact(message)
}

pub fn word(result: &ExecutionResult) -> U256 {
    U256::from_big_endian(&result.output)
}

pub fn slot(state: &mut AccountState<MemoryBackend>, address: Address, key: u64) -> U256 {
    state.storage(&address, &U256::from(key))
}
