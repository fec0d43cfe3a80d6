//! Messages and execution environment

use bytes::Bytes;
use fugue_primitives::{Address, H256, U256};
use std::collections::BTreeMap;

/// How a frame was entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// CALL, or a top-level transaction to an account
    Call,
    /// CALLCODE: callee code against the caller's storage
    CallCode,
    /// DELEGATECALL: callee code in the caller's full context
    DelegateCall,
    /// STATICCALL: no state mutation in the subtree
    StaticCall,
    /// CREATE, or a top-level contract creation
    Create,
    /// CREATE2 with its salt
    Create2 {
        /// Salt mixed into the address
        salt: H256,
    },
}

impl CallKind {
    /// Whether the message deploys code
    pub fn is_create(&self) -> bool {
        matches!(self, CallKind::Create | CallKind::Create2 { .. })
    }
}

/// Parameters of one call. Immutable once built; one per frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Call kind
    pub kind: CallKind,
    /// Immediate caller (CALLER)
    pub sender: Address,
    /// Transaction initiator (ORIGIN)
    pub origin: Address,
    /// Account whose storage and balance the frame acts on (ADDRESS)
    pub target: Address,
    /// Account whose code runs; differs from `target` for CALLCODE/DELEGATECALL
    pub code_address: Address,
    /// Value transferred, or apparent value for DELEGATECALL
    pub value: U256,
    /// Call data, or init code for creations
    pub input: Bytes,
    /// Gas available to the frame
    pub gas_limit: u64,
    /// Call depth, 0 at the top
    pub depth: usize,
    /// Whether state mutation is forbidden
    pub is_static: bool,
}

impl Message {
    /// Top-level call from `sender` to `target`
    pub fn call(sender: Address, target: Address, value: U256, input: Bytes, gas_limit: u64) -> Self {
        Self {
            kind: CallKind::Call,
            sender,
            origin: sender,
            target,
            code_address: target,
            value,
            input,
            gas_limit,
            depth: 0,
            is_static: false,
        }
    }

    /// Top-level contract creation; the address is derived when the message runs
    pub fn create(sender: Address, value: U256, init_code: Bytes, gas_limit: u64) -> Self {
        Self {
            kind: CallKind::Create,
            sender,
            origin: sender,
            target: Address::ZERO,
            code_address: Address::ZERO,
            value,
            input: init_code,
            gas_limit,
            depth: 0,
            is_static: false,
        }
    }

    /// Set the transaction origin
    pub fn with_origin(mut self, origin: Address) -> Self {
        self.origin = origin;
        self
    }

    /// Run under STATICCALL rules
    pub fn with_static(mut self) -> Self {
        self.kind = CallKind::StaticCall;
        self.is_static = true;
        self
    }
}

/// Block being executed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockContext {
    /// Block number
    pub number: u64,
    /// Block timestamp
    pub timestamp: u64,
    /// Block gas limit
    pub gas_limit: u64,
    /// Block coinbase (miner/validator)
    pub coinbase: Address,
    /// Block difficulty/prevrandao
    pub prevrandao: H256,
    /// Chain ID
    pub chain_id: u64,
    /// Base fee (EIP-1559)
    pub base_fee: U256,
    /// Hashes of earlier blocks by number
    pub block_hashes: BTreeMap<u64, H256>,
}

impl BlockContext {
    /// BLOCKHASH: only the 256 most recent blocks are visible
    pub fn block_hash(&self, number: U256) -> H256 {
        let current = U256::from(self.number);
        if number >= current || current - number > U256::from(256u64) {
            return H256::ZERO;
        }
        self.block_hashes
            .get(&number.low_u64())
            .copied()
            .unwrap_or(H256::ZERO)
    }
}

impl Default for BlockContext {
    fn default() -> Self {
        Self {
            number: 0,
            timestamp: 0,
            gas_limit: 30_000_000,
            coinbase: Address::ZERO,
            prevrandao: H256::ZERO,
            chain_id: 1,
            base_fee: U256::zero(),
            block_hashes: BTreeMap::new(),
        }
    }
}

/// Transaction-wide values
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxContext {
    /// Gas price
    pub gas_price: U256,
}

/// Complete execution environment
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Env {
    /// Block context
    pub block: BlockContext,
    /// Transaction context
    pub tx: TxContext,
}
