//! EVM error types and execution results

use fugue_primitives::{Address, U256};
use fugue_state::StateError;
use thiserror::Error;

pub use fugue_state::Log;

/// Faults that end a frame exceptionally.
///
/// Every variant consumes the frame's remaining gas and reverts its state
/// changes. None of them escape [`crate::run`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvmError {
    /// Out of gas
    #[error("out of gas")]
    OutOfGas,

    /// Stack underflow
    #[error("stack underflow")]
    StackUnderflow,

    /// Stack overflow
    #[error("stack overflow (max 1024)")]
    StackOverflow,

    /// Invalid jump destination
    #[error("invalid jump destination: {0}")]
    InvalidJump(usize),

    /// Invalid opcode
    #[error("invalid opcode: 0x{0:02x}")]
    InvalidOpcode(u8),

    /// Write in static context
    #[error("state modification in static context")]
    StaticCallViolation,

    /// Call depth exceeded
    #[error("call depth exceeded")]
    CallDepthExceeded,

    /// Contract creation collision
    #[error("contract address collision")]
    CreateCollision,

    /// Deployed code over the size limit (EIP-170)
    #[error("max code size exceeded")]
    MaxCodeSizeExceeded,

    /// Init code over the size limit (EIP-3860)
    #[error("max init code size exceeded")]
    MaxInitCodeSizeExceeded,

    /// Deployed code starting with 0xEF (EIP-3541)
    #[error("deployed code starts with 0xef")]
    InvalidCodePrefix,

    /// Insufficient balance for transfer
    #[error("insufficient balance")]
    InsufficientBalance,

    /// Return data out of bounds
    #[error("return data out of bounds")]
    ReturnDataOutOfBounds,

    /// Nonce would overflow
    #[error("nonce overflow")]
    NonceOverflow,
}

/// Result type for EVM operations
pub type EvmResult<T> = Result<T, EvmError>;

impl From<StateError> for EvmError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::InsufficientBalance { .. } => EvmError::InsufficientBalance,
            // a balance cannot exceed total supply; treat like any other failed transfer
            StateError::BalanceOverflow(_) => EvmError::InsufficientBalance,
            StateError::NonceOverflow(_) => EvmError::NonceOverflow,
        }
    }
}

/// How a frame stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Halt {
    /// STOP or running off the end of the code
    Stop,
    /// RETURN
    Return,
    /// SELFDESTRUCT
    SelfDestruct,
    /// REVERT
    Revert,
    /// Exceptional halt
    Exception(EvmError),
}

impl Halt {
    /// Whether the frame's state changes are kept
    pub fn is_success(&self) -> bool {
        matches!(self, Halt::Stop | Halt::Return | Halt::SelfDestruct)
    }

    /// Whether the frame ended with REVERT
    pub fn is_revert(&self) -> bool {
        matches!(self, Halt::Revert)
    }

    /// The fault, for exceptional halts
    pub fn error(&self) -> Option<&EvmError> {
        match self {
            Halt::Exception(err) => Some(err),
            _ => None,
        }
    }
}

/// Outcome of a top-level message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Whether execution succeeded
    pub success: bool,
    /// Gas used, after refunds
    pub gas_used: u64,
    /// Refund credited against `gas_used`
    pub gas_refunded: u64,
    /// Return data
    pub output: Vec<u8>,
    /// REVERT payload
    pub revert_reason: Option<Vec<u8>>,
    /// Logs emitted (empty unless successful)
    pub logs: Vec<Log>,
    /// How the outermost frame stopped
    pub halt: Halt,
    /// Deployed contract, for successful CREATE messages
    pub created_address: Option<Address>,
}

/// Selector of `Error(string)`
const ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

impl ExecutionResult {
    /// Gas left over from the message's limit
    pub fn gas_remaining(&self, gas_limit: u64) -> u64 {
        gas_limit.saturating_sub(self.gas_used)
    }

    /// Decode a Solidity `Error(string)` revert payload
    pub fn revert_message(&self) -> Option<String> {
        let data = self.revert_reason.as_deref()?;
        let body = data.strip_prefix(&ERROR_SELECTOR[..])?;
        if body.len() < 64 {
            return None;
        }
        let offset = crate::word::to_usize(U256::from_big_endian(&body[..32]))?;
        let len_end = offset.checked_add(32)?;
        let len = crate::word::to_usize(U256::from_big_endian(body.get(offset..len_end)?))?;
        let text = body.get(len_end..len_end.checked_add(len)?)?;
        String::from_utf8(text.to_vec()).ok()
    }
}
