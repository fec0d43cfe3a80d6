//! # fugue-state
//!
//! Account state for the fugue EVM.
//!
//! [`AccountState`] sits between the interpreter and a [`StateBackend`]. It caches
//! every account the call tree touches, records each mutation in an undo journal,
//! and hands out [`Snapshot`] tokens that nested calls use to roll back their own
//! writes. Pending changes reach the backend only through [`AccountState::commit`].
//!
//! ## Storage semantics
//!
//! A storage slot holding zero is absent. Writing zero deletes the slot; reading
//! an absent slot yields zero; [`AccountState::storage_entries`] never lists it.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod account;
mod backend;
mod error;
mod journal;
mod log;
mod state;

pub use account::AccountInfo;
pub use backend::{
    AccountChange, ChangeSet, MemoryAccount, MemoryBackend, StateBackend, StateReader, StateWriter,
};
pub use error::{StateError, StateResult};
pub use journal::Snapshot;
pub use log::Log;
pub use state::AccountState;
