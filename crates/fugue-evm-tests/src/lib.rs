//! # fugue-evm-tests
//!
//! JSON fixture runner for the fugue EVM.
//!
//! A fixture file maps test names to cases. Each case seeds an in-memory
//! state from `pre`, runs one message, and compares the outcome, output,
//! remaining gas and `post` accounts against the expectations it carries.
//!
//! The bundled fixtures under `fixtures/` run as part of `cargo test`; the
//! `fugue-vmtest` binary runs any file or directory of fixtures.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod runner;
mod types;

pub use error::{TestError, TestResult};
pub use runner::{TestRunner, TestStats};
pub use types::*;
pub use vm_test::{VmTestResults, VmTestRunner};
