//! Error types for fixture runs

use thiserror::Error;

/// Fixture error type
#[derive(Error, Debug)]
pub enum TestError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Fixture content the runner cannot use
    #[error("Parse error: {0}")]
    Parse(String),

    /// Execution differed from the fixture
    #[error("Assertion failed: {0}")]
    Assertion(String),
}

/// Fixture result type
pub type TestResult<T> = Result<T, TestError>;
