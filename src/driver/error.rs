//! Errors raised while configuring and replaying a simulated heap
use std::io;

use thiserror::Error;

use crate::memory::error::HeapError;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Heap(#[from] HeapError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("invalid TOML in heap layout: {0}")]
    InvalidToml(String),
    #[error("invalid heap layout: {key}: {message}")]
    InvalidLayout { key: String, message: String },
    #[error("line {line}: {message}")]
    Script { line: usize, message: String },
    #[error("line {line}: {source}")]
    Operation {
        line: usize,
        #[source]
        source: HeapError,
    },
}

impl DriverError {
    pub(crate) fn layout<K: AsRef<str>, M: ToString>(key: K, message: M) -> Self {
        DriverError::InvalidLayout {
            key: key.as_ref().to_string(),
            message: message.to_string(),
        }
    }

    /// Process exit code: 1 for script and operation failures, 2 for
    /// configuration and IO failures
    pub fn exit_code(&self) -> i32 {
        match self {
            DriverError::Script { .. } | DriverError::Operation { .. } => 1,
            _ => 2,
        }
    }
}
