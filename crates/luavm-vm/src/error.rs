//! Error types for luavm-vm.

use thiserror::Error;

/// Result type alias for luavm-vm operations.
pub type Result<T> = std::result::Result<T, VmError>;

/// Errors that can occur during VM operations.
#[derive(Debug, Error)]
pub enum VmError {
    /// Failed to spawn the interpreter process
    #[error("failed to spawn interpreter {program}: {reason}")]
    Spawn { program: String, reason: String },

    /// VM is not in expected state
    #[error("invalid VM state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// No VM with this id is known to the backend
    #[error("VM not found: {0}")]
    NotFound(String),

    /// A VM with this id already exists in the backend
    #[error("VM already exists: {0}")]
    AlreadyExists(String),

    /// Operation not available for this kind of VM
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// The interpreter process exited
    #[error("interpreter for VM {0} has exited")]
    Exited(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
