//! Error types for luavm-core.

use thiserror::Error;

/// Result type alias for luavm-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Why a VM could not be attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachBlocker {
    /// The VM has not been confirmed running by the backend.
    Stopped,
    /// The VM already has an interactive session.
    AlreadyAttached,
    /// Another VM owns the terminal.
    OtherAttached(String),
}

impl std::fmt::Display for AttachBlocker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stopped => write!(f, "VM is not running"),
            Self::AlreadyAttached => write!(f, "VM is already attached"),
            Self::OtherAttached(other) => write!(f, "VM '{other}' is attached"),
        }
    }
}

/// Registry precondition failures. None of them changes registry state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Registration with an id that is already present, or blank
    #[error("{}", duplicate_message(.0))]
    DuplicateId(String),

    /// No record with this id
    #[error("VM not found: {0}")]
    NotFound(String),

    /// Attach attempted on a non-running or already attached record
    #[error("cannot attach to VM '{id}': {blocker}")]
    NotRunning {
        /// VM that was asked for
        id: String,
        /// What prevented the attach
        blocker: AttachBlocker,
    },

    /// Removal attempted while an interactive session owns the VM
    #[error("VM '{0}' is attached; detach before stopping it")]
    StillAttached(String),
}

fn duplicate_message(id: &str) -> String {
    if id.trim().is_empty() {
        "VM id must not be empty".to_string()
    } else {
        format!("VM id already exists: {id}")
    }
}

/// Errors that can occur in controller, session and curator operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Registry precondition failed
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Error from the VM backend
    #[error("backend failure: {0}")]
    BackendFailure(#[from] luavm_vm::VmError),

    /// Operation not available for this VM
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Package name rejected before reaching luarocks
    #[error("invalid package name: {0:?}")]
    InvalidPackageName(String),

    /// Unknown environment profile
    #[error("unknown profile: {0}")]
    UnknownProfile(String),

    /// LuaRocks ran but reported failure
    #[error("package manager failed: {0}")]
    PackageManager(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
