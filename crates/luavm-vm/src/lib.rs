//! # luavm-vm
//!
//! VM layer for luavm. A VM is either a Lua interpreter running as a local
//! subprocess or a placeholder for a hypervisor-managed machine.
//!
//! ## Quick Start
//!
//! ```no_run
//! use luavm_vm::{LocalBackend, MachineConfig, VmBackend};
//!
//! # async fn example() -> luavm_vm::Result<()> {
//! let mut backend = LocalBackend::new();
//! backend.create("vm1", MachineConfig::default()).await?;
//! backend.start("vm1").await?;
//!
//! backend.send_input("vm1", "print(40 + 2)").await?;
//! let output = backend.read_output("vm1").await?;
//! assert_eq!(output, "42");
//!
//! backend.terminate("vm1").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Lifecycle Management**: Create, start, stop and destroy VMs
//! - **Line-oriented I/O**: Each input line is acknowledged by the guest REPL
//! - **Hypervisor placeholder**: Typed configuration, no console
//! - **Builder Pattern**: Ergonomic configuration with `VmBuilder`

mod backend;
mod builder;
mod config;
mod error;
mod machine;
mod process;

pub use backend::{LocalBackend, VmBackend};
pub use builder::VmBuilder;
pub use config::{
    HypervisorConfig, MachineConfig, VmKind, VmOptions, DEFAULT_INTERPRETER,
    DEFAULT_OUTPUT_TIMEOUT,
};
pub use error::{Result, VmError};
pub use machine::{VirtualMachine, VmState};
pub use process::{LuaProcess, READY_MARKER};
