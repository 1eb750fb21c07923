//! # luavm-core
//!
//! Session layer for luavm: the VM registry, the attach/detach state
//! machine, the interactive session driver and package curation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     luavm-core (host)                    │
//! ├──────────────────────────────────────────────────────────┤
//! │                                                          │
//! │  ┌─────────────────┐     ┌──────────────────────────┐    │
//! │  │  VmController   │────▶│  VmRegistry              │    │
//! │  │   - create()    │     │   Vec<VmRecord>          │    │
//! │  │   - attach()    │     │   attach() -> AttachGuard│    │
//! │  │   - stop()      │     └──────────────────────────┘    │
//! │  │   - shutdown()  │                                     │
//! │  └─────────────────┘                                     │
//! │           │                                              │
//! │           ▼                                              │
//! │  ┌─────────────────┐     ┌──────────────────────────┐    │
//! │  │  run_session    │────▶│   VmBackend              │    │
//! │  │  (LineSource)   │     │   (from luavm-vm)        │    │
//! │  └─────────────────┘     └──────────────────────────┘    │
//! │                                                          │
//! │  ┌─────────────────┐     ┌──────────────────────────┐    │
//! │  │  Curator        │────▶│   luarocks / lua         │    │
//! │  └─────────────────┘     └──────────────────────────┘    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use luavm_core::{CreateRequest, LineEvent, LineSource, VmController};
//! use luavm_vm::{LocalBackend, MachineConfig};
//!
//! struct Script(Vec<&'static str>);
//!
//! impl LineSource for Script {
//!     fn read_line(&mut self, _prompt: &str) -> std::io::Result<LineEvent> {
//!         Ok(match self.0.pop() {
//!             Some(line) => LineEvent::Line(line.to_string()),
//!             None => LineEvent::EndOfInput,
//!         })
//!     }
//! }
//!
//! # async fn example() -> luavm_core::Result<()> {
//! let mut controller = VmController::new(LocalBackend::new());
//! controller
//!     .create(CreateRequest::new("vm1", "standard", MachineConfig::default()))
//!     .await?;
//!
//! let mut lines = Script(vec!["exit", "print('hi')"]);
//! let summary = controller
//!     .attach("vm1", &mut lines, &mut std::io::stdout())
//!     .await?;
//! println!("detached: {}", summary.reason);
//!
//! controller.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
mod controller;
mod curator;
mod error;
mod guard;
mod record;
mod registry;
mod session;

pub use controller::{
    install_succeeded, CreateRequest, CreatedVm, InstallOutcome, ShutdownReport, Verification,
    VmController, DEFAULT_INSTALL_TIMEOUT,
};
pub use curator::{
    parse_porcelain, validate_package_name, Curator, HealthReport, InstalledPackage,
    ProfileReport, DEFAULT_LUAROCKS,
};
pub use error::{AttachBlocker, CoreError, RegistryError, Result};
pub use guard::AttachGuard;
pub use record::{format_uptime, RecordState, VmRecord};
pub use registry::{ListFilter, VmRegistry};
pub use session::{
    prompt_for, run_session, ExitReason, LineEvent, LineSource, SessionSummary, EXIT_COMMANDS,
};
