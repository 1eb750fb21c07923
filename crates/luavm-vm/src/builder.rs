//! Builder pattern for ergonomic VirtualMachine configuration.

use crate::config::{HypervisorConfig, MachineConfig, VmKind};
use crate::error::Result;
use crate::VirtualMachine;
use std::path::PathBuf;
use std::time::Duration;

/// Fluent builder for configuring and creating VirtualMachine instances.
///
/// # Example
///
/// ```no_run
/// use luavm_vm::VmBuilder;
///
/// # async fn example() -> luavm_vm::Result<()> {
/// let mut vm = VmBuilder::new()
///     .interpreter("lua5.4")
///     .networked(true)
///     .build("vm1")
///     .await?;
///
/// vm.send_input("print(1 + 1)").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct VmBuilder {
    config: MachineConfig,
}

impl Default for VmBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VmBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: MachineConfig::default(),
        }
    }

    /// Set the VM kind.
    pub fn kind(mut self, kind: VmKind) -> Self {
        self.config.kind = kind;
        self
    }

    /// Set the interpreter binary for basic VMs.
    pub fn interpreter(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.interpreter = path.into();
        self
    }

    /// Enable or disable networking.
    pub fn networked(mut self, enabled: bool) -> Self {
        self.config.options.networked = enabled;
        self
    }

    /// Keep the VM alive after its session detaches.
    pub fn persistent(mut self, enabled: bool) -> Self {
        self.config.options.persistent = enabled;
        self
    }

    /// Log all VM traffic.
    pub fn debug_mode(mut self, enabled: bool) -> Self {
        self.config.options.debug_mode = enabled;
        self
    }

    /// Set how long to wait for the VM to answer a line.
    pub fn output_timeout(mut self, timeout: Duration) -> Self {
        self.config.output_timeout = timeout;
        self
    }

    /// Configure a hypervisor VM with the given settings.
    pub fn with_hypervisor(mut self, hypervisor: HypervisorConfig) -> Self {
        self.config.kind = VmKind::Hypervisor;
        self.config.hypervisor = Some(hypervisor);
        self
    }

    /// Build and return the configuration without creating a VM.
    pub fn build_config(self) -> MachineConfig {
        self.config
    }

    /// Build and start the VirtualMachine.
    ///
    /// # Errors
    /// Returns an error if VM creation or startup fails.
    pub async fn build(self, id: impl Into<String>) -> Result<VirtualMachine> {
        VirtualMachine::create(id, self.config).await
    }
}
