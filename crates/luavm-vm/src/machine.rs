//! VirtualMachine type - main interface for managing one Lua VM.

use crate::config::{MachineConfig, VmKind};
use crate::error::{Result, VmError};
use crate::process::LuaProcess;
use chrono::{DateTime, Local};
use std::time::Duration;

/// A Lua VM: an interpreter subprocess or a hypervisor placeholder.
pub struct VirtualMachine {
    /// Operator-assigned identifier
    id: String,
    /// Configuration used to create this VM
    config: MachineConfig,
    /// Current state of the VM
    state: VmState,
    /// Interpreter process, present while a basic VM is running
    process: Option<LuaProcess>,
    /// When the VM handle was created
    created_at: DateTime<Local>,
}

/// Current state of the VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    /// VM is created but not started
    Creating,
    /// VM is running
    Running,
    /// VM is stopped
    Stopped,
}

impl std::fmt::Display for VmState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VmState::Creating => write!(f, "creating"),
            VmState::Running => write!(f, "running"),
            VmState::Stopped => write!(f, "stopped"),
        }
    }
}

impl VirtualMachine {
    /// Create a VM handle without starting it.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(id: impl Into<String>, config: MachineConfig) -> Result<Self> {
        config.validate()?;
        let id = id.into();
        tracing::info!(vm_id = %id, kind = %config.kind, "Creating VM");
        Ok(Self {
            id,
            config,
            state: VmState::Creating,
            process: None,
            created_at: Local::now(),
        })
    }

    /// Create and start a VM.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or startup fails.
    pub async fn create(id: impl Into<String>, config: MachineConfig) -> Result<Self> {
        let mut vm = Self::new(id, config)?;
        vm.start().await?;
        Ok(vm)
    }

    /// Get the identifier of this VM.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the current state of the VM.
    pub fn state(&self) -> VmState {
        self.state
    }

    /// Get the kind of this VM.
    pub fn kind(&self) -> VmKind {
        self.config.kind
    }

    /// Get the configuration used to create this VM.
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// When the VM handle was created.
    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    /// OS process id of the interpreter, for basic VMs.
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(LuaProcess::pid)
    }

    /// Start the VM (if created or stopped).
    ///
    /// Basic VMs spawn a fresh interpreter. Hypervisor VMs only record that
    /// they are running; no hypervisor is contacted.
    ///
    /// # Errors
    /// Returns an error if the VM is already running or the interpreter
    /// cannot be spawned.
    pub async fn start(&mut self) -> Result<()> {
        if self.state == VmState::Running {
            return Err(VmError::InvalidState {
                expected: "creating or stopped".into(),
                actual: self.state.to_string(),
            });
        }

        tracing::info!(vm_id = %self.id, "Starting VM");
        match self.config.kind {
            VmKind::Basic => {
                let process = LuaProcess::spawn(&self.config.interpreter, &self.config.options)?;
                tracing::info!(vm_id = %self.id, pid = ?process.pid(), "Lua interpreter started");
                self.process = Some(process);
            }
            VmKind::Hypervisor => {
                let host = self
                    .config
                    .hypervisor
                    .as_ref()
                    .map(|h| h.host.as_str())
                    .unwrap_or_default();
                tracing::warn!(vm_id = %self.id, host = %host, "Hypervisor VM is a placeholder; nothing provisioned");
            }
        }

        self.state = VmState::Running;
        Ok(())
    }

    /// Send a line (or several) of Lua to the VM.
    pub async fn send_input(&mut self, text: &str) -> Result<()> {
        if self.config.options.debug_mode {
            tracing::info!(vm_id = %self.id, input = %text.trim_end(), "VM input");
        } else {
            tracing::trace!(vm_id = %self.id, input_len = text.len(), "VM input");
        }
        let process = self.running_process()?;
        process.send(text).await
    }

    /// Read the VM's answer to previously sent input.
    pub async fn read_output(&mut self, wait: Duration) -> Result<String> {
        let id = self.id.clone();
        let debug = self.config.options.debug_mode;
        let process = self.running_process()?;
        let output = process.read_output(wait).await?;
        if debug {
            tracing::info!(vm_id = %id, output = %output, "VM output");
        } else {
            tracing::trace!(vm_id = %id, output_len = output.len(), "VM output");
        }
        if output.is_empty() && process.has_exited() {
            return Err(VmError::Exited(id));
        }
        Ok(output)
    }

    /// Stop the VM.
    ///
    /// # Errors
    /// Returns an error if the VM is not running.
    pub async fn stop(&mut self) -> Result<()> {
        if self.state != VmState::Running {
            return Err(VmError::InvalidState {
                expected: "running".into(),
                actual: self.state.to_string(),
            });
        }

        tracing::info!(vm_id = %self.id, "Stopping VM");
        if let Some(mut process) = self.process.take() {
            process.kill().await?;
        }
        self.state = VmState::Stopped;
        Ok(())
    }

    /// Destroy the VM and cleanup resources.
    ///
    /// This consumes the VirtualMachine, stopping it if running.
    pub async fn destroy(mut self) -> Result<()> {
        tracing::info!(vm_id = %self.id, "Destroying VM");
        if self.state == VmState::Running {
            self.stop().await?;
        }
        Ok(())
    }

    fn running_process(&mut self) -> Result<&mut LuaProcess> {
        if self.config.kind == VmKind::Hypervisor {
            return Err(VmError::Unsupported(format!(
                "hypervisor VM '{}' has no interactive console",
                self.id
            )));
        }
        if self.state != VmState::Running {
            return Err(VmError::InvalidState {
                expected: "running".into(),
                actual: self.state.to_string(),
            });
        }
        match self.process.as_mut() {
            Some(process) if !process.has_exited() => Ok(process),
            _ => Err(VmError::Exited(self.id.clone())),
        }
    }
}
