//! Backend trait and the local implementation.

use crate::config::MachineConfig;
use crate::error::{Result, VmError};
use crate::machine::{VirtualMachine, VmState};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Operations the VM layer exposes to the rest of the system.
///
/// A VM is addressed by the operator-assigned id it was created with.
#[async_trait]
pub trait VmBackend: Send {
    /// Create a VM handle. The VM is not running until [`start`](Self::start).
    async fn create(&mut self, id: &str, config: MachineConfig) -> Result<()>;

    /// Start a created VM.
    async fn start(&mut self, id: &str) -> Result<()>;

    /// Send Lua source to a running VM.
    async fn send_input(&mut self, id: &str, text: &str) -> Result<()>;

    /// Read the VM's answer, waiting up to its configured output timeout.
    async fn read_output(&mut self, id: &str) -> Result<String>;

    /// Read the VM's answer, waiting up to `wait`.
    async fn read_output_for(&mut self, id: &str, wait: Duration) -> Result<String>;

    /// Stop the VM and forget it.
    async fn terminate(&mut self, id: &str) -> Result<()>;
}

/// Backend that runs VMs on this host.
#[derive(Default)]
pub struct LocalBackend {
    machines: HashMap<String, VirtualMachine>,
}

impl LocalBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of VMs known to the backend.
    pub fn count(&self) -> usize {
        self.machines.len()
    }

    /// Get a VM by id.
    pub fn get(&self, id: &str) -> Option<&VirtualMachine> {
        self.machines.get(id)
    }

    fn machine(&mut self, id: &str) -> Result<&mut VirtualMachine> {
        self.machines
            .get_mut(id)
            .ok_or_else(|| VmError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl VmBackend for LocalBackend {
    async fn create(&mut self, id: &str, config: MachineConfig) -> Result<()> {
        if self.machines.contains_key(id) {
            return Err(VmError::AlreadyExists(id.to_string()));
        }
        let vm = VirtualMachine::new(id, config)?;
        self.machines.insert(id.to_string(), vm);
        Ok(())
    }

    async fn start(&mut self, id: &str) -> Result<()> {
        self.machine(id)?.start().await
    }

    async fn send_input(&mut self, id: &str, text: &str) -> Result<()> {
        self.machine(id)?.send_input(text).await
    }

    async fn read_output(&mut self, id: &str) -> Result<String> {
        let vm = self.machine(id)?;
        let wait = vm.config().output_timeout;
        vm.read_output(wait).await
    }

    async fn read_output_for(&mut self, id: &str, wait: Duration) -> Result<String> {
        self.machine(id)?.read_output(wait).await
    }

    async fn terminate(&mut self, id: &str) -> Result<()> {
        let vm = self
            .machines
            .remove(id)
            .ok_or_else(|| VmError::NotFound(id.to_string()))?;
        if vm.state() == VmState::Creating {
            tracing::debug!(vm_id = %id, "Discarding VM that never started");
            return Ok(());
        }
        vm.destroy().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HypervisorConfig, VmKind};

    fn hypervisor_config() -> MachineConfig {
        MachineConfig {
            kind: VmKind::Hypervisor,
            hypervisor: Some(HypervisorConfig::default()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_backend_empty() {
        let mut backend = LocalBackend::new();
        assert_eq!(backend.count(), 0);
        assert!(matches!(
            backend.terminate("missing").await,
            Err(VmError::NotFound(_))
        ));
        assert!(matches!(
            backend.send_input("missing", "x").await,
            Err(VmError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_backend_duplicate_create() {
        let mut backend = LocalBackend::new();
        backend.create("hv", hypervisor_config()).await.unwrap();
        assert!(matches!(
            backend.create("hv", hypervisor_config()).await,
            Err(VmError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_backend_hypervisor_start_terminate() {
        let mut backend = LocalBackend::new();
        backend.create("hv", hypervisor_config()).await.unwrap();
        backend.start("hv").await.unwrap();
        assert_eq!(backend.get("hv").unwrap().state(), VmState::Running);

        backend.terminate("hv").await.unwrap();
        assert_eq!(backend.count(), 0);
    }

    #[tokio::test]
    async fn test_backend_terminate_unstarted() {
        let mut backend = LocalBackend::new();
        let config = MachineConfig {
            interpreter: "/nonexistent/luavm-test-lua".into(),
            ..Default::default()
        };
        backend.create("vm1", config).await.unwrap();
        assert!(backend.start("vm1").await.is_err());
        backend.terminate("vm1").await.unwrap();
        assert!(backend.get("vm1").is_none());
    }
}
