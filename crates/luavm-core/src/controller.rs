//! VM controller.
//!
//! Ties the registry to a [`VmBackend`]: creation with rollback, attach
//! sessions, stop, in-VM package installs and process-wide cleanup.

use crate::catalog;
use crate::curator::{validate_package_name, DEFAULT_LUAROCKS};
use crate::error::{CoreError, RegistryError, Result};
use crate::record::VmRecord;
use crate::registry::{ListFilter, VmRegistry};
use crate::session::{run_session, LineSource, SessionSummary};
use luavm_vm::{MachineConfig, VmBackend, VmError};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default window for an in-VM `luarocks` command to finish.
pub const DEFAULT_INSTALL_TIMEOUT: Duration = Duration::from_secs(120);

const VERIFY_SUCCESS: &str = "VERIFY:\tSUCCESS";
const VERIFY_FAILED: &str = "VERIFY:\tFAILED";

/// Everything needed to create a VM.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    /// Operator-assigned id.
    pub id: String,
    /// Profile label.
    pub profile: String,
    /// Backend configuration.
    pub config: MachineConfig,
}

impl CreateRequest {
    /// Create a request.
    pub fn new(id: impl Into<String>, profile: impl Into<String>, config: MachineConfig) -> Self {
        Self {
            id: id.into(),
            profile: profile.into(),
            config,
        }
    }
}

/// A freshly created VM.
#[derive(Debug, Clone)]
pub struct CreatedVm {
    /// Registry record, already running.
    pub record: VmRecord,
    /// Welcome banner printed by the VM, for interactive kinds.
    pub banner: Option<String>,
}

/// Whether an installed rock could be loaded afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// `require` succeeded.
    Loaded,
    /// `require` failed.
    NotLoadable,
    /// The load check produced no recognisable answer.
    Unknown,
}

/// Result of installing a rock into a VM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Rock name.
    pub package: String,
    /// Whether the install was judged successful.
    pub installed: bool,
    /// Load check, only run after a successful install.
    pub verification: Option<Verification>,
    /// Raw luarocks output.
    pub output: String,
}

/// Cleanup results from [`VmController::shutdown`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// VMs terminated cleanly.
    pub stopped: Vec<String>,
    /// VMs whose termination failed, with the error.
    pub failed: Vec<(String, String)>,
}

/// Judge luarocks output. LuaRocks can be quiet on success, so output
/// without an explicit failure counts as success.
pub fn install_succeeded(output: &str) -> bool {
    let lower = output.to_lowercase();
    if lower.contains("successfully installed") || lower.contains("is now installed") {
        return true;
    }
    !(lower.contains("error") || lower.contains("failed"))
}

fn verification_from(output: &str) -> Verification {
    if output.contains(VERIFY_SUCCESS) {
        Verification::Loaded
    } else if output.contains(VERIFY_FAILED) {
        Verification::NotLoadable
    } else {
        Verification::Unknown
    }
}

fn welcome_chunk(id: &str, profile: &str) -> String {
    format!(
        "-- Basic VM '{id}' started with {profile} profile\n\
         print('VM ready! Type Lua commands or exit to return to menu')"
    )
}

/// Owns the VM registry and the backend.
pub struct VmController<B: VmBackend> {
    registry: VmRegistry,
    backend: B,
    luarocks: String,
    install_timeout: Duration,
}

impl<B: VmBackend> VmController<B> {
    /// Create a controller with an empty registry.
    pub fn new(backend: B) -> Self {
        Self {
            registry: VmRegistry::new(),
            backend,
            luarocks: DEFAULT_LUAROCKS.to_string(),
            install_timeout: DEFAULT_INSTALL_TIMEOUT,
        }
    }

    /// Set the luarocks command run inside VMs.
    pub fn with_luarocks(mut self, luarocks: impl Into<String>) -> Self {
        self.luarocks = luarocks.into();
        self
    }

    /// Set how long in-VM luarocks commands may take.
    pub fn with_install_timeout(mut self, timeout: Duration) -> Self {
        self.install_timeout = timeout;
        self
    }

    /// The registry, for listing and status.
    pub fn registry(&self) -> &VmRegistry {
        &self.registry
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Create and start a VM.
    ///
    /// The record is registered first; if the backend fails to create or
    /// start the VM the record is removed again and the error returned.
    pub async fn create(&mut self, request: CreateRequest) -> Result<CreatedVm> {
        let CreateRequest {
            id,
            profile,
            config,
        } = request;
        let kind = config.kind;

        self.registry.register_with_options(
            &id,
            &profile,
            kind,
            config.options,
            config.hypervisor.clone(),
        )?;
        info!(vm_id = %id, kind = %kind, profile = %profile, "Creating VM");

        let banner = match self.start_backend(&id, &profile, config).await {
            Ok(banner) => banner,
            Err(e) => {
                warn!(vm_id = %id, error = %e, "VM creation failed, rolling back");
                if let Err(e) = self.registry.remove(&id) {
                    warn!(vm_id = %id, error = %e, "Rollback could not remove record");
                }
                return Err(e.into());
            }
        };

        self.registry.mark_running(&id)?;
        let record = self
            .registry
            .get(&id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        info!(vm_id = %id, "VM running");
        Ok(CreatedVm { record, banner })
    }

    async fn start_backend(
        &mut self,
        id: &str,
        profile: &str,
        config: MachineConfig,
    ) -> std::result::Result<Option<String>, VmError> {
        let interactive = config.kind.is_interactive();
        self.backend.create(id, config).await?;

        let started: std::result::Result<Option<String>, VmError> = async {
            self.backend.start(id).await?;
            if !interactive {
                return Ok(None);
            }
            self.backend.send_input(id, &welcome_chunk(id, profile)).await?;
            let banner = self.backend.read_output(id).await?;
            Ok(Some(banner.trim_end().to_string()))
        }
        .await;

        if started.is_err() {
            if let Err(e) = self.backend.terminate(id).await {
                debug!(vm_id = %id, error = %e, "Cleanup after failed start");
            }
        }
        started
    }

    /// Attach to a VM and run an interactive session until it ends.
    ///
    /// Non-persistent VMs are stopped once the session detaches.
    pub async fn attach<L, W>(&mut self, id: &str, lines: &mut L, out: &mut W) -> Result<SessionSummary>
    where
        L: LineSource + ?Sized,
        W: Write + ?Sized,
    {
        let record = self
            .registry
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        if !record.kind().is_interactive() {
            return Err(CoreError::Unsupported(format!(
                "{} VM '{id}' has no interactive console",
                record.kind()
            )));
        }
        let persistent = record.options().persistent;

        let summary = {
            let guard = self.registry.attach(id)?;
            info!(vm_id = %id, "Attached");
            run_session(&mut self.backend, &guard, lines, out).await?
        };

        if !persistent {
            info!(vm_id = %id, "Stopping non-persistent VM after detach");
            if let Err(e) = self.stop(id).await {
                warn!(vm_id = %id, error = %e, "Could not stop non-persistent VM");
            }
        }
        Ok(summary)
    }

    /// Terminate a VM and remove it from the registry.
    ///
    /// If the backend fails to terminate it the record is kept.
    pub async fn stop(&mut self, id: &str) -> Result<VmRecord> {
        let record = self
            .registry
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        if record.is_attached() {
            return Err(RegistryError::StillAttached(id.to_string()).into());
        }

        match self.backend.terminate(id).await {
            Ok(()) => {}
            Err(VmError::NotFound(_)) => {
                warn!(vm_id = %id, "Backend had no such VM, removing record");
            }
            Err(e) => return Err(e.into()),
        }

        let record = self.registry.remove(id)?;
        info!(vm_id = %id, "VM stopped");
        Ok(record)
    }

    /// Install a rock inside a running basic VM, then check it loads.
    pub async fn install_package(&mut self, name: &str, vm_id: &str) -> Result<InstallOutcome> {
        let name = validate_package_name(name)?.to_string();
        self.require_console(vm_id)?;

        info!(vm_id = %vm_id, package = %name, "Installing package in VM");
        let command = format!("os.execute(\"{} install {name} 2>&1\")", self.luarocks);
        self.backend.send_input(vm_id, &command).await?;
        let output = self
            .backend
            .read_output_for(vm_id, self.install_timeout)
            .await?;

        let installed = install_succeeded(&output);
        let verification = if installed {
            let total = self.registry.record_package_install(vm_id)?;
            debug!(vm_id = %vm_id, total, "Package count updated");
            Some(self.verify_package(&name, vm_id).await?)
        } else {
            warn!(vm_id = %vm_id, package = %name, "Package install failed");
            None
        };

        Ok(InstallOutcome {
            package: name,
            installed,
            verification,
            output: output.trim_end().to_string(),
        })
    }

    async fn verify_package(&mut self, name: &str, vm_id: &str) -> Result<Verification> {
        let check = format!(
            "local ok = pcall(require, \"{}\"); print(\"VERIFY:\", ok and \"SUCCESS\" or \"FAILED\")",
            catalog::module_name(name)
        );
        self.backend.send_input(vm_id, &check).await?;
        let output = self.backend.read_output(vm_id).await?;
        Ok(verification_from(&output))
    }

    /// Output of `luarocks list` run inside a VM.
    pub async fn vm_packages(&mut self, vm_id: &str) -> Result<String> {
        self.require_console(vm_id)?;
        let command = format!("os.execute(\"{} list 2>&1\")", self.luarocks);
        self.backend.send_input(vm_id, &command).await?;
        let output = self
            .backend
            .read_output_for(vm_id, self.install_timeout)
            .await?;
        Ok(output.trim_end().to_string())
    }

    /// Terminate every VM and clear the registry. Errors are reported, not
    /// returned.
    pub async fn shutdown(&mut self) -> ShutdownReport {
        let mut report = ShutdownReport::default();
        for record in self.registry.drain() {
            let id = record.id();
            match self.backend.terminate(id).await {
                Ok(()) | Err(VmError::NotFound(_)) => {
                    debug!(vm_id = %id, "VM terminated");
                    report.stopped.push(id.to_string());
                }
                Err(e) => {
                    warn!(vm_id = %id, error = %e, "Could not terminate VM");
                    report.failed.push((id.to_string(), e.to_string()));
                }
            }
        }
        info!(
            stopped = report.stopped.len(),
            failed = report.failed.len(),
            "Cleanup complete"
        );
        report
    }

    /// Drop records whose creation never finished, terminating whatever the
    /// backend managed to start. Used after a cancelled [`create`].
    ///
    /// [`create`]: VmController::create
    pub async fn discard_unstarted(&mut self) -> Vec<String> {
        let stale: Vec<String> = self
            .registry
            .list(ListFilter {
                running: Some(false),
                attached: None,
            })
            .into_iter()
            .map(|record| record.id().to_string())
            .collect();

        for id in &stale {
            match self.backend.terminate(id).await {
                Ok(()) | Err(VmError::NotFound(_)) => {}
                Err(e) => warn!(vm_id = %id, error = %e, "Could not terminate unfinished VM"),
            }
            if let Err(e) = self.registry.remove(id) {
                warn!(vm_id = %id, error = %e, "Could not discard unfinished VM");
            }
            info!(vm_id = %id, "Discarded unfinished VM");
        }
        stale
    }

    fn require_console(&self, vm_id: &str) -> Result<()> {
        let record = self
            .registry
            .get(vm_id)
            .ok_or_else(|| RegistryError::NotFound(vm_id.to_string()))?;
        if !record.kind().is_interactive() {
            return Err(CoreError::Unsupported(format!(
                "package management in {} VMs is not available",
                record.kind()
            )));
        }
        if !record.is_running() {
            return Err(CoreError::BackendFailure(VmError::InvalidState {
                expected: "running".into(),
                actual: record.state().to_string(),
            }));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordState;
    use crate::session::tests::ScriptedLines;
    use crate::session::ExitReason;
    use async_trait::async_trait;
    use luavm_vm::{HypervisorConfig, VmKind, VmOptions};
    use std::collections::{HashMap, VecDeque};

    /// In-memory backend with scripted replies and failure injection.
    #[derive(Default)]
    struct FakeBackend {
        vms: HashMap<String, bool>,
        inputs: Vec<(String, String)>,
        replies: VecDeque<String>,
        fail_create: bool,
        fail_start: bool,
        fail_terminate: bool,
        hang_start: bool,
        hang_read: bool,
        terminated: Vec<String>,
    }

    #[async_trait]
    impl VmBackend for FakeBackend {
        async fn create(&mut self, id: &str, _config: MachineConfig) -> luavm_vm::Result<()> {
            if self.fail_create {
                return Err(VmError::Spawn {
                    program: "lua".into(),
                    reason: "no such file".into(),
                });
            }
            self.vms.insert(id.to_string(), false);
            Ok(())
        }

        async fn start(&mut self, id: &str) -> luavm_vm::Result<()> {
            if self.fail_start {
                return Err(VmError::Exited(id.to_string()));
            }
            if self.hang_start {
                std::future::pending::<()>().await;
            }
            let running = self
                .vms
                .get_mut(id)
                .ok_or_else(|| VmError::NotFound(id.to_string()))?;
            *running = true;
            Ok(())
        }

        async fn send_input(&mut self, id: &str, text: &str) -> luavm_vm::Result<()> {
            if !self.vms.get(id).copied().unwrap_or(false) {
                return Err(VmError::NotFound(id.to_string()));
            }
            self.inputs.push((id.to_string(), text.to_string()));
            Ok(())
        }

        async fn read_output(&mut self, _id: &str) -> luavm_vm::Result<String> {
            if self.hang_read {
                std::future::pending::<()>().await;
            }
            Ok(self.replies.pop_front().unwrap_or_default())
        }

        async fn read_output_for(&mut self, id: &str, _wait: Duration) -> luavm_vm::Result<String> {
            self.read_output(id).await
        }

        async fn terminate(&mut self, id: &str) -> luavm_vm::Result<()> {
            if self.fail_terminate {
                return Err(VmError::Io(std::io::Error::other("kill failed")));
            }
            self.vms
                .remove(id)
                .ok_or_else(|| VmError::NotFound(id.to_string()))?;
            self.terminated.push(id.to_string());
            Ok(())
        }
    }

    fn basic(id: &str) -> CreateRequest {
        CreateRequest::new(id, "standard", MachineConfig::default())
    }

    fn hypervisor(id: &str) -> CreateRequest {
        CreateRequest::new(
            id,
            "bioxen",
            MachineConfig {
                kind: VmKind::Hypervisor,
                hypervisor: Some(HypervisorConfig::default()),
                ..Default::default()
            },
        )
    }

    async fn controller_with(ids: &[&str]) -> VmController<FakeBackend> {
        let mut controller = VmController::new(FakeBackend::default());
        for id in ids {
            controller.create(basic(id)).await.unwrap();
        }
        controller
    }

    #[test]
    fn test_install_succeeded() {
        assert!(install_succeeded("penlight 1.13 is now installed in /usr/local"));
        assert!(install_succeeded("Successfully installed lpeg"));
        assert!(install_succeeded(""));
        assert!(!install_succeeded("Error: No results matching query were found"));
        assert!(!install_succeeded("Build FAILED"));
    }

    #[test]
    fn test_verification_from() {
        assert_eq!(verification_from("VERIFY:\tSUCCESS"), Verification::Loaded);
        assert_eq!(verification_from("VERIFY:\tFAILED"), Verification::NotLoadable);
        assert_eq!(verification_from(""), Verification::Unknown);
    }

    #[tokio::test]
    async fn test_create_basic() {
        let mut controller = VmController::new(FakeBackend::default());
        controller
            .backend
            .replies
            .push_back("VM ready! Type Lua commands or exit to return to menu\n".into());

        let created = controller.create(basic("vm1")).await.unwrap();

        assert!(created.record.is_running());
        assert_eq!(
            created.banner.as_deref(),
            Some("VM ready! Type Lua commands or exit to return to menu")
        );
        assert_eq!(controller.registry().state("vm1"), RecordState::Running);
        assert!(controller.backend().inputs[0].1.starts_with("-- Basic VM 'vm1'"));
    }

    #[tokio::test]
    async fn test_create_hypervisor_has_no_banner() {
        let mut controller = VmController::new(FakeBackend::default());
        let created = controller.create(hypervisor("hv1")).await.unwrap();
        assert!(created.banner.is_none());
        assert!(created.record.backend_config().is_some());
        assert!(controller.backend().inputs.is_empty());
    }

    #[tokio::test]
    async fn test_create_failure_rolls_back() {
        let mut controller = VmController::new(FakeBackend {
            fail_create: true,
            ..Default::default()
        });
        let err = controller.create(basic("vm1")).await.unwrap_err();
        assert!(matches!(err, CoreError::BackendFailure(VmError::Spawn { .. })));
        assert!(!controller.registry().contains("vm1"));
    }

    #[tokio::test]
    async fn test_start_failure_rolls_back_backend_too() {
        let mut controller = VmController::new(FakeBackend {
            fail_start: true,
            ..Default::default()
        });
        assert!(controller.create(basic("vm1")).await.is_err());
        assert!(controller.registry().is_empty());
        assert!(controller.backend().vms.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_create_is_discarded() {
        let mut controller = VmController::new(FakeBackend::default());
        controller.backend.hang_start = true;

        let cancelled =
            tokio::time::timeout(Duration::from_millis(20), controller.create(basic("vm1"))).await;
        assert!(cancelled.is_err());
        assert_eq!(controller.registry().state("vm1"), RecordState::Created);

        assert_eq!(controller.discard_unstarted().await, ["vm1"]);
        assert_eq!(controller.registry().state("vm1"), RecordState::Removed);
        assert_eq!(controller.backend().terminated, ["vm1"]);

        // The id is free again
        controller.backend.hang_start = false;
        controller.create(basic("vm1")).await.unwrap();
        assert!(controller.discard_unstarted().await.is_empty());
        assert_eq!(controller.registry().state("vm1"), RecordState::Running);
    }

    #[tokio::test]
    async fn test_cancelled_attach_detaches() {
        let mut controller = controller_with(&["vm1"]).await;
        controller.backend.hang_read = true;
        let mut lines = ScriptedLines::lines(&["print(1)", "exit"]);
        let mut out = Vec::<u8>::new();

        let cancelled = tokio::time::timeout(
            Duration::from_millis(20),
            controller.attach("vm1", &mut lines, &mut out),
        )
        .await;

        assert!(cancelled.is_err());
        assert_eq!(controller.registry().attached_id(), None);
        assert_eq!(controller.registry().state("vm1"), RecordState::Running);
    }

    #[tokio::test]
    async fn test_create_duplicate() {
        let mut controller = controller_with(&["vm1"]).await;
        let err = controller.create(basic("vm1")).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Registry(RegistryError::DuplicateId(_))
        ));
        // Existing VM is untouched
        assert_eq!(controller.registry().state("vm1"), RecordState::Running);
        assert_eq!(controller.backend().vms.len(), 1);
    }

    #[tokio::test]
    async fn test_attach_runs_session_and_detaches() {
        let mut controller = controller_with(&["vm1"]).await;
        controller.backend.replies.push_back("2\n".into());
        let mut lines = ScriptedLines::lines(&["1 + 1", "quit"]);
        let mut out = Vec::new();

        let summary = controller.attach("vm1", &mut lines, &mut out).await.unwrap();

        assert_eq!(summary.reason, ExitReason::ExitCommand);
        assert_eq!(summary.lines_sent, 1);
        assert_eq!(String::from_utf8(out).unwrap(), "2\n");
        assert_eq!(controller.registry().state("vm1"), RecordState::Running);
    }

    #[tokio::test]
    async fn test_attach_hypervisor_unsupported() {
        let mut controller = VmController::new(FakeBackend::default());
        controller.create(hypervisor("hv1")).await.unwrap();
        let mut lines = ScriptedLines::lines(&[]);
        let err = controller
            .attach("hv1", &mut lines, &mut Vec::<u8>::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Unsupported(_)));
        assert_eq!(controller.registry().attached_id(), None);
    }

    #[tokio::test]
    async fn test_attach_non_persistent_stops_vm() {
        let mut controller = VmController::new(FakeBackend::default());
        let config = MachineConfig {
            options: VmOptions {
                persistent: false,
                ..Default::default()
            },
            ..Default::default()
        };
        controller
            .create(CreateRequest::new("tmp", "standard", config))
            .await
            .unwrap();

        let mut lines = ScriptedLines::lines(&[]);
        let summary = controller
            .attach("tmp", &mut lines, &mut Vec::<u8>::new())
            .await
            .unwrap();

        assert_eq!(summary.reason, ExitReason::EndOfInput);
        assert!(!controller.registry().contains("tmp"));
        assert_eq!(controller.backend().terminated, ["tmp"]);
    }

    #[tokio::test]
    async fn test_stop() {
        let mut controller = controller_with(&["vm1", "vm2"]).await;
        let record = controller.stop("vm1").await.unwrap();
        assert_eq!(record.id(), "vm1");
        assert!(!controller.registry().contains("vm1"));
        assert!(controller.registry().contains("vm2"));
        assert!(matches!(
            controller.stop("vm1").await,
            Err(CoreError::Registry(RegistryError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_stop_backend_failure_keeps_record() {
        let mut controller = controller_with(&["vm1"]).await;
        controller.backend.fail_terminate = true;
        assert!(matches!(
            controller.stop("vm1").await,
            Err(CoreError::BackendFailure(_))
        ));
        assert!(controller.registry().contains("vm1"));
    }

    #[tokio::test]
    async fn test_stop_backend_lost_vm_still_removes() {
        let mut controller = controller_with(&["vm1"]).await;
        controller.backend.vms.clear();
        controller.stop("vm1").await.unwrap();
        assert!(controller.registry().is_empty());
    }

    #[tokio::test]
    async fn test_install_package_success() {
        let mut controller = controller_with(&["vm1"]).await;
        controller
            .backend
            .replies
            .extend(["luafilesystem 1.8.0-1 is now installed\n".to_string(), "VERIFY:\tSUCCESS\n".to_string()]);

        let outcome = controller.install_package("luafilesystem", "vm1").await.unwrap();

        assert!(outcome.installed);
        assert_eq!(outcome.verification, Some(Verification::Loaded));
        assert_eq!(controller.registry().get("vm1").unwrap().packages_installed(), 1);
        let inputs = &controller.backend().inputs;
        assert_eq!(
            inputs[inputs.len() - 2].1,
            "os.execute(\"luarocks install luafilesystem 2>&1\")"
        );
        assert!(inputs[inputs.len() - 1].1.contains("pcall(require, \"lfs\")"));
    }

    #[tokio::test]
    async fn test_install_package_failure() {
        let mut controller = controller_with(&["vm1"]).await;
        controller
            .backend
            .replies
            .push_back("Error: No results matching query were found.\n".into());

        let outcome = controller.install_package("nope", "vm1").await.unwrap();

        assert!(!outcome.installed);
        assert!(outcome.verification.is_none());
        assert_eq!(controller.registry().get("vm1").unwrap().packages_installed(), 0);
    }

    #[tokio::test]
    async fn test_install_package_rejections() {
        let mut controller = controller_with(&["vm1"]).await;
        controller.create(hypervisor("hv1")).await.unwrap();

        assert!(matches!(
            controller.install_package("x\"); os.exit(", "vm1").await,
            Err(CoreError::InvalidPackageName(_))
        ));
        assert!(matches!(
            controller.install_package("lpeg", "hv1").await,
            Err(CoreError::Unsupported(_))
        ));
        assert!(matches!(
            controller.install_package("lpeg", "missing").await,
            Err(CoreError::Registry(RegistryError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_vm_packages() {
        let mut controller = controller_with(&["vm1"]).await.with_luarocks("/opt/luarocks");
        controller
            .backend
            .replies
            .push_back("penlight\n   1.13.1-1 (installed)\n".into());
        let listing = controller.vm_packages("vm1").await.unwrap();
        assert!(listing.starts_with("penlight"));
        assert_eq!(
            controller.backend().inputs.last().unwrap().1,
            "os.execute(\"/opt/luarocks list 2>&1\")"
        );
    }

    #[tokio::test]
    async fn test_shutdown() {
        let mut controller = controller_with(&["vm1", "vm2"]).await;
        controller.create(hypervisor("hv1")).await.unwrap();

        let report = controller.shutdown().await;

        assert_eq!(report.stopped, ["vm1", "vm2", "hv1"]);
        assert!(report.failed.is_empty());
        assert!(controller.registry().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_reports_failures() {
        let mut controller = controller_with(&["vm1"]).await;
        controller.backend.fail_terminate = true;
        let report = controller.shutdown().await;
        assert_eq!(report.failed.len(), 1);
        assert!(controller.registry().is_empty());
    }
}
