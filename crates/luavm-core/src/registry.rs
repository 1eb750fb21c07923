//! In-memory VM session registry.
//!
//! The registry maps an operator-assigned VM id to its [`VmRecord`] and
//! enforces the attach/detach state machine. Every operation either applies
//! completely or returns an error and leaves the registry untouched.

use crate::error::{AttachBlocker, RegistryError};
use crate::guard::AttachGuard;
use crate::record::{RecordState, VmRecord};
use luavm_vm::{HypervisorConfig, VmKind, VmOptions};

/// Predicate set for [`VmRegistry::list`]. `None` matches either value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Match on the running flag.
    pub running: Option<bool>,
    /// Match on the attached flag.
    pub attached: Option<bool>,
}

impl ListFilter {
    /// Match every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Only running records.
    pub fn running() -> Self {
        Self {
            running: Some(true),
            attached: None,
        }
    }

    /// Running records that can be attached to.
    pub fn attachable() -> Self {
        Self {
            running: Some(true),
            attached: Some(false),
        }
    }

    fn matches(&self, record: &VmRecord) -> bool {
        self.running.map_or(true, |r| r == record.running)
            && self.attached.map_or(true, |a| a == record.attached)
    }
}

/// Registry of active VMs, kept in registration order.
#[derive(Debug, Default)]
pub struct VmRegistry {
    records: Vec<VmRecord>,
}

impl VmRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a VM with default options.
    pub fn register(
        &mut self,
        id: &str,
        profile: &str,
        kind: VmKind,
        backend_config: Option<HypervisorConfig>,
    ) -> Result<VmRecord, RegistryError> {
        self.register_with_options(id, profile, kind, VmOptions::default(), backend_config)
    }

    /// Register a VM. The record starts with `running = false`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateId`] if `id` is blank or already
    /// registered. The existing record is left unchanged.
    pub fn register_with_options(
        &mut self,
        id: &str,
        profile: &str,
        kind: VmKind,
        options: VmOptions,
        backend_config: Option<HypervisorConfig>,
    ) -> Result<VmRecord, RegistryError> {
        if id.trim().is_empty() || self.contains(id) {
            return Err(RegistryError::DuplicateId(id.to_string()));
        }

        // Only hypervisor VMs carry backend settings
        let backend_config = match kind {
            VmKind::Hypervisor => Some(backend_config.unwrap_or_default()),
            VmKind::Basic => None,
        };

        let record = VmRecord::new(id, profile, kind, options, backend_config);
        self.records.push(record.clone());
        tracing::debug!(vm_id = %id, kind = %kind, profile = %profile, "VM registered");
        Ok(record)
    }

    /// Mark a VM as confirmed running by the backend.
    pub fn mark_running(&mut self, id: &str) -> Result<(), RegistryError> {
        let record = self.record_mut(id)?;
        record.running = true;
        tracing::debug!(vm_id = %id, "VM marked running");
        Ok(())
    }

    /// Mark a VM as owning the terminal.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] for an unknown id, and
    /// [`RegistryError::NotRunning`] when the VM is not running, is already
    /// attached, or another VM is attached.
    pub fn mark_attached(&mut self, id: &str) -> Result<(), RegistryError> {
        let record = self
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        let blocker = if !record.running {
            Some(AttachBlocker::Stopped)
        } else if record.attached {
            Some(AttachBlocker::AlreadyAttached)
        } else {
            self.attached_id().map(|other| AttachBlocker::OtherAttached(other.to_string()))
        };
        if let Some(blocker) = blocker {
            return Err(RegistryError::NotRunning {
                id: id.to_string(),
                blocker,
            });
        }

        self.record_mut(id)?.attached = true;
        tracing::debug!(vm_id = %id, "VM attached");
        Ok(())
    }

    /// Clear the attached flag. Unknown ids and detached VMs are a no-op.
    pub fn mark_detached(&mut self, id: &str) {
        if let Ok(record) = self.record_mut(id) {
            if record.attached {
                record.attached = false;
                tracing::debug!(vm_id = %id, "VM detached");
            }
        }
    }

    /// Attach to a VM for the lifetime of the returned guard.
    pub fn attach(&mut self, id: &str) -> Result<AttachGuard<'_>, RegistryError> {
        self.mark_attached(id)?;
        Ok(AttachGuard::new(self, id))
    }

    /// Delete a VM record.
    ///
    /// # Errors
    ///
    /// [`RegistryError::StillAttached`] if an interactive session owns the VM.
    pub fn remove(&mut self, id: &str) -> Result<VmRecord, RegistryError> {
        let index = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        if self.records[index].attached {
            return Err(RegistryError::StillAttached(id.to_string()));
        }
        let record = self.records.remove(index);
        tracing::debug!(vm_id = %id, "VM removed");
        Ok(record)
    }

    /// Snapshot of the records matching `filter`, in registration order.
    pub fn list(&self, filter: ListFilter) -> Vec<VmRecord> {
        self.records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }

    /// Iterate over all records without cloning.
    pub fn iter(&self) -> impl Iterator<Item = &VmRecord> {
        self.records.iter()
    }

    /// Uptime of a VM as `"{d}d {h}h {m}m"`.
    pub fn uptime(&self, id: &str) -> Result<String, RegistryError> {
        self.get(id)
            .map(VmRecord::uptime)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Get a record by id.
    pub fn get(&self, id: &str) -> Option<&VmRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Whether a record with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Lifecycle state of a VM. Unknown ids are [`RecordState::Removed`].
    pub fn state(&self, id: &str) -> RecordState {
        self.get(id).map_or(RecordState::Removed, VmRecord::state)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Id of the attached VM, if any.
    pub fn attached_id(&self) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.attached)
            .map(|r| r.id.as_str())
    }

    /// Count a successful package install. Returns the new total.
    pub fn record_package_install(&mut self, id: &str) -> Result<u32, RegistryError> {
        let record = self.record_mut(id)?;
        record.packages_installed += 1;
        Ok(record.packages_installed)
    }

    /// Remove every record, returning them in registration order.
    ///
    /// Used for process-wide cleanup; attached flags are cleared first.
    pub fn drain(&mut self) -> Vec<VmRecord> {
        self.records
            .drain(..)
            .map(|mut r| {
                r.attached = false;
                r
            })
            .collect()
    }

    fn record_mut(&mut self, id: &str) -> Result<&mut VmRecord, RegistryError> {
        self.records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(ids: &[&str]) -> VmRegistry {
        let mut registry = VmRegistry::new();
        for id in ids {
            registry.register(id, "standard", VmKind::Basic, None).unwrap();
            registry.mark_running(id).unwrap();
        }
        registry
    }

    fn assert_invariants(registry: &VmRegistry) {
        let attached = registry.iter().filter(|r| r.is_attached()).count();
        assert!(attached <= 1, "more than one VM attached");
        for record in registry.iter() {
            assert!(!record.is_attached() || record.is_running());
        }
    }

    #[test]
    fn test_register() {
        let mut registry = VmRegistry::new();
        let record = registry.register("vm1", "standard", VmKind::Basic, None).unwrap();
        assert_eq!(record.id(), "vm1");
        assert_eq!(record.profile(), "standard");
        assert!(!record.is_running());
        assert!(!record.is_attached());
        assert_eq!(record.packages_installed(), 0);
        assert!(record.backend_config().is_none());
        assert_eq!(registry.state("vm1"), RecordState::Created);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_duplicate_keeps_existing() {
        let mut registry = running(&["vm1"]);
        let err = registry
            .register("vm1", "other", VmKind::Hypervisor, None)
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateId("vm1".into()));

        let record = registry.get("vm1").unwrap();
        assert_eq!(record.profile(), "standard");
        assert_eq!(record.kind(), VmKind::Basic);
        assert!(record.is_running());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_blank_id() {
        let mut registry = VmRegistry::new();
        assert!(matches!(
            registry.register("", "standard", VmKind::Basic, None),
            Err(RegistryError::DuplicateId(_))
        ));
        assert!(matches!(
            registry.register("   ", "standard", VmKind::Basic, None),
            Err(RegistryError::DuplicateId(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_hypervisor_backend_config() {
        let mut registry = VmRegistry::new();
        let hv = HypervisorConfig {
            host: "10.0.0.9".into(),
            ..Default::default()
        };
        let record = registry
            .register("hv1", "bioxen", VmKind::Hypervisor, Some(hv))
            .unwrap();
        assert_eq!(record.backend_config().unwrap().host, "10.0.0.9");

        let record = registry
            .register("basic", "standard", VmKind::Basic, Some(HypervisorConfig::default()))
            .unwrap();
        assert!(record.backend_config().is_none());
    }

    #[test]
    fn test_mark_running_unknown() {
        let mut registry = VmRegistry::new();
        assert_eq!(
            registry.mark_running("missing"),
            Err(RegistryError::NotFound("missing".into()))
        );
    }

    #[test]
    fn test_attach_exclusive() {
        let mut registry = running(&["vm1", "vm2"]);
        registry.mark_attached("vm1").unwrap();
        assert_eq!(registry.state("vm1"), RecordState::Attached);
        assert_eq!(registry.attached_id(), Some("vm1"));

        let err = registry.mark_attached("vm1").unwrap_err();
        assert_eq!(
            err,
            RegistryError::NotRunning {
                id: "vm1".into(),
                blocker: AttachBlocker::AlreadyAttached,
            }
        );

        let err = registry.mark_attached("vm2").unwrap_err();
        assert_eq!(
            err,
            RegistryError::NotRunning {
                id: "vm2".into(),
                blocker: AttachBlocker::OtherAttached("vm1".into()),
            }
        );
        assert!(!registry.get("vm2").unwrap().is_attached());
        assert_invariants(&registry);
    }

    #[test]
    fn test_attach_requires_running() {
        let mut registry = VmRegistry::new();
        registry.register("vm1", "standard", VmKind::Basic, None).unwrap();
        let err = registry.mark_attached("vm1").unwrap_err();
        assert!(matches!(
            err,
            RegistryError::NotRunning {
                blocker: AttachBlocker::Stopped,
                ..
            }
        ));
        assert!(matches!(
            registry.mark_attached("missing"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_detach_idempotent() {
        let mut registry = running(&["vm1"]);
        registry.mark_attached("vm1").unwrap();
        registry.mark_detached("vm1");
        registry.mark_detached("vm1");
        registry.mark_detached("missing");
        assert_eq!(registry.state("vm1"), RecordState::Running);
        assert_eq!(registry.attached_id(), None);
    }

    #[test]
    fn test_remove_attached_fails() {
        let mut registry = running(&["vm1"]);
        registry.mark_attached("vm1").unwrap();
        assert_eq!(
            registry.remove("vm1").unwrap_err(),
            RegistryError::StillAttached("vm1".into())
        );
        assert!(registry.contains("vm1"));
        assert!(registry.get("vm1").unwrap().is_attached());
    }

    #[test]
    fn test_full_lifecycle() {
        let mut registry = running(&["vm1"]);
        registry.mark_attached("vm1").unwrap();
        registry.mark_detached("vm1");
        let removed = registry.remove("vm1").unwrap();
        assert_eq!(removed.id(), "vm1");
        assert!(registry.list(ListFilter::all()).is_empty());
        assert_eq!(registry.state("vm1"), RecordState::Removed);
        assert!(matches!(
            registry.remove("vm1"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_order_and_filters() {
        let mut registry = running(&["c", "a", "b"]);
        registry.register("pending", "standard", VmKind::Basic, None).unwrap();
        registry.mark_attached("a").unwrap();

        let ids = |records: Vec<VmRecord>| {
            records.into_iter().map(|r| r.id).collect::<Vec<_>>()
        };
        assert_eq!(ids(registry.list(ListFilter::all())), ["c", "a", "b", "pending"]);
        assert_eq!(ids(registry.list(ListFilter::running())), ["c", "a", "b"]);
        assert_eq!(ids(registry.list(ListFilter::attachable())), ["c", "b"]);
        assert_eq!(
            ids(registry.list(ListFilter {
                running: None,
                attached: Some(true),
            })),
            ["a"]
        );
    }

    #[test]
    fn test_uptime_fresh() {
        let mut registry = VmRegistry::new();
        registry.register("vm1", "standard", VmKind::Basic, None).unwrap();
        assert_eq!(registry.uptime("vm1").unwrap(), "0d 0h 0m");
        assert!(registry.uptime("missing").is_err());
    }

    #[test]
    fn test_record_package_install() {
        let mut registry = running(&["vm1"]);
        assert_eq!(registry.record_package_install("vm1").unwrap(), 1);
        assert_eq!(registry.record_package_install("vm1").unwrap(), 2);
        assert_eq!(registry.get("vm1").unwrap().packages_installed(), 2);
        assert!(registry.record_package_install("missing").is_err());
    }

    #[test]
    fn test_drain() {
        let mut registry = running(&["vm1", "vm2"]);
        registry.mark_attached("vm2").unwrap();
        let drained = registry.drain();
        assert_eq!(drained.len(), 2);
        assert!(drained.iter().all(|r| !r.is_attached()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_invariants_under_operation_sequence() {
        let mut registry = VmRegistry::new();
        let ids = ["a", "b", "c"];
        // Deterministic pseudo-random walk over the operations
        let mut seed: u32 = 7;
        for _ in 0..500 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let id = ids[(seed >> 8) as usize % ids.len()];
            match (seed >> 16) % 6 {
                0 => {
                    let _ = registry.register(id, "p", VmKind::Basic, None);
                }
                1 => {
                    let _ = registry.mark_running(id);
                }
                2 => {
                    let _ = registry.mark_attached(id);
                }
                3 => registry.mark_detached(id),
                4 => {
                    let before = registry.get(id).cloned();
                    if registry.remove(id).is_err() {
                        if let Some(before) = before {
                            assert!(before.is_attached());
                            assert!(registry.contains(id));
                        }
                    }
                }
                _ => {
                    let _ = registry.record_package_install(id);
                }
            }
            assert_invariants(&registry);
        }
    }
}
