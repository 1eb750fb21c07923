//! Scoped attach.

use crate::record::VmRecord;
use crate::registry::VmRegistry;

/// RAII guard for an attached VM.
///
/// Created by [`VmRegistry::attach`]. Dropping the guard detaches the VM,
/// so every way out of an interactive session (including a panic unwinding
/// through it) returns the record to `Running`.
///
/// # Example
///
/// ```
/// use luavm_core::{RecordState, VmRegistry};
/// use luavm_vm::VmKind;
///
/// let mut registry = VmRegistry::new();
/// registry.register("vm1", "standard", VmKind::Basic, None).unwrap();
/// registry.mark_running("vm1").unwrap();
///
/// {
///     let guard = registry.attach("vm1").unwrap();
///     assert_eq!(guard.id(), "vm1");
/// }
/// assert_eq!(registry.state("vm1"), RecordState::Running);
/// ```
#[derive(Debug)]
pub struct AttachGuard<'a> {
    registry: &'a mut VmRegistry,
    id: String,
}

impl<'a> AttachGuard<'a> {
    pub(crate) fn new(registry: &'a mut VmRegistry, id: &str) -> Self {
        Self {
            registry,
            id: id.to_string(),
        }
    }

    /// Id of the attached VM.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The attached VM's record.
    pub fn record(&self) -> Option<&VmRecord> {
        self.registry.get(&self.id)
    }

    /// Read access to the registry while attached.
    pub fn registry(&self) -> &VmRegistry {
        self.registry
    }

    /// Detach now.
    pub fn detach(self) {}
}

impl Drop for AttachGuard<'_> {
    fn drop(&mut self) {
        self.registry.mark_detached(&self.id);
        tracing::debug!(vm_id = %self.id, "attach guard released");
    }
}
