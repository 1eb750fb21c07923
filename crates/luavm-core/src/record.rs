//! VM records tracked by the registry.

use chrono::{DateTime, Duration, Local};
use luavm_vm::{HypervisorConfig, VmKind, VmOptions};
use std::fmt;

/// Lifecycle state of a VM as seen by the registry.
///
/// ```text
/// Created --create ok--> Running --attach--> Attached
///    |                      ^                   |
///    |                      +------detach-------+
///    +--create failed--> Removed <--stop-- Running
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Registered, backend has not confirmed the VM yet.
    Created,
    /// Running with no interactive session.
    Running,
    /// Running and owning the terminal.
    Attached,
    /// Not in the registry.
    Removed,
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Running => write!(f, "Running"),
            Self::Attached => write!(f, "Attached"),
            Self::Removed => write!(f, "Removed"),
        }
    }
}

/// Status record for one VM.
///
/// Only [`VmRegistry`](crate::VmRegistry) mutates records; callers get
/// read access or snapshots.
#[derive(Debug, Clone)]
pub struct VmRecord {
    pub(crate) id: String,
    pub(crate) profile: String,
    pub(crate) kind: VmKind,
    pub(crate) options: VmOptions,
    pub(crate) running: bool,
    pub(crate) attached: bool,
    pub(crate) created_at: DateTime<Local>,
    pub(crate) packages_installed: u32,
    pub(crate) backend_config: Option<HypervisorConfig>,
}

impl VmRecord {
    pub(crate) fn new(
        id: &str,
        profile: &str,
        kind: VmKind,
        options: VmOptions,
        backend_config: Option<HypervisorConfig>,
    ) -> Self {
        Self {
            id: id.to_string(),
            profile: profile.to_string(),
            kind,
            options,
            running: false,
            attached: false,
            created_at: Local::now(),
            packages_installed: 0,
            backend_config,
        }
    }

    /// VM identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Profile label.
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// VM kind.
    pub fn kind(&self) -> VmKind {
        self.kind
    }

    /// Options the VM was created with.
    pub fn options(&self) -> VmOptions {
        self.options
    }

    /// Whether the backend confirmed the VM running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether an interactive session owns the VM.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Registration time.
    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    /// Successful package installs into this VM.
    pub fn packages_installed(&self) -> u32 {
        self.packages_installed
    }

    /// Hypervisor settings, for hypervisor VMs.
    pub fn backend_config(&self) -> Option<&HypervisorConfig> {
        self.backend_config.as_ref()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RecordState {
        match (self.running, self.attached) {
            (_, true) => RecordState::Attached,
            (true, false) => RecordState::Running,
            (false, false) => RecordState::Created,
        }
    }

    /// Uptime relative to `now`, formatted as `"{d}d {h}h {m}m"`.
    pub fn uptime_at(&self, now: DateTime<Local>) -> String {
        format_uptime(now.signed_duration_since(self.created_at))
    }

    /// Uptime until now.
    pub fn uptime(&self) -> String {
        self.uptime_at(Local::now())
    }
}

/// Format a duration as whole days, hours and minutes. Negative durations
/// (clock moved backwards) count as zero.
pub fn format_uptime(elapsed: Duration) -> String {
    let secs = elapsed.num_seconds().max(0);
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    format!("{days}d {hours}h {minutes}m")
}
