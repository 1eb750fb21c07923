//! VM configuration types.

use crate::error::{Result, VmError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default interpreter binary, resolved through `PATH`.
pub const DEFAULT_INTERPRETER: &str = "lua";

/// Default window to wait for a VM to answer a line of input.
pub const DEFAULT_OUTPUT_TIMEOUT: Duration = Duration::from_secs(2);

/// Kind of VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VmKind {
    /// Lua interpreter running as a local subprocess.
    #[default]
    Basic,
    /// Hypervisor-managed VM (placeholder, configuration only).
    #[serde(alias = "xcpng")]
    Hypervisor,
}

impl VmKind {
    /// Whether this kind supports an interactive console.
    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Basic)
    }
}

impl fmt::Display for VmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Hypervisor => write!(f, "hypervisor"),
        }
    }
}

impl FromStr for VmKind {
    type Err = VmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "basic" | "subprocess" => Ok(Self::Basic),
            "hypervisor" | "xcpng" | "xcp-ng" => Ok(Self::Hypervisor),
            other => Err(VmError::Config(format!("unknown VM kind: {other}"))),
        }
    }
}

/// Behavioural options chosen at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmOptions {
    /// Expose networking to the VM (sets `LUAVM_NETWORKED=1` for the interpreter).
    pub networked: bool,
    /// Keep the VM running after its interactive session detaches.
    pub persistent: bool,
    /// Log every line exchanged with the VM at info level.
    pub debug_mode: bool,
}

impl Default for VmOptions {
    fn default() -> Self {
        Self {
            networked: false,
            persistent: true,
            debug_mode: false,
        }
    }
}

/// Connection settings for a hypervisor-backed VM.
///
/// Older configuration files spell the host key `xcpng_host`; it is accepted
/// on input and always written back as `host`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HypervisorConfig {
    /// Hypervisor host address.
    #[serde(alias = "xcpng_host")]
    pub host: String,
    /// Login user.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Template the VM is cloned from.
    pub template: String,
}

impl Default for HypervisorConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.100".to_string(),
            username: "root".to_string(),
            password: String::new(),
            template: "lua-bio-template".to_string(),
        }
    }
}

impl fmt::Debug for HypervisorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HypervisorConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("template", &self.template)
            .finish()
    }
}

/// Complete configuration for one VM.
#[derive(Debug, Clone)]
pub struct MachineConfig {
    /// Kind of VM.
    pub kind: VmKind,
    /// Interpreter binary for basic VMs.
    pub interpreter: PathBuf,
    /// Creation options.
    pub options: VmOptions,
    /// How long to wait for the VM to answer a line of input.
    pub output_timeout: Duration,
    /// Hypervisor settings, required for hypervisor VMs.
    pub hypervisor: Option<HypervisorConfig>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            kind: VmKind::Basic,
            interpreter: PathBuf::from(DEFAULT_INTERPRETER),
            options: VmOptions::default(),
            output_timeout: DEFAULT_OUTPUT_TIMEOUT,
            hypervisor: None,
        }
    }
}

impl MachineConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.output_timeout.is_zero() {
            return Err(VmError::Config("output_timeout must be > 0".into()));
        }
        match self.kind {
            VmKind::Basic => {
                if self.interpreter.as_os_str().is_empty() {
                    return Err(VmError::Config("interpreter is required".into()));
                }
            }
            VmKind::Hypervisor => {
                let hv = self.hypervisor.as_ref().ok_or_else(|| {
                    VmError::Config("hypervisor VMs need hypervisor settings".into())
                })?;
                if hv.host.trim().is_empty() {
                    return Err(VmError::Config("hypervisor host is required".into()));
                }
                if hv.template.trim().is_empty() {
                    return Err(VmError::Config("hypervisor template is required".into()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!("basic".parse::<VmKind>().unwrap(), VmKind::Basic);
        assert_eq!("XCPNG".parse::<VmKind>().unwrap(), VmKind::Hypervisor);
        assert_eq!("hypervisor".parse::<VmKind>().unwrap(), VmKind::Hypervisor);
        assert!("xen".parse::<VmKind>().is_err());
    }

    #[test]
    fn test_kind_legacy_serde_name() {
        let kind: VmKind = serde_json::from_str("\"xcpng\"").unwrap();
        assert_eq!(kind, VmKind::Hypervisor);
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"hypervisor\"");
    }

    #[test]
    fn test_hypervisor_legacy_host_key() {
        let json = r#"{"xcpng_host":"10.0.0.5","username":"admin","password":"pw","template":"t"}"#;
        let hv: HypervisorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(hv.host, "10.0.0.5");
        assert_eq!(hv.username, "admin");

        let out = serde_json::to_string(&hv).unwrap();
        assert!(out.contains("\"host\":\"10.0.0.5\""));
        assert!(!out.contains("xcpng_host"));
    }

    #[test]
    fn test_hypervisor_debug_redacts_password() {
        let hv = HypervisorConfig {
            password: "secret".into(),
            ..Default::default()
        };
        let dbg = format!("{:?}", hv);
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("***"));
    }

    #[test]
    fn test_default_options() {
        let opts = VmOptions::default();
        assert!(opts.persistent);
        assert!(!opts.networked);
        assert!(!opts.debug_mode);
    }

    #[test]
    fn test_validate_hypervisor_requires_settings() {
        let config = MachineConfig {
            kind: VmKind::Hypervisor,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = MachineConfig {
            kind: VmKind::Hypervisor,
            hypervisor: Some(HypervisorConfig::default()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let config = MachineConfig {
            output_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
