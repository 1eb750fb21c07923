//! Configuration for the luavm CLI.
//!
//! Two layers: runtime [`Settings`] read from environment variables, and
//! the persisted [`AppConfig`] (hypervisor credentials and VM defaults)
//! kept in a JSON file by [`ConfigStore`].

use luavm_core::DEFAULT_LUAROCKS;
use luavm_vm::{HypervisorConfig, VmOptions, DEFAULT_INTERPRETER, DEFAULT_OUTPUT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the JSON configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "luavm_config.json";

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// JSON configuration file.
    pub config_path: PathBuf,
    /// Lua interpreter for basic VMs and health checks.
    pub lua: PathBuf,
    /// LuaRocks binary.
    pub luarocks: PathBuf,
    /// How long to wait for a VM to answer a line of input.
    pub output_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            lua: PathBuf::from(DEFAULT_INTERPRETER),
            luarocks: PathBuf::from(DEFAULT_LUAROCKS),
            output_timeout: DEFAULT_OUTPUT_TIMEOUT,
        }
    }
}

impl Settings {
    /// Load settings from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `LUAVM_CONFIG` | `luavm_config.json` |
    /// | `LUAVM_LUA` | `lua` |
    /// | `LUAVM_LUAROCKS` | `luarocks` |
    /// | `LUAVM_OUTPUT_TIMEOUT_MS` | `2000` |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();
        Self {
            config_path: lookup("LUAVM_CONFIG")
                .map(PathBuf::from)
                .unwrap_or(default.config_path),
            lua: lookup("LUAVM_LUA").map(PathBuf::from).unwrap_or(default.lua),
            luarocks: lookup("LUAVM_LUAROCKS")
                .map(PathBuf::from)
                .unwrap_or(default.luarocks),
            output_timeout: lookup("LUAVM_OUTPUT_TIMEOUT_MS")
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(default.output_timeout),
        }
    }
}

/// Saved hypervisor connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedHypervisor {
    /// Host, user, password and template.
    #[serde(flatten)]
    pub connection: HypervisorConfig,
    /// Whether the password is written to disk.
    pub save_credentials: bool,
}

impl SavedHypervisor {
    /// Whether a complete login is saved.
    pub fn has_saved_login(&self) -> bool {
        self.save_credentials && !self.connection.password.is_empty()
    }
}

/// Defaults offered when creating a VM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmDefaults {
    /// Profile label.
    pub profile: String,
    /// Networking, persistence and debug flags.
    #[serde(flatten)]
    pub options: VmOptions,
}

impl Default for VmDefaults {
    fn default() -> Self {
        Self {
            profile: "standard".to_string(),
            options: VmOptions::default(),
        }
    }
}

/// Persisted application configuration.
///
/// Older files name the hypervisor section `xcpng`; it is read under that
/// name and written back as `hypervisor`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Hypervisor credentials.
    #[serde(alias = "xcpng")]
    pub hypervisor: SavedHypervisor,
    /// VM creation defaults.
    pub vm_defaults: VmDefaults,
}

impl AppConfig {
    /// Copy suitable for display or writing: the password is dropped unless
    /// credentials are meant to be saved.
    pub fn redacted_for_disk(&self) -> Self {
        let mut config = self.clone();
        if !config.hypervisor.save_credentials {
            config.hypervisor.connection.password.clear();
        }
        config
    }

    /// Pretty JSON with the password masked.
    pub fn to_display_json(&self) -> serde_json::Result<String> {
        let mut config = self.clone();
        if !config.hypervisor.connection.password.is_empty() {
            config.hypervisor.connection.password = "***".to_string();
        }
        serde_json::to_string_pretty(&config)
    }
}

/// Configuration store error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode configuration: {0}")]
    Encode(#[from] serde_json::Error),
}

/// JSON file holding an [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration. A missing or unreadable file yields the
    /// defaults.
    pub fn load(&self) -> AppConfig {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No configuration file, using defaults");
                return AppConfig::default();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Could not read configuration, using defaults");
                return AppConfig::default();
            }
        };

        match serde_json::from_str(&text) {
            Ok(config) => {
                tracing::debug!(path = %self.path.display(), "Configuration loaded");
                config
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Invalid configuration, using defaults");
                AppConfig::default()
            }
        }
    }

    /// Write the configuration.
    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(&config.redacted_for_disk())?;
        let write_err = |source| ConfigError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        write_private(&self.path, json.as_bytes()).map_err(write_err)?;

        tracing::debug!(path = %self.path.display(), "Configuration saved");
        Ok(())
    }
}

/// Write `contents`, keeping the file owner-only on unix since credentials
/// may be inside. The mode is set at creation, and tightened again for a
/// file that already existed.
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents)?;
    file.flush()
}
