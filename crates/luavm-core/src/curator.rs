//! Host-wide LuaRocks package management.

use crate::catalog;
use crate::error::{CoreError, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Default LuaRocks binary, resolved through `PATH`.
pub const DEFAULT_LUAROCKS: &str = "luarocks";

/// A package reported by `luarocks list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    /// Rock name.
    pub name: String,
    /// Installed version.
    pub version: String,
}

/// Snapshot of the host Lua environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    /// First line of `lua -v`, or `"unknown"`.
    pub lua_version: String,
    /// Whether `luarocks` could be run.
    pub package_manager_available: bool,
    /// Number of installed rocks.
    pub installed_count: usize,
}

/// Result of installing a profile's packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileReport {
    /// Profile name.
    pub profile: String,
    /// Rocks that installed.
    pub installed: Vec<String>,
    /// Rocks that failed.
    pub failed: Vec<String>,
}

impl ProfileReport {
    /// Whether every package installed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Packages attempted.
    pub fn total(&self) -> usize {
        self.installed.len() + self.failed.len()
    }
}

/// Reject names that are not plain rock names.
///
/// Names end up inside Lua string literals and shell commands, so only
/// `[A-Za-z0-9._-]` is accepted and the first character must be
/// alphanumeric.
pub fn validate_package_name(name: &str) -> Result<&str> {
    let name = name.trim();
    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(name)
    } else {
        Err(CoreError::InvalidPackageName(name.to_string()))
    }
}

/// Parse `luarocks list --porcelain` output (`name\tversion\tstatus\tpath`).
pub fn parse_porcelain(output: &str) -> Vec<InstalledPackage> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split('\t');
            let name = fields.next()?.trim();
            let version = fields.next()?.trim();
            if name.is_empty() || version.is_empty() {
                return None;
            }
            Some(InstalledPackage {
                name: name.to_string(),
                version: version.to_string(),
            })
        })
        .collect()
}

/// Runs `lua` and `luarocks` on the host.
#[derive(Debug, Clone)]
pub struct Curator {
    lua: PathBuf,
    luarocks: PathBuf,
}

impl Default for Curator {
    fn default() -> Self {
        Self::new(luavm_vm::DEFAULT_INTERPRETER, DEFAULT_LUAROCKS)
    }
}

impl Curator {
    /// Create a curator using the given binaries.
    pub fn new(lua: impl Into<PathBuf>, luarocks: impl Into<PathBuf>) -> Self {
        Self {
            lua: lua.into(),
            luarocks: luarocks.into(),
        }
    }

    /// LuaRocks binary in use.
    pub fn luarocks(&self) -> &Path {
        &self.luarocks
    }

    /// Install a rock globally. Returns whether luarocks succeeded.
    pub async fn install(&self, name: &str) -> Result<bool> {
        let name = validate_package_name(name)?;
        info!(package = %name, "Installing package globally");

        let output = Command::new(&self.luarocks)
            .args(["install", name])
            .kill_on_drop(true)
            .output()
            .await?;

        if output.status.success() {
            info!(package = %name, "Package installed");
            Ok(true)
        } else {
            warn!(
                package = %name,
                exit_code = ?output.status.code(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Package install failed"
            );
            Ok(false)
        }
    }

    /// List globally installed rocks.
    pub async fn list_installed(&self) -> Result<Vec<InstalledPackage>> {
        let output = Command::new(&self.luarocks)
            .args(["list", "--porcelain"])
            .output()
            .await?;
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "luarocks list failed");
            return Err(CoreError::PackageManager(format!(
                "`{} list` exited with {}",
                self.luarocks.display(),
                output.status
            )));
        }
        let packages = parse_porcelain(&String::from_utf8_lossy(&output.stdout));
        debug!(count = packages.len(), "Listed installed packages");
        Ok(packages)
    }

    /// Inspect the host environment. Never fails; missing tools show up in
    /// the report.
    pub async fn health_check(&self) -> HealthReport {
        let lua_version = self.lua_version().await.unwrap_or_else(|| "unknown".to_string());
        let (package_manager_available, installed_count) = match self.list_installed().await {
            Ok(packages) => (true, packages.len()),
            Err(e) => {
                debug!(error = %e, "luarocks unavailable");
                (false, 0)
            }
        };
        HealthReport {
            lua_version,
            package_manager_available,
            installed_count,
        }
    }

    /// Install every package of a catalog profile.
    pub async fn curate_profile(&self, profile: &str) -> Result<ProfileReport> {
        let entry =
            catalog::profile(profile).ok_or_else(|| CoreError::UnknownProfile(profile.to_string()))?;
        info!(profile = %profile, packages = entry.packages.len(), "Curating profile");

        let mut report = ProfileReport {
            profile: profile.to_string(),
            installed: Vec::new(),
            failed: Vec::new(),
        };
        for name in entry.packages {
            match self.install(name).await {
                Ok(true) => report.installed.push(name.to_string()),
                Ok(false) => report.failed.push(name.to_string()),
                Err(e) => {
                    warn!(package = %name, error = %e, "Could not run luarocks");
                    report.failed.push(name.to_string());
                }
            }
        }
        Ok(report)
    }

    async fn lua_version(&self) -> Option<String> {
        let output = Command::new(&self.lua).arg("-v").output().await.ok()?;
        // Lua 5.1 prints its banner on stderr
        let version = [&output.stdout, &output.stderr]
            .into_iter()
            .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
            .find(|text| !text.is_empty())
            .and_then(|text| text.lines().next().map(str::to_string));
        version
    }
}
