//! Menu flows.
//!
//! Every action runs to completion and returns to the main menu; errors
//! are printed rather than propagated.

use crate::config::{AppConfig, ConfigStore, SavedHypervisor, Settings, VmDefaults};
use crate::console::{interruptible, ConsoleLines};
use dialoguer::console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password, Select};
use luavm_core::catalog::{self, RECOMMENDED};
use luavm_core::{
    CreateRequest, Curator, ExitReason, ListFilter, RecordState, Verification, VmController,
    VmRecord,
};
use luavm_vm::{HypervisorConfig, LocalBackend, VmBuilder, VmKind, VmOptions};

const BACK: &str = "← Back";
const RULE_WIDTH: usize = 70;

/// Entries of the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    CreateVm,
    Attach,
    InstallPackages,
    Profiles,
    Configuration,
    EnvironmentStatus,
    ListVms,
    StopVm,
    Exit,
}

impl MenuAction {
    /// Menu order.
    pub const ALL: [Self; 9] = [
        Self::CreateVm,
        Self::Attach,
        Self::InstallPackages,
        Self::Profiles,
        Self::Configuration,
        Self::EnvironmentStatus,
        Self::ListVms,
        Self::StopVm,
        Self::Exit,
    ];

    /// Menu label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CreateVm => "Create new Lua VM",
            Self::Attach => "Attach to existing VM",
            Self::InstallPackages => "Install packages",
            Self::Profiles => "Manage profiles",
            Self::Configuration => "Configuration settings",
            Self::EnvironmentStatus => "Environment status",
            Self::ListVms => "List VMs",
            Self::StopVm => "Stop VM",
            Self::Exit => "Exit",
        }
    }
}

/// Capitalised kind name for display.
pub fn kind_label(kind: VmKind) -> &'static str {
    match kind {
        VmKind::Basic => "Basic",
        VmKind::Hypervisor => "Hypervisor",
    }
}

/// One-line VM summary used in selection lists.
pub fn describe(record: &VmRecord) -> String {
    format!(
        "{} ({}, Profile: {}, Uptime: {})",
        record.id(),
        kind_label(record.kind()),
        record.profile(),
        record.uptime()
    )
}

fn describe_options(options: VmOptions) -> String {
    let flag = |on: bool| if on { "on" } else { "off" };
    format!(
        "networking {}, persistent {}, debug {}",
        flag(options.networked),
        flag(options.persistent),
        flag(options.debug_mode)
    )
}

fn rule() {
    println!("{}", "-".repeat(RULE_WIDTH));
}

fn ok(message: impl std::fmt::Display) {
    println!("{} {message}", style("✔").green());
}

fn warn(message: impl std::fmt::Display) {
    println!("{} {message}", style("!").yellow());
}

fn fail(message: impl std::fmt::Display) {
    println!("{} {message}", style("✘").red());
}

/// The interactive application.
pub struct App {
    controller: VmController<LocalBackend>,
    curator: Curator,
    settings: Settings,
    store: ConfigStore,
    config: AppConfig,
    theme: ColorfulTheme,
}

impl App {
    /// Build the application from runtime settings, loading the saved
    /// configuration.
    pub fn new(settings: Settings) -> Self {
        let store = ConfigStore::new(&settings.config_path);
        let config = store.load();
        let controller = VmController::new(LocalBackend::new())
            .with_luarocks(settings.luarocks.display().to_string());
        let curator = Curator::new(&settings.lua, &settings.luarocks);
        Self {
            controller,
            curator,
            settings,
            store,
            config,
            theme: ColorfulTheme::default(),
        }
    }

    /// Run the main menu until the operator exits, then stop every VM.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        println!("{}", style("luavm - Lua VM control").bold());
        loop {
            let labels: Vec<_> = MenuAction::ALL.iter().map(MenuAction::label).collect();
            let action = match self.select("Main menu", &labels) {
                Ok(Some(index)) => MenuAction::ALL[index],
                Ok(None) => continue,
                Err(e) => {
                    // Terminal gone or prompt interrupted
                    tracing::debug!(error = %e, "Main menu prompt ended");
                    println!("\nGoodbye!");
                    break;
                }
            };
            if action == MenuAction::Exit {
                break;
            }
            match interruptible(self.dispatch(action)).await {
                Some(Ok(())) => {}
                Some(Err(e)) => fail(format!("{e:#}")),
                None => self.recover_from_interrupt().await,
            }
        }
        self.shutdown().await;
        Ok(())
    }

    async fn dispatch(&mut self, action: MenuAction) -> anyhow::Result<()> {
        tracing::debug!(?action, "Menu action");
        match action {
            MenuAction::CreateVm => self.create_vm().await,
            MenuAction::Attach => self.attach_vm().await,
            MenuAction::InstallPackages => self.install_packages().await,
            MenuAction::Profiles => self.manage_profiles().await,
            MenuAction::Configuration => self.manage_configuration(),
            MenuAction::EnvironmentStatus => self.environment_status().await,
            MenuAction::ListVms => {
                self.list_vms();
                Ok(())
            }
            MenuAction::StopVm => self.stop_vm().await,
            MenuAction::Exit => Ok(()),
        }
    }

    /// Back at the menu after Ctrl-C. An attached VM was already detached
    /// when its session was dropped; a half-created one is discarded here.
    async fn recover_from_interrupt(&mut self) {
        println!();
        warn("Interrupted, returning to the menu");
        for id in self.controller.discard_unstarted().await {
            warn(format!("VM '{id}' was not created"));
        }
    }

    /// Stop every VM and report.
    pub async fn shutdown(&mut self) {
        if self.controller.registry().is_empty() {
            return;
        }
        println!("\nCleaning up running VMs...");
        let report = self.controller.shutdown().await;
        for id in &report.stopped {
            ok(format!("VM {id} terminated"));
        }
        for (id, error) in &report.failed {
            warn(format!("Could not terminate VM {id}: {error}"));
        }
    }

    // ---- prompt helpers ----

    fn select<T: ToString>(&self, prompt: &str, items: &[T]) -> anyhow::Result<Option<usize>> {
        Ok(Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact_opt()?)
    }

    fn confirm(&self, prompt: &str, default: bool) -> anyhow::Result<bool> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }

    fn input(&self, prompt: &str, default: &str) -> anyhow::Result<String> {
        let value: String = Input::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default.to_string())
            .interact_text()?;
        Ok(value.trim().to_string())
    }

    /// Pick a VM matching `filter`, or `None` for back.
    fn select_vm(&self, prompt: &str, filter: ListFilter, empty: &str) -> anyhow::Result<Option<VmRecord>> {
        let records = self.controller.registry().list(filter);
        if records.is_empty() {
            warn(empty);
            return Ok(None);
        }
        let mut items: Vec<String> = records.iter().map(describe).collect();
        items.push(BACK.to_string());
        Ok(self
            .select(prompt, &items)?
            .and_then(|index| records.get(index).cloned()))
    }

    fn save_config(&self) -> bool {
        match self.store.save(&self.config) {
            Ok(()) => true,
            Err(e) => {
                fail(format!("Failed to save configuration: {e}"));
                false
            }
        }
    }

    // ---- create ----

    async fn create_vm(&mut self) -> anyhow::Result<()> {
        let kinds = [
            "Basic VM (subprocess-based, default)",
            "Hypervisor VM (XCP-ng, placeholder)",
            BACK,
        ];
        let kind = match self.select("Select VM type", &kinds)? {
            Some(0) => VmKind::Basic,
            Some(1) => VmKind::Hypervisor,
            _ => return Ok(()),
        };

        let VmDefaults { profile, options } = self.config.vm_defaults.clone();
        let networked = self.confirm("Enable networking capabilities?", options.networked)?;
        let persistent = self.confirm("Enable persistent sessions?", options.persistent)?;
        let debug_mode = self.confirm("Enable debug mode?", options.debug_mode)?;

        let registry = self.controller.registry();
        let id: String = Input::with_theme(&self.theme)
            .with_prompt("VM ID (unique identifier)")
            .validate_with(|input: &String| -> Result<(), String> {
                let id = input.trim();
                if id.is_empty() {
                    Err("VM ID must not be empty".to_string())
                } else if registry.contains(id) {
                    Err(format!("VM ID '{id}' already exists"))
                } else {
                    Ok(())
                }
            })
            .interact_text()?;
        let id = id.trim().to_string();
        let profile = self.input("Profile name for this VM", &profile)?;

        let mut builder = VmBuilder::new()
            .kind(kind)
            .interpreter(self.settings.lua.clone())
            .networked(networked)
            .persistent(persistent)
            .debug_mode(debug_mode)
            .output_timeout(self.settings.output_timeout);
        if kind == VmKind::Hypervisor {
            builder = builder.with_hypervisor(self.hypervisor_login()?);
        }

        println!("Creating {} VM '{id}' with profile '{profile}'...", kind_label(kind));
        let created = self
            .controller
            .create(CreateRequest::new(&id, &profile, builder.build_config()))
            .await?;
        ok(format!("{} VM '{id}' created with profile '{profile}'", kind_label(kind)));

        match kind {
            VmKind::Basic => {
                if let Some(banner) = created.banner.filter(|b| !b.is_empty()) {
                    println!("{}", style(banner).dim());
                }
                println!("Use 'Attach to existing VM' to interact with this VM");
                rule();
                if self.confirm("Attach to VM now?", true)? {
                    self.attach_session(&id).await?;
                }
            }
            VmKind::Hypervisor => {
                warn("Hypervisor VMs are placeholders: the configuration is recorded, no machine is provisioned");
                if let Some(hv) = created.record.backend_config() {
                    println!("  Host: {}  Template: {}", hv.host, hv.template);
                }
            }
        }
        Ok(())
    }

    /// Saved or freshly entered hypervisor login.
    fn hypervisor_login(&mut self) -> anyhow::Result<HypervisorConfig> {
        let saved = self.config.hypervisor.clone();
        if saved.has_saved_login()
            && self.confirm(
                &format!("Use saved hypervisor credentials for {}?", saved.connection.host),
                true,
            )?
        {
            ok(format!("Using saved credentials for {}", saved.connection.host));
            return Ok(saved.connection);
        }

        let connection = self.prompt_connection(&saved.connection)?;
        if self.confirm("Save these credentials for future use?", false)? {
            self.config.hypervisor = SavedHypervisor {
                connection: connection.clone(),
                save_credentials: true,
            };
            if self.save_config() {
                ok("Credentials saved to config file");
            }
        }
        Ok(connection)
    }

    fn prompt_connection(&self, current: &HypervisorConfig) -> anyhow::Result<HypervisorConfig> {
        let host = self.input("Hypervisor host", &current.host)?;
        let username = self.input("Username", &current.username)?;
        let password = Password::with_theme(&self.theme)
            .with_prompt("Password")
            .allow_empty_password(true)
            .interact()?;
        let template = self.input("Template name", &current.template)?;
        Ok(HypervisorConfig {
            host,
            username,
            password,
            template,
        })
    }

    // ---- attach ----

    async fn attach_vm(&mut self) -> anyhow::Result<()> {
        let Some(record) = self.select_vm(
            "Select a VM to attach",
            ListFilter::attachable(),
            "No running VMs available to attach to",
        )?
        else {
            return Ok(());
        };

        if record.kind().is_interactive() {
            self.attach_session(record.id()).await
        } else {
            self.hypervisor_console(&record)
        }
    }

    async fn attach_session(&mut self, id: &str) -> anyhow::Result<()> {
        let persistent = self
            .controller
            .registry()
            .get(id)
            .map_or(true, |r| r.options().persistent);

        println!("Attaching to VM '{id}'");
        println!("Press Ctrl+D, Ctrl+C or type 'exit' to detach and return to the menu");
        if persistent {
            println!("The VM will continue running after detachment");
        } else {
            println!("This VM is not persistent and will be stopped on detach");
        }
        rule();

        let mut lines = ConsoleLines::new()?;
        let mut out = std::io::stdout();
        let summary = self.controller.attach(id, &mut lines, &mut out).await?;

        rule();
        if summary.reason == ExitReason::BackendFailure {
            warn(format!("Lost contact with VM '{id}'"));
        }
        if self.controller.registry().contains(id) {
            ok(format!("Detached from VM '{id}' - VM continues running"));
        } else {
            ok(format!("Detached from VM '{id}' - VM stopped"));
        }
        Ok(())
    }

    fn hypervisor_console(&self, record: &VmRecord) -> anyhow::Result<()> {
        println!("Hypervisor VM '{}'", record.id());
        warn("Hypervisor console access is a placeholder");
        if let Some(hv) = record.backend_config() {
            println!("  Host:     {}", hv.host);
            println!("  Username: {}", hv.username);
            println!("  Template: {}", hv.template);
        }
        let methods = ["Console", "VNC viewer", "SSH connection", BACK];
        if let Some(index) = self.select("Select connection method", &methods)? {
            if index < methods.len() - 1 {
                warn(format!("{} connection is not implemented yet", methods[index]));
            }
        }
        Ok(())
    }

    // ---- packages ----

    async fn install_packages(&mut self) -> anyhow::Result<()> {
        let running = self.controller.registry().list(ListFilter::running());
        let mut targets: Vec<String> = running
            .iter()
            .map(|r| format!("VM: {} ({}, {} profile)", r.id(), kind_label(r.kind()), r.profile()))
            .collect();
        targets.push("Global system installation".to_string());
        targets.push(BACK.to_string());

        let Some(index) = self.select("Where would you like to install packages?", &targets)? else {
            return Ok(());
        };
        let target = match index {
            i if i < running.len() => Some(&running[i]),
            i if i == running.len() => None,
            _ => return Ok(()),
        };
        if let Some(record) = target.filter(|r| !r.kind().is_interactive()) {
            warn(format!(
                "Package installation into hypervisor VM '{}' is a placeholder",
                record.id()
            ));
            return Ok(());
        }
        let vm = target.map(|r| r.id().to_string());

        let where_to = vm
            .as_ref()
            .map_or("globally".to_string(), |id| format!("to VM '{id}'"));
        let choices = [
            "Install specific package by name",
            "Install recommended packages",
            "Show available packages",
            BACK,
        ];
        match self.select(&format!("How would you like to install packages {where_to}?"), &choices)? {
            Some(0) => {
                let name = self.input("Package name to install", "")?;
                if !name.is_empty() {
                    self.install_one(&name, vm.as_deref()).await?;
                }
            }
            Some(1) => {
                if self.confirm(
                    &format!("Install recommended packages: {}?", RECOMMENDED.join(", ")),
                    true,
                )? {
                    self.install_many(&RECOMMENDED, vm.as_deref()).await;
                }
            }
            Some(2) => self.show_packages(vm.as_deref()).await?,
            _ => {}
        }
        Ok(())
    }

    async fn install_one(&mut self, name: &str, vm: Option<&str>) -> anyhow::Result<bool> {
        let Some(id) = vm else {
            println!("Installing {name} globally...");
            let installed = self.curator.install(name).await?;
            if installed {
                ok(format!("Successfully installed {name} globally"));
            } else {
                fail(format!("Failed to install {name} globally"));
            }
            return Ok(installed);
        };

        println!("Installing {name} to VM '{id}'...");
        let outcome = self.controller.install_package(name, id).await?;
        if !outcome.installed {
            fail(format!("Failed to install {name} to VM '{id}'"));
            if !outcome.output.is_empty() {
                println!("{}", style(&outcome.output).dim());
            }
            return Ok(false);
        }

        ok(format!("Successfully installed {name} to VM '{id}'"));
        match outcome.verification {
            Some(Verification::Loaded) => ok(format!("Verification: {name} loads in VM '{id}'")),
            Some(Verification::NotLoadable) => warn(format!(
                "{name} installed but cannot be loaded in VM '{id}'"
            )),
            _ => {}
        }
        Ok(true)
    }

    async fn install_many(&mut self, packages: &[&str], vm: Option<&str>) {
        let mut installed = 0;
        for name in packages {
            match self.install_one(name, vm).await {
                Ok(true) => installed += 1,
                Ok(false) => {}
                Err(e) => fail(format!("Error installing {name}: {e:#}")),
            }
        }
        println!(
            "Installation complete: {installed}/{} successful",
            packages.len()
        );
    }

    async fn show_packages(&mut self, vm: Option<&str>) -> anyhow::Result<()> {
        match vm {
            Some(id) => {
                println!("\nChecking packages in VM '{id}'...");
                let listing = self.controller.vm_packages(id).await?;
                if listing.is_empty() {
                    println!("No package information available");
                } else {
                    println!("Installed packages in VM:\n{listing}");
                }
            }
            None => {
                let installed = self.curator.list_installed().await?;
                println!("\nCurrently installed packages (global):");
                if installed.is_empty() {
                    println!("  No packages installed globally");
                }
                for package in &installed {
                    println!("  • {} v{}", package.name, package.version);
                }
            }
        }

        let mut packages: Vec<_> = catalog::PACKAGES.iter().collect();
        packages.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.name.cmp(&b.name)));
        println!("\nAvailable packages:");
        for package in packages {
            println!(
                "  {:<16} {:<14} {}",
                package.name,
                format!("[{}]", package.category),
                package.description
            );
        }
        Ok(())
    }

    // ---- profiles ----

    async fn manage_profiles(&mut self) -> anyhow::Result<()> {
        let choices = ["Set up environment profile", "Show available profiles", BACK];
        match self.select("Profile management", &choices)? {
            Some(0) => self.setup_profile().await,
            Some(1) => {
                for category in catalog::categories() {
                    println!("\n{}:", style(category).bold());
                    for profile in catalog::profiles_in(category) {
                        println!(
                            "  • {} - {} ({} packages)",
                            profile.name,
                            profile.description,
                            profile.packages.len()
                        );
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn setup_profile(&mut self) -> anyhow::Result<()> {
        let mut items: Vec<String> = catalog::PROFILES
            .iter()
            .map(|p| format!("{} ({} packages)", p.name, p.packages.len()))
            .collect();
        items.push(BACK.to_string());
        let Some(profile) = self
            .select("Select environment profile", &items)?
            .and_then(|index| catalog::PROFILES.get(index))
        else {
            return Ok(());
        };

        println!("{}", profile.description);
        println!("Packages: {}", profile.packages.join(", "));
        if !self.confirm(&format!("Install the '{}' environment globally?", profile.name), true)? {
            return Ok(());
        }

        println!("Setting up '{}' environment...", profile.name);
        let report = self.curator.curate_profile(profile.name).await?;
        for name in &report.failed {
            fail(format!("{name} failed"));
        }
        if report.is_complete() {
            ok(format!("'{}' environment setup complete", report.profile));
        } else {
            warn(format!(
                "'{}' environment partially set up: {}/{} packages installed",
                report.profile,
                report.installed.len(),
                report.total()
            ));
        }
        Ok(())
    }

    // ---- configuration ----

    fn manage_configuration(&mut self) -> anyhow::Result<()> {
        let choices = [
            "Hypervisor credentials",
            "VM default settings",
            "View current configuration",
            "Clear saved credentials",
            "← Back to main menu",
        ];
        loop {
            match self.select("Configuration settings", &choices)? {
                Some(0) => self.edit_credentials()?,
                Some(1) => self.edit_vm_defaults()?,
                Some(2) => {
                    println!("\nConfiguration ({})", self.store.path().display());
                    println!("{}", self.config.to_display_json()?);
                }
                Some(3) => {
                    if self.confirm("Clear all saved credentials? This cannot be undone.", false)? {
                        self.config = AppConfig::default();
                        if self.save_config() {
                            ok("All credentials cleared");
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn edit_credentials(&mut self) -> anyhow::Result<()> {
        let saved = &self.config.hypervisor;
        println!("\nHypervisor credentials");
        if saved.save_credentials {
            println!("  Host:     {}", saved.connection.host);
            println!("  Username: {}", saved.connection.username);
            println!("  Template: {}", saved.connection.template);
            println!(
                "  Password: {}",
                if saved.connection.password.is_empty() { "not saved" } else { "saved" }
            );
        } else {
            println!("  No credentials currently saved");
        }

        if !self.confirm("Edit hypervisor credentials?", true)? {
            return Ok(());
        }
        let connection = self.prompt_connection(&self.config.hypervisor.connection)?;
        if self.confirm("Save these credentials?", true)? {
            self.config.hypervisor = SavedHypervisor {
                connection,
                save_credentials: true,
            };
            if self.save_config() {
                ok("Hypervisor credentials saved");
            }
        }
        Ok(())
    }

    fn edit_vm_defaults(&mut self) -> anyhow::Result<()> {
        let current = self.config.vm_defaults.clone();
        println!("\nVM default settings");
        let profile = self.input("Default profile", &current.profile)?;
        let networked = self.confirm("Enable networking by default?", current.options.networked)?;
        let persistent =
            self.confirm("Enable persistent sessions by default?", current.options.persistent)?;
        let debug_mode = self.confirm("Enable debug mode by default?", current.options.debug_mode)?;

        self.config.vm_defaults = VmDefaults {
            profile,
            options: VmOptions {
                networked,
                persistent,
                debug_mode,
            },
        };
        if self.save_config() {
            ok("VM defaults saved");
        }
        Ok(())
    }

    // ---- status ----

    async fn environment_status(&mut self) -> anyhow::Result<()> {
        println!("\nEnvironment status");
        let registry = self.controller.registry();
        if registry.is_empty() {
            println!("  No VMs created yet");
        } else {
            println!("  Active VMs: {}", registry.len());
            for record in registry.iter() {
                println!(
                    "    • {}: Kind={}, Profile={}, Uptime={}, State={}",
                    record.id(),
                    kind_label(record.kind()),
                    record.profile(),
                    record.uptime(),
                    record.state()
                );
            }
        }

        let health = self.curator.health_check().await;
        println!("\nSystem health");
        println!("  Lua version: {}", health.lua_version);
        println!(
            "  LuaRocks:    {} ({})",
            if health.package_manager_available { "available" } else { "unavailable" },
            self.curator.luarocks().display()
        );
        println!("  Packages:    {}", health.installed_count);

        let mut issues = Vec::new();
        if health.lua_version == "unknown" {
            issues.push(format!("Lua interpreter not found ({})", self.settings.lua.display()));
        }
        if !health.package_manager_available {
            issues.push(format!("LuaRocks not usable ({})", self.curator.luarocks().display()));
        }
        if issues.is_empty() {
            ok("Environment: OK");
        } else {
            warn(format!("Issues: {} problems detected", issues.len()));
            for issue in issues {
                println!("    - {issue}");
            }
        }
        Ok(())
    }

    fn list_vms(&self) {
        let records = self.controller.registry().list(ListFilter::all());
        if records.is_empty() {
            println!("No VMs created");
            return;
        }

        println!("\nVM list");
        rule();
        for record in &records {
            let status = match record.state() {
                RecordState::Attached => style("Running, attached".to_string()).green(),
                RecordState::Running => style("Running".to_string()).green(),
                state => style(state.to_string()).red(),
            };
            println!("VM ID: {}", style(record.id()).bold());
            println!("  Kind:      {}", kind_label(record.kind()));
            println!("  Profile:   {}", record.profile());
            println!("  Status:    {status}");
            println!("  Options:   {}", describe_options(record.options()));
            println!("  Created:   {}", record.created_at().format("%Y-%m-%d %H:%M:%S"));
            println!("  Uptime:    {}", record.uptime());
            println!("  Packages:  {}", record.packages_installed());
            if let Some(hv) = record.backend_config() {
                println!("  Host:      {} (template {})", hv.host, hv.template);
            }
            println!();
        }
    }

    async fn stop_vm(&mut self) -> anyhow::Result<()> {
        let Some(record) = self.select_vm(
            "Select VM to stop",
            ListFilter::running(),
            "No running VMs to stop",
        )?
        else {
            return Ok(());
        };
        let id = record.id();
        if !self.confirm(&format!("Stop VM '{id}'? This will terminate the session."), false)? {
            return Ok(());
        }
        self.controller.stop(id).await?;
        ok(format!("VM '{id}' stopped and removed"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luavm_core::VmRegistry;

    #[test]
    fn test_menu_order() {
        let labels: Vec<_> = MenuAction::ALL.iter().map(MenuAction::label).collect();
        assert_eq!(
            labels,
            [
                "Create new Lua VM",
                "Attach to existing VM",
                "Install packages",
                "Manage profiles",
                "Configuration settings",
                "Environment status",
                "List VMs",
                "Stop VM",
                "Exit",
            ]
        );
    }

    #[test]
    fn test_describe() {
        let mut registry = VmRegistry::new();
        let record = registry
            .register("vm1", "standard", VmKind::Basic, None)
            .unwrap();
        assert_eq!(describe(&record), "vm1 (Basic, Profile: standard, Uptime: 0d 0h 0m)");
    }

    #[test]
    fn test_describe_options() {
        assert_eq!(
            describe_options(VmOptions::default()),
            "networking off, persistent on, debug off"
        );
    }
}
