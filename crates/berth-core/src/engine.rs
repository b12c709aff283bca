use crate::concurrency::StoreLock;
use crate::installer::ConfigurationInstaller;
use crate::lifecycle::{validate_transition, EnvState, Transition};
use crate::orchestrator::{
    ensure_no_other_active, DegradedStep, LifecycleEvent, Orchestrator, TransitionReport,
};
use crate::prompt::Prompter;
use crate::CoreError;
use berth_runtime::{
    required_variables, Compose, EnvVars, Mutagen, ProcessRunner, DOCKER_PHP_IMAGE,
};
use berth_schema::{
    is_absolute_location, validate_domains, validate_env_name, Environment, EnvironmentType,
    Settings,
};
use berth_store::{FileRegistry, Registry, StoreLayout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Operator input for a new environment.
#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub name: String,
    pub location: PathBuf,
    pub env_type: EnvironmentType,
    /// Falls back to the configured default PHP image.
    pub php_version: Option<String>,
    pub domains: Option<String>,
}

/// New configuration for an installed environment.
#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    /// `None` keeps the image currently recorded in the environment's `.env`.
    pub php_version: Option<String>,
    /// Replaces the stored domains; `None` clears them.
    pub domains: Option<String>,
}

/// Command-level facade over the registry, the external tools, and the
/// lifecycle orchestrator.
///
/// Every mutating operation holds the store lock from registry load to save,
/// so concurrent invocations never interleave their transitions.
pub struct Engine {
    layout: StoreLayout,
    settings: Settings,
    runner: Arc<dyn ProcessRunner>,
    prompter: Arc<dyn Prompter>,
}

impl Engine {
    pub fn new(
        store_root: impl Into<PathBuf>,
        settings: Settings,
        runner: Arc<dyn ProcessRunner>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        Self {
            layout: StoreLayout::new(store_root),
            settings,
            runner,
            prompter,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Validate the request, write the configuration files, and register the
    /// environment as inactive.
    pub fn install(&self, request: InstallRequest) -> Result<TransitionReport, CoreError> {
        validate_env_name(&request.name)?;
        if let Some(domains) = request.domains.as_deref() {
            validate_domains(domains)?;
        }
        if !is_absolute_location(&request.location) {
            return Err(CoreError::InvalidConfiguration(format!(
                "location must be an absolute path: {}",
                request.location.display()
            )));
        }
        if !request.location.is_dir() {
            return Err(CoreError::InvalidConfiguration(format!(
                "location is not a directory: {}",
                request.location.display()
            )));
        }

        let _lock = self.lock()?;
        let mut registry = self.open_registry()?;

        let current = registry.find(&request.name).map(|e| EnvState::of(&e));
        validate_transition(&request.name, current, Transition::Install)?;
        if let Some(other) = registry.find_by_location(&request.location) {
            return Err(CoreError::InvalidEnvironment(format!(
                "{} is already used by environment '{}'",
                request.location.display(),
                other.name
            )));
        }

        let environment = Environment::new(
            request.name,
            request.location,
            request.env_type,
            request.domains,
        );
        let php_version = request
            .php_version
            .unwrap_or_else(|| self.settings.default_php_version.clone());
        ConfigurationInstaller::new(&*self.runner).install(&environment, &php_version)?;

        self.orchestrator(&mut registry)
            .dispatch(LifecycleEvent::Installed(environment))
    }

    /// Bring the services up, then let the orchestrator start the sync
    /// session and mark the environment active.
    pub fn start(&self, name: &str) -> Result<TransitionReport, CoreError> {
        let _lock = self.lock()?;
        let mut registry = self.open_registry()?;
        let environment = self.prepare(&registry, name, Transition::Start)?;
        ensure_no_other_active(&registry, name)?;
        let vars = self.variables(&environment)?;

        if !Compose::new(&*self.runner).start_services(&vars)? {
            return Err(CoreError::ExternalTool(format!(
                "unable to start the services of '{name}'"
            )));
        }

        self.orchestrator(&mut registry)
            .dispatch(LifecycleEvent::Started(environment))
    }

    /// Stop the services and the sync session. The environment is marked
    /// inactive even when either step fails.
    pub fn stop(&self, name: &str) -> Result<TransitionReport, CoreError> {
        let _lock = self.lock()?;
        let mut registry = self.open_registry()?;
        let environment = self.prepare(&registry, name, Transition::Stop)?;
        let vars = self.variables(&environment)?;

        let stopped = match Compose::new(&*self.runner).stop_services(&vars) {
            Ok(true) => None,
            Ok(false) => Some(format!("unable to stop the services of '{name}'")),
            Err(e) => Some(format!("unable to stop the services of '{name}': {e}")),
        };
        if let Some(message) = &stopped {
            self.prompter.error(message);
        }

        let mut report = self
            .orchestrator(&mut registry)
            .dispatch(LifecycleEvent::Stopped(environment))?;
        if let Some(message) = stopped {
            report.degraded.insert(
                0,
                DegradedStep {
                    step: "services",
                    message,
                },
            );
        }
        Ok(report)
    }

    pub fn restart(&self, name: &str) -> Result<TransitionReport, CoreError> {
        let _lock = self.lock()?;
        let mut registry = self.open_registry()?;
        let environment = self.prepare(&registry, name, Transition::Restart)?;
        let vars = self.variables(&environment)?;

        if !Compose::new(&*self.runner).restart_services(&vars)? {
            return Err(CoreError::ExternalTool(format!(
                "unable to restart the services of '{name}'"
            )));
        }

        self.orchestrator(&mut registry)
            .dispatch(LifecycleEvent::Restarted(environment))
    }

    /// Remove containers, volumes, and generated configuration, then
    /// unregister. Refused while the environment is active.
    pub fn uninstall(&self, name: &str) -> Result<TransitionReport, CoreError> {
        let _lock = self.lock()?;
        let mut registry = self.open_registry()?;
        let environment = self.prepare(&registry, name, Transition::Uninstall)?;
        let vars = self.variables(&environment)?;

        if !Compose::new(&*self.runner).remove_services(&vars)? {
            return Err(CoreError::ExternalTool(format!(
                "unable to remove the services of '{name}'"
            )));
        }
        ConfigurationInstaller::new(&*self.runner).uninstall(&environment)?;

        self.orchestrator(&mut registry)
            .dispatch(LifecycleEvent::Uninstalled(environment))
    }

    /// Rewrite the configuration of an inactive environment.
    pub fn update(&self, name: &str, request: UpdateRequest) -> Result<Environment, CoreError> {
        if let Some(domains) = request.domains.as_deref() {
            validate_domains(domains)?;
        }

        let _lock = self.lock()?;
        let mut registry = self.open_registry()?;
        let mut environment = self.prepare(&registry, name, Transition::Update)?;

        let php_version = match request.php_version {
            Some(v) => v,
            None => self
                .variables(&environment)?
                .get(DOCKER_PHP_IMAGE)
                .map_or_else(|| self.settings.default_php_version.clone(), str::to_owned),
        };

        environment.set_domains(request.domains);
        ConfigurationInstaller::new(&*self.runner).install(&environment, &php_version)?;

        registry.update(&environment)?;
        registry.save()?;
        info!("updated {name} (php {php_version})");
        Ok(environment)
    }

    pub fn list(&self, only_active: bool) -> Result<Vec<Environment>, CoreError> {
        Ok(self.open_registry()?.list(only_active))
    }

    pub fn find(&self, name: &str) -> Result<Option<Environment>, CoreError> {
        Ok(self.open_registry()?.find(name))
    }

    /// Pick the environment a command applies to: the named one, otherwise the
    /// active one, otherwise the one whose location contains `cwd`.
    pub fn resolve(&self, name: Option<&str>, cwd: &Path) -> Result<Environment, CoreError> {
        let registry = self.open_registry()?;

        if let Some(name) = name {
            return registry
                .find(name)
                .ok_or_else(|| not_installed(name));
        }

        if let Some(active) = registry.list(true).into_iter().next() {
            debug!("using active environment {}", active.name);
            return Ok(active);
        }

        registry
            .list(false)
            .into_iter()
            .filter(|e| cwd.starts_with(&e.location))
            .max_by_key(|e| e.location.components().count())
            .ok_or_else(|| {
                CoreError::InvalidEnvironment(
                    "no environment given, none is running, and the current directory \
                     belongs to no installed environment"
                        .to_owned(),
                )
            })
    }

    pub fn required_variables(&self, name: &str) -> Result<EnvVars, CoreError> {
        let registry = self.open_registry()?;
        let environment = registry.find(name).ok_or_else(|| not_installed(name))?;
        self.variables(&environment)
    }

    /// Hand the terminal to `mutagen monitor` for the environment's session.
    pub fn monitor(&self, name: &str) -> Result<bool, CoreError> {
        let vars = self.required_variables(name)?;
        Ok(Mutagen::new(&*self.runner).monitor(&vars)?)
    }

    fn lock(&self) -> Result<StoreLock, CoreError> {
        StoreLock::acquire(&self.layout)
    }

    fn open_registry(&self) -> Result<FileRegistry, CoreError> {
        Ok(FileRegistry::open(self.layout.clone())?)
    }

    fn prepare(
        &self,
        registry: &FileRegistry,
        name: &str,
        transition: Transition,
    ) -> Result<Environment, CoreError> {
        let environment = registry.find(name);
        validate_transition(name, environment.as_ref().map(EnvState::of), transition)?;
        environment.ok_or_else(|| not_installed(name))
    }

    fn variables(&self, environment: &Environment) -> Result<EnvVars, CoreError> {
        Ok(required_variables(environment, &self.settings.default_php_version)?)
    }

    fn orchestrator<'a>(&'a self, registry: &'a mut FileRegistry) -> Orchestrator<'a> {
        Orchestrator::new(registry, &*self.runner, &*self.prompter, &self.settings)
    }
}

fn not_installed(name: &str) -> CoreError {
    CoreError::InvalidEnvironment(format!("environment '{name}' is not installed"))
}
