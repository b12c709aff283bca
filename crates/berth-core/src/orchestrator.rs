//! Event-driven lifecycle handlers.
//!
//! Each [`LifecycleEvent`] is handled by exactly one method that calls the
//! hosts resolver, the synchronization controller, and the registry in a
//! fixed order. A handler that returns an error has not touched the persisted
//! registry; degraded steps are collected in the [`TransitionReport`] instead.

use crate::lifecycle::{validate_transition, EnvState, Transition};
use crate::prompt::Prompter;
use crate::CoreError;
use berth_runtime::{
    required_variables, Compose, EnvVars, HostsResolver, Mutagen, ProcessRunner, RuntimeError,
};
use berth_schema::{Environment, Settings};
use berth_store::Registry;
use serde::Serialize;
use tracing::{debug, info, warn};

const HOSTS_CONFIRMATION: &str = "Do you want to update it automatically? Your password may be \
     requested by the system, but you can also do it yourself afterwards.";

#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    Installed(Environment),
    Started(Environment),
    Stopped(Environment),
    Restarted(Environment),
    Uninstalled(Environment),
}

impl LifecycleEvent {
    pub fn environment(&self) -> &Environment {
        match self {
            LifecycleEvent::Installed(e)
            | LifecycleEvent::Started(e)
            | LifecycleEvent::Stopped(e)
            | LifecycleEvent::Restarted(e)
            | LifecycleEvent::Uninstalled(e) => e,
        }
    }

    pub fn transition(&self) -> Transition {
        match self {
            LifecycleEvent::Installed(_) => Transition::Install,
            LifecycleEvent::Started(_) => Transition::Start,
            LifecycleEvent::Stopped(_) => Transition::Stop,
            LifecycleEvent::Restarted(_) => Transition::Restart,
            LifecycleEvent::Uninstalled(_) => Transition::Uninstall,
        }
    }
}

/// A step that failed without aborting its transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegradedStep {
    pub step: &'static str,
    pub message: String,
}

/// Outcome of one handled event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionReport {
    pub environment: String,
    pub transition: String,
    pub active: bool,
    pub degraded: Vec<DegradedStep>,
}

impl TransitionReport {
    fn new(environment: &Environment, transition: Transition) -> Self {
        Self {
            environment: environment.name.clone(),
            transition: transition.to_string(),
            active: environment.is_active(),
            degraded: Vec::new(),
        }
    }

    /// True when every step of the transition succeeded.
    pub fn succeeded(&self) -> bool {
        self.degraded.is_empty()
    }

    pub(crate) fn degrade(&mut self, step: &'static str, message: impl Into<String>) {
        let message = message.into();
        warn!("{}: {step} degraded: {message}", self.environment);
        self.degraded.push(DegradedStep { step, message });
    }
}

/// Refuse to activate `name` while any other environment is active.
pub(crate) fn ensure_no_other_active(registry: &dyn Registry, name: &str) -> Result<(), CoreError> {
    match registry.list(true).into_iter().find(|e| e.name != name) {
        Some(other) => Err(CoreError::InvalidEnvironment(format!(
            "environment '{}' is already running; stop it before starting '{name}'",
            other.name
        ))),
        None => Ok(()),
    }
}

pub struct Orchestrator<'a> {
    registry: &'a mut dyn Registry,
    runner: &'a dyn ProcessRunner,
    prompter: &'a dyn Prompter,
    settings: &'a Settings,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        registry: &'a mut dyn Registry,
        runner: &'a dyn ProcessRunner,
        prompter: &'a dyn Prompter,
        settings: &'a Settings,
    ) -> Self {
        Self {
            registry,
            runner,
            prompter,
            settings,
        }
    }

    /// Validate `event` against the registered state and run its handler.
    pub fn dispatch(&mut self, event: LifecycleEvent) -> Result<TransitionReport, CoreError> {
        let name = event.environment().name.clone();
        let transition = event.transition();
        let current = self.registry.find(&name).map(|e| EnvState::of(&e));
        validate_transition(&name, current, transition)?;
        info!("{transition} {name}");

        match event {
            LifecycleEvent::Installed(env) => self.on_install(env),
            LifecycleEvent::Started(env) => self.on_start(env),
            LifecycleEvent::Stopped(env) => self.on_stop(env),
            LifecycleEvent::Restarted(env) => self.on_restart(&env),
            LifecycleEvent::Uninstalled(env) => self.on_uninstall(&env),
        }
    }

    /// Offer to map the declared domains to loopback, then register the
    /// environment. Hosts file problems never abort the install.
    pub fn on_install(&mut self, environment: Environment) -> Result<TransitionReport, CoreError> {
        let mut report = TransitionReport::new(&environment, Transition::Install);

        if let Some(domains) = environment.domains.as_deref() {
            self.ensure_hosts_entries(domains, &mut report);
        }

        self.registry.add(environment)?;
        self.registry.save()?;
        Ok(report)
    }

    pub fn on_start(&mut self, mut environment: Environment) -> Result<TransitionReport, CoreError> {
        ensure_no_other_active(&*self.registry, &environment.name)?;
        let vars = self.variables(&environment)?;
        let mut report = TransitionReport::new(&environment, Transition::Start);

        let fixed = Compose::new(self.runner).fix_shared_agent_permissions(&vars);
        self.check(
            &mut report,
            "permissions",
            fixed,
            "An error occurred while trying to fix the permissions on the shared SSH agent.",
        );

        let synced = Mutagen::new(self.runner).start(&vars);
        self.check(
            &mut report,
            "synchronization",
            synced,
            "Unable to start the Docker synchronization.",
        );

        environment.activate();
        report.active = true;
        self.registry.update(&environment)?;
        self.registry.save()?;
        Ok(report)
    }

    pub fn on_stop(&mut self, mut environment: Environment) -> Result<TransitionReport, CoreError> {
        let vars = self.variables(&environment)?;
        let mut report = TransitionReport::new(&environment, Transition::Stop);

        let paused = Mutagen::new(self.runner).stop(&vars);
        self.check(
            &mut report,
            "synchronization",
            paused,
            "Unable to stop the Docker synchronization.",
        );

        environment.deactivate();
        report.active = false;
        self.registry.update(&environment)?;
        self.registry.save()?;
        Ok(report)
    }

    /// Pause then resume the sync session. Leaves the registry untouched.
    pub fn on_restart(&mut self, environment: &Environment) -> Result<TransitionReport, CoreError> {
        let vars = self.variables(environment)?;
        let mut report = TransitionReport::new(environment, Transition::Restart);
        let mutagen = Mutagen::new(self.runner);

        let restarted = match mutagen.stop(&vars) {
            Ok(true) => mutagen.start(&vars),
            Ok(false) => {
                debug!("pause failed, not resuming the session");
                Ok(false)
            }
            Err(e) => Err(e),
        };
        self.check(
            &mut report,
            "synchronization",
            restarted,
            "Unable to restart the Docker synchronization.",
        );
        Ok(report)
    }

    /// Remove the sync session and unregister the environment.
    pub fn on_uninstall(&mut self, environment: &Environment) -> Result<TransitionReport, CoreError> {
        let vars = self.variables(environment)?;
        let mut report = TransitionReport::new(environment, Transition::Uninstall);

        let removed = Mutagen::new(self.runner).remove(&vars);
        self.check(
            &mut report,
            "synchronization",
            removed,
            "Unable to remove the Docker synchronization.",
        );

        self.registry.remove(&environment.name)?;
        self.registry.save()?;
        Ok(report)
    }

    fn variables(&self, environment: &Environment) -> Result<EnvVars, CoreError> {
        Ok(required_variables(environment, &self.settings.default_php_version)?)
    }

    fn ensure_hosts_entries(&self, domains: &str, report: &mut TransitionReport) {
        let hosts = HostsResolver::new(&self.settings.hosts_file, self.runner);

        let outcome = match hosts.has_domains(domains) {
            Ok(true) => {
                debug!("hosts file already maps {domains}");
                return;
            }
            Ok(false) => {
                self.prompter.warn(&format!(
                    "Your hosts file does not contain the \"127.0.0.1 {domains}\" entry."
                ));
                if !self.prompter.confirm(HOSTS_CONFIRMATION, false) {
                    return;
                }
                hosts.fix_hosts_file(domains)
            }
            Err(e) => Err(e),
        };

        if let Err(e) = outcome {
            self.prompter
                .error("Unable to check whether the custom domains are defined in your hosts file.");
            report.degrade("hosts", e.to_string());
        }
    }

    fn check(
        &self,
        report: &mut TransitionReport,
        step: &'static str,
        outcome: Result<bool, RuntimeError>,
        message: &str,
    ) {
        match outcome {
            Ok(true) => {}
            Ok(false) => {
                self.prompter.error(message);
                report.degrade(step, message);
            }
            Err(e) => {
                self.prompter.error(message);
                report.degrade(step, format!("{message} ({e})"));
            }
        }
    }
}
