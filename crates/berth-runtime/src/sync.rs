//! Two-way file synchronization between the project tree and its container,
//! driven through the `mutagen` CLI.

use crate::process::{EnvVars, ProcessRunner, RunMode};
use crate::RuntimeError;
use tracing::{debug, info};

const MUTAGEN: &str = "mutagen";
const DEFAULT_CONTAINER_UID: &str = "id:1000";
const DEFAULT_CONTAINER_GID: &str = "id:1000";
const CONTAINER_SOURCE_PATH: &str = "/var/www/html/";

pub struct Mutagen<'r> {
    runner: &'r dyn ProcessRunner,
}

impl<'r> Mutagen<'r> {
    pub fn new(runner: &'r dyn ProcessRunner) -> Self {
        Self { runner }
    }

    /// Resume the session labelled with the project name, or create it when
    /// no such session exists yet.
    pub fn start(&self, vars: &EnvVars) -> Result<bool, RuntimeError> {
        let project = vars.project_name()?;
        let location = vars.project_location()?;

        let command = if self.has_session(project, vars)? {
            info!("resuming synchronization session for {project}");
            vec![MUTAGEN.to_owned(), "resume".to_owned(), selector(project)]
        } else {
            info!("creating synchronization session for {project}");
            create_command(project, location)
        };

        Ok(self.runner.run(&command, vars, RunMode::Foreground)?.success)
    }

    pub fn stop(&self, vars: &EnvVars) -> Result<bool, RuntimeError> {
        let project = vars.project_name()?;
        let command = vec![MUTAGEN.to_owned(), "pause".to_owned(), selector(project)];
        Ok(self.runner.run(&command, vars, RunMode::Foreground)?.success)
    }

    /// Tear the session down entirely, discarding its state.
    pub fn remove(&self, vars: &EnvVars) -> Result<bool, RuntimeError> {
        let project = vars.project_name()?;
        let command = vec![
            MUTAGEN.to_owned(),
            "terminate".to_owned(),
            selector(project),
        ];
        Ok(self.runner.run(&command, vars, RunMode::Foreground)?.success)
    }

    /// Live status display of the sessions; returns when the operator quits it.
    pub fn monitor(&self, vars: &EnvVars) -> Result<bool, RuntimeError> {
        let command = vec![MUTAGEN.to_owned(), "monitor".to_owned()];
        Ok(self.runner.run(&command, vars, RunMode::Foreground)?.success)
    }

    fn has_session(&self, project: &str, vars: &EnvVars) -> Result<bool, RuntimeError> {
        let command = vec![MUTAGEN.to_owned(), "list".to_owned(), selector(project)];
        let output = self.runner.run(&command, vars, RunMode::Background)?;
        let exists = !output.stdout.trim().is_empty();
        debug!("session probe for {project}: exists={exists}");
        Ok(exists)
    }
}

fn selector(project: &str) -> String {
    format!("--label-selector=name={project}")
}

fn create_command(project: &str, location: &str) -> Vec<String> {
    vec![
        MUTAGEN.to_owned(),
        "create".to_owned(),
        format!("--default-owner-beta={DEFAULT_CONTAINER_UID}"),
        format!("--default-group-beta={DEFAULT_CONTAINER_GID}"),
        "--sync-mode=two-way-resolved".to_owned(),
        "--ignore-vcs".to_owned(),
        "--ignore=\".idea\"".to_owned(),
        format!("--label=name={project}"),
        location.to_owned(),
        format!("docker://{project}_synchro{CONTAINER_SOURCE_PATH}"),
    ]
}
