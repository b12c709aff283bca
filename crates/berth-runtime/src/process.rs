use crate::RuntimeError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::process::{Command, Stdio};
use tracing::debug;

pub const COMPOSE_FILE: &str = "COMPOSE_FILE";
pub const COMPOSE_PROJECT_NAME: &str = "COMPOSE_PROJECT_NAME";
pub const DOCKER_PHP_IMAGE: &str = "DOCKER_PHP_IMAGE";
pub const PROJECT_LOCATION: &str = "PROJECT_LOCATION";

/// Variables exported to every external tool invocation for one environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvVars(BTreeMap<String, String>);

impl EnvVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The project name labelling containers and the sync session. Empty or
    /// unset is an error, never a blank label.
    pub fn project_name(&self) -> Result<&str, RuntimeError> {
        self.non_empty(COMPOSE_PROJECT_NAME)
    }

    pub fn project_location(&self) -> Result<&str, RuntimeError> {
        self.non_empty(PROJECT_LOCATION)
    }

    fn non_empty(&self, key: &'static str) -> Result<&str, RuntimeError> {
        match self.get(key) {
            Some(v) if !v.trim().is_empty() => Ok(v),
            _ => Err(RuntimeError::MissingVariable(key)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    /// Output streams to the operator's terminal.
    Foreground,
    /// Output is captured silently; used for state probes.
    Background,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOutput {
    pub success: bool,
    pub stdout: String,
}

impl ProcessOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            stdout: String::new(),
        }
    }
}

/// Runs an external command with extra environment variables, blocking until
/// it exits. There is no timeout.
pub trait ProcessRunner: Send + Sync {
    fn run(
        &self,
        argv: &[String],
        env: &EnvVars,
        mode: RunMode,
    ) -> Result<ProcessOutput, RuntimeError>;
}

pub(crate) fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| (*s).to_owned()).collect()
}

/// [`ProcessRunner`] backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for SystemRunner {
    fn run(
        &self,
        argv: &[String],
        env: &EnvVars,
        mode: RunMode,
    ) -> Result<ProcessOutput, RuntimeError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| RuntimeError::ExecFailed("empty command".to_owned()))?;
        debug!("running ({mode:?}): {}", argv.join(" "));

        let mut cmd = Command::new(program);
        cmd.args(args);
        for (key, value) in env.iter() {
            cmd.env(key, value);
        }

        let spawn_err = |source| RuntimeError::Spawn {
            program: program.clone(),
            source,
        };

        match mode {
            RunMode::Foreground => {
                let status = cmd
                    .stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .map_err(spawn_err)?;
                debug!("{program} exited with {status}");
                Ok(ProcessOutput {
                    success: status.success(),
                    stdout: String::new(),
                })
            }
            RunMode::Background => {
                let output = cmd.stdin(Stdio::null()).output().map_err(spawn_err)?;
                debug!("{program} exited with {}", output.status);
                Ok(ProcessOutput {
                    success: output.status.success(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                })
            }
        }
    }
}
