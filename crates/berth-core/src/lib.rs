//! Core orchestration for the Berth environment lifecycle.
//!
//! This crate ties together the schema, the registry, and the external tool
//! controllers. The `Orchestrator` reacts to one `LifecycleEvent` at a time and
//! sequences hosts file checks, file synchronization, and registry mutations,
//! deciding which failures are fatal. The `Engine` is the command-level facade
//! used by the CLI: it validates requests, takes the store lock, drives the
//! compose services and the `ConfigurationInstaller`, and dispatches events.

pub mod concurrency;
pub mod engine;
pub mod installer;
pub mod lifecycle;
pub mod orchestrator;
pub mod prompt;
mod templates;

pub use concurrency::{install_signal_handler, interrupted, StoreLock};
pub use engine::{Engine, InstallRequest, UpdateRequest};
pub use installer::ConfigurationInstaller;
pub use lifecycle::{validate_transition, EnvState, Transition};
pub use orchestrator::{DegradedStep, LifecycleEvent, Orchestrator, TransitionReport};
pub use prompt::{Prompter, Unattended};

use berth_runtime::RuntimeError;
use berth_schema::SchemaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid environment: {0}")]
    InvalidEnvironment(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),
    #[error("filesystem error: {0}")]
    Filesystem(String),
    #[error("external tool failed: {0}")]
    ExternalTool(String),
    #[error("registry error: {0}")]
    Registry(#[from] berth_store::StoreError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SchemaError> for CoreError {
    fn from(e: SchemaError) -> Self {
        CoreError::InvalidConfiguration(e.to_string())
    }
}

impl From<RuntimeError> for CoreError {
    fn from(e: RuntimeError) -> Self {
        match e {
            RuntimeError::UnsupportedPlatform(os) => CoreError::UnsupportedPlatform(os),
            RuntimeError::MissingVariable(_) => CoreError::InvalidEnvironment(e.to_string()),
            other => CoreError::ExternalTool(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variable_becomes_invalid_environment() {
        let e: CoreError = RuntimeError::MissingVariable("COMPOSE_PROJECT_NAME").into();
        assert!(matches!(e, CoreError::InvalidEnvironment(_)));
    }

    #[test]
    fn spawn_failure_becomes_external_tool() {
        let e: CoreError = RuntimeError::Spawn {
            program: "docker".to_owned(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
        .into();
        assert!(matches!(e, CoreError::ExternalTool(msg) if msg.contains("docker")));
    }

    #[test]
    fn platform_error_is_preserved() {
        let e: CoreError = RuntimeError::UnsupportedPlatform("windows".to_owned()).into();
        assert!(matches!(e, CoreError::UnsupportedPlatform(os) if os == "windows"));
    }

    #[test]
    fn schema_error_becomes_invalid_configuration() {
        let e: CoreError = SchemaError::InvalidName("bad name".to_owned()).into();
        assert!(matches!(e, CoreError::InvalidConfiguration(_)));
    }
}
