//! External tool integration for Berth environments.
//!
//! This crate implements the execution layer: the `ProcessRunner` contract with a
//! real `SystemRunner` and a recording `MockRunner`, the mutagen synchronization
//! controller, the `docker compose` controller and environment-variable
//! derivation, the hosts file resolver, the mkcert certificate wrapper, and
//! prerequisite checking.

pub mod compose;
pub mod hosts;
pub mod mkcert;
pub mod mock;
pub mod prereq;
pub mod process;
pub mod sync;

pub use compose::{required_variables, Compose};
pub use hosts::HostsResolver;
pub use mkcert::Mkcert;
pub use mock::{MockResponse, MockRunner, RecordedCall};
pub use prereq::{
    can_make_trusted_certificates, check_lifecycle_prereqs, format_missing, MissingPrereq,
};
pub use process::{
    EnvVars, ProcessOutput, ProcessRunner, RunMode, SystemRunner, COMPOSE_FILE,
    COMPOSE_PROJECT_NAME, DOCKER_PHP_IMAGE, PROJECT_LOCATION,
};
pub use sync::Mutagen;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("required variable {0} is empty")]
    MissingVariable(&'static str),
    #[error("operation not supported on {0}")]
    UnsupportedPlatform(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("runtime execution failed: {0}")]
    ExecFailed(String),
}
