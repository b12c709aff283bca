//! Environment model, input validation, and settings for Berth.
//!
//! This crate defines the schema layer: the `Environment` record persisted by the
//! registry, the closed set of supported technology stacks (`EnvironmentType`),
//! name and domain validation, technology detection from a project's
//! `composer.json`, and the operator settings file (`Settings`).

pub mod detect;
pub mod environment;
pub mod settings;
pub mod types;

pub use detect::identify_type;
pub use environment::{
    is_absolute_location, split_domains, validate_domains, validate_env_name, Environment,
    INSTALLATION_DIRECTORY,
};
pub use settings::{Settings, DEFAULT_PHP_VERSION};
pub use types::EnvironmentType;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid environment name: {0}")]
    InvalidName(String),
    #[error("invalid domain '{domain}': {reason}")]
    InvalidDomain { domain: String, reason: String },
    #[error("unknown environment type '{0}' (expected: magento2, sylius, symfony)")]
    UnknownType(String),
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    ParseToml(#[from] toml::de::Error),
}
