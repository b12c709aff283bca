use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// PHP image tag used when neither the operator nor the environment's `.env`
/// names one.
pub const DEFAULT_PHP_VERSION: &str = "latest";

const DEFAULT_HOSTS_FILE: &str = "/etc/hosts";

/// Operator settings, read from `~/.config/berth/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default = "default_php_version")]
    pub default_php_version: String,
    #[serde(default = "default_hosts_file")]
    pub hosts_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_php_version: default_php_version(),
            hosts_file: default_hosts_file(),
        }
    }
}

fn default_php_version() -> String {
    DEFAULT_PHP_VERSION.to_owned()
}

fn default_hosts_file() -> PathBuf {
    PathBuf::from(DEFAULT_HOSTS_FILE)
}

impl Settings {
    pub fn parse(input: &str) -> Result<Self, SchemaError> {
        Ok(toml::from_str(input)?)
    }

    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load from `path` when given, otherwise from the default location.
    /// A missing default file yields the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, SchemaError> {
        if let Some(p) = path {
            return Self::load(p);
        }
        match default_settings_path() {
            Some(p) if p.exists() => Self::load(&p),
            _ => Ok(Self::default()),
        }
    }
}

pub fn default_settings_path() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".config/berth/config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.default_php_version, "latest");
        assert_eq!(settings.hosts_file, PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn parses_overrides() {
        let settings = Settings::parse(
            r#"
default_php_version = "8.2"
hosts_file = "/tmp/hosts"
"#,
        )
        .unwrap();
        assert_eq!(settings.default_php_version, "8.2");
        assert_eq!(settings.hosts_file, PathBuf::from("/tmp/hosts"));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(Settings::parse("registry = \"x\"").is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Settings::load_or_default(Some(&missing)),
            Err(SchemaError::Io(_))
        ));
    }

    #[test]
    fn loads_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_php_version = \"8.1\"\n").unwrap();
        let settings = Settings::load_or_default(Some(&path)).unwrap();
        assert_eq!(settings.default_php_version, "8.1");
    }
}
