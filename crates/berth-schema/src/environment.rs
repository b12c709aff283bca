use crate::types::EnvironmentType;
use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory, relative to the project location, that holds the generated
/// compose file, proxy configuration, and TLS material.
pub const INSTALLATION_DIRECTORY: &str = "var/docker";

/// A registered local development environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Environment {
    pub name: String,
    pub location: PathBuf,
    #[serde(rename = "type")]
    pub env_type: EnvironmentType,
    /// Space-separated hostnames covered by the local certificate.
    #[serde(default)]
    pub domains: Option<String>,
    #[serde(default)]
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Environment {
    /// Build a new, inactive environment. Blank domain input is stored as `None`.
    pub fn new(
        name: impl Into<String>,
        location: impl Into<PathBuf>,
        env_type: EnvironmentType,
        domains: Option<String>,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            name: name.into(),
            location: location.into(),
            env_type,
            domains: normalize_domains(domains),
            active: false,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn activate(&mut self) {
        self.active = true;
        self.touch();
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.touch();
    }

    pub fn set_domains(&mut self, domains: Option<String>) {
        self.domains = normalize_domains(domains);
        self.touch();
    }

    pub fn domain_list(&self) -> Vec<&str> {
        self.domains.as_deref().map(split_domains).unwrap_or_default()
    }

    pub fn installation_dir(&self) -> PathBuf {
        self.location.join(INSTALLATION_DIRECTORY)
    }

    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

fn normalize_domains(domains: Option<String>) -> Option<String> {
    domains
        .map(|d| split_domains(&d).join(" "))
        .filter(|d| !d.is_empty())
}

pub fn split_domains(domains: &str) -> Vec<&str> {
    domains.split_whitespace().collect()
}

/// Environment names double as the compose project name, so they follow the
/// rules `docker compose` applies to `COMPOSE_PROJECT_NAME`.
pub fn validate_env_name(name: &str) -> Result<(), SchemaError> {
    if name.is_empty() || name.len() > 64 {
        return Err(SchemaError::InvalidName(
            "environment name must be 1-64 characters".to_owned(),
        ));
    }
    let valid_byte = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    let mut bytes = name.bytes();
    let first_ok = bytes.next().is_some_and(valid_byte);
    if !first_ok || !bytes.all(|b| valid_byte(b) || b == b'_' || b == b'-') {
        return Err(SchemaError::InvalidName(
            "environment name must match [a-z0-9][a-z0-9_-]*".to_owned(),
        ));
    }
    Ok(())
}

/// Validate a space-separated list of hostnames. A top-level domain is not
/// required, so `localhost`-style names are accepted.
pub fn validate_domains(domains: &str) -> Result<(), SchemaError> {
    let list = split_domains(domains);
    if list.is_empty() {
        return Err(SchemaError::InvalidDomain {
            domain: domains.to_owned(),
            reason: "at least one hostname is required".to_owned(),
        });
    }
    for domain in list {
        validate_hostname(domain)?;
    }
    Ok(())
}

fn validate_hostname(host: &str) -> Result<(), SchemaError> {
    let invalid = |reason: &str| SchemaError::InvalidDomain {
        domain: host.to_owned(),
        reason: reason.to_owned(),
    };

    if host.len() > 253 {
        return Err(invalid("hostname exceeds 253 characters"));
    }
    for label in host.split('.') {
        if label.is_empty() || label.len() > 63 {
            return Err(invalid("each label must be 1-63 characters"));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(invalid("labels must not start or end with '-'"));
        }
        if !label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
            return Err(invalid("labels must match [a-zA-Z0-9-]"));
        }
    }
    Ok(())
}

/// True when `location` is an absolute path. Relative locations would make the
/// sync session depend on the caller's working directory.
pub fn is_absolute_location(location: &Path) -> bool {
    location.is_absolute()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_environment_is_inactive() {
        let env = Environment::new("shop", "/srv/shop", EnvironmentType::Magento2, None);
        assert!(!env.is_active());
        assert_eq!(env.created_at, env.updated_at);
    }

    #[test]
    fn activation_toggles_flag() {
        let mut env = Environment::new("shop", "/srv/shop", EnvironmentType::Magento2, None);
        env.activate();
        assert!(env.is_active());
        env.deactivate();
        assert!(!env.is_active());
    }

    #[test]
    fn blank_domains_are_dropped() {
        let env = Environment::new(
            "shop",
            "/srv/shop",
            EnvironmentType::Magento2,
            Some("   ".to_owned()),
        );
        assert_eq!(env.domains, None);
        assert!(env.domain_list().is_empty());
    }

    #[test]
    fn domains_are_whitespace_normalized() {
        let env = Environment::new(
            "shop",
            "/srv/shop",
            EnvironmentType::Magento2,
            Some(" www.shop.localhost   shop.localhost ".to_owned()),
        );
        assert_eq!(
            env.domains.as_deref(),
            Some("www.shop.localhost shop.localhost")
        );
        assert_eq!(
            env.domain_list(),
            vec!["www.shop.localhost", "shop.localhost"]
        );
    }

    #[test]
    fn installation_dir_is_under_location() {
        let env = Environment::new("shop", "/srv/shop", EnvironmentType::Sylius, None);
        assert_eq!(env.installation_dir(), PathBuf::from("/srv/shop/var/docker"));
    }

    #[test]
    fn serializes_type_field_name() {
        let env = Environment::new("shop", "/srv/shop", EnvironmentType::Symfony, None);
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["type"], "symfony");
        assert_eq!(json["active"], false);
        assert!(json["domains"].is_null());
    }

    #[test]
    fn valid_names() {
        assert!(validate_env_name("shop").is_ok());
        assert!(validate_env_name("my-shop_2").is_ok());
    }

    #[test]
    fn invalid_names() {
        assert!(validate_env_name("").is_err());
        assert!(validate_env_name("my shop").is_err());
        assert!(validate_env_name("shop/../etc").is_err());
        assert!(validate_env_name(&"a".repeat(65)).is_err());
    }

    #[test]
    fn names_follow_compose_project_rules() {
        assert!(validate_env_name("2shop").is_ok());
        assert!(validate_env_name("My-Shop").is_err());
        assert!(validate_env_name("SHOP").is_err());
        assert!(validate_env_name("-x").is_err());
        assert!(validate_env_name("_shop").is_err());
    }

    #[test]
    fn accepts_hostnames_without_tld() {
        assert!(validate_domains("localhost").is_ok());
        assert!(validate_domains("shop.localhost www.shop.localhost").is_ok());
    }

    #[test]
    fn rejects_malformed_hostnames() {
        assert!(validate_domains("").is_err());
        assert!(validate_domains("shop..localhost").is_err());
        assert!(validate_domains("-shop.localhost").is_err());
        assert!(validate_domains("shop_1.localhost").is_err());
        assert!(validate_domains("ok.localhost bad!.localhost").is_err());
    }

    #[test]
    fn absolute_location_check() {
        assert!(is_absolute_location(Path::new("/srv/shop")));
        assert!(!is_absolute_location(Path::new("shop")));
    }
}
