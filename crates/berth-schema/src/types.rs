//! The closed set of technology stacks an environment can be installed as.

use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentType {
    Magento2,
    Sylius,
    Symfony,
}

impl EnvironmentType {
    pub const ALL: [EnvironmentType; 3] = [
        EnvironmentType::Magento2,
        EnvironmentType::Sylius,
        EnvironmentType::Symfony,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EnvironmentType::Magento2 => "magento2",
            EnvironmentType::Sylius => "sylius",
            EnvironmentType::Symfony => "symfony",
        }
    }

    /// Document root served by the reverse proxy, relative to the synced project.
    pub fn document_root(self) -> &'static str {
        match self {
            EnvironmentType::Magento2 => "/var/www/html/pub",
            EnvironmentType::Sylius | EnvironmentType::Symfony => "/var/www/html/public",
        }
    }

    /// Default domain offered when the operator asks for a certificate.
    pub fn default_domain(self) -> String {
        format!("{}.localhost", self.as_str())
    }
}

impl fmt::Display for EnvironmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvironmentType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "magento2" => Ok(EnvironmentType::Magento2),
            "sylius" => Ok(EnvironmentType::Sylius),
            "symfony" => Ok(EnvironmentType::Symfony),
            _ => Err(SchemaError::UnknownType(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_types_case_insensitively() {
        assert_eq!(
            "Magento2".parse::<EnvironmentType>().unwrap(),
            EnvironmentType::Magento2
        );
        assert_eq!(
            " sylius ".parse::<EnvironmentType>().unwrap(),
            EnvironmentType::Sylius
        );
        assert_eq!(
            "symfony".parse::<EnvironmentType>().unwrap(),
            EnvironmentType::Symfony
        );
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(matches!(
            "drupal".parse::<EnvironmentType>(),
            Err(SchemaError::UnknownType(_))
        ));
    }

    #[test]
    fn serializes_as_lowercase_string() {
        let json = serde_json::to_string(&EnvironmentType::Magento2).unwrap();
        assert_eq!(json, "\"magento2\"");
        let back: EnvironmentType = serde_json::from_str("\"symfony\"").unwrap();
        assert_eq!(back, EnvironmentType::Symfony);
    }

    #[test]
    fn display_matches_as_str() {
        for ty in EnvironmentType::ALL {
            assert_eq!(ty.to_string(), ty.as_str());
        }
    }

    #[test]
    fn magento_serves_pub_directory() {
        assert_eq!(
            EnvironmentType::Magento2.document_root(),
            "/var/www/html/pub"
        );
        assert_eq!(
            EnvironmentType::Symfony.default_domain(),
            "symfony.localhost"
        );
    }
}
