//! Technology detection from a project's Composer manifest.

use crate::types::EnvironmentType;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
struct ComposerManifest {
    #[serde(default)]
    require: BTreeMap<String, serde_json::Value>,
}

// Checked in order: Sylius and Magento projects also require Symfony packages.
const SIGNATURES: &[(&str, EnvironmentType)] = &[
    ("magento/product-community-edition", EnvironmentType::Magento2),
    ("magento/product-enterprise-edition", EnvironmentType::Magento2),
    ("magento/magento2-base", EnvironmentType::Magento2),
    ("sylius/sylius", EnvironmentType::Sylius),
    ("symfony/framework-bundle", EnvironmentType::Symfony),
];

/// Guess the technology stack of the project at `location`.
///
/// Returns `None` when there is no readable `composer.json` or when none of
/// its requirements identify a supported stack.
pub fn identify_type(location: &Path) -> Option<EnvironmentType> {
    let content = std::fs::read_to_string(location.join("composer.json")).ok()?;
    let manifest: ComposerManifest = serde_json::from_str(&content).ok()?;

    SIGNATURES
        .iter()
        .find(|(package, _)| manifest.require.contains_key(*package))
        .map(|(_, ty)| *ty)
}
