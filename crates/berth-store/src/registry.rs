use crate::layout::StoreLayout;
use crate::{write_atomic, StoreError};
use berth_schema::Environment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// The durable catalog of known environments.
///
/// Mutations are held in memory until [`save`](Registry::save) flushes them
/// in one atomic write, so a transition that fails before saving leaves the
/// persisted catalog untouched.
pub trait Registry {
    fn add(&mut self, environment: Environment) -> Result<(), StoreError>;

    /// Replace the stored record that has the same name.
    fn update(&mut self, environment: &Environment) -> Result<(), StoreError>;

    fn remove(&mut self, name: &str) -> Result<Environment, StoreError>;

    fn find(&self, name: &str) -> Option<Environment>;

    /// All environments sorted by name, optionally restricted to active ones.
    fn list(&self, only_active: bool) -> Vec<Environment>;

    fn save(&mut self) -> Result<(), StoreError>;

    fn find_by_location(&self, location: &Path) -> Option<Environment> {
        self.list(false)
            .into_iter()
            .find(|e| e.location.as_path() == location)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RegistryDocument {
    environments: Vec<Environment>,
    /// blake3 over the pretty-printed `environments` array.
    checksum: String,
}

fn compute_checksum(environments: &[Environment]) -> Result<String, StoreError> {
    let json = serde_json::to_string_pretty(environments)?;
    Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
}

/// JSON-file backed [`Registry`] stored at `<store>/registry.json`.
pub struct FileRegistry {
    layout: StoreLayout,
    entries: BTreeMap<String, Environment>,
    dirty: bool,
}

impl FileRegistry {
    /// Open the registry under `layout`, creating the store on first use.
    pub fn open(layout: StoreLayout) -> Result<Self, StoreError> {
        layout.initialize()?;
        let entries = Self::load(&layout.registry_file())?;
        debug!("loaded {} registered environments", entries.len());
        Ok(Self {
            layout,
            entries,
            dirty: false,
        })
    }

    fn load(path: &Path) -> Result<BTreeMap<String, Environment>, StoreError> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(path)?;
        let doc: RegistryDocument = serde_json::from_str(&content)?;

        let actual = compute_checksum(&doc.environments)?;
        if actual != doc.checksum {
            return Err(StoreError::IntegrityFailure {
                expected: doc.checksum,
                actual,
            });
        }

        Ok(doc
            .environments
            .into_iter()
            .map(|e| (e.name.clone(), e))
            .collect())
    }

    /// Whether in-memory mutations are waiting for [`Registry::save`].
    pub fn has_pending_changes(&self) -> bool {
        self.dirty
    }
}

impl Registry for FileRegistry {
    fn add(&mut self, environment: Environment) -> Result<(), StoreError> {
        if self.entries.contains_key(&environment.name) {
            return Err(StoreError::NameConflict(environment.name));
        }
        self.entries.insert(environment.name.clone(), environment);
        self.dirty = true;
        Ok(())
    }

    fn update(&mut self, environment: &Environment) -> Result<(), StoreError> {
        let slot = self
            .entries
            .get_mut(&environment.name)
            .ok_or_else(|| StoreError::EnvNotFound(environment.name.clone()))?;
        *slot = environment.clone();
        self.dirty = true;
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<Environment, StoreError> {
        let removed = self
            .entries
            .remove(name)
            .ok_or_else(|| StoreError::EnvNotFound(name.to_owned()))?;
        self.dirty = true;
        Ok(removed)
    }

    fn find(&self, name: &str) -> Option<Environment> {
        self.entries.get(name).cloned()
    }

    fn list(&self, only_active: bool) -> Vec<Environment> {
        self.entries
            .values()
            .filter(|e| !only_active || e.active)
            .cloned()
            .collect()
    }

    fn save(&mut self) -> Result<(), StoreError> {
        let environments: Vec<Environment> = self.entries.values().cloned().collect();
        let doc = RegistryDocument {
            checksum: compute_checksum(&environments)?,
            environments,
        };
        let content = serde_json::to_string_pretty(&doc)?;
        write_atomic(&self.layout.registry_file(), content.as_bytes())?;
        self.dirty = false;
        debug!("registry saved ({} environments)", self.entries.len());
        Ok(())
    }
}
