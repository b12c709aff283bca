use crate::{write_atomic, StoreError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current store format version. Incremented on incompatible layout changes.
pub const STORE_FORMAT_VERSION: u32 = 1;
const VERSION_FILE: &str = "version";

/// Directory layout for the Berth data store.
///
/// Holds the environment registry, the store lock, and the format version
/// marker. The root is created lazily on [`initialize`](Self::initialize).
#[derive(Debug, Clone)]
pub struct StoreLayout {
    root: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreVersion {
    format_version: u32,
}

impl StoreLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn registry_file(&self) -> PathBuf {
        self.root.join("registry.json")
    }

    #[inline]
    pub fn lock_file(&self) -> PathBuf {
        self.root.join(".lock")
    }

    #[inline]
    fn version_file(&self) -> PathBuf {
        self.root.join(VERSION_FILE)
    }

    pub fn is_initialized(&self) -> bool {
        self.version_file().exists()
    }

    pub fn initialize(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)?;

        if self.version_file().exists() {
            self.verify_version()?;
        } else {
            let ver = StoreVersion {
                format_version: STORE_FORMAT_VERSION,
            };
            let content = serde_json::to_string_pretty(&ver)?;
            write_atomic(&self.version_file(), content.as_bytes())?;
        }

        Ok(())
    }

    pub fn verify_version(&self) -> Result<(), StoreError> {
        let content = fs::read_to_string(self.version_file())?;
        let ver: StoreVersion = serde_json::from_str(&content)?;

        if ver.format_version != STORE_FORMAT_VERSION {
            return Err(StoreError::VersionMismatch {
                expected: STORE_FORMAT_VERSION,
                found: ver.format_version,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths_are_correct() {
        let layout = StoreLayout::new("/tmp/berth-test");
        assert_eq!(
            layout.registry_file(),
            PathBuf::from("/tmp/berth-test/registry.json")
        );
        assert_eq!(layout.lock_file(), PathBuf::from("/tmp/berth-test/.lock"));
    }

    #[test]
    fn initialize_writes_version() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path().join("store"));
        assert!(!layout.is_initialized());
        layout.initialize().unwrap();
        assert!(layout.is_initialized());
        layout.verify_version().unwrap();
    }

    #[test]
    fn initialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        layout.initialize().unwrap();
        layout.initialize().unwrap();
        layout.verify_version().unwrap();
    }

    #[test]
    fn foreign_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        fs::write(dir.path().join(VERSION_FILE), r#"{"format_version": 99}"#).unwrap();
        assert!(matches!(
            layout.initialize(),
            Err(StoreError::VersionMismatch {
                expected: STORE_FORMAT_VERSION,
                found: 99
            })
        ));
    }
}
