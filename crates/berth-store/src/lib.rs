//! Durable environment registry for Berth.
//!
//! This crate provides the storage layer: `StoreLayout` for the on-disk directory
//! structure and format version marker, and the `Registry` trait with its
//! `FileRegistry` implementation, a JSON catalog of environments that is mutated
//! in memory and flushed atomically (temp file, fsync, rename) on `save()`.

pub mod layout;
pub mod registry;

pub use layout::{StoreLayout, STORE_FORMAT_VERSION};
pub use registry::{FileRegistry, Registry};

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Fsync a directory to ensure that a preceding `rename()` is durable.
///
/// POSIX does not guarantee a rename survives a crash until the parent
/// directory itself has been synced.
pub(crate) fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = std::fs::File::open(dir)?;
    f.sync_all()
}

/// Replace `dest` with `content` so readers see either the old or the new file.
pub(crate) fn write_atomic(dest: &Path, content: &[u8]) -> Result<(), StoreError> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| StoreError::Io(e.error))?;
    fsync_dir(dir)?;
    Ok(())
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("registry integrity check failed: expected checksum {expected}, got {actual}")]
    IntegrityFailure { expected: String, actual: String },
    #[error("environment not found: {0}")]
    EnvNotFound(String),
    #[error("store format version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("an environment named '{0}' is already registered")]
    NameConflict(String),
}
