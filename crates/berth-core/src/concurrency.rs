use crate::CoreError;
use berth_store::StoreLayout;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Exclusive advisory lock on `berth.lock`, held by an engine operation from
/// registry load to registry save. Released on drop.
pub struct StoreLock {
    lock_file: File,
}

impl StoreLock {
    /// Block until no other berth process holds the store.
    pub fn acquire(layout: &StoreLayout) -> Result<Self, CoreError> {
        let file = open_lock_file(layout)?;
        if file.try_lock_exclusive().is_err() {
            info!("another berth command is running, waiting for it to finish");
            file.lock_exclusive().map_err(|e| {
                CoreError::Io(std::io::Error::new(std::io::ErrorKind::WouldBlock, e))
            })?;
        }
        debug!("acquired {}", layout.lock_file().display());
        Ok(Self { lock_file: file })
    }

    /// `None` when another process currently runs a transition.
    pub fn try_acquire(layout: &StoreLayout) -> Result<Option<Self>, CoreError> {
        let file = open_lock_file(layout)?;
        Ok(file
            .try_lock_exclusive()
            .ok()
            .map(|()| Self { lock_file: file }))
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.lock_file.unlock();
    }
}

fn open_lock_file(layout: &StoreLayout) -> Result<File, CoreError> {
    std::fs::create_dir_all(layout.root())?;
    Ok(OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(layout.lock_file())?)
}

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Route Ctrl-C away from the default handler so a transition is never cut
/// between its external commands and its registry save. A second Ctrl-C
/// exits immediately with 130.
pub fn install_signal_handler() {
    let _ = ctrlc::set_handler(move || {
        if INTERRUPTED.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        eprintln!("\ninterrupt received, finishing the current transition...");
    });
}

/// Whether Ctrl-C was pressed while a command was running.
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_initializes_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path().join("store"));

        let _lock = StoreLock::acquire(&layout).unwrap();
        assert!(layout.lock_file().exists());
    }

    #[test]
    fn second_holder_is_refused_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());

        let held = StoreLock::acquire(&layout).unwrap();
        assert!(StoreLock::try_acquire(&layout).unwrap().is_none());

        drop(held);
        assert!(StoreLock::try_acquire(&layout).unwrap().is_some());
    }

    #[test]
    fn not_interrupted_by_default() {
        assert!(!interrupted());
    }
}
