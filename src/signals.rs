//! Signal handling for the lifetime of plaintext scratch files.
//!
//! Once installed, SIGINT, SIGQUIT, SIGTERM and SIGHUP no longer kill the
//! process outright. A watcher thread receives them instead: while an external
//! editor owns the terminal, SIGINT and SIGQUIT are left to the editor (which
//! shares our process group); any other delivery erases every live scratch
//! file, restores the terminal and exits with `128 + signal`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, Once, PoisonError};

use crate::scratch;

static LIVE: LiveFiles = LiveFiles::new();
static FOREGROUND_CHILDREN: AtomicUsize = AtomicUsize::new(0);

/// Paths of scratch files that still hold plaintext.
pub(crate) struct LiveFiles(Mutex<Vec<PathBuf>>);

impl LiveFiles {
    pub(crate) const fn new() -> Self {
        Self(Mutex::new(Vec::new()))
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PathBuf>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn track(&self, path: &Path) {
        self.lock().push(path.to_path_buf());
    }

    /// Forget `path` and run `release` with the list locked, so a terminating
    /// signal never interleaves with an erase already in progress.
    pub(crate) fn release_with<T>(&self, path: &Path, release: impl FnOnce() -> T) -> T {
        let mut live = self.lock();
        live.retain(|p| p != path);
        release()
    }

    /// Erase everything still tracked. The list stays locked until the caller's
    /// guard is dropped; the signal watcher never drops it because it exits.
    fn erase_all(&self) -> MutexGuard<'_, Vec<PathBuf>> {
        let mut live = self.lock();
        for path in live.drain(..) {
            if let Err(err) = scratch::shred(&path) {
                scratch::report_release_failure(&path, &err);
            }
        }
        live
    }
}

pub(crate) fn track(path: &Path) {
    LIVE.track(path);
}

pub(crate) fn release_with<T>(path: &Path, release: impl FnOnce() -> T) -> T {
    LIVE.release_with(path, release)
}

/// Held while a child process runs in the foreground of our terminal.
#[must_use]
pub struct ForegroundChild(());

impl ForegroundChild {
    pub fn enter() -> Self {
        install();
        FOREGROUND_CHILDREN.fetch_add(1, Ordering::SeqCst);
        Self(())
    }
}

impl Drop for ForegroundChild {
    fn drop(&mut self) {
        FOREGROUND_CHILDREN.fetch_sub(1, Ordering::SeqCst);
    }
}

fn child_in_foreground() -> bool {
    FOREGROUND_CHILDREN.load(Ordering::SeqCst) > 0
}

/// Start the signal watcher. Safe to call more than once.
pub fn install() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        #[cfg(unix)]
        spawn_watcher();
    });
}

#[cfg(unix)]
fn spawn_watcher() {
    use signal_hook::consts::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = match Signals::new([SIGINT, SIGQUIT, SIGTERM, SIGHUP]) {
        Ok(signals) => signals,
        Err(err) => {
            tracing::warn!(error = %err, "failed to register signal handlers");
            return;
        }
    };

    let spawned = std::thread::Builder::new()
        .name("kv-signals".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                if matches!(signal, SIGINT | SIGQUIT) && child_in_foreground() {
                    tracing::debug!(signal, "signal left to the foreground editor");
                    continue;
                }
                tracing::debug!(signal, "terminating on signal");
                let _live = LIVE.erase_all();
                crate::ui::restore_if_active();
                std::process::exit(128 + signal);
            }
        });
    if let Err(err) = spawned {
        tracing::warn!(error = %err, "failed to start signal watcher");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erase_all_shreds_tracked_files() {
        let td = tempfile::tempdir().expect("tempdir");
        let a = td.path().join("a.tmp");
        let b = td.path().join("b.tmp");
        std::fs::write(&a, "secret-a").unwrap();
        std::fs::write(&b, "secret-b").unwrap();

        let live = LiveFiles::new();
        live.track(&a);
        live.track(&b);
        let remaining = live.erase_all();

        assert!(remaining.is_empty());
        assert!(!a.exists());
        assert!(!b.exists());
    }

    #[test]
    fn released_files_are_no_longer_tracked() {
        let td = tempfile::tempdir().expect("tempdir");
        let keep = td.path().join("keep.tmp");
        let gone = td.path().join("gone.tmp");
        std::fs::write(&keep, "x").unwrap();
        std::fs::write(&gone, "y").unwrap();

        let live = LiveFiles::new();
        live.track(&keep);
        live.track(&gone);
        let released = live.release_with(&gone, || std::fs::remove_file(&gone).is_ok());
        assert!(released);

        assert_eq!(*live.lock(), vec![keep.clone()]);
        drop(live.erase_all());
        assert!(!keep.exists());
    }

    #[test]
    fn foreground_child_is_counted_while_held() {
        let guard = ForegroundChild::enter();
        assert!(child_in_foreground());
        drop(guard);
    }
}
