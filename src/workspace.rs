//! Sandbox workspace bootstrapper.
//!
//! Per-run scratch directory tree holding full/single-branch submodule
//! clones. Registers a process exit hook so the sandbox is recursively
//! removed even on a fatal error or a termination signal, leaving the mono
//! repository itself untouched for inspection.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

static CLEANUP_REGISTERED: OnceLock<()> = OnceLock::new();
static CLEANUP_PATHS: OnceLock<std::sync::Mutex<Vec<PathBuf>>> = OnceLock::new();
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

fn cleanup_paths() -> &'static std::sync::Mutex<Vec<PathBuf>> {
    CLEANUP_PATHS.get_or_init(|| std::sync::Mutex::new(Vec::new()))
}

/// The per-run sandbox. Holds a path under which submodule clones live;
/// removed on `Drop` and additionally registered with a process-wide signal
/// handler so a `SIGINT`/`SIGTERM` mid-run still cleans up.
pub struct Sandbox {
    root: PathBuf,
    _guard: tempfile::TempDir,
}

impl Sandbox {
    pub fn new() -> anyhow::Result<Self> {
        let guard = tempfile::Builder::new().prefix("monomerge-sandbox-").tempdir()?;
        let root = guard.path().to_owned();
        install_cleanup_hook(root.clone());
        Ok(Self { root, _guard: guard })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn child(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        unregister_cleanup(&self.root);
    }
}

/// Registers `path` to be recursively removed if the process terminates via
/// `SIGINT`/`SIGTERM` before the owning [`Sandbox`] is dropped normally.
fn install_cleanup_hook(path: PathBuf) {
    cleanup_paths().lock().expect("not poisoned").push(path);
    CLEANUP_REGISTERED.get_or_init(|| {
        let flag = Arc::new(AtomicBool::new(false));
        for signal in signal_hook::consts::TERM_SIGNALS {
            // Best-effort: if registration fails (e.g. already registered by
            // an embedding process) the sandbox is still cleaned up via
            // `Drop` on the normal exit path.
            let _ = unsafe { signal_hook::low_level::register(*signal, move || {
                INTERRUPTED.store(true, Ordering::SeqCst);
                if let Some(mutex) = CLEANUP_PATHS.get() {
                    if let Ok(paths) = mutex.lock() {
                        for path in paths.iter() {
                            let _ = std::fs::remove_dir_all(path);
                        }
                    }
                }
                std::process::exit(130);
            }) };
        }
        let _ = flag;
    });
}

fn unregister_cleanup(path: &Path) {
    if let Some(mutex) = CLEANUP_PATHS.get() {
        if let Ok(mut paths) = mutex.lock() {
            paths.retain(|p| p != path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sandbox_directory_is_removed_on_drop() {
        let path;
        {
            let sandbox = Sandbox::new().unwrap();
            path = sandbox.path().to_owned();
            assert!(path.is_dir());
        }
        assert!(!path.exists());
    }

    #[test]
    fn child_paths_are_nested_under_root() {
        let sandbox = Sandbox::new().unwrap();
        let child = sandbox.child("libA");
        assert_eq!(child.parent(), Some(sandbox.path()));
    }
}
