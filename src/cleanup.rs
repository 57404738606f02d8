use log::debug;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Paths to remove if provisioning is interrupted before it finishes:
/// the downloaded archive and any partially written binary.
#[derive(Default)]
pub struct CleanupContext {
    paths: Vec<PathBuf>,
}

impl CleanupContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: PathBuf) {
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    /// Forget a path once the step that produced it has succeeded or cleaned up after itself
    pub fn remove(&mut self, path: &Path) {
        self.paths.retain(|p| p != path);
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Remove every registered path, ignoring errors
    pub fn cleanup(&self) {
        for path in &self.paths {
            debug!("Cleaning up: {:?}", path);
            if path.is_dir() {
                let _ = std::fs::remove_dir_all(path);
            } else {
                let _ = std::fs::remove_file(path);
            }
        }
    }
}

pub type SharedCleanupContext = Arc<Mutex<CleanupContext>>;

pub fn new_shared() -> SharedCleanupContext {
    Arc::new(Mutex::new(CleanupContext::new()))
}

/// Register `path` on a shared context. A poisoned lock is recovered since the
/// path list stays valid regardless of where the panic happened.
pub fn register(ctx: &SharedCleanupContext, path: &Path) {
    let mut guard = ctx.lock().unwrap_or_else(|e| e.into_inner());
    guard.add(path.to_path_buf());
}

pub fn unregister(ctx: &SharedCleanupContext, path: &Path) {
    let mut guard = ctx.lock().unwrap_or_else(|e| e.into_inner());
    guard.remove(path);
}

/// Spawn a task that removes everything registered on `ctx` and exits with
/// status 130 when Ctrl-C arrives.
///
/// Once installed, the SIGINT handler stays for the life of the process, so
/// spawn this once per command and let it run until the command returns.
pub fn spawn_interrupt_handler(ctx: SharedCleanupContext) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, cleaning up...");
            ctx.lock().unwrap_or_else(|e| e.into_inner()).cleanup();
            std::process::exit(130);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_cleanup_context_add_remove() {
        let mut ctx = CleanupContext::new();
        let path = PathBuf::from("/tmp/par2cmdline-turbo-v1.1.1-linux-amd64.xz");

        ctx.add(path.clone());
        ctx.add(path.clone());
        assert_eq!(ctx.paths().len(), 1);

        ctx.remove(&path);
        assert!(ctx.paths().is_empty());
    }

    #[test]
    fn test_cleanup_context_removes_files_and_dirs() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("archive.xz");
        fs::write(&file_path, "partial").unwrap();
        let sub_dir = dir.path().join("binaries");
        fs::create_dir(&sub_dir).unwrap();
        fs::write(sub_dir.join("par2"), "partial").unwrap();

        let mut ctx = CleanupContext::new();
        ctx.add(file_path.clone());
        ctx.add(sub_dir.clone());
        ctx.cleanup();

        assert!(!file_path.exists());
        assert!(!sub_dir.exists());
    }

    #[test]
    fn test_cleanup_ignores_missing_paths() {
        let mut ctx = CleanupContext::new();
        ctx.add(PathBuf::from("/nonexistent/par2"));
        ctx.cleanup();
    }

    #[test]
    fn test_register_and_unregister_shared() {
        let ctx = new_shared();
        let path = PathBuf::from("/tmp/par2");

        register(&ctx, &path);
        assert_eq!(ctx.lock().unwrap().paths(), &[path.clone()]);

        unregister(&ctx, &path);
        assert!(ctx.lock().unwrap().paths().is_empty());
    }
}
