use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::error::ProvisionError;
use crate::runtime::{Runtime, is_path_under, path::normalize_path};

/// Scratch state and installed artifacts, relative to the project root.
pub const DEFAULT_CLEAN_PATTERNS: &[&str] = &["build", "binaries/*", "dist/*.partial"];

/// Remove everything under `root` matched by `patterns`.
///
/// Every match is resolved (following symlinks) and checked against the
/// canonical root before anything is deleted. A single match outside the root,
/// or the root itself, aborts the whole clean with [`ProvisionError::OutsideRoot`].
/// Returns the removed paths.
#[tracing::instrument(skip(runtime))]
pub fn clean<R: Runtime + ?Sized>(
    runtime: &R,
    root: &Path,
    patterns: &[&str],
) -> Result<Vec<PathBuf>> {
    let root = runtime
        .canonicalize(root)
        .with_context(|| format!("Failed to resolve project root {:?}", root))?;
    let escaped_root = PathBuf::from(glob::Pattern::escape(&root.to_string_lossy()));

    let mut targets: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        // An absolute pattern replaces the root here and is then rejected below
        let full_pattern = escaped_root.join(pattern);
        for matched in runtime.glob(&full_pattern.to_string_lossy())? {
            let resolved = runtime
                .canonicalize(&matched)
                .unwrap_or_else(|_| normalize_path(&matched));
            if resolved == root || !is_path_under(&resolved, &root) {
                return Err(ProvisionError::OutsideRoot {
                    path: matched,
                    root,
                }
                .into());
            }
            if !targets.contains(&matched) {
                targets.push(matched);
            }
        }
    }

    let mut removed = Vec::new();
    for target in targets {
        // Already gone with a parent directory matched earlier. A dangling
        // symlink does not "exist" but is still removed.
        if !runtime.exists(&target) && !runtime.is_symlink(&target) {
            continue;
        }
        debug!("Removing {:?}", target);
        if runtime.is_dir(&target) {
            runtime.remove_dir_all(&target)?;
        } else {
            runtime.remove_file(&target)?;
        }
        removed.push(target);
    }

    info!("Cleaned {} path(s) under {:?}", removed.len(), root);
    Ok(removed)
}
