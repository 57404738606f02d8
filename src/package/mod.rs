//! Packaging steps run at build time against a project root:
//! `build-ext` (install the binary), `clean` and `package`.

mod bundle;
mod clean;
mod manifest;

use anyhow::Result;
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    archive::ArchiveExtractor,
    cleanup::SharedCleanupContext,
    config::Config,
    download::Downloader,
    install::{self, InstalledArtifact, Installer},
    runtime::Runtime,
};

pub use bundle::write_package;
pub use clean::{DEFAULT_CLEAN_PATTERNS, clean};
pub use manifest::{MANIFEST_NAME, PackageManifest};

/// Version stamped on produced packages; derived from git tags by the build script.
pub const PKG_VERSION: &str = env!("TURBO_PKG_VERSION");

/// Fixed directories of a project root.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the installed binary lives.
    pub fn install_dir(&self) -> PathBuf {
        self.root.join("binaries")
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join("build")
    }

    pub fn dist_dir(&self) -> PathBuf {
        self.root.join("dist")
    }
}

/// Install the binary for the configured platform into `binaries/`.
/// Skips the download when it is already present.
///
/// In-flight files are registered on `cleanup_ctx`, which the caller's
/// interrupt watcher removes on Ctrl-C.
pub async fn build_ext<R, D, E>(
    config: &Config<R, D, E>,
    cleanup_ctx: &SharedCleanupContext,
) -> Result<InstalledArtifact>
where
    R: Runtime + 'static,
    D: Downloader,
    E: ArchiveExtractor,
{
    println!("Composing par2cmdline-turbo for {} ...", config.platform);

    let installer = Installer::new(
        Arc::clone(&config.runtime),
        &config.downloader,
        &config.extractor,
        config.upstream.clone(),
        Arc::clone(cleanup_ctx),
    );
    installer
        .install(config.platform, &config.layout.install_dir())
        .await
}

/// Remove installed artifacts and scratch state under the project root.
pub fn run_clean<R, D, E>(config: &Config<R, D, E>) -> Result<Vec<PathBuf>>
where
    R: Runtime + 'static,
    D: Downloader,
    E: ArchiveExtractor,
{
    let removed = clean(
        config.runtime.as_ref(),
        config.layout.root(),
        DEFAULT_CLEAN_PATTERNS,
    )?;
    for path in &removed {
        println!("removing {}", path.display());
    }
    Ok(removed)
}

/// Clean, install if needed, then write the platform-tagged package into `dist/`.
pub async fn package<R, D, E>(
    config: &Config<R, D, E>,
    cleanup_ctx: &SharedCleanupContext,
) -> Result<PathBuf>
where
    R: Runtime + 'static,
    D: Downloader,
    E: ArchiveExtractor,
{
    run_clean(config)?;

    let binary = install::binary_path(&config.layout.install_dir(), config.platform);
    if !config.runtime.exists(&binary) {
        build_ext(config, cleanup_ctx).await?;
    }

    let manifest = PackageManifest::new(PKG_VERSION, config.upstream.version(), config.platform);
    let path = write_package(
        config.runtime.as_ref(),
        &manifest,
        &binary,
        &config.layout.dist_dir(),
    )?;

    info!("Wrote package {:?}", path);
    println!("created {}", path.display());
    Ok(path)
}
