//! Artifact installation: download the upstream release for a platform and
//! leave an executable `par2` binary in the install directory.

use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    archive::ArchiveExtractor,
    cleanup::{self, SharedCleanupContext},
    download::Downloader,
    error::ProvisionError,
    platform::PlatformKey,
    runtime::Runtime,
};

mod upstream;

pub use upstream::{DEFAULT_BASE_URL, DEFAULT_VERSION, UpstreamRelease};

/// Executable bits added to the installed binary on top of its existing mode.
const EXECUTABLE_BITS: u32 = 0o111;

/// A binary installed by [`Installer::install`].
#[derive(Debug, Clone, PartialEq)]
pub struct InstalledArtifact {
    pub path: PathBuf,
    pub platform: PlatformKey,
    /// False when an existing binary was found and nothing was downloaded.
    pub downloaded: bool,
}

/// Path of the installed binary for `key` inside `install_dir`.
pub fn binary_path(install_dir: &Path, key: PlatformKey) -> PathBuf {
    install_dir.join(key.binary_name())
}

/// Downloads and unpacks upstream releases into an install directory.
pub struct Installer<'a, R, D, E>
where
    R: Runtime + 'static,
    D: Downloader,
    E: ArchiveExtractor,
{
    runtime: Arc<R>,
    downloader: &'a D,
    extractor: &'a E,
    upstream: UpstreamRelease,
    cleanup_ctx: SharedCleanupContext,
}

impl<'a, R, D, E> Installer<'a, R, D, E>
where
    R: Runtime + 'static,
    D: Downloader,
    E: ArchiveExtractor,
{
    pub fn new(
        runtime: Arc<R>,
        downloader: &'a D,
        extractor: &'a E,
        upstream: UpstreamRelease,
        cleanup_ctx: SharedCleanupContext,
    ) -> Self {
        Self {
            runtime,
            downloader,
            extractor,
            upstream,
            cleanup_ctx,
        }
    }

    /// Install the binary for `key` into `install_dir`.
    ///
    /// Returns immediately, without network access, when the binary is
    /// already present. Otherwise downloads the release archive to the temp
    /// directory, unpacks it, verifies the expected binary exists and adds the
    /// executable bits.
    #[tracing::instrument(skip(self, install_dir))]
    pub async fn install(&self, key: PlatformKey, install_dir: &Path) -> Result<InstalledArtifact> {
        let runtime = self.runtime.as_ref();
        let target = binary_path(install_dir, key);

        if runtime.exists(&target) {
            info!(
                "Binary {:?} already exists. Skipping download and extraction.",
                target
            );
            println!("   par2 for {} is already installed", key);
            return Ok(InstalledArtifact {
                path: target,
                platform: key,
                downloaded: false,
            });
        }

        let url = self.upstream.archive_url(key);
        let temp_file_path = runtime.temp_dir().join(self.upstream.archive_name(key));

        println!(
            " downloading par2cmdline-turbo {} ({}) -> {}",
            self.upstream.version(),
            key,
            url
        );
        cleanup::register(&self.cleanup_ctx, &temp_file_path);
        if let Err(e) = self.downloader.download(&url, &temp_file_path).await {
            debug!("Download failed, discarding {:?}", temp_file_path);
            if runtime.exists(&temp_file_path) {
                let _ = runtime.remove_file(&temp_file_path);
            }
            cleanup::unregister(&self.cleanup_ctx, &temp_file_path);
            return Err(e);
        }

        debug!("Creating install directory: {:?}", install_dir);
        runtime
            .create_dir_all(install_dir)
            .with_context(|| format!("Failed to create install directory at {:?}", install_dir))?;

        println!("  installing {} -> {}", key, target.display());
        cleanup::register(&self.cleanup_ctx, &target);
        let installed = self.unpack(key, &temp_file_path, install_dir, &target);
        if installed.is_err() && runtime.exists(&target) {
            debug!("Installation failed, removing {:?}", target);
            let _ = runtime.remove_file(&target);
        }
        cleanup::unregister(&self.cleanup_ctx, &target);

        let removed = runtime
            .remove_file(&temp_file_path)
            .with_context(|| format!("Failed to clean up temporary file: {:?}", temp_file_path));
        cleanup::unregister(&self.cleanup_ctx, &temp_file_path);

        installed?;
        removed?;

        info!("Installed {:?}", target);
        Ok(InstalledArtifact {
            path: target,
            platform: key,
            downloaded: true,
        })
    }

    fn unpack(
        &self,
        key: PlatformKey,
        archive_path: &Path,
        install_dir: &Path,
        target: &Path,
    ) -> Result<()> {
        let runtime = self.runtime.as_ref();
        debug!(
            "Extracting {:?} ({:?}) into {:?}",
            archive_path,
            key.archive_format(),
            install_dir
        );
        self.extractor.extract(runtime, archive_path, install_dir)?;

        // The extractor's own status is trusted; this is the only check that
        // the archive actually contained the binary under the expected name.
        if !runtime.exists(target) {
            return Err(ProvisionError::Verification {
                expected: target.to_path_buf(),
            }
            .into());
        }

        make_executable(runtime, target)
    }
}

/// Add the executable bits to `path`, keeping every other permission bit.
pub fn make_executable<R: Runtime + ?Sized>(runtime: &R, path: &Path) -> Result<()> {
    let mode = runtime.mode(path)?;
    debug!("Setting executable permission on {:?}", path);
    runtime.set_permissions(path, mode | EXECUTABLE_BITS)
}
