mod sevenz;
mod xz;

use crate::runtime::Runtime;
use anyhow::{Result, anyhow};
use std::path::Path;

pub use sevenz::SevenZipExtractor;
pub use xz::XzExtractor;

/// Trait for format-specific archive extractors
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor: Send + Sync {
    /// Check if this extractor can handle the given archive format
    fn can_handle(&self, archive_path: &Path) -> bool;

    /// Extract the archive into `extract_to`, which must already exist
    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()>;
}

/// Dispatcher that selects the appropriate extractor based on the archive's extension.
pub struct ArchiveExtractorImpl {
    seven_zip: SevenZipExtractor,
    xz: XzExtractor,
}

impl Default for ArchiveExtractorImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveExtractorImpl {
    pub fn new() -> Self {
        Self {
            seven_zip: SevenZipExtractor::new(),
            xz: XzExtractor::default(),
        }
    }
}

impl ArchiveExtractor for ArchiveExtractorImpl {
    fn can_handle(&self, archive_path: &Path) -> bool {
        self.seven_zip.can_handle(archive_path) || self.xz.can_handle(archive_path)
    }

    #[tracing::instrument(skip(self, runtime, archive_path, extract_to))]
    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()> {
        if self.seven_zip.can_handle(archive_path) {
            return self.seven_zip.extract(runtime, archive_path, extract_to);
        }
        if self.xz.can_handle(archive_path) {
            return self.xz.extract(runtime, archive_path, extract_to);
        }
        Err(anyhow!(
            "Unsupported archive format: {}",
            archive_path.display()
        ))
    }
}
