use crate::error::ProvisionError;
use crate::platform::BINARY_STEM;
use crate::runtime::Runtime;
use anyhow::{Context, Result};
use log::debug;
use std::io::{BufReader, Write};
use std::path::Path;

use super::ArchiveExtractor;

/// Decoder for single-file `.xz` release streams.
///
/// An xz stream carries no file name, so the output is written to
/// `extract_to/<output_name>`.
pub struct XzExtractor {
    output_name: String,
}

impl Default for XzExtractor {
    fn default() -> Self {
        Self::new(BINARY_STEM)
    }
}

impl XzExtractor {
    pub fn new(output_name: impl Into<String>) -> Self {
        Self {
            output_name: output_name.into(),
        }
    }
}

impl ArchiveExtractor for XzExtractor {
    fn can_handle(&self, archive_path: &Path) -> bool {
        let name = archive_path.to_string_lossy().to_lowercase();
        name.ends_with(".xz") && !name.ends_with(".tar.xz")
    }

    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()> {
        let target = extract_to.join(&self.output_name);
        debug!("Decompressing {:?} into {:?}...", archive_path, target);

        let input = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;
        let mut reader = BufReader::new(input);
        let mut writer = runtime.create_file(&target)?;

        if let Err(e) = lzma_rs::xz_decompress(&mut reader, &mut writer) {
            drop(writer);
            debug!("Removing partial output {:?}", target);
            let _ = runtime.remove_file(&target);
            return Err(ProvisionError::Extraction {
                archive: archive_path.to_path_buf(),
                reason: e.to_string(),
            }
            .into());
        }
        writer
            .flush()
            .with_context(|| format!("Failed to flush {:?}", target))?;

        Ok(())
    }
}
