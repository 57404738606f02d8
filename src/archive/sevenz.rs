use crate::error::ProvisionError;
use crate::runtime::Runtime;
use anyhow::Result;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::process::Command;

use super::ArchiveExtractor;

/// Extractor for `.7z` archives, delegating to an external 7-Zip binary.
///
/// Entries are unpacked flat (`7z e`) into the target directory. The tool's
/// exit status is the only success signal; callers verify the expected file
/// afterwards.
pub struct SevenZipExtractor {
    program: Option<PathBuf>,
}

impl Default for SevenZipExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SevenZipExtractor {
    /// Locate the tool on `PATH` at extraction time.
    pub fn new() -> Self {
        Self { program: None }
    }

    /// Use a specific 7-Zip executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: Some(program.into()),
        }
    }

    fn candidates() -> &'static [&'static str] {
        // The build host decides the tool name, not the target platform
        if cfg!(windows) {
            &["7z.exe", "7za.exe", "7zr.exe", "7z", "7za", "7zr"]
        } else {
            &["7z", "7za", "7zr"]
        }
    }

    fn locate(&self, archive_path: &Path) -> Result<PathBuf, ProvisionError> {
        if let Some(program) = &self.program {
            return Ok(program.clone());
        }
        Self::candidates()
            .iter()
            .find_map(|bin| which::which(bin).ok())
            .ok_or_else(|| ProvisionError::Extraction {
                archive: archive_path.to_path_buf(),
                reason: "7z executable not found; please install p7zip/7-Zip".to_string(),
            })
    }
}

impl ArchiveExtractor for SevenZipExtractor {
    fn can_handle(&self, archive_path: &Path) -> bool {
        let name = archive_path.to_string_lossy().to_lowercase();
        name.ends_with(".7z")
    }

    fn extract<R: Runtime + 'static>(
        &self,
        _runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()> {
        let program = self.locate(archive_path)?;
        debug!(
            "Running {:?} to extract {:?} into {:?}",
            program, archive_path, extract_to
        );

        let mut output_flag = std::ffi::OsString::from("-o");
        output_flag.push(extract_to.as_os_str());

        let status = Command::new(&program)
            .arg("e")
            .arg(archive_path)
            .arg(output_flag)
            .arg("-y")
            .status()
            .map_err(|e| ProvisionError::Extraction {
                archive: archive_path.to_path_buf(),
                reason: format!("failed to launch {:?}: {}", program, e),
            })?;

        if !status.success() {
            return Err(ProvisionError::Extraction {
                archive: archive_path.to_path_buf(),
                reason: match status.code() {
                    Some(code) => format!("7z exited with status {}", code),
                    None => "7z was terminated by a signal".to_string(),
                },
            }
            .into());
        }

        info!("Extraction complete.");
        Ok(())
    }
}
