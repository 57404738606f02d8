use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use log::debug;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use super::manifest::{MANIFEST_NAME, PackageManifest};
use crate::runtime::Runtime;

const ARCHIVE_EXTENSION: &str = "tar.gz";
const PARTIAL_SUFFIX: &str = ".partial";

/// Write `{stem}.tar.gz` into `dist_dir` holding the binary and the manifest.
///
/// The archive is written to a `.partial` file first and renamed into place,
/// so an interrupted run never leaves a truncated archive under the final
/// name.
#[tracing::instrument(skip(runtime, manifest))]
pub fn write_package<R: Runtime + ?Sized>(
    runtime: &R,
    manifest: &PackageManifest,
    binary: &Path,
    dist_dir: &Path,
) -> Result<PathBuf> {
    runtime
        .create_dir_all(dist_dir)
        .with_context(|| format!("Failed to create output directory {:?}", dist_dir))?;

    let final_path = dist_dir.join(format!("{}.{}", manifest.archive_stem(), ARCHIVE_EXTENSION));
    let partial_path = dist_dir.join(format!(
        "{}.{}{}",
        manifest.archive_stem(),
        ARCHIVE_EXTENSION,
        PARTIAL_SUFFIX
    ));

    if let Err(e) = write_archive(runtime, manifest, binary, &partial_path) {
        debug!("Removing partial package {:?}", partial_path);
        let _ = runtime.remove_file(&partial_path);
        return Err(e);
    }

    runtime.rename(&partial_path, &final_path)?;
    Ok(final_path)
}

fn write_archive<R: Runtime + ?Sized>(
    runtime: &R,
    manifest: &PackageManifest,
    binary: &Path,
    dest: &Path,
) -> Result<()> {
    let file = runtime.create_file(dest)?;
    let mut tar = tar::Builder::new(GzEncoder::new(file, Compression::default()));

    let entry_name = manifest
        .binaries
        .first()
        .context("Package manifest lists no binaries")?;
    let mut data = Vec::new();
    runtime
        .open(binary)
        .with_context(|| format!("Failed to open binary {:?}", binary))?
        .read_to_end(&mut data)
        .with_context(|| format!("Failed to read binary {:?}", binary))?;

    // Non-Unix hosts report no mode bits
    let mode = match runtime.mode(binary)? & 0o7777 {
        0 => 0o755,
        mode => mode,
    };
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(mode);
    header.set_cksum();
    debug!("Adding {} ({} bytes, mode {:o})", entry_name, data.len(), mode);
    tar.append_data(&mut header, entry_name, &data[..])?;

    let json = manifest.to_json()?;
    let mut header = tar::Header::new_gnu();
    header.set_size(json.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    tar.append_data(&mut header, MANIFEST_NAME, json.as_bytes())?;

    let mut writer = tar
        .into_inner()
        .context("Failed to finish tar stream")?
        .finish()
        .context("Failed to finish gzip stream")?;
    writer.flush()?;
    Ok(())
}
