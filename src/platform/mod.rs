//! Platform resolution.
//!
//! Maps the host (or an explicitly requested) OS and architecture to one of the
//! platforms for which par2cmdline-turbo publishes a prebuilt release, and
//! derives everything that depends on it: archive format, binary extension and
//! the distribution platform tag.

mod detection;

pub use detection::{DefaultPlatformDetector, Platform, PlatformDetector};

#[cfg(test)]
pub use detection::MockPlatformDetector;

use crate::error::ProvisionError;
use std::fmt;
use std::str::FromStr;

/// Base name of the installed binary, before the platform extension.
pub const BINARY_STEM: &str = "par2";

/// A platform with an upstream par2cmdline-turbo release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformKey {
    LinuxAmd64,
    LinuxArm64,
    LinuxArmhf,
    MacosArm64,
    MacosX64,
    WinArm64,
    WinX64,
    WinX86,
}

/// Archive format of an upstream release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// 7-Zip archive, unpacked by the external `7z` tool.
    SevenZip,
    /// Single-file xz stream, decoded in-process.
    Xz,
}

impl ArchiveFormat {
    /// File extension used by upstream for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::SevenZip => "7z",
            ArchiveFormat::Xz => "xz",
        }
    }
}

impl PlatformKey {
    pub const ALL: [PlatformKey; 8] = [
        PlatformKey::LinuxAmd64,
        PlatformKey::LinuxArm64,
        PlatformKey::LinuxArmhf,
        PlatformKey::MacosArm64,
        PlatformKey::MacosX64,
        PlatformKey::WinArm64,
        PlatformKey::WinX64,
        PlatformKey::WinX86,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformKey::LinuxAmd64 => "linux-amd64",
            PlatformKey::LinuxArm64 => "linux-arm64",
            PlatformKey::LinuxArmhf => "linux-armhf",
            PlatformKey::MacosArm64 => "macos-arm64",
            PlatformKey::MacosX64 => "macos-x64",
            PlatformKey::WinArm64 => "win-arm64",
            PlatformKey::WinX64 => "win-x64",
            PlatformKey::WinX86 => "win-x86",
        }
    }

    /// Names of every supported key, in declaration order.
    pub fn supported() -> Vec<&'static str> {
        Self::ALL.iter().map(PlatformKey::as_str).collect()
    }

    pub fn is_windows(&self) -> bool {
        matches!(
            self,
            PlatformKey::WinArm64 | PlatformKey::WinX64 | PlatformKey::WinX86
        )
    }

    pub fn archive_format(&self) -> ArchiveFormat {
        if self.is_windows() {
            ArchiveFormat::SevenZip
        } else {
            ArchiveFormat::Xz
        }
    }

    /// Extension of the installed binary (`.exe` on Windows, empty otherwise).
    pub fn binary_extension(&self) -> &'static str {
        if self.is_windows() { ".exe" } else { "" }
    }

    /// File name of the installed binary, e.g. `par2` or `par2.exe`.
    pub fn binary_name(&self) -> String {
        format!("{}{}", BINARY_STEM, self.binary_extension())
    }

    /// Distribution tag marking a package built for this platform.
    pub fn platform_tag(&self) -> &'static str {
        match self {
            PlatformKey::LinuxAmd64 => "manylinux_2_17_x86_64",
            PlatformKey::LinuxArm64 => "manylinux_2_17_aarch64",
            PlatformKey::LinuxArmhf => "manylinux_2_17_armv7l",
            PlatformKey::MacosArm64 => "macosx_11_0_arm64",
            PlatformKey::MacosX64 => "macosx_10_9_x86_64",
            PlatformKey::WinArm64 => "win_arm64",
            PlatformKey::WinX64 => "win_amd64",
            PlatformKey::WinX86 => "win32",
        }
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformKey {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlatformKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| unsupported(s))
    }
}

fn unsupported(value: &str) -> ProvisionError {
    ProvisionError::UnsupportedPlatform {
        value: value.to_string(),
        supported: PlatformKey::supported(),
    }
}

fn normalize_os(os: &str) -> Option<&'static str> {
    match os {
        "darwin" | "macos" => Some("macos"),
        "linux" => Some("linux"),
        "win32" | "windows" => Some("win"),
        _ => None,
    }
}

// Only the Linux releases call x86_64 "amd64"; macOS and Windows use "x64".
fn normalize_arch(os: &str, arch: &str) -> Option<&'static str> {
    match arch {
        "x86_64" | "AMD64" => Some(if os == "linux" { "amd64" } else { "x64" }),
        "arm64" | "aarch64" => Some("arm64"),
        "x86" | "i686" => Some("x86"),
        "armv7l" | "arm" => Some("armhf"),
        _ => None,
    }
}

/// Resolve the platform to provision for.
///
/// An explicit override is taken verbatim. Otherwise the detected OS and
/// architecture are normalized and joined as `{os}-{arch}`. Either way the
/// candidate must be one of [`PlatformKey::ALL`].
pub fn resolve(
    explicit_override: Option<&str>,
    detected_os: &str,
    detected_arch: &str,
) -> Result<PlatformKey, ProvisionError> {
    if let Some(candidate) = explicit_override {
        return candidate.parse();
    }

    let os = normalize_os(detected_os).ok_or_else(|| unsupported(detected_os))?;
    let arch = normalize_arch(os, detected_arch).ok_or_else(|| unsupported(detected_arch))?;
    format!("{}-{}", os, arch).parse()
}

/// Resolve against the host reported by `detector`.
pub fn resolve_with<P: PlatformDetector + ?Sized>(
    explicit_override: Option<&str>,
    detector: &P,
) -> Result<PlatformKey, ProvisionError> {
    let host = detector.detect();
    resolve(explicit_override, &host.os, &host.arch)
}
