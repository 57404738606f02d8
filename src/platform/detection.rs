use std::env::consts;

/// Host OS and architecture names, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    /// The target this binary was built for, in the toolchain's own names
    /// (`linux`, `macos`, `windows`; `x86_64`, `aarch64`, `x86`, `arm`).
    pub fn host() -> Self {
        Self {
            os: consts::OS.to_string(),
            arch: consts::ARCH.to_string(),
        }
    }
}

/// Source of the host platform used when no override is given.
#[cfg_attr(test, mockall::automock)]
pub trait PlatformDetector: Send + Sync {
    fn detect(&self) -> Platform;
}

pub struct DefaultPlatformDetector;

impl PlatformDetector for DefaultPlatformDetector {
    fn detect(&self) -> Platform {
        Platform::host()
    }
}
