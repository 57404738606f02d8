//! Error taxonomy for provisioning failures.
//!
//! Every variant is terminal for the command that raised it. Call sites wrap
//! these in `anyhow::Error`; tests and callers recover them with `downcast_ref`.

use std::path::PathBuf;

/// Errors raised while resolving, installing or cleaning the bundled binary.
#[derive(Debug)]
pub enum ProvisionError {
    /// The requested or detected platform has no upstream release.
    UnsupportedPlatform {
        value: String,
        supported: Vec<&'static str>,
    },
    /// The release archive could not be downloaded.
    Transport { url: String, reason: String },
    /// The archive could not be extracted or decompressed.
    Extraction { archive: PathBuf, reason: String },
    /// Extraction reported success but the expected binary is missing.
    Verification { expected: PathBuf },
    /// A clean pattern matched a path that resolves outside the project root.
    OutsideRoot { path: PathBuf, root: PathBuf },
}

impl std::fmt::Display for ProvisionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProvisionError::UnsupportedPlatform { value, supported } => {
                write!(
                    f,
                    "The current or requested platform '{}' does not support par2cmdline-turbo. \
                     Please set \"TURBO_PLATFORM\" to one of {}.",
                    value,
                    supported.join(", ")
                )
            }
            ProvisionError::Transport { url, reason } => {
                write!(f, "Failed to download {}: {}", url, reason)
            }
            ProvisionError::Extraction { archive, reason } => {
                write!(f, "Failed to extract {:?}: {}", archive, reason)
            }
            ProvisionError::Verification { expected } => {
                write!(
                    f,
                    "Installed binary not found at {:?} after extraction; \
                     the upstream archive layout may have changed",
                    expected
                )
            }
            ProvisionError::OutsideRoot { path, root } => {
                write!(f, "{:?} is not a path around {:?}", path, root)
            }
        }
    }
}

impl std::error::Error for ProvisionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_platform_display_lists_choices() {
        let err = ProvisionError::UnsupportedPlatform {
            value: "plan9-mips".to_string(),
            supported: vec!["linux-amd64", "win-x64"],
        };
        let msg = err.to_string();
        assert!(msg.contains("plan9-mips"));
        assert!(msg.contains("linux-amd64, win-x64"));
        assert!(msg.contains("TURBO_PLATFORM"));
    }

    #[test]
    fn test_transport_display() {
        let err = ProvisionError::Transport {
            url: "http://example.com/a.xz".to_string(),
            reason: "HTTP 404".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to download http://example.com/a.xz: HTTP 404"
        );
    }

    #[test]
    fn test_verification_display_mentions_path() {
        let err = ProvisionError::Verification {
            expected: PathBuf::from("/proj/binaries/par2.exe"),
        };
        assert!(err.to_string().contains("par2.exe"));
    }

    #[test]
    fn test_outside_root_downcast() {
        let err = anyhow::Error::from(ProvisionError::OutsideRoot {
            path: PathBuf::from("/etc"),
            root: PathBuf::from("/proj"),
        });
        assert!(matches!(
            err.downcast_ref::<ProvisionError>(),
            Some(ProvisionError::OutsideRoot { .. })
        ));
    }
}
