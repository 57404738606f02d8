use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::platform::PlatformKey;

pub const MANIFEST_NAME: &str = "PACKAGE.json";
pub const PACKAGE_NAME: &str = "par2cmdline-turbo";
pub const PYTHON_TAG: &str = "py3";
pub const ABI_TAG: &str = "none";

/// Metadata written next to the bundled binary in the distributable archive.
///
/// `root_is_pure` is always false: the package carries a native executable
/// and is only valid on the platform named by `platform_tag`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PackageManifest {
    pub name: String,
    pub version: String,
    pub upstream_version: String,
    pub platform: String,
    pub platform_tag: String,
    pub python_tag: String,
    pub abi_tag: String,
    pub root_is_pure: bool,
    pub binaries: Vec<String>,
}

impl PackageManifest {
    pub fn new(version: &str, upstream_version: &str, key: PlatformKey) -> Self {
        PackageManifest {
            name: PACKAGE_NAME.to_string(),
            version: version.to_string(),
            upstream_version: upstream_version.to_string(),
            platform: key.to_string(),
            platform_tag: key.platform_tag().to_string(),
            python_tag: PYTHON_TAG.to_string(),
            abi_tag: ABI_TAG.to_string(),
            root_is_pure: false,
            binaries: vec![format!("binaries/{}", key.binary_name())],
        }
    }

    /// `{name}-{version}-{python}-{abi}-{platform_tag}`
    pub fn archive_stem(&self) -> String {
        format!(
            "{}-{}-{}-{}-{}",
            self.name, self.version, self.python_tag, self.abi_tag, self.platform_tag
        )
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize package manifest")
    }
}
