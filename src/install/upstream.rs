use crate::platform::PlatformKey;

pub const DEFAULT_BASE_URL: &str =
    "https://github.com/animetosho/par2cmdline-turbo/releases/download";
pub const DEFAULT_VERSION: &str = "v1.1.1";

/// Location of the upstream prebuilt releases.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRelease {
    base_url: String,
    version: String,
}

impl Default for UpstreamRelease {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_VERSION)
    }
}

impl UpstreamRelease {
    pub fn new(base_url: impl Into<String>, version: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            version: version.into(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// `par2cmdline-turbo-{version}-{key}.{ext}`
    pub fn archive_name(&self, key: PlatformKey) -> String {
        format!(
            "par2cmdline-turbo-{}-{}.{}",
            self.version,
            key,
            key.archive_format().extension()
        )
    }

    pub fn archive_url(&self, key: PlatformKey) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            self.version,
            self.archive_name(key)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_archive_urls() {
        let upstream = UpstreamRelease::default();
        assert_eq!(
            upstream.archive_url(PlatformKey::LinuxAmd64),
            "https://github.com/animetosho/par2cmdline-turbo/releases/download/v1.1.1/par2cmdline-turbo-v1.1.1-linux-amd64.xz"
        );
        assert_eq!(
            upstream.archive_url(PlatformKey::WinX64),
            "https://github.com/animetosho/par2cmdline-turbo/releases/download/v1.1.1/par2cmdline-turbo-v1.1.1-win-x64.7z"
        );
    }

    #[test]
    fn test_every_key_has_a_matching_archive_extension() {
        let upstream = UpstreamRelease::default();
        for key in PlatformKey::ALL {
            let name = upstream.archive_name(key);
            let expected = if key.is_windows() { ".7z" } else { ".xz" };
            assert!(name.ends_with(expected), "{} for {}", name, key);
            assert!(name.contains(key.as_str()));
        }
    }

    #[test]
    fn test_trailing_slash_in_base_url_is_ignored() {
        let upstream = UpstreamRelease::new("http://127.0.0.1:1234/", "v2.0.0");
        assert_eq!(
            upstream.archive_url(PlatformKey::MacosArm64),
            "http://127.0.0.1:1234/v2.0.0/par2cmdline-turbo-v2.0.0-macos-arm64.xz"
        );
    }
}
