use anyhow::Result;
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    archive::{ArchiveExtractor, ArchiveExtractorImpl},
    download::{Downloader, HttpDownloader},
    http::{DEFAULT_TIMEOUT_SECS, HttpClient},
    install::{DEFAULT_BASE_URL, DEFAULT_VERSION, UpstreamRelease},
    package::ProjectLayout,
    platform::{self, DefaultPlatformDetector, PlatformDetector, PlatformKey},
    runtime::Runtime,
};

pub const PLATFORM_ENV: &str = "TURBO_PLATFORM";
const USER_AGENT: &str = concat!("par2cmdline-turbo/", env!("CARGO_PKG_VERSION"));

/// Values supplied on the command line. `None` means "use the default".
#[derive(Debug, Default, Clone)]
pub struct ConfigOptions {
    pub root: Option<PathBuf>,
    pub platform: Option<String>,
    pub base_url: Option<String>,
    pub upstream_version: Option<String>,
    pub timeout_secs: Option<u64>,
}

pub struct Config<R: Runtime, D: Downloader, E: ArchiveExtractor> {
    pub runtime: Arc<R>,
    pub downloader: D,
    pub extractor: E,
    pub layout: ProjectLayout,
    pub upstream: UpstreamRelease,
    pub platform: PlatformKey,
}

impl<R: Runtime + 'static> Config<R, HttpDownloader<R>, ArchiveExtractorImpl> {
    pub fn new(runtime: Arc<R>, options: ConfigOptions) -> Result<Self> {
        Self::with_detector(runtime, options, &DefaultPlatformDetector)
    }

    pub fn with_detector<P: PlatformDetector + ?Sized>(
        runtime: Arc<R>,
        options: ConfigOptions,
        detector: &P,
    ) -> Result<Self> {
        // Resolution happens first so an unsupported platform fails before
        // anything else is set up. An empty override is rejected, not replaced
        // by the host platform.
        let requested = options
            .platform
            .clone()
            .or_else(|| runtime.env_var(PLATFORM_ENV).ok());
        let platform = platform::resolve_with(requested.as_deref(), detector)?;
        debug!("Resolved platform: {}", platform);

        let root = match options.root {
            Some(root) => root,
            None => runtime.current_dir()?,
        };

        let timeout = Duration::from_secs(options.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        let http_client = HttpClient::with_timeouts(USER_AGENT, timeout)?;
        let downloader = HttpDownloader::new(Arc::clone(&runtime), http_client);

        let upstream = UpstreamRelease::new(
            options.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
            options.upstream_version.as_deref().unwrap_or(DEFAULT_VERSION),
        );

        Ok(Self {
            runtime,
            downloader,
            extractor: ArchiveExtractorImpl::new(),
            layout: ProjectLayout::new(root),
            upstream,
            platform,
        })
    }
}
