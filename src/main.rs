use anyhow::Result;
use clap::Parser;
use par2cmdline_turbo::{
    cleanup,
    config::{Config, ConfigOptions},
    install, package,
    runtime::RealRuntime,
};
use std::path::PathBuf;
use std::sync::Arc;

/// par2-turbo - par2cmdline-turbo packaging tool
///
/// Fetch the prebuilt par2cmdline-turbo binary for a platform and bundle it
/// into a platform-tagged package.
///
/// Set TURBO_PLATFORM to cross-build for another platform.
///
/// Examples:
///   par2-turbo build-ext                          # Install par2 for this host into ./binaries
///   TURBO_PLATFORM=win-x64 par2-turbo package     # Package the Windows x64 binary
#[derive(Parser, Debug)]
#[command(author, version = env!("TURBO_PKG_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root containing binaries/, build/ and dist/ (also via TURBO_ROOT)
    #[arg(
        long = "root",
        short = 'r',
        env = "TURBO_ROOT",
        value_name = "PATH",
        global = true
    )]
    pub root: Option<PathBuf>,

    /// Platform to provision for, e.g. linux-amd64 (defaults to the host)
    #[arg(long, env = "TURBO_PLATFORM", value_name = "KEY", global = true)]
    pub platform: Option<String>,

    /// Base URL of the upstream release downloads
    #[arg(long = "base-url", value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Upstream release tag, e.g. v1.1.1
    #[arg(long = "upstream-version", value_name = "TAG", global = true)]
    pub upstream_version: Option<String>,

    /// Download timeout in seconds
    #[arg(long, value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Show the resolved platform and where its binary comes from
    Resolve,

    /// Download and install par2 into the project's binaries directory
    #[command(name = "build-ext")]
    BuildExt,

    /// Remove installed binaries and build scratch state
    Clean,

    /// Build the platform-tagged package into dist/
    Package,
}

impl Cli {
    fn options(&self) -> ConfigOptions {
        ConfigOptions {
            root: self.root.clone(),
            platform: self.platform.clone(),
            base_url: self.base_url.clone(),
            upstream_version: self.upstream_version.clone(),
            timeout_secs: self.timeout,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let config = Config::new(Arc::new(RealRuntime), cli.options())?;

    // One watcher for the whole command. It runs on a worker thread, so
    // Ctrl-C is still handled while the main task decodes an archive.
    let cleanup_ctx = cleanup::new_shared();
    let _interrupt = cleanup::spawn_interrupt_handler(Arc::clone(&cleanup_ctx));

    match cli.command {
        Commands::Resolve => {
            let key = config.platform;
            println!("platform:     {}", key);
            println!("platform tag: {}", key.platform_tag());
            println!("archive:      {}", config.upstream.archive_url(key));
            println!(
                "binary:       {}",
                install::binary_path(&config.layout.install_dir(), key).display()
            );
        }
        Commands::BuildExt => {
            package::build_ext(&config, &cleanup_ctx).await?;
        }
        Commands::Clean => {
            package::run_clean(&config)?;
        }
        Commands::Package => {
            package::package(&config, &cleanup_ctx).await?;
        }
    }
    Ok(())
}
