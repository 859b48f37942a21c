//! panup entry point.

mod app;
mod config;

use std::path::PathBuf;

use clap::Parser;
use panup_protocol::DuplicatePolicy;
use tracing_subscriber::EnvFilter;

/// Upload a file to 123pan and print its direct download link.
#[derive(Debug, Parser)]
#[command(name = "panup", version, about, long_about = None)]
pub struct Cli {
    /// File to upload.
    #[arg(long, value_name = "PATH")]
    pub file: PathBuf,

    #[arg(long, env = "PAN123_CLIENT_ID", hide_env_values = true)]
    pub client_id: String,

    #[arg(long, env = "PAN123_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    /// Directory ID to upload into.
    #[arg(long, env = "PAN123_PARENT_ID")]
    pub parent_id: i64,

    /// TOML config file (default: ~/.config/panup/panup.toml if present).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Open API domain.
    #[arg(long, value_name = "URL")]
    pub api_base: Option<String>,

    /// Slices uploaded in parallel.
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// What to do when the file name already exists: rename or overwrite.
    #[arg(long, value_name = "POLICY")]
    pub duplicate: Option<DuplicatePolicy>,

    /// Key the link is written under in $GITHUB_OUTPUT.
    #[arg(long, value_name = "KEY")]
    pub output_key: Option<String>,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout only carries the link banner.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "starting panup");

    let mut config = config::Config::load(cli.config.as_deref())?;
    config.merge_cli(&cli);
    config.validate()?;
    tracing::debug!(?config, "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(cli, config))
}
