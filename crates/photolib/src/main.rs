//! Photolib CLI - upload a local media library to a content-addressed store.
//!
//! Crawls a directory, hashes every photo and video, and uploads each unique
//! file once under `/{yyyy}/{MM}/{dd}/{digest}.{ext}`.
//!
//! # Usage
//!
//! ```bash
//! export PHOTO_LIB_URL=https://myaccount.dfs.core.windows.net
//! export PHOTO_LIB_CONTAINER=photos
//! export AZURE_STORAGE_TOKEN=$(az account get-access-token \
//!     --resource https://storage.azure.com --query accessToken -o tsv)
//!
//! photolib ~/Pictures
//!
//! # Replace objects that already exist
//! OVERWRITE_ON=true photolib ~/Pictures
//!
//! # Dry run into a local directory
//! PHOTO_LIB_URL=file:///tmp/library photolib ~/Pictures
//! ```

use clap::Parser;
use std::path::PathBuf;

mod logging;
mod upload;

/// Photolib - upload a local media library to a content-addressed object store.
#[derive(Parser, Debug)]
#[command(name = "photolib")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to crawl for photos and videos
    pub root: PathBuf,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long, env = "PHOTO_LIB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of concurrent upload workers (overrides config)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    pub json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized until the config is loaded; a config
    // failure is reported through anyhow on stderr.
    let config = upload::load_config(&cli)?;
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("photolib v{}", photolib_core::VERSION);

    upload::execute(cli, config).await
}
