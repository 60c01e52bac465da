//! The upload run: config assembly and orchestrator invocation.

use photolib_core::{Config, PhotoLib};
use std::path::{Path, PathBuf};

use crate::Cli;

/// Expand a leading `~` in a user-supplied path.
fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&path_str).into_owned())
}

/// Load configuration from the environment and config file, then apply
/// CLI overrides.
pub fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let config_path = cli.config.as_deref().map(expand);
    let mut config = Config::load(config_path.as_deref())?;
    if let Some(workers) = cli.workers {
        anyhow::ensure!(workers > 0, "--workers must be > 0");
        config.upload.workers = workers;
    }
    Ok(config)
}

/// Crawl the root directory and upload everything eligible.
pub async fn execute(cli: Cli, config: Config) -> anyhow::Result<()> {
    let root = expand(&cli.root);
    tracing::debug!(
        "Uploading to {}/{} with {} workers (overwrite: {})",
        config.storage.endpoint,
        config.storage.container,
        config.upload.workers,
        config.upload.overwrite
    );

    let photolib = PhotoLib::from_config(config)?;
    let summary = photolib.run(&root).await?;

    if summary.failed > 0 {
        tracing::warn!(
            "{} of {} files failed, see errors above",
            summary.failed,
            summary.discovered
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_takes_single_positional_root() {
        let cli = Cli::try_parse_from(["photolib", "/photos"]).unwrap();
        assert_eq!(cli.root, PathBuf::from("/photos"));
        assert!(cli.workers.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_requires_root() {
        assert!(Cli::try_parse_from(["photolib"]).is_err());
    }

    #[test]
    fn test_cli_flags() {
        let cli =
            Cli::try_parse_from(["photolib", "-v", "--json-logs", "-w", "8", "/photos"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.json_logs);
        assert_eq!(cli.workers, Some(8));
    }

    #[test]
    fn test_expand_plain_path_unchanged() {
        assert_eq!(expand(Path::new("/a/b")), PathBuf::from("/a/b"));
    }

    #[test]
    fn test_load_config_rejects_zero_workers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[storage]\nendpoint = \"file:///tmp/lib\"\ncontainer = \"photos\"\n",
        )
        .unwrap();
        let cli = Cli::try_parse_from([
            "photolib",
            "--config",
            path.to_str().unwrap(),
            "--workers",
            "0",
            "/photos",
        ])
        .unwrap();
        assert!(load_config(&cli).is_err());
    }
}
