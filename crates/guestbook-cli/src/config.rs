//! Config file loading and command-line overrides

use anyhow::Context;
use guestbook_sdk::GuestbookConfig;
use std::path::{Path, PathBuf};
use tracing::info;

/// Values given on the command line or in the environment
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub rpc_url: Option<String>,
    pub data_dir: Option<PathBuf>,
}

/// Load the TOML config at `path`, falling back to defaults when it does not
/// exist, then apply overrides and validate.
pub fn load(path: &Path, overrides: Overrides) -> anyhow::Result<GuestbookConfig> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?
    } else {
        info!("Config file not found, using defaults");
        GuestbookConfig::default()
    };

    if let Some(rpc_url) = overrides.rpc_url {
        config.chain.rpc_urls.http = vec![rpc_url];
    }
    if let Some(data_dir) = overrides.data_dir {
        config.storage.data_dir = data_dir;
    }

    config.validate()?;
    Ok(config)
}
