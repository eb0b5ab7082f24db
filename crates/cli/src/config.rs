//! CLI configuration utilities

use anyhow::{Context, Result};
use portal_core::PortalConfig;
use std::path::{Path, PathBuf};
use tracing::info;

const DEFAULT_CONFIG_FILE: &str = "portal.json";

/// Resolve the state directory: explicit flag, then `PORTAL_STATE_DIR`, then the system data dir
pub fn data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        if let Ok(dir) = std::env::var("PORTAL_STATE_DIR") {
            PathBuf::from(dir)
        } else {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("lender-portal")
        }
    })
}

/// Default location of the configuration file inside the state directory
pub fn default_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DEFAULT_CONFIG_FILE)
}

/// Load portal configuration.
///
/// An explicit file wins; otherwise the default file in the state directory
/// is used when present; otherwise built-in defaults. Environment overrides
/// apply in every case.
pub fn load_config(explicit: Option<&Path>, data_dir: &Path) -> Result<PortalConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => Some(default_config_path(data_dir)).filter(|p| p.exists()),
    };

    match &path {
        Some(path) => info!("Loading configuration from: {}", path.display()),
        None => info!("Using default configuration with environment overrides"),
    }

    PortalConfig::load(path.as_deref()).context("failed to load portal configuration")
}

/// Save portal configuration to a JSON file
pub fn save_config<P: AsRef<Path>>(config: &PortalConfig, path: P) -> Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Generate a default configuration file
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    save_config(&PortalConfig::default(), path)
}
