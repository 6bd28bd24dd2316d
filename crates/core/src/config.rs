//! Engine configuration loaded from TOML and the environment.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::context::LineSettings;
use crate::ledger::{AveragePolicy, ProfitPolicy};

/// Directory under the user's config directory holding engine files.
pub const CONFIG_DIR: &str = "linefleet";

/// Prefix of environment variables overriding file settings,
/// e.g. `LINEFLEET__AVERAGE_POLICY=reset_monthly`.
pub const ENV_PREFIX: &str = "LINEFLEET";

const DEFAULT_CONFIG: &str = r#"# linefleet engine configuration

# Samples folded into a journey time average before new samples are blended
# in with weight 1/window.
journey_time_window = 16

# "carry_over" keeps average speed / comfort running sums across months,
# "reset_monthly" clears them whenever a month is closed.
average_policy = "carry_over"

# "derived" moves profit with revenue, operating cost and refunds,
# "booked" only changes profit when it is booked directly.
profit_policy = "derived"

# Threads used for the read-only parallel phase of a tick.
worker_threads = 4

# Default tracing filter when RUST_LOG is not set.
log_filter = "info"

# save_dir = "/path/to/saves"
"#;

/// Runtime configuration of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample window of journey time averages.
    pub journey_time_window: u16,
    /// Month-end handling of rolling-average running sums.
    pub average_policy: AveragePolicy,
    /// How the profit column is maintained.
    pub profit_policy: ProfitPolicy,
    /// Directory for save files; defaults to the user config directory.
    pub save_dir: Option<PathBuf>,
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Worker threads for the parallel phase.
    pub worker_threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let line = LineSettings::default();
        Self {
            journey_time_window: line.journey_time_window,
            average_policy: line.average_policy,
            profit_policy: line.profit_policy,
            save_dir: None,
            log_filter: "info".to_string(),
            worker_threads: 4,
        }
    }
}

impl EngineConfig {
    /// Default configuration file location.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
            .join("config.toml")
    }

    /// Load from the default location, overlaid by the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path())
    }

    /// Load from `path` (which may be missing), overlaid by the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        let config: EngineConfig = settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Settings applied to every line.
    pub fn line_settings(&self) -> LineSettings {
        LineSettings {
            journey_time_window: self.journey_time_window.max(1),
            average_policy: self.average_policy,
            profit_policy: self.profit_policy,
        }
    }

    /// Directory save files are written to.
    pub fn save_root(&self) -> PathBuf {
        self.save_dir.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(CONFIG_DIR)
                .join("saves")
        })
    }
}

/// Write the commented default configuration if no file exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = EngineConfig::default_path();
    ensure_default_config_at(&path)?;
    Ok(path)
}

/// Write the commented default configuration to `path` if it is missing.
///
/// Returns `true` when a new file was written.
pub fn ensure_default_config_at(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote default configuration");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_file_matches_default_struct() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested/config.toml");
        assert!(ensure_default_config_at(&path)?);
        assert!(!ensure_default_config_at(&path)?);

        let config = EngineConfig::load_from(&path)?;
        assert_eq!(config, EngineConfig::default());
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
journey_time_window = 4
average_policy = "reset_monthly"
profit_policy = "booked"
save_dir = "/tmp/linefleet-saves"
"#,
        )?;

        let config = EngineConfig::load_from(&path)?;
        assert_eq!(config.journey_time_window, 4);
        assert_eq!(config.average_policy, AveragePolicy::ResetMonthly);
        assert_eq!(config.profit_policy, ProfitPolicy::Booked);
        assert_eq!(config.worker_threads, 4);
        assert_eq!(config.save_root(), PathBuf::from("/tmp/linefleet-saves"));

        let line = config.line_settings();
        assert_eq!(line.journey_time_window, 4);
        assert_eq!(line.average_policy, AveragePolicy::ResetMonthly);
        Ok(())
    }

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = EngineConfig::load_from(dir.path().join("absent.toml"))?;
        assert_eq!(config.profit_policy, ProfitPolicy::Derived);
        assert_eq!(config.line_settings(), LineSettings::default());
        Ok(())
    }
}
