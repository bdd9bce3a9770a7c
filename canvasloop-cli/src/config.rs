use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use canvasloop_core::StageConfig;

pub const CONFIG_DIR: &str = ".canvasloop";
pub const CONFIG_FILE: &str = "config.toml";

/// Configuration read from `.canvasloop/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub stage: StageConfig,
    pub terminal: TerminalConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Milliseconds between repaints of the terminal canvas.
    pub repaint_ms: u64,
    /// Lines kept in the log panel.
    pub log_lines: usize,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            repaint_ms: 16,
            log_lines: 500,
        }
    }
}

impl CliConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.stage.input.validate()?;
        if self.terminal.repaint_ms == 0 {
            anyhow::bail!("terminal.repaint_ms must be at least 1");
        }
        if self.terminal.log_lines == 0 {
            anyhow::bail!("terminal.log_lines must be at least 1");
        }
        Ok(())
    }
}

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Passed with `--config`.
    Explicit(PathBuf),
    /// Found by walking up from the working directory.
    Project(PathBuf),
    /// The per-user config directory.
    User(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(path) | Self::Project(path) | Self::User(path) => {
                write!(f, "{}", path.display())
            }
            Self::Defaults => f.write_str("built-in defaults"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: CliConfig,
    pub source: ConfigSource,
}

/// Resolve the configuration: an explicit path wins, then the nearest
/// project config, then the user config, then defaults.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<LoadedConfig> {
    if let Some(path) = explicit {
        return Ok(LoadedConfig {
            config: read(path)?,
            source: ConfigSource::Explicit(path.to_path_buf()),
        });
    }
    if let Some(path) = find_project_config(&std::env::current_dir()?) {
        return Ok(LoadedConfig {
            config: read(&path)?,
            source: ConfigSource::Project(path),
        });
    }
    if let Some(path) = user_config_path().filter(|p| p.exists()) {
        return Ok(LoadedConfig {
            config: read(&path)?,
            source: ConfigSource::User(path),
        });
    }
    Ok(LoadedConfig {
        config: CliConfig::default(),
        source: ConfigSource::Defaults,
    })
}

/// Find `.canvasloop/config.toml` starting from a directory, walking up.
pub fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_DIR).join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("canvasloop").join(CONFIG_FILE))
}

pub fn read(path: &Path) -> anyhow::Result<CliConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config: CliConfig =
        toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

/// Write the default config under `dir/.canvasloop/`. Refuses to replace an
/// existing file unless `force` is set.
pub fn write_default(dir: &Path, force: bool) -> anyhow::Result<PathBuf> {
    let config_dir = dir.join(CONFIG_DIR);
    let path = config_dir.join(CONFIG_FILE);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists.\nUse `canvasloop init --force` to overwrite it.",
            path.display()
        );
    }
    std::fs::create_dir_all(&config_dir)?;
    std::fs::write(&path, toml::to_string_pretty(&CliConfig::default())?)?;
    Ok(path)
}
