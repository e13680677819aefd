//! TOML configuration parsing.
//!
//! One file describes where the SQLite registry lives, where the Docusaurus
//! site is on disk, where repositories and deletion backups go, and which
//! address the HTTP server binds to.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::mutator::SiteLayout;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub site: SiteConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// How long a writer waits on a locked database before giving up. The
    /// CLI and a running server share one file.
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// Directory holding `docusaurus.config.js` and one subdirectory per project.
    pub root: PathBuf,
    #[serde(default = "default_config_file")]
    pub config_file: String,
    /// Where timestamped config backups are written. Defaults to `root`.
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,
    /// `editUrl` emitted into new plugin entries, when set.
    #[serde(default)]
    pub edit_url: Option<String>,
}

fn default_config_file() -> String {
    "docusaurus.config.js".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkspaceConfig {
    #[serde(default = "default_repositories")]
    pub repositories: PathBuf,
    #[serde(default = "default_backups")]
    pub backups: PathBuf,
    #[serde(default = "default_init_script")]
    pub init_script: PathBuf,
    /// Working directory for the init script. Defaults to the script's parent.
    #[serde(default)]
    pub script_cwd: Option<PathBuf>,
    #[serde(default = "default_script_timeout_secs")]
    pub script_timeout_secs: u64,
    #[serde(default = "default_branch")]
    pub default_branch: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            repositories: default_repositories(),
            backups: default_backups(),
            init_script: default_init_script(),
            script_cwd: None,
            script_timeout_secs: default_script_timeout_secs(),
            default_branch: default_branch(),
        }
    }
}

fn default_repositories() -> PathBuf {
    PathBuf::from("./repositories")
}
fn default_backups() -> PathBuf {
    PathBuf::from("./backups")
}
fn default_init_script() -> PathBuf {
    PathBuf::from("./scripts/initialize-project.sh")
}
fn default_script_timeout_secs() -> u64 {
    120
}
fn default_branch() -> String {
    "master".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3001".to_string()
}

impl SiteConfig {
    pub fn config_path(&self) -> PathBuf {
        self.root.join(&self.config_file)
    }
}

impl Config {
    /// The document handle the config mutator operates on.
    pub fn site_layout(&self) -> SiteLayout {
        SiteLayout {
            root: self.site.root.clone(),
            config_file: self.site.config_file.clone(),
            backup_dir: self
                .site
                .backup_dir
                .clone()
                .unwrap_or_else(|| self.site.root.clone()),
            edit_url: self.site.edit_url.clone(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.site.config_file.trim().is_empty() {
        anyhow::bail!("site.config_file must not be empty");
    }

    if Path::new(&config.site.config_file).components().count() != 1 {
        anyhow::bail!(
            "site.config_file must be a bare file name, got '{}'",
            config.site.config_file
        );
    }

    if config.db.max_connections == 0 {
        anyhow::bail!("db.max_connections must be > 0");
    }

    if config.workspace.script_timeout_secs == 0 {
        anyhow::bail!("workspace.script_timeout_secs must be > 0");
    }

    if config.workspace.default_branch.trim().is_empty() {
        anyhow::bail!("workspace.default_branch must not be empty");
    }

    Ok(())
}
