use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::control::CancelToken;
use crate::mirror::{EndpointSet, Timeouts};
use crate::run::CrawlConfig;

/// Canonical Maven Central layout.
pub const CENTRAL: &str = "https://repo1.maven.org/maven2/";

/// Request timeouts in seconds (`[timeouts]` in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub connect_secs: u64,
    /// Whole-request limit for listings and manifests.
    pub browse_secs: u64,
    /// Whole-request limit for one file download.
    pub download_secs: u64,
    /// Abort a transfer that stays under 1 KiB/s for this long.
    pub low_speed_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            browse_secs: 30,
            download_secs: 600,
            low_speed_secs: 60,
        }
    }
}

impl TimeoutsConfig {
    pub fn to_timeouts(&self) -> Timeouts {
        Timeouts {
            connect: Duration::from_secs(self.connect_secs),
            browse: Duration::from_secs(self.browse_secs),
            download: Duration::from_secs(self.download_secs),
            low_speed: Duration::from_secs(self.low_speed_secs),
        }
    }
}

fn default_browse() -> EndpointSet {
    EndpointSet::new(vec!["https://maven.proxy.ustclug.org/maven2/".to_string()], CENTRAL)
}

fn default_download() -> EndpointSet {
    EndpointSet::new(
        vec![
            "https://maven.proxy.ustclug.org/maven2/".to_string(),
            "https://maven.aliyun.com/repository/public".to_string(),
            "https://mirrors.cloud.tencent.com/nexus/repository/maven-public/".to_string(),
            "https://mirrors.huaweicloud.com/repository/maven/".to_string(),
        ],
        CENTRAL,
    )
}

/// Global configuration loaded from `~/.config/mvnget/config.toml`.
/// Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MvngetConfig {
    /// Concurrent download workers.
    pub workers: usize,
    /// Maximum dependency expansion depth (0 = the seed group only).
    pub max_depth: u32,
    /// Substring tokens; matching groups, artifacts, or versions are skipped.
    pub exclude: Vec<String>,
    /// File name suffixes that are downloaded from version directories.
    pub allowed_suffixes: Vec<String>,
    pub timeouts: TimeoutsConfig,
    /// Endpoints for directory listings.
    pub browse: EndpointSet,
    /// Endpoints for file downloads.
    pub download: EndpointSet,
}

impl Default for MvngetConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            max_depth: 2,
            exclude: Vec::new(),
            allowed_suffixes: [".pom", ".jar", ".aar", ".war", ".module", ".xml"]
                .into_iter()
                .map(String::from)
                .collect(),
            timeouts: TimeoutsConfig::default(),
            browse: default_browse(),
            download: default_download(),
        }
    }
}

impl MvngetConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            anyhow::bail!("workers must be at least 1");
        }
        if self.allowed_suffixes.iter().any(|s| s.trim().is_empty()) {
            anyhow::bail!("allowed_suffixes must not contain empty entries");
        }
        self.browse.validate().context("[browse] endpoints")?;
        self.download.validate().context("[download] endpoints")?;
        Ok(())
    }

    /// Bundle handed to [`crate::run::run_crawl`].
    pub fn crawl_config(&self, output_root: PathBuf, cancel: CancelToken) -> CrawlConfig {
        CrawlConfig {
            output_root,
            workers: self.workers,
            max_depth: self.max_depth,
            exclude: self.exclude.clone(),
            allowed_suffixes: self.allowed_suffixes.clone(),
            browse: self.browse.clone(),
            download: self.download.clone(),
            timeouts: self.timeouts.to_timeouts(),
            resume: true,
            dry_run: false,
            cancel,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mvnget")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from the XDG path, creating a default file if none exists.
pub fn load_or_init() -> Result<MvngetConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = MvngetConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit path; the file must exist.
pub fn load_from(path: &Path) -> Result<MvngetConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: MvngetConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
