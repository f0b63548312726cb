//! Service configuration
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file (`--config <path>`)
//! 4. Compiled default

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Default listen port
pub const DEFAULT_PORT: u16 = 2828;

/// Deployment mode, controlling how tracks are acquired and how the
/// completion callback delivers the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    /// Track locators are local filesystem paths; the callback body is the
    /// result file's path.
    Local,
    /// Track locators are URLs to download; the callback body is the result
    /// file's bytes.
    Remote,
}

impl std::fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentMode::Local => write!(f, "local"),
            DeploymentMode::Remote => write!(f, "remote"),
        }
    }
}

/// Command-line arguments for somp-md
#[derive(Parser, Debug)]
#[command(name = "somp-md")]
#[command(about = "Audio mastering microservice")]
#[command(version)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "SOMP_MD_PORT")]
    port: Option<u16>,

    /// Directory where per-job working folders are created
    #[arg(short, long, env = "SOMP_MD_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Where tracks live and how results are delivered
    #[arg(short, long, env = "SOMP_MD_LOCATION", value_enum)]
    location: Option<DeploymentMode>,

    /// Maximum number of jobs doing signal processing at once
    #[arg(long, env = "SOMP_MD_DSP_WORKERS")]
    dsp_workers: Option<usize>,

    /// Optional TOML configuration file
    #[arg(short, long, env = "SOMP_MD_CONFIG")]
    config: Option<PathBuf>,
}

/// Optional settings read from the TOML config file
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    port: Option<u16>,
    workspace: Option<PathBuf>,
    location: Option<DeploymentMode>,
    dsp_workers: Option<usize>,
}

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub workspace: PathBuf,
    pub location: DeploymentMode,
    pub dsp_workers: usize,
}

impl Config {
    /// Resolve the effective configuration from arguments, environment
    /// (already merged into `args` by clap), config file, and defaults.
    pub fn resolve(args: Args) -> Result<Config> {
        let file = match &args.config {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Cannot read {}: {}", path.display(), e))
                })?;
                toml::from_str::<FileConfig>(&content).map_err(|e| {
                    Error::Config(format!("Cannot parse {}: {}", path.display(), e))
                })?
            }
            None => FileConfig::default(),
        };

        let dsp_workers = args
            .dsp_workers
            .or(file.dsp_workers)
            .unwrap_or_else(default_dsp_workers);
        if dsp_workers == 0 {
            return Err(Error::Config("dsp_workers must be at least 1".to_string()));
        }

        Ok(Config {
            port: args.port.or(file.port).unwrap_or(DEFAULT_PORT),
            workspace: args
                .workspace
                .or(file.workspace)
                .unwrap_or_else(|| PathBuf::from("workspace")),
            location: args
                .location
                .or(file.location)
                .unwrap_or(DeploymentMode::Local),
            dsp_workers,
        })
    }
}

fn default_dsp_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
}
