//! Configuration loading for crowdmap.
//! Reads crowdmap.toml from `--config`, the path in CROWDMAP_CONFIG, or the
//! current directory. A missing default file means built-in defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crowdmap_common::AnalysisConfig;

pub const CONFIG_ENV: &str = "CROWDMAP_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "crowdmap.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub lexicon: LexiconConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Directory holding one `<target>.json` mention file per target.
    #[serde(default = "default_mentions_dir")]
    pub mentions_dir: PathBuf,
    /// Source tag for mentions that carry none.
    #[serde(default = "default_source_tag")]
    pub default_source: String,
}

fn default_mentions_dir() -> PathBuf { PathBuf::from("./mentions") }
fn default_source_tag()   -> String  { "clinicaltrials".to_string() }

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            mentions_dir: default_mentions_dir(),
            default_source: default_source_tag(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LexiconConfig {
    /// Replaces the built-in lexicon when set.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_output_dir() -> PathBuf { PathBuf::from("./output") }

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: default_output_dir() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_parallel_workers")]
    pub parallel_workers: usize,
}

fn default_parallel_workers() -> usize { 4 }

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self { parallel_workers: default_parallel_workers() }
    }
}


impl Config {
    /// Load configuration.
    /// An explicit path (argument or CROWDMAP_CONFIG) must exist; the
    /// implicit ./crowdmap.toml may be absent.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match explicit {
            Some(p) => (p.to_path_buf(), true),
            None => match std::env::var(CONFIG_ENV) {
                Ok(p) if !p.trim().is_empty() => (PathBuf::from(p), true),
                _ => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
            },
        };

        if !path.exists() {
            if required {
                anyhow::bail!(
                    "Config file not found: {}\n\
                     Copy crowdmap.example.toml to crowdmap.toml and edit it.",
                    path.display()
                );
            }
            tracing::debug!("No {} found, using built-in defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.analysis.validate()?;
        if self.execution.parallel_workers == 0 {
            anyhow::bail!("execution.parallel_workers must be at least 1");
        }
        Ok(())
    }
}
