use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "prisma-typegen.toml";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub output: OutputConfig,
    pub models: ModelConfig,
    pub watch: WatchConfig,
}

/// Where TypeScript sources come from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub root: PathBuf,
    pub extensions: Vec<String>,
    /// Substrings of the root-relative path, or glob patterns
    pub exclude: Vec<String>,
}

/// Schema output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub provider: String,
    /// Environment variable holding the connection string
    pub url_env: String,
    pub preserve_preamble: bool,
    pub include_docs: bool,
}

/// Model classification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub classifier: ClassifierKind,
    /// Names that are always treated as models
    pub pinned: Vec<String>,
    pub excluded_suffixes: Vec<String>,
    /// Doc tag required by the marker classifier
    pub marker: String,
}

/// Watch mode settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub enabled: bool,
    pub debounce_ms: u64,
    pub stability_ms: u64,
}

/// Which "is this a model" rule to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    #[default]
    Naming,
    Marker,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("src"),
            extensions: ["ts", "tsx", "mts", "cts"].iter().map(|s| s.to_string()).collect(),
            exclude: ["node_modules", "dist", "build", ".next", ".git", "coverage"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("prisma/schema.prisma"),
            provider: "postgresql".to_string(),
            url_env: "DATABASE_URL".to_string(),
            preserve_preamble: true,
            include_docs: true,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierKind::default(),
            pinned: Vec::new(),
            excluded_suffixes: [
                "Props", "State", "Config", "Options", "Params", "Context", "Request",
                "Response", "Input", "Args",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            marker: "@model".to_string(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            debounce_ms: 300,
            stability_ms: 100,
        }
    }
}

/// CLI overrides, applied on top of the loaded config
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub provider: Option<String>,
    pub exclude: Vec<String>,
    pub no_preserve: bool,
    pub no_docs: bool,
    pub watch: bool,
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file or return defaults
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(Error::Io(_)) => Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                Self::default()
            }
        }
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: CliOverrides) {
        if let Some(root) = cli.root {
            self.source.root = root;
        }

        if let Some(out) = cli.output {
            self.output.path = out;
        }

        if let Some(provider) = cli.provider {
            self.output.provider = provider;
        }

        if !cli.exclude.is_empty() {
            self.source.exclude.extend(cli.exclude);
        }

        if cli.no_preserve {
            self.output.preserve_preamble = false;
        }

        if cli.no_docs {
            self.output.include_docs = false;
        }

        if cli.watch {
            self.watch.enabled = true;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.source.extensions.is_empty() {
            return Err(Error::config_validation("at least one source extension required"));
        }

        if self.output.provider.trim().is_empty() {
            return Err(Error::config_validation("provider must not be empty"));
        }

        if self.output.url_env.trim().is_empty() {
            return Err(Error::config_validation("url_env must not be empty"));
        }

        if self.models.classifier == ClassifierKind::Marker
            && self.models.marker.trim().is_empty()
        {
            return Err(Error::config_validation("marker classifier needs a marker tag"));
        }

        if self.watch.debounce_ms == 0 {
            return Err(Error::config_validation("debounce_ms must be at least 1"));
        }

        for pattern in self.source.exclude.iter().filter(|p| is_glob(p)) {
            glob::Pattern::new(pattern)?;
        }

        Ok(())
    }
}

/// Whether an exclude entry should be matched as a glob rather than a substring
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}
