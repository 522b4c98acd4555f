//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::core::pulltest::{PullCriteria, PullCriteriaOverride};
use crate::core::tolerance::{BandOverride, ToleranceTable};
use crate::core::variant::ComponentVariant;

/// Directory holding the working-directory config
pub const LOCAL_CONFIG_DIR: &str = ".modqc";

/// modqc configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default output format
    pub default_format: Option<String>,

    /// Log filter directive (e.g. "info", "modqc=debug")
    pub log_level: Option<String>,

    /// Band overrides keyed by band name
    pub tolerances: BTreeMap<String, BandOverride>,

    /// Pull-test acceptance criteria; unset fields keep their defaults
    pub pull_test: PullCriteriaOverride,

    /// Config files that could not be read, with the reason
    #[serde(skip)]
    pub skipped: Vec<SkippedConfig>,
}

/// A config file left out of the merge
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedConfig {
    pub path: PathBuf,
    pub reason: String,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    ///
    /// Unreadable files end up in `skipped`; call [`Config::warn_skipped`]
    /// once a subscriber is installed.
    pub fn load() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let mut config = Self::from_files(Self::global_config_path().as_deref(), &cwd);

        // Environment variables
        if let Ok(format) = std::env::var("MODQC_FORMAT") {
            config.default_format = Some(format);
        }
        if let Ok(level) = std::env::var("MODQC_LOG") {
            config.log_level = Some(level);
        }

        config
    }

    /// Merge the global file (if any) and `<dir>/.modqc/config.yaml`
    pub fn from_files(global: Option<&Path>, dir: &Path) -> Self {
        let mut config = Config::default();

        let local_path = dir.join(LOCAL_CONFIG_DIR).join("config.yaml");

        for path in global.into_iter().chain(std::iter::once(local_path.as_path())) {
            match Self::read_file(path) {
                Ok(Some(layer)) => config.merge(layer),
                Ok(None) => {}
                Err(reason) => config.skipped.push(SkippedConfig {
                    path: path.to_path_buf(),
                    reason,
                }),
            }
        }

        config
    }

    /// Parse one config file; a missing file is `Ok(None)`
    fn read_file(path: &Path) -> Result<Option<Config>, String> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        serde_yml::from_str::<Config>(&contents)
            .map(Some)
            .map_err(|e| format!("malformed YAML: {}", e))
    }

    /// Log every skipped config file
    pub fn warn_skipped(&self) {
        for skipped in &self.skipped {
            warn!("Skipping config {}: {}", skipped.path.display(), skipped.reason);
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "modqc")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
        for (name, o) in other.tolerances {
            let entry = self.tolerances.entry(name).or_default();
            if o.lower.is_some() {
                entry.lower = o.lower;
            }
            if o.upper.is_some() {
                entry.upper = o.upper;
            }
        }
        self.pull_test.merge(other.pull_test);
    }

    /// Effective tolerance table of a variant
    pub fn tolerance_table(&self, variant: ComponentVariant) -> ToleranceTable {
        ToleranceTable::for_variant(variant).with_overrides(&self.tolerances)
    }

    /// Effective pull-test criteria
    pub fn pull_criteria(&self) -> PullCriteria {
        self.pull_test.apply(PullCriteria::default())
    }
}
