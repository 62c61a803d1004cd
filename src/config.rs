//! Walk, naming and report configuration.
//!
//! Settings are read from a TOML file and can be overridden from the command
//! line. Every section and field is optional.
//!
//! # Configuration File Format
//!
//! ```toml
//! [walk]
//! include_hidden = false
//! ignore = ["node_modules", "target"]
//!
//! [naming]
//! case_policy = "sensitive"   # or "insensitive"
//!
//! [files]
//! preview = "standardization_preview.md"
//! plan = "standardization_plan.md"
//! ```

use crate::naming::CasePolicy;
use crate::plan::Planner;
use crate::plan_file::{PLAN_FILE_NAME, PREVIEW_FILE_NAME};
use crate::walker::TreeWalker;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const CONFIG_FILE_NAME: &str = ".tidytreerc.toml";

/// Errors that can occur while loading configuration.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// A report file name is not a bare file name.
    #[error("Invalid file name for '{field}': '{value}' must be a plain file name")]
    InvalidFileName { field: &'static str, value: String },
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Root of the configuration file.
///
/// Each section maps to one table in the TOML file and falls back to its
/// defaults when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TidyConfig {
    #[serde(default)]
    pub walk: WalkRules,
    #[serde(default)]
    pub naming: NamingRules,
    #[serde(default)]
    pub files: ReportFiles,
}

/// Which entries the walker numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkRules {
    /// Number hidden entries (starting with "."). Defaults to false.
    #[serde(default)]
    pub include_hidden: bool,

    /// Folder names that are recorded as ignored and never entered.
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// How proposed names are compared for collisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingRules {
    #[serde(default)]
    pub case_policy: CasePolicy,
}

/// Names of the reports written into the walk root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFiles {
    #[serde(default = "default_preview")]
    pub preview: String,
    #[serde(default = "default_plan")]
    pub plan: String,
}

fn default_preview() -> String {
    PREVIEW_FILE_NAME.to_string()
}

fn default_plan() -> String {
    PLAN_FILE_NAME.to_string()
}

impl Default for ReportFiles {
    fn default() -> Self {
        Self {
            preview: default_preview(),
            plan: default_plan(),
        }
    }
}

impl TidyConfig {
    /// Load configuration, with fallback to defaults.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Optional explicit path to a configuration file
    /// * `root` - The directory being standardized
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.tidytreerc.toml` in the directory being standardized
    /// 3. Look for `~/.config/tidy-tree/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but
    /// cannot be read, or if any file found is invalid.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use tidy_tree::config::TidyConfig;
    ///
    /// let config = TidyConfig::load(None, Path::new("/path/to/archive"))?;
    /// println!("ignoring {:?}", config.walk.ignore);
    /// # Ok::<(), tidy_tree::config::ConfigError>(())
    /// ```
    pub fn load(config_path: Option<&Path>, root: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = root.join(CONFIG_FILE_NAME);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("tidy-tree")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML configuration file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration text.
    ///
    /// Missing sections and fields take their defaults.
    ///
    /// # Arguments
    ///
    /// * `content` - TOML configuration text
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigInvalid` if the TOML does not parse or has
    /// an unknown case policy, and `ConfigError::InvalidFileName` if a report
    /// name is not a bare file name.
    ///
    /// # Example
    ///
    /// ```
    /// use tidy_tree::config::TidyConfig;
    /// use tidy_tree::naming::CasePolicy;
    ///
    /// let config = TidyConfig::from_toml("[naming]\ncase_policy = \"insensitive\"\n").unwrap();
    /// assert_eq!(config.naming.case_policy, CasePolicy::Insensitive);
    /// assert_eq!(config.files.plan, "standardization_plan.md");
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("files.preview", &self.files.preview), ("files.plan", &self.files.plan)] {
            let is_bare = !value.is_empty()
                && Path::new(value).file_name().and_then(|n| n.to_str()) == Some(value.as_str());
            if !is_bare {
                return Err(ConfigError::InvalidFileName {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    /// Builds the tree walker described by this configuration.
    ///
    /// The tool's own reports and config file are kept out of the root
    /// listing so they are never renumbered.
    pub fn walker(&self) -> TreeWalker {
        TreeWalker::new()
            .include_hidden(self.walk.include_hidden)
            .ignore(self.walk.ignore.iter().cloned())
            .exclude_at_root([
                self.files.preview.clone(),
                self.files.plan.clone(),
                CONFIG_FILE_NAME.to_string(),
            ])
    }

    /// Builds a planner that walks with [`TidyConfig::walker`] and resolves
    /// collisions under the configured case policy.
    pub fn planner(&self) -> Planner {
        Planner::new(self.walker(), self.naming.case_policy)
    }

    /// Where the dry-run preview is written for `root`.
    ///
    /// # Arguments
    ///
    /// * `root` - The directory being standardized
    pub fn preview_path(&self, root: &Path) -> PathBuf {
        root.join(&self.files.preview)
    }

    /// Where the editable plan is written and read back for `root`.
    ///
    /// # Arguments
    ///
    /// * `root` - The directory being standardized
    pub fn plan_path(&self, root: &Path) -> PathBuf {
        root.join(&self.files.plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_skips_hidden_files() {
        let config = TidyConfig::default();
        assert!(!config.walk.include_hidden);
        assert!(config.walk.ignore.is_empty());
        assert_eq!(config.naming.case_policy, CasePolicy::Sensitive);
    }

    #[test]
    fn test_default_report_names() {
        let config = TidyConfig::default();
        let root = Path::new("/archive");
        assert_eq!(
            config.preview_path(root),
            PathBuf::from("/archive/standardization_preview.md")
        );
        assert_eq!(
            config.plan_path(root),
            PathBuf::from("/archive/standardization_plan.md")
        );
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = TidyConfig::from_toml("").unwrap();
        assert_eq!(config, TidyConfig::default());
    }

    #[test]
    fn test_full_config_parses() {
        let config = TidyConfig::from_toml(
            r#"
            [walk]
            include_hidden = true
            ignore = ["node_modules", "target"]

            [naming]
            case_policy = "insensitive"

            [files]
            preview = "preview.md"
            plan = "plan.md"
            "#,
        )
        .unwrap();

        assert!(config.walk.include_hidden);
        assert_eq!(config.walk.ignore, vec!["node_modules", "target"]);
        assert_eq!(config.naming.case_policy, CasePolicy::Insensitive);
        assert_eq!(config.files.plan, "plan.md");
    }

    #[test]
    fn test_partial_files_section_keeps_other_default() {
        let config = TidyConfig::from_toml("[files]\nplan = \"my_plan.md\"\n").unwrap();
        assert_eq!(config.files.plan, "my_plan.md");
        assert_eq!(config.files.preview, PREVIEW_FILE_NAME);
    }

    #[test]
    fn test_invalid_case_policy_is_rejected() {
        let result = TidyConfig::from_toml("[naming]\ncase_policy = \"shouting\"\n");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_report_name_must_be_bare() {
        let result = TidyConfig::from_toml("[files]\nplan = \"../plan.md\"\n");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidFileName {
                field: "files.plan",
                ..
            })
        ));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let missing = temp_dir.path().join("nope.toml");
        let result = TidyConfig::load(Some(&missing), temp_dir.path());
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_local_config_is_found_in_root() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "[walk]\nignore = [\"build\"]\n",
        )
        .unwrap();

        let config = TidyConfig::load(None, temp_dir.path()).unwrap();
        assert_eq!(config.walk.ignore, vec!["build"]);
    }

    #[test]
    fn test_walker_never_lists_own_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join(PREVIEW_FILE_NAME), "preview").unwrap();
        fs::write(base.join(PLAN_FILE_NAME), "plan").unwrap();
        fs::write(base.join("Notes.txt"), "notes").unwrap();

        let config = TidyConfig {
            walk: WalkRules {
                include_hidden: true,
                ignore: Vec::new(),
            },
            ..Default::default()
        };
        let listings = config.walker().walk(base).unwrap();
        assert_eq!(listings[0].files, vec!["Notes.txt"]);
    }
}
