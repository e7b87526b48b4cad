//! Configuration source discovery.
//!
//! Picks exactly one source for the raw document, first match wins:
//! explicit document, `LITHOPS_CONFIG`, `LITHOPS_CONFIG_FILE`, `./.lithops_config`,
//! `~/.lithops/config`, the legacy `~/.lithops_config`, and finally a minimal
//! localhost document.

use super::types::{ConfigDocument, Deprecation};
use crate::error::{ConfigError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable holding an inline JSON document.
pub const CONFIG_ENV_VAR: &str = "LITHOPS_CONFIG";

/// Environment variable holding a configuration file path.
pub const CONFIG_FILE_ENV_VAR: &str = "LITHOPS_CONFIG_FILE";

/// Project-local configuration file, relative to the working directory.
pub const PROJECT_CONFIG_FILE: &str = ".lithops_config";

/// Installation-scoped configuration directory under the home directory.
pub const CONFIG_DIR: &str = ".lithops";

/// Deprecated configuration file under the home directory.
pub const LEGACY_CONFIG_FILE: &str = ".lithops_config";

/// Where the raw document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Document supplied by the caller
    Explicit,
    /// Inline JSON from `LITHOPS_CONFIG`
    InlineEnv,
    /// File named by `LITHOPS_CONFIG_FILE`
    FileEnv,
    /// Project-local `.lithops_config`
    Project,
    /// `~/.lithops/config`
    Global,
    /// Deprecated `~/.lithops_config`
    Legacy,
    /// No source found
    Defaults,
}

impl ConfigSource {
    pub fn is_deprecated(&self) -> bool {
        matches!(self, ConfigSource::Legacy)
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Explicit => write!(f, "explicit"),
            ConfigSource::InlineEnv => write!(f, "environment ({})", CONFIG_ENV_VAR),
            ConfigSource::FileEnv => write!(f, "environment ({})", CONFIG_FILE_ENV_VAR),
            ConfigSource::Project => write!(f, "project"),
            ConfigSource::Global => write!(f, "global"),
            ConfigSource::Legacy => write!(f, "legacy (deprecated)"),
            ConfigSource::Defaults => write!(f, "defaults"),
        }
    }
}

/// A raw document together with its origin.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub document: ConfigDocument,
    pub source: ConfigSource,
    /// Path of the file read, for file-backed sources.
    pub path: Option<PathBuf>,
}

impl LoadedSource {
    /// Deprecation implied by the source itself.
    pub fn deprecation(&self) -> Option<Deprecation> {
        match (self.source, &self.path) {
            (ConfigSource::Legacy, Some(path)) => Some(Deprecation::LegacyConfigFile(path.clone())),
            _ => None,
        }
    }
}

/// Candidate configuration sources.
///
/// `discover()` reads them from the process environment; tests and embedders
/// build them explicitly instead.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Inline JSON document text
    pub inline_config: Option<String>,
    /// Explicitly named configuration file
    pub config_file: Option<PathBuf>,
    /// Project-local configuration file
    pub project_file: Option<PathBuf>,
    /// Installation-scoped configuration file
    pub global_file: Option<PathBuf>,
    /// Deprecated home-directory configuration file
    pub legacy_file: Option<PathBuf>,
}

impl ConfigSources {
    /// Discover sources from the environment, working directory and home directory.
    pub fn discover() -> Self {
        let inline_config = std::env::var(CONFIG_ENV_VAR).ok();
        let config_file = std::env::var(CONFIG_FILE_ENV_VAR).ok().map(PathBuf::from);

        let sources = Self {
            inline_config,
            config_file,
            project_file: Some(PathBuf::from(PROJECT_CONFIG_FILE)),
            ..Self::default()
        };

        match dirs::home_dir() {
            Some(home) => sources.with_home_dir(home),
            None => sources,
        }
    }

    /// No sources at all; resolves to the localhost defaults.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_inline_config(mut self, json: impl Into<String>) -> Self {
        self.inline_config = Some(json.into());
        self
    }

    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn with_project_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_file = Some(path.into());
        self
    }

    /// Derive the global and legacy file locations from a home directory.
    pub fn with_home_dir(mut self, home: impl AsRef<Path>) -> Self {
        let home = home.as_ref();
        self.global_file = Some(home.join(CONFIG_DIR).join("config"));
        self.legacy_file = Some(home.join(LEGACY_CONFIG_FILE));
        self
    }

    /// The configuration file that would be read, if any.
    ///
    /// Existence checks run in precedence order, so the global file shadows
    /// the legacy one when both exist. The file named by `LITHOPS_CONFIG_FILE`
    /// is chosen whether or not it exists.
    pub fn config_filename(&self) -> Option<(PathBuf, ConfigSource)> {
        if let Some(ref path) = self.config_file {
            return Some((path.clone(), ConfigSource::FileEnv));
        }

        if let Some(ref path) = self.project_file
            && path.exists()
        {
            let path = std::path::absolute(path).unwrap_or_else(|_| path.clone());
            return Some((path, ConfigSource::Project));
        }

        if let Some(ref path) = self.global_file
            && path.exists()
        {
            return Some((path.clone(), ConfigSource::Global));
        }

        if let Some(ref path) = self.legacy_file
            && path.exists()
        {
            return Some((path.clone(), ConfigSource::Legacy));
        }

        None
    }

    /// The source `load` would use, without reading anything.
    ///
    /// `explicit` says whether the caller will pass an explicit document.
    pub fn which(&self, explicit: bool) -> (ConfigSource, Option<PathBuf>) {
        if explicit {
            return (ConfigSource::Explicit, None);
        }
        if self.inline_config.is_some() {
            return (ConfigSource::InlineEnv, None);
        }
        match self.config_filename() {
            Some((path, source)) => (source, Some(path)),
            None => (ConfigSource::Defaults, None),
        }
    }

    /// Load the raw document from the highest-precedence source.
    pub fn load(&self, explicit: Option<ConfigDocument>) -> Result<LoadedSource> {
        if let Some(document) = explicit {
            info!("Using explicit configuration document");
            return Ok(LoadedSource {
                document,
                source: ConfigSource::Explicit,
                path: None,
            });
        }

        if let Some(ref json) = self.inline_config {
            info!("Getting configuration from {} environment variable", CONFIG_ENV_VAR);
            return Ok(LoadedSource {
                document: parse_inline_config(json)?,
                source: ConfigSource::InlineEnv,
                path: None,
            });
        }

        if let Some((path, source)) = self.config_filename() {
            if source.is_deprecated() {
                warn!(
                    "{} is deprecated. Please move your configuration file into ~/{}/config",
                    path.display(),
                    CONFIG_DIR
                );
            }
            info!("Getting configuration from {}", path.display());
            let document = load_config_file(&path)?;
            return Ok(LoadedSource {
                document,
                source,
                path: Some(path),
            });
        }

        debug!("No config file found. Running on localhost mode");
        Ok(LoadedSource {
            document: ConfigDocument::localhost_defaults(),
            source: ConfigSource::Defaults,
            path: None,
        })
    }
}

/// Parse an inline JSON document.
pub fn parse_inline_config(json: &str) -> Result<ConfigDocument> {
    let value: Value = serde_json::from_str(json).map_err(|source| ConfigError::InlineJson {
        var: CONFIG_ENV_VAR.to_string(),
        source,
    })?;
    ConfigDocument::from_value(value).map_err(|source| ConfigError::InvalidDocument {
        origin: CONFIG_ENV_VAR.to_string(),
        source,
    })
}

/// Read and decode a YAML (or JSON) configuration file.
pub fn load_config_file(path: &Path) -> Result<ConfigDocument> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    let value: Value = if content.trim().is_empty() {
        Value::Null
    } else {
        serde_yaml::from_str(&content).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source,
        })?
    };

    ConfigDocument::from_value(value).map_err(|source| ConfigError::InvalidDocument {
        origin: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    /// Sources rooted in a temp dir with every file tier populated.
    fn all_file_tiers(temp: &TempDir) -> ConfigSources {
        let home = temp.path().join("home");
        let project = temp.path().join("project").join(PROJECT_CONFIG_FILE);
        let env_file = temp.path().join("env.yaml");

        write(&env_file, "lithops:\n  storage_bucket: from-env-file\n");
        write(&project, "lithops:\n  storage_bucket: from-project\n");
        write(
            &home.join(CONFIG_DIR).join("config"),
            "lithops:\n  storage_bucket: from-global\n",
        );
        write(
            &home.join(LEGACY_CONFIG_FILE),
            "lithops:\n  storage_bucket: from-legacy\n",
        );

        ConfigSources::empty()
            .with_config_file(env_file)
            .with_project_file(project)
            .with_home_dir(home)
    }

    fn bucket(loaded: &LoadedSource) -> Option<&str> {
        loaded.document.lithops.storage_bucket.as_deref()
    }

    #[test]
    fn test_no_sources_yields_localhost_defaults() {
        let loaded = ConfigSources::empty().load(None).unwrap();
        assert_eq!(loaded.source, ConfigSource::Defaults);
        assert_eq!(loaded.document.lithops.mode, Some(Mode::Localhost));
        assert!(loaded.path.is_none());
    }

    #[test]
    fn test_missing_files_fall_through_to_defaults() {
        let temp = TempDir::new().unwrap();
        let sources = ConfigSources::empty()
            .with_project_file(temp.path().join(PROJECT_CONFIG_FILE))
            .with_home_dir(temp.path());
        let loaded = sources.load(None).unwrap();
        assert_eq!(loaded.source, ConfigSource::Defaults);
    }

    #[test]
    fn test_explicit_document_wins() {
        let temp = TempDir::new().unwrap();
        let sources = all_file_tiers(&temp).with_inline_config(r#"{"lithops": {}}"#);

        let mut explicit = ConfigDocument::default();
        explicit.lithops.storage_bucket = Some("explicit".into());

        let loaded = sources.load(Some(explicit)).unwrap();
        assert_eq!(loaded.source, ConfigSource::Explicit);
        assert_eq!(bucket(&loaded), Some("explicit"));
    }

    #[test]
    fn test_inline_env_beats_files() {
        let temp = TempDir::new().unwrap();
        let sources = all_file_tiers(&temp)
            .with_inline_config(r#"{"lithops": {"storage_bucket": "inline"}}"#);

        let loaded = sources.load(None).unwrap();
        assert_eq!(loaded.source, ConfigSource::InlineEnv);
        assert_eq!(bucket(&loaded), Some("inline"));
    }

    #[test]
    fn test_file_tiers_in_precedence_order() {
        let temp = TempDir::new().unwrap();
        let mut sources = all_file_tiers(&temp);

        let loaded = sources.load(None).unwrap();
        assert_eq!(loaded.source, ConfigSource::FileEnv);
        assert_eq!(bucket(&loaded), Some("from-env-file"));

        sources.config_file = None;
        let loaded = sources.load(None).unwrap();
        assert_eq!(loaded.source, ConfigSource::Project);
        assert_eq!(bucket(&loaded), Some("from-project"));

        sources.project_file = None;
        let loaded = sources.load(None).unwrap();
        assert_eq!(loaded.source, ConfigSource::Global);
        assert_eq!(bucket(&loaded), Some("from-global"));
        assert!(loaded.deprecation().is_none());

        sources.global_file = None;
        let loaded = sources.load(None).unwrap();
        assert_eq!(loaded.source, ConfigSource::Legacy);
        assert_eq!(bucket(&loaded), Some("from-legacy"));
        assert!(matches!(
            loaded.deprecation(),
            Some(Deprecation::LegacyConfigFile(_))
        ));
    }

    #[test]
    fn test_malformed_inline_json_is_fatal() {
        let sources = ConfigSources::empty().with_inline_config("{not json");
        let err = sources.load(None).unwrap_err();
        assert!(matches!(err, ConfigError::InlineJson { .. }));
    }

    #[test]
    fn test_named_file_must_exist() {
        let temp = TempDir::new().unwrap();
        let sources = ConfigSources::empty().with_config_file(temp.path().join("missing.yaml"));
        let err = sources.load(None).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_unparseable_file_is_fatal() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.yaml");
        write(&path, "lithops: [unclosed\n");
        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseFile { .. }));
    }

    #[test]
    fn test_empty_file_is_empty_document() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.yaml");
        write(&path, "\n");
        let doc = load_config_file(&path).unwrap();
        assert_eq!(doc, ConfigDocument::default());
    }

    #[test]
    fn test_config_filename_reports_choice() {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("home");
        write(&home.join(LEGACY_CONFIG_FILE), "lithops: {}\n");

        let sources = ConfigSources::empty().with_home_dir(&home);
        let (path, source) = sources.config_filename().unwrap();
        assert_eq!(source, ConfigSource::Legacy);
        assert_eq!(path, home.join(LEGACY_CONFIG_FILE));

        assert!(ConfigSources::empty().config_filename().is_none());
    }

    #[test]
    fn test_which_matches_load() {
        let temp = TempDir::new().unwrap();
        let sources = all_file_tiers(&temp).with_inline_config(r#"{"lithops": {}}"#);

        let (source, path) = sources.which(false);
        assert_eq!(source, ConfigSource::InlineEnv);
        assert!(path.is_none());
        assert_eq!(sources.load(None).unwrap().source, source);

        assert_eq!(sources.which(true), (ConfigSource::Explicit, None));
        assert_eq!(ConfigSources::empty().which(false), (ConfigSource::Defaults, None));
    }
}
