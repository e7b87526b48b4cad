//! Configuration types and structures.
//!
//! The document keeps the on-disk layout: a `lithops` global section, one
//! section per execution mode, and any number of backend sections keyed by
//! backend id. Known fields are typed; everything else is carried verbatim in
//! flattened maps so that no stage ever drops a field it does not understand.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Product name used for the global section and the client user agent.
pub const PRODUCT: &str = "lithops";

/// Version stamped into backend user agents.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the global section.
pub const GLOBAL_SECTION: &str = "lithops";

pub const MODE_DEFAULT: Mode = Mode::Serverless;
pub const EXECUTION_TIMEOUT_DEFAULT: u64 = 1800;
pub const STORAGE_BACKEND_DEFAULT: &str = "ibm_cos";
pub const SERVERLESS_BACKEND_DEFAULT: &str = "ibm_cf";
pub const STANDALONE_BACKEND_DEFAULT: &str = "ibm_vpc";
pub const STANDALONE_RUNTIME_DEFAULT: &str = "python3";
pub const STANDALONE_AUTO_DISMANTLE_DEFAULT: bool = true;
pub const STANDALONE_SOFT_DISMANTLE_TIMEOUT_DEFAULT: u64 = 300;
pub const STANDALONE_HARD_DISMANTLE_TIMEOUT_DEFAULT: u64 = 3600;
pub const LOCALHOST_RUNTIME_DEFAULT: &str = "python3";

/// Placeholder bucket used in localhost mode. Always forced, never read from the user.
pub const LOCALHOST_STORAGE_BUCKET: &str = "storage";

/// Storage backend selected by default in localhost mode.
pub const LOCALHOST_STORAGE_BACKEND: &str = "localhost";

/// `<product>/<version>` string handed to backend clients.
pub fn user_agent() -> String {
    format!("{}/{}", PRODUCT, VERSION)
}

/// An untyped section: field name to value.
pub type Section = serde_json::Map<String, Value>;

/// Execution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Run on the local machine
    Localhost,
    /// Run on a serverless compute backend
    Serverless,
    /// Run on a standalone cluster of virtual machines
    Standalone,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Localhost, Mode::Serverless, Mode::Standalone];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Localhost => "localhost",
            Mode::Serverless => "serverless",
            Mode::Standalone => "standalone",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }
}

impl Default for Mode {
    fn default() -> Self {
        MODE_DEFAULT
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The `lithops` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalSection {
    /// Active execution mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,

    /// Deprecated alias for `mode`. Removed once migrated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor: Option<Mode>,

    /// Storage backend id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_bucket: Option<String>,

    /// Region handed to the storage backend, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_region: Option<String>,

    /// Job execution timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_timeout: Option<u64>,

    #[serde(flatten)]
    pub extra: Section,
}

/// The `localhost` mode section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalhostSection {
    /// Interpreter used to run jobs locally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,

    #[serde(flatten)]
    pub extra: Section,
}

/// The `serverless` mode section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerlessSection {
    /// Compute backend id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,

    /// Region propagated into the backend view on extraction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(flatten)]
    pub extra: Section,
}

/// The `standalone` mode section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandaloneSection {
    /// Compute backend id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,

    /// Tear the cluster down once jobs complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_dismantle: Option<bool>,

    /// Idle seconds before a graceful dismantle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soft_dismantle_timeout: Option<u64>,

    /// Seconds before a forced dismantle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hard_dismantle_timeout: Option<u64>,

    #[serde(flatten)]
    pub extra: Section,
}

/// A full configuration document.
///
/// Top-level keys other than `lithops` and the mode names are backend sections.
/// The document is one flat namespace, so a backend whose id equals a reserved
/// section name (the `localhost` storage backend, for one) shares that section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub lithops: GlobalSection,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localhost: Option<LocalhostSection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serverless: Option<ServerlessSection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standalone: Option<StandaloneSection>,

    /// Backend sections keyed by backend id.
    #[serde(flatten)]
    pub backends: BTreeMap<String, Section>,
}

impl ConfigDocument {
    /// The document used when no configuration source exists.
    pub fn localhost_defaults() -> Self {
        let mut doc = Self::default();
        doc.lithops.mode = Some(Mode::Localhost);
        doc
    }

    /// Build a document from a decoded JSON/YAML value.
    ///
    /// Top-level keys with an empty body (`aws_s3:` in YAML) decode as empty
    /// sections rather than failing.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        let value = match value {
            Value::Null => Value::Object(Section::new()),
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, v)| match v {
                        Value::Null => (key, Value::Object(Section::new())),
                        other => (key, other),
                    })
                    .collect(),
            ),
            other => other,
        };
        serde_json::from_value(value)
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Effective mode: the configured one or the process-wide default.
    pub fn mode(&self) -> Mode {
        self.lithops.mode.unwrap_or_default()
    }

    /// Snapshot of a backend section as an untyped map.
    ///
    /// Reserved section names resolve to the matching typed section, with its
    /// typed fields included.
    pub fn backend_section(&self, id: &str) -> Option<Section> {
        match id {
            GLOBAL_SECTION => section_map(&self.lithops),
            "localhost" => self.localhost.as_ref().and_then(section_map),
            "serverless" => self.serverless.as_ref().and_then(section_map),
            "standalone" => self.standalone.as_ref().and_then(section_map),
            _ => self.backends.get(id).cloned(),
        }
    }

    /// Mutable access to a backend section, creating it empty if absent.
    ///
    /// For reserved section names this is the section's untyped part.
    pub fn backend_section_mut(&mut self, id: &str) -> &mut Section {
        match id {
            GLOBAL_SECTION => &mut self.lithops.extra,
            "localhost" => &mut self.localhost.get_or_insert_with(Default::default).extra,
            "serverless" => &mut self.serverless.get_or_insert_with(Default::default).extra,
            "standalone" => &mut self.standalone.get_or_insert_with(Default::default).extra,
            _ => self.backends.entry(id.to_string()).or_default(),
        }
    }

    pub fn has_backend_section(&self, id: &str) -> bool {
        match id {
            GLOBAL_SECTION => true,
            "localhost" => self.localhost.is_some(),
            "serverless" => self.serverless.is_some(),
            "standalone" => self.standalone.is_some(),
            _ => self.backends.contains_key(id),
        }
    }

    /// Snapshot of a mode section as an untyped map, if present.
    pub fn mode_section(&self, mode: Mode) -> Option<Section> {
        self.backend_section(mode.as_str())
    }
}

fn section_map<T: Serialize>(section: &T) -> Option<Section> {
    match serde_json::to_value(section) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// A deprecated construct found while resolving. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deprecation {
    /// Configuration was read from the legacy `~/.lithops_config` file.
    LegacyConfigFile(PathBuf),
    /// The global section used `executor` instead of `mode`.
    ExecutorAlias,
}

impl std::fmt::Display for Deprecation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Deprecation::LegacyConfigFile(path) => write!(
                f,
                "{} is deprecated. Please move your configuration file into ~/.lithops/config",
                path.display()
            ),
            Deprecation::ExecutorAlias => write!(
                f,
                "'executor' key in lithops section is deprecated, use 'mode' key instead"
            ),
        }
    }
}

/// User overrides applied on top of the loaded document.
///
/// Only the global section and the three mode sections can be overridden.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lithops: Option<Section>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localhost: Option<Section>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serverless: Option<Section>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standalone: Option<Section>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single field. Returns `false` if `section` cannot be overridden.
    pub fn set(&mut self, section: &str, key: impl Into<String>, value: Value) -> bool {
        let target = match section {
            GLOBAL_SECTION => &mut self.lithops,
            "localhost" => &mut self.localhost,
            "serverless" => &mut self.serverless,
            "standalone" => &mut self.standalone,
            _ => return false,
        };
        target
            .get_or_insert_with(Section::new)
            .insert(key.into(), value);
        true
    }

    pub fn with(mut self, section: &str, key: impl Into<String>, value: Value) -> Self {
        self.set(section, key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.lithops.is_none()
            && self.localhost.is_none()
            && self.serverless.is_none()
            && self.standalone.is_none()
    }
}
