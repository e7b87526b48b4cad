//! Backend configuration contracts and the registry that dispatches to them.
//!
//! Every storage and compute backend contributes a contract that fills in its
//! own defaults and validates its own section. Contracts are looked up by
//! `(category, id)`, so a storage backend and a compute backend may share an
//! id without clashing.

mod serverless;
mod standalone;
mod storage;

use crate::config::{ConfigDocument, Mode, Section};
use crate::error::{BackendError, ConfigError, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Namespace a backend id lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BackendCategory {
    /// Object storage backends
    Storage,
    /// Serverless compute backends
    Serverless,
    /// Standalone (virtual machine) compute backends
    Standalone,
}

impl BackendCategory {
    pub const ALL: [BackendCategory; 3] = [
        BackendCategory::Storage,
        BackendCategory::Serverless,
        BackendCategory::Standalone,
    ];

    /// Compute category for a mode. Localhost has no pluggable compute backend.
    pub fn compute_for(mode: Mode) -> Option<Self> {
        match mode {
            Mode::Localhost => None,
            Mode::Serverless => Some(BackendCategory::Serverless),
            Mode::Standalone => Some(BackendCategory::Standalone),
        }
    }
}

impl std::fmt::Display for BackendCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendCategory::Storage => write!(f, "storage"),
            BackendCategory::Serverless => write!(f, "serverless"),
            BackendCategory::Standalone => write!(f, "standalone"),
        }
    }
}

/// A backend's configuration contract.
///
/// Receives the whole document so it can read cross-cutting fields (the
/// storage bucket, a region) and update its own section in place. Must be
/// idempotent.
pub trait BackendConfig: Send + Sync {
    fn load_config(&self, config: &mut ConfigDocument) -> std::result::Result<(), BackendError>;
}

impl<F> BackendConfig for F
where
    F: Fn(&mut ConfigDocument) -> std::result::Result<(), BackendError> + Send + Sync,
{
    fn load_config(&self, config: &mut ConfigDocument) -> std::result::Result<(), BackendError> {
        self(config)
    }
}

/// Static registry of backend contracts.
pub struct BackendRegistry {
    contracts: BTreeMap<(BackendCategory, String), Box<dyn BackendConfig>>,
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.contracts.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl BackendRegistry {
    /// A registry with no contracts.
    pub fn empty() -> Self {
        Self {
            contracts: BTreeMap::new(),
        }
    }

    /// A registry with every built-in backend registered.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        storage::register(&mut registry);
        serverless::register(&mut registry);
        standalone::register(&mut registry);
        registry
    }

    /// Register a contract, replacing any previous one for the same key.
    pub fn register(
        &mut self,
        category: BackendCategory,
        id: impl Into<String>,
        contract: impl BackendConfig + 'static,
    ) -> &mut Self {
        self.contracts
            .insert((category, id.into()), Box::new(contract));
        self
    }

    pub fn with(
        mut self,
        category: BackendCategory,
        id: impl Into<String>,
        contract: impl BackendConfig + 'static,
    ) -> Self {
        self.register(category, id, contract);
        self
    }

    pub fn contains(&self, category: BackendCategory, id: &str) -> bool {
        self.contracts.contains_key(&(category, id.to_string()))
    }

    /// Registered backend ids in a category, sorted.
    pub fn ids(&self, category: BackendCategory) -> Vec<&str> {
        self.contracts
            .keys()
            .filter(|(c, _)| *c == category)
            .map(|(_, id)| id.as_str())
            .collect()
    }

    /// Run the contract registered for `id` within `category`.
    ///
    /// The backend section is created empty before the contract runs. Errors
    /// raised by the contract are returned untouched.
    pub fn dispatch(
        &self,
        mut config: ConfigDocument,
        category: BackendCategory,
        id: &str,
    ) -> Result<ConfigDocument> {
        let contract = self
            .contracts
            .get(&(category, id.to_string()))
            .ok_or_else(|| ConfigError::UnknownBackend {
                category,
                id: id.to_string(),
            })?;

        debug!(%category, backend = id, "Loading backend configuration");
        config.backend_section_mut(id);
        contract.load_config(&mut config)?;
        Ok(config)
    }
}

// Helpers shared by the built-in contracts.

fn get_str<'a>(section: &'a Section, field: &str) -> Option<&'a str> {
    section.get(field).and_then(Value::as_str)
}

fn require_str<'a>(
    section: &'a Section,
    backend: &str,
    field: &str,
) -> std::result::Result<&'a str, BackendError> {
    match section.get(field) {
        None | Some(Value::Null) => Err(BackendError::missing_field(backend, field)),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(BackendError::invalid_value(backend, field, "expected a string")),
    }
}

fn set_default(section: &mut Section, field: &str, value: impl Into<Value>) {
    section.entry(field.to_string()).or_insert_with(|| value.into());
}

/// Host part of an endpoint URL.
fn endpoint_host(endpoint: &str) -> Option<&str> {
    let rest = endpoint
        .split_once("://")
        .map_or(endpoint, |(_, rest)| rest);
    let host = rest.split(['/', ':']).next()?;
    (!host.is_empty()).then_some(host)
}

/// Check an optional numeric field is a positive integer.
fn check_positive(section: &Section, backend: &str, field: &str) -> std::result::Result<(), BackendError> {
    match section.get(field) {
        None => Ok(()),
        Some(v) if v.as_u64().is_some_and(|n| n > 0) => Ok(()),
        Some(_) => Err(BackendError::invalid_value(
            backend,
            field,
            "expected a positive integer",
        )),
    }
}
