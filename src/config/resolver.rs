//! End-to-end configuration resolution.
//!
//! Source → overrides → alias migration → mode defaults → backend sections →
//! compute backend → storage backend. Each stage takes the document by value
//! and hands it on.

use super::extract;
use super::loader::{ConfigSource, ConfigSources};
use super::merge::{merge_overrides, migrate_deprecated};
use super::mode::apply_mode_defaults;
use super::types::{
    ConfigDocument, ConfigOverrides, Deprecation, Mode, PRODUCT, STORAGE_BACKEND_DEFAULT, Section,
    VERSION,
};
use crate::backends::{BackendCategory, BackendRegistry};
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Resolves the effective configuration from a set of sources and a backend registry.
#[derive(Debug, Default)]
pub struct ConfigResolver {
    sources: ConfigSources,
    registry: BackendRegistry,
}

impl ConfigResolver {
    /// Resolver over the discovered sources and the built-in backends.
    pub fn new() -> Self {
        Self::with_sources(ConfigSources::discover())
    }

    /// Resolver over explicit sources and the built-in backends.
    pub fn with_sources(sources: ConfigSources) -> Self {
        Self {
            sources,
            registry: BackendRegistry::builtin(),
        }
    }

    /// Replace the backend registry.
    pub fn with_registry(mut self, registry: BackendRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn sources(&self) -> &ConfigSources {
        &self.sources
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Resolve the configuration.
    ///
    /// `explicit` short-circuits source discovery; `overrides` are merged on
    /// top of whatever source was chosen.
    pub fn resolve(
        &self,
        explicit: Option<ConfigDocument>,
        overrides: &ConfigOverrides,
    ) -> Result<ResolvedConfig> {
        info!("{} v{}", PRODUCT, VERSION);
        debug!("Loading configuration");

        let loaded = self.sources.load(explicit)?;
        let mut deprecations: Vec<Deprecation> = loaded.deprecation().into_iter().collect();

        let config = merge_overrides(loaded.document, overrides)?;
        let (config, migrated) = migrate_deprecated(config);
        deprecations.extend(migrated);

        let config = apply_mode_defaults(config)?;
        let config = ensure_backend_sections(config);
        let config = self.load_compute_backend(config)?;
        let config = self.load_storage_backend(config)?;

        Ok(ResolvedConfig {
            config,
            source: loaded.source,
            path: loaded.path,
            deprecations,
        })
    }

    fn load_compute_backend(&self, config: ConfigDocument) -> Result<ConfigDocument> {
        let mode = config.mode();
        let Some(category) = BackendCategory::compute_for(mode) else {
            return Ok(config);
        };
        let backend = compute_backend_id(&config, mode);
        match backend {
            Some(id) => {
                debug!("Loading {} backend module: {}", mode, id);
                self.registry.dispatch(config, category, &id)
            }
            None => Ok(config),
        }
    }

    fn load_storage_backend(&self, config: ConfigDocument) -> Result<ConfigDocument> {
        let id = config
            .lithops
            .storage
            .clone()
            .unwrap_or_else(|| STORAGE_BACKEND_DEFAULT.to_string());
        debug!("Loading storage backend module: {}", id);
        self.registry.dispatch(config, BackendCategory::Storage, &id)
    }
}

fn compute_backend_id(config: &ConfigDocument, mode: Mode) -> Option<String> {
    match mode {
        Mode::Localhost => None,
        Mode::Serverless => config.serverless.as_ref().and_then(|s| s.backend.clone()),
        Mode::Standalone => config.standalone.as_ref().and_then(|s| s.backend.clone()),
    }
}

/// Create the sections of every referenced backend, so each contract sees
/// the others' sections even before they have run.
fn ensure_backend_sections(mut config: ConfigDocument) -> ConfigDocument {
    let mode = config.mode();
    let storage = config
        .lithops
        .storage
        .clone()
        .unwrap_or_else(|| STORAGE_BACKEND_DEFAULT.to_string());
    config.backend_section_mut(&storage);
    if let Some(compute) = compute_backend_id(&config, mode) {
        config.backend_section_mut(&compute);
    }
    config
}

/// Resolve using the discovered sources and the built-in backends.
pub fn default_config(
    explicit: Option<ConfigDocument>,
    overrides: &ConfigOverrides,
) -> Result<ConfigDocument> {
    ConfigResolver::new()
        .resolve(explicit, overrides)
        .map(ResolvedConfig::into_config)
}

/// A fully resolved configuration and how it was obtained.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    config: ConfigDocument,
    source: ConfigSource,
    path: Option<PathBuf>,
    deprecations: Vec<Deprecation>,
}

impl ResolvedConfig {
    /// Get the resolved document.
    pub fn config(&self) -> &ConfigDocument {
        &self.config
    }

    /// Consume and return the document.
    pub fn into_config(self) -> ConfigDocument {
        self.config
    }

    pub fn mode(&self) -> Mode {
        self.config.mode()
    }

    /// Which source the raw document came from.
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// The file read, for file-backed sources.
    pub fn config_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Deprecated constructs encountered while resolving.
    pub fn deprecations(&self) -> &[Deprecation] {
        &self.deprecations
    }

    pub fn storage_config(&self) -> Result<Section> {
        extract::extract_storage_config(&self.config)
    }

    pub fn localhost_config(&self) -> Result<Section> {
        extract::extract_localhost_config(&self.config)
    }

    pub fn serverless_config(&self) -> Result<Section> {
        extract::extract_serverless_config(&self.config)
    }

    pub fn standalone_config(&self) -> Result<Section> {
        extract::extract_standalone_config(&self.config)
    }
}
