//! Consumer-specific views of a resolved document.
//!
//! Every view is an independent copy: mutating it never reaches the document
//! or any other view.

use super::types::{ConfigDocument, Mode, Section, user_agent};
use crate::error::{ConfigError, Result};
use serde_json::Value;

fn missing(section: &str) -> ConfigError {
    ConfigError::MissingSection {
        section: section.to_string(),
    }
}

/// Copy a backend section, stamping the user agent and an optional region.
fn backend_view(config: &ConfigDocument, id: &str, region: Option<&str>) -> Result<Section> {
    let mut section = config.backend_section(id).ok_or_else(|| missing(id))?;
    section.insert("user_agent".into(), Value::String(user_agent()));
    if let Some(region) = region {
        section.insert("region".into(), Value::String(region.to_string()));
    }
    Ok(section)
}

/// `{backend, bucket, <backend>: {...}}` for the storage client.
pub fn extract_storage_config(config: &ConfigDocument) -> Result<Section> {
    let global = &config.lithops;
    let backend = global.storage.as_deref().ok_or_else(|| missing("lithops.storage"))?;
    let bucket = global
        .storage_bucket
        .as_deref()
        .ok_or_else(|| missing("lithops.storage_bucket"))?;

    let mut view = Section::new();
    view.insert("backend".into(), Value::String(backend.to_string()));
    view.insert("bucket".into(), Value::String(bucket.to_string()));
    view.insert(
        backend.to_string(),
        Value::Object(backend_view(config, backend, global.storage_region.as_deref())?),
    );
    Ok(view)
}

/// The `localhost` section, verbatim.
pub fn extract_localhost_config(config: &ConfigDocument) -> Result<Section> {
    config
        .mode_section(Mode::Localhost)
        .ok_or_else(|| missing("localhost"))
}

/// The `serverless` section with its compute backend nested under its id.
pub fn extract_serverless_config(config: &ConfigDocument) -> Result<Section> {
    compute_view(config, Mode::Serverless)
}

/// The `standalone` section with its compute backend nested under its id.
pub fn extract_standalone_config(config: &ConfigDocument) -> Result<Section> {
    compute_view(config, Mode::Standalone)
}

fn compute_view(config: &ConfigDocument, mode: Mode) -> Result<Section> {
    let mut view = config
        .mode_section(mode)
        .ok_or_else(|| missing(mode.as_str()))?;

    let backend = view
        .get("backend")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| missing(&format!("{}.backend", mode)))?;
    let region = view.get("region").and_then(Value::as_str).map(str::to_string);

    let section = backend_view(config, &backend, region.as_deref())?;
    view.insert(backend, Value::Object(section));
    Ok(view)
}
