//! Override merging and deprecated-alias migration.
//!
//! Overrides are applied one level deep: each overridden field replaces the
//! field of the same name, everything else in the section is left alone.
//! Nested mappings are replaced, never merged.

use super::types::{ConfigDocument, ConfigOverrides, Deprecation, GLOBAL_SECTION, Section};
use crate::error::{ConfigError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Shallow update of `base` with the fields of `overlay`.
///
/// # Example
/// ```
/// use serde_json::{json, Map};
/// use lithops_config::config::shallow_update;
///
/// let mut base: Map<_, _> = json!({"backend": "ibm_cf", "runtime": {"memory": 256}})
///     .as_object().unwrap().clone();
/// let overlay = json!({"runtime": {"timeout": 60}}).as_object().unwrap().clone();
/// shallow_update(&mut base, &overlay);
/// // Result: {"backend": "ibm_cf", "runtime": {"timeout": 60}}
/// assert_eq!(base["runtime"], json!({"timeout": 60}));
/// assert_eq!(base["backend"], json!("ibm_cf"));
/// ```
pub fn shallow_update(base: &mut Section, overlay: &Section) {
    for (key, value) in overlay {
        base.insert(key.clone(), value.clone());
    }
}

/// Apply a shallow update to a typed section, creating it if absent.
fn update_section<T>(section: Option<T>, overlay: &Section, name: &str) -> Result<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    let invalid = |source| ConfigError::InvalidOverride {
        section: name.to_string(),
        source,
    };

    let mut base = match serde_json::to_value(section.unwrap_or_default()).map_err(invalid)? {
        Value::Object(map) => map,
        _ => Section::new(),
    };
    shallow_update(&mut base, overlay);
    serde_json::from_value(Value::Object(base)).map_err(invalid)
}

/// Merge user overrides into the document, section by section.
pub fn merge_overrides(mut doc: ConfigDocument, overrides: &ConfigOverrides) -> Result<ConfigDocument> {
    if let Some(ref overlay) = overrides.lithops {
        debug!(fields = overlay.len(), "Applying lithops overrides");
        doc.lithops = update_section(Some(doc.lithops), overlay, GLOBAL_SECTION)?;
    }

    if let Some(ref overlay) = overrides.localhost {
        debug!(fields = overlay.len(), "Applying localhost overrides");
        doc.localhost = Some(update_section(doc.localhost, overlay, "localhost")?);
    }

    if let Some(ref overlay) = overrides.serverless {
        debug!(fields = overlay.len(), "Applying serverless overrides");
        doc.serverless = Some(update_section(doc.serverless, overlay, "serverless")?);
    }

    if let Some(ref overlay) = overrides.standalone {
        debug!(fields = overlay.len(), "Applying standalone overrides");
        doc.standalone = Some(update_section(doc.standalone, overlay, "standalone")?);
    }

    Ok(doc)
}

/// Rewrite the deprecated `executor` field into `mode`.
///
/// `executor` wins over an explicit `mode`, and is removed afterwards so later
/// stages never see it.
pub fn migrate_deprecated(mut doc: ConfigDocument) -> (ConfigDocument, Vec<Deprecation>) {
    let mut deprecations = Vec::new();

    if let Some(executor) = doc.lithops.executor.take() {
        warn!("{}", Deprecation::ExecutorAlias);
        doc.lithops.mode = Some(executor);
        deprecations.push(Deprecation::ExecutorAlias);
    }

    (doc, deprecations)
}
