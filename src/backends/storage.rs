//! Storage backend contracts.

use super::{BackendCategory, BackendRegistry, get_str, require_str, set_default};
use crate::config::{ConfigDocument, Section};
use crate::error::BackendError;
use serde_json::Value;
use std::path::PathBuf;

pub(super) fn register(registry: &mut BackendRegistry) {
    registry
        .register(BackendCategory::Storage, "localhost", load_localhost)
        .register(BackendCategory::Storage, "ibm_cos", load_ibm_cos)
        .register(BackendCategory::Storage, "aws_s3", load_aws_s3);
}

/// Directory the localhost backend keeps objects in unless configured.
pub fn default_storage_dir() -> PathBuf {
    std::env::temp_dir().join("lithops").join("storage")
}

fn load_localhost(config: &mut ConfigDocument) -> Result<(), BackendError> {
    let section = config.backend_section_mut("localhost");
    set_default(
        section,
        "storage_dir",
        default_storage_dir().to_string_lossy().into_owned(),
    );
    Ok(())
}

/// Copy a field from a shared provider section (`ibm`, `aws`) when the
/// backend section does not set it.
fn inherit(config: &mut ConfigDocument, backend: &str, provider: &str, from: &str, to: &str) {
    let inherited = config
        .backends
        .get(provider)
        .and_then(|shared| shared.get(from))
        .cloned();
    if let Some(value) = inherited {
        set_default(config.backend_section_mut(backend), to, value);
    }
}

fn has_str(section: &Section, field: &str) -> bool {
    get_str(section, field).is_some()
}

fn load_ibm_cos(config: &mut ConfigDocument) -> Result<(), BackendError> {
    const BACKEND: &str = "ibm_cos";

    inherit(config, BACKEND, "ibm", "iam_api_key", "api_key");
    let storage_region = config.lithops.storage_region.clone();
    let section = config.backend_section_mut(BACKEND);

    if let Some(region) = storage_region {
        set_default(section, "region", region);
    }

    if !section.contains_key("endpoint") {
        let region = require_str(section, BACKEND, "region")?;
        let endpoint = format!("https://s3.{}.cloud-object-storage.appdomain.cloud", region);
        section.insert("endpoint".into(), Value::String(endpoint));
    } else if !section.contains_key("region") {
        let endpoint = require_str(section, BACKEND, "endpoint")?;
        if let Some(region) = cos_region_from_endpoint(endpoint) {
            section.insert("region".into(), Value::String(region));
        }
    }

    let hmac = has_str(section, "access_key_id") && has_str(section, "secret_access_key");
    if !hmac && !has_str(section, "api_key") {
        return Err(BackendError::missing_field(BACKEND, "api_key"));
    }

    Ok(())
}

/// `https://s3.<region>.cloud-object-storage.appdomain.cloud` -> `<region>`
fn cos_region_from_endpoint(endpoint: &str) -> Option<String> {
    let host = super::endpoint_host(endpoint)?;
    let mut labels = host.split('.');
    match (labels.next(), labels.next()) {
        (Some("s3"), Some(region)) if !region.is_empty() => Some(region.to_string()),
        _ => None,
    }
}

fn load_aws_s3(config: &mut ConfigDocument) -> Result<(), BackendError> {
    const BACKEND: &str = "aws_s3";

    inherit(config, BACKEND, "aws", "access_key_id", "access_key_id");
    inherit(config, BACKEND, "aws", "secret_access_key", "secret_access_key");
    let storage_region = config.lithops.storage_region.clone();
    if let Some(region) = storage_region {
        set_default(config.backend_section_mut(BACKEND), "region_name", region);
    }
    inherit(config, BACKEND, "aws", "region_name", "region_name");

    let section = config.backend_section_mut(BACKEND);
    require_str(section, BACKEND, "access_key_id")?;
    require_str(section, BACKEND, "secret_access_key")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> ConfigDocument {
        ConfigDocument::from_value(value).unwrap()
    }

    #[test]
    fn test_localhost_sets_storage_dir_in_shared_section() {
        let mut config = ConfigDocument::localhost_defaults();
        load_localhost(&mut config).unwrap();
        let section = config.backend_section("localhost").unwrap();
        assert!(section["storage_dir"].is_string());
        assert!(config.backends.is_empty());
    }

    #[test]
    fn test_localhost_keeps_configured_dir() {
        let mut config = doc(json!({"localhost": {"storage_dir": "/data"}}));
        load_localhost(&mut config).unwrap();
        assert_eq!(config.localhost.unwrap().extra["storage_dir"], json!("/data"));
    }

    #[test]
    fn test_ibm_cos_derives_endpoint_from_region() {
        let mut config = doc(json!({"ibm_cos": {"region": "us-east", "api_key": "k"}}));
        load_ibm_cos(&mut config).unwrap();
        assert_eq!(
            config.backends["ibm_cos"]["endpoint"],
            json!("https://s3.us-east.cloud-object-storage.appdomain.cloud")
        );
    }

    #[test]
    fn test_ibm_cos_uses_storage_region() {
        let mut config = doc(json!({
            "lithops": {"storage_region": "eu-de"},
            "ibm_cos": {"api_key": "k"}
        }));
        load_ibm_cos(&mut config).unwrap();
        assert_eq!(config.backends["ibm_cos"]["region"], json!("eu-de"));
    }

    #[test]
    fn test_ibm_cos_derives_region_from_endpoint() {
        let mut config = doc(json!({"ibm_cos": {
            "endpoint": "https://s3.jp-tok.cloud-object-storage.appdomain.cloud",
            "access_key_id": "a",
            "secret_access_key": "s"
        }}));
        load_ibm_cos(&mut config).unwrap();
        assert_eq!(config.backends["ibm_cos"]["region"], json!("jp-tok"));
    }

    #[test]
    fn test_ibm_cos_needs_region_or_endpoint() {
        let mut config = doc(json!({"ibm_cos": {"api_key": "k"}}));
        let err = load_ibm_cos(&mut config).unwrap_err();
        assert!(matches!(err, BackendError::MissingField { ref field, .. } if field == "region"));
    }

    #[test]
    fn test_ibm_cos_needs_credentials() {
        let mut config = doc(json!({"ibm_cos": {"region": "us-south"}}));
        let err = load_ibm_cos(&mut config).unwrap_err();
        assert!(matches!(err, BackendError::MissingField { ref field, .. } if field == "api_key"));
    }

    #[test]
    fn test_ibm_cos_inherits_iam_key() {
        let mut config = doc(json!({
            "ibm": {"iam_api_key": "shared"},
            "ibm_cos": {"region": "us-south"}
        }));
        load_ibm_cos(&mut config).unwrap();
        assert_eq!(config.backends["ibm_cos"]["api_key"], json!("shared"));
    }

    #[test]
    fn test_aws_s3_requires_keys() {
        let mut config = doc(json!({"aws_s3": {"region_name": "us-east-1"}}));
        let err = load_aws_s3(&mut config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "'access_key_id' is mandatory in aws_s3 section of the configuration"
        );
    }

    #[test]
    fn test_aws_s3_inherits_from_aws_section() {
        let mut config = doc(json!({
            "aws": {"access_key_id": "a", "secret_access_key": "s", "region_name": "eu-west-1"},
            "aws_s3": {}
        }));
        load_aws_s3(&mut config).unwrap();
        let section = &config.backends["aws_s3"];
        assert_eq!(section["access_key_id"], json!("a"));
        assert_eq!(section["region_name"], json!("eu-west-1"));
    }

    #[test]
    fn test_aws_s3_storage_region_beats_shared_region() {
        let mut config = doc(json!({
            "lithops": {"storage_region": "us-west-2"},
            "aws": {"region_name": "eu-west-1"},
            "aws_s3": {"access_key_id": "a", "secret_access_key": "s"}
        }));
        load_aws_s3(&mut config).unwrap();
        assert_eq!(config.backends["aws_s3"]["region_name"], json!("us-west-2"));
    }

    #[test]
    fn test_aws_s3_region_is_optional() {
        let mut config = doc(json!({
            "aws_s3": {"access_key_id": "a", "secret_access_key": "s"}
        }));
        load_aws_s3(&mut config).unwrap();
        assert!(config.backends["aws_s3"].get("region_name").is_none());
    }

    #[test]
    fn test_contracts_are_idempotent() {
        let mut config = doc(json!({"ibm_cos": {"region": "us-east", "api_key": "k"}}));
        load_ibm_cos(&mut config).unwrap();
        let once = config.clone();
        load_ibm_cos(&mut config).unwrap();
        assert_eq!(config, once);
    }
}
