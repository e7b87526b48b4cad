//! Serverless compute backend contracts.

use super::{
    BackendCategory, BackendRegistry, check_positive, endpoint_host, get_str, require_str,
    set_default,
};
use crate::config::ConfigDocument;
use crate::error::BackendError;
use serde_json::Value;

const IBM_CF_RUNTIME_MEMORY_DEFAULT: u64 = 256;
const IBM_CF_RUNTIME_TIMEOUT_DEFAULT: u64 = 600;
const IBM_CF_RUNTIME_TIMEOUT_MAX: u64 = 600;
const IBM_CF_MAX_WORKERS_DEFAULT: u64 = 1200;

const AWS_LAMBDA_RUNTIME_MEMORY_DEFAULT: u64 = 256;
const AWS_LAMBDA_RUNTIME_MEMORY_RANGE: (u64, u64) = (128, 10240);
const AWS_LAMBDA_RUNTIME_TIMEOUT_DEFAULT: u64 = 180;
const AWS_LAMBDA_RUNTIME_TIMEOUT_MAX: u64 = 900;
const AWS_LAMBDA_MAX_WORKERS_DEFAULT: u64 = 1000;

pub(super) fn register(registry: &mut BackendRegistry) {
    registry
        .register(BackendCategory::Serverless, "ibm_cf", load_ibm_cf)
        .register(BackendCategory::Serverless, "aws_lambda", load_aws_lambda);
}

fn check_at_most(
    value: Option<&Value>,
    backend: &str,
    field: &str,
    max: u64,
) -> Result<(), BackendError> {
    match value.and_then(Value::as_u64) {
        Some(n) if n > max => Err(BackendError::invalid_value(
            backend,
            field,
            format!("{} exceeds the maximum of {}", n, max),
        )),
        _ => Ok(()),
    }
}

fn load_ibm_cf(config: &mut ConfigDocument) -> Result<(), BackendError> {
    const BACKEND: &str = "ibm_cf";

    let iam_api_key = config
        .backends
        .get("ibm")
        .and_then(|ibm| get_str(ibm, "iam_api_key"))
        .map(str::to_string);
    let section = config.backend_section_mut(BACKEND);

    let endpoint = require_str(section, BACKEND, "endpoint")?;
    let region = endpoint_host(endpoint)
        .and_then(|host| host.split('.').next())
        .map(str::to_string);
    require_str(section, BACKEND, "namespace")?;

    // Either a classic namespace key or an IAM-enabled namespace.
    let has_api_key = get_str(section, "api_key").is_some();
    let has_namespace_id = get_str(section, "namespace_id").is_some();
    if !has_api_key && !has_namespace_id {
        return Err(BackendError::missing_field(BACKEND, "api_key"));
    }
    if has_namespace_id && !has_api_key {
        match iam_api_key {
            Some(key) => set_default(section, "iam_api_key", key),
            None => return Err(BackendError::missing_field("ibm", "iam_api_key")),
        }
    }

    if let Some(region) = region {
        set_default(section, "region", region);
    }
    set_default(section, "runtime_memory", IBM_CF_RUNTIME_MEMORY_DEFAULT);
    set_default(section, "runtime_timeout", IBM_CF_RUNTIME_TIMEOUT_DEFAULT);
    set_default(section, "max_workers", IBM_CF_MAX_WORKERS_DEFAULT);

    for field in ["runtime_memory", "runtime_timeout", "max_workers"] {
        check_positive(section, BACKEND, field)?;
    }
    check_at_most(
        section.get("runtime_timeout"),
        BACKEND,
        "runtime_timeout",
        IBM_CF_RUNTIME_TIMEOUT_MAX,
    )?;
    Ok(())
}

fn load_aws_lambda(config: &mut ConfigDocument) -> Result<(), BackendError> {
    const BACKEND: &str = "aws_lambda";

    let shared_region = config
        .backends
        .get("aws")
        .and_then(|aws| get_str(aws, "region_name"))
        .map(str::to_string);
    let section = config.backend_section_mut(BACKEND);

    require_str(section, BACKEND, "execution_role")?;
    if let Some(region) = shared_region {
        set_default(section, "region_name", region);
    }
    let region = require_str(section, BACKEND, "region_name")?.to_string();

    set_default(section, "runtime_memory", AWS_LAMBDA_RUNTIME_MEMORY_DEFAULT);
    set_default(section, "runtime_timeout", AWS_LAMBDA_RUNTIME_TIMEOUT_DEFAULT);
    set_default(section, "max_workers", AWS_LAMBDA_MAX_WORKERS_DEFAULT);

    for field in ["runtime_memory", "runtime_timeout", "max_workers"] {
        check_positive(section, BACKEND, field)?;
    }
    let (min_memory, max_memory) = AWS_LAMBDA_RUNTIME_MEMORY_RANGE;
    if let Some(memory) = section.get("runtime_memory").and_then(Value::as_u64)
        && !(min_memory..=max_memory).contains(&memory)
    {
        return Err(BackendError::invalid_value(
            BACKEND,
            "runtime_memory",
            format!("must be between {} and {} MB", min_memory, max_memory),
        ));
    }
    check_at_most(
        section.get("runtime_timeout"),
        BACKEND,
        "runtime_timeout",
        AWS_LAMBDA_RUNTIME_TIMEOUT_MAX,
    )?;

    // Functions and their bucket live in the same region unless told otherwise.
    if config.lithops.storage.as_deref() == Some("aws_s3") && config.lithops.storage_region.is_none()
    {
        set_default(config.backend_section_mut("aws_s3"), "region_name", region);
    }
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
    fn test_ibm_cf_defaults() {
        let mut config = doc(json!({"ibm_cf": {
            "endpoint": "https://us-east.functions.cloud.ibm.com",
            "namespace": "ns",
            "api_key": "k"
        }}));
        load_ibm_cf(&mut config).unwrap();
        let section = &config.backends["ibm_cf"];
        assert_eq!(section["region"], json!("us-east"));
        assert_eq!(section["runtime_memory"], json!(256));
        assert_eq!(section["runtime_timeout"], json!(600));
        assert_eq!(section["max_workers"], json!(1200));
    }

    #[test]
    fn test_ibm_cf_requires_endpoint() {
        let mut config = doc(json!({"ibm_cf": {"namespace": "ns", "api_key": "k"}}));
        let err = load_ibm_cf(&mut config).unwrap_err();
        assert!(err.to_string().contains("'endpoint'"));
    }

    #[test]
    fn test_ibm_cf_iam_namespace_needs_iam_key() {
        let mut config = doc(json!({"ibm_cf": {
            "endpoint": "https://eu-gb.functions.cloud.ibm.com",
            "namespace": "ns",
            "namespace_id": "id"
        }}));
        let err = load_ibm_cf(&mut config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "'iam_api_key' is mandatory in ibm section of the configuration"
        );

        config
            .backend_section_mut("ibm")
            .insert("iam_api_key".into(), json!("iam"));
        load_ibm_cf(&mut config).unwrap();
        assert_eq!(config.backends["ibm_cf"]["iam_api_key"], json!("iam"));
    }

    #[test]
    fn test_ibm_cf_rejects_long_timeout() {
        let mut config = doc(json!({"ibm_cf": {
            "endpoint": "https://us-south.functions.cloud.ibm.com",
            "namespace": "ns",
            "api_key": "k",
            "runtime_timeout": 900
        }}));
        let err = load_ibm_cf(&mut config).unwrap_err();
        assert!(matches!(err, BackendError::InvalidValue { ref field, .. } if field == "runtime_timeout"));
    }

    #[test]
    fn test_aws_lambda_requires_role() {
        let mut config = doc(json!({"aws_lambda": {"region_name": "us-east-1"}}));
        let err = load_aws_lambda(&mut config).unwrap_err();
        assert!(matches!(err, BackendError::MissingField { ref field, .. } if field == "execution_role"));
    }

    #[test]
    fn test_aws_lambda_memory_bounds() {
        let mut config = doc(json!({"aws_lambda": {
            "execution_role": "arn:aws:iam::1:role/r",
            "region_name": "us-east-1",
            "runtime_memory": 64
        }}));
        let err = load_aws_lambda(&mut config).unwrap_err();
        assert!(err.to_string().contains("runtime_memory"));
    }

    #[test]
    fn test_aws_lambda_seeds_storage_region() {
        let mut config = doc(json!({
            "lithops": {"storage": "aws_s3"},
            "aws_lambda": {"execution_role": "arn:aws:iam::1:role/r", "region_name": "eu-west-1"}
        }));
        load_aws_lambda(&mut config).unwrap();
        assert_eq!(config.backends["aws_s3"]["region_name"], json!("eu-west-1"));
        assert_eq!(config.backends["aws_lambda"]["runtime_timeout"], json!(180));
    }

    #[test]
    fn test_aws_lambda_leaves_other_storage_alone() {
        let mut config = doc(json!({
            "lithops": {"storage": "ibm_cos"},
            "aws_lambda": {"execution_role": "arn:aws:iam::1:role/r", "region_name": "eu-west-1"}
        }));
        load_aws_lambda(&mut config).unwrap();
        assert!(!config.backends.contains_key("aws_s3"));
    }
}
