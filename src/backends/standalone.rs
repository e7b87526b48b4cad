//! Standalone compute backend contracts.

use super::{BackendCategory, BackendRegistry, endpoint_host, get_str, require_str, set_default};
use crate::config::ConfigDocument;
use crate::error::BackendError;
use std::path::PathBuf;

const IBM_VPC_PROFILE_DEFAULT: &str = "cx2-2x4";
const IBM_VPC_BOOT_VOLUME_PROFILE_DEFAULT: &str = "general-purpose";
const VM_SSH_USER_DEFAULT: &str = "root";

pub(super) fn register(registry: &mut BackendRegistry) {
    registry
        .register(BackendCategory::Standalone, "ibm_vpc", load_ibm_vpc)
        .register(BackendCategory::Standalone, "vm", load_vm);
}

fn load_ibm_vpc(config: &mut ConfigDocument) -> Result<(), BackendError> {
    const BACKEND: &str = "ibm_vpc";

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
    require_str(section, BACKEND, "vpc_id")?;
    require_str(section, BACKEND, "resource_group_id")?;

    if let Some(key) = iam_api_key {
        set_default(section, "iam_api_key", key);
    }
    if let Some(region) = region {
        set_default(section, "region", region);
    }
    set_default(section, "profile_name", IBM_VPC_PROFILE_DEFAULT);
    set_default(
        section,
        "boot_volume_profile",
        IBM_VPC_BOOT_VOLUME_PROFILE_DEFAULT,
    );
    Ok(())
}

fn load_vm(config: &mut ConfigDocument) -> Result<(), BackendError> {
    const BACKEND: &str = "vm";

    let section = config.backend_section_mut(BACKEND);
    require_str(section, BACKEND, "ip_address")?;
    set_default(section, "ssh_user", VM_SSH_USER_DEFAULT);

    if let Some(key_file) = get_str(section, "ssh_key_filename") {
        let path = PathBuf::from(key_file);
        std::fs::metadata(&path).map_err(|source| BackendError::Io {
            backend: BACKEND.to_string(),
            path,
            source,
        })?;
    }
    Ok(())
}
