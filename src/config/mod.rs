//! Configuration resolution.
//!
//! Resolves the effective configuration in one pass:
//! 1. **Source** - explicit document, `LITHOPS_CONFIG`, `LITHOPS_CONFIG_FILE`,
//!    `./.lithops_config`, `~/.lithops/config`, legacy `~/.lithops_config`,
//!    or a minimal localhost document
//! 2. **Overrides** - shallow, per-section merge of user overrides
//! 3. **Migration** - deprecated `executor` rewritten to `mode`
//! 4. **Mode** - mandatory fields checked, mode defaults injected
//! 5. **Backends** - compute backend contract, then storage backend contract
//!
//! ## Environment Variables
//! - `LITHOPS_CONFIG` - Inline JSON document (overrides all files)
//! - `LITHOPS_CONFIG_FILE` - Explicit config file

mod extract;
mod loader;
mod merge;
mod mode;
mod resolver;
mod types;

pub use extract::{
    extract_localhost_config, extract_serverless_config, extract_standalone_config,
    extract_storage_config,
};
pub use loader::{
    CONFIG_ENV_VAR, CONFIG_FILE_ENV_VAR, ConfigSource, ConfigSources, LoadedSource,
    PROJECT_CONFIG_FILE, load_config_file, parse_inline_config,
};
pub use merge::{merge_overrides, migrate_deprecated, shallow_update};
pub use mode::apply_mode_defaults;
pub use resolver::{ConfigResolver, ResolvedConfig, default_config};
pub use types::*;
