//! Lithops configuration resolution library.
//!
//! This module exports the resolution pipeline, the backend registry and the
//! extractors for use by the CLI and by embedders.

pub mod backends;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;

pub use error::{BackendError, ConfigError, Result};
