//! Execution mode validation and defaulting.
//!
//! Selects the active mode, checks the fields that mode cannot run without,
//! and fills in the mode section defaults. Never removes a field and never
//! touches a value the user set, with one exception: localhost always runs
//! against the placeholder bucket.

use super::types::*;
use crate::error::{ConfigError, Result};
use tracing::debug;

/// Validate the document for its mode and inject defaults.
pub fn apply_mode_defaults(mut doc: ConfigDocument) -> Result<ConfigDocument> {
    let mode = doc.mode();
    doc.lithops.mode = Some(mode);
    debug!(%mode, "Resolving execution mode");

    if doc.lithops.execution_timeout.is_none() {
        doc.lithops.execution_timeout = Some(EXECUTION_TIMEOUT_DEFAULT);
    }

    match mode {
        Mode::Localhost => apply_localhost(&mut doc),
        Mode::Serverless => apply_serverless(&mut doc)?,
        Mode::Standalone => apply_standalone(&mut doc)?,
    }

    if doc.lithops.storage.is_none() {
        doc.lithops.storage = Some(STORAGE_BACKEND_DEFAULT.to_string());
    }

    Ok(doc)
}

fn require_storage_bucket(doc: &ConfigDocument, mode: Mode) -> Result<()> {
    match doc.lithops.storage_bucket {
        Some(_) => Ok(()),
        None => Err(ConfigError::MissingField {
            mode,
            field: "storage_bucket",
        }),
    }
}

fn apply_localhost(doc: &mut ConfigDocument) {
    doc.lithops.storage_bucket = Some(LOCALHOST_STORAGE_BUCKET.to_string());
    doc.lithops
        .storage
        .get_or_insert_with(|| LOCALHOST_STORAGE_BACKEND.to_string());

    let section = doc.localhost.get_or_insert_with(Default::default);
    section
        .runtime
        .get_or_insert_with(|| LOCALHOST_RUNTIME_DEFAULT.to_string());
}

fn apply_serverless(doc: &mut ConfigDocument) -> Result<()> {
    require_storage_bucket(doc, Mode::Serverless)?;

    let section = doc.serverless.get_or_insert_with(Default::default);
    section
        .backend
        .get_or_insert_with(|| SERVERLESS_BACKEND_DEFAULT.to_string());
    Ok(())
}

fn apply_standalone(doc: &mut ConfigDocument) -> Result<()> {
    require_storage_bucket(doc, Mode::Standalone)?;

    let section = doc.standalone.get_or_insert_with(Default::default);
    section
        .auto_dismantle
        .get_or_insert(STANDALONE_AUTO_DISMANTLE_DEFAULT);
    section
        .soft_dismantle_timeout
        .get_or_insert(STANDALONE_SOFT_DISMANTLE_TIMEOUT_DEFAULT);
    section
        .hard_dismantle_timeout
        .get_or_insert(STANDALONE_HARD_DISMANTLE_TIMEOUT_DEFAULT);
    section
        .backend
        .get_or_insert_with(|| STANDALONE_BACKEND_DEFAULT.to_string());
    section
        .runtime
        .get_or_insert_with(|| STANDALONE_RUNTIME_DEFAULT.to_string());
    Ok(())
}
