//! Settings delivered by the client.

use serde_json::Value;
use tower_lsp::lsp_types::DidChangeConfigurationParams;
use tracing::{error, info};

use shlint_core::{LinterError, Settings};

use crate::state::BackendState;

/// Section name under which editors nest our settings.
const SECTION: &str = "shellcheck";

/// Reads settings from a client payload, accepting both `{ "shellcheck": {...} }`
/// and the bare settings object.
pub fn extract_settings(value: Value) -> Result<Settings, LinterError> {
    let value = match value {
        Value::Object(mut map) => match map.remove(SECTION) {
            Some(inner) => inner,
            None => Value::Object(map),
        },
        other => other,
    };

    if value.is_null() {
        return Ok(Settings::default());
    }
    Settings::from_value(value)
}

/// Handles `workspace/didChangeConfiguration`.
///
/// Returns true when a new configuration epoch started.
pub fn handle_did_change_configuration(
    state: &BackendState,
    params: DidChangeConfigurationParams,
) -> Result<bool, LinterError> {
    let settings = extract_settings(params.settings)?;
    if *state.settings.read() == settings {
        return Ok(false);
    }

    state.apply_settings(settings).inspect_err(|e| {
        error!("Rejected configuration: {}", e);
    })?;
    info!("Configuration reloaded");
    Ok(true)
}
