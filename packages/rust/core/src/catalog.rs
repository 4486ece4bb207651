//! Seed catalog loading and enriched catalog writing.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, instrument};

use pubtrace_fetch::{PageFetcher, is_http_url};
use pubtrace_shared::{EnrichedRecord, PubtraceError, Result};

/// Parse seed catalog text into its ordered entries.
///
/// The document must be a JSON array; entries are not inspected here.
pub fn parse_catalog(text: &str, location: &str) -> Result<Vec<Value>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| PubtraceError::catalog(location, format!("invalid JSON: {e}")))?;

    match value {
        Value::Array(entries) => Ok(entries),
        other => Err(PubtraceError::catalog(
            location,
            format!("expected a JSON array of records, found {}", json_kind(&other)),
        )),
    }
}

/// Load the seed catalog from an `http(s)` URL or a local file path.
#[instrument(skip_all, fields(location = %location))]
pub async fn load_catalog<F: PageFetcher>(fetcher: &F, location: &str) -> Result<Vec<Value>> {
    let text = if is_http_url(location) {
        info!("fetching seed catalog");
        fetcher.fetch(location).await?.body
    } else {
        info!("reading seed catalog from file");
        std::fs::read_to_string(location).map_err(|e| PubtraceError::io(location, e))?
    };

    let entries = parse_catalog(&text, location)?;
    info!(entries = entries.len(), "seed catalog loaded");
    Ok(entries)
}

/// Serialize enriched records as a pretty-printed JSON array.
pub fn render_catalog(records: &[EnrichedRecord]) -> Result<String> {
    let mut json = serde_json::to_string_pretty(records)
        .map_err(|e| PubtraceError::Serialize(format!("JSON serialization failed: {e}")))?;
    json.push('\n');
    Ok(json)
}

/// Write the enriched catalog to `path`.
///
/// Content goes to a hidden sibling temp file first and is renamed into
/// place, so a failed write never leaves a truncated catalog behind.
#[instrument(skip_all, fields(path = %path.display(), records = records.len()))]
pub fn write_catalog(path: &Path, records: &[EnrichedRecord]) -> Result<()> {
    let json = render_catalog(records)?;

    let file_name = path
        .file_name()
        .ok_or_else(|| {
            PubtraceError::validation(format!("output path has no file name: {}", path.display()))
        })?
        .to_string_lossy();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PubtraceError::io(parent, e))?;
    }

    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    // Write to temp file first
    std::fs::write(&temp, json.as_bytes()).map_err(|e| PubtraceError::io(&temp, e))?;

    // Atomic rename
    if let Err(e) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(PubtraceError::io(path, e));
    }

    debug!(bytes = json.len(), "wrote enriched catalog");
    Ok(())
}

/// Human-readable name of a JSON value's type, for diagnostics.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
