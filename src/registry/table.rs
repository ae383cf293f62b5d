//! Structural parsing of registry name tables.
//!
//! A table is either a JSON object mapping keys to names, or an array of
//! `{"code": .., "name": ..}` records as found in exported SIG databases.
//! Anything unreadable degrades to an empty table.

use super::sanitize::sanitize;
use serde_json::{Map, Value};
use std::io::Read;
use tracing::{debug, warn};

/// Key of one table entry, before registry-specific normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableKey {
    /// Key written as text (object keys, string codes)
    Text(String),
    /// Integer `code` of an array record
    Code(u64),
}

/// One `(key, name)` pair from a registry source.
pub type TableEntry = (TableKey, String);

/// Read and parse a table from `reader`. `label` only appears in log output.
pub fn load_table<R: Read>(label: &str, mut reader: R) -> Vec<TableEntry> {
    let mut bytes = Vec::new();
    if let Err(e) = reader.read_to_end(&mut bytes) {
        warn!(source = label, error = %e, "failed to read registry source, using empty table");
        return Vec::new();
    }
    parse_table(label, &bytes)
}

/// Parse a table from raw bytes.
pub fn parse_table(label: &str, bytes: &[u8]) -> Vec<TableEntry> {
    let raw = match std::str::from_utf8(bytes) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(source = label, error = %e, "registry source is not UTF-8, using empty table");
            return Vec::new();
        }
    };

    let text = sanitize(raw);
    let entries = match text.chars().next() {
        Some('{') => serde_json::from_str::<Map<String, Value>>(&text).map(object_entries),
        Some('[') => serde_json::from_str::<Vec<Value>>(&text).map(|items| array_entries(&items)),
        _ => {
            warn!(source = label, "unknown registry source format, using empty table");
            return Vec::new();
        }
    };

    match entries {
        Ok(entries) => {
            debug!(source = label, entries = entries.len(), "parsed registry source");
            entries
        }
        Err(e) => {
            warn!(source = label, error = %e, "failed to parse registry source, using empty table");
            Vec::new()
        }
    }
}

fn object_entries(object: Map<String, Value>) -> Vec<TableEntry> {
    object
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(name) if !name.trim().is_empty() => Some((TableKey::Text(key), name)),
            _ => None,
        })
        .collect()
}

fn array_entries(items: &[Value]) -> Vec<TableEntry> {
    items
        .iter()
        .filter_map(|item| {
            let name = item.get("name")?.as_str()?;
            if name.trim().is_empty() {
                return None;
            }
            let key = match item.get("code")? {
                Value::Number(n) => TableKey::Code(n.as_u64()?),
                Value::String(s) => TableKey::Text(s.clone()),
                _ => return None,
            };
            Some((key, name.to_string()))
        })
        .collect()
}
