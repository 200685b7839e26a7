//! Field-by-field JSON encoding of cache entries.
//!
//! Snapshot shape:
//!
//! ```text
//! { "<name>": { "data":  { "name": str, "text": str, "links": [str] },
//!               "admin": { "lastUsed": epoch_secs, "timesUsed": int } } }
//! ```

use crate::error::{PageStoreError, Result};
use crate::types::{CacheEntry, Page};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use wikipath_text::canonical_name;

pub fn encode_entry(entry: &CacheEntry) -> Value {
    json!({
        "data": {
            "name": entry.page.name,
            "text": entry.page.text,
            "links": entry.page.links,
        },
        "admin": {
            "lastUsed": entry.last_used,
            "timesUsed": entry.times_used,
        },
    })
}

/// Decode one entry stored under `key`.
///
/// The stored page name must resolve to the same canonical name as the key,
/// otherwise the entry's identity cannot be trusted.
pub fn decode_entry(key: &str, value: &Value) -> Result<CacheEntry> {
    let invalid = |reason: &str| PageStoreError::InvalidEntry {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    let data = value.get("data").ok_or_else(|| invalid("missing data"))?;
    let admin = value.get("admin").ok_or_else(|| invalid("missing admin"))?;

    let name = data
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("data.name is not a string"))?;
    let text = data
        .get("text")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("data.text is not a string"))?;
    let links = data
        .get("links")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid("data.links is not an array"))?
        .iter()
        .map(|link| link.as_str().map(canonical_name))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| invalid("data.links contains a non-string"))?;

    let last_used = admin
        .get("lastUsed")
        .and_then(Value::as_f64)
        .ok_or_else(|| invalid("admin.lastUsed is not a number"))?;
    let times_used = admin
        .get("timesUsed")
        .and_then(Value::as_u64)
        .filter(|n| *n >= 1)
        .ok_or_else(|| invalid("admin.timesUsed is not a positive integer"))?;

    let canonical = canonical_name(name);
    if canonical.is_empty() || canonical != canonical_name(key) {
        return Err(invalid(&format!("stored name {name:?} does not match key")));
    }

    Ok(CacheEntry {
        page: Arc::new(Page::new(canonical, text, links)),
        last_used,
        times_used,
    })
}

pub fn encode_snapshot(entries: &HashMap<String, CacheEntry>) -> Value {
    let mut keys: Vec<&String> = entries.keys().collect();
    keys.sort();
    let mut map = Map::with_capacity(entries.len());
    for key in keys {
        map.insert(key.clone(), encode_entry(&entries[key]));
    }
    Value::Object(map)
}

/// Decode a whole snapshot, dropping entries that cannot be restored.
pub fn decode_snapshot(value: &Value) -> Result<HashMap<String, CacheEntry>> {
    let object = value
        .as_object()
        .ok_or_else(|| PageStoreError::InvalidSnapshot("top level is not an object".into()))?;

    let mut entries = HashMap::with_capacity(object.len());
    for (key, raw) in object {
        match decode_entry(key, raw) {
            Ok(entry) => insert_restored(&mut entries, entry),
            Err(err) => log::warn!("Dropping cache entry: {err}"),
        }
    }
    Ok(entries)
}

pub(crate) fn insert_restored(entries: &mut HashMap<String, CacheEntry>, entry: CacheEntry) {
    let key = entry.page.name.clone();
    if entries.contains_key(&key) {
        log::warn!("Dropping duplicate cache entry for '{key}'");
        return;
    }
    entries.insert(key, entry);
}
