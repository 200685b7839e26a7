use crate::codec::{decode_entry, decode_snapshot, encode_entry, encode_snapshot, insert_restored};
use crate::error::{PageStoreError, Result};
use crate::types::CacheEntry;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const ENTRY_EXTENSION: &str = "json";
const MAX_KEY_BYTES: usize = 200;

/// Where the page cache is persisted.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    /// One JSON snapshot file.
    #[default]
    File,
    /// One JSON file per page inside a directory, named after the page.
    Sharded,
    /// Nothing is persisted.
    Memory,
}

impl std::str::FromStr for CacheBackend {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "sharded" | "dir" => Ok(Self::Sharded),
            "memory" => Ok(Self::Memory),
            other => Err(format!(
                "unsupported cache backend '{other}' (expected file|sharded|memory)"
            )),
        }
    }
}

/// Result of writing a snapshot.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub written: usize,
    /// Keys whose write failed; the caller evicts them.
    pub failed: Vec<String>,
}

pub(crate) async fn load(
    path: &Path,
    backend: CacheBackend,
) -> Result<HashMap<String, CacheEntry>> {
    match backend {
        CacheBackend::File => load_file(path).await,
        CacheBackend::Sharded => load_sharded(path).await,
        CacheBackend::Memory => Ok(HashMap::new()),
    }
}

pub(crate) async fn save(
    path: &Path,
    backend: CacheBackend,
    entries: &HashMap<String, CacheEntry>,
) -> Result<SaveReport> {
    match backend {
        CacheBackend::File => save_file(path, entries).await,
        CacheBackend::Sharded => save_sharded(path, entries).await,
        CacheBackend::Memory => Ok(SaveReport::default()),
    }
}

async fn load_file(path: &Path) -> Result<HashMap<String, CacheEntry>> {
    let data = match tokio::fs::read_to_string(path).await {
        Ok(data) => data,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            log::info!("Could not find {}. Creating a new cache ...", path.display());
            return Ok(HashMap::new());
        }
        Err(err) => return Err(err.into()),
    };
    let value: Value = serde_json::from_str(&data)?;
    decode_snapshot(&value)
}

async fn save_file(path: &Path, entries: &HashMap<String, CacheEntry>) -> Result<SaveReport> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = serde_json::to_vec(&encode_snapshot(entries))?;
    write_atomic(path, &bytes).await?;
    Ok(SaveReport {
        written: entries.len(),
        failed: Vec::new(),
    })
}

async fn load_sharded(dir: &Path) -> Result<HashMap<String, CacheEntry>> {
    let mut read_dir = match tokio::fs::read_dir(dir).await {
        Ok(read_dir) => read_dir,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            log::info!("Could not find {}. Creating a new cache ...", dir.display());
            return Ok(HashMap::new());
        }
        Err(err) => return Err(err.into()),
    };

    let mut entries = HashMap::new();
    while let Some(dir_entry) = read_dir.next_entry().await? {
        let path = dir_entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
            continue;
        }
        match load_shard(&path).await {
            Ok(entry) => insert_restored(&mut entries, entry),
            Err(err) => log::warn!("Dropping cache file {}: {err}", path.display()),
        }
    }
    Ok(entries)
}

async fn load_shard(path: &Path) -> Result<CacheEntry> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| PageStoreError::UnstorableKey(path.display().to_string()))?
        .to_string();
    let data = tokio::fs::read_to_string(path).await?;
    let value: Value = serde_json::from_str(&data)?;

    let key = value
        .get("key")
        .and_then(Value::as_str)
        .ok_or_else(|| PageStoreError::InvalidEntry {
            key: stem.clone(),
            reason: "missing key".into(),
        })?;
    if key != stem {
        return Err(PageStoreError::InvalidEntry {
            key: stem,
            reason: format!("file holds entry {key:?}"),
        });
    }
    decode_entry(key, &value)
}

async fn save_sharded(dir: &Path, entries: &HashMap<String, CacheEntry>) -> Result<SaveReport> {
    tokio::fs::create_dir_all(dir).await?;

    let mut report = SaveReport::default();
    let mut kept = HashSet::with_capacity(entries.len());
    let mut keys: Vec<&String> = entries.keys().collect();
    keys.sort();

    for key in keys {
        match write_shard(dir, key, &entries[key]).await {
            Ok(file_name) => {
                kept.insert(file_name);
                report.written += 1;
            }
            Err(err) => {
                log::warn!("Cannot store cache entry '{key}': {err}");
                report.failed.push(key.clone());
            }
        }
    }

    remove_stale_shards(dir, &kept).await?;
    Ok(report)
}

async fn write_shard(dir: &Path, key: &str, entry: &CacheEntry) -> Result<String> {
    let file_name = shard_file_name(key)?;
    let mut value = encode_entry(entry);
    if let Value::Object(map) = &mut value {
        map.insert("key".into(), Value::String(key.to_string()));
    }
    let bytes = serde_json::to_vec(&value)?;
    write_atomic(&dir.join(&file_name), &bytes).await?;
    Ok(file_name)
}

async fn remove_stale_shards(dir: &Path, kept: &HashSet<String>) -> Result<()> {
    let mut read_dir = tokio::fs::read_dir(dir).await?;
    while let Some(dir_entry) = read_dir.next_entry().await? {
        let path = dir_entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !kept.contains(name) {
            let _ = tokio::fs::remove_file(&path).await;
        }
    }
    Ok(())
}

/// File name for a page entry, or an error when the name would escape the
/// cache directory or cannot be a file name.
pub(crate) fn shard_file_name(key: &str) -> Result<String> {
    let unstorable = || PageStoreError::UnstorableKey(key.to_string());
    if key.is_empty() || key.len() > MAX_KEY_BYTES || key.starts_with('.') {
        return Err(unstorable());
    }
    if key
        .chars()
        .any(|c| matches!(c, '/' | '\\' | '\0') || c.is_control())
    {
        return Err(unstorable());
    }
    Ok(format!("{key}.{ENTRY_EXTENSION}"))
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, bytes).await?;
    if let Err(err) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(err.into());
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
