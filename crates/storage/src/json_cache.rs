//! JSON file cache backend.
//!
//! Stores each entry as a JSON file under `entries/` in a cache directory.
//! Tag invalidation scans the entry files; the cache is expected to stay small
//! enough for that (one entry per evaluated entity).

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use serde_json::Value;
use tracing::{debug, warn};
use super::{CacheBackend, CacheEntry, Expire, Result};

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// File-based persistent cache backend.
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    root: PathBuf,
}

impl JsonFileCache {
    /// Open a cache directory, creating `entries/` if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("entries"))?;
        Ok(Self { root })
    }

    /// Cache directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, cid: &str) -> PathBuf {
        self.root
            .join("entries")
            .join(format!("{}.json", file_stem(cid)))
    }

    fn entry_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(self.root.join("entries"))? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

impl CacheBackend for JsonFileCache {
    fn get(&self, cid: &str) -> Result<Option<CacheEntry>> {
        let Some(entry) = read_entry(&self.entry_path(cid))? else {
            return Ok(None);
        };
        // Sanitized file names may collide; the stored id is authoritative.
        if entry.cid != cid || !entry.expire.is_live(chrono::Utc::now()) {
            return Ok(None);
        }
        Ok(Some(entry))
    }

    fn set(&self, cid: &str, data: Value, expire: Expire, tags: BTreeSet<String>) -> Result<()> {
        let entry = CacheEntry {
            cid: cid.to_string(),
            data,
            expire,
            tags,
            created: chrono::Utc::now(),
        };
        let path = self.entry_path(cid);
        let json = serde_json::to_string_pretty(&entry)?;
        // Write then rename so readers never see a partial file.
        let tmp = path.with_extension(format!(
            "{}.{}.tmp",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&tmp, json.as_bytes())?;
        fs::rename(&tmp, &path)?;
        debug!(cid, "Wrote cache entry");
        Ok(())
    }

    fn delete(&self, cid: &str) -> Result<()> {
        let path = self.entry_path(cid);
        match read_entry(&path) {
            Ok(Some(entry)) if entry.cid != cid => Ok(()),
            Ok(None) => Ok(()),
            Ok(Some(_)) => remove_if_exists(&path),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Dropping unreadable cache entry");
                remove_if_exists(&path)
            }
        }
    }

    fn invalidate_tags(&self, tags: &[String]) -> Result<usize> {
        let mut removed = 0;
        for path in self.entry_paths()? {
            match read_entry(&path) {
                Ok(Some(entry)) if entry.has_any_tag(tags) => {
                    remove_if_exists(&path)?;
                    removed += 1;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Dropping unreadable cache entry");
                    remove_if_exists(&path)?;
                }
            }
        }
        debug!(?tags, removed, "Invalidated cache tags");
        Ok(removed)
    }

    fn clear(&self) -> Result<()> {
        for path in self.entry_paths()? {
            remove_if_exists(&path)?;
        }
        Ok(())
    }
}

/// File-system safe stem for a cache id.
fn file_stem(cid: &str) -> String {
    cid.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect()
}

fn read_entry(path: &Path) -> Result<Option<CacheEntry>> {
    match fs::read_to_string(path) {
        Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    fs::remove_file(path).or_else(|e| {
        if e.kind() == ErrorKind::NotFound { Ok(()) } else { Err(e) }
    })?;
    Ok(())
}
