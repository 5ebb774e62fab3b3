//! File-per-key, single-writer key-value store.
//!
//! `spec.md` describes `ContentsStore` and `DataStore` as durable
//! key-value mappings backed by "an environment with named sub-stores"
//! and a single writer mutex per store, with snapshot-isolated readers.
//! The retrieved corpus carries no embedded database dependency (no
//! LMDB/sled/redb anywhere in it); its closest analog is the teacher's
//! `xchecker-utils::cache::InsightCache`, a content-hash-keyed,
//! one-JSON-file-per-entry cache under a directory, written through
//! atomic renames. `KvStore` generalizes that shape into the shared
//! primitive both stores build their six named sub-stores on top of.
//!
//! Readers never take the writer mutex: an atomic rename means they
//! either see the old bytes or the new bytes, never a torn write, which
//! is exactly the snapshot-isolation guarantee spec §4.1/§4.2 ask for.

use crate::atomic_write::write_atomic;
use camino::{Utf8Path, Utf8PathBuf};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::fs;
use std::sync::Mutex;

/// Key-value store rooted at one directory; one file per key.
pub struct KvStore {
    root: Utf8PathBuf,
    writer: Mutex<()>,
}

const ENCODE_SET: &AsciiSet = &CONTROLS.add(b'/').add(b'%').add(b'\\').add(b'*').add(b'?');

impl KvStore {
    /// Open (creating if necessary) a store rooted at `root`.
    pub fn open(root: &Utf8Path) -> std::io::Result<Self> {
        crate::paths::ensure_dir_all(root)?;
        Ok(Self {
            root: root.to_owned(),
            writer: Mutex::new(()),
        })
    }

    fn file_path(&self, key: &str) -> Utf8PathBuf {
        let encoded = utf8_percent_encode(key, ENCODE_SET).to_string();
        self.root.join(encoded)
    }

    /// Write `value` under `key`, replacing any existing value
    /// atomically. Serializes with other writers on this store.
    pub fn put(&self, key: &str, value: &[u8]) -> anyhow::Result<()> {
        let _guard = self.writer.lock().unwrap_or_else(|p| p.into_inner());
        write_atomic(&self.file_path(key), value)
    }

    /// Read the raw bytes stored under `key`, if any. Never blocks on
    /// the writer mutex.
    pub fn get(&self, key: &str) -> std::io::Result<Option<Vec<u8>>> {
        match fs::read(self.file_path(key).as_std_path()) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[must_use]
    pub fn exists(&self, key: &str) -> bool {
        self.file_path(key).exists()
    }

    /// Remove the value stored under `key`. Not an error if absent.
    pub fn remove(&self, key: &str) -> anyhow::Result<()> {
        let _guard = self.writer.lock().unwrap_or_else(|p| p.into_inner());
        match fs::remove_file(self.file_path(key).as_std_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// List every key currently present. O(n) directory scan; fine for
    /// the cruft/`active_gcids` style full scans the spec calls for,
    /// not meant for hot-path per-package lookups.
    pub fn keys(&self) -> std::io::Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in fs::read_dir(self.root.as_std_path())? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if let Ok(decoded) = percent_decode_str(name).decode_utf8() {
                    out.push(decoded.into_owned());
                }
            }
        }
        Ok(out)
    }

    /// Number of keys currently stored. Used by callers that only need
    /// a count and would otherwise discard `keys()`'s allocation.
    pub fn len(&self) -> std::io::Result<usize> {
        Ok(self.keys()?.len())
    }

    pub fn is_empty(&self) -> std::io::Result<bool> {
        Ok(self.len()? == 0)
    }

    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}
