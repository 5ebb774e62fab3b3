//! Advisory per-directory locking with stale-lock recovery.
//!
//! `ContentsStore` and `DataStore` each guard their writer mutex (§4.1,
//! §4.2) with one of these locks over their on-disk root, so a second
//! `asgen` process started against the same workspace fails fast
//! instead of corrupting the stores. The lock is advisory: it
//! coordinates `asgen` processes against each other, it is not a
//! security boundary.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

const STALE_THRESHOLD_SECS: u64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LockInfo {
    pid: u32,
    created_at: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("store at {path} is locked by pid {pid} (created {age_secs}s ago)")]
    Held { path: String, pid: u32, age_secs: u64 },
    #[error("failed to read or write lock file at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// An exclusive lock over a directory. Removing the lock file on drop
/// makes the guard RAII: if the caller panics mid-run the next process
/// either finds no file, or finds one old enough to be treated as
/// stale and reclaimed.
pub struct DirLock {
    lock_path: Utf8PathBuf,
}

impl DirLock {
    /// Acquire an exclusive lock on `dir`. If `force` is true, an
    /// existing lock (stale or not) is overridden.
    pub fn acquire(dir: &Utf8Path, force: bool) -> Result<Self, LockError> {
        crate::paths::ensure_dir_all(dir).map_err(|e| LockError::Io {
            path: dir.to_string(),
            source: e,
        })?;
        let lock_path = dir.join(".asgen.lock");

        if !force {
            if let Some(existing) = read_lock_info(&lock_path)? {
                let age = now_secs().saturating_sub(existing.created_at);
                if age < STALE_THRESHOLD_SECS && process_alive(existing.pid) {
                    return Err(LockError::Held {
                        path: dir.to_string(),
                        pid: existing.pid,
                        age_secs: age,
                    });
                }
            }
        }

        let info = LockInfo {
            pid: std::process::id(),
            created_at: now_secs(),
        };
        let json = serde_json::to_vec_pretty(&info).expect("LockInfo always serializes");
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(lock_path.as_std_path())
            .map_err(|e| LockError::Io {
                path: lock_path.to_string(),
                source: e,
            })?;
        file.write_all(&json).map_err(|e| LockError::Io {
            path: lock_path.to_string(),
            source: e,
        })?;

        Ok(Self { lock_path })
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(self.lock_path.as_std_path());
    }
}

fn read_lock_info(lock_path: &Utf8Path) -> Result<Option<LockInfo>, LockError> {
    match fs::read(lock_path.as_std_path()) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes).ok()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(LockError::Io {
            path: lock_path.to_string(),
            source: e,
        }),
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    // Signal 0 performs no-op permission/existence checks only.
    unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    true
}
