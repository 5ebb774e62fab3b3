//! Atomic file writes: write to a sibling temp file, fsync, rename.
//!
//! Every persisted record in the two stores (§4.1/§4.2) and every
//! exported catalog/hint/tarball file (§6) goes through here so a
//! crash or a concurrent reader never observes a half-written file.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use std::io::{self, Write};

use tempfile::NamedTempFile;

/// Write `content` to `path` atomically (temp file in the same directory,
/// fsync, rename). Creates parent directories as needed.
pub fn write_atomic(path: &Utf8Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        crate::paths::ensure_dir_all(parent)
            .with_context(|| format!("failed to create parent directory: {parent}"))?;
    }

    let temp_dir = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    let mut temp_file = NamedTempFile::new_in(temp_dir)
        .with_context(|| format!("failed to create temp file in: {temp_dir}"))?;

    temp_file
        .write_all(content)
        .context("failed to write content to temp file")?;
    temp_file
        .as_file()
        .sync_all()
        .context("failed to fsync temp file")?;

    match temp_file.persist(path.as_std_path()) {
        Ok(_) => Ok(()),
        Err(persist_err) if is_cross_device(&persist_err.error) => {
            // Fallback for temp dirs on a different filesystem than `path`:
            // copy the bytes into place instead of renaming.
            fs::write(path, content)
                .with_context(|| format!("cross-filesystem fallback write failed: {path}"))?;
            Ok(())
        }
        Err(persist_err) => {
            Err(persist_err.error).with_context(|| format!("failed to rename into place: {path}"))
        }
    }
}

/// Write a UTF-8 string atomically; convenience wrapper over [`write_atomic`].
pub fn write_atomic_str(path: &Utf8Path, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

fn is_cross_device(err: &io::Error) -> bool {
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(libc::EXDEV)
    }
    #[cfg(not(unix))]
    {
        let _ = err;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::tempdir;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("nested").join("file.txt")).unwrap();
        write_atomic_str(&path, "hello").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn overwrite_replaces_contents() {
        let dir = tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("file.txt")).unwrap();
        write_atomic_str(&path, "first").unwrap();
        write_atomic_str(&path, "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }
}
