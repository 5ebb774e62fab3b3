//! Workspace layout helpers.
//!
//! Centralizes the on-disk layout documented in spec §6 so every crate
//! derives paths the same way instead of hand-building `format!` strings.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;

/// Create a directory and all of its parents, tolerating a benign
/// "already exists" race from a concurrent worker.
pub fn ensure_dir_all(path: &Utf8Path) -> io::Result<()> {
    match fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

/// Root of the persistent key-value stores: `<workspace>/db`.
#[must_use]
pub fn db_root(workspace: &Utf8Path) -> Utf8PathBuf {
    workspace.join("db")
}

/// `ContentsStore` root: `<workspace>/db/contents`.
#[must_use]
pub fn contents_store_root(workspace: &Utf8Path) -> Utf8PathBuf {
    db_root(workspace).join("contents")
}

/// `DataStore` root: `<workspace>/db/main`.
#[must_use]
pub fn data_store_root(workspace: &Utf8Path) -> Utf8PathBuf {
    db_root(workspace).join("main")
}

/// Per-run temporary directory: `<workspace>/cache/tmp`.
#[must_use]
pub fn tmp_root(workspace: &Utf8Path) -> Utf8PathBuf {
    workspace.join("cache").join("tmp")
}

/// Export root: `<workspace>/export`.
#[must_use]
pub fn export_root(workspace: &Utf8Path) -> Utf8PathBuf {
    workspace.join("export")
}

/// Media pool root: `<export>/media/pool`.
#[must_use]
pub fn media_pool_root(export_dir: &Utf8Path) -> Utf8PathBuf {
    export_dir.join("media").join("pool")
}

/// Media directory for one gcid: `<pool>/<gcid>`.
#[must_use]
pub fn gcid_media_dir(pool_root: &Utf8Path, gcid: &str) -> Utf8PathBuf {
    pool_root.join(gcid)
}

/// Per-suite hardlink root used when `immutableSuites` is enabled:
/// `<export>/media/<suite>`.
#[must_use]
pub fn media_suite_root(export_dir: &Utf8Path, suite: &str) -> Utf8PathBuf {
    export_dir.join("media").join(suite)
}

/// `data/<suite>/<section>` directory, holding catalog and CID-index files.
#[must_use]
pub fn data_section_dir(export_dir: &Utf8Path, suite: &str, section: &str) -> Utf8PathBuf {
    export_dir.join("data").join(suite).join(section)
}

/// `hints/<suite>/<section>` directory.
#[must_use]
pub fn hints_section_dir(export_dir: &Utf8Path, suite: &str, section: &str) -> Utf8PathBuf {
    export_dir.join("hints").join(suite).join(section)
}

/// `hints/<suite>/hint-definitions.json`.
#[must_use]
pub fn hint_definitions_path(export_dir: &Utf8Path, suite: &str) -> Utf8PathBuf {
    export_dir
        .join("hints")
        .join(suite)
        .join("hint-definitions.json")
}

/// `html` report root.
#[must_use]
pub fn html_root(export_dir: &Utf8Path) -> Utf8PathBuf {
    export_dir.join("html")
}

/// Catalog filename stem for one architecture: `Components-<arch>`.
#[must_use]
pub fn components_stem(arch: &str) -> String {
    format!("Components-{arch}")
}

/// CID index filename for one architecture: `CID-Index-<arch>.json.gz`.
#[must_use]
pub fn cid_index_filename(arch: &str) -> String {
    format!("CID-Index-{arch}.json.gz")
}

/// Hints filename stem for one architecture: `Hints-<arch>`.
#[must_use]
pub fn hints_stem(arch: &str) -> String {
    format!("Hints-{arch}")
}

/// Icon tarball filename for one `(size, scale)` pair, e.g. `icons-64x64.tar.gz`
/// or `icons-64x64@2.tar.gz`.
#[must_use]
pub fn icon_tarball_filename(size: u32, scale: u32) -> String {
    if scale <= 1 {
        format!("icons-{size}x{size}.tar.gz")
    } else {
        format!("icons-{size}x{size}@{scale}.tar.gz")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_spec_envelope() {
        let ws = Utf8PathBuf::from("/work");
        assert_eq!(contents_store_root(&ws), Utf8PathBuf::from("/work/db/contents"));
        assert_eq!(data_store_root(&ws), Utf8PathBuf::from("/work/db/main"));
        let export = export_root(&ws);
        assert_eq!(
            data_section_dir(&export, "noble", "main"),
            Utf8PathBuf::from("/work/export/data/noble/main")
        );
        assert_eq!(cid_index_filename("amd64"), "CID-Index-amd64.json.gz");
    }

    #[test]
    fn icon_tarball_names_omit_default_scale() {
        assert_eq!(icon_tarball_filename(64, 1), "icons-64x64.tar.gz");
        assert_eq!(icon_tarball_filename(64, 2), "icons-64x64@2.tar.gz");
    }
}
