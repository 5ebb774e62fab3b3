//! ContentsStore (C1): package-id -> content listing, keyed across three
//! sub-stores (spec §3, §4.1).
//!
//! Built on `asgen_utils::kvstore::KvStore`, the file-per-key substrate
//! shared with `asgen-data-store` (SPEC_FULL.md §4.1 AMBIENT). Presence
//! in the `contents` sub-store is the authoritative "this package-id has
//! been scanned" signal (spec §3).

use anyhow::Context;
use asgen_utils::kvstore::KvStore;
use asgen_utils::types::PackageId;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use std::sync::Mutex;

fn is_icon_path(path: &str) -> bool {
    path.starts_with("/usr/share/icons/") || path.starts_with("/usr/share/pixmaps/")
}

fn is_locale_path(path: &str) -> bool {
    path.ends_with(".mo") || path.ends_with(".qm")
}

fn join_paths(paths: &[Utf8PathBuf]) -> String {
    paths.iter().map(|p| p.as_str()).collect::<Vec<_>>().join("\n")
}

fn split_paths(blob: &[u8]) -> Vec<Utf8PathBuf> {
    if blob.is_empty() {
        return Vec::new();
    }
    let text = String::from_utf8_lossy(blob);
    text.lines().map(Utf8PathBuf::from).collect()
}

/// Persistent key-value store, three sub-stores keyed by package-id
/// (spec §3 "ContentsStore").
pub struct ContentsStore {
    contents: KvStore,
    icons: KvStore,
    locale: KvStore,
    /// Serializes `add`/`remove` across all three sub-stores so a
    /// reader never observes the contents sub-store updated but icons
    /// or locale still stale (spec §4.1: "in one atomic write").
    writer: Mutex<()>,
}

impl ContentsStore {
    /// Idempotent: creates the three named sub-stores under `root` if
    /// they do not already exist (spec §4.1 `open`).
    pub fn open(root: &Utf8Path) -> anyhow::Result<Self> {
        Ok(Self {
            contents: KvStore::open(&root.join("contents")).context("opening contents sub-store")?,
            icons: KvStore::open(&root.join("icons")).context("opening icons sub-store")?,
            locale: KvStore::open(&root.join("locale")).context("opening locale sub-store")?,
            writer: Mutex::new(()),
        })
    }

    /// Writes `contents`, derives and writes the `icons` and `locale`
    /// subsets. A later `add` with the same key overwrites all three
    /// (spec §4.1 `add`).
    pub fn add(&self, package_id: &PackageId, contents: &[Utf8PathBuf]) -> anyhow::Result<()> {
        let _guard = self.writer.lock().unwrap_or_else(|p| p.into_inner());
        let key = package_id.to_string();

        let icon_paths: Vec<Utf8PathBuf> = contents
            .iter()
            .filter(|p| is_icon_path(p.as_str()))
            .cloned()
            .collect();
        let locale_paths: Vec<Utf8PathBuf> = contents
            .iter()
            .filter(|p| is_locale_path(p.as_str()))
            .cloned()
            .collect();

        self.contents.put(&key, join_paths(contents).as_bytes())?;
        self.icons.put(&key, join_paths(&icon_paths).as_bytes())?;
        self.locale.put(&key, join_paths(&locale_paths).as_bytes())?;
        Ok(())
    }

    #[must_use]
    pub fn exists(&self, package_id: &PackageId) -> bool {
        self.contents.exists(&package_id.to_string())
    }

    pub fn get_contents(&self, package_id: &PackageId) -> anyhow::Result<Vec<Utf8PathBuf>> {
        Ok(self.contents.get(&package_id.to_string())?.map(|b| split_paths(&b)).unwrap_or_default())
    }

    pub fn get_icons(&self, package_id: &PackageId) -> anyhow::Result<Vec<Utf8PathBuf>> {
        Ok(self.icons.get(&package_id.to_string())?.map(|b| split_paths(&b)).unwrap_or_default())
    }

    pub fn get_locale(&self, package_id: &PackageId) -> anyhow::Result<Vec<Utf8PathBuf>> {
        Ok(self.locale.get(&package_id.to_string())?.map(|b| split_paths(&b)).unwrap_or_default())
    }

    /// One entry per distinct path; when multiple package-ids claim the
    /// same path, the last one iterated wins (spec §4.1 `contents_map`:
    /// "acceptable because the caller treats these as first-match
    /// lookups into a global content index").
    pub fn contents_map(&self, package_ids: &[PackageId]) -> anyhow::Result<HashMap<Utf8PathBuf, PackageId>> {
        let mut out = HashMap::new();
        for pkid in package_ids {
            for path in self.get_contents(pkid)? {
                out.insert(path, pkid.clone());
            }
        }
        Ok(out)
    }

    pub fn icon_files_map(&self, package_ids: &[PackageId]) -> anyhow::Result<HashMap<Utf8PathBuf, PackageId>> {
        let mut out = HashMap::new();
        for pkid in package_ids {
            for path in self.get_icons(pkid)? {
                out.insert(path, pkid.clone());
            }
        }
        Ok(out)
    }

    /// Keyed by the *basename* of the locale file (domain filename),
    /// assuming one domain lives in a single package (spec §4.1).
    pub fn locale_map(&self, package_ids: &[PackageId]) -> anyhow::Result<HashMap<String, PackageId>> {
        let mut out = HashMap::new();
        for pkid in package_ids {
            for path in self.get_locale(pkid)? {
                if let Some(basename) = path.file_name() {
                    out.insert(basename.to_string(), pkid.clone());
                }
            }
        }
        Ok(out)
    }

    pub fn remove(&self, package_ids: &std::collections::HashSet<PackageId>) -> anyhow::Result<()> {
        let _guard = self.writer.lock().unwrap_or_else(|p| p.into_inner());
        for pkid in package_ids {
            let key = pkid.to_string();
            self.contents.remove(&key)?;
            self.icons.remove(&key)?;
            self.locale.remove(&key)?;
        }
        Ok(())
    }

    pub fn package_id_set(&self) -> anyhow::Result<std::collections::HashSet<PackageId>> {
        Ok(self
            .contents
            .keys()?
            .into_iter()
            .filter_map(|k| PackageId::parse(&k))
            .collect())
    }

    /// No-op: every write already went through an atomic rename.
    /// Kept as an explicit operation because spec §4.1 names it and
    /// downstream callers (seedContentsData) call it as a checkpoint.
    pub fn sync(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, ContentsStore) {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let store = ContentsStore::open(&root).unwrap();
        (dir, store)
    }

    fn paths(strs: &[&str]) -> Vec<Utf8PathBuf> {
        strs.iter().map(Utf8PathBuf::from).collect()
    }

    #[test]
    fn add_splits_contents_into_icons_and_locale_subsets() {
        let (_dir, store) = store();
        let pkid = PackageId::new("hello", "1.0", "amd64");
        store
            .add(
                &pkid,
                &paths(&[
                    "/usr/bin/hello",
                    "/usr/share/icons/hicolor/64x64/apps/hello.png",
                    "/usr/share/locale/de/LC_MESSAGES/hello.mo",
                    "/usr/share/applications/hello.desktop",
                ]),
            )
            .unwrap();

        assert_eq!(store.get_contents(&pkid).unwrap().len(), 4);
        assert_eq!(
            store.get_icons(&pkid).unwrap(),
            paths(&["/usr/share/icons/hicolor/64x64/apps/hello.png"])
        );
        assert_eq!(
            store.get_locale(&pkid).unwrap(),
            paths(&["/usr/share/locale/de/LC_MESSAGES/hello.mo"])
        );
    }

    #[test]
    fn exists_reflects_presence_in_contents_substore() {
        let (_dir, store) = store();
        let pkid = PackageId::new("hello", "1.0", "amd64");
        assert!(!store.exists(&pkid));
        store.add(&pkid, &paths(&["/usr/bin/hello"])).unwrap();
        assert!(store.exists(&pkid));
    }

    #[test]
    fn later_add_overwrites_all_three_substores() {
        let (_dir, store) = store();
        let pkid = PackageId::new("hello", "1.0", "amd64");
        store
            .add(&pkid, &paths(&["/usr/share/icons/hicolor/64x64/apps/hello.png"]))
            .unwrap();
        store.add(&pkid, &paths(&["/usr/bin/hello"])).unwrap();
        assert!(store.get_icons(&pkid).unwrap().is_empty());
        assert_eq!(store.get_contents(&pkid).unwrap(), paths(&["/usr/bin/hello"]));
    }

    #[test]
    fn locale_map_keys_by_basename() {
        let (_dir, store) = store();
        let pkid = PackageId::new("hello-l10n", "1.0", "amd64");
        store
            .add(&pkid, &paths(&["/usr/share/locale/de/LC_MESSAGES/hello.mo"]))
            .unwrap();
        let map = store.locale_map(&[pkid.clone()]).unwrap();
        assert_eq!(map.get("hello.mo"), Some(&pkid));
    }

    #[test]
    fn remove_drops_all_three_substores() {
        let (_dir, store) = store();
        let pkid = PackageId::new("hello", "1.0", "amd64");
        store.add(&pkid, &paths(&["/usr/bin/hello"])).unwrap();
        store.remove(&std::iter::once(pkid.clone()).collect()).unwrap();
        assert!(!store.exists(&pkid));
    }

    #[test]
    fn package_id_set_lists_every_added_key() {
        let (_dir, store) = store();
        store.add(&PackageId::new("a", "1.0", "amd64"), &paths(&["/x"])).unwrap();
        store.add(&PackageId::new("b", "1.0", "amd64"), &paths(&["/y"])).unwrap();
        let set = store.package_id_set().unwrap();
        assert_eq!(set.len(), 2);
    }
}
