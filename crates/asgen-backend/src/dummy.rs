//! In-memory backend used by engine tests and end-to-end scenarios
//! (spec §6 `Backend = dummy`). Packages are built entirely in memory;
//! `read()` looks files up in a `HashMap<Utf8PathBuf, Vec<u8>>`.

use crate::{absent_sentinel, GstreamerCaps, Package, PackageIndex, PackageKind};
use asgen_utils::error::AsgenError;
use asgen_utils::types::PackageId;
use camino::Utf8PathBuf;
use std::collections::HashMap;

/// A package built entirely from in-memory data.
pub struct DummyPackage {
    id: PackageId,
    kind: PackageKind,
    contents: Vec<Utf8PathBuf>,
    files: HashMap<Utf8PathBuf, Vec<u8>>,
    descriptions: HashMap<String, String>,
    maintainer: Option<String>,
    gstreamer: Option<GstreamerCaps>,
    finished: bool,
}

impl DummyPackage {
    #[must_use]
    pub fn new(id: PackageId) -> Self {
        Self {
            id,
            kind: PackageKind::Real,
            contents: Vec::new(),
            files: HashMap::new(),
            descriptions: HashMap::new(),
            maintainer: None,
            gstreamer: None,
            finished: false,
        }
    }

    #[must_use]
    pub fn fake(id: PackageId) -> Self {
        let mut pkg = Self::new(id);
        pkg.kind = PackageKind::Fake;
        pkg
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<Utf8PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        let path = path.into();
        self.contents.push(path.clone());
        self.files.insert(path, bytes.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, locale: impl Into<String>, text: impl Into<String>) -> Self {
        self.descriptions.insert(locale.into(), text.into());
        self
    }

    #[must_use]
    pub fn with_maintainer(mut self, maintainer: impl Into<String>) -> Self {
        self.maintainer = Some(maintainer.into());
        self
    }

    #[must_use]
    pub fn with_gstreamer_caps(mut self, caps: GstreamerCaps) -> Self {
        self.gstreamer = Some(caps);
        self
    }
}

impl Package for DummyPackage {
    fn id(&self) -> PackageId {
        self.id.clone()
    }

    fn kind(&self) -> PackageKind {
        self.kind
    }

    fn contents(&self) -> &[Utf8PathBuf] {
        &self.contents
    }

    fn read(&self, path: &camino::Utf8Path) -> Vec<u8> {
        self.files
            .get(path)
            .cloned()
            .unwrap_or_else(absent_sentinel)
    }

    fn descriptions(&self) -> &HashMap<String, String> {
        &self.descriptions
    }

    fn maintainer(&self) -> Option<&str> {
        self.maintainer.as_deref()
    }

    fn gstreamer_caps(&self) -> Option<&GstreamerCaps> {
        self.gstreamer.as_ref()
    }

    fn finish(&mut self) {
        assert!(!self.finished, "Package::finish called more than once");
        self.finished = true;
    }
}

/// `PackageIndex` over a fixed, caller-supplied package list, keyed by
/// `(section, arch)`. Building a fresh `Vec<Box<dyn Package>>` per
/// `enumerate()` call is intentional: each worker must own its own
/// package instances the way a real archive-backed backend would hand
/// out fresh handles.
pub struct DummyIndex {
    packages: HashMap<(String, String), Vec<DummyPackageSpec>>,
    changed: bool,
}

/// Package specs are cloned into fresh `DummyPackage`s on every
/// `enumerate()` call so `finish()` can be called once per instance.
#[derive(Clone)]
pub struct DummyPackageSpec {
    pub id: PackageId,
    pub kind: PackageKind,
    pub files: HashMap<Utf8PathBuf, Vec<u8>>,
    pub descriptions: HashMap<String, String>,
    pub maintainer: Option<String>,
}

impl DummyPackageSpec {
    #[must_use]
    pub fn new(id: PackageId) -> Self {
        Self {
            id,
            kind: PackageKind::Real,
            files: HashMap::new(),
            descriptions: HashMap::new(),
            maintainer: None,
        }
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<Utf8PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), bytes.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, locale: impl Into<String>, text: impl Into<String>) -> Self {
        self.descriptions.insert(locale.into(), text.into());
        self
    }

    fn build(&self) -> DummyPackage {
        let mut pkg = DummyPackage::new(self.id.clone());
        pkg.kind = self.kind;
        for (path, bytes) in &self.files {
            pkg = pkg.with_file(path.clone(), bytes.clone());
        }
        for (locale, text) in &self.descriptions {
            pkg = pkg.with_description(locale.clone(), text.clone());
        }
        if let Some(maintainer) = &self.maintainer {
            pkg = pkg.with_maintainer(maintainer.clone());
        }
        pkg
    }
}

impl DummyIndex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            packages: HashMap::new(),
            changed: true,
        }
    }

    #[must_use]
    pub fn with_packages(
        mut self,
        section: impl Into<String>,
        arch: impl Into<String>,
        packages: Vec<DummyPackageSpec>,
    ) -> Self {
        self.packages.insert((section.into(), arch.into()), packages);
        self
    }

    #[must_use]
    pub fn unchanged(mut self) -> Self {
        self.changed = false;
        self
    }
}

impl Default for DummyIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageIndex for DummyIndex {
    fn enumerate(&self, section: &str, arch: &str) -> Result<Vec<Box<dyn Package>>, AsgenError> {
        let key = (section.to_string(), arch.to_string());
        Ok(self
            .packages
            .get(&key)
            .map(|specs| {
                specs
                    .iter()
                    .map(|spec| Box::new(spec.build()) as Box<dyn Package>)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn has_changed_since_last_run(&self, _section: &str, _arch: &str) -> bool {
        self.changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumerate_returns_fresh_package_instances_each_call() {
        let index = DummyIndex::new().with_packages(
            "main",
            "amd64",
            vec![DummyPackageSpec::new(PackageId::new("hello", "1.0", "amd64"))
                .with_file("/usr/share/applications/hello.desktop", b"[Desktop Entry]".to_vec())],
        );
        let first = index.enumerate("main", "amd64").unwrap();
        let second = index.enumerate("main", "amd64").unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].id(), second[0].id());
    }

    #[test]
    fn read_missing_path_returns_absence_sentinel() {
        let pkg = DummyPackage::new(PackageId::new("hello", "1.0", "amd64"));
        let bytes = pkg.read(camino::Utf8Path::new("/nonexistent"));
        assert!(crate::is_absent(&bytes));
    }

    #[test]
    fn unknown_triple_returns_empty_not_error() {
        let index = DummyIndex::new();
        let pkgs = index.enumerate("universe", "arm64").unwrap();
        assert!(pkgs.is_empty());
    }
}
