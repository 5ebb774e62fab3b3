//! The synthetic `+extra-metainfo` package (spec §4.5 step 3): wraps
//! one suite's [`InjectedModifications`] overlay — on-disk
//! `metainfo/*.xml` files plus raw `Inject` fragment bodies — as an
//! ordinary [`Package`] so it flows through the same
//! compose/dedup/icon/final-check pipeline as any real package.
//!
//! Content bytes are passed through verbatim: whatever the overlay
//! contains is whatever the active [`Composer`](asgen_composer::Composer)
//! sees, real AppStream XML or the simplified `key=value` fragments
//! `StubComposer` understands in tests.

use asgen_backend::{DesktopEntryTranslator, GstreamerCaps, Package, PackageKind};
use asgen_extractor::INJECTION_PACKAGE_NAME;
use asgen_modifications::InjectedModifications;
use asgen_utils::types::PackageId;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;

/// Read-only package view over an `InjectedModifications` overlay.
pub struct InjectedPackage {
    id: PackageId,
    contents: Vec<Utf8PathBuf>,
    files: HashMap<Utf8PathBuf, Vec<u8>>,
    descriptions: HashMap<String, String>,
    finished: bool,
}

impl InjectedPackage {
    /// Build the injection package for one (suite, arch); returns
    /// `None` if the overlay has nothing to inject (no on-disk metainfo
    /// fragments and no inline `Inject` bodies).
    #[must_use]
    pub fn from_modifications(modifications: &InjectedModifications, arch: &str) -> Option<Self> {
        if modifications.injected_metainfo_paths().is_empty() && modifications.injected_fragments().is_empty() {
            return None;
        }

        let mut contents = Vec::new();
        let mut files = HashMap::new();

        for path in modifications.injected_metainfo_paths() {
            let bytes = std::fs::read(path).unwrap_or_default();
            contents.push(path.clone());
            files.insert(path.clone(), bytes);
        }

        for (i, fragment) in modifications.injected_fragments().iter().enumerate() {
            let virtual_path = Utf8PathBuf::from(format!("extra-metainfo/inline-{i}.xml"));
            contents.push(virtual_path.clone());
            files.insert(virtual_path, fragment.as_bytes().to_vec());
        }

        Some(Self {
            id: PackageId::new(INJECTION_PACKAGE_NAME, "0", arch),
            contents,
            files,
            descriptions: HashMap::new(),
            finished: false,
        })
    }
}

impl Package for InjectedPackage {
    fn id(&self) -> PackageId {
        self.id.clone()
    }

    fn kind(&self) -> PackageKind {
        PackageKind::Fake
    }

    fn contents(&self) -> &[Utf8PathBuf] {
        &self.contents
    }

    fn read(&self, path: &Utf8Path) -> Vec<u8> {
        self.files.get(path).cloned().unwrap_or_else(asgen_backend::absent_sentinel)
    }

    fn descriptions(&self) -> &HashMap<String, String> {
        &self.descriptions
    }

    fn desktop_translator(&self) -> Option<&dyn DesktopEntryTranslator> {
        None
    }

    fn gstreamer_caps(&self) -> Option<&GstreamerCaps> {
        None
    }

    fn finish(&mut self) {
        assert!(!self.finished, "InjectedPackage::finish called twice");
        self.finished = true;
    }
}
