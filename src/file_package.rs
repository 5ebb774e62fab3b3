//! `process-file` support: a minimal `Package`/`PackageIndex` pair
//! built directly from files named on the command line, since no
//! concrete distro backend ships in this core (spec §1 Non-goals).
//!
//! A real backend derives a package-id and architecture from package
//! metadata (control file, RPM header, ...); without one, the file's
//! stem becomes the package name and the architecture is whatever the
//! caller restricts the run to (spec §6 "process given package files
//! ... restricted to their architectures").

use asgen_backend::{absent_sentinel, GstreamerCaps, Package, PackageIndex, PackageKind};
use asgen_utils::error::AsgenError;
use asgen_utils::types::PackageId;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;

pub struct FilePackage {
    id: PackageId,
    contents: Vec<Utf8PathBuf>,
    bytes: Vec<u8>,
    descriptions: HashMap<String, String>,
    finished: bool,
}

impl FilePackage {
    pub fn from_path(path: &Utf8Path, arch: &str) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path.file_stem().unwrap_or("unknown").to_string();
        let virtual_path: Utf8PathBuf = format!("/usr/share/metainfo/{name}.metainfo.xml").into();
        Ok(Self {
            id: PackageId::new(name, "0", arch),
            contents: vec![virtual_path],
            bytes,
            descriptions: HashMap::new(),
            finished: false,
        })
    }
}

impl Package for FilePackage {
    fn id(&self) -> PackageId {
        self.id.clone()
    }

    fn kind(&self) -> PackageKind {
        PackageKind::Real
    }

    fn contents(&self) -> &[Utf8PathBuf] {
        &self.contents
    }

    fn read(&self, path: &Utf8Path) -> Vec<u8> {
        if self.contents.iter().any(|p| p == path) {
            self.bytes.clone()
        } else {
            absent_sentinel()
        }
    }

    fn descriptions(&self) -> &HashMap<String, String> {
        &self.descriptions
    }

    fn gstreamer_caps(&self) -> Option<&GstreamerCaps> {
        None
    }

    fn finish(&mut self) {
        assert!(!self.finished, "Package::finish called more than once");
        self.finished = true;
    }
}

/// `PackageIndex` over a fixed set of files restricted to one
/// `(section, arch)`. Used only by `process-file`.
pub struct FileIndex {
    section: String,
    arch: String,
    paths: Vec<Utf8PathBuf>,
}

impl FileIndex {
    pub fn new(section: impl Into<String>, arch: impl Into<String>, paths: Vec<Utf8PathBuf>) -> Self {
        Self { section: section.into(), arch: arch.into(), paths }
    }
}

impl PackageIndex for FileIndex {
    fn enumerate(&self, section: &str, arch: &str) -> Result<Vec<Box<dyn Package>>, AsgenError> {
        if section != self.section || arch != self.arch {
            return Ok(Vec::new());
        }
        self.paths
            .iter()
            .map(|path| FilePackage::from_path(path, arch).map(|p| Box::new(p) as Box<dyn Package>))
            .collect::<anyhow::Result<Vec<_>>>()
            .map_err(|e| AsgenError::Io(std::io::Error::other(e)))
    }

    fn has_changed_since_last_run(&self, _section: &str, _arch: &str) -> bool {
        true
    }
}
