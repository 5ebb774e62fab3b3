//! `Unit` types: the read-only filesystem views the composer consumes
//! (spec §1 "a 'unit' (a filesystem view)", §4.4, §9).

use asgen_backend::{is_absent, Package};
use asgen_utils::types::PackageId;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;

/// Wraps one package as a read-only file-tree view. No lifetime of the
/// underlying package escapes past the borrow (spec §9: "No lifetime
/// escapes the callback").
pub struct PackageUnit<'a> {
    package: &'a dyn Package,
}

impl<'a> PackageUnit<'a> {
    #[must_use]
    pub fn new(package: &'a dyn Package) -> Self {
        Self { package }
    }

    #[must_use]
    pub fn id(&self) -> PackageId {
        self.package.id()
    }

    #[must_use]
    pub fn contents(&self) -> &[Utf8PathBuf] {
        self.package.contents()
    }

    /// Read a file's bytes, or `None` if absent (collapses the raw
    /// one-byte sentinel per spec §9 into an `Option` at this boundary
    /// so composer code does not have to reason about sentinel bytes).
    #[must_use]
    pub fn read(&self, path: &Utf8Path) -> Option<Vec<u8>> {
        let bytes = self.package.read(path);
        if is_absent(&bytes) {
            None
        } else {
            Some(bytes)
        }
    }

    #[must_use]
    pub fn descriptions(&self) -> &HashMap<String, String> {
        self.package.descriptions()
    }

    #[must_use]
    pub fn package(&self) -> &'a dyn Package {
        self.package
    }
}

/// Covers every package of one (suite, section, arch) triple so the
/// composer can resolve a `.mo`/`.qm` translation domain that lives in
/// a different package than the desktop entry referencing it (spec §4.1
/// `locale_map`: "assuming one domain lives in a single package").
#[derive(Debug, Clone, Default)]
pub struct LocaleUnit {
    /// Domain filename (basename of the `.mo`/`.qm` file) -> owning package-id.
    domains: HashMap<String, PackageId>,
}

impl LocaleUnit {
    #[must_use]
    pub fn new(domains: HashMap<String, PackageId>) -> Self {
        Self { domains }
    }

    #[must_use]
    pub fn owner_of(&self, domain_filename: &str) -> Option<&PackageId> {
        self.domains.get(domain_filename)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asgen_backend::dummy::DummyPackage;

    #[test]
    fn package_unit_collapses_sentinel_to_none() {
        let pkg = DummyPackage::new(PackageId::new("hello", "1.0", "amd64"));
        let unit = PackageUnit::new(&pkg);
        assert_eq!(unit.read(Utf8Path::new("/missing")), None);
    }

    #[test]
    fn package_unit_returns_real_bytes_when_present() {
        let pkg = DummyPackage::new(PackageId::new("hello", "1.0", "amd64"))
            .with_file("/present", b"abc".to_vec());
        let unit = PackageUnit::new(&pkg);
        assert_eq!(unit.read(Utf8Path::new("/present")), Some(b"abc".to_vec()));
    }

    #[test]
    fn locale_unit_looks_up_by_domain_basename() {
        let mut domains = HashMap::new();
        domains.insert("hello.mo".to_string(), PackageId::new("hello-l10n", "1.0", "amd64"));
        let unit = LocaleUnit::new(domains);
        assert_eq!(
            unit.owner_of("hello.mo"),
            Some(&PackageId::new("hello-l10n", "1.0", "amd64"))
        );
        assert_eq!(unit.owner_of("missing.mo"), None);
    }
}
