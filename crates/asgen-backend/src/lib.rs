//! Package-backend capability traits.
//!
//! Per-distribution package formats (`.deb`, `.rpm`, `.apk`, Arch
//! `.pkg.tar.*`, FreeBSD pkg, a Nix store) are explicitly out of scope
//! (spec §1): the core only consumes the `PackageIndex`/`Package`
//! capability. This crate defines that capability boundary and nothing
//! else; `dummy` (behind `test-utils`) is the only concrete backend the
//! core itself ships, used for engine tests and the end-to-end
//! scenarios in spec §8.

use asgen_utils::error::AsgenError;
use asgen_utils::types::PackageId;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;

/// Real packages come from the distribution; `Fake` marks a synthetic
/// injection package such as `+extra-metainfo` (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    Real,
    Fake,
}

/// GStreamer element capabilities a package claims to provide, used to
/// trigger codec pseudo-component emission (spec §4.4 "DataExtractor").
#[derive(Debug, Clone, Default)]
pub struct GstreamerCaps {
    pub decoders: Vec<String>,
    pub encoders: Vec<String>,
    pub uri_sinks: Vec<String>,
    pub uri_sources: Vec<String>,
}

impl GstreamerCaps {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
            && self.encoders.is_empty()
            && self.uri_sinks.is_empty()
            && self.uri_sources.is_empty()
    }
}

/// Optional translator for desktop-entry localized keys (spec §3: "an
/// optional desktop-entry translator"). The composer invokes this
/// synchronously; no lifetime escapes the callback (spec §9).
pub trait DesktopEntryTranslator: Send + Sync {
    fn translate(&self, locale: &str, key: &str) -> Option<String>;
}

/// One package, opaque to the core beyond this capability set (spec §3).
///
/// `read()` never signals "absent" with an empty `Vec` alone: per spec
/// §9, a non-existent path returns a one-byte sentinel so composer
/// implementations that treat a zero-length return as fatal still work.
/// Callers must treat `len() <= 1` as "absent" when making policy
/// decisions. `Sync` so a read-only candidate-package map can be shared
/// by reference across extractor worker threads (spec §4.5 step 2).
pub trait Package: Send + Sync {
    fn id(&self) -> PackageId;
    fn kind(&self) -> PackageKind;

    /// Ordered sequence of absolute file paths inside the package.
    fn contents(&self) -> &[Utf8PathBuf];

    /// Produce the bytes at `path`, or the one-byte absence sentinel.
    fn read(&self, path: &Utf8Path) -> Vec<u8>;

    /// Locale code -> long description paragraph.
    fn descriptions(&self) -> &HashMap<String, String>;

    fn maintainer(&self) -> Option<&str> {
        None
    }

    fn desktop_translator(&self) -> Option<&dyn DesktopEntryTranslator> {
        None
    }

    fn gstreamer_caps(&self) -> Option<&GstreamerCaps> {
        None
    }

    /// Release temporary resources (open archive handles, extracted
    /// scratch directories). Called at most once, as soon as the
    /// content lookup or extraction using this package completes
    /// (spec §3 "Lifecycle summary": eager release).
    fn finish(&mut self);
}

/// The one-byte sentinel `read()` returns for a path that does not
/// exist in the package.
#[must_use]
pub fn absent_sentinel() -> Vec<u8> {
    vec![0u8]
}

/// True if bytes returned from `Package::read` represent "absent" per
/// spec §9 ("callers must treat length <= 1 as absent").
#[must_use]
pub fn is_absent(bytes: &[u8]) -> bool {
    bytes.len() <= 1
}

/// Enumerates the packages of one (suite, section, architecture)
/// triple. Pluggable per distribution; only this interface is in scope.
pub trait PackageIndex: Send + Sync {
    fn enumerate(&self, section: &str, arch: &str) -> Result<Vec<Box<dyn Package>>, AsgenError>;

    /// Whether the index changed since the last successful run for this
    /// (section, arch). Used by `Engine::seedContentsData` to skip a
    /// triple entirely when nothing changed and the run is not forced
    /// (spec §4.5 step 1). Backends that cannot cheaply detect this
    /// should conservatively return `true`.
    fn has_changed_since_last_run(&self, _section: &str, _arch: &str) -> bool {
        true
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod dummy;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absence_sentinel_is_treated_as_absent() {
        assert!(is_absent(&absent_sentinel()));
        assert!(is_absent(&[]));
        assert!(!is_absent(b"xy"));
    }
}
