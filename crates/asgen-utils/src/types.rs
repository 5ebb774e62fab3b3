//! Shared value types used across the whole pipeline (spec §3, §9 glossary).

use serde::{Deserialize, Serialize};
use std::fmt;

/// `name/version/arch`, a stable key across suites (glossary: Package-id).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageId {
    pub name: String,
    pub version: String,
    pub arch: String,
}

impl PackageId {
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            arch: arch.into(),
        }
    }

    /// Parse a `name/version/arch` string. Fails if it does not have
    /// exactly three `/`-separated segments.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.splitn(3, '/');
        let name = parts.next()?;
        let version = parts.next()?;
        let arch = parts.next()?;
        if name.is_empty() || version.is_empty() || arch.is_empty() {
            return None;
        }
        Some(Self::new(name, version, arch))
    }

    /// True if this package-id's name matches `prefix` exactly, or its
    /// serialized form starts with `"{prefix}/"` — the matching rule
    /// `DataStore::pkids_matching` and `forget` use.
    #[must_use]
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.name == prefix || self.to_string().starts_with(&format!("{prefix}/"))
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.name, self.version, self.arch)
    }
}

/// Content-addressed Global Component ID: `{tld}/{second_level}/{component_id}/{hash}`.
/// Equal gcid implies byte-identical catalog entry (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Gcid {
    pub tld: String,
    pub second_level: String,
    pub component_id: String,
    pub hash: String,
}

impl Gcid {
    #[must_use]
    pub fn new(
        tld: impl Into<String>,
        second_level: impl Into<String>,
        component_id: impl Into<String>,
        hash: impl Into<String>,
    ) -> Self {
        Self {
            tld: tld.into(),
            second_level: second_level.into(),
            component_id: component_id.into(),
            hash: hash.into(),
        }
    }

    /// Derive `{tld, second_level}` from a reverse-DNS component id
    /// (`org.example.Hello.desktop` -> `org`, `example`). Falls back to
    /// `unknown`/the whole id when the id has fewer than two segments —
    /// components from backends that do not enforce reverse-DNS ids
    /// (fonts, codecs) still need a stable gcid shape.
    #[must_use]
    pub fn from_component_id(component_id: &str, hash: &str) -> Self {
        let mut segments = component_id.split('.');
        let tld = segments.next().unwrap_or("unknown").to_string();
        let second_level = segments.next().unwrap_or("unknown").to_string();
        Self::new(tld, second_level, component_id, hash)
    }

    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.splitn(4, '/');
        let tld = parts.next()?;
        let second_level = parts.next()?;
        let component_id = parts.next()?;
        let hash = parts.next()?;
        Some(Self::new(tld, second_level, component_id, hash))
    }
}

impl fmt::Display for Gcid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.tld, self.second_level, self.component_id, self.hash
        )
    }
}

/// Issue hint severity (spec §7/§9 glossary). `Error` removes the
/// component from output; `Warning`/`Info` keep it; `Pedantic` is
/// discarded entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Pedantic,
}

/// Catalog metadata format selected by `Config.MetadataType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataType {
    Xml,
    Yaml,
}

impl MetadataType {
    #[must_use]
    pub fn store_name(self) -> &'static str {
        match self {
            MetadataType::Xml => "metadata_xml",
            MetadataType::Yaml => "metadata_yaml",
        }
    }
}

/// Merge directive a component carries, set by the composer or by
/// `InjectedModifications` overlays (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MergeKind {
    #[default]
    None,
    ReplaceComponent,
    RemoveComponent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_id_round_trips_through_display_and_parse() {
        let pkid = PackageId::new("hello", "1.2-3", "amd64");
        assert_eq!(pkid.to_string(), "hello/1.2-3/amd64");
        assert_eq!(PackageId::parse("hello/1.2-3/amd64").as_ref(), Some(&pkid));
    }

    #[test]
    fn package_id_prefix_match_requires_slash_boundary() {
        let pkid = PackageId::new("hello-clone", "1.0-1", "amd64");
        assert!(!pkid.matches_prefix("hello"));
        assert!(pkid.matches_prefix("hello-clone"));
    }

    #[test]
    fn gcid_derives_tld_and_second_level_from_component_id() {
        let gcid = Gcid::from_component_id("org.example.Hello.desktop", "abc123");
        assert_eq!(gcid.tld, "org");
        assert_eq!(gcid.second_level, "example");
        assert_eq!(gcid.to_string(), "org/example/org.example.Hello.desktop/abc123");
        assert_eq!(Gcid::parse(&gcid.to_string()).as_ref(), Some(&gcid));
    }
}
