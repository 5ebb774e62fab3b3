//! A minimal, deterministic composer for tests (spec §1: the real
//! composer — desktop-entry parsing, icon rendering, MetaInfo
//! validation — is an out-of-scope black box). This stub understands
//! two simplified, line-oriented formats so the engine's end-to-end
//! scenarios (spec §8) are reproducible without a real parser:
//!
//! - `key=value` "desktop entries" under `.../applications/*.desktop`,
//!   requiring an explicit `X-AppStream-ID` line.
//! - `key=value` "metainfo fragments" under `.../metainfo/*.xml` or any
//!   path the caller feeds as an injected-metainfo path, requiring `ID`
//!   and supporting an optional `MergeKind=remove` directive.

use crate::component::{Component, ComponentKind};
use crate::{ComposeOutput, Composer, LocaleUnit, PackageUnit};
use asgen_hints::Hint;
use asgen_utils::types::MergeKind;
use std::collections::HashMap;

/// Parse `key=value` lines, ignoring a leading `[Section]` header line
/// and blank lines.
fn parse_kv(text: &str) -> HashMap<String, String> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('[') {
                return None;
            }
            let (key, value) = line.split_once('=')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

fn is_desktop_path(path: &str) -> bool {
    path.ends_with(".desktop")
        && (path.contains("/applications/") || path.contains("/usr/local/share/applications/"))
}

fn is_metainfo_path(path: &str) -> bool {
    path.ends_with(".xml") && (path.contains("/metainfo/") || path.contains("extra-metainfo"))
}

#[derive(Debug, Default)]
pub struct StubComposer;

impl StubComposer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn compose_desktop_entry(&self, path: &str, bytes: &[u8], package_name: &str) -> (Option<Component>, Vec<Hint>) {
        let text = String::from_utf8_lossy(bytes);
        let fields = parse_kv(&text);

        let Some(id) = fields.get("X-AppStream-ID") else {
            return (
                None,
                vec![Hint::general("desktop-entry-invalid").with_var("path", path.to_string())],
            );
        };

        let mut component = Component::new(id.clone(), ComponentKind::DesktopApp);
        if let Some(name) = fields.get("Name") {
            component.summary.insert("en".to_string(), name.clone());
        }
        if let Some(icon) = fields.get("Icon") {
            component.icon_name = Some(icon.clone());
        }
        component.package_names.push(package_name.to_string());
        (Some(component), Vec::new())
    }

    fn compose_metainfo_fragment(&self, path: &str, bytes: &[u8], package_name: &str) -> (Option<Component>, Vec<Hint>) {
        let text = String::from_utf8_lossy(bytes);
        let fields = parse_kv(&text);

        let Some(id) = fields.get("ID") else {
            return (
                None,
                vec![Hint::general("metainfo-invalid").with_var("path", path.to_string())],
            );
        };

        let kind = match fields.get("Kind").map(String::as_str) {
            Some("console-app") => ComponentKind::ConsoleApp,
            Some("web-app") => ComponentKind::WebApp,
            Some("font") => ComponentKind::Font,
            Some("os") => ComponentKind::OperatingSystem,
            Some("repository") => ComponentKind::Repository,
            _ => ComponentKind::Generic,
        };

        let mut component = Component::new(id.clone(), kind);
        if let Some(name) = fields.get("Name") {
            component.summary.insert("en".to_string(), name.clone());
        }
        if let Some(summary) = fields.get("Summary") {
            component.description.insert("en".to_string(), summary.clone());
        }
        if fields.get("MergeKind").map(String::as_str) == Some("remove") {
            component.merge_kind = MergeKind::RemoveComponent;
        } else if fields.get("MergeKind").map(String::as_str) == Some("replace") {
            component.merge_kind = MergeKind::ReplaceComponent;
        } else if !package_name.is_empty() {
            component.package_names.push(package_name.to_string());
        }
        (Some(component), Vec::new())
    }
}

impl Composer for StubComposer {
    fn compose(&self, unit: &PackageUnit<'_>, _locale: &LocaleUnit) -> Result<ComposeOutput, String> {
        let mut output = ComposeOutput::default();
        let package_name = unit.id().name.clone();

        for path in unit.contents() {
            let path_str = path.as_str();
            let Some(bytes) = unit.read(path) else {
                continue;
            };

            if is_desktop_path(path_str) {
                let (component, hints) = self.compose_desktop_entry(path_str, &bytes, &package_name);
                output.components.extend(component);
                output.hints.extend(hints);
            } else if is_metainfo_path(path_str) {
                let (component, hints) = self.compose_metainfo_fragment(path_str, &bytes, &package_name);
                output.components.extend(component);
                output.hints.extend(hints);
            }
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asgen_backend::dummy::DummyPackage;
    use asgen_utils::types::PackageId;

    #[test]
    fn valid_desktop_entry_produces_one_component() {
        let pkg = DummyPackage::new(PackageId::new("hello", "1.2-3", "amd64")).with_file(
            "/usr/share/applications/hello.desktop",
            "[Desktop Entry]\nX-AppStream-ID=org.example.Hello.desktop\nName=Hello\nIcon=hello\n",
        );
        let unit = PackageUnit::new(&pkg);
        let locale = LocaleUnit::default();
        let out = StubComposer::new().compose(&unit, &locale).unwrap();
        assert_eq!(out.components.len(), 1);
        assert_eq!(out.components[0].id, "org.example.Hello.desktop");
        assert_eq!(out.components[0].icon_name.as_deref(), Some("hello"));
        assert!(out.hints.is_empty());
    }

    #[test]
    fn desktop_entry_without_appstream_id_is_a_hint_not_a_component() {
        let pkg = DummyPackage::new(PackageId::new("bad", "1.0", "amd64"))
            .with_file("/usr/share/applications/bad.desktop", "[Desktop Entry]\nName=Bad\n");
        let unit = PackageUnit::new(&pkg);
        let locale = LocaleUnit::default();
        let out = StubComposer::new().compose(&unit, &locale).unwrap();
        assert!(out.components.is_empty());
        assert_eq!(out.hints.len(), 1);
        assert_eq!(out.hints[0].tag, "desktop-entry-invalid");
    }

    #[test]
    fn metainfo_fragment_with_remove_merge_kind() {
        let pkg = DummyPackage::new(PackageId::new("+extra-metainfo", "0", "amd64"))
            .with_file("extra-metainfo/org.bad.App.xml", "ID=org.bad.App\nMergeKind=remove\n");
        let unit = PackageUnit::new(&pkg);
        let locale = LocaleUnit::default();
        let out = StubComposer::new().compose(&unit, &locale).unwrap();
        assert_eq!(out.components.len(), 1);
        assert_eq!(out.components[0].merge_kind, MergeKind::RemoveComponent);
    }
}
