//! Component serialization (spec §4.4 "Serialize", §8 scenario 1).
//!
//! No serializer exists anywhere else in the tree: `asgen-archive`
//! only wraps pre-serialized fragments in the catalog envelope (spec
//! §6), and the real per-distribution AppStream serializer named in
//! spec §1's Non-goals is explicitly out of scope. This is the core's
//! own minimal, non-conformant rendering, just rich enough to drive
//! `DataStore::add_generator_result` and round-trip through
//! `CatalogEnvelope::render`.

use asgen_composer::{Component, ComponentKind, IconPlacement};
use asgen_utils::types::MetadataType;
use quick_xml::escape::escape;

/// Render one component to the bytes stored under its gcid in the
/// metadata store, in `metadata_type`'s format. Returns `Err` only if
/// the in-memory model itself is malformed in a way the caller should
/// surface as a `metadata-serialization-failed` hint (spec §4.4); this
/// implementation never fails, since every `Component` field is
/// already well-formed by construction.
pub fn serialize_component(component: &Component, metadata_type: MetadataType) -> Result<Vec<u8>, String> {
    match metadata_type {
        MetadataType::Xml => Ok(render_xml(component).into_bytes()),
        MetadataType::Yaml => Ok(render_yaml(component).into_bytes()),
    }
}

fn kind_str(kind: ComponentKind) -> &'static str {
    use ComponentKind::*;
    match kind {
        DesktopApp => "desktop-application",
        ConsoleApp => "console-application",
        WebApp => "web-application",
        Font => "font",
        Codec => "codec",
        OperatingSystem => "operating-system",
        Repository => "repository",
        Generic => "generic",
    }
}

fn render_xml(component: &Component) -> String {
    let mut out = String::new();
    out.push_str(&format!("<component type=\"{}\">\n", kind_str(component.kind)));
    out.push_str(&format!("  <id>{}</id>\n", escape(&component.id)));
    for (locale, text) in sorted(&component.summary) {
        out.push_str(&format!("  <summary xml:lang=\"{locale}\">{}</summary>\n", escape(text)));
    }
    for (locale, text) in sorted(&component.description) {
        out.push_str(&format!("  <description xml:lang=\"{locale}\">{}</description>\n", escape(text)));
    }
    for name in &component.package_names {
        out.push_str(&format!("  <pkgname>{}</pkgname>\n", escape(name)));
    }
    for icon in &component.icons {
        let (tag, filename) = match &icon.placement {
            IconPlacement::Cached { filename } => ("cached", filename),
            IconPlacement::Remote { filename } => ("remote", filename),
        };
        out.push_str(&format!(
            "  <icon type=\"{tag}\" width=\"{}\" height=\"{}\" scale=\"{}\">{}</icon>\n",
            icon.width,
            icon.height,
            icon.scale,
            escape(filename)
        ));
    }
    for (key, value) in sorted(&component.custom_fields) {
        out.push_str(&format!("  <custom key=\"{}\">{}</custom>\n", escape(key), escape(value)));
    }
    out.push_str("</component>\n");
    out
}

fn render_yaml(component: &Component) -> String {
    let mut out = String::new();
    out.push_str(&format!("ID: {}\n", component.id));
    out.push_str(&format!("Type: {}\n", kind_str(component.kind)));
    if !component.summary.is_empty() {
        out.push_str("Summary:\n");
        for (locale, text) in sorted(&component.summary) {
            out.push_str(&format!("  {locale}: {}\n", yaml_scalar(text)));
        }
    }
    if !component.description.is_empty() {
        out.push_str("Description:\n");
        for (locale, text) in sorted(&component.description) {
            out.push_str(&format!("  {locale}: {}\n", yaml_scalar(text)));
        }
    }
    if !component.package_names.is_empty() {
        out.push_str("Package:\n");
        for name in &component.package_names {
            out.push_str(&format!("  - {name}\n"));
        }
    }
    if !component.icons.is_empty() {
        out.push_str("Icons:\n");
        for icon in &component.icons {
            let (kind, filename) = match &icon.placement {
                IconPlacement::Cached { filename } => ("cached", filename),
                IconPlacement::Remote { filename } => ("remote", filename),
            };
            out.push_str(&format!(
                "  - type: {kind}\n    name: {filename}\n    width: {}\n    height: {}\n    scale: {}\n",
                icon.width, icon.height, icon.scale
            ));
        }
    }
    out
}

fn yaml_scalar(text: &str) -> String {
    format!("{:?}", text)
}

fn sorted(map: &std::collections::HashMap<String, String>) -> Vec<(&String, &String)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_output_contains_component_id() {
        let component = Component::new("org.example.Hello", ComponentKind::DesktopApp);
        let bytes = serialize_component(&component, MetadataType::Xml).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("<id>org.example.Hello</id>"));
    }

    #[test]
    fn yaml_output_contains_component_id() {
        let component = Component::new("org.example.Hello", ComponentKind::DesktopApp);
        let bytes = serialize_component(&component, MetadataType::Yaml).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("ID: org.example.Hello"));
    }

    #[test]
    fn xml_escapes_special_characters_in_summary() {
        let mut component = Component::new("org.example.Hello", ComponentKind::DesktopApp);
        component.summary.insert("en".to_string(), "A & B <tag>".to_string());
        let bytes = serialize_component(&component, MetadataType::Xml).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("A &amp; B &lt;tag&gt;"));
    }
}
