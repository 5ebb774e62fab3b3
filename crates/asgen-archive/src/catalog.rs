//! Catalog envelope (spec §6 "Catalog envelope"). Full AppStream
//! component serialization is out of scope (spec §1 Non-goals: "the
//! XML/YAML catalog serializers beyond their envelope"); this module
//! only wraps whatever bytes the composer's `serialize` callback
//! already produced, one already-serialized fragment per component.

use asgen_utils::types::MetadataType;
use chrono::{SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

/// Header fields shared by the XML and YAML envelope forms (spec §6).
pub struct CatalogEnvelope<'a> {
    pub format_version: &'a str,
    pub origin: String,
    pub priority: Option<i64>,
    pub media_base_url: Option<&'a str>,
    pub include_timestamp: bool,
}

impl<'a> CatalogEnvelope<'a> {
    #[must_use]
    pub fn new(format_version: &'a str, project_name: &str, suite: &str, section: &str) -> Self {
        Self {
            format_version,
            origin: format!("{project_name}-{suite}-{section}"),
            priority: None,
            media_base_url: None,
            include_timestamp: false,
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn with_media_base_url(mut self, url: &'a str) -> Self {
        self.media_base_url = Some(url);
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, on: bool) -> Self {
        self.include_timestamp = on;
        self
    }

    #[must_use]
    pub fn render(&self, metadata_type: MetadataType, fragments: &[Vec<u8>]) -> Vec<u8> {
        match metadata_type {
            MetadataType::Xml => self.render_xml(fragments),
            MetadataType::Yaml => self.render_yaml(fragments),
        }
    }

    /// `fragments` are pre-serialized `<component>...</component>` bodies,
    /// in the caller's deterministic order.
    #[must_use]
    pub fn render_xml(&self, fragments: &[Vec<u8>]) -> Vec<u8> {
        let timestamp = self.include_timestamp.then(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

        let mut out = Vec::new();
        {
            let mut writer = Writer::new(&mut out);
            writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None))).expect("write xml decl");

            let mut start = BytesStart::new("components");
            start.push_attribute(("version", self.format_version));
            start.push_attribute(("origin", self.origin.as_str()));
            let priority_str = self.priority.map(|p| p.to_string());
            if let Some(priority) = &priority_str {
                start.push_attribute(("priority", priority.as_str()));
            }
            if let Some(url) = self.media_base_url {
                start.push_attribute(("media_baseurl", url));
            }
            if let Some(time) = &timestamp {
                start.push_attribute(("time", time.as_str()));
            }
            writer.write_event(Event::Start(start)).expect("write components start tag");
        }
        out.push(b'\n');

        for fragment in fragments {
            out.extend_from_slice(fragment);
            out.push(b'\n');
        }

        {
            let mut writer = Writer::new(&mut out);
            writer.write_event(Event::End(BytesEnd::new("components"))).expect("write components end tag");
        }
        out.push(b'\n');
        out
    }

    /// `documents` are pre-serialized DEP-11 YAML component documents,
    /// without a leading `---` separator.
    #[must_use]
    pub fn render_yaml(&self, documents: &[Vec<u8>]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"File: DEP-11\n");
        out.extend_from_slice(format!("Version: '{}'\n", self.format_version).as_bytes());
        out.extend_from_slice(format!("Origin: {}\n", self.origin).as_bytes());
        if let Some(url) = self.media_base_url {
            out.extend_from_slice(format!("MediaBaseUrl: {url}\n").as_bytes());
        }
        if let Some(priority) = self.priority {
            out.extend_from_slice(format!("Priority: {priority}\n").as_bytes());
        }
        if self.include_timestamp {
            let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
            out.extend_from_slice(format!("Time: {now}\n").as_bytes());
        }
        for document in documents {
            out.extend_from_slice(b"---\n");
            out.extend_from_slice(document);
            if !document.ends_with(b"\n") {
                out.push(b'\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_envelope_wraps_fragments_with_required_attributes() {
        let envelope = CatalogEnvelope::new("1.0", "mydist", "stable", "main").with_priority(5);
        let rendered = envelope.render_xml(&[b"<component/>".to_vec()]);
        let text = String::from_utf8(rendered).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(text.contains("origin=\"mydist-stable-main\""));
        assert!(text.contains("priority=\"5\""));
        assert!(text.contains("<component/>"));
        assert!(text.trim_end().ends_with("</components>"));
    }

    #[test]
    fn xml_envelope_omits_time_attribute_unless_requested() {
        let envelope = CatalogEnvelope::new("1.0", "mydist", "stable", "main");
        let rendered = envelope.render_xml(&[]);
        assert!(!String::from_utf8(rendered).unwrap().contains("time="));
    }

    #[test]
    fn yaml_envelope_uses_dep11_header_and_document_separators() {
        let envelope = CatalogEnvelope::new("1.0", "mydist", "stable", "main").with_media_base_url("https://example.com/media");
        let rendered = envelope.render_yaml(&[b"Type: desktop-application".to_vec()]);
        let text = String::from_utf8(rendered).unwrap();
        assert!(text.starts_with("File: DEP-11\n"));
        assert!(text.contains("MediaBaseUrl: https://example.com/media\n"));
        assert!(text.contains("---\nType: desktop-application\n"));
    }
}
