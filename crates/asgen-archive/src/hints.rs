//! Per-section hints JSON (spec §6 "Hints JSON"): assembled once at
//! export time across every package processed in the section.

use asgen_hints::Hint;
use asgen_utils::types::PackageId;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
struct HintEntry {
    tag: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    vars: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct PackageHints {
    package: String,
    hints: BTreeMap<String, Vec<HintEntry>>,
}

/// `{"package": pkid, "hints": {component-id: [{tag, vars}...]}}` per
/// package, as a JSON array across the whole section (spec §6).
/// Rendered with JCS (RFC 8785) via `serde_json_canonicalizer` so byte
/// output is stable across runs, not just field ordering.
pub fn render(entries: &[(PackageId, Vec<Hint>)]) -> anyhow::Result<Vec<u8>> {
    let mut packages = Vec::with_capacity(entries.len());
    for (package_id, hints) in entries {
        let mut grouped: BTreeMap<String, Vec<HintEntry>> = BTreeMap::new();
        for hint in hints {
            grouped.entry(hint.target().to_string()).or_default().push(HintEntry {
                tag: hint.tag.clone(),
                vars: hint.vars.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            });
        }
        packages.push(PackageHints {
            package: package_id.to_string(),
            hints: grouped,
        });
    }
    let value = serde_json::to_value(&packages)?;
    Ok(serde_json_canonicalizer::to_vec(&value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_hints_by_target_component() {
        let pkid = PackageId::new("hello", "1.0", "amd64");
        let hints = vec![
            Hint::for_component("org.example.Hello.desktop", "icon-not-found"),
            Hint::general("custom-key-rejected").with_var("key", "X-Bad"),
        ];
        let bytes = render(&[(pkid, hints)]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\"org.example.Hello.desktop\""));
        assert!(text.contains("\"general\""));
        assert!(text.contains("\"icon-not-found\""));
        assert!(text.contains("\"X-Bad\""));
    }
}
