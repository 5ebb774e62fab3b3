//! InjectedModifications (C4): per-suite removal/inject/custom-field
//! overlay (SPEC_FULL.md §4.4 SUPPLEMENT, spec §4.4 step 3, scenario #4).
//!
//! spec.md names this component in its crate table but specifies its
//! behavior only through call sites; the explicit interface below
//! (`load`, `removal_set`, `custom_fields_for`, `injected_metainfo_paths`)
//! is this crate's contribution to closing that gap.

use anyhow::Context;
use asgen_hints::Hint;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default, Deserialize)]
struct ModificationsFile {
    #[serde(default, rename = "Remove")]
    remove: Vec<String>,
    #[serde(default, rename = "Inject")]
    inject: Vec<String>,
    #[serde(default, rename = "CustomFields")]
    custom_fields: HashMap<String, HashMap<String, String>>,
}

/// A loaded `<extraMetainfoDir>/<suite>/` overlay.
#[derive(Debug, Default, Clone)]
pub struct InjectedModifications {
    removal_set: HashSet<String>,
    custom_fields: HashMap<String, HashMap<String, String>>,
    injected_metainfo_paths: Vec<Utf8PathBuf>,
    /// Raw `Inject` fragment bodies, in file order — the synthetic
    /// `+extra-metainfo` package's file listing is built from these
    /// plus `injected_metainfo_paths` (spec §4.5 step 3).
    injected_fragments: Vec<String>,
    hints: Vec<Hint>,
}

impl InjectedModifications {
    /// Reads `<extra_metainfo_dir>/<suite>/modifications.json` and
    /// `<extra_metainfo_dir>/<suite>/metainfo/*.xml`. A missing
    /// directory is not an error — it yields an empty overlay.
    /// `allowed_custom_keys` filters `CustomFields` entries at
    /// construction time; rejected keys get a `custom-key-rejected`
    /// hint against `"general"`.
    pub fn load(extra_metainfo_dir: &Utf8Path, suite: &str, allowed_custom_keys: &HashSet<String>) -> anyhow::Result<Self> {
        let suite_dir = extra_metainfo_dir.join(suite);
        if !suite_dir.exists() {
            return Ok(Self::default());
        }

        let modifications_path = suite_dir.join("modifications.json");
        let parsed: ModificationsFile = if modifications_path.exists() {
            let text = std::fs::read_to_string(&modifications_path)
                .with_context(|| format!("reading {modifications_path}"))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {modifications_path}"))?
        } else {
            ModificationsFile::default()
        };

        let mut hints = Vec::new();
        let mut custom_fields = HashMap::new();
        for (component_id, fields) in parsed.custom_fields {
            let mut kept = HashMap::new();
            for (key, value) in fields {
                if allowed_custom_keys.contains(&key) {
                    kept.insert(key, value);
                } else {
                    hints.push(Hint::general("custom-key-rejected").with_var("key", key));
                }
            }
            custom_fields.insert(component_id, kept);
        }

        let mut injected_metainfo_paths = Vec::new();
        let metainfo_dir = suite_dir.join("metainfo");
        if metainfo_dir.exists() {
            for entry in walkdir::WalkDir::new(metainfo_dir.as_std_path())
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
            {
                if entry.file_type().is_file() && entry.path().extension().and_then(|e| e.to_str()) == Some("xml") {
                    if let Ok(path) = Utf8PathBuf::from_path_buf(entry.path().to_path_buf()) {
                        injected_metainfo_paths.push(path);
                    }
                }
            }
        }

        Ok(Self {
            removal_set: parsed.remove.into_iter().collect(),
            custom_fields,
            injected_metainfo_paths,
            injected_fragments: parsed.inject,
            hints,
        })
    }

    #[must_use]
    pub fn removal_set(&self) -> &HashSet<String> {
        &self.removal_set
    }

    #[must_use]
    pub fn custom_fields_for(&self, component_id: &str) -> Option<&HashMap<String, String>> {
        self.custom_fields.get(component_id)
    }

    #[must_use]
    pub fn injected_metainfo_paths(&self) -> &[Utf8PathBuf] {
        &self.injected_metainfo_paths
    }

    #[must_use]
    pub fn injected_fragments(&self) -> &[String] {
        &self.injected_fragments
    }

    /// Hints raised while loading the overlay itself (currently only
    /// `custom-key-rejected`), to be merged into the run's general hint
    /// stream.
    #[must_use]
    pub fn hints(&self) -> &[Hint] {
        &self.hints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_suite_directory_yields_empty_overlay() {
        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let overlay = InjectedModifications::load(root, "stable", &HashSet::new()).unwrap();
        assert!(overlay.removal_set().is_empty());
        assert!(overlay.injected_metainfo_paths().is_empty());
    }

    #[test]
    fn loads_removal_set_and_custom_fields() {
        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let suite_dir = root.join("stable");
        std::fs::create_dir_all(&suite_dir).unwrap();
        std::fs::write(
            suite_dir.join("modifications.json"),
            r#"{"Remove": ["org.bad.App"], "CustomFields": {"org.good.App": {"X-AllowedKey": "1", "X-Rejected": "2"}}}"#,
        )
        .unwrap();

        let allowed: HashSet<String> = ["X-AllowedKey".to_string()].into_iter().collect();
        let overlay = InjectedModifications::load(root, "stable", &allowed).unwrap();

        assert!(overlay.removal_set().contains("org.bad.App"));
        let fields = overlay.custom_fields_for("org.good.App").unwrap();
        assert_eq!(fields.get("X-AllowedKey"), Some(&"1".to_string()));
        assert!(!fields.contains_key("X-Rejected"));
        assert_eq!(overlay.hints().len(), 1);
        assert_eq!(overlay.hints()[0].tag, "custom-key-rejected");
    }

    #[test]
    fn collects_injected_metainfo_xml_files_sorted() {
        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let metainfo_dir = root.join("stable").join("metainfo");
        std::fs::create_dir_all(&metainfo_dir).unwrap();
        std::fs::write(metainfo_dir.join("b.xml"), "b").unwrap();
        std::fs::write(metainfo_dir.join("a.xml"), "a").unwrap();
        std::fs::write(metainfo_dir.join("notes.txt"), "ignored").unwrap();

        let overlay = InjectedModifications::load(root, "stable", &HashSet::new()).unwrap();
        let names: Vec<_> = overlay
            .injected_metainfo_paths()
            .iter()
            .map(|p| p.file_name().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.xml".to_string(), "b.xml".to_string()]);
    }
}
