//! Per-suite execution plans derived from [`asgen_config::Config`] (spec
//! §4.5 step 0: "resolve which (suite, section, architecture) triples
//! this run covers").

use asgen_config::Config;

/// Sections always pulled into a suite's candidate pool regardless of
/// which section is currently being processed (spec §4.5 step 2: "the
/// usual suspects for cross-section icon/content lookups").
pub const ALWAYS_LOADED_SECTIONS: [&str; 4] = ["main", "universe", "core", "extra"];

/// Resolved, read-only view of one suite's configuration, with
/// `base_suite`/`use_icon_theme` already plucked out of the raw
/// `SuiteConfig` map so the rest of the engine never re-indexes it.
#[derive(Debug, Clone)]
pub struct SuitePlan {
    pub name: String,
    pub data_priority: i64,
    pub base_suite: Option<String>,
    pub use_icon_theme: Option<String>,
    pub sections: Vec<String>,
    pub architectures: Vec<String>,
    pub immutable: bool,
}

impl SuitePlan {
    /// This suite's declared sections that are also always-loaded,
    /// preserving `ALWAYS_LOADED_SECTIONS` order (spec §4.5 step 2).
    #[must_use]
    pub fn always_loaded_sections(&self) -> Vec<&str> {
        ALWAYS_LOADED_SECTIONS
            .iter()
            .copied()
            .filter(|s| self.sections.iter().any(|declared| declared == s))
            .collect()
    }
}

/// Build one plan per configured suite, sorted by name so iteration
/// order (and therefore log/statistics ordering) is deterministic
/// across runs regardless of `HashMap` iteration order (spec §4.5,
/// §9 "Determinism").
#[must_use]
pub fn resolve_plans(config: &Config) -> Vec<SuitePlan> {
    let mut plans: Vec<SuitePlan> = config
        .suites
        .iter()
        .map(|(name, suite)| SuitePlan {
            name: name.clone(),
            data_priority: suite.data_priority,
            base_suite: suite.base_suite.clone(),
            use_icon_theme: suite.use_icon_theme.clone(),
            sections: suite.sections.clone(),
            architectures: suite.architectures.clone(),
            immutable: suite.immutable,
        })
        .collect();
    plans.sort_by(|a, b| a.name.cmp(&b.name));
    plans
}

#[cfg(test)]
mod tests {
    use super::*;
    use asgen_config::model::{Backend, ExportDirs, Features, SuiteConfig};
    use std::collections::HashMap;

    fn empty_suite() -> SuiteConfig {
        SuiteConfig {
            data_priority: 0,
            base_suite: None,
            use_icon_theme: None,
            sections: Vec::new(),
            architectures: Vec::new(),
            immutable: false,
        }
    }

    fn config_with(suites: HashMap<String, SuiteConfig>) -> Config {
        Config {
            workspace_dir: "/tmp/ws".into(),
            project_name: "test".into(),
            archive_root: "/tmp".into(),
            media_base_url: None,
            html_base_url: None,
            export_dirs: ExportDirs::default(),
            extra_metainfo_dir: None,
            ca_info: None,
            format_version: "1.0".into(),
            backend: Backend::Dummy,
            metadata_type: None,
            suites,
            oldsuites: Vec::new(),
            icons: HashMap::new(),
            max_screenshot_file_size: 0,
            allowed_custom_keys: Vec::new(),
            features: Features::default(),
        }
    }

    #[test]
    fn plans_are_sorted_by_name() {
        let mut suites = HashMap::new();
        suites.insert("zesty".to_string(), empty_suite());
        suites.insert("artful".to_string(), empty_suite());
        let plans = resolve_plans(&config_with(suites));
        assert_eq!(plans[0].name, "artful");
        assert_eq!(plans[1].name, "zesty");
    }

    #[test]
    fn always_loaded_sections_intersects_declared() {
        let plan = SuitePlan {
            name: "stable".into(),
            data_priority: 0,
            base_suite: None,
            use_icon_theme: None,
            sections: vec!["main".into(), "contrib".into(), "extra".into()],
            architectures: vec!["amd64".into()],
            immutable: false,
        };
        assert_eq!(plan.always_loaded_sections(), vec!["main", "extra"]);
    }
}
