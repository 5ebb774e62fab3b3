//! Candidate package pool (spec §4.5 step 2): for one (suite, section,
//! arch) triple, the set of packages that may be referenced as an icon
//! or locale *owner* even though only the current section's packages
//! are actually composed this round.

use anyhow::Context;
use asgen_backend::{Package, PackageIndex};
use asgen_composer::LocaleUnit;
use asgen_contents_store::ContentsStore;
use asgen_icons::renderer::IconRenderer;
use asgen_icons::theme::Theme;
use asgen_icons::IconHandler;
use asgen_utils::types::PackageId;
use camino::Utf8PathBuf;
use std::collections::HashMap;
use std::sync::Arc;

use crate::plan::SuitePlan;

const THEME_PREFERENCE_FALLBACK: [&str; 2] = ["Adwaita", "AdwaitaLegacy"];
const THEME_PREFERENCE_LAST: &str = "breeze";
const HICOLOR: &str = "hicolor";

/// Every package considered reachable for this triple: the current
/// suite's own (section, arch) plus its base suite and always-loaded
/// sections, all at the same architecture (spec §4.5 step 2).
pub struct Candidates {
    pub packages: Vec<Box<dyn Package>>,
}

impl Candidates {
    pub fn build(
        indices: &HashMap<String, Box<dyn PackageIndex>>,
        plan: &SuitePlan,
        section: &str,
        arch: &str,
    ) -> anyhow::Result<Self> {
        let mut packages = Vec::new();
        let own_index = indices
            .get(&plan.name)
            .with_context(|| format!("no package index registered for suite {}", plan.name))?;
        packages.extend(own_index.enumerate(section, arch)?);

        if let Some(base_name) = &plan.base_suite {
            if let Some(base_index) = indices.get(base_name) {
                packages.extend(base_index.enumerate(section, arch)?);
            }
        }

        for extra_section in plan.always_loaded_sections() {
            if extra_section == section {
                continue;
            }
            packages.extend(own_index.enumerate(extra_section, arch)?);
        }

        Ok(Self { packages })
    }

    #[must_use]
    pub fn as_map(&self) -> HashMap<PackageId, &dyn Package> {
        self.packages.iter().map(|p| (p.id(), p.as_ref())).collect()
    }

    #[must_use]
    pub fn package_ids(&self) -> Vec<PackageId> {
        self.packages.iter().map(|p| p.id()).collect()
    }

    pub fn finish_all(&mut self) {
        for package in &mut self.packages {
            package.finish();
        }
    }
}

/// Theme preference order: `hicolor`, then the suite's configured
/// theme (if any), then the common desktop-environment fallbacks (spec
/// §4.3 "Model").
fn theme_preference_order(plan: &SuitePlan) -> Vec<String> {
    let mut names = vec![HICOLOR.to_string()];
    if let Some(theme) = &plan.use_icon_theme {
        if theme != HICOLOR {
            names.push(theme.clone());
        }
    }
    for fallback in THEME_PREFERENCE_FALLBACK {
        if !names.iter().any(|n| n == fallback) {
            names.push(fallback.to_string());
        }
    }
    if !names.iter().any(|n| n == THEME_PREFERENCE_LAST) {
        names.push(THEME_PREFERENCE_LAST.to_string());
    }
    names
}

/// Build the `IconHandler` for this triple: discover `index.theme`
/// files among the candidate packages' contents, parse them in
/// preference order, and index every icon file the candidate pool
/// provides (spec §4.3 "Model").
pub fn build_icon_handler(
    candidates: &Candidates,
    contents_store: &ContentsStore,
    plan: &SuitePlan,
    extra_icon_prefix: Option<Utf8PathBuf>,
    renderer: Arc<dyn IconRenderer>,
) -> anyhow::Result<IconHandler> {
    let package_ids = candidates.package_ids();
    let icon_index = contents_store.icon_files_map(&package_ids)?;

    let mut themes = Vec::new();
    for name in theme_preference_order(plan) {
        let index_path = Utf8PathBuf::from(format!("/usr/share/icons/{name}/index.theme"));
        for package in &candidates.packages {
            let bytes = package.read(&index_path);
            if asgen_backend::is_absent(&bytes) {
                continue;
            }
            if let Ok(text) = String::from_utf8(bytes) {
                themes.push(Theme::parse(&name, &text));
            }
            break;
        }
    }

    Ok(IconHandler::new(themes, icon_index, extra_icon_prefix, renderer))
}

/// Build the locale ownership map for this triple (spec §4.3/§4.4:
/// translated `.desktop` files resolve through the owning package's
/// `.mo`/`.qm` catalogs).
pub fn build_locale_unit(contents_store: &ContentsStore, package_ids: &[PackageId]) -> anyhow::Result<LocaleUnit> {
    let domains = contents_store.locale_map(package_ids)?;
    Ok(LocaleUnit::new(domains))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(base: Option<&str>, theme: Option<&str>, sections: &[&str]) -> SuitePlan {
        SuitePlan {
            name: "stable".into(),
            data_priority: 0,
            base_suite: base.map(str::to_string),
            use_icon_theme: theme.map(str::to_string),
            sections: sections.iter().map(|s| s.to_string()).collect(),
            architectures: vec!["amd64".into()],
            immutable: false,
        }
    }

    #[test]
    fn theme_preference_puts_hicolor_first_and_dedups() {
        let names = theme_preference_order(&plan(None, Some("Adwaita"), &["main"]));
        assert_eq!(names[0], "hicolor");
        assert_eq!(names.iter().filter(|n| *n == "Adwaita").count(), 1);
        assert_eq!(names.last().unwrap(), "breeze");
    }

    #[test]
    fn theme_preference_without_suite_theme_still_has_fallbacks() {
        let names = theme_preference_order(&plan(None, None, &["main"]));
        assert_eq!(names, vec!["hicolor", "Adwaita", "AdwaitaLegacy", "breeze"]);
    }
}
