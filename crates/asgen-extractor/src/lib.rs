//! DataExtractor (C5): the per-package Composing/EarlyDedup/IconStage/
//! FinalCheck state machine (spec §4.4).
//!
//! One instance is built per worker (spec §5: "each worker constructs
//! its own `DataExtractor` instance — the composer is not thread-safe
//! across instances"); this crate just wires together the four
//! collaborators it already depends on as capabilities.

use asgen_backend::{GstreamerCaps, Package};
use asgen_composer::{compute_gcid, Component, ComponentKind, Composer, GeneratorResult, LocaleUnit, PackageUnit};
use asgen_data_store::DataStore;
use asgen_hints::Hint;
use asgen_icons::policy::IconSizePolicy;
use asgen_icons::IconHandler;
use asgen_modifications::InjectedModifications;
use asgen_utils::types::{Gcid, MergeKind, MetadataType, PackageId};
use camino::Utf8Path;
use std::collections::HashMap;

/// Name of the synthetic package the Engine wraps a suite's local
/// override directory in (spec §4.5 step 3). Exempt from EarlyDedup;
/// stripped from every component's package-name list in FinalCheck.
pub const INJECTION_PACKAGE_NAME: &str = "+extra-metainfo";

/// Per-worker extractor. Holds only shared, read-only collaborators —
/// cheap to build fresh for every package batch a worker picks up.
pub struct DataExtractor<'a> {
    composer: &'a dyn Composer,
    data_store: &'a DataStore,
    icon_handler: &'a IconHandler,
    modifications: &'a InjectedModifications,
    metadata_type: MetadataType,
    icon_policies: &'a [IconSizePolicy],
    media_pool_root: &'a Utf8Path,
    upscaling_enabled: bool,
    process_gstreamer: bool,
}

impl<'a> DataExtractor<'a> {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        composer: &'a dyn Composer,
        data_store: &'a DataStore,
        icon_handler: &'a IconHandler,
        modifications: &'a InjectedModifications,
        metadata_type: MetadataType,
        icon_policies: &'a [IconSizePolicy],
        media_pool_root: &'a Utf8Path,
        upscaling_enabled: bool,
        process_gstreamer: bool,
    ) -> Self {
        Self {
            composer,
            data_store,
            icon_handler,
            modifications,
            metadata_type,
            icon_policies,
            media_pool_root,
            upscaling_enabled,
            process_gstreamer,
        }
    }

    /// Run one package through the whole state machine. `package.finish()`
    /// is called exactly once, on every path (spec §4.4 "Failure semantics").
    pub fn extract(
        &self,
        mut package: Box<dyn Package>,
        locale: &LocaleUnit,
        candidate_packages: &HashMap<PackageId, &dyn Package>,
    ) -> GeneratorResult {
        let package_id = package.id();
        let is_injection = package_id.name == INJECTION_PACKAGE_NAME;
        let mut result = GeneratorResult::new(package_id.clone());

        let compose_result = {
            let unit = PackageUnit::new(package.as_ref());
            self.composer.compose(&unit, locale)
        };

        let mut output = match compose_result {
            Ok(output) => output,
            Err(message) => {
                // Composing failed catastrophically: a hint, no components (spec §4.4 ComposeFailed).
                result.hints.push(Hint::general("compose-failed").with_var("message", message));
                package.finish();
                return result;
            }
        };
        result.hints.append(&mut output.hints);

        let mut surviving: Vec<(Component, Gcid)> = Vec::new();
        for component in output.components.drain(..) {
            if let Some(pair) = self.early_dedup(&package_id, is_injection, component, &mut result.hints) {
                surviving.push(pair);
            }
        }

        for (component, gcid) in &mut surviving {
            if component.merge_kind != MergeKind::None {
                continue;
            }
            let hints = self.icon_handler.resolve(
                component,
                gcid,
                package.as_ref(),
                candidate_packages,
                self.icon_policies,
                self.media_pool_root,
                self.upscaling_enabled,
            );
            result.hints.extend(hints);
        }

        let mut kept = Vec::with_capacity(surviving.len());
        for (mut component, gcid) in surviving {
            if self.final_check(&mut component, package.as_ref(), &mut result.hints) {
                kept.push((component, gcid));
            }
        }

        if self.process_gstreamer && !is_injection {
            if let Some(caps) = package.gstreamer_caps().filter(|c| !c.is_empty()) {
                for component in gstreamer_pseudo_components(&package_id, caps) {
                    let gcid = compute_gcid(&component);
                    kept.push((component, gcid));
                }
            }
        }

        for (component, gcid) in kept {
            result.components.push(component);
            result.gcids.push(gcid);
        }

        package.finish();
        result
    }

    /// `checkMetadataIntermediate` (spec §4.4 EarlyDedup). Returns
    /// `Some` for a component that survives into IconStage, `None` for
    /// one that was dropped (silently, or with a `metainfo-duplicate-id`
    /// hint already pushed).
    fn early_dedup(
        &self,
        package_id: &PackageId,
        is_injection: bool,
        component: Component,
        hints: &mut Vec<Hint>,
    ) -> Option<(Component, Gcid)> {
        let gcid = compute_gcid(&component);
        if is_injection || !self.data_store.metadata_exists(self.metadata_type, &gcid) {
            return Some((component, gcid));
        }

        let already_mine = self
            .data_store
            .package_gcids(package_id)
            .map(|gcids| gcids.contains(&gcid))
            .unwrap_or(false);
        if already_mine {
            return None;
        }

        if component.kind != ComponentKind::WebApp {
            hints.push(Hint::for_component(component.id.clone(), "metainfo-duplicate-id"));
        }
        None
    }

    /// Spec §4.4 FinalCheck. Returns `false` when the component must be
    /// dropped entirely (removal-set hit).
    fn final_check(&self, component: &mut Component, package: &dyn Package, hints: &mut Vec<Hint>) -> bool {
        if component.merge_kind != MergeKind::None {
            return true;
        }

        if self.modifications.removal_set().contains(&component.id) {
            return false;
        }

        if component.package_names.is_empty()
            && component.bundle.is_none()
            && !component.kind.exempt_from_install_candidate_check()
        {
            hints.push(Hint::for_component(component.id.clone(), "no-install-candidate"));
        }

        component.package_names.retain(|name| name != INJECTION_PACKAGE_NAME);

        if component.kind.wants_description_fallback() && !component.has_long_description() {
            match package.descriptions().get("en").filter(|text| !text.trim().is_empty()) {
                Some(text) => {
                    component.description.insert("en".to_string(), text.clone());
                    hints.push(Hint::for_component(component.id.clone(), "description-from-package"));
                }
                None => hints.push(Hint::for_component(component.id.clone(), "description-missing")),
            }
        }

        if let Some(fields) = self.modifications.custom_fields_for(&component.id) {
            for (key, value) in fields {
                component.custom_fields.insert(key.clone(), value.clone());
            }
        }

        true
    }
}

/// One pseudo-component per advertised GStreamer element (spec §4.4:
/// "Emit GStreamer codec pseudo-components when the package claims
/// GStreamer capabilities and the feature is enabled").
fn gstreamer_pseudo_components(package_id: &PackageId, caps: &GstreamerCaps) -> Vec<Component> {
    let groups: [(&str, &[String]); 4] = [
        ("decoder", &caps.decoders),
        ("encoder", &caps.encoders),
        ("urisink", &caps.uri_sinks),
        ("urisource", &caps.uri_sources),
    ];

    let mut components = Vec::new();
    for (role, elements) in groups {
        for element in elements {
            let id = format!("{}.codec.{role}.{element}", package_id.name);
            let mut component = Component::new(id, ComponentKind::Codec);
            component.package_names.push(package_id.name.clone());
            component.custom_fields.insert("X-GStreamer-Element".to_string(), element.clone());
            components.push(component);
        }
    }
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use asgen_backend::dummy::DummyPackage;
    use asgen_composer::stub::StubComposer;
    use asgen_icons::policy::default_policy;
    use asgen_icons::theme::Theme;
    use asgen_icons::renderer::PngIconRenderer;
    use camino::Utf8PathBuf;
    use std::collections::HashSet;
    use std::sync::Arc;
    use tempfile::tempdir;

    struct Fixture {
        _store_dir: tempfile::TempDir,
        _pool_dir: tempfile::TempDir,
        data_store: DataStore,
        icon_handler: IconHandler,
        modifications: InjectedModifications,
        pool_root: Utf8PathBuf,
    }

    fn fixture() -> Fixture {
        let store_dir = tempdir().unwrap();
        let data_store = DataStore::open(Utf8Path::from_path(store_dir.path()).unwrap()).unwrap();
        let hicolor = Theme::parse(
            "hicolor",
            "[Icon Theme]\nDirectories=64x64/apps\n\n[64x64/apps]\nSize=64\nType=Fixed\n",
        );
        let icon_handler = IconHandler::new(vec![hicolor], HashMap::new(), None, Arc::new(PngIconRenderer));
        let pool_dir = tempdir().unwrap();
        let pool_root = Utf8PathBuf::from_path_buf(pool_dir.path().to_path_buf()).unwrap();
        Fixture {
            _store_dir: store_dir,
            _pool_dir: pool_dir,
            data_store,
            icon_handler,
            modifications: InjectedModifications::default(),
            pool_root,
        }
    }

    impl Fixture {
        fn extractor(&self) -> DataExtractor<'_> {
            static COMPOSER: StubComposer = StubComposer;
            DataExtractor::new(
                &COMPOSER,
                &self.data_store,
                &self.icon_handler,
                &self.modifications,
                MetadataType::Xml,
                default_policy_ref(),
                &self.pool_root,
                false,
                true,
            )
        }
    }

    fn default_policy_ref() -> &'static [IconSizePolicy] {
        static POLICY: std::sync::OnceLock<Vec<IconSizePolicy>> = std::sync::OnceLock::new();
        POLICY.get_or_init(default_policy)
    }

    #[test]
    fn successful_package_produces_one_component_with_no_hints() {
        let fx = fixture();
        let pkg: Box<dyn Package> = Box::new(
            DummyPackage::new(PackageId::new("hello", "1.0", "amd64")).with_file(
                "/usr/share/applications/hello.desktop",
                "[Desktop Entry]\nX-AppStream-ID=org.example.Hello.desktop\nName=Hello\n",
            ),
        );
        let locale = LocaleUnit::default();
        let candidates: HashMap<PackageId, &dyn Package> = HashMap::new();
        let result = fx.extractor().extract(pkg, &locale, &candidates);

        assert_eq!(result.components.len(), 1);
        assert!(result.hints.iter().any(|h| h.tag == "description-missing"));
    }

    #[test]
    fn composer_failure_becomes_a_hint_with_no_components() {
        struct FailingComposer;
        impl Composer for FailingComposer {
            fn compose(&self, _unit: &PackageUnit<'_>, _locale: &LocaleUnit) -> Result<asgen_composer::ComposeOutput, String> {
                Err("boom".to_string())
            }
        }

        let fx = fixture();
        let pkg: Box<dyn Package> = Box::new(DummyPackage::new(PackageId::new("hello", "1.0", "amd64")));
        let locale = LocaleUnit::default();
        let candidates: HashMap<PackageId, &dyn Package> = HashMap::new();
        let composer = FailingComposer;
        let extractor = DataExtractor::new(
            &composer,
            &fx.data_store,
            &fx.icon_handler,
            &fx.modifications,
            MetadataType::Xml,
            default_policy_ref(),
            &fx.pool_root,
            false,
            false,
        );
        let result = extractor.extract(pkg, &locale, &candidates);

        assert!(result.components.is_empty());
        assert_eq!(result.hints.len(), 1);
        assert_eq!(result.hints[0].tag, "compose-failed");
    }

    #[test]
    fn duplicate_component_from_a_different_package_is_dropped_with_a_hint() {
        let fx = fixture();
        let component = Component::new("org.example.Hello.desktop", ComponentKind::DesktopApp);
        let gcid = compute_gcid(&component);
        fx.data_store.set_metadata(MetadataType::Xml, &gcid, b"<component/>").unwrap();

        let pkg: Box<dyn Package> = Box::new(
            DummyPackage::new(PackageId::new("other", "2.0", "amd64")).with_file(
                "/usr/share/applications/hello.desktop",
                "[Desktop Entry]\nX-AppStream-ID=org.example.Hello.desktop\nName=Hello\n",
            ),
        );
        let locale = LocaleUnit::default();
        let candidates: HashMap<PackageId, &dyn Package> = HashMap::new();
        let result = fx.extractor().extract(pkg, &locale, &candidates);

        assert!(result.components.is_empty());
        assert!(result.hints.iter().any(|h| h.tag == "metainfo-duplicate-id"));
    }

    #[test]
    fn own_prior_gcid_is_dropped_silently() {
        let fx = fixture();
        let component = Component::new("org.example.Hello.desktop", ComponentKind::DesktopApp);
        let gcid = compute_gcid(&component);
        fx.data_store.set_metadata(MetadataType::Xml, &gcid, b"<component/>").unwrap();
        let pkid = PackageId::new("hello", "1.0", "amd64");
        let result = GeneratorResult {
            package_id: pkid.clone(),
            components: vec![component.clone()],
            hints: Vec::new(),
            gcids: vec![gcid.clone()],
        };
        fx.data_store
            .add_generator_result(MetadataType::Xml, &result, true, |_| Ok(b"<component/>".to_vec()))
            .unwrap();

        let pkg: Box<dyn Package> = Box::new(
            DummyPackage::new(pkid).with_file(
                "/usr/share/applications/hello.desktop",
                "[Desktop Entry]\nX-AppStream-ID=org.example.Hello.desktop\nName=Hello\n",
            ),
        );
        let locale = LocaleUnit::default();
        let candidates: HashMap<PackageId, &dyn Package> = HashMap::new();
        let out = fx.extractor().extract(pkg, &locale, &candidates);

        assert!(out.components.is_empty());
        assert!(!out.hints.iter().any(|h| h.tag == "metainfo-duplicate-id"));
    }

    #[test]
    fn removal_set_drops_component_entirely() {
        let mut fx = fixture();
        let allowed: HashSet<String> = HashSet::new();
        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        std::fs::create_dir_all(root.join("stable")).unwrap();
        std::fs::write(
            root.join("stable").join("modifications.json"),
            r#"{"Remove": ["org.example.Hello.desktop"]}"#,
        )
        .unwrap();
        fx.modifications = InjectedModifications::load(root, "stable", &allowed).unwrap();

        let pkg: Box<dyn Package> = Box::new(
            DummyPackage::new(PackageId::new("hello", "1.0", "amd64")).with_file(
                "/usr/share/applications/hello.desktop",
                "[Desktop Entry]\nX-AppStream-ID=org.example.Hello.desktop\nName=Hello\n",
            ),
        );
        let locale = LocaleUnit::default();
        let candidates: HashMap<PackageId, &dyn Package> = HashMap::new();
        let result = fx.extractor().extract(pkg, &locale, &candidates);

        assert!(result.components.is_empty());
    }

    #[test]
    fn injected_metainfo_fragment_is_exempt_from_no_install_candidate() {
        let fx = fixture();
        let pkg: Box<dyn Package> = Box::new(
            DummyPackage::new(PackageId::new(INJECTION_PACKAGE_NAME, "0", "amd64")).with_file(
                "extra-metainfo/inline-0.xml",
                "ID=org.example.Injected\nKind=generic\nName=Injected\n",
            ),
        );
        let locale = LocaleUnit::default();
        let candidates: HashMap<PackageId, &dyn Package> = HashMap::new();
        let result = fx.extractor().extract(pkg, &locale, &candidates);

        assert_eq!(result.components.len(), 1);
        assert!(!result.hints.iter().any(|h| h.tag == "no-install-candidate"));
        assert!(result.components[0].package_names.is_empty());
    }

    #[test]
    fn component_with_no_real_package_name_gets_no_install_candidate() {
        let fx = fixture();
        let mut component = Component::new("org.example.Unpackaged", ComponentKind::Generic);
        let pkg: Box<dyn Package> = Box::new(DummyPackage::new(PackageId::new("hello", "1.0", "amd64")));
        let mut hints = Vec::new();
        let kept = fx.extractor().final_check(&mut component, pkg.as_ref(), &mut hints);

        assert!(kept);
        assert!(hints.iter().any(|h| h.tag == "no-install-candidate"));
    }

    #[test]
    fn gstreamer_caps_emit_codec_pseudo_components() {
        let fx = fixture();
        let caps = GstreamerCaps {
            decoders: vec!["video/x-h264".to_string()],
            encoders: Vec::new(),
            uri_sinks: Vec::new(),
            uri_sources: Vec::new(),
        };
        let pkg: Box<dyn Package> =
            Box::new(DummyPackage::new(PackageId::new("gst-plugins", "1.0", "amd64")).with_gstreamer_caps(caps));
        let locale = LocaleUnit::default();
        let candidates: HashMap<PackageId, &dyn Package> = HashMap::new();
        let result = fx.extractor().extract(pkg, &locale, &candidates);

        assert_eq!(result.components.len(), 1);
        assert_eq!(result.components[0].kind, ComponentKind::Codec);
    }
}
