//! Process step (spec §4.5 step 2/3): run every interesting current-suite
//! package, plus the suite's synthetic `+extra-metainfo` package, through
//! a fresh [`DataExtractor`] per item, in parallel (spec §5 "each worker
//! constructs its own `DataExtractor` instance").

use asgen_backend::{Package, PackageIndex};
use asgen_composer::{Composer, GeneratorResult, LocaleUnit};
use asgen_data_store::DataStore;
use asgen_extractor::DataExtractor;
use asgen_icons::policy::IconSizePolicy;
use asgen_icons::IconHandler;
use asgen_modifications::InjectedModifications;
use asgen_pool::JobPool;
use asgen_utils::types::{MetadataType, PackageId};
use camino::Utf8Path;
use std::collections::{HashMap, HashSet};

#[allow(clippy::too_many_arguments)]
pub fn run(
    pool: &JobPool,
    index: &dyn PackageIndex,
    section: &str,
    arch: &str,
    interesting: &HashSet<PackageId>,
    injected: Option<Box<dyn Package>>,
    composer: &dyn Composer,
    data_store: &DataStore,
    icon_handler: &IconHandler,
    modifications: &InjectedModifications,
    metadata_type: MetadataType,
    icon_policies: &[IconSizePolicy],
    media_pool_root: &Utf8Path,
    upscaling_enabled: bool,
    process_gstreamer: bool,
    locale: &LocaleUnit,
    candidate_packages: &HashMap<PackageId, &dyn Package>,
) -> anyhow::Result<Vec<GeneratorResult>> {
    let mut units: Vec<Box<dyn Package>> = index
        .enumerate(section, arch)?
        .into_iter()
        .filter(|p| interesting.contains(&p.id()))
        .collect();
    units.extend(injected);

    let results = pool.par_map(units, |package| {
        let extractor = DataExtractor::new(
            composer,
            data_store,
            icon_handler,
            modifications,
            metadata_type,
            icon_policies,
            media_pool_root,
            upscaling_enabled,
            process_gstreamer,
        );
        extractor.extract(package, locale, candidate_packages)
    });

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use asgen_backend::dummy::{DummyIndex, DummyPackageSpec};
    use asgen_composer::stub::StubComposer;
    use asgen_icons::renderer::PngIconRenderer;
    use asgen_utils::types::PackageId;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn only_interesting_packages_are_extracted() {
        let dir = tempdir().unwrap();
        let root = camino::Utf8Path::from_path(dir.path()).unwrap();
        let data_store = DataStore::open(&root.join("data")).unwrap();
        let modifications = InjectedModifications::default();
        let icon_handler = IconHandler::new(Vec::new(), HashMap::new(), None, Arc::new(PngIconRenderer));
        let policies = asgen_icons::policy::default_policy();
        let pool = JobPool::new(1).unwrap();
        let composer = StubComposer::new();
        let locale = LocaleUnit::default();

        let index = DummyIndex::new().with_packages(
            "main",
            "amd64",
            vec![
                DummyPackageSpec::new(PackageId::new("hello", "1", "amd64"))
                    .with_file("/usr/share/applications/hello.desktop", b"X-AppStream-ID=org.example.Hello\n".to_vec()),
                DummyPackageSpec::new(PackageId::new("libc", "1", "amd64")).with_file("/lib/libc.so", b"bin".to_vec()),
            ],
        );
        let mut interesting = HashSet::new();
        interesting.insert(PackageId::new("hello", "1", "amd64"));

        let results = run(
            &pool,
            &index,
            "main",
            "amd64",
            &interesting,
            None,
            &composer,
            &data_store,
            &icon_handler,
            &modifications,
            MetadataType::Xml,
            &policies,
            root,
            false,
            false,
            &locale,
            &HashMap::new(),
        )
        .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].package_id.name, "hello");
    }
}
