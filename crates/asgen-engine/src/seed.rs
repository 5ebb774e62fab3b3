//! Content seeding (spec §4.5 step 1): before extraction runs, every
//! current-suite package's file list is recorded in the `ContentsStore`
//! (C1) so later icon/locale lookups can cross-reference sibling
//! packages, and packages that plainly cannot carry metadata are marked
//! `ignore` in the `DataStore` (C2) up front so extraction never even
//! enumerates their contents again.

use anyhow::Context;
use asgen_backend::{Package, PackageIndex};
use asgen_composer::GeneratorResult;
use asgen_contents_store::ContentsStore;
use asgen_data_store::DataStore;
use asgen_utils::types::MetadataType;
use std::collections::HashSet;

/// What seeding found for one (suite, section, arch) triple.
pub struct SeedOutcome {
    /// Every package-id enumerated for the current suite this run.
    pub current_package_ids: Vec<asgen_utils::types::PackageId>,
    /// The subset of those worth handing to the extractor: not yet
    /// classified, and plausibly carrying metainfo/desktop/gstreamer
    /// content (spec §4.5 step 1 "interesting" test).
    pub interesting_package_ids: Vec<asgen_utils::types::PackageId>,
    /// True if this whole triple was skipped because the index reports
    /// no change and the run was not forced.
    pub skipped: bool,
}

const INTERESTING_PREFIXES: [&str; 4] = [
    "/usr/share/applications/",
    "/usr/local/share/applications/",
    "/usr/share/metainfo/",
    "/usr/local/share/metainfo/",
];

fn is_interesting(package: &dyn Package) -> bool {
    if package
        .gstreamer_caps()
        .is_some_and(|caps| !caps.is_empty())
    {
        return true;
    }
    package.contents().iter().any(|path| {
        INTERESTING_PREFIXES
            .iter()
            .any(|prefix| path.as_str().starts_with(prefix))
    })
}

/// Seed `ContentsStore`/`DataStore` for one (section, arch) pair of the
/// current suite, optionally pulling base-suite contents in first.
///
/// Returns the interesting subset of current-suite package-ids for the
/// extraction step to process. A triple with an empty enumeration and
/// an index reporting no change is skipped outright unless `force`.
pub fn seed_contents_data(
    contents_store: &ContentsStore,
    data_store: &DataStore,
    metadata_type: MetadataType,
    index: &dyn PackageIndex,
    base_index: Option<&dyn PackageIndex>,
    section: &str,
    arch: &str,
    force: bool,
) -> anyhow::Result<SeedOutcome> {
    if let Some(base) = base_index {
        let mut base_packages = base
            .enumerate(section, arch)
            .context("enumerating base suite for content seeding")?;
        for package in &mut base_packages {
            let pkid = package.id();
            if !contents_store.exists(&pkid) {
                contents_store.add(&pkid, package.contents())?;
            }
            package.finish();
        }
    }

    let mut packages = index.enumerate(section, arch).context("enumerating current suite")?;

    if packages.is_empty() && !index.has_changed_since_last_run(section, arch) && !force {
        return Ok(SeedOutcome {
            current_package_ids: Vec::new(),
            interesting_package_ids: Vec::new(),
            skipped: true,
        });
    }

    let mut current_package_ids = Vec::with_capacity(packages.len());
    let mut interesting_package_ids = Vec::new();
    let mut seen: HashSet<asgen_utils::types::PackageId> = HashSet::new();

    for package in &mut packages {
        let pkid = package.id();
        current_package_ids.push(pkid.clone());
        seen.insert(pkid.clone());

        let already_known = contents_store.exists(&pkid) && data_store.is_known(&pkid);
        if already_known {
            if is_interesting(package.as_ref()) {
                interesting_package_ids.push(pkid);
            }
            package.finish();
            continue;
        }

        contents_store.add(&pkid, package.contents())?;
        if is_interesting(package.as_ref()) {
            interesting_package_ids.push(pkid);
        } else {
            let empty = GeneratorResult::new(pkid);
            data_store.add_generator_result(metadata_type, &empty, false, |_| Ok(Vec::new()))?;
        }
        package.finish();
    }

    contents_store.sync()?;

    Ok(SeedOutcome {
        current_package_ids,
        interesting_package_ids,
        skipped: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use asgen_backend::dummy::{DummyIndex, DummyPackageSpec};
    use tempfile::tempdir;

    fn stores() -> (ContentsStore, DataStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let root = camino::Utf8Path::from_path(dir.path()).unwrap();
        let contents = ContentsStore::open(&root.join("contents")).unwrap();
        let data = DataStore::open(&root.join("data")).unwrap();
        (contents, data, dir)
    }

    #[test]
    fn boring_package_is_marked_ignored_without_extraction() {
        let (contents, data, _dir) = stores();
        let index = DummyIndex::new().with_packages(
            "main",
            "amd64",
            vec![DummyPackageSpec::new(asgen_utils::types::PackageId::new("libc", "1", "amd64"))
                .with_file("/lib/libc.so", b"bin".to_vec())],
        );
        let outcome = seed_contents_data(&contents, &data, MetadataType::Xml, &index, None, "main", "amd64", false).unwrap();
        assert_eq!(outcome.current_package_ids.len(), 1);
        assert!(outcome.interesting_package_ids.is_empty());
        assert!(!outcome.skipped);
        let pkid = &outcome.current_package_ids[0];
        assert!(data.is_known(pkid));
        assert!(data.package_gcids(pkid).unwrap().is_empty());
    }

    #[test]
    fn package_with_metainfo_is_interesting() {
        let (contents, data, _dir) = stores();
        let index = DummyIndex::new().with_packages(
            "main",
            "amd64",
            vec![
                DummyPackageSpec::new(asgen_utils::types::PackageId::new("hello", "1", "amd64"))
                    .with_file("/usr/share/metainfo/org.example.Hello.xml", b"<c/>".to_vec()),
            ],
        );
        let outcome = seed_contents_data(&contents, &data, MetadataType::Xml, &index, None, "main", "amd64", false).unwrap();
        assert_eq!(outcome.interesting_package_ids.len(), 1);
        assert!(!data.is_known(&outcome.interesting_package_ids[0]));
    }

    #[test]
    fn unchanged_empty_index_is_skipped() {
        let (contents, data, _dir) = stores();
        let index = DummyIndex::new()
            .with_packages("main", "amd64", Vec::new())
            .unchanged();
        let outcome = seed_contents_data(&contents, &data, MetadataType::Xml, &index, None, "main", "amd64", false).unwrap();
        assert!(outcome.skipped);
    }
}
