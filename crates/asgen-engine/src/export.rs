//! Export step (spec §4.5 step 4, §6 "On-disk layout"): per-(suite,
//! section, arch) catalog, hints JSON and CID-Index, all gzip-compressed
//! and written atomically.

use anyhow::Context;
use asgen_archive::{cid_index, hints, CatalogEnvelope};
use asgen_data_store::DataStore;
use asgen_utils::atomic_write::write_atomic;
use asgen_utils::paths;
use asgen_utils::types::{Gcid, MetadataType, PackageId};
use camino::Utf8Path;

/// One package's extraction outcome, as the export step needs it:
/// just the gcids it produced and the hints raised against it.
pub struct ExportItem {
    pub package_id: PackageId,
    pub gcids: Vec<Gcid>,
    pub hints: Vec<asgen_hints::Hint>,
}

fn catalog_extension(metadata_type: MetadataType) -> &'static str {
    match metadata_type {
        MetadataType::Xml => "xml.gz",
        MetadataType::Yaml => "yml.gz",
    }
}

/// Render and write the catalog, hints JSON and CID-Index for one
/// (suite, section, arch) triple. `items` must already be in
/// deterministic order (spec §9 "Determinism").
#[allow(clippy::too_many_arguments)]
pub fn export_triple(
    export_dir: &Utf8Path,
    data_store: &DataStore,
    metadata_type: MetadataType,
    project_name: &str,
    suite: &str,
    section: &str,
    arch: &str,
    data_priority: i64,
    media_base_url: Option<&str>,
    format_version: &str,
    include_timestamp: bool,
    items: &[ExportItem],
) -> anyhow::Result<()> {
    let data_dir = paths::data_section_dir(export_dir, suite, section);
    let hints_dir = paths::hints_section_dir(export_dir, suite, section);
    paths::ensure_dir_all(&data_dir)?;
    paths::ensure_dir_all(&hints_dir)?;

    let mut fragments = Vec::new();
    let mut cid_entries = Vec::new();
    for item in items {
        for gcid in &item.gcids {
            let Some(bytes) = data_store.get_metadata(metadata_type, gcid)? else {
                continue;
            };
            fragments.push(bytes);
            cid_entries.push((gcid.component_id.clone(), gcid.to_string()));
        }
    }

    let mut envelope = CatalogEnvelope::new(format_version, project_name, suite, section)
        .with_priority(data_priority)
        .with_timestamp(include_timestamp);
    if let Some(url) = media_base_url {
        envelope = envelope.with_media_base_url(url);
    }
    let catalog_bytes = envelope.render(metadata_type, &fragments);
    let catalog_gz = asgen_archive::gzip(&catalog_bytes).context("gzip catalog")?;
    let catalog_path = data_dir.join(format!(
        "{}.{}",
        paths::components_stem(arch),
        catalog_extension(metadata_type)
    ));
    write_atomic(&catalog_path, &catalog_gz)?;

    let cid_index_bytes = cid_index::render(&cid_entries)?;
    let cid_index_gz = asgen_archive::gzip(&cid_index_bytes).context("gzip cid index")?;
    write_atomic(&data_dir.join(paths::cid_index_filename(arch)), &cid_index_gz)?;

    let hint_entries: Vec<_> = items
        .iter()
        .filter(|item| !item.hints.is_empty())
        .map(|item| (item.package_id.clone(), item.hints.clone()))
        .collect();
    let hints_bytes = hints::render(&hint_entries)?;
    let hints_gz = asgen_archive::gzip(&hints_bytes).context("gzip hints")?;
    write_atomic(&hints_dir.join(format!("{}.json.gz", paths::hints_stem(arch))), &hints_gz)?;

    Ok(())
}

/// Write `hints/<suite>/hint-definitions.json` once per suite (spec
/// §6), from the process-wide hint registry.
pub fn export_hint_definitions(export_dir: &Utf8Path, suite: &str, registry: &asgen_hints::HintRegistry) -> anyhow::Result<()> {
    let path = paths::hint_definitions_path(export_dir, suite);
    paths::ensure_dir_all(path.parent().context("hint-definitions.json has no parent")?)?;
    let defs = registry.all_definitions();
    let bytes = serde_json_canonicalizer::to_vec(&serde_json::to_value(&defs)?)?;
    write_atomic(&path, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use asgen_composer::{compute_gcid, Component, ComponentKind};
    use tempfile::tempdir;

    #[test]
    fn export_triple_writes_gzipped_catalog_and_hints() {
        let dir = tempdir().unwrap();
        let root = camino::Utf8Path::from_path(dir.path()).unwrap();
        let data_store = DataStore::open(&root.join("db")).unwrap();

        let component = Component::new("org.example.Hello", ComponentKind::DesktopApp);
        let gcid = compute_gcid(&component);
        data_store
            .set_metadata(MetadataType::Xml, &gcid, b"<component><id>org.example.Hello</id></component>")
            .unwrap();

        let items = vec![ExportItem {
            package_id: PackageId::new("hello", "1.0", "amd64"),
            gcids: vec![gcid],
            hints: vec![asgen_hints::Hint::general("custom-key-rejected")],
        }];

        let export_dir = root.join("export");
        export_triple(
            &export_dir,
            &data_store,
            MetadataType::Xml,
            "mydist",
            "stable",
            "main",
            "amd64",
            0,
            None,
            "1.0",
            false,
            &items,
        )
        .unwrap();

        let catalog_path = export_dir.join("data").join("stable").join("main").join("Components-amd64.xml.gz");
        assert!(catalog_path.exists());
        let hints_path = export_dir.join("hints").join("stable").join("main").join("Hints-amd64.json.gz");
        assert!(hints_path.exists());
        let cid_index_path = export_dir.join("data").join("stable").join("main").join("CID-Index-amd64.json.gz");
        assert!(cid_index_path.exists());
    }
}
