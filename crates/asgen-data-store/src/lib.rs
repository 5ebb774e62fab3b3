//! DataStore (C2): the six persistent sub-stores, the central
//! `add_generator_result` write path, and cruft cleanup (spec §3, §4.2).
//!
//! Built on the same file-per-key `KvStore` substrate as
//! `asgen-contents-store` (SPEC_FULL.md §4.2 AMBIENT).

pub mod binary;
pub mod records;

use anyhow::Context;
use asgen_composer::{Component, GeneratorResult};
use asgen_hints::Hint;
use asgen_utils::kvstore::KvStore;
use asgen_utils::types::{Gcid, MetadataType, PackageId};
use camino::Utf8Path;
use records::{RepositoryInfo, StatisticsEntry};
use std::collections::HashSet;
use std::sync::Mutex;

pub use records::{RepositoryInfo as RepositoryInfoRecord, StatisticsEntry as StatisticsEntryRecord};

fn join_gcids(gcids: &[Gcid]) -> String {
    gcids.iter().map(Gcid::to_string).collect::<Vec<_>>().join("\n")
}

fn split_gcids(bytes: &[u8]) -> Vec<Gcid> {
    String::from_utf8_lossy(bytes)
        .lines()
        .filter_map(Gcid::parse)
        .collect()
}

const IGNORE: &[u8] = b"ignore";
const SEEN: &[u8] = b"seen";

/// Persistent key-value store, six sub-stores (spec §3 "DataStore").
pub struct DataStore {
    packages: KvStore,
    metadata_xml: KvStore,
    metadata_yaml: KvStore,
    hints: KvStore,
    statistics: KvStore,
    repository: KvStore,
    /// Serializes `add_generator_result`/`remove_package`/cleanup across
    /// sub-stores the same way `ContentsStore` does.
    writer: Mutex<()>,
}

/// What `cleanup_cruft` actually removed, for logging/reporting.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupStats {
    pub metadata_xml_dropped: usize,
    pub metadata_yaml_dropped: usize,
    pub pool_dirs_removed: usize,
    pub suite_hardlinks_removed: usize,
}

impl DataStore {
    pub fn open(root: &Utf8Path) -> anyhow::Result<Self> {
        Ok(Self {
            packages: KvStore::open(&root.join("packages"))?,
            metadata_xml: KvStore::open(&root.join("metadata_xml"))?,
            metadata_yaml: KvStore::open(&root.join("metadata_yaml"))?,
            hints: KvStore::open(&root.join("hints"))?,
            statistics: KvStore::open(&root.join("statistics"))?,
            repository: KvStore::open(&root.join("repository"))?,
            writer: Mutex::new(()),
        })
    }

    /// No-op: nothing to flush beyond what every atomic write already
    /// guarantees. Present because spec §4.2 names `close` explicitly.
    pub fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn metadata_store(&self, metadata_type: MetadataType) -> &KvStore {
        match metadata_type {
            MetadataType::Xml => &self.metadata_xml,
            MetadataType::Yaml => &self.metadata_yaml,
        }
    }

    #[must_use]
    pub fn metadata_exists(&self, metadata_type: MetadataType, gcid: &Gcid) -> bool {
        self.metadata_store(metadata_type).exists(&gcid.to_string())
    }

    pub fn set_metadata(&self, metadata_type: MetadataType, gcid: &Gcid, bytes: &[u8]) -> anyhow::Result<()> {
        self.metadata_store(metadata_type).put(&gcid.to_string(), bytes)
    }

    pub fn get_metadata(&self, metadata_type: MetadataType, gcid: &Gcid) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.metadata_store(metadata_type).get(&gcid.to_string())?)
    }

    pub fn set_hints(&self, package_id: &PackageId, json_bytes: &[u8]) -> anyhow::Result<()> {
        self.hints.put(&package_id.to_string(), json_bytes)
    }

    pub fn get_hints(&self, package_id: &PackageId) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.hints.get(&package_id.to_string())?)
    }

    #[must_use]
    pub fn has_hints(&self, package_id: &PackageId) -> bool {
        self.hints.exists(&package_id.to_string())
    }

    /// The central write path (spec §4.2 `add_generator_result`).
    /// `serialize` is the injected component -> bytes transform (the
    /// catalog XML/YAML codec lives in `asgen-archive`, not here, so
    /// this crate never depends on it directly).
    pub fn add_generator_result<F>(
        &self,
        metadata_type: MetadataType,
        result: &GeneratorResult,
        always_regenerate: bool,
        serialize: F,
    ) -> anyhow::Result<()>
    where
        F: Fn(&Component) -> Result<Vec<u8>, String>,
    {
        let _guard = self.writer.lock().unwrap_or_else(|p| p.into_inner());
        let pkid_key = result.package_id.to_string();

        if result.is_ignored() {
            self.packages.put(&pkid_key, IGNORE)?;
            return Ok(());
        }

        let mut hints = result.hints.clone();
        let mut surviving = Vec::new();
        for (component, gcid) in result.components.iter().zip(result.gcids.iter()) {
            if self.metadata_exists(metadata_type, gcid) && !always_regenerate {
                surviving.push(gcid.clone());
                continue;
            }
            match serialize(component) {
                Ok(bytes) => {
                    self.set_metadata(metadata_type, gcid, &bytes)?;
                    surviving.push(gcid.clone());
                }
                Err(message) => {
                    hints.push(Hint::for_component(component.id.clone(), "internal-error").with_var("message", message));
                }
            }
        }

        let wrote_hints = !hints.is_empty();
        if wrote_hints {
            self.set_hints(&result.package_id, &serde_json::to_vec(&hints)?)?;
        }

        if surviving.is_empty() {
            if wrote_hints {
                self.packages.put(&pkid_key, SEEN)?;
            } else {
                self.packages.put(&pkid_key, b"")?;
            }
        } else {
            self.packages.put(&pkid_key, join_gcids(&surviving).as_bytes())?;
        }

        Ok(())
    }

    /// Whether `package_id` has a `packages` entry at all, distinct
    /// from `package_gcids` being empty (which is also true for
    /// `ignore`/`seen` packages). The Engine's content-seeding step
    /// needs this to tell "never classified" apart from "classified,
    /// turned out uninteresting" (spec §4.5 `seedContentsData`).
    #[must_use]
    pub fn is_known(&self, package_id: &PackageId) -> bool {
        self.packages.exists(&package_id.to_string())
    }

    /// Whether `package_id` was classified `ignore` on its last run
    /// (spec §6 `remove-found`: "drop every non-ignored package-id's
    /// cached data in a suite, preserving ignores").
    pub fn is_ignored(&self, package_id: &PackageId) -> anyhow::Result<bool> {
        Ok(matches!(self.packages.get(&package_id.to_string())?, Some(bytes) if bytes == IGNORE))
    }

    /// The gcid list currently recorded for one package-id (empty for
    /// `ignore`/`seen`/unknown). Used by `EarlyDedup` to tell "this
    /// package already produced this gcid on a prior run" apart from
    /// "a different package produced it" (spec §4.4 EarlyDedup).
    pub fn package_gcids(&self, package_id: &PackageId) -> anyhow::Result<Vec<Gcid>> {
        match self.packages.get(&package_id.to_string())? {
            Some(bytes) if bytes != IGNORE && bytes != SEEN => Ok(split_gcids(&bytes)),
            _ => Ok(Vec::new()),
        }
    }

    /// Union of every gcid referenced by any `packages` entry (spec
    /// §4.2 `active_gcids`).
    pub fn active_gcids(&self) -> anyhow::Result<HashSet<Gcid>> {
        let mut out = HashSet::new();
        for key in self.packages.keys()? {
            if let Some(bytes) = self.packages.get(&key)? {
                if bytes == IGNORE || bytes == SEEN {
                    continue;
                }
                out.extend(split_gcids(&bytes));
            }
        }
        Ok(out)
    }

    /// Drops inactive gcid keys from both metadata sub-stores and
    /// removes inactive gcid directories (and now-empty intermediates)
    /// from the media pool and suite hardlink roots (spec §4.2
    /// `cleanup_cruft`).
    pub fn cleanup_cruft(&self, export_dir: &Utf8Path, mutable_suites: &[String]) -> anyhow::Result<CleanupStats> {
        let _guard = self.writer.lock().unwrap_or_else(|p| p.into_inner());
        let active = self.active_gcids()?;
        let mut stats = CleanupStats::default();

        for key in self.metadata_xml.keys()? {
            if Gcid::parse(&key).map(|g| !active.contains(&g)).unwrap_or(true) {
                self.metadata_xml.remove(&key)?;
                stats.metadata_xml_dropped += 1;
            }
        }
        for key in self.metadata_yaml.keys()? {
            if Gcid::parse(&key).map(|g| !active.contains(&g)).unwrap_or(true) {
                self.metadata_yaml.remove(&key)?;
                stats.metadata_yaml_dropped += 1;
            }
        }

        let pool_root = asgen_utils::paths::media_pool_root(export_dir);
        if pool_root.exists() {
            for gcid_dir in find_gcid_dirs(&pool_root)? {
                let relative = gcid_dir.strip_prefix(&pool_root).unwrap_or(&gcid_dir);
                let is_active = Gcid::parse(relative.as_str()).map(|g| active.contains(&g)).unwrap_or(false);
                if is_active {
                    continue;
                }
                let gcid_str = relative.to_string();
                let _ = std::fs::remove_dir_all(gcid_dir.as_std_path());
                stats.pool_dirs_removed += 1;
                prune_empty_ancestors(&gcid_dir, &pool_root, 2);

                for suite in mutable_suites {
                    let suite_dir = asgen_utils::paths::media_suite_root(export_dir, suite).join(&gcid_str);
                    if suite_dir.exists() {
                        let _ = std::fs::remove_dir_all(suite_dir.as_std_path());
                        stats.suite_hardlinks_removed += 1;
                    }
                }
            }
        }

        Ok(stats)
    }

    /// Drops `packages[pkid]` and `hints[pkid]` only; gcid records
    /// survive until `cleanup_cruft` (spec §4.2).
    pub fn remove_package(&self, package_id: &PackageId) -> anyhow::Result<()> {
        let _guard = self.writer.lock().unwrap_or_else(|p| p.into_inner());
        let key = package_id.to_string();
        self.packages.remove(&key)?;
        self.hints.remove(&key)?;
        Ok(())
    }

    pub fn add_statistics(&self, timestamp: i64, entry: &StatisticsEntry) -> anyhow::Result<()> {
        let key = timestamp.to_string();
        if self.statistics.exists(&key) {
            tracing::warn!(timestamp, "overwriting existing statistics entry");
        }
        self.statistics.put(&key, &entry.encode(timestamp))
    }

    pub fn remove_statistics(&self, timestamp: i64) -> anyhow::Result<()> {
        self.statistics.remove(&timestamp.to_string())
    }

    /// Decodes every statistics entry, silently skipping legacy
    /// JSON-encoded ones (spec §4.2 `get_statistics`).
    pub fn get_statistics(&self) -> anyhow::Result<Vec<(i64, StatisticsEntry)>> {
        let mut out = Vec::new();
        for key in self.statistics.keys()? {
            let Some(bytes) = self.statistics.get(&key)? else { continue };
            if !binary::looks_like_current_format(&bytes) {
                continue;
            }
            out.push(StatisticsEntry::decode(&bytes).with_context(|| format!("decoding statistics entry {key}"))?);
        }
        out.sort_by_key(|(ts, _)| *ts);
        Ok(out)
    }

    pub fn set_repository(&self, key: &str, info: &RepositoryInfo) -> anyhow::Result<()> {
        self.repository.put(key, &info.encode())
    }

    pub fn get_repository(&self, key: &str) -> anyhow::Result<Option<RepositoryInfo>> {
        match self.repository.get(key)? {
            Some(bytes) => Ok(Some(RepositoryInfo::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Every package-id whose key matches `prefix + "/…"` (spec §4.2
    /// `pkids_matching`).
    pub fn pkids_matching(&self, prefix: &str) -> anyhow::Result<Vec<PackageId>> {
        let mut out = Vec::new();
        for key in self.packages.keys()? {
            if let Some(pkid) = PackageId::parse(&key) {
                if pkid.matches_prefix(prefix) {
                    out.push(pkid);
                }
            }
        }
        Ok(out)
    }
}

/// Walk `pool_root` and collect every directory exactly four path
/// components below it (a gcid's `tld/second_level/component_id/hash`).
fn find_gcid_dirs(pool_root: &Utf8Path) -> anyhow::Result<Vec<camino::Utf8PathBuf>> {
    let mut out = Vec::new();
    collect_at_depth(pool_root, pool_root, 4, &mut out)?;
    Ok(out)
}

fn collect_at_depth(
    root: &Utf8Path,
    current: &Utf8Path,
    remaining: usize,
    out: &mut Vec<camino::Utf8PathBuf>,
) -> anyhow::Result<()> {
    if remaining == 0 {
        out.push(current.to_owned());
        return Ok(());
    }
    let entries = match std::fs::read_dir(current.as_std_path()) {
        Ok(e) => e,
        Err(_) => return Ok(()),
    };
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else { continue };
        collect_at_depth(root, &current.join(name), remaining - 1, out)?;
    }
    Ok(())
}

/// Remove now-empty directories from `dir` upward, stopping after
/// `levels` ancestors (spec §4.2: "up to two levels above the gcid
/// dir").
fn prune_empty_ancestors(dir: &Utf8Path, pool_root: &Utf8Path, levels: usize) {
    let mut current = dir.parent().map(|p| p.to_owned());
    for _ in 0..levels {
        let Some(path) = current else { break };
        if path == pool_root {
            break;
        }
        match std::fs::read_dir(path.as_std_path()) {
            Ok(mut entries) => {
                if entries.next().is_none() {
                    let _ = std::fs::remove_dir(path.as_std_path());
                } else {
                    break;
                }
            }
            Err(_) => break,
        }
        current = path.parent().map(|p| p.to_owned());
    }
}
