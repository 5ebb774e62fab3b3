//! Cleanup step (spec §4.5 step 6, §4.2 "cleanup_cruft"): retire
//! package-ids that no longer exist in any mutable suite, then sweep
//! the gcid stores and media pool for anything that fell out of every
//! active package's result set.

use asgen_contents_store::ContentsStore;
use asgen_data_store::{CleanupStats, DataStore};
use asgen_utils::types::PackageId;
use camino::Utf8Path;
use std::collections::HashSet;

/// Drop `DataStore`/`ContentsStore` records for package-ids that no
/// longer appear in `current_package_ids`, then reclaim cruft from the
/// gcid-addressed stores and media pool. `mutable_suites` gates which
/// suites' hardlink roots `cleanup_cruft` is allowed to prune (spec
/// §4.2: immutable suites are never swept).
pub fn run_cleanup(
    contents_store: &ContentsStore,
    data_store: &DataStore,
    export_dir: &Utf8Path,
    mutable_suites: &[String],
    current_package_ids: &HashSet<PackageId>,
) -> anyhow::Result<CleanupStats> {
    let known = contents_store.package_id_set()?;
    let stale: HashSet<PackageId> = known.difference(current_package_ids).cloned().collect();

    if !stale.is_empty() {
        contents_store.remove(&stale)?;
        for package_id in &stale {
            data_store.remove_package(package_id)?;
        }
    }

    data_store.cleanup_cruft(export_dir, mutable_suites)
}

/// Drop adjacent statistics entries whose payload is byte-identical to
/// the immediately preceding entry for the same `(suite, section)` pair
/// (spec §4.6 `cleanupStatistics`: "for each (suite, section) pair,
/// delete any entry whose serialized payload equals the immediately
/// preceding entry's payload"). Entries are compared within their own
/// `(suite, section)` stream, ordered by timestamp; a pair's absence
/// from one entry to the next is a boundary, not a duplicate.
pub fn cleanup_statistics(data_store: &DataStore) -> anyhow::Result<usize> {
    let mut entries = data_store.get_statistics()?;
    entries.sort_by_key(|(timestamp, _)| *timestamp);

    let mut previous: std::collections::HashMap<(String, String), asgen_data_store::StatisticsEntryRecord> =
        std::collections::HashMap::new();
    let mut dropped = 0;
    for (timestamp, entry) in entries {
        let key = (entry.suite.clone(), entry.section.clone());
        if previous.get(&key) == Some(&entry) {
            data_store.remove_statistics(timestamp)?;
            dropped += 1;
        } else {
            previous.insert(key, entry);
        }
    }
    Ok(dropped)
}
