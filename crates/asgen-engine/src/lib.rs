//! Engine/Orchestrator (C6): the top-level `run()` entry point driving
//! every (suite, section, architecture) triple through seeding,
//! candidate assembly, extraction, export and cleanup (spec §4.5).

pub mod candidates;
pub mod cleanup;
pub mod export;
pub mod extract;
pub mod icons;
pub mod inject;
pub mod plan;
pub mod report;
pub mod seed;
pub mod serialize;

use anyhow::Context;
use asgen_backend::{Package, PackageIndex};
use asgen_composer::Composer;
use asgen_config::Config;
use asgen_contents_store::ContentsStore;
use asgen_data_store::DataStore;
use asgen_hints::HintRegistry;
use asgen_icons::renderer::IconRenderer;
use asgen_modifications::InjectedModifications;
use asgen_pool::JobPool;
use asgen_utils::lock::DirLock;
use asgen_utils::paths;
use asgen_utils::types::{Gcid, PackageId};
use camino::Utf8PathBuf;
use report::{NullReportGenerator, ReportGenerator, SuiteSummary};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

use inject::InjectedPackage;
use plan::{resolve_plans, SuitePlan};

/// Everything `Engine::new` needs that the core does not build itself:
/// per-distribution backends and the out-of-scope capability
/// implementations (spec §1 "Non-goals", §9 "Dependency-injection
/// points").
pub struct EngineDeps {
    pub indices: HashMap<String, Box<dyn PackageIndex>>,
    pub composer: Arc<dyn Composer>,
    pub icon_renderer: Arc<dyn IconRenderer>,
    pub report_generator: Arc<dyn ReportGenerator>,
}

impl EngineDeps {
    #[must_use]
    pub fn with_defaults(indices: HashMap<String, Box<dyn PackageIndex>>, composer: Arc<dyn Composer>, icon_renderer: Arc<dyn IconRenderer>) -> Self {
        Self {
            indices,
            composer,
            icon_renderer,
            report_generator: Arc::new(NullReportGenerator),
        }
    }
}

/// One run's tally for a single (suite, section, arch) triple, folded
/// into the statistics store after export (spec §4.5 step 6 SUPPLEMENT).
struct TripleStats {
    packages_total: i64,
    packages_ignored: i64,
    packages_with_hints: i64,
    components_total: i64,
}

/// The orchestrator. Owns the persistent stores and the worker pool for
/// the lifetime of one process invocation; a `DirLock` over the
/// workspace root is held for that whole lifetime so two `asgen`
/// processes can never run against the same workspace concurrently
/// (spec §4.5 step 0, `asgen_utils::lock`).
pub struct Engine {
    config: Config,
    workspace_dir: Utf8PathBuf,
    contents_store: ContentsStore,
    data_store: DataStore,
    pool: JobPool,
    deps: EngineDeps,
    _lock: DirLock,
}

impl Engine {
    pub fn new(config: Config, deps: EngineDeps, force_lock: bool) -> anyhow::Result<Self> {
        config.validate().context("invalid configuration")?;
        let workspace_dir = config.workspace_dir.clone();
        let lock = DirLock::acquire(&workspace_dir, force_lock).map_err(|e| anyhow::anyhow!("{e}"))?;

        let contents_store = ContentsStore::open(&paths::contents_store_root(&workspace_dir))?;
        let data_store = DataStore::open(&paths::data_store_root(&workspace_dir))?;
        let pool = JobPool::sized_for_available_parallelism()?;

        Ok(Self {
            config,
            workspace_dir,
            contents_store,
            data_store,
            pool,
            deps,
            _lock: lock,
        })
    }

    fn export_dir(&self) -> Utf8PathBuf {
        paths::export_root(&self.workspace_dir)
    }

    fn allowed_custom_keys(&self) -> HashSet<String> {
        self.config.allowed_custom_keys.iter().cloned().collect()
    }

    fn load_modifications(&self, suite: &str) -> anyhow::Result<InjectedModifications> {
        match &self.config.extra_metainfo_dir {
            Some(dir) => InjectedModifications::load(dir, suite, &self.allowed_custom_keys()),
            None => Ok(InjectedModifications::default()),
        }
    }

    /// Run every configured suite once. `force` bypasses both the
    /// per-triple "unchanged" skip (spec §4.5 step 1) and the
    /// per-component reserialization skip (spec §4.4 "Serialize").
    pub fn run(&mut self, force: bool) -> anyhow::Result<()> {
        self.run_scoped(None, None, force)
    }

    /// `run [suite [section]]` (spec §6): as `run`, but restricted to
    /// one suite and, optionally within it, one section. Cross-suite
    /// cleanup still runs afterward, scoped to whatever suite(s) were
    /// actually processed.
    pub fn run_scoped(&mut self, suite: Option<&str>, section: Option<&str>, force: bool) -> anyhow::Result<()> {
        let mut plans = resolve_plans(&self.config);
        if let Some(suite) = suite {
            plans.retain(|p| p.name == suite);
            if plans.is_empty() {
                anyhow::bail!("unknown suite {suite:?}");
            }
            if let Some(section) = section {
                for plan in &mut plans {
                    plan.sections.retain(|s| s == section);
                }
                if plans.iter().all(|p| p.sections.is_empty()) {
                    anyhow::bail!("suite {suite:?} has no section {section:?}");
                }
            }
        }
        let metadata_type = self.config.effective_metadata_type();
        let icon_policies = self.config.icon_policies()?;
        let export_dir = self.export_dir();
        let media_pool_root = paths::media_pool_root(&export_dir);
        let registry = HintRegistry::global();

        let mut current_package_ids: HashSet<PackageId> = HashSet::new();
        let mut mutable_suites = Vec::new();

        for plan in &plans {
            if !plan.immutable {
                mutable_suites.push(plan.name.clone());
            }
            self.run_suite(plan, metadata_type, &icon_policies, &export_dir, &media_pool_root, force, &mut current_package_ids)?;
            export::export_hint_definitions(&export_dir, &plan.name, registry)?;

            let statistics = self.data_store.get_statistics()?;
            let summary = SuiteSummary { suite: &plan.name, statistics: &statistics };
            self.deps
                .report_generator
                .generate(&paths::html_root(&export_dir), &summary)
                .with_context(|| format!("generating report for suite {}", plan.name))?;
        }

        // A scoped run only sees part of the current package-id universe;
        // running cross-suite cleanup against a partial set would treat
        // every suite not in scope as entirely stale. Only a full `run`
        // (no suite restriction) is allowed to sweep cruft; `cleanup` is
        // the explicit, always-global subcommand for the rest (spec §6).
        if suite.is_none() {
            let stats = cleanup::run_cleanup(&self.contents_store, &self.data_store, &export_dir, &mutable_suites, &current_package_ids)?;
            info!(
                metadata_xml_dropped = stats.metadata_xml_dropped,
                metadata_yaml_dropped = stats.metadata_yaml_dropped,
                pool_dirs_removed = stats.pool_dirs_removed,
                "cleanup complete"
            );
            let dropped_statistics = cleanup::cleanup_statistics(&self.data_store)?;
            info!(dropped_statistics, "statistics cleanup complete");
        }

        Ok(())
    }

    fn run_suite(
        &mut self,
        plan: &SuitePlan,
        metadata_type: asgen_utils::types::MetadataType,
        icon_policies: &[asgen_icons::policy::IconSizePolicy],
        export_dir: &camino::Utf8Path,
        media_pool_root: &camino::Utf8Path,
        force: bool,
        current_package_ids: &mut HashSet<PackageId>,
    ) -> anyhow::Result<()> {
        let Some(index) = self.deps.indices.get(&plan.name) else {
            warn!(suite = %plan.name, "no package index registered, skipping suite");
            return Ok(());
        };
        let index = index.as_ref();
        let base_index = plan.base_suite.as_ref().and_then(|b| self.deps.indices.get(b)).map(AsRef::as_ref);

        let modifications = self.load_modifications(&plan.name)?;

        for section in &plan.sections {
            for arch in &plan.architectures {
                let triple_started = std::time::Instant::now();
                let outcome = seed::seed_contents_data(&self.contents_store, &self.data_store, metadata_type, index, base_index, section, arch, force)?;
                if outcome.skipped {
                    continue;
                }
                current_package_ids.extend(outcome.current_package_ids.iter().cloned());

                let mut candidates = candidates::Candidates::build(&self.deps.indices, plan, section, arch)?;
                let candidate_map = candidates.as_map();
                // No config surface names a dedicated "extra icon prefix"
                // directory (spec §6 has no such field); only themed and
                // legacy-pixmap lookups apply (DESIGN.md).
                let icon_handler = candidates::build_icon_handler(
                    &candidates,
                    &self.contents_store,
                    plan,
                    None,
                    self.deps.icon_renderer.clone(),
                )?;
                let locale_unit = candidates::build_locale_unit(&self.contents_store, &candidates.package_ids())?;

                let injected: Option<Box<dyn Package>> =
                    InjectedPackage::from_modifications(&modifications, arch).map(|p| Box::new(p) as Box<dyn Package>);

                let interesting: HashSet<PackageId> = outcome.interesting_package_ids.iter().cloned().collect();
                let results = extract::run(
                    &self.pool,
                    index,
                    section,
                    arch,
                    &interesting,
                    injected,
                    self.deps.composer.as_ref(),
                    &self.data_store,
                    &icon_handler,
                    &modifications,
                    metadata_type,
                    icon_policies,
                    media_pool_root,
                    self.config.features.allow_icon_upscaling,
                    self.config.features.process_gstreamer,
                    &locale_unit,
                    &candidate_map,
                )?;
                candidates.finish_all();

                let mut export_items = Vec::with_capacity(results.len());
                let mut active_gcids: Vec<Gcid> = Vec::new();
                let mut triple_stats = TripleStats {
                    packages_total: results.len() as i64,
                    packages_ignored: 0,
                    packages_with_hints: 0,
                    components_total: 0,
                };

                for result in &results {
                    if result.is_ignored() {
                        triple_stats.packages_ignored += 1;
                    }
                    if !result.hints.is_empty() {
                        triple_stats.packages_with_hints += 1;
                    }
                    triple_stats.components_total += result.components.len() as i64;
                    active_gcids.extend(result.gcids.iter().cloned());
                }

                for result in results {
                    self.data_store
                        .add_generator_result(metadata_type, &result, force, |c| serialize::serialize_component(c, metadata_type))
                        .with_context(|| format!("writing generator result for {}", result.package_id))?;
                    export_items.push(export::ExportItem {
                        package_id: result.package_id,
                        gcids: result.gcids,
                        hints: result.hints,
                    });
                }

                export::export_triple(
                    export_dir,
                    &self.data_store,
                    metadata_type,
                    &self.config.project_name,
                    &plan.name,
                    section,
                    arch,
                    plan.data_priority,
                    self.config.media_base_url.as_deref(),
                    &self.config.format_version,
                    self.config.features.metadata_timestamps,
                    &export_items,
                )?;

                icons::write_icon_tarballs(export_dir, &plan.name, section, media_pool_root, icon_policies, &active_gcids)?;

                self.data_store.add_statistics(
                    now_seconds(),
                    &asgen_data_store::StatisticsEntryRecord {
                        suite: plan.name.clone(),
                        section: section.clone(),
                        architecture: arch.clone(),
                        packages_total: triple_stats.packages_total,
                        packages_ignored: triple_stats.packages_ignored,
                        packages_with_hints: triple_stats.packages_with_hints,
                        components_total: triple_stats.components_total,
                        gcids_active: active_gcids.len() as i64,
                        duration_secs: triple_started.elapsed().as_secs_f64(),
                    },
                )?;
            }
        }

        Ok(())
    }

    /// `cleanup` (spec §6): cruft sweep and statistics compression with
    /// no extraction pass, driven entirely by the stores' own current
    /// package-id set rather than a fresh suite run.
    pub fn cleanup(&mut self) -> anyhow::Result<(asgen_data_store::CleanupStats, usize)> {
        let export_dir = self.export_dir();
        let mutable_suites: Vec<String> = self
            .config
            .suites
            .iter()
            .filter(|(_, s)| !s.immutable)
            .map(|(name, _)| name.clone())
            .collect();
        let current = self.contents_store.package_id_set()?;
        let stats = cleanup::run_cleanup(&self.contents_store, &self.data_store, &export_dir, &mutable_suites, &current)?;
        let dropped_statistics = cleanup::cleanup_statistics(&self.data_store)?;
        Ok((stats, dropped_statistics))
    }

    /// `remove-found suite` (spec §6): drop every non-ignored
    /// package-id's cached data for `suite`, preserving `ignore`
    /// entries. Suite membership is re-derived from the backend index
    /// since neither store tags a package-id with its owning suite.
    pub fn remove_found(&mut self, suite: &str) -> anyhow::Result<usize> {
        let plan = resolve_plans(&self.config)
            .into_iter()
            .find(|p| p.name == suite)
            .ok_or_else(|| anyhow::anyhow!("unknown suite {suite:?}"))?;
        let Some(index) = self.deps.indices.get(suite) else {
            anyhow::bail!("no package index registered for suite {suite:?}");
        };

        let mut removed = 0;
        for section in &plan.sections {
            for arch in &plan.architectures {
                let mut packages = index.enumerate(section, arch).context("enumerating suite for remove-found")?;
                for package in &mut packages {
                    let id = package.id();
                    package.finish();
                    if self.data_store.is_ignored(&id)? {
                        continue;
                    }
                    self.data_store.remove_package(&id)?;
                    self.contents_store.remove(&std::iter::once(id).collect())?;
                    removed += 1;
                }
            }
        }
        self.contents_store.sync()?;
        Ok(removed)
    }

    /// `forget pkid-or-prefix` (spec §6): delete a package-id (or every
    /// package-id matching a `name` prefix) from both stores, then run
    /// cruft cleanup.
    pub fn forget(&mut self, pkid_or_prefix: &str) -> anyhow::Result<usize> {
        let matches = self.data_store.pkids_matching(pkid_or_prefix)?;
        let matches = if matches.is_empty() {
            PackageId::parse(pkid_or_prefix).into_iter().collect()
        } else {
            matches
        };

        for id in &matches {
            self.data_store.remove_package(id)?;
        }
        if !matches.is_empty() {
            self.contents_store.remove(&matches.iter().cloned().collect())?;
            self.contents_store.sync()?;
        }
        self.cleanup()?;
        Ok(matches.len())
    }

    /// `info pkid` (spec §6): dump contents, icon list, gcids, metadata
    /// and hints recorded for one package-id.
    pub fn info(&self, package_id: &PackageId) -> anyhow::Result<InfoReport> {
        let metadata_type = self.config.effective_metadata_type();
        let gcids = self.data_store.package_gcids(package_id)?;
        let mut metadata = Vec::with_capacity(gcids.len());
        for gcid in &gcids {
            if let Some(bytes) = self.data_store.get_metadata(metadata_type, gcid)? {
                metadata.push((gcid.clone(), bytes));
            }
        }
        Ok(InfoReport {
            contents: self.contents_store.get_contents(package_id)?,
            icons: self.contents_store.get_icons(package_id)?,
            gcids,
            metadata,
            hints: self.data_store.get_hints(package_id)?,
        })
    }

    /// `publish suite [section]` (spec §6): re-export already-extracted
    /// results without running extraction again. Suite/section
    /// membership still needs the backend index to enumerate current
    /// package-ids; only their already-stored gcids/hints are read.
    pub fn publish(&mut self, suite: &str, section_filter: Option<&str>) -> anyhow::Result<()> {
        let plan = resolve_plans(&self.config)
            .into_iter()
            .find(|p| p.name == suite)
            .ok_or_else(|| anyhow::anyhow!("unknown suite {suite:?}"))?;
        let Some(index) = self.deps.indices.get(suite) else {
            anyhow::bail!("no package index registered for suite {suite:?}");
        };

        let metadata_type = self.config.effective_metadata_type();
        let icon_policies = self.config.icon_policies()?;
        let export_dir = self.export_dir();
        let media_pool_root = paths::media_pool_root(&export_dir);

        for section in &plan.sections {
            if let Some(only) = section_filter {
                if section != only {
                    continue;
                }
            }
            for arch in &plan.architectures {
                let mut packages = index.enumerate(section, arch).context("enumerating suite for publish")?;
                let mut export_items = Vec::with_capacity(packages.len());
                let mut active_gcids: Vec<Gcid> = Vec::new();
                for package in &mut packages {
                    let id = package.id();
                    package.finish();
                    if self.data_store.is_ignored(&id)? {
                        continue;
                    }
                    let gcids = self.data_store.package_gcids(&id)?;
                    active_gcids.extend(gcids.iter().cloned());
                    let hints = self.data_store.get_hints(&id)?.map(|bytes| serde_json::from_slice(&bytes)).transpose()?.unwrap_or_default();
                    export_items.push(export::ExportItem { package_id: id, gcids, hints });
                }

                export::export_triple(
                    &export_dir,
                    &self.data_store,
                    metadata_type,
                    &self.config.project_name,
                    &plan.name,
                    section,
                    arch,
                    plan.data_priority,
                    self.config.media_base_url.as_deref(),
                    &self.config.format_version,
                    self.config.features.metadata_timestamps,
                    &export_items,
                )?;
                icons::write_icon_tarballs(&export_dir, &plan.name, section, &media_pool_root, &icon_policies, &active_gcids)?;
            }
        }
        Ok(())
    }

    /// `process-file suite section file…` (spec §6): run the full
    /// pipeline for one (suite, section, arch) triple against a
    /// caller-supplied `index` instead of the registered backend index,
    /// restricted to the architecture that index enumerates for. The
    /// caller owns how files are turned into packages (spec §1
    /// Non-goals: per-format package parsing is out of scope here).
    pub fn process_file(&mut self, suite: &str, section: &str, arch: &str, index: Box<dyn PackageIndex>) -> anyhow::Result<()> {
        let base = resolve_plans(&self.config)
            .into_iter()
            .find(|p| p.name == suite)
            .ok_or_else(|| anyhow::anyhow!("unknown suite {suite:?}"))?;
        let plan = SuitePlan {
            sections: vec![section.to_string()],
            architectures: vec![arch.to_string()],
            ..base
        };

        let metadata_type = self.config.effective_metadata_type();
        let icon_policies = self.config.icon_policies()?;
        let export_dir = self.export_dir();
        let media_pool_root = paths::media_pool_root(&export_dir);

        let previous = self.deps.indices.insert(suite.to_string(), index);
        let mut current_package_ids = HashSet::new();
        let result = self.run_suite(&plan, metadata_type, &icon_policies, &export_dir, &media_pool_root, true, &mut current_package_ids);

        match previous {
            Some(original) => {
                self.deps.indices.insert(suite.to_string(), original);
            }
            None => {
                self.deps.indices.remove(suite);
            }
        }
        result
    }
}

/// `info pkid` result (spec §6 "dump contents, icon list, gcids,
/// metadata, and hints for one package-id").
pub struct InfoReport {
    pub contents: Vec<Utf8PathBuf>,
    pub icons: Vec<Utf8PathBuf>,
    pub gcids: Vec<Gcid>,
    pub metadata: Vec<(Gcid, Vec<u8>)>,
    pub hints: Option<Vec<u8>>,
}

fn now_seconds() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
