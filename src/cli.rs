//! Command-line surface (spec §6): one subcommand per documented
//! operation, global flags resolved with the teacher's discovery
//! precedence (CLI flags > config file > defaults).

use anyhow::Context;
use asgen_backend::PackageIndex;
use asgen_composer::Composer;
use asgen_config::{Config, ConfigOverrides};
use asgen_engine::{Engine, EngineDeps};
use asgen_icons::renderer::{IconRenderer, PngIconRenderer};
use asgen_utils::exit_codes::ExitCode;
use asgen_utils::types::PackageId;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::file_package::FileIndex;

#[derive(Debug, Parser)]
#[command(name = "asgen", version, about = "Batch AppStream metadata generator")]
pub struct Cli {
    /// Path to the JSON configuration file (spec §6 "Configuration file").
    #[arg(long, global = true)]
    pub config: Utf8PathBuf,

    /// Override `Config.WorkspaceDir`.
    #[arg(long, global = true)]
    pub workspace: Option<Utf8PathBuf>,

    /// Verbose structured logging.
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Bypass a stale-but-held workspace lock.
    #[arg(long, global = true)]
    pub force: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Full pipeline over every configured suite, or a restricted `suite [section]`.
    Run {
        suite: Option<String>,
        section: Option<String>,
    },
    /// Process given package files through the full pipeline, restricted
    /// to one architecture.
    ProcessFile {
        suite: String,
        section: String,
        #[arg(long)]
        arch: String,
        files: Vec<Utf8PathBuf>,
    },
    /// Re-export an already-extracted suite without re-running extraction.
    Publish {
        suite: String,
        section: Option<String>,
    },
    /// Cruft sweep and statistics compression.
    Cleanup,
    /// Drop every non-ignored package-id's cached data in a suite.
    RemoveFound { suite: String },
    /// Delete a package-id (or every package-id matching a name prefix).
    Forget { pkid_or_prefix: String },
    /// Dump contents, icon list, gcids, metadata and hints for one package-id.
    Info { pkid: String },
}

/// Build the capability set this binary ships. Neither a real
/// `Composer` nor a real per-distribution `PackageIndex` lives in this
/// core (spec §1 Non-goals: both are out-of-scope black boxes); `run`,
/// `publish` and `remove-found` therefore operate over whatever the
/// caller already registered through the library `Engine` API. The
/// binary itself has nothing to register unless built with
/// `--features test-utils`, in which case it demonstrates the full
/// pipeline against the bundled `Dummy` backend and stub composer.
#[cfg(feature = "test-utils")]
fn build_deps(config: &Config) -> anyhow::Result<EngineDeps> {
    use asgen_backend::dummy::DummyIndex;
    use asgen_composer::stub::StubComposer;

    let mut indices: HashMap<String, Box<dyn PackageIndex>> = HashMap::new();
    for name in config.suites.keys() {
        indices.insert(name.clone(), Box::new(DummyIndex::new()));
    }
    Ok(EngineDeps::with_defaults(indices, Arc::new(StubComposer::new()), Arc::new(PngIconRenderer)))
}

#[cfg(not(feature = "test-utils"))]
fn build_deps(config: &Config) -> anyhow::Result<EngineDeps> {
    anyhow::bail!(
        "no PackageIndex/Composer registered for suites {:?}; this binary ships no concrete distribution backend \
         (spec §1 Non-goals) -- build with `--features test-utils` for the bundled demonstration backend, or use \
         `asgen` as a library and supply your own `EngineDeps`",
        config.suites.keys().collect::<Vec<_>>()
    )
}

fn default_composer_and_renderer() -> anyhow::Result<(Arc<dyn Composer>, Arc<dyn IconRenderer>)> {
    #[cfg(feature = "test-utils")]
    {
        Ok((Arc::new(asgen_composer::stub::StubComposer::new()), Arc::new(PngIconRenderer)))
    }
    #[cfg(not(feature = "test-utils"))]
    {
        anyhow::bail!("no Composer registered; build with `--features test-utils` for the bundled stub composer")
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let config = Config::load(&cli.config).context("loading configuration")?;
    let overrides = ConfigOverrides {
        workspace_dir: cli.workspace.clone(),
        backend: None,
        metadata_type: None,
    };
    Ok(config.with_overrides(overrides))
}

pub fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    asgen_utils::logging::init_tracing(cli.verbose).ok();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err:#}");
            return Ok(ExitCode::ConfigError);
        }
    };

    let result = dispatch(&cli, config);
    match result {
        Ok(()) => Ok(ExitCode::Success),
        Err(err) => {
            eprintln!("{err:#}");
            Ok(ExitCode::UserError)
        }
    }
}

fn dispatch(cli: &Cli, config: Config) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Run { suite, section } => {
            let deps = build_deps(&config)?;
            let mut engine = Engine::new(config, deps, cli.force)?;
            engine.run_scoped(suite.as_deref(), section.as_deref(), cli.force)
        }
        Commands::ProcessFile { suite, section, arch, files } => {
            let deps = build_deps(&config)?;
            let mut engine = Engine::new(config, deps, cli.force)?;
            let index = FileIndex::new(section.clone(), arch.clone(), files.clone());
            engine.process_file(suite, section, arch, Box::new(index))
        }
        Commands::Publish { suite, section } => {
            let deps = build_deps(&config)?;
            let mut engine = Engine::new(config, deps, cli.force)?;
            engine.publish(suite, section.as_deref())
        }
        Commands::Cleanup => {
            let (composer, renderer) = default_composer_and_renderer()?;
            let deps = EngineDeps::with_defaults(HashMap::new(), composer, renderer);
            let mut engine = Engine::new(config, deps, cli.force)?;
            let (stats, dropped_statistics) = engine.cleanup()?;
            info!(
                metadata_xml_dropped = stats.metadata_xml_dropped,
                metadata_yaml_dropped = stats.metadata_yaml_dropped,
                pool_dirs_removed = stats.pool_dirs_removed,
                dropped_statistics,
                "cleanup complete"
            );
            Ok(())
        }
        Commands::RemoveFound { suite } => {
            let deps = build_deps(&config)?;
            let mut engine = Engine::new(config, deps, cli.force)?;
            let removed = engine.remove_found(suite)?;
            info!(removed, suite, "remove-found complete");
            Ok(())
        }
        Commands::Forget { pkid_or_prefix } => {
            let (composer, renderer) = default_composer_and_renderer()?;
            let deps = EngineDeps::with_defaults(HashMap::new(), composer, renderer);
            let mut engine = Engine::new(config, deps, cli.force)?;
            let forgotten = engine.forget(pkid_or_prefix)?;
            info!(forgotten, pkid_or_prefix, "forget complete");
            Ok(())
        }
        Commands::Info { pkid } => {
            let (composer, renderer) = default_composer_and_renderer()?;
            let deps = EngineDeps::with_defaults(HashMap::new(), composer, renderer);
            let engine = Engine::new(config, deps, cli.force)?;
            let package_id = PackageId::parse(pkid).ok_or_else(|| anyhow::anyhow!("invalid package-id {pkid:?}, expected name/version/arch"))?;
            let report = engine.info(&package_id)?;
            print_info(&package_id, &report);
            Ok(())
        }
    }
}

fn print_info(package_id: &PackageId, report: &asgen_engine::InfoReport) {
    println!("package-id: {package_id}");
    println!("contents ({}):", report.contents.len());
    for path in &report.contents {
        println!("  {path}");
    }
    println!("icons ({}):", report.icons.len());
    for path in &report.icons {
        println!("  {path}");
    }
    println!("gcids ({}):", report.gcids.len());
    for gcid in &report.gcids {
        println!("  {gcid}");
    }
    println!("hints: {}", if report.hints.is_some() { "present" } else { "none" });
}
