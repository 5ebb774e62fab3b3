//! HTML report generation capability (SPEC_FULL.md §4.6 SUPPLEMENT).
//!
//! spec.md scopes the HTML report surface out (spec §1 Non-goals:
//! "the HTML report renderer"), but the `Config.ExportDirs.Html`
//! field and the `html` on-disk root (spec §6) are still part of the
//! document model, so the Engine needs somewhere to plug a real
//! renderer in without the core depending on templating machinery it
//! doesn't otherwise use. Mirrors the `Composer`/`IconRenderer`
//! capability-boundary pattern: define the seam, ship a no-op default.

use asgen_data_store::StatisticsEntryRecord;
use camino::Utf8Path;

/// One suite's run summary, as handed to a report generator after
/// export completes.
pub struct SuiteSummary<'a> {
    pub suite: &'a str,
    pub statistics: &'a [(i64, StatisticsEntryRecord)],
}

/// Injected capability for turning a run's statistics into an HTML
/// report tree under `<export>/html` (spec §6 "html root"). Real
/// rendering is out of scope for the core; `NullReportGenerator` is
/// the only implementation this crate ships.
pub trait ReportGenerator: Send + Sync {
    fn generate(&self, html_root: &Utf8Path, summary: &SuiteSummary<'_>) -> anyhow::Result<()>;
}

/// Default `ReportGenerator`: does nothing. A deployment that wants
/// the HTML report plugs in its own implementation.
#[derive(Debug, Default)]
pub struct NullReportGenerator;

impl ReportGenerator for NullReportGenerator {
    fn generate(&self, _html_root: &Utf8Path, _summary: &SuiteSummary<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_report_generator_is_a_no_op() {
        let generator = NullReportGenerator;
        let summary = SuiteSummary { suite: "stable", statistics: &[] };
        assert!(generator.generate(Utf8Path::new("/tmp/html"), &summary).is_ok());
    }
}
