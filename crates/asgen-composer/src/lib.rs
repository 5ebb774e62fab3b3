//! Composer capability boundary (spec §1, §3).
//!
//! The downstream composer library — the thing that actually parses
//! desktop entries, renders icons and validates MetaInfo — is out of
//! scope (spec §1): "we treat it as a black-box transformer from a
//! 'unit' (a filesystem view) to a 'result' (components + hints)". This
//! crate defines that black box: the `Component` model it produces, the
//! `Unit` types it consumes, and the `Composer` trait the orchestrator
//! injects. `stub`, behind `test-utils`, is a minimal composer used by
//! engine tests and the end-to-end scenarios of spec §8 — not a real
//! desktop-entry/MetaInfo parser.

use asgen_backend::Package;
use asgen_hints::Hint;
use asgen_utils::types::{Gcid, PackageId};

pub mod component;
pub mod unit;

pub use component::{Component, ComponentKind, IconPlacement, IconRef};
pub use unit::{LocaleUnit, PackageUnit};

/// What one composer invocation produces for a unit: the component set
/// plus any issue hints raised while composing it (spec §2 data flow:
/// `composer(...) -> components + hints`).
#[derive(Debug, Clone, Default)]
pub struct ComposeOutput {
    pub components: Vec<Component>,
    pub hints: Vec<Hint>,
}

/// Black-box transformer from a package (plus the locale context of its
/// section) to a `ComposeOutput`. Injected by the orchestrator; the
/// extraction pipeline never constructs components itself. `Err`
/// signals catastrophic composer failure (spec §4.4 Composing: "On
/// catastrophic composer failure, convert to a hint and stop") rather
/// than a per-component issue, which the composer should instead
/// report through `ComposeOutput::hints`.
pub trait Composer: Send + Sync {
    fn compose(&self, unit: &PackageUnit<'_>, locale: &LocaleUnit) -> Result<ComposeOutput, String>;
}

/// Compute the gcid for a component: `{tld}/{second_level}/{component_id}/{hash}`
/// where `{hash}` is the BLAKE3 digest (truncated) of the component's
/// normalized serialization (spec §3). Computed before icon resolution
/// so EarlyDedup (spec §4.4) can run before the expensive icon stage.
#[must_use]
pub fn compute_gcid(component: &Component) -> Gcid {
    let hash = asgen_utils::hash::gcid_hash(&component.normalized_serialization());
    Gcid::from_component_id(&component.id, &hash)
}

/// What one extractor run produces for a package, ready for
/// `DataStore::add_generator_result` (spec §4.2 `add_generator_result`:
/// "a `GeneratorResult` containing `(package-id, components, hints,
/// per-component gcids)`"). Lives here rather than in the extractor
/// crate so both `asgen-data-store` and `asgen-extractor` can depend on
/// it without a cycle between them.
#[derive(Debug, Clone)]
pub struct GeneratorResult {
    pub package_id: PackageId,
    pub components: Vec<Component>,
    pub hints: Vec<Hint>,
    /// One gcid per surviving entry in `components`, same order.
    pub gcids: Vec<Gcid>,
}

impl GeneratorResult {
    #[must_use]
    pub fn new(package_id: PackageId) -> Self {
        Self {
            package_id,
            components: Vec::new(),
            hints: Vec::new(),
            gcids: Vec::new(),
        }
    }

    /// Build from a `ComposeOutput`, computing each component's gcid.
    #[must_use]
    pub fn from_compose_output(package_id: PackageId, output: ComposeOutput) -> Self {
        let gcids = output.components.iter().map(compute_gcid).collect();
        Self {
            package_id,
            components: output.components,
            hints: output.hints,
            gcids,
        }
    }

    /// No components and no hints: nothing interesting was found (spec
    /// §4.2 `add_generator_result` step 1).
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.components.is_empty() && self.hints.is_empty()
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod stub;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gcid_is_stable_for_identical_components() {
        let a = Component::new("org.example.Hello.desktop", ComponentKind::DesktopApp);
        let b = Component::new("org.example.Hello.desktop", ComponentKind::DesktopApp);
        assert_eq!(compute_gcid(&a), compute_gcid(&b));
    }

    #[test]
    fn gcid_changes_when_summary_changes() {
        let mut a = Component::new("org.example.Hello.desktop", ComponentKind::DesktopApp);
        let mut b = a.clone();
        a.summary.insert("en".into(), "Hello".into());
        b.summary.insert("en".into(), "Goodbye".into());
        assert_ne!(compute_gcid(&a), compute_gcid(&b));
    }

    #[test]
    fn generator_result_with_no_components_or_hints_is_ignored() {
        let result = GeneratorResult::new(PackageId::new("hello", "1.0", "amd64"));
        assert!(result.is_ignored());
    }

    #[test]
    fn generator_result_from_compose_output_computes_one_gcid_per_component() {
        let mut output = ComposeOutput::default();
        output.components.push(Component::new("org.example.Hello.desktop", ComponentKind::DesktopApp));
        let result = GeneratorResult::from_compose_output(PackageId::new("hello", "1.0", "amd64"), output);
        assert_eq!(result.gcids.len(), 1);
        assert!(!result.is_ignored());
    }
}

/// Re-exported so extractor/engine crates can name a package handle
/// without depending on `asgen_backend` directly everywhere a unit is built.
pub type PackageHandle<'a> = &'a dyn Package;
