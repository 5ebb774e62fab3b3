//! The in-memory `Component` model the composer produces (spec §3).

use asgen_utils::types::MergeKind;
use std::collections::HashMap;

/// AppStream component kind. Kept to the subset the pipeline has to
/// branch on (final-check install-candidate rule, GStreamer pseudo
/// components); the full AppStream kind vocabulary belongs to the
/// downstream composer, not the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    DesktopApp,
    ConsoleApp,
    WebApp,
    Font,
    Codec,
    OperatingSystem,
    Repository,
    Generic,
}

impl ComponentKind {
    /// Desktop/console/web apps get the packaging-description fallback
    /// and the description-missing hint (spec §4.4 FinalCheck).
    #[must_use]
    pub fn wants_description_fallback(self) -> bool {
        matches!(
            self,
            ComponentKind::DesktopApp | ComponentKind::ConsoleApp | ComponentKind::WebApp
        )
    }

    /// Kinds exempt from the "no install candidate" rule (spec §4.4
    /// FinalCheck: "its kind is not web-app/os/repository").
    #[must_use]
    pub fn exempt_from_install_candidate_check(self) -> bool {
        matches!(
            self,
            ComponentKind::WebApp | ComponentKind::OperatingSystem | ComponentKind::Repository
        )
    }
}

/// Where a resolved icon file lives, per spec §4.3 step 5/6.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconPlacement {
    /// Rendered into the media pool: `<gcid>/icons/<size>/<name>`.
    Cached { filename: String },
    /// Remote reference only, same relative shape, never rendered
    /// locally.
    Remote { filename: String },
}

/// One resolved icon entry attached to a component after `IconHandler`
/// has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconRef {
    pub width: u32,
    pub height: u32,
    pub scale: u32,
    pub placement: IconPlacement,
}

/// One AppStream record (spec §3).
#[derive(Debug, Clone)]
pub struct Component {
    pub id: String,
    pub kind: ComponentKind,
    /// locale -> short summary.
    pub summary: HashMap<String, String>,
    /// locale -> long description paragraph.
    pub description: HashMap<String, String>,
    /// Raw icon name as found in the source metadata, before
    /// `IconHandler` resolves it. Cleared once resolution starts (spec
    /// §4.3 step 1).
    pub icon_name: Option<String>,
    pub icons: Vec<IconRef>,
    pub package_names: Vec<String>,
    pub bundle: Option<String>,
    pub custom_fields: HashMap<String, String>,
    pub merge_kind: MergeKind,
}

impl Component {
    #[must_use]
    pub fn new(id: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            id: id.into(),
            kind,
            summary: HashMap::new(),
            description: HashMap::new(),
            icon_name: None,
            icons: Vec::new(),
            package_names: Vec::new(),
            bundle: None,
            custom_fields: HashMap::new(),
            merge_kind: MergeKind::None,
        }
    }

    #[must_use]
    pub fn has_long_description(&self) -> bool {
        self.description.values().any(|d| !d.trim().is_empty())
    }

    /// Whether a 64x64 icon entry is present (spec §4.3 mandatory
    /// invariant / spec §8 invariant 5).
    #[must_use]
    pub fn has_default_size_icon(&self) -> bool {
        self.icons.iter().any(|i| i.width == 64 && i.height == 64)
    }

    /// Deterministic, field-order-independent serialization used as
    /// input to the gcid hash (spec §3). Deliberately excludes `icons`:
    /// gcid is computed before icon resolution runs (spec §4.4
    /// EarlyDedup precedes IconStage).
    #[must_use]
    pub fn normalized_serialization(&self) -> String {
        let mut out = String::new();
        out.push_str("id=");
        out.push_str(&self.id);
        out.push('\n');
        out.push_str("kind=");
        out.push_str(&format!("{:?}", self.kind));
        out.push('\n');

        let mut summary: Vec<_> = self.summary.iter().collect();
        summary.sort();
        for (locale, text) in summary {
            out.push_str(&format!("summary[{locale}]={text}\n"));
        }

        let mut description: Vec<_> = self.description.iter().collect();
        description.sort();
        for (locale, text) in description {
            out.push_str(&format!("description[{locale}]={text}\n"));
        }

        if let Some(icon_name) = &self.icon_name {
            out.push_str(&format!("icon_name={icon_name}\n"));
        }

        let mut pkgnames = self.package_names.clone();
        pkgnames.sort();
        out.push_str(&format!("package_names={}\n", pkgnames.join(",")));

        if let Some(bundle) = &self.bundle {
            out.push_str(&format!("bundle={bundle}\n"));
        }

        let mut custom: Vec<_> = self.custom_fields.iter().collect();
        custom.sort();
        for (key, value) in custom {
            out.push_str(&format!("custom[{key}]={value}\n"));
        }

        out
    }
}
