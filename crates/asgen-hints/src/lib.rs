//! Hint registry (C9): process-wide catalog of issue-tag -> (severity,
//! explanation template), loaded once (spec §2, §9).

use asgen_utils::types::Severity;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One issue report attached to a component, or to `"general"` when it
/// is not specific to any single component (spec §3 glossary: Hint).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    /// `None` means the hint targets `"general"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    pub tag: String,
    #[serde(default)]
    pub vars: HashMap<String, String>,
}

impl Hint {
    #[must_use]
    pub fn general(tag: impl Into<String>) -> Self {
        Self {
            component_id: None,
            tag: tag.into(),
            vars: HashMap::new(),
        }
    }

    #[must_use]
    pub fn for_component(component_id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            component_id: Some(component_id.into()),
            tag: tag.into(),
            vars: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn target(&self) -> &str {
        self.component_id.as_deref().unwrap_or("general")
    }
}

/// Severity + explanation template for one hint tag, as emitted by
/// `hint-definitions.json` (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HintDefinition {
    pub tag: String,
    pub severity: Severity,
    pub explanation: String,
}

/// A hint resolved against the registry: severity plus the rendered
/// explanation string with `{var}` placeholders substituted.
#[derive(Debug, Clone)]
pub struct ExplainedHint {
    pub severity: Severity,
    pub message: String,
}

/// Process-wide, read-only after construction (spec §5 "Shared-resource
/// policy": the hint registry is constructed once, double-checked
/// initialization, and is read-only thereafter).
#[derive(Debug)]
pub struct HintRegistry {
    definitions: HashMap<String, HintDefinition>,
}

impl HintRegistry {
    /// Build a registry from the built-in default definitions merged
    /// with `extra` (later entries override earlier ones by tag).
    #[must_use]
    pub fn new(extra: Vec<HintDefinition>) -> Self {
        let mut definitions = HashMap::new();
        for def in builtin_definitions() {
            definitions.insert(def.tag.clone(), def);
        }
        for def in extra {
            definitions.insert(def.tag.clone(), def);
        }
        Self { definitions }
    }

    /// The process-wide, lazily-initialized default registry.
    pub fn global() -> &'static HintRegistry {
        static INSTANCE: OnceCell<HintRegistry> = OnceCell::new();
        INSTANCE.get_or_init(|| HintRegistry::new(Vec::new()))
    }

    #[must_use]
    pub fn lookup(&self, tag: &str) -> Option<&HintDefinition> {
        self.definitions.get(tag)
    }

    /// Resolve a hint to its severity and a rendered message. Unknown
    /// tags default to `Severity::Warning` with a generic message
    /// rather than panicking — a backend shipping an unregistered tag
    /// must not crash the whole run.
    #[must_use]
    pub fn explain(&self, hint: &Hint) -> ExplainedHint {
        match self.definitions.get(&hint.tag) {
            Some(def) => ExplainedHint {
                severity: def.severity,
                message: render_template(&def.explanation, &hint.vars),
            },
            None => ExplainedHint {
                severity: Severity::Warning,
                message: format!("unregistered hint tag: {}", hint.tag),
            },
        }
    }

    /// Serialize every known definition, for `hints/<suite>/hint-definitions.json`.
    #[must_use]
    pub fn all_definitions(&self) -> Vec<&HintDefinition> {
        let mut defs: Vec<_> = self.definitions.values().collect();
        defs.sort_by(|a, b| a.tag.cmp(&b.tag));
        defs
    }
}

fn render_template(template: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(end) = template[i..].find('}') {
                let name = &template[i + 1..i + end];
                if let Some(value) = vars.get(name) {
                    out.push_str(value);
                    i += end + 1;
                    continue;
                }
            }
        }
        let ch = template[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

fn builtin_definitions() -> Vec<HintDefinition> {
    use Severity::*;
    let raw: &[(&str, Severity, &str)] = &[
        (
            "icon-not-found",
            Error,
            "No suitable icon could be found or rendered for component {cid}.",
        ),
        (
            "icon-too-small",
            Warning,
            "Icon for component {cid} is smaller than the minimum size of 48x48.",
        ),
        (
            "icon-scaled-up",
            Info,
            "Icon for component {cid} was scaled up from a smaller source image.",
        ),
        (
            "metainfo-duplicate-id",
            Warning,
            "Component {cid} was already provided by another package; this package's copy was dropped.",
        ),
        (
            "no-install-candidate",
            Error,
            "Component {cid} has no associated package and is not installable by any means.",
        ),
        (
            "description-from-package",
            Info,
            "Component {cid} had no long description; the packaging description was used instead.",
        ),
        (
            "description-missing",
            Warning,
            "Component {cid} has no long description and none could be found in the package.",
        ),
        (
            "internal-error",
            Error,
            "An internal error occurred while processing component {cid}: {message}.",
        ),
        (
            "custom-key-rejected",
            Pedantic,
            "Custom field {key} is not present in the AllowedCustomKeys whitelist and was dropped.",
        ),
        (
            "metadata-serialization-failed",
            Error,
            "Failed to serialize component {cid}: {message}.",
        ),
        (
            "compose-failed",
            Error,
            "The composer failed to process this package: {message}.",
        ),
    ];
    raw.iter()
        .map(|(tag, severity, explanation)| HintDefinition {
            tag: (*tag).to_string(),
            severity: *severity,
            explanation: (*explanation).to_string(),
        })
        .collect()
}
