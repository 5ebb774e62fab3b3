//! The configuration document (spec §6 "Configuration file").

use asgen_utils::types::MetadataType;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `Config.Backend` (spec §6). Only `Dummy` ships a concrete
/// implementation in this core (spec §1 Non-goals); the rest are
/// recognized so config files written for a real deployment still
/// parse and fail with a clear "not built" error at wiring time rather
/// than an unknown-variant JSON error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Dummy,
    Debian,
    Ubuntu,
    Arch,
    Rpmmd,
    Alpinelinux,
    Freebsd,
    Nix,
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Dummy
    }
}

/// `Config.ExportDirs` (spec §6): per-kind export path overrides,
/// relative paths resolved under the export root.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportDirs {
    pub media: Option<Utf8PathBuf>,
    pub data: Option<Utf8PathBuf>,
    pub hints: Option<Utf8PathBuf>,
    pub html: Option<Utf8PathBuf>,
}

/// One entry of `Config.Suites` (spec §6). Forbidden name: `pool`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteConfig {
    #[serde(default)]
    pub data_priority: i64,
    #[serde(default)]
    pub base_suite: Option<String>,
    #[serde(default)]
    pub use_icon_theme: Option<String>,
    #[serde(default)]
    pub sections: Vec<String>,
    #[serde(default)]
    pub architectures: Vec<String>,
    #[serde(default)]
    pub immutable: bool,
}

/// One entry of `Config.Icons` keyed by `"WxH[@s]"` (spec §6).
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct IconPolicyConfig {
    #[serde(default)]
    pub remote: bool,
    #[serde(default)]
    pub cached: bool,
}

/// `Config.Features` (spec §6): boolean pipeline toggles.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    #[serde(default)]
    pub validate_metainfo: bool,
    #[serde(default)]
    pub process_desktop: bool,
    #[serde(default)]
    pub no_downloads: bool,
    #[serde(default)]
    pub create_screenshots_store: bool,
    #[serde(default)]
    pub optimize_png_size: bool,
    #[serde(default)]
    pub metadata_timestamps: bool,
    #[serde(default)]
    pub immutable_suites: bool,
    #[serde(default)]
    pub process_fonts: bool,
    #[serde(default)]
    pub allow_icon_upscaling: bool,
    #[serde(default)]
    pub process_gstreamer: bool,
    #[serde(default)]
    pub process_locale: bool,
    #[serde(default)]
    pub screenshot_videos: bool,
    #[serde(default)]
    pub propagate_metainfo_artifacts: bool,
}

fn default_format_version() -> String {
    "1.0".to_string()
}

/// The full configuration document, one JSON file at the workspace root
/// (spec §6). `WorkspaceDir`, `ProjectName` and `ArchiveRoot` have no
/// sensible default and are required; everything else falls back to a
/// documented default.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    pub workspace_dir: Utf8PathBuf,
    pub project_name: String,
    pub archive_root: String,
    #[serde(default)]
    pub media_base_url: Option<String>,
    #[serde(default)]
    pub html_base_url: Option<String>,
    #[serde(default)]
    pub export_dirs: ExportDirs,
    #[serde(default)]
    pub extra_metainfo_dir: Option<Utf8PathBuf>,
    #[serde(default, rename = "CAInfo")]
    pub ca_info: Option<Utf8PathBuf>,
    #[serde(default = "default_format_version")]
    pub format_version: String,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub metadata_type: Option<MetadataType>,
    #[serde(default)]
    pub suites: HashMap<String, SuiteConfig>,
    #[serde(default)]
    pub oldsuites: Vec<String>,
    #[serde(default)]
    pub icons: HashMap<String, IconPolicyConfig>,
    #[serde(default)]
    pub max_screenshot_file_size: u64,
    #[serde(default)]
    pub allowed_custom_keys: Vec<String>,
    #[serde(default)]
    pub features: Features,
}

impl Config {
    /// `MetadataType` to actually use: explicit override, else the
    /// backend's own default (spec §6: "overrides backend default").
    /// Every backend recognized today defaults to XML.
    #[must_use]
    pub fn effective_metadata_type(&self) -> MetadataType {
        self.metadata_type.unwrap_or(MetadataType::Xml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_deserializes_with_documented_defaults() {
        let json = r#"{
            "WorkspaceDir": "/srv/asgen",
            "ProjectName": "mydist",
            "ArchiveRoot": "/srv/archive"
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.format_version, "1.0");
        assert_eq!(config.backend, Backend::Dummy);
        assert!(config.suites.is_empty());
        assert_eq!(config.effective_metadata_type(), MetadataType::Xml);
    }

    #[test]
    fn suite_and_icon_entries_use_their_documented_casing() {
        let json = r#"{
            "WorkspaceDir": "/srv/asgen",
            "ProjectName": "mydist",
            "ArchiveRoot": "/srv/archive",
            "Suites": {
                "stable": {"dataPriority": 10, "sections": ["main"], "architectures": ["amd64"], "immutable": false}
            },
            "Icons": {
                "64x64": {"remote": true, "cached": true}
            }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let stable = config.suites.get("stable").unwrap();
        assert_eq!(stable.data_priority, 10);
        assert_eq!(stable.sections, vec!["main".to_string()]);
        assert!(config.icons.get("64x64").unwrap().cached);
    }
}
