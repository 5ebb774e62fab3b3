//! Icon tarball step (spec §4.5 step 5, §6 `icons-<WxH[@s]>.tar.gz`):
//! one archive per enabled `(size, scale)` policy, covering every
//! active gcid across the whole section being exported.

use anyhow::Context;
use asgen_archive::icon_tarball::{build_tarball, collect_icon_files};
use asgen_icons::policy::IconSizePolicy;
use asgen_utils::atomic_write::write_atomic;
use asgen_utils::paths;
use asgen_utils::types::Gcid;
use camino::Utf8Path;

/// Build and write one tarball per cached policy in `policies`, under
/// `<data_section_dir>/`. `gcids` should already be deduplicated across
/// every package in the section (spec §4.5 step 5).
pub fn write_icon_tarballs(
    export_dir: &Utf8Path,
    suite: &str,
    section: &str,
    media_pool_root: &Utf8Path,
    policies: &[IconSizePolicy],
    gcids: &[Gcid],
) -> anyhow::Result<()> {
    let data_dir = paths::data_section_dir(export_dir, suite, section);
    paths::ensure_dir_all(&data_dir)?;

    for policy in policies {
        if !policy.state.wants_cached() {
            continue;
        }
        let size = policy.width.max(policy.height);
        let size_dir = if policy.scale <= 1 {
            format!("{size}x{size}")
        } else {
            format!("{size}x{size}@{}", policy.scale)
        };
        let files = collect_icon_files(media_pool_root, gcids, &size_dir)?;
        if files.is_empty() {
            continue;
        }
        let tarball = build_tarball(&files).context("building icon tarball")?;
        let path = data_dir.join(paths::icon_tarball_filename(size, policy.scale));
        write_atomic(&path, &tarball)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use asgen_icons::policy::IconPolicyState;
    use tempfile::tempdir;

    #[test]
    fn writes_one_tarball_per_cached_policy() {
        let dir = tempdir().unwrap();
        let root = camino::Utf8Path::from_path(dir.path()).unwrap();
        let gcid = Gcid::from_component_id("org.example.Hello.desktop", "abc123");
        let icon_dir = root.join(gcid.to_string()).join("icons").join("64x64");
        std::fs::create_dir_all(&icon_dir).unwrap();
        std::fs::write(icon_dir.join("hello.png"), b"fakepng").unwrap();

        let export_dir = root.join("export");
        let policies = vec![IconSizePolicy::new(64, 64, 1, IconPolicyState::CachedRemote)];
        write_icon_tarballs(&export_dir, "stable", "main", root, &policies, &[gcid]).unwrap();

        let tarball_path = export_dir.join("data").join("stable").join("main").join("icons-64x64.tar.gz");
        assert!(tarball_path.exists());
    }

    #[test]
    fn remote_only_policy_produces_no_tarball() {
        let dir = tempdir().unwrap();
        let root = camino::Utf8Path::from_path(dir.path()).unwrap();
        let export_dir = root.join("export");
        let policies = vec![IconSizePolicy::new(128, 128, 1, IconPolicyState::RemoteOnly)];
        write_icon_tarballs(&export_dir, "stable", "main", root, &policies, &[]).unwrap();
        assert!(!export_dir.exists() || std::fs::read_dir(export_dir.join("data")).is_err());
    }
}
