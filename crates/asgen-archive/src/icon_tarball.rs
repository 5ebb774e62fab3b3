//! Icon tarballs (spec §6 `icons-<WxH[@s]>.tar.gz`, spec §4.5 step 5):
//! one archive per enabled `(size, scale)`, built by walking the media
//! pool under each active gcid and sorting paths alphabetically so the
//! output is byte-for-byte deterministic.

use crate::compression::gzip;
use anyhow::Context;
use asgen_utils::types::Gcid;
use camino::Utf8Path;
use std::collections::BTreeMap;

/// Read every file under `<media_pool_root>/<gcid>/icons/<size_dir>/`
/// for each of `gcids`, keyed by `<size_dir>/<filename>` so identical
/// basenames across packages collapse to one tarball entry (mirrors the
/// flat `64x64/name.png` layout real AppStream-generator tarballs use).
pub fn collect_icon_files(media_pool_root: &Utf8Path, gcids: &[Gcid], size_dir: &str) -> anyhow::Result<Vec<(String, Vec<u8>)>> {
    let mut files: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    for gcid in gcids {
        let dir = media_pool_root.join(gcid.to_string()).join("icons").join(size_dir);
        let Ok(entries) = std::fs::read_dir(dir.as_std_path()) else {
            continue;
        };
        for entry in entries {
            let entry = entry.context("reading icon directory entry")?;
            if !entry.file_type().context("icon entry file type")?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let bytes = std::fs::read(entry.path()).with_context(|| format!("reading {}", entry.path().display()))?;
            files.insert(format!("{size_dir}/{name}"), bytes);
        }
    }
    Ok(files.into_iter().collect())
}

/// Pack `files` (archive-relative path -> bytes, already in the desired
/// deterministic order) into a gzip-compressed tar archive.
pub fn build_tarball(files: &[(String, Vec<u8>)]) -> anyhow::Result<Vec<u8>> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, bytes) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(bytes.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, &bytes[..]).with_context(|| format!("appending {path} to icon tarball"))?;
    }
    let tar_bytes = builder.into_inner().context("finishing icon tarball")?;
    gzip(&tar_bytes).context("gzip icon tarball")
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn collects_and_dedups_icon_files_across_gcids() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let gcid_a = Gcid::from_component_id("org.example.A.desktop", "aaa");
        let gcid_b = Gcid::from_component_id("org.example.B.desktop", "bbb");

        for gcid in [&gcid_a, &gcid_b] {
            let icon_dir = root.join(gcid.to_string()).join("icons").join("64x64");
            std::fs::create_dir_all(&icon_dir).unwrap();
            std::fs::write(icon_dir.join("shared.png"), b"same-bytes").unwrap();
        }

        let files = collect_icon_files(&root, &[gcid_a, gcid_b], "64x64").unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].0, "64x64/shared.png");
    }

    #[test]
    fn builds_a_valid_gzip_tar_archive() {
        let files = vec![("64x64/a.png".to_string(), b"abc".to_vec())];
        let archive = build_tarball(&files).unwrap();

        let mut decoder = GzDecoder::new(&archive[..]);
        let mut tar_bytes = Vec::new();
        decoder.read_to_end(&mut tar_bytes).unwrap();

        let mut reader = tar::Archive::new(&tar_bytes[..]);
        let mut entries = reader.entries().unwrap();
        let mut entry = entries.next().unwrap().unwrap();
        assert_eq!(entry.path().unwrap().to_str().unwrap(), "64x64/a.png");
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        assert_eq!(content, b"abc");
    }
}
