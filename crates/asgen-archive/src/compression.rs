//! Compression for exported artifacts (spec §6: catalog/hints files
//! ship as `.gz` or `.xz`; icon tarballs and CID-Index as `.gz`).
//!
//! Only gzip is implemented. The retrieved corpus carries `flate2` but
//! no xz/lzma crate, so the `.xz` catalog/hints variant named in spec
//! §6 is dropped — every compressed artifact this crate produces is
//! `.gz` (see DESIGN.md).

use flate2::write::GzEncoder;
use flate2::Compression as GzLevel;
use std::io::Write;

/// Gzip `bytes` at the default compression level.
pub fn gzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), GzLevel::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn gzip_round_trips() {
        let original = b"hello world ".repeat(200);
        let compressed = gzip(&original).unwrap();
        assert!(compressed.len() < original.len());

        let mut decoder = GzDecoder::new(&compressed[..]);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        assert_eq!(out, original);
    }
}
