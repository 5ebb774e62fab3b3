//! Pixel-work capability boundary (SPEC_FULL.md §4.3 AMBIENT).
//!
//! Image codec work is out of scope for the core (spec §1 Non-goals);
//! `IconHandler` never decodes or re-encodes pixels itself. `IconRenderer`
//! is the injected capability, mirroring `Composer` and
//! `PackageIndex`/`Package`. `PngIconRenderer` probes real raster
//! dimensions with the `png` crate and treats rescaling/SVG rendering as
//! a pass-through, since no SVG rasterizer is present in the retrieved
//! corpus.

/// Renders or rescales icon bytes. Implementations may be backed by a
/// real image library; the default ships no true rendering.
pub trait IconRenderer: Send + Sync {
    /// Probe a raster image's pixel dimensions without fully decoding it.
    fn raster_dimensions(&self, bytes: &[u8]) -> Option<(u32, u32)>;

    /// Render/rescale a raster image to exactly `target_w x target_h`.
    fn render_raster(&self, bytes: &[u8], target_w: u32, target_h: u32) -> Vec<u8>;

    /// Render an SVG/SVGZ source to a raster image at `target_w x target_h`.
    fn render_svg(&self, bytes: &[u8], target_w: u32, target_h: u32) -> Vec<u8>;
}

/// Default `IconRenderer`: real dimension probing for PNG via the `png`
/// crate; everything else is a documented pass-through.
#[derive(Debug, Default)]
pub struct PngIconRenderer;

impl IconRenderer for PngIconRenderer {
    fn raster_dimensions(&self, bytes: &[u8]) -> Option<(u32, u32)> {
        let decoder = png::Decoder::new(bytes);
        let reader = decoder.read_info().ok()?;
        let info = reader.info();
        Some((info.width, info.height))
    }

    fn render_raster(&self, bytes: &[u8], _target_w: u32, _target_h: u32) -> Vec<u8> {
        bytes.to_vec()
    }

    fn render_svg(&self, bytes: &[u8], _target_w: u32, _target_h: u32) -> Vec<u8> {
        bytes.to_vec()
    }
}
