//! Page rasterization
//!
//! Rendering goes through [`PageRasterizer`] so the pipeline works the same
//! whether a pdfium library is available or not. Rendered pages always come
//! back upright: the page's own `/Rotate` is applied, user rotations are not.

mod blank;
#[cfg(feature = "pdfium")]
mod pdfium;

pub use blank::BlankRasterizer;
#[cfg(feature = "pdfium")]
pub use self::pdfium::PdfiumRasterizer;

use crate::error::Result;
use image::DynamicImage;

pub trait PageRasterizer {
    /// Render one page (zero-based) of an in-memory PDF at `scale` pixels per point.
    fn render_page(&self, pdf: &[u8], page_index: usize, scale: f32) -> Result<DynamicImage>;

    /// Render every page of a document in order.
    fn render_document(&self, pdf: &[u8], scale: f32) -> Result<Vec<DynamicImage>> {
        let count = crate::pdf::page_count(pdf)?;
        (0..count)
            .map(|index| self.render_page(pdf, index, scale))
            .collect()
    }

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// The best rasterizer available at runtime.
///
/// With the `pdfium` feature this binds the pdfium shared library, falling
/// back to [`BlankRasterizer`] when no library can be found.
pub fn default_rasterizer() -> Box<dyn PageRasterizer> {
    #[cfg(feature = "pdfium")]
    {
        match PdfiumRasterizer::bind() {
            Ok(rasterizer) => return Box::new(rasterizer),
            Err(e) => tracing::warn!("pdfium unavailable, previews will be blank: {e}"),
        }
    }
    Box::new(BlankRasterizer)
}

/// Pixel size of a page `points` long at `scale`, never zero.
pub(crate) fn scaled_pixels(points: f32, scale: f32) -> u32 {
    ((points * scale).round() as u32).max(1)
}
