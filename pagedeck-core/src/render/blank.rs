use super::{scaled_pixels, PageRasterizer};
use crate::error::Result;
use crate::pdf;
use image::{DynamicImage, Rgb, RgbImage};
use tracing::trace;

/// Renders white pages with the page's real geometry.
///
/// Used when pdfium is not installed and throughout the tests: dimensions
/// follow the MediaBox and the page's own `/Rotate`, content is not drawn.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlankRasterizer;

impl BlankRasterizer {
    fn render_loaded(doc: &lopdf::Document, page_index: usize, scale: f32) -> Result<DynamicImage> {
        let page_id = pdf::page_object_id(doc, page_index)?;
        let (width, height) = pdf::page_dimensions(doc, page_id)?;

        let (width, height) = if pdf::intrinsic_rotation(doc, page_id).swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        };

        let (px_width, px_height) = (scaled_pixels(width, scale), scaled_pixels(height, scale));
        trace!("Blank render of page {} at {}x{}", page_index + 1, px_width, px_height);

        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            px_width,
            px_height,
            Rgb([255, 255, 255]),
        )))
    }
}

impl PageRasterizer for BlankRasterizer {
    fn render_page(&self, bytes: &[u8], page_index: usize, scale: f32) -> Result<DynamicImage> {
        Self::render_loaded(&pdf::load(bytes)?, page_index, scale)
    }

    fn render_document(&self, bytes: &[u8], scale: f32) -> Result<Vec<DynamicImage>> {
        let doc = pdf::load(bytes)?;
        (0..doc.get_pages().len())
            .map(|index| Self::render_loaded(&doc, index, scale))
            .collect()
    }

    fn name(&self) -> &'static str {
        "blank"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PageDeckError;
    use crate::test_helpers::{pdf_with_sizes, pdf_with_tree_attributes};
    use image::GenericImageView;

    #[test]
    fn test_dimensions_follow_media_box_and_scale() {
        let bytes = pdf_with_sizes(&[(612.0, 792.0), (842.0, 595.0)]);

        let first = BlankRasterizer.render_page(&bytes, 0, 1.0).unwrap();
        assert_eq!(first.dimensions(), (612, 792));

        let second = BlankRasterizer.render_page(&bytes, 1, 2.0).unwrap();
        assert_eq!(second.dimensions(), (1684, 1190));
    }

    #[test]
    fn test_intrinsic_rotation_swaps_dimensions() {
        let bytes = pdf_with_tree_attributes([0.0, 0.0, 300.0, 500.0], 270);
        let page = BlankRasterizer.render_page(&bytes, 0, 1.0).unwrap();
        assert_eq!(page.dimensions(), (500, 300));
    }

    #[test]
    fn test_render_document() {
        let bytes = pdf_with_sizes(&[(100.0, 100.0); 3]);
        let pages = BlankRasterizer.render_document(&bytes, 0.5).unwrap();
        assert_eq!(pages.len(), 3);
        assert!(pages.iter().all(|p| p.dimensions() == (50, 50)));
    }

    #[test]
    fn test_out_of_range_page() {
        let bytes = pdf_with_sizes(&[(100.0, 100.0)]);
        assert!(matches!(
            BlankRasterizer.render_page(&bytes, 3, 1.0),
            Err(PageDeckError::PageIndexOutOfBounds(3, 1))
        ));
    }
}
