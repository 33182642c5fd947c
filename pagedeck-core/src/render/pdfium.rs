use super::PageRasterizer;
use crate::error::{PageDeckError, Result};
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// Rasterizer backed by a pdfium shared library bound at runtime.
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
}

impl PdfiumRasterizer {
    /// Bind pdfium from the working directory, then from the system search path.
    pub fn bind() -> Result<Self> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| PageDeckError::Render(format!("failed to bind pdfium: {e}")))?;

        info!("pdfium library bound");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    fn load<'a>(&'a self, bytes: &'a [u8]) -> Result<PdfDocument<'a>> {
        self.pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| PageDeckError::Render(format!("failed to open PDF: {e:?}")))
    }

    fn render(page: &PdfPage, page_index: usize, scale: f32) -> Result<DynamicImage> {
        let config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page.render_with_config(&config).map_err(|e| {
            PageDeckError::Render(format!("failed to render page {}: {e:?}", page_index + 1))
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} -> {}x{} px",
            page_index + 1,
            image.width(),
            image.height()
        );
        Ok(image)
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn render_page(&self, bytes: &[u8], page_index: usize, scale: f32) -> Result<DynamicImage> {
        let document = self.load(bytes)?;
        let pages = document.pages();
        let total = pages.len() as usize;
        if page_index >= total {
            return Err(PageDeckError::PageIndexOutOfBounds(page_index, total));
        }

        let page = pages.get(page_index as u16).map_err(|e| {
            PageDeckError::Render(format!("failed to load page {}: {e:?}", page_index + 1))
        })?;
        Self::render(&page, page_index, scale)
    }

    fn render_document(&self, bytes: &[u8], scale: f32) -> Result<Vec<DynamicImage>> {
        let document = self.load(bytes)?;
        document
            .pages()
            .iter()
            .enumerate()
            .map(|(index, page)| Self::render(&page, index, scale))
            .collect()
    }

    fn name(&self) -> &'static str {
        "pdfium"
    }
}
