use super::PageRasterizer;
use crate::constants::{PDFIUM_VENDOR_DIR, RENDER_SCALE};
use crate::types::*;
use image::RgbaImage;
use pdfium_render::prelude::*;
use std::path::PathBuf;

/// Page rasterizer backed by the pdfium library.
///
/// Each call binds pdfium afresh, so a single instance can be shared by all
/// per-page render tasks.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRasterizer {
    library_dir: Option<PathBuf>,
}

impl PdfiumRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look for the pdfium shared library in `dir` before the default locations
    pub fn with_library_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            library_dir: Some(dir.into()),
        }
    }

    /// Bind pdfium, trying the configured directory, then the vendored
    /// library, then the system library
    fn bind(&self) -> std::result::Result<Pdfium, PdfiumError> {
        let vendor_dir = std::env::current_dir().ok().and_then(|mut p| {
            p.push(PDFIUM_VENDOR_DIR);
            if p.exists() { Some(p) } else { None }
        });

        for dir in self.library_dir.iter().chain(vendor_dir.iter()) {
            if let Ok(binding) =
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            {
                return Ok(Pdfium::new(binding));
            }
        }

        Pdfium::bind_to_system_library().map(Pdfium::new)
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn page_count(&self, pdf: &[u8]) -> Result<usize> {
        let pdfium = self.bind().map_err(render_error)?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(render_error)?;
        Ok(document.pages().len() as usize)
    }

    fn render_page(&self, pdf: &[u8], page_index: usize) -> Result<RgbaImage> {
        let pdfium = self.bind().map_err(render_error)?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(render_error)?;
        let count = document.pages().len() as usize;
        if page_index >= count {
            return Err(SignError::PageOutOfRange {
                index: page_index,
                count,
            });
        }

        let page = document
            .pages()
            .get(page_index as u16)
            .map_err(render_error)?;
        let config = PdfRenderConfig::new().scale_page_by_factor(RENDER_SCALE);
        let bitmap = page.render_with_config(&config).map_err(render_error)?;

        let width = bitmap.width() as u32;
        let height = bitmap.height() as u32;
        RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes().to_vec()).ok_or_else(|| {
            SignError::Render(format!(
                "pdfium returned a short bitmap for page {} ({}x{})",
                page_index, width, height
            ))
        })
    }
}

fn render_error(e: PdfiumError) -> SignError {
    SignError::Render(e.to_string())
}
