//! Page rasterization
//!
//! Every page is rendered on its own blocking task; once all of them have
//! finished the rasters are put back in page order and stacked vertically.

#[cfg(all(feature = "pdfium", not(target_arch = "wasm32")))]
mod pdfium;

#[cfg(all(feature = "pdfium", not(target_arch = "wasm32")))]
pub use pdfium::PdfiumRasterizer;

use crate::types::*;
use image::RgbaImage;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Renders PDF pages to RGBA rasters.
///
/// Implementations are shared across the per-page render tasks, so they must
/// be `Send + Sync`. Rasters are expected at 1 pixel per point.
pub trait PageRasterizer: Send + Sync + 'static {
    fn page_count(&self, pdf: &[u8]) -> Result<usize>;

    fn render_page(&self, pdf: &[u8], page_index: usize) -> Result<RgbaImage>;
}

/// One rendered page, positioned in the stacked canvas space
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    pub raster: RgbaImage,
    pub page_index: usize,
    /// Sum of the heights of all preceding pages
    pub vertical_offset: f32,
}

impl PageImage {
    pub fn width(&self) -> f32 {
        self.raster.width() as f32
    }

    pub fn height(&self) -> f32 {
        self.raster.height() as f32
    }

    /// Bounds on the stage; pages are always flush left
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, self.vertical_offset, self.width(), self.height())
    }
}

/// Render every page of `pdf` and stack the results.
///
/// Fails as a whole if any page fails; no partial result is returned.
pub async fn rasterize<R: PageRasterizer + ?Sized>(
    rasterizer: Arc<R>,
    pdf: Arc<[u8]>,
) -> Result<Vec<PageImage>> {
    let page_count = {
        let rasterizer = Arc::clone(&rasterizer);
        let pdf = Arc::clone(&pdf);
        tokio::task::spawn_blocking(move || rasterizer.page_count(&pdf)).await??
    };

    if page_count == 0 {
        return Err(SignError::NoPages);
    }

    let mut tasks = JoinSet::new();
    for page_index in 0..page_count {
        let rasterizer = Arc::clone(&rasterizer);
        let pdf = Arc::clone(&pdf);
        tasks.spawn_blocking(move || {
            rasterizer
                .render_page(&pdf, page_index)
                .map(|raster| (page_index, raster))
        });
    }

    let mut rendered = Vec::with_capacity(page_count);
    while let Some(joined) = tasks.join_next().await {
        let (page_index, raster) = joined??;
        log::debug!(
            "Rendered page {} ({}x{})",
            page_index,
            raster.width(),
            raster.height()
        );
        rendered.push((page_index, raster));
    }

    log::info!("Rasterized {} pages", rendered.len());
    Ok(stack_pages(rendered))
}

/// Order rasters by page index and assign each its cumulative vertical offset
pub fn stack_pages(mut rendered: Vec<(usize, RgbaImage)>) -> Vec<PageImage> {
    rendered.sort_by_key(|(page_index, _)| *page_index);
    rendered
        .into_iter()
        .scan(0.0_f32, |offset, (page_index, raster)| {
            let vertical_offset = *offset;
            *offset += raster.height() as f32;
            Some(PageImage {
                raster,
                page_index,
                vertical_offset,
            })
        })
        .collect()
}

/// Re-stack already rendered pages, keeping their order and indices
pub(crate) fn restack(pages: Vec<PageImage>) -> Vec<PageImage> {
    stack_pages(
        pages
            .into_iter()
            .map(|page| (page.page_index, page.raster))
            .collect(),
    )
}
