//! The rendering surface: a page layer with at most one signature overlay
//! and the selection frame bound to it.

use crate::constants::{HANDLE_STROKE, HANDLE_STROKE_WIDTH, STAGE_BACKGROUND};
use crate::placement::{SignatureOverlay, resolve_export_page, resolve_target_page};
use crate::raster::PageImage;
use crate::types::*;
use image::{Rgba, RgbaImage, imageops};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect as PixelRect;

/// Selection frame drawn around the attached overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformHandle {
    pub visible: bool,
    pub stroke: Rgba<u8>,
    pub stroke_width: u32,
}

impl Default for TransformHandle {
    fn default() -> Self {
        Self {
            visible: true,
            stroke: HANDLE_STROKE,
            stroke_width: HANDLE_STROKE_WIDTH,
        }
    }
}

#[derive(Debug, Clone)]
struct AttachedOverlay {
    overlay: SignatureOverlay,
    handle: TransformHandle,
}

/// Stacked pages plus the signature overlay, composited on demand
#[derive(Debug, Clone, Default)]
pub struct Stage {
    pages: Vec<PageImage>,
    attached: Option<AttachedOverlay>,
}

impl Stage {
    pub fn new(pages: Vec<PageImage>) -> Self {
        Self {
            pages,
            attached: None,
        }
    }

    /// Replace the page layer, returning the previous pages
    pub fn set_pages(&mut self, pages: Vec<PageImage>) -> Vec<PageImage> {
        std::mem::replace(&mut self.pages, pages)
    }

    pub fn pages(&self) -> &[PageImage] {
        &self.pages
    }

    /// Widest page by total stacked height
    pub fn size(&self) -> (u32, u32) {
        stack_size(&self.pages)
    }

    /// Attach an overlay with a fresh selection frame, returning the one it replaces
    pub fn attach_overlay(&mut self, overlay: SignatureOverlay) -> Option<SignatureOverlay> {
        self.attached
            .replace(AttachedOverlay {
                overlay,
                handle: TransformHandle::default(),
            })
            .map(|previous| previous.overlay)
    }

    pub fn detach_overlay(&mut self) -> Option<SignatureOverlay> {
        self.attached.take().map(|attached| attached.overlay)
    }

    pub fn overlay(&self) -> Option<&SignatureOverlay> {
        self.attached.as_ref().map(|a| &a.overlay)
    }

    pub fn overlay_mut(&mut self) -> Option<&mut SignatureOverlay> {
        self.attached.as_mut().map(|a| &mut a.overlay)
    }

    pub fn handle(&self) -> Option<&TransformHandle> {
        self.attached.as_ref().map(|a| &a.handle)
    }

    pub fn handle_mut(&mut self) -> Option<&mut TransformHandle> {
        self.attached.as_mut().map(|a| &mut a.handle)
    }

    /// The page the overlay's top edge currently falls on
    pub fn target_page(&self) -> Result<&PageImage> {
        let overlay = self.overlay().ok_or(SignError::NoOverlay)?;
        resolve_target_page(&self.pages, &overlay.client_rect())
    }

    /// The page the overlay will be stamped onto; fails if it spans two pages
    pub fn export_page(&self) -> Result<&PageImage> {
        let overlay = self.overlay().ok_or(SignError::NoOverlay)?;
        resolve_export_page(&self.pages, &overlay.client_rect())
    }

    /// Redraw the whole stage: pages, overlay, then the selection frame if visible
    pub fn composite(&self) -> RgbaImage {
        self.composite_on(&self.pages)
    }

    /// Pixel-crop the overlay's bounds out of a redraw with the selection
    /// frame hidden. The frame's visibility is restored afterwards.
    ///
    /// Parts of the bounds that fall outside the stage come back transparent.
    pub fn capture_overlay(&mut self) -> Result<(RgbaImage, Rect)> {
        let pages = std::mem::take(&mut self.pages);
        let captured = self.capture_overlay_on(&pages);
        self.pages = pages;
        captured
    }

    /// Like [`Stage::capture_overlay`], but redraws the overlay over `pages`
    /// instead of the stage's own page layer. Exporters use this so the crop
    /// and the target page come from the same page list.
    pub fn capture_overlay_on(&mut self, pages: &[PageImage]) -> Result<(RgbaImage, Rect)> {
        let attached = self.attached.as_mut().ok_or(SignError::NoOverlay)?;
        let rect = attached.overlay.client_rect();
        let was_visible = std::mem::replace(&mut attached.handle.visible, false);

        let canvas = self.composite_on(pages);

        if let Some(attached) = self.attached.as_mut() {
            attached.handle.visible = was_visible;
        }

        let (x, y, width, height) = rect.to_pixels();
        if width == 0 || height == 0 {
            return Err(SignError::Render(format!(
                "Signature has an empty capture area ({}x{})",
                rect.width, rect.height
            )));
        }

        let mut crop = RgbaImage::new(width, height);
        imageops::replace(&mut crop, &canvas, -x, -y);
        Ok((crop, rect))
    }

    fn composite_on(&self, pages: &[PageImage]) -> RgbaImage {
        let (width, height) = stack_size(pages);
        let mut canvas = RgbaImage::from_pixel(width, height, STAGE_BACKGROUND);

        for page in pages {
            imageops::overlay(
                &mut canvas,
                &page.raster,
                0,
                page.vertical_offset.round() as i64,
            );
        }

        if let Some(attached) = &self.attached {
            let rect = attached.overlay.client_rect();
            let (x, y, _, _) = rect.to_pixels();
            imageops::overlay(&mut canvas, &attached.overlay.display_raster(), x, y);

            if attached.handle.visible {
                draw_frame(&mut canvas, &rect, &attached.handle);
            }
        }

        canvas
    }
}

fn stack_size(pages: &[PageImage]) -> (u32, u32) {
    let width = pages.iter().map(|p| p.raster.width()).max().unwrap_or(0);
    let height = pages.iter().map(|p| p.raster.height()).sum();
    (width, height)
}

/// Stroke the outline of `rect` onto the canvas, one inset ring per pixel of
/// stroke width. imageproc clips anything off the canvas.
fn draw_frame(canvas: &mut RgbaImage, rect: &Rect, handle: &TransformHandle) {
    let (x, y, width, height) = rect.to_pixels();
    let (x, y) = (x as i32, y as i32);

    for t in 0..handle.stroke_width.max(1) {
        let inset = 2 * t;
        if width <= inset || height <= inset {
            break;
        }
        draw_hollow_rect_mut(
            canvas,
            PixelRect::at(x + t as i32, y + t as i32).of_size(width - inset, height - inset),
            handle.stroke,
        );
    }
}
