//! Canvas ↔ PDF coordinate translation
//!
//! Canvas space has its origin at the top-left of the stacked pages with y
//! growing downward. PDF user space has its origin at the bottom-left of each
//! page with y growing upward. Only the vertical axis flips.

use crate::types::Rect;

/// Where an image lands on a PDF page, in PDF user space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfPlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PdfPlacement {
    /// Place a canvas-space rectangle on a page of height `page_height` whose
    /// top edge sits at `page_canvas_y` on the stage.
    pub fn from_canvas(rect: &Rect, page_canvas_y: f32, page_height: f32) -> Self {
        Self {
            x: rect.x,
            y: to_pdf_y(page_height, rect.y, page_canvas_y, rect.height),
            width: rect.width,
            height: rect.height,
        }
    }

    /// Shift by the lower-left corner of a MediaBox that does not start at the origin
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// `cm` operands that map the unit square onto this placement
    pub fn image_matrix(&self) -> String {
        format!("{} 0 0 {} {} {} cm", self.width, self.height, self.x, self.y)
    }
}

/// Bottom edge of the overlay in PDF space:
/// `page_height - (overlay_y - page_y + overlay_height)`
pub fn to_pdf_y(page_height: f32, overlay_y: f32, page_y: f32, overlay_height: f32) -> f32 {
    page_height - (overlay_y - page_y + overlay_height)
}
