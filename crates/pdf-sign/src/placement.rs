//! Signature overlay model and target page resolution

use crate::filter::rotate_expanded;
use crate::raster::PageImage;
use crate::types::*;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::RgbaImage;
use image::imageops::{self, FilterType};

/// A signature image placed on the stage.
///
/// `x`/`y`/`width`/`height` describe the unrotated frame in canvas space;
/// `rotation` turns it clockwise about its top-left corner `(x, y)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureOverlay {
    pub raster: RgbaImage,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Clockwise, in degrees
    pub rotation: f32,
    pub draggable: bool,
    pub resizable: bool,
}

impl SignatureOverlay {
    /// Wrap a raster at its natural size in the stage's top-left corner
    pub fn from_image(raster: RgbaImage) -> Self {
        let (width, height) = raster.dimensions();
        Self {
            raster,
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            rotation: 0.0,
            draggable: true,
            resizable: true,
        }
    }

    /// Decode an encoded image (PNG or any format the `image` crate was built with)
    pub fn from_encoded(bytes: &[u8]) -> Result<Self> {
        let raster = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Self::from_image(raster))
    }

    /// Decode a base64 `data:` URL such as `data:image/png;base64,iVBOR...`
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| SignError::Config("Not a data URL".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| SignError::Config("Data URL has no payload".to_string()))?;
        if !header.ends_with(";base64") {
            return Err(SignError::Config(
                "Only base64-encoded data URLs are supported".to_string(),
            ));
        }
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| SignError::Config(format!("Invalid base64 payload: {}", e)))?;
        Self::from_encoded(&bytes)
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Drag to an absolute position. Returns false if the overlay is pinned.
    pub fn move_to(&mut self, x: f32, y: f32) -> bool {
        if !self.draggable {
            return false;
        }
        self.x = x;
        self.y = y;
        true
    }

    /// Drag by a relative offset. Returns false if the overlay is pinned.
    pub fn move_by(&mut self, dx: f32, dy: f32) -> bool {
        self.move_to(self.x + dx, self.y + dy)
    }

    /// Resize the frame. Returns false if resizing is disabled or the size is empty.
    pub fn resize(&mut self, width: f32, height: f32) -> bool {
        if !self.resizable || width <= 0.0 || height <= 0.0 {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }

    /// Axis-aligned bounds on the stage, including rotation about `(x, y)`
    pub fn client_rect(&self) -> Rect {
        if self.rotation % 360.0 == 0.0 {
            return Rect::new(self.x, self.y, self.width, self.height);
        }

        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let corners = [
            (0.0, 0.0),
            (self.width, 0.0),
            (0.0, self.height),
            (self.width, self.height),
        ]
        .map(|(lx, ly)| (lx * cos - ly * sin, lx * sin + ly * cos));

        let min_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min);
        let max_x = corners.iter().map(|c| c.0).fold(f32::NEG_INFINITY, f32::max);
        let min_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min);
        let max_y = corners.iter().map(|c| c.1).fold(f32::NEG_INFINITY, f32::max);
        Rect::new(
            self.x + min_x,
            self.y + min_y,
            max_x - min_x,
            max_y - min_y,
        )
    }

    /// The raster as it appears on the stage: scaled to the frame, then rotated
    pub fn display_raster(&self) -> RgbaImage {
        let (width, height) = (
            self.width.round().max(1.0) as u32,
            self.height.round().max(1.0) as u32,
        );
        let scaled = if self.raster.dimensions() == (width, height) {
            self.raster.clone()
        } else {
            imageops::resize(&self.raster, width, height, FilterType::Triangle)
        };

        if self.rotation % 360.0 == 0.0 {
            scaled
        } else {
            rotate_expanded(&scaled, self.rotation)
        }
    }
}

/// Find the page whose vertical span `[y, y + height)` contains the top edge
/// of `overlay`, scanning in ascending page order.
pub fn resolve_target_page<'a>(pages: &'a [PageImage], overlay: &Rect) -> Result<&'a PageImage> {
    pages
        .iter()
        .filter(|page| page.bounds().contains_y(overlay.y))
        .min_by_key(|page| page.page_index)
        .ok_or_else(|| {
            log::error!("Could not determine which page the image is on.");
            SignError::PageNotFound {
                overlay_y: overlay.y,
            }
        })
}

/// Like [`resolve_target_page`], but rejects an overlay that reaches into a
/// second page. The exporters stamp onto a single page only.
pub fn resolve_export_page<'a>(pages: &'a [PageImage], overlay: &Rect) -> Result<&'a PageImage> {
    let target = resolve_target_page(pages, overlay)?;

    let straddles = pages.iter().any(|page| {
        page.page_index != target.page_index
            && page.vertical_offset < overlay.bottom()
            && overlay.y < page.bounds().bottom()
    });
    if straddles {
        log::error!(
            "Signature spans more than one page (starts on page {})",
            target.page_index
        );
        return Err(SignError::OverlayStraddlesPages {
            page_index: target.page_index,
        });
    }

    Ok(target)
}
