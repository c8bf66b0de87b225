//! Shared constants for rasterizing and stamping
//!
//! Canvas units and PDF points are the same size: pages are rendered at
//! scale 1, so one raster pixel covers one point.

use image::Rgba;

// =============================================================================
// Rendering
// =============================================================================

/// Scale factor applied when rendering pages (1:1 with the default viewport)
pub const RENDER_SCALE: f32 = 1.0;

/// Vendored pdfium location, relative to the working directory
pub const PDFIUM_VENDOR_DIR: &str = "vendor/pdfium/lib";

/// Stage background behind and between pages
pub const STAGE_BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 0]);

// =============================================================================
// Transform Handle
// =============================================================================

/// Stroke colour of the selection frame drawn around the attached overlay
pub const HANDLE_STROKE: Rgba<u8> = Rgba([0, 161, 255, 255]);

/// Stroke width of the selection frame, in pixels
pub const HANDLE_STROKE_WIDTH: u32 = 1;

// =============================================================================
// Filters
// =============================================================================

/// Contrast range accepted by the filter pipeline
pub const CONTRAST_RANGE: (f32, f32) = (-100.0, 100.0);

/// Brightness range accepted by the filter pipeline
pub const BRIGHTNESS_RANGE: (f32, f32) = (-1.0, 1.0);

/// Gaussian sigma per unit of blur radius
pub const BLUR_SIGMA_PER_RADIUS: f32 = 0.5;

// =============================================================================
// PDF Output
// =============================================================================

/// MediaBox assumed when a page has none (US Letter)
pub const DEFAULT_PAGE_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// PDF version written by the rebuild exporter
pub const OUTPUT_PDF_VERSION: &str = "1.7";

/// Resource name prefix for embedded signature images
pub const SIGNATURE_XOBJECT_PREFIX: &str = "Sig";

/// Resource name for the full-page raster in rebuilt documents
pub const PAGE_XOBJECT_NAME: &str = "Page0";
