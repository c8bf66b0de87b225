//! Signature stamping for PDF documents.
//!
//! The pipeline mirrors what a signing front-end does on screen:
//! 1. Rasterize every page of the source PDF and stack the rasters vertically
//! 2. Place a signature overlay on the stacked pages
//! 3. Optionally run the filter pipeline over the signature or the pages
//! 4. Export either the original PDF with the signature stamped onto it, or a
//!    new PDF rebuilt from the (filtered) page rasters

mod constants;
pub mod coords;
pub mod export;
pub mod filter;
mod io;
mod options;
pub mod placement;
pub mod raster;
pub mod surface;
mod types;

pub use coords::{PdfPlacement, to_pdf_y};
pub use export::{export_with_filters, export_without_filters};
pub use filter::{apply_filters, apply_filters_to_pages, apply_filters_to_signature};
pub use io::{load_pdf, save_pdf};
pub use options::*;
pub use placement::{SignatureOverlay, resolve_export_page, resolve_target_page};
#[cfg(all(feature = "pdfium", not(target_arch = "wasm32")))]
pub use raster::PdfiumRasterizer;
pub use raster::{PageImage, PageRasterizer, rasterize, stack_pages};
pub use surface::{Stage, TransformHandle};
pub use types::*;
