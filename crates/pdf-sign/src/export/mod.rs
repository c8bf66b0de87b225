//! PDF export
//!
//! Two paths, both all-or-nothing:
//! - [`export_without_filters`] stamps the captured signature onto the
//!   original document's target page
//! - [`export_with_filters`] rebuilds a document from the rendered page
//!   rasters and stamps the signature onto the target page's raster page

mod original;
mod rebuild;
mod xobject;

pub use original::export_without_filters;
pub use rebuild::export_with_filters;
