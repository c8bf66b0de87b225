use super::xobject::{
    add_xobject_to_page, embed_png, encode_png, media_box, page_ids, save_to_bytes, stamp_xobject,
};
use crate::coords::PdfPlacement;
use crate::placement::resolve_export_page;
use crate::raster::PageImage;
use crate::surface::Stage;
use crate::types::*;
use lopdf::Document;

/// Stamp the stage's signature onto the original PDF.
///
/// The signature is pixel-cropped from a redraw of the overlay over `pages`
/// (selection frame hidden), PNG-encoded, and drawn onto the page its top
/// edge falls on. `pages` should be the unfiltered rasters, since those line
/// up with the original document; the stage's own page layer is not used.
pub async fn export_without_filters(
    pdf: &[u8],
    pages: &[PageImage],
    stage: &mut Stage,
) -> Result<Vec<u8>> {
    let overlay = stage.overlay().ok_or(SignError::NoOverlay)?;
    let target = resolve_export_page(pages, &overlay.client_rect())?;
    let (page_index, page_y) = (target.page_index, target.vertical_offset);

    let (crop, rect) = stage.capture_overlay_on(pages)?;
    let png = encode_png(&crop)?;
    log::debug!(
        "Captured {}x{} signature for page {}",
        crop.width(),
        crop.height(),
        page_index
    );

    let pdf = pdf.to_vec();
    let bytes = tokio::task::spawn_blocking(move || {
        let mut doc = Document::load_mem(&pdf)?;
        let ids = page_ids(&doc);
        let page_id = *ids.get(page_index).ok_or(SignError::PageOutOfRange {
            index: page_index,
            count: ids.len(),
        })?;

        let [x0, y0, _, y1] = media_box(&doc, page_id)?;
        let placement = PdfPlacement::from_canvas(&rect, page_y, y1 - y0).offset(x0, y0);

        let image_id = embed_png(&mut doc, &png)?;
        let name = add_xobject_to_page(&mut doc, page_id, image_id)?;
        stamp_xobject(&mut doc, page_id, &name, &placement)?;

        save_to_bytes(doc)
    })
    .await??;

    log::info!("Signed page {} of original document", page_index + 1);
    Ok(bytes)
}
