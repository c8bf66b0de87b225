use super::xobject::{embed_png, encode_png, save_to_bytes};
use crate::constants::{OUTPUT_PDF_VERSION, PAGE_XOBJECT_NAME, SIGNATURE_XOBJECT_PREFIX};
use crate::coords::PdfPlacement;
use crate::placement::resolve_export_page;
use crate::raster::PageImage;
use crate::surface::Stage;
use crate::types::*;
use lopdf::{Dictionary, Document, Object, Stream};

/// Build a new PDF from the page rasters with the signature stamped on.
///
/// One output page per [`PageImage`], in order, each exactly as large as its
/// raster (one point per pixel) and filled edge to edge by it. The signature
/// is captured against `pages` too, so target page and crop always agree.
pub async fn export_with_filters(pages: &[PageImage], stage: &mut Stage) -> Result<Vec<u8>> {
    if pages.is_empty() {
        return Err(SignError::NoPages);
    }

    let overlay = stage.overlay().ok_or(SignError::NoOverlay)?;
    let target_index = resolve_export_page(pages, &overlay.client_rect())?.page_index;

    let (crop, rect) = stage.capture_overlay_on(pages)?;
    let signature_png = encode_png(&crop)?;

    let page_count = pages.len();
    let pages = pages.to_vec();
    let bytes = tokio::task::spawn_blocking(move || {
        let signature = Signature {
            page_index: target_index,
            rect,
            png: signature_png,
        };
        build_document(&pages, &signature)
    })
    .await??;

    log::info!(
        "Rebuilt {}-page document, signature on page {}",
        page_count,
        target_index + 1
    );
    Ok(bytes)
}

struct Signature {
    page_index: usize,
    rect: Rect,
    png: Vec<u8>,
}

fn build_document(pages: &[PageImage], signature: &Signature) -> Result<Vec<u8>> {
    let mut doc = Document::with_version(OUTPUT_PDF_VERSION);
    let pages_id = doc.new_object_id();

    let mut kids = Vec::with_capacity(pages.len());
    for page in pages {
        let (width, height) = (page.width(), page.height());

        let page_png = encode_png(&page.raster)?;
        let raster_id = embed_png(&mut doc, &page_png)?;

        let mut xobjects = Dictionary::new();
        xobjects.set(PAGE_XOBJECT_NAME, Object::Reference(raster_id));
        let mut content = format!(
            "q {} 0 0 {} 0 0 cm /{} Do Q\n",
            width, height, PAGE_XOBJECT_NAME
        );

        if page.page_index == signature.page_index {
            let signature_id = embed_png(&mut doc, &signature.png)?;
            let name = format!("{}0", SIGNATURE_XOBJECT_PREFIX);
            xobjects.set(name.as_bytes(), Object::Reference(signature_id));

            let placement =
                PdfPlacement::from_canvas(&signature.rect, page.vertical_offset, height);
            content.push_str(&format!("q {} /{} Do Q\n", placement.image_matrix(), name));
        }

        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let mut resources = Dictionary::new();
        resources.set("XObject", Object::Dictionary(xobjects));

        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(width),
                    Object::Real(height),
                ]),
            ),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(kids.len() as i64)),
        ("Kids", Object::Array(kids)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);

    save_to_bytes(doc)
}
