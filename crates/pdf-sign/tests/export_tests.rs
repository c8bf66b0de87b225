mod common;

use common::*;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdf_sign::*;
use std::sync::Arc;

fn page_dict(doc: &Document, page_number: u32) -> &Dictionary {
    let page_id = doc.get_pages()[&page_number];
    doc.get_dictionary(page_id).unwrap()
}

fn xobject_names(doc: &Document, page_number: u32) -> Vec<String> {
    let resources = page_dict(doc, page_number)
        .get(b"Resources")
        .unwrap()
        .as_dict()
        .unwrap();
    match resources.get(b"XObject") {
        Ok(xobjects) => xobjects
            .as_dict()
            .unwrap()
            .iter()
            .map(|(name, _)| String::from_utf8_lossy(name).into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn stream_text(doc: &Document, id: ObjectId) -> String {
    let stream = doc.get_object(id).unwrap().as_stream().unwrap();
    String::from_utf8_lossy(&stream.content).into_owned()
}

fn media_box(doc: &Document, page_number: u32) -> Vec<f32> {
    page_dict(doc, page_number)
        .get(b"MediaBox")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n.as_float().unwrap())
        .collect()
}

async fn two_page_session() -> (Vec<u8>, Vec<PageImage>, Stage) {
    let pdf = create_test_pdf(&[(600, 800), (600, 1000)]);
    let pages = rasterize(Arc::new(BlankRasterizer), Arc::from(pdf.clone()))
        .await
        .unwrap();
    let mut stage = Stage::new(pages.clone());
    stage.attach_overlay(red_signature(100.0, 850.0, 80, 50));
    (pdf, pages, stage)
}

// =============================================================================
// Export Without Filters
// =============================================================================

#[tokio::test]
async fn test_export_stamps_signature_on_second_page() {
    let (pdf, pages, mut stage) = two_page_session().await;

    let bytes = export_without_filters(&pdf, &pages, &mut stage)
        .await
        .unwrap();
    let doc = Document::load_mem(&bytes).unwrap();

    assert_eq!(doc.get_pages().len(), 2);
    assert!(xobject_names(&doc, 1).is_empty());
    assert_eq!(xobject_names(&doc, 2), vec!["Sig0".to_string()]);

    let contents = page_dict(&doc, 2)
        .get(b"Contents")
        .unwrap()
        .as_array()
        .unwrap();
    assert_eq!(contents.len(), 3);

    assert_eq!(stream_text(&doc, contents[0].as_reference().unwrap()), "q\n");
    assert_eq!(
        stream_text(&doc, contents[1].as_reference().unwrap()),
        "q Q"
    );
    let stamp = stream_text(&doc, contents[2].as_reference().unwrap());
    assert!(stamp.contains("80 0 0 50 100 900 cm"), "stamp was {:?}", stamp);
    assert!(stamp.contains("/Sig0 Do"));
}

#[tokio::test]
async fn test_export_embeds_signature_image() {
    let (pdf, pages, mut stage) = two_page_session().await;

    let bytes = export_without_filters(&pdf, &pages, &mut stage)
        .await
        .unwrap();
    let doc = Document::load_mem(&bytes).unwrap();

    let image_id = page_dict(&doc, 2)
        .get(b"Resources")
        .and_then(|r| r.as_dict())
        .and_then(|r| r.get(b"XObject"))
        .and_then(|x| x.as_dict())
        .and_then(|x| x.get(b"Sig0"))
        .and_then(|s| s.as_reference())
        .unwrap();
    let image = doc.get_object(image_id).unwrap().as_stream().unwrap();

    assert_eq!(image.dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Image");
    assert_eq!(image.dict.get(b"Width").unwrap().as_i64().unwrap(), 80);
    assert_eq!(image.dict.get(b"Height").unwrap().as_i64().unwrap(), 50);
    // Fully opaque capture, so no soft mask
    assert!(image.dict.get(b"SMask").is_err());
}

#[tokio::test]
async fn test_export_restores_selection_frame() {
    let (pdf, pages, mut stage) = two_page_session().await;
    assert!(stage.handle().unwrap().visible);

    export_without_filters(&pdf, &pages, &mut stage)
        .await
        .unwrap();

    assert!(stage.handle().unwrap().visible);
    assert_eq!(stage.overlay().unwrap().y, 850.0);
}

fn signature_pixels(doc: &Document, page_number: u32) -> Vec<u8> {
    let image_id = page_dict(doc, page_number)
        .get(b"Resources")
        .and_then(|r| r.as_dict())
        .and_then(|r| r.get(b"XObject"))
        .and_then(|x| x.as_dict())
        .and_then(|x| x.get(b"Sig0"))
        .and_then(|s| s.as_reference())
        .unwrap();
    let image = doc.get_object(image_id).unwrap().as_stream().unwrap();
    image.decompressed_content().unwrap()
}

#[tokio::test]
async fn test_export_captures_against_the_given_pages() {
    let pdf = create_test_pdf(&[(600, 800), (600, 1000)]);
    let pages = rasterize(Arc::new(BlankRasterizer), Arc::from(pdf.clone()))
        .await
        .unwrap();

    let mut raster = image::RgbaImage::from_pixel(80, 50, image::Rgba([255, 0, 0, 255]));
    raster.put_pixel(0, 0, image::Rgba([0, 0, 0, 0]));
    let overlay = SignatureOverlay::from_image(raster).with_position(100.0, 850.0);

    // The stage shows a single tall page in a different colour
    let mut stage = Stage::new(solid_pages(&[(600, 1800)]));
    stage.attach_overlay(overlay);

    let bytes = export_without_filters(&pdf, &pages, &mut stage)
        .await
        .unwrap();
    let doc = Document::load_mem(&bytes).unwrap();

    assert_eq!(xobject_names(&doc, 2), vec!["Sig0".to_string()]);
    let pixels = signature_pixels(&doc, 2);
    assert_eq!(&pixels[..3], &page_colour(1).0[..3]);
    assert_eq!(&pixels[3..6], &[255, 0, 0]);

    // The stage keeps its own page layer
    assert_eq!(stage.size(), (600, 1800));
    assert!(stage.handle().unwrap().visible);
}

#[tokio::test]
async fn test_export_fails_when_overlay_is_off_the_pages() {
    let (pdf, pages, mut stage) = two_page_session().await;
    stage.overlay_mut().unwrap().move_to(100.0, 2000.0);

    let result = export_without_filters(&pdf, &pages, &mut stage).await;
    assert!(matches!(result, Err(SignError::PageNotFound { .. })));
}

#[tokio::test]
async fn test_export_fails_when_overlay_straddles_pages() {
    let (pdf, pages, mut stage) = two_page_session().await;
    stage.overlay_mut().unwrap().move_to(100.0, 780.0);

    let result = export_without_filters(&pdf, &pages, &mut stage).await;
    assert!(matches!(
        result,
        Err(SignError::OverlayStraddlesPages { page_index: 0 })
    ));
}

#[tokio::test]
async fn test_export_without_overlay() {
    let (pdf, pages, mut stage) = two_page_session().await;
    stage.detach_overlay();

    let result = export_without_filters(&pdf, &pages, &mut stage).await;
    assert!(matches!(result, Err(SignError::NoOverlay)));
}

#[tokio::test]
async fn test_export_twice_picks_fresh_names() {
    let (pdf, pages, mut stage) = two_page_session().await;

    let once = export_without_filters(&pdf, &pages, &mut stage)
        .await
        .unwrap();
    let twice = export_without_filters(&once, &pages, &mut stage)
        .await
        .unwrap();
    let doc = Document::load_mem(&twice).unwrap();

    let mut names = xobject_names(&doc, 2);
    names.sort();
    assert_eq!(names, vec!["Sig0".to_string(), "Sig1".to_string()]);
}

/// One page whose MediaBox is inherited from the page tree and does not
/// start at the origin
fn offset_media_box_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));
    let page_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        ("Contents", Object::Reference(content_id)),
    ]));
    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(vec![Object::Reference(page_id)])),
            ("Count", Object::Integer(1)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(10),
                    Object::Integer(20),
                    Object::Integer(410),
                    Object::Integer(520),
                ]),
            ),
        ])),
    );
    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

#[tokio::test]
async fn test_export_respects_inherited_media_box_origin() {
    let pdf = offset_media_box_pdf();
    let pages = solid_pages(&[(400, 500)]);
    let mut stage = Stage::new(pages.clone());
    stage.attach_overlay(red_signature(30.0, 100.0, 40, 20));

    let bytes = export_without_filters(&pdf, &pages, &mut stage)
        .await
        .unwrap();
    let doc = Document::load_mem(&bytes).unwrap();

    let contents = page_dict(&doc, 1)
        .get(b"Contents")
        .unwrap()
        .as_array()
        .unwrap();
    let stamp = stream_text(&doc, contents.last().unwrap().as_reference().unwrap());
    // x = 30 + 10, y = 500 - (100 + 20) + 20
    assert!(stamp.contains("40 0 0 20 40 400 cm"), "stamp was {:?}", stamp);
}

// =============================================================================
// Export With Filters
// =============================================================================

#[tokio::test]
async fn test_rebuild_has_one_page_per_raster() {
    let (_, pages, mut stage) = two_page_session().await;

    let bytes = export_with_filters(&pages, &mut stage).await.unwrap();
    let doc = Document::load_mem(&bytes).unwrap();

    assert_eq!(doc.get_pages().len(), 2);
    assert_eq!(media_box(&doc, 1), vec![0.0, 0.0, 600.0, 800.0]);
    assert_eq!(media_box(&doc, 2), vec![0.0, 0.0, 600.0, 1000.0]);

    assert_eq!(xobject_names(&doc, 1), vec!["Page0".to_string()]);
    let mut names = xobject_names(&doc, 2);
    names.sort();
    assert_eq!(names, vec!["Page0".to_string(), "Sig0".to_string()]);
}

#[tokio::test]
async fn test_rebuild_draws_page_then_signature() {
    let (_, pages, mut stage) = two_page_session().await;

    let bytes = export_with_filters(&pages, &mut stage).await.unwrap();
    let doc = Document::load_mem(&bytes).unwrap();

    let first = page_dict(&doc, 1).get(b"Contents").unwrap().as_reference().unwrap();
    assert_eq!(stream_text(&doc, first), "q 600 0 0 800 0 0 cm /Page0 Do Q\n");

    let second = page_dict(&doc, 2).get(b"Contents").unwrap().as_reference().unwrap();
    let text = stream_text(&doc, second);
    let page_at = text.find("/Page0 Do").unwrap();
    let sig_at = text.find("/Sig0 Do").unwrap();
    assert!(page_at < sig_at);
    assert!(text.contains("80 0 0 50 100 900 cm"));
}

#[tokio::test]
async fn test_rebuild_uses_filtered_page_sizes() {
    let pages = solid_pages(&[(30, 10), (30, 20)]);
    let settings = FilterSettings {
        rotation: 90.0,
        ..Default::default()
    };
    let filtered = apply_filters_to_pages(&pages, &settings).unwrap();

    let mut stage = Stage::new(filtered.clone());
    stage.attach_overlay(red_signature(2.0, 35.0, 5, 5));

    let bytes = export_with_filters(&filtered, &mut stage).await.unwrap();
    let doc = Document::load_mem(&bytes).unwrap();

    assert_eq!(media_box(&doc, 1), vec![0.0, 0.0, 10.0, 30.0]);
    assert_eq!(media_box(&doc, 2), vec![0.0, 0.0, 20.0, 30.0]);
    assert_eq!(xobject_names(&doc, 1), vec!["Page0".to_string()]);
    assert!(xobject_names(&doc, 2).contains(&"Sig0".to_string()));
}

#[tokio::test]
async fn test_rebuild_without_pages() {
    let mut stage = Stage::default();
    stage.attach_overlay(red_signature(0.0, 0.0, 5, 5));

    let result = export_with_filters(&[], &mut stage).await;
    assert!(matches!(result, Err(SignError::NoPages)));
}
