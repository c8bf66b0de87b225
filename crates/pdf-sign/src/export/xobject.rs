//! Image XObjects and page plumbing shared by both exporters

use crate::constants::{DEFAULT_PAGE_BOX, SIGNATURE_XOBJECT_PREFIX};
use crate::coords::PdfPlacement;
use crate::types::*;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::{ImageFormat, RgbaImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::io::{Cursor, Write};

/// Depth limit when walking up the page tree for inherited attributes
const MAX_INHERITANCE_DEPTH: usize = 10;

// =============================================================================
// PNG Round Trip
// =============================================================================

/// Losslessly encode a raster as PNG
pub(crate) fn encode_png(raster: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    raster.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Embed PNG bytes as an image XObject.
///
/// Colour goes into a Flate-compressed DeviceRGB stream; any transparency
/// goes into a separate DeviceGray soft mask.
pub(crate) fn embed_png(doc: &mut Document, png: &[u8]) -> Result<ObjectId> {
    let rgba = image::load_from_memory_with_format(png, ImageFormat::Png)?.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel.0[3]);
    }

    let mut dict = image_dict(width, height, "DeviceRGB");
    if alpha.iter().any(|&a| a != u8::MAX) {
        let smask = Stream::new(image_dict(width, height, "DeviceGray"), deflate(&alpha)?)
            .with_compression(false);
        let smask_id = doc.add_object(smask);
        dict.set("SMask", Object::Reference(smask_id));
    }

    let stream = Stream::new(dict, deflate(&rgb)?).with_compression(false);
    Ok(doc.add_object(stream))
}

fn image_dict(width: u32, height: u32, color_space: &str) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(width as i64));
    dict.set("Height", Object::Integer(height as i64));
    dict.set("ColorSpace", Object::Name(color_space.as_bytes().to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
    dict
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

// =============================================================================
// Page Geometry
// =============================================================================

/// Object IDs of all pages in document order
pub(crate) fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().values().copied().collect()
}

/// The page's MediaBox as `[x0, y0, x1, y1]`, following inheritance
pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> Result<[f32; 4]> {
    let Some(obj) = inherited_attribute(doc, page_id, b"MediaBox")? else {
        return Ok(DEFAULT_PAGE_BOX);
    };

    let array = match obj {
        Object::Reference(id) => doc.get_object(id)?.as_array()?.clone(),
        other => other.as_array()?.clone(),
    };

    let numbers: Vec<f32> = array.iter().filter_map(extract_number).collect();
    match *numbers.as_slice() {
        [x0, y0, x1, y1] => Ok([x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)]),
        _ => Ok(DEFAULT_PAGE_BOX),
    }
}

/// Look up `key` on the page, then on its ancestors in the page tree
fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Result<Option<Object>> {
    let mut node = doc.get_dictionary(page_id)?;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Ok(Some(value.clone()));
        }
        match node.get(b"Parent").and_then(|p| p.as_reference()) {
            Ok(parent_id) => node = doc.get_dictionary(parent_id)?,
            Err(_) => break,
        }
    }
    Ok(None)
}

/// Extract numeric value from a PDF object
fn extract_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

// =============================================================================
// Resources and Content
// =============================================================================

/// Register `xobject_id` in the page's XObject resources under a fresh name.
///
/// The page gets its own copy of its effective resource dictionary so shared
/// or inherited resources are left as they were.
pub(crate) fn add_xobject_to_page(
    doc: &mut Document,
    page_id: ObjectId,
    xobject_id: ObjectId,
) -> Result<String> {
    let mut resources = match inherited_attribute(doc, page_id, b"Resources")? {
        Some(obj) => resolve_dictionary(doc, &obj)?,
        None => Dictionary::new(),
    };
    let mut xobjects = match resources.get(b"XObject") {
        Ok(obj) => resolve_dictionary(doc, obj)?,
        Err(_) => Dictionary::new(),
    };

    let name = (0..)
        .map(|n| format!("{}{}", SIGNATURE_XOBJECT_PREFIX, n))
        .find(|candidate| !xobjects.has(candidate.as_bytes()))
        .unwrap_or_else(|| SIGNATURE_XOBJECT_PREFIX.to_string());

    xobjects.set(name.as_bytes(), Object::Reference(xobject_id));
    resources.set("XObject", Object::Dictionary(xobjects));
    doc.get_dictionary_mut(page_id)?
        .set("Resources", Object::Dictionary(resources));

    Ok(name)
}

fn resolve_dictionary(doc: &Document, obj: &Object) -> Result<Dictionary> {
    match obj {
        Object::Dictionary(dict) => Ok(dict.clone()),
        Object::Reference(id) => Ok(doc.get_dictionary(*id)?.clone()),
        _ => Ok(Dictionary::new()),
    }
}

/// Draw the named XObject at `placement` on top of the page's existing content.
///
/// The existing content is wrapped in `q`/`Q` so graphics state it leaves
/// behind cannot leak into the stamp.
pub(crate) fn stamp_xobject(
    doc: &mut Document,
    page_id: ObjectId,
    name: &str,
    placement: &PdfPlacement,
) -> Result<()> {
    let prefix_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let stamp = format!("Q\nq {} /{} Do Q\n", placement.image_matrix(), name);
    let stamp_id = doc.add_object(Stream::new(Dictionary::new(), stamp.into_bytes()));

    let page = doc.get_dictionary_mut(page_id)?;
    let mut contents = vec![Object::Reference(prefix_id)];
    match page.get(b"Contents") {
        Ok(Object::Reference(id)) => contents.push(Object::Reference(*id)),
        Ok(Object::Array(existing)) => contents.extend(existing.iter().cloned()),
        _ => {}
    }
    contents.push(Object::Reference(stamp_id));
    page.set("Contents", Object::Array(contents));

    Ok(())
}

/// Serialize a document to bytes
pub(crate) fn save_to_bytes(mut doc: Document) -> Result<Vec<u8>> {
    let mut writer = Vec::new();
    doc.save_to(&mut writer)?;
    Ok(writer)
}
