#![allow(dead_code)]

use image::{Rgba, RgbaImage};
use lopdf::{Dictionary, Document, Object, Stream};
use pdf_sign::*;
use std::time::Duration;

/// Build a PDF whose pages have the given MediaBox sizes, in points
pub fn create_test_pdf(page_sizes: &[(i64, i64)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");

    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for &(width, height) in page_sizes {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));

        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(width),
                    Object::Integer(height),
                ]),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(page_sizes.len() as i64)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));

    doc.trailer.set("Root", catalog_id);

    let mut writer = Vec::new();
    doc.save_to(&mut writer).unwrap();
    writer
}

/// Colour that `BlankRasterizer` fills page `index` with
pub fn page_colour(index: usize) -> Rgba<u8> {
    Rgba([255, 255, 255 - index as u8, 255])
}

/// Renders every page as a solid fill the size of its MediaBox
pub struct BlankRasterizer;

impl PageRasterizer for BlankRasterizer {
    fn page_count(&self, pdf: &[u8]) -> Result<usize> {
        Ok(Document::load_mem(pdf)?.get_pages().len())
    }

    fn render_page(&self, pdf: &[u8], page_index: usize) -> Result<RgbaImage> {
        let doc = Document::load_mem(pdf)?;
        let page_id = *doc
            .get_pages()
            .values()
            .nth(page_index)
            .ok_or(SignError::PageOutOfRange {
                index: page_index,
                count: 0,
            })?;
        let media_box = doc.get_dictionary(page_id)?.get(b"MediaBox")?.as_array()?;
        let width = media_box[2].as_i64()? as u32;
        let height = media_box[3].as_i64()? as u32;
        Ok(RgbaImage::from_pixel(width, height, page_colour(page_index)))
    }
}

/// Finishes later pages first
pub struct ReversedRasterizer;

impl PageRasterizer for ReversedRasterizer {
    fn page_count(&self, pdf: &[u8]) -> Result<usize> {
        BlankRasterizer.page_count(pdf)
    }

    fn render_page(&self, pdf: &[u8], page_index: usize) -> Result<RgbaImage> {
        let count = BlankRasterizer.page_count(pdf)?;
        std::thread::sleep(Duration::from_millis(((count - page_index) * 20) as u64));
        BlankRasterizer.render_page(pdf, page_index)
    }
}

/// Fails on one page
pub struct FailingRasterizer {
    pub fail_on: usize,
}

impl PageRasterizer for FailingRasterizer {
    fn page_count(&self, pdf: &[u8]) -> Result<usize> {
        BlankRasterizer.page_count(pdf)
    }

    fn render_page(&self, pdf: &[u8], page_index: usize) -> Result<RgbaImage> {
        if page_index == self.fail_on {
            return Err(SignError::Render(format!("page {} exploded", page_index)));
        }
        BlankRasterizer.render_page(pdf, page_index)
    }
}

/// Pages stacked straight from solid rasters, no PDF involved
pub fn solid_pages(sizes: &[(u32, u32)]) -> Vec<PageImage> {
    stack_pages(
        sizes
            .iter()
            .enumerate()
            .map(|(i, &(w, h))| (i, RgbaImage::from_pixel(w, h, page_colour(i))))
            .collect(),
    )
}

/// An opaque red signature of the given size at the given position
pub fn red_signature(x: f32, y: f32, width: u32, height: u32) -> SignatureOverlay {
    SignatureOverlay::from_image(RgbaImage::from_pixel(
        width,
        height,
        Rgba([255, 0, 0, 255]),
    ))
    .with_position(x, y)
}
