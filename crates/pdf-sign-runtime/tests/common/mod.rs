#![allow(dead_code)]

use image::{ImageFormat, Rgba, RgbaImage};
use lopdf::{Dictionary, Document, Object, Stream};
use pdf_sign::{PageRasterizer, Result, SignError};
use pdf_sign_runtime::*;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Build a PDF whose pages have the given MediaBox sizes, in points
pub fn create_test_pdf(page_sizes: &[(i64, i64)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = page_sizes
        .iter()
        .map(|&(width, height)| {
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
            Object::Reference(page_id)
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(kids.len() as i64)),
            ("Kids", Object::Array(kids)),
        ])),
    );
    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);

    let mut writer = Vec::new();
    doc.save_to(&mut writer).unwrap();
    writer
}

/// Renders every page as solid white at its MediaBox size
pub struct BlankRasterizer;

impl PageRasterizer for BlankRasterizer {
    fn page_count(&self, pdf: &[u8]) -> Result<usize> {
        Ok(Document::load_mem(pdf)?.get_pages().len())
    }

    fn render_page(&self, pdf: &[u8], page_index: usize) -> Result<RgbaImage> {
        let doc = Document::load_mem(pdf)?;
        let pages = doc.get_pages();
        let page_id = *pages
            .values()
            .nth(page_index)
            .ok_or(SignError::PageOutOfRange {
                index: page_index,
                count: pages.len(),
            })?;
        let media_box = doc.get_dictionary(page_id)?.get(b"MediaBox")?.as_array()?;
        let width = media_box[2].as_i64()? as u32;
        let height = media_box[3].as_i64()? as u32;
        Ok(RgbaImage::from_pixel(
            width,
            height,
            Rgba([255, 255, 255, 255]),
        ))
    }
}

/// Opaque red PNG of the given size
pub fn red_png(width: u32, height: u32) -> Vec<u8> {
    let raster = RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255]));
    let mut bytes = Vec::new();
    raster
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// A running worker and both ends of its channels
pub struct Harness {
    pub command_tx: mpsc::UnboundedSender<SignCommand>,
    pub update_rx: mpsc::UnboundedReceiver<SignUpdate>,
    pub worker: tokio::task::JoinHandle<()>,
}

impl Harness {
    pub fn start() -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(worker_task(Arc::new(BlankRasterizer), command_rx, update_tx));
        Self {
            command_tx,
            update_rx,
            worker,
        }
    }

    pub fn send(&self, command: SignCommand) {
        self.command_tx.send(command).unwrap();
    }

    pub async fn next(&mut self) -> SignUpdate {
        tokio::time::timeout(Duration::from_secs(10), self.update_rx.recv())
            .await
            .expect("Timed out waiting for worker update")
            .expect("Worker hung up")
    }

    /// Load a document and return its session id
    pub async fn load(&mut self, page_sizes: &[(i64, i64)]) -> SessionId {
        self.send(SignCommand::LoadBytes {
            pdf: create_test_pdf(page_sizes),
        });
        match self.next().await {
            SignUpdate::Loaded { session, .. } => session,
            other => panic!("Expected Loaded, got {:?}", other),
        }
    }
}
