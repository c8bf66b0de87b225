//! Worker-task runtime for a signing session.
//!
//! A host sends [`SignCommand`]s over an unbounded channel to [`worker_task`],
//! which owns the loaded document, its page rasters and the [`Stage`], and
//! reports back with [`SignUpdate`]s. [`SignWorker`] spawns the task and
//! routes its log output into an [`ActivityLog`].

use std::path::PathBuf;

mod handlers;
mod host;
pub mod logger;
mod session;
mod worker;

pub use host::SignWorker;
pub use logger::{ActivityLog, LogEntry};
pub use session::SessionError;
pub use worker::worker_task;

// Re-export types from the library crate
pub use pdf_sign::{FilterSettings, PageRasterizer, Rect, SignError, Stage};

/// Where a signature image comes from
#[derive(Debug, Clone)]
pub enum SignatureSource {
    /// Encoded image bytes (PNG, ...)
    Encoded(Vec<u8>),
    /// A base64 `data:` URL
    DataUrl(String),
}

/// Commands sent from the host to the worker
#[derive(Debug)]
pub enum SignCommand {
    Load {
        path: PathBuf,
    },
    LoadBytes {
        pdf: Vec<u8>,
    },
    AttachSignature {
        source: SignatureSource,
        x: f32,
        y: f32,
    },
    /// Repeated moves queued behind each other collapse into the latest one
    MoveSignature {
        x: f32,
        y: f32,
    },
    ResizeSignature {
        width: f32,
        height: f32,
    },
    /// Filter the signature. Always starts from the image as attached, so
    /// settings do not compound.
    FilterSignature {
        settings: FilterSettings,
    },
    /// Filter every page. Always starts from the rasterized pages.
    FilterPages {
        settings: FilterSettings,
    },
    RenderPreview,
    Export {
        with_filters: bool,
        output_path: Option<PathBuf>,
    },
    Close {
        session: SessionId,
    },
}

/// Updates sent from the worker to the host
#[derive(Debug, Clone)]
pub enum SignUpdate {
    Loaded {
        session: SessionId,
        page_count: usize,
        /// Stage width and stacked height in pixels
        stage_size: (u32, u32),
    },
    SignatureChanged {
        rect: Rect,
        /// `None` while the overlay's top edge is off every page
        target_page: Option<usize>,
    },
    PagesFiltered {
        stage_size: (u32, u32),
    },
    PreviewRendered {
        width: usize,
        height: usize,
        rgba_data: Vec<u8>,
    },
    Exported {
        bytes: Vec<u8>,
        path: Option<PathBuf>,
        page_index: usize,
    },
    Closed {
        session: SessionId,
    },
    Error {
        message: String,
    },
}

/// Handle to a loaded document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);
