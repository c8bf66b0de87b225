use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignError {
    #[error("Could not determine which page the image is on (overlay top edge at y={overlay_y})")]
    PageNotFound { overlay_y: f32 },
    #[error("Signature crosses the bottom edge of page {page_index}")]
    OverlayStraddlesPages { page_index: usize },
    #[error("No signature overlay attached to the stage")]
    NoOverlay,
    #[error("Page {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },
    #[error("Render error: {0}")]
    Render(String),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
    #[error("No pages to render")]
    NoPages,
}

pub type Result<T> = std::result::Result<T, SignError>;

/// Axis-aligned rectangle in canvas space (origin top-left, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Whether `y` lies within the half-open vertical span `[y, y + height)`
    pub fn contains_y(&self, y: f32) -> bool {
        y >= self.y && y < self.bottom()
    }

    /// Integer pixel rectangle covering this one (rounded to the nearest pixel)
    pub fn to_pixels(&self) -> (i64, i64, u32, u32) {
        (
            self.x.round() as i64,
            self.y.round() as i64,
            self.width.round().max(0.0) as u32,
            self.height.round().max(0.0) as u32,
        )
    }
}
