use crate::SessionId;
use image::RgbaImage;
use pdf_sign::{PageImage, SignError, Stage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No document loaded")]
    NoDocument,
    #[error("No signature attached")]
    NoSignature,
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Sign(#[from] SignError),
}

/// Everything the worker holds for one loaded document
pub(crate) struct Session {
    pub id: SessionId,
    pub pdf: Vec<u8>,
    /// Pages as rasterized, before any filter
    pub pages: Vec<PageImage>,
    pub stage: Stage,
    /// Signature pixels as attached, before any filter
    pub signature_raster: Option<RgbaImage>,
}

/// Holds at most one open session; loading a new document replaces it
pub(crate) struct SessionStore {
    current: Option<Session>,
    next_id: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            current: None,
            next_id: 1,
        }
    }

    pub fn open(&mut self, pdf: Vec<u8>, pages: Vec<PageImage>) -> &mut Session {
        let id = SessionId(self.next_id);
        self.next_id += 1;

        if let Some(previous) = &self.current {
            log::debug!("Replacing session {:?} with {:?}", previous.id, id);
        }

        self.current.insert(Session {
            id,
            pdf,
            stage: Stage::new(pages.clone()),
            pages,
            signature_raster: None,
        })
    }

    pub fn current_mut(&mut self) -> Result<&mut Session, SessionError> {
        self.current.as_mut().ok_or(SessionError::NoDocument)
    }

    /// Close `id` if it is the open session
    pub fn close(&mut self, id: SessionId) -> bool {
        match &self.current {
            Some(session) if session.id == id => {
                self.current = None;
                true
            }
            _ => false,
        }
    }
}
