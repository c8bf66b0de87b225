use crate::session::{Session, SessionError, SessionStore};
use crate::{SessionId, SignUpdate, SignatureSource};
use pdf_sign::{
    FilterSettings, PageRasterizer, SignError, SignatureOverlay, apply_filters_to_pages,
    apply_filters_to_signature, export_with_filters, export_without_filters, load_pdf, rasterize,
    resolve_export_page, save_pdf,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

type Handled = Result<SignUpdate, SessionError>;

/// Send the update, or the error prefixed with what was being attempted
fn report(update_tx: &mpsc::UnboundedSender<SignUpdate>, action: &str, result: Handled) {
    let update = match result {
        Ok(update) => update,
        Err(e) => {
            log::warn!("{} failed: {}", action, e);
            SignUpdate::Error {
                message: format!("Failed to {}: {}", action, e),
            }
        }
    };
    let _ = update_tx.send(update);
}

fn signature_changed(session: &Session) -> Handled {
    let overlay = session.stage.overlay().ok_or(SessionError::NoSignature)?;
    Ok(SignUpdate::SignatureChanged {
        rect: overlay.client_rect(),
        target_page: session.stage.target_page().ok().map(|p| p.page_index),
    })
}

// =============================================================================
// Document
// =============================================================================

pub async fn handle_load(
    path: PathBuf,
    store: &mut SessionStore,
    rasterizer: &Arc<dyn PageRasterizer>,
    update_tx: &mpsc::UnboundedSender<SignUpdate>,
) {
    let result = match load_pdf(&path).await {
        Ok(pdf) => open_document(pdf, store, rasterizer).await,
        Err(e) => Err(e.into()),
    };
    report(update_tx, "load PDF", result);
}

pub async fn handle_load_bytes(
    pdf: Vec<u8>,
    store: &mut SessionStore,
    rasterizer: &Arc<dyn PageRasterizer>,
    update_tx: &mpsc::UnboundedSender<SignUpdate>,
) {
    let result = open_document(pdf, store, rasterizer).await;
    report(update_tx, "load PDF", result);
}

async fn open_document(
    pdf: Vec<u8>,
    store: &mut SessionStore,
    rasterizer: &Arc<dyn PageRasterizer>,
) -> Handled {
    let pages = rasterize(Arc::clone(rasterizer), Arc::from(pdf.as_slice())).await?;
    let page_count = pages.len();

    let session = store.open(pdf, pages);
    log::info!("Opened {}-page document as {:?}", page_count, session.id);
    Ok(SignUpdate::Loaded {
        session: session.id,
        page_count,
        stage_size: session.stage.size(),
    })
}

pub async fn handle_close(
    session: SessionId,
    store: &mut SessionStore,
    update_tx: &mpsc::UnboundedSender<SignUpdate>,
) {
    let result = if store.close(session) {
        Ok(SignUpdate::Closed { session })
    } else {
        Err(SessionError::Rejected(format!(
            "{:?} is not the open session",
            session
        )))
    };
    report(update_tx, "close document", result);
}

// =============================================================================
// Signature
// =============================================================================

pub async fn handle_attach(
    source: SignatureSource,
    x: f32,
    y: f32,
    store: &mut SessionStore,
    update_tx: &mpsc::UnboundedSender<SignUpdate>,
) {
    let result = store.current_mut().and_then(|session| {
        let overlay = match source {
            SignatureSource::Encoded(bytes) => SignatureOverlay::from_encoded(&bytes)?,
            SignatureSource::DataUrl(url) => SignatureOverlay::from_data_url(&url)?,
        }
        .with_position(x, y);

        session.signature_raster = Some(overlay.raster.clone());
        session.stage.attach_overlay(overlay);
        signature_changed(session)
    });
    report(update_tx, "attach signature", result);
}

pub async fn handle_move(
    x: f32,
    y: f32,
    store: &mut SessionStore,
    update_tx: &mpsc::UnboundedSender<SignUpdate>,
) {
    let result = store.current_mut().and_then(|session| {
        let overlay = session
            .stage
            .overlay_mut()
            .ok_or(SessionError::NoSignature)?;
        if !overlay.move_to(x, y) {
            return Err(SessionError::Rejected(
                "signature is pinned in place".to_string(),
            ));
        }
        signature_changed(session)
    });
    report(update_tx, "move signature", result);
}

pub async fn handle_resize(
    width: f32,
    height: f32,
    store: &mut SessionStore,
    update_tx: &mpsc::UnboundedSender<SignUpdate>,
) {
    let result = store.current_mut().and_then(|session| {
        let overlay = session
            .stage
            .overlay_mut()
            .ok_or(SessionError::NoSignature)?;
        if !overlay.resize(width, height) {
            return Err(SessionError::Rejected(format!(
                "signature cannot be resized to {}x{}",
                width, height
            )));
        }
        signature_changed(session)
    });
    report(update_tx, "resize signature", result);
}

pub async fn handle_filter_signature(
    settings: FilterSettings,
    store: &mut SessionStore,
    update_tx: &mpsc::UnboundedSender<SignUpdate>,
) {
    let result = store.current_mut().and_then(|session| {
        let source = session
            .signature_raster
            .clone()
            .ok_or(SessionError::NoSignature)?;
        let overlay = session
            .stage
            .overlay_mut()
            .ok_or(SessionError::NoSignature)?;

        let unfiltered = SignatureOverlay {
            raster: source,
            rotation: 0.0,
            ..overlay.clone()
        };
        *overlay = apply_filters_to_signature(&unfiltered, &settings)?;
        signature_changed(session)
    });
    report(update_tx, "filter signature", result);
}

// =============================================================================
// Pages
// =============================================================================

pub async fn handle_filter_pages(
    settings: FilterSettings,
    store: &mut SessionStore,
    update_tx: &mpsc::UnboundedSender<SignUpdate>,
) {
    let result = filter_pages(settings, store).await;
    report(update_tx, "filter pages", result);
}

async fn filter_pages(settings: FilterSettings, store: &mut SessionStore) -> Handled {
    let session = store.current_mut()?;

    let filtered = if settings.is_identity() {
        session.pages.clone()
    } else {
        let pages = session.pages.clone();
        tokio::task::spawn_blocking(move || apply_filters_to_pages(&pages, &settings))
            .await
            .map_err(SignError::from)??
    };

    session.stage.set_pages(filtered);
    Ok(SignUpdate::PagesFiltered {
        stage_size: session.stage.size(),
    })
}

pub async fn handle_render_preview(
    store: &mut SessionStore,
    update_tx: &mpsc::UnboundedSender<SignUpdate>,
) {
    let result = store.current_mut().map(|session| {
        let canvas = session.stage.composite();
        SignUpdate::PreviewRendered {
            width: canvas.width() as usize,
            height: canvas.height() as usize,
            rgba_data: canvas.into_raw(),
        }
    });
    report(update_tx, "render preview", result);
}

// =============================================================================
// Export
// =============================================================================

pub async fn handle_export(
    with_filters: bool,
    output_path: Option<PathBuf>,
    store: &mut SessionStore,
    update_tx: &mpsc::UnboundedSender<SignUpdate>,
) {
    let result = export(with_filters, output_path, store).await;
    report(update_tx, "export PDF", result);
}

async fn export(
    with_filters: bool,
    output_path: Option<PathBuf>,
    store: &mut SessionStore,
) -> Handled {
    let session = store.current_mut()?;

    let (bytes, page_index) = if with_filters {
        let pages = session.stage.pages().to_vec();
        let page_index = session.stage.export_page()?.page_index;
        let bytes = export_with_filters(&pages, &mut session.stage).await?;
        (bytes, page_index)
    } else {
        // The original document gets the signature as attached, over the
        // unfiltered pages it lines up with
        let source = session
            .signature_raster
            .clone()
            .ok_or(SessionError::NoSignature)?;
        let overlay = session
            .stage
            .overlay_mut()
            .ok_or(SessionError::NoSignature)?;
        let unfiltered = SignatureOverlay {
            raster: source,
            rotation: 0.0,
            ..overlay.clone()
        };
        let shown = std::mem::replace(overlay, unfiltered);

        let result = export_original(session).await;

        if let Some(overlay) = session.stage.overlay_mut() {
            *overlay = shown;
        }
        result?
    };

    if let Some(path) = &output_path {
        save_pdf(&bytes, path).await?;
    }

    Ok(SignUpdate::Exported {
        bytes,
        path: output_path,
        page_index,
    })
}

async fn export_original(session: &mut Session) -> Result<(Vec<u8>, usize), SignError> {
    let overlay = session.stage.overlay().ok_or(SignError::NoOverlay)?;
    let page_index = resolve_export_page(&session.pages, &overlay.client_rect())?.page_index;
    let bytes = export_without_filters(&session.pdf, &session.pages, &mut session.stage).await?;
    Ok((bytes, page_index))
}
