use crate::handlers;
use crate::session::SessionStore;
use crate::{SignCommand, SignUpdate};
use pdf_sign::PageRasterizer;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Async worker task that owns the signing session and processes commands
/// one at a time until the command channel closes
pub async fn worker_task(
    rasterizer: Arc<dyn PageRasterizer>,
    mut command_rx: mpsc::UnboundedReceiver<SignCommand>,
    update_tx: mpsc::UnboundedSender<SignUpdate>,
) {
    let mut store = SessionStore::new();

    while let Some(cmd) = command_rx.recv().await {
        process_command(cmd, &mut store, &rasterizer, &mut command_rx, &update_tx).await;
    }

    log::debug!("Command channel closed, signing worker exiting");
}

async fn process_command(
    cmd: SignCommand,
    store: &mut SessionStore,
    rasterizer: &Arc<dyn PageRasterizer>,
    command_rx: &mut mpsc::UnboundedReceiver<SignCommand>,
    update_tx: &mpsc::UnboundedSender<SignUpdate>,
) {
    match cmd {
        SignCommand::Load { path } => {
            handlers::handle_load(path, store, rasterizer, update_tx).await;
        }
        SignCommand::LoadBytes { pdf } => {
            handlers::handle_load_bytes(pdf, store, rasterizer, update_tx).await;
        }
        SignCommand::AttachSignature { source, x, y } => {
            handlers::handle_attach(source, x, y, store, update_tx).await;
        }
        SignCommand::MoveSignature { mut x, mut y } => {
            // Drag events arrive faster than they are handled; only the last matters
            while let Ok(next_cmd) = command_rx.try_recv() {
                if let SignCommand::MoveSignature { x: new_x, y: new_y } = next_cmd {
                    log::debug!("Discarding queued move, using newer position");
                    x = new_x;
                    y = new_y;
                } else {
                    // Apply the latest position before anything that depends on it
                    handlers::handle_move(x, y, store, update_tx).await;
                    Box::pin(process_command(
                        next_cmd,
                        store,
                        rasterizer,
                        command_rx,
                        update_tx,
                    ))
                    .await;
                    return;
                }
            }

            handlers::handle_move(x, y, store, update_tx).await;
        }
        SignCommand::ResizeSignature { width, height } => {
            handlers::handle_resize(width, height, store, update_tx).await;
        }
        SignCommand::FilterSignature { settings } => {
            handlers::handle_filter_signature(settings, store, update_tx).await;
        }
        SignCommand::FilterPages { mut settings } => {
            // Keep only the most recent settings when a slider is being dragged
            while let Ok(next_cmd) = command_rx.try_recv() {
                if let SignCommand::FilterPages {
                    settings: new_settings,
                } = next_cmd
                {
                    log::debug!("Discarding queued page filter, using newer settings");
                    settings = new_settings;
                } else {
                    handlers::handle_filter_pages(settings, store, update_tx).await;
                    Box::pin(process_command(
                        next_cmd,
                        store,
                        rasterizer,
                        command_rx,
                        update_tx,
                    ))
                    .await;
                    return;
                }
            }

            handlers::handle_filter_pages(settings, store, update_tx).await;
        }
        SignCommand::RenderPreview => {
            handlers::handle_render_preview(store, update_tx).await;
        }
        SignCommand::Export {
            with_filters,
            output_path,
        } => {
            handlers::handle_export(with_filters, output_path, store, update_tx).await;
        }
        SignCommand::Close { session } => {
            handlers::handle_close(session, store, update_tx).await;
        }
    }
}
