use std::path::PathBuf;

use pdf_collate::compose;
use pdf_collate_runtime::CollateUpdate;
use tokio::sync::mpsc;

use crate::preview;
use crate::worker::SessionState;

/// Register a source from a file path and run its loading pipeline.
pub async fn handle_add_file(
    path: PathBuf,
    state: &mut SessionState,
    update_tx: &mpsc::UnboundedSender<CollateUpdate>,
) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    match compose::read_source_file(&path).await {
        Ok(bytes) => handle_add(name, bytes, state, update_tx).await,
        Err(e) => {
            let _ = update_tx.send(CollateUpdate::Error {
                message: format!("Failed to read {}: {e}", path.display()),
            });
        }
    }
}

/// Register a source and run its loading pipeline.
///
/// The document is decoded once for its page count and native sizes; after
/// that, previews are rendered and appended one page at a time until the
/// terminal state. A decode failure is recorded on this source alone.
/// Removal of the source mid-load stops the pipeline; anything already in
/// flight lands harmlessly because registry mutators ignore absent ids.
pub async fn handle_add(
    name: String,
    bytes: Vec<u8>,
    state: &mut SessionState,
    update_tx: &mpsc::UnboundedSender<CollateUpdate>,
) {
    let id = state.registry.add_source(name.clone(), bytes.clone());
    let _ = update_tx.send(CollateUpdate::SourceAdded { id, name });

    let decode_bytes = bytes.clone();
    let decoded = tokio::task::spawn_blocking(move || {
        let doc = compose::decode_source(&decode_bytes)?;
        compose::native_page_sizes(&doc)
    })
    .await;

    let sizes = match decoded {
        Ok(Ok(sizes)) => sizes,
        Ok(Err(e)) => {
            let message = format!("Failed to decode PDF: {e}");
            state.registry.set_error(id, message.clone());
            let _ = update_tx.send(CollateUpdate::SourceError { id, message });
            return;
        }
        Err(e) => {
            let message = format!("Task join error: {e}");
            state.registry.set_error(id, message.clone());
            let _ = update_tx.send(CollateUpdate::SourceError { id, message });
            return;
        }
    };

    state.registry.set_page_count(id, sizes.len());
    let _ = update_tx.send(CollateUpdate::SourceDecoded {
        id,
        page_count: sizes.len(),
    });

    for (index, native_size) in sizes.iter().copied().enumerate() {
        let page_number = index as u32 + 1;

        if !state.registry.contains(id) {
            log::debug!("Source {id:?} removed while loading, discarding remaining previews");
            return;
        }

        let preview = render_preview(&bytes, page_number, native_size).await;
        state.registry.push_preview(id, preview.clone());
        let _ = update_tx.send(CollateUpdate::PageReady {
            id,
            page_number,
            preview,
        });
    }

    if state.registry.contains(id) {
        state.registry.finish_loading(id);
        let _ = update_tx.send(CollateUpdate::SourceLoaded { id });
    }
}

#[cfg(feature = "previews")]
async fn render_preview(
    bytes: &[u8],
    page_number: u32,
    native_size: (f32, f32),
) -> pdf_collate::PagePreview {
    match preview::render_page_preview(bytes.to_vec(), page_number, native_size).await {
        Ok(preview) => preview,
        Err(e) => {
            log::warn!("Preview for page {page_number} unavailable: {e}");
            preview::metadata_preview(page_number, native_size)
        }
    }
}

#[cfg(not(feature = "previews"))]
async fn render_preview(
    _bytes: &[u8],
    page_number: u32,
    native_size: (f32, f32),
) -> pdf_collate::PagePreview {
    preview::metadata_preview(page_number, native_size)
}
