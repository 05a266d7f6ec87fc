use std::path::PathBuf;

use pdf_collate::compose;
use pdf_collate_runtime::CollateUpdate;
use tokio::sync::mpsc;

use crate::worker::SessionState;

/// Export the current result sequence and write it to `output_path`.
///
/// The sequence is snapshotted by the composer, so mutations that arrive
/// while the export runs only affect the next export. On any failure the
/// in-memory state is untouched and a single error update is sent.
pub async fn handle_export(
    state: &SessionState,
    output_path: PathBuf,
    update_tx: &mpsc::UnboundedSender<CollateUpdate>,
) {
    if state.sequence.is_empty() {
        log::debug!("Export requested with an empty result sequence, nothing to do");
        return;
    }

    let exported = match pdf_collate::export(&state.sequence, &state.registry).await {
        Ok(exported) => exported,
        Err(e) => {
            let _ = update_tx.send(CollateUpdate::Error {
                message: format!("Failed to export PDF: {e}"),
            });
            return;
        }
    };

    let stats = exported.stats;
    if let Err(e) = compose::save_exported(exported.bytes, &output_path).await {
        let _ = update_tx.send(CollateUpdate::Error {
            message: format!("Failed to save exported PDF: {e}"),
        });
        return;
    }

    let _ = update_tx.send(CollateUpdate::ExportComplete {
        path: output_path,
        stats,
    });
}
