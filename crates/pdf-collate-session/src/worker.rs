use pdf_collate::{ResultSequence, SourceRegistry, TransferEffect, apply_transfer};
use pdf_collate_runtime::{CollateCommand, CollateUpdate};
use tokio::sync::mpsc;

use crate::handlers;

/// State owned by the worker: the registry of loaded sources and the
/// sequence under construction.
pub struct SessionState {
    pub registry: SourceRegistry,
    pub sequence: ResultSequence,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            registry: SourceRegistry::new(),
            sequence: ResultSequence::new(),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Async worker task that processes collate commands and sends updates.
///
/// Commands are handled one at a time; progressive updates for a single
/// source therefore arrive strictly in page order, while different sources
/// added back-to-back interleave only at command granularity.
pub async fn worker_task(
    mut command_rx: mpsc::UnboundedReceiver<CollateCommand>,
    update_tx: mpsc::UnboundedSender<CollateUpdate>,
) {
    let mut state = SessionState::new();

    while let Some(cmd) = command_rx.recv().await {
        process_command(cmd, &mut state, &update_tx).await;
    }
}

async fn process_command(
    cmd: CollateCommand,
    state: &mut SessionState,
    update_tx: &mpsc::UnboundedSender<CollateUpdate>,
) {
    match cmd {
        CollateCommand::AddSource { name, bytes } => {
            handlers::sources::handle_add(name, bytes, state, update_tx).await;
        }
        CollateCommand::AddSourceFile { path } => {
            handlers::sources::handle_add_file(path, state, update_tx).await;
        }
        CollateCommand::RemoveSource { id } => {
            if state.registry.remove_source(id) {
                let _ = update_tx.send(CollateUpdate::SourceRemoved { id });
            } else {
                log::debug!("Remove for unknown source {id:?} ignored");
            }
        }
        CollateCommand::Drag { transfer } => {
            let effect = apply_transfer(&mut state.sequence, &transfer);
            if effect != TransferEffect::None {
                send_sequence(state, update_tx);
            }
        }
        CollateCommand::Clear => {
            state.sequence.clear();
            send_sequence(state, update_tx);
        }
        CollateCommand::RemoveAt { index } => {
            state.sequence.remove_at(index);
            send_sequence(state, update_tx);
        }
        CollateCommand::AppendPages { pages } => {
            state.sequence.append_all(&pages);
            send_sequence(state, update_tx);
        }
        CollateCommand::Export { output_path } => {
            handlers::export::handle_export(state, output_path, update_tx).await;
        }
    }
}

fn send_sequence(state: &SessionState, update_tx: &mpsc::UnboundedSender<CollateUpdate>) {
    let _ = update_tx.send(CollateUpdate::SequenceChanged {
        pages: state.sequence.snapshot(),
    });
}
