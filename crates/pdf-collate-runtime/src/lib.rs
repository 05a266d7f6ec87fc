use std::path::PathBuf;

// Re-export types from library crates
pub use pdf_collate::{
    DragTransfer, DropRole, DropTarget, ExportStats, PageId, PagePreview, SourceId,
};

/// Commands sent from the driving layer (UI, tests) to the worker
#[derive(Debug)]
pub enum CollateCommand {
    /// Register a source from in-memory bytes (e.g. a browser upload)
    AddSource {
        name: String,
        bytes: Vec<u8>,
    },
    /// Register a source from a file on disk
    AddSourceFile {
        path: PathBuf,
    },
    RemoveSource {
        id: SourceId,
    },
    /// One classified drag gesture against the result sequence
    Drag {
        transfer: DragTransfer,
    },
    /// Empty the result sequence
    Clear,
    /// Delete one result entry directly (not drag-driven)
    RemoveAt {
        index: usize,
    },
    /// Append a batch of pages, preserving the given order
    AppendPages {
        pages: Vec<PageId>,
    },
    Export {
        output_path: PathBuf,
    },
}

/// Updates sent from the worker back to the driving layer
#[derive(Debug, Clone)]
pub enum CollateUpdate {
    /// A source was registered and its load started
    SourceAdded {
        id: SourceId,
        name: String,
    },
    /// The source decoded; previews will follow one page at a time
    SourceDecoded {
        id: SourceId,
        page_count: usize,
    },
    /// The next page preview is ready, in page order
    PageReady {
        id: SourceId,
        page_number: u32,
        preview: PagePreview,
    },
    /// All previews arrived; the source is fully loaded
    SourceLoaded {
        id: SourceId,
    },
    /// The source's bytes could not be decoded; other sources unaffected
    SourceError {
        id: SourceId,
        message: String,
    },
    SourceRemoved {
        id: SourceId,
    },
    /// Snapshot of the result sequence after any mutation
    SequenceChanged {
        pages: Vec<PageId>,
    },
    ExportComplete {
        path: PathBuf,
        stats: ExportStats,
    },
    Error {
        message: String,
    },
}
