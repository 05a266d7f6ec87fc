use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollateError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Nothing to export")]
    EmptySequence,
}

pub type Result<T> = std::result::Result<T, CollateError>;

/// Opaque token naming a loaded source document.
///
/// Minted by the registry when a source is added and stable for the
/// document's lifetime there. Ids are never reused within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceId(pub u64);

/// One page of one source document.
///
/// `page_number` is 1-based. The same `PageId` may appear any number of
/// times in a result sequence; a page can be used repeatedly in the output.
/// An id may outlive its source (the source was removed) — such entries are
/// skipped at export time rather than failing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageId {
    pub source: SourceId,
    pub page_number: u32,
}

impl PageId {
    pub fn new(source: SourceId, page_number: u32) -> Self {
        Self {
            source,
            page_number,
        }
    }
}

/// Preview of a single source page.
///
/// `width_pt`/`height_pt` are the page's native size in points (from the
/// MediaBox), not the preview bitmap size. `rgba` may be empty when no
/// preview renderer is available; the page is still fully usable for export.
#[derive(Debug, Clone)]
pub struct PagePreview {
    pub page_number: u32,
    pub width_pt: f32,
    pub height_pt: f32,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub rgba: Vec<u8>,
}

/// A loaded (or loading, or failed) source document.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub id: SourceId,
    pub name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// Previews in page order; appended one at a time while loading.
    pub pages: Vec<PagePreview>,
    pub loading: bool,
    pub error: Option<String>,
}

impl SourceDocument {
    pub(crate) fn new_loading(id: SourceId, name: String, bytes: Vec<u8>) -> Self {
        Self {
            id,
            name,
            bytes,
            page_count: 0,
            pages: Vec::new(),
            loading: true,
            error: None,
        }
    }

    /// True once the document decoded and every preview arrived.
    pub fn is_ready(&self) -> bool {
        !self.loading && self.error.is_none()
    }
}

/// Counters from a completed export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExportStats {
    /// Pages actually written to the output.
    pub pages_written: usize,
    /// Entries that referenced a missing source or page and were skipped.
    pub pages_skipped: usize,
}

/// A composed output document, ready for delivery.
#[derive(Debug, Clone)]
pub struct ExportedPdf {
    pub bytes: Vec<u8>,
    pub stats: ExportStats,
}
