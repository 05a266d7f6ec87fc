//! In-memory store of loaded source documents.
//!
//! The registry is a synchronous state container: asynchronous loading
//! pipelines (decode, per-page preview rendering) live with the caller and
//! drive it through the mutators here. Every mutator that takes a `SourceId`
//! is a no-op when the id is absent, so a load that completes after its
//! source was removed is simply discarded.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use lopdf::Document;

use crate::types::{PagePreview, Result, SourceDocument, SourceId};

pub struct SourceRegistry {
    sources: HashMap<SourceId, SourceDocument>,
    /// Insertion order of sources, for stable display iteration.
    order: Vec<SourceId>,
    next_id: AtomicU64,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
            order: Vec::new(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Mint an id and insert a source in its initial loading state.
    ///
    /// Returns immediately; the caller runs the decode/preview pipeline and
    /// reports progress through [`set_page_count`](Self::set_page_count),
    /// [`push_preview`](Self::push_preview) and the terminal-state mutators.
    pub fn add_source(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> SourceId {
        let id = SourceId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.sources
            .insert(id, SourceDocument::new_loading(id, name.into(), bytes));
        self.order.push(id);
        id
    }

    /// Record the decoded page count for a loading source.
    pub fn set_page_count(&mut self, id: SourceId, page_count: usize) {
        if let Some(source) = self.sources.get_mut(&id) {
            source.page_count = page_count;
        }
    }

    /// Append the next page preview. Previews arrive in page order; the
    /// list only ever grows.
    pub fn push_preview(&mut self, id: SourceId, preview: PagePreview) {
        if let Some(source) = self.sources.get_mut(&id) {
            source.pages.push(preview);
        }
    }

    /// Mark a source as fully loaded.
    pub fn finish_loading(&mut self, id: SourceId) {
        if let Some(source) = self.sources.get_mut(&id) {
            source.loading = false;
        }
    }

    /// Record a decode failure. The error is local to this source; other
    /// sources and any result sequence are unaffected.
    pub fn set_error(&mut self, id: SourceId, message: impl Into<String>) {
        if let Some(source) = self.sources.get_mut(&id) {
            source.loading = false;
            source.error = Some(message.into());
            source.pages.clear();
        }
    }

    /// Remove a source. Returns false if the id was not present.
    ///
    /// Result-sequence entries referencing the source are left alone; they
    /// become dangling and are skipped at export time.
    pub fn remove_source(&mut self, id: SourceId) -> bool {
        let removed = self.sources.remove(&id).is_some();
        if removed {
            self.order.retain(|other| *other != id);
        }
        removed
    }

    pub fn get(&self, id: SourceId) -> Option<&SourceDocument> {
        self.sources.get(&id)
    }

    pub fn contains(&self, id: SourceId) -> bool {
        self.sources.contains_key(&id)
    }

    pub fn is_any_loading(&self) -> bool {
        self.sources.values().any(|source| source.loading)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Source ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = SourceId> + '_ {
        self.order.iter().copied()
    }

    /// Sources in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SourceDocument> {
        self.order.iter().filter_map(|id| self.sources.get(id))
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode raw bytes just far enough to count pages.
///
/// Used by synchronous drivers that skip the progressive preview pipeline.
pub fn probe_page_count(bytes: &[u8]) -> Result<usize> {
    let doc = Document::load_mem(bytes)?;
    Ok(doc.get_pages().len())
}
