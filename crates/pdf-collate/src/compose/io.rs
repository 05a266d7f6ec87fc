//! Decode/serialize boundaries and file helpers for export composition.

use lopdf::Document;
use std::path::Path;

use crate::types::Result;

/// Decode a source document from raw bytes.
pub fn decode_source(bytes: &[u8]) -> Result<Document> {
    Ok(Document::load_mem(bytes)?)
}

/// Serialize an assembled output document to bytes.
pub fn serialize(mut doc: Document) -> Result<Vec<u8>> {
    let mut writer = Vec::new();
    doc.save_to(&mut writer)?;
    Ok(writer)
}

/// Read a source file's raw bytes.
pub async fn read_source_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    Ok(tokio::fs::read(path.as_ref()).await?)
}

/// Write exported bytes to disk.
pub async fn save_exported(bytes: Vec<u8>, path: impl AsRef<Path>) -> Result<()> {
    tokio::fs::write(path.as_ref(), bytes).await?;
    Ok(())
}
