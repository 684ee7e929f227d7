//! The parse → extract → render pipeline.
use std::path::Path;

use crate::config::FeedsConfig;
use crate::error::ConvertError;
use crate::opml::{extract_feed_urls, Document};

/// Converts OPML text into the TOML feed configuration.
pub fn convert_str(content: &str) -> Result<String, ConvertError> {
    render(Document::parse(content)?)
}

/// Converts raw OPML bytes, honouring the document's declared encoding.
pub fn convert_bytes(content: &[u8]) -> Result<String, ConvertError> {
    render(Document::parse_bytes(content)?)
}

/// Reads the OPML file at `path` and converts it.
///
/// The whole file is read before anything is parsed, so a missing input
/// never leaves output behind. Only I/O failures count as an unreadable
/// input; bytes that do not decode are a parse error.
pub fn convert_file(path: &Path) -> Result<String, ConvertError> {
    let content = std::fs::read(path).map_err(|source| ConvertError::InputNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "Read OPML file");
    convert_bytes(&content)
}

fn render(doc: Document) -> Result<String, ConvertError> {
    tracing::debug!(elements = doc.len(), "Parsed OPML document");

    if !doc.descendants().any(|id| doc.node(id).is_outline()) {
        tracing::warn!("OPML document contains no outline elements");
    }

    let urls = extract_feed_urls(&doc);
    tracing::info!(count = urls.len(), "Extracted feed URLs");

    Ok(FeedsConfig::from_urls(urls).to_toml()?)
}
