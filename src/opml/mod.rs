//! OPML reading: XML parsing into an element tree and feed URL extraction.
//!
//! - [`document`] - quick-xml based parser producing a [`Document`]
//! - [`extract`] - depth-first outline walk collecting unique feed URLs
//!
//! # Example
//!
//! ```
//! use opml2toml::opml::{extract_feed_urls, Document};
//!
//! let doc = Document::parse(
//!     r#"<opml><body><outline xmlUrl="https://example.com/feed.xml"/></body></opml>"#,
//! )
//! .unwrap();
//! assert_eq!(extract_feed_urls(&doc), vec!["https://example.com/feed.xml"]);
//! ```

mod document;
mod extract;

pub use document::{Document, Node, NodeId, OpmlError};
pub use extract::{extract_feed_urls, URL_ATTRIBUTES};
