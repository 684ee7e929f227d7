//! Convert an OPML subscription list into a TOML feed configuration.
//!
//! ```
//! let toml = opml2toml::convert_str(
//!     r#"<opml><body><outline xmlUrl="https://example.com/feed.xml"/></body></opml>"#,
//! )
//! .unwrap();
//! assert!(toml.contains("[[feeds]]"));
//! assert!(toml.contains(r#"url = "https://example.com/feed.xml""#));
//! ```

pub mod config;
mod convert;
mod error;
pub mod opml;
pub mod output;

pub use config::{ConfigError, FeedEntry, FeedsConfig};
pub use convert::{convert_bytes, convert_file, convert_str};
pub use error::ConvertError;
