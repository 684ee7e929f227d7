//! Feed configuration document written by the converter.
//!
//! The rendered file holds a single `feeds` array of tables, one `url` per
//! entry, in the order the URLs were extracted:
//!
//! ```toml
//! [[feeds]]
//! url = "https://example.com/feed.xml"
//! ```
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to render feed configuration as TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level feed configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedsConfig {
    /// Feed subscriptions, in extraction order.
    #[serde(default)]
    pub feeds: Vec<FeedEntry>,
}

/// One `[[feeds]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub url: String,
}

impl FeedsConfig {
    /// Wraps each URL in its own entry, keeping the given order.
    pub fn from_urls<I>(urls: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            feeds: urls.into_iter().map(|url| FeedEntry { url }).collect(),
        }
    }

    /// Renders the configuration as a TOML document.
    ///
    /// Output is deterministic. An empty list renders as `feeds = []` with no
    /// `[[feeds]]` tables.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
