use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::opml::OpmlError;

/// Everything that can abort a conversion.
///
/// No variant is recovered from; the binary reports the message on stderr
/// and exits non-zero.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The input file is missing or unreadable.
    #[error("Failed to read OPML file '{}': {source}", path.display())]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input is not well-formed XML.
    #[error("Failed to parse OPML: {0}")]
    Parse(#[from] OpmlError),

    /// The rendered document could not be written to its destination.
    #[error("Failed to write output '{}': {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A feed URL could not be encoded as a TOML string.
    #[error(transparent)]
    Serialization(#[from] ConfigError),
}
