//! Error types for the boarding-pass toolkit.
//!
//! Every fallible step works in [`Result`]; the public boundaries of the API
//! clients and the lookup pipeline turn these into empty results or short
//! user-facing messages instead of propagating them.

use thiserror::Error;

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Error, Debug)]
pub enum Error {
    /// Timeout, refused connection, DNS failure or a broken read.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with something other than 200.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// The body was not the JSON shape we expected.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// No barcode could be found in the image.
    #[error("no readable code in image")]
    Decode,

    /// A well-formed response that did not contain the requested record.
    #[error("not found")]
    NotFound,

    #[error("Failed to create PDF: {0}")]
    Pdf(String),

    #[error("Failed to process image: {0}")]
    Image(String),

    #[error("Failed to encode barcode: {0}")]
    Barcode(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for boarding-pass operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => Self::Status(code),
            ureq::Error::Transport(t) => Self::Network(t.to_string()),
        }
    }
}

impl From<::image::ImageError> for Error {
    fn from(err: ::image::ImageError) -> Self {
        Self::Image(err.to_string())
    }
}
