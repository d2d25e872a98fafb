//! Error types for the pdfscope library.

use std::io;
use thiserror::Error;

/// Result type alias for pdfscope operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during PDF inspection.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading the document or writing report output.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted and cannot be inspected.
    #[error("Document is encrypted")]
    Encrypted,

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Error materializing an image's pixel map.
    #[error("{0}")]
    ImageExtract(String),

    /// The image uses a filter or layout the inspector cannot decode.
    #[error("{0}")]
    UnsupportedImage(String),

    /// Error encoding a pixel map to PNG.
    #[error("PNG encoding error: {0}")]
    ImageEncode(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}
