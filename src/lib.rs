//! # pdfscope
//!
//! Structured inspection of PDF documents for debugging and
//! content-extraction prototyping.
//!
//! Opens a PDF and produces a line-oriented report of its low-level
//! contents:
//!
//! - text spans with font size and bounding box,
//! - hyperlink annotations with URI and rectangle,
//! - embedded images, extracted and saved as PNG files.
//!
//! ## Quick Start
//!
//! ```no_run
//! fn main() -> pdfscope::Result<()> {
//!     // Prints the report to stdout, saves images under ./images
//!     pdfscope::inspect_file("document.pdf", "images")
//! }
//! ```
//!
//! For tests or custom sinks, open the document yourself and pass any
//! writer:
//!
//! ```no_run
//! use pdfscope::{inspect, PdfDocument};
//! use std::path::Path;
//!
//! fn main() -> pdfscope::Result<()> {
//!     let doc = PdfDocument::open("document.pdf")?;
//!     let mut report = Vec::new();
//!     inspect(&doc, Path::new("images"), &mut report)?;
//!     println!("{}", String::from_utf8_lossy(&report));
//!     Ok(())
//! }
//! ```

pub mod document;
pub mod error;
pub mod images;
pub mod inspect;
pub mod layout;
pub mod links;
pub mod model;

// Re-export commonly used types
pub use document::PdfDocument;
pub use error::{Error, Result};
pub use images::{ImageRef, Pixmap};
pub use inspect::{inspect, inspect_file};
pub use layout::TextSpan;
pub use links::LinkAnnotation;
pub use model::{LinkedImage, NewsletterSection, Rect};
