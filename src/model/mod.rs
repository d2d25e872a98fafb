//! Shared data types for inspection results.
//!
//! Geometry is kept free of any PDF-library types so report formatting and
//! the forward-looking newsletter schema stay independent of the backend.

mod geometry;
mod newsletter;

pub use geometry::Rect;
pub use newsletter::{LinkedImage, NewsletterSection};
