//! Forward-looking schema for assembling inspection output into a
//! structured newsletter document.
//!
//! Nothing in the inspection pipeline consumes these types yet; they define
//! the contract a future assembler would populate from extracted images and
//! text sections.

use serde::{Deserialize, Serialize};

/// An extracted image together with an optional hyperlink target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkedImage {
    /// Path of the saved image file.
    pub image_path: String,
    /// Hyperlink target, if the image region carried a link annotation.
    pub link_url: Option<String>,
    /// Alternative text for accessibility.
    pub alt_text: Option<String>,
}

impl LinkedImage {
    pub fn new(image_path: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
            link_url: None,
            alt_text: None,
        }
    }

    pub fn with_link(mut self, url: impl Into<String>) -> Self {
        self.link_url = Some(url.into());
        self
    }

    pub fn with_alt_text(mut self, alt: impl Into<String>) -> Self {
        self.alt_text = Some(alt.into());
        self
    }
}

/// One section of a newsletter: heading, optional subheading, body text,
/// and the images embedded in the section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsletterSection {
    pub heading: String,
    pub subheading: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub anchor_id: String,
    #[serde(default)]
    pub images: Vec<LinkedImage>,
}

impl NewsletterSection {
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            ..Default::default()
        }
    }

    pub fn with_subheading(mut self, subheading: impl Into<String>) -> Self {
        self.subheading = Some(subheading.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_image(mut self, image: LinkedImage) -> Self {
        self.images.push(image);
        self
    }
}
