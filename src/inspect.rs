//! The inspection pipeline: one linear traversal over the document that
//! reports text spans, link annotations, and embedded images per page.
//!
//! All user-visible behavior flows through the writer and the filesystem;
//! the functions here return nothing else. Document-level failures
//! propagate; per-image failures are reported inline and never abort the
//! run.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::document::PdfDocument;
use crate::error::Result;
use crate::images::{self, ImageRef, Pixmap};
use crate::layout;
use crate::links;

/// Inspect the document and write the report to `out`.
///
/// Creates `output_dir` (and parents) if absent. Pages are processed
/// strictly sequentially in document order, with 1-based numbering in the
/// report.
pub fn inspect<W: Write>(doc: &PdfDocument, output_dir: &Path, out: &mut W) -> Result<()> {
    fs::create_dir_all(output_dir)?;

    for (page_num, page_id) in doc.pages() {
        writeln!(out, "--- Page {page_num} ---")?;

        for span in layout::extract_page_spans(doc, page_num)? {
            if span.text.trim().is_empty() {
                continue;
            }
            writeln!(
                out,
                "Text: {} | Size: {:.2} | Box: x0={:.2}, y0={:.2}, x1={:.2}, y1={:.2}",
                span.text, span.size, span.bbox.x0, span.bbox.y0, span.bbox.x1, span.bbox.y1
            )?;
        }

        for link in links::extract_page_links(doc, page_id) {
            writeln!(out, "Link: {} | Rect: {}", link.uri, link.rect)?;
        }

        for (idx, image) in images::page_images(doc, page_id).iter().enumerate() {
            let path = output_dir.join(format!("page{}_img{}.png", page_num, idx + 1));
            // One bad image never aborts the page or the document.
            match save_image(doc, image, &path) {
                Ok(()) => writeln!(out, "Image saved: {}", path.display())?,
                Err(e) => {
                    warn!("image xref {} failed: {}", image.xref, e);
                    writeln!(out, "Image extraction error (xref {}): {}", image.xref, e)?;
                }
            }
        }
    }

    debug!("inspection finished, output dir: {}", output_dir.display());
    Ok(())
}

/// Materialize, convert, and save one image; the pixmap is dropped as soon
/// as the PNG is written.
fn save_image(doc: &PdfDocument, image: &ImageRef, path: &Path) -> Result<()> {
    let mut pix = Pixmap::from_xref(doc, image)?;
    // Alpha or CMYK: convert to RGB for wide compatibility.
    if pix.n >= 4 {
        pix = pix.to_rgb()?;
    }
    pix.save_png(path)
}

/// Open the PDF at `path` and print its inspection report to stdout,
/// saving extracted images under `output_dir`.
pub fn inspect_file<P, Q>(path: P, output_dir: Q) -> Result<()>
where
    P: AsRef<Path>,
    Q: Into<PathBuf>,
{
    let doc = PdfDocument::open(path)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    inspect(&doc, &output_dir.into(), &mut out)
}
