//! Document access layer wrapping `lopdf::Document`.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use lopdf::{Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};

/// An opened PDF document.
///
/// Owns the parsed object graph for the duration of one inspection run.
/// All native resources are released when the value is dropped.
#[derive(Debug)]
pub struct PdfDocument {
    doc: LopdfDocument,
}

impl PdfDocument {
    /// Open a document from a file path.
    ///
    /// Fails if the file cannot be read or is not a well-formed PDF; this
    /// is the fatal, document-level failure mode and is never retried.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let doc = LopdfDocument::load(path).map_err(|e| match e {
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::from(e),
        })?;
        Ok(Self { doc })
    }

    /// Open a document from an in-memory byte slice.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data).map_err(|e| match e {
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::from(e),
        })?;
        Ok(Self { doc })
    }

    /// Open a document from a reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    /// All pages as (1-based page number → object id), in document order.
    pub fn pages(&self) -> BTreeMap<u32, ObjectId> {
        self.doc.get_pages()
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Check if the document is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// PDF version string from the header.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    /// Direct access to the underlying `lopdf::Document`.
    ///
    /// Escape hatch for object-level operations (fonts, annotations,
    /// XObject streams).
    pub fn raw(&self) -> &LopdfDocument {
        &self.doc
    }

    /// The decompressed content stream bytes for a page.
    ///
    /// A page without a `/Contents` entry yields an empty stream, not an
    /// error; an image-only page is still a valid page.
    pub(crate) fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let contents = match page_dict.get(b"Contents") {
            Ok(obj) => obj,
            Err(_) => return Ok(Vec::new()),
        };

        match contents {
            Object::Reference(r) => {
                if let Ok(Object::Stream(s)) = self.doc.get_object(*r) {
                    return stream_bytes(s);
                }
                Err(Error::PdfParse("invalid content stream".to_string()))
            }
            Object::Stream(s) => stream_bytes(s),
            Object::Array(arr) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Object::Reference(r) = obj {
                        if let Ok(Object::Stream(s)) = self.doc.get_object(*r) {
                            if let Ok(data) = stream_bytes(s) {
                                content.extend_from_slice(&data);
                                content.push(b' ');
                            }
                        }
                    }
                }
                Ok(content)
            }
            _ => Err(Error::PdfParse("invalid content stream".to_string())),
        }
    }
}

/// Content bytes of a stream: decoded when a `/Filter` is present, the raw
/// bytes otherwise. An unfiltered content stream is a valid, common shape;
/// `decompressed_content` errors on the missing key rather than passing the
/// bytes through.
fn stream_bytes(s: &lopdf::Stream) -> Result<Vec<u8>> {
    if s.dict.has(b"Filter") {
        s.decompressed_content()
            .map_err(|e| Error::PdfParse(e.to_string()))
    } else {
        Ok(s.content.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file_is_fatal() {
        let err = PdfDocument::open("/nonexistent/no-such.pdf").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(PdfDocument::from_bytes(b"not a pdf at all").is_err());
    }
}
