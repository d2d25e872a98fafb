//! Embedded image enumeration, pixel-map decoding, and PNG output.
//!
//! Images are image XObjects in the page resources. Materializing one
//! yields a [`Pixmap`]; pixmaps with four or more channels (alpha or CMYK)
//! are converted to 3-channel RGB before saving so the PNGs open anywhere.
//!
//! Every failure in this module is recoverable at the per-image level: the
//! inspector reports it and moves on to the next image.

use std::collections::HashSet;
use std::io::{self, Read};
use std::path::Path;

use flate2::read::ZlibDecoder;
use image::{GrayImage, RgbImage};
use log::debug;
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::document::PdfDocument;
use crate::error::{Error, Result};

/// A reference to an embedded image stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRef {
    /// Cross-reference identifier (the stream's object number), unique
    /// within the document.
    pub xref: u32,
    /// Full object id, including the generation number.
    pub id: ObjectId,
}

/// An in-memory decoded raster image.
#[derive(Debug, Clone)]
pub struct Pixmap {
    pub width: u32,
    pub height: u32,
    /// Channel count: 1 = gray, 3 = RGB, 4 = RGBA or CMYK.
    pub n: u8,
    /// True when the four channels are CMYK rather than RGBA.
    pub cmyk: bool,
    /// Row-major interleaved samples, 8 bits per channel.
    pub samples: Vec<u8>,
}

/// Enumerate the embedded images of a page, deduplicated by xref, in
/// resource-dictionary order.
///
/// Recurses one level into Form XObjects so images placed through a form
/// are found too. Unresolvable entries are skipped.
pub fn page_images(doc: &PdfDocument, page_id: ObjectId) -> Vec<ImageRef> {
    let raw = doc.raw();
    let mut images = Vec::new();
    let mut seen = HashSet::new();

    let Some(page_dict) = raw.get_dictionary(page_id).ok() else {
        return images;
    };
    collect_from_resources(raw, page_dict, &mut images, &mut seen, true);
    debug!("page object {:?}: {} images", page_id, images.len());
    images
}

fn collect_from_resources(
    doc: &LopdfDocument,
    holder: &Dictionary,
    images: &mut Vec<ImageRef>,
    seen: &mut HashSet<ObjectId>,
    descend_forms: bool,
) {
    let Some(resources) = dict_entry(doc, holder, b"Resources") else {
        return;
    };
    let Some(xobjects) = dict_entry(doc, resources, b"XObject") else {
        return;
    };

    for (_, entry) in xobjects.iter() {
        let Ok(id) = entry.as_reference() else {
            continue;
        };
        let Ok(Object::Stream(stream)) = doc.get_object(id) else {
            continue;
        };
        match stream.dict.get(b"Subtype") {
            Ok(Object::Name(name)) if name == b"Image" => {
                if seen.insert(id) {
                    images.push(ImageRef { xref: id.0, id });
                }
            }
            Ok(Object::Name(name)) if name == b"Form" && descend_forms => {
                collect_from_resources(doc, &stream.dict, images, seen, false);
            }
            _ => {}
        }
    }
}

/// Resolve a dictionary-valued entry that may be direct or an indirect
/// reference.
fn dict_entry<'a>(
    doc: &'a LopdfDocument,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Dictionary> {
    match dict.get(key).ok()? {
        Object::Reference(r) => doc.get_object(*r).ok()?.as_dict().ok(),
        Object::Dictionary(d) => Some(d),
        _ => None,
    }
}

impl Pixmap {
    /// Materialize the pixel map for an image cross-reference.
    pub fn from_xref(doc: &PdfDocument, image: &ImageRef) -> Result<Pixmap> {
        let obj = doc
            .raw()
            .get_object(image.id)
            .map_err(|e| Error::ImageExtract(e.to_string()))?;
        let stream = match obj {
            Object::Stream(s) => s,
            _ => return Err(Error::ImageExtract("not a stream object".to_string())),
        };

        let width = dimension(&stream.dict, b"Width")?;
        let height = dimension(&stream.dict, b"Height")?;

        // lopdf refuses to decompress `/Subtype /Image` streams, so the
        // filter chain is applied here, in order.
        let filters = image_filters(doc.raw(), &stream.dict);
        let mut data = stream.content.clone();
        for (i, filter) in filters.iter().enumerate() {
            match filter.as_str() {
                "FlateDecode" => {
                    data = inflate(&data)
                        .map_err(|e| Error::ImageExtract(format!("FlateDecode failed: {e}")))?;
                }
                "DCTDecode" if i + 1 == filters.len() => return Self::from_jpeg(&data),
                other => {
                    return Err(Error::UnsupportedImage(format!(
                        "unsupported image filter: {other}"
                    )))
                }
            }
        }
        Self::from_raw(doc.raw(), &stream.dict, width, height, data)
    }

    /// Decode a DCTDecode (JPEG) stream.
    fn from_jpeg(data: &[u8]) -> Result<Pixmap> {
        let img = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
            .map_err(|e| Error::ImageExtract(e.to_string()))?;
        let (width, height) = (img.width(), img.height());

        let pixmap = match img {
            image::DynamicImage::ImageLuma8(buf) => Pixmap {
                width,
                height,
                n: 1,
                cmyk: false,
                samples: buf.into_raw(),
            },
            image::DynamicImage::ImageRgb8(buf) => Pixmap {
                width,
                height,
                n: 3,
                cmyk: false,
                samples: buf.into_raw(),
            },
            other => Pixmap {
                width,
                height,
                n: 4,
                cmyk: false,
                samples: other.to_rgba8().into_raw(),
            },
        };
        Ok(pixmap)
    }

    /// Interpret an uncompressed (or Flate-decompressed) sample buffer
    /// using the stream's `/ColorSpace` and `/BitsPerComponent`.
    fn from_raw(
        doc: &LopdfDocument,
        dict: &Dictionary,
        width: u32,
        height: u32,
        mut data: Vec<u8>,
    ) -> Result<Pixmap> {
        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);
        if bits != 8 {
            return Err(Error::UnsupportedImage(format!(
                "unsupported bits per component: {bits}"
            )));
        }

        let cs = dict
            .get(b"ColorSpace")
            .map_err(|_| Error::ImageExtract("missing /ColorSpace".to_string()))?;
        let (n, cmyk) = channels_for_colorspace(doc, cs)?;

        let expected = width as usize * height as usize * n as usize;
        if data.len() < expected {
            return Err(Error::ImageExtract(format!(
                "truncated image data: {} of {} bytes",
                data.len(),
                expected
            )));
        }
        data.truncate(expected);

        Ok(Pixmap {
            width,
            height,
            n,
            cmyk,
            samples: data,
        })
    }

    /// Convert a 4-channel pixmap (alpha or CMYK) to 3-channel RGB.
    ///
    /// Pixmaps that already have fewer than four channels are returned
    /// unchanged.
    pub fn to_rgb(&self) -> Result<Pixmap> {
        if self.n < 4 {
            return Ok(self.clone());
        }
        if self.n != 4 {
            return Err(Error::UnsupportedImage(format!(
                "cannot convert {}-channel pixmap to RGB",
                self.n
            )));
        }

        let pixels = self.samples.len() / 4;
        let mut rgb = Vec::with_capacity(pixels * 3);
        if self.cmyk {
            for px in self.samples.chunks_exact(4) {
                let (c, m, y, k) = (px[0] as u32, px[1] as u32, px[2] as u32, px[3] as u32);
                rgb.push(((255 - c) * (255 - k) / 255) as u8);
                rgb.push(((255 - m) * (255 - k) / 255) as u8);
                rgb.push(((255 - y) * (255 - k) / 255) as u8);
            }
        } else {
            // RGBA: drop the alpha channel.
            for px in self.samples.chunks_exact(4) {
                rgb.extend_from_slice(&px[..3]);
            }
        }

        Ok(Pixmap {
            width: self.width,
            height: self.height,
            n: 3,
            cmyk: false,
            samples: rgb,
        })
    }

    /// Encode the pixmap as a PNG file at `path`.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        match self.n {
            1 => GrayImage::from_raw(self.width, self.height, self.samples.clone())
                .ok_or_else(|| Error::ImageEncode("sample buffer size mismatch".to_string()))?
                .save_with_format(path, image::ImageFormat::Png)
                .map_err(|e| Error::ImageEncode(e.to_string())),
            3 => RgbImage::from_raw(self.width, self.height, self.samples.clone())
                .ok_or_else(|| Error::ImageEncode("sample buffer size mismatch".to_string()))?
                .save_with_format(path, image::ImageFormat::Png)
                .map_err(|e| Error::ImageEncode(e.to_string())),
            n => Err(Error::UnsupportedImage(format!(
                "cannot encode {n}-channel pixmap as PNG"
            ))),
        }
    }
}

fn dimension(dict: &Dictionary, key: &[u8]) -> Result<u32> {
    dict.get(key)
        .ok()
        .and_then(|o| o.as_i64().ok())
        .filter(|v| *v > 0)
        .map(|v| v as u32)
        .ok_or_else(|| {
            Error::ImageExtract(format!("missing /{}", String::from_utf8_lossy(key)))
        })
}

/// The `/Filter` chain in application order; empty for unfiltered streams.
fn image_filters(doc: &LopdfDocument, dict: &Dictionary) -> Vec<String> {
    let Ok(obj) = dict.get(b"Filter") else {
        return Vec::new();
    };
    let obj = match obj {
        Object::Reference(r) => match doc.get_object(*r) {
            Ok(o) => o,
            Err(_) => return Vec::new(),
        },
        other => other,
    };
    match obj {
        Object::Name(name) => vec![String::from_utf8_lossy(name).into_owned()],
        Object::Array(arr) => arr
            .iter()
            .filter_map(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .collect(),
        _ => Vec::new(),
    }
}

fn inflate(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}

/// Channel count and CMYK flag for a `/ColorSpace` entry.
fn channels_for_colorspace(doc: &LopdfDocument, cs: &Object) -> Result<(u8, bool)> {
    let cs = match cs {
        Object::Reference(r) => doc
            .get_object(*r)
            .map_err(|e| Error::ImageExtract(e.to_string()))?,
        other => other,
    };

    match cs {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => Ok((1, false)),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Ok((3, false)),
            b"DeviceCMYK" | b"CMYK" => Ok((4, true)),
            other => Err(Error::UnsupportedImage(format!(
                "unsupported color space: {}",
                String::from_utf8_lossy(other)
            ))),
        },
        Object::Array(arr) => {
            let family = arr
                .first()
                .and_then(|o| o.as_name().ok())
                .unwrap_or(b"");
            match family {
                b"ICCBased" => icc_channels(doc, arr),
                other => Err(Error::UnsupportedImage(format!(
                    "unsupported color space: {}",
                    String::from_utf8_lossy(other)
                ))),
            }
        }
        _ => Err(Error::ImageExtract("malformed /ColorSpace".to_string())),
    }
}

/// `/N` of an ICCBased stream gives the component count.
fn icc_channels(doc: &LopdfDocument, arr: &[Object]) -> Result<(u8, bool)> {
    let stream_ref = arr
        .get(1)
        .and_then(|o| o.as_reference().ok())
        .ok_or_else(|| Error::ImageExtract("malformed ICCBased color space".to_string()))?;
    let obj = doc
        .get_object(stream_ref)
        .map_err(|e| Error::ImageExtract(e.to_string()))?;
    let n = match obj {
        Object::Stream(s) => s.dict.get(b"N").ok().and_then(|o| o.as_i64().ok()),
        _ => None,
    };
    match n {
        Some(1) => Ok((1, false)),
        Some(3) => Ok((3, false)),
        Some(4) => Ok((4, true)),
        other => Err(Error::UnsupportedImage(format!(
            "unsupported ICC component count: {other:?}"
        ))),
    }
}
