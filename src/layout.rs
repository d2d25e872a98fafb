//! Text-span extraction from page content streams.
//!
//! Interprets the text-positioning and text-showing operators of a page's
//! content stream and recovers the spans a viewer would lay out: the decoded
//! text, the effective font size, and an approximate bounding box in page
//! coordinates. Glyph advance widths come from the font's `/Widths` array
//! when present, with a half-em fallback per character otherwise.

use std::collections::BTreeMap;

use log::debug;
use lopdf::{Dictionary, Document as LopdfDocument, Object};

use crate::document::PdfDocument;
use crate::error::{Error, Result};
use crate::model::Rect;

/// Fraction of the font size above the baseline covered by a span's box.
const ASCENT: f32 = 0.8;
/// Fraction of the font size below the baseline covered by a span's box.
const DESCENT: f32 = 0.2;

/// TJ adjustments larger than this (in 1/1000 text-space units) are treated
/// as word breaks.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A contiguous run of text with uniform styling.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    /// Decoded text content.
    pub text: String,
    /// Effective font size in points (`Tf` size scaled by the text matrix).
    pub size: f32,
    /// Approximate bounding box in page coordinates.
    pub bbox: Rect,
}

/// Extract all text spans from a page, in content-stream order.
///
/// Page numbers are 1-based, matching `PdfDocument::pages`.
pub fn extract_page_spans(doc: &PdfDocument, page_num: u32) -> Result<Vec<TextSpan>> {
    let pages = doc.pages();
    let page_id = *pages
        .get(&page_num)
        .ok_or(Error::PageOutOfRange(page_num, pages.len() as u32))?;

    // A page without fonts can still show text via an inherited resource
    // dictionary lopdf failed to resolve; fall back to simple decoding.
    let fonts = doc.raw().get_page_fonts(page_id).unwrap_or_default();
    let content = doc.page_content(page_id)?;

    let spans = parse_content_stream(doc.raw(), &content, &fonts)?;
    debug!("page {}: {} text spans", page_num, spans.len());
    Ok(spans)
}

/// Interpreter state for one content stream.
struct TextState {
    font_name: Vec<u8>,
    font_size: f32,
    matrix: TextMatrix,
    in_text: bool,
}

impl TextState {
    fn new() -> Self {
        Self {
            font_name: Vec::new(),
            font_size: 12.0,
            matrix: TextMatrix::default(),
            in_text: false,
        }
    }
}

fn parse_content_stream(
    doc: &LopdfDocument,
    content: &[u8],
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
) -> Result<Vec<TextSpan>> {
    if content.is_empty() {
        return Ok(Vec::new());
    }
    let content =
        lopdf::content::Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;

    let mut spans = Vec::new();
    let mut state = TextState::new();

    for op in content.operations {
        match op.operator.as_str() {
            "BT" => {
                state.in_text = true;
                state.matrix = TextMatrix::default();
            }
            "ET" => {
                state.in_text = false;
            }
            "Tf" => {
                if op.operands.len() >= 2 {
                    if let Object::Name(name) = &op.operands[0] {
                        state.font_name = name.clone();
                    }
                    state.font_size = get_number(&op.operands[1]).unwrap_or(12.0);
                }
            }
            "Td" | "TD" => {
                if op.operands.len() >= 2 {
                    let tx = get_number(&op.operands[0]).unwrap_or(0.0);
                    let ty = get_number(&op.operands[1]).unwrap_or(0.0);
                    state.matrix.translate(tx, ty);
                }
            }
            "Tm" => {
                if op.operands.len() >= 6 {
                    state.matrix.set(
                        get_number(&op.operands[0]).unwrap_or(1.0),
                        get_number(&op.operands[1]).unwrap_or(0.0),
                        get_number(&op.operands[2]).unwrap_or(0.0),
                        get_number(&op.operands[3]).unwrap_or(1.0),
                        get_number(&op.operands[4]).unwrap_or(0.0),
                        get_number(&op.operands[5]).unwrap_or(0.0),
                    );
                }
            }
            "T*" => {
                state.matrix.next_line();
            }
            "Tj" | "TJ" => {
                if state.in_text {
                    let (text, advance) = if op.operator == "TJ" {
                        match op.operands.first() {
                            Some(Object::Array(arr)) => show_text_array(doc, fonts, &state, arr),
                            _ => (String::new(), 0.0),
                        }
                    } else {
                        match op.operands.first() {
                            Some(Object::String(bytes, _)) => {
                                show_text(doc, fonts, &state, bytes)
                            }
                            _ => (String::new(), 0.0),
                        }
                    };
                    emit_span(&mut spans, &mut state, text, advance);
                }
            }
            "'" | "\"" => {
                state.matrix.next_line();
                if state.in_text {
                    let text_idx = if op.operator == "\"" { 2 } else { 0 };
                    if let Some(Object::String(bytes, _)) = op.operands.get(text_idx) {
                        let (text, advance) = show_text(doc, fonts, &state, bytes);
                        emit_span(&mut spans, &mut state, text, advance);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}

/// Record a span at the current pen position and advance the pen past it.
///
/// `advance` is in unscaled text-space units; the matrix scale is applied
/// when the device-space box is computed.
fn emit_span(spans: &mut Vec<TextSpan>, state: &mut TextState, text: String, advance: f32) {
    let scale = state.matrix.scale();
    let size = state.font_size * scale;
    let (x, y) = state.matrix.position();

    if !text.is_empty() {
        spans.push(TextSpan {
            text,
            size,
            bbox: Rect::new(x, y - size * DESCENT, x + advance * scale, y + size * ASCENT),
        });
    }
    state.matrix.advance(advance);
}

/// Decode and measure a single shown string (`Tj`, `'`, `"`).
fn show_text(
    doc: &LopdfDocument,
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
    state: &TextState,
    bytes: &[u8],
) -> (String, f32) {
    let font = fonts.get(&state.font_name);
    let text = decode_bytes(doc, font.copied(), bytes);
    let advance = advance_width(doc, font.copied(), bytes, &text, state.font_size);
    (text, advance)
}

/// Decode and measure a `TJ` array of strings and kerning adjustments.
///
/// Adjustments are in 1/1000 text-space units; negative values advance the
/// pen. Large negative values usually mark word spaces, so those also get a
/// space character in the decoded text.
fn show_text_array(
    doc: &LopdfDocument,
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
    state: &TextState,
    arr: &[Object],
) -> (String, f32) {
    let font = fonts.get(&state.font_name).copied();
    let mut combined = String::new();
    let mut advance = 0.0f32;

    for item in arr {
        match item {
            Object::String(bytes, _) => {
                let decoded = decode_bytes(doc, font, bytes);
                advance += advance_width(doc, font, bytes, &decoded, state.font_size);
                combined.push_str(&decoded);
            }
            Object::Integer(n) => {
                advance += apply_adjustment(&mut combined, -(*n as f32), state.font_size);
            }
            Object::Real(n) => {
                advance += apply_adjustment(&mut combined, -n, state.font_size);
            }
            _ => {}
        }
    }

    (combined, advance)
}

fn apply_adjustment(combined: &mut String, adjustment: f32, font_size: f32) -> f32 {
    if adjustment > TJ_SPACE_THRESHOLD && !combined.is_empty() && !combined.ends_with(' ') {
        combined.push(' ');
    }
    adjustment / 1000.0 * font_size
}

/// Decode text bytes with the font's encoding, falling back to byte-level
/// heuristics when the font carries none.
fn decode_bytes(doc: &LopdfDocument, font: Option<&Dictionary>, bytes: &[u8]) -> String {
    if let Some(font) = font {
        if let Ok(enc) = font.get_font_encoding(doc) {
            if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                return text;
            }
        }
    }
    decode_text_simple(bytes)
}

/// Advance width of a shown string in unscaled text-space units.
///
/// Uses the font's `/Widths` array (indexed from `/FirstChar`, in 1/1000 em)
/// when available; otherwise estimates half an em per decoded character.
fn advance_width(
    doc: &LopdfDocument,
    font: Option<&Dictionary>,
    bytes: &[u8],
    decoded: &str,
    font_size: f32,
) -> f32 {
    if let Some(font) = font {
        if let Some(width) = widths_advance(doc, font, bytes) {
            return width / 1000.0 * font_size;
        }
    }
    decoded.chars().count() as f32 * 0.5 * font_size
}

fn widths_advance(doc: &LopdfDocument, font: &Dictionary, bytes: &[u8]) -> Option<f32> {
    let first_char = font.get(b"FirstChar").ok().and_then(|o| o.as_i64().ok())?;
    let widths_obj = match font.get(b"Widths").ok()? {
        Object::Reference(r) => doc.get_object(*r).ok()?,
        other => other,
    };
    let widths = widths_obj.as_array().ok()?;

    let missing = font
        .get(b"MissingWidth")
        .ok()
        .and_then(get_number)
        .unwrap_or(500.0);

    let mut total = 0.0f32;
    for &code in bytes {
        let idx = code as i64 - first_char;
        let w = if idx >= 0 && (idx as usize) < widths.len() {
            get_number(&widths[idx as usize]).unwrap_or(missing)
        } else {
            missing
        };
        total += w;
    }
    Some(total)
}

/// Text matrix tracking both the line origin and the pen position.
///
/// `Td`, `TD`, and `T*` are relative to the start of the current line, not
/// to wherever shown text left the pen, so the line origin is kept
/// separately and the pen snaps back to it on every line move.
#[derive(Debug, Clone)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    line_e: f32,
    line_f: f32,
    pen_e: f32,
    pen_f: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            line_e: 0.0,
            line_f: 0.0,
            pen_e: 0.0,
            pen_f: 0.0,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.line_e = e;
        self.line_f = f;
        self.pen_e = e;
        self.pen_f = f;
    }

    /// Move the line origin by `(tx, ty)` and reset the pen to it.
    fn translate(&mut self, tx: f32, ty: f32) {
        self.line_e += tx * self.a + ty * self.c;
        self.line_f += tx * self.b + ty * self.d;
        self.pen_e = self.line_e;
        self.pen_f = self.line_f;
    }

    /// Advance the pen along the baseline by `w` text-space units.
    fn advance(&mut self, w: f32) {
        self.pen_e += w * self.a;
        self.pen_f += w * self.b;
    }

    fn next_line(&mut self) {
        // Default leading; a TL operator would override this in a fuller
        // interpreter, but spans keep their own baselines either way.
        self.translate(0.0, -12.0);
    }

    fn position(&self) -> (f32, f32) {
        (self.pen_e, self.pen_f)
    }

    fn scale(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }
}

/// Helper to extract a number from a PDF object.
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Simple text decoding fallback when no encoding is available.
fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM marker
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|c| {
                if c.len() == 2 {
                    Some(u16::from_be_bytes([c[0], c[1]]))
                } else {
                    None
                }
            })
            .collect();
        return String::from_utf16(&utf16).unwrap_or_default();
    }

    if let Ok(s) = String::from_utf8(bytes.to_vec()) {
        return s;
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}
