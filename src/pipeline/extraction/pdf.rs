//! Glyph-run extraction from a PDF text layer using lopdf.
//!
//! Each page's content stream is walked with a reduced text-state machine
//! that tracks the current transformation matrix and the text matrix, and
//! one [`GlyphRun`] is emitted per show-text operator at its user-space
//! origin. Strings are decoded through the font selected by `Tf`: lopdf
//! resolves its `/ToUnicode` CMap or named `/Encoding`, and simple fonts
//! without either fall back to Windows-1252. Glyph widths are not resolved;
//! the pen advance after a string is approximated from the font size, which
//! is enough to keep later runs on the same line to the right of earlier ones.

use std::collections::BTreeMap;

use encoding_rs::WINDOWS_1252;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Encoding, Object, ObjectId};

use super::types::{GlyphRun, GlyphRunSource};
use super::ExtractionError;

/// Approximate advance of one glyph as a fraction of the font size.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// TJ adjustment (thousandths of an em) beyond which a word gap is assumed.
const TJ_SPACE_THRESHOLD: f32 = -200.0;

const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// PDF glyph-run extractor backed by lopdf. Handles digital PDFs only; a
/// scanned PDF parses fine and simply yields no runs.
pub struct LopdfGlyphSource;

impl GlyphRunSource for LopdfGlyphSource {
    fn glyph_runs(&self, pdf_bytes: &[u8]) -> Result<Vec<GlyphRun>, ExtractionError> {
        let doc = Document::load_mem(pdf_bytes)
            .map_err(|e| ExtractionError::MalformedPdf(e.to_string()))?;

        let mut runs = Vec::new();
        for (page_number, page_id) in doc.get_pages() {
            let raw = match doc.get_page_content(page_id) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(page = page_number, error = %e, "Skipping unreadable page content");
                    continue;
                }
            };
            let content = match Content::decode(&raw) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(page = page_number, error = %e, "Skipping undecodable content stream");
                    continue;
                }
            };
            let fonts = page_fonts(&doc, page_number, page_id);
            let before = runs.len();
            walk_operations(page_number, &content, &fonts, &mut runs);
            tracing::debug!(page = page_number, runs = runs.len() - before, "Page glyph runs");
        }

        Ok(runs)
    }
}

/// How strings shown with one font become text.
enum FontDecoder<'a> {
    /// lopdf resolved a ToUnicode CMap or a named one-byte encoding.
    Mapped(Encoding<'a>),
    /// Simple font with no usable encoding entry.
    WinAnsi,
    /// Composite font without a ToUnicode map: glyph ids carry no text.
    Undecodable,
}

impl FontDecoder<'_> {
    fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Self::Mapped(encoding) => Document::decode_text(encoding, bytes)
                .unwrap_or_else(|_| decode_win_ansi(bytes)),
            Self::WinAnsi => decode_win_ansi(bytes),
            Self::Undecodable => String::new(),
        }
    }
}

/// Decoders for every font in the page resources, keyed by resource name.
fn page_fonts<'a>(
    doc: &'a Document,
    page_number: u32,
    page_id: ObjectId,
) -> BTreeMap<Vec<u8>, FontDecoder<'a>> {
    let fonts = match doc.get_page_fonts(page_id) {
        Ok(fonts) => fonts,
        Err(e) => {
            tracing::warn!(page = page_number, error = %e, "Page fonts unreadable, decoding as WinAnsi");
            return BTreeMap::new();
        }
    };
    fonts
        .into_iter()
        .map(|(name, font)| (name, font_decoder(doc, font)))
        .collect()
}

fn font_decoder<'a>(doc: &'a Document, font: &'a Dictionary) -> FontDecoder<'a> {
    let is_composite = font
        .get(b"Subtype")
        .and_then(Object::as_name)
        .is_ok_and(|subtype| subtype == b"Type0");
    let has_named_encoding = font.get(b"Encoding").and_then(Object::as_name).is_ok();
    if (!is_composite && !has_named_encoding) || !font.type_is(b"Font") {
        return FontDecoder::WinAnsi;
    }

    match font.get_font_encoding(doc) {
        Ok(encoding) => FontDecoder::Mapped(encoding),
        Err(e) if is_composite => {
            tracing::warn!(error = %e, "Composite font without a usable ToUnicode map, skipping its text");
            FontDecoder::Undecodable
        }
        Err(_) => FontDecoder::WinAnsi,
    }
}

/// Mutable state tracked while walking a page's content stream.
#[derive(Debug, Clone)]
struct TextState {
    ctm: [f32; 6],
    ctm_stack: Vec<[f32; 6]>,
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    font_size: f32,
    leading: f32,
    horiz_scale: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            ctm: IDENTITY,
            ctm_stack: Vec::new(),
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            font_size: 0.0,
            leading: 0.0,
            horiz_scale: 1.0,
        }
    }
}

impl TextState {
    /// Text-space origin mapped through the CTM into user space.
    fn origin(&self) -> (f32, f32) {
        let (tx, ty) = (self.text_matrix[4], self.text_matrix[5]);
        let m = &self.ctm;
        (m[0] * tx + m[2] * ty + m[4], m[1] * tx + m[3] * ty + m[5])
    }

    fn translate_line(&mut self, tx: f32, ty: f32) {
        let m = &self.line_matrix;
        let new_tx = m[0] * tx + m[2] * ty + m[4];
        let new_ty = m[1] * tx + m[3] * ty + m[5];
        self.line_matrix[4] = new_tx;
        self.line_matrix[5] = new_ty;
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.translate_line(0.0, -self.leading);
    }

    fn advance(&mut self, text: &str) {
        let dx = text.chars().count() as f32
            * self.font_size
            * APPROX_CHAR_WIDTH_RATIO
            * self.horiz_scale;
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    fn emit(&mut self, page: u32, text: String, runs: &mut Vec<GlyphRun>) {
        if text.trim().is_empty() {
            self.advance(&text);
            return;
        }
        let (x, y) = self.origin();
        self.advance(&text);
        runs.push(GlyphRun { page, x, y, text });
    }
}

/// `[a b c d e f]` × `[a' b' c' d' e' f']` in PDF row-vector convention.
fn multiply(lhs: &[f32; 6], rhs: &[f32; 6]) -> [f32; 6] {
    [
        lhs[0] * rhs[0] + lhs[1] * rhs[2],
        lhs[0] * rhs[1] + lhs[1] * rhs[3],
        lhs[2] * rhs[0] + lhs[3] * rhs[2],
        lhs[2] * rhs[1] + lhs[3] * rhs[3],
        lhs[4] * rhs[0] + lhs[5] * rhs[2] + rhs[4],
        lhs[4] * rhs[1] + lhs[5] * rhs[3] + rhs[5],
    ]
}

fn number(obj: &Object) -> Option<f32> {
    obj.as_float().ok()
}

fn six_numbers(operands: &[Object]) -> Option<[f32; 6]> {
    if operands.len() < 6 {
        return None;
    }
    let vals: Vec<f32> = operands.iter().take(6).filter_map(number).collect();
    (vals.len() == 6).then(|| [vals[0], vals[1], vals[2], vals[3], vals[4], vals[5]])
}

fn walk_operations(
    page: u32,
    content: &Content,
    fonts: &BTreeMap<Vec<u8>, FontDecoder<'_>>,
    runs: &mut Vec<GlyphRun>,
) {
    let mut state = TextState::default();
    let mut font: Option<&FontDecoder<'_>> = None;

    for op in &content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => state.ctm_stack.push(state.ctm),
            "Q" => {
                if let Some(ctm) = state.ctm_stack.pop() {
                    state.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = six_numbers(operands) {
                    state.ctm = multiply(&m, &state.ctm);
                }
            }
            "BT" => {
                state.text_matrix = IDENTITY;
                state.line_matrix = IDENTITY;
            }
            "Tf" => {
                font = operands
                    .first()
                    .and_then(|name| name.as_name().ok())
                    .and_then(|name| fonts.get(name));
                if let Some(size) = operands.get(1).and_then(number) {
                    state.font_size = size;
                }
            }
            "Tm" => {
                if let Some(m) = six_numbers(operands) {
                    state.text_matrix = m;
                    state.line_matrix = m;
                }
            }
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (
                    operands.first().and_then(number),
                    operands.get(1).and_then(number),
                ) {
                    if op.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.translate_line(tx, ty);
                }
            }
            "TL" => {
                if let Some(v) = operands.first().and_then(number) {
                    state.leading = v;
                }
            }
            "Tz" => {
                if let Some(v) = operands.first().and_then(number) {
                    state.horiz_scale = v / 100.0;
                }
            }
            "T*" => state.next_line(),
            "Tj" => {
                if let Some(text) = operands.first().and_then(|obj| decode_string(obj, font)) {
                    state.emit(page, text, runs);
                }
            }
            "'" => {
                state.next_line();
                if let Some(text) = operands.first().and_then(|obj| decode_string(obj, font)) {
                    state.emit(page, text, runs);
                }
            }
            "\"" => {
                state.next_line();
                if let Some(text) = operands.get(2).and_then(|obj| decode_string(obj, font)) {
                    state.emit(page, text, runs);
                }
            }
            "TJ" => {
                if let Some(Object::Array(parts)) = operands.first() {
                    let text = join_tj_array(parts, font);
                    state.emit(page, text, runs);
                }
            }
            _ => {}
        }
    }
}

/// Concatenate a TJ array, turning large negative kerning into a space.
fn join_tj_array(parts: &[Object], font: Option<&FontDecoder<'_>>) -> String {
    let mut text = String::new();
    for part in parts {
        match part {
            Object::String(..) => {
                if let Some(s) = decode_string(part, font) {
                    text.push_str(&s);
                }
            }
            other => {
                if let Some(adjust) = number(other) {
                    if adjust < TJ_SPACE_THRESHOLD && !text.ends_with(' ') {
                        text.push(' ');
                    }
                }
            }
        }
    }
    text
}

/// Decode a string operand with the current font; without one, as WinAnsi.
fn decode_string(obj: &Object, font: Option<&FontDecoder<'_>>) -> Option<String> {
    let Object::String(bytes, _) = obj else {
        return None;
    };
    Some(match font {
        Some(decoder) => decoder.decode(bytes),
        None => decode_win_ansi(bytes),
    })
}

/// UTF-16BE when the string carries a BOM, otherwise Windows-1252.
fn decode_win_ansi(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFEu8, 0xFF][..]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned()
}
