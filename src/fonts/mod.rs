//! Font metrics supplied by the document layer.
//!
//! The core never parses font programs. For each font resource a page uses,
//! the enclosing document layer hands over a [`FontMetrics`]: per-byte-code
//! advance widths, the font bounding box, vertical metrics, and an optional
//! byte-to-Unicode table. All width values are in glyph space, thousandths
//! of an em, the way PDF font dictionaries store them.

use std::collections::HashMap;

use crate::geometry::Rect;

/// Fallback advance width when a font or a width entry is missing,
/// in glyph-space units: 500/1000 em, i.e. half the font size.
pub const FALLBACK_WIDTH: f64 = 500.0;

/// Fallback ascent in glyph-space units.
pub const FALLBACK_ASCENT: f64 = 800.0;

/// Fallback descent in glyph-space units (negative, below the baseline).
pub const FALLBACK_DESCENT: f64 = -200.0;

/// Metrics for one font resource.
#[derive(Debug, Clone)]
pub struct FontMetrics {
    /// Advance widths indexed by byte code, glyph-space ×1000 units.
    widths: HashMap<u8, f64>,
    /// Width used for codes absent from `widths`.
    default_width: f64,
    /// Font bounding box in glyph-space ×1000 units, when known.
    font_bbox: Option<Rect>,
    /// Ascent above the baseline, glyph-space ×1000 units.
    ascent: f64,
    /// Descent below the baseline (negative), glyph-space ×1000 units.
    descent: f64,
    /// Byte code to Unicode, when the font carries an encoding.
    encoding: Option<HashMap<u8, char>>,
}

impl FontMetrics {
    /// Metrics with one uniform advance width and fallback vertical metrics.
    ///
    /// Handy for tests and for the simple fonts the document layer cannot
    /// fully resolve.
    pub fn monospaced(width: f64) -> Self {
        Self {
            widths: HashMap::new(),
            default_width: width,
            font_bbox: None,
            ascent: FALLBACK_ASCENT,
            descent: FALLBACK_DESCENT,
            encoding: None,
        }
    }

    /// The metrics used when a page references a font its resources do not
    /// carry: half-em advances, generic vertical extent.
    pub fn fallback() -> Self {
        Self::monospaced(FALLBACK_WIDTH)
    }

    /// Set the advance width for one byte code.
    pub fn with_width(mut self, code: u8, width: f64) -> Self {
        self.widths.insert(code, width);
        self
    }

    /// Set the advance widths for a contiguous range starting at `first`.
    ///
    /// This is the shape of the /Widths array in a font dictionary.
    pub fn with_widths(mut self, first: u8, widths: &[f64]) -> Self {
        for (i, &w) in widths.iter().enumerate() {
            let code = first as usize + i;
            if code > u8::MAX as usize {
                break;
            }
            self.widths.insert(code as u8, w);
        }
        self
    }

    /// Set the font bounding box (glyph-space ×1000 units).
    pub fn with_bbox(mut self, bbox: Rect) -> Self {
        self.font_bbox = Some(bbox);
        self
    }

    /// Set ascent and descent (glyph-space ×1000 units, descent negative).
    pub fn with_vertical_metrics(mut self, ascent: f64, descent: f64) -> Self {
        self.ascent = ascent;
        self.descent = descent;
        self
    }

    /// Set the byte-to-Unicode table.
    pub fn with_encoding(mut self, encoding: HashMap<u8, char>) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Advance width for a byte code, glyph-space ×1000 units.
    pub fn width(&self, code: u8) -> f64 {
        self.widths.get(&code).copied().unwrap_or(self.default_width)
    }

    /// Font bounding box, when known.
    pub fn font_bbox(&self) -> Option<Rect> {
        self.font_bbox
    }

    /// Ascent above the baseline, glyph-space ×1000 units.
    pub fn ascent(&self) -> f64 {
        self.ascent
    }

    /// Descent below the baseline (negative), glyph-space ×1000 units.
    pub fn descent(&self) -> f64 {
        self.descent
    }

    /// Unicode value for a byte code.
    ///
    /// Uses the font's encoding table when present; otherwise the byte is
    /// read as Latin-1, which is correct for the standard simple fonts and
    /// a usable approximation elsewhere.
    pub fn to_unicode(&self, code: u8) -> char {
        if let Some(encoding) = &self.encoding {
            if let Some(&ch) = encoding.get(&code) {
                return ch;
            }
        }
        code as char
    }
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self::fallback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monospaced_width() {
        let font = FontMetrics::monospaced(600.0);
        assert_eq!(font.width(b'A'), 600.0);
        assert_eq!(font.width(0xFF), 600.0);
    }

    #[test]
    fn test_specific_widths_override_default() {
        let font = FontMetrics::monospaced(500.0)
            .with_width(b'i', 250.0)
            .with_width(b'W', 900.0);
        assert_eq!(font.width(b'i'), 250.0);
        assert_eq!(font.width(b'W'), 900.0);
        assert_eq!(font.width(b'x'), 500.0);
    }

    #[test]
    fn test_widths_array_shape() {
        // /FirstChar 65 /Widths [100 200 300]
        let font = FontMetrics::monospaced(500.0).with_widths(65, &[100.0, 200.0, 300.0]);
        assert_eq!(font.width(65), 100.0);
        assert_eq!(font.width(66), 200.0);
        assert_eq!(font.width(67), 300.0);
        assert_eq!(font.width(68), 500.0);
    }

    #[test]
    fn test_fallback_metrics() {
        let font = FontMetrics::fallback();
        assert_eq!(font.width(b'A'), FALLBACK_WIDTH);
        assert_eq!(font.ascent(), FALLBACK_ASCENT);
        assert_eq!(font.descent(), FALLBACK_DESCENT);
        assert!(font.font_bbox().is_none());
    }

    #[test]
    fn test_to_unicode_latin1_without_encoding() {
        let font = FontMetrics::fallback();
        assert_eq!(font.to_unicode(b'A'), 'A');
        assert_eq!(font.to_unicode(0xE9), 'é');
    }

    #[test]
    fn test_to_unicode_with_encoding_table() {
        let mut table = HashMap::new();
        table.insert(0x01u8, '→');
        let font = FontMetrics::fallback().with_encoding(table);
        assert_eq!(font.to_unicode(0x01), '→');
        // Codes outside the table still fall back to Latin-1.
        assert_eq!(font.to_unicode(b'Z'), 'Z');
    }

    #[test]
    fn test_vertical_metrics() {
        let font = FontMetrics::monospaced(500.0).with_vertical_metrics(718.0, -207.0);
        assert_eq!(font.ascent(), 718.0);
        assert_eq!(font.descent(), -207.0);
    }
}
