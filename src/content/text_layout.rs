//! Text state machine: from show operators to page-space glyph boxes.
//!
//! Walks an operator sequence with a [`ParserState`], and for every glyph a
//! text-showing operator draws, computes where on the page it lands. The
//! output is a list of [`Letter`]s — one per decoded glyph — carrying the
//! Unicode value, the device-space bounding rectangle, and enough provenance
//! (operator index, TJ element index, byte index) for the redactor to take
//! individual glyphs back out of the stream.
//!
//! Invisible text (rendering mode 3) produces Letters like any other mode.
//! Redaction must see text that a copy-paste extractor would see, whether or
//! not it is painted.

use std::collections::HashSet;

use serde::Serialize;

use crate::content::graphics_state::{Matrix, ParserState};
use crate::content::operators::OperatorSequence;
use crate::content::registry::{Operation, OperatorRegistry, TextElement};
use crate::error::Diagnostic;
use crate::fonts::FontMetrics;
use crate::geometry::Rect;
use crate::page::PageResources;

/// One drawn glyph with its computed page-space box.
#[derive(Debug, Clone, Serialize)]
pub struct Letter {
    /// Decoded Unicode value of the glyph
    pub value: String,
    /// Bounding rectangle in page coordinates
    pub rect: Rect,
    /// Text rendering mode in effect (0..=7; 3 = invisible)
    pub rendering_mode: u8,
    /// Index of the producing operator within the sequence
    pub operator_index: usize,
    /// Text-space displacement this glyph moved the cursor
    /// (spacing and horizontal scaling applied)
    pub advance: f64,
    /// Index of the string element within a TJ array (0 for Tj, ', ")
    pub element_index: usize,
    /// Byte offset of the glyph code inside its string element
    pub byte_index: usize,
}

/// Letters plus the findings made while computing them.
#[derive(Debug, Clone, Default)]
pub struct LayoutOutcome {
    /// One entry per glyph, in drawing order
    pub letters: Vec<Letter>,
    /// Missing-font and related findings
    pub warnings: Vec<Diagnostic>,
}

impl LayoutOutcome {
    /// All letter values concatenated, in drawing order.
    pub fn text(&self) -> String {
        self.letters.iter().map(|l| l.value.as_str()).collect()
    }
}

/// Computes letters for operator sequences against one page's resources.
pub struct TextLayout<'a> {
    resources: &'a PageResources,
    registry: OperatorRegistry,
    fallback: FontMetrics,
}

impl<'a> TextLayout<'a> {
    /// Layout pass using the default operator registry.
    pub fn new(resources: &'a PageResources) -> Self {
        Self {
            resources,
            registry: OperatorRegistry::new(),
            fallback: FontMetrics::fallback(),
        }
    }

    /// Layout pass with a caller-configured registry.
    pub fn with_registry(resources: &'a PageResources, registry: OperatorRegistry) -> Self {
        Self {
            resources,
            registry,
            fallback: FontMetrics::fallback(),
        }
    }

    /// Compute the letters drawn by a sequence.
    pub fn letters(&self, sequence: &OperatorSequence) -> LayoutOutcome {
        let mut state = ParserState::new();
        let mut outcome = LayoutOutcome::default();
        let mut missing_fonts: HashSet<String> = HashSet::new();

        for (index, op) in sequence.iter().enumerate() {
            match self.registry.apply(op, &mut state) {
                Operation::ShowText(text)
                | Operation::NextLineShowText(text)
                | Operation::SetSpacingShowText { text, .. } => {
                    self.show_string(
                        &text,
                        index,
                        0,
                        &mut state,
                        &mut outcome,
                        &mut missing_fonts,
                    );
                }
                Operation::ShowTextAdjusted(elements) => {
                    for (element_index, element) in elements.iter().enumerate() {
                        match element {
                            TextElement::Text(text) => {
                                self.show_string(
                                    text,
                                    index,
                                    element_index,
                                    &mut state,
                                    &mut outcome,
                                    &mut missing_fonts,
                                );
                            }
                            TextElement::Adjustment(n) => {
                                // A TJ number shifts the cursor between
                                // strings; positive values move left.
                                let tx = -(n / 1000.0)
                                    * state.font_size
                                    * (state.horizontal_scaling / 100.0);
                                state.text_matrix =
                                    Matrix::translation(tx, 0.0).multiply(&state.text_matrix);
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        outcome
    }

    /// Draw one string: emit a letter per byte and advance the text matrix.
    fn show_string(
        &self,
        text: &[u8],
        operator_index: usize,
        element_index: usize,
        state: &mut ParserState,
        outcome: &mut LayoutOutcome,
        missing_fonts: &mut HashSet<String>,
    ) {
        let metrics = match &state.font_name {
            Some(name) => match self.resources.fonts.get(name) {
                Some(metrics) => metrics,
                None => {
                    if missing_fonts.insert(name.clone()) {
                        log::warn!("font resource /{} not found, approximating metrics", name);
                        outcome.warnings.push(Diagnostic::MissingFont { name: name.clone() });
                    }
                    &self.fallback
                }
            },
            None => &self.fallback,
        };

        let size = state.font_size;
        let scale = state.horizontal_scaling / 100.0;
        let (box_top, box_bottom) = match metrics.font_bbox() {
            Some(bbox) => (bbox.top, bbox.bottom),
            None => (metrics.ascent(), metrics.descent()),
        };

        for (byte_index, &code) in text.iter().enumerate() {
            let w0 = metrics.width(code);

            // Glyph box in text space, rise applied on Y.
            let glyph_box = Rect::new(
                0.0,
                box_bottom / 1000.0 * size + state.text_rise,
                w0 / 1000.0 * size * scale,
                box_top / 1000.0 * size + state.text_rise,
            );
            let rect = glyph_box.transform(&state.text_to_device());

            // Displacement per PDF 32000-1 9.4.4, word spacing only for
            // the single-byte code 32.
            let word = if code == 32 { state.word_spacing } else { 0.0 };
            let advance = ((w0 / 1000.0) * size + state.character_spacing + word) * scale;

            outcome.letters.push(Letter {
                value: metrics.to_unicode(code).to_string(),
                rect,
                rendering_mode: state.text_rendering_mode,
                operator_index,
                advance,
                element_index,
                byte_index,
            });

            state.text_matrix = Matrix::translation(advance, 0.0).multiply(&state.text_matrix);
        }
    }
}
