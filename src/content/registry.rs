//! Operator registry and handlers.
//!
//! One handler per content-stream operator. A handler is a pure function of
//! `(operands, state)`: it updates the [`ParserState`] and reports an
//! [`Operation`] describing what the operator means to higher layers. The
//! text layout machine consumes the `Operation`s; everything else only needs
//! the state side effects.
//!
//! Handlers tolerate malformed input: when the operand list is too short or
//! of the wrong types, the state update is skipped and the operator passes
//! through untouched. Unknown operators have no handler and no effect.
//!
//! The registry is open. [`OperatorRegistry::register`] installs or replaces
//! a handler before parsing; the last registration for a name wins.

use std::collections::HashMap;

use crate::content::graphics_state::{ColorValue, Matrix, ParserState};
use crate::content::operators::Operator;
use crate::object::Object;

/// Semantic meaning of an executed operator, for layers that need more than
/// the state side effects. Most operators are fully described by what they
/// do to the state and report [`Operation::None`].
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// No semantic payload beyond the state update
    None,
    /// BT
    BeginText,
    /// ET
    EndText,
    /// Tj — show a string
    ShowText(Vec<u8>),
    /// TJ — show strings with interleaved position adjustments
    ShowTextAdjusted(Vec<TextElement>),
    /// ' — the line move has already been applied to the state
    NextLineShowText(Vec<u8>),
    /// " — spacing set and line move applied already
    SetSpacingShowText {
        /// Word spacing that was set (aw)
        word_spacing: f64,
        /// Character spacing that was set (ac)
        character_spacing: f64,
        /// The string to show
        text: Vec<u8>,
    },
}

/// Element of a TJ array.
#[derive(Debug, Clone, PartialEq)]
pub enum TextElement {
    /// A string of glyph codes
    Text(Vec<u8>),
    /// Position adjustment in thousandths of text-space units
    /// (positive moves the next glyph left)
    Adjustment(f64),
}

/// Handler signature: operands in source order, mutable pass state.
pub type Handler = fn(&[Object], &mut ParserState) -> Operation;

/// Operand fetch helpers. Operands sit nearest the operator at the END of
/// the list, so position is counted from the end; extra leading junk from a
/// sloppy generator is then ignored rather than shifting every operand.
fn arg(operands: &[Object], from_end: usize) -> Option<&Object> {
    operands
        .len()
        .checked_sub(from_end + 1)
        .and_then(|i| operands.get(i))
}

fn num(operands: &[Object], from_end: usize) -> Option<f64> {
    arg(operands, from_end).and_then(Object::as_number)
}

fn string_bytes(operands: &[Object], from_end: usize) -> Option<Vec<u8>> {
    arg(operands, from_end).and_then(|o| o.as_string_bytes().map(<[u8]>::to_vec))
}

// ---------------------------------------------------------------------------
// Text object
// ---------------------------------------------------------------------------

fn handle_begin_text(_: &[Object], state: &mut ParserState) -> Operation {
    state.in_text_object = true;
    state.text_matrix = Matrix::identity();
    state.text_line_matrix = Matrix::identity();
    Operation::BeginText
}

fn handle_end_text(_: &[Object], state: &mut ParserState) -> Operation {
    state.in_text_object = false;
    Operation::EndText
}

// ---------------------------------------------------------------------------
// Text state
// ---------------------------------------------------------------------------

fn handle_set_font(operands: &[Object], state: &mut ParserState) -> Operation {
    if let (Some(name), Some(size)) = (
        arg(operands, 1).and_then(Object::as_name),
        num(operands, 0),
    ) {
        state.font_name = Some(name.to_string());
        state.font_size = size;
    }
    Operation::None
}

fn handle_char_spacing(operands: &[Object], state: &mut ParserState) -> Operation {
    if let Some(v) = num(operands, 0) {
        state.character_spacing = v;
    }
    Operation::None
}

fn handle_word_spacing(operands: &[Object], state: &mut ParserState) -> Operation {
    if let Some(v) = num(operands, 0) {
        state.word_spacing = v;
    }
    Operation::None
}

fn handle_horizontal_scaling(operands: &[Object], state: &mut ParserState) -> Operation {
    if let Some(v) = num(operands, 0) {
        state.horizontal_scaling = v;
    }
    Operation::None
}

fn handle_leading(operands: &[Object], state: &mut ParserState) -> Operation {
    if let Some(v) = num(operands, 0) {
        state.text_leading = v;
    }
    Operation::None
}

fn handle_rise(operands: &[Object], state: &mut ParserState) -> Operation {
    if let Some(v) = num(operands, 0) {
        state.text_rise = v;
    }
    Operation::None
}

fn handle_render_mode(operands: &[Object], state: &mut ParserState) -> Operation {
    if let Some(v) = num(operands, 0) {
        state.text_rendering_mode = (v as i64).clamp(0, 7) as u8;
    }
    Operation::None
}

// ---------------------------------------------------------------------------
// Text positioning
// ---------------------------------------------------------------------------

/// Shared Td core: translate the line matrix, restart the text matrix there.
fn move_text_position(state: &mut ParserState, tx: f64, ty: f64) {
    state.text_line_matrix = Matrix::translation(tx, ty).multiply(&state.text_line_matrix);
    state.text_matrix = state.text_line_matrix;
}

fn handle_td(operands: &[Object], state: &mut ParserState) -> Operation {
    if let (Some(tx), Some(ty)) = (num(operands, 1), num(operands, 0)) {
        move_text_position(state, tx, ty);
    }
    Operation::None
}

fn handle_td_leading(operands: &[Object], state: &mut ParserState) -> Operation {
    if let (Some(tx), Some(ty)) = (num(operands, 1), num(operands, 0)) {
        state.text_leading = -ty;
        move_text_position(state, tx, ty);
    }
    Operation::None
}

fn handle_tm(operands: &[Object], state: &mut ParserState) -> Operation {
    let values = [
        num(operands, 5),
        num(operands, 4),
        num(operands, 3),
        num(operands, 2),
        num(operands, 1),
        num(operands, 0),
    ];
    if let [Some(a), Some(b), Some(c), Some(d), Some(e), Some(f)] = values {
        let m = Matrix::new(a, b, c, d, e, f);
        state.text_matrix = m;
        state.text_line_matrix = m;
    }
    Operation::None
}

fn handle_next_line(_: &[Object], state: &mut ParserState) -> Operation {
    let leading = state.text_leading;
    move_text_position(state, 0.0, -leading);
    Operation::None
}

// ---------------------------------------------------------------------------
// Text showing
// ---------------------------------------------------------------------------

fn handle_show_text(operands: &[Object], _: &mut ParserState) -> Operation {
    match string_bytes(operands, 0) {
        Some(text) => Operation::ShowText(text),
        None => Operation::None,
    }
}

fn handle_show_text_adjusted(operands: &[Object], _: &mut ParserState) -> Operation {
    let Some(array) = arg(operands, 0).and_then(Object::as_array) else {
        return Operation::None;
    };
    let elements = array
        .iter()
        .filter_map(|obj| match obj {
            Object::LiteralString(s) | Object::HexString(s) => {
                Some(TextElement::Text(s.clone()))
            }
            Object::Integer(i) => Some(TextElement::Adjustment(*i as f64)),
            Object::Real(r) => Some(TextElement::Adjustment(*r)),
            _ => None,
        })
        .collect();
    Operation::ShowTextAdjusted(elements)
}

fn handle_next_line_show(operands: &[Object], state: &mut ParserState) -> Operation {
    let Some(text) = string_bytes(operands, 0) else {
        return Operation::None;
    };
    let leading = state.text_leading;
    move_text_position(state, 0.0, -leading);
    Operation::NextLineShowText(text)
}

fn handle_spacing_show(operands: &[Object], state: &mut ParserState) -> Operation {
    let (Some(aw), Some(ac), Some(text)) = (
        num(operands, 2),
        num(operands, 1),
        string_bytes(operands, 0),
    ) else {
        return Operation::None;
    };
    state.word_spacing = aw;
    state.character_spacing = ac;
    let leading = state.text_leading;
    move_text_position(state, 0.0, -leading);
    Operation::SetSpacingShowText {
        word_spacing: aw,
        character_spacing: ac,
        text,
    }
}

// ---------------------------------------------------------------------------
// Graphics state
// ---------------------------------------------------------------------------

fn handle_save(_: &[Object], state: &mut ParserState) -> Operation {
    state.save();
    Operation::None
}

fn handle_restore(_: &[Object], state: &mut ParserState) -> Operation {
    state.restore();
    Operation::None
}

fn handle_concat_matrix(operands: &[Object], state: &mut ParserState) -> Operation {
    let values = [
        num(operands, 5),
        num(operands, 4),
        num(operands, 3),
        num(operands, 2),
        num(operands, 1),
        num(operands, 0),
    ];
    if let [Some(a), Some(b), Some(c), Some(d), Some(e), Some(f)] = values {
        let m = Matrix::new(a, b, c, d, e, f);
        // A degenerate matrix would collapse every later footprint to a
        // line; leaving the CTM alone degrades more gracefully.
        if m.is_invertible() {
            state.ctm = m.multiply(&state.ctm);
        }
    }
    Operation::None
}

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

fn numeric_components(operands: &[Object]) -> Vec<f64> {
    operands.iter().filter_map(Object::as_number).collect()
}

fn handle_fill_gray(operands: &[Object], state: &mut ParserState) -> Operation {
    if let Some(v) = num(operands, 0) {
        state.fill_color = ColorValue {
            space: "DeviceGray".to_string(),
            components: vec![v],
        };
    }
    Operation::None
}

fn handle_stroke_gray(operands: &[Object], state: &mut ParserState) -> Operation {
    if let Some(v) = num(operands, 0) {
        state.stroke_color = ColorValue {
            space: "DeviceGray".to_string(),
            components: vec![v],
        };
    }
    Operation::None
}

fn handle_fill_rgb(operands: &[Object], state: &mut ParserState) -> Operation {
    if let (Some(r), Some(g), Some(b)) = (num(operands, 2), num(operands, 1), num(operands, 0)) {
        state.fill_color = ColorValue {
            space: "DeviceRGB".to_string(),
            components: vec![r, g, b],
        };
    }
    Operation::None
}

fn handle_stroke_rgb(operands: &[Object], state: &mut ParserState) -> Operation {
    if let (Some(r), Some(g), Some(b)) = (num(operands, 2), num(operands, 1), num(operands, 0)) {
        state.stroke_color = ColorValue {
            space: "DeviceRGB".to_string(),
            components: vec![r, g, b],
        };
    }
    Operation::None
}

fn handle_fill_cmyk(operands: &[Object], state: &mut ParserState) -> Operation {
    let values = [
        num(operands, 3),
        num(operands, 2),
        num(operands, 1),
        num(operands, 0),
    ];
    if let [Some(c), Some(m), Some(y), Some(k)] = values {
        state.fill_color = ColorValue {
            space: "DeviceCMYK".to_string(),
            components: vec![c, m, y, k],
        };
    }
    Operation::None
}

fn handle_stroke_cmyk(operands: &[Object], state: &mut ParserState) -> Operation {
    let values = [
        num(operands, 3),
        num(operands, 2),
        num(operands, 1),
        num(operands, 0),
    ];
    if let [Some(c), Some(m), Some(y), Some(k)] = values {
        state.stroke_color = ColorValue {
            space: "DeviceCMYK".to_string(),
            components: vec![c, m, y, k],
        };
    }
    Operation::None
}

fn handle_fill_color_space(operands: &[Object], state: &mut ParserState) -> Operation {
    if let Some(name) = arg(operands, 0).and_then(Object::as_name) {
        state.fill_color = ColorValue {
            space: name.to_string(),
            components: Vec::new(),
        };
    }
    Operation::None
}

fn handle_stroke_color_space(operands: &[Object], state: &mut ParserState) -> Operation {
    if let Some(name) = arg(operands, 0).and_then(Object::as_name) {
        state.stroke_color = ColorValue {
            space: name.to_string(),
            components: Vec::new(),
        };
    }
    Operation::None
}

fn handle_fill_color(operands: &[Object], state: &mut ParserState) -> Operation {
    state.fill_color.components = numeric_components(operands);
    Operation::None
}

fn handle_stroke_color(operands: &[Object], state: &mut ParserState) -> Operation {
    state.stroke_color.components = numeric_components(operands);
    Operation::None
}

// ---------------------------------------------------------------------------
// No-op handlers: operators with no effect on text or redaction state, kept
// registered so they are known (classified, round-tripped) rather than
// treated as foreign.
// ---------------------------------------------------------------------------

fn handle_noop(_: &[Object], _: &mut ParserState) -> Operation {
    Operation::None
}

/// Table from operator name to handler.
#[derive(Clone)]
pub struct OperatorRegistry {
    handlers: HashMap<String, Handler>,
}

impl OperatorRegistry {
    /// Registry with every built-in handler installed.
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
        };

        // Text object
        registry.register("BT", handle_begin_text);
        registry.register("ET", handle_end_text);

        // Text state
        registry.register("Tf", handle_set_font);
        registry.register("Tc", handle_char_spacing);
        registry.register("Tw", handle_word_spacing);
        registry.register("Tz", handle_horizontal_scaling);
        registry.register("TL", handle_leading);
        registry.register("Ts", handle_rise);
        registry.register("Tr", handle_render_mode);

        // Text positioning
        registry.register("Td", handle_td);
        registry.register("TD", handle_td_leading);
        registry.register("Tm", handle_tm);
        registry.register("T*", handle_next_line);

        // Text showing
        registry.register("Tj", handle_show_text);
        registry.register("TJ", handle_show_text_adjusted);
        registry.register("'", handle_next_line_show);
        registry.register("\"", handle_spacing_show);

        // Graphics state
        registry.register("q", handle_save);
        registry.register("Q", handle_restore);
        registry.register("cm", handle_concat_matrix);

        // Path construction and painting: position tracking for redaction
        // happens in the redactor's own pass; no text state involved.
        for name in ["m", "l", "c", "v", "y", "h", "re"] {
            registry.register(name, handle_noop);
        }
        for name in ["S", "s", "f", "F", "f*", "B", "B*", "b", "b*", "n"] {
            registry.register(name, handle_noop);
        }

        // Color
        registry.register("g", handle_fill_gray);
        registry.register("G", handle_stroke_gray);
        registry.register("rg", handle_fill_rgb);
        registry.register("RG", handle_stroke_rgb);
        registry.register("k", handle_fill_cmyk);
        registry.register("K", handle_stroke_cmyk);
        registry.register("cs", handle_fill_color_space);
        registry.register("CS", handle_stroke_color_space);
        registry.register("sc", handle_fill_color);
        registry.register("SC", handle_stroke_color);
        registry.register("scn", handle_fill_color);
        registry.register("SCN", handle_stroke_color);

        // XObject invocation is opaque to text state.
        registry.register("Do", handle_noop);

        // Known no-ops: line style, clipping, marked content, compatibility.
        for name in [
            "w", "J", "j", "M", "d", "ri", "i", "gs", "sh", "W", "W*", "BMC", "BDC", "EMC", "BX",
            "EX", "MP", "DP",
        ] {
            registry.register(name, handle_noop);
        }

        registry
    }

    /// Install or replace a handler. The last registration for a name wins.
    pub fn register(&mut self, name: impl Into<String>, handler: Handler) {
        self.handlers.insert(name.into(), handler);
    }

    /// Whether a handler exists for the operator name.
    pub fn knows(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Execute one operator against the state.
    ///
    /// Unknown operators leave the state untouched and report
    /// [`Operation::None`].
    pub fn apply(&self, op: &Operator, state: &mut ParserState) -> Operation {
        match self.handlers.get(op.name.as_str()) {
            Some(handler) => handler(&op.operands, state),
            None => Operation::None,
        }
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
