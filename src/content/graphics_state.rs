//! Graphics and text state tracked across content-stream execution.
//!
//! One [`ParserState`] is owned by each parse/layout/redact pass. Operator
//! handlers mutate it; `q` pushes a full value snapshot (CTM plus all
//! text-adjacent parameters) and `Q` pops one. Nothing here is shared or
//! aliased: the stack holds plain values.

use crate::geometry::Point;

/// A 2D affine transformation in PDF's six-number form `[a b c d e f]`,
/// representing the matrix
///
/// ```text
/// [ a  b  0 ]
/// [ c  d  0 ]
/// [ e  f  1 ]
/// ```
///
/// Points are row vectors: `(x', y') = (x, y, 1) × M`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    /// Horizontal scaling component
    pub a: f64,
    /// Rotation/skew component
    pub b: f64,
    /// Rotation/skew component
    pub c: f64,
    /// Vertical scaling component
    pub d: f64,
    /// Horizontal translation
    pub e: f64,
    /// Vertical translation
    pub f: f64,
}

impl Matrix {
    /// Create a matrix from the six operand values in operator order.
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// The identity transform.
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Pure translation.
    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Pure scaling.
    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Counter-clockwise rotation by `angle` radians.
    pub fn rotation(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Compose two transforms: applying the product to a point is the same
    /// as applying `self` first, then `other`.
    ///
    /// This is PDF's left-to-right row-vector convention, so the `cm`
    /// update reads `ctm = operand_matrix.multiply(&ctm)`.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Apply the transform to a point.
    pub fn transform_point(&self, x: f64, y: f64) -> Point {
        Point {
            x: self.a * x + self.c * y + self.e,
            y: self.b * x + self.d * y + self.f,
        }
    }

    /// Determinant; zero means the transform collapses areas.
    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Whether the transform is invertible.
    pub fn is_invertible(&self) -> bool {
        self.determinant().abs() > f64::EPSILON
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

/// Current color in one of the device color spaces, recorded as named space
/// plus components. Redaction does not depend on color, but round-tripping
/// and diagnostics do, so the state tracks it.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorValue {
    /// Color space name (DeviceGray, DeviceRGB, DeviceCMYK, or a cs operand)
    pub space: String,
    /// Component values, meaning per space
    pub components: Vec<f64>,
}

impl Default for ColorValue {
    fn default() -> Self {
        // PDF initial color: DeviceGray black.
        Self {
            space: "DeviceGray".to_string(),
            components: vec![0.0],
        }
    }
}

/// Everything `q` saves and `Q` restores.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsSnapshot {
    /// Current transformation matrix
    pub ctm: Matrix,
    /// Character spacing (Tc)
    pub character_spacing: f64,
    /// Word spacing (Tw)
    pub word_spacing: f64,
    /// Horizontal scaling percentage (Tz), 100 = none
    pub horizontal_scaling: f64,
    /// Text leading (TL)
    pub text_leading: f64,
    /// Current font resource name, if any Tf ran
    pub font_name: Option<String>,
    /// Current font size
    pub font_size: f64,
    /// Text rise (Ts)
    pub text_rise: f64,
    /// Text rendering mode (Tr), clamped to 0..=7
    pub text_rendering_mode: u8,
    /// Fill color
    pub fill_color: ColorValue,
    /// Stroke color
    pub stroke_color: ColorValue,
}

/// Mutable state evolved across one pass over an operator sequence.
///
/// Initial values per PDF 32000-1 table 52/104: identity matrices, no font,
/// size 0, spacings 0, scaling 100%, leading 0, rise 0, mode 0.
#[derive(Debug, Clone)]
pub struct ParserState {
    /// Inside a BT..ET block
    pub in_text_object: bool,
    /// Text matrix (valid inside a text object)
    pub text_matrix: Matrix,
    /// Text line matrix (start-of-line position)
    pub text_line_matrix: Matrix,
    /// Current transformation matrix
    pub ctm: Matrix,
    /// Character spacing (Tc)
    pub character_spacing: f64,
    /// Word spacing (Tw)
    pub word_spacing: f64,
    /// Horizontal scaling percentage (Tz)
    pub horizontal_scaling: f64,
    /// Text leading (TL)
    pub text_leading: f64,
    /// Current font resource name
    pub font_name: Option<String>,
    /// Current font size
    pub font_size: f64,
    /// Text rise (Ts)
    pub text_rise: f64,
    /// Text rendering mode (Tr)
    pub text_rendering_mode: u8,
    /// Fill color
    pub fill_color: ColorValue,
    /// Stroke color
    pub stroke_color: ColorValue,
    stack: Vec<GraphicsSnapshot>,
}

impl ParserState {
    /// State at the start of a content stream.
    pub fn new() -> Self {
        Self {
            in_text_object: false,
            text_matrix: Matrix::identity(),
            text_line_matrix: Matrix::identity(),
            ctm: Matrix::identity(),
            character_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 100.0,
            text_leading: 0.0,
            font_name: None,
            font_size: 0.0,
            text_rise: 0.0,
            text_rendering_mode: 0,
            fill_color: ColorValue::default(),
            stroke_color: ColorValue::default(),
            stack: Vec::new(),
        }
    }

    /// Save the current state (`q`).
    pub fn save(&mut self) {
        self.stack.push(GraphicsSnapshot {
            ctm: self.ctm,
            character_spacing: self.character_spacing,
            word_spacing: self.word_spacing,
            horizontal_scaling: self.horizontal_scaling,
            text_leading: self.text_leading,
            font_name: self.font_name.clone(),
            font_size: self.font_size,
            text_rise: self.text_rise,
            text_rendering_mode: self.text_rendering_mode,
            fill_color: self.fill_color.clone(),
            stroke_color: self.stroke_color.clone(),
        });
    }

    /// Restore the most recent save (`Q`). A `Q` with no matching `q` is
    /// tolerated and ignored; the balance scan reports it separately.
    pub fn restore(&mut self) {
        if let Some(snap) = self.stack.pop() {
            self.ctm = snap.ctm;
            self.character_spacing = snap.character_spacing;
            self.word_spacing = snap.word_spacing;
            self.horizontal_scaling = snap.horizontal_scaling;
            self.text_leading = snap.text_leading;
            self.font_name = snap.font_name;
            self.font_size = snap.font_size;
            self.text_rise = snap.text_rise;
            self.text_rendering_mode = snap.text_rendering_mode;
            self.fill_color = snap.fill_color;
            self.stroke_color = snap.stroke_color;
        }
    }

    /// Depth of the q/Q stack.
    pub fn save_depth(&self) -> usize {
        self.stack.len()
    }

    /// The transform from text space to device space at this instant.
    pub fn text_to_device(&self) -> Matrix {
        self.text_matrix.multiply(&self.ctm)
    }
}

impl Default for ParserState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_identity() {
        let m = Matrix::identity();
        let p = m.transform_point(3.0, 4.0);
        assert_eq!(p.x, 3.0);
        assert_eq!(p.y, 4.0);
    }

    #[test]
    fn test_matrix_translation() {
        let m = Matrix::translation(10.0, 20.0);
        let p = m.transform_point(5.0, 10.0);
        assert_eq!(p.x, 15.0);
        assert_eq!(p.y, 30.0);
    }

    #[test]
    fn test_matrix_scaling() {
        let m = Matrix::scaling(2.0, 3.0);
        let p = m.transform_point(10.0, 10.0);
        assert_eq!(p.x, 20.0);
        assert_eq!(p.y, 30.0);
    }

    #[test]
    fn test_multiply_is_self_then_other() {
        let translate = Matrix::translation(10.0, 20.0);
        let scale = Matrix::scaling(2.0, 2.0);

        // Translate first, then scale: (5,5) -> (15,25) -> (30,50).
        let p = translate.multiply(&scale).transform_point(5.0, 5.0);
        assert_eq!(p.x, 30.0);
        assert_eq!(p.y, 50.0);

        // Scale first, then translate: (5,5) -> (10,10) -> (20,30).
        let p = scale.multiply(&translate).transform_point(5.0, 5.0);
        assert_eq!(p.x, 20.0);
        assert_eq!(p.y, 30.0);
    }

    #[test]
    fn test_rotation() {
        let m = Matrix::rotation(std::f64::consts::FRAC_PI_2);
        let p = m.transform_point(1.0, 0.0);
        assert!((p.x - 0.0).abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_determinant_and_invertibility() {
        assert_eq!(Matrix::scaling(2.0, 3.0).determinant(), 6.0);
        assert!(Matrix::identity().is_invertible());
        assert!(!Matrix::new(1.0, 2.0, 2.0, 4.0, 0.0, 0.0).is_invertible());
    }

    #[test]
    fn test_initial_state_values() {
        let state = ParserState::new();
        assert!(!state.in_text_object);
        assert_eq!(state.text_matrix, Matrix::identity());
        assert_eq!(state.ctm, Matrix::identity());
        assert_eq!(state.font_size, 0.0);
        assert!(state.font_name.is_none());
        assert_eq!(state.character_spacing, 0.0);
        assert_eq!(state.word_spacing, 0.0);
        assert_eq!(state.horizontal_scaling, 100.0);
        assert_eq!(state.text_rendering_mode, 0);
        assert_eq!(state.save_depth(), 0);
    }

    #[test]
    fn test_save_restore_round_trip() {
        let mut state = ParserState::new();
        state.font_name = Some("F1".to_string());
        state.font_size = 12.0;
        state.ctm = Matrix::translation(5.0, 5.0);

        state.save();
        state.font_size = 24.0;
        state.ctm = Matrix::scaling(2.0, 2.0).multiply(&state.ctm);
        state.character_spacing = 1.5;

        state.restore();
        assert_eq!(state.font_size, 12.0);
        assert_eq!(state.ctm, Matrix::translation(5.0, 5.0));
        assert_eq!(state.character_spacing, 0.0);
        assert_eq!(state.font_name.as_deref(), Some("F1"));
    }

    #[test]
    fn test_restore_on_empty_stack_is_ignored() {
        let mut state = ParserState::new();
        state.font_size = 9.0;
        state.restore();
        assert_eq!(state.font_size, 9.0);
        assert_eq!(state.save_depth(), 0);
    }

    #[test]
    fn test_text_to_device_combines_matrices() {
        let mut state = ParserState::new();
        state.ctm = Matrix::scaling(2.0, 2.0);
        state.text_matrix = Matrix::translation(10.0, 0.0);
        let p = state.text_to_device().transform_point(0.0, 0.0);
        assert_eq!(p.x, 20.0);
        assert_eq!(p.y, 0.0);
    }
}
