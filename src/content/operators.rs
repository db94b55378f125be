//! Content-stream operator records.
//!
//! An [`Operator`] keeps the raw shape of what was parsed: the operator name
//! and its operand objects, verbatim. Unknown operators are first-class —
//! they carry their operands through parse, redact and write unchanged, so a
//! stream full of operators this crate has never heard of still round-trips.
//! Semantic interpretation lives in the registry layer, not here.

use crate::object::Object;

/// Coarse classification of a content-stream operator.
///
/// The redaction engine keys its footprint and removal rules off this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorCategory {
    /// BT / ET
    TextObject,
    /// Tc, Tw, Tz, TL, Tf, Tr, Ts
    TextState,
    /// Td, TD, Tm, T*
    TextPositioning,
    /// Tj, TJ, ', "
    TextShowing,
    /// q, Q, cm, gs, w, d, J, j, M, ri, i
    GraphicsState,
    /// m, l, c, v, y, h, re
    PathConstruction,
    /// S, s, f, F, f*, B, B*, b, b*, n
    PathPainting,
    /// Do
    XObject,
    /// g, G, rg, RG, k, K, cs, CS, sc, SC, scn, SCN
    Color,
    /// Anything else, including operators this crate does not know
    Other,
}

impl OperatorCategory {
    /// Classify an operator by name.
    ///
    /// Pure function of the name; unknown names are `Other`.
    pub fn of(name: &str) -> Self {
        match name {
            "BT" | "ET" => OperatorCategory::TextObject,
            "Tc" | "Tw" | "Tz" | "TL" | "Tf" | "Tr" | "Ts" => OperatorCategory::TextState,
            "Td" | "TD" | "Tm" | "T*" => OperatorCategory::TextPositioning,
            "Tj" | "TJ" | "'" | "\"" => OperatorCategory::TextShowing,
            "q" | "Q" | "cm" | "gs" | "w" | "d" | "J" | "j" | "M" | "ri" | "i" => {
                OperatorCategory::GraphicsState
            }
            "m" | "l" | "c" | "v" | "y" | "h" | "re" => OperatorCategory::PathConstruction,
            "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" | "n" => {
                OperatorCategory::PathPainting
            }
            "Do" => OperatorCategory::XObject,
            "g" | "G" | "rg" | "RG" | "k" | "K" | "cs" | "CS" | "sc" | "SC" | "scn" | "SCN" => {
                OperatorCategory::Color
            }
            _ => OperatorCategory::Other,
        }
    }
}

/// One operator with its operands, as parsed from a content stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    /// Operator keyword, e.g. `Tj`, `re`, `Q`
    pub name: String,
    /// Operands in source order
    pub operands: Vec<Object>,
    /// Byte offset of the operator's first token in the source buffer.
    /// Synthetic operators carry the offset of the operator they replace,
    /// or 0 when built from scratch.
    pub offset: u64,
    /// Category derived from the name
    pub category: OperatorCategory,
}

impl Operator {
    /// Build an operator, deriving its category from the name.
    pub fn new(name: impl Into<String>, operands: Vec<Object>, offset: u64) -> Self {
        let name = name.into();
        let category = OperatorCategory::of(&name);
        Self {
            name,
            operands,
            offset,
            category,
        }
    }

    /// Shorthand for operators built in code rather than parsed.
    pub fn bare(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new(), 0)
    }

    /// Wrap a malformed byte run the lexer could not tokenize.
    ///
    /// The run rides through the pipeline as an `Other` operator with an
    /// empty name; the writer emits its bytes untouched, so the region
    /// survives a round trip instead of silently disappearing.
    pub fn raw_run(bytes: Vec<u8>, offset: u64) -> Self {
        Self::new("", vec![Object::LiteralString(bytes)], offset)
    }

    /// Whether this operator is a preserved malformed run.
    pub fn is_raw_run(&self) -> bool {
        self.name.is_empty()
    }

    /// The preserved bytes of a malformed run.
    pub fn raw_bytes(&self) -> Option<&[u8]> {
        if self.is_raw_run() {
            self.operands.first().and_then(Object::as_string_bytes)
        } else {
            None
        }
    }
}

/// An ordered list of operators — the parsed form of one content stream.
///
/// Redaction consumes one of these and produces another; the writer turns
/// one back into bytes. The sequence has no back-references into the source
/// buffer; operators own their operands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatorSequence {
    ops: Vec<Operator>,
}

impl OperatorSequence {
    /// Empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a vector of operators.
    pub fn from_ops(ops: Vec<Operator>) -> Self {
        Self { ops }
    }

    /// Append an operator.
    pub fn push(&mut self, op: Operator) {
        self.ops.push(op);
    }

    /// Number of operators.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the sequence has no operators.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterate over the operators.
    pub fn iter(&self) -> std::slice::Iter<'_, Operator> {
        self.ops.iter()
    }

    /// The operators as a slice.
    pub fn as_slice(&self) -> &[Operator] {
        &self.ops
    }

    /// Consume into the underlying vector.
    pub fn into_ops(self) -> Vec<Operator> {
        self.ops
    }

    /// Net BT nesting at the end of the sequence.
    ///
    /// Positive: that many BT blocks were left open. Stray ETs clamp at
    /// zero rather than going negative, matching how a viewer recovers.
    pub fn open_text_objects(&self) -> usize {
        let mut depth = 0usize;
        for op in &self.ops {
            match op.name.as_str() {
                "BT" => depth += 1,
                "ET" => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        depth
    }

    /// Net q nesting at the end of the sequence; stray Qs clamp at zero.
    pub fn open_saves(&self) -> usize {
        let mut depth = 0usize;
        for op in &self.ops {
            match op.name.as_str() {
                "q" => depth += 1,
                "Q" => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        depth
    }

    /// Structural equality: same operators with the same operands, ignoring
    /// source byte offsets.
    ///
    /// This is the equivalence round-trip properties are stated in — offsets
    /// are provenance, and re-parsing serialized output necessarily yields
    /// different ones.
    pub fn structural_eq(&self, other: &OperatorSequence) -> bool {
        self.ops.len() == other.ops.len()
            && self
                .ops
                .iter()
                .zip(&other.ops)
                .all(|(a, b)| a.name == b.name && a.operands == b.operands)
    }

    /// Whether BT/ET and q/Q pairs are balanced, with no closer preceding
    /// its opener.
    pub fn is_balanced(&self) -> bool {
        let mut text = 0i64;
        let mut save = 0i64;
        for op in &self.ops {
            match op.name.as_str() {
                "BT" => text += 1,
                "ET" => text -= 1,
                "q" => save += 1,
                "Q" => save -= 1,
                _ => {}
            }
            if text < 0 || save < 0 {
                return false;
            }
        }
        text == 0 && save == 0
    }
}

impl std::ops::Index<usize> for OperatorSequence {
    type Output = Operator;

    fn index(&self, index: usize) -> &Operator {
        &self.ops[index]
    }
}

impl<'a> IntoIterator for &'a OperatorSequence {
    type Item = &'a Operator;
    type IntoIter = std::slice::Iter<'a, Operator>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

impl IntoIterator for OperatorSequence {
    type Item = Operator;
    type IntoIter = std::vec::IntoIter<Operator>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

impl FromIterator<Operator> for OperatorSequence {
    fn from_iter<I: IntoIterator<Item = Operator>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}
