//! Error and diagnostic types for the redaction core.
//!
//! Fatal conditions are the exception here: the lexer and parser never fail,
//! they record [`Diagnostic`] values and keep going. Only conditions that make
//! the whole call meaningless (encrypted input, a broken internal invariant)
//! surface as [`Error`].

use serde::Serialize;

/// Result type alias for redaction core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal error kinds.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The page content handed to the core is still encrypted.
    ///
    /// The document layer must decrypt streams before calling in; the core
    /// has no access to encryption keys.
    #[error("content stream is encrypted; decrypt before parsing")]
    UnsupportedEncryption,

    /// An internal invariant was broken. Indicates a bug in the core.
    #[error("invariant violation at operator {index}: {reason}")]
    InvariantViolation {
        /// Index of the operator being processed when the invariant broke
        index: usize,
        /// What went wrong
        reason: String,
    },
}

/// Which kind of block an unbalance diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockKind {
    /// BT .. ET text object
    Text,
    /// q .. Q graphics state save
    Save,
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockKind::Text => write!(f, "BT"),
            BlockKind::Save => write!(f, "q"),
        }
    }
}

/// Non-fatal findings reported alongside results.
///
/// Diagnostics are values, not log lines: the parser, layout pass and
/// redactor collect them and hand them back with their output. The enclosing
/// system decides what, if anything, to log.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize)]
pub enum Diagnostic {
    /// The lexer hit a malformed token and resynchronized.
    #[error("malformed token at byte {offset}: {reason}")]
    Lex {
        /// Byte offset of the offending input
        offset: u64,
        /// Why the token could not be read
        reason: String,
    },

    /// The parser dropped or repaired a construct.
    #[error("parse problem at byte {offset}: {reason}")]
    Parse {
        /// Byte offset where the problem was noticed
        offset: u64,
        /// What was dropped or repaired
        reason: String,
    },

    /// A BT or q block was left open, or a closer had no opener.
    #[error("unbalanced {kind} block at byte {offset}")]
    UnbalancedBlock {
        /// Block kind (BT/ET or q/Q)
        kind: BlockKind,
        /// Offset of the unmatched opener or stray closer
        offset: u64,
    },

    /// A Tf named a font the page resources do not carry.
    ///
    /// Glyph metrics for that font are approximated; letter rectangles are
    /// still produced but less precise.
    #[error("font resource /{name} not found; using approximate metrics")]
    MissingFont {
        /// Resource name from the Tf operand
        name: String,
    },

    /// A Do target had no known bounding box.
    ///
    /// The XObject is treated as non-intersecting for redaction purposes,
    /// which can under-redact. Callers should supply bounds when possible.
    #[error("no bounding box for XObject /{name}; treated as non-intersecting")]
    MissingXObjectBounds {
        /// Resource name from the Do operand
        name: String,
    },
}

impl Diagnostic {
    /// Byte offset associated with the diagnostic, when it has one.
    pub fn offset(&self) -> Option<u64> {
        match self {
            Diagnostic::Lex { offset, .. }
            | Diagnostic::Parse { offset, .. }
            | Diagnostic::UnbalancedBlock { offset, .. } => Some(*offset),
            Diagnostic::MissingFont { .. } | Diagnostic::MissingXObjectBounds { .. } => None,
        }
    }
}
