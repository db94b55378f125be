//! # pdf_redact
//!
//! True-redaction engine for PDF content streams.
//!
//! The crate takes one page's decoded content-stream bytes and removes
//! targeted text and graphics *from the stream itself* — not by covering
//! them with opaque shapes. Redacted content is gone: no text extractor,
//! copy-paste, or search will find it afterwards. Everything the redaction
//! does not touch is preserved byte-for-byte across the rewrite.
//!
//! ## Pipeline
//!
//! ```text
//! bytes -> Lexer -> ContentParser -> OperatorSequence
//!                                        |-> TextLayout -> Letters
//!                                        |-> Redactor   -> OperatorSequence
//!                                        '-> ContentWriter -> bytes
//! ```
//!
//! The enclosing document layer handles files, cross-reference tables,
//! stream filters, and encryption; this crate consumes decoded bytes plus
//! resolved resources through the [`page::PageView`] trait and hands decoded
//! bytes back.
//!
//! ## Quick start
//!
//! ```
//! use pdf_redact::fonts::FontMetrics;
//! use pdf_redact::page::{MemoryPageView, Page, PageResources};
//!
//! # fn main() -> pdf_redact::Result<()> {
//! let mut resources = PageResources::new();
//! resources.fonts.insert("F1".to_string(), FontMetrics::monospaced(500.0));
//!
//! let mut view = MemoryPageView::new(
//!     &b"BT /F1 12 Tf 100 700 Td (top secret: ACME) Tj ET"[..],
//!     resources,
//! );
//! let mut page = Page::new(&mut view);
//!
//! let outcome = page.redact().text("ACME").apply()?;
//! assert_eq!(outcome.letters_removed, 4);
//! assert_eq!(page.text()?, "top secret: ");
//! # Ok(())
//! # }
//! ```
//!
//! ## Guarantees
//!
//! - Parsing never fails: malformed input degrades into diagnostics, and
//!   unknown operators round-trip verbatim.
//! - BT/ET and q/Q balance survives every redaction.
//! - `write(parse(write(s))) == write(s)` byte-for-byte.
//! - Invisible text (rendering mode 3) is extracted and redacted like any
//!   other text.
//!
//! Optional marker rectangles can be painted over removed regions
//! (`with_markers`), but they are cosmetic. Painting a box over content
//! without removing it is masking, and this crate does not do it.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Core parsing
pub mod lexer;
pub mod object;

// Geometry
pub mod geometry;

// Content-stream pipeline
pub mod content;

// External-interface font metrics
pub mod fonts;

// Redaction engine
pub mod redaction;

// Page facade
pub mod page;

// Re-exports
pub use content::{
    ContentParser, ContentWriter, LayoutOutcome, Letter, Matrix, Operator, OperatorCategory,
    OperatorRegistry, OperatorSequence, ParsedContent, ParserState, TextLayout,
};
pub use error::{BlockKind, Diagnostic, Error, Result};
pub use fonts::FontMetrics;
pub use geometry::{Point, Rect};
pub use object::{Object, ObjectRef};
pub use page::{MemoryPageView, Page, PageResources, PageView, RedactionBuilder};
pub use redaction::{RedactionOutcome, Redactor};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
