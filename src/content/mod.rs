//! Content-stream pipeline: lexing feeds the parser here, parsed operators
//! feed the state machine, the layout pass, the redactor and the writer.
//!
//! The raw and semantic views are split on purpose. [`Operator`] records
//! keep exactly what was parsed so unknown operators round-trip untouched;
//! [`registry::Operation`] is the interpreted view the text machine works
//! from.

pub mod graphics_state;
pub mod operators;
pub mod parser;
pub mod registry;
pub mod text_layout;
pub mod writer;

pub use graphics_state::{ColorValue, GraphicsSnapshot, Matrix, ParserState};
pub use operators::{Operator, OperatorCategory, OperatorSequence};
pub use parser::{parse_content_stream, ContentParser, ParsedContent};
pub use registry::{Handler, Operation, OperatorRegistry, TextElement};
pub use text_layout::{LayoutOutcome, Letter, TextLayout};
pub use writer::ContentWriter;
