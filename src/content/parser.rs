//! Content stream parser.
//!
//! Content streams use postfix notation: operands come first, then the
//! operator keyword. The parser accumulates operand objects until it meets a
//! bare word, at which point it flushes the operands into one [`Operator`]
//! record. Unknown operator names are kept verbatim with their operands so
//! they survive round-trips untouched.
//!
//! The parser never fails. Malformed constructs become [`Diagnostic`] values
//! in the returned [`ParsedContent`] and parsing resumes at the next token.

use crate::content::operators::{Operator, OperatorSequence};
use crate::error::{BlockKind, Diagnostic};
use crate::lexer::{Lexer, Token};
use crate::object::{Object, ObjectRef};
use indexmap::IndexMap;

/// Result of parsing one content stream: the operator sequence plus every
/// non-fatal finding made along the way.
#[derive(Debug, Clone, Default)]
pub struct ParsedContent {
    /// Parsed operators in source order
    pub sequence: OperatorSequence,
    /// Non-fatal findings (lex errors, dropped operands, unbalanced blocks)
    pub warnings: Vec<Diagnostic>,
}

/// Parse a content stream buffer into operators.
///
/// # Examples
///
/// ```
/// use pdf_redact::content::parse_content_stream;
///
/// let parsed = parse_content_stream(b"BT /F1 12 Tf 100 700 Td (Hello) Tj ET");
/// assert_eq!(parsed.sequence.len(), 5);
/// assert!(parsed.warnings.is_empty());
/// ```
pub fn parse_content_stream(data: &[u8]) -> ParsedContent {
    ContentParser::new(data).parse()
}

/// Collections nested deeper than this are refused. No real content stream
/// comes close; the cap keeps crafted input from exhausting the stack.
const MAX_NESTING_DEPTH: usize = 64;

/// Streaming parser over a content buffer.
pub struct ContentParser<'a> {
    data: &'a [u8],
    lexer: Lexer<'a>,
    warnings: Vec<Diagnostic>,
    depth: usize,
}

impl<'a> ContentParser<'a> {
    /// Create a parser over a byte buffer.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            lexer: Lexer::new(data),
            warnings: Vec::new(),
            depth: 0,
        }
    }

    /// Parse the whole buffer.
    pub fn parse(mut self) -> ParsedContent {
        let mut ops = Vec::new();
        // Operands waiting for their operator, with the offset of each
        // operand's first token.
        let mut pending: Vec<(u64, Object)> = Vec::new();

        loop {
            let spanned = self.lexer.next();
            let offset = spanned.offset;
            match spanned.token {
                Token::Eof => break,
                Token::Error { reason, bounded } => {
                    let end = self.lexer.position() as usize;
                    self.warnings.push(Diagnostic::Lex { offset, reason });
                    // A bounded malformed run is kept verbatim so it still
                    // appears in rewritten output; an unterminated one has
                    // no stable end and is dropped.
                    if bounded {
                        let raw = self.data[offset as usize..end].to_vec();
                        if !raw.is_empty() {
                            log::debug!(
                                "preserving {} malformed byte(s) at offset {}",
                                raw.len(),
                                offset
                            );
                            ops.push(Operator::raw_run(raw, offset));
                        }
                    }
                }
                Token::Keyword(word) => match word.as_str() {
                    "true" => pending.push((offset, Object::Boolean(true))),
                    "false" => pending.push((offset, Object::Boolean(false))),
                    "null" => pending.push((offset, Object::Null)),
                    "R" => self.collapse_reference(&mut pending, &mut ops, offset),
                    _ => {
                        let op_offset = pending.first().map(|(o, _)| *o).unwrap_or(offset);
                        let operands = pending.drain(..).map(|(_, obj)| obj).collect();
                        let op = Operator::new(word, operands, op_offset);
                        log::debug!("parsed operator {} at byte {}", op.name, op.offset);
                        ops.push(op);
                    }
                },
                other => {
                    if let Some(obj) = self.object_from_token(other, offset) {
                        pending.push((offset, obj));
                    }
                }
            }
        }

        if let Some((offset, _)) = pending.first() {
            self.warnings.push(Diagnostic::Parse {
                offset: *offset,
                reason: format!("{} operand(s) with no operator at end of stream", pending.len()),
            });
        }

        let sequence = OperatorSequence::from_ops(ops);
        self.scan_balance(&sequence);

        ParsedContent {
            sequence,
            warnings: self.warnings,
        }
    }

    /// Turn a non-keyword token into an operand object, recursing into
    /// collections. Returns `None` when the token was malformed or stray;
    /// a diagnostic has been recorded in that case.
    fn object_from_token(&mut self, token: Token, offset: u64) -> Option<Object> {
        match token {
            Token::Integer(i) => Some(Object::Integer(i)),
            Token::Real(r) => Some(Object::Real(r)),
            Token::LiteralString(bytes) => Some(Object::LiteralString(bytes)),
            Token::HexString(bytes) => Some(Object::HexString(bytes)),
            Token::Name(name) => {
                if name.is_empty() {
                    self.warnings.push(Diagnostic::Parse {
                        offset,
                        reason: "empty name".to_string(),
                    });
                    None
                } else {
                    Some(Object::Name(name))
                }
            }
            Token::ArrayStart => {
                if self.depth >= MAX_NESTING_DEPTH {
                    self.warnings.push(Diagnostic::Parse {
                        offset,
                        reason: "collection nesting too deep".to_string(),
                    });
                    return None;
                }
                self.depth += 1;
                let array = self.parse_array(offset);
                self.depth -= 1;
                Some(array)
            }
            Token::DictStart => {
                if self.depth >= MAX_NESTING_DEPTH {
                    self.warnings.push(Diagnostic::Parse {
                        offset,
                        reason: "collection nesting too deep".to_string(),
                    });
                    return None;
                }
                self.depth += 1;
                let dict = self.parse_dictionary(offset);
                self.depth -= 1;
                Some(dict)
            }
            Token::Error { reason, .. } => {
                // Inside a collection a malformed run cannot be preserved
                // as an operator; report it and move on.
                self.warnings.push(Diagnostic::Lex { offset, reason });
                None
            }
            Token::ArrayEnd | Token::DictEnd | Token::ProcStart | Token::ProcEnd => {
                self.warnings.push(Diagnostic::Parse {
                    offset,
                    reason: "stray delimiter".to_string(),
                });
                None
            }
            Token::Keyword(_) | Token::Eof => None,
        }
    }

    /// Parse an array after its `[`.
    fn parse_array(&mut self, start_offset: u64) -> Object {
        let mut items: Vec<(u64, Object)> = Vec::new();
        loop {
            let spanned = self.lexer.next();
            let offset = spanned.offset;
            match spanned.token {
                Token::ArrayEnd => break,
                Token::Eof => {
                    self.warnings.push(Diagnostic::Parse {
                        offset: start_offset,
                        reason: "unterminated array".to_string(),
                    });
                    break;
                }
                Token::Keyword(word) => match word.as_str() {
                    "true" => items.push((offset, Object::Boolean(true))),
                    "false" => items.push((offset, Object::Boolean(false))),
                    "null" => items.push((offset, Object::Null)),
                    "R" => {
                        if !Self::try_collapse_reference(&mut items) {
                            self.warnings.push(Diagnostic::Parse {
                                offset,
                                reason: "R without preceding object and generation numbers"
                                    .to_string(),
                            });
                        }
                    }
                    _ => {
                        self.warnings.push(Diagnostic::Parse {
                            offset,
                            reason: format!("keyword '{}' inside array", word),
                        });
                    }
                },
                other => {
                    if let Some(obj) = self.object_from_token(other, offset) {
                        items.push((offset, obj));
                    }
                }
            }
        }
        Object::Array(items.into_iter().map(|(_, obj)| obj).collect())
    }

    /// Parse a dictionary after its `<<`. Keys must be names; duplicate keys
    /// keep the last value.
    fn parse_dictionary(&mut self, start_offset: u64) -> Object {
        let mut dict = IndexMap::new();
        loop {
            let key_spanned = self.lexer.next();
            let key_offset = key_spanned.offset;
            let key = match key_spanned.token {
                Token::DictEnd => break,
                Token::Eof => {
                    self.warnings.push(Diagnostic::Parse {
                        offset: start_offset,
                        reason: "unterminated dictionary".to_string(),
                    });
                    break;
                }
                Token::Name(name) if !name.is_empty() => name,
                other => {
                    self.warnings.push(Diagnostic::Parse {
                        offset: key_offset,
                        reason: format!("dictionary key is not a name ({:?})", other),
                    });
                    // Attempt to stay in sync by treating the token as a
                    // skipped value and continuing with the next pair.
                    continue;
                }
            };

            let value_spanned = self.lexer.next();
            let value_offset = value_spanned.offset;
            let value = match value_spanned.token {
                Token::DictEnd => {
                    self.warnings.push(Diagnostic::Parse {
                        offset: value_offset,
                        reason: format!("dictionary key /{} has no value", key),
                    });
                    break;
                }
                Token::Eof => {
                    self.warnings.push(Diagnostic::Parse {
                        offset: start_offset,
                        reason: "unterminated dictionary".to_string(),
                    });
                    break;
                }
                Token::Keyword(word) => match word.as_str() {
                    "true" => Some(Object::Boolean(true)),
                    "false" => Some(Object::Boolean(false)),
                    "null" => Some(Object::Null),
                    _ => {
                        self.warnings.push(Diagnostic::Parse {
                            offset: value_offset,
                            reason: format!("keyword '{}' as dictionary value", word),
                        });
                        None
                    }
                },
                other => self.object_from_token(other, value_offset),
            };

            if let Some(value) = value {
                dict.insert(key, value);
            }
        }
        Object::Dictionary(dict)
    }

    /// Handle a top-level `R`: collapse `id gen R` into a reference operand,
    /// or emit it as an (unknown) operator when the pattern does not match.
    fn collapse_reference(
        &mut self,
        pending: &mut Vec<(u64, Object)>,
        ops: &mut Vec<Operator>,
        offset: u64,
    ) {
        if !Self::try_collapse_reference(pending) {
            let op_offset = pending.first().map(|(o, _)| *o).unwrap_or(offset);
            let operands = pending.drain(..).map(|(_, obj)| obj).collect();
            ops.push(Operator::new("R", operands, op_offset));
        }
    }

    /// Collapse the trailing `Integer Integer` of `items` into a Reference.
    /// Returns false (leaving `items` untouched) when the pattern is absent.
    fn try_collapse_reference(items: &mut Vec<(u64, Object)>) -> bool {
        let n = items.len();
        if n < 2 {
            return false;
        }
        let id = match items[n - 2].1 {
            Object::Integer(i) if (0..=u32::MAX as i64).contains(&i) => i as u32,
            _ => return false,
        };
        let gen = match items[n - 1].1 {
            Object::Integer(g) if (0..=u16::MAX as i64).contains(&g) => g as u16,
            _ => return false,
        };
        let offset = items[n - 2].0;
        items.truncate(n - 2);
        items.push((offset, Object::Reference(ObjectRef::new(id, gen))));
        true
    }

    /// Record unbalanced-block diagnostics for BT/ET and q/Q.
    fn scan_balance(&mut self, sequence: &OperatorSequence) {
        let mut text_opens: Vec<u64> = Vec::new();
        let mut save_opens: Vec<u64> = Vec::new();

        for op in sequence {
            match op.name.as_str() {
                "BT" => text_opens.push(op.offset),
                "ET" => {
                    if text_opens.pop().is_none() {
                        self.warnings.push(Diagnostic::UnbalancedBlock {
                            kind: BlockKind::Text,
                            offset: op.offset,
                        });
                    }
                }
                "q" => save_opens.push(op.offset),
                "Q" => {
                    if save_opens.pop().is_none() {
                        self.warnings.push(Diagnostic::UnbalancedBlock {
                            kind: BlockKind::Save,
                            offset: op.offset,
                        });
                    }
                }
                _ => {}
            }
        }

        for offset in text_opens {
            self.warnings.push(Diagnostic::UnbalancedBlock {
                kind: BlockKind::Text,
                offset,
            });
        }
        for offset in save_opens {
            self.warnings.push(Diagnostic::UnbalancedBlock {
                kind: BlockKind::Save,
                offset,
            });
        }
    }
}
