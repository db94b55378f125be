//! Content-stream lexer (tokenizer).
//!
//! Byte-level tokenization of PDF content streams and object syntax. The
//! lexer recognizes numbers, literal and hexadecimal strings, names with
//! `#xx` escapes, collection delimiters, and bare keywords (operator names
//! and the `true`/`false`/`null`/`R` words).
//!
//! Two contracts shape the design:
//!
//! - It never fails. Malformed input yields an [`Token::Error`] carrying the
//!   offset and a reason, and lexing resumes at the next byte the lexer can
//!   make sense of. The parser turns these into diagnostics.
//! - It is re-seekable: [`Lexer::position`] and [`Lexer::seek`] let a caller
//!   re-lex a region, which the page facade uses for re-entrant parsing.
//!
//! Escape sequences in literal strings and `#xx` sequences in names are
//! decoded here, so tokens carry final byte values. Whitespace (space, tab,
//! CR, LF, NUL, FF) and `%` comments are consumed silently.

use nom::{
    bytes::complete::take_while,
    character::complete::{char, digit1, one_of},
    combinator::opt,
    sequence::preceded,
    IResult,
};

/// Token types recognized by the content-stream lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Integer number (e.g. 42, -123)
    Integer(i64),
    /// Real number (e.g. 2.5, -.002, 3.)
    Real(f64),
    /// Literal string with escape sequences decoded
    LiteralString(Vec<u8>),
    /// Hexadecimal string, decoded to bytes (odd trailing digit padded with 0)
    HexString(Vec<u8>),
    /// Name with `#xx` escapes decoded, without the leading slash.
    /// May be empty at this level; the parser enforces non-emptiness.
    Name(String),
    /// Array start delimiter `[`
    ArrayStart,
    /// Array end delimiter `]`
    ArrayEnd,
    /// Dictionary start delimiter `<<`
    DictStart,
    /// Dictionary end delimiter `>>`
    DictEnd,
    /// Procedure start delimiter `{` (PostScript calculator functions)
    ProcStart,
    /// Procedure end delimiter `}`
    ProcEnd,
    /// Bare word: an operator name or `true`/`false`/`null`/`R`
    Keyword(String),
    /// Malformed construct; recoverable
    Error {
        /// Why the bytes could not be tokenized
        reason: String,
        /// Whether the malformed run has a definite end. A stray delimiter
        /// or a bad hex string with its closing bracket is bounded; an
        /// unterminated string that swallowed the rest of the input is not.
        /// Bounded runs can be preserved verbatim by the parser.
        bounded: bool,
    },
    /// End of input
    Eof,
}

/// A token plus the byte offset where it started.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    /// Offset of the token's first byte in the source buffer
    pub offset: u64,
    /// The token
    pub token: Token,
}

/// Check for PDF whitespace (PDF 32000-1, table 1).
pub(crate) fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C)
}

/// Check for a PDF delimiter byte (PDF 32000-1, table 2).
pub(crate) fn is_delimiter(byte: u8) -> bool {
    matches!(
        byte,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

/// Bytes that can continue a bare keyword.
///
/// Covers the full operator alphabet: alphanumerics plus `'`, `"` and the
/// `*` in T*, f*, B*, b*, W*.
fn is_keyword_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'\'' | b'"' | b'*')
}

/// Parse an integer or real number.
///
/// Accepts optional sign, digits with an optional embedded or leading or
/// trailing dot: `42`, `-123`, `+17`, `2.5`, `.5`, `3.`, `-.002`.
/// An all-digit run too large for i64 falls back to a real.
fn parse_number(input: &[u8]) -> IResult<&[u8], Token> {
    let (input, sign) = opt(one_of("+-"))(input)?;
    let (input, int_part) = opt(digit1)(input)?;
    let (input, frac_part) = opt(preceded(char('.'), opt(digit1)))(input)?;

    // A number needs at least one digit somewhere: "3.", ".5" are fine,
    // a bare "." or "-" is not.
    let has_digits = int_part.is_some() || matches!(frac_part, Some(Some(_)));
    if !has_digits {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        )));
    }

    let negative = sign == Some('-');
    if let Some(frac) = frac_part {
        let mut num_str = String::new();
        if negative {
            num_str.push('-');
        }
        num_str.push_str(
            int_part
                .map(|b| std::str::from_utf8(b).unwrap_or("0"))
                .unwrap_or("0"),
        );
        num_str.push('.');
        num_str.push_str(
            frac.map(|b| std::str::from_utf8(b).unwrap_or("0"))
                .unwrap_or("0"),
        );
        let value: f64 = num_str.parse().map_err(|_| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
        })?;
        Ok((input, Token::Real(value)))
    } else {
        let digits = std::str::from_utf8(int_part.expect("checked above")).map_err(|_| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
        })?;
        match digits.parse::<i64>() {
            Ok(value) => Ok((input, Token::Integer(if negative { -value } else { value }))),
            Err(_) => {
                // Overflowing digit run; keep the magnitude as a real.
                let value: f64 = digits.parse().map_err(|_| {
                    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
                })?;
                Ok((input, Token::Real(if negative { -value } else { value })))
            }
        }
    }
}

/// Decode `#xx` escape sequences in a name (PDF 32000-1, 7.3.5).
pub fn decode_name_escapes(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '#' {
            let hex1 = chars.next();
            let hex2 = chars.next();
            if let (Some(h1), Some(h2)) = (hex1, hex2) {
                if let (Some(d1), Some(d2)) = (h1.to_digit(16), h2.to_digit(16)) {
                    result.push((d1 * 16 + d2) as u8 as char);
                    continue;
                }
                // Invalid hex digits; keep the literal characters.
                result.push('#');
                result.push(h1);
                result.push(h2);
            } else {
                result.push('#');
                if let Some(h1) = hex1 {
                    result.push(h1);
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Parse a name starting with `/`.
fn parse_name(input: &[u8]) -> IResult<&[u8], Token> {
    let (input, _) = char('/')(input)?;
    let (input, bytes) = take_while(|c: u8| !is_whitespace(c) && !is_delimiter(c))(input)?;
    let raw = std::str::from_utf8(bytes).unwrap_or("");
    Ok((input, Token::Name(decode_name_escapes(raw))))
}

/// Parse a bare keyword: operator names, true/false/null/R.
fn parse_keyword(input: &[u8]) -> IResult<&[u8], Token> {
    let (rest, bytes) = take_while(is_keyword_byte)(input)?;
    if bytes.is_empty() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Alpha,
        )));
    }
    let word = std::str::from_utf8(bytes)
        .map_err(|_| nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char)))?;
    Ok((rest, Token::Keyword(word.to_string())))
}

/// Decode a literal string: balanced parens, backslash escapes, octal,
/// line continuations, and EOL normalization (7.3.4.2).
///
/// Returns the decoded bytes, or an error reason when the closing paren is
/// missing. Always reports how many input bytes were consumed.
fn scan_literal_string(input: &[u8]) -> (usize, std::result::Result<Vec<u8>, String>) {
    debug_assert_eq!(input.first(), Some(&b'('));
    let mut out = Vec::new();
    let mut depth = 1usize;
    let mut pos = 1usize;

    while pos < input.len() && depth > 0 {
        match input[pos] {
            b'\\' => {
                pos += 1;
                if pos >= input.len() {
                    break;
                }
                match input[pos] {
                    b'n' => {
                        out.push(b'\n');
                        pos += 1;
                    }
                    b'r' => {
                        out.push(b'\r');
                        pos += 1;
                    }
                    b't' => {
                        out.push(b'\t');
                        pos += 1;
                    }
                    b'b' => {
                        out.push(0x08);
                        pos += 1;
                    }
                    b'f' => {
                        out.push(0x0C);
                        pos += 1;
                    }
                    b'(' | b')' | b'\\' => {
                        out.push(input[pos]);
                        pos += 1;
                    }
                    b'0'..=b'7' => {
                        // 1-3 octal digits, value taken mod 256.
                        let mut value = 0u32;
                        let mut digits = 0;
                        while digits < 3
                            && pos < input.len()
                            && (b'0'..=b'7').contains(&input[pos])
                        {
                            value = value * 8 + (input[pos] - b'0') as u32;
                            pos += 1;
                            digits += 1;
                        }
                        out.push((value % 256) as u8);
                    }
                    b'\r' => {
                        // Line continuation; swallow an optional LF too.
                        pos += 1;
                        if pos < input.len() && input[pos] == b'\n' {
                            pos += 1;
                        }
                    }
                    b'\n' => {
                        pos += 1;
                    }
                    other => {
                        // Unknown escape: the backslash is dropped.
                        out.push(other);
                        pos += 1;
                    }
                }
            }
            b'(' => {
                depth += 1;
                out.push(b'(');
                pos += 1;
            }
            b')' => {
                depth -= 1;
                if depth > 0 {
                    out.push(b')');
                }
                pos += 1;
            }
            b'\r' => {
                // Unescaped EOL inside a string is recorded as LF.
                out.push(b'\n');
                pos += 1;
                if pos < input.len() && input[pos] == b'\n' {
                    pos += 1;
                }
            }
            other => {
                out.push(other);
                pos += 1;
            }
        }
    }

    if depth > 0 {
        (pos, Err("unterminated literal string".to_string()))
    } else {
        (pos, Ok(out))
    }
}

/// Decode a hex string starting after `<`. Whitespace between digits is
/// ignored; an odd trailing digit is implicitly followed by 0.
///
/// Errors carry whether the malformed run is bounded (its `>` was found).
fn scan_hex_string(input: &[u8]) -> (usize, std::result::Result<Vec<u8>, (String, bool)>) {
    debug_assert_eq!(input.first(), Some(&b'<'));
    let mut out = Vec::new();
    let mut nibble: Option<u8> = None;
    let mut pos = 1usize;

    while pos < input.len() {
        let byte = input[pos];
        match byte {
            b'>' => {
                pos += 1;
                if let Some(hi) = nibble {
                    out.push(hi << 4);
                }
                return (pos, Ok(out));
            }
            _ if is_whitespace(byte) => {
                pos += 1;
            }
            _ => match (byte as char).to_digit(16) {
                Some(digit) => {
                    let digit = digit as u8;
                    match nibble.take() {
                        Some(hi) => out.push((hi << 4) | digit),
                        None => nibble = Some(digit),
                    }
                    pos += 1;
                }
                None => {
                    // Resynchronize at the closing bracket if there is one.
                    while pos < input.len() && input[pos] != b'>' {
                        pos += 1;
                    }
                    let bounded = pos < input.len();
                    if bounded {
                        pos += 1;
                    }
                    return (pos, Err((format!("invalid hex digit 0x{:02X}", byte), bounded)));
                }
            },
        }
    }

    (pos, Err(("unterminated hex string".to_string(), false)))
}

/// Re-seekable lexer over a content-stream buffer.
///
/// # Examples
///
/// ```
/// use pdf_redact::lexer::{Lexer, Token};
///
/// let mut lexer = Lexer::new(b"100 700 Td");
/// assert_eq!(lexer.next().token, Token::Integer(100));
/// assert_eq!(lexer.next().token, Token::Integer(700));
/// assert_eq!(lexer.next().token, Token::Keyword("Td".to_string()));
/// assert_eq!(lexer.next().token, Token::Eof);
/// ```
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over a byte buffer.
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Current byte offset (the position the next token starts scanning at).
    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    /// Move the read position. Offsets past the end clamp to the end.
    pub fn seek(&mut self, offset: u64) {
        self.pos = (offset as usize).min(self.input.len());
    }

    /// Consume whitespace runs and `%` comments.
    fn skip_insignificant(&mut self) {
        loop {
            while self.pos < self.input.len() && is_whitespace(self.input[self.pos]) {
                self.pos += 1;
            }
            if self.pos < self.input.len() && self.input[self.pos] == b'%' {
                while self.pos < self.input.len()
                    && self.input[self.pos] != b'\r'
                    && self.input[self.pos] != b'\n'
                {
                    self.pos += 1;
                }
                continue;
            }
            break;
        }
    }

    /// Produce the next token.
    ///
    /// Returns [`Token::Eof`] forever once the input is exhausted; never
    /// panics on malformed input.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> SpannedToken {
        self.skip_insignificant();
        let offset = self.pos as u64;

        if self.pos >= self.input.len() {
            return SpannedToken {
                offset,
                token: Token::Eof,
            };
        }

        let rest = &self.input[self.pos..];
        match rest[0] {
            b'(' => {
                let (consumed, result) = scan_literal_string(rest);
                self.pos += consumed;
                let token = match result {
                    Ok(bytes) => Token::LiteralString(bytes),
                    // An unterminated string swallowed everything after it.
                    Err(reason) => Token::Error {
                        reason,
                        bounded: false,
                    },
                };
                SpannedToken { offset, token }
            }
            b'<' => {
                if rest.len() >= 2 && rest[1] == b'<' {
                    self.pos += 2;
                    SpannedToken {
                        offset,
                        token: Token::DictStart,
                    }
                } else {
                    let (consumed, result) = scan_hex_string(rest);
                    self.pos += consumed;
                    let token = match result {
                        Ok(bytes) => Token::HexString(bytes),
                        Err((reason, bounded)) => Token::Error { reason, bounded },
                    };
                    SpannedToken { offset, token }
                }
            }
            b'>' => {
                if rest.len() >= 2 && rest[1] == b'>' {
                    self.pos += 2;
                    SpannedToken {
                        offset,
                        token: Token::DictEnd,
                    }
                } else {
                    self.pos += 1;
                    SpannedToken {
                        offset,
                        token: Token::Error {
                            reason: "stray '>'".to_string(),
                            bounded: true,
                        },
                    }
                }
            }
            b'[' => {
                self.pos += 1;
                SpannedToken {
                    offset,
                    token: Token::ArrayStart,
                }
            }
            b']' => {
                self.pos += 1;
                SpannedToken {
                    offset,
                    token: Token::ArrayEnd,
                }
            }
            b'{' => {
                self.pos += 1;
                SpannedToken {
                    offset,
                    token: Token::ProcStart,
                }
            }
            b'}' => {
                self.pos += 1;
                SpannedToken {
                    offset,
                    token: Token::ProcEnd,
                }
            }
            b')' => {
                self.pos += 1;
                SpannedToken {
                    offset,
                    token: Token::Error {
                        reason: "stray ')'".to_string(),
                        bounded: true,
                    },
                }
            }
            b'/' => match parse_name(rest) {
                Ok((remaining, token)) => {
                    self.pos += rest.len() - remaining.len();
                    SpannedToken { offset, token }
                }
                Err(_) => {
                    self.pos += 1;
                    SpannedToken {
                        offset,
                        token: Token::Error {
                            reason: "malformed name".to_string(),
                            bounded: true,
                        },
                    }
                }
            },
            b'+' | b'-' | b'.' | b'0'..=b'9' => match parse_number(rest) {
                Ok((remaining, token)) => {
                    self.pos += rest.len() - remaining.len();
                    SpannedToken { offset, token }
                }
                Err(_) => {
                    self.pos += 1;
                    SpannedToken {
                        offset,
                        token: Token::Error {
                            reason: format!("malformed number starting with '{}'", rest[0] as char),
                            bounded: true,
                        },
                    }
                }
            },
            _ => match parse_keyword(rest) {
                Ok((remaining, token)) => {
                    self.pos += rest.len() - remaining.len();
                    SpannedToken { offset, token }
                }
                Err(_) => {
                    self.pos += 1;
                    SpannedToken {
                        offset,
                        token: Token::Error {
                            reason: format!("unexpected byte 0x{:02X}", rest[0]),
                            bounded: true,
                        },
                    }
                }
            },
        }
    }
}
