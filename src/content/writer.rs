//! Content stream writer.
//!
//! Serializes an [`OperatorSequence`] back to bytes, one operator per line:
//! `operand1 operand2 ... name\n`. The first write of a parsed stream may
//! normalize spacing and number formats; writing the re-parse of that output
//! reproduces it byte for byte, which is the round-trip stability contract
//! the redaction pipeline depends on.
//!
//! Number and string formatting rules:
//!
//! - Integers in plain decimal.
//! - Reals with up to six fractional digits, trailing zeros trimmed, and a
//!   decimal point always kept (`1.0`, not `1`) so a real re-parses as a
//!   real. Negative zero drops its sign.
//! - Literal strings escape `(`, `)` and `\`; HT/LF/CR use their named
//!   escapes; other bytes outside 0x20..=0x7E become 3-digit octal.
//! - Hex strings re-emit as uppercase hex pairs.
//! - Names escape bytes outside the printable-ASCII safe set as `#xx`.
//!
//! A sequence that ends inside an open BT or q block gets synthetic closers
//! appended so the output always satisfies the balance invariants.

use crate::content::operators::OperatorSequence;
use crate::object::Object;

/// Serializer for operator sequences.
#[derive(Debug, Clone, Default)]
pub struct ContentWriter;

impl ContentWriter {
    /// Create a writer with default settings.
    pub fn new() -> Self {
        Self
    }

    /// Serialize a sequence to content-stream bytes.
    pub fn write(&self, sequence: &OperatorSequence) -> Vec<u8> {
        let mut out = Vec::new();
        for op in sequence {
            // Preserved malformed runs go out exactly as they came in.
            if let Some(raw) = op.raw_bytes() {
                out.extend_from_slice(raw);
                out.push(b'\n');
                continue;
            }
            for operand in &op.operands {
                write_object(&mut out, operand);
                out.push(b' ');
            }
            out.extend_from_slice(op.name.as_bytes());
            out.push(b'\n');
        }
        for closer in synthetic_closers(sequence) {
            out.extend_from_slice(closer.as_bytes());
            out.push(b'\n');
        }
        out
    }
}

/// Closers needed to balance the sequence, innermost first.
fn synthetic_closers(sequence: &OperatorSequence) -> Vec<&'static str> {
    let mut open: Vec<&'static str> = Vec::new();
    for op in sequence {
        match op.name.as_str() {
            "BT" => open.push("ET"),
            "q" => open.push("Q"),
            "ET" => {
                if let Some(pos) = open.iter().rposition(|c| *c == "ET") {
                    open.remove(pos);
                }
            }
            "Q" => {
                if let Some(pos) = open.iter().rposition(|c| *c == "Q") {
                    open.remove(pos);
                }
            }
            _ => {}
        }
    }
    open.reverse();
    open
}

/// Serialize one object.
fn write_object(out: &mut Vec<u8>, obj: &Object) {
    match obj {
        Object::Null => out.extend_from_slice(b"null"),
        Object::Boolean(true) => out.extend_from_slice(b"true"),
        Object::Boolean(false) => out.extend_from_slice(b"false"),
        Object::Integer(i) => out.extend_from_slice(i.to_string().as_bytes()),
        Object::Real(r) => out.extend_from_slice(format_real(*r).as_bytes()),
        Object::LiteralString(bytes) => write_literal_string(out, bytes),
        Object::HexString(bytes) => write_hex_string(out, bytes),
        Object::Name(name) => write_name(out, name),
        Object::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                write_object(out, item);
            }
            out.push(b']');
        }
        Object::Dictionary(dict) => {
            if dict.is_empty() {
                out.extend_from_slice(b"<<>>");
            } else {
                out.extend_from_slice(b"<<");
                for (key, value) in dict {
                    out.push(b' ');
                    write_name(out, key);
                    out.push(b' ');
                    write_object(out, value);
                }
                out.extend_from_slice(b" >>");
            }
        }
        Object::Reference(r) => {
            out.extend_from_slice(format!("{} {} R", r.id, r.gen).as_bytes());
        }
    }
}

/// Format a real: up to six fractional digits, trailing zeros trimmed, one
/// fractional digit always kept. Negative zero loses its sign.
fn format_real(value: f64) -> String {
    if value == 0.0 {
        return "0.0".to_string();
    }
    let formatted = format!("{:.6}", value);
    let trimmed = formatted.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{}0", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Literal string form with escaping.
fn write_literal_string(out: &mut Vec<u8>, bytes: &[u8]) {
    out.push(b'(');
    for &byte in bytes {
        match byte {
            b'(' => out.extend_from_slice(b"\\("),
            b')' => out.extend_from_slice(b"\\)"),
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            0x20..=0x7E => out.push(byte),
            _ => out.extend_from_slice(format!("\\{:03o}", byte).as_bytes()),
        }
    }
    out.push(b')');
}

/// Hex string form, uppercase pairs.
fn write_hex_string(out: &mut Vec<u8>, bytes: &[u8]) {
    out.push(b'<');
    for byte in bytes {
        out.extend_from_slice(format!("{:02X}", byte).as_bytes());
    }
    out.push(b'>');
}

/// Bytes a name may carry unescaped: printable ASCII minus delimiters and
/// the escape character itself.
fn is_safe_name_byte(byte: u8) -> bool {
    (0x21..=0x7E).contains(&byte)
        && !matches!(
            byte,
            b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' | b'#'
        )
}

/// Name form with `#xx` escaping.
fn write_name(out: &mut Vec<u8>, name: &str) {
    out.push(b'/');
    for byte in name.bytes() {
        if is_safe_name_byte(byte) {
            out.push(byte);
        } else {
            out.extend_from_slice(format!("#{:02X}", byte).as_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::operators::Operator;
    use crate::content::parse_content_stream;
    use indexmap::IndexMap;

    fn write_str(sequence: &OperatorSequence) -> String {
        String::from_utf8(ContentWriter::new().write(sequence)).unwrap()
    }

    fn roundtrip(src: &[u8]) -> String {
        let parsed = parse_content_stream(src);
        write_str(&parsed.sequence)
    }

    // ========================================================================
    // Number formatting
    // ========================================================================

    #[test]
    fn test_format_real_trims_trailing_zeros() {
        assert_eq!(format_real(2.5), "2.5");
        assert_eq!(format_real(2.500000), "2.5");
        assert_eq!(format_real(0.123456), "0.123456");
        assert_eq!(format_real(-0.25), "-0.25");
    }

    #[test]
    fn test_format_real_keeps_decimal_point() {
        assert_eq!(format_real(1.0), "1.0");
        assert_eq!(format_real(-3.0), "-3.0");
    }

    #[test]
    fn test_format_real_negative_zero() {
        assert_eq!(format_real(-0.0), "0.0");
        assert_eq!(format_real(0.0), "0.0");
    }

    #[test]
    fn test_integer_formatting() {
        assert_eq!(roundtrip(b"42 0 -17 op"), "42 0 -17 op\n");
    }

    // ========================================================================
    // Strings and names
    // ========================================================================

    #[test]
    fn test_literal_string_escaping() {
        let mut out = Vec::new();
        write_literal_string(&mut out, b"a(b)c\\d");
        assert_eq!(out, b"(a\\(b\\)c\\\\d)");
    }

    #[test]
    fn test_literal_string_control_bytes_octal() {
        let mut out = Vec::new();
        write_literal_string(&mut out, &[0x01, 0xFF]);
        assert_eq!(out, b"(\\001\\377)");
    }

    #[test]
    fn test_literal_string_named_escapes() {
        let mut out = Vec::new();
        write_literal_string(&mut out, b"a\nb\rc\td");
        assert_eq!(out, b"(a\\nb\\rc\\td)");
    }

    #[test]
    fn test_hex_string_stays_hex() {
        assert_eq!(roundtrip(b"<48656c6c6f> Tj"), "<48656C6C6F> Tj\n");
        assert_eq!(roundtrip(b"<> Tj"), "<> Tj\n");
    }

    #[test]
    fn test_name_hex_escape_round_trips() {
        // #20 decodes to a space and is re-escaped on output.
        assert_eq!(roundtrip(b"/A#20B op"), "/A#20B op\n");
    }

    #[test]
    fn test_name_escapes_hash_itself() {
        let mut out = Vec::new();
        write_name(&mut out, "A#B");
        assert_eq!(out, b"/A#23B");
    }

    // ========================================================================
    // Operators, arrays, dictionaries
    // ========================================================================

    #[test]
    fn test_one_operator_per_line() {
        assert_eq!(
            roundtrip(b"BT /F1 12 Tf 100 700 Td (Hello) Tj ET"),
            "BT\n/F1 12 Tf\n100 700 Td\n(Hello) Tj\nET\n"
        );
    }

    #[test]
    fn test_array_spacing() {
        assert_eq!(
            roundtrip(b"[ (AB)   -100(CD)]TJ"),
            "[(AB) -100 (CD)] TJ\n"
        );
    }

    #[test]
    fn test_dictionary_preserves_order() {
        let mut dict = IndexMap::new();
        dict.insert("B".to_string(), Object::Integer(2));
        dict.insert("A".to_string(), Object::Integer(1));
        let seq = OperatorSequence::from_ops(vec![Operator::new(
            "BDC",
            vec![Object::Name("Span".to_string()), Object::Dictionary(dict)],
            0,
        )]);
        assert_eq!(write_str(&seq), "/Span << /B 2 /A 1 >> BDC\n");
    }

    #[test]
    fn test_reference_writes_r_form() {
        assert_eq!(roundtrip(b"7 0 R op"), "7 0 R op\n");
    }

    #[test]
    fn test_unknown_operator_round_trips() {
        assert_eq!(roundtrip(b"1 2 xyzzy"), "1 2 xyzzy\n");
    }

    // ========================================================================
    // Synthetic closers
    // ========================================================================

    #[test]
    fn test_raw_run_emitted_verbatim_and_stable() {
        let b1 = ContentWriter::new().write(&parse_content_stream(b"<4G> ) 7 op").sequence);
        assert_eq!(b1, b"<4G>\n)\n7 op\n");
        let b2 = ContentWriter::new().write(&parse_content_stream(&b1).sequence);
        assert_eq!(b1, b2);
    }

    #[test]
    fn test_open_bt_gets_synthetic_et() {
        assert_eq!(roundtrip(b"BT (orphan) Tj"), "BT\n(orphan) Tj\nET\n");
    }

    #[test]
    fn test_open_q_gets_synthetic_q_close() {
        assert_eq!(roundtrip(b"q 0.5 g"), "q\n0.5 g\nQ\n");
    }

    #[test]
    fn test_nested_openers_close_in_reverse_order() {
        assert_eq!(roundtrip(b"q BT"), "q\nBT\nET\nQ\n");
        assert_eq!(roundtrip(b"BT q"), "BT\nq\nQ\nET\n");
    }

    #[test]
    fn test_balanced_input_gets_no_closers() {
        let out = roundtrip(b"q BT ET Q");
        assert_eq!(out, "q\nBT\nET\nQ\n");
    }

    // ========================================================================
    // Stability
    // ========================================================================

    #[test]
    fn test_write_parse_write_is_stable() {
        let sources: [&[u8]; 5] = [
            b"BT /F1 12 Tf 100 700 Td (Hello World) Tj ET",
            b"q 0.5 g 100 200 50 30 re f Q",
            b"[(AB) -100 (CD)] TJ",
            b"1.5 0 0 1.5 72.25 144.5 cm /Im1 Do",
            b"BT (orphan) Tj",
        ];
        for src in sources {
            let b1 = ContentWriter::new().write(&parse_content_stream(src).sequence);
            let b2 = ContentWriter::new().write(&parse_content_stream(&b1).sequence);
            assert_eq!(b1, b2, "unstable for {:?}", String::from_utf8_lossy(src));
        }
    }

    #[test]
    fn test_reparse_preserves_structure() {
        let src = b"BT /F1 12 Tf [(AB) -100 (CD)] TJ ET";
        let first = parse_content_stream(src).sequence;
        let bytes = ContentWriter::new().write(&first);
        let second = parse_content_stream(&bytes).sequence;
        assert!(first.structural_eq(&second));
    }

    #[test]
    fn test_empty_sequence_writes_nothing() {
        assert_eq!(write_str(&OperatorSequence::new()), "");
    }
}
