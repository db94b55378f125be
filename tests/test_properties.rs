//! Property-based tests for the content pipeline.
//!
//! Generates structured content streams and checks the universal
//! invariants: round-trip stability, balance preservation, redaction
//! idempotence and text disappearance, plus never-panic on arbitrary bytes.

use pdf_redact::content::{parse_content_stream, ContentWriter, TextLayout};
use pdf_redact::fonts::FontMetrics;
use pdf_redact::page::PageResources;
use pdf_redact::redaction::Redactor;
use pdf_redact::Rect;
use proptest::prelude::*;

fn resources() -> PageResources {
    let mut resources = PageResources::new();
    resources
        .fonts
        .insert("F1".to_string(), FontMetrics::monospaced(500.0));
    resources
}

// Strategy for text safe to embed in a literal string without escapes.
fn plain_text_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,:;-]{1,16}"
}

// One text block: BT, font, position, a mix of show operators, ET.
fn text_block_strategy() -> impl Strategy<Value = String> {
    (
        1u32..30,
        1u32..700,
        1u32..700,
        prop::collection::vec(
            prop_oneof![
                plain_text_strategy().prop_map(|t| format!("({}) Tj", t)),
                (plain_text_strategy(), -500i32..500, plain_text_strategy())
                    .prop_map(|(a, kern, b)| format!("[({}) {} ({})] TJ", a, kern, b)),
                plain_text_strategy().prop_map(|t| format!("({}) '", t)),
            ],
            1..4,
        ),
    )
        .prop_map(|(size, x, y, shows)| {
            format!(
                "BT /F1 {} Tf 14 TL {} {} Td {} ET",
                size,
                x,
                y,
                shows.join(" ")
            )
        })
}

// One graphics block: an optionally saved/transformed filled rectangle.
fn graphics_block_strategy() -> impl Strategy<Value = String> {
    (0u32..600, 0u32..600, 1u32..100, 1u32..100, any::<bool>()).prop_map(
        |(x, y, w, h, saved)| {
            if saved {
                format!("q 0.5 g {} {} {} {} re f Q", x, y, w, h)
            } else {
                format!("{} {} {} {} re f", x, y, w, h)
            }
        },
    )
}

// A whole content stream: interleaved text and graphics blocks.
fn content_stream_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop_oneof![text_block_strategy(), graphics_block_strategy()],
        0..6,
    )
    .prop_map(|blocks| blocks.join("\n").into_bytes())
}

proptest! {
    // Round-trip stability: the writer's output is a fixed point.
    #[test]
    fn prop_write_parse_write_stabilizes(src in content_stream_strategy()) {
        let writer = ContentWriter::new();
        let b1 = writer.write(&parse_content_stream(&src).sequence);
        let b2 = writer.write(&parse_content_stream(&b1).sequence);
        let b3 = writer.write(&parse_content_stream(&b2).sequence);
        prop_assert_eq!(&b2, &b3);
    }

    // Structural round trip: re-parsing serialized output preserves every
    // operator and operand.
    #[test]
    fn prop_reparse_is_structural_identity(src in content_stream_strategy()) {
        let first = parse_content_stream(&src).sequence;
        let bytes = ContentWriter::new().write(&first);
        let second = parse_content_stream(&bytes).sequence;
        prop_assert!(first.structural_eq(&second));
    }

    // Redacting a region that overlaps nothing changes nothing.
    #[test]
    fn prop_noop_redaction_is_identity(src in content_stream_strategy()) {
        let resources = resources();
        let seq = parse_content_stream(&src).sequence;
        let outcome = Redactor::new()
            .redact_area(Rect::new(5000.0, 5000.0, 5001.0, 5001.0))
            .apply(&seq, &resources)
            .unwrap();
        prop_assert!(outcome.sequence.structural_eq(&seq));
    }

    // BT/ET and q/Q balance holds after any area redaction.
    #[test]
    fn prop_balance_preserved(
        src in content_stream_strategy(),
        x in 0.0f64..700.0,
        y in 0.0f64..700.0,
    ) {
        let resources = resources();
        let seq = parse_content_stream(&src).sequence;
        let outcome = Redactor::new()
            .redact_area(Rect::new(x, y, x + 120.0, y + 120.0))
            .apply(&seq, &resources)
            .unwrap();
        prop_assert!(outcome.sequence.open_text_objects() == 0);
        prop_assert!(outcome.sequence.open_saves() == 0);
    }

    // After redact_text(w), the page text no longer contains w.
    #[test]
    fn prop_text_disappears(
        src in content_stream_strategy(),
        needle in "[a-zA-Z]{2,6}",
    ) {
        let resources = resources();
        let seq = parse_content_stream(&src).sequence;
        let outcome = Redactor::new()
            .redact_text(needle.clone())
            .apply(&seq, &resources)
            .unwrap();
        let remaining = TextLayout::new(&resources).letters(&outcome.sequence).text();
        prop_assert!(!remaining.contains(&needle));
    }

    // redact_text twice equals once.
    #[test]
    fn prop_text_redaction_idempotent(
        src in content_stream_strategy(),
        needle in "[a-zA-Z]{2,6}",
    ) {
        let resources = resources();
        let seq = parse_content_stream(&src).sequence;
        let once = Redactor::new()
            .redact_text(needle.clone())
            .apply(&seq, &resources)
            .unwrap();
        let twice = Redactor::new()
            .redact_text(needle)
            .apply(&once.sequence, &resources)
            .unwrap();
        prop_assert!(once.sequence.structural_eq(&twice.sequence));
    }

    // The parser accepts arbitrary bytes without panicking, and its output
    // always serializes.
    #[test]
    fn prop_never_panics_on_arbitrary_bytes(bytes in prop::collection::vec(any::<u8>(), 0..300)) {
        let parsed = parse_content_stream(&bytes);
        let _ = ContentWriter::new().write(&parsed.sequence);
    }

    // Redacted output still round-trips byte-stably.
    #[test]
    fn prop_redacted_output_round_trips(
        src in content_stream_strategy(),
        needle in "[a-zA-Z]{2,6}",
    ) {
        let resources = resources();
        let seq = parse_content_stream(&src).sequence;
        let outcome = Redactor::new()
            .redact_text(needle)
            .apply(&seq, &resources)
            .unwrap();
        let writer = ContentWriter::new();
        let b1 = writer.write(&outcome.sequence);
        let b2 = writer.write(&parse_content_stream(&b1).sequence);
        prop_assert_eq!(&b1, &b2);
    }
}
