//! Letter geometry through the public API: advances, spacing, matrices,
//! provenance, and the missing-font fallback.

use std::collections::HashMap;

use pdf_redact::content::{parse_content_stream, TextLayout};
use pdf_redact::fonts::FontMetrics;
use pdf_redact::page::{MemoryPageView, Page, PageResources};
use pdf_redact::{Diagnostic, Rect};

fn helvetica_ish() -> FontMetrics {
    FontMetrics::monospaced(500.0)
        .with_width(b'i', 222.0)
        .with_width(b'W', 944.0)
        .with_width(b' ', 278.0)
        .with_vertical_metrics(718.0, -207.0)
}

#[test]
fn test_letters_have_page_space_rects() {
    let mut resources = PageResources::new();
    resources.fonts.insert("F1".to_string(), helvetica_ish());
    let mut view = MemoryPageView::new(
        &b"BT /F1 10 Tf 72 720 Td (Wi) Tj ET"[..],
        resources,
    );
    let mut page = Page::new(&mut view);
    let letters = page.letters().unwrap();

    assert_eq!(letters.len(), 2);
    let w = &letters[0];
    assert_eq!(w.value, "W");
    assert!((w.rect.left - 72.0).abs() < 1e-9);
    assert!((w.rect.right - (72.0 + 9.44)).abs() < 1e-9);
    assert!((w.rect.bottom - (720.0 - 2.07)).abs() < 1e-9);
    assert!((w.rect.top - (720.0 + 7.18)).abs() < 1e-9);

    let i = &letters[1];
    assert_eq!(i.value, "i");
    assert!((i.rect.left - (72.0 + 9.44)).abs() < 1e-9);
    assert!((i.rect.width() - 2.22).abs() < 1e-9);
}

#[test]
fn test_text_concatenates_in_drawing_order() {
    let mut resources = PageResources::new();
    resources
        .fonts
        .insert("F1".to_string(), FontMetrics::monospaced(500.0));
    let mut view = MemoryPageView::new(
        &b"BT /F1 12 Tf 72 720 Td (first) Tj 0 -14 Td (second) Tj ET"[..],
        resources,
    );
    let mut page = Page::new(&mut view);
    assert_eq!(page.text().unwrap(), "firstsecond");
}

#[test]
fn test_spacing_and_scaling_combine() {
    let mut resources = PageResources::new();
    resources
        .fonts
        .insert("F1".to_string(), FontMetrics::monospaced(500.0));
    // tx = ((500/1000)*10 + 1 + 2) * 0.5 for the space glyph.
    let parsed = parse_content_stream(b"BT /F1 10 Tf 1 Tc 2 Tw 50 Tz ( ) Tj ET");
    let outcome = TextLayout::new(&resources).letters(&parsed.sequence);
    assert!((outcome.letters[0].advance - 4.0).abs() < 1e-9);
}

#[test]
fn test_tm_and_cm_compose() {
    let mut resources = PageResources::new();
    resources
        .fonts
        .insert("F1".to_string(), FontMetrics::monospaced(500.0));
    let parsed = parse_content_stream(
        b"q 2 0 0 2 10 10 cm BT /F1 10 Tf 1 0 0 1 30 40 Tm (A) Tj ET Q",
    );
    let outcome = TextLayout::new(&resources).letters(&parsed.sequence);
    let a = &outcome.letters[0];
    // Text space origin (30,40) through the CTM: (70, 90).
    assert!((a.rect.left - 70.0).abs() < 1e-9);
    assert!((a.rect.bottom - (90.0 - 4.0)).abs() < 1e-9);
    // Glyph width doubles under the CTM scale.
    assert!((a.rect.width() - 10.0).abs() < 1e-9);
}

#[test]
fn test_missing_font_fallback_metrics() {
    let resources = PageResources::new();
    let parsed = parse_content_stream(b"BT /Ghost 20 Tf (ab) Tj ET");
    let outcome = TextLayout::new(&resources).letters(&parsed.sequence);

    assert_eq!(outcome.text(), "ab");
    assert!(outcome
        .warnings
        .iter()
        .any(|w| matches!(w, Diagnostic::MissingFont { name } if name == "Ghost")));
    // 0.5 x fontSize advance.
    assert!((outcome.letters[0].advance - 10.0).abs() < 1e-9);
}

#[test]
fn test_font_bbox_overrides_vertical_metrics() {
    let mut resources = PageResources::new();
    resources.fonts.insert(
        "F1".to_string(),
        FontMetrics::monospaced(500.0).with_bbox(Rect::new(0.0, -300.0, 1000.0, 900.0)),
    );
    let parsed = parse_content_stream(b"BT /F1 10 Tf (A) Tj ET");
    let outcome = TextLayout::new(&resources).letters(&parsed.sequence);
    let a = &outcome.letters[0];
    assert!((a.rect.bottom - -3.0).abs() < 1e-9);
    assert!((a.rect.top - 9.0).abs() < 1e-9);
}

#[test]
fn test_encoding_table_maps_to_unicode() {
    let mut table = HashMap::new();
    table.insert(0x41u8, '♞');
    let mut resources = PageResources::new();
    resources.fonts.insert(
        "F1".to_string(),
        FontMetrics::monospaced(600.0).with_encoding(table),
    );
    let parsed = parse_content_stream(b"BT /F1 10 Tf (AB) Tj ET");
    let outcome = TextLayout::new(&resources).letters(&parsed.sequence);
    assert_eq!(outcome.text(), "♞B");
}

#[test]
fn test_letter_provenance_for_tj_arrays() {
    let mut resources = PageResources::new();
    resources
        .fonts
        .insert("F1".to_string(), FontMetrics::monospaced(500.0));
    let parsed = parse_content_stream(b"BT /F1 10 Tf [(ab) -120 (cd)] TJ ET");
    let outcome = TextLayout::new(&resources).letters(&parsed.sequence);

    let b = &outcome.letters[1];
    assert_eq!((b.element_index, b.byte_index), (0, 1));
    let c = &outcome.letters[2];
    assert_eq!((c.element_index, c.byte_index), (2, 0));
    // All four letters come from the single TJ (operator index 2).
    assert!(outcome.letters.iter().all(|l| l.operator_index == 2));
}

#[test]
fn test_rendering_mode_recorded_on_letters() {
    let mut resources = PageResources::new();
    resources
        .fonts
        .insert("F1".to_string(), FontMetrics::monospaced(500.0));
    let parsed = parse_content_stream(b"BT /F1 10 Tf (a) Tj 3 Tr (b) Tj 0 Tr (c) Tj ET");
    let outcome = TextLayout::new(&resources).letters(&parsed.sequence);
    let modes: Vec<u8> = outcome.letters.iter().map(|l| l.rendering_mode).collect();
    assert_eq!(modes, vec![0, 3, 0]);
}
