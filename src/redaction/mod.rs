//! True-redaction engine.
//!
//! Removes content from an operator sequence so that it is no longer
//! extractable by any downstream reader. This is removal, not masking: the
//! glyph codes and drawing operators leave the stream. Optional markers can
//! be painted over removed regions, but markers never substitute for
//! removal — a marker without removal is a failed redaction.
//!
//! Targets are collected on a [`Redactor`], then [`Redactor::apply`] runs a
//! single deterministic pass:
//!
//! - Text-showing operators are redacted *letter-precise*. Only the glyphs
//!   whose boxes intersect a target are removed; survivors are re-emitted as
//!   a `TJ` whose position adjustments stand in for the removed glyphs, so
//!   the remaining text does not shift.
//! - A painting operator whose path box intersects a target is removed
//!   together with the path-construction operators that belong exclusively
//!   to it.
//! - `Do` is opaque: it is removed whole when the XObject's known bounds
//!   intersect a target, and left alone (with a warning) when no bounds are
//!   available.
//! - State, positioning and color operators are never removed by area or
//!   text targets, so text after a redaction still paints correctly.
//!
//! BT/ET and q/Q balance is preserved across any redaction; `'` and `"` are
//! emptied rather than dropped because their line-move and spacing side
//! effects belong to the surviving content.

use std::collections::{HashMap, HashSet};

use crate::content::graphics_state::ParserState;
use crate::content::operators::{Operator, OperatorCategory, OperatorSequence};
use crate::content::registry::OperatorRegistry;
use crate::content::text_layout::{Letter, TextLayout};
use crate::error::{Diagnostic, Error, Result};
use crate::geometry::Rect;
use crate::object::Object;
use crate::page::PageResources;

/// Letter predicate used by [`Redactor::redact_letters`].
pub type LetterPredicate = Box<dyn Fn(&Letter) -> bool>;

enum Target {
    Area(Rect),
    Text(String),
    Letters(LetterPredicate),
    AllText,
    Category(OperatorCategory),
}

/// Result of one redaction pass.
#[derive(Debug, Clone)]
pub struct RedactionOutcome {
    /// The redacted sequence
    pub sequence: OperatorSequence,
    /// How many letters (glyphs) were removed
    pub letters_removed: usize,
    /// How many operators were dropped outright
    pub operators_removed: usize,
    /// Findings from layout and footprint resolution
    pub warnings: Vec<Diagnostic>,
}

impl RedactionOutcome {
    /// Verify step: does the redacted page still contain `needle`?
    ///
    /// Re-runs text layout over the redacted sequence and scans the
    /// concatenated letters. Redaction callers should trust but verify.
    pub fn contains_text(&self, resources: &PageResources, needle: &str) -> bool {
        TextLayout::new(resources)
            .letters(&self.sequence)
            .text()
            .contains(needle)
    }
}

/// Collects redaction targets and configuration, then applies them.
pub struct Redactor {
    targets: Vec<Target>,
    markers: bool,
    marker_color: (f64, f64, f64),
}

impl Redactor {
    /// New redactor with no targets and markers off.
    pub fn new() -> Self {
        Self {
            targets: Vec::new(),
            markers: false,
            marker_color: (0.0, 0.0, 0.0),
        }
    }

    /// Remove everything whose footprint intersects `rect` (page coords).
    pub fn redact_area(mut self, rect: Rect) -> Self {
        self.targets.push(Target::Area(rect));
        self
    }

    /// Remove every occurrence of `substring` in the page text.
    ///
    /// Letter runs are matched against the concatenated letter values with
    /// restart, so overlapping occurrences are all found. Each match becomes
    /// an area target covering the matched letters.
    pub fn redact_text(mut self, substring: impl Into<String>) -> Self {
        self.targets.push(Target::Text(substring.into()));
        self
    }

    /// Remove every letter the predicate selects.
    pub fn redact_letters(mut self, predicate: impl Fn(&Letter) -> bool + 'static) -> Self {
        self.targets.push(Target::Letters(Box::new(predicate)));
        self
    }

    /// Remove every text-showing operator on the page.
    pub fn redact_all_text(mut self) -> Self {
        self.targets.push(Target::AllText);
        self
    }

    /// Remove every operator of the given category.
    pub fn redact_category(mut self, category: OperatorCategory) -> Self {
        self.targets.push(Target::Category(category));
        self
    }

    /// Paint opaque marker rectangles over redacted regions.
    ///
    /// Off by default. Markers are cosmetic — the content under them is
    /// already gone. Turning markers on without any removal target does
    /// nothing; a marker is never a redaction by itself.
    pub fn with_markers(mut self, markers: bool) -> Self {
        self.markers = markers;
        self
    }

    /// Marker fill color, each component clamped to 0..=1. Default black.
    pub fn marker_color(mut self, r: f64, g: f64, b: f64) -> Self {
        self.marker_color = (
            r.clamp(0.0, 1.0),
            g.clamp(0.0, 1.0),
            b.clamp(0.0, 1.0),
        );
        self
    }

    /// Run the redaction over a sequence.
    ///
    /// Surviving operators keep their relative order and source offsets.
    /// Returns [`Error::InvariantViolation`] only if removal broke the
    /// BT/ET or q/Q balance of a previously balanced sequence, which would
    /// indicate a bug in the engine itself.
    pub fn apply(
        &self,
        sequence: &OperatorSequence,
        resources: &PageResources,
    ) -> Result<RedactionOutcome> {
        let layout = TextLayout::new(resources).letters(sequence);
        let info = survey(sequence, resources);
        let mut pass = RemovalPass {
            letters: &layout.letters,
            sequence,
            info: &info,
            removed_letters: HashSet::new(),
            dropped_ops: HashSet::new(),
            warnings: layout.warnings.clone(),
            missing_bounds_reported: HashSet::new(),
        };
        let mut marker_rects: Vec<Rect> = Vec::new();
        let letters = &layout.letters;

        // Non-text targets resolve in one round.
        for target in &self.targets {
            match target {
                Target::Area(rect) => {
                    if pass.apply_rect(rect) && self.markers {
                        marker_rects.push(*rect);
                    }
                }
                Target::Text(_) => {}
                Target::Letters(predicate) => {
                    let selected: Vec<usize> = letters
                        .iter()
                        .enumerate()
                        .filter(|&(_, l)| predicate(l))
                        .map(|(i, _)| i)
                        .collect();
                    if self.markers {
                        if let Some(rect) = union_of(letters, &selected) {
                            marker_rects.push(rect);
                        }
                    }
                    pass.removed_letters.extend(selected);
                }
                Target::AllText => {
                    let selected: Vec<usize> = (0..letters.len()).collect();
                    if self.markers {
                        if let Some(rect) = union_of(letters, &selected) {
                            marker_rects.push(rect);
                        }
                    }
                    pass.removed_letters.extend(selected);
                    for (i, op) in sequence.iter().enumerate() {
                        if op.category == OperatorCategory::TextShowing {
                            mark_text_op_removed(op, i, &mut pass.dropped_ops);
                        }
                    }
                }
                Target::Category(category) => {
                    for (i, op) in sequence.iter().enumerate() {
                        if op.category != *category {
                            continue;
                        }
                        match category {
                            OperatorCategory::TextShowing => {
                                mark_text_op_removed(op, i, &mut pass.dropped_ops);
                                pass.removed_letters.extend(
                                    letters
                                        .iter()
                                        .enumerate()
                                        .filter(|(_, l)| l.operator_index == i)
                                        .map(|(idx, _)| idx),
                                );
                            }
                            OperatorCategory::PathPainting => {
                                pass.dropped_ops.insert(i);
                                pass.dropped_ops
                                    .extend(info.ops[i].path_group.iter().copied());
                            }
                            _ => {
                                // Unconditional removal. TextObject holds
                                // both BT and ET, GraphicsState both q and
                                // Q, so taking the whole category empties
                                // both sides of every pair and cannot
                                // unbalance; the end-of-pass check below
                                // verifies this.
                                pass.dropped_ops.insert(i);
                            }
                        }
                    }
                }
            }
        }

        // Text targets iterate to a fixpoint: removing a match can splice
        // surviving letters into a fresh occurrence of the needle, which
        // must also disappear (and makes redact_text idempotent).
        let needles: Vec<&str> = self
            .targets
            .iter()
            .filter_map(|t| match t {
                Target::Text(needle) => Some(needle.as_str()),
                _ => None,
            })
            .collect();
        if !needles.is_empty() {
            loop {
                let alive: Vec<usize> = (0..letters.len())
                    .filter(|i| !pass.removed_letters.contains(i))
                    .collect();
                let mut round_rects: Vec<Rect> = Vec::new();
                for needle in &needles {
                    round_rects.extend(match_text_regions(letters, &alive, needle));
                }
                let mut any_hit = false;
                for rect in round_rects {
                    if pass.apply_rect(&rect) {
                        any_hit = true;
                        if self.markers {
                            marker_rects.push(rect);
                        }
                    }
                }
                if !any_hit {
                    break;
                }
            }
        }

        let RemovalPass {
            removed_letters,
            dropped_ops,
            warnings,
            ..
        } = pass;

        // Group removed letters per operator for the rebuild.
        let mut removed_by_op: HashMap<usize, Vec<&Letter>> = HashMap::new();
        for &idx in &removed_letters {
            let letter = &letters[idx];
            removed_by_op.entry(letter.operator_index).or_default().push(letter);
        }
        let mut letters_per_op: HashMap<usize, usize> = HashMap::new();
        for letter in letters {
            *letters_per_op.entry(letter.operator_index).or_default() += 1;
        }

        // Single emission pass.
        let mut out = OperatorSequence::new();
        let mut operators_removed = 0usize;
        for (i, op) in sequence.iter().enumerate() {
            if dropped_ops.contains(&i) {
                operators_removed += 1;
                continue;
            }
            match removed_by_op.get(&i) {
                Some(removed) if op.category == OperatorCategory::TextShowing => {
                    let total = letters_per_op.get(&i).copied().unwrap_or(0);
                    if removed.len() >= total {
                        // Every glyph gone: Tj/TJ disappear, quote forms
                        // keep their side effects with an empty payload.
                        match op.name.as_str() {
                            "'" | "\"" => out.push(emptied_quote(op)),
                            _ => operators_removed += 1,
                        }
                    } else {
                        for rebuilt in rebuild_partial(op, removed, &info.ops[i]) {
                            out.push(rebuilt);
                        }
                    }
                }
                _ => out.push(op.clone()),
            }
        }

        if self.markers {
            for rect in &marker_rects {
                append_marker(&mut out, rect, self.marker_color);
            }
        }

        if sequence.is_balanced() && !out.is_balanced() {
            return Err(Error::InvariantViolation {
                index: 0,
                reason: "redaction unbalanced BT/ET or q/Q".to_string(),
            });
        }

        Ok(RedactionOutcome {
            sequence: out,
            letters_removed: removed_letters.len(),
            operators_removed,
            warnings,
        })
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new()
    }
}

/// Full removal bookkeeping for a text-showing operator: Tj and TJ are
/// dropped, quote forms are handled at emission time.
fn mark_text_op_removed(op: &Operator, index: usize, dropped: &mut HashSet<usize>) {
    if op.name != "'" && op.name != "\"" {
        dropped.insert(index);
    }
}

/// Union rectangle of the given letter indices.
fn union_of(letters: &[Letter], indices: &[usize]) -> Option<Rect> {
    let mut rect: Option<Rect> = None;
    for &i in indices {
        rect = Some(match rect {
            Some(r) => r.union(&letters[i].rect),
            None => letters[i].rect,
        });
    }
    rect
}

/// Shared removal bookkeeping for one [`Redactor::apply`] run.
struct RemovalPass<'a> {
    letters: &'a [Letter],
    sequence: &'a OperatorSequence,
    info: &'a Survey,
    removed_letters: HashSet<usize>,
    dropped_ops: HashSet<usize>,
    warnings: Vec<Diagnostic>,
    missing_bounds_reported: HashSet<String>,
}

impl RemovalPass<'_> {
    /// Remove everything whose footprint intersects `rect`. Returns whether
    /// anything new was removed.
    fn apply_rect(&mut self, rect: &Rect) -> bool {
        let mut hit = false;

        for (i, letter) in self.letters.iter().enumerate() {
            if letter.rect.intersects(rect) && self.removed_letters.insert(i) {
                hit = true;
            }
        }

        for (i, op) in self.sequence.iter().enumerate() {
            match op.category {
                OperatorCategory::PathPainting => {
                    if let Some(footprint) = self.info.ops[i].paint_footprint {
                        if footprint.intersects(rect) {
                            hit |= self.dropped_ops.insert(i);
                            self.dropped_ops
                                .extend(self.info.ops[i].path_group.iter().copied());
                        }
                    }
                }
                OperatorCategory::XObject => match self.info.ops[i].xobject_footprint {
                    Some(footprint) => {
                        if footprint.intersects(rect) {
                            hit |= self.dropped_ops.insert(i);
                        }
                    }
                    None => {
                        if let Some(name) = op.operands.last().and_then(Object::as_name) {
                            if self.missing_bounds_reported.insert(name.to_string()) {
                                log::warn!(
                                    "XObject /{} has no bounds, cannot test intersection",
                                    name
                                );
                                self.warnings.push(Diagnostic::MissingXObjectBounds {
                                    name: name.to_string(),
                                });
                            }
                        }
                    }
                },
                _ => {}
            }
        }

        hit
    }
}

/// Find every occurrence of `needle` in the concatenated values of the
/// `alive` letters and return the union rectangle of each occurrence.
///
/// Matching restarts one character after each match start, so overlapping
/// occurrences are all found.
fn match_text_regions(letters: &[Letter], alive: &[usize], needle: &str) -> Vec<Rect> {
    if needle.is_empty() || alive.is_empty() {
        return Vec::new();
    }

    // Flatten letters into one string, tracking which letter owns each byte.
    let mut flat = String::new();
    let mut owner: Vec<usize> = Vec::new();
    for &i in alive {
        let letter = &letters[i];
        flat.push_str(&letter.value);
        for _ in 0..letter.value.len() {
            owner.push(i);
        }
    }

    let mut regions = Vec::new();
    let mut search_from = 0usize;
    while search_from < flat.len() {
        let Some(found) = flat[search_from..].find(needle) else {
            break;
        };
        let start = search_from + found;
        let end = start + needle.len();

        let indices: Vec<usize> = {
            let mut set: Vec<usize> = owner[start..end].to_vec();
            set.dedup();
            set
        };
        if let Some(rect) = union_of(letters, &indices) {
            regions.push(rect);
        }

        // Restart just past the match start to catch overlaps.
        search_from = start + 1;
        while search_from < flat.len() && !flat.is_char_boundary(search_from) {
            search_from += 1;
        }
    }
    regions
}

/// Per-operator facts captured in one state pass before removal.
#[derive(Debug, Clone, Default)]
struct OpSurvey {
    /// Font size at the operator (text-showing rebuild math)
    font_size: f64,
    /// Horizontal scaling percentage at the operator
    horizontal_scaling: f64,
    /// Device-space box of the current path, for painting operators
    paint_footprint: Option<Rect>,
    /// Construction (and clip-marker) operators feeding this painting op
    path_group: Vec<usize>,
    /// Device-space XObject bounds, for Do
    xobject_footprint: Option<Rect>,
}

struct Survey {
    ops: Vec<OpSurvey>,
}

/// Walk the sequence once, tracking CTM, text parameters and the current
/// path, so footprints and rebuild math have what they need.
fn survey(sequence: &OperatorSequence, resources: &PageResources) -> Survey {
    let registry = OperatorRegistry::new();
    let mut state = ParserState::new();
    let mut ops = vec![OpSurvey::default(); sequence.len()];

    let mut path_bbox: Option<Rect> = None;
    let mut path_ops: Vec<usize> = Vec::new();

    let extend = |bbox: &mut Option<Rect>, rect: Rect| {
        *bbox = Some(match bbox {
            Some(b) => b.union(&rect),
            None => rect,
        });
    };

    for (i, op) in sequence.iter().enumerate() {
        ops[i].font_size = state.font_size;
        ops[i].horizontal_scaling = state.horizontal_scaling;

        match op.category {
            OperatorCategory::PathConstruction => {
                path_ops.push(i);
                let nums: Vec<f64> =
                    op.operands.iter().filter_map(Object::as_number).collect();
                match op.name.as_str() {
                    "re" => {
                        if nums.len() >= 4 {
                            let n = nums.len();
                            let rect = Rect::from_origin_size(
                                nums[n - 4],
                                nums[n - 3],
                                nums[n - 2],
                                nums[n - 1],
                            )
                            .transform(&state.ctm);
                            extend(&mut path_bbox, rect);
                        }
                    }
                    // Control points bound the curve, so including them
                    // keeps the box conservative.
                    _ => {
                        for pair in nums.chunks_exact(2) {
                            let p = state.ctm.transform_point(pair[0], pair[1]);
                            extend(&mut path_bbox, Rect::new(p.x, p.y, p.x, p.y));
                        }
                    }
                }
            }
            OperatorCategory::PathPainting => {
                // `n` paints nothing; it only ends the path (usually after
                // a clip), so area targets never select it. Category
                // removal still takes it with the rest of its group.
                if op.name != "n" {
                    ops[i].paint_footprint = path_bbox;
                }
                ops[i].path_group = std::mem::take(&mut path_ops);
                path_bbox = None;
            }
            OperatorCategory::XObject => {
                if let Some(name) = op.operands.last().and_then(Object::as_name) {
                    ops[i].xobject_footprint = resources
                        .xobject_bounds
                        .get(name)
                        .map(|b| b.transform(&state.ctm));
                }
            }
            OperatorCategory::Other if op.name == "W" || op.name == "W*" => {
                // Clip markers ride with the path they modify.
                path_ops.push(i);
            }
            _ => {}
        }

        registry.apply(op, &mut state);
    }

    Survey { ops }
}

/// TJ adjustment value equivalent to a removed glyph's advance.
///
/// A TJ number `n` shifts the cursor by `-(n/1000) * size * (Tz/100)`, so
/// reproducing a forward displacement `advance` takes
/// `n = -advance * 1000 / (size * Tz/100)`.
fn advance_to_adjustment(advance: f64, survey: &OpSurvey) -> f64 {
    let scale = survey.font_size * survey.horizontal_scaling / 100.0;
    if scale == 0.0 {
        return 0.0;
    }
    -advance * 1000.0 / scale
}

/// An empty-payload `'` or `"` preserving the original's side effects.
fn emptied_quote(op: &Operator) -> Operator {
    let operands = match op.name.as_str() {
        "\"" => {
            let n = op.operands.len();
            let aw = op.operands.get(n.wrapping_sub(3)).cloned().unwrap_or(Object::Integer(0));
            let ac = op.operands.get(n.wrapping_sub(2)).cloned().unwrap_or(Object::Integer(0));
            vec![aw, ac, Object::LiteralString(Vec::new())]
        }
        _ => vec![Object::LiteralString(Vec::new())],
    };
    Operator::new(op.name.clone(), operands, op.offset)
}

/// One element of a text-showing operator, in the same filtered order the
/// handlers use — strings and numeric adjustments only, other array junk
/// skipped. A letter's `element_index` indexes into this list.
enum TjPiece {
    /// Glyph codes, plus whether the source string was hex
    Text(Vec<u8>, bool),
    /// Numeric position adjustment
    Adjustment(f64),
}

fn tj_pieces(op: &Operator) -> Vec<TjPiece> {
    match op.name.as_str() {
        "TJ" => match op.operands.last().and_then(Object::as_array) {
            Some(array) => array
                .iter()
                .filter_map(|obj| match obj {
                    Object::LiteralString(s) => Some(TjPiece::Text(s.clone(), false)),
                    Object::HexString(s) => Some(TjPiece::Text(s.clone(), true)),
                    Object::Integer(i) => Some(TjPiece::Adjustment(*i as f64)),
                    Object::Real(r) => Some(TjPiece::Adjustment(*r)),
                    _ => None,
                })
                .collect(),
            None => Vec::new(),
        },
        _ => match op.operands.last() {
            Some(Object::LiteralString(s)) => vec![TjPiece::Text(s.clone(), false)],
            Some(Object::HexString(s)) => vec![TjPiece::Text(s.clone(), true)],
            _ => Vec::new(),
        },
    }
}

/// Rebuild a partially redacted text-showing operator.
///
/// Kept glyph runs become TJ strings; each removed run becomes one numeric
/// adjustment covering its advance, so surviving glyphs keep their exact
/// positions — including glyphs shown by later operators in the same text
/// object. Quote forms are emptied first (line move, spacing) and the kept
/// content follows as a TJ.
fn rebuild_partial(op: &Operator, removed: &[&Letter], survey: &OpSurvey) -> Vec<Operator> {
    // (element_index, byte_index) -> removed letter
    let removed_map: HashMap<(usize, usize), &Letter> = removed
        .iter()
        .map(|l| ((l.element_index, l.byte_index), *l))
        .collect();

    let mut array: Vec<Object> = Vec::new();
    let mut pending = 0.0f64;

    let flush_pending = |array: &mut Vec<Object>, pending: &mut f64| {
        if *pending != 0.0 {
            let rounded = pending.round();
            if (*pending - rounded).abs() < 1e-9 {
                array.push(Object::Integer(rounded as i64));
            } else {
                array.push(Object::Real(*pending));
            }
            *pending = 0.0;
        }
    };

    for (element_index, piece) in tj_pieces(op).iter().enumerate() {
        match piece {
            TjPiece::Adjustment(n) => pending += n,
            TjPiece::Text(bytes, hex) => {
                let mut run: Vec<u8> = Vec::new();
                for (byte_index, &byte) in bytes.iter().enumerate() {
                    match removed_map.get(&(element_index, byte_index)) {
                        Some(letter) => {
                            if !run.is_empty() {
                                flush_pending(&mut array, &mut pending);
                                array.push(make_string(std::mem::take(&mut run), *hex));
                            }
                            pending += advance_to_adjustment(letter.advance, survey);
                        }
                        None => run.push(byte),
                    }
                }
                if !run.is_empty() {
                    flush_pending(&mut array, &mut pending);
                    array.push(make_string(run, *hex));
                }
            }
        }
    }
    flush_pending(&mut array, &mut pending);

    let rebuilt = Operator::new("TJ", vec![Object::Array(array)], op.offset);
    match op.name.as_str() {
        "'" | "\"" => vec![emptied_quote(op), rebuilt],
        _ => vec![rebuilt],
    }
}

fn make_string(bytes: Vec<u8>, hex: bool) -> Object {
    if hex {
        Object::HexString(bytes)
    } else {
        Object::LiteralString(bytes)
    }
}

/// Append one marker block: `q  r g b rg  x y w h re  f  Q`.
fn append_marker(out: &mut OperatorSequence, rect: &Rect, color: (f64, f64, f64)) {
    out.push(Operator::bare("q"));
    out.push(Operator::new(
        "rg",
        vec![
            Object::Real(color.0),
            Object::Real(color.1),
            Object::Real(color.2),
        ],
        0,
    ));
    out.push(Operator::new(
        "re",
        vec![
            Object::Real(rect.left),
            Object::Real(rect.bottom),
            Object::Real(rect.width()),
            Object::Real(rect.height()),
        ],
        0,
    ));
    out.push(Operator::bare("f"));
    out.push(Operator::bare("Q"));
}
