//! Page facade: one page's content stream, letters and redaction entry
//! point, glued to the enclosing document layer through [`PageView`].
//!
//! The document layer owns files, cross-reference tables, filters and
//! encryption. By the time bytes reach this module they are decoded and
//! decrypted, and the resources a page references have been resolved into
//! [`PageResources`]. The facade caches the parse of the current content and
//! keeps it consistent with what it writes back.

use bytes::Bytes;
use indexmap::IndexMap;

use crate::content::operators::{OperatorCategory, OperatorSequence};
use crate::content::parser::{parse_content_stream, ParsedContent};
use crate::content::text_layout::{LayoutOutcome, Letter, TextLayout};
use crate::content::writer::ContentWriter;
use crate::error::{Diagnostic, Error, Result};
use crate::fonts::FontMetrics;
use crate::geometry::Rect;
use crate::redaction::{RedactionOutcome, Redactor};

/// Resources a page's content stream can reference.
#[derive(Debug, Clone, Default)]
pub struct PageResources {
    /// Font metrics by resource name (the Tf operand)
    pub fonts: IndexMap<String, FontMetrics>,
    /// XObject bounding boxes by resource name (the Do operand), in the
    /// XObject's own space; the engine transforms them by the CTM
    pub xobject_bounds: IndexMap<String, Rect>,
}

impl PageResources {
    /// Empty resources.
    pub fn new() -> Self {
        Self::default()
    }
}

/// What the document layer supplies for one page.
///
/// `content_bytes` must already be defiltered, decrypted, and concatenated
/// when the page had multiple content stream pieces. A view that cannot
/// deliver decrypted bytes reports `is_encrypted`, and every facade call
/// fails with [`Error::UnsupportedEncryption`].
pub trait PageView {
    /// The page's decoded content-stream bytes.
    fn content_bytes(&self) -> Bytes;

    /// Whether the content is still encrypted. Default false.
    fn is_encrypted(&self) -> bool {
        false
    }

    /// Resolved page resources.
    fn resources(&self) -> &PageResources;

    /// The page's media box.
    fn media_box(&self) -> Rect;

    /// The page's crop box, when one is set.
    fn crop_box(&self) -> Option<Rect> {
        None
    }

    /// Page user unit (points multiplier). Default 1.0.
    fn user_unit(&self) -> f64 {
        1.0
    }

    /// Accept rewritten content-stream bytes.
    fn set_content_bytes(&mut self, bytes: Bytes);
}

/// A straightforward in-memory [`PageView`], for tests and for document
/// layers that materialize pages before editing.
#[derive(Debug, Clone, Default)]
pub struct MemoryPageView {
    /// Decoded content bytes
    pub content: Bytes,
    /// Page resources
    pub resources: PageResources,
    /// Media box; defaults to US Letter
    pub media_box: Option<Rect>,
    /// Optional crop box
    pub crop_box: Option<Rect>,
    /// User unit
    pub user_unit: Option<f64>,
    /// Still-encrypted marker
    pub encrypted: bool,
}

impl MemoryPageView {
    /// View over the given content with the given resources.
    pub fn new(content: impl Into<Bytes>, resources: PageResources) -> Self {
        Self {
            content: content.into(),
            resources,
            ..Self::default()
        }
    }
}

impl PageView for MemoryPageView {
    fn content_bytes(&self) -> Bytes {
        self.content.clone()
    }

    fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    fn resources(&self) -> &PageResources {
        &self.resources
    }

    fn media_box(&self) -> Rect {
        self.media_box
            .unwrap_or_else(|| Rect::new(0.0, 0.0, 612.0, 792.0))
    }

    fn crop_box(&self) -> Option<Rect> {
        self.crop_box
    }

    fn user_unit(&self) -> f64 {
        self.user_unit.unwrap_or(1.0)
    }

    fn set_content_bytes(&mut self, bytes: Bytes) {
        self.content = bytes;
    }
}

/// One page's editing surface.
///
/// Parses lazily and caches; [`Page::set_content_stream`] and redactions
/// refresh the cache from the serialized output so what the facade reports
/// always matches the bytes the view holds.
pub struct Page<'a, V: PageView> {
    view: &'a mut V,
    cache: Option<ParsedContent>,
}

impl<'a, V: PageView> Page<'a, V> {
    /// Wrap a view.
    pub fn new(view: &'a mut V) -> Self {
        Self { view, cache: None }
    }

    fn ensure_parsed(&mut self) -> Result<()> {
        if self.view.is_encrypted() {
            return Err(Error::UnsupportedEncryption);
        }
        if self.cache.is_none() {
            let bytes = self.view.content_bytes();
            self.cache = Some(parse_content_stream(&bytes));
        }
        Ok(())
    }

    /// The parsed operator sequence (cached).
    pub fn content_stream(&mut self) -> Result<&OperatorSequence> {
        self.ensure_parsed()?;
        Ok(&self.cache.as_ref().expect("cache filled").sequence)
    }

    /// Warnings from the cached parse.
    pub fn warnings(&mut self) -> Result<&[Diagnostic]> {
        self.ensure_parsed()?;
        Ok(&self.cache.as_ref().expect("cache filled").warnings)
    }

    /// Replace the content stream: serialize, hand bytes to the view, and
    /// re-cache from the written form (synthetic closers included).
    pub fn set_content_stream(&mut self, sequence: OperatorSequence) -> Result<()> {
        if self.view.is_encrypted() {
            return Err(Error::UnsupportedEncryption);
        }
        let bytes = ContentWriter::new().write(&sequence);
        self.cache = Some(parse_content_stream(&bytes));
        self.view.set_content_bytes(Bytes::from(bytes));
        Ok(())
    }

    /// Compute the page's letters.
    pub fn letters(&mut self) -> Result<Vec<Letter>> {
        Ok(self.layout()?.letters)
    }

    /// Page text: letter values concatenated in drawing order.
    pub fn text(&mut self) -> Result<String> {
        Ok(self.layout()?.text())
    }

    /// Full layout outcome, including missing-font warnings.
    pub fn layout(&mut self) -> Result<LayoutOutcome> {
        self.ensure_parsed()?;
        let parsed = self.cache.as_ref().expect("cache filled");
        Ok(TextLayout::new(self.view.resources()).letters(&parsed.sequence))
    }

    /// Begin a redaction. Collect targets on the builder, then
    /// [`RedactionBuilder::apply`] to run it and write the result back.
    pub fn redact(&mut self) -> RedactionBuilder<'_, 'a, V> {
        RedactionBuilder {
            page: self,
            redactor: Redactor::new(),
        }
    }
}

/// Builder tying a [`Redactor`] to a page.
///
/// Markers are off by default; see [`Redactor::with_markers`]. A marker
/// drawn without removal is masking, not redaction — this builder only ever
/// paints markers over content that has already been removed.
pub struct RedactionBuilder<'p, 'a, V: PageView> {
    page: &'p mut Page<'a, V>,
    redactor: Redactor,
}

impl<'p, 'a, V: PageView> RedactionBuilder<'p, 'a, V> {
    /// Target an area of the page.
    pub fn area(mut self, rect: Rect) -> Self {
        self.redactor = self.redactor.redact_area(rect);
        self
    }

    /// Target every occurrence of a substring of the page text.
    pub fn text(mut self, substring: impl Into<String>) -> Self {
        self.redactor = self.redactor.redact_text(substring);
        self
    }

    /// Target letters selected by a predicate.
    pub fn letters(mut self, predicate: impl Fn(&Letter) -> bool + 'static) -> Self {
        self.redactor = self.redactor.redact_letters(predicate);
        self
    }

    /// Target every text-showing operator.
    pub fn all_text(mut self) -> Self {
        self.redactor = self.redactor.redact_all_text();
        self
    }

    /// Target every operator of a category.
    pub fn category(mut self, category: OperatorCategory) -> Self {
        self.redactor = self.redactor.redact_category(category);
        self
    }

    /// Paint marker rectangles over redacted regions.
    pub fn with_markers(mut self, markers: bool) -> Self {
        self.redactor = self.redactor.with_markers(markers);
        self
    }

    /// Marker fill color (components clamped to 0..=1).
    pub fn marker_color(mut self, r: f64, g: f64, b: f64) -> Self {
        self.redactor = self.redactor.marker_color(r, g, b);
        self
    }

    /// Run the redaction and write the result back to the view.
    pub fn apply(self) -> Result<RedactionOutcome> {
        self.page.ensure_parsed()?;
        let sequence = self
            .page
            .cache
            .as_ref()
            .expect("cache filled")
            .sequence
            .clone();
        let outcome = self.redactor.apply(&sequence, self.page.view.resources())?;
        self.page.set_content_stream(outcome.sequence.clone())?;
        Ok(outcome)
    }
}
