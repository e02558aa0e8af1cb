use std::{fmt, ops::Range};

use serde::Serialize;
use thiserror::Error;

use crate::domain::{
    blocks::{
        CallToAction, ComparisonRow, GalleryImage, MarketingChannel, Metric, PricingTier, Quote,
        TechStackItem, TimelinePhase,
    },
    sections::SectionCatalog,
    toc::TableOfContents,
};

/// Rendering request passed into the pipeline.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Raw case-study markdown as delivered by the content source.
    pub document: String,
    /// Outline the table of contents is built from.
    pub catalog: SectionCatalog,
}

impl RenderRequest {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            catalog: SectionCatalog::case_study(),
        }
    }
}

/// One span of the source document, in original order.
///
/// Spans are byte ranges into the source. A block span covers its opening
/// and closing delimiter lines; `body_span` covers only the lines between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    Prose {
        text: String,
        span: Range<usize>,
    },
    Block {
        type_name: String,
        body: String,
        span: Range<usize>,
        body_span: Range<usize>,
        /// 1-based line of the opening delimiter.
        line: usize,
    },
}

impl Segment {
    pub fn span(&self) -> &Range<usize> {
        match self {
            Segment::Prose { span, .. } | Segment::Block { span, .. } => span,
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Segment::Block { .. })
    }
}

/// A heading found while formatting prose, with the anchor it received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingRecord {
    pub text: String,
    pub level: u8,
    pub slug: String,
}

/// Formatted prose between blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProseChunk {
    /// Trimmed markdown the chunk was rendered from.
    pub source: String,
    pub html: String,
    pub headings: Vec<HeadingRecord>,
}

/// Visual component a directive asks the caller to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "component", content = "props", rename_all = "snake_case")]
pub enum Component {
    PricingTable(Vec<PricingTier>),
    TechStackGrid(Vec<TechStackItem>),
    MarketingTable(Vec<MarketingChannel>),
    Timeline(Vec<TimelinePhase>),
    ComparisonCard(ComparisonRow),
    MetricCard(Metric),
    GalleryImage(GalleryImage),
    QuoteCard(Quote),
    CallToAction(CallToAction),
}

/// Which per-row component a collection directive repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Comparison,
    Metrics,
    Gallery,
}

impl CollectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Comparison => "comparison",
            CollectionKind::Metrics => "metrics",
            CollectionKind::Gallery => "gallery",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "directive", rename_all = "snake_case")]
pub enum RenderDirective {
    Single {
        component: Component,
    },
    Collection {
        kind: CollectionKind,
        items: Vec<Component>,
    },
    /// Placeholder for a block whose type has no registered component.
    Diagnostic {
        type_name: String,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RenderItem {
    Prose(ProseChunk),
    Block(RenderDirective),
}

/// Non-fatal findings collected while rendering a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Opening delimiter with no closing `:::`; the rest of the document stays prose.
    UnterminatedBlock { type_name: String, line: usize },
    /// `:::type` line inside a block body, kept as body text.
    NestedOpening { type_name: String, line: usize },
    /// Block without a registered component.
    UnknownBlockType { type_name: String, line: usize },
    /// Block body with no usable rows; the block is dropped.
    EmptyBlock { type_name: String, line: usize },
    /// Row that could not be mapped onto the block's fields.
    SkippedRow {
        type_name: String,
        line: usize,
        reason: String,
    },
    /// Single-row block carrying additional rows that were ignored.
    ExtraRows {
        type_name: String,
        line: usize,
        ignored: usize,
    },
    /// Heading whose text produced no identifier.
    UnanchoredHeading { level: u8, text: String },
}

impl Diagnostic {
    /// Document line the finding points at; heading findings carry none.
    pub fn line(&self) -> Option<usize> {
        match self {
            Diagnostic::UnterminatedBlock { line, .. }
            | Diagnostic::NestedOpening { line, .. }
            | Diagnostic::UnknownBlockType { line, .. }
            | Diagnostic::EmptyBlock { line, .. }
            | Diagnostic::SkippedRow { line, .. }
            | Diagnostic::ExtraRows { line, .. } => Some(*line),
            Diagnostic::UnanchoredHeading { .. } => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnterminatedBlock { type_name, line } => {
                write!(f, "line {line}: `:::{type_name}` is never closed")
            }
            Diagnostic::NestedOpening { type_name, line } => write!(
                f,
                "line {line}: nested `:::{type_name}` treated as block content"
            ),
            Diagnostic::UnknownBlockType { type_name, line } => {
                write!(f, "line {line}: no renderer for block type `{type_name}`")
            }
            Diagnostic::EmptyBlock { type_name, line } => {
                write!(f, "line {line}: `{type_name}` block has no usable rows")
            }
            Diagnostic::SkippedRow {
                type_name,
                line,
                reason,
            } => write!(f, "line {line}: skipped `{type_name}` row: {reason}"),
            Diagnostic::ExtraRows {
                type_name,
                line,
                ignored,
            } => write!(
                f,
                "line {line}: `{type_name}` uses one row, ignored {ignored} more"
            ),
            Diagnostic::UnanchoredHeading { level, text } => {
                write!(f, "h{level} `{text}` has no representable anchor")
            }
        }
    }
}

/// Final ordered render sequence for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedDocument {
    pub items: Vec<RenderItem>,
    /// Every heading anchored across all prose chunks, in document order.
    pub headings: Vec<HeadingRecord>,
    pub diagnostics: Vec<Diagnostic>,
    pub toc: TableOfContents,
}

impl RenderedDocument {
    pub fn heading_slugs(&self) -> impl Iterator<Item = &str> {
        self.headings.iter().map(|heading| heading.slug.as_str())
    }
}

/// Failures of the rendering machinery itself. Content problems never end up
/// here; they are reported as [`Diagnostic`]s.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("document processing failed: {message}")]
    Document { message: String },
    #[error("template rendering failed: {message}")]
    Template { message: String },
}

impl RenderError {
    pub fn document(message: impl Into<String>) -> Self {
        Self::Document {
            message: message.into(),
        }
    }
}

/// Trait exposed by the rendering pipeline. Implementations must be pure and
/// deterministic: given the same input, they return identical outputs or errors.
pub trait RenderService: Send + Sync {
    fn render(&self, request: &RenderRequest) -> Result<RenderedDocument, RenderError>;
}
