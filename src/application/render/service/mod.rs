mod assemble;
mod config;
mod decode;
mod dispatch;
mod headings;
mod prose;
mod scanner;

use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use thiserror::Error;
use tracing::debug;

use crate::application::render::types::{
    Diagnostic, ProseChunk, RenderDirective, RenderError, RenderRequest, RenderService,
    RenderedDocument, Segment,
};
use crate::config::DEFAULT_LEGACY_HEADING_PREFIX;
use crate::domain::slug::{AnchorSlugger, SlugPolicy};
use crate::domain::toc::TableOfContents;

use assemble::{Positioned, assemble};
use self::config::{build_prose_sanitizer, default_options, document_start_options};
use decode::decode_block;
use dispatch::dispatch;
use prose::ProseFormatter;

pub use headings::assign_missing_heading_ids;

/// Default rendering pipeline: line scanner, typed block decoding, Comrak
/// prose formatting with Ammonia sanitisation and heading anchoring.
pub struct ComrakRenderService {
    options: comrak::Options<'static>,
    start_options: comrak::Options<'static>,
    sanitizer: ammonia::Builder<'static>,
    config: RenderPipelineConfig,
}

impl ComrakRenderService {
    fn new() -> Self {
        Self::with_config(active_render_config())
    }

    /// Build a renderer with an explicit configuration, bypassing the shared
    /// instance.
    pub fn with_config(config: RenderPipelineConfig) -> Self {
        Self {
            options: default_options(),
            start_options: document_start_options(),
            sanitizer: build_prose_sanitizer(),
            config,
        }
    }

    pub fn config(&self) -> &RenderPipelineConfig {
        &self.config
    }

    fn formatter(&self) -> ProseFormatter<'_> {
        ProseFormatter {
            options: &self.options,
            start_options: &self.start_options,
            sanitizer: self.config.sanitize.then_some(&self.sanitizer),
            legacy_prefix: &self.config.legacy_heading_prefix,
        }
    }
}

static RENDER_SERVICE: Lazy<Arc<ComrakRenderService>> =
    Lazy::new(|| Arc::new(ComrakRenderService::new()));

/// Access the shared render service instance, initialised on first use.
pub fn render_service() -> Arc<ComrakRenderService> {
    Arc::clone(&RENDER_SERVICE)
}

impl Default for ComrakRenderService {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderService for ComrakRenderService {
    fn render(&self, request: &RenderRequest) -> Result<RenderedDocument, RenderError> {
        let mut diagnostics = Vec::new();
        let segments = scanner::scan(&request.document, &mut diagnostics);
        let segment_count = segments.len();

        let (prose_sources, blocks) = block_stage(&request.document, segments, &mut diagnostics);
        let mut located: Vec<LocatedDiagnostic> = diagnostics
            .into_iter()
            .map(|diagnostic| (diagnostic.line().unwrap_or_default(), diagnostic))
            .collect();
        let prose = prose_stage(
            &self.formatter(),
            prose_sources,
            self.config.heading_slugs,
            &mut located,
        )?;
        let diagnostics = in_document_order(located);

        debug!(
            target = "application::render::service",
            segments = segment_count,
            prose = prose.len(),
            blocks = blocks.len(),
            diagnostics = diagnostics.len(),
            "rendered document"
        );

        let toc = TableOfContents::from_catalog(&request.catalog);
        Ok(assemble(prose, blocks, diagnostics, toc))
    }
}

/// Split a document into its prose and block segments without rendering.
pub fn scan_document(document: &str) -> (Vec<Segment>, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let segments = scanner::scan(document, &mut diagnostics);
    (segments, diagnostics)
}

#[derive(Debug, Clone)]
pub struct RenderPipelineConfig {
    /// Prefix stripped from author-supplied heading ids; empty disables stripping.
    pub legacy_heading_prefix: String,
    pub heading_slugs: SlugPolicy,
    pub sanitize: bool,
}

impl Default for RenderPipelineConfig {
    fn default() -> Self {
        Self {
            legacy_heading_prefix: DEFAULT_LEGACY_HEADING_PREFIX.to_string(),
            heading_slugs: SlugPolicy::default(),
            sanitize: true,
        }
    }
}

impl From<&crate::config::RenderSettings> for RenderPipelineConfig {
    fn from(settings: &crate::config::RenderSettings) -> Self {
        Self {
            legacy_heading_prefix: settings.legacy_heading_prefix.clone(),
            heading_slugs: settings.heading_slugs,
            sanitize: settings.sanitize,
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderConfigError {
    #[error("render service already configured")]
    AlreadyConfigured,
}

static RENDER_PIPELINE_CONFIG: OnceCell<RenderPipelineConfig> = OnceCell::new();

/// Set the configuration used by [`render_service`]. Must run before the
/// shared instance is first accessed.
pub fn configure_render_service(config: RenderPipelineConfig) -> Result<(), RenderConfigError> {
    RENDER_PIPELINE_CONFIG
        .set(config)
        .map_err(|_| RenderConfigError::AlreadyConfigured)
}

fn active_render_config() -> RenderPipelineConfig {
    RENDER_PIPELINE_CONFIG.get().cloned().unwrap_or_default()
}

/// Prose awaiting formatting, with the document line it starts on.
struct ProseSource {
    text: String,
    line: usize,
    opens_document: bool,
}

/// Diagnostic keyed by the document line it belongs to.
type LocatedDiagnostic = (usize, Diagnostic);
type ProseSources = Vec<Positioned<ProseSource>>;
type BlockDirectives = Vec<Positioned<RenderDirective>>;

fn block_stage(
    document: &str,
    segments: Vec<Segment>,
    diagnostics: &mut Vec<Diagnostic>,
) -> (ProseSources, BlockDirectives) {
    let mut prose = Vec::new();
    let mut blocks = Vec::new();

    for (position, segment) in segments.into_iter().enumerate() {
        match segment {
            Segment::Prose { text, span } => {
                if !text.trim().is_empty() {
                    let source = ProseSource {
                        text,
                        line: line_at(document, span.start),
                        opens_document: span.start == 0,
                    };
                    prose.push(Positioned::new(position, source));
                }
            }
            Segment::Block {
                type_name,
                body,
                line,
                ..
            } => {
                let decoded = decode_block(&type_name, &body, line, diagnostics);
                if let Some(directive) = dispatch(decoded, line, diagnostics) {
                    blocks.push(Positioned::new(position, directive));
                }
            }
        }
    }

    (prose, blocks)
}

/// Format prose in document order; one slugger spans the whole document.
fn prose_stage(
    formatter: &ProseFormatter<'_>,
    sources: ProseSources,
    policy: SlugPolicy,
    located: &mut Vec<LocatedDiagnostic>,
) -> Result<Vec<Positioned<ProseChunk>>, RenderError> {
    let mut slugger = AnchorSlugger::new(policy);
    let mut chunks = Vec::with_capacity(sources.len());

    for Positioned { position, item } in sources {
        let mut diagnostics = Vec::new();
        let chunk = formatter.format(&item.text, item.opens_document, &mut slugger, &mut diagnostics)?;
        located.extend(diagnostics.into_iter().map(|diagnostic| (item.line, diagnostic)));
        chunks.push(Positioned::new(position, chunk));
    }

    Ok(chunks)
}

/// Stable sort, so findings on the same line keep the order they were raised in.
fn in_document_order(mut located: Vec<LocatedDiagnostic>) -> Vec<Diagnostic> {
    located.sort_by_key(|(line, _)| *line);
    located.into_iter().map(|(_, diagnostic)| diagnostic).collect()
}

/// 1-based line containing byte `offset`.
fn line_at(document: &str, offset: usize) -> usize {
    document
        .get(..offset)
        .map_or(0, |head| head.matches('\n').count())
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::render::types::{Component, RenderItem};

    fn render(document: &str) -> RenderedDocument {
        ComrakRenderService::with_config(RenderPipelineConfig::default())
            .render(&RenderRequest::new(document))
            .expect("render")
    }

    #[test]
    fn blank_prose_between_blocks_is_omitted() {
        let document = ":::quote\nquote: A\nauthor: B\n:::\n\n:::cta\ntitle,description\nGo,Now\n:::\n";
        let rendered = render(document);

        assert_eq!(rendered.items.len(), 2);
        assert!(
            rendered
                .items
                .iter()
                .all(|item| matches!(item, RenderItem::Block(_)))
        );
    }

    #[test]
    fn malformed_block_is_dropped_and_reported() {
        let rendered = render("Intro\n\n:::pricing\nplan,price\n:::\n\nOutro\n");

        assert_eq!(rendered.items.len(), 2);
        assert_eq!(
            rendered.diagnostics,
            vec![Diagnostic::EmptyBlock {
                type_name: "pricing".into(),
                line: 3
            }]
        );
    }

    #[test]
    fn unterminated_block_stays_prose() {
        let rendered = render("# Title\n\n:::metrics\nlabel,value\nNPS,62\n");

        assert_eq!(rendered.items.len(), 1);
        let RenderItem::Prose(chunk) = &rendered.items[0] else {
            panic!("expected prose");
        };
        assert!(chunk.html.contains(":::metrics"));
        assert!(matches!(
            rendered.diagnostics.as_slice(),
            [Diagnostic::UnterminatedBlock { line: 3, .. }]
        ));
    }

    #[test]
    fn suffixed_slugs_span_prose_chunks() {
        let service = ComrakRenderService::with_config(RenderPipelineConfig {
            heading_slugs: SlugPolicy::Suffixed,
            ..RenderPipelineConfig::default()
        });
        let document = "## Results\n\n:::quote\nquote: Q\nauthor: A\n:::\n\n## Results\n";
        let rendered = service.render(&RenderRequest::new(document)).expect("render");

        let slugs: Vec<_> = rendered.heading_slugs().collect();
        assert_eq!(slugs, ["results", "results-2"]);
        assert!(matches!(
            &rendered.items[1],
            RenderItem::Block(RenderDirective::Single {
                component: Component::QuoteCard(_)
            })
        ));
    }

    #[test]
    fn sanitizing_can_be_disabled() {
        let service = ComrakRenderService::with_config(RenderPipelineConfig {
            sanitize: false,
            ..RenderPipelineConfig::default()
        });
        let rendered = service
            .render(&RenderRequest::new("<section data-x=\"1\">raw</section>\n"))
            .expect("render");

        let RenderItem::Prose(chunk) = &rendered.items[0] else {
            panic!("expected prose");
        };
        assert!(chunk.html.contains("data-x=\"1\""));
    }

    #[test]
    fn rule_after_block_is_not_front_matter() {
        let document = "Intro\n\n:::quote\nquote: Q\nauthor: A\n:::\n---\n## Next Steps\n\nBody text\n\n---\n\nTail\n";
        let rendered = render(document);

        assert_eq!(rendered.heading_slugs().collect::<Vec<_>>(), ["next-steps"]);
        let RenderItem::Prose(chunk) = &rendered.items[2] else {
            panic!("expected prose after the quote");
        };
        assert!(chunk.html.contains("<h2 id=\"next-steps\">Next Steps</h2>"));
        assert!(chunk.html.contains("<p>Body text</p>"));
        assert!(chunk.html.contains("<p>Tail</p>"));
    }

    #[test]
    fn leading_front_matter_is_still_hidden() {
        let rendered = render("---\ntitle: Draft\n---\n\n## Overview\n");

        let RenderItem::Prose(chunk) = &rendered.items[0] else {
            panic!("expected prose");
        };
        assert!(!chunk.html.contains("title: Draft"));
        assert_eq!(rendered.heading_slugs().collect::<Vec<_>>(), ["overview"]);
    }

    #[test]
    fn diagnostics_follow_document_order() {
        let rendered = render("## ???\n\n:::bogus\na\n1\n:::\n\n## !!!\n");

        assert_eq!(
            rendered.diagnostics,
            vec![
                Diagnostic::UnanchoredHeading {
                    level: 2,
                    text: "???".into(),
                },
                Diagnostic::UnknownBlockType {
                    type_name: "bogus".into(),
                    line: 3,
                },
                Diagnostic::UnanchoredHeading {
                    level: 2,
                    text: "!!!".into(),
                },
            ]
        );
    }
}
