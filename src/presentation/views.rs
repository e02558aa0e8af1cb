use askama::{Error as AskamaError, Template};
use thiserror::Error;
use tracing::debug;

use crate::application::render::{
    Component, RenderDirective, RenderError, RenderItem, RenderedDocument,
    assign_missing_heading_ids,
};
use crate::domain::blocks::{
    CallToAction, ComparisonRow, GalleryImage, MarketingChannel, Metric, PricingTier, Quote,
    TechStackItem, TimelinePhase,
};

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for RenderError {
    fn from(err: TemplateRenderError) -> Self {
        RenderError::Template {
            message: format!("{} ({}): {}", err.public_message, err.source, err.error),
        }
    }
}

pub fn render_template<T: Template>(template: &T) -> Result<String, TemplateRenderError> {
    template.render().map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
    })
}

#[derive(Debug, Clone)]
pub struct TocLinkView {
    pub id: String,
    pub title: String,
    /// Whether an author heading in the document carries this anchor.
    pub resolved: bool,
}

#[derive(Template)]
#[template(path = "article.html")]
struct ArticleTemplate {
    toc: Vec<TocLinkView>,
    fragments: Vec<String>,
}

#[derive(Template)]
#[template(path = "blocks/pricing_table.html")]
struct PricingTableTemplate<'a> {
    tiers: &'a [PricingTier],
}

#[derive(Template)]
#[template(path = "blocks/tech_stack_grid.html")]
struct TechStackGridTemplate<'a> {
    items: &'a [TechStackItem],
}

#[derive(Template)]
#[template(path = "blocks/marketing_table.html")]
struct MarketingTableTemplate<'a> {
    channels: &'a [MarketingChannel],
}

#[derive(Template)]
#[template(path = "blocks/timeline.html")]
struct TimelineTemplate<'a> {
    phases: &'a [TimelinePhase],
}

#[derive(Template)]
#[template(path = "blocks/comparison_card.html")]
struct ComparisonCardTemplate<'a> {
    row: &'a ComparisonRow,
}

#[derive(Template)]
#[template(path = "blocks/metric_card.html")]
struct MetricCardTemplate<'a> {
    metric: &'a Metric,
}

#[derive(Template)]
#[template(path = "blocks/gallery_image.html")]
struct GalleryImageTemplate<'a> {
    image: &'a GalleryImage,
}

#[derive(Template)]
#[template(path = "blocks/quote_card.html")]
struct QuoteCardTemplate<'a> {
    quote: &'a Quote,
}

#[derive(Template)]
#[template(path = "blocks/call_to_action.html")]
struct CallToActionTemplate<'a> {
    cta: &'a CallToAction,
    href: &'a str,
}

#[derive(Template)]
#[template(path = "blocks/collection.html")]
struct CollectionTemplate<'a> {
    kind: &'a str,
    items: Vec<String>,
}

#[derive(Template)]
#[template(path = "blocks/diagnostic.html")]
struct DiagnosticTemplate<'a> {
    type_name: &'a str,
    headers: &'a [String],
    rows: &'a [Vec<String>],
}

/// Render a whole document as an `<article>` with its table of contents.
///
/// Headings produced by block templates receive identifiers through the
/// fallback pass; anchors already assigned during prose formatting are kept.
pub fn render_article(document: &RenderedDocument) -> Result<String, RenderError> {
    let fragments = document
        .items
        .iter()
        .map(|item| match item {
            RenderItem::Prose(chunk) => Ok(chunk.html.clone()),
            RenderItem::Block(directive) => render_directive(directive),
        })
        .collect::<Result<Vec<_>, RenderError>>()?;

    let slugs: Vec<&str> = document.heading_slugs().collect();
    let toc = document
        .toc
        .entries()
        .iter()
        .map(|entry| TocLinkView {
            id: entry.id.clone(),
            title: entry.title.clone(),
            resolved: slugs.contains(&entry.id.as_str()),
        })
        .collect();

    let html = render_template(&ArticleTemplate { toc, fragments })?;
    let html = assign_missing_heading_ids(&html)?;

    debug!(
        target = "presentation::views",
        bytes = html.len(),
        "rendered article"
    );

    Ok(html)
}

/// Render one block directive to an HTML fragment.
pub fn render_directive(directive: &RenderDirective) -> Result<String, RenderError> {
    let html = match directive {
        RenderDirective::Single { component } => render_component(component)?,
        RenderDirective::Collection { kind, items } => {
            let items = items
                .iter()
                .map(render_component)
                .collect::<Result<Vec<_>, _>>()?;
            render_template(&CollectionTemplate {
                kind: kind.as_str(),
                items,
            })?
        }
        RenderDirective::Diagnostic {
            type_name,
            headers,
            rows,
        } => render_template(&DiagnosticTemplate {
            type_name,
            headers,
            rows,
        })?,
    };
    Ok(html)
}

fn render_component(component: &Component) -> Result<String, RenderError> {
    let html = match component {
        Component::PricingTable(tiers) => render_template(&PricingTableTemplate { tiers })?,
        Component::TechStackGrid(items) => render_template(&TechStackGridTemplate { items })?,
        Component::MarketingTable(channels) => {
            render_template(&MarketingTableTemplate { channels })?
        }
        Component::Timeline(phases) => render_template(&TimelineTemplate { phases })?,
        Component::ComparisonCard(row) => render_template(&ComparisonCardTemplate { row })?,
        Component::MetricCard(metric) => render_template(&MetricCardTemplate { metric })?,
        Component::GalleryImage(image) => render_template(&GalleryImageTemplate { image })?,
        Component::QuoteCard(quote) => render_template(&QuoteCardTemplate { quote })?,
        Component::CallToAction(cta) => render_template(&CallToActionTemplate {
            cta,
            href: safe_href(&cta.button_href),
        })?,
    };
    Ok(html)
}

/// Only relative, fragment, `http(s)` and `mailto` targets are linked.
fn safe_href(raw: &str) -> &str {
    let trimmed = raw.trim();
    let lowered = trimmed.to_ascii_lowercase();
    let allowed = trimmed.starts_with('/')
        || trimmed.starts_with('#')
        || lowered.starts_with("https://")
        || lowered.starts_with("http://")
        || lowered.starts_with("mailto:");
    if allowed { trimmed } else { "#" }
}
