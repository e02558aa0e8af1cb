//! Maps decoded blocks onto the components that display them.

use crate::application::render::types::{
    CollectionKind, Component, Diagnostic, RenderDirective,
};
use crate::domain::blocks::DecodedBlock;

/// Directive for a decoded block. Returns `None` for blocks that carried no
/// usable data; those are dropped from the render sequence.
pub(crate) fn dispatch(
    block: DecodedBlock,
    line: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<RenderDirective> {
    let directive = match block {
        DecodedBlock::Pricing(tiers) => single(Component::PricingTable(tiers)),
        DecodedBlock::TechStack(items) => single(Component::TechStackGrid(items)),
        DecodedBlock::Marketing(channels) => single(Component::MarketingTable(channels)),
        DecodedBlock::Timeline(phases) => single(Component::Timeline(phases)),
        DecodedBlock::Quote(quote) => single(Component::QuoteCard(quote)),
        DecodedBlock::Cta(cta) => single(Component::CallToAction(cta)),
        DecodedBlock::Comparison(rows) => collection(
            CollectionKind::Comparison,
            rows.into_iter().map(Component::ComparisonCard),
        ),
        DecodedBlock::Metrics(metrics) => collection(
            CollectionKind::Metrics,
            metrics.into_iter().map(Component::MetricCard),
        ),
        DecodedBlock::Gallery(images) => collection(
            CollectionKind::Gallery,
            images.into_iter().map(Component::GalleryImage),
        ),
        DecodedBlock::Unknown { name, table } => {
            diagnostics.push(Diagnostic::UnknownBlockType {
                type_name: name.clone(),
                line,
            });
            RenderDirective::Diagnostic {
                type_name: name,
                headers: table.headers,
                rows: table.rows,
            }
        }
        DecodedBlock::Malformed { .. } => return None,
    };

    Some(directive)
}

fn single(component: Component) -> RenderDirective {
    RenderDirective::Single { component }
}

fn collection(kind: CollectionKind, items: impl Iterator<Item = Component>) -> RenderDirective {
    RenderDirective::Collection {
        kind,
        items: items.collect(),
    }
}
