use crate::application::render::types::{
    Diagnostic, ProseChunk, RenderDirective, RenderItem, RenderedDocument,
};
use crate::domain::toc::TableOfContents;

/// Output of a pipeline stage tagged with the index of the segment it came from.
#[derive(Debug, Clone)]
pub(crate) struct Positioned<T> {
    pub(crate) position: usize,
    pub(crate) item: T,
}

impl<T> Positioned<T> {
    pub(crate) fn new(position: usize, item: T) -> Self {
        Self { position, item }
    }
}

/// Merge formatted prose and block directives back into source order.
///
/// Both inputs are expected in ascending position; positions are unique
/// across the two lists because each segment is either prose or a block.
pub(crate) fn assemble(
    prose: Vec<Positioned<ProseChunk>>,
    blocks: Vec<Positioned<RenderDirective>>,
    diagnostics: Vec<Diagnostic>,
    toc: TableOfContents,
) -> RenderedDocument {
    let headings = prose
        .iter()
        .flat_map(|chunk| chunk.item.headings.iter().cloned())
        .collect();

    let mut items = Vec::with_capacity(prose.len() + blocks.len());
    let mut prose = prose.into_iter().peekable();
    let mut blocks = blocks.into_iter().peekable();

    loop {
        let take_prose = match (prose.peek(), blocks.peek()) {
            (Some(p), Some(b)) => p.position < b.position,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };

        let item = if take_prose {
            prose.next().map(|chunk| RenderItem::Prose(chunk.item))
        } else {
            blocks.next().map(|block| RenderItem::Block(block.item))
        };
        items.extend(item);
    }

    RenderedDocument {
        items,
        headings,
        diagnostics,
        toc,
    }
}
