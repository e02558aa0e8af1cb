//! Case-study rendering pipeline.
//!
//! The pipeline is pure: it accepts one markdown document, splits it into
//! prose and fenced `:::type` blocks, decodes and dispatches the blocks,
//! formats the prose and reassembles everything in source order. Content
//! problems surface as [`Diagnostic`]s on the result, never as errors.

mod service;
mod types;

pub use service::{
    ComrakRenderService, RenderConfigError, RenderPipelineConfig, assign_missing_heading_ids,
    configure_render_service, render_service, scan_document,
};
pub use types::{
    CollectionKind, Component, Diagnostic, HeadingRecord, ProseChunk, RenderDirective,
    RenderError, RenderItem, RenderRequest, RenderService, RenderedDocument, Segment,
};
