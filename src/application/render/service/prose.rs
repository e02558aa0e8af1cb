use tracing::debug;

use crate::application::render::types::{Diagnostic, HeadingRecord, ProseChunk, RenderError};
use crate::domain::slug::AnchorSlugger;

use super::headings::{ScannedHeading, apply_heading_ids, scan_headings};

/// Markdown to HTML conversion for the prose between blocks, with heading
/// anchors assigned in the same pass.
pub(crate) struct ProseFormatter<'a> {
    pub(crate) options: &'a comrak::Options<'static>,
    /// Used instead of `options` for the chunk at the very start of the
    /// document, which may carry front matter.
    pub(crate) start_options: &'a comrak::Options<'static>,
    pub(crate) sanitizer: Option<&'a ammonia::Builder<'static>>,
    pub(crate) legacy_prefix: &'a str,
}

impl ProseFormatter<'_> {
    pub(crate) fn format(
        &self,
        source: &str,
        opens_document: bool,
        slugger: &mut AnchorSlugger,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<ProseChunk, RenderError> {
        let options = if opens_document {
            self.start_options
        } else {
            self.options
        };
        let rendered = comrak::markdown_to_html(source, options);
        let html = match self.sanitizer {
            Some(sanitizer) => sanitizer.clean(&rendered).to_string(),
            None => rendered,
        };

        let scanned = scan_headings(&html)?;
        let mut headings = Vec::with_capacity(scanned.len());
        let mut ids = Vec::with_capacity(scanned.len());

        for heading in scanned {
            let (slug, assigned) = self.resolve_anchor(&heading, slugger);
            match slug {
                Some(slug) => headings.push(HeadingRecord {
                    text: heading.text,
                    level: heading.level,
                    slug,
                }),
                None => diagnostics.push(Diagnostic::UnanchoredHeading {
                    level: heading.level,
                    text: heading.text,
                }),
            }
            ids.push(assigned);
        }

        let html = if ids.iter().any(Option::is_some) {
            apply_heading_ids(&html, &ids)?
        } else {
            html
        };

        debug!(
            target = "application::render::prose",
            headings = headings.len(),
            bytes = html.len(),
            "formatted prose chunk"
        );

        Ok(ProseChunk {
            source: source.trim().to_string(),
            html,
            headings,
        })
    }

    /// Returns the heading's final anchor and, when it differs from what the
    /// HTML already carries, the `id` to write.
    fn resolve_anchor(
        &self,
        heading: &ScannedHeading,
        slugger: &mut AnchorSlugger,
    ) -> (Option<String>, Option<String>) {
        match heading.existing_id.as_deref() {
            Some(existing) => match self.strip_legacy_prefix(existing) {
                Some(stripped) => {
                    slugger.reserve(stripped);
                    (Some(stripped.to_string()), Some(stripped.to_string()))
                }
                None => {
                    slugger.reserve(existing);
                    (Some(existing.to_string()), None)
                }
            },
            None => {
                let slug = slugger.anchor_for(&heading.text);
                (slug.clone(), slug)
            }
        }
    }

    fn strip_legacy_prefix<'i>(&self, id: &'i str) -> Option<&'i str> {
        if self.legacy_prefix.is_empty() {
            return None;
        }
        id.strip_prefix(self.legacy_prefix)
            .filter(|rest| !rest.is_empty())
    }
}
