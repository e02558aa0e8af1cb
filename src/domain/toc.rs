//! Table of contents built from the section catalog, with scroll tracking.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use thiserror::Error;

use super::sections::SectionCatalog;

/// Default distance (in pixels) below the viewport top at which a section
/// counts as reached.
pub const DEFAULT_SCROLL_OFFSET: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub id: String,
    pub title: String,
    pub level: u8,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TocError {
    #[error("`{id}` is not a table of contents entry")]
    UnknownSection { id: String },
    #[error("no anchor `{id}` in the current layout")]
    MissingAnchor { id: String },
}

/// Source of anchor positions, typically the laid-out page.
pub trait AnchorLayout {
    /// Top offset of the element carrying `id`, measured from the document top.
    fn offset_top(&self, id: &str) -> Option<f64>;
}

impl AnchorLayout for HashMap<String, f64> {
    fn offset_top(&self, id: &str) -> Option<f64> {
        self.get(id).copied()
    }
}

impl AnchorLayout for BTreeMap<String, f64> {
    fn offset_top(&self, id: &str) -> Option<f64> {
        self.get(id).copied()
    }
}

/// Ordered TOC entries derived from a [`SectionCatalog`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableOfContents {
    entries: Vec<TocEntry>,
}

impl TableOfContents {
    pub fn from_catalog(catalog: &SectionCatalog) -> Self {
        let entries = catalog
            .sections()
            .iter()
            .map(|section| TocEntry {
                id: section.anchor(),
                title: section.title.to_string(),
                level: section.level,
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    /// Entries whose anchor does not appear among the given heading slugs.
    pub fn unresolved<'a, I>(&self, slugs: I) -> Vec<&TocEntry>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let present: Vec<&str> = slugs.into_iter().collect();
        self.entries
            .iter()
            .filter(|entry| !present.contains(&entry.id.as_str()))
            .collect()
    }
}

/// Where the viewport should move for a jump request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrollTarget {
    pub id: String,
    pub top: f64,
}

/// Tracks the active TOC entry for a mounted document view.
#[derive(Debug, Clone)]
pub struct TocSynchronizer {
    toc: TableOfContents,
    scroll_offset: f64,
    active_id: Option<String>,
    mounted: bool,
}

impl TocSynchronizer {
    /// Mount a synchronizer; scroll events are processed until [`Self::unmount`].
    pub fn mount(toc: TableOfContents, scroll_offset: f64) -> Self {
        Self {
            toc,
            scroll_offset,
            active_id: None,
            mounted: true,
        }
    }

    pub fn entries(&self) -> &[TocEntry] {
        self.toc.entries()
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Update the active entry for a scroll position.
    ///
    /// Entries are walked from last to first; the first one whose anchor top
    /// is at or above `scroll_y + offset` wins. When none qualifies the active
    /// entry is left untouched. Returns the active id after the update.
    pub fn on_scroll<L: AnchorLayout + ?Sized>(&mut self, scroll_y: f64, layout: &L) -> Option<&str> {
        if !self.mounted {
            return None;
        }

        let cursor = scroll_y + self.scroll_offset;
        let reached = self.toc.entries().iter().rev().find(|entry| {
            layout
                .offset_top(&entry.id)
                .is_some_and(|top| top <= cursor)
        });

        if let Some(entry) = reached {
            self.active_id = Some(entry.id.clone());
        }

        self.active_id.as_deref()
    }

    /// Resolve the scroll target for a TOC entry.
    pub fn jump_to<L: AnchorLayout + ?Sized>(
        &self,
        id: &str,
        layout: &L,
    ) -> Result<ScrollTarget, TocError> {
        if !self.toc.contains(id) {
            return Err(TocError::UnknownSection { id: id.to_string() });
        }

        let top = layout
            .offset_top(id)
            .ok_or_else(|| TocError::MissingAnchor { id: id.to_string() })?;

        Ok(ScrollTarget {
            id: id.to_string(),
            top,
        })
    }

    /// Detach from scroll events and clear the active entry.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.active_id = None;
    }
}
