//! The canonical outline shared by every case-study document.
//!
//! The table of contents is built from this catalog, not from the headings an
//! author happened to write.

use serde::Serialize;

use super::slug::derive_slug;

pub const CATALOG_HEADING_LEVEL: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogSection {
    pub title: &'static str,
    pub level: u8,
}

impl CatalogSection {
    pub fn anchor(&self) -> String {
        derive_slug(self.title)
    }
}

const CASE_STUDY_SECTIONS: [CatalogSection; 7] = [
    section("Problem Statement"),
    section("Research & Analysis"),
    section("Solution Design"),
    section("Implementation"),
    section("Results & Metrics"),
    section("Lessons Learned"),
    section("Next Steps"),
];

const fn section(title: &'static str) -> CatalogSection {
    CatalogSection {
        title,
        level: CATALOG_HEADING_LEVEL,
    }
}

/// Ordered list of section titles defining a document type's outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionCatalog {
    sections: &'static [CatalogSection],
}

impl SectionCatalog {
    pub const fn case_study() -> Self {
        Self {
            sections: &CASE_STUDY_SECTIONS,
        }
    }

    pub fn sections(&self) -> &'static [CatalogSection] {
        self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl Default for SectionCatalog {
    fn default() -> Self {
        Self::case_study()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_study_catalog_has_seven_sections_in_order() {
        let catalog = SectionCatalog::case_study();
        let titles: Vec<_> = catalog.sections().iter().map(|s| s.title).collect();

        assert_eq!(
            titles,
            [
                "Problem Statement",
                "Research & Analysis",
                "Solution Design",
                "Implementation",
                "Results & Metrics",
                "Lessons Learned",
                "Next Steps",
            ]
        );
        assert!(catalog.sections().iter().all(|s| s.level == 2));
    }

    #[test]
    fn catalog_anchors_are_unique() {
        let catalog = SectionCatalog::case_study();
        let mut anchors: Vec<_> = catalog.sections().iter().map(|s| s.anchor()).collect();
        anchors.sort();
        anchors.dedup();
        assert_eq!(anchors.len(), catalog.len());
    }
}
