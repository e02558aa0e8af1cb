//! Deterministic heading identifiers.
//!
//! Every anchor in a rendered document comes from [`derive_slug`]: the prose
//! formatter, the fallback heading pass and the table of contents all call it,
//! so a catalog title and an author heading with the same text always agree.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Derive the anchor slug for a piece of heading text.
///
/// The text is case-folded, every character outside `[a-z0-9 -]` is dropped,
/// whitespace runs become a single hyphen, hyphen runs collapse and the result
/// is trimmed of hyphens. The output may be empty (e.g. for `"!!!"`).
pub fn derive_slug(input: &str) -> String {
    let folded = input.to_lowercase();
    let mut slug = String::with_capacity(folded.len());
    let mut pending_hyphen = false;

    for ch in folded.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else if ch == '-' || ch == ' ' || ch.is_whitespace() {
            pending_hyphen = true;
        }
    }

    slug
}

/// How repeated headings inside one document are identified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlugPolicy {
    /// Identical text yields identical slugs; collisions are left as-is.
    #[default]
    Shared,
    /// Later duplicates receive `-2`, `-3`, … in document order.
    Suffixed,
}

/// Allocates anchor slugs for the headings of a single document.
///
/// Headings must be fed in document order so suffixes are stable between
/// renders of the same input.
#[derive(Default, Debug)]
pub struct AnchorSlugger {
    policy: SlugPolicy,
    /// Every anchor handed out or reserved so far.
    used: HashSet<String>,
    /// Last suffix tried per base slug.
    suffixes: HashMap<String, usize>,
}

impl AnchorSlugger {
    pub fn new(policy: SlugPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Slug for the next heading. Returns `None` when the text has no
    /// representable characters.
    pub fn anchor_for(&mut self, heading: &str) -> Option<String> {
        let base = derive_slug(heading);
        if base.is_empty() {
            return None;
        }

        let anchor = match self.policy {
            SlugPolicy::Suffixed if self.used.contains(&base) => {
                let next = self.suffixes.entry(base.clone()).or_insert(1);
                loop {
                    *next += 1;
                    let candidate = format!("{base}-{next}");
                    if !self.used.contains(&candidate) {
                        break candidate;
                    }
                }
            }
            _ => base,
        };

        self.used.insert(anchor.clone());
        Some(anchor)
    }

    /// Record an identifier fixed by the author so later duplicates in
    /// suffix mode do not reuse it.
    pub fn reserve(&mut self, anchor: &str) {
        self.used.insert(anchor.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_slug_strips_symbols_and_collapses_whitespace() {
        assert_eq!(derive_slug("Results & Metrics"), "results-metrics");
        assert_eq!(derive_slug("  Next   Steps  "), "next-steps");
        assert_eq!(derive_slug("Research -- Analysis"), "research-analysis");
        assert_eq!(derive_slug("Don't Panic!"), "dont-panic");
    }

    #[test]
    fn derive_slug_is_deterministic() {
        let first = derive_slug("Lessons Learned (2024)");
        let second = derive_slug("Lessons Learned (2024)");
        assert_eq!(first, second);
        assert_eq!(first, "lessons-learned-2024");
    }

    #[test]
    fn derive_slug_drops_non_ascii_letters() {
        assert_eq!(derive_slug("Café Überblick"), "caf-berblick");
        assert_eq!(derive_slug("基线对齐"), "");
        assert_eq!(derive_slug("-- --"), "");
    }

    #[test]
    fn shared_policy_keeps_collisions() {
        let mut slugger = AnchorSlugger::new(SlugPolicy::Shared);
        assert_eq!(slugger.anchor_for("Overview").as_deref(), Some("overview"));
        assert_eq!(slugger.anchor_for("Overview").as_deref(), Some("overview"));
    }

    #[test]
    fn suffixed_policy_produces_unique_slugs() {
        let mut slugger = AnchorSlugger::new(SlugPolicy::Suffixed);

        let first = slugger.anchor_for("Overview");
        let second = slugger.anchor_for("overview!");
        let third = slugger.anchor_for("Overview");

        assert_eq!(first.as_deref(), Some("overview"));
        assert_eq!(second.as_deref(), Some("overview-2"));
        assert_eq!(third.as_deref(), Some("overview-3"));
    }

    #[test]
    fn reserved_anchors_push_later_duplicates_to_suffixes() {
        let mut slugger = AnchorSlugger::new(SlugPolicy::Suffixed);
        slugger.reserve("overview");
        assert_eq!(slugger.anchor_for("Overview").as_deref(), Some("overview-2"));
    }

    #[test]
    fn suffixes_skip_anchors_already_handed_out() {
        let mut slugger = AnchorSlugger::new(SlugPolicy::Suffixed);

        let anchors: Vec<_> = ["Notes", "Notes", "Notes 2", "Notes"]
            .into_iter()
            .filter_map(|heading| slugger.anchor_for(heading))
            .collect();

        assert_eq!(anchors, ["notes", "notes-2", "notes-2-2", "notes-3"]);
    }

    #[test]
    fn reserved_suffix_form_is_skipped() {
        let mut slugger = AnchorSlugger::new(SlugPolicy::Suffixed);
        slugger.reserve("overview-2");
        assert_eq!(slugger.anchor_for("Overview").as_deref(), Some("overview"));
        assert_eq!(slugger.anchor_for("Overview").as_deref(), Some("overview-3"));
    }

    #[test]
    fn unrepresentable_heading_has_no_anchor() {
        let mut slugger = AnchorSlugger::default();
        assert_eq!(slugger.anchor_for("¿?"), None);
    }
}
