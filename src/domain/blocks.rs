//! Typed payloads carried by fenced `:::type` blocks.

use std::fmt;

use serde::Serialize;

/// Closed set of block types the renderer understands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Pricing,
    TechStack,
    Marketing,
    Comparison,
    Metrics,
    Quote,
    Timeline,
    Gallery,
    Cta,
    Unknown(String),
}

impl BlockType {
    /// Resolve a declared type name. Matching ignores ASCII case and
    /// surrounding whitespace; `kpis` is an alias for `metrics`.
    pub fn from_name(name: &str) -> Self {
        let normalized = name.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pricing" => Self::Pricing,
            "techstack" => Self::TechStack,
            "marketing" => Self::Marketing,
            "comparison" => Self::Comparison,
            "metrics" | "kpis" => Self::Metrics,
            "quote" => Self::Quote,
            "timeline" => Self::Timeline,
            "gallery" => Self::Gallery,
            "cta" => Self::Cta,
            _ => Self::Unknown(name.trim().to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Pricing => "pricing",
            Self::TechStack => "techstack",
            Self::Marketing => "marketing",
            Self::Comparison => "comparison",
            Self::Metrics => "metrics",
            Self::Quote => "quote",
            Self::Timeline => "timeline",
            Self::Gallery => "gallery",
            Self::Cta => "cta",
            Self::Unknown(name) => name.as_str(),
        }
    }

    /// Whether the body starts with a header row that carries no data.
    pub fn has_header_row(&self) -> bool {
        !matches!(self, Self::Quote | Self::Timeline)
    }

    /// Fewest comma-separated cells a row needs to be usable.
    pub fn min_fields(&self) -> usize {
        match self {
            Self::Comparison | Self::Timeline => 3,
            Self::Pricing | Self::TechStack | Self::Marketing | Self::Metrics => 2,
            Self::Gallery | Self::Cta | Self::Quote | Self::Unknown(_) => 1,
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Header and rows of a block decoded with the default grammar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tabular {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricingTier {
    pub plan: String,
    pub price: String,
    pub features: Vec<String>,
    pub target_market: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TechStackItem {
    pub category: String,
    pub technologies: Vec<String>,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketingChannel {
    pub channel: String,
    pub strategy: String,
    pub result: String,
}

/// Which side a comparison row favours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Ours,
    Competitor,
    Tie,
    Other(String),
}

impl Winner {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" | "tie" | "draw" | "equal" => Self::Tie,
            "us" | "ours" | "our" | "client" | "we" => Self::Ours,
            "competitor" | "competition" | "them" | "theirs" => Self::Competitor,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Ours => "ours",
            Self::Competitor => "competitor",
            Self::Tie => "tie",
            Self::Other(label) => label.as_str(),
        }
    }

    /// Fixed class-safe name; free-text winners all share `other`.
    pub fn modifier(&self) -> &'static str {
        match self {
            Self::Ours => "ours",
            Self::Competitor => "competitor",
            Self::Tie => "tie",
            Self::Other(_) => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonRow {
    pub category: String,
    pub value: String,
    pub competitor_value: String,
    pub winner: Winner,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
    pub change: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub quote: String,
    pub author: String,
    pub role: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelinePhase {
    pub phase: String,
    pub title: String,
    pub duration: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryImage {
    pub src: String,
    pub alt: String,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallToAction {
    pub title: String,
    pub description: String,
    pub button_label: String,
    pub button_href: String,
}

/// Structured result of decoding one block body. Decoding never fails: bodies
/// without usable rows become [`DecodedBlock::Malformed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DecodedBlock {
    Pricing(Vec<PricingTier>),
    TechStack(Vec<TechStackItem>),
    Marketing(Vec<MarketingChannel>),
    Comparison(Vec<ComparisonRow>),
    Metrics(Vec<Metric>),
    Quote(Quote),
    Timeline(Vec<TimelinePhase>),
    Gallery(Vec<GalleryImage>),
    Cta(CallToAction),
    Unknown { name: String, table: Tabular },
    Malformed { type_name: String, raw_body: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_type_names_are_case_insensitive() {
        assert_eq!(BlockType::from_name("Pricing"), BlockType::Pricing);
        assert_eq!(BlockType::from_name(" TECHSTACK "), BlockType::TechStack);
        assert_eq!(BlockType::from_name("kpis"), BlockType::Metrics);
        assert_eq!(
            BlockType::from_name("bogus"),
            BlockType::Unknown("bogus".into())
        );
    }

    #[test]
    fn only_quote_and_timeline_skip_headers() {
        assert!(!BlockType::Quote.has_header_row());
        assert!(!BlockType::Timeline.has_header_row());
        assert!(BlockType::Gallery.has_header_row());
        assert!(BlockType::Unknown("x".into()).has_header_row());
    }

    #[test]
    fn winner_parsing_is_lenient() {
        assert_eq!(Winner::parse(" Us "), Winner::Ours);
        assert_eq!(Winner::parse("Competitor"), Winner::Competitor);
        assert_eq!(Winner::parse(""), Winner::Tie);
        assert_eq!(Winner::parse("Both"), Winner::Other("Both".into()));
    }

    #[test]
    fn free_text_winner_uses_fixed_modifier() {
        let winner = Winner::parse("Both vendors");
        assert_eq!(winner.label(), "Both vendors");
        assert_eq!(winner.modifier(), "other");
        assert_eq!(Winner::Ours.modifier(), Winner::Ours.label());
    }

    #[test]
    fn block_type_displays_its_name() {
        assert_eq!(BlockType::from_name("KPIS").to_string(), "metrics");
        assert_eq!(BlockType::from_name(" bogus ").to_string(), "bogus");
    }
}
