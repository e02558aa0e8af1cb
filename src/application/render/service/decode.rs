//! Per-type decoding of fenced block bodies.

use std::collections::HashMap;

use crate::application::render::types::Diagnostic;
use crate::domain::blocks::{
    BlockType, CallToAction, ComparisonRow, DecodedBlock, GalleryImage, MarketingChannel, Metric,
    PricingTier, Quote, Tabular, TechStackItem, TimelinePhase, Winner,
};

const LIST_SEPARATOR: char = ';';

/// A non-blank body line with its 1-based document line number.
struct BodyLine<'a> {
    line: usize,
    text: &'a str,
}

/// Decode a block body according to its declared type.
///
/// `line` is the document line of the opening delimiter. Never fails: a body
/// with no usable rows becomes [`DecodedBlock::Malformed`] and is reported.
pub(crate) fn decode_block(
    type_name: &str,
    body: &str,
    line: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> DecodedBlock {
    let block_type = BlockType::from_name(type_name);
    let lines: Vec<BodyLine<'_>> = body
        .lines()
        .enumerate()
        .map(|(index, text)| BodyLine {
            line: line + 1 + index,
            text: text.trim(),
        })
        .filter(|body_line| !body_line.text.is_empty())
        .collect();

    let mut decoder = RowDecoder {
        block_type: &block_type,
        diagnostics,
    };

    let rows = if block_type.has_header_row() {
        skip_header(&lines)
    } else {
        &lines[..]
    };

    let decoded = match &block_type {
        BlockType::Unknown(name) => Some(DecodedBlock::Unknown {
            name: name.clone(),
            table: decode_tabular(&lines),
        }),
        BlockType::Quote => decoder.quote(rows).map(DecodedBlock::Quote),
        BlockType::Timeline => {
            non_empty(decoder.rows(rows, 4, timeline_phase)).map(DecodedBlock::Timeline)
        }
        BlockType::Pricing => {
            non_empty(decoder.rows(rows, 4, pricing_tier)).map(DecodedBlock::Pricing)
        }
        BlockType::TechStack => {
            non_empty(decoder.rows(rows, 3, tech_stack_item)).map(DecodedBlock::TechStack)
        }
        BlockType::Marketing => {
            non_empty(decoder.rows(rows, 3, marketing_channel)).map(DecodedBlock::Marketing)
        }
        BlockType::Comparison => {
            non_empty(decoder.rows(rows, 4, comparison_row)).map(DecodedBlock::Comparison)
        }
        BlockType::Metrics => non_empty(decoder.rows(rows, 4, metric)).map(DecodedBlock::Metrics),
        BlockType::Gallery => {
            non_empty(decoder.rows(rows, 3, gallery_image)).map(DecodedBlock::Gallery)
        }
        BlockType::Cta => decoder.call_to_action(rows, line),
    };

    match decoded {
        Some(block) => block,
        None => {
            decoder.diagnostics.push(Diagnostic::EmptyBlock {
                type_name: type_name.to_string(),
                line,
            });
            DecodedBlock::Malformed {
                type_name: type_name.to_string(),
                raw_body: body.to_string(),
            }
        }
    }
}

fn non_empty<T>(rows: Vec<T>) -> Option<Vec<T>> {
    (!rows.is_empty()).then_some(rows)
}

fn skip_header<'l, 'a>(lines: &'l [BodyLine<'a>]) -> &'l [BodyLine<'a>] {
    lines.get(1..).unwrap_or_default()
}

fn split_cells(text: &str) -> Vec<String> {
    text.split(',').map(|cell| cell.trim().to_string()).collect()
}

/// Default grammar: the first line names the columns, the rest are rows.
fn decode_tabular(lines: &[BodyLine<'_>]) -> Tabular {
    let Some((header, rows)) = lines.split_first() else {
        return Tabular::default();
    };
    Tabular {
        headers: split_cells(header.text),
        rows: rows.iter().map(|row| split_cells(row.text)).collect(),
    }
}

/// Positional fields of one row; the last field keeps any further commas.
struct Fields {
    cells: Vec<String>,
}

impl Fields {
    fn parse(text: &str, max_fields: usize) -> Self {
        Self {
            cells: text
                .splitn(max_fields, ',')
                .map(|cell| cell.trim().to_string())
                .collect(),
        }
    }

    fn len(&self) -> usize {
        self.cells.len()
    }

    fn take(&mut self, index: usize) -> String {
        self.cells
            .get_mut(index)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    fn list(&mut self, index: usize) -> Vec<String> {
        self.take(index)
            .split(LIST_SEPARATOR)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }
}

struct RowDecoder<'d> {
    block_type: &'d BlockType,
    diagnostics: &'d mut Vec<Diagnostic>,
}

impl RowDecoder<'_> {
    fn rows<T>(
        &mut self,
        lines: &[BodyLine<'_>],
        max_fields: usize,
        build: fn(&mut Fields) -> T,
    ) -> Vec<T> {
        let min_fields = self.block_type.min_fields();
        lines
            .iter()
            .filter_map(|body_line| {
                let mut fields = Fields::parse(body_line.text, max_fields);
                if fields.len() < min_fields {
                    self.skip(
                        body_line.line,
                        format!("expected at least {min_fields} fields, found {}", fields.len()),
                    );
                    return None;
                }
                Some(build(&mut fields))
            })
            .collect()
    }

    fn quote(&mut self, lines: &[BodyLine<'_>]) -> Option<Quote> {
        let mut values: HashMap<String, String> = HashMap::new();
        for body_line in lines {
            match body_line.text.split_once(':') {
                Some((key, value)) => {
                    values.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
                }
                None => self.skip(body_line.line, "expected `key: value`".to_string()),
            }
        }

        let mut take = |key: &str| values.remove(key).filter(|value| !value.is_empty());
        let quote = take("quote")?;
        let author = take("author")?;
        Some(Quote {
            quote,
            author,
            role: take("role"),
            company: take("company"),
        })
    }

    fn call_to_action(&mut self, lines: &[BodyLine<'_>], line: usize) -> Option<DecodedBlock> {
        let mut rows = self.rows(lines, 4, call_to_action).into_iter();
        let first = rows.next()?;
        let ignored = rows.count();
        if ignored > 0 {
            self.diagnostics.push(Diagnostic::ExtraRows {
                type_name: self.block_type.to_string(),
                line,
                ignored,
            });
        }
        Some(DecodedBlock::Cta(first))
    }

    fn skip(&mut self, line: usize, reason: String) {
        self.diagnostics.push(Diagnostic::SkippedRow {
            type_name: self.block_type.to_string(),
            line,
            reason,
        });
    }
}

fn timeline_phase(fields: &mut Fields) -> TimelinePhase {
    TimelinePhase {
        phase: fields.take(0),
        title: fields.take(1),
        duration: fields.take(2),
        description: fields.take(3),
    }
}

fn pricing_tier(fields: &mut Fields) -> PricingTier {
    PricingTier {
        plan: fields.take(0),
        price: fields.take(1),
        features: fields.list(2),
        target_market: fields.take(3),
    }
}

fn tech_stack_item(fields: &mut Fields) -> TechStackItem {
    TechStackItem {
        category: fields.take(0),
        technologies: fields.list(1),
        rationale: fields.take(2),
    }
}

fn marketing_channel(fields: &mut Fields) -> MarketingChannel {
    MarketingChannel {
        channel: fields.take(0),
        strategy: fields.take(1),
        result: fields.take(2),
    }
}

fn comparison_row(fields: &mut Fields) -> ComparisonRow {
    ComparisonRow {
        category: fields.take(0),
        value: fields.take(1),
        competitor_value: fields.take(2),
        winner: Winner::parse(&fields.take(3)),
    }
}

fn metric(fields: &mut Fields) -> Metric {
    Metric {
        label: fields.take(0),
        value: fields.take(1),
        change: fields.take(2),
        description: fields.take(3),
    }
}

fn gallery_image(fields: &mut Fields) -> GalleryImage {
    GalleryImage {
        src: fields.take(0),
        alt: fields.take(1),
        caption: fields.take(2),
    }
}

fn call_to_action(fields: &mut Fields) -> CallToAction {
    CallToAction {
        title: fields.take(0),
        description: fields.take(1),
        button_label: fields.take(2),
        button_href: fields.take(3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(type_name: &str, body: &str) -> (DecodedBlock, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let decoded = decode_block(type_name, body, 1, &mut diagnostics);
        (decoded, diagnostics)
    }

    #[test]
    fn quote_collects_key_value_pairs() {
        let (decoded, diagnostics) = decode(
            "quote",
            "quote: Great tool: really\nauthor: Jane\nrole: CTO\ncompany:\n",
        );
        assert!(diagnostics.is_empty());
        assert_eq!(
            decoded,
            DecodedBlock::Quote(Quote {
                quote: "Great tool: really".into(),
                author: "Jane".into(),
                role: Some("CTO".into()),
                company: None,
            })
        );
    }

    #[test]
    fn quote_without_author_is_malformed() {
        let (decoded, diagnostics) = decode("quote", "quote: Orphaned\n");
        assert!(matches!(decoded, DecodedBlock::Malformed { .. }));
        assert_eq!(
            diagnostics,
            vec![Diagnostic::EmptyBlock {
                type_name: "quote".into(),
                line: 1
            }]
        );
    }

    #[test]
    fn timeline_rejoins_description_commas() {
        let (decoded, _) = decode(
            "timeline",
            "Phase 1, Discovery, 2 weeks, Interviews, audits, and mapping\n",
        );
        assert_eq!(
            decoded,
            DecodedBlock::Timeline(vec![TimelinePhase {
                phase: "Phase 1".into(),
                title: "Discovery".into(),
                duration: "2 weeks".into(),
                description: "Interviews, audits, and mapping".into(),
            }])
        );
    }

    #[test]
    fn timeline_description_is_optional() {
        let (decoded, diagnostics) = decode("timeline", "P1,Kickoff,1d\nP2,Oops\n");
        let DecodedBlock::Timeline(phases) = decoded else {
            panic!("expected timeline");
        };
        assert_eq!(phases.len(), 1);
        assert_eq!(phases[0].description, "");
        assert_eq!(
            diagnostics,
            vec![Diagnostic::SkippedRow {
                type_name: "timeline".into(),
                line: 3,
                reason: "expected at least 3 fields, found 2".into(),
            }]
        );
    }

    #[test]
    fn pricing_skips_header_and_splits_features() {
        let body = "plan,price,features,market\nStarter,$9,SSO; Audit log ;,Small teams\nScale,$99\n";
        let (decoded, _) = decode("pricing", body);
        assert_eq!(
            decoded,
            DecodedBlock::Pricing(vec![
                PricingTier {
                    plan: "Starter".into(),
                    price: "$9".into(),
                    features: vec!["SSO".into(), "Audit log".into()],
                    target_market: "Small teams".into(),
                },
                PricingTier {
                    plan: "Scale".into(),
                    price: "$99".into(),
                    features: Vec::new(),
                    target_market: String::new(),
                },
            ])
        );
    }

    #[test]
    fn comparison_parses_winner() {
        let body = "category,us,them,winner\nLatency,40ms,120ms,us\nPrice,$$,$,competitor\nSupport,24/7,24/7\n";
        let (decoded, _) = decode("comparison", body);
        let DecodedBlock::Comparison(rows) = decoded else {
            panic!("expected comparison");
        };
        let winners: Vec<_> = rows.iter().map(|row| row.winner.clone()).collect();
        assert_eq!(winners, [Winner::Ours, Winner::Competitor, Winner::Tie]);
    }

    #[test]
    fn kpis_alias_decodes_as_metrics() {
        let (decoded, _) = decode("kpis", "label,value,change\nConversion,4.2%,+1.1pt\n");
        assert_eq!(
            decoded,
            DecodedBlock::Metrics(vec![Metric {
                label: "Conversion".into(),
                value: "4.2%".into(),
                change: "+1.1pt".into(),
                description: String::new(),
            }])
        );
    }

    #[test]
    fn techstack_lists_technologies() {
        let (decoded, _) = decode(
            "techstack",
            "category,tech,why\nBackend,Rust; Postgres,Fast, and boring\n",
        );
        assert_eq!(
            decoded,
            DecodedBlock::TechStack(vec![TechStackItem {
                category: "Backend".into(),
                technologies: vec!["Rust".into(), "Postgres".into()],
                rationale: "Fast, and boring".into(),
            }])
        );
    }

    #[test]
    fn cta_uses_first_row_and_reports_extras() {
        let body = "title,description,label,href\nTalk to us,Book a call,Book,/contact\nSecond,row\n";
        let (decoded, diagnostics) = decode("cta", body);
        assert_eq!(
            decoded,
            DecodedBlock::Cta(CallToAction {
                title: "Talk to us".into(),
                description: "Book a call".into(),
                button_label: "Book".into(),
                button_href: "/contact".into(),
            })
        );
        assert_eq!(
            diagnostics,
            vec![Diagnostic::ExtraRows {
                type_name: "cta".into(),
                line: 1,
                ignored: 1
            }]
        );
    }

    #[test]
    fn marketing_rows_keep_result_commas() {
        let body = "channel,strategy,result\nWebinars,Monthly product tours,312 signups, 41 trials\nSEO\n";
        let (decoded, diagnostics) = decode("marketing", body);
        assert_eq!(
            decoded,
            DecodedBlock::Marketing(vec![MarketingChannel {
                channel: "Webinars".into(),
                strategy: "Monthly product tours".into(),
                result: "312 signups, 41 trials".into(),
            }])
        );
        assert_eq!(
            diagnostics,
            vec![Diagnostic::SkippedRow {
                type_name: "marketing".into(),
                line: 4,
                reason: "expected at least 2 fields, found 1".into(),
            }]
        );
    }

    #[test]
    fn gallery_rows_need_only_a_source() {
        let body = "src,alt,caption\n/img/before.png,Old import screen,Before\n/img/after.png\n";
        let (decoded, diagnostics) = decode("gallery", body);
        assert!(diagnostics.is_empty());
        assert_eq!(
            decoded,
            DecodedBlock::Gallery(vec![
                GalleryImage {
                    src: "/img/before.png".into(),
                    alt: "Old import screen".into(),
                    caption: "Before".into(),
                },
                GalleryImage {
                    src: "/img/after.png".into(),
                    alt: String::new(),
                    caption: String::new(),
                },
            ])
        );
    }

    #[test]
    fn header_only_block_is_malformed() {
        let (decoded, diagnostics) = decode("gallery", "src,alt,caption\n\n");
        assert_eq!(
            decoded,
            DecodedBlock::Malformed {
                type_name: "gallery".into(),
                raw_body: "src,alt,caption\n\n".into(),
            }
        );
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn unknown_type_keeps_tabular_data() {
        let (decoded, diagnostics) = decode("bogus", "a,b\n1,2\n");
        assert!(diagnostics.is_empty());
        assert_eq!(
            decoded,
            DecodedBlock::Unknown {
                name: "bogus".into(),
                table: Tabular {
                    headers: vec!["a".into(), "b".into()],
                    rows: vec![vec!["1".into(), "2".into()]],
                },
            }
        );
    }
}
