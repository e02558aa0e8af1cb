//! Line-oriented scanner splitting a document into prose and fenced blocks.

use crate::application::render::types::{Diagnostic, Segment};

const FENCE: &str = ":::";

enum ScanState<'a> {
    InProse {
        start: usize,
    },
    InBlock {
        type_name: &'a str,
        open_start: usize,
        body_start: usize,
        line: usize,
    },
}

/// Split `document` into ordered segments whose spans tile the whole input.
///
/// A block opens on a line that is exactly `:::name` and closes on the first
/// following line that is exactly `:::`. Blocks do not nest.
pub(crate) fn scan(document: &str, diagnostics: &mut Vec<Diagnostic>) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut state = ScanState::InProse { start: 0 };
    let mut offset = 0;

    for (index, raw_line) in document.split_inclusive('\n').enumerate() {
        let line_start = offset;
        let line_end = offset + raw_line.len();
        offset = line_end;
        let line_number = index + 1;
        let content = raw_line.trim_end();

        state = match state {
            ScanState::InProse { start } => match opening_type(content) {
                Some(type_name) => {
                    push_prose(&mut segments, document, start..line_start);
                    ScanState::InBlock {
                        type_name,
                        open_start: line_start,
                        body_start: line_end,
                        line: line_number,
                    }
                }
                None => ScanState::InProse { start },
            },
            ScanState::InBlock {
                type_name,
                open_start,
                body_start,
                line,
            } => {
                if content == FENCE {
                    segments.push(Segment::Block {
                        type_name: type_name.to_string(),
                        body: document[body_start..line_start].to_string(),
                        span: open_start..line_end,
                        body_span: body_start..line_start,
                        line,
                    });
                    ScanState::InProse { start: line_end }
                } else {
                    if let Some(nested) = opening_type(content) {
                        diagnostics.push(Diagnostic::NestedOpening {
                            type_name: nested.to_string(),
                            line: line_number,
                        });
                    }
                    ScanState::InBlock {
                        type_name,
                        open_start,
                        body_start,
                        line,
                    }
                }
            }
        };
    }

    match state {
        ScanState::InProse { start } => push_prose(&mut segments, document, start..document.len()),
        ScanState::InBlock {
            type_name,
            open_start,
            line,
            ..
        } => {
            diagnostics.push(Diagnostic::UnterminatedBlock {
                type_name: type_name.to_string(),
                line,
            });
            extend_or_push_prose(&mut segments, document, open_start);
        }
    }

    segments
}

fn opening_type(line: &str) -> Option<&str> {
    let name = line.strip_prefix(FENCE)?;
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
    valid.then_some(name)
}

fn push_prose(segments: &mut Vec<Segment>, document: &str, span: std::ops::Range<usize>) {
    if span.is_empty() {
        return;
    }
    segments.push(Segment::Prose {
        text: document[span.clone()].to_string(),
        span,
    });
}

/// An unterminated block turns back into prose, merged with any prose that
/// directly precedes it.
fn extend_or_push_prose(segments: &mut Vec<Segment>, document: &str, from: usize) {
    if let Some(Segment::Prose { text, span }) = segments.last_mut()
        && span.end == from
    {
        span.end = document.len();
        *text = document[span.clone()].to_string();
        return;
    }
    push_prose(segments, document, from..document.len());
}
