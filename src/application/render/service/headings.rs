//! Heading discovery and `id` assignment over rendered HTML.

use std::{cell::RefCell, rc::Rc};

use lol_html::{RewriteStrSettings, element, rewrite_str, text};

use crate::application::render::types::RenderError;
use crate::domain::slug::derive_slug;

const HEADING_SELECTOR: &str = "h1, h2, h3, h4, h5, h6";

/// A heading element as found in HTML, before any identifier is assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ScannedHeading {
    pub(crate) level: u8,
    pub(crate) existing_id: Option<String>,
    /// Text content with tags stripped, entities decoded and whitespace collapsed.
    pub(crate) text: String,
}

/// Collect every heading in document order.
pub(crate) fn scan_headings(html: &str) -> Result<Vec<ScannedHeading>, RenderError> {
    let headings = Rc::new(RefCell::new(Vec::<ScannedHeading>::new()));

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(HEADING_SELECTOR, {
                    let headings = Rc::clone(&headings);
                    move |el| {
                        let level = el
                            .tag_name()
                            .strip_prefix('h')
                            .and_then(|value| value.parse::<u8>().ok())
                            .unwrap_or(0);
                        let existing_id = el
                            .get_attribute("id")
                            .filter(|id| !id.trim().is_empty());
                        headings.borrow_mut().push(ScannedHeading {
                            level,
                            existing_id,
                            text: String::new(),
                        });
                        Ok(())
                    }
                }),
                text!(HEADING_SELECTOR, {
                    let headings = Rc::clone(&headings);
                    move |chunk| {
                        if let Some(current) = headings.borrow_mut().last_mut() {
                            current.text.push_str(chunk.as_str());
                        }
                        Ok(())
                    }
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::document(err.to_string()))?;

    let mut headings = Rc::try_unwrap(headings)
        .map(RefCell::into_inner)
        .unwrap_or_else(|rc| rc.borrow().clone());

    for heading in &mut headings {
        heading.text = normalize_text(&heading.text);
    }

    Ok(headings)
}

/// Set `id` on headings in document order. `None` leaves the heading untouched.
pub(crate) fn apply_heading_ids(html: &str, ids: &[Option<String>]) -> Result<String, RenderError> {
    let ids = Rc::new(ids.to_vec());
    let index = Rc::new(RefCell::new(0usize));

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!(HEADING_SELECTOR, {
                let ids = Rc::clone(&ids);
                let index = Rc::clone(&index);
                move |el| {
                    let mut idx = index.borrow_mut();
                    if let Some(Some(id)) = ids.get(*idx) {
                        el.set_attribute("id", id)?;
                    }
                    *idx += 1;
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::document(err.to_string()))
}

/// Give every heading that still lacks an `id` one derived from its text.
///
/// Existing identifiers are never touched, so running the pass again is a
/// no-op.
pub fn assign_missing_heading_ids(html: &str) -> Result<String, RenderError> {
    let headings = scan_headings(html)?;
    let ids: Vec<Option<String>> = headings
        .iter()
        .map(|heading| match heading.existing_id {
            Some(_) => None,
            None => Some(derive_slug(&heading.text)).filter(|slug| !slug.is_empty()),
        })
        .collect();

    if ids.iter().all(Option::is_none) {
        return Ok(html.to_string());
    }

    apply_heading_ids(html, &ids)
}

fn normalize_text(raw: &str) -> String {
    decode_entities(raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode the character references an HTML serializer emits in text nodes.
fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut output = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(amp) = rest.find('&') {
        output.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        match candidate
            .find(';')
            .and_then(|end| decode_reference(&candidate[1..end]).map(|ch| (ch, end)))
        {
            Some((ch, end)) => {
                output.push(ch);
                rest = &candidate[end + 1..];
            }
            None => {
                output.push('&');
                rest = &candidate[1..];
            }
        }
    }
    output.push_str(rest);
    output
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let numeric = name.strip_prefix('#')?;
            let code = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_collects_text_without_tags() {
        let html = "<h1>Hello <em>big</em>\n world</h1><p>x</p><h3 id=\"keep\">Results &amp; Metrics</h3>";
        let headings = scan_headings(html).expect("scan");

        assert_eq!(
            headings,
            vec![
                ScannedHeading {
                    level: 1,
                    existing_id: None,
                    text: "Hello big world".into(),
                },
                ScannedHeading {
                    level: 3,
                    existing_id: Some("keep".into()),
                    text: "Results & Metrics".into(),
                },
            ]
        );
    }

    #[test]
    fn apply_sets_ids_in_order() {
        let html = "<h2>A</h2><h2>B</h2>";
        let rewritten =
            apply_heading_ids(html, &[None, Some("b".to_string())]).expect("rewrite");
        assert_eq!(rewritten, "<h2>A</h2><h2 id=\"b\">B</h2>");
    }

    #[test]
    fn missing_id_pass_is_idempotent() {
        let html = "<h2 id=\"custom\">Solution Design</h2><h2>Next Steps</h2><h4>!!!</h4>";

        let once = assign_missing_heading_ids(html).expect("first pass");
        assert_eq!(
            once,
            "<h2 id=\"custom\">Solution Design</h2><h2 id=\"next-steps\">Next Steps</h2><h4>!!!</h4>"
        );

        let twice = assign_missing_heading_ids(&once).expect("second pass");
        assert_eq!(once, twice);
    }

    #[test]
    fn decodes_common_references() {
        assert_eq!(decode_entities("a &lt;b&gt; &#39;c&#x27; &amp;&amp"), "a <b> 'c' &&amp");
        assert_eq!(decode_entities("R&D"), "R&D");
    }
}
