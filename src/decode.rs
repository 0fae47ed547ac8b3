use crate::SpiderError;
use itertools::Itertools;
use scraper::{ElementRef, Html, Node, Selector};

/// Splits a JSON array body into its items.
///
/// Items stay undecoded so each one can fail on its own later.
pub fn json_items(body: &str) -> Result<Vec<serde_json::Value>, SpiderError> {
    match serde_json::from_str::<serde_json::Value>(body)? {
        serde_json::Value::Array(items) => Ok(items),
        other => Err(SpiderError::DecodeError {
            what: "item list",
            reason: format!("expected a JSON array, found {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// A table row and the text of the script that describes it.
#[derive(Debug, Clone, Copy)]
pub struct RowScript<'a> {
    pub row: ElementRef<'a>,
    pub script: &'a str,
}

/// Pairs the i-th `rows` match with the i-th `scripts` match.
///
/// Unequal counts mean the pairing cannot be trusted, so the whole document
/// is rejected.
pub fn row_scripts<'a>(
    doc: &'a Html,
    rows: &Selector,
    scripts: &Selector,
) -> Result<Vec<RowScript<'a>>, SpiderError> {
    let rows = doc.select(rows).collect::<Vec<_>>();
    let scripts = doc
        .select(scripts)
        .map(|el| el.text().collect::<Vec<_>>())
        .collect::<Vec<_>>();

    if rows.len() != scripts.len() {
        return Err(SpiderError::MisalignedRows {
            rows: rows.len(),
            scripts: scripts.len(),
        });
    }

    Ok(rows
        .into_iter()
        .zip(scripts)
        .map(|(row, text)| RowScript {
            row,
            // script elements hold a single raw text node
            script: text.first().copied().unwrap_or_default(),
        })
        .collect())
}

/// Trimmed text of the first node matching `selector`.
pub fn first_text(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

/// Text of `el` without the content of embedded scripts and styles, one
/// space between fragments.
pub fn visible_text(el: ElementRef<'_>) -> String {
    el.descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) => {
                let hidden = node
                    .parent()
                    .and_then(|p| p.value().as_element())
                    .map_or(false, |e| matches!(e.name(), "script" | "style"));
                (!hidden).then(|| &**text)
            }
            _ => None,
        })
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn selector(s: &str) -> Selector {
        Selector::parse(s).expect("Invalid selector")
    }

    #[test]
    fn test_json_items() {
        let items = json_items(r#"[{"id": "1"}, {"id": "2"}, 3]"#).expect("array");
        assert_eq!(items.len(), 3);

        assert!(matches!(
            json_items(r#"{"id": "1"}"#),
            Err(SpiderError::DecodeError { .. })
        ));
        assert!(matches!(json_items("[{"), Err(SpiderError::JsonError(_))));
    }

    #[test]
    fn test_row_scripts_pairs_in_order() {
        let html = Html::parse_document(
            r#"<table><tbody>
                <tr><td>one</td><td><script>{"n": 1}</script></td></tr>
                <tr><td>two</td><td><script>{"n": 2}</script></td></tr>
            </tbody></table>"#,
        );
        let pairs = row_scripts(&html, &selector("tbody tr"), &selector("tbody script"))
            .expect("aligned");

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].script, r#"{"n": 1}"#);
        assert_eq!(pairs[1].script, r#"{"n": 2}"#);
        assert!(pairs[1].row.text().any(|t| t == "two"));
    }

    #[test]
    fn test_row_scripts_rejects_misaligned() {
        let html = Html::parse_document(
            r#"<table><tbody>
                <tr><td>one</td><td><script>{"n": 1}</script></td></tr>
                <tr><td>two</td></tr>
            </tbody></table>"#,
        );
        let res = row_scripts(&html, &selector("tbody tr"), &selector("tbody script"));
        assert!(matches!(
            res,
            Err(SpiderError::MisalignedRows { rows: 2, scripts: 1 })
        ));
    }

    #[test]
    fn test_first_text() {
        let html = Html::parse_document(r#"<div id="w"><p>  note  </p><p>other</p></div>"#);
        assert_eq!(first_text(&html, &selector("div#w p")), Some("note".to_string()));
        assert_eq!(first_text(&html, &selector("div#missing p")), None);
    }

    #[test]
    fn test_visible_text_skips_scripts() {
        let html = Html::parse_document(
            r#"<table><tbody><tr>
                <td> Jan 7 </td>
                <td><a href="/a">Agenda</a><script>{"name": "cancelled"}</script></td>
            </tr></tbody></table>"#,
        );
        let row = html.select(&selector("tr")).next().expect("row");
        assert_eq!(visible_text(row), "Jan 7 Agenda");
    }
}
