//! Typed selector queries and the interpreter that evaluates them.
//!
//! Every extractable field is described by an ordered list of
//! [`FieldQuery`] values. The interpreter walks the list and the first query
//! producing a non-empty value wins; later candidates are never consulted.

use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How to read a value out of a matched element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Extract {
    /// Whitespace-normalized text content.
    Text,
    /// Value of the named attribute.
    Attr { name: String },
}

/// One candidate in a field's fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldQuery {
    /// CSS selector relative to the current element. `None` reads the
    /// element itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    pub extract: Extract,
}

impl FieldQuery {
    pub fn text(selector: &str) -> Self {
        Self {
            selector: Some(selector.to_string()),
            extract: Extract::Text,
        }
    }

    pub fn attr(selector: &str, name: &str) -> Self {
        Self {
            selector: Some(selector.to_string()),
            extract: Extract::Attr {
                name: name.to_string(),
            },
        }
    }

    pub fn own_text() -> Self {
        Self {
            selector: None,
            extract: Extract::Text,
        }
    }

    pub fn own_attr(name: &str) -> Self {
        Self {
            selector: None,
            extract: Extract::Attr {
                name: name.to_string(),
            },
        }
    }
}

/// Parse a selector, logging and skipping invalid ones.
pub fn compile(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(s) => Some(s),
        Err(e) => {
            debug!(selector = selector, error = %e, "Skipping invalid selector");
            None
        }
    }
}

/// Collapse runs of whitespace and trim.
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Elements matched by the first candidate selector that matches anything.
///
/// Matches are never merged across candidates.
pub fn first_group<'a>(root: ElementRef<'a>, candidates: &[String]) -> Vec<ElementRef<'a>> {
    for candidate in candidates {
        let Some(selector) = compile(candidate) else {
            continue;
        };
        let matched: Vec<_> = root.select(&selector).collect();
        if !matched.is_empty() {
            debug!(selector = %candidate, count = matched.len(), "Selector group matched");
            return matched;
        }
    }
    Vec::new()
}

fn read(element: ElementRef<'_>, extract: &Extract) -> Option<String> {
    let raw = match extract {
        Extract::Text => element.text().collect::<String>(),
        Extract::Attr { name } => element.value().attr(name)?.to_string(),
    };
    let cleaned = clean_text(&raw);
    (!cleaned.is_empty()).then_some(cleaned)
}

pub(crate) fn values<'a>(
    element: ElementRef<'a>,
    query: &FieldQuery,
) -> Box<dyn Iterator<Item = String> + 'a> {
    let extract = query.extract.clone();
    match &query.selector {
        None => Box::new(read(element, &extract).into_iter()),
        Some(s) => match compile(s) {
            Some(selector) => {
                let matched: Vec<_> = element.select(&selector).collect();
                Box::new(matched.into_iter().filter_map(move |m| read(m, &extract)))
            }
            None => Box::new(std::iter::empty()),
        },
    }
}

/// First non-empty value across the ordered queries.
pub fn first_text(element: ElementRef<'_>, queries: &[FieldQuery]) -> Option<String> {
    queries
        .iter()
        .find_map(|query| values(element, query).next())
}

/// All values of the first query that yields anything, deduplicated in
/// document order.
pub fn all_texts(element: ElementRef<'_>, queries: &[FieldQuery]) -> Vec<String> {
    for query in queries {
        let mut found: Vec<String> = Vec::new();
        for value in values(element, query) {
            if !found.contains(&value) {
                found.push(value);
            }
        }
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn card(html: &str) -> Html {
        Html::parse_fragment(html)
    }

    #[test]
    fn test_first_group_takes_first_matching_selector_only() {
        let doc = Html::parse_document(
            r#"<div class="b">one</div><div class="a">two</div><div class="a">three</div>"#,
        );
        let candidates = vec![".missing".to_string(), ".a".to_string(), ".b".to_string()];
        let group = first_group(doc.root_element(), &candidates);
        assert_eq!(group.len(), 2);
        assert!(group.iter().all(|e| e.value().attr("class") == Some("a")));
    }

    #[test]
    fn test_first_group_skips_invalid_selector() {
        let doc = Html::parse_document(r#"<p class="x">hi</p>"#);
        let candidates = vec!["p[[[".to_string(), ".x".to_string()];
        assert_eq!(first_group(doc.root_element(), &candidates).len(), 1);
    }

    #[test]
    fn test_first_text_skips_empty_candidates() {
        let doc = card(r#"<div><h3>  </h3><a href="/x" title="Fallback Title"></a></div>"#);
        let queries = vec![FieldQuery::text("h3"), FieldQuery::attr("a", "title")];
        assert_eq!(
            first_text(doc.root_element(), &queries),
            Some("Fallback Title".to_string())
        );
    }

    #[test]
    fn test_first_text_normalizes_whitespace() {
        let doc = card("<div><span class=\"t\">\n  Spy   x\tFamily \n</span></div>");
        let queries = vec![FieldQuery::text(".t")];
        assert_eq!(
            first_text(doc.root_element(), &queries),
            Some("Spy x Family".to_string())
        );
    }

    #[test]
    fn test_own_attr_reads_element_itself() {
        let doc = Html::parse_fragment(r#"<a href="/watch/3">Ep 3</a>"#);
        let selector = Selector::parse("a").unwrap();
        let anchor = doc.select(&selector).next().unwrap();
        assert_eq!(
            first_text(anchor, &[FieldQuery::own_attr("href")]),
            Some("/watch/3".to_string())
        );
        assert_eq!(
            first_text(anchor, &[FieldQuery::own_text()]),
            Some("Ep 3".to_string())
        );
    }

    #[test]
    fn test_all_texts_deduplicates_in_order() {
        let doc = card(
            r#"<div><span class="g">Action</span><span class="g">Drama</span><span class="g">Action</span></div>"#,
        );
        let queries = vec![FieldQuery::text(".none"), FieldQuery::text(".g")];
        assert_eq!(
            all_texts(doc.root_element(), &queries),
            vec!["Action".to_string(), "Drama".to_string()]
        );
    }

    #[test]
    fn test_field_query_toml_shape() {
        #[derive(Deserialize)]
        struct Wrapper {
            q: Vec<FieldQuery>,
        }
        let toml = r#"
q = [
  { selector = "img", extract = { kind = "attr", name = "src" } },
  { extract = { kind = "text" } },
]
"#;
        let parsed: Wrapper = toml::from_str(toml).unwrap();
        assert_eq!(parsed.q[0], FieldQuery::attr("img", "src"));
        assert_eq!(parsed.q[1], FieldQuery::own_text());
    }
}
