//! Response classification and envelope unwrapping.
//!
//! The product endpoint answers with two incompatible JSON shapes (an
//! `{html, paginator}` envelope or a bare/wrapped array), and under load with
//! plain text. Everything funnels through one tagged union so the collector
//! matches exhaustively instead of probing fields, and every unrecognized
//! shape degrades to "one page, nothing extracted" rather than an error.

use serde_json::Value;

use crate::models::PageEnvelope;

// ── Body classification ───────────────────────────────────────────────────────

/// A raw HTTP body, either strict JSON or opaque text. Never fails.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Text(String),
}

pub fn classify(raw: &str) -> Body {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => Body::Json(value),
        Err(_) => Body::Text(raw.to_string()),
    }
}

// ── Envelope shapes ───────────────────────────────────────────────────────────

/// Remote pagination metadata, parsed leniently: the storefront sometimes
/// serializes page numbers as strings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paginator {
    pub current_page: Option<u32>,
    pub last_page: Option<u32>,
    pub total: Option<u64>,
}

/// The recognized envelope shapes, in match priority order.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvelopeShape {
    /// `{html: [...], paginator: {...}}`, the paginated listing shape.
    HtmlFragments {
        fragments: Vec<String>,
        paginator: Option<Paginator>,
    },
    /// A bare top-level array.
    BareArray(Vec<Value>),
    /// `{data: [...]}`.
    DataArray(Vec<Value>),
    Unrecognized,
}

fn as_page_number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_paginator(value: &Value) -> Option<Paginator> {
    let obj = value.as_object()?;
    Some(Paginator {
        current_page: obj.get("current_page").and_then(as_page_number),
        last_page: obj.get("last_page").and_then(as_page_number),
        total: obj.get("total").and_then(Value::as_u64),
    })
}

/// Non-string entries in a fragment array are skipped, never an error.
fn string_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

pub fn shape_of(body: &Body) -> EnvelopeShape {
    let value = match body {
        Body::Json(value) => value,
        Body::Text(_) => return EnvelopeShape::Unrecognized,
    };

    if let Some(obj) = value.as_object() {
        if let Some(html) = obj.get("html").and_then(Value::as_array) {
            return EnvelopeShape::HtmlFragments {
                fragments: string_items(html),
                paginator: obj.get("paginator").and_then(parse_paginator),
            };
        }
        if let Some(data) = obj.get("data").and_then(Value::as_array) {
            return EnvelopeShape::DataArray(data.clone());
        }
        return EnvelopeShape::Unrecognized;
    }

    if let Some(items) = value.as_array() {
        return EnvelopeShape::BareArray(items.clone());
    }

    EnvelopeShape::Unrecognized
}

impl EnvelopeShape {
    /// Collapse into a well-formed page. Shapes without pagination metadata
    /// declare the requested page as the last one, so pagination stops after
    /// a single page on anything unexpected.
    pub fn into_page(self, requested_page: u32) -> PageEnvelope {
        match self {
            EnvelopeShape::HtmlFragments {
                fragments,
                paginator,
            } => {
                let paginator = paginator.unwrap_or_default();
                PageEnvelope {
                    fragments,
                    declared_last_page: paginator.last_page,
                    current_page: paginator.current_page.unwrap_or(requested_page),
                }
            }
            EnvelopeShape::BareArray(items) | EnvelopeShape::DataArray(items) => PageEnvelope {
                fragments: string_items(&items),
                declared_last_page: Some(requested_page),
                current_page: requested_page,
            },
            EnvelopeShape::Unrecognized => PageEnvelope {
                fragments: Vec::new(),
                declared_last_page: Some(requested_page),
                current_page: requested_page,
            },
        }
    }
}

// ── Name lists ────────────────────────────────────────────────────────────────

/// Pull the entries out of a brand/model list response: a bare array or a
/// `{data: [...]}` wrapper of either plain strings or `{name: ...}` objects.
/// Anything else yields an empty list.
pub fn extract_names(body: &Body) -> Vec<String> {
    let items = match shape_of(body) {
        EnvelopeShape::BareArray(items) | EnvelopeShape::DataArray(items) => items,
        EnvelopeShape::HtmlFragments { .. } | EnvelopeShape::Unrecognized => return Vec::new(),
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_text_classifies_as_opaque() {
        assert_eq!(classify("Server Error"), Body::Text("Server Error".into()));
    }

    #[test]
    fn json_object_classifies_as_json() {
        assert!(matches!(classify(r#"{"html": []}"#), Body::Json(_)));
    }

    #[test]
    fn paginated_envelope_is_unwrapped() {
        let body = classify(
            r#"{"html": ["<div>a</div>", "<div>b</div>"],
                "paginator": {"current_page": 1, "last_page": 4, "total": 40}}"#,
        );
        let page = shape_of(&body).into_page(1);
        assert_eq!(page.fragments.len(), 2);
        assert_eq!(page.declared_last_page, Some(4));
        assert_eq!(page.current_page, 1);
    }

    #[test]
    fn paginator_numbers_may_be_strings() {
        let body = classify(r#"{"html": [], "paginator": {"current_page": "2", "last_page": "3"}}"#);
        let page = shape_of(&body).into_page(2);
        assert_eq!(page.declared_last_page, Some(3));
        assert_eq!(page.current_page, 2);
    }

    #[test]
    fn html_envelope_without_paginator_declares_nothing() {
        let body = classify(r#"{"html": ["<i>x</i>"]}"#);
        let page = shape_of(&body).into_page(1);
        assert_eq!(page.declared_last_page, None);
        assert_eq!(page.current_page, 1);
    }

    #[test]
    fn non_string_fragments_are_skipped() {
        let body = classify(r#"{"html": ["<div/>", 7, null, {"x": 1}]}"#);
        let page = shape_of(&body).into_page(1);
        assert_eq!(page.fragments, vec!["<div/>".to_string()]);
    }

    #[test]
    fn bare_array_is_a_single_page() {
        let body = classify(r#"["<div>a</div>"]"#);
        let page = shape_of(&body).into_page(3);
        assert_eq!(page.fragments.len(), 1);
        assert_eq!(page.declared_last_page, Some(3));
    }

    #[test]
    fn data_wrapper_is_a_single_page() {
        let body = classify(r#"{"data": ["<div>a</div>", "<div>b</div>"]}"#);
        let page = shape_of(&body).into_page(1);
        assert_eq!(page.fragments.len(), 2);
        assert_eq!(page.declared_last_page, Some(1));
    }

    #[test]
    fn html_takes_priority_over_data() {
        let body = classify(r#"{"html": ["<b/>"], "data": ["ignored"]}"#);
        assert!(matches!(
            shape_of(&body),
            EnvelopeShape::HtmlFragments { .. }
        ));
    }

    #[test]
    fn unrecognized_shapes_stop_after_one_page() {
        for raw in [r#"{"message": "ok"}"#, "Server Error", "42", "null"] {
            let page = shape_of(&classify(raw)).into_page(1);
            assert!(page.fragments.is_empty(), "input {:?}", raw);
            assert_eq!(page.declared_last_page, Some(1), "input {:?}", raw);
        }
    }

    #[test]
    fn names_from_string_array() {
        let body = classify(r#"["Yamaha", "", "Piaggio"]"#);
        assert_eq!(extract_names(&body), vec!["Yamaha", "", "Piaggio"]);
    }

    #[test]
    fn names_from_object_array() {
        let body = Body::Json(json!({"data": [{"name": "Vespa"}, {"id": 3}, "Aprilia"]}));
        assert_eq!(extract_names(&body), vec!["Vespa", "Aprilia"]);
    }

    #[test]
    fn names_from_non_list_shapes_are_empty() {
        assert!(extract_names(&classify("oops")).is_empty());
        assert!(extract_names(&classify(r#"{"html": ["x"]}"#)).is_empty());
    }
}
