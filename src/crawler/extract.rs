//! Typed record extraction from embedded HTML fragments.
//!
//! Selector rules are supplied by the caller so the same walk can target a
//! different storefront's markup without code changes. The reference rules
//! match SKU-bearing elements anywhere in the fragment, then read the product
//! name from the nearest enclosing card element.

use anyhow::Result;
use scraper::{ElementRef, Html, Selector};

use crate::config::SelectorConfig;
use crate::models::ProductRecord;

/// Compiled selector rules. Built once at startup; a rule that does not parse
/// is a configuration error and aborts before any network call.
pub struct ExtractStrategy {
    sku: Selector,
    name: Selector,
    card_hint: String,
}

impl ExtractStrategy {
    pub fn compile(rules: &SelectorConfig) -> Result<Self> {
        let sku = Selector::parse(&rules.sku_selector)
            .map_err(|e| anyhow::anyhow!("sku selector: {:?}", e))?;
        let name = Selector::parse(&rules.name_selector)
            .map_err(|e| anyhow::anyhow!("name selector: {:?}", e))?;

        Ok(Self {
            sku,
            name,
            card_hint: rules.card_class_hint.clone(),
        })
    }
}

/// Extract every product record from one HTML fragment. Defensive by design:
/// empty, malformed or plain-garbage input yields zero records. Records with
/// an empty SKU after trimming are discarded; duplicates are kept in order.
pub fn extract(fragment_html: &str, strategy: &ExtractStrategy) -> Vec<ProductRecord> {
    if fragment_html.trim().is_empty() {
        return Vec::new();
    }

    let doc = Html::parse_fragment(fragment_html);
    let mut records = Vec::new();

    for sku_el in doc.select(&strategy.sku) {
        let sku = element_text(sku_el);
        if sku.is_empty() {
            continue;
        }

        let name = enclosing_card(sku_el, &strategy.card_hint)
            .and_then(|card| card.select(&strategy.name).next())
            .map(element_text)
            .filter(|text| !text.is_empty());

        records.push(ProductRecord { sku, name });
    }

    records
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Nearest ancestor whose `class` attribute contains the card hint.
fn enclosing_card<'a>(el: ElementRef<'a>, hint: &str) -> Option<ElementRef<'a>> {
    el.ancestors().filter_map(ElementRef::wrap).find(|a| {
        a.value()
            .attr("class")
            .is_some_and(|classes| classes.contains(hint))
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_strategy() -> ExtractStrategy {
        ExtractStrategy::compile(&SelectorConfig {
            sku_selector: "[class*='sku']".to_string(),
            card_class_hint: "product".to_string(),
            name_selector: "[class*='name']".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn extracts_sku_and_name_from_card() {
        let fragment = "<div class='product-card'>\
                        <span class='name'>Gasket</span>\
                        <span class='sku'>ABC-1</span>\
                        </div>";
        let records = extract(fragment, &reference_strategy());
        assert_eq!(
            records,
            vec![ProductRecord {
                sku: "ABC-1".to_string(),
                name: Some("Gasket".to_string()),
            }]
        );
    }

    #[test]
    fn sku_without_card_has_no_name() {
        let records = extract("<span class='sku'>LONE-1</span>", &reference_strategy());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sku, "LONE-1");
        assert_eq!(records[0].name, None);
    }

    #[test]
    fn empty_name_element_becomes_none() {
        let fragment = "<div class='product'><i class='name'>  </i>\
                        <b class='sku'>X-9</b></div>";
        let records = extract(fragment, &reference_strategy());
        assert_eq!(records[0].name, None);
    }

    #[test]
    fn blank_sku_is_discarded() {
        let fragment = "<div class='product'><span class='sku'>   </span></div>";
        assert!(extract(fragment, &reference_strategy()).is_empty());
    }

    #[test]
    fn sku_text_is_trimmed() {
        let records = extract("<span class='sku'>  AB-2  </span>", &reference_strategy());
        assert_eq!(records[0].sku, "AB-2");
    }

    #[test]
    fn duplicate_skus_are_preserved_in_order() {
        let fragment = "<div class='product'><span class='sku'>DUP</span></div>\
                        <div class='product'><span class='sku'>DUP</span></div>";
        let records = extract(fragment, &reference_strategy());
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn two_skus_in_one_card_yield_two_records() {
        let fragment = "<div class='product'><span class='name'>Kit</span>\
                        <span class='sku'>A-1</span><span class='sku'>A-2</span></div>";
        let records = extract(fragment, &reference_strategy());
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name.as_deref(), Some("Kit"));
    }

    #[test]
    fn malformed_input_yields_nothing() {
        let strategy = reference_strategy();
        assert!(extract("", &strategy).is_empty());
        assert!(extract("   \n\t ", &strategy).is_empty());
        assert!(extract("<<<<not <html", &strategy).is_empty());
        assert!(extract("\u{0}\u{1}\u{fffd} random bytes", &strategy).is_empty());
        assert!(extract("just some text", &strategy).is_empty());
    }

    #[test]
    fn unparseable_selector_is_a_startup_error() {
        let result = ExtractStrategy::compile(&SelectorConfig {
            sku_selector: "[[[".to_string(),
            card_class_hint: "product".to_string(),
            name_selector: "[class*='name']".to_string(),
        });
        assert!(result.is_err());
    }
}
