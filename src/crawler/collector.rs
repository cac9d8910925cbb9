//! Paginated product collection for one model.

use tracing::debug;

use crate::crawler::error::CrawlError;
use crate::crawler::extract::{ExtractStrategy, extract};
use crate::crawler::normalize::{classify, shape_of};
use crate::crawler::session::Transport;
use crate::models::ProductRecord;

/// One leaf node of the hierarchy: which endpoint to page through and the
/// brand/model pair identifying the branch.
#[derive(Debug, Clone)]
pub struct ProductQuery {
    pub endpoint: String,
    pub brand: String,
    pub model: String,
}

/// Fetch-extract cycles until the remote-declared last page is reached.
///
/// The first declared last page is trusted for the remainder of the node;
/// later declarations are ignored. A response that declares nothing keeps the
/// initial bound of one page, so the loop terminates on any input. Requests
/// are spaced by the transport's rate gate, not by a sleep in this loop.
///
/// Any transport failure or non-2xx status aborts the whole node; the caller
/// records the branch as empty and moves on.
pub async fn collect(
    transport: &dyn Transport,
    query: &ProductQuery,
    strategy: &ExtractStrategy,
) -> Result<Vec<ProductRecord>, CrawlError> {
    let mut page: u32 = 1;
    let mut last_page: u32 = 1;
    let mut saw_declared = false;
    let mut records = Vec::new();

    while page <= last_page {
        let form = vec![
            ("brand".to_string(), query.brand.clone()),
            ("model".to_string(), query.model.clone()),
            ("page".to_string(), page.to_string()),
        ];

        let resp = transport.post_form(&query.endpoint, &form).await?;
        if !resp.is_success() {
            return Err(CrawlError::BadStatus {
                status: resp.status,
            });
        }

        let envelope = shape_of(&classify(&resp.body)).into_page(page);

        if !saw_declared {
            if let Some(declared) = envelope.declared_last_page {
                last_page = declared;
                saw_declared = true;
            }
        }

        let before = records.len();
        for fragment in &envelope.fragments {
            records.extend(extract(fragment, strategy));
        }

        debug!(
            "{}/{} page {}/{}: {} records",
            query.brand,
            query.model,
            page,
            last_page,
            records.len() - before,
        );

        page += 1;
    }

    Ok(records)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::test_support::{ScriptedTransport, json_response, reference_strategy};
    use crate::crawler::session::RawResponse;

    fn query() -> ProductQuery {
        ProductQuery {
            endpoint: "/ajax/vehicle/products".to_string(),
            brand: "Yamaha".to_string(),
            model: "XMAX 300".to_string(),
        }
    }

    const CARD: &str = "<div class='product-card'>\
                        <span class='name'>Gasket</span>\
                        <span class='sku'>ABC-1</span></div>";

    #[tokio::test]
    async fn follows_declared_last_page_exactly() {
        let transport = ScriptedTransport::default();
        transport.push(
            "/ajax/vehicle/products",
            json_response(&format!(
                r#"{{"html": ["{CARD}"], "paginator": {{"current_page": 1, "last_page": 2, "total": 2}}}}"#
            )),
        );
        transport.push(
            "/ajax/vehicle/products",
            json_response(&format!(
                r#"{{"html": ["{CARD}"], "paginator": {{"current_page": 2, "last_page": 2, "total": 2}}}}"#
            )),
        );

        let records = collect(&transport, &query(), &reference_strategy())
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sku, "ABC-1");
        assert_eq!(records[0].name.as_deref(), Some("Gasket"));
        assert_eq!(transport.request_count(), 2);

        let pages: Vec<String> = transport
            .recorded_forms()
            .iter()
            .filter_map(|form| {
                form.iter()
                    .find(|(k, _)| k == "page")
                    .map(|(_, v)| v.clone())
            })
            .collect();
        assert_eq!(pages, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn opaque_text_stops_after_one_page() {
        let transport = ScriptedTransport::default();
        transport.push(
            "/ajax/vehicle/products",
            RawResponse {
                status: 200,
                body: "Server Error".to_string(),
            },
        );

        let records = collect(&transport, &query(), &reference_strategy())
            .await
            .unwrap();

        assert!(records.is_empty());
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn bare_array_stops_after_one_page() {
        let transport = ScriptedTransport::default();
        transport.push(
            "/ajax/vehicle/products",
            json_response(r#"["<span class=\"sku\">Z-1</span>"]"#),
        );

        let records = tokio_test::block_on(collect(&transport, &query(), &reference_strategy()))
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn first_declared_last_page_wins() {
        let transport = ScriptedTransport::default();
        transport.push(
            "/ajax/vehicle/products",
            json_response(r#"{"html": [], "paginator": {"current_page": 1, "last_page": 2}}"#),
        );
        // Page 2 claims there are five pages; the first declaration is trusted.
        transport.push(
            "/ajax/vehicle/products",
            json_response(r#"{"html": [], "paginator": {"current_page": 2, "last_page": 5}}"#),
        );

        let records = collect(&transport, &query(), &reference_strategy())
            .await
            .unwrap();

        assert!(records.is_empty());
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn non_success_status_aborts_the_node() {
        let transport = ScriptedTransport::default();
        transport.push(
            "/ajax/vehicle/products",
            RawResponse {
                status: 503,
                body: String::new(),
            },
        );

        let err = collect(&transport, &query(), &reference_strategy())
            .await
            .unwrap_err();

        assert!(matches!(err, CrawlError::BadStatus { status: 503 }));
    }

    #[tokio::test]
    async fn fragments_extract_in_order_across_pages() {
        let transport = ScriptedTransport::default();
        transport.push(
            "/ajax/vehicle/products",
            json_response(
                r#"{"html": ["<i class=\"sku\">A</i>", "<i class=\"sku\">B</i>"],
                    "paginator": {"current_page": 1, "last_page": 2}}"#,
            ),
        );
        transport.push(
            "/ajax/vehicle/products",
            json_response(
                r#"{"html": ["<i class=\"sku\">C</i>"],
                    "paginator": {"current_page": 2, "last_page": 2}}"#,
            ),
        );

        let records = collect(&transport, &query(), &reference_strategy())
            .await
            .unwrap();

        let skus: Vec<&str> = records.iter().map(|r| r.sku.as_str()).collect();
        assert_eq!(skus, vec!["A", "B", "C"]);
    }
}
