use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ── Vehicle hierarchy ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Brand {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub brand: String,
    pub name: String,
}

/// One compatible product under a model. Identity is the SKU string; repeated
/// SKUs are kept in occurrence order, never deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub sku: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

// ── Page envelope ─────────────────────────────────────────────────────────────

/// One normalized page of a product listing. Transient, one per HTTP call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEnvelope {
    pub fragments: Vec<String>,
    pub declared_last_page: Option<u32>,
    pub current_page: u32,
}

// ── Snapshot tree ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFitments {
    pub model: String,
    pub products: Vec<ProductRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandFitments {
    pub brand: String,
    pub models: Vec<ModelFitments>,
}

/// The sole persisted artifact of a crawl run. Totals are computed from the
/// tree after the walk finishes, not maintained incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitmentSnapshot {
    pub generated_at: NaiveDateTime,
    pub total_brands: usize,
    pub total_models: usize,
    pub total_products: usize,
    pub brands: Vec<BrandFitments>,
}
