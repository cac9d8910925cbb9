//! Three-level hierarchy walk: vehicle brand → vehicle model → compatible
//! products, aggregated into one ordered tree.
//!
//! Failure policy: a model whose product collection fails is recorded with an
//! empty product list; a brand whose model list fails is recorded with an
//! empty model list. Only the initial brand-list fetch is fatal, since without it
//! there is nothing to snapshot.

pub mod collector;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod rate_gate;
pub mod session;

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{EndpointConfig, PolitenessConfig};
use crate::crawler::collector::{ProductQuery, collect};
use crate::crawler::error::CrawlError;
use crate::crawler::extract::ExtractStrategy;
use crate::crawler::normalize::{classify, extract_names};
use crate::crawler::session::Transport;
use crate::models::{Brand, BrandFitments, Model, ModelFitments};

// ── Endpoints ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EndpointSet {
    pub brand_list: String,
    pub model_list: String,
    pub product_list: String,
}

impl From<&EndpointConfig> for EndpointSet {
    fn from(cfg: &EndpointConfig) -> Self {
        Self {
            brand_list: cfg.brand_list.clone(),
            model_list: cfg.model_list.clone(),
            product_list: cfg.product_list.clone(),
        }
    }
}

// ── Walker ────────────────────────────────────────────────────────────────────

pub struct HierarchyWalker<'a> {
    transport: &'a dyn Transport,
    endpoints: EndpointSet,
    strategy: ExtractStrategy,
    model_delay: Duration,
    brand_delay: Duration,
}

impl<'a> HierarchyWalker<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        endpoints: EndpointSet,
        strategy: ExtractStrategy,
        politeness: &PolitenessConfig,
    ) -> Self {
        Self {
            transport,
            endpoints,
            strategy,
            model_delay: Duration::from_millis(politeness.model_delay_ms),
            brand_delay: Duration::from_millis(politeness.brand_delay_ms),
        }
    }

    /// Walk the full hierarchy. Empty branches are recorded, never omitted;
    /// sibling branches never see each other's failures.
    pub async fn run(&self) -> Result<Vec<BrandFitments>> {
        let brands = self
            .fetch_brands()
            .await
            .context("brand list fetch failed")?;
        info!("{} brands to walk", brands.len());

        let mut tree = Vec::with_capacity(brands.len());

        for (bi, brand) in brands.iter().enumerate() {
            if bi > 0 {
                sleep(self.brand_delay).await;
            }

            let models = match self.fetch_models(brand).await {
                Ok(models) => models,
                Err(e) => {
                    warn!("{}: model list failed, recording empty brand: {}", brand.name, e);
                    Vec::new()
                }
            };
            info!("{}: {} models", brand.name, models.len());

            let mut entries = Vec::with_capacity(models.len());
            for (mi, model) in models.iter().enumerate() {
                if mi > 0 {
                    sleep(self.model_delay).await;
                }

                let query = ProductQuery {
                    endpoint: self.endpoints.product_list.clone(),
                    brand: model.brand.clone(),
                    model: model.name.clone(),
                };

                let products = match collect(self.transport, &query, &self.strategy).await {
                    Ok(products) => products,
                    Err(e) => {
                        warn!(
                            "{}/{}: product collection failed, recording empty model: {}",
                            model.brand, model.name, e,
                        );
                        Vec::new()
                    }
                };

                debug!("{}/{}: {} products", model.brand, model.name, products.len());
                entries.push(ModelFitments {
                    model: model.name.clone(),
                    products,
                });
            }

            tree.push(BrandFitments {
                brand: brand.name.clone(),
                models: entries,
            });
        }

        Ok(tree)
    }

    async fn fetch_brands(&self) -> Result<Vec<Brand>, CrawlError> {
        let resp = self.transport.get(&self.endpoints.brand_list).await?;
        if !resp.is_success() {
            return Err(CrawlError::BadStatus {
                status: resp.status,
            });
        }

        let names = usable_names(extract_names(&classify(&resp.body)));
        Ok(names.into_iter().map(|name| Brand { name }).collect())
    }

    async fn fetch_models(&self, brand: &Brand) -> Result<Vec<Model>, CrawlError> {
        let form = vec![("brand".to_string(), brand.name.clone())];
        let resp = self
            .transport
            .post_form(&self.endpoints.model_list, &form)
            .await?;
        if !resp.is_success() {
            return Err(CrawlError::BadStatus {
                status: resp.status,
            });
        }

        let names = usable_names(extract_names(&classify(&resp.body)));
        Ok(names
            .into_iter()
            .map(|name| Model {
                brand: brand.name.clone(),
                name,
            })
            .collect())
    }
}

/// Trim and drop blank entries. A blank name cannot address an endpoint.
fn usable_names(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

// ── Test support ──────────────────────────────────────────────────────────────


// ── Tests ─────────────────────────────────────────────────────────────────────
