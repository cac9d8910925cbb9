//! Run orchestrator: validate → prime session → walk hierarchy → write snapshot.
//!
//! One run is one session. Configuration problems abort before the first
//! network call; after that, only a failed brand-list fetch is fatal; every
//! narrower failure degrades to an empty branch inside the walker.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

use crate::config::AppConfig;
use crate::crawler::extract::ExtractStrategy;
use crate::crawler::rate_gate::RateGate;
use crate::crawler::session::SessionClient;
use crate::crawler::{EndpointSet, HierarchyWalker};
use crate::snapshot::{self, SnapshotWriter};

pub struct Pipeline {
    config: AppConfig,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn run(&self) -> Result<CrawlStats> {
        let started = Instant::now();

        self.config.validate().context("configuration rejected")?;
        let strategy = ExtractStrategy::compile(&self.config.selectors)
            .context("selector strategy rejected")?;

        let gate = RateGate::new(
            Duration::from_millis(self.config.politeness.page_delay_ms),
            Duration::from_millis(self.config.politeness.jitter_ms),
        );

        info!("=== Step 1: Priming session against {} ===", self.config.target.base_url);
        let client = SessionClient::prime(&self.config.target, gate)
            .await
            .context("session priming failed")?;
        info!(
            "Session ready: {} cookies, anti-forgery token {}",
            client.session().cookies.len(),
            if client.session().anti_forgery_token.is_some() { "present" } else { "absent" },
        );

        info!("=== Step 2: Walking brand/model/product hierarchy ===");
        let walker = HierarchyWalker::new(
            &client,
            EndpointSet::from(&self.config.target.endpoints),
            strategy,
            &self.config.politeness,
        );
        let tree = walker.run().await?;

        info!("=== Step 3: Writing snapshot ===");
        let snapshot = snapshot::assemble(tree);
        let writer = SnapshotWriter::new(&self.config.output.dir, &self.config.output.file_prefix);
        let snapshot_path = writer.write(&snapshot)?;

        info!("=== Done in {:.2?} ===", started.elapsed());

        Ok(CrawlStats {
            brands: snapshot.total_brands,
            models: snapshot.total_models,
            products: snapshot.total_products,
            snapshot_path,
        })
    }
}

#[derive(Debug)]
pub struct CrawlStats {
    pub brands: usize,
    pub models: usize,
    pub products: usize,
    pub snapshot_path: PathBuf,
}
