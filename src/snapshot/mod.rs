//! Snapshot assembly and persistence.
//!
//! The whole tree is held in memory and written once at the end of a run;
//! a failed run never leaves a partial snapshot behind.

use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::models::{BrandFitments, FitmentSnapshot};

/// Stamp the tree and compute the summary counters. Totals are derived from
/// the tree itself, so the invariants hold by construction.
pub fn assemble(brands: Vec<BrandFitments>) -> FitmentSnapshot {
    let total_brands = brands.len();
    let total_models = brands.iter().map(|b| b.models.len()).sum();
    let total_products = brands
        .iter()
        .flat_map(|b| b.models.iter())
        .map(|m| m.products.len())
        .sum();

    FitmentSnapshot {
        generated_at: Utc::now().naive_utc(),
        total_brands,
        total_models,
        total_products,
        brands,
    }
}

pub struct SnapshotWriter {
    dir: PathBuf,
    prefix: String,
}

impl SnapshotWriter {
    pub fn new(dir: &Path, prefix: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
        }
    }

    /// Serialize the snapshot to `<dir>/<prefix>-YYYY-MM-DD.json`, creating
    /// the directory if needed. Runs on the same day overwrite each other.
    pub fn write(&self, snapshot: &FitmentSnapshot) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("could not create output dir {:?}", self.dir))?;

        let filename = format!(
            "{}-{}.json",
            self.prefix,
            snapshot.generated_at.format("%Y-%m-%d"),
        );
        let path = self.dir.join(filename);

        let json = serde_json::to_string_pretty(snapshot).context("snapshot serialization")?;
        fs::write(&path, json).with_context(|| format!("could not write {:?}", path))?;

        info!(
            "Snapshot written to {:?} ({} brands / {} models / {} products)",
            path, snapshot.total_brands, snapshot.total_models, snapshot.total_products,
        );
        Ok(path)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
