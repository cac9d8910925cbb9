use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub politeness: PolitenessConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl target configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetConfig {
    /// Root of the storefront. No usable default; must be supplied.
    #[serde(default)]
    pub base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// 0 means a failed request immediately empties its branch.
    #[serde(default)]
    pub max_retries: usize,

    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,

    #[serde(default)]
    pub endpoints: EndpointConfig,
}

/// AJAX endpoint paths, relative to `base_url`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
    #[serde(default = "default_brand_list_path")]
    pub brand_list: String,

    #[serde(default = "default_model_list_path")]
    pub model_list: String,

    #[serde(default = "default_product_list_path")]
    pub product_list: String,
}

/// Politeness delay configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PolitenessConfig {
    /// Minimum spacing between any two requests (the rate gate interval).
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    /// Extra pause between sibling models of one brand.
    #[serde(default = "default_model_delay_ms")]
    pub model_delay_ms: u64,

    /// Extra pause between brands. Must be >= model_delay_ms.
    #[serde(default = "default_brand_delay_ms")]
    pub brand_delay_ms: u64,
}

/// Fragment extraction selector rules
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SelectorConfig {
    #[serde(default = "default_sku_selector")]
    pub sku_selector: String,

    /// Class substring identifying the enclosing product card.
    #[serde(default = "default_card_class_hint")]
    pub card_class_hint: String,

    #[serde(default = "default_name_selector")]
    pub name_selector: String,
}

/// Snapshot output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_user_agent() -> String {
    "fitment-crawler/0.1 (catalog compatibility research)".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_retry_base_ms() -> u64 {
    250
}
fn default_brand_list_path() -> String {
    "/ajax/vehicle/brands".to_string()
}
fn default_model_list_path() -> String {
    "/ajax/vehicle/models".to_string()
}
fn default_product_list_path() -> String {
    "/ajax/vehicle/products".to_string()
}
fn default_page_delay_ms() -> u64 {
    1500
}
fn default_jitter_ms() -> u64 {
    500
}
fn default_model_delay_ms() -> u64 {
    2000
}
fn default_brand_delay_ms() -> u64 {
    6000
}
fn default_sku_selector() -> String {
    "[class*='sku']".to_string()
}
fn default_card_class_hint() -> String {
    "product".to_string()
}
fn default_name_selector() -> String {
    "[class*='name']".to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("snapshots")
}
fn default_file_prefix() -> String {
    "fitment".to_string()
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
            retry_base_ms: default_retry_base_ms(),
            endpoints: EndpointConfig::default(),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            brand_list: default_brand_list_path(),
            model_list: default_model_list_path(),
            product_list: default_product_list_path(),
        }
    }
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            page_delay_ms: default_page_delay_ms(),
            jitter_ms: default_jitter_ms(),
            model_delay_ms: default_model_delay_ms(),
            brand_delay_ms: default_brand_delay_ms(),
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            sku_selector: default_sku_selector(),
            card_class_hint: default_card_class_hint(),
            name_selector: default_name_selector(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            file_prefix: default_file_prefix(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("FITMENT").separator("__"))
            .build()?;

        let app_cfg: AppConfig = cfg.try_deserialize().unwrap_or_else(|_| AppConfig::default());
        Ok(app_cfg)
    }

    /// Reject unusable configuration before any network call is made.
    pub fn validate(&self) -> Result<()> {
        if self.target.base_url.trim().is_empty() {
            bail!("target.base_url is not set (FITMENT__TARGET__BASE_URL or config/*.toml)");
        }
        Url::parse(&self.target.base_url)
            .map_err(|e| anyhow::anyhow!("target.base_url {:?}: {}", self.target.base_url, e))?;

        let endpoints = &self.target.endpoints;
        for (label, path) in [
            ("endpoints.brand_list", &endpoints.brand_list),
            ("endpoints.model_list", &endpoints.model_list),
            ("endpoints.product_list", &endpoints.product_list),
        ] {
            if path.trim().is_empty() {
                bail!("target.{} is empty", label);
            }
        }

        if self.selectors.sku_selector.trim().is_empty()
            || self.selectors.card_class_hint.trim().is_empty()
            || self.selectors.name_selector.trim().is_empty()
        {
            bail!(
                "selector strategy is incomplete: sku_selector, card_class_hint and name_selector are all required"
            );
        }

        if self.politeness.brand_delay_ms < self.politeness.model_delay_ms {
            bail!(
                "politeness.brand_delay_ms ({}) must be >= model_delay_ms ({})",
                self.politeness.brand_delay_ms,
                self.politeness.model_delay_ms
            );
        }

        Ok(())
    }
}
