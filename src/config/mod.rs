use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub scraper: ScraperConfig,
    pub data: DataConfig,
    pub model: ModelConfig,
}

/// Scraper configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// CSS selector for the institution title on a result card.
    #[serde(default = "default_title_selector")]
    pub title_selector: String,

    /// CSS selector for the fact values under each result card.
    #[serde(default = "default_fact_selector")]
    pub fact_selector: String,

    /// The page emits this many fact fragments per result.
    #[serde(default = "default_facts_per_result")]
    pub facts_per_result: usize,

    /// Check robots.txt before fetching any search page.
    #[serde(default = "default_true")]
    pub respect_robots: bool,
}

/// Census data configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    #[serde(default = "default_names_path")]
    pub names_path: PathBuf,

    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,

    #[serde(default = "default_split_seed")]
    pub split_seed: u64,

    /// Columns removed before encoding.
    #[serde(default = "default_drop_columns")]
    pub drop_columns: Vec<String>,

    /// Rows where this column equals the sentinel are discarded.
    #[serde(default = "default_sentinel_column")]
    pub sentinel_column: String,

    #[serde(default = "default_sentinel_value")]
    pub sentinel_value: f64,
}

/// Model configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,

    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,

    #[serde(default = "default_min_gain")]
    pub min_gain: f64,

    /// Depth cap for the deliberately overfit tree.
    #[serde(default = "default_overfit_max_depth")]
    pub overfit_max_depth: usize,

    #[serde(default = "default_n_trees")]
    pub n_trees: usize,

    #[serde(default = "default_cv_folds")]
    pub cv_folds: usize,

    /// Explicit mtry candidates; empty means derive from sqrt(features).
    #[serde(default)]
    pub mtry_grid: Vec<usize>,

    #[serde(default = "default_model_seed")]
    pub model_seed: u64,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "https://www.niche.com/colleges/search/best-colleges/".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    "campus-scout/0.1 (research project; college outcomes study)".to_string()
}
fn default_title_selector() -> String {
    "h2.search-result__title".to_string()
}
fn default_fact_selector() -> String {
    ".search-result-fact__value".to_string()
}
fn default_facts_per_result() -> usize {
    4
}
fn default_true() -> bool {
    true
}
fn default_data_path() -> PathBuf {
    PathBuf::from("data/adult.data")
}
fn default_names_path() -> PathBuf {
    PathBuf::from("data/adult.names")
}
fn default_test_fraction() -> f64 {
    0.25
}
fn default_split_seed() -> u64 {
    42
}
fn default_drop_columns() -> Vec<String> {
    vec![
        "fnlwgt".to_string(),
        "education-num".to_string(),
        "native-country".to_string(),
    ]
}
fn default_sentinel_column() -> String {
    "capital-gain".to_string()
}
fn default_sentinel_value() -> f64 {
    99999.0
}
fn default_min_samples_split() -> usize {
    20
}
fn default_min_samples_leaf() -> usize {
    7
}
fn default_min_gain() -> f64 {
    1e-3
}
fn default_overfit_max_depth() -> usize {
    30
}
fn default_n_trees() -> usize {
    200
}
fn default_cv_folds() -> usize {
    5
}
fn default_model_seed() -> u64 {
    1337
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
            .add_source(config::Environment::with_prefix("CAMPUS").separator("__"))
            .build()?;

        let app_cfg: AppConfig = cfg.try_deserialize().unwrap_or_else(|_| AppConfig::default());
        Ok(app_cfg)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scraper: ScraperConfig {
                base_url: default_base_url(),
                timeout_secs: default_timeout_secs(),
                user_agent: default_user_agent(),
                title_selector: default_title_selector(),
                fact_selector: default_fact_selector(),
                facts_per_result: default_facts_per_result(),
                respect_robots: true,
            },
            data: DataConfig {
                data_path: default_data_path(),
                names_path: default_names_path(),
                test_fraction: default_test_fraction(),
                split_seed: default_split_seed(),
                drop_columns: default_drop_columns(),
                sentinel_column: default_sentinel_column(),
                sentinel_value: default_sentinel_value(),
            },
            model: ModelConfig {
                min_samples_split: default_min_samples_split(),
                min_samples_leaf: default_min_samples_leaf(),
                min_gain: default_min_gain(),
                overfit_max_depth: default_overfit_max_depth(),
                n_trees: default_n_trees(),
                cv_folds: default_cv_folds(),
                mtry_grid: Vec::new(),
                model_seed: default_model_seed(),
            },
        }
    }
}
