//! Pipeline orchestrators for the two independent runs.
//!
//! ## Scrape run
//!
//! `run_scrape()`:
//!   1. Check the site's crawl policy (robots.txt) unless disabled
//!   2. Fetch search pages 1..=N sequentially → assemble cleaned records
//!   3. Print the concatenated table, optionally export CSV / JSON
//!
//! ## Training run
//!
//! `run_training()` walks the census modeling sequence top to bottom:
//! load → prepare → stratified split → default tree → overfit tree →
//! CV-pruned tree → mtry grid-searched forest → held-out ROC comparison.
//! Everything is seeded, so a re-run reproduces the same models.

use crate::config::AppConfig;
use crate::learn::forest::{ForestParams, RandomForest};
use crate::learn::grid::{default_mtry_grid, search_mtry};
use crate::learn::metrics::{accuracy, auc, confusion_at, roc_curve};
use crate::learn::prune::{alpha_candidates, choose_alpha_by_cv, cost_complexity_path, prune};
use crate::learn::tree::{DecisionTree, TreeParams};
use crate::loader;
use crate::models::{Dataset, PrepReport};
use crate::prep::{self, PrepOptions};
use crate::report;
use crate::scraper::{RankingSiteScraper, SearchSource};
use anyhow::{Context, Result, bail};
use std::path::Path;
use tracing::info;

// ── Scrape pipeline ───────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ScrapeStats {
    pub pages_requested: u32,
    pub records: usize,
}

pub async fn run_scrape(
    config: &AppConfig,
    pages: u32,
    out: Option<&Path>,
    json: bool,
) -> Result<ScrapeStats> {
    let scraper = RankingSiteScraper::new(&config.scraper).context("Failed to build scraper")?;

    if config.scraper.respect_robots {
        info!("=== Step 1: Checking crawl policy ===");
        let permitted = scraper
            .crawl_permitted()
            .await
            .context("robots.txt check failed")?;
        if !permitted {
            bail!(
                "Crawl policy disallows {} — aborting",
                config.scraper.base_url
            );
        }
    }

    info!("=== Step 2: Fetching up to {} search pages ===", pages);
    let records = scraper.fetch_records(pages).await?;

    print!("{}", report::format_college_table(&records));

    if let Some(path) = out {
        loader::export_records_csv(path, &records)?;
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    }

    Ok(ScrapeStats {
        pages_requested: pages,
        records: records.len(),
    })
}

// ── Modeling pipeline ─────────────────────────────────────────────────────────

fn load_and_prepare(
    config: &AppConfig,
    data: Option<&Path>,
    names: Option<&Path>,
) -> Result<(Dataset, PrepReport)> {
    let names_path = names.unwrap_or(&config.data.names_path);
    let data_path = data.unwrap_or(&config.data.data_path);

    let schema = loader::load_schema(names_path)?;
    let table = loader::load_table(data_path, &schema)?;

    let opts = PrepOptions {
        drop_columns: config.data.drop_columns.clone(),
        sentinel_column: config.data.sentinel_column.clone(),
        sentinel_value: config.data.sentinel_value,
    };

    prep::prepare(&table, &opts)
}

pub fn run_inspect(config: &AppConfig, data: Option<&Path>, names: Option<&Path>) -> Result<()> {
    let (dataset, prep_report) = load_and_prepare(config, data, names)?;
    print!("{}", report::format_prep_summary(&prep_report));
    info!("{} encoded features", dataset.n_features());
    Ok(())
}

pub fn run_training(config: &AppConfig, data: Option<&Path>, names: Option<&Path>) -> Result<()> {
    let m = &config.model;

    info!("=== Step 1: Load & prepare census data ===");
    let (dataset, prep_report) = load_and_prepare(config, data, names)?;
    print!("{}", report::format_prep_summary(&prep_report));

    info!("=== Step 2: Stratified split ===");
    let (train, test) =
        prep::stratified_split(&dataset, config.data.test_fraction, config.data.split_seed)?;
    info!(
        "{} train rows / {} test rows, {} features",
        train.len(),
        test.len(),
        train.n_features()
    );

    info!("=== Step 3: Classification tree (default stopping) ===");
    let default_params = TreeParams {
        max_depth: None,
        min_samples_split: m.min_samples_split,
        min_samples_leaf: m.min_samples_leaf,
        min_gain: m.min_gain,
    };
    let default_tree = DecisionTree::fit(&train.x, &train.y, &default_params)?;
    info!(
        "Default tree: {} leaves, depth {}",
        default_tree.leaf_count(),
        default_tree.depth()
    );
    print!(
        "{}",
        report::format_tree_structure(&default_tree, &train.feature_names, 3)
    );

    info!("=== Step 4: Overfit tree (permissive stopping) ===");
    let overfit_params = TreeParams::overfit(m.overfit_max_depth);
    let overfit_tree = DecisionTree::fit(&train.x, &train.y, &overfit_params)?;
    info!(
        "Overfit tree: {} leaves, depth {}",
        overfit_tree.leaf_count(),
        overfit_tree.depth()
    );

    info!(
        "=== Step 5: Cost-complexity pruning ({}-fold CV) ===",
        m.cv_folds
    );
    let path = cost_complexity_path(&overfit_tree);
    let alphas = alpha_candidates(&path);
    info!(
        "{} path steps, {} alpha candidates",
        path.len(),
        alphas.len()
    );
    let cv = choose_alpha_by_cv(
        &train.x,
        &train.y,
        &overfit_params,
        &alphas,
        m.cv_folds,
        m.model_seed,
    )?;
    print!("{}", report::format_cv_table(&cv));

    let pruned_tree = prune(&overfit_tree, cv.best_alpha);
    info!(
        "Pruned at alpha {:.6}: {} leaves (from {})",
        cv.best_alpha,
        pruned_tree.leaf_count(),
        overfit_tree.leaf_count()
    );
    print!(
        "{}",
        report::format_tree_structure(&pruned_tree, &train.feature_names, 3)
    );

    info!("=== Step 6: Random forest mtry grid search ===");
    let base = ForestParams {
        n_trees: m.n_trees,
        mtry: 1,
        tree: TreeParams::overfit(m.overfit_max_depth),
        seed: m.model_seed,
    };
    let grid = if m.mtry_grid.is_empty() {
        default_mtry_grid(train.n_features())
    } else {
        m.mtry_grid.clone()
    };
    let search = search_mtry(&train.x, &train.y, &base, &grid, m.cv_folds, m.model_seed)?;
    print!("{}", report::format_grid_table(&search));

    info!("Refitting final forest with mtry={}", search.best_mtry);
    let final_params = ForestParams {
        mtry: search.best_mtry,
        ..base.clone()
    };
    let forest = RandomForest::fit(&train.x, &train.y, &final_params)?;

    info!("=== Step 7: Held-out ROC evaluation ===");
    let tree_scores: Vec<f64> = test.x.iter().map(|r| pruned_tree.predict_proba(r)).collect();
    let forest_scores: Vec<f64> = test.x.iter().map(|r| forest.predict_proba(r)).collect();

    let tree_roc = roc_curve(&tree_scores, &test.y)?;
    let forest_roc = roc_curve(&forest_scores, &test.y)?;

    let comparison = [
        report::ModelScore {
            label: "pruned tree".to_string(),
            auc: auc(&tree_roc),
            accuracy: accuracy(&confusion_at(&tree_scores, &test.y, 0.5)),
        },
        report::ModelScore {
            label: "random forest".to_string(),
            auc: auc(&forest_roc),
            accuracy: accuracy(&confusion_at(&forest_scores, &test.y, 0.5)),
        },
    ];
    print!("{}", report::format_model_comparison(&comparison));
    print!(
        "{}",
        report::render_roc_plot(
            &[("pruned tree", &tree_roc), ("random forest", &forest_roc)],
            64,
            24,
        )
    );

    Ok(())
}
