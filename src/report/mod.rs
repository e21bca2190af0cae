//! Formatted terminal output: tables, tree structure prints, and the
//! ASCII ROC overlay plot.
//!
//! Formatting stays in one place so the scraping/learning code remains
//! clean and the deterministic plot output can be snapshot-asserted.

use crate::learn::grid::GridSearch;
use crate::learn::metrics::RocPoint;
use crate::learn::prune::CvOutcome;
use crate::learn::tree::{DecisionTree, Node};
use crate::models::{CollegeRecord, PrepReport, OUTCOME_LABELS};
use crate::utils::{fmt_number, fmt_pct, fmt_usd};

const RULE: &str = "──────────────────────────────────────────────";

/// Glyphs assigned to ROC curves in overlay order.
const CURVE_GLYPHS: [char; 4] = ['o', 'x', '+', '*'];

// ── Scrape output ─────────────────────────────────────────────────────────────

pub fn format_college_table(records: &[CollegeRecord]) -> String {
    let name_width = records
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(4)
        .clamp(4, 44);

    let mut out = String::new();
    out.push_str(&format!(
        "{:<name_width$}  {:>5}  {:>7}  {:>10}  {:>9}\n",
        "Name", "Grade", "Accept", "Net price", "SAT"
    ));

    for r in records {
        let mut name = r.name.clone();
        if name.chars().count() > name_width {
            name = name.chars().take(name_width - 1).collect();
            name.push('…');
        }
        out.push_str(&format!(
            "{:<name_width$}  {:>5}  {:>7}  {:>10}  {:>9}\n",
            name,
            r.grade,
            fmt_pct(r.acceptance_rate),
            fmt_usd(r.net_price),
            r.sat_range.as_deref().unwrap_or("—"),
        ));
    }

    out
}

// ── Modeling output ───────────────────────────────────────────────────────────

pub fn format_prep_summary(report: &PrepReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", RULE));
    out.push_str("  campus-scout — Census preparation\n");
    out.push_str(&format!("{}\n", RULE));
    out.push_str(&format!("  Rows in           : {}\n", fmt_number(report.rows_in as i64)));
    out.push_str(&format!(
        "  Missing dropped   : {}\n",
        fmt_number(report.rows_missing_dropped as i64)
    ));
    out.push_str(&format!(
        "  Sentinel dropped  : {}\n",
        fmt_number(report.rows_sentinel_dropped as i64)
    ));
    out.push_str(&format!(
        "  Malformed dropped : {}\n",
        fmt_number(report.rows_malformed_dropped as i64)
    ));
    out.push_str(&format!("  Columns dropped   : {}\n", report.columns_dropped.join(", ")));
    out.push_str(&format!(
        "  Kept              : {} ({} {} / {} {})\n",
        fmt_number(report.rows_kept() as i64),
        fmt_number(report.class_counts[0] as i64),
        OUTCOME_LABELS[0],
        fmt_number(report.class_counts[1] as i64),
        OUTCOME_LABELS[1],
    ));
    out.push_str(&format!("{}\n", RULE));
    out
}

/// Illustrative print of the top of a fitted tree.
pub fn format_tree_structure(
    tree: &DecisionTree,
    feature_names: &[String],
    max_depth: usize,
) -> String {
    let mut out = String::new();
    walk_node(&tree.root, feature_names, 0, max_depth, &mut out);
    out
}

fn walk_node(
    node: &Node,
    feature_names: &[String],
    depth: usize,
    max_depth: usize,
    out: &mut String,
) {
    let indent = "  ".repeat(depth);
    match &node.split {
        None => {
            out.push_str(&format!(
                "{}leaf: p({})={:.3} (n={})\n",
                indent,
                OUTCOME_LABELS[1],
                node.prob(),
                node.total()
            ));
        }
        Some(_) if depth >= max_depth => {
            out.push_str(&format!(
                "{}… subtree (n={}, p({})={:.3})\n",
                indent,
                node.total(),
                OUTCOME_LABELS[1],
                node.prob()
            ));
        }
        Some(split) => {
            let feature = feature_names
                .get(split.feature)
                .map(String::as_str)
                .unwrap_or("?");
            out.push_str(&format!(
                "{}{} <= {:.3} (n={})\n",
                indent,
                feature,
                split.threshold,
                node.total()
            ));
            walk_node(&split.left, feature_names, depth + 1, max_depth, out);
            walk_node(&split.right, feature_names, depth + 1, max_depth, out);
        }
    }
}

pub fn format_cv_table(outcome: &CvOutcome) -> String {
    let mut out = String::new();
    out.push_str("  alpha        CV error\n");
    for point in &outcome.points {
        let marker = if point.alpha == outcome.best_alpha {
            "  <- selected"
        } else {
            ""
        };
        out.push_str(&format!(
            "  {:<11.6}  {:.4}{}\n",
            point.alpha, point.mean_error, marker
        ));
    }
    out
}

pub fn format_grid_table(search: &GridSearch) -> String {
    let mut out = String::new();
    out.push_str("  mtry   mean AUC   per-fold\n");
    for point in &search.points {
        let folds = point
            .fold_aucs
            .iter()
            .map(|a| format!("{:.3}", a))
            .collect::<Vec<_>>()
            .join(" ");
        let marker = if point.mtry == search.best_mtry {
            "  <- selected"
        } else {
            ""
        };
        out.push_str(&format!(
            "  {:<5}  {:.4}     {}{}\n",
            point.mtry, point.mean_auc, folds, marker
        ));
    }
    out
}

pub struct ModelScore {
    pub label: String,
    pub auc: f64,
    pub accuracy: f64,
}

pub fn format_model_comparison(scores: &[ModelScore]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", RULE));
    out.push_str("  Held-out comparison\n");
    out.push_str(&format!("{}\n", RULE));
    out.push_str("  model            AUC      accuracy\n");
    for s in scores {
        out.push_str(&format!(
            "  {:<15}  {:.4}   {:.4}\n",
            s.label, s.auc, s.accuracy
        ));
    }
    out.push_str(&format!("{}\n", RULE));
    out
}

// ── ASCII ROC plot ────────────────────────────────────────────────────────────

/// Render an overlay plot of ROC curves on a fixed-size character grid.
///
/// Deliberately dumb and deterministic: false-positive rate runs left to
/// right, true-positive rate bottom to top, the chance diagonal is dotted,
/// and each curve gets its own glyph. Later curves overdraw earlier ones.
pub fn render_roc_plot(curves: &[(&str, &[RocPoint])], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let mut grid = vec![vec![' '; width]; height];

    // Chance diagonal first so curves overlay it.
    for col in 0..width {
        let u = col as f64 / (width as f64 - 1.0);
        grid[map_y(u, height)][col] = '.';
    }

    for (k, (_, points)) in curves.iter().enumerate() {
        let glyph = CURVE_GLYPHS[k % CURVE_GLYPHS.len()];
        for col in 0..width {
            let fpr = col as f64 / (width as f64 - 1.0);
            let tpr = tpr_at(points, fpr);
            grid[map_y(tpr, height)][col] = glyph;
        }
    }

    let legend = curves
        .iter()
        .enumerate()
        .map(|(k, (label, _))| format!("{} {}", CURVE_GLYPHS[k % CURVE_GLYPHS.len()], label))
        .collect::<Vec<_>>()
        .join(" | ");

    let mut out = String::new();
    out.push_str(&format!(
        "ROC: x = false positive rate, y = true positive rate | {}\n",
        legend
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

/// Linear interpolation of tpr at a given fpr along a ROC polyline.
fn tpr_at(points: &[RocPoint], fpr: f64) -> f64 {
    let Some(mut prev) = points.first().copied() else {
        return 0.0;
    };
    for p in &points[1..] {
        if p.fpr >= fpr {
            let span = p.fpr - prev.fpr;
            if span <= f64::EPSILON {
                // Vertical climb: take the top of the step.
                return p.tpr;
            }
            let w = (fpr - prev.fpr) / span;
            return prev.tpr + w * (p.tpr - prev.tpr);
        }
        prev = *p;
    }
    points.last().map(|p| p.tpr).unwrap_or(0.0)
}

fn map_y(tpr: f64, height: usize) -> usize {
    let row = ((1.0 - tpr) * (height as f64 - 1.0)).round();
    (row as usize).min(height - 1)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn college_table_has_header_and_one_line_per_record() {
        let records = vec![CollegeRecord {
            name: "Example State University".into(),
            grade: "A+".into(),
            acceptance_rate: Some(23.0),
            net_price: Some(13500.0),
            sat_range: Some("1200-1400".into()),
            scraped_at: Utc::now().naive_utc(),
        }];

        let table = format_college_table(&records);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Net price"));
        assert!(lines[1].contains("$13,500"));
        assert!(lines[1].contains("23%"));
    }

    #[test]
    fn roc_plot_is_deterministic_and_sized() {
        // Perfect classifier: straight to (0, 1), then across.
        let perfect = [
            RocPoint {
                threshold: f64::INFINITY,
                fpr: 0.0,
                tpr: 0.0,
            },
            RocPoint {
                threshold: 0.9,
                fpr: 0.0,
                tpr: 1.0,
            },
            RocPoint {
                threshold: 0.1,
                fpr: 1.0,
                tpr: 1.0,
            },
        ];

        let a = render_roc_plot(&[("tree", &perfect)], 20, 10);
        let b = render_roc_plot(&[("tree", &perfect)], 20, 10);
        assert_eq!(a, b);

        let lines: Vec<&str> = a.lines().collect();
        assert_eq!(lines.len(), 11); // header + grid rows
        assert!(lines[0].contains("o tree"));
        // The whole curve sits on the top row.
        assert!(lines[1].chars().filter(|&c| c == 'o').count() >= 19);
    }

    #[test]
    fn roc_plot_overlays_two_curves_with_distinct_glyphs() {
        let diag = [
            RocPoint {
                threshold: f64::INFINITY,
                fpr: 0.0,
                tpr: 0.0,
            },
            RocPoint {
                threshold: 0.5,
                fpr: 1.0,
                tpr: 1.0,
            },
        ];

        let plot = render_roc_plot(&[("tree", &diag), ("forest", &diag)], 16, 8);
        assert!(plot.contains("o tree"));
        assert!(plot.contains("x forest"));
        // Second curve overdraws the first on identical points.
        assert!(plot.contains('x'));
    }
}
