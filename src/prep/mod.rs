//! Census data preparation: label normalization, row filtering, column
//! drops, outcome relabeling, one-hot encoding and the stratified split.

use crate::models::{ColumnKind, Dataset, PrepReport, RawTable, OUTCOME_LABELS};
use anyhow::{Context, Result, bail};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeSet;
use tracing::{debug, info};

pub struct PrepOptions {
    pub drop_columns: Vec<String>,
    pub sentinel_column: String,
    pub sentinel_value: f64,
}

enum CleanField {
    Num(f64),
    Cat(String),
}

/// Clean and encode the raw table into a dense dataset.
///
/// Rows carrying a missing marker (`?` or an empty field) are dropped, as
/// are rows whose sentinel column equals the configured sentinel value and
/// rows whose numeric fields fail to parse. The outcome is relabeled to
/// `under_50K` / `over_50K`; any other label aborts.
pub fn prepare(table: &RawTable, opts: &PrepOptions) -> Result<(Dataset, PrepReport)> {
    let schema = &table.schema;

    let sentinel_idx = schema
        .columns
        .iter()
        .position(|c| c.name == opts.sentinel_column)
        .with_context(|| format!("Sentinel column {:?} not in schema", opts.sentinel_column))?;

    // Columns that survive the drop list, in schema order.
    let kept: Vec<usize> = (0..schema.columns.len())
        .filter(|&i| !opts.drop_columns.iter().any(|d| *d == schema.columns[i].name))
        .collect();
    let columns_dropped: Vec<String> = schema
        .columns
        .iter()
        .filter(|c| opts.drop_columns.iter().any(|d| *d == c.name))
        .map(|c| c.name.clone())
        .collect();

    let outcome_idx = schema.columns.len();

    let mut rows_missing = 0usize;
    let mut rows_sentinel = 0usize;
    let mut rows_malformed = 0usize;
    let mut clean_rows: Vec<(Vec<CleanField>, u8)> = Vec::with_capacity(table.rows.len());
    // Observed level sets per kept categorical column, sorted for
    // deterministic feature ordering.
    let mut levels: Vec<BTreeSet<String>> = vec![BTreeSet::new(); kept.len()];

    'rows: for row in &table.rows {
        if row.iter().any(|f| f.trim() == "?" || f.trim().is_empty()) {
            rows_missing += 1;
            continue;
        }

        match row[sentinel_idx].trim().parse::<f64>() {
            Ok(v) if v == opts.sentinel_value => {
                rows_sentinel += 1;
                continue;
            }
            Ok(_) => {}
            Err(_) => {
                rows_malformed += 1;
                continue;
            }
        }

        let outcome = normalize_label(&row[outcome_idx]);
        let y = match outcome.as_str() {
            "<=50K" => 0u8,
            ">50K" => 1u8,
            other => bail!("Unknown outcome label {:?}", other),
        };

        let mut fields = Vec::with_capacity(kept.len());
        for (slot, &col) in kept.iter().enumerate() {
            let raw = row[col].trim();
            match schema.columns[col].kind {
                ColumnKind::Continuous => match raw.parse::<f64>() {
                    Ok(v) => fields.push(CleanField::Num(v)),
                    Err(_) => {
                        debug!("Unparseable {} value {:?} — row dropped", schema.columns[col].name, raw);
                        rows_malformed += 1;
                        continue 'rows;
                    }
                },
                ColumnKind::Categorical => {
                    let level = normalize_label(raw);
                    levels[slot].insert(level.clone());
                    fields.push(CleanField::Cat(level));
                }
            }
        }

        clean_rows.push((fields, y));
    }

    // Feature layout: continuous columns keep their name, categorical
    // columns expand into one indicator per observed level.
    let mut feature_names = Vec::new();
    for (slot, &col) in kept.iter().enumerate() {
        let spec = &schema.columns[col];
        match spec.kind {
            ColumnKind::Continuous => feature_names.push(spec.name.clone()),
            ColumnKind::Categorical => {
                for level in &levels[slot] {
                    feature_names.push(format!("{}={}", spec.name, level));
                }
            }
        }
    }

    let mut x = Vec::with_capacity(clean_rows.len());
    let mut y = Vec::with_capacity(clean_rows.len());
    let mut class_counts = [0usize; 2];

    for (fields, label) in clean_rows {
        let mut encoded = Vec::with_capacity(feature_names.len());
        for (slot, field) in fields.iter().enumerate() {
            match field {
                CleanField::Num(v) => encoded.push(*v),
                CleanField::Cat(level) => {
                    for candidate in &levels[slot] {
                        encoded.push(if candidate == level { 1.0 } else { 0.0 });
                    }
                }
            }
        }
        x.push(encoded);
        class_counts[label as usize] += 1;
        y.push(label);
    }

    let report = PrepReport {
        rows_in: table.rows.len(),
        rows_missing_dropped: rows_missing,
        rows_sentinel_dropped: rows_sentinel,
        rows_malformed_dropped: rows_malformed,
        columns_dropped,
        class_counts,
    };

    info!(
        "Prepared {} rows ({} {} / {} {}), {} features",
        report.rows_kept(),
        class_counts[0],
        OUTCOME_LABELS[0],
        class_counts[1],
        OUTCOME_LABELS[1],
        feature_names.len(),
    );

    Ok((
        Dataset {
            feature_names,
            x,
            y,
        },
        report,
    ))
}

/// Trim whitespace and a trailing period (the test split of the census
/// extract carries dotted outcome labels).
fn normalize_label(s: &str) -> String {
    s.trim().trim_end_matches('.').trim().to_string()
}

/// Seeded stratified train/test split preserving class proportions.
pub fn stratified_split(ds: &Dataset, test_fraction: f64, seed: u64) -> Result<(Dataset, Dataset)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        bail!("test_fraction must be in (0, 1), got {}", test_fraction);
    }
    if ds.is_empty() {
        bail!("Cannot split an empty dataset");
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut test_idx = Vec::new();
    let mut train_idx = Vec::new();

    for class in 0..2u8 {
        let mut pool: Vec<usize> = (0..ds.len()).filter(|&i| ds.y[i] == class).collect();
        pool.shuffle(&mut rng);

        let n_test = ((pool.len() as f64) * test_fraction).round() as usize;
        test_idx.extend(pool.iter().take(n_test).copied());
        train_idx.extend(pool.iter().skip(n_test).copied());
    }

    // Restore row order inside each partition so output is stable.
    train_idx.sort_unstable();
    test_idx.sort_unstable();

    Ok((subset(ds, &train_idx), subset(ds, &test_idx)))
}

fn subset(ds: &Dataset, idx: &[usize]) -> Dataset {
    Dataset {
        feature_names: ds.feature_names.clone(),
        x: idx.iter().map(|&i| ds.x[i].clone()).collect(),
        y: idx.iter().map(|&i| ds.y[i]).collect(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnSpec, Schema};

    fn schema() -> Schema {
        Schema {
            outcome_labels: vec![">50K", "<=50K"].into_iter().map(String::from).collect(),
            columns: vec![
                ColumnSpec {
                    name: "age".into(),
                    kind: ColumnKind::Continuous,
                },
                ColumnSpec {
                    name: "workclass".into(),
                    kind: ColumnKind::Categorical,
                },
                ColumnSpec {
                    name: "capital-gain".into(),
                    kind: ColumnKind::Continuous,
                },
                ColumnSpec {
                    name: "sex".into(),
                    kind: ColumnKind::Categorical,
                },
            ],
        }
    }

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    fn opts() -> PrepOptions {
        PrepOptions {
            drop_columns: vec!["sex".into()],
            sentinel_column: "capital-gain".into(),
            sentinel_value: 99999.0,
        }
    }

    fn table(rows: Vec<Vec<String>>) -> RawTable {
        RawTable {
            schema: schema(),
            rows,
        }
    }

    #[test]
    fn drops_missing_sentinel_and_listed_columns() {
        let table = table(vec![
            row(&["39", "Private", "2174", "Male", "<=50K"]),
            row(&["50", "?", "0", "Female", ">50K"]),
            row(&["42", "Private", "99999", "Male", ">50K"]),
            row(&["31", "Federal-gov", "14084", "Female", ">50K."]),
        ]);

        let (ds, report) = prepare(&table, &opts()).unwrap();

        assert_eq!(report.rows_in, 4);
        assert_eq!(report.rows_missing_dropped, 1);
        assert_eq!(report.rows_sentinel_dropped, 1);
        assert_eq!(report.rows_kept(), 2);
        assert_eq!(report.columns_dropped, vec!["sex".to_string()]);
        // age, capital-gain, workclass one-hot (2 observed levels); no sex.
        assert_eq!(
            ds.feature_names,
            vec![
                "age",
                "workclass=Federal-gov",
                "workclass=Private",
                "capital-gain"
            ]
        );
        assert!(ds.feature_names.iter().all(|f| !f.starts_with("sex")));
    }

    #[test]
    fn outcome_has_exactly_two_labels_and_no_missing_entries() {
        let table = table(vec![
            row(&["39", "Private", "0", "Male", "<=50K"]),
            row(&["40", "Private", "0", "Male", ">50K"]),
            row(&["41", "Private", "0", "Male", ">50K."]),
        ]);

        let (ds, report) = prepare(&table, &opts()).unwrap();

        assert_eq!(ds.y.len(), report.rows_kept());
        assert!(ds.y.iter().all(|&c| c == 0 || c == 1));
        assert_eq!(ds.class_counts(), [1, 2]);
    }

    #[test]
    fn unknown_outcome_label_aborts() {
        let table = table(vec![row(&["39", "Private", "0", "Male", "maybe"])]);
        assert!(prepare(&table, &opts()).is_err());
    }

    #[test]
    fn one_hot_encodes_observed_levels() {
        let table = table(vec![
            row(&["39", "Private", "0", "Male", "<=50K"]),
            row(&["40", "Federal-gov", "0", "Male", ">50K"]),
        ]);

        let (ds, _) = prepare(&table, &opts()).unwrap();

        let private = ds.feature_names.iter().position(|f| f == "workclass=Private").unwrap();
        assert_eq!(ds.x[0][private], 1.0);
        assert_eq!(ds.x[1][private], 0.0);
    }

    fn synthetic_dataset(n: usize, positive_every: usize) -> Dataset {
        let y: Vec<u8> = (0..n).map(|i| u8::from(i % positive_every == 0)).collect();
        Dataset {
            feature_names: vec!["f0".into()],
            x: (0..n).map(|i| vec![i as f64]).collect(),
            y,
        }
    }

    #[test]
    fn stratified_split_preserves_class_proportions() {
        let ds = synthetic_dataset(200, 4); // 25% positive
        let (train, test) = stratified_split(&ds, 0.25, 42).unwrap();

        assert_eq!(train.len() + test.len(), ds.len());

        let share = |d: &Dataset| d.class_counts()[1] as f64 / d.len() as f64;
        assert!((share(&train) - 0.25).abs() < 0.05);
        assert!((share(&test) - 0.25).abs() < 0.05);
    }

    #[test]
    fn split_is_reproducible_and_exhaustive() {
        let ds = synthetic_dataset(100, 3);
        let (train_a, test_a) = stratified_split(&ds, 0.3, 7).unwrap();
        let (train_b, test_b) = stratified_split(&ds, 0.3, 7).unwrap();

        assert_eq!(train_a.x, train_b.x);
        assert_eq!(test_a.y, test_b.y);

        // Every row lands in exactly one partition.
        let mut seen: Vec<f64> = train_a
            .x
            .iter()
            .chain(test_a.x.iter())
            .map(|r| r[0])
            .collect();
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let expected: Vec<f64> = (0..100).map(|i| i as f64).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn rejects_degenerate_test_fraction() {
        let ds = synthetic_dataset(10, 2);
        assert!(stratified_split(&ds, 0.0, 1).is_err());
        assert!(stratified_split(&ds, 1.0, 1).is_err());
    }
}
