use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ── Scraped college record ────────────────────────────────────────────────────

/// One institution from a search-results page, after cleanup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollegeRecord {
    pub name: String,
    /// Overall grade as shown on the site, e.g. "A+".
    pub grade: String,
    /// Acceptance rate in percent, e.g. 23.0.
    pub acceptance_rate: Option<f64>,
    /// Average annual net price in USD.
    pub net_price: Option<f64>,
    /// Middle-50% SAT span as text, e.g. "1200-1400".
    pub sat_range: Option<String>,
    pub scraped_at: NaiveDateTime,
}

/// Raw fragments pulled off one search page: titles and the flat fact list,
/// both in document order. Grouping happens in the cleaner, checked.
#[derive(Debug, Clone, Default)]
pub struct RawSearchPage {
    pub titles: Vec<String>,
    pub facts: Vec<String>,
}

// ── Census input ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Continuous,
    Categorical,
}

#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

/// Parsed companion names file: outcome labels plus ordered column specs.
/// The data file's trailing field is the outcome.
#[derive(Debug, Clone)]
pub struct Schema {
    pub outcome_labels: Vec<String>,
    pub columns: Vec<ColumnSpec>,
}

/// Verbatim string rows from the data file. Each row has one field per
/// schema column plus the trailing outcome label.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub schema: Schema,
    pub rows: Vec<Vec<String>>,
}

// ── Encoded dataset ───────────────────────────────────────────────────────────

/// Outcome labels after relabeling, indexed by class id.
pub const OUTCOME_LABELS: [&str; 2] = ["under_50K", "over_50K"];

/// Dense design matrix ready for tree fitting. Continuous columns carry
/// their parsed value; categorical columns become one-hot indicator
/// features named "column=level".
#[derive(Debug, Clone)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    /// Row-major feature matrix, rows aligned with `y`.
    pub x: Vec<Vec<f64>>,
    /// 0 = under_50K, 1 = over_50K.
    pub y: Vec<u8>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn class_counts(&self) -> [usize; 2] {
        let mut counts = [0usize; 2];
        for &label in &self.y {
            counts[label as usize] += 1;
        }
        counts
    }
}

/// What the preparation stage did to the raw table.
#[derive(Debug, Clone)]
pub struct PrepReport {
    pub rows_in: usize,
    pub rows_missing_dropped: usize,
    pub rows_sentinel_dropped: usize,
    pub rows_malformed_dropped: usize,
    pub columns_dropped: Vec<String>,
    pub class_counts: [usize; 2],
}

impl PrepReport {
    pub fn rows_kept(&self) -> usize {
        self.class_counts[0] + self.class_counts[1]
    }
}
