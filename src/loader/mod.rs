//! Census file loading (data + companion names file) and CSV export of the
//! scraped college table.

use crate::models::{CollegeRecord, ColumnKind, ColumnSpec, RawTable, Schema};
use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

// ── Names file → schema ───────────────────────────────────────────────────────

/// Parse the companion names file.
///
/// Comment lines start with `|`. The first payload line lists the outcome
/// labels ("...>50K, <=50K."); each following "name: spec." line describes a
/// column, where a spec of `continuous` marks a numeric column and anything
/// else is a categorical level list.
pub fn parse_schema<R: BufRead>(reader: R) -> Result<Schema> {
    let mut outcome_labels: Option<Vec<String>> = None;
    let mut columns = Vec::new();

    for line in reader.lines() {
        let line = line.context("Failed to read names file")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('|') {
            continue;
        }

        match line.split_once(':') {
            Some((name, spec)) => {
                let kind = if spec.trim().trim_end_matches('.').trim() == "continuous" {
                    ColumnKind::Continuous
                } else {
                    ColumnKind::Categorical
                };
                columns.push(ColumnSpec {
                    name: name.trim().to_string(),
                    kind,
                });
            }
            None if outcome_labels.is_none() => {
                let labels: Vec<String> = line
                    .trim_end_matches('.')
                    .split(',')
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty())
                    .collect();
                outcome_labels = Some(labels);
            }
            None => {}
        }
    }

    let outcome_labels = outcome_labels.context("Names file has no outcome label line")?;
    if outcome_labels.len() != 2 {
        bail!("Expected 2 outcome labels, found {}", outcome_labels.len());
    }
    if columns.is_empty() {
        bail!("Names file describes no columns");
    }

    Ok(Schema {
        outcome_labels,
        columns,
    })
}

pub fn load_schema(path: &Path) -> Result<Schema> {
    let file =
        File::open(path).with_context(|| format!("Failed to open names file {:?}", path))?;
    parse_schema(BufReader::new(file))
}

// ── Data file → raw table ─────────────────────────────────────────────────────

/// Read the header-less, comma-delimited data file against a schema.
/// Rows with an unexpected field count are skipped with a warning.
pub fn read_table<R: io::Read>(reader: R, schema: &Schema) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let expected_fields = schema.columns.len() + 1;
    let mut rows = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Row {}: {}", i + 1, e);
                continue;
            }
        };

        if record.len() != expected_fields {
            // Trailing blank lines and stray notes show up as short records.
            if record.iter().any(|f| !f.is_empty()) {
                warn!(
                    "Row {}: {} fields (expected {}) — skipped",
                    i + 1,
                    record.len(),
                    expected_fields
                );
            }
            continue;
        }

        rows.push(record.iter().map(|f| f.to_string()).collect());
    }

    Ok(RawTable {
        schema: schema.clone(),
        rows,
    })
}

pub fn load_table(data_path: &Path, schema: &Schema) -> Result<RawTable> {
    let file = File::open(data_path)
        .with_context(|| format!("Failed to open data file {:?}", data_path))?;
    let table = read_table(file, schema)?;
    info!("{:?}: {} rows loaded", data_path, table.rows.len());
    Ok(table)
}

// ── College table → CSV ───────────────────────────────────────────────────────

pub fn write_records_csv<W: io::Write>(writer: W, records: &[CollegeRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["name", "grade", "acceptance_rate", "net_price", "sat_range"])?;

    for r in records {
        wtr.write_record([
            r.name.as_str(),
            r.grade.as_str(),
            &r.acceptance_rate.map(|v| v.to_string()).unwrap_or_default(),
            &r.net_price.map(|v| v.to_string()).unwrap_or_default(),
            r.sat_range.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn export_records_csv(path: &Path, records: &[CollegeRecord]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    write_records_csv(file, records)?;
    info!("Wrote {} records to {:?}", records.len(), path);
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
