use crate::models::{CollegeRecord, RawSearchPage};
use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::warn;

/// The search page emits a fixed group of fact fragments per result. Any
/// other count means the page layout changed; we refuse to guess at the
/// alignment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error(
        "search page layout changed: {found} fact fragments for {titles} results \
         (expected {titles} x {per_result} = {expected})"
    )]
    FactCountMismatch {
        titles: usize,
        per_result: usize,
        expected: usize,
        found: usize,
    },
}

// ── Field parsers ─────────────────────────────────────────────────────────────

/// Parse a percentage: strip everything except digits, dot, minus.
/// "Acceptance Rate 23%" → 23.0 | "5.4%" → 5.4
pub fn parse_percent(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() || s == "N/A" || s == "-" || s == "—" {
        return None;
    }
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse().ok()
}

/// Parse a dollar amount: strip currency symbol and separators.
/// "Net Price $13,500 / year" → 13500.0
pub fn parse_currency(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() || s == "N/A" || s == "-" || s == "—" {
        return None;
    }
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse().ok()
}

/// Keep the "low-high" span of an SAT range fragment, dropping the label.
/// "SAT Range 1200-1400" → "1200-1400"
pub fn clean_sat_range(s: &str) -> Option<String> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let span = s[start..].trim();
    if span.contains('-') { Some(span.to_string()) } else { None }
}

// ── Grouping & assembly ───────────────────────────────────────────────────────

/// Reshape the flat fact list into one group per title, in page order.
///
/// The count is validated up front: `facts.len()` must equal
/// `titles * per_result` exactly, otherwise the groups would silently
/// misalign across records.
pub fn group_fact_fragments(
    facts: &[String],
    titles: usize,
    per_result: usize,
) -> Result<Vec<&[String]>, LayoutError> {
    let expected = titles * per_result;
    if facts.len() != expected {
        return Err(LayoutError::FactCountMismatch {
            titles,
            per_result,
            expected,
            found: facts.len(),
        });
    }
    if per_result == 0 {
        return Ok(Vec::new());
    }
    Ok(facts.chunks_exact(per_result).collect())
}

/// Turn one parsed page into cleaned records.
///
/// Fact order per result: grade, acceptance rate, net price, SAT range.
/// Unparseable numeric fields become `None`; a count mismatch is an error.
pub fn assemble_records(
    page: &RawSearchPage,
    per_result: usize,
    now: NaiveDateTime,
) -> Result<Vec<CollegeRecord>, LayoutError> {
    let groups = group_fact_fragments(&page.facts, page.titles.len(), per_result)?;

    let mut records = Vec::with_capacity(page.titles.len());
    for (title, facts) in page.titles.iter().zip(groups) {
        let record = CollegeRecord {
            name: title.clone(),
            grade: facts.first().cloned().unwrap_or_default(),
            acceptance_rate: facts.get(1).map(String::as_str).and_then(parse_percent),
            net_price: facts.get(2).map(String::as_str).and_then(parse_currency),
            sat_range: facts.get(3).map(String::as_str).and_then(clean_sat_range),
            scraped_at: now,
        };

        if record.acceptance_rate.is_none() && record.net_price.is_none() {
            warn!("{}: no numeric facts parsed", record.name);
        }

        records.push(record);
    }

    Ok(records)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
