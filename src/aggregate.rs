//! Cleaning, validation, and daily aggregation of normalized records.
//!
//! Each stage drops out-of-policy rows silently at the row level but logs
//! the surviving count, so a shrinking dataset is traceable from the logs.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::info;

use crate::record::{DailyAggregate, NormalizedRecord, Pollutant};

/// Pollutant concentrations at or beyond these bounds are treated as
/// sensor glitches and dropped.
const VALUE_MIN_EXCLUSIVE: f64 = 0.0;
const VALUE_MAX_EXCLUSIVE: f64 = 1000.0;

/// Cleans `records` and reduces them to one row per (date, city, parameter):
/// the arithmetic mean of the surviving values, rounded to 2 decimals, with
/// the first observed unit as representative.
///
/// `range` is the inclusive calendar window accepted into the output.
pub fn aggregate_daily(
    records: Vec<NormalizedRecord>,
    range: (NaiveDate, NaiveDate),
) -> Vec<DailyAggregate> {
    info!(records = records.len(), "aggregating records");
    if records.is_empty() {
        return Vec::new();
    }

    let records: Vec<_> = records
        .into_iter()
        .filter(|r| !r.date.is_empty() && r.value.is_finite())
        .collect();
    info!(records = records.len(), "after dropping incomplete rows");
    if records.is_empty() {
        return Vec::new();
    }

    let records: Vec<_> = records
        .into_iter()
        .filter(|r| r.value > VALUE_MIN_EXCLUSIVE && r.value < VALUE_MAX_EXCLUSIVE)
        .collect();
    info!(records = records.len(), "after value sanity filter");
    if records.is_empty() {
        return Vec::new();
    }

    let mut dated: Vec<(NaiveDate, NormalizedRecord)> = records
        .into_iter()
        .filter_map(|r| {
            NaiveDate::parse_from_str(&r.date, "%Y-%m-%d")
                .ok()
                .map(|d| (d, r))
        })
        .collect();
    info!(records = dated.len(), "after date parse");

    let (start, end) = range;
    dated.retain(|(d, _)| *d >= start && *d <= end);
    info!(records = dated.len(), "after date range filter");
    if dated.is_empty() {
        return Vec::new();
    }

    // BTreeMap keeps the output sorted by (date, city, parameter), so the
    // written table is stable across runs.
    let mut groups: BTreeMap<(NaiveDate, String, Pollutant), (f64, usize, String)> =
        BTreeMap::new();
    for (date, record) in dated {
        let NormalizedRecord {
            city,
            parameter,
            value,
            unit,
            ..
        } = record;
        let entry = groups
            .entry((date, city, parameter))
            .or_insert((0.0, 0, unit));
        entry.0 += value;
        entry.1 += 1;
    }

    let aggregates: Vec<DailyAggregate> = groups
        .into_iter()
        .map(|((date, city, parameter), (sum, count, unit))| DailyAggregate {
            date,
            city,
            parameter,
            value: round2(sum / count as f64),
            unit,
        })
        .collect();

    info!(rows = aggregates.len(), "daily aggregation complete");
    aggregates
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
