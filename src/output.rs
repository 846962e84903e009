//! Output formatting and persistence for the tabular output files.

use anyhow::Result;
use csv::WriterBuilder;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::Path;
use tracing::debug;

use crate::record::DailyAggregate;

/// Writes `rows` to a CSV file at `path` with a header row, creating parent
/// directories as needed. Each run fully overwrites its target file; there
/// are no append semantics.
pub fn write_table<T: Serialize>(path: &str, rows: &[T]) -> Result<()> {
    debug!(path, rows = rows.len(), "writing table");

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Prints the end-of-run summary of the written air-quality table to
/// stdout: totals, per-city coverage, and per-parameter averages.
pub fn print_run_report(rows: &[DailyAggregate], output_path: &str) {
    if rows.is_empty() {
        println!("\nNo valid air-quality data was obtained.");
        return;
    }

    let mut per_city: BTreeMap<&str, (usize, &DailyAggregate, &DailyAggregate)> = BTreeMap::new();
    let mut per_parameter: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for row in rows {
        per_city
            .entry(row.city.as_str())
            .and_modify(|(count, first, last)| {
                *count += 1;
                if row.date < first.date {
                    *first = row;
                }
                if row.date > last.date {
                    *last = row;
                }
            })
            .or_insert((1, row, row));
        per_parameter
            .entry(row.parameter.as_str())
            .or_default()
            .push(row.value);
    }

    println!("\nAir-quality data saved to: {output_path}");
    println!("Total rows: {}", rows.len());

    println!("Cities with data ({}):", per_city.len());
    for (city, (count, first, last)) in &per_city {
        println!("  - {city}: {count} rows ({} to {})", first.date, last.date);
    }

    println!("Pollutants available:");
    for (parameter, values) in &per_parameter {
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        println!(
            "  - {}: {} rows (mean {:.1}, range {:.1}-{:.1})",
            parameter.to_uppercase(),
            values.len(),
            mean,
            min,
            max
        );
    }
}
