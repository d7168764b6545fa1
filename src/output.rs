use std::path::{Path, PathBuf};

use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::error::Result;
use crate::types::{HeadlineMetric, StorageReport, VisitReport};

pub const HEATMAP_FILE: &str = "visits_heatmap.csv";
pub const YEAR_TOTALS_FILE: &str = "visits_year_totals.csv";
pub const SPLIT_FILE: &str = "visits_voided_split.csv";
pub const RANKING_FILE: &str = "visits_top_facilities.csv";
pub const STORAGE_FILE: &str = "storage_top_schemas.csv";
pub const SUMMARY_FILE: &str = "summary.json";

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "wrote csv");
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    tracing::debug!(path = %path.display(), "wrote json");
    Ok(())
}

/// Write every tabular view of a visit report into `dir`.
pub fn write_visit_report(dir: &Path, report: &VisitReport) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let paths = vec![
        dir.join(HEATMAP_FILE),
        dir.join(YEAR_TOTALS_FILE),
        dir.join(SPLIT_FILE),
        dir.join(RANKING_FILE),
    ];
    write_csv(&paths[0], &report.heatmap)?;
    write_csv(&paths[1], &report.year_totals)?;
    write_csv(&paths[2], &report.split.rows)?;
    write_csv(&paths[3], &report.ranking)?;
    Ok(paths)
}

pub fn write_storage_report(dir: &Path, report: &StorageReport) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(STORAGE_FILE);
    write_csv(&path, &report.rows)?;
    Ok(path)
}

/// Markdown preview of the first `max_rows` rows.
pub fn render_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", render_table(rows, max_rows));
}

pub fn print_headline(metric: &HeadlineMetric) {
    println!("{}: {}", metric.label(), metric.display_value());
}
