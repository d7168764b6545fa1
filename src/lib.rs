//! Visit analytics and server space reports.
//!
//! Rows come from a [`source::DataSource`], are typed by [`loader`], and are
//! turned into display-ready views by [`reports`]. Nothing below the binary
//! prints or touches the filesystem except [`output`] and [`source`].

pub mod aggregate;
pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod reports;
pub mod source;
pub mod types;
pub mod util;

pub use crate::config::ReportConfig;
pub use crate::error::{ReportError, Result};
pub use crate::source::{CsvSource, DataSource, Table};

use crate::types::{StorageReport, VisitRecord, VisitReport};

/// Fetch and type the visit rows for one render pass.
pub fn fetch_visits(source: &dyn DataSource) -> Result<Vec<VisitRecord>> {
    loader::load_visits(&source.fetch_visits()?)
}

/// Fetch, type, and rank storage rows in a single pass.
pub fn run_storage_report(source: &dyn DataSource, cfg: &ReportConfig) -> Result<StorageReport> {
    let rows = loader::load_storage(&source.fetch_storage()?)?;
    Ok(reports::generate_storage_report(&rows, cfg))
}

/// Fetch visits and build the report for `year`, or the latest year when
/// `year` is `None`.
///
/// With an explicit `year`, an empty dataset still yields a report whose
/// views are empty and whose headlines read zero. `Ok(None)` is returned
/// only when `year` is `None` and there are no rows to pick a year from.
pub fn run_visit_report(
    source: &dyn DataSource,
    year: Option<i32>,
    cfg: &ReportConfig,
) -> Result<Option<(Vec<VisitRecord>, VisitReport)>> {
    let rows = fetch_visits(source)?;
    let Some(year) = year.or_else(|| reports::default_year(&rows)) else {
        tracing::warn!("no visit rows; nothing to report");
        return Ok(None);
    };
    let report = reports::generate_visit_report(&rows, year, cfg)?;
    Ok(Some((rows, report)))
}
