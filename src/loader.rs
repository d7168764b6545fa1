use chrono::NaiveDate;

use crate::error::{ReportError, Result};
use crate::source::Table;
use crate::types::{StorageRecord, VisitRecord};
use crate::util::{parse_f64_safe, parse_flag, parse_i64_safe, parse_u64_safe};

// Canonical column name first, then the aliases produced by the upstream SQL.
const FACILITY: &[&str] = &["facility"];
const SITE_ID: &[&str] = &["site_id"];
const PROGRAM_ID: &[&str] = &["program_id"];
const MONTH: &[&str] = &["month", "Month_Date_Created"];
const YEAR: &[&str] = &["year", "Year_Date_Created"];
const VOIDED: &[&str] = &["voided"];
const COUNT: &[&str] = &["count", "Records"];

const SCHEMA_NAME: &[&str] = &["schema_name", "DB_name"];
const SIZE_MB: &[&str] = &["size_mb"];

struct Cell<'a> {
    table: &'a Table,
    row: usize,
    cells: &'a [String],
}

impl<'a> Cell<'a> {
    fn raw(&self, idx: usize) -> &'a str {
        self.cells.get(idx).map(String::as_str).unwrap_or("")
    }

    fn parse<T>(&self, idx: usize, parse: impl Fn(&str) -> Option<T>) -> Result<T> {
        let raw = self.raw(idx);
        parse(raw).ok_or_else(|| ReportError::InvalidValue {
            table: self.table.name().to_string(),
            row: self.row,
            column: self.table.headers()[idx].clone(),
            value: raw.to_string(),
        })
    }
}

/// Convert the visit result set into typed records.
///
/// Fails on the first missing column or malformed cell; rows are never
/// silently dropped, since that would break the totals downstream.
pub fn load_visits(table: &Table) -> Result<Vec<VisitRecord>> {
    let cols = table.require(&[FACILITY, SITE_ID, PROGRAM_ID, MONTH, YEAR, VOIDED, COUNT])?;
    let (facility, site_id, program_id) = (cols[0], cols[1], cols[2]);
    let (month, year, voided, count) = (cols[3], cols[4], cols[5], cols[6]);

    let mut out = Vec::with_capacity(table.len());
    for (i, cells) in table.rows().iter().enumerate() {
        let cell = Cell {
            table,
            row: i + 1,
            cells,
        };
        let y = cell.parse(year, |s| parse_i64_safe(s).and_then(|v| i32::try_from(v).ok()))?;
        // A (year, month) pair must name a real calendar month.
        let m = cell.parse(month, |s| {
            let m = u32::try_from(parse_i64_safe(s)?).ok()?;
            NaiveDate::from_ymd_opt(y, m, 1).map(|_| m)
        })?;
        out.push(VisitRecord {
            facility: cell.raw(facility).to_string(),
            site_id: cell.parse(site_id, parse_i64_safe)?,
            program_id: cell.parse(program_id, parse_i64_safe)?,
            month: m,
            year: y,
            voided: cell.parse(voided, parse_flag)?,
            count: cell.parse(count, parse_u64_safe)?,
        });
    }
    tracing::debug!(rows = out.len(), "loaded visit records");
    Ok(out)
}

/// Convert the storage result set, coercing every size to `f64`.
pub fn load_storage(table: &Table) -> Result<Vec<StorageRecord>> {
    let cols = table.require(&[SCHEMA_NAME, SIZE_MB])?;
    let (schema_name, size_mb) = (cols[0], cols[1]);

    let mut out = Vec::with_capacity(table.len());
    for (i, cells) in table.rows().iter().enumerate() {
        let cell = Cell {
            table,
            row: i + 1,
            cells,
        };
        out.push(StorageRecord {
            schema_name: cell.raw(schema_name).to_string(),
            size_mb: cell.parse(size_mb, |s| parse_f64_safe(s).filter(|v| *v >= 0.0))?,
        });
    }
    tracing::debug!(rows = out.len(), "loaded storage records");
    Ok(out)
}
