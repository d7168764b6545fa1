//! Data access: tabular result sets and the handles that produce them.
//!
//! A [`DataSource`] is passed explicitly to each report run. Implementations
//! acquire whatever they need inside a fetch and release it before returning,
//! so no connection outlives a single render.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;

use crate::error::{ReportError, Result};

/// A fetched result set. Columns are addressed by name, never by position.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    headers: Vec<String>,
    indices: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let headers: Vec<String> = headers.into_iter().map(|h| h.trim().to_string()).collect();
        let indices = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), i))
            .collect();
        Self {
            name: name.into(),
            headers,
            indices,
            rows,
        }
    }

    /// Read a CSV document with a header line.
    pub fn from_csv_reader<R: Read>(name: impl Into<String>, reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }
        Ok(Self::new(name, headers, rows))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first header matching any of `names`.
    pub fn column(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|n| self.indices.get(*n).copied())
    }

    /// Resolve every required column or fail with all missing names at once.
    ///
    /// Each entry is a canonical name followed by accepted aliases.
    pub fn require(&self, columns: &[&[&str]]) -> Result<Vec<usize>> {
        let mut found = Vec::with_capacity(columns.len());
        let mut missing = Vec::new();
        for names in columns {
            match self.column(names) {
                Some(i) => found.push(i),
                None => missing.push(names[0].to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(ReportError::SchemaMismatch {
                table: self.name.clone(),
                missing,
            });
        }
        Ok(found)
    }
}

/// Handle to the upstream store for one report run.
pub trait DataSource {
    fn fetch_visits(&self) -> Result<Table>;
    fn fetch_storage(&self) -> Result<Table>;
}

/// Reads the two upstream queries from CSV exports.
#[derive(Debug, Clone)]
pub struct CsvSource {
    pub visits_path: PathBuf,
    pub storage_path: PathBuf,
}

impl CsvSource {
    pub fn new(visits_path: impl Into<PathBuf>, storage_path: impl Into<PathBuf>) -> Self {
        Self {
            visits_path: visits_path.into(),
            storage_path: storage_path.into(),
        }
    }

    fn read(name: &str, path: &Path) -> Result<Table> {
        // File handle is dropped when this returns.
        let file = std::fs::File::open(path)?;
        let table = Table::from_csv_reader(name, std::io::BufReader::new(file))?;
        tracing::debug!(table = name, path = %path.display(), rows = table.len(), "fetched table");
        if table.is_empty() {
            tracing::warn!(table = name, path = %path.display(), "fetched table has no rows");
        }
        Ok(table)
    }
}

impl DataSource for CsvSource {
    fn fetch_visits(&self) -> Result<Table> {
        Self::read("visits", &self.visits_path)
    }

    fn fetch_storage(&self) -> Result<Table> {
        Self::read("storage", &self.storage_path)
    }
}
