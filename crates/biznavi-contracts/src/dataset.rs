//! The tabular sales dataset as seen by the tools.
//!
//! Cells are kept as strings exactly as ingested; typed readings (numbers,
//! dates) are done on access so a tool can group by any column, including
//! ones this crate has never heard of. Tools receive a dataset behind an
//! `Arc` and only ever read it.

use std::{fmt, path::PathBuf, sync::Arc};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DATE_COLUMN: &str = "Date";
pub const CATEGORY_COLUMN: &str = "Category";
pub const STATUS_COLUMN: &str = "Status";
pub const AMOUNT_COLUMN: &str = "Amount";
pub const QUANTITY_COLUMN: &str = "Qty";

/// Date layouts accepted in the date column, tried in order.
///
/// Month-first layouts come first: the sales export writes `04-30-22`, and
/// `%Y-%m-%d` would otherwise read `04-05-22` as the year 4.
const DATE_FORMATS: &[&str] = &["%m-%d-%y", "%m-%d-%Y", "%m/%d/%y", "%m/%d/%Y", "%Y-%m-%d"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|cells| Row { cells })
    }

    /// Find a column by name, ignoring ASCII case and surrounding whitespace.
    pub fn resolve_column(&self, name: &str) -> Option<usize> {
        let wanted = name.trim();
        self.columns
            .iter()
            .position(|c| c.trim().eq_ignore_ascii_case(wanted))
    }

    /// The header exactly as it appears in the source.
    pub fn column_name(&self, idx: usize) -> Option<&str> {
        self.columns.get(idx).map(String::as_str)
    }

    /// Distinct non-empty values of a column, in first-seen order.
    pub fn distinct_values(&self, idx: usize) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.rows()
            .map(|row| row.text(idx).trim())
            .filter(|v| !v.is_empty())
            .filter(|v| seen.insert(v.to_string()))
            .map(str::to_string)
            .collect()
    }
}

/// A borrowed view of one dataset row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    cells: &'a [String],
}

impl<'a> Row<'a> {
    /// Raw cell text; missing trailing cells read as empty.
    pub fn text(&self, idx: usize) -> &'a str {
        self.cells.get(idx).map(String::as_str).unwrap_or("")
    }

    /// Numeric reading; anything unparseable counts as zero.
    pub fn number(&self, idx: usize) -> f64 {
        parse_number(self.text(idx))
    }

    pub fn date(&self, idx: usize) -> Option<NaiveDate> {
        parse_date(self.text(idx))
    }
}

/// Coerce a cell to a finite number, defaulting to 0.
pub fn parse_number(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Where the current dataset was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Provenance {
    /// The bundled sales report.
    Default { path: PathBuf },
    /// A file the user supplied; takes precedence over the default.
    Uploaded { path: PathBuf },
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Default { path } => write!(f, "default data ({})", path.display()),
            Provenance::Uploaded { path } => write!(f, "uploaded data ({})", path.display()),
        }
    }
}

/// The dataset a tool reads for one invocation, with its provenance.
#[derive(Debug, Clone)]
pub struct DatasetView {
    pub dataset: Arc<Dataset>,
    pub provenance: Provenance,
}
