//! CSV-backed dataset provider.
//!
//! Two files are known to the provider: the bundled default report and an
//! optional uploaded replacement. The uploaded file wins whenever it exists.
//! The parsed dataset is cached behind an `Arc` until `invalidate()` is
//! called, so every tool in a turn reads the same snapshot.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
};

use tracing::{debug, info, warn};

use biznavi_contracts::{
    dataset::{parse_number, Dataset, DatasetView, Provenance, AMOUNT_COLUMN},
    error::{NaviError, NaviResult},
};
use biznavi_core::traits::DatasetProvider;

const ORDER_ID_COLUMN: &str = "Order ID";
const ASIN_COLUMN: &str = "ASIN";

#[derive(Debug)]
pub struct CsvDatasetProvider {
    default_path: PathBuf,
    uploaded_path: PathBuf,
    cache: RwLock<Option<DatasetView>>,
}

impl CsvDatasetProvider {
    pub fn new(default_path: impl Into<PathBuf>, uploaded_path: impl Into<PathBuf>) -> Self {
        Self {
            default_path: default_path.into(),
            uploaded_path: uploaded_path.into(),
            cache: RwLock::new(None),
        }
    }

    /// The file the next load would read.
    pub fn provenance(&self) -> Provenance {
        if self.uploaded_path.is_file() {
            Provenance::Uploaded {
                path: self.uploaded_path.clone(),
            }
        } else {
            Provenance::Default {
                path: self.default_path.clone(),
            }
        }
    }

    /// Copy `source` over the uploaded slot and drop the cached view.
    ///
    /// The file is parsed first; a file that is not a readable CSV leaves the
    /// current dataset untouched. Uploading the uploaded file itself only
    /// re-reads it.
    pub fn replace_with_upload(&self, source: &Path) -> NaviResult<Provenance> {
        let parsed = read_sales_csv(source)?;
        if same_file(source, &self.uploaded_path) {
            info!(source = %source.display(), rows = parsed.len(), "uploaded dataset re-read in place");
            self.invalidate();
            return Ok(self.provenance());
        }
        if let Some(parent) = self.uploaded_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| NaviError::Dataset {
                    reason: format!("cannot create '{}': {}", parent.display(), e),
                })?;
            }
        }
        fs::copy(source, &self.uploaded_path).map_err(|e| NaviError::Dataset {
            reason: format!(
                "cannot copy '{}' to '{}': {}",
                source.display(),
                self.uploaded_path.display(),
                e
            ),
        })?;
        info!(
            source = %source.display(),
            rows = parsed.len(),
            "uploaded dataset replaces the current one"
        );
        self.invalidate();
        Ok(self.provenance())
    }

    fn load(&self) -> NaviResult<DatasetView> {
        let provenance = self.provenance();
        let path = match &provenance {
            Provenance::Default { path } | Provenance::Uploaded { path } => path,
        };
        let dataset = read_sales_csv(path)?;
        info!(source = %provenance, rows = dataset.len(), "dataset loaded");
        Ok(DatasetView {
            dataset: Arc::new(dataset),
            provenance,
        })
    }
}

impl DatasetProvider for CsvDatasetProvider {
    fn current(&self) -> NaviResult<DatasetView> {
        if let Some(view) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(view.clone());
        }

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // Another reader may have filled the cache while we waited.
        if let Some(view) = cache.as_ref() {
            return Ok(view.clone());
        }
        let view = self.load()?;
        *cache = Some(view.clone());
        Ok(view)
    }

    fn invalidate(&self) {
        if self
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
        {
            debug!("dataset cache invalidated");
        }
    }
}

/// True when both paths resolve to the same existing file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Read a sales report: trimmed headers, `Amount` coerced to a number,
/// duplicate (`Order ID`, `ASIN`) rows dropped.
pub fn read_sales_csv(path: &Path) -> NaviResult<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| NaviError::Dataset {
            reason: format!("cannot open '{}': {}", path.display(), e),
        })?;

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| NaviError::Dataset {
            reason: format!("cannot read header of '{}': {}", path.display(), e),
        })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let find = |name: &str| columns.iter().position(|c| c.eq_ignore_ascii_case(name));
    let amount = find(AMOUNT_COLUMN);
    let dedup_key = find(ORDER_ID_COLUMN).zip(find(ASIN_COLUMN));

    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    let mut duplicates = 0usize;

    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| NaviError::Dataset {
            reason: format!("row {} of '{}': {}", idx + 1, path.display(), e),
        })?;
        let mut cells: Vec<String> = record.iter().map(str::to_string).collect();

        if let Some((order, asin)) = dedup_key {
            let key = (
                cells.get(order).cloned().unwrap_or_default(),
                cells.get(asin).cloned().unwrap_or_default(),
            );
            if !seen.insert(key) {
                duplicates += 1;
                continue;
            }
        }
        if let Some(cell) = amount.and_then(|i| cells.get_mut(i)) {
            *cell = parse_number(cell).to_string();
        }
        rows.push(cells);
    }

    if duplicates > 0 {
        warn!(path = %path.display(), duplicates, "dropped duplicate order lines");
    }
    Ok(Dataset::new(columns, rows))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use biznavi_contracts::dataset::{Provenance, AMOUNT_COLUMN};
    use biznavi_core::traits::DatasetProvider;

    use super::{read_sales_csv, CsvDatasetProvider};

    const REPORT: &str = "\
Order ID,Date,Status,Category,ASIN,Qty,Amount
A1,04-30-22,Shipped,Kurta,X1,1,500
A1,04-30-22,Shipped,Kurta,X1,1,500
A2,04-29-22,Cancelled,Kurta,X2,1,not-a-number
A3,05-01-22,Shipped,Set,X3,2,700.5
";

    #[test]
    fn ingestion_drops_duplicates_and_coerces_amount() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        fs::write(&path, REPORT).unwrap();

        let ds = read_sales_csv(&path).unwrap();
        assert_eq!(ds.len(), 3);
        let amount = ds.resolve_column(AMOUNT_COLUMN).unwrap();
        let amounts: Vec<f64> = ds.rows().map(|r| r.number(amount)).collect();
        assert_eq!(amounts, vec![500.0, 0.0, 700.5]);
    }

    #[test]
    fn missing_file_is_a_dataset_error() {
        let provider = CsvDatasetProvider::new("/nonexistent/report.csv", "/nonexistent/up.csv");
        assert!(provider.current().is_err());
    }

    #[test]
    fn upload_takes_precedence_and_invalidates() {
        let dir = tempfile::tempdir().unwrap();
        let default = dir.path().join("report.csv");
        let uploaded = dir.path().join("uploads").join("current.csv");
        fs::write(&default, REPORT).unwrap();

        let provider = CsvDatasetProvider::new(&default, &uploaded);
        let first = provider.current().unwrap();
        assert_eq!(first.dataset.len(), 3);
        assert!(matches!(first.provenance, Provenance::Default { .. }));

        let replacement = dir.path().join("mine.csv");
        fs::write(&replacement, "Category,Amount\nSet,10\n").unwrap();
        let provenance = provider.replace_with_upload(&replacement).unwrap();
        assert_eq!(provenance, Provenance::Uploaded { path: uploaded.clone() });

        let second = provider.current().unwrap();
        assert_eq!(second.dataset.len(), 1);
        assert_eq!(second.provenance, provenance);
    }

    #[test]
    fn cached_view_is_shared_until_invalidated() {
        let dir = tempfile::tempdir().unwrap();
        let default = dir.path().join("report.csv");
        fs::write(&default, REPORT).unwrap();
        let provider = CsvDatasetProvider::new(&default, dir.path().join("up.csv"));

        let a = provider.current().unwrap();
        fs::write(&default, "Category,Amount\n").unwrap();
        let b = provider.current().unwrap();
        assert!(std::sync::Arc::ptr_eq(&a.dataset, &b.dataset));

        provider.invalidate();
        assert!(provider.current().unwrap().dataset.is_empty());
    }

    #[test]
    fn uploading_the_uploaded_file_keeps_its_rows() {
        let dir = tempfile::tempdir().unwrap();
        let uploaded = dir.path().join("up.csv");
        let provider = CsvDatasetProvider::new(dir.path().join("report.csv"), &uploaded);

        let mine = dir.path().join("mine.csv");
        fs::write(&mine, "Category,Amount\nSet,10\nKurta,20\n").unwrap();
        provider.replace_with_upload(&mine).unwrap();
        assert_eq!(provider.current().unwrap().dataset.len(), 2);

        let again = dir.path().join(".").join("up.csv");
        let provenance = provider.replace_with_upload(&again).unwrap();
        assert_eq!(provenance, Provenance::Uploaded { path: uploaded.clone() });
        assert!(fs::metadata(&uploaded).unwrap().len() > 0);
        assert_eq!(provider.current().unwrap().dataset.len(), 2);
    }

    #[test]
    fn unreadable_upload_keeps_current_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let default = dir.path().join("report.csv");
        fs::write(&default, REPORT).unwrap();
        let provider = CsvDatasetProvider::new(&default, dir.path().join("up.csv"));

        assert!(provider
            .replace_with_upload(&dir.path().join("missing.csv"))
            .is_err());
        assert!(matches!(provider.provenance(), Provenance::Default { .. }));
    }
}
